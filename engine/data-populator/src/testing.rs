//! Scripted `FootballApi` double for tests
//!
//! Responses are looked up from plain maps the test fills in beforehand;
//! every call is logged, and an optional trigger turns the Nth call into
//! the vendor's daily-limit failure.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use apifootball_client::{
    ApiError, CountryEntry, FootballApi, InjuryEntry, LeagueEntry, PlayerEntry, PlayersPage,
    Result as ApiResult, SidelinedEntry, TeamEntry, TransferEntry, TrophyEntry,
};
use async_trait::async_trait;

#[derive(Default)]
pub struct StubApi {
    pub leagues: HashMap<u32, LeagueEntry>,
    pub teams_by_league: HashMap<(u32, i32), Vec<TeamEntry>>,
    pub teams: HashMap<u32, TeamEntry>,
    /// Pages per (league, season), in page order
    pub player_pages: HashMap<(u32, i32), Vec<Vec<PlayerEntry>>>,
    pub players: HashMap<(u32, i32), PlayerEntry>,
    pub seasons: HashMap<u32, Vec<i32>>,
    pub transfers: HashMap<u32, Vec<TransferEntry>>,
    pub injuries: HashMap<(u32, i32), Vec<InjuryEntry>>,
    pub sidelined: HashMap<u32, Vec<SidelinedEntry>>,
    pub trophies: HashMap<u32, Vec<TrophyEntry>>,
    pub countries: HashMap<String, CountryEntry>,
    /// When set, the call with this zero-based index (and every later call)
    /// fails with the daily-limit error
    pub daily_limit_after: Option<u32>,
    calls: Mutex<Vec<String>>,
    call_count: AtomicU32,
}

impl StubApi {
    pub fn with_daily_limit_after(calls: u32) -> Self {
        Self { daily_limit_after: Some(calls), ..Default::default() }
    }

    /// Every call issued so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn track(&self, call: String) -> ApiResult<()> {
        let issued = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(call);
        if let Some(limit) = self.daily_limit_after {
            if issued >= limit {
                return Err(ApiError::DailyLimitExceeded(
                    "You have reached the request limit for the day".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl FootballApi for StubApi {
    async fn league_by_id(&self, id: u32) -> ApiResult<Option<LeagueEntry>> {
        self.track(format!("league:{id}"))?;
        Ok(self.leagues.get(&id).cloned())
    }

    async fn teams_in_league(&self, league: u32, season: i32) -> ApiResult<Vec<TeamEntry>> {
        self.track(format!("teams_in_league:{league}:{season}"))?;
        Ok(self.teams_by_league.get(&(league, season)).cloned().unwrap_or_default())
    }

    async fn team_by_id(&self, id: u32) -> ApiResult<Option<TeamEntry>> {
        self.track(format!("team:{id}"))?;
        Ok(self.teams.get(&id).cloned())
    }

    async fn players_page(&self, league: u32, season: i32, page: u32) -> ApiResult<PlayersPage> {
        self.track(format!("players_page:{league}:{season}:{page}"))?;
        let Some(pages) = self.player_pages.get(&(league, season)) else {
            return Ok(PlayersPage::default());
        };
        let entries = pages.get(page.saturating_sub(1) as usize).cloned().unwrap_or_default();
        Ok(PlayersPage { entries, current_page: page, total_pages: pages.len() as u32 })
    }

    async fn player_for_season(&self, player: u32, season: i32) -> ApiResult<Option<PlayerEntry>> {
        self.track(format!("player:{player}:{season}"))?;
        Ok(self.players.get(&(player, season)).cloned())
    }

    async fn player_seasons(&self, player: u32) -> ApiResult<Vec<i32>> {
        self.track(format!("player_seasons:{player}"))?;
        Ok(self.seasons.get(&player).cloned().unwrap_or_default())
    }

    async fn transfers(&self, player: u32) -> ApiResult<Vec<TransferEntry>> {
        self.track(format!("transfers:{player}"))?;
        Ok(self.transfers.get(&player).cloned().unwrap_or_default())
    }

    async fn injuries(&self, player: u32, season: i32) -> ApiResult<Vec<InjuryEntry>> {
        self.track(format!("injuries:{player}:{season}"))?;
        Ok(self.injuries.get(&(player, season)).cloned().unwrap_or_default())
    }

    async fn sidelined(&self, player: u32) -> ApiResult<Vec<SidelinedEntry>> {
        self.track(format!("sidelined:{player}"))?;
        Ok(self.sidelined.get(&player).cloned().unwrap_or_default())
    }

    async fn trophies(&self, player: u32) -> ApiResult<Vec<TrophyEntry>> {
        self.track(format!("trophies:{player}"))?;
        Ok(self.trophies.get(&player).cloned().unwrap_or_default())
    }

    async fn country_by_name(&self, name: &str) -> ApiResult<Option<CountryEntry>> {
        self.track(format!("country:{name}"))?;
        Ok(self.countries.get(name).cloned())
    }
}
