//! Population orchestrator
//!
//! One run walks the configured leagues, discovers age-eligible players
//! through the paginated listing, and gives each new player a comprehensive
//! multi-season fetch (profile, statistics, transfers, injuries, sidelined
//! periods, trophies). Already-persisted players are skipped outright, which
//! is what makes an interrupted run safe to re-trigger. The call budget is
//! reset on entry and gates the loop at two levels: no new league beyond
//! the headroom threshold, no new player or player-level sub-fetch beyond
//! the full ceiling. Only the vendor's daily-quota signal aborts a run.

use std::sync::Arc;
use std::time::Duration;

use apifootball_client::FootballApi;
use chrono::Utc;
use talent_store::{Club, League, Player, PlayerTransfer, TalentStore};
use tracing::{debug, error, info, warn};

use crate::budget::ApiCallBudget;
use crate::club_resolution::ClubResolver;
use crate::config::PopulationConfig;
use crate::error::{PopulationError, Result};
use crate::parser::{self, ParsedStatistic};
use crate::reconcile::{EntityReconciler, FREE_AGENT_CLUB};
use crate::scheduler::CompletionListener;
use crate::summary::RunSummary;

/// Sequentially executes one population run at a time
pub struct PopulationOrchestrator {
    api: Arc<dyn FootballApi>,
    store: Arc<dyn TalentStore>,
    reconciler: EntityReconciler,
    resolver: ClubResolver,
    budget: Arc<ApiCallBudget>,
    config: PopulationConfig,
}

impl PopulationOrchestrator {
    pub fn new(
        api: Arc<dyn FootballApi>,
        store: Arc<dyn TalentStore>,
        config: PopulationConfig,
    ) -> Self {
        let budget = Arc::new(ApiCallBudget::new(config.daily_call_ceiling));
        let reconciler = EntityReconciler::new(
            Arc::clone(&store),
            Arc::clone(&api),
            Arc::clone(&budget),
            config.current_season,
        );
        let resolver =
            ClubResolver::new(Arc::clone(&api), Arc::clone(&budget), config.current_season);
        Self { api, store, reconciler, resolver, budget, config }
    }

    pub fn budget(&self) -> &ApiCallBudget {
        &self.budget
    }

    /// Run to completion and report the terminal status to the scheduling
    /// collaborator exactly once
    pub async fn execute(&self, listener: &dyn CompletionListener) -> RunSummary {
        let summary = self.run().await;
        listener.on_population_complete(summary.success(), &summary.message());
        summary
    }

    /// Execute one population run
    pub async fn run(&self) -> RunSummary {
        self.budget.reset();
        let mut summary = RunSummary::new();
        info!(
            leagues = self.config.league_ids.len(),
            ceiling = self.budget.ceiling(),
            season = self.config.current_season,
            "starting population run"
        );

        for &league_id in &self.config.league_ids {
            if self.budget.nearing_ceiling(self.config.league_gate_percent) {
                let reason = format!(
                    "call budget at {}/{} before league {}, leaving headroom",
                    self.budget.used(),
                    self.budget.ceiling(),
                    league_id
                );
                info!(%reason, "halting league iteration");
                summary.halt(reason);
                break;
            }

            match self.process_league(league_id, &mut summary).await {
                Ok(()) => summary.leagues_processed += 1,
                Err(e) if e.is_daily_limit() => {
                    summary.calls_used = self.budget.used();
                    summary.fail(e.to_string());
                    error!(league_id, error = %e, "daily limit reached, aborting run");
                    return summary;
                }
                Err(e) => {
                    warn!(league_id, error = %e, "league failed, continuing with next");
                    summary.soft_failure(format!("league {league_id}"), e.to_string());
                }
            }
        }

        summary.calls_used = self.budget.used();
        info!(
            players = summary.players_processed,
            skipped = summary.players_skipped,
            calls = summary.calls_used,
            "population run finished"
        );
        summary
    }

    async fn process_league(&self, league_id: u32, summary: &mut RunSummary) -> Result<()> {
        info!(league_id, "processing league");

        self.budget.record(1);
        let Some(entry) = self.api.league_by_id(league_id).await? else {
            summary.soft_failure(format!("league {league_id}"), "no league data from vendor");
            return Ok(());
        };
        let Some(candidate) = parser::league_from_entry(&entry, self.config.current_season) else {
            summary.soft_failure(format!("league {league_id}"), "league payload missing name");
            return Ok(());
        };
        let league = self.reconciler.resolve_league(candidate).await?;

        // Country details are fetched once, on first sight of the name
        if let Some(country) = league.country.clone() {
            match self.reconciler.resolve_country(&country).await {
                Ok(_) => {}
                Err(e) if e.is_daily_limit() => return Err(e),
                Err(e) => summary.soft_failure(format!("country {country}"), e.to_string()),
            }
        }

        let (player_ids, listing_season) = self.eligible_player_ids(league_id).await?;
        if player_ids.is_empty() {
            info!(league_id, "no eligible players found");
            return Ok(());
        }
        info!(league_id, count = player_ids.len(), season = listing_season, "eligible players listed");

        let roster = self.league_roster(&league, league_id, listing_season).await?;

        for player_external_id in player_ids {
            if self.budget.exhausted() {
                summary.halt(format!(
                    "call budget exhausted ({}/{}) during league {}",
                    self.budget.used(),
                    self.budget.ceiling(),
                    league_id
                ));
                break;
            }

            if self.store.players().exists_by_external_id(player_external_id).await? {
                debug!(player_external_id, "player already persisted, skipping");
                summary.players_skipped += 1;
                continue;
            }

            self.process_player(player_external_id, &league, &roster, listing_season, summary)
                .await?;
        }

        Ok(())
    }

    /// List age-eligible player ids for the current season, retrying once
    /// against the immediately prior season when the current one is empty
    async fn eligible_player_ids(&self, league_id: u32) -> Result<(Vec<i64>, i32)> {
        let current = self.config.current_season;
        let ids = self.eligible_ids_for_season(league_id, current).await?;
        if !ids.is_empty() {
            return Ok((ids, current));
        }

        let prior = current - 1;
        debug!(league_id, prior, "no eligible players in current season, retrying prior season");
        let ids = self.eligible_ids_for_season(league_id, prior).await?;
        let season = if ids.is_empty() { current } else { prior };
        Ok((ids, season))
    }

    async fn eligible_ids_for_season(&self, league_id: u32, season: i32) -> Result<Vec<i64>> {
        let today = Utc::now().date_naive();
        let mut ids: Vec<i64> = Vec::new();
        let mut page = 1u32;

        loop {
            self.budget.record(1);
            let listing = self.api.players_page(league_id, season, page).await?;

            for entry in &listing.entries {
                let Some(id) = entry.player.id else { continue };
                let Some(date_of_birth) = parser::parse_iso_date(
                    entry.player.birth.as_ref().and_then(|b| b.date.as_deref()),
                ) else {
                    debug!(player = id, "listing entry without birth date, skipping");
                    continue;
                };
                if parser::is_age_eligible(date_of_birth, today, self.config.max_age)
                    && !ids.contains(&id)
                {
                    ids.push(id);
                }
            }

            if listing.total_pages > page {
                page += 1;
                tokio::time::sleep(Duration::from_millis(self.config.page_delay_ms)).await;
            } else {
                break;
            }
        }

        Ok(ids)
    }

    /// Prefer clubs already associated with the league through persisted
    /// statistics; fall back to the vendor's team listing
    async fn league_roster(
        &self,
        league: &League,
        league_id: u32,
        season: i32,
    ) -> Result<Vec<Club>> {
        if let Some(id) = league.id {
            let persisted = self.store.clubs().find_in_league(id).await?;
            if !persisted.is_empty() {
                return Ok(persisted);
            }
        }

        self.budget.record(1);
        let teams = match self.api.teams_in_league(league_id, season).await {
            Ok(teams) => teams,
            Err(e) if e.is_daily_limit() => return Err(e.into()),
            Err(e) => {
                warn!(league_id, error = %e, "team listing failed");
                Vec::new()
            }
        };

        let mut roster = Vec::with_capacity(teams.len());
        for entry in &teams {
            if let Some(candidate) = parser::club_from_team(&entry.team, entry.venue.as_ref()) {
                roster.push(self.reconciler.ensure_club(candidate).await?);
            }
        }
        Ok(roster)
    }

    /// Fetch, resolve and persist one new player. Every sub-fetch failure is
    /// recorded and skipped; only the daily-quota signal escapes.
    async fn process_player(
        &self,
        player_external_id: i64,
        league: &League,
        roster: &[Club],
        listing_season: i32,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let unit = format!("player {player_external_id}");
        debug!(player_external_id, "processing player");

        self.budget.record(1);
        let mut seasons = match self.api.player_seasons(player_external_id as u32).await {
            Ok(seasons) => seasons,
            Err(e) if e.is_daily_limit() => return Err(e.into()),
            Err(e) => {
                summary.soft_failure(unit.clone(), format!("season listing failed: {e}"));
                Vec::new()
            }
        };
        seasons.retain(|s| *s <= self.config.current_season);
        seasons.sort_unstable_by(|a, b| b.cmp(a));
        if seasons.is_empty() {
            seasons.push(listing_season);
        }

        let mut profile: Option<Player> = None;
        let mut history: Vec<ParsedStatistic> = Vec::new();
        for &season in &seasons {
            if self.budget.exhausted() {
                break;
            }
            self.budget.record(1);
            match self.api.player_for_season(player_external_id as u32, season).await {
                Ok(Some(entry)) => {
                    if profile.is_none() {
                        profile = parser::player_from_entry(&entry);
                    }
                    history.extend(parser::statistics_from_entry(&entry, season));
                }
                Ok(None) => {}
                Err(e) if e.is_daily_limit() => return Err(e.into()),
                Err(e) => {
                    summary.soft_failure(unit.clone(), format!("season {season} fetch failed: {e}"))
                }
            }
        }

        let Some(mut player) = profile else {
            summary.players_filtered += 1;
            summary.soft_failure(unit, "no profile data");
            return Ok(());
        };

        // Definitive eligibility check against the full profile
        let today = Utc::now().date_naive();
        let eligible = player
            .date_of_birth
            .map(|dob| parser::is_age_eligible(dob, today, self.config.max_age))
            .unwrap_or(false);
        if !eligible {
            debug!(player_external_id, "player not age-eligible, dropping");
            summary.players_filtered += 1;
            return Ok(());
        }

        let candidate = match self
            .resolver
            .determine_current_club(player_external_id, &history, league, roster)
            .await
        {
            Ok(club) => club,
            Err(e) if e.is_daily_limit() => return Err(e),
            Err(e) => {
                summary.soft_failure(unit.clone(), format!("club resolution failed: {e}"));
                Club { name: FREE_AGENT_CLUB.to_string(), ..Default::default() }
            }
        };
        let (current_club, step) = self.reconciler.resolve_club(candidate, None).await?;
        debug!(player_external_id, club = %current_club.name, ?step, "current club resolved");
        player.current_club_id = current_club.id;

        let player = match self.store.players().save(player).await {
            Ok(saved) => saved,
            Err(e) => {
                summary.soft_failure(unit, format!("player save failed: {e}"));
                return Ok(());
            }
        };
        let Some(player_id) = player.id else {
            summary.soft_failure(unit, "player save returned no id");
            return Ok(());
        };

        for parsed in &history {
            if self.budget.exhausted() {
                break;
            }
            match self.persist_statistic(player_id, parsed, &current_club, summary).await {
                Ok(()) => {}
                Err(e) if e.is_daily_limit() => return Err(e),
                Err(e) => {
                    summary.soft_failure(unit.clone(), format!("statistic persist failed: {e}"))
                }
            }
        }

        if !self.budget.exhausted() {
            match self.persist_transfers(player_id, player.external_id, summary).await {
                Ok(()) => {}
                Err(e) if e.is_daily_limit() => return Err(e),
                Err(e) => summary.soft_failure(unit.clone(), format!("transfers failed: {e}")),
            }
        }

        for &season in &seasons {
            if self.budget.exhausted() {
                break;
            }
            match self.persist_injuries(player_id, player.external_id, season, summary).await {
                Ok(()) => {}
                Err(e) if e.is_daily_limit() => return Err(e),
                Err(e) => {
                    summary.soft_failure(unit.clone(), format!("injuries for {season} failed: {e}"))
                }
            }
        }

        if !self.budget.exhausted() {
            match self.persist_sidelined(player_id, player.external_id, summary).await {
                Ok(()) => {}
                Err(e) if e.is_daily_limit() => return Err(e),
                Err(e) => summary.soft_failure(unit.clone(), format!("sidelined failed: {e}")),
            }
        }

        if !self.budget.exhausted() {
            match self.persist_trophies(player_id, player.external_id, summary).await {
                Ok(()) => {}
                Err(e) if e.is_daily_limit() => return Err(e),
                Err(e) => summary.soft_failure(unit.clone(), format!("trophies failed: {e}")),
            }
        }

        summary.players_processed += 1;
        info!(player_external_id, name = %player.name, "player persisted");
        Ok(())
    }

    async fn persist_statistic(
        &self,
        player_id: i64,
        parsed: &ParsedStatistic,
        current_club: &Club,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let Some(league_candidate) = parsed.league.clone() else {
            debug!(player_id, "statistic without league context, skipping");
            return Ok(());
        };

        let club_candidate = parsed.club.clone().unwrap_or_default();
        let (club, _) = self.reconciler.resolve_club(club_candidate, Some(current_club)).await?;
        let league = self.reconciler.resolve_league(league_candidate).await?;

        let (Some(club_id), Some(league_id)) = (club.id, league.id) else {
            return Err(PopulationError::Store(talent_store::StoreError::not_persisted(
                "statistic club/league missing id after resolution",
            )));
        };

        self.reconciler
            .upsert_statistic(player_id, club_id, league_id, parsed.season, &parsed.stat)
            .await?;
        summary.statistics_written += 1;
        Ok(())
    }

    async fn persist_transfers(
        &self,
        player_id: i64,
        player_external_id: i64,
        summary: &mut RunSummary,
    ) -> Result<()> {
        self.budget.record(1);
        let entries = self.api.transfers(player_external_id as u32).await?;

        for parsed in entries.iter().flat_map(parser::transfers_from_entry) {
            if self.budget.exhausted() {
                break;
            }
            let club_from_id = match parsed.club_from {
                Some(candidate) => self.reconciler.resolve_club(candidate, None).await?.0.id,
                None => None,
            };
            let club_to_id = match parsed.club_to {
                Some(candidate) => self.reconciler.resolve_club(candidate, None).await?.0.id,
                None => None,
            };

            let written = self
                .reconciler
                .record_transfer(PlayerTransfer {
                    id: None,
                    player_id,
                    transfer_date: parsed.date,
                    transfer_type: parsed.transfer_type,
                    club_from_id,
                    club_to_id,
                })
                .await?;
            if written {
                summary.transfers_written += 1;
            }
        }
        Ok(())
    }

    async fn persist_injuries(
        &self,
        player_id: i64,
        player_external_id: i64,
        season: i32,
        summary: &mut RunSummary,
    ) -> Result<()> {
        self.budget.record(1);
        let entries = self.api.injuries(player_external_id as u32, season).await?;
        for entry in &entries {
            self.store.injuries().save(parser::injury_from_entry(entry, player_id, season)).await?;
            summary.injuries_written += 1;
        }
        Ok(())
    }

    async fn persist_sidelined(
        &self,
        player_id: i64,
        player_external_id: i64,
        summary: &mut RunSummary,
    ) -> Result<()> {
        self.budget.record(1);
        let entries = self.api.sidelined(player_external_id as u32).await?;
        for entry in &entries {
            self.store.sidelined().save(parser::sidelined_from_entry(entry, player_id)).await?;
            summary.sidelined_written += 1;
        }
        Ok(())
    }

    async fn persist_trophies(
        &self,
        player_id: i64,
        player_external_id: i64,
        summary: &mut RunSummary,
    ) -> Result<()> {
        self.budget.record(1);
        let entries = self.api.trophies(player_external_id as u32).await?;
        for entry in &entries {
            self.store.trophies().save(parser::trophy_from_entry(entry, player_id)).await?;
            summary.trophies_written += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubApi;
    use apifootball_client::{
        ApiBirth, ApiCards, ApiCountry, ApiGames, ApiGoals, ApiLeague, ApiPlayer, ApiPlayerRef,
        ApiSeason, ApiStatistic, ApiTeam, ApiTransfer, ApiTransferTeams, ApiVenue, CountryEntry,
        InjuryEntry, LeagueEntry, PlayerEntry, SidelinedEntry, TeamEntry, TransferEntry,
        TrophyEntry,
    };
    use apifootball_client::ApiInjuredPlayer;
    use chrono::Datelike;
    use std::sync::Mutex;
    use talent_store::{
        ClubRepository, InjuryRepository, MemoryStore, PlayerRepository, SidelinedRepository,
        StatisticRepository, TransferRepository, TrophyRepository,
    };

    #[derive(Default)]
    struct TestListener {
        calls: Mutex<Vec<(bool, String)>>,
    }

    impl CompletionListener for TestListener {
        fn on_population_complete(&self, success: bool, message: &str) {
            self.calls.lock().unwrap().push((success, message.to_string()));
        }
    }

    fn config(ceiling: u32) -> PopulationConfig {
        PopulationConfig {
            league_ids: vec![39],
            current_season: 2025,
            max_age: 21,
            daily_call_ceiling: ceiling,
            league_gate_percent: 95,
            page_delay_ms: 0,
        }
    }

    fn eligible_birth_date() -> String {
        let today = Utc::now().date_naive();
        format!("{}-01-01", today.year() - 19)
    }

    fn league_entry() -> LeagueEntry {
        LeagueEntry {
            league: ApiLeague {
                id: Some(39),
                name: Some("Premier League".to_string()),
                league_type: Some("League".to_string()),
                ..Default::default()
            },
            country: Some(ApiCountry {
                name: Some("England".to_string()),
                code: Some("GB".to_string()),
                flag: None,
            }),
            seasons: vec![ApiSeason { year: Some(2025), current: Some(true), ..Default::default() }],
        }
    }

    fn team_entry() -> TeamEntry {
        TeamEntry {
            team: ApiTeam {
                id: Some(50),
                name: Some("Manchester City".to_string()),
                country: Some("England".to_string()),
                founded: Some(1880),
                national: Some(false),
                ..Default::default()
            },
            venue: Some(ApiVenue {
                name: Some("Etihad Stadium".to_string()),
                city: Some("Manchester".to_string()),
                capacity: Some(55097),
                ..Default::default()
            }),
        }
    }

    fn listing_entry(id: i64) -> PlayerEntry {
        PlayerEntry {
            player: ApiPlayer {
                id: Some(id),
                name: Some(format!("Player {id}")),
                birth: Some(ApiBirth { date: Some(eligible_birth_date()), ..Default::default() }),
                ..Default::default()
            },
            statistics: vec![],
        }
    }

    fn full_entry(id: i64, season: i32) -> PlayerEntry {
        PlayerEntry {
            player: ApiPlayer {
                id: Some(id),
                name: Some(format!("Player {id}")),
                birth: Some(ApiBirth { date: Some(eligible_birth_date()), ..Default::default() }),
                nationality: Some("England".to_string()),
                height: Some("184 cm".to_string()),
                weight: Some("76 kg".to_string()),
                ..Default::default()
            },
            statistics: vec![ApiStatistic {
                team: Some(ApiTeam {
                    id: Some(50),
                    name: Some("Manchester City".to_string()),
                    national: Some(false),
                    ..Default::default()
                }),
                league: Some(ApiLeague {
                    id: Some(39),
                    name: Some("Premier League".to_string()),
                    season: Some(season),
                    ..Default::default()
                }),
                games: Some(ApiGames {
                    appearances: Some(20),
                    minutes: Some(1500),
                    position: Some("Attacker".to_string()),
                    rating: Some("7.1".to_string()),
                    ..Default::default()
                }),
                goals: Some(ApiGoals { total: Some(8), assists: Some(3), ..Default::default() }),
                cards: Some(ApiCards { yellow: Some(2), yellowred: Some(0), red: Some(0) }),
                ..Default::default()
            }],
        }
    }

    fn transfer_entry(id: i64) -> TransferEntry {
        TransferEntry {
            player: Some(ApiPlayerRef { id: Some(id), name: None }),
            transfers: vec![ApiTransfer {
                date: Some("2024-07-01".to_string()),
                transfer_type: Some("Loan".to_string()),
                teams: Some(ApiTransferTeams {
                    club_in: Some(ApiTeam {
                        id: Some(50),
                        name: Some("Manchester City".to_string()),
                        ..Default::default()
                    }),
                    club_out: Some(ApiTeam {
                        id: Some(60),
                        name: Some("Burnley".to_string()),
                        ..Default::default()
                    }),
                }),
            }],
        }
    }

    fn injury_entry(id: i64) -> InjuryEntry {
        InjuryEntry {
            player: Some(ApiInjuredPlayer {
                id: Some(id),
                name: None,
                injury_type: Some("Muscle Injury".to_string()),
                reason: Some("Hamstring".to_string()),
            }),
            team: None,
            league: None,
        }
    }

    /// League 39 with the given players listed for `season`, each carrying a
    /// comprehensive data set
    fn stub_for_league(player_ids: &[i64], season: i32) -> StubApi {
        let mut api = StubApi::default();
        api.leagues.insert(39, league_entry());
        api.countries.insert(
            "England".to_string(),
            CountryEntry { name: Some("England".to_string()), code: Some("GB".to_string()), flag: None },
        );
        api.player_pages
            .insert((39, season), vec![player_ids.iter().map(|&id| listing_entry(id)).collect()]);
        api.teams_by_league.insert((39, season), vec![team_entry()]);

        for &id in player_ids {
            api.seasons.insert(id as u32, vec![season]);
            api.players.insert((id as u32, season), full_entry(id, season));
            api.transfers.insert(id as u32, vec![transfer_entry(id)]);
            api.injuries.insert((id as u32, season), vec![injury_entry(id)]);
            api.sidelined.insert(
                id as u32,
                vec![SidelinedEntry {
                    sidelined_type: Some("Ankle Injury".to_string()),
                    start: Some("2025-01-10".to_string()),
                    end: Some("2025-02-01".to_string()),
                }],
            );
            api.trophies.insert(
                id as u32,
                vec![TrophyEntry {
                    league: Some("FA Cup".to_string()),
                    country: Some("England".to_string()),
                    season: Some("2024/2025".to_string()),
                    place: Some("Winner".to_string()),
                }],
            );
        }
        api
    }

    #[tokio::test]
    async fn test_skips_persisted_player_and_fully_processes_new_one() {
        let store = Arc::new(MemoryStore::new());
        PlayerRepository::save(
            store.as_ref(),
            Player { external_id: 500, name: "Existing Player".to_string(), ..Default::default() },
        )
        .await
        .unwrap();

        let api = Arc::new(stub_for_league(&[500, 600], 2025));
        let orchestrator = PopulationOrchestrator::new(
            Arc::clone(&api) as Arc<dyn FootballApi>,
            Arc::clone(&store) as Arc<dyn TalentStore>,
            config(7500),
        );

        let listener = TestListener::default();
        let summary = orchestrator.execute(&listener).await;

        assert!(summary.success());
        assert_eq!(summary.players_skipped, 1);
        assert_eq!(summary.players_processed, 1);
        assert_eq!(summary.leagues_processed, 1);

        // The persisted player triggered no sub-fetch at all
        let calls = api.calls();
        assert!(!calls.iter().any(|c| c.contains(":500")));

        // The new player got the full treatment
        assert!(calls.iter().any(|c| c == "player_seasons:600"));
        assert!(calls.iter().any(|c| c == "player:600:2025"));
        assert!(calls.iter().any(|c| c == "transfers:600"));
        assert!(calls.iter().any(|c| c == "injuries:600:2025"));
        assert!(calls.iter().any(|c| c == "sidelined:600"));
        assert!(calls.iter().any(|c| c == "trophies:600"));

        let persisted =
            PlayerRepository::find_by_external_id(store.as_ref(), 600).await.unwrap().unwrap();
        assert_eq!(persisted.height_cm, Some(184));
        let club =
            ClubRepository::find_by_external_id(store.as_ref(), 50).await.unwrap().unwrap();
        assert_eq!(persisted.current_club_id, club.id);

        let player_id = persisted.id.unwrap();
        assert_eq!(
            StatisticRepository::find_by_player(store.as_ref(), player_id).await.unwrap().len(),
            1
        );
        assert_eq!(
            TransferRepository::find_by_player(store.as_ref(), player_id).await.unwrap().len(),
            1
        );
        assert_eq!(
            InjuryRepository::find_by_player(store.as_ref(), player_id).await.unwrap().len(),
            1
        );
        assert_eq!(
            SidelinedRepository::find_by_player(store.as_ref(), player_id).await.unwrap().len(),
            1
        );
        assert_eq!(
            TrophyRepository::find_by_player(store.as_ref(), player_id).await.unwrap().len(),
            1
        );

        let listener_calls = listener.calls.lock().unwrap();
        assert_eq!(listener_calls.len(), 1);
        assert!(listener_calls[0].0);
    }

    #[tokio::test]
    async fn test_budget_exhaustion_stops_sub_fetches_and_reports_partial_success() {
        let store = Arc::new(MemoryStore::new());
        let api = Arc::new(stub_for_league(&[601, 602], 2025));
        let orchestrator = PopulationOrchestrator::new(
            Arc::clone(&api) as Arc<dyn FootballApi>,
            Arc::clone(&store) as Arc<dyn TalentStore>,
            config(8),
        );

        let listener = TestListener::default();
        let summary = orchestrator.execute(&listener).await;

        // Budget ran out mid-player: the run is partial progress, not failure
        assert!(summary.success());
        assert!(summary.halt_reason.is_some());
        assert_eq!(summary.players_processed, 1);
        assert_eq!(orchestrator.budget().used(), 8);

        let calls = api.calls();
        // Later sub-fetches of the first player were suppressed
        assert!(!calls.iter().any(|c| c.starts_with("injuries:601")));
        assert!(!calls.iter().any(|c| c == "sidelined:601"));
        assert!(!calls.iter().any(|c| c == "trophies:601"));
        // The second player was never started
        assert!(!calls.iter().any(|c| c.contains(":602")));

        let listener_calls = listener.calls.lock().unwrap();
        assert_eq!(listener_calls.len(), 1);
        assert!(listener_calls[0].0);
        assert!(listener_calls[0].1.contains("partial progress"));
    }

    #[tokio::test]
    async fn test_daily_limit_aborts_run_with_failure_callback() {
        let store = Arc::new(MemoryStore::new());
        let mut api = stub_for_league(&[600], 2025);
        api.daily_limit_after = Some(2);
        let api = Arc::new(api);
        let orchestrator = PopulationOrchestrator::new(
            Arc::clone(&api) as Arc<dyn FootballApi>,
            Arc::clone(&store) as Arc<dyn TalentStore>,
            config(7500),
        );

        let listener = TestListener::default();
        let summary = orchestrator.execute(&listener).await;

        assert!(!summary.success());
        assert!(summary.failure.as_deref().unwrap_or("").contains("request limit"));
        assert_eq!(summary.players_processed, 0);

        let listener_calls = listener.calls.lock().unwrap();
        assert_eq!(listener_calls.len(), 1);
        assert!(!listener_calls[0].0);
    }

    #[tokio::test]
    async fn test_empty_current_season_retries_prior_season() {
        let store = Arc::new(MemoryStore::new());
        // Players are only listed under the prior season
        let api = Arc::new(stub_for_league(&[700], 2024));
        let orchestrator = PopulationOrchestrator::new(
            Arc::clone(&api) as Arc<dyn FootballApi>,
            Arc::clone(&store) as Arc<dyn TalentStore>,
            config(7500),
        );

        let summary = orchestrator.run().await;
        assert!(summary.success());
        assert_eq!(summary.players_processed, 1);

        let calls = api.calls();
        assert!(calls.iter().any(|c| c == "players_page:39:2025:1"));
        assert!(calls.iter().any(|c| c == "players_page:39:2024:1"));
        assert!(calls.iter().any(|c| c == "player:700:2024"));
    }

    #[tokio::test]
    async fn test_league_gate_stops_new_leagues_near_ceiling() {
        let store = Arc::new(MemoryStore::new());
        // League 39 exists but lists no players: processing it costs exactly
        // four calls (league, country, both listing attempts)
        let api = Arc::new(stub_for_league(&[], 2025));
        let mut cfg = config(4);
        cfg.league_ids = vec![39, 140];
        let orchestrator = PopulationOrchestrator::new(
            Arc::clone(&api) as Arc<dyn FootballApi>,
            Arc::clone(&store) as Arc<dyn TalentStore>,
            cfg,
        );

        let summary = orchestrator.run().await;

        assert!(summary.success());
        assert_eq!(summary.leagues_processed, 1);
        assert!(summary.halt_reason.as_deref().unwrap_or("").contains("before league 140"));
        assert!(!api.calls().iter().any(|c| c == "league:140"));
    }
}
