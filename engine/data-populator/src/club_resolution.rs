//! Current-club resolution
//!
//! A player listed under a national or continental competition is not
//! employed by that competition's "club" (the national side); their
//! authoritative current club is the newest domestic club in their
//! statistic history. For domestic competitions the context league itself
//! is the best evidence, with a preference chain down to the sentinel.

use std::sync::Arc;

use apifootball_client::FootballApi;
use talent_store::{Club, League};
use tracing::{debug, warn};

use crate::budget::ApiCallBudget;
use crate::error::Result;
use crate::parser::{self, ParsedStatistic};
use crate::reconcile::FREE_AGENT_CLUB;

/// Tokens marking a league name as a national/continental competition.
///
/// Substring match, case-insensitive. Known false positives: a domestic
/// league whose name happens to carry one of these tokens (e.g.
/// "international", "america") is classified as national and its roster is
/// ignored for club attribution.
pub const NATIONAL_COMPETITION_KEYWORDS: &[&str] = &[
    "uefa",
    "fifa",
    "world",
    "euro",
    "nations",
    "friendlies",
    "olympic",
    "international",
    "confederations",
    "conmebol",
    "concacaf",
    "copa",
    "gold cup",
    "africa",
    "asia",
    "america",
    "oceania",
];

/// True when the league name marks a national/continental competition
pub fn is_national_competition(league_name: &str) -> bool {
    let lower = league_name.to_lowercase();
    NATIONAL_COMPETITION_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

/// True when the club record is a national side: explicit vendor flag, or a
/// name carrying the literal "national team"
pub fn is_national_team(club: &Club) -> bool {
    club.is_national || club.name.to_lowercase().contains("national team")
}

/// Determines a player's authoritative current club from their statistic
/// history and the context league they were discovered in
pub struct ClubResolver {
    api: Arc<dyn FootballApi>,
    budget: Arc<ApiCallBudget>,
    current_season: i32,
}

impl ClubResolver {
    pub fn new(api: Arc<dyn FootballApi>, budget: Arc<ApiCallBudget>, current_season: i32) -> Self {
        Self { api, budget, current_season }
    }

    /// Resolve the current club for a player discovered in `context_league`.
    ///
    /// Returns a candidate record; the reconciler persists it. The sentinel
    /// candidate carries only the "Free Agent" name, which the reconciler
    /// find-or-creates.
    pub async fn determine_current_club(
        &self,
        player_external_id: i64,
        history: &[ParsedStatistic],
        context_league: &League,
        league_clubs: &[Club],
    ) -> Result<Club> {
        if is_national_competition(&context_league.name) {
            return self.resolve_from_national_context(player_external_id, history).await;
        }
        Ok(self.resolve_from_domestic_context(history, context_league, league_clubs))
    }

    /// National context: the newest statistic whose club is not a national
    /// side and whose league is not itself a national competition. When the
    /// loaded history has none, older seasons are fetched from the vendor
    /// before falling back to the sentinel.
    async fn resolve_from_national_context(
        &self,
        player_external_id: i64,
        history: &[ParsedStatistic],
    ) -> Result<Club> {
        if let Some(club) = newest_domestic_club(history) {
            return Ok(club);
        }

        debug!(player_external_id, "no domestic club in loaded history, fetching past seasons");
        let loaded: Vec<i32> = history.iter().map(|s| s.season).collect();

        self.budget.record(1);
        let mut seasons = match self.api.player_seasons(player_external_id as u32).await {
            Ok(seasons) => seasons,
            Err(e) if e.is_daily_limit() => return Err(e.into()),
            Err(e) => {
                warn!(player_external_id, error = %e, "season listing failed");
                Vec::new()
            }
        };
        seasons.retain(|s| !loaded.contains(s) && *s <= self.current_season);
        seasons.sort_unstable_by(|a, b| b.cmp(a));

        for season in seasons {
            if self.budget.exhausted() {
                break;
            }
            self.budget.record(1);
            match self.api.player_for_season(player_external_id as u32, season).await {
                Ok(Some(entry)) => {
                    let stats = parser::statistics_from_entry(&entry, self.current_season);
                    if let Some(club) = newest_domestic_club(&stats) {
                        return Ok(club);
                    }
                }
                Ok(None) => {}
                Err(e) if e.is_daily_limit() => return Err(e.into()),
                Err(e) => warn!(player_external_id, season, error = %e, "past-season fetch failed"),
            }
        }

        Ok(free_agent_candidate())
    }

    /// Domestic context preference chain: exact context-league statistic for
    /// the current season, any context-league statistic (newest season
    /// wins), the newest non-national club that also appears in the roster,
    /// the first roster club, the sentinel.
    fn resolve_from_domestic_context(
        &self,
        history: &[ParsedStatistic],
        context_league: &League,
        league_clubs: &[Club],
    ) -> Club {
        let mut in_context: Vec<&ParsedStatistic> = history
            .iter()
            .filter(|s| {
                s.league.as_ref().is_some_and(|l| same_league(l, context_league))
                    && s.club.is_some()
            })
            .collect();
        in_context.sort_by_key(|s| std::cmp::Reverse(s.season));

        if let Some(stat) =
            in_context.iter().find(|s| s.season == self.current_season)
        {
            if let Some(club) = &stat.club {
                return club.clone();
            }
        }

        if let Some(stat) = in_context.first() {
            if let Some(club) = &stat.club {
                return club.clone();
            }
        }

        if let Some(club) = newest_domestic_club(history) {
            if league_clubs.iter().any(|c| same_club(c, &club)) {
                return club;
            }
        }

        if let Some(club) = league_clubs.first() {
            return club.clone();
        }

        free_agent_candidate()
    }
}

/// The club of the newest statistic that is neither a national side nor
/// part of a national competition
fn newest_domestic_club(history: &[ParsedStatistic]) -> Option<Club> {
    history
        .iter()
        .filter(|s| {
            let club_ok = s.club.as_ref().is_some_and(|c| !is_national_team(c));
            let league_ok =
                s.league.as_ref().is_none_or(|l| !is_national_competition(&l.name));
            club_ok && league_ok
        })
        .max_by_key(|s| s.season)
        .and_then(|s| s.club.clone())
}

fn same_league(a: &League, b: &League) -> bool {
    match (a.external_id, b.external_id) {
        (Some(x), Some(y)) => x == y,
        _ => !a.name.is_empty() && a.name.eq_ignore_ascii_case(&b.name),
    }
}

fn same_club(a: &Club, b: &Club) -> bool {
    match (a.external_id, b.external_id) {
        (Some(x), Some(y)) => x == y,
        _ => !a.name.is_empty() && a.name.eq_ignore_ascii_case(&b.name),
    }
}

fn free_agent_candidate() -> Club {
    Club { name: FREE_AGENT_CLUB.to_string(), ..Default::default() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubApi;
    use apifootball_client::{ApiLeague, ApiPlayer, ApiStatistic, ApiTeam, PlayerEntry};

    fn resolver(api: Arc<StubApi>) -> ClubResolver {
        ClubResolver::new(api, Arc::new(ApiCallBudget::new(1000)), 2025)
    }

    fn stat(club_ext: i64, club_name: &str, national: bool, league_name: &str, season: i32) -> ParsedStatistic {
        ParsedStatistic {
            club: Some(Club {
                external_id: Some(club_ext),
                name: club_name.to_string(),
                is_national: national,
                ..Default::default()
            }),
            league: Some(League {
                external_id: Some(season as i64 * 1000 + club_ext),
                name: league_name.to_string(),
                ..Default::default()
            }),
            season,
            ..Default::default()
        }
    }

    #[test]
    fn test_national_competition_classification() {
        assert!(is_national_competition("UEFA Youth League"));
        assert!(is_national_competition("FIFA World Cup"));
        assert!(is_national_competition("Friendlies"));
        assert!(is_national_competition("UEFA Nations League"));
        assert!(!is_national_competition("Premier League"));
        assert!(!is_national_competition("Eredivisie"));
    }

    #[test]
    fn test_national_team_detection() {
        assert!(is_national_team(&Club {
            name: "France".to_string(),
            is_national: true,
            ..Default::default()
        }));
        assert!(is_national_team(&Club {
            name: "England National Team".to_string(),
            ..Default::default()
        }));
        assert!(!is_national_team(&Club { name: "Arsenal".to_string(), ..Default::default() }));
    }

    #[tokio::test]
    async fn test_national_context_prefers_newest_domestic_club() {
        let api = Arc::new(StubApi::default());
        let resolver = resolver(api);

        let history = vec![
            stat(901, "Netherlands", true, "UEFA Nations League", 2025),
            stat(194, "Ajax", false, "Eredivisie", 2024),
            stat(197, "PSV", false, "Eredivisie", 2023),
        ];
        let context = League { name: "UEFA Youth League".to_string(), ..Default::default() };

        let club = resolver.determine_current_club(600, &history, &context, &[]).await.unwrap();
        assert_eq!(club.name, "Ajax");
    }

    #[tokio::test]
    async fn test_national_context_fetches_past_seasons_when_history_is_international_only() {
        let mut api = StubApi::default();
        api.seasons.insert(600, vec![2023, 2024, 2025]);
        api.players.insert(
            (600, 2023),
            PlayerEntry {
                player: ApiPlayer { id: Some(600), name: Some("J. Doe".to_string()), ..Default::default() },
                statistics: vec![ApiStatistic {
                    team: Some(ApiTeam {
                        id: Some(194),
                        name: Some("Ajax".to_string()),
                        national: Some(false),
                        ..Default::default()
                    }),
                    league: Some(ApiLeague {
                        id: Some(88),
                        name: Some("Eredivisie".to_string()),
                        season: Some(2023),
                        ..Default::default()
                    }),
                    ..Default::default()
                }],
            },
        );
        let api = Arc::new(api);
        let resolver = resolver(Arc::clone(&api));

        // Loaded history only has the national side for 2025/2024
        let history = vec![
            stat(901, "Netherlands", true, "UEFA Nations League", 2025),
            stat(901, "Netherlands", true, "Friendlies", 2024),
        ];
        let context = League { name: "UEFA Youth League".to_string(), ..Default::default() };

        let club = resolver.determine_current_club(600, &history, &context, &[]).await.unwrap();
        assert_eq!(club.name, "Ajax");
        assert!(api.calls().iter().any(|c| c == "player_seasons:600"));
    }

    #[tokio::test]
    async fn test_national_context_falls_back_to_free_agent() {
        let api = Arc::new(StubApi::default());
        let resolver = resolver(api);

        let history = vec![stat(901, "Netherlands", true, "Friendlies", 2025)];
        let context = League { name: "FIFA World Cup".to_string(), ..Default::default() };

        let club = resolver.determine_current_club(600, &history, &context, &[]).await.unwrap();
        assert_eq!(club.name, FREE_AGENT_CLUB);
    }

    #[tokio::test]
    async fn test_domestic_context_prefers_current_season_in_context_league() {
        let api = Arc::new(StubApi::default());
        let resolver = resolver(api);

        let context =
            League { external_id: Some(88), name: "Eredivisie".to_string(), ..Default::default() };
        let history = vec![
            ParsedStatistic {
                club: Some(Club { external_id: Some(194), name: "Ajax".to_string(), ..Default::default() }),
                league: Some(League { external_id: Some(88), name: "Eredivisie".to_string(), ..Default::default() }),
                season: 2024,
                ..Default::default()
            },
            ParsedStatistic {
                club: Some(Club { external_id: Some(197), name: "PSV".to_string(), ..Default::default() }),
                league: Some(League { external_id: Some(88), name: "Eredivisie".to_string(), ..Default::default() }),
                season: 2025,
                ..Default::default()
            },
        ];

        let club = resolver.determine_current_club(600, &history, &context, &[]).await.unwrap();
        assert_eq!(club.name, "PSV");
    }

    #[tokio::test]
    async fn test_domestic_context_newest_context_statistic_wins_without_current_season() {
        let api = Arc::new(StubApi::default());
        let resolver = resolver(api);

        let context =
            League { external_id: Some(88), name: "Eredivisie".to_string(), ..Default::default() };
        let history = vec![
            ParsedStatistic {
                club: Some(Club { external_id: Some(194), name: "Ajax".to_string(), ..Default::default() }),
                league: Some(League { external_id: Some(88), name: "Eredivisie".to_string(), ..Default::default() }),
                season: 2022,
                ..Default::default()
            },
            ParsedStatistic {
                club: Some(Club { external_id: Some(197), name: "PSV".to_string(), ..Default::default() }),
                league: Some(League { external_id: Some(88), name: "Eredivisie".to_string(), ..Default::default() }),
                season: 2023,
                ..Default::default()
            },
        ];

        let club = resolver.determine_current_club(600, &history, &context, &[]).await.unwrap();
        assert_eq!(club.name, "PSV");
    }

    #[tokio::test]
    async fn test_domestic_context_roster_membership_then_first_roster_club() {
        let api = Arc::new(StubApi::default());
        let resolver = resolver(api);

        let context =
            League { external_id: Some(88), name: "Eredivisie".to_string(), ..Default::default() };
        // History has no Eredivisie statistic at all
        let history = vec![stat(300, "Feyenoord", false, "KKD", 2024)];

        let roster = vec![
            Club { external_id: Some(194), name: "Ajax".to_string(), ..Default::default() },
            Club { external_id: Some(300), name: "Feyenoord".to_string(), ..Default::default() },
        ];
        let club =
            resolver.determine_current_club(600, &history, &context, &roster).await.unwrap();
        assert_eq!(club.name, "Feyenoord");

        // Without any usable history the first roster club is the last resort
        let club = resolver.determine_current_club(600, &[], &context, &roster).await.unwrap();
        assert_eq!(club.name, "Ajax");
    }
}
