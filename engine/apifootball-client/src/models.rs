//! Vendor payload models
//!
//! Serde models mirroring the API-Football v3 JSON shapes. Every field the
//! vendor may omit or null out is an `Option` so that a sparse payload never
//! fails deserialization; interpretation of the raw strings (heights, dates,
//! ratings) happens downstream, not here. Vendor spellings ("appearences",
//! "commited") are preserved through rename attributes.

use serde::{Deserialize, Serialize};

/// One item of the `/leagues` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeagueEntry {
    pub league: ApiLeague,

    pub country: Option<ApiCountry>,

    #[serde(default)]
    pub seasons: Vec<ApiSeason>,
}

/// League object; also appears inline in statistics with `country`/`season`
/// flattened to plain fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiLeague {
    pub id: Option<i64>,

    pub name: Option<String>,

    #[serde(rename = "type")]
    pub league_type: Option<String>,

    pub country: Option<String>,

    pub season: Option<i32>,

    pub logo: Option<String>,

    pub flag: Option<String>,
}

/// Country object from `/countries` and the `/leagues` envelope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiCountry {
    pub name: Option<String>,
    pub code: Option<String>,
    pub flag: Option<String>,
}

/// One item of the `/countries` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CountryEntry {
    pub name: Option<String>,
    pub code: Option<String>,
    pub flag: Option<String>,
}

/// Season descriptor from `/leagues`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSeason {
    pub year: Option<i32>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub current: Option<bool>,
}

/// One item of the `/teams` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamEntry {
    pub team: ApiTeam,
    pub venue: Option<ApiVenue>,
}

/// Team object; list contexts (statistics, transfers) only carry id/name/logo
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiTeam {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub code: Option<String>,
    pub country: Option<String>,
    pub founded: Option<i32>,
    pub national: Option<bool>,
    pub logo: Option<String>,
}

/// Venue block of the `/teams` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiVenue {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub city: Option<String>,
    pub capacity: Option<i32>,
}

/// One item of the `/players` response: the profile plus per-club/per-league
/// statistic blocks for the requested season
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub player: ApiPlayer,

    #[serde(default)]
    pub statistics: Vec<ApiStatistic>,
}

/// Player profile object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiPlayer {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub birth: Option<ApiBirth>,
    pub nationality: Option<String>,
    /// Free text, e.g. "184 cm"
    pub height: Option<String>,
    /// Free text, e.g. "78 kg"
    pub weight: Option<String>,
    pub injured: Option<bool>,
    pub photo: Option<String>,
}

/// Birth block of the player profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiBirth {
    /// ISO-8601 `YYYY-MM-DD`
    pub date: Option<String>,
    pub place: Option<String>,
    pub country: Option<String>,
}

/// One statistics block: a (team, league) pairing for one season
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiStatistic {
    pub team: Option<ApiTeam>,
    pub league: Option<ApiLeague>,
    pub games: Option<ApiGames>,
    pub substitutes: Option<ApiSubstitutes>,
    pub shots: Option<ApiShots>,
    pub goals: Option<ApiGoals>,
    pub passes: Option<ApiPasses>,
    pub tackles: Option<ApiTackles>,
    pub duels: Option<ApiDuels>,
    pub dribbles: Option<ApiDribbles>,
    pub fouls: Option<ApiFouls>,
    pub cards: Option<ApiCards>,
    pub penalty: Option<ApiPenalty>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiGames {
    /// Vendor spelling
    #[serde(rename = "appearences")]
    pub appearances: Option<i32>,
    pub lineups: Option<i32>,
    pub minutes: Option<i32>,
    pub position: Option<String>,
    /// Decimal carried as a string, e.g. "7.325000"
    pub rating: Option<String>,
    pub captain: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSubstitutes {
    #[serde(rename = "in")]
    pub subbed_in: Option<i32>,
    #[serde(rename = "out")]
    pub subbed_out: Option<i32>,
    pub bench: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiShots {
    pub total: Option<i32>,
    pub on: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiGoals {
    pub total: Option<i32>,
    pub conceded: Option<i32>,
    pub assists: Option<i32>,
    pub saves: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiPasses {
    pub total: Option<i32>,
    pub key: Option<i32>,
    pub accuracy: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiTackles {
    pub total: Option<i32>,
    pub blocks: Option<i32>,
    pub interceptions: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiDuels {
    pub total: Option<i32>,
    pub won: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiDribbles {
    pub attempts: Option<i32>,
    pub success: Option<i32>,
    pub past: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiFouls {
    pub drawn: Option<i32>,
    pub committed: Option<i32>,
}

/// Card counts; `yellowred` is a second-yellow dismissal
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiCards {
    pub yellow: Option<i32>,
    pub yellowred: Option<i32>,
    pub red: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiPenalty {
    pub won: Option<i32>,
    /// Vendor spelling
    #[serde(rename = "commited")]
    pub committed: Option<i32>,
    pub scored: Option<i32>,
    pub missed: Option<i32>,
    pub saved: Option<i32>,
}

/// One item of the `/transfers` response: all moves known for one player
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransferEntry {
    pub player: Option<ApiPlayerRef>,

    #[serde(default)]
    pub transfers: Vec<ApiTransfer>,
}

/// Minimal player reference used by transfer/injury payloads
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiPlayerRef {
    pub id: Option<i64>,
    pub name: Option<String>,
}

/// A single transfer move
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiTransfer {
    /// ISO-8601 `YYYY-MM-DD`
    pub date: Option<String>,
    /// Fee amount, "Loan", "Free", "N/A"
    #[serde(rename = "type")]
    pub transfer_type: Option<String>,
    pub teams: Option<ApiTransferTeams>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiTransferTeams {
    #[serde(rename = "in")]
    pub club_in: Option<ApiTeam>,
    #[serde(rename = "out")]
    pub club_out: Option<ApiTeam>,
}

/// One item of the `/injuries` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InjuryEntry {
    pub player: Option<ApiInjuredPlayer>,
    pub team: Option<ApiTeam>,
    pub league: Option<ApiLeague>,
}

/// Player reference enriched with the injury classification
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiInjuredPlayer {
    pub id: Option<i64>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub injury_type: Option<String>,
    pub reason: Option<String>,
}

/// One item of the `/sidelined` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SidelinedEntry {
    #[serde(rename = "type")]
    pub sidelined_type: Option<String>,
    /// ISO-8601 `YYYY-MM-DD`
    pub start: Option<String>,
    pub end: Option<String>,
}

/// One item of the `/trophies` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrophyEntry {
    pub league: Option<String>,
    pub country: Option<String>,
    /// Vendor formats this as "2021/2022"
    pub season: Option<String>,
    pub place: Option<String>,
}

/// A single page of the paginated `/players` listing
#[derive(Debug, Clone, Default)]
pub struct PlayersPage {
    pub entries: Vec<PlayerEntry>,
    pub current_page: u32,
    pub total_pages: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_entry_deserializes_vendor_payload() {
        let raw = r#"{
            "player": {
                "id": 909,
                "name": "E. Haaland",
                "firstname": "Erling",
                "lastname": "Haaland",
                "birth": {"date": "2000-07-21", "place": "Leeds", "country": "England"},
                "nationality": "Norway",
                "height": "194 cm",
                "weight": "88 kg",
                "injured": false,
                "photo": "https://media.api-sports.io/football/players/909.png"
            },
            "statistics": [{
                "team": {"id": 50, "name": "Manchester City", "logo": null},
                "league": {"id": 39, "name": "Premier League", "country": "England", "season": 2023},
                "games": {"appearences": 31, "lineups": 30, "minutes": 2552, "position": "Attacker", "rating": "7.225806", "captain": false},
                "goals": {"total": 27, "conceded": 0, "assists": 5, "saves": null},
                "cards": {"yellow": 1, "yellowred": 0, "red": 0},
                "penalty": {"won": null, "commited": null, "scored": 7, "missed": 0, "saved": null}
            }]
        }"#;

        let entry: PlayerEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.player.id, Some(909));
        assert_eq!(entry.player.height.as_deref(), Some("194 cm"));
        assert_eq!(entry.statistics.len(), 1);

        let stat = &entry.statistics[0];
        assert_eq!(stat.team.as_ref().unwrap().id, Some(50));
        assert_eq!(stat.league.as_ref().unwrap().season, Some(2023));
        assert_eq!(stat.games.as_ref().unwrap().appearances, Some(31));
        assert_eq!(stat.penalty.as_ref().unwrap().scored, Some(7));
    }

    #[test]
    fn test_sparse_statistic_block_tolerated() {
        let raw = r#"{"player": {"id": 1}, "statistics": [{"team": {"id": 2}}]}"#;
        let entry: PlayerEntry = serde_json::from_str(raw).unwrap();
        assert!(entry.statistics[0].games.is_none());
        assert!(entry.statistics[0].cards.is_none());
    }

    #[test]
    fn test_transfer_entry_renames() {
        let raw = r#"{
            "player": {"id": 909, "name": "E. Haaland"},
            "transfers": [{
                "date": "2022-07-01",
                "type": "€ 60M",
                "teams": {
                    "in": {"id": 50, "name": "Manchester City"},
                    "out": {"id": 165, "name": "Borussia Dortmund"}
                }
            }]
        }"#;
        let entry: TransferEntry = serde_json::from_str(raw).unwrap();
        let transfer = &entry.transfers[0];
        assert_eq!(transfer.teams.as_ref().unwrap().club_in.as_ref().unwrap().id, Some(50));
        assert_eq!(transfer.teams.as_ref().unwrap().club_out.as_ref().unwrap().id, Some(165));
    }
}
