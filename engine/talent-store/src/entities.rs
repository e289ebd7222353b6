//! Domain entities persisted by the pipeline
//!
//! Each entity carries `id: Option<i64>`: `None` marks a freshly parsed
//! candidate that has not been reconciled yet; after `save` the id is always
//! set. `external_id` is the stable key assigned by the vendor and is the
//! natural key for deduplication.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A competition (domestic league, cup, or international tournament)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct League {
    pub id: Option<i64>,
    pub external_id: Option<i64>,
    pub name: String,
    pub league_type: Option<String>,
    pub season: Option<i32>,
    pub country: Option<String>,
    pub logo_url: Option<String>,
}

/// A club or national side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Club {
    pub id: Option<i64>,
    pub external_id: Option<i64>,
    pub name: String,
    pub country: Option<String>,
    pub is_national: bool,
    pub founded: Option<i32>,
    pub stadium_name: Option<String>,
    pub stadium_city: Option<String>,
    pub stadium_capacity: Option<i32>,
    pub logo_url: Option<String>,
}

/// A country as reported by the vendor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Country {
    pub id: Option<i64>,
    pub name: String,
    /// Truncated to 10 characters on ingest
    pub code: Option<String>,
    pub flag_url: Option<String>,
}

/// A tracked player
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Player {
    pub id: Option<i64>,
    pub external_id: i64,
    pub name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub height_cm: Option<i32>,
    pub weight_kg: Option<i32>,
    pub position: Option<String>,
    pub photo_url: Option<String>,
    /// Resolved current club, not necessarily the literal source club
    pub current_club_id: Option<i64>,
}

/// Per-season, per-club, per-league statistics for one player.
///
/// Identity is the (player, club, league, season) composite key; re-ingesting
/// the same key overwrites scalar fields in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlayerStatistic {
    pub id: Option<i64>,
    pub player_id: i64,
    pub club_id: i64,
    pub league_id: i64,
    pub season: i32,
    pub appearances: Option<i32>,
    pub lineups: Option<i32>,
    pub minutes: Option<i32>,
    pub position: Option<String>,
    pub rating: Option<BigDecimal>,
    pub captain: bool,
    pub goals: Option<i32>,
    pub goals_conceded: Option<i32>,
    pub assists: Option<i32>,
    pub saves: Option<i32>,
    pub shots_total: Option<i32>,
    pub shots_on_target: Option<i32>,
    pub passes_total: Option<i32>,
    pub key_passes: Option<i32>,
    pub pass_accuracy: Option<i32>,
    pub tackles: Option<i32>,
    pub blocks: Option<i32>,
    pub interceptions: Option<i32>,
    pub duels_total: Option<i32>,
    pub duels_won: Option<i32>,
    pub dribbles_attempted: Option<i32>,
    pub dribbles_succeeded: Option<i32>,
    pub fouls_drawn: Option<i32>,
    pub fouls_committed: Option<i32>,
    pub yellow_cards: Option<i32>,
    /// Includes second-yellow dismissals
    pub red_cards: Option<i32>,
    pub penalties_scored: Option<i32>,
    pub penalties_missed: Option<i32>,
}

impl PlayerStatistic {
    /// Copy every scalar field from `other` onto `self`, keeping identity
    /// (id and composite key) untouched
    pub fn overwrite_scalars(&mut self, other: &PlayerStatistic) {
        self.appearances = other.appearances;
        self.lineups = other.lineups;
        self.minutes = other.minutes;
        self.position = other.position.clone();
        self.rating = other.rating.clone();
        self.captain = other.captain;
        self.goals = other.goals;
        self.goals_conceded = other.goals_conceded;
        self.assists = other.assists;
        self.saves = other.saves;
        self.shots_total = other.shots_total;
        self.shots_on_target = other.shots_on_target;
        self.passes_total = other.passes_total;
        self.key_passes = other.key_passes;
        self.pass_accuracy = other.pass_accuracy;
        self.tackles = other.tackles;
        self.blocks = other.blocks;
        self.interceptions = other.interceptions;
        self.duels_total = other.duels_total;
        self.duels_won = other.duels_won;
        self.dribbles_attempted = other.dribbles_attempted;
        self.dribbles_succeeded = other.dribbles_succeeded;
        self.fouls_drawn = other.fouls_drawn;
        self.fouls_committed = other.fouls_committed;
        self.yellow_cards = other.yellow_cards;
        self.red_cards = other.red_cards;
        self.penalties_scored = other.penalties_scored;
        self.penalties_missed = other.penalties_missed;
    }
}

/// One recorded transfer move.
///
/// Identity for deduplication is (player, transfer_date, club_from, club_to).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlayerTransfer {
    pub id: Option<i64>,
    pub player_id: i64,
    pub transfer_date: Option<NaiveDate>,
    pub transfer_type: Option<String>,
    pub club_from_id: Option<i64>,
    pub club_to_id: Option<i64>,
}

/// One recorded injury for a player and season
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlayerInjury {
    pub id: Option<i64>,
    pub player_id: i64,
    pub injury_type: Option<String>,
    pub reason: Option<String>,
    pub season: Option<i32>,
}

/// One period a player was unavailable
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlayerSidelined {
    pub id: Option<i64>,
    pub player_id: i64,
    pub sidelined_type: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// One trophy won by a player
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlayerTrophy {
    pub id: Option<i64>,
    pub player_id: i64,
    pub competition: Option<String>,
    pub country: Option<String>,
    pub season: Option<String>,
    pub place: Option<String>,
}
