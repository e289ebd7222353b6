//! Repository traits the pipeline is programmed against
//!
//! One trait per entity type, mirroring the generic persistence interface
//! the surrounding application provides: lookup by external id, lookup by
//! case-insensitive name, and save. A saved entity has a non-null id
//! immediately after `save` returns; that is the only transactional
//! guarantee callers may assume.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::entities::{
    Club, Country, League, Player, PlayerInjury, PlayerSidelined, PlayerStatistic, PlayerTransfer,
    PlayerTrophy,
};
use crate::error::Result;

#[async_trait]
pub trait LeagueRepository: Send + Sync {
    async fn find_by_external_id(&self, external_id: i64) -> Result<Option<League>>;

    async fn find_by_name_ignore_case(&self, name: &str) -> Result<Option<League>>;

    async fn save(&self, league: League) -> Result<League>;
}

#[async_trait]
pub trait ClubRepository: Send + Sync {
    async fn find_by_external_id(&self, external_id: i64) -> Result<Option<Club>>;

    async fn find_by_name_ignore_case(&self, name: &str) -> Result<Option<Club>>;

    /// Clubs already associated with a league through persisted statistics
    async fn find_in_league(&self, league_id: i64) -> Result<Vec<Club>>;

    async fn save(&self, club: Club) -> Result<Club>;
}

#[async_trait]
pub trait CountryRepository: Send + Sync {
    async fn find_by_name_ignore_case(&self, name: &str) -> Result<Option<Country>>;

    async fn save(&self, country: Country) -> Result<Country>;
}

#[async_trait]
pub trait PlayerRepository: Send + Sync {
    async fn find_by_external_id(&self, external_id: i64) -> Result<Option<Player>>;

    async fn exists_by_external_id(&self, external_id: i64) -> Result<bool>;

    async fn save(&self, player: Player) -> Result<Player>;
}

#[async_trait]
pub trait StatisticRepository: Send + Sync {
    /// Lookup by the (player, club, league, season) composite key
    async fn find_by_key(
        &self,
        player_id: i64,
        club_id: i64,
        league_id: i64,
        season: i32,
    ) -> Result<Option<PlayerStatistic>>;

    /// Full statistic history for one player
    async fn find_by_player(&self, player_id: i64) -> Result<Vec<PlayerStatistic>>;

    /// Upsert on the composite key: the same (player, club, league, season)
    /// never yields more than one row
    async fn save(&self, statistic: PlayerStatistic) -> Result<PlayerStatistic>;
}

#[async_trait]
pub trait TransferRepository: Send + Sync {
    /// Lookup by the (player, date, club_from, club_to) deduplication tuple
    async fn find_matching(
        &self,
        player_id: i64,
        transfer_date: Option<NaiveDate>,
        club_from_id: Option<i64>,
        club_to_id: Option<i64>,
    ) -> Result<Option<PlayerTransfer>>;

    async fn find_by_player(&self, player_id: i64) -> Result<Vec<PlayerTransfer>>;

    async fn save(&self, transfer: PlayerTransfer) -> Result<PlayerTransfer>;
}

#[async_trait]
pub trait InjuryRepository: Send + Sync {
    async fn find_by_player(&self, player_id: i64) -> Result<Vec<PlayerInjury>>;

    async fn save(&self, injury: PlayerInjury) -> Result<PlayerInjury>;
}

#[async_trait]
pub trait SidelinedRepository: Send + Sync {
    async fn find_by_player(&self, player_id: i64) -> Result<Vec<PlayerSidelined>>;

    async fn save(&self, sidelined: PlayerSidelined) -> Result<PlayerSidelined>;
}

#[async_trait]
pub trait TrophyRepository: Send + Sync {
    async fn find_by_player(&self, player_id: i64) -> Result<Vec<PlayerTrophy>>;

    async fn save(&self, trophy: PlayerTrophy) -> Result<PlayerTrophy>;
}

/// Aggregate access to every repository, implemented by each store backend
pub trait TalentStore: Send + Sync {
    fn leagues(&self) -> &dyn LeagueRepository;
    fn clubs(&self) -> &dyn ClubRepository;
    fn countries(&self) -> &dyn CountryRepository;
    fn players(&self) -> &dyn PlayerRepository;
    fn statistics(&self) -> &dyn StatisticRepository;
    fn transfers(&self) -> &dyn TransferRepository;
    fn injuries(&self) -> &dyn InjuryRepository;
    fn sidelined(&self) -> &dyn SidelinedRepository;
    fn trophies(&self) -> &dyn TrophyRepository;
}
