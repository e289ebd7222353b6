//! In-memory store
//!
//! `Mutex<HashMap>`-backed implementation of the repository traits, used by
//! every test and available for local dry runs. Ids come from a single
//! shared sequence so they are unique across entity types.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::entities::{
    Club, Country, League, Player, PlayerInjury, PlayerSidelined, PlayerStatistic, PlayerTransfer,
    PlayerTrophy,
};
use crate::error::Result;
use crate::repository::{
    ClubRepository, CountryRepository, InjuryRepository, LeagueRepository, PlayerRepository,
    SidelinedRepository, StatisticRepository, TalentStore, TransferRepository, TrophyRepository,
};

#[derive(Default)]
struct Tables {
    leagues: HashMap<i64, League>,
    clubs: HashMap<i64, Club>,
    countries: HashMap<i64, Country>,
    players: HashMap<i64, Player>,
    statistics: HashMap<i64, PlayerStatistic>,
    transfers: HashMap<i64, PlayerTransfer>,
    injuries: HashMap<i64, PlayerInjury>,
    sidelined: HashMap<i64, PlayerSidelined>,
    trophies: HashMap<i64, PlayerTrophy>,
}

/// In-memory implementation of every repository trait
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    sequence: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("store mutex poisoned")
    }

    fn next_id(&self) -> i64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl LeagueRepository for MemoryStore {
    async fn find_by_external_id(&self, external_id: i64) -> Result<Option<League>> {
        Ok(self
            .tables()
            .leagues
            .values()
            .find(|l| l.external_id == Some(external_id))
            .cloned())
    }

    async fn find_by_name_ignore_case(&self, name: &str) -> Result<Option<League>> {
        Ok(self
            .tables()
            .leagues
            .values()
            .find(|l| l.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn save(&self, mut league: League) -> Result<League> {
        let id = league.id.unwrap_or_else(|| self.next_id());
        league.id = Some(id);
        self.tables().leagues.insert(id, league.clone());
        Ok(league)
    }
}

#[async_trait]
impl ClubRepository for MemoryStore {
    async fn find_by_external_id(&self, external_id: i64) -> Result<Option<Club>> {
        Ok(self
            .tables()
            .clubs
            .values()
            .find(|c| c.external_id == Some(external_id))
            .cloned())
    }

    async fn find_by_name_ignore_case(&self, name: &str) -> Result<Option<Club>> {
        Ok(self
            .tables()
            .clubs
            .values()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn find_in_league(&self, league_id: i64) -> Result<Vec<Club>> {
        let tables = self.tables();
        let mut club_ids: Vec<i64> = tables
            .statistics
            .values()
            .filter(|s| s.league_id == league_id)
            .map(|s| s.club_id)
            .collect();
        club_ids.sort_unstable();
        club_ids.dedup();
        Ok(club_ids.iter().filter_map(|id| tables.clubs.get(id).cloned()).collect())
    }

    async fn save(&self, mut club: Club) -> Result<Club> {
        let id = club.id.unwrap_or_else(|| self.next_id());
        club.id = Some(id);
        self.tables().clubs.insert(id, club.clone());
        Ok(club)
    }
}

#[async_trait]
impl CountryRepository for MemoryStore {
    async fn find_by_name_ignore_case(&self, name: &str) -> Result<Option<Country>> {
        Ok(self
            .tables()
            .countries
            .values()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn save(&self, mut country: Country) -> Result<Country> {
        let id = country.id.unwrap_or_else(|| self.next_id());
        country.id = Some(id);
        self.tables().countries.insert(id, country.clone());
        Ok(country)
    }
}

#[async_trait]
impl PlayerRepository for MemoryStore {
    async fn find_by_external_id(&self, external_id: i64) -> Result<Option<Player>> {
        Ok(self
            .tables()
            .players
            .values()
            .find(|p| p.external_id == external_id)
            .cloned())
    }

    async fn exists_by_external_id(&self, external_id: i64) -> Result<bool> {
        Ok(self.tables().players.values().any(|p| p.external_id == external_id))
    }

    async fn save(&self, mut player: Player) -> Result<Player> {
        let id = player.id.unwrap_or_else(|| self.next_id());
        player.id = Some(id);
        self.tables().players.insert(id, player.clone());
        Ok(player)
    }
}

#[async_trait]
impl StatisticRepository for MemoryStore {
    async fn find_by_key(
        &self,
        player_id: i64,
        club_id: i64,
        league_id: i64,
        season: i32,
    ) -> Result<Option<PlayerStatistic>> {
        Ok(self
            .tables()
            .statistics
            .values()
            .find(|s| {
                s.player_id == player_id
                    && s.club_id == club_id
                    && s.league_id == league_id
                    && s.season == season
            })
            .cloned())
    }

    async fn find_by_player(&self, player_id: i64) -> Result<Vec<PlayerStatistic>> {
        let mut stats: Vec<PlayerStatistic> = self
            .tables()
            .statistics
            .values()
            .filter(|s| s.player_id == player_id)
            .cloned()
            .collect();
        stats.sort_by_key(|s| s.season);
        Ok(stats)
    }

    async fn save(&self, mut statistic: PlayerStatistic) -> Result<PlayerStatistic> {
        // Enforce the composite-key invariant even when the caller did not
        // look the row up first
        let existing_id = self
            .tables()
            .statistics
            .values()
            .find(|s| {
                s.player_id == statistic.player_id
                    && s.club_id == statistic.club_id
                    && s.league_id == statistic.league_id
                    && s.season == statistic.season
            })
            .and_then(|s| s.id);

        let id = statistic.id.or(existing_id).unwrap_or_else(|| self.next_id());
        statistic.id = Some(id);
        self.tables().statistics.insert(id, statistic.clone());
        Ok(statistic)
    }
}

#[async_trait]
impl TransferRepository for MemoryStore {
    async fn find_matching(
        &self,
        player_id: i64,
        transfer_date: Option<NaiveDate>,
        club_from_id: Option<i64>,
        club_to_id: Option<i64>,
    ) -> Result<Option<PlayerTransfer>> {
        Ok(self
            .tables()
            .transfers
            .values()
            .find(|t| {
                t.player_id == player_id
                    && t.transfer_date == transfer_date
                    && t.club_from_id == club_from_id
                    && t.club_to_id == club_to_id
            })
            .cloned())
    }

    async fn find_by_player(&self, player_id: i64) -> Result<Vec<PlayerTransfer>> {
        let mut transfers: Vec<PlayerTransfer> = self
            .tables()
            .transfers
            .values()
            .filter(|t| t.player_id == player_id)
            .cloned()
            .collect();
        transfers.sort_by_key(|t| t.transfer_date);
        Ok(transfers)
    }

    async fn save(&self, mut transfer: PlayerTransfer) -> Result<PlayerTransfer> {
        let existing = self
            .find_matching(
                transfer.player_id,
                transfer.transfer_date,
                transfer.club_from_id,
                transfer.club_to_id,
            )
            .await?;
        if let Some(existing) = existing {
            return Ok(existing);
        }

        let id = transfer.id.unwrap_or_else(|| self.next_id());
        transfer.id = Some(id);
        self.tables().transfers.insert(id, transfer.clone());
        Ok(transfer)
    }
}

#[async_trait]
impl InjuryRepository for MemoryStore {
    async fn find_by_player(&self, player_id: i64) -> Result<Vec<PlayerInjury>> {
        Ok(self
            .tables()
            .injuries
            .values()
            .filter(|i| i.player_id == player_id)
            .cloned()
            .collect())
    }

    async fn save(&self, mut injury: PlayerInjury) -> Result<PlayerInjury> {
        let id = injury.id.unwrap_or_else(|| self.next_id());
        injury.id = Some(id);
        self.tables().injuries.insert(id, injury.clone());
        Ok(injury)
    }
}

#[async_trait]
impl SidelinedRepository for MemoryStore {
    async fn find_by_player(&self, player_id: i64) -> Result<Vec<PlayerSidelined>> {
        Ok(self
            .tables()
            .sidelined
            .values()
            .filter(|s| s.player_id == player_id)
            .cloned()
            .collect())
    }

    async fn save(&self, mut sidelined: PlayerSidelined) -> Result<PlayerSidelined> {
        let id = sidelined.id.unwrap_or_else(|| self.next_id());
        sidelined.id = Some(id);
        self.tables().sidelined.insert(id, sidelined.clone());
        Ok(sidelined)
    }
}

#[async_trait]
impl TrophyRepository for MemoryStore {
    async fn find_by_player(&self, player_id: i64) -> Result<Vec<PlayerTrophy>> {
        Ok(self
            .tables()
            .trophies
            .values()
            .filter(|t| t.player_id == player_id)
            .cloned()
            .collect())
    }

    async fn save(&self, mut trophy: PlayerTrophy) -> Result<PlayerTrophy> {
        let id = trophy.id.unwrap_or_else(|| self.next_id());
        trophy.id = Some(id);
        self.tables().trophies.insert(id, trophy.clone());
        Ok(trophy)
    }
}

impl TalentStore for MemoryStore {
    fn leagues(&self) -> &dyn LeagueRepository {
        self
    }
    fn clubs(&self) -> &dyn ClubRepository {
        self
    }
    fn countries(&self) -> &dyn CountryRepository {
        self
    }
    fn players(&self) -> &dyn PlayerRepository {
        self
    }
    fn statistics(&self) -> &dyn StatisticRepository {
        self
    }
    fn transfers(&self) -> &dyn TransferRepository {
        self
    }
    fn injuries(&self) -> &dyn InjuryRepository {
        self
    }
    fn sidelined(&self) -> &dyn SidelinedRepository {
        self
    }
    fn trophies(&self) -> &dyn TrophyRepository {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_assigns_id() {
        let store = MemoryStore::new();
        let league = LeagueRepository::save(
            &store,
            League { external_id: Some(39), name: "Premier League".to_string(), ..Default::default() },
        )
        .await
        .unwrap();
        assert!(league.id.is_some());
    }

    #[tokio::test]
    async fn test_find_by_name_is_case_insensitive() {
        let store = MemoryStore::new();
        ClubRepository::save(
            &store,
            Club { name: "Free Agent".to_string(), ..Default::default() },
        )
        .await
        .unwrap();

        let found = ClubRepository::find_by_name_ignore_case(&store, "free agent").await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().name, "Free Agent");
    }

    #[tokio::test]
    async fn test_statistic_upsert_keeps_one_row_per_key() {
        let store = MemoryStore::new();
        let first = PlayerStatistic {
            player_id: 1,
            club_id: 2,
            league_id: 3,
            season: 2025,
            goals: Some(4),
            ..Default::default()
        };
        let saved = StatisticRepository::save(&store, first).await.unwrap();

        let second = PlayerStatistic {
            player_id: 1,
            club_id: 2,
            league_id: 3,
            season: 2025,
            goals: Some(9),
            ..Default::default()
        };
        let updated = StatisticRepository::save(&store, second).await.unwrap();

        assert_eq!(saved.id, updated.id);
        let all = StatisticRepository::find_by_player(&store, 1).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].goals, Some(9));
    }

    #[tokio::test]
    async fn test_transfer_save_deduplicates_identical_tuple() {
        let store = MemoryStore::new();
        let transfer = PlayerTransfer {
            player_id: 1,
            transfer_date: NaiveDate::from_ymd_opt(2024, 7, 1),
            club_from_id: Some(10),
            club_to_id: Some(20),
            ..Default::default()
        };
        let first = TransferRepository::save(&store, transfer.clone()).await.unwrap();
        let second = TransferRepository::save(&store, transfer).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(TransferRepository::find_by_player(&store, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_find_in_league_derives_roster_from_statistics() {
        let store = MemoryStore::new();
        let club_a = ClubRepository::save(
            &store,
            Club { name: "Ajax".to_string(), ..Default::default() },
        )
        .await
        .unwrap();
        let club_b = ClubRepository::save(
            &store,
            Club { name: "PSV".to_string(), ..Default::default() },
        )
        .await
        .unwrap();

        for (player, club) in [(1, &club_a), (2, &club_b), (3, &club_a)] {
            StatisticRepository::save(
                &store,
                PlayerStatistic {
                    player_id: player,
                    club_id: club.id.unwrap(),
                    league_id: 88,
                    season: 2025,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }

        let roster = ClubRepository::find_in_league(&store, 88).await.unwrap();
        assert_eq!(roster.len(), 2);
        assert!(ClubRepository::find_in_league(&store, 99).await.unwrap().is_empty());
    }
}
