//! Postgres store
//!
//! sqlx-backed implementation of the repository traits. Queries use the
//! runtime-bound API so the crate builds without a live database; the schema
//! ships as embedded migrations.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::entities::{
    Club, Country, League, Player, PlayerInjury, PlayerSidelined, PlayerStatistic, PlayerTransfer,
    PlayerTrophy,
};
use crate::error::Result;
use crate::repository::{
    ClubRepository, CountryRepository, InjuryRepository, LeagueRepository, PlayerRepository,
    SidelinedRepository, StatisticRepository, TalentStore, TransferRepository, TrophyRepository,
};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Postgres-backed implementation of every repository trait
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to the database
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(max_connections).connect(url).await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await?;
        info!("database migrations applied");
        Ok(())
    }
}

#[async_trait]
impl LeagueRepository for PgStore {
    async fn find_by_external_id(&self, external_id: i64) -> Result<Option<League>> {
        let league = sqlx::query_as::<_, League>("SELECT * FROM leagues WHERE external_id = $1")
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(league)
    }

    async fn find_by_name_ignore_case(&self, name: &str) -> Result<Option<League>> {
        let league = sqlx::query_as::<_, League>("SELECT * FROM leagues WHERE LOWER(name) = LOWER($1)")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(league)
    }

    async fn save(&self, league: League) -> Result<League> {
        let saved = match league.id {
            Some(id) => {
                sqlx::query_as::<_, League>(
                    "UPDATE leagues SET external_id = $2, name = $3, league_type = $4, \
                     season = $5, country = $6, logo_url = $7 WHERE id = $1 RETURNING *",
                )
                .bind(id)
                .bind(league.external_id)
                .bind(&league.name)
                .bind(&league.league_type)
                .bind(league.season)
                .bind(&league.country)
                .bind(&league.logo_url)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, League>(
                    "INSERT INTO leagues (external_id, name, league_type, season, country, logo_url) \
                     VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
                )
                .bind(league.external_id)
                .bind(&league.name)
                .bind(&league.league_type)
                .bind(league.season)
                .bind(&league.country)
                .bind(&league.logo_url)
                .fetch_one(&self.pool)
                .await?
            }
        };
        Ok(saved)
    }
}

#[async_trait]
impl ClubRepository for PgStore {
    async fn find_by_external_id(&self, external_id: i64) -> Result<Option<Club>> {
        let club = sqlx::query_as::<_, Club>("SELECT * FROM clubs WHERE external_id = $1")
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(club)
    }

    async fn find_by_name_ignore_case(&self, name: &str) -> Result<Option<Club>> {
        let club = sqlx::query_as::<_, Club>("SELECT * FROM clubs WHERE LOWER(name) = LOWER($1)")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(club)
    }

    async fn find_in_league(&self, league_id: i64) -> Result<Vec<Club>> {
        let clubs = sqlx::query_as::<_, Club>(
            "SELECT * FROM clubs WHERE id IN \
             (SELECT DISTINCT club_id FROM player_statistics WHERE league_id = $1) ORDER BY id",
        )
        .bind(league_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(clubs)
    }

    async fn save(&self, club: Club) -> Result<Club> {
        let saved = match club.id {
            Some(id) => {
                sqlx::query_as::<_, Club>(
                    "UPDATE clubs SET external_id = $2, name = $3, country = $4, is_national = $5, \
                     founded = $6, stadium_name = $7, stadium_city = $8, stadium_capacity = $9, \
                     logo_url = $10 WHERE id = $1 RETURNING *",
                )
                .bind(id)
                .bind(club.external_id)
                .bind(&club.name)
                .bind(&club.country)
                .bind(club.is_national)
                .bind(club.founded)
                .bind(&club.stadium_name)
                .bind(&club.stadium_city)
                .bind(club.stadium_capacity)
                .bind(&club.logo_url)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Club>(
                    "INSERT INTO clubs (external_id, name, country, is_national, founded, \
                     stadium_name, stadium_city, stadium_capacity, logo_url) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
                )
                .bind(club.external_id)
                .bind(&club.name)
                .bind(&club.country)
                .bind(club.is_national)
                .bind(club.founded)
                .bind(&club.stadium_name)
                .bind(&club.stadium_city)
                .bind(club.stadium_capacity)
                .bind(&club.logo_url)
                .fetch_one(&self.pool)
                .await?
            }
        };
        Ok(saved)
    }
}

#[async_trait]
impl CountryRepository for PgStore {
    async fn find_by_name_ignore_case(&self, name: &str) -> Result<Option<Country>> {
        let country =
            sqlx::query_as::<_, Country>("SELECT * FROM countries WHERE LOWER(name) = LOWER($1)")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;
        Ok(country)
    }

    async fn save(&self, country: Country) -> Result<Country> {
        let saved = sqlx::query_as::<_, Country>(
            "INSERT INTO countries (name, code, flag_url) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&country.name)
        .bind(&country.code)
        .bind(&country.flag_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }
}

#[async_trait]
impl PlayerRepository for PgStore {
    async fn find_by_external_id(&self, external_id: i64) -> Result<Option<Player>> {
        let player = sqlx::query_as::<_, Player>("SELECT * FROM players WHERE external_id = $1")
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(player)
    }

    async fn exists_by_external_id(&self, external_id: i64) -> Result<bool> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM players WHERE external_id = $1)")
                .bind(external_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists.0)
    }

    async fn save(&self, player: Player) -> Result<Player> {
        let saved = match player.id {
            Some(id) => {
                sqlx::query_as::<_, Player>(
                    "UPDATE players SET external_id = $2, name = $3, first_name = $4, \
                     last_name = $5, date_of_birth = $6, nationality = $7, height_cm = $8, \
                     weight_kg = $9, position = $10, photo_url = $11, current_club_id = $12 \
                     WHERE id = $1 RETURNING *",
                )
                .bind(id)
                .bind(player.external_id)
                .bind(&player.name)
                .bind(&player.first_name)
                .bind(&player.last_name)
                .bind(player.date_of_birth)
                .bind(&player.nationality)
                .bind(player.height_cm)
                .bind(player.weight_kg)
                .bind(&player.position)
                .bind(&player.photo_url)
                .bind(player.current_club_id)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Player>(
                    "INSERT INTO players (external_id, name, first_name, last_name, date_of_birth, \
                     nationality, height_cm, weight_kg, position, photo_url, current_club_id) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING *",
                )
                .bind(player.external_id)
                .bind(&player.name)
                .bind(&player.first_name)
                .bind(&player.last_name)
                .bind(player.date_of_birth)
                .bind(&player.nationality)
                .bind(player.height_cm)
                .bind(player.weight_kg)
                .bind(&player.position)
                .bind(&player.photo_url)
                .bind(player.current_club_id)
                .fetch_one(&self.pool)
                .await?
            }
        };
        Ok(saved)
    }
}

#[async_trait]
impl StatisticRepository for PgStore {
    async fn find_by_key(
        &self,
        player_id: i64,
        club_id: i64,
        league_id: i64,
        season: i32,
    ) -> Result<Option<PlayerStatistic>> {
        let statistic = sqlx::query_as::<_, PlayerStatistic>(
            "SELECT * FROM player_statistics \
             WHERE player_id = $1 AND club_id = $2 AND league_id = $3 AND season = $4",
        )
        .bind(player_id)
        .bind(club_id)
        .bind(league_id)
        .bind(season)
        .fetch_optional(&self.pool)
        .await?;
        Ok(statistic)
    }

    async fn find_by_player(&self, player_id: i64) -> Result<Vec<PlayerStatistic>> {
        let statistics = sqlx::query_as::<_, PlayerStatistic>(
            "SELECT * FROM player_statistics WHERE player_id = $1 ORDER BY season",
        )
        .bind(player_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(statistics)
    }

    async fn save(&self, statistic: PlayerStatistic) -> Result<PlayerStatistic> {
        let saved = sqlx::query_as::<_, PlayerStatistic>(
            "INSERT INTO player_statistics (player_id, club_id, league_id, season, appearances, \
             lineups, minutes, position, rating, captain, goals, goals_conceded, assists, saves, \
             shots_total, shots_on_target, passes_total, key_passes, pass_accuracy, tackles, \
             blocks, interceptions, duels_total, duels_won, dribbles_attempted, \
             dribbles_succeeded, fouls_drawn, fouls_committed, yellow_cards, red_cards, \
             penalties_scored, penalties_missed) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, \
             $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30, $31, $32) \
             ON CONFLICT (player_id, club_id, league_id, season) DO UPDATE SET \
             appearances = EXCLUDED.appearances, lineups = EXCLUDED.lineups, \
             minutes = EXCLUDED.minutes, position = EXCLUDED.position, \
             rating = EXCLUDED.rating, captain = EXCLUDED.captain, goals = EXCLUDED.goals, \
             goals_conceded = EXCLUDED.goals_conceded, assists = EXCLUDED.assists, \
             saves = EXCLUDED.saves, shots_total = EXCLUDED.shots_total, \
             shots_on_target = EXCLUDED.shots_on_target, passes_total = EXCLUDED.passes_total, \
             key_passes = EXCLUDED.key_passes, pass_accuracy = EXCLUDED.pass_accuracy, \
             tackles = EXCLUDED.tackles, blocks = EXCLUDED.blocks, \
             interceptions = EXCLUDED.interceptions, duels_total = EXCLUDED.duels_total, \
             duels_won = EXCLUDED.duels_won, dribbles_attempted = EXCLUDED.dribbles_attempted, \
             dribbles_succeeded = EXCLUDED.dribbles_succeeded, fouls_drawn = EXCLUDED.fouls_drawn, \
             fouls_committed = EXCLUDED.fouls_committed, yellow_cards = EXCLUDED.yellow_cards, \
             red_cards = EXCLUDED.red_cards, penalties_scored = EXCLUDED.penalties_scored, \
             penalties_missed = EXCLUDED.penalties_missed \
             RETURNING *",
        )
        .bind(statistic.player_id)
        .bind(statistic.club_id)
        .bind(statistic.league_id)
        .bind(statistic.season)
        .bind(statistic.appearances)
        .bind(statistic.lineups)
        .bind(statistic.minutes)
        .bind(&statistic.position)
        .bind(&statistic.rating)
        .bind(statistic.captain)
        .bind(statistic.goals)
        .bind(statistic.goals_conceded)
        .bind(statistic.assists)
        .bind(statistic.saves)
        .bind(statistic.shots_total)
        .bind(statistic.shots_on_target)
        .bind(statistic.passes_total)
        .bind(statistic.key_passes)
        .bind(statistic.pass_accuracy)
        .bind(statistic.tackles)
        .bind(statistic.blocks)
        .bind(statistic.interceptions)
        .bind(statistic.duels_total)
        .bind(statistic.duels_won)
        .bind(statistic.dribbles_attempted)
        .bind(statistic.dribbles_succeeded)
        .bind(statistic.fouls_drawn)
        .bind(statistic.fouls_committed)
        .bind(statistic.yellow_cards)
        .bind(statistic.red_cards)
        .bind(statistic.penalties_scored)
        .bind(statistic.penalties_missed)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }
}

#[async_trait]
impl TransferRepository for PgStore {
    async fn find_matching(
        &self,
        player_id: i64,
        transfer_date: Option<NaiveDate>,
        club_from_id: Option<i64>,
        club_to_id: Option<i64>,
    ) -> Result<Option<PlayerTransfer>> {
        let transfer = sqlx::query_as::<_, PlayerTransfer>(
            "SELECT * FROM player_transfers WHERE player_id = $1 \
             AND transfer_date IS NOT DISTINCT FROM $2 \
             AND club_from_id IS NOT DISTINCT FROM $3 \
             AND club_to_id IS NOT DISTINCT FROM $4",
        )
        .bind(player_id)
        .bind(transfer_date)
        .bind(club_from_id)
        .bind(club_to_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(transfer)
    }

    async fn find_by_player(&self, player_id: i64) -> Result<Vec<PlayerTransfer>> {
        let transfers = sqlx::query_as::<_, PlayerTransfer>(
            "SELECT * FROM player_transfers WHERE player_id = $1 ORDER BY transfer_date",
        )
        .bind(player_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(transfers)
    }

    async fn save(&self, transfer: PlayerTransfer) -> Result<PlayerTransfer> {
        if let Some(existing) = self
            .find_matching(
                transfer.player_id,
                transfer.transfer_date,
                transfer.club_from_id,
                transfer.club_to_id,
            )
            .await?
        {
            return Ok(existing);
        }

        let saved = sqlx::query_as::<_, PlayerTransfer>(
            "INSERT INTO player_transfers (player_id, transfer_date, transfer_type, club_from_id, \
             club_to_id) VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(transfer.player_id)
        .bind(transfer.transfer_date)
        .bind(&transfer.transfer_type)
        .bind(transfer.club_from_id)
        .bind(transfer.club_to_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }
}

#[async_trait]
impl InjuryRepository for PgStore {
    async fn find_by_player(&self, player_id: i64) -> Result<Vec<PlayerInjury>> {
        let injuries = sqlx::query_as::<_, PlayerInjury>(
            "SELECT * FROM player_injuries WHERE player_id = $1",
        )
        .bind(player_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(injuries)
    }

    async fn save(&self, injury: PlayerInjury) -> Result<PlayerInjury> {
        let saved = sqlx::query_as::<_, PlayerInjury>(
            "INSERT INTO player_injuries (player_id, injury_type, reason, season) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(injury.player_id)
        .bind(&injury.injury_type)
        .bind(&injury.reason)
        .bind(injury.season)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }
}

#[async_trait]
impl SidelinedRepository for PgStore {
    async fn find_by_player(&self, player_id: i64) -> Result<Vec<PlayerSidelined>> {
        let rows = sqlx::query_as::<_, PlayerSidelined>(
            "SELECT * FROM player_sidelined WHERE player_id = $1",
        )
        .bind(player_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn save(&self, sidelined: PlayerSidelined) -> Result<PlayerSidelined> {
        let saved = sqlx::query_as::<_, PlayerSidelined>(
            "INSERT INTO player_sidelined (player_id, sidelined_type, start_date, end_date) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(sidelined.player_id)
        .bind(&sidelined.sidelined_type)
        .bind(sidelined.start_date)
        .bind(sidelined.end_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }
}

#[async_trait]
impl TrophyRepository for PgStore {
    async fn find_by_player(&self, player_id: i64) -> Result<Vec<PlayerTrophy>> {
        let rows = sqlx::query_as::<_, PlayerTrophy>(
            "SELECT * FROM player_trophies WHERE player_id = $1",
        )
        .bind(player_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn save(&self, trophy: PlayerTrophy) -> Result<PlayerTrophy> {
        let saved = sqlx::query_as::<_, PlayerTrophy>(
            "INSERT INTO player_trophies (player_id, competition, country, season, place) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(trophy.player_id)
        .bind(&trophy.competition)
        .bind(&trophy.country)
        .bind(&trophy.season)
        .bind(&trophy.place)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }
}

impl TalentStore for PgStore {
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
