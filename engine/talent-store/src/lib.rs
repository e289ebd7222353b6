//! Talent Store
//!
//! Persistence seam for the talent-tracking schema: domain entities, the
//! per-entity repository traits the population pipeline writes through, an
//! in-memory implementation for tests and local runs, and a Postgres
//! implementation backed by sqlx.

pub mod entities;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod repository;

pub use entities::*;
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use repository::{
    ClubRepository, CountryRepository, InjuryRepository, LeagueRepository, PlayerRepository,
    SidelinedRepository, StatisticRepository, TalentStore, TransferRepository, TrophyRepository,
};
