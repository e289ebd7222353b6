//! Entity reconciliation
//!
//! Maps freshly parsed records onto persisted rows: find by external id,
//! fetch full details from the vendor when the id is unknown locally, fall
//! back to a case-insensitive name match, and as a last resort persist a
//! sentinel club so no downstream write is ever blocked by an unresolved
//! reference. Resolution runs as an ordered sequence of tagged steps so the
//! priority order stays auditable.

use std::sync::Arc;

use apifootball_client::FootballApi;
use talent_store::{Club, Country, League, PlayerStatistic, PlayerTransfer, TalentStore};
use tracing::{debug, warn};

use crate::budget::ApiCallBudget;
use crate::error::{PopulationError, Result};
use crate::parser;

/// Sentinel club for players with no resolvable club
pub const FREE_AGENT_CLUB: &str = "Free Agent";

/// Sentinel club persisted when resolution failed unexpectedly
pub const ERROR_FALLBACK_CLUB: &str = "Error Fallback Club";

/// Which step of the resolution order produced an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStep {
    /// A persisted row with the candidate's external id existed
    ByExternalId,
    /// Details were fetched from the vendor (or the candidate was persisted
    /// as given when the vendor had nothing)
    ByExternalIdFetch,
    /// Case-insensitive name match, or the candidate persisted under its name
    ByName,
    /// The supplied fallback entity was used
    ByFallback,
    /// A sentinel entity was persisted
    Sentinel,
}

/// Idempotent mapping of parsed records onto persisted rows
pub struct EntityReconciler {
    store: Arc<dyn TalentStore>,
    api: Arc<dyn FootballApi>,
    budget: Arc<ApiCallBudget>,
    current_season: i32,
}

impl EntityReconciler {
    pub fn new(
        store: Arc<dyn TalentStore>,
        api: Arc<dyn FootballApi>,
        budget: Arc<ApiCallBudget>,
        current_season: i32,
    ) -> Self {
        Self { store, api, budget, current_season }
    }

    /// Resolve a league candidate to a persisted row.
    ///
    /// Order: persisted row by external id, vendor fetch by external id
    /// (persisting the candidate as given when the vendor has nothing),
    /// case-insensitive name match, candidate persisted as-is.
    pub async fn resolve_league(&self, candidate: League) -> Result<League> {
        if let Some(external_id) = candidate.external_id {
            if let Some(existing) = self.store.leagues().find_by_external_id(external_id).await? {
                return Ok(existing);
            }

            self.budget.record(1);
            match self.api.league_by_id(external_id as u32).await {
                Ok(Some(entry)) => {
                    if let Some(full) = parser::league_from_entry(&entry, self.current_season) {
                        return Ok(self.store.leagues().save(full).await?);
                    }
                }
                Ok(None) => {}
                Err(e) if e.is_daily_limit() => return Err(e.into()),
                Err(e) => {
                    warn!(external_id, error = %e, "league detail fetch failed, persisting candidate")
                }
            }
            return Ok(self.store.leagues().save(candidate).await?);
        }

        if !candidate.name.is_empty() {
            if let Some(existing) =
                self.store.leagues().find_by_name_ignore_case(&candidate.name).await?
            {
                return Ok(existing);
            }
        }
        Ok(self.store.leagues().save(candidate).await?)
    }

    /// Resolve a club candidate to a persisted row, following the priority
    /// order exactly; any unexpected failure lands on the error-fallback
    /// sentinel instead of surfacing, while the daily-quota signal always
    /// propagates.
    pub async fn resolve_club(
        &self,
        candidate: Club,
        fallback: Option<&Club>,
    ) -> Result<(Club, ResolutionStep)> {
        match self.try_resolve_club(&candidate, fallback).await {
            Ok(resolved) => Ok(resolved),
            Err(e) if e.is_daily_limit() => Err(e),
            Err(e) => {
                warn!(club = %candidate.name, error = %e, "club resolution failed, using error fallback");
                let sentinel = self.sentinel_club(ERROR_FALLBACK_CLUB).await?;
                Ok((sentinel, ResolutionStep::Sentinel))
            }
        }
    }

    async fn try_resolve_club(
        &self,
        candidate: &Club,
        fallback: Option<&Club>,
    ) -> Result<(Club, ResolutionStep)> {
        // 1. Persisted row with this external id
        if let Some(external_id) = candidate.external_id {
            if let Some(existing) = self.store.clubs().find_by_external_id(external_id).await? {
                return Ok((existing, ResolutionStep::ByExternalId));
            }

            // 2. Fetch full details; the vendor's team object carries the
            // founded year, stadium and national flag the list contexts lack
            self.budget.record(1);
            match self.api.team_by_id(external_id as u32).await {
                Ok(Some(entry)) => {
                    if let Some(full) = parser::club_from_team(&entry.team, entry.venue.as_ref()) {
                        let saved = self.store.clubs().save(full).await?;
                        return Ok((saved, ResolutionStep::ByExternalIdFetch));
                    }
                }
                Ok(None) => {}
                Err(e) if e.is_daily_limit() => return Err(e.into()),
                Err(e) => {
                    warn!(external_id, error = %e, "team detail fetch failed, persisting candidate")
                }
            }
            let saved = self.store.clubs().save(candidate.clone()).await?;
            return Ok((saved, ResolutionStep::ByExternalIdFetch));
        }

        // 3. Case-insensitive name match, else persist the candidate as-is
        if !candidate.name.is_empty() {
            if let Some(existing) =
                self.store.clubs().find_by_name_ignore_case(&candidate.name).await?
            {
                return Ok((existing, ResolutionStep::ByName));
            }
            let saved = self.store.clubs().save(candidate.clone()).await?;
            return Ok((saved, ResolutionStep::ByName));
        }

        // 4. An already-persisted fallback entity
        if let Some(fallback) = fallback {
            if fallback.id.is_some() {
                return Ok((fallback.clone(), ResolutionStep::ByFallback));
            }
        }

        // 5. Sentinel
        let sentinel = self.sentinel_club(FREE_AGENT_CLUB).await?;
        Ok((sentinel, ResolutionStep::Sentinel))
    }

    /// Find-or-create a club without touching the vendor; used for rosters
    /// whose payload already carries full team details
    pub async fn ensure_club(&self, candidate: Club) -> Result<Club> {
        if let Some(external_id) = candidate.external_id {
            if let Some(existing) = self.store.clubs().find_by_external_id(external_id).await? {
                return Ok(existing);
            }
        }
        if !candidate.name.is_empty() {
            if let Some(existing) =
                self.store.clubs().find_by_name_ignore_case(&candidate.name).await?
            {
                return Ok(existing);
            }
        }
        Ok(self.store.clubs().save(candidate).await?)
    }

    /// Find-or-create a sentinel club by name
    pub async fn sentinel_club(&self, name: &str) -> Result<Club> {
        if let Some(existing) = self.store.clubs().find_by_name_ignore_case(name).await? {
            return Ok(existing);
        }
        let sentinel = Club { name: name.to_string(), ..Default::default() };
        Ok(self.store.clubs().save(sentinel).await?)
    }

    /// Find-or-create a country by name, fetching code/flag details from the
    /// vendor on first sight
    pub async fn resolve_country(&self, name: &str) -> Result<Option<Country>> {
        if let Some(existing) = self.store.countries().find_by_name_ignore_case(name).await? {
            return Ok(Some(existing));
        }

        self.budget.record(1);
        match self.api.country_by_name(name).await {
            Ok(Some(entry)) => {
                if let Some(country) = parser::country_from_entry(&entry) {
                    return Ok(Some(self.store.countries().save(country).await?));
                }
            }
            Ok(None) => {}
            Err(e) if e.is_daily_limit() => return Err(e.into()),
            Err(e) => warn!(name, error = %e, "country fetch failed"),
        }

        // Persist what we know so the next run does not refetch
        let country = Country { name: name.to_string(), ..Default::default() };
        Ok(Some(self.store.countries().save(country).await?))
    }

    /// Upsert a statistic on its (player, club, league, season) composite
    /// key: overwrite scalars in place when the key exists, insert otherwise
    pub async fn upsert_statistic(
        &self,
        player_id: i64,
        club_id: i64,
        league_id: i64,
        season: i32,
        scalars: &PlayerStatistic,
    ) -> Result<PlayerStatistic> {
        let existing =
            self.store.statistics().find_by_key(player_id, club_id, league_id, season).await?;

        let row = match existing {
            Some(mut row) => {
                debug!(player_id, club_id, league_id, season, "updating statistic in place");
                row.overwrite_scalars(scalars);
                row
            }
            None => {
                let mut row = scalars.clone();
                row.id = None;
                row.player_id = player_id;
                row.club_id = club_id;
                row.league_id = league_id;
                row.season = season;
                row
            }
        };

        Ok(self.store.statistics().save(row).await?)
    }

    /// Persist a transfer unless the identical (player, date, from, to)
    /// tuple already exists; returns whether a row was written
    pub async fn record_transfer(&self, transfer: PlayerTransfer) -> Result<bool> {
        let existing = self
            .store
            .transfers()
            .find_matching(
                transfer.player_id,
                transfer.transfer_date,
                transfer.club_from_id,
                transfer.club_to_id,
            )
            .await?;
        if existing.is_some() {
            return Ok(false);
        }
        self.store.transfers().save(transfer).await?;
        Ok(true)
    }
}
