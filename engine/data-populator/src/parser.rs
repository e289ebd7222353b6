//! Vendor payload → domain record conversion
//!
//! Pure functions, one per entity shape. Each is tolerant of missing or
//! malformed fields: a field that cannot be interpreted is logged and left
//! unset, and never aborts the surrounding entity.

use std::str::FromStr;

use apifootball_client::{
    ApiLeague, ApiStatistic, ApiTeam, ApiTransfer, ApiVenue, CountryEntry, InjuryEntry,
    LeagueEntry, PlayerEntry, SidelinedEntry, TransferEntry, TrophyEntry,
};
use bigdecimal::{BigDecimal, RoundingMode};
use chrono::NaiveDate;
use talent_store::{
    Club, Country, League, Player, PlayerInjury, PlayerSidelined, PlayerStatistic, PlayerTrophy,
};
use tracing::{debug, warn};

/// Downstream country-code columns are fixed width
pub const COUNTRY_CODE_MAX_LEN: usize = 10;

/// A statistic block with its club/league candidates still unresolved
#[derive(Debug, Clone, Default)]
pub struct ParsedStatistic {
    pub club: Option<Club>,
    pub league: Option<League>,
    pub season: i32,
    /// Scalar fields populated; composite-key ids are assigned by the
    /// reconciler
    pub stat: PlayerStatistic,
}

/// A transfer move with its club candidates still unresolved
#[derive(Debug, Clone, Default)]
pub struct ParsedTransfer {
    pub date: Option<NaiveDate>,
    pub transfer_type: Option<String>,
    pub club_from: Option<Club>,
    pub club_to: Option<Club>,
}

/// Parse a measurement like "184 cm" / "78 kg". Only strings carrying the
/// expected unit suffix are interpreted.
pub fn parse_measurement(raw: Option<&str>, suffix: &str) -> Option<i32> {
    let raw = raw?.trim();
    let Some(value) = raw.strip_suffix(suffix) else {
        debug!(raw, suffix, "measurement lacks unit suffix, leaving unset");
        return None;
    };
    match value.trim().parse::<i32>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(raw, "unparsable measurement, leaving unset");
            None
        }
    }
}

/// Parse an ISO-8601 `YYYY-MM-DD` date
pub fn parse_iso_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?.trim();
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            warn!(raw, "unparsable date, leaving unset");
            None
        }
    }
}

/// Parse the vendor's decimal rating string; invalid values are dropped
/// silently
pub fn parse_rating(raw: Option<&str>) -> Option<BigDecimal> {
    let raw = raw?.trim();
    BigDecimal::from_str(raw).ok().map(|r| r.with_scale_round(2, RoundingMode::HalfUp))
}

/// Truncate a country code to the fixed downstream width
pub fn truncate_country_code(code: Option<String>) -> Option<String> {
    let code = code?;
    if code.len() > COUNTRY_CODE_MAX_LEN {
        warn!(%code, "country code exceeds {COUNTRY_CODE_MAX_LEN} chars, truncating");
        Some(code.chars().take(COUNTRY_CODE_MAX_LEN).collect())
    } else {
        Some(code)
    }
}

/// Completed years between `date_of_birth` and `today`
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> u32 {
    today.years_since(date_of_birth).unwrap_or(0)
}

/// Age-eligibility rule: retained while `age <= max_age`. A player turning
/// `max_age + 1` exactly today is no longer eligible.
pub fn is_age_eligible(date_of_birth: NaiveDate, today: NaiveDate, max_age: u32) -> bool {
    age_on(date_of_birth, today) <= max_age
}

/// Build a league record from a `/leagues` entry. The season comes from the
/// vendor's "current" season when declared, else the newest listed season,
/// else the configured default.
pub fn league_from_entry(entry: &LeagueEntry, default_season: i32) -> Option<League> {
    let name = entry.league.name.clone()?;
    let season = entry
        .seasons
        .iter()
        .find(|s| s.current == Some(true))
        .and_then(|s| s.year)
        .or_else(|| entry.seasons.iter().filter_map(|s| s.year).max())
        .unwrap_or(default_season);

    Some(League {
        id: None,
        external_id: entry.league.id,
        name,
        league_type: entry.league.league_type.clone(),
        season: Some(season),
        country: entry.country.as_ref().and_then(|c| c.name.clone()),
        logo_url: entry.league.logo.clone(),
    })
}

/// Build a league candidate from the inline league object of a statistic
/// block
pub fn league_from_ref(league: &ApiLeague, default_season: i32) -> Option<League> {
    let name = league.name.clone()?;
    Some(League {
        id: None,
        external_id: league.id,
        name,
        league_type: league.league_type.clone(),
        season: Some(league.season.unwrap_or(default_season)),
        country: league.country.clone(),
        logo_url: league.logo.clone(),
    })
}

/// Build a club record from a `/teams` entry
pub fn club_from_team(team: &ApiTeam, venue: Option<&ApiVenue>) -> Option<Club> {
    let name = team.name.clone()?;
    Some(Club {
        id: None,
        external_id: team.id,
        name,
        country: team.country.clone(),
        is_national: team.national.unwrap_or(false),
        founded: team.founded,
        stadium_name: venue.and_then(|v| v.name.clone()),
        stadium_city: venue.and_then(|v| v.city.clone()),
        stadium_capacity: venue.and_then(|v| v.capacity),
        logo_url: team.logo.clone(),
    })
}

/// Build a country record from a `/countries` entry
pub fn country_from_entry(entry: &CountryEntry) -> Option<Country> {
    let name = entry.name.clone()?;
    Some(Country {
        id: None,
        name,
        code: truncate_country_code(entry.code.clone()),
        flag_url: entry.flag.clone(),
    })
}

/// Build a player record from a `/players` entry. Requires the vendor id and
/// name; everything else is optional.
pub fn player_from_entry(entry: &PlayerEntry) -> Option<Player> {
    let external_id = entry.player.id?;
    let name = entry.player.name.clone()?;

    Some(Player {
        id: None,
        external_id,
        name,
        first_name: entry.player.firstname.clone(),
        last_name: entry.player.lastname.clone(),
        date_of_birth: parse_iso_date(
            entry.player.birth.as_ref().and_then(|b| b.date.as_deref()),
        ),
        nationality: entry.player.nationality.clone(),
        height_cm: parse_measurement(entry.player.height.as_deref(), "cm"),
        weight_kg: parse_measurement(entry.player.weight.as_deref(), "kg"),
        position: entry
            .statistics
            .iter()
            .find_map(|s| s.games.as_ref().and_then(|g| g.position.clone())),
        photo_url: entry.player.photo.clone(),
        current_club_id: None,
    })
}

/// Convert every statistic block of a `/players` entry
pub fn statistics_from_entry(entry: &PlayerEntry, default_season: i32) -> Vec<ParsedStatistic> {
    entry.statistics.iter().map(|s| statistic_from(s, default_season)).collect()
}

/// Convert one statistic block. The second-yellow dismissal count is folded
/// into the red-card total.
pub fn statistic_from(api: &ApiStatistic, default_season: i32) -> ParsedStatistic {
    let games = api.games.as_ref();
    let goals = api.goals.as_ref();
    let cards = api.cards.as_ref();

    let red_cards = match cards {
        Some(cards) => {
            Some(cards.red.unwrap_or(0) + cards.yellowred.unwrap_or(0))
        }
        None => None,
    };

    let stat = PlayerStatistic {
        appearances: games.and_then(|g| g.appearances),
        lineups: games.and_then(|g| g.lineups),
        minutes: games.and_then(|g| g.minutes),
        position: games.and_then(|g| g.position.clone()),
        rating: parse_rating(games.and_then(|g| g.rating.as_deref())),
        captain: games.and_then(|g| g.captain).unwrap_or(false),
        goals: goals.and_then(|g| g.total),
        goals_conceded: goals.and_then(|g| g.conceded),
        assists: goals.and_then(|g| g.assists),
        saves: goals.and_then(|g| g.saves),
        shots_total: api.shots.as_ref().and_then(|s| s.total),
        shots_on_target: api.shots.as_ref().and_then(|s| s.on),
        passes_total: api.passes.as_ref().and_then(|p| p.total),
        key_passes: api.passes.as_ref().and_then(|p| p.key),
        pass_accuracy: api.passes.as_ref().and_then(|p| p.accuracy),
        tackles: api.tackles.as_ref().and_then(|t| t.total),
        blocks: api.tackles.as_ref().and_then(|t| t.blocks),
        interceptions: api.tackles.as_ref().and_then(|t| t.interceptions),
        duels_total: api.duels.as_ref().and_then(|d| d.total),
        duels_won: api.duels.as_ref().and_then(|d| d.won),
        dribbles_attempted: api.dribbles.as_ref().and_then(|d| d.attempts),
        dribbles_succeeded: api.dribbles.as_ref().and_then(|d| d.success),
        fouls_drawn: api.fouls.as_ref().and_then(|f| f.drawn),
        fouls_committed: api.fouls.as_ref().and_then(|f| f.committed),
        yellow_cards: cards.and_then(|c| c.yellow),
        red_cards,
        penalties_scored: api.penalty.as_ref().and_then(|p| p.scored),
        penalties_missed: api.penalty.as_ref().and_then(|p| p.missed),
        ..Default::default()
    };

    ParsedStatistic {
        club: api.team.as_ref().and_then(|t| club_from_team(t, None)),
        league: api.league.as_ref().and_then(|l| league_from_ref(l, default_season)),
        season: api.league.as_ref().and_then(|l| l.season).unwrap_or(default_season),
        stat,
    }
}

/// Convert the moves of a `/transfers` entry
pub fn transfers_from_entry(entry: &TransferEntry) -> Vec<ParsedTransfer> {
    entry.transfers.iter().map(transfer_from).collect()
}

fn transfer_from(api: &ApiTransfer) -> ParsedTransfer {
    let teams = api.teams.as_ref();
    ParsedTransfer {
        date: parse_iso_date(api.date.as_deref()),
        transfer_type: api.transfer_type.clone(),
        club_from: teams
            .and_then(|t| t.club_out.as_ref())
            .and_then(|team| club_from_team(team, None)),
        club_to: teams
            .and_then(|t| t.club_in.as_ref())
            .and_then(|team| club_from_team(team, None)),
    }
}

/// Convert a `/injuries` entry into a child record for `player_id`
pub fn injury_from_entry(entry: &InjuryEntry, player_id: i64, season: i32) -> PlayerInjury {
    PlayerInjury {
        id: None,
        player_id,
        injury_type: entry.player.as_ref().and_then(|p| p.injury_type.clone()),
        reason: entry.player.as_ref().and_then(|p| p.reason.clone()),
        season: Some(season),
    }
}

/// Convert a `/sidelined` entry into a child record for `player_id`
pub fn sidelined_from_entry(entry: &SidelinedEntry, player_id: i64) -> PlayerSidelined {
    PlayerSidelined {
        id: None,
        player_id,
        sidelined_type: entry.sidelined_type.clone(),
        start_date: parse_iso_date(entry.start.as_deref()),
        end_date: parse_iso_date(entry.end.as_deref()),
    }
}

/// Convert a `/trophies` entry into a child record for `player_id`
pub fn trophy_from_entry(entry: &TrophyEntry, player_id: i64) -> PlayerTrophy {
    PlayerTrophy {
        id: None,
        player_id,
        competition: entry.league.clone(),
        country: entry.country.clone(),
        season: entry.season.clone(),
        place: entry.place.clone(),
    }
}
