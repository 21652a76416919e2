use rayon::prelude::*;
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use tracing::{info, warn};

use crate::engine::build_player_summary;
use crate::error::{StatsError, StatsResult, parse_player_id};
use crate::ranking::{LeagueSnapshot, RankReport, rank_player};
use crate::repository::EventRepository;
use crate::summary::PlayerCareerSummary;

/// Players beyond this many in one request are dropped without error.
pub const MAX_COMPARED_PLAYERS: usize = 4;

#[derive(Debug)]
pub struct ComparisonEntry {
    /// The id as the caller sent it.
    pub requested_id: String,
    pub summary: StatsResult<PlayerCareerSummary>,
    pub ranks: StatsResult<RankReport>,
}

impl ComparisonEntry {
    pub fn is_complete(&self) -> bool {
        self.summary.is_ok() && self.ranks.is_ok()
    }
}

#[derive(Debug, Serialize)]
pub struct PlayerComparison {
    pub players: Vec<ComparisonEntry>,
}

/// Summaries and ranks side by side, in request order.
///
/// One snapshot serves the whole batch. Each entry succeeds or fails on its own;
/// only a failure to read the population itself aborts the call.
pub fn compare_players<R, S>(repo: &R, player_ids: &[S]) -> StatsResult<PlayerComparison>
where
    R: EventRepository + ?Sized,
    S: AsRef<str> + Sync,
{
    if player_ids.is_empty() {
        return Err(StatsError::invalid_input("", "comparison needs at least one player id"));
    }
    let requested = &player_ids[..player_ids.len().min(MAX_COMPARED_PLAYERS)];
    if requested.len() < player_ids.len() {
        info!(
            requested = player_ids.len(),
            kept = requested.len(),
            "comparison truncated"
        );
    }

    let snapshot = LeagueSnapshot::build(repo)?;

    let players: Vec<ComparisonEntry> = requested
        .par_iter()
        .map(|raw| compare_one(repo, raw.as_ref(), &snapshot))
        .collect();

    for entry in players.iter().filter(|e| !e.is_complete()) {
        let reason = entry
            .summary
            .as_ref()
            .err()
            .or(entry.ranks.as_ref().err())
            .map(|err| err.to_string())
            .unwrap_or_default();
        warn!(player = %entry.requested_id, %reason, "comparison entry incomplete");
    }

    Ok(PlayerComparison { players })
}

fn compare_one<R: EventRepository + ?Sized>(
    repo: &R,
    raw_id: &str,
    snapshot: &LeagueSnapshot,
) -> ComparisonEntry {
    let (summary, ranks) = match parse_player_id(raw_id) {
        Ok(player_id) => (
            build_player_summary(repo, player_id),
            rank_player(player_id, snapshot),
        ),
        Err(err) => {
            let reason = match &err {
                StatsError::InvalidInput { reason, .. } => reason.clone(),
                other => other.to_string(),
            };
            (Err(err), Err(StatsError::invalid_input(raw_id, reason)))
        }
    };
    ComparisonEntry {
        requested_id: raw_id.to_string(),
        summary,
        ranks,
    }
}

impl Serialize for ComparisonEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("requestedID", &self.requested_id)?;
        match &self.summary {
            Ok(summary) => map.serialize_entry("summary", summary)?,
            Err(err) => map.serialize_entry("summary", &ErrorEnvelope::from(err))?,
        }
        match &self.ranks {
            Ok(ranks) => map.serialize_entry("ranks", ranks)?,
            Err(err) => map.serialize_entry("ranks", &ErrorEnvelope::from(err))?,
        }
        map.end()
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: crate::error::ErrorReport,
}

impl From<&StatsError> for ErrorEnvelope {
    fn from(err: &StatsError) -> Self {
        Self { error: err.report() }
    }
}
