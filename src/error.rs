use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Player,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Player => "player",
        };
        f.write_str(label)
    }
}

/// Failures surfaced by the aggregation and ranking engine.
///
/// Zero denominators are never errors; they resolve to documented default values.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: String },

    #[error("league snapshot is empty, ranks unavailable")]
    EmptyPopulation,

    #[error("invalid input {value:?}: {reason}")]
    InvalidInput { value: String, reason: String },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type StatsResult<T> = std::result::Result<T, StatsError>;

impl StatsError {
    pub fn player_not_found(id: impl ToString) -> Self {
        StatsError::NotFound {
            entity: EntityKind::Player,
            id: id.to_string(),
        }
    }

    pub fn invalid_input(value: impl Into<String>, reason: impl Into<String>) -> Self {
        StatsError::InvalidInput {
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StatsError::NotFound { .. } => "notFound",
            StatsError::EmptyPopulation => "emptyPopulation",
            StatsError::InvalidInput { .. } => "invalidInput",
            StatsError::Storage(_) => "storage",
        }
    }

    /// The offending identifier, when the failure is tied to one.
    pub fn subject(&self) -> Option<&str> {
        match self {
            StatsError::NotFound { id, .. } => Some(id),
            StatsError::InvalidInput { value, .. } => Some(value),
            StatsError::EmptyPopulation | StatsError::Storage(_) => None,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            id: self.subject().map(str::to_string),
            message: format!("{self:#}"),
        }
    }
}

/// Wire form of a failure: kind, offending id, human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub message: String,
}

/// Player ids arrive as text from callers; anything that is not a plain integer is rejected.
pub fn parse_player_id(raw: &str) -> StatsResult<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StatsError::invalid_input(raw, "player id is empty"));
    }
    trimmed
        .parse::<u32>()
        .map_err(|_| StatsError::invalid_input(raw, "player id must be a non-negative integer"))
}
