use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ConfigError;

/// Parent selection scheme used by the experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Selection {
    Tournament,
    Lexicase,
    Sharing,
    Roulette,
    Random,
}

impl Selection {
    pub const ALL: [Selection; 5] = [
        Selection::Tournament,
        Selection::Lexicase,
        Selection::Sharing,
        Selection::Roulette,
        Selection::Random,
    ];

    /// Whether `tournament_size` takes part in this scheme.
    pub fn uses_tournament_size(self) -> bool {
        matches!(self, Selection::Tournament)
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Tournament => write!(f, "tournament"),
            Selection::Lexicase => write!(f, "lexicase"),
            Selection::Sharing => write!(f, "sharing"),
            Selection::Roulette => write!(f, "roulette"),
            Selection::Random => write!(f, "random"),
        }
    }
}

pub fn parse_selection(s: &str) -> Result<Selection, ConfigError> {
    match s {
        "tournament" => Ok(Selection::Tournament),
        "lexicase" => Ok(Selection::Lexicase),
        "sharing" => Ok(Selection::Sharing),
        "roulette" => Ok(Selection::Roulette),
        "random" => Ok(Selection::Random),
        _ => Err(ConfigError::InvalidOverride {
            key: "evolution.selection".to_string(),
            reason: format!(
                "unknown selection scheme '{}'. available: tournament, lexicase, sharing, roulette, random",
                s
            ),
        }),
    }
}
