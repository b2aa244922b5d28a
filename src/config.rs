//! Search configuration and difficulty presets.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::constants::{
    EXPLORATION, EXPLORATION_EASY, EXPLORATION_HARD, EXPLORATION_MEDIUM, N_SIMS, N_SIMS_EASY,
    N_SIMS_HARD, N_SIMS_MEDIUM,
};

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("exploration constant must be a positive finite number (got {0})")]
    Exploration(f64),
    #[error("unknown difficulty '{0}', expected easy, medium or hard")]
    Difficulty(String),
}

/// Parameters for one tree search. Immutable once built.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SearchConfig {
    simulations: u32,
    exploration: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            simulations: N_SIMS,
            exploration: EXPLORATION,
        }
    }
}

impl SearchConfig {
    /// Build a config, rejecting a non-positive or non-finite exploration
    /// constant. A budget of zero simulations is allowed: the tactical
    /// checks still run and the final choice falls back to a random move.
    pub fn new(simulations: u32, exploration: f64) -> Result<Self, ConfigError> {
        if !exploration.is_finite() || exploration <= 0.0 {
            return Err(ConfigError::Exploration(exploration));
        }
        Ok(Self {
            simulations,
            exploration,
        })
    }

    /// Number of select/expand/simulate/backpropagate iterations.
    pub fn simulations(&self) -> u32 {
        self.simulations
    }

    /// UCB1 exploration constant `c`.
    pub fn exploration(&self) -> f64 {
        self.exploration
    }

    /// Same exploration constant, different budget.
    pub fn with_simulations(self, simulations: u32) -> Self {
        Self {
            simulations,
            ..self
        }
    }
}

/// Named presets pairing a simulation budget with an exploration constant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn config(self) -> SearchConfig {
        let (simulations, exploration) = match self {
            Difficulty::Easy => (N_SIMS_EASY, EXPLORATION_EASY),
            Difficulty::Medium => (N_SIMS_MEDIUM, EXPLORATION_MEDIUM),
            Difficulty::Hard => (N_SIMS_HARD, EXPLORATION_HARD),
        };
        SearchConfig {
            simulations,
            exploration,
        }
    }
}

impl FromStr for Difficulty {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ConfigError::Difficulty(s.to_string())),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(name)
    }
}
