//! Session configuration: stake, scoring, bet presets, and flight timings.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants;
use crate::money::Credits;

/// Errors raised when configuration invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("starting balance must be positive (got {0})")]
    NonPositiveStake(Credits),
    #[error("score step must be positive (got {0})")]
    NonPositiveScoreStep(i64),
    #[error("{0} must be longer than zero")]
    ZeroDuration(&'static str),
    #[error("at least one bet option is required")]
    EmptyBetOptions,
    #[error("bet option {0} must be positive")]
    NonPositiveBetOption(Credits),
    #[error("config JSON is malformed: {0}")]
    Parse(String),
}

/// Nominal durations of each flight step, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceTimings {
    #[serde(default = "SequenceTimings::default_cruise_ms")]
    pub cruise_ms: u64,
    #[serde(default = "SequenceTimings::default_decoy_pass_ms")]
    pub decoy_pass_ms: u64,
    #[serde(default = "SequenceTimings::default_decoy_gap_ms")]
    pub decoy_gap_ms: u64,
    #[serde(default = "SequenceTimings::default_impact_ms")]
    pub impact_ms: u64,
    #[serde(default = "SequenceTimings::default_settle_ms")]
    pub settle_ms: u64,
}

impl SequenceTimings {
    const fn default_cruise_ms() -> u64 {
        constants::CRUISE_MS
    }

    const fn default_decoy_pass_ms() -> u64 {
        constants::DECOY_PASS_MS
    }

    const fn default_decoy_gap_ms() -> u64 {
        constants::DECOY_GAP_MS
    }

    const fn default_impact_ms() -> u64 {
        constants::IMPACT_MS
    }

    const fn default_settle_ms() -> u64 {
        constants::SETTLE_MS
    }

    /// Total nominal flight time for `decoys` flybys.
    #[must_use]
    pub const fn total_ms(&self, decoys: usize) -> u64 {
        let per_decoy = self.decoy_pass_ms.saturating_add(self.decoy_gap_ms);
        self.cruise_ms
            .saturating_add(per_decoy.saturating_mul(decoys as u64))
            .saturating_add(self.impact_ms)
            .saturating_add(self.settle_ms)
    }

    /// Ensure every step takes time.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroDuration`] naming the first zero-length step.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.cruise_ms == 0 {
            return Err(ConfigError::ZeroDuration("cruise_ms"));
        }
        if self.decoy_pass_ms == 0 {
            return Err(ConfigError::ZeroDuration("decoy_pass_ms"));
        }
        if self.decoy_gap_ms == 0 {
            return Err(ConfigError::ZeroDuration("decoy_gap_ms"));
        }
        if self.impact_ms == 0 {
            return Err(ConfigError::ZeroDuration("impact_ms"));
        }
        if self.settle_ms == 0 {
            return Err(ConfigError::ZeroDuration("settle_ms"));
        }
        Ok(())
    }
}

impl Default for SequenceTimings {
    fn default() -> Self {
        Self {
            cruise_ms: Self::default_cruise_ms(),
            decoy_pass_ms: Self::default_decoy_pass_ms(),
            decoy_gap_ms: Self::default_decoy_gap_ms(),
            impact_ms: Self::default_impact_ms(),
            settle_ms: Self::default_settle_ms(),
        }
    }
}

/// Tunables for a play session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "GameConfig::default_starting_balance")]
    pub starting_balance: Credits,
    #[serde(default = "GameConfig::default_wager")]
    pub default_wager: Credits,
    #[serde(default = "GameConfig::default_score_step")]
    pub score_step: i64,
    #[serde(default = "GameConfig::default_decoy_count")]
    pub decoy_count: usize,
    #[serde(default = "GameConfig::default_bet_options")]
    pub bet_options: Vec<Credits>,
    #[serde(default)]
    pub timings: SequenceTimings,
    #[serde(default = "GameConfig::default_late_narration_grace_ms")]
    pub late_narration_grace_ms: u64,
}

impl GameConfig {
    const fn default_starting_balance() -> Credits {
        Credits::from_cents(constants::STARTING_BALANCE_CENTS)
    }

    const fn default_wager() -> Credits {
        Credits::from_cents(constants::DEFAULT_WAGER_CENTS)
    }

    const fn default_score_step() -> i64 {
        constants::SCORE_STEP
    }

    const fn default_decoy_count() -> usize {
        constants::DECOY_COUNT
    }

    fn default_bet_options() -> Vec<Credits> {
        constants::BET_OPTIONS
            .iter()
            .map(|&units| Credits::from_whole(units))
            .collect()
    }

    const fn default_late_narration_grace_ms() -> u64 {
        constants::LATE_NARRATION_GRACE_MS
    }

    /// Parse a JSON config document, filling omitted fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and any error from
    /// [`GameConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the invariants the state machine relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.starting_balance.is_positive() {
            return Err(ConfigError::NonPositiveStake(self.starting_balance));
        }
        if self.score_step <= 0 {
            return Err(ConfigError::NonPositiveScoreStep(self.score_step));
        }
        if self.bet_options.is_empty() {
            return Err(ConfigError::EmptyBetOptions);
        }
        if let Some(bad) = self.bet_options.iter().find(|opt| !opt.is_positive()) {
            return Err(ConfigError::NonPositiveBetOption(*bad));
        }
        self.timings.validate()
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_balance: Self::default_starting_balance(),
            default_wager: Self::default_wager(),
            score_step: Self::default_score_step(),
            decoy_count: Self::default_decoy_count(),
            bet_options: Self::default_bet_options(),
            timings: SequenceTimings::default(),
            late_narration_grace_ms: Self::default_late_narration_grace_ms(),
        }
    }
}
