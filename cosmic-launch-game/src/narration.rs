//! Narration boundary.
//!
//! The narrator produces one sentence describing a resolved round. Remote
//! generation may fail or be unconfigured; nothing past [`Narrator`] is
//! allowed to fail, so every failure class maps to a deterministic fallback.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::DestinationId;
use crate::constants::CURRENCY_TAG;
use crate::money::Credits;
use crate::resolver::RoundOutcome;

/// Input to a narration call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrationRequest {
    pub chosen: DestinationId,
    pub impact: DestinationId,
    pub won: bool,
    /// Absolute payout delta of the round.
    pub amount: Credits,
}

impl From<&RoundOutcome> for NarrationRequest {
    fn from(outcome: &RoundOutcome) -> Self {
        Self {
            chosen: outcome.chosen,
            impact: outcome.impact,
            won: outcome.won,
            amount: outcome.amount(),
        }
    }
}

/// Failure classes a text-generation backend can report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NarrationError {
    #[error("narration credentials are not configured")]
    MissingCredentials,
    #[error("narration backend returned no text")]
    EmptyResponse,
    #[error("narration backend unavailable: {0}")]
    Unavailable(String),
}

/// Infallible narration contract consumed by the flight sequence.
pub trait Narrator {
    fn narrate(&self, request: &NarrationRequest) -> String;
}

/// Fallible text generator behind a [`GuardedNarrator`].
pub trait NarrationBackend {
    /// Generate narration for a fully rendered prompt.
    ///
    /// # Errors
    ///
    /// Returns a [`NarrationError`] describing why no text was produced.
    fn generate(&self, prompt: &str) -> Result<String, NarrationError>;
}

/// Deterministic text used when narration cannot be generated.
#[must_use]
pub fn fallback_text(request: &NarrationRequest, cause: &NarrationError) -> String {
    match (cause, request.won) {
        (NarrationError::MissingCredentials, true) => format!(
            "Fortune favors the bold! You claimed {} {CURRENCY_TAG}.",
            request.amount
        ),
        (NarrationError::MissingCredentials, false) => {
            "The heavens demand a toll. Your entire stake is lost.".to_string()
        }
        (NarrationError::EmptyResponse, true) => {
            "The treasury of the heavens opens for you.".to_string()
        }
        (NarrationError::EmptyResponse, false) => {
            "Greed is a heavy anchor in the celestial sea.".to_string()
        }
        (NarrationError::Unavailable(_), true) => "A fortunate strike in the dark.".to_string(),
        (NarrationError::Unavailable(_), false) => "The stars do not care for your gold.".to_string(),
    }
}

/// Render the generation prompt for a round.
#[must_use]
pub fn build_prompt(request: &NarrationRequest) -> String {
    let outcome = if request.won {
        format!("SUCCESS (won {} {CURRENCY_TAG} profit)", request.amount)
    } else {
        format!("FAILURE (lost the entire {} {CURRENCY_TAG} stake)", request.amount)
    };
    format!(
        "You narrate a high-stakes wagering game called COSMIC LAUNCH. \
         The player wagered celestial wealth ({CURRENCY_TAG}) on a rocket launch. \
         They aimed for {chosen}. The rocket struck {impact}. The outcome is {outcome}. \
         Write one short, epic, atmospheric sentence about risk, greed, and the whims \
         of the stars. Avoid common congratulatory words.",
        chosen = request.chosen,
        impact = request.impact,
    )
}

/// Adapts a fallible backend to the infallible [`Narrator`] contract.
#[derive(Debug, Clone)]
pub struct GuardedNarrator<B> {
    backend: B,
}

impl<B: NarrationBackend> GuardedNarrator<B> {
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: NarrationBackend> Narrator for GuardedNarrator<B> {
    fn narrate(&self, request: &NarrationRequest) -> String {
        let prompt = build_prompt(request);
        let generated = self.backend.generate(&prompt).and_then(|text| {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Err(NarrationError::EmptyResponse)
            } else {
                Ok(trimmed.to_string())
            }
        });
        match generated {
            Ok(text) => text,
            Err(err) => {
                log::warn!("narration fell back for {} -> {}: {err}", request.chosen, request.impact);
                fallback_text(request, &err)
            }
        }
    }
}

/// Narrator for deployments without generation credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackNarrator;

impl Narrator for FallbackNarrator {
    fn narrate(&self, request: &NarrationRequest) -> String {
        fallback_text(request, &NarrationError::MissingCredentials)
    }
}

impl<N: Narrator + ?Sized> Narrator for &N {
    fn narrate(&self, request: &NarrationRequest) -> String {
        (**self).narrate(request)
    }
}

/// Async counterpart of [`Narrator`] used by the real-time driver.
#[cfg(feature = "async")]
#[async_trait::async_trait(?Send)]
pub trait AsyncNarrator {
    async fn narrate_async(&self, request: NarrationRequest) -> String;
}

#[cfg(feature = "async")]
#[async_trait::async_trait(?Send)]
impl<N: Narrator> AsyncNarrator for N {
    async fn narrate_async(&self, request: NarrationRequest) -> String {
        Narrator::narrate(self, &request)
    }
}
