//! Cosmic Launch round engine
//!
//! Platform-agnostic core of the Cosmic Launch wagering game: the destination
//! catalog, outcome resolution, the round state machine and its flight
//! choreography. Rendering, sound output and text generation stay with the host.

pub mod account;
pub mod assets;
pub mod audio;
pub mod catalog;
pub mod config;
pub mod constants;
#[cfg(feature = "async")]
pub mod driver;
pub mod money;
pub mod narration;
pub mod resolver;
pub mod rng;
pub mod round;
pub mod sequencer;

use anyhow::Context;

pub use account::PlayerAccount;
pub use assets::{AssetError, JsonAssets, StaticAssets};
pub use audio::{AudioCue, AudioDeck, CueLog, SilentDeck};
pub use catalog::{Catalog, CatalogError, Destination, DestinationId};
pub use config::{ConfigError, GameConfig, SequenceTimings};
#[cfg(feature = "async")]
pub use driver::{CancellationToken, FlightReport, run_flight};
pub use money::Credits;
#[cfg(feature = "async")]
pub use narration::AsyncNarrator;
pub use narration::{
    FallbackNarrator, GuardedNarrator, NarrationBackend, NarrationError, NarrationRequest,
    Narrator, build_prompt, fallback_text,
};
pub use resolver::{RoundOutcome, resolve};
pub use rng::{CountingRng, RngBundle};
pub use round::{FlightView, LaunchRejected, RoundId, RoundMachine, RoundPhase, RoundResult};
pub use sequencer::{SequenceEvent, SequenceStep, Sequencer, pick_decoys};

/// Source of the catalog and session configuration.
/// Hosts provide their own when the stock table is not enough.
pub trait AssetLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the destination catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded or fails validation.
    fn load_catalog(&self) -> Result<Catalog, Self::Error>;

    /// Load the session configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or parsed.
    fn load_config(&self) -> Result<GameConfig, Self::Error>;
}

/// Builds round sessions from a loader.
pub struct LaunchEngine<L: AssetLoader> {
    loader: L,
}

impl<L: AssetLoader> LaunchEngine<L> {
    pub const fn new(loader: L) -> Self {
        Self { loader }
    }

    pub const fn loader(&self) -> &L {
        &self.loader
    }

    /// Open a session with a fresh account at the configured starting stake.
    ///
    /// # Errors
    ///
    /// Returns the loader's error if either asset cannot be loaded.
    pub fn create_session(&self, seed: u64) -> Result<RoundMachine, L::Error> {
        let catalog = self.loader.load_catalog()?;
        let config = self.loader.load_config()?;
        let account = PlayerAccount::new(config.starting_balance);
        Ok(RoundMachine::new(catalog, config, account, seed))
    }

    /// Like [`LaunchEngine::create_session`], re-validating the configuration
    /// and attaching context for the host's error report.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails or the configuration is invalid.
    pub fn create_checked_session(&self, seed: u64) -> anyhow::Result<RoundMachine> {
        let catalog = self
            .loader
            .load_catalog()
            .context("loading destination catalog")?;
        let config = self.loader.load_config().context("loading game config")?;
        config
            .validate()
            .with_context(|| format!("validating game config for seed {seed:#x}"))?;
        let account = PlayerAccount::new(config.starting_balance);
        Ok(RoundMachine::new(catalog, config, account, seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    struct TwoBodyLoader;

    impl AssetLoader for TwoBodyLoader {
        type Error = Infallible;

        fn load_catalog(&self) -> Result<Catalog, Self::Error> {
            let stock = Catalog::standard();
            let pair = [DestinationId::Earth, DestinationId::Mars]
                .into_iter()
                .filter_map(|id| stock.get(id).ok().cloned())
                .collect();
            Ok(Catalog::new(pair).unwrap())
        }

        fn load_config(&self) -> Result<GameConfig, Self::Error> {
            Ok(GameConfig {
                starting_balance: Credits::from_whole(50),
                ..GameConfig::default()
            })
        }
    }

    #[test]
    fn engine_builds_sessions_from_loader() {
        let engine = LaunchEngine::new(TwoBodyLoader);
        let machine = engine.create_session(0xC0FFEE).unwrap();
        assert_eq!(machine.catalog().len(), 2);
        assert_eq!(machine.account().balance(), Credits::from_whole(50));
        assert_eq!(machine.phase(), RoundPhase::Selection);
        assert_eq!(machine.seed(), 0xC0FFEE);
    }

    #[test]
    fn checked_session_reports_invalid_config() {
        let engine = LaunchEngine::new(StaticAssets);
        assert!(engine.create_checked_session(1).is_ok());

        let bad = LaunchEngine::new(JsonAssets::new().with_config(r#"{"score_step": 0}"#));
        let err = bad.create_checked_session(1).unwrap_err();
        assert!(format!("{err:#}").contains("loading game config"));
    }
}
