//! Round state machine.
//!
//! [`RoundMachine`] owns the authoritative session state and cycles
//! `Selection -> Launching -> Result -> Selection`. The outcome is fixed
//! when a launch is accepted; the account is touched exactly once, when the
//! flight sequence reports completion.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::account::PlayerAccount;
use crate::audio::AudioDeck;
use crate::catalog::{Catalog, CatalogError, DestinationId};
use crate::config::GameConfig;
use crate::money::Credits;
use crate::narration::{NarrationError, NarrationRequest, Narrator, fallback_text};
use crate::resolver::{self, RoundOutcome};
use crate::rng::RngBundle;
use crate::sequencer::{SequenceEvent, SequenceEvents, Sequencer, pick_decoys};

/// Phase of the round cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundPhase {
    Selection,
    Launching,
    Result,
}

/// Identifier handed out per accepted launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundId(u64);

impl RoundId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "round #{}", self.0)
    }
}

/// Reasons a launch intent was ignored. None of them change state.
#[derive(Debug, Error, PartialEq)]
pub enum LaunchRejected {
    #[error("launch is only accepted during selection (currently {0:?})")]
    WrongPhase(RoundPhase),
    #[error("no destination selected")]
    NoDestination,
    #[error("wager must be positive (got {0})")]
    NonPositiveWager(Credits),
    #[error("wager {wager} exceeds balance {balance}")]
    InsufficientFunds { wager: Credits, balance: Credits },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Display flags driven by the flight sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightView {
    /// Decoy currently passing by, if any.
    pub passing: Option<DestinationId>,
    /// Body being approached after the reveal.
    pub approaching: Option<DestinationId>,
    pub explosion: bool,
    pub shaking: bool,
}

/// A committed round as shown to the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    pub round: RoundId,
    pub outcome: RoundOutcome,
    pub narration: String,
    /// True while the narration is the deterministic stand-in.
    pub narration_is_fallback: bool,
}

#[derive(Debug, Clone)]
struct Flight {
    id: RoundId,
    outcome: RoundOutcome,
    sequencer: Sequencer,
    narration: Option<String>,
}

/// Session-lifetime owner of the player account and round cycle.
#[derive(Debug, Clone)]
pub struct RoundMachine {
    catalog: Catalog,
    config: GameConfig,
    account: PlayerAccount,
    rng: RngBundle,
    phase: RoundPhase,
    selection: Option<DestinationId>,
    wager: Credits,
    flight: Option<Flight>,
    pending: SequenceEvents,
    result: Option<RoundResult>,
    view: FlightView,
    muted: bool,
    next_round: u64,
    rounds_played: u64,
}

impl RoundMachine {
    #[must_use]
    pub fn new(catalog: Catalog, config: GameConfig, account: PlayerAccount, seed: u64) -> Self {
        let wager = config.default_wager;
        Self {
            catalog,
            config,
            account,
            rng: RngBundle::from_user_seed(seed),
            phase: RoundPhase::Selection,
            selection: None,
            wager,
            flight: None,
            pending: SequenceEvents::new(),
            result: None,
            view: FlightView::default(),
            muted: false,
            next_round: 1,
            rounds_played: 0,
        }
    }

    /// Session over the stock catalog and default configuration.
    #[must_use]
    pub fn with_standard(seed: u64) -> Self {
        let config = GameConfig::default();
        let account = PlayerAccount::new(config.starting_balance);
        Self::new(Catalog::standard(), config, account, seed)
    }

    // Observers

    #[must_use]
    pub const fn phase(&self) -> RoundPhase {
        self.phase
    }

    #[must_use]
    pub const fn account(&self) -> &PlayerAccount {
        &self.account
    }

    #[must_use]
    pub const fn selection(&self) -> Option<DestinationId> {
        self.selection
    }

    #[must_use]
    pub const fn wager(&self) -> Credits {
        self.wager
    }

    /// Outcome of the round in flight, or of the result on display.
    #[must_use]
    pub fn outcome(&self) -> Option<&RoundOutcome> {
        self.flight
            .as_ref()
            .map(|flight| &flight.outcome)
            .or_else(|| self.result.as_ref().map(|result| &result.outcome))
    }

    #[must_use]
    pub const fn result(&self) -> Option<&RoundResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub const fn view(&self) -> &FlightView {
        &self.view
    }

    #[must_use]
    pub const fn is_muted(&self) -> bool {
        self.muted
    }

    #[must_use]
    pub const fn rounds_played(&self) -> u64 {
        self.rounds_played
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Configured bet presets, each paired with whether the balance covers it.
    pub fn bet_options(&self) -> impl Iterator<Item = (Credits, bool)> + '_ {
        self.config
            .bet_options
            .iter()
            .map(move |&amount| (amount, self.account.can_cover(amount)))
    }

    /// Identifier of the round currently in flight.
    #[must_use]
    pub fn current_round(&self) -> Option<RoundId> {
        self.flight.as_ref().map(|flight| flight.id)
    }

    /// Decoys chosen for the round in flight.
    #[must_use]
    pub fn decoys(&self) -> &[DestinationId] {
        match &self.flight {
            Some(flight) => flight.sequencer.decoys(),
            None => &[],
        }
    }

    /// Virtual time until the flight's next step boundary.
    #[must_use]
    pub fn time_to_next_boundary(&self) -> Option<u64> {
        let flight = self.flight.as_ref()?;
        if self.pending.is_empty() {
            flight.sequencer.time_to_next_boundary()
        } else {
            Some(0)
        }
    }

    // Intents

    /// Pick the target body. Unknown ids and wrong-phase calls are ignored.
    pub fn select_destination(&mut self, id: DestinationId) -> bool {
        if self.phase != RoundPhase::Selection || !self.catalog.contains(id) {
            return false;
        }
        self.selection = Some(id);
        true
    }

    /// Set the wager. Negative amounts are ignored; the launch guard checks the rest.
    pub fn select_wager(&mut self, amount: Credits) -> bool {
        if self.phase != RoundPhase::Selection || amount < Credits::ZERO {
            return false;
        }
        self.wager = amount;
        true
    }

    /// Wager the entire balance.
    pub fn select_all_in(&mut self) -> bool {
        let balance = self.account.balance();
        self.select_wager(balance)
    }

    /// Resolve the round and start the flight.
    ///
    /// The launch cues are delivered by the next [`RoundMachine::tick`].
    ///
    /// # Errors
    ///
    /// Returns [`LaunchRejected`] when a guard fails; no state changes.
    pub fn launch(&mut self) -> Result<RoundId, LaunchRejected> {
        let (chosen, wager) = self.check_launch()?;
        let outcome = resolver::resolve(&self.catalog, chosen, wager, self.rng.outcome())?;
        Ok(self.begin_flight(outcome))
    }

    /// Launch with a predetermined impact instead of sampling one.
    ///
    /// # Errors
    ///
    /// Same guards as [`RoundMachine::launch`], plus
    /// [`CatalogError::NotFound`] for an impact outside the catalog.
    pub fn launch_forced(&mut self, impact: DestinationId) -> Result<RoundId, LaunchRejected> {
        let (chosen, wager) = self.check_launch()?;
        let outcome = RoundOutcome::forced(&self.catalog, chosen, impact, wager)?;
        Ok(self.begin_flight(outcome))
    }

    /// Advance the flight by `elapsed_ms` of virtual time.
    pub fn tick(&mut self, elapsed_ms: u64, deck: &mut dyn AudioDeck) -> Vec<SequenceEvent> {
        let Some(flight) = self.flight.as_mut() else {
            return Vec::new();
        };
        let mut events: Vec<SequenceEvent> = self.pending.drain(..).collect();
        events.extend(flight.sequencer.advance(elapsed_ms));
        for event in &events {
            self.apply(*event, deck);
        }
        events
    }

    /// Attach narration text to a round.
    ///
    /// Text for the round in flight is held until commit. Text arriving after
    /// commit replaces the fallback while that result is displayed. Anything
    /// addressed to another round is discarded.
    pub fn attach_narration(&mut self, round: RoundId, text: impl Into<String>) -> bool {
        let text = text.into();
        if text.trim().is_empty() {
            return false;
        }
        if let Some(flight) = self.flight.as_mut().filter(|flight| flight.id == round) {
            flight.narration = Some(text);
            return true;
        }
        if let Some(result) = self.result.as_mut().filter(|result| result.round == round) {
            result.narration = text;
            result.narration_is_fallback = false;
            return true;
        }
        log::debug!("discarding narration for stale {round}");
        false
    }

    /// Drive a launched round to its result, narrating synchronously.
    pub fn run_round<N: Narrator>(
        &mut self,
        narrator: &N,
        deck: &mut dyn AudioDeck,
    ) -> Option<RoundResult> {
        let round = self.current_round()?;
        while self.phase == RoundPhase::Launching {
            let wait = self.time_to_next_boundary().unwrap_or(0);
            let events = self.tick(wait, deck);
            if events.contains(&SequenceEvent::NarrationRequested)
                && let Some(outcome) = self.outcome()
            {
                let text = narrator.narrate(&NarrationRequest::from(outcome));
                self.attach_narration(round, text);
            }
        }
        self.result.clone()
    }

    /// Tear down the flight without committing. Only meaningful while launching.
    pub fn abort_flight(&mut self, deck: &mut dyn AudioDeck) -> bool {
        let Some(mut flight) = self.flight.take() else {
            return false;
        };
        if self.pending.is_empty() {
            for event in flight.sequencer.cancel() {
                if let SequenceEvent::Audio(cue) = event {
                    cue.dispatch(deck);
                }
            }
        } else {
            self.pending.clear();
        }
        log::info!("{} aborted mid-flight; account untouched", flight.id);
        self.view = FlightView::default();
        self.phase = RoundPhase::Selection;
        true
    }

    /// Leave the result screen, clearing the selection and outcome.
    /// Ignored outside `Result`.
    pub fn reset_to_selection(&mut self) -> bool {
        if self.phase != RoundPhase::Result {
            log::debug!("reset ignored in {:?}", self.phase);
            return false;
        }
        self.selection = None;
        self.result = None;
        self.view = FlightView::default();
        self.phase = RoundPhase::Selection;
        true
    }

    /// Restore the starting stake. Only allowed when bankrupt, during selection.
    pub fn refill(&mut self) -> bool {
        if self.phase != RoundPhase::Selection || !self.account.is_bankrupt() {
            log::debug!("refill ignored (phase {:?}, balance {})", self.phase, self.account.balance());
            return false;
        }
        self.account.refill(self.config.starting_balance);
        log::info!("account refilled to {}", self.account.balance());
        true
    }

    /// Flip the mute flag and forward it to the deck. Returns the new state.
    pub fn toggle_mute(&mut self, deck: &mut dyn AudioDeck) -> bool {
        self.muted = !self.muted;
        deck.set_muted(self.muted);
        self.muted
    }

    fn check_launch(&self) -> Result<(DestinationId, Credits), LaunchRejected> {
        let verdict = if self.phase != RoundPhase::Selection {
            Err(LaunchRejected::WrongPhase(self.phase))
        } else if let Some(chosen) = self.selection {
            if !self.wager.is_positive() {
                Err(LaunchRejected::NonPositiveWager(self.wager))
            } else if !self.account.can_cover(self.wager) {
                Err(LaunchRejected::InsufficientFunds {
                    wager: self.wager,
                    balance: self.account.balance(),
                })
            } else {
                Ok((chosen, self.wager))
            }
        } else {
            Err(LaunchRejected::NoDestination)
        };
        if let Err(reason) = &verdict {
            log::debug!("launch rejected: {reason}");
        }
        verdict
    }

    fn begin_flight(&mut self, outcome: RoundOutcome) -> RoundId {
        let id = RoundId(self.next_round);
        self.next_round += 1;
        let decoys = pick_decoys(
            &self.catalog,
            outcome.impact,
            self.config.decoy_count,
            self.rng.choreography(),
        );
        let (sequencer, launch_events) = Sequencer::start(outcome.impact, decoys, self.config.timings);
        log::info!(
            "{id} launched toward {} with {} at stake; impact {}",
            outcome.chosen,
            outcome.wager,
            outcome.impact
        );
        self.pending = launch_events;
        self.flight = Some(Flight {
            id,
            outcome,
            sequencer,
            narration: None,
        });
        self.result = None;
        self.view = FlightView::default();
        self.phase = RoundPhase::Launching;
        id
    }

    fn apply(&mut self, event: SequenceEvent, deck: &mut dyn AudioDeck) {
        match event {
            SequenceEvent::Audio(cue) => cue.dispatch(deck),
            SequenceEvent::DecoyShown(id) => self.view.passing = Some(id),
            SequenceEvent::DecoyHidden => self.view.passing = None,
            SequenceEvent::ImpactRevealed(id) => self.view.approaching = Some(id),
            SequenceEvent::Explosion => self.view.explosion = true,
            SequenceEvent::ShakeStarted => self.view.shaking = true,
            SequenceEvent::ShakeStopped => self.view.shaking = false,
            SequenceEvent::NarrationRequested => {}
            SequenceEvent::Completed => self.commit(),
        }
    }

    fn commit(&mut self) {
        let Some(flight) = self.flight.take() else {
            return;
        };
        self.account.commit(&flight.outcome, self.config.score_step);
        self.rounds_played += 1;
        let (narration, narration_is_fallback) = match flight.narration {
            Some(text) => (text, false),
            None => {
                let cause = NarrationError::Unavailable("no narration at commit".to_string());
                (fallback_text(&NarrationRequest::from(&flight.outcome), &cause), true)
            }
        };
        log::info!(
            "{} committed: {} {}; balance {} score {}",
            flight.id,
            if flight.outcome.won { "won" } else { "lost" },
            flight.outcome.amount(),
            self.account.balance(),
            self.account.score()
        );
        self.result = Some(RoundResult {
            round: flight.id,
            outcome: flight.outcome,
            narration,
            narration_is_fallback,
        });
        self.phase = RoundPhase::Result;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioCue, CueLog, SilentDeck};
    use crate::narration::FallbackNarrator;

    fn ready(dest: DestinationId, wager: i64) -> RoundMachine {
        let mut machine = RoundMachine::with_standard(7);
        assert!(machine.select_destination(dest));
        assert!(machine.select_wager(Credits::from_whole(wager)));
        machine
    }

    #[test]
    fn guards_reject_in_order() {
        let mut machine = RoundMachine::with_standard(1);
        assert_eq!(machine.launch(), Err(LaunchRejected::NoDestination));
        machine.select_destination(DestinationId::Mars);
        machine.select_wager(Credits::ZERO);
        assert_eq!(
            machine.launch(),
            Err(LaunchRejected::NonPositiveWager(Credits::ZERO))
        );
        machine.select_wager(Credits::from_whole(5_000));
        assert_eq!(
            machine.launch(),
            Err(LaunchRejected::InsufficientFunds {
                wager: Credits::from_whole(5_000),
                balance: Credits::from_whole(1_000),
            })
        );
        assert_eq!(machine.phase(), RoundPhase::Selection);
        assert_eq!(machine.rounds_played(), 0);
    }

    #[test]
    fn intents_are_ignored_mid_flight() {
        let mut machine = ready(DestinationId::Earth, 100);
        machine.launch_forced(DestinationId::Earth).unwrap();
        assert!(!machine.select_destination(DestinationId::Venus));
        assert!(!machine.select_wager(Credits::from_whole(10)));
        assert!(!machine.reset_to_selection());
        assert!(!machine.refill());
        assert_eq!(
            machine.launch(),
            Err(LaunchRejected::WrongPhase(RoundPhase::Launching))
        );
        assert_eq!(machine.selection(), Some(DestinationId::Earth));
        assert_eq!(machine.wager(), Credits::from_whole(100));
    }

    #[test]
    fn account_is_untouched_until_completion() {
        let mut machine = ready(DestinationId::Earth, 100);
        machine.launch_forced(DestinationId::Earth).unwrap();
        let mut deck = CueLog::new();
        machine.tick(4_099, &mut deck);
        assert_eq!(machine.phase(), RoundPhase::Launching);
        assert_eq!(machine.account().balance(), Credits::from_whole(1_000));
        let events = machine.tick(1, &mut deck);
        assert!(events.contains(&SequenceEvent::Completed));
        assert_eq!(machine.phase(), RoundPhase::Result);
        assert_eq!(machine.account().balance(), Credits::from_whole(1_020));
        assert!(!machine.view().shaking);
        assert!(machine.view().explosion);
        assert!(machine.tick(10_000, &mut deck).is_empty());
        assert_eq!(machine.rounds_played(), 1);
    }

    #[test]
    fn view_tracks_decoys_and_reveal() {
        let mut machine = ready(DestinationId::Mars, 10);
        machine.launch_forced(DestinationId::Jupiter).unwrap();
        let decoys = machine.decoys().to_vec();
        assert_eq!(decoys.len(), 2);
        let mut deck = SilentDeck;
        machine.tick(800, &mut deck);
        assert_eq!(machine.view().passing, Some(decoys[0]));
        machine.tick(600, &mut deck);
        assert_eq!(machine.view().passing, None);
        machine.tick(100, &mut deck);
        assert_eq!(machine.view().passing, Some(decoys[1]));
        machine.tick(700, &mut deck);
        assert_eq!(machine.view().passing, None);
        assert_eq!(machine.view().approaching, Some(DestinationId::Jupiter));
        machine.tick(700, &mut deck);
        assert!(machine.view().explosion && machine.view().shaking);
    }

    #[test]
    fn run_round_attaches_narration_before_commit() {
        let mut machine = ready(DestinationId::Earth, 100);
        machine.launch_forced(DestinationId::Venus).unwrap();
        let mut deck = CueLog::new();
        let result = machine.run_round(&FallbackNarrator, &mut deck).unwrap();
        assert_eq!(
            result.narration,
            "The heavens demand a toll. Your entire stake is lost."
        );
        assert!(!result.narration_is_fallback);
        assert_eq!(
            deck.cues,
            vec![
                AudioCue::Launch,
                AudioCue::StartCruiseLoop,
                AudioCue::StopCruiseLoop,
                AudioCue::Explosion
            ]
        );
    }

    #[test]
    fn late_narration_replaces_fallback_until_reset() {
        let mut machine = ready(DestinationId::Earth, 100);
        let round = machine.launch_forced(DestinationId::Earth).unwrap();
        machine.tick(5_000, &mut SilentDeck);
        let shown = machine.result().unwrap();
        assert!(shown.narration_is_fallback);
        assert_eq!(shown.narration, "A fortunate strike in the dark.");

        assert!(machine.attach_narration(round, "The sky yields."));
        assert_eq!(machine.result().unwrap().narration, "The sky yields.");

        machine.reset_to_selection();
        assert!(!machine.attach_narration(round, "Too late."));
    }

    #[test]
    fn abort_stops_audio_without_commit() {
        let mut machine = ready(DestinationId::Earth, 100);
        machine.launch_forced(DestinationId::Earth).unwrap();
        let mut deck = CueLog::new();
        machine.tick(1_000, &mut deck);
        assert!(deck.cruise_looping);
        assert!(machine.abort_flight(&mut deck));
        assert!(!deck.cruise_looping);
        assert_eq!(machine.phase(), RoundPhase::Selection);
        assert_eq!(machine.account().balance(), Credits::from_whole(1_000));
        assert_eq!(machine.outcome(), None);
        assert_eq!(machine.selection(), Some(DestinationId::Earth));
        assert!(!machine.abort_flight(&mut deck));
    }

    #[test]
    fn bet_presets_above_balance_are_unavailable() {
        let config = GameConfig::default();
        let account = PlayerAccount::new(Credits::from_whole(100));
        let machine = RoundMachine::new(Catalog::standard(), config, account, 2);
        let options: Vec<_> = machine.bet_options().collect();
        assert_eq!(
            options,
            vec![
                (Credits::from_whole(10), true),
                (Credits::from_whole(50), true),
                (Credits::from_whole(100), true),
                (Credits::from_whole(500), false),
                (Credits::from_whole(1_000), false),
            ]
        );
    }

    #[test]
    fn reset_is_ignored_during_selection() {
        let mut machine = RoundMachine::with_standard(5);
        assert!(machine.select_destination(DestinationId::Earth));
        assert!(!machine.reset_to_selection());
        assert_eq!(machine.selection(), Some(DestinationId::Earth));
        assert_eq!(machine.phase(), RoundPhase::Selection);
    }

    #[test]
    fn mute_is_forwarded() {
        let mut machine = RoundMachine::with_standard(3);
        let mut deck = CueLog::new();
        assert!(machine.toggle_mute(&mut deck));
        assert!(deck.muted);
        assert!(!machine.toggle_mute(&mut deck));
        assert!(!deck.muted);
    }

    #[test]
    fn unknown_forced_impact_is_rejected_without_state_change() {
        let catalog = Catalog::new(vec![
            Catalog::standard().get(DestinationId::Earth).unwrap().clone(),
            Catalog::standard().get(DestinationId::Mars).unwrap().clone(),
        ])
        .unwrap();
        let config = GameConfig::default();
        let account = PlayerAccount::new(config.starting_balance);
        let mut machine = RoundMachine::new(catalog, config, account, 9);
        machine.select_destination(DestinationId::Earth);
        assert!(!machine.select_destination(DestinationId::Saturn));
        assert_eq!(
            machine.launch_forced(DestinationId::Saturn),
            Err(LaunchRejected::Catalog(CatalogError::NotFound(
                DestinationId::Saturn
            )))
        );
        assert_eq!(machine.phase(), RoundPhase::Selection);
    }
}
