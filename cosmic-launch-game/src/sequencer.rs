//! Flight choreography for the launching phase.
//!
//! The sequencer is a virtual-time step machine: callers feed it elapsed
//! milliseconds and it emits presentation and audio events in a fixed order.
//! It never samples outcomes and never touches the player account; the only
//! randomness tied to it is the cosmetic decoy order, picked before it starts.

use rand::RngCore;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

use crate::audio::AudioCue;
use crate::catalog::{Catalog, DestinationId};
use crate::config::SequenceTimings;

/// Buffer of events produced by a single call.
pub type SequenceEvents = SmallVec<[SequenceEvent; 8]>;
/// Decoy bodies for one flight, in flyby order.
pub type Decoys = SmallVec<[DestinationId; 4]>;

/// Current step of a flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequenceStep {
    Cruise,
    DecoyPass(usize),
    DecoyGap(usize),
    Approach,
    Settle,
    Finished,
    Cancelled,
}

/// Something the presentation layer or the state machine must react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequenceEvent {
    Audio(AudioCue),
    DecoyShown(DestinationId),
    DecoyHidden,
    ImpactRevealed(DestinationId),
    Explosion,
    ShakeStarted,
    NarrationRequested,
    Completed,
    ShakeStopped,
}

/// Step machine for one flight.
#[derive(Debug, Clone)]
pub struct Sequencer {
    impact: DestinationId,
    decoys: Decoys,
    timings: SequenceTimings,
    step: SequenceStep,
    remaining_ms: u64,
    elapsed_ms: u64,
    cruise_looping: bool,
}

impl Sequencer {
    /// Begin a flight toward `impact`, returning the launch cues.
    #[must_use]
    pub fn start(
        impact: DestinationId,
        decoys: Decoys,
        timings: SequenceTimings,
    ) -> (Self, SequenceEvents) {
        let sequencer = Self {
            impact,
            decoys,
            timings,
            step: SequenceStep::Cruise,
            remaining_ms: timings.cruise_ms,
            elapsed_ms: 0,
            cruise_looping: true,
        };
        let events = smallvec![
            SequenceEvent::Audio(AudioCue::Launch),
            SequenceEvent::Audio(AudioCue::StartCruiseLoop),
        ];
        (sequencer, events)
    }

    /// Consume `elapsed_ms` of virtual time, crossing as many step
    /// boundaries as it covers.
    pub fn advance(&mut self, elapsed_ms: u64) -> SequenceEvents {
        let mut events = SequenceEvents::new();
        let mut budget = elapsed_ms;
        while !self.is_done() {
            if budget < self.remaining_ms {
                self.remaining_ms -= budget;
                self.elapsed_ms = self.elapsed_ms.saturating_add(budget);
                break;
            }
            budget -= self.remaining_ms;
            self.elapsed_ms = self.elapsed_ms.saturating_add(self.remaining_ms);
            self.remaining_ms = 0;
            self.enter_next(&mut events);
        }
        events
    }

    /// Stop the flight. Returns the cue that silences the cruise loop if it
    /// was still running. Cancelling a finished or cancelled flight does nothing.
    pub fn cancel(&mut self) -> SequenceEvents {
        let mut events = SequenceEvents::new();
        if self.is_done() {
            return events;
        }
        if self.cruise_looping {
            self.cruise_looping = false;
            events.push(SequenceEvent::Audio(AudioCue::StopCruiseLoop));
        }
        log::debug!("flight to {} cancelled during {:?}", self.impact, self.step);
        self.step = SequenceStep::Cancelled;
        self.remaining_ms = 0;
        events
    }

    /// Time until the next step boundary, or `None` once the flight is over.
    #[must_use]
    pub const fn time_to_next_boundary(&self) -> Option<u64> {
        if self.is_done() {
            None
        } else {
            Some(self.remaining_ms)
        }
    }

    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self.step, SequenceStep::Finished | SequenceStep::Cancelled)
    }

    #[must_use]
    pub const fn step(&self) -> SequenceStep {
        self.step
    }

    #[must_use]
    pub const fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    #[must_use]
    pub const fn impact(&self) -> DestinationId {
        self.impact
    }

    #[must_use]
    pub fn decoys(&self) -> &[DestinationId] {
        &self.decoys
    }

    /// Nominal length of this flight.
    #[must_use]
    pub fn total_ms(&self) -> u64 {
        self.timings.total_ms(self.decoys.len())
    }

    fn enter_next(&mut self, events: &mut SequenceEvents) {
        let next = match self.step {
            SequenceStep::Cruise => self.first_decoy_or_approach(events),
            SequenceStep::DecoyPass(idx) => {
                events.push(SequenceEvent::DecoyHidden);
                SequenceStep::DecoyGap(idx)
            }
            SequenceStep::DecoyGap(idx) => match self.decoys.get(idx + 1) {
                Some(&decoy) => {
                    events.push(SequenceEvent::DecoyShown(decoy));
                    SequenceStep::DecoyPass(idx + 1)
                }
                None => self.reveal_impact(events),
            },
            SequenceStep::Approach => {
                self.cruise_looping = false;
                events.extend([
                    SequenceEvent::Audio(AudioCue::StopCruiseLoop),
                    SequenceEvent::Audio(AudioCue::Explosion),
                    SequenceEvent::Explosion,
                    SequenceEvent::ShakeStarted,
                    SequenceEvent::NarrationRequested,
                ]);
                SequenceStep::Settle
            }
            SequenceStep::Settle => {
                events.extend([SequenceEvent::Completed, SequenceEvent::ShakeStopped]);
                SequenceStep::Finished
            }
            SequenceStep::Finished | SequenceStep::Cancelled => self.step,
        };
        self.remaining_ms = self.duration_of(next);
        log::debug!("flight step {:?} -> {next:?} at {}ms", self.step, self.elapsed_ms);
        self.step = next;
    }

    fn first_decoy_or_approach(&self, events: &mut SequenceEvents) -> SequenceStep {
        match self.decoys.first() {
            Some(&decoy) => {
                events.push(SequenceEvent::DecoyShown(decoy));
                SequenceStep::DecoyPass(0)
            }
            None => self.reveal_impact(events),
        }
    }

    fn reveal_impact(&self, events: &mut SequenceEvents) -> SequenceStep {
        events.push(SequenceEvent::ImpactRevealed(self.impact));
        SequenceStep::Approach
    }

    const fn duration_of(&self, step: SequenceStep) -> u64 {
        match step {
            SequenceStep::Cruise => self.timings.cruise_ms,
            SequenceStep::DecoyPass(_) => self.timings.decoy_pass_ms,
            SequenceStep::DecoyGap(_) => self.timings.decoy_gap_ms,
            SequenceStep::Approach => self.timings.impact_ms,
            SequenceStep::Settle => self.timings.settle_ms,
            SequenceStep::Finished | SequenceStep::Cancelled => 0,
        }
    }
}

/// Pick up to `count` distinct decoys in random order, never the impact body.
pub fn pick_decoys<R: RngCore>(
    catalog: &Catalog,
    impact: DestinationId,
    count: usize,
    rng: &mut R,
) -> Decoys {
    let mut candidates: Decoys = catalog.others(impact).map(|dest| dest.id).collect();
    candidates.shuffle(rng);
    candidates.truncate(count);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn standard_flight() -> (Sequencer, SequenceEvents) {
        Sequencer::start(
            DestinationId::Mars,
            smallvec![DestinationId::Venus, DestinationId::Saturn],
            SequenceTimings::default(),
        )
    }

    #[test]
    fn start_fires_launch_cues() {
        let (seq, events) = standard_flight();
        assert_eq!(
            events.as_slice(),
            &[
                SequenceEvent::Audio(AudioCue::Launch),
                SequenceEvent::Audio(AudioCue::StartCruiseLoop)
            ]
        );
        assert_eq!(seq.step(), SequenceStep::Cruise);
        assert_eq!(seq.time_to_next_boundary(), Some(800));
        assert_eq!(seq.total_ms(), 4_100);
    }

    #[test]
    fn steps_fire_only_after_their_delay() {
        let (mut seq, _) = standard_flight();
        assert!(seq.advance(799).is_empty());
        assert_eq!(
            seq.advance(1).as_slice(),
            &[SequenceEvent::DecoyShown(DestinationId::Venus)]
        );
        assert_eq!(seq.advance(600).as_slice(), &[SequenceEvent::DecoyHidden]);
        assert_eq!(
            seq.advance(100).as_slice(),
            &[SequenceEvent::DecoyShown(DestinationId::Saturn)]
        );
        assert_eq!(seq.advance(600).as_slice(), &[SequenceEvent::DecoyHidden]);
        assert_eq!(
            seq.advance(100).as_slice(),
            &[SequenceEvent::ImpactRevealed(DestinationId::Mars)]
        );
        assert!(seq.advance(699).is_empty());
        assert_eq!(
            seq.advance(1).as_slice(),
            &[
                SequenceEvent::Audio(AudioCue::StopCruiseLoop),
                SequenceEvent::Audio(AudioCue::Explosion),
                SequenceEvent::Explosion,
                SequenceEvent::ShakeStarted,
                SequenceEvent::NarrationRequested,
            ]
        );
        assert!(seq.advance(1_199).is_empty());
        assert_eq!(
            seq.advance(1).as_slice(),
            &[SequenceEvent::Completed, SequenceEvent::ShakeStopped]
        );
        assert!(seq.is_done());
        assert_eq!(seq.elapsed_ms(), 4_100);
        assert_eq!(seq.time_to_next_boundary(), None);
    }

    #[test]
    fn one_large_advance_preserves_order() {
        let (mut seq, _) = standard_flight();
        let events = seq.advance(10_000);
        let completed = events
            .iter()
            .position(|e| *e == SequenceEvent::Completed)
            .unwrap();
        let explosion = events
            .iter()
            .position(|e| *e == SequenceEvent::Explosion)
            .unwrap();
        let reveal = events
            .iter()
            .position(|e| *e == SequenceEvent::ImpactRevealed(DestinationId::Mars))
            .unwrap();
        assert!(reveal < explosion && explosion < completed);
        assert_eq!(events.last(), Some(&SequenceEvent::ShakeStopped));
        assert_eq!(seq.elapsed_ms(), 4_100);
    }

    #[test]
    fn flight_without_decoys_goes_straight_to_reveal() {
        let (mut seq, _) = Sequencer::start(
            DestinationId::Earth,
            Decoys::new(),
            SequenceTimings::default(),
        );
        assert_eq!(
            seq.advance(800).as_slice(),
            &[SequenceEvent::ImpactRevealed(DestinationId::Earth)]
        );
        assert_eq!(seq.total_ms(), 2_700);
    }

    #[test]
    fn cancel_stops_cruise_loop_once() {
        let (mut seq, _) = standard_flight();
        seq.advance(1_000);
        assert_eq!(
            seq.cancel().as_slice(),
            &[SequenceEvent::Audio(AudioCue::StopCruiseLoop)]
        );
        assert!(seq.cancel().is_empty());
        assert!(seq.advance(10_000).is_empty());
        assert_eq!(seq.step(), SequenceStep::Cancelled);
    }

    #[test]
    fn cancel_after_impact_has_no_loop_to_stop() {
        let (mut seq, _) = standard_flight();
        seq.advance(3_000);
        assert_eq!(seq.step(), SequenceStep::Settle);
        assert!(seq.cancel().is_empty());
        assert!(seq.advance(5_000).is_empty());
    }

    #[test]
    fn decoys_exclude_impact_and_never_repeat() {
        let catalog = Catalog::standard();
        let mut rng = SmallRng::seed_from_u64(17);
        for id in DestinationId::ALL {
            let decoys = pick_decoys(&catalog, id, 2, &mut rng);
            assert_eq!(decoys.len(), 2);
            assert!(!decoys.contains(&id));
            assert_ne!(decoys[0], decoys[1]);
        }
    }

    #[test]
    fn decoy_count_is_capped_by_catalog_size() {
        let catalog = Catalog::standard();
        let mut rng = SmallRng::seed_from_u64(4);
        let decoys = pick_decoys(&catalog, DestinationId::Earth, 20, &mut rng);
        assert_eq!(decoys.len(), catalog.len() - 1);
    }

    #[test]
    fn decoy_order_varies_between_rounds() {
        let catalog = Catalog::standard();
        let mut rng = SmallRng::seed_from_u64(2024);
        let firsts: std::collections::HashSet<_> = (0..64)
            .map(|_| pick_decoys(&catalog, DestinationId::Jupiter, 2, &mut rng)[0])
            .collect();
        assert!(firsts.len() > 1);
    }
}
