//! Real-time flight driver.
//!
//! Sleeps on the tokio clock between step boundaries and runs the narration
//! future on the same task. Narration never holds back a timed step; whatever
//! has not arrived by commit time gets a bounded grace period afterwards.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::audio::AudioDeck;
use crate::narration::{AsyncNarrator, NarrationRequest};
use crate::round::{RoundId, RoundMachine, RoundPhase};
use crate::sequencer::SequenceEvent;

type NarrationFuture<'a> = Pin<Box<dyn Future<Output = String> + 'a>>;

/// Cloneable teardown signal shared between the host and a running flight.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    state: Arc<watch::Sender<bool>>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
        }
    }

    pub fn cancel(&self) {
        self.state.send_replace(true);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.state.borrow()
    }

    /// Resolves once [`CancellationToken::cancel`] has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of a driven flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightReport {
    pub round: Option<RoundId>,
    pub committed: bool,
    /// Narration was still pending when the round committed.
    pub narration_late: bool,
    pub cancelled: bool,
}

/// Drive the round currently in flight to its result in real time.
///
/// `on_event` sees every sequence event after the machine has applied it.
/// Cancelling `cancel` before commit aborts the flight without touching the
/// account; cancelling afterwards only stops waiting for late narration.
pub async fn run_flight<'n, N, F>(
    machine: &mut RoundMachine,
    narrator: &'n N,
    deck: &mut dyn AudioDeck,
    cancel: &CancellationToken,
    mut on_event: F,
) -> FlightReport
where
    N: AsyncNarrator + ?Sized,
    F: FnMut(&RoundMachine, &SequenceEvent),
{
    let Some(round) = machine.current_round() else {
        return FlightReport::default();
    };
    let mut report = FlightReport {
        round: Some(round),
        ..FlightReport::default()
    };
    let mut narration: Option<NarrationFuture<'n>> = None;

    while machine.phase() == RoundPhase::Launching {
        let wait = machine.time_to_next_boundary().unwrap_or(0);
        let sleep = tokio::time::sleep(Duration::from_millis(wait));
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    machine.abort_flight(deck);
                    report.cancelled = true;
                    return report;
                }
                text = next_narration(&mut narration) => {
                    narration = None;
                    machine.attach_narration(round, text);
                }
                () = &mut sleep => break,
            }
        }

        for event in machine.tick(wait, deck) {
            match event {
                SequenceEvent::NarrationRequested => {
                    if let Some(outcome) = machine.outcome() {
                        let request = NarrationRequest::from(outcome);
                        narration = Some(narrator.narrate_async(request));
                    }
                }
                SequenceEvent::Completed => report.committed = true,
                _ => {}
            }
            on_event(machine, &event);
        }
    }

    if let Some(pending) = narration.take() {
        report.narration_late = true;
        let grace = Duration::from_millis(machine.config().late_narration_grace_ms);
        tokio::select! {
            biased;
            () = cancel.cancelled() => report.cancelled = true,
            arrived = tokio::time::timeout(grace, pending) => match arrived {
                Ok(text) => {
                    machine.attach_narration(round, text);
                }
                Err(_) => log::warn!("narration for {round} missed the grace window; keeping fallback"),
            },
        }
    }

    report
}

async fn next_narration(slot: &mut Option<NarrationFuture<'_>>) -> String {
    match slot.as_mut() {
        Some(pending) => pending.await,
        None => std::future::pending().await,
    }
}
