//! Audio cue triggers. Rendering sound is the host's business; the core only
//! says when each cue fires.
use serde::{Deserialize, Serialize};

/// Sound cues emitted during a flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioCue {
    /// Takeoff blast
    Launch,
    /// Engine rumble that loops through the cruise
    StartCruiseLoop,
    StopCruiseLoop,
    /// Impact blast
    Explosion,
}

impl AudioCue {
    /// Forward this cue to a deck.
    pub fn dispatch(self, deck: &mut dyn AudioDeck) {
        match self {
            Self::Launch => deck.play_launch(),
            Self::StartCruiseLoop => deck.start_cruise_loop(),
            Self::StopCruiseLoop => deck.stop_cruise_loop(),
            Self::Explosion => deck.play_explosion(),
        }
    }
}

/// Host-side sound output.
pub trait AudioDeck {
    fn play_launch(&mut self);
    fn start_cruise_loop(&mut self);
    fn stop_cruise_loop(&mut self);
    fn play_explosion(&mut self);
    fn set_muted(&mut self, muted: bool);
}

/// Deck that discards every cue.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentDeck;

impl AudioDeck for SilentDeck {
    fn play_launch(&mut self) {}
    fn start_cruise_loop(&mut self) {}
    fn stop_cruise_loop(&mut self) {}
    fn play_explosion(&mut self) {}
    fn set_muted(&mut self, _muted: bool) {}
}

/// Deck that records cues in order, tracking loop and mute state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CueLog {
    pub cues: Vec<AudioCue>,
    pub muted: bool,
    pub cruise_looping: bool,
}

impl CueLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn count(&self, cue: AudioCue) -> usize {
        self.cues.iter().filter(|&&c| c == cue).count()
    }
}

impl AudioDeck for CueLog {
    fn play_launch(&mut self) {
        self.cues.push(AudioCue::Launch);
    }

    fn start_cruise_loop(&mut self) {
        self.cues.push(AudioCue::StartCruiseLoop);
        self.cruise_looping = true;
    }

    fn stop_cruise_loop(&mut self) {
        self.cues.push(AudioCue::StopCruiseLoop);
        self.cruise_looping = false;
    }

    fn play_explosion(&mut self) {
        self.cues.push(AudioCue::Explosion);
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }
}
