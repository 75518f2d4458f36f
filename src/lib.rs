//! F1 start lights: race-start and formation-lap light sequences with a
//! synthesized cue, rendered in the browser with Yew.
//!
//! The sequencing core ([`controller`], [`scheduler`], [`random`],
//! [`audio`]) has no UI dependency and runs under a simulated clock in
//! tests; [`components`] and [`hooks`] are the rendering boundary.

pub mod audio;
pub mod components;
pub mod config;
pub mod controller;
pub mod hooks;
pub mod logging;
pub mod random;
pub mod scheduler;
pub mod sequence;

#[cfg(test)]
mod test_support;

pub use audio::{AudioCueEmitter, AudioError, ToneSpec};
pub use config::SequenceTiming;
pub use controller::SequenceController;
pub use random::{DelaySource, FixedDelays, RandomDelays};
pub use scheduler::{ManualScheduler, Scheduler, TimeoutScheduler};
pub use sequence::{FormationPhase, LightStripState, LightsSnapshot, SequenceState, SequenceType};
