//! The start-lights state machine.
//!
//! A [`SequenceController`] is a cheap `Rc` handle. Every start or reset
//! cancels the timers of the previous run and bumps a generation counter;
//! each scheduled step carries the generation it was created for and does
//! nothing if a newer run has begun since. Steps hold only a weak
//! reference, so a dropped controller never fires.

use crate::audio::AudioCueEmitter;
use crate::config::{SequenceTiming, STRIP_COUNT};
use crate::random::{DelaySource, RandomDelays};
use crate::scheduler::{Scheduler, TimeoutScheduler, TimerId};
use crate::sequence::{LightsSnapshot, SequenceState, ALL_OFF, ALL_ON};
use log::{debug, info};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

type Observer = Rc<dyn Fn(&LightsSnapshot)>;

/// Pending timers of the in-flight run, keyed by a per-run ticket so a step
/// can retire itself when it fires.
#[derive(Default)]
struct ActiveTimers {
    generation: u64,
    next_ticket: u64,
    pending: HashMap<u64, TimerId>,
}

impl ActiveTimers {
    /// Cancel everything and open a new generation.
    fn cancel_all(&mut self, scheduler: &dyn Scheduler) -> u64 {
        for (_, id) in self.pending.drain() {
            scheduler.cancel(id);
        }
        self.generation += 1;
        self.generation
    }

    fn reserve(&mut self) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        ticket
    }

    /// Remove a fired step. False when it belongs to a cancelled run.
    fn retire(&mut self, generation: u64, ticket: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.pending.remove(&ticket).is_some()
    }
}

struct Lights {
    strips: [bool; STRIP_COUNT],
    state: SequenceState,
    timers: ActiveTimers,
}

struct Shared {
    lights: RefCell<Lights>,
    scheduler: Rc<dyn Scheduler>,
    audio: AudioCueEmitter,
    delays: RefCell<Box<dyn DelaySource>>,
    timing: SequenceTiming,
    observer: RefCell<Option<Observer>>,
}

#[derive(Clone)]
pub struct SequenceController {
    shared: Rc<Shared>,
}

impl SequenceController {
    pub fn new(
        scheduler: Rc<dyn Scheduler>,
        audio: AudioCueEmitter,
        delays: impl DelaySource + 'static,
    ) -> Self {
        Self::with_timing(scheduler, audio, delays, SequenceTiming::default())
    }

    pub fn with_timing(
        scheduler: Rc<dyn Scheduler>,
        audio: AudioCueEmitter,
        delays: impl DelaySource + 'static,
        timing: SequenceTiming,
    ) -> Self {
        Self {
            shared: Rc::new(Shared {
                lights: RefCell::new(Lights {
                    strips: ALL_OFF,
                    state: SequenceState::Idle,
                    timers: ActiveTimers::default(),
                }),
                scheduler,
                audio,
                delays: RefCell::new(Box::new(delays)),
                timing,
                observer: RefCell::new(None),
            }),
        }
    }

    /// Controller wired to the browser: `setTimeout` timers, Web Audio and
    /// entropy-seeded holds.
    pub fn browser() -> Self {
        Self::new(
            Rc::new(TimeoutScheduler::new()),
            AudioCueEmitter::web(),
            RandomDelays::from_entropy(),
        )
    }

    /// Replace the observer called after every state change.
    pub fn subscribe(&self, observer: impl Fn(&LightsSnapshot) + 'static) {
        *self.shared.observer.borrow_mut() = Some(Rc::new(observer));
    }

    pub fn snapshot(&self) -> LightsSnapshot {
        let lights = self.shared.lights.borrow();
        LightsSnapshot {
            strips: lights.strips,
            state: lights.state,
        }
    }

    pub fn state(&self) -> SequenceState {
        self.shared.lights.borrow().state
    }

    pub fn is_sequence_active(&self) -> bool {
        self.state().is_sequence_active()
    }

    /// Timers still needed to finish the current run.
    pub fn pending_timers(&self) -> usize {
        self.shared.lights.borrow().timers.pending.len()
    }

    pub fn sound_enabled(&self) -> bool {
        self.shared.audio.is_enabled()
    }

    /// Turn cues on or off. The running sequence is not affected.
    pub fn toggle_sound(&self, enabled: bool) {
        info!("Sound {}", if enabled { "on" } else { "off" });
        self.shared.audio.set_enabled(enabled);
    }

    /// Light the five strips one second apart, hold for a random time, then
    /// switch everything off and show GO.
    pub fn start_race(&self) {
        if self.is_sequence_active() {
            debug!("Start race ignored, sequence already running");
            return;
        }
        info!("Starting race sequence");
        self.prime_audio();

        let timing = self.shared.timing;
        let generation = self.begin(ALL_OFF, SequenceState::RaceRunning);

        for index in 0..STRIP_COUNT {
            let delay = timing.race_strip_step_ms * index as u32;
            self.schedule_step(generation, delay, move |ctl| ctl.light_strip(index));
        }

        let (min, max) = timing.race_hold_ms;
        let hold = self.shared.delays.borrow_mut().hold_ms(min, max);
        debug!("Lights out after {} ms hold", hold);
        self.schedule_step(
            generation,
            timing.race_lights_out_base_ms + hold,
            move |ctl| ctl.lights_out(generation),
        );
    }

    /// All strips red with an immediate cue, then after a random hold the
    /// green phase and GO.
    pub fn start_formation_lap(&self) {
        if self.is_sequence_active() {
            debug!("Start formation lap ignored, sequence already running");
            return;
        }
        info!("Starting formation lap sequence");
        self.prime_audio();

        let generation = self.begin(ALL_ON, SequenceState::FormationRedPhase);
        self.shared.audio.play_cue();

        let (min, max) = self.shared.timing.formation_red_ms;
        let hold = self.shared.delays.borrow_mut().hold_ms(min, max);
        debug!("Green phase after {} ms", hold);
        self.schedule_step(generation, hold, move |ctl| ctl.formation_green(generation));
    }

    /// Abort whatever is running and go dark. Audio is left as is.
    pub fn reset(&self) {
        debug!("Resetting lights");
        self.begin(ALL_OFF, SequenceState::Idle);
    }

    /// Cancel all timers and release the audio device. The controller stays
    /// usable but silent.
    pub fn teardown(&self) {
        debug!("Tearing down sequence controller");
        {
            let mut lights = self.shared.lights.borrow_mut();
            lights.timers.cancel_all(self.shared.scheduler.as_ref());
        }
        self.shared.audio.release();
        self.shared.observer.borrow_mut().take();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Steps

    fn light_strip(&self, index: usize) {
        self.shared.audio.play_cue();
        self.update(|lights| lights.strips[index] = true);
    }

    fn lights_out(&self, generation: u64) {
        info!("Lights out");
        self.update(|lights| {
            lights.strips = ALL_OFF;
            lights.state = SequenceState::RaceGoDisplay;
        });
        let delay = self.shared.timing.race_go_display_ms;
        self.schedule_step(generation, delay, |ctl| ctl.finish());
    }

    fn formation_green(&self, generation: u64) {
        info!("Formation lap green");
        self.update(|lights| {
            lights.strips = ALL_OFF;
            lights.state = SequenceState::FormationGreenPhase;
        });
        self.shared.audio.play_cue();
        let delay = self.shared.timing.formation_green_ms;
        self.schedule_step(generation, delay, move |ctl| ctl.formation_end(generation));
    }

    fn formation_end(&self, generation: u64) {
        self.update(|lights| lights.state = SequenceState::FormationGoDisplay);
        let delay = self.shared.timing.formation_go_display_ms;
        self.schedule_step(generation, delay, |ctl| ctl.finish());
    }

    fn finish(&self) {
        debug!("Sequence finished");
        self.update(|lights| {
            lights.strips = ALL_OFF;
            lights.state = SequenceState::Idle;
        });
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Plumbing

    fn prime_audio(&self) {
        if let Some(resume) = self.shared.audio.initialize() {
            self.shared.scheduler.spawn(resume);
        }
    }

    /// Cancel the previous run and enter `state` with `strips`, returning the
    /// generation of the new run.
    fn begin(&self, strips: [bool; STRIP_COUNT], state: SequenceState) -> u64 {
        let generation = {
            let mut lights = self.shared.lights.borrow_mut();
            let generation = lights.timers.cancel_all(self.shared.scheduler.as_ref());
            lights.strips = strips;
            lights.state = state;
            generation
        };
        self.notify();
        generation
    }

    fn update(&self, mutate: impl FnOnce(&mut Lights)) {
        mutate(&mut self.shared.lights.borrow_mut());
        self.notify();
    }

    fn notify(&self) {
        let observer = self.shared.observer.borrow().clone();
        if let Some(observer) = observer {
            observer(&self.snapshot());
        }
    }

    fn schedule_step(
        &self,
        generation: u64,
        delay_ms: u32,
        step: impl FnOnce(&SequenceController) + 'static,
    ) {
        let ticket = self.shared.lights.borrow_mut().timers.reserve();
        let weak: Weak<Shared> = Rc::downgrade(&self.shared);
        let id = self.shared.scheduler.schedule(
            delay_ms,
            Box::new(move || {
                let Some(shared) = weak.upgrade() else {
                    return;
                };
                let ctl = SequenceController { shared };
                let current = ctl.shared.lights.borrow_mut().timers.retire(generation, ticket);
                if current {
                    step(&ctl);
                } else {
                    debug!("Dropped stale step from generation {}", generation);
                }
            }),
        );
        self.shared
            .lights
            .borrow_mut()
            .timers
            .pending
            .insert(ticket, id);
    }
}
