//! Audio cue emitter: one short sine "bim" per light transition.
//!
//! The emitter owns a lazily opened [`AudioDevice`]. Opening happens at most
//! once per emitter; if the device comes up suspended it is resumed
//! asynchronously and cues requested in the meantime are dropped. Every
//! failure degrades to silence and is only logged.

use crate::config::{
    CUE_ATTACK_MS, CUE_DURATION_MS, CUE_FLOOR_GAIN, CUE_FREQUENCY_HZ, CUE_PEAK_GAIN,
    DEFAULT_SOUND_ENABLED,
};
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use log::{debug, info, warn};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AudioContext, AudioContextState, GainNode, OscillatorType};

#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// The platform refused to create an output device.
    Unavailable(String),
    /// The device was created suspended and could not be resumed.
    ResumeRejected(String),
    /// Building or starting the oscillator graph failed.
    Synthesis(String),
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::Unavailable(msg) => write!(f, "Audio output unavailable: {}", msg),
            AudioError::ResumeRejected(msg) => write!(f, "Audio device resume rejected: {}", msg),
            AudioError::Synthesis(msg) => write!(f, "Tone synthesis failed: {}", msg),
        }
    }
}

impl std::error::Error for AudioError {}

fn js_reason(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

/// Shape of the cue tone: a linear attack followed by an exponential decay
/// that stops just short of silence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    pub frequency_hz: f32,
    pub duration_ms: u32,
    pub attack_ms: u32,
    pub peak_gain: f32,
    pub floor_gain: f32,
}

impl Default for ToneSpec {
    fn default() -> Self {
        Self {
            frequency_hz: CUE_FREQUENCY_HZ,
            duration_ms: CUE_DURATION_MS,
            attack_ms: CUE_ATTACK_MS,
            peak_gain: CUE_PEAK_GAIN,
            floor_gain: CUE_FLOOR_GAIN,
        }
    }
}

impl ToneSpec {
    pub fn duration_secs(&self) -> f64 {
        f64::from(self.duration_ms) / 1000.0
    }

    pub fn attack_secs(&self) -> f64 {
        f64::from(self.attack_ms) / 1000.0
    }

    /// Envelope gain `t` seconds after the tone starts, matching the ramps
    /// the device programs. Zero outside the tone.
    pub fn gain_at(&self, t: f64) -> f32 {
        let attack = self.attack_secs();
        let end = self.duration_secs();
        if !(0.0..=end).contains(&t) {
            return 0.0;
        }
        if t <= attack {
            if attack <= 0.0 {
                return self.peak_gain;
            }
            return (f64::from(self.peak_gain) * t / attack) as f32;
        }
        let decay = end - attack;
        let progress = (t - attack) / decay;
        let ratio = f64::from(self.floor_gain) / f64::from(self.peak_gain);
        (f64::from(self.peak_gain) * ratio.powf(progress)) as f32
    }
}

/// A live audio output.
pub trait AudioDevice {
    /// Whether the device must be resumed before it can sound.
    fn is_suspended(&self) -> bool;

    fn resume(&self) -> LocalBoxFuture<'static, Result<(), AudioError>>;

    /// Start one tone now. Resources created here must free themselves
    /// once the tone has stopped.
    fn play_tone(&self, tone: &ToneSpec) -> Result<(), AudioError>;

    fn close(&self);
}

/// Factory for the emitter's device.
pub trait AudioBackend {
    fn open(&self) -> Result<Rc<dyn AudioDevice>, AudioError>;
}

// ──────────────────────────────────────────────────────────────────────────────
// Web Audio

/// Opens a browser `AudioContext`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebAudioBackend;

impl AudioBackend for WebAudioBackend {
    fn open(&self) -> Result<Rc<dyn AudioDevice>, AudioError> {
        let ctx = AudioContext::new().map_err(|e| AudioError::Unavailable(js_reason(&e)))?;
        Ok(Rc::new(WebAudioDevice { ctx }))
    }
}

pub struct WebAudioDevice {
    ctx: AudioContext,
}

impl AudioDevice for WebAudioDevice {
    fn is_suspended(&self) -> bool {
        self.ctx.state() == AudioContextState::Suspended
    }

    fn resume(&self) -> LocalBoxFuture<'static, Result<(), AudioError>> {
        let promise = self.ctx.resume();
        async move {
            let promise = promise.map_err(|e| AudioError::ResumeRejected(js_reason(&e)))?;
            JsFuture::from(promise)
                .await
                .map(|_| ())
                .map_err(|e| AudioError::ResumeRejected(js_reason(&e)))
        }
        .boxed_local()
    }

    fn play_tone(&self, tone: &ToneSpec) -> Result<(), AudioError> {
        let synth = |e: JsValue| AudioError::Synthesis(js_reason(&e));
        let ctx = &self.ctx;
        let now = ctx.current_time();

        let osc = ctx.create_oscillator().map_err(synth)?;
        let gain: GainNode = ctx.create_gain().map_err(synth)?;

        osc.set_type(OscillatorType::Sine);
        osc.frequency()
            .set_value_at_time(tone.frequency_hz, now)
            .map_err(synth)?;

        let envelope = gain.gain();
        envelope.set_value_at_time(0.0, now).map_err(synth)?;
        envelope
            .linear_ramp_to_value_at_time(tone.peak_gain, now + tone.attack_secs())
            .map_err(synth)?;
        envelope
            .exponential_ramp_to_value_at_time(tone.floor_gain, now + tone.duration_secs())
            .map_err(synth)?;

        osc.connect_with_audio_node(&gain).map_err(synth)?;
        gain.connect_with_audio_node(&ctx.destination())
            .map_err(synth)?;

        // Once stopped and unreferenced the nodes are collected by the browser.
        osc.start_with_when(now).map_err(synth)?;
        osc.stop_with_when(now + tone.duration_secs()).map_err(synth)?;
        Ok(())
    }

    fn close(&self) {
        if let Err(e) = self.ctx.close() {
            warn!("Closing audio context failed: {}", js_reason(&e));
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Emitter

enum DeviceSlot {
    Untouched,
    Resuming(Rc<dyn AudioDevice>),
    Ready(Rc<dyn AudioDevice>),
    /// Opening or resuming failed; stay silent for the session.
    Unavailable,
    Released,
}

pub struct AudioCueEmitter {
    backend: Box<dyn AudioBackend>,
    slot: Rc<RefCell<DeviceSlot>>,
    enabled: Cell<bool>,
    tone: ToneSpec,
}

impl AudioCueEmitter {
    pub fn new(backend: impl AudioBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            slot: Rc::new(RefCell::new(DeviceSlot::Untouched)),
            enabled: Cell::new(DEFAULT_SOUND_ENABLED),
            tone: ToneSpec::default(),
        }
    }

    pub fn web() -> Self {
        Self::new(WebAudioBackend)
    }

    pub fn with_tone(mut self, tone: ToneSpec) -> Self {
        self.tone = tone;
        self
    }

    pub fn tone(&self) -> &ToneSpec {
        &self.tone
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Device is open, resumed and not released.
    pub fn is_ready(&self) -> bool {
        matches!(*self.slot.borrow(), DeviceSlot::Ready(_))
    }

    /// Open the device on first call; later calls do nothing.
    ///
    /// Returns a future when the device came up suspended. The caller must
    /// drive it; until it completes cues are dropped.
    pub fn initialize(&self) -> Option<LocalBoxFuture<'static, ()>> {
        if !matches!(*self.slot.borrow(), DeviceSlot::Untouched) {
            return None;
        }

        let device = match self.backend.open() {
            Ok(device) => device,
            Err(e) => {
                warn!("Audio context initialization failed: {}", e);
                *self.slot.borrow_mut() = DeviceSlot::Unavailable;
                return None;
            }
        };

        if !device.is_suspended() {
            info!("Audio device ready");
            *self.slot.borrow_mut() = DeviceSlot::Ready(device);
            return None;
        }

        debug!("Audio device suspended, resuming");
        *self.slot.borrow_mut() = DeviceSlot::Resuming(Rc::clone(&device));
        let slot = Rc::clone(&self.slot);
        let resume = device.resume();
        Some(
            async move {
                let outcome = resume.await;
                let mut slot = slot.borrow_mut();
                let still_ours =
                    matches!(&*slot, DeviceSlot::Resuming(d) if Rc::ptr_eq(d, &device));
                if !still_ours {
                    // Released while resuming.
                    device.close();
                    return;
                }
                match outcome {
                    Ok(()) => {
                        info!("Audio device resumed");
                        *slot = DeviceSlot::Ready(device);
                    }
                    Err(e) => {
                        warn!("Audio context initialization failed: {}", e);
                        device.close();
                        *slot = DeviceSlot::Unavailable;
                    }
                }
            }
            .boxed_local(),
        )
    }

    /// Play the cue if sound is on and the device is ready. Never fails.
    pub fn play_cue(&self) {
        if !self.enabled.get() {
            return;
        }
        let device = match &*self.slot.borrow() {
            DeviceSlot::Ready(device) => Rc::clone(device),
            DeviceSlot::Resuming(_) => {
                debug!("Cue dropped, audio device still resuming");
                return;
            }
            _ => return,
        };
        if let Err(e) = device.play_tone(&self.tone) {
            warn!("Sound playback failed: {}", e);
        }
    }

    /// Close the device if one was opened. Further cues are silent and
    /// `initialize` will not reopen it.
    pub fn release(&self) {
        // A device still resuming is closed by its pending resume future.
        if let DeviceSlot::Ready(device) = self.slot.replace(DeviceSlot::Released) {
            debug!("Releasing audio device");
            device.close();
        }
    }
}

impl Drop for AudioCueEmitter {
    fn drop(&mut self) {
        self.release();
    }
}
