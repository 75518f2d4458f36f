//! Application-level timing and tone constants.

// Light board
pub const STRIP_COUNT: usize = 5;
pub const LAMPS_PER_STRIP: usize = 4;

// Race start
pub const RACE_STRIP_STEP_MS: u32 = 1_000;
pub const RACE_LIGHTS_OUT_BASE_MS: u32 = 5_000;
pub const RACE_HOLD_MIN_MS: u32 = 1_000;
pub const RACE_HOLD_MAX_MS: u32 = 5_000;
pub const RACE_GO_DISPLAY_MS: u32 = 6_000;

// Formation lap
pub const FORMATION_RED_MIN_MS: u32 = 2_000;
pub const FORMATION_RED_MAX_MS: u32 = 5_000;
pub const FORMATION_GREEN_MS: u32 = 5_000;
pub const FORMATION_GO_DISPLAY_MS: u32 = 1_000;

// Cue tone (B4)
pub const CUE_FREQUENCY_HZ: f32 = 493.883;
pub const CUE_DURATION_MS: u32 = 200;
pub const CUE_ATTACK_MS: u32 = 10;
pub const CUE_PEAK_GAIN: f32 = 0.1;
pub const CUE_FLOOR_GAIN: f32 = 0.001;

// UI defaults
pub const DEFAULT_SOUND_ENABLED: bool = true;

/// Delays driving one controller, grouped so tests and alternative boards
/// can shorten or stretch a run without touching the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceTiming {
    pub race_strip_step_ms: u32,
    pub race_lights_out_base_ms: u32,
    pub race_hold_ms: (u32, u32),
    pub race_go_display_ms: u32,
    pub formation_red_ms: (u32, u32),
    pub formation_green_ms: u32,
    pub formation_go_display_ms: u32,
}

impl Default for SequenceTiming {
    fn default() -> Self {
        Self {
            race_strip_step_ms: RACE_STRIP_STEP_MS,
            race_lights_out_base_ms: RACE_LIGHTS_OUT_BASE_MS,
            race_hold_ms: (RACE_HOLD_MIN_MS, RACE_HOLD_MAX_MS),
            race_go_display_ms: RACE_GO_DISPLAY_MS,
            formation_red_ms: (FORMATION_RED_MIN_MS, FORMATION_RED_MAX_MS),
            formation_green_ms: FORMATION_GREEN_MS,
            formation_go_display_ms: FORMATION_GO_DISPLAY_MS,
        }
    }
}
