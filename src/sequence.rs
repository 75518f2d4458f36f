//! State-machine vocabulary shared by the controller and the view.
//!
//! The controller stores only the strip array and the current
//! [`SequenceState`]; everything the UI asks about (sequence type, formation
//! phase, GO banner, whether the start buttons are locked) is derived from
//! the state so the two can never disagree.

use crate::config::STRIP_COUNT;

/// One boolean per strip, index 0 is the leftmost strip.
pub type LightStripState = [bool; STRIP_COUNT];

pub const ALL_OFF: LightStripState = [false; STRIP_COUNT];
pub const ALL_ON: LightStripState = [true; STRIP_COUNT];

/// Strips lit in green during the formation-lap green phase.
pub const GREEN_OVERLAY_STRIPS: [usize; 2] = [1, 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceState {
    Idle,
    RaceRunning,
    RaceGoDisplay,
    FormationRedPhase,
    FormationGreenPhase,
    FormationGoDisplay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceType {
    None,
    Race,
    FormationLap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormationPhase {
    None,
    Red,
    Green,
}

/// How a single strip should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StripLook {
    Off,
    Red,
    Green,
}

impl StripLook {
    /// CSS modifier class for the strip, empty when dark.
    pub fn css_class(self) -> &'static str {
        match self {
            StripLook::Off => "",
            StripLook::Red => "on",
            StripLook::Green => "green",
        }
    }
}

impl SequenceState {
    pub fn sequence_type(self) -> SequenceType {
        match self {
            SequenceState::Idle => SequenceType::None,
            SequenceState::RaceRunning | SequenceState::RaceGoDisplay => SequenceType::Race,
            SequenceState::FormationRedPhase
            | SequenceState::FormationGreenPhase
            | SequenceState::FormationGoDisplay => SequenceType::FormationLap,
        }
    }

    pub fn formation_phase(self) -> FormationPhase {
        match self {
            SequenceState::FormationRedPhase => FormationPhase::Red,
            SequenceState::FormationGreenPhase => FormationPhase::Green,
            _ => FormationPhase::None,
        }
    }

    pub fn go_signal_visible(self) -> bool {
        matches!(
            self,
            SequenceState::RaceGoDisplay
                | SequenceState::FormationGreenPhase
                | SequenceState::FormationGoDisplay
        )
    }

    /// True while the start buttons must stay locked. The GO display tails
    /// of both sequences are not active: a new start may cut them short.
    pub fn is_sequence_active(self) -> bool {
        matches!(
            self,
            SequenceState::RaceRunning
                | SequenceState::FormationRedPhase
                | SequenceState::FormationGreenPhase
        )
    }
}

/// Immutable view of the controller handed to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightsSnapshot {
    pub strips: LightStripState,
    pub state: SequenceState,
}

impl Default for LightsSnapshot {
    fn default() -> Self {
        Self {
            strips: ALL_OFF,
            state: SequenceState::Idle,
        }
    }
}

impl LightsSnapshot {
    pub fn sequence_type(&self) -> SequenceType {
        self.state.sequence_type()
    }

    pub fn formation_phase(&self) -> FormationPhase {
        self.state.formation_phase()
    }

    pub fn go_signal_visible(&self) -> bool {
        self.state.go_signal_visible()
    }

    pub fn is_sequence_active(&self) -> bool {
        self.state.is_sequence_active()
    }

    /// Render-time look of strip `index`. The green phase overlay is keyed
    /// off the formation phase only; the strip array stays all-false.
    pub fn strip_look(&self, index: usize) -> StripLook {
        let lit = self.strips.get(index).copied().unwrap_or(false);
        match (self.sequence_type(), self.formation_phase()) {
            (SequenceType::Race, _) if lit => StripLook::Red,
            (SequenceType::FormationLap, FormationPhase::Red) if lit => StripLook::Red,
            (SequenceType::FormationLap, FormationPhase::Green)
                if GREEN_OVERLAY_STRIPS.contains(&index) =>
            {
                StripLook::Green
            }
            _ => StripLook::Off,
        }
    }

    /// Status banner text, `None` while idle.
    pub fn status_label(&self) -> Option<&'static str> {
        match self.sequence_type() {
            SequenceType::None => None,
            SequenceType::Race => Some("OFFICIAL RACE START"),
            SequenceType::FormationLap => Some("FORMATION LAP SEQUENCE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_values_follow_state_table() {
        let rows = [
            (SequenceState::Idle, SequenceType::None, FormationPhase::None, false, false),
            (SequenceState::RaceRunning, SequenceType::Race, FormationPhase::None, false, true),
            (SequenceState::RaceGoDisplay, SequenceType::Race, FormationPhase::None, true, false),
            (
                SequenceState::FormationRedPhase,
                SequenceType::FormationLap,
                FormationPhase::Red,
                false,
                true,
            ),
            (
                SequenceState::FormationGreenPhase,
                SequenceType::FormationLap,
                FormationPhase::Green,
                true,
                true,
            ),
            (
                SequenceState::FormationGoDisplay,
                SequenceType::FormationLap,
                FormationPhase::None,
                true,
                false,
            ),
        ];
        for (state, ty, phase, go, active) in rows {
            assert_eq!(state.sequence_type(), ty, "{state:?}");
            assert_eq!(state.formation_phase(), phase, "{state:?}");
            assert_eq!(state.go_signal_visible(), go, "{state:?}");
            assert_eq!(state.is_sequence_active(), active, "{state:?}");
        }
    }

    #[test]
    fn green_phase_overlays_strips_one_and_three() {
        let snap = LightsSnapshot {
            strips: ALL_OFF,
            state: SequenceState::FormationGreenPhase,
        };
        let looks: Vec<_> = (0..STRIP_COUNT).map(|i| snap.strip_look(i)).collect();
        assert_eq!(
            looks,
            vec![
                StripLook::Off,
                StripLook::Green,
                StripLook::Off,
                StripLook::Green,
                StripLook::Off
            ]
        );
    }

    #[test]
    fn lit_strips_render_red_only_in_race_and_red_phase() {
        let mut strips = ALL_OFF;
        strips[0] = true;
        let race = LightsSnapshot { strips, state: SequenceState::RaceRunning };
        assert_eq!(race.strip_look(0), StripLook::Red);
        assert_eq!(race.strip_look(1), StripLook::Off);

        let red = LightsSnapshot { strips: ALL_ON, state: SequenceState::FormationRedPhase };
        assert!((0..STRIP_COUNT).all(|i| red.strip_look(i) == StripLook::Red));

        let idle = LightsSnapshot { strips: ALL_ON, state: SequenceState::Idle };
        assert_eq!(idle.strip_look(2), StripLook::Off);
        assert_eq!(idle.status_label(), None);
    }
}
