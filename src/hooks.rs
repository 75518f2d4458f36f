use crate::controller::SequenceController;
use crate::sequence::LightsSnapshot;
use yew::prelude::*;

/// Everything the page needs from the sequence controller.
#[derive(Clone)]
pub struct StartLights {
    /// Latest state pushed by the controller.
    pub snapshot: LightsSnapshot,
    pub sound_enabled: bool,
    pub on_start_race: Callback<MouseEvent>,
    pub on_formation_lap: Callback<MouseEvent>,
    pub on_reset: Callback<MouseEvent>,
    pub on_toggle_sound: Callback<MouseEvent>,
}

/// Owns one [`SequenceController`] for the lifetime of the calling
/// component and re-renders it on every light change.
#[hook]
pub fn use_start_lights() -> StartLights {
    // Built once per mount; the controller keeps its own timers.
    let controller = use_memo((), |_| SequenceController::browser());
    let snapshot = use_state(|| controller.snapshot());
    let sound_enabled = use_state(|| controller.sound_enabled());

    // Subscribe on mount, tear down timers and audio on unmount.
    {
        let controller = controller.clone();
        let snapshot_setter = snapshot.clone();
        use_effect_with((), move |_| {
            controller.subscribe(move |snap| snapshot_setter.set(*snap));
            move || controller.teardown()
        });
    }

    let on_start_race = {
        let controller = controller.clone();
        Callback::from(move |_: MouseEvent| controller.start_race())
    };

    let on_formation_lap = {
        let controller = controller.clone();
        Callback::from(move |_: MouseEvent| controller.start_formation_lap())
    };

    let on_reset = {
        let controller = controller.clone();
        Callback::from(move |_: MouseEvent| controller.reset())
    };

    let on_toggle_sound = {
        let controller = controller.clone();
        let sound_setter = sound_enabled.clone();
        Callback::from(move |_: MouseEvent| {
            let enabled = !controller.sound_enabled();
            controller.toggle_sound(enabled);
            sound_setter.set(enabled);
        })
    };

    StartLights {
        snapshot: *snapshot,
        sound_enabled: *sound_enabled,
        on_start_race,
        on_formation_lap,
        on_reset,
        on_toggle_sound,
    }
}
