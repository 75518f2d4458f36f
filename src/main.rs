//! Main module for the F1 start lights page using Yew.
//! Wires the controller hook into the view components.

use f1_start_lights::components::{
    render_instructions, ControlPanel, GoSignal, LightsBoard, StatusBadge,
};
use f1_start_lights::hooks::use_start_lights;
use f1_start_lights::logging;
use yew::prelude::*;

/// Primary application component.
#[function_component]
pub fn App() -> Html {
    let lights = use_start_lights();
    let snapshot = lights.snapshot;

    html! {
        <div class="app">
            <header class="title">
                <h1>{ "F1 STARTING LIGHTS" }</h1>
            </header>

            <div class="lights-container">
                <LightsBoard snapshot={snapshot} />
                <GoSignal visible={snapshot.go_signal_visible()} />
            </div>

            <ControlPanel
                active={snapshot.is_sequence_active()}
                sound_enabled={lights.sound_enabled}
                on_start_race={lights.on_start_race.clone()}
                on_formation_lap={lights.on_formation_lap.clone()}
                on_reset={lights.on_reset.clone()}
                on_toggle_sound={lights.on_toggle_sound.clone()}
            />

            <StatusBadge snapshot={snapshot} />

            { render_instructions() }
        </div>
    }
}

/// Entry point: installs the panic hook and console logger, then renders.
fn main() {
    console_error_panic_hook::set_once();
    logging::init(logging::default_level());
    yew::Renderer::<App>::new().render();
}
