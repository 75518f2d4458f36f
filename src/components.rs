//! Pure Yew view components for the start-lights page.
//!
//! Components render from props only; all sequencing lives in the
//! controller behind [`crate::hooks::use_start_lights`].

use crate::config::{LAMPS_PER_STRIP, STRIP_COUNT};
use crate::sequence::{LightsSnapshot, SequenceType};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct LightsBoardProps {
    pub snapshot: LightsSnapshot,
}

/// The gantry: five strips of four lamps on a back board.
#[function_component(LightsBoard)]
pub fn lights_board(props: &LightsBoardProps) -> Html {
    html! {
        <div class="f1-lights">
            <div class="back-board"></div>
            { (0..STRIP_COUNT).map(|i| {
                let look = props.snapshot.strip_look(i);
                html! {
                    <div key={i} class={classes!("light-strip", look.css_class())}>
                        { (0..LAMPS_PER_STRIP).map(|_| html!{ <div class="light"></div> }).collect::<Html>() }
                    </div>
                }
            }).collect::<Html>() }
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct GoSignalProps {
    pub visible: bool,
}

#[function_component(GoSignal)]
pub fn go_signal(props: &GoSignalProps) -> Html {
    if !props.visible {
        return html! {};
    }
    html! {
        <div class="go-signal">
            <div class="go-banner">{ "GO! GO! GO!" }</div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct ControlPanelProps {
    pub active: bool,
    pub sound_enabled: bool,
    pub on_start_race: Callback<MouseEvent>,
    pub on_formation_lap: Callback<MouseEvent>,
    pub on_reset: Callback<MouseEvent>,
    pub on_toggle_sound: Callback<MouseEvent>,
}

/// Start buttons lock while a sequence is active; reset and the sound
/// toggle always work.
#[function_component(ControlPanel)]
pub fn control_panel(props: &ControlPanelProps) -> Html {
    let locked = props.active.then_some("locked");
    html! {
        <>
            <div class="primary-controls">
                <button
                    class={classes!("start-race", locked)}
                    disabled={props.active}
                    onclick={props.on_start_race.clone()}
                >
                    { flag_icon() }
                    { "START RACE" }
                </button>
            </div>
            <div class="secondary-controls">
                <button
                    class={classes!("formation-lap", locked)}
                    disabled={props.active}
                    onclick={props.on_formation_lap.clone()}
                >
                    { play_icon() }
                    { "FORMATION LAP" }
                </button>
                <button class="reset" onclick={props.on_reset.clone()}>
                    { reset_icon() }
                    { "RESET" }
                </button>
                <button
                    class={classes!("sound-toggle", if props.sound_enabled { "on" } else { "off" })}
                    onclick={props.on_toggle_sound.clone()}
                >
                    { if props.sound_enabled { "Sound On" } else { "Sound Off" } }
                </button>
            </div>
        </>
    }
}

#[derive(Properties, PartialEq)]
pub struct StatusBadgeProps {
    pub snapshot: LightsSnapshot,
}

/// Names the running sequence; hidden while idle.
#[function_component(StatusBadge)]
pub fn status_badge(props: &StatusBadgeProps) -> Html {
    let Some(label) = props.snapshot.status_label() else {
        return html! {};
    };
    let kind = match props.snapshot.sequence_type() {
        SequenceType::FormationLap => "formation",
        _ => "race",
    };
    html! {
        <div class="status">
            <div class={classes!("status-badge", kind)}>{ label }</div>
        </div>
    }
}

/// Static help text under the controls.
pub fn render_instructions() -> Html {
    html! {
        <div class="instructions">
            <p class="tagline">{ "F1 Start Lights and Race Control System" }</p>
            <p>
                <strong class="race">{ "START RACE:" }</strong>
                { " 5 red light strips activate sequentially, when all lights turn off simultaneously - that's your GO signal!" }
            </p>
            <p>
                <strong class="formation">{ "FORMATION LAP:" }</strong>
                { " All red lights on, then green lights signal GO for the formation lap!" }
            </p>
        </div>
    }
}

fn icon(path: &'static str) -> Html {
    html! {
        <svg xmlns="http://www.w3.org/2000/svg" fill="none" viewBox="0 0 24 24" stroke-width="2" stroke="currentColor" class="icon">
            <path stroke-linecap="round" stroke-linejoin="round" d={path} />
        </svg>
    }
}

fn flag_icon() -> Html {
    icon("M4 15s1-1 4-1 5 2 8 2 4-1 4-1V3s-1 1-4 1-5-2-8-2-4 1-4 1zM4 22v-7")
}

fn play_icon() -> Html {
    icon("M6 3l14 9-14 9V3z")
}

fn reset_icon() -> Html {
    icon("M3 12a9 9 0 1 0 9-9 9.75 9.75 0 0 0-6.74 2.74L3 8M3 3v5h5")
}
