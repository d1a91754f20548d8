use leptos::prelude::*;
use posemaze_game::io::{
    GameObserver, MonotonicClock, PredictionStatus, StateChange, StateChangeKind,
};
use posemaze_game::session::{ControllerHandle, Session};
use posemaze_game::{GameController, GameError, TickOutcome, GRID_SIZE};
use wasm_bindgen_futures::{spawn_local, JsFuture};

use crate::ui_model::{canvas_size, RunState, StatusLines};

mod canvas;
mod tm_pose;

use tm_pose::{TmClassifier, TmWebcam};

const MODEL_URL: &str = "tmModel/model.json";
const METADATA_URL: &str = "tmModel/metadata.json";
const WEBCAM_CONTAINER_ID: &str = "webcam-container";

pub fn start() {
    mount_to_body(|| view! { <App /> });
}

fn log(msg: &str) {
    web_sys::console::log_1(&msg.into());
}

/// Pushes game events into the canvas and the status panel.
#[derive(Clone, Copy)]
struct WebObserver {
    canvas: NodeRef<leptos::html::Canvas>,
    set_lines: WriteSignal<StatusLines>,
    threshold: f32,
    // Keep the goal banner up until the player moves again.
    celebrating: bool,
}

impl WebObserver {
    fn new(canvas: NodeRef<leptos::html::Canvas>, set_lines: WriteSignal<StatusLines>) -> Self {
        Self {
            canvas,
            set_lines,
            threshold: posemaze_game::GameConfig::default().confidence_threshold,
            celebrating: false,
        }
    }

    fn redraw(&self, change: &StateChange) {
        if let Some(el) = self.canvas.get_untracked() {
            if let Err(e) = canvas::draw_maze(&el, &change.snapshot) {
                web_sys::console::error_1(&e.into());
            }
        }
    }
}

impl GameObserver for WebObserver {
    fn on_state_change(&mut self, change: &StateChange) {
        self.redraw(change);
        match change.kind {
            StateChangeKind::GoalReached => {
                log("🎉 goal reached");
                self.celebrating = true;
                self.set_lines.set(StatusLines::goal_reached());
            }
            StateChangeKind::Moved => self.celebrating = false,
            StateChangeKind::Reset => {}
        }
    }

    fn on_prediction_tick(&mut self, status: &PredictionStatus) {
        if !self.celebrating {
            self.set_lines
                .set(StatusLines::for_prediction(status, self.threshold));
        }
    }
}

async fn next_animation_frame() {
    let promise = js_sys::Promise::new(&mut |resolve, _| {
        if let Some(w) = web_sys::window() {
            let _ = w.request_animation_frame(&resolve);
        }
    });
    let _ = JsFuture::from(promise).await;
}

/// One Start..Stop run. Owned by a single spawned task; the page only talks to
/// it through the controller handle and the run epoch.
async fn run_game(
    handle: ControllerHandle,
    epoch: u64,
    run_epoch: StoredValue<u64>,
    mut obs: WebObserver,
    set_run_state: WriteSignal<RunState>,
) -> Result<(), GameError> {
    let is_current = move || run_epoch.get_value() == epoch;

    obs.set_lines.set(StatusLines::loading_model());
    let classifier = TmClassifier::load(MODEL_URL, METADATA_URL).await?;
    if !is_current() {
        return Ok(());
    }

    obs.set_lines.set(StatusLines::starting_webcam());
    obs.threshold = handle.with(|c| c.config().confidence_threshold);
    let mut session = Session::from_handle(
        handle,
        TmWebcam::new(WEBCAM_CONTAINER_ID),
        classifier,
        MonotonicClock::new(),
    );
    session.start(&mut obs).await?;

    if is_current() {
        set_run_state.set(RunState::Running);
        obs.set_lines.set(StatusLines::ready());
        log("Webcam ready, starting prediction loop");

        while is_current() {
            next_animation_frame().await;
            if !is_current() {
                break;
            }
            if let TickOutcome::Cancelled = session.run_step(&mut obs).await {
                break;
            }
        }
    }

    session.stop(&mut obs);
    log("Game stopped");
    Ok(())
}

#[component]
fn App() -> impl IntoView {
    let controller = StoredValue::new_local(ControllerHandle::new(GameController::default()));
    let run_epoch = StoredValue::new(0u64);

    let (lines, set_lines) = signal(StatusLines::idle());
    let (run_state, set_run_state) = signal(RunState::Stopped);
    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
    let side = canvas_size(GRID_SIZE);

    Effect::new(move |_| {
        if let Some(el) = canvas_ref.get() {
            let snapshot = controller.with_value(|h| h.with(|c| c.maze().snapshot()));
            if let Err(e) = canvas::draw_maze(&el, &snapshot) {
                web_sys::console::error_1(&e.into());
            }
        }
    });

    let do_start = move || {
        if run_state.get_untracked() != RunState::Stopped {
            return;
        }
        let epoch = run_epoch.get_value().wrapping_add(1);
        run_epoch.set_value(epoch);
        set_run_state.set(RunState::Loading);

        let handle = controller.get_value();
        let obs = WebObserver::new(canvas_ref, set_lines);
        spawn_local(async move {
            let res = run_game(handle, epoch, run_epoch, obs, set_run_state).await;
            set_run_state.set(RunState::Stopped);
            match res {
                Err(e) => {
                    let msg = format!("Error loading model or webcam: {e}");
                    web_sys::console::error_1(&msg.into());
                    set_lines.set(StatusLines::error(&e.to_string()));
                }
                Ok(()) => set_lines.set(StatusLines::stopped()),
            }
        });
    };

    // The run task notices the new epoch on its next frame and releases the
    // webcam; stopping the controller here drops any inference in flight.
    let do_stop = move || {
        run_epoch.set_value(run_epoch.get_value().wrapping_add(1));
        let mut obs = WebObserver::new(canvas_ref, set_lines);
        controller.with_value(|h| h.stop(&mut obs));
    };

    let do_reset = move || {
        let mut obs = WebObserver::new(canvas_ref, set_lines);
        controller.with_value(|h| h.reset(&mut obs));
    };

    on_cleanup(move || run_epoch.set_value(run_epoch.get_value().wrapping_add(1)));

    view! {
        <main style="font-family: system-ui, -apple-system, Segoe UI, Roboto, sans-serif; padding: 18px; max-width: 960px; margin: 0 auto;">
            <h1 style="margin: 0 0 8px 0;">"Pose Maze"</h1>
            <p style="margin: 0 0 16px 0; color: #555;">
                "Point left, right, up or down to steer the blue dot to the red goal."
            </p>

            <section style="display: flex; gap: 10px; flex-wrap: wrap; margin-bottom: 14px;">
                <button
                    disabled=move || !run_state.get().buttons().start_enabled
                    on:click=move |_| do_start()
                >
                    {move || run_state.get().buttons().start_label}
                </button>
                <button
                    disabled=move || !run_state.get().buttons().stop_enabled
                    on:click=move |_| do_stop()
                >
                    "Stop"
                </button>
                <button on:click=move |_| do_reset()>
                    "Reset Maze"
                </button>
            </section>

            <section style="display: flex; gap: 18px; flex-wrap: wrap; align-items: flex-start;">
                <canvas node_ref=canvas_ref width=side height=side style="border: 1px solid #ccc;"></canvas>
                <div style="display: flex; flex-direction: column; gap: 10px; min-width: 280px;">
                    <div id=WEBCAM_CONTAINER_ID class="webcam-container" style="width: 300px;">
                        <div class="webcam-placeholder">"Webcam will appear here."</div>
                    </div>
                    <div id="prediction">
                        <div class="status">{move || lines.get().status}</div>
                        <div class="confidence">{move || lines.get().confidence}</div>
                        <div class="debug-info" style="color: #777; font-size: 12px;">
                            {move || lines.get().debug}
                        </div>
                    </div>
                </div>
            </section>
        </main>
    }
}
