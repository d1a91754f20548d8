//! Bindings to the Teachable Machine pose library (`tmPose` global) and the
//! game-side adapters built on them.

use posemaze_game::io::{ClassScore, Classifier, FrameSource};
use posemaze_game::GameError;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

const WEBCAM_SIZE: u32 = 400;
const WEBCAM_WARMUP_MS: i32 = 500;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = tmPose, js_name = load, catch)]
    fn tm_load(model_url: &str, metadata_url: &str) -> Result<js_sys::Promise, JsValue>;

    pub type CustomPoseNet;

    #[wasm_bindgen(method, js_name = getTotalClasses)]
    fn get_total_classes(this: &CustomPoseNet) -> u32;

    #[wasm_bindgen(method, catch, js_name = estimatePose)]
    fn estimate_pose(
        this: &CustomPoseNet,
        input: &web_sys::HtmlCanvasElement,
    ) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn predict(this: &CustomPoseNet, posenet_output: &JsValue) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(js_namespace = tmPose)]
    pub type Webcam;

    #[wasm_bindgen(constructor, js_namespace = tmPose, catch)]
    fn new(width: u32, height: u32, flip: bool) -> Result<Webcam, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn setup(this: &Webcam) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn play(this: &Webcam) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(method)]
    fn update(this: &Webcam);

    #[wasm_bindgen(method, catch)]
    fn stop(this: &Webcam) -> Result<(), JsValue>;

    #[wasm_bindgen(method, getter)]
    fn canvas(this: &Webcam) -> Option<web_sys::HtmlCanvasElement>;
}

fn js_message(err: &JsValue) -> String {
    if let Some(e) = err.dyn_ref::<js_sys::Error>() {
        return String::from(e.message());
    }
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

fn global_defined(name: &str) -> bool {
    js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str(name))
        .map(|v| !v.is_undefined())
        .unwrap_or(false)
}

async fn await_promise(p: Result<js_sys::Promise, JsValue>) -> Result<JsValue, String> {
    let p = p.map_err(|e| js_message(&e))?;
    JsFuture::from(p).await.map_err(|e| js_message(&e))
}

async fn sleep_ms(ms: i32) {
    let promise = js_sys::Promise::new(&mut |resolve, _| {
        if let Some(w) = web_sys::window() {
            let _ = w.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms);
        }
    });
    let _ = JsFuture::from(promise).await;
}

/// Loaded pose model plus its class count.
pub struct TmClassifier {
    model: CustomPoseNet,
    classes: u32,
}

impl TmClassifier {
    pub async fn load(model_url: &str, metadata_url: &str) -> Result<Self, GameError> {
        if !global_defined("tmPose") {
            return Err(GameError::ClassifierUnavailable(
                "Teachable Machine library not loaded. Check script order.".to_string(),
            ));
        }
        if !global_defined("tf") {
            return Err(GameError::ClassifierUnavailable(
                "TensorFlow.js not loaded. Check script order.".to_string(),
            ));
        }

        let model: CustomPoseNet = await_promise(tm_load(model_url, metadata_url))
            .await
            .map_err(GameError::ClassifierUnavailable)?
            .unchecked_into();
        let classes = model.get_total_classes();
        web_sys::console::log_1(&format!("Model loaded. Classes: {classes}").into());
        Ok(Self { model, classes })
    }

    fn read_scores(&self, predictions: &JsValue) -> Vec<ClassScore> {
        let arr = js_sys::Array::from(predictions);
        let n = arr.length().min(self.classes);
        (0..n)
            .filter_map(|i| {
                let entry = arr.get(i);
                let label = js_sys::Reflect::get(&entry, &"className".into())
                    .ok()?
                    .as_string()?;
                let p = js_sys::Reflect::get(&entry, &"probability".into())
                    .ok()?
                    .as_f64()?;
                Some(ClassScore::new(label, p as f32))
            })
            .collect()
    }
}

impl Classifier for TmClassifier {
    type Frame = web_sys::HtmlCanvasElement;

    async fn estimate(
        &mut self,
        frame: &web_sys::HtmlCanvasElement,
    ) -> Result<Option<Vec<ClassScore>>, GameError> {
        let out = await_promise(self.model.estimate_pose(frame))
            .await
            .map_err(GameError::Inference)?;
        let posenet_output = js_sys::Reflect::get(&out, &"posenetOutput".into())
            .map_err(|e| GameError::Inference(js_message(&e)))?;
        let pose = js_sys::Reflect::get(&out, &"pose".into())
            .map_err(|e| GameError::Inference(js_message(&e)))?;
        let missing = |v: &JsValue| v.is_null() || v.is_undefined();
        if missing(&pose) || missing(&posenet_output) {
            return Ok(None);
        }

        let predictions = await_promise(self.model.predict(&posenet_output))
            .await
            .map_err(GameError::Inference)?;
        Ok(Some(self.read_scores(&predictions)))
    }
}

/// Mirrored 400×400 webcam whose canvas is mounted into `container_id`.
pub struct TmWebcam {
    container_id: &'static str,
    webcam: Option<Webcam>,
}

impl TmWebcam {
    pub fn new(container_id: &'static str) -> Self {
        Self {
            container_id,
            webcam: None,
        }
    }

    fn container(&self) -> Option<web_sys::Element> {
        web_sys::window()?
            .document()?
            .get_element_by_id(self.container_id)
    }

    async fn open(&self) -> Result<Webcam, String> {
        let webcam = Webcam::new(WEBCAM_SIZE, WEBCAM_SIZE, true).map_err(|e| js_message(&e))?;
        await_promise(webcam.setup()).await?;
        await_promise(webcam.play()).await?;

        let canvas = webcam.canvas().ok_or("Webcam canvas not found!".to_string())?;
        let style = canvas.style();
        let _ = style.set_property("width", "100%");
        let _ = style.set_property("height", "auto");
        let _ = style.set_property("display", "block");
        if let Some(container) = self.container() {
            container.set_inner_html("");
            container
                .append_child(&canvas)
                .map_err(|e| js_message(&e))?;
        }

        sleep_ms(WEBCAM_WARMUP_MS).await;
        Ok(webcam)
    }
}

impl FrameSource for TmWebcam {
    type Frame = web_sys::HtmlCanvasElement;

    async fn start(&mut self) -> Result<(), GameError> {
        let webcam = self.open().await.map_err(GameError::ClassifierUnavailable)?;
        self.webcam = Some(webcam);
        Ok(())
    }

    fn next_frame(&mut self) -> Option<web_sys::HtmlCanvasElement> {
        let webcam = self.webcam.as_ref()?;
        webcam.update();
        // A zero-sized canvas means the stream is not producing frames yet.
        webcam
            .canvas()
            .filter(|c| c.width() > 0 && c.height() > 0)
    }

    fn stop(&mut self) {
        if let Some(webcam) = self.webcam.take() {
            if let Err(e) = webcam.stop() {
                web_sys::console::error_1(
                    &format!("Error stopping webcam: {}", js_message(&e)).into(),
                );
            }
        }
        if let Some(container) = self.container() {
            container.set_inner_html(
                "<div class=\"webcam-placeholder\">Webcam stopped. Click \"Start Game\" to play again.</div>",
            );
        }
    }
}
