//! Browser entry point and page lifecycle wiring.

use crate::audio::WebAudioBackend;
use crate::{dom, frame, ui};
use forest_core::audio::Soundscape;
use forest_core::{ForestScene, FrameClock, SceneConfig};
use forest_gpu::Renderer;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

const CANVAS_ID: &str = "forest-canvas";
const AUDIO_BUTTON_ID: &str = "audio-toggle";

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("forest-web starting");

    spawn_local(async move {
        if let Err(e) = init().await {
            log::error!("init error: {:?}", e);
        }
    });
    Ok(())
}

async fn init() -> anyhow::Result<()> {
    let document = dom::window_document().ok_or_else(|| anyhow::anyhow!("no document"))?;
    let canvas: web::HtmlCanvasElement = document
        .get_element_by_id(CANVAS_ID)
        .ok_or_else(|| anyhow::anyhow!("missing #{}", CANVAS_ID))?
        .dyn_into::<web::HtmlCanvasElement>()
        .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))?;
    let (width, height) = dom::sync_canvas_backing_size(&canvas);

    let mut scene = ForestScene::new(SceneConfig::default())?;
    scene.set_aspect(width as f32 / height.max(1) as f32);
    let shadow_map_size = scene.frame().lights.key.shadow_map_size;

    // visuals degrade to nothing without WebGPU, audio still works
    let gpu = match Renderer::new(wgpu::SurfaceTarget::Canvas(canvas.clone()), width, height, shadow_map_size).await {
        Ok(g) => Some(g),
        Err(e) => {
            log::error!("WebGPU init error: {:?}", e);
            None
        }
    };

    let soundscape = Rc::new(RefCell::new(Soundscape::new(WebAudioBackend::new())));
    let control = ui::AudioControl::find(&document, AUDIO_BUTTON_ID);
    match &control {
        Some(c) => {
            c.sync(soundscape.borrow().state());
            let soundscape = soundscape.clone();
            let button = c.clone();
            // construction and resume must happen inside the click gesture
            dom::add_click_listener(c.element(), move || {
                let result = soundscape.borrow_mut().engage();
                let state = match result {
                    Ok(state) => state,
                    Err(e) => {
                        log::warn!("[gesture] audio engage failed: {}", e);
                        soundscape.borrow().state()
                    }
                };
                button.sync(state);
            });
        }
        None => log::warn!("missing #{}; audio stays off", AUDIO_BUTTON_ID),
    }

    let frame_ctx = Rc::new(RefCell::new(frame::FrameContext {
        canvas,
        scene,
        clock: FrameClock::new(),
        gpu,
        soundscape: soundscape.clone(),
        control: control.clone(),
    }));
    let frame_loop = frame::FrameLoop::start(frame_ctx);

    {
        let soundscape = soundscape.clone();
        let frame_loop = frame_loop.clone();
        dom::add_window_listener("pagehide", move || {
            frame_loop.pause();
            soundscape.borrow_mut().teardown();
        });
    }
    // a page restored from the back/forward cache gets a fresh soundscape
    dom::add_page_show_listener(move |persisted| {
        if !frame_loop.show(persisted) {
            return;
        }
        log::info!("page restored from cache; resuming");
        *soundscape.borrow_mut() = Soundscape::new(WebAudioBackend::new());
        if let Some(c) = &control {
            c.sync(soundscape.borrow().state());
        }
    });
    Ok(())
}
