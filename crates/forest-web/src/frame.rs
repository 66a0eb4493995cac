use crate::audio::WebAudioBackend;
use crate::dom;
use crate::lifecycle::LoopGate;
use crate::ui::AudioControl;
use forest_core::audio::Soundscape;
use forest_core::{ForestScene, FrameClock};
use forest_gpu::Renderer;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

pub type SharedSoundscape = Rc<RefCell<Soundscape<WebAudioBackend>>>;

pub struct FrameContext {
    pub canvas: web::HtmlCanvasElement,
    pub scene: ForestScene,
    pub clock: FrameClock,
    pub gpu: Option<Renderer<'static>>,
    pub soundscape: SharedSoundscape,
    pub control: Option<AudioControl>,
}

impl FrameContext {
    pub fn frame(&mut self) {
        let (elapsed, dt) = self.clock.tick();

        let (w, h) = dom::sync_canvas_backing_size(&self.canvas);
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.resize_if_needed(w, h);
            self.scene.set_aspect(gpu.aspect());
        }

        let graph = self.scene.update(elapsed, dt);
        if let Some(gpu) = self.gpu.as_mut() {
            match gpu.render(&graph) {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => gpu.reconfigure(),
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("surface out of memory; rendering stopped");
                    self.gpu = None;
                }
                Err(e) => log::warn!("frame skipped: {:?}", e),
            }
        }

        let state = self.soundscape.borrow_mut().update();
        if let Some(control) = &self.control {
            control.sync(state);
        }
    }
}

/// requestAnimationFrame driver around `FrameContext::frame`.
#[derive(Clone)]
pub struct FrameLoop {
    tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
    gate: Rc<LoopGate>,
}

impl FrameLoop {
    pub fn start(frame_ctx: Rc<RefCell<FrameContext>>) -> Self {
        let frame_loop = Self {
            tick: Rc::new(RefCell::new(None)),
            gate: Rc::new(LoopGate::new()),
        };
        let handle = frame_loop.clone();
        *frame_loop.tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            if !handle.gate.begin_frame() {
                return;
            }
            frame_ctx.borrow_mut().frame();
            handle.request();
        }) as Box<dyn FnMut()>));
        frame_loop.request();
        frame_loop
    }

    fn request(&self) {
        let tick = self.tick.borrow();
        self.gate.schedule(|| match (web::window(), tick.as_ref()) {
            (Some(w), Some(cb)) => w.request_animation_frame(cb.as_ref().unchecked_ref()).is_ok(),
            _ => false,
        });
    }

    pub fn pause(&self) {
        self.gate.pause();
    }

    /// Resume after a back/forward-cache restore. Returns whether it resumed.
    pub fn show(&self, persisted: bool) -> bool {
        if !self.gate.show(persisted) {
            return false;
        }
        self.request();
        true
    }
}
