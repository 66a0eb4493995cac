mod audio;

use audio::CpalBackend;
use forest_core::audio::{AudioState, Soundscape};
use forest_core::{ForestScene, FrameClock, SceneConfig, SeedSource};
use forest_gpu::Renderer;
use std::sync::Arc;
use winit::event::{ElementState, Event, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowBuilder};

const TITLE: &str = "Mythic Forest";

fn seed_from_env() -> SeedSource {
    match std::env::var("FOREST_SEED") {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(seed) => {
                log::info!("using FOREST_SEED={}", seed);
                SeedSource::Fixed(seed)
            }
            Err(_) => {
                log::warn!("ignoring unparsable FOREST_SEED={:?}", raw);
                SeedSource::Entropy
            }
        },
        Err(_) => SeedSource::Entropy,
    }
}

fn window_title(state: AudioState) -> String {
    format!("{} | {} (A or click)", TITLE, state.label())
}

fn engage(soundscape: &mut Soundscape<CpalBackend>, window: &Window) {
    if let Err(e) = soundscape.engage() {
        log::warn!("[gesture] audio engage failed: {}", e);
    }
    window.set_title(&window_title(soundscape.state()));
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(TITLE)
            .with_inner_size(winit::dpi::LogicalSize::new(1280.0, 720.0))
            .build(&event_loop)?,
    );
    let size = window.inner_size();
    let (width, height) = (size.width.max(1), size.height.max(1));

    let mut scene = ForestScene::new(SceneConfig::default().with_seed(seed_from_env()))?;
    scene.set_aspect(width as f32 / height as f32);
    let shadow_map_size = scene.frame().lights.key.shadow_map_size;

    let mut renderer = pollster::block_on(Renderer::new(
        Arc::clone(&window),
        width,
        height,
        shadow_map_size,
    ))?;
    scene.set_aspect(renderer.aspect());

    let mut soundscape = Soundscape::new(CpalBackend::new());
    let mut shown = soundscape.state();
    window.set_title(&window_title(shown));
    let mut clock = FrameClock::new();

    event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);
        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::Resized(size) => {
                    renderer.resize_if_needed(size.width, size.height);
                    scene.set_aspect(renderer.aspect());
                }
                WindowEvent::CloseRequested => {
                    soundscape.teardown();
                    elwt.exit();
                }
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            physical_key: PhysicalKey::Code(KeyCode::KeyA),
                            state: ElementState::Pressed,
                            repeat: false,
                            ..
                        },
                    ..
                } => engage(&mut soundscape, &window),
                WindowEvent::MouseInput {
                    state: ElementState::Pressed,
                    button: MouseButton::Left,
                    ..
                } => engage(&mut soundscape, &window),
                _ => {}
            },
            Event::AboutToWait => {
                let (elapsed, dt) = clock.tick();
                let graph = scene.update(elapsed, dt);
                match renderer.render(&graph) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        renderer.reconfigure()
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("surface out of memory; exiting");
                        soundscape.teardown();
                        elwt.exit();
                    }
                    Err(e) => log::warn!("frame skipped: {:?}", e),
                }

                let state = soundscape.update();
                if state != shown {
                    shown = state;
                    window.set_title(&window_title(state));
                }
            }
            _ => {}
        }
    })?;
    Ok(())
}
