//! Browser host: a full-window canvas rendered with WebGPU and a single
//! button that engages the Web Audio soundscape.

pub mod lifecycle;

#[cfg(target_arch = "wasm32")]
mod audio;
#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod frame;
#[cfg(target_arch = "wasm32")]
mod host;
#[cfg(target_arch = "wasm32")]
mod ui;
