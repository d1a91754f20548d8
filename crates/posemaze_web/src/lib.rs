//! Browser app: webcam + Teachable Machine pose model driving the maze.
//!
//! This crate is a stub by default so the workspace builds on native targets
//! without wasm toolchains. Enable the real app with `--features web` on a
//! wasm32 target.

pub mod ui_model;

/// Placeholder function for non-web (or non-wasm) builds.
#[cfg(not(all(feature = "web", target_arch = "wasm32")))]
pub fn placeholder() {
    // No-op.
}

#[cfg(all(feature = "web", target_arch = "wasm32"))]
mod web;

#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub use web::start;
