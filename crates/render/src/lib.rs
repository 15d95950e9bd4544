//! Rendering core: drives a [`GraphicsContext`] through program setup, the
//! one-time camera upload, and the per-frame spin update.
//!
//! # Invariants
//! - Setup aborts before any frame is drawn if an attribute location cannot
//!   be resolved.
//! - View and projection are uploaded once; only the model matrix changes per
//!   frame.
//! - The core never owns GPU objects directly; it holds opaque handles issued
//!   by the context.
//!
//! Two contexts exist: the wgpu backend in `spincube-render-wgpu`, and
//! [`RecordingContext`], which records commands instead of drawing and backs
//! tests and the CLI trace tool.

mod context;
mod draw;
mod error;
mod recording;
pub mod reflect;
mod setup;
pub mod shaders;

pub use context::{
    AttribLocation, BufferId, ClearMask, GraphicsContext, IndexWidth, ProgramId, UniformLocation,
};
pub use draw::CubeDraw;
pub use error::{ContextError, SetupError};
pub use recording::{Command, RecordingContext};
pub use reflect::ShaderInterface;
pub use setup::{CubeRenderer, ProgramBindings, RenderConfig, setup};

pub fn crate_info() -> &'static str {
    "spincube-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
