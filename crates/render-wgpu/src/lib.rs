//! wgpu implementation of [`spincube_render::GraphicsContext`].
//!
//! GL-style calls are recorded into a pending frame and encoded as a single
//! render pass when the frame is presented. Pipelines are built lazily from
//! the attribute pointers in effect at draw time and cached per program.
//!
//! # Invariants
//! - Element buffers are uploaded as 16-bit indices; wgpu has no 8-bit index
//!   format.
//! - Every pass carries a depth attachment; disabling the depth test only
//!   changes the pipeline's compare function.

mod gpu;
mod pipeline;

pub use gpu::WgpuContext;
