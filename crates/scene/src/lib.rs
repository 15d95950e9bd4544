//! Scene data: the cube mesh, the fixed camera, and the spin animation.
//!
//! # Invariants
//! - Mesh data is static and never mutated after construction.
//! - The spin angle is owned by a single [`SpinState`] and only advanced
//!   through [`SpinState::advance`].
//! - Matrices are column-major, matching `glam::Mat4`.

mod camera;
mod mesh;
mod spin;

pub use camera::LookAtCamera;
pub use mesh::{COMPONENTS_PER_VERTEX, CubeMesh, INDEX_COUNT, VERTEX_COUNT};
pub use spin::{FramePhase, SpinConfig, SpinState, rotation_y, wrap_once};

pub fn crate_info() -> &'static str {
    "spincube-scene v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("scene"));
    }
}
