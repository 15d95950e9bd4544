use crate::error::ContextError;
use glam::Mat4;
use serde::{Deserialize, Serialize};

/// Compiled program handle issued by a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProgramId(pub u32);

/// Buffer handle issued by a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BufferId(pub u32);

/// A resolved, non-negative vertex attribute slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttribLocation(pub u32);

impl AttribLocation {
    /// Convert a raw location as returned by [`GraphicsContext::attrib_location`].
    /// Negative values mean the attribute does not exist.
    pub fn from_raw(raw: i32) -> Option<Self> {
        u32::try_from(raw).ok().map(Self)
    }
}

/// Uniform slot within a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UniformLocation {
    pub program: ProgramId,
    pub slot: u32,
}

/// Width of one element in an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexWidth {
    U8,
    U16,
}

impl IndexWidth {
    pub fn bytes(self) -> usize {
        match self {
            IndexWidth::U8 => 1,
            IndexWidth::U16 => 2,
        }
    }
}

/// Which attachments a clear touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClearMask {
    pub color: bool,
    pub depth: bool,
}

impl ClearMask {
    pub const COLOR_AND_DEPTH: Self = Self {
        color: true,
        depth: true,
    };
}

/// The drawing capability handed to the core by the platform harness.
///
/// The shape follows an immediate-mode GL API: one current program, bound
/// array/element buffers, attribute pointers that capture the currently bound
/// array buffer, and draws that use whatever is bound at call time. Backends
/// that record or batch work flush it in [`present`](Self::present).
///
/// Creating a program makes it current.
pub trait GraphicsContext {
    /// Drawable size in physical pixels.
    fn drawing_buffer_size(&self) -> (u32, u32);

    fn create_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ProgramId, ContextError>;

    /// Location of a vertex attribute, or a negative value if `name` is not an
    /// input of `program`.
    fn attrib_location(&self, program: ProgramId, name: &str) -> i32;

    fn enable_vertex_attrib_array(&mut self, location: AttribLocation);

    /// `None` if `name` is not a uniform of `program`.
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    /// Upload a column-major 4×4 matrix.
    fn uniform_matrix4(&mut self, location: UniformLocation, matrix: &Mat4);

    /// Create a vertex buffer holding `data`; the new buffer becomes the bound
    /// array buffer.
    fn create_array_buffer(&mut self, data: &[f32]) -> BufferId;

    /// Create an 8-bit index buffer; the new buffer becomes the bound element
    /// buffer.
    fn create_element_buffer(&mut self, indices: &[u8]) -> BufferId;

    fn bind_array_buffer(&mut self, buffer: BufferId);

    /// Point `location` at the bound array buffer: `components` floats per
    /// vertex, tightly packed, zero offset.
    fn vertex_attrib_pointer(&mut self, location: AttribLocation, components: u8);

    fn bind_element_buffer(&mut self, buffer: BufferId);

    fn enable_depth_test(&mut self);

    fn clear_color(&mut self, rgba: [f32; 4]);

    fn clear(&mut self, mask: ClearMask);

    /// Indexed triangle-list draw of `count` indices from the bound element
    /// buffer.
    fn draw_elements(&mut self, count: u32, width: IndexWidth);

    /// Finish the frame. Immediate-mode contexts have nothing to do.
    fn present(&mut self) -> Result<(), ContextError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_raw_location_is_rejected() {
        assert_eq!(AttribLocation::from_raw(-1), None);
        assert_eq!(AttribLocation::from_raw(i32::MIN), None);
        assert_eq!(AttribLocation::from_raw(0), Some(AttribLocation(0)));
        assert_eq!(AttribLocation::from_raw(3), Some(AttribLocation(3)));
    }

    #[test]
    fn index_width_bytes() {
        assert_eq!(IndexWidth::U8.bytes(), 1);
        assert_eq!(IndexWidth::U16.bytes(), 2);
    }

    #[test]
    fn clear_mask_default_is_empty() {
        let mask = ClearMask::default();
        assert!(!mask.color && !mask.depth);
        let both = ClearMask::COLOR_AND_DEPTH;
        assert!(both.color && both.depth);
    }
}
