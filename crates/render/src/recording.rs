use crate::context::{
    AttribLocation, BufferId, ClearMask, GraphicsContext, IndexWidth, ProgramId, UniformLocation,
};
use crate::error::ContextError;
use crate::reflect::ShaderInterface;
use glam::Mat4;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// One call made against a [`RecordingContext`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    CreateProgram { program: ProgramId },
    EnableVertexAttribArray { location: u32 },
    UniformMatrix4 { name: String, matrix: [f32; 16] },
    CreateArrayBuffer { buffer: BufferId, floats: usize },
    CreateElementBuffer { buffer: BufferId, indices: Vec<u8> },
    BindArrayBuffer { buffer: BufferId },
    VertexAttribPointer { location: u32, components: u8 },
    BindElementBuffer { buffer: BufferId },
    EnableDepthTest,
    ClearColor { rgba: [f32; 4] },
    Clear { color: bool, depth: bool },
    DrawElements { count: u32, width: IndexWidth },
    Present,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::CreateProgram { program } => write!(f, "create_program -> #{}", program.0),
            Command::EnableVertexAttribArray { location } => {
                write!(f, "enable_vertex_attrib_array({location})")
            }
            Command::UniformMatrix4 { name, matrix } => {
                write!(f, "uniform_matrix4({name}) [")?;
                for (i, v) in matrix.iter().enumerate() {
                    let sep = if i == 0 { "" } else { ", " };
                    write!(f, "{sep}{v:.3}")?;
                }
                write!(f, "]")
            }
            Command::CreateArrayBuffer { buffer, floats } => {
                write!(f, "create_array_buffer -> #{} ({floats} floats)", buffer.0)
            }
            Command::CreateElementBuffer { buffer, indices } => write!(
                f,
                "create_element_buffer -> #{} ({} indices)",
                buffer.0,
                indices.len()
            ),
            Command::BindArrayBuffer { buffer } => write!(f, "bind_array_buffer(#{})", buffer.0),
            Command::VertexAttribPointer {
                location,
                components,
            } => write!(f, "vertex_attrib_pointer({location}, {components} x f32)"),
            Command::BindElementBuffer { buffer } => {
                write!(f, "bind_element_buffer(#{})", buffer.0)
            }
            Command::EnableDepthTest => write!(f, "enable(depth_test)"),
            Command::ClearColor { rgba } => write!(
                f,
                "clear_color({:.2}, {:.2}, {:.2}, {:.2})",
                rgba[0], rgba[1], rgba[2], rgba[3]
            ),
            Command::Clear { color, depth } => write!(f, "clear(color={color}, depth={depth})"),
            Command::DrawElements { count, width } => {
                write!(f, "draw_elements(triangles, {count}, {width:?})")
            }
            Command::Present => write!(f, "present"),
        }
    }
}

/// A context that records every call instead of drawing.
///
/// Programs are reflected from their WGSL source exactly like the GPU backend
/// does, so attribute and uniform lookups behave the same. Individual
/// attributes can be hidden to simulate a program that fails to expose them.
#[derive(Debug, Default)]
pub struct RecordingContext {
    width: u32,
    height: u32,
    programs: Vec<ShaderInterface>,
    hidden_attributes: BTreeSet<String>,
    next_buffer: u32,
    commands: Vec<Command>,
}

impl RecordingContext {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Report `name` as missing from every program.
    pub fn without_attribute(mut self, name: impl Into<String>) -> Self {
        self.hidden_attributes.insert(name.into());
        self
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Human-readable listing of the recorded commands, one per line.
    pub fn transcript(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "=== {} commands ({}x{}) ===\n",
            self.commands.len(),
            self.width,
            self.height
        ));
        for (i, cmd) in self.commands.iter().enumerate() {
            out.push_str(&format!("{i:>4}  {cmd}\n"));
        }
        out
    }

    fn program(&self, program: ProgramId) -> Option<&ShaderInterface> {
        self.programs.get(program.0 as usize)
    }
}

impl GraphicsContext for RecordingContext {
    fn drawing_buffer_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn create_program(
        &mut self,
        vertex_source: &str,
        _fragment_source: &str,
    ) -> Result<ProgramId, ContextError> {
        let iface = ShaderInterface::reflect(vertex_source)?;
        let program = ProgramId(self.programs.len() as u32);
        self.programs.push(iface);
        self.commands.push(Command::CreateProgram { program });
        Ok(program)
    }

    fn attrib_location(&self, program: ProgramId, name: &str) -> i32 {
        if self.hidden_attributes.contains(name) {
            return -1;
        }
        self.program(program)
            .map_or(-1, |iface| iface.attrib_location(name))
    }

    fn enable_vertex_attrib_array(&mut self, location: AttribLocation) {
        self.commands.push(Command::EnableVertexAttribArray {
            location: location.0,
        });
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let slot = self.program(program)?.uniform_slot(name)?;
        Some(UniformLocation { program, slot })
    }

    fn uniform_matrix4(&mut self, location: UniformLocation, matrix: &Mat4) {
        let name = self
            .program(location.program)
            .and_then(|iface| iface.uniform_name(location.slot))
            .map_or_else(|| format!("slot{}", location.slot), str::to_string);
        self.commands.push(Command::UniformMatrix4 {
            name,
            matrix: matrix.to_cols_array(),
        });
    }

    fn create_array_buffer(&mut self, data: &[f32]) -> BufferId {
        let buffer = BufferId(self.next_buffer);
        self.next_buffer += 1;
        self.commands.push(Command::CreateArrayBuffer {
            buffer,
            floats: data.len(),
        });
        buffer
    }

    fn create_element_buffer(&mut self, indices: &[u8]) -> BufferId {
        let buffer = BufferId(self.next_buffer);
        self.next_buffer += 1;
        self.commands.push(Command::CreateElementBuffer {
            buffer,
            indices: indices.to_vec(),
        });
        buffer
    }

    fn bind_array_buffer(&mut self, buffer: BufferId) {
        self.commands.push(Command::BindArrayBuffer { buffer });
    }

    fn vertex_attrib_pointer(&mut self, location: AttribLocation, components: u8) {
        self.commands.push(Command::VertexAttribPointer {
            location: location.0,
            components,
        });
    }

    fn bind_element_buffer(&mut self, buffer: BufferId) {
        self.commands.push(Command::BindElementBuffer { buffer });
    }

    fn enable_depth_test(&mut self) {
        self.commands.push(Command::EnableDepthTest);
    }

    fn clear_color(&mut self, rgba: [f32; 4]) {
        self.commands.push(Command::ClearColor { rgba });
    }

    fn clear(&mut self, mask: ClearMask) {
        self.commands.push(Command::Clear {
            color: mask.color,
            depth: mask.depth,
        });
    }

    fn draw_elements(&mut self, count: u32, width: IndexWidth) {
        self.commands.push(Command::DrawElements { count, width });
    }

    fn present(&mut self) -> Result<(), ContextError> {
        self.commands.push(Command::Present);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaders::{FRAGMENT_SHADER, VERTEX_SHADER};

    #[test]
    fn lookups_follow_reflected_program() {
        let mut ctx = RecordingContext::new(4, 3);
        let program = ctx.create_program(VERTEX_SHADER, FRAGMENT_SHADER).unwrap();
        assert_eq!(ctx.attrib_location(program, "a_color"), 1);
        assert_eq!(ctx.attrib_location(program, "missing"), -1);
        assert_eq!(ctx.attrib_location(ProgramId(9), "a_color"), -1);
        assert_eq!(
            ctx.uniform_location(program, "u_view"),
            Some(UniformLocation { program, slot: 1 })
        );
        assert_eq!(ctx.uniform_location(program, "u_tint"), None);
        assert_eq!(ctx.drawing_buffer_size(), (4, 3));
    }

    #[test]
    fn hidden_attribute_reports_negative_location() {
        let mut ctx = RecordingContext::new(1, 1).without_attribute("a_position");
        let program = ctx.create_program(VERTEX_SHADER, FRAGMENT_SHADER).unwrap();
        assert_eq!(ctx.attrib_location(program, "a_position"), -1);
        assert_eq!(ctx.attrib_location(program, "a_color"), 1);
    }

    #[test]
    fn uniform_upload_records_name_and_columns() {
        let mut ctx = RecordingContext::new(1, 1);
        let program = ctx.create_program(VERTEX_SHADER, FRAGMENT_SHADER).unwrap();
        let loc = ctx.uniform_location(program, "u_model").unwrap();
        ctx.uniform_matrix4(loc, &Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0)));
        match ctx.commands().last() {
            Some(Command::UniformMatrix4 { name, matrix }) => {
                assert_eq!(name, "u_model");
                assert_eq!(&matrix[12..15], &[1.0, 2.0, 3.0]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn buffers_get_sequential_handles() {
        let mut ctx = RecordingContext::new(1, 1);
        let a = ctx.create_array_buffer(&[0.0; 3]);
        let b = ctx.create_element_buffer(&[0, 1, 2]);
        assert_eq!(a, BufferId(0));
        assert_eq!(b, BufferId(1));
    }

    #[test]
    fn transcript_lists_commands() {
        let mut ctx = RecordingContext::new(800, 600);
        ctx.enable_depth_test();
        ctx.clear(ClearMask::COLOR_AND_DEPTH);
        ctx.draw_elements(36, IndexWidth::U8);
        let text = ctx.transcript();
        assert!(text.contains("3 commands (800x600)"));
        assert!(text.contains("enable(depth_test)"));
        assert!(text.contains("draw_elements(triangles, 36, U8)"));
    }

    #[test]
    fn take_commands_drains() {
        let mut ctx = RecordingContext::new(1, 1);
        ctx.present().unwrap();
        assert_eq!(ctx.take_commands(), vec![Command::Present]);
        assert!(ctx.commands().is_empty());
    }
}
