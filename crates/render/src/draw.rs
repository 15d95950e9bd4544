use crate::context::{AttribLocation, BufferId, GraphicsContext, IndexWidth};
use spincube_scene::{COMPONENTS_PER_VERTEX, CubeMesh};

/// The cube's uploaded buffers plus the attribute slots they feed.
///
/// Created once by [`CubeDraw::upload`]; [`CubeDraw::draw`] rebinds all three
/// buffers and issues one indexed draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubeDraw {
    position_buffer: BufferId,
    color_buffer: BufferId,
    index_buffer: BufferId,
    position: AttribLocation,
    color: AttribLocation,
    index_count: u32,
}

impl CubeDraw {
    /// Upload positions, colors and indices to three separate buffers.
    pub fn upload<C: GraphicsContext>(
        ctx: &mut C,
        mesh: &CubeMesh,
        position: AttribLocation,
        color: AttribLocation,
    ) -> Self {
        let position_buffer = ctx.create_array_buffer(&mesh.positions);
        let color_buffer = ctx.create_array_buffer(&mesh.colors);
        let index_buffer = ctx.create_element_buffer(&mesh.indices);
        tracing::debug!(
            vertices = mesh.vertex_count(),
            indices = mesh.index_count(),
            "cube buffers uploaded"
        );

        Self {
            position_buffer,
            color_buffer,
            index_buffer,
            position,
            color,
            index_count: mesh.index_count() as u32,
        }
    }

    pub fn draw<C: GraphicsContext>(&self, ctx: &mut C) {
        let components = COMPONENTS_PER_VERTEX as u8;

        ctx.bind_array_buffer(self.position_buffer);
        ctx.vertex_attrib_pointer(self.position, components);

        ctx.bind_array_buffer(self.color_buffer);
        ctx.vertex_attrib_pointer(self.color, components);

        ctx.bind_element_buffer(self.index_buffer);
        ctx.draw_elements(self.index_count, IndexWidth::U8);
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn buffers(&self) -> [BufferId; 3] {
        [self.position_buffer, self.color_buffer, self.index_buffer]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{Command, RecordingContext};

    fn uploaded() -> (RecordingContext, CubeDraw) {
        let mut ctx = RecordingContext::new(640, 480);
        let draw = CubeDraw::upload(
            &mut ctx,
            &CubeMesh::new(),
            AttribLocation(0),
            AttribLocation(1),
        );
        (ctx, draw)
    }

    #[test]
    fn upload_creates_three_distinct_buffers() {
        let (ctx, draw) = uploaded();
        let [p, c, i] = draw.buffers();
        assert!(p != c && c != i && p != i);
        assert_eq!(draw.index_count(), 36);
        assert_eq!(
            ctx.commands(),
            &[
                Command::CreateArrayBuffer {
                    buffer: p,
                    floats: 24,
                },
                Command::CreateArrayBuffer {
                    buffer: c,
                    floats: 24,
                },
                Command::CreateElementBuffer {
                    buffer: i,
                    indices: CubeMesh::new().indices.to_vec(),
                },
            ]
        );
    }

    #[test]
    fn draw_rebinds_each_buffer_then_draws_36_u8_indices() {
        let (mut ctx, draw) = uploaded();
        ctx.clear_commands();
        draw.draw(&mut ctx);

        let [p, c, i] = draw.buffers();
        assert_eq!(
            ctx.commands(),
            &[
                Command::BindArrayBuffer { buffer: p },
                Command::VertexAttribPointer {
                    location: 0,
                    components: 3,
                },
                Command::BindArrayBuffer { buffer: c },
                Command::VertexAttribPointer {
                    location: 1,
                    components: 3,
                },
                Command::BindElementBuffer { buffer: i },
                Command::DrawElements {
                    count: 36,
                    width: IndexWidth::U8,
                },
            ]
        );
    }

    #[test]
    fn drawn_indices_stay_in_vertex_range() {
        let (ctx, _) = uploaded();
        let indices = ctx
            .commands()
            .iter()
            .find_map(|c| match c {
                Command::CreateElementBuffer { indices, .. } => Some(indices.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(indices.len() / 3, 12);
        assert!(indices.iter().all(|&i| i <= 7));
    }
}
