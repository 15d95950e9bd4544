use crate::pipeline::{self, PipelineKey, PipelineTargets};
use glam::Mat4;
use spincube_render::reflect::MATRIX_BYTES;
use spincube_render::{
    AttribLocation, BufferId, ClearMask, ContextError, GraphicsContext, IndexWidth, ProgramId,
    ShaderInterface, UniformLocation,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use wgpu::util::DeviceExt;

struct Program {
    interface: ShaderInterface,
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    layout: wgpu::PipelineLayout,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BufferKind {
    Array,
    Element,
}

struct GpuBuffer {
    buffer: wgpu::Buffer,
    kind: BufferKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AttribPointer {
    buffer: BufferId,
    size: u8,
}

struct DrawCall {
    program: ProgramId,
    key: PipelineKey,
    vertex_buffers: Vec<BufferId>,
    element_buffer: BufferId,
    count: u32,
}

/// What to do with a frame whose surface texture could not be acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SurfaceAction {
    Reconfigure,
    Skip,
    Fatal,
}

pub(crate) fn surface_action(err: &wgpu::SurfaceError) -> SurfaceAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => SurfaceAction::Reconfigure,
        wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => SurfaceAction::Skip,
        wgpu::SurfaceError::OutOfMemory => SurfaceAction::Fatal,
    }
}

#[derive(Default)]
struct PendingFrame {
    clear: ClearMask,
    draws: Vec<DrawCall>,
}

/// Graphics context backed by a wgpu surface.
///
/// The surface is configured once at creation; there is no resize path.
pub struct WgpuContext {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    programs: Vec<Program>,
    current_program: Option<ProgramId>,
    buffers: Vec<GpuBuffer>,
    bound_array: Option<BufferId>,
    bound_element: Option<BufferId>,
    enabled_attributes: BTreeSet<u32>,
    pointers: BTreeMap<u32, AttribPointer>,
    depth_test: bool,
    clear_color: wgpu::Color,
    pending: PendingFrame,
}

impl WgpuContext {
    /// Acquire an adapter and device for `target` and configure its surface.
    ///
    /// Any failure here is a context-creation failure; the caller should
    /// report it and abort startup.
    pub async fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<Self, ContextError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(target)
            .map_err(|e| ContextError::Surface(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(ContextError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("spincube_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| ContextError::Device(e.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| ContextError::Surface("no surface formats".into()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_view = pipeline::create_depth_texture(&device, config.width, config.height);

        tracing::info!(
            "GPU initialized with {} backend ({}x{}, {:?})",
            adapter.get_info().backend.to_str(),
            config.width,
            config.height,
            format
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_view,
            programs: Vec::new(),
            current_program: None,
            buffers: Vec::new(),
            bound_array: None,
            bound_element: None,
            enabled_attributes: BTreeSet::new(),
            pointers: BTreeMap::new(),
            depth_test: false,
            clear_color: wgpu::Color::BLACK,
            pending: PendingFrame::default(),
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    fn push_buffer(&mut self, buffer: wgpu::Buffer, kind: BufferKind) -> BufferId {
        let id = BufferId(self.buffers.len() as u32);
        self.buffers.push(GpuBuffer { buffer, kind });
        id
    }

    fn buffer_of_kind(&self, id: BufferId, kind: BufferKind) -> Option<&wgpu::Buffer> {
        self.buffers
            .get(id.0 as usize)
            .filter(|b| b.kind == kind)
            .map(|b| &b.buffer)
    }

    fn array_buffer(&self, id: BufferId) -> Option<&wgpu::Buffer> {
        self.buffer_of_kind(id, BufferKind::Array)
    }

    fn element_buffer(&self, id: BufferId) -> Option<&wgpu::Buffer> {
        self.buffer_of_kind(id, BufferKind::Element)
    }

    fn ensure_pipeline(&mut self, id: ProgramId, key: &PipelineKey) -> Result<(), ContextError> {
        let color_format = self.config.format;
        let program = self
            .programs
            .get_mut(id.0 as usize)
            .ok_or_else(|| ContextError::Shader(format!("no program #{}", id.0)))?;
        if program.pipelines.contains_key(key) {
            return Ok(());
        }

        let targets = PipelineTargets {
            layout: &program.layout,
            vertex: &program.vertex,
            fragment: &program.fragment,
            color_format,
        };
        let Some(built) = pipeline::build_pipeline(&self.device, &targets, key) else {
            let reason = format!("unsupported vertex layout {:?}", key.attributes);
            return Err(ContextError::Shader(reason));
        };
        tracing::debug!(
            attributes = ?key.attributes,
            depth_test = key.depth_test,
            "pipeline built"
        );
        program.pipelines.insert(key.clone(), built);
        Ok(())
    }
}

impl GraphicsContext for WgpuContext {
    fn drawing_buffer_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn create_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ProgramId, ContextError> {
        let interface = ShaderInterface::reflect(vertex_source)?;

        let vertex = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("vertex_shader"),
                source: wgpu::ShaderSource::Wgsl(vertex_source.into()),
            });
        let fragment = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("fragment_shader"),
                source: wgpu::ShaderSource::Wgsl(fragment_source.into()),
            });

        let uniform_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniform_buffer"),
            size: interface.uniform_block_size().max(MATRIX_BYTES),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("uniform_bind_group_layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("pipeline_layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let id = ProgramId(self.programs.len() as u32);
        tracing::debug!(
            program = id.0,
            attributes = ?interface.attributes(),
            uniforms = ?interface.uniforms(),
            "program created"
        );
        self.programs.push(Program {
            interface,
            vertex,
            fragment,
            layout,
            uniform_buffer,
            uniform_bind_group,
            pipelines: HashMap::new(),
        });
        self.current_program = Some(id);
        Ok(id)
    }

    fn attrib_location(&self, program: ProgramId, name: &str) -> i32 {
        self.programs
            .get(program.0 as usize)
            .map_or(-1, |p| p.interface.attrib_location(name))
    }

    fn enable_vertex_attrib_array(&mut self, location: AttribLocation) {
        self.enabled_attributes.insert(location.0);
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let slot = self
            .programs
            .get(program.0 as usize)?
            .interface
            .uniform_slot(name)?;
        Some(UniformLocation { program, slot })
    }

    fn uniform_matrix4(&mut self, location: UniformLocation, matrix: &Mat4) {
        let Some(program) = self.programs.get(location.program.0 as usize) else {
            tracing::warn!(
                program = location.program.0,
                "uniform upload to unknown program"
            );
            return;
        };
        let cols = matrix.to_cols_array();
        self.queue.write_buffer(
            &program.uniform_buffer,
            ShaderInterface::uniform_offset(location.slot),
            bytemuck::cast_slice(&cols),
        );
    }

    fn create_array_buffer(&mut self, data: &[f32]) -> BufferId {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("array_buffer"),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let id = self.push_buffer(buffer, BufferKind::Array);
        self.bound_array = Some(id);
        id
    }

    fn create_element_buffer(&mut self, indices: &[u8]) -> BufferId {
        let wide = pipeline::widen_indices(indices);
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("element_buffer"),
                contents: bytemuck::cast_slice(&wide),
                usage: wgpu::BufferUsages::INDEX,
            });
        let id = self.push_buffer(buffer, BufferKind::Element);
        self.bound_element = Some(id);
        id
    }

    fn bind_array_buffer(&mut self, buffer: BufferId) {
        self.bound_array = Some(buffer);
    }

    fn vertex_attrib_pointer(&mut self, location: AttribLocation, components: u8) {
        let Some(buffer) = self.bound_array else {
            tracing::warn!(
                location = location.0,
                "attribute pointer set with no array buffer bound"
            );
            return;
        };
        if pipeline::float_format(components).is_none() {
            tracing::warn!(
                location = location.0,
                components,
                "unsupported attribute size"
            );
            return;
        }
        let pointer = AttribPointer {
            buffer,
            size: components,
        };
        self.pointers.insert(location.0, pointer);
    }

    fn bind_element_buffer(&mut self, buffer: BufferId) {
        self.bound_element = Some(buffer);
    }

    fn enable_depth_test(&mut self) {
        self.depth_test = true;
    }

    fn clear_color(&mut self, rgba: [f32; 4]) {
        self.clear_color = wgpu::Color {
            r: f64::from(rgba[0]),
            g: f64::from(rgba[1]),
            b: f64::from(rgba[2]),
            a: f64::from(rgba[3]),
        };
    }

    fn clear(&mut self, mask: ClearMask) {
        self.pending.clear.color |= mask.color;
        self.pending.clear.depth |= mask.depth;
    }

    fn draw_elements(&mut self, count: u32, width: IndexWidth) {
        let (Some(program), Some(element_buffer)) = (self.current_program, self.bound_element)
        else {
            tracing::warn!("draw skipped: no program or element buffer bound");
            return;
        };
        if self.element_buffer(element_buffer).is_none() {
            tracing::warn!(
                buffer = element_buffer.0,
                "draw skipped: bad element buffer"
            );
            return;
        }

        let mut attributes = Vec::new();
        let mut vertex_buffers = Vec::new();
        for location in &self.enabled_attributes {
            let Some(pointer) = self.pointers.get(location) else {
                tracing::warn!(location, "draw skipped: enabled attribute has no pointer");
                return;
            };
            if self.array_buffer(pointer.buffer).is_none() {
                tracing::warn!(buffer = pointer.buffer.0, "draw skipped: bad array buffer");
                return;
            }
            attributes.push((*location, pointer.size));
            vertex_buffers.push(pointer.buffer);
        }

        tracing::trace!(count, ?width, "draw recorded");
        self.pending.draws.push(DrawCall {
            program,
            key: PipelineKey {
                attributes,
                depth_test: self.depth_test,
            },
            vertex_buffers,
            element_buffer,
            count,
        });
    }

    fn present(&mut self) -> Result<(), ContextError> {
        let frame = std::mem::take(&mut self.pending);
        for draw in &frame.draws {
            self.ensure_pipeline(draw.program, &draw.key)?;
        }

        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(e) => match surface_action(&e) {
                SurfaceAction::Reconfigure => {
                    self.surface.configure(&self.device, &self.config);
                    tracing::debug!("surface reconfigured; frame skipped");
                    return Ok(());
                }
                SurfaceAction::Skip => {
                    tracing::warn!("surface unavailable ({e}); frame skipped");
                    return Ok(());
                }
                SurfaceAction::Fatal => return Err(ContextError::Present(e.to_string())),
            },
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        {
            let color_load = if frame.clear.color {
                wgpu::LoadOp::Clear(self.clear_color)
            } else {
                wgpu::LoadOp::Load
            };
            let depth_load = if frame.clear.depth {
                wgpu::LoadOp::Clear(1.0)
            } else {
                wgpu::LoadOp::Load
            };

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("cube_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            for draw in &frame.draws {
                let Some(program) = self.programs.get(draw.program.0 as usize) else {
                    continue;
                };
                let Some(pipeline) = program.pipelines.get(&draw.key) else {
                    continue;
                };
                let Some(index_buffer) = self.element_buffer(draw.element_buffer) else {
                    continue;
                };

                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &program.uniform_bind_group, &[]);
                for (slot, id) in draw.vertex_buffers.iter().enumerate() {
                    if let Some(buffer) = self.array_buffer(*id) {
                        pass.set_vertex_buffer(slot as u32, buffer.slice(..));
                    }
                }
                pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(0..draw.count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lost_and_outdated_surfaces_are_reconfigured() {
        for err in [wgpu::SurfaceError::Lost, wgpu::SurfaceError::Outdated] {
            assert_eq!(surface_action(&err), SurfaceAction::Reconfigure);
        }
    }

    #[test]
    fn timeout_and_other_skip_the_frame() {
        for err in [wgpu::SurfaceError::Timeout, wgpu::SurfaceError::Other] {
            assert_eq!(surface_action(&err), SurfaceAction::Skip);
        }
    }

    #[test]
    fn only_out_of_memory_is_fatal() {
        assert_eq!(
            surface_action(&wgpu::SurfaceError::OutOfMemory),
            SurfaceAction::Fatal
        );
    }
}
