use spincube_render::shaders::{FRAGMENT_ENTRY, VERTEX_ENTRY};

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Vertex layout and depth state a pipeline was built for.
///
/// `attributes` holds `(shader_location, components)` pairs in buffer-slot
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct PipelineKey {
    pub attributes: Vec<(u32, u8)>,
    pub depth_test: bool,
}

/// Float vertex format for a tightly packed attribute of `components` floats.
pub(crate) fn float_format(components: u8) -> Option<wgpu::VertexFormat> {
    match components {
        1 => Some(wgpu::VertexFormat::Float32),
        2 => Some(wgpu::VertexFormat::Float32x2),
        3 => Some(wgpu::VertexFormat::Float32x3),
        4 => Some(wgpu::VertexFormat::Float32x4),
        _ => None,
    }
}

pub(crate) fn widen_indices(indices: &[u8]) -> Vec<u16> {
    indices.iter().map(|&i| u16::from(i)).collect()
}

pub(crate) struct PipelineTargets<'a> {
    pub layout: &'a wgpu::PipelineLayout,
    pub vertex: &'a wgpu::ShaderModule,
    pub fragment: &'a wgpu::ShaderModule,
    pub color_format: wgpu::TextureFormat,
}

/// One vertex buffer per attribute, triangle list, no culling.
pub(crate) fn build_pipeline(
    device: &wgpu::Device,
    targets: &PipelineTargets<'_>,
    key: &PipelineKey,
) -> Option<wgpu::RenderPipeline> {
    let mut attributes = Vec::with_capacity(key.attributes.len());
    for &(location, components) in &key.attributes {
        attributes.push((
            components,
            [wgpu::VertexAttribute {
                format: float_format(components)?,
                offset: 0,
                shader_location: location,
            }],
        ));
    }
    let buffers: Vec<wgpu::VertexBufferLayout<'_>> = attributes
        .iter()
        .map(|(components, attribute)| wgpu::VertexBufferLayout {
            array_stride: u64::from(*components) * std::mem::size_of::<f32>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: attribute,
        })
        .collect();

    let depth_stencil = if key.depth_test {
        wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }
    } else {
        wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::Always,
            stencil: Default::default(),
            bias: Default::default(),
        }
    };

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("cube_pipeline"),
        layout: Some(targets.layout),
        vertex: wgpu::VertexState {
            module: targets.vertex,
            entry_point: Some(VERTEX_ENTRY),
            compilation_options: Default::default(),
            buffers: &buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: targets.fragment,
            entry_point: Some(FRAGMENT_ENTRY),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: targets.color_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            // Face winding is not guaranteed to point outward.
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(depth_stencil),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    });
    Some(pipeline)
}

pub(crate) fn create_depth_texture(
    device: &wgpu::Device,
    width: u32,
    height: u32,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widened_indices_keep_values() {
        let narrow = [0u8, 7, 4, 255];
        assert_eq!(widen_indices(&narrow), vec![0u16, 7, 4, 255]);
    }

    #[test]
    fn float_formats_cover_one_to_four_components() {
        assert_eq!(float_format(1), Some(wgpu::VertexFormat::Float32));
        assert_eq!(float_format(3), Some(wgpu::VertexFormat::Float32x3));
        assert_eq!(float_format(4), Some(wgpu::VertexFormat::Float32x4));
        assert_eq!(float_format(0), None);
        assert_eq!(float_format(5), None);
    }

    #[test]
    fn three_component_stride_is_tightly_packed() {
        let format = float_format(3).unwrap();
        assert_eq!(format.size(), 12);
    }

    #[test]
    fn pipeline_keys_distinguish_depth_state() {
        let a = PipelineKey {
            attributes: vec![(0, 3), (1, 3)],
            depth_test: true,
        };
        let b = PipelineKey {
            depth_test: false,
            ..a.clone()
        };
        assert_ne!(a, b);
    }
}
