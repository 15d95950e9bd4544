use crate::context::{AttribLocation, ClearMask, GraphicsContext, ProgramId, UniformLocation};
use crate::draw::CubeDraw;
use crate::error::{ContextError, SetupError};
use crate::shaders::{
    COLOR_ATTRIBUTE, FRAGMENT_SHADER, MODEL_UNIFORM, POSITION_ATTRIBUTE, PROJECTION_UNIFORM,
    VERTEX_SHADER, VIEW_UNIFORM,
};
use glam::Mat4;
use serde::{Deserialize, Serialize};
use spincube_scene::{CubeMesh, LookAtCamera, SpinConfig, SpinState};

/// Everything setup needs besides the context.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    pub camera: LookAtCamera,
    pub spin: SpinConfig,
    pub clear_color: [f32; 4],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            camera: LookAtCamera::default(),
            spin: SpinConfig::default(),
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// Resolved locations of the cube program's interface.
///
/// Uniform locations are `None` when the program does not declare them;
/// uploads to a missing uniform are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramBindings {
    pub program: ProgramId,
    pub position: AttribLocation,
    pub color: AttribLocation,
    pub model: Option<UniformLocation>,
    pub view: Option<UniformLocation>,
    pub projection: Option<UniformLocation>,
}

/// Compile the program, upload the camera and the cube, and return the
/// renderer that drives each frame.
///
/// Fails with [`SetupError::AttributeNotFound`] if either vertex attribute
/// cannot be located; nothing is drawn in that case.
pub fn setup<C: GraphicsContext>(
    ctx: &mut C,
    config: &RenderConfig,
) -> Result<CubeRenderer, SetupError> {
    let _span = tracing::info_span!("cube_setup").entered();

    let program = ctx.create_program(VERTEX_SHADER, FRAGMENT_SHADER)?;

    let position = resolve_attribute(ctx, program, POSITION_ATTRIBUTE)?;
    ctx.enable_vertex_attrib_array(position);
    let color = resolve_attribute(ctx, program, COLOR_ATTRIBUTE)?;
    ctx.enable_vertex_attrib_array(color);

    let bindings = ProgramBindings {
        program,
        position,
        color,
        model: lookup_uniform(ctx, program, MODEL_UNIFORM),
        view: lookup_uniform(ctx, program, VIEW_UNIFORM),
        projection: lookup_uniform(ctx, program, PROJECTION_UNIFORM),
    };

    let (width, height) = ctx.drawing_buffer_size();
    let aspect = width as f32 / height.max(1) as f32;

    let view = config.camera.view_matrix();
    upload_matrix(ctx, bindings.view, &view);
    let projection = config.camera.projection_matrix(aspect);
    upload_matrix(ctx, bindings.projection, &projection);

    let draw = CubeDraw::upload(ctx, &CubeMesh::new(), position, color);

    ctx.enable_depth_test();
    ctx.clear_color(config.clear_color);

    tracing::info!(
        width,
        height,
        aspect,
        position = position.0,
        color = color.0,
        "cube setup complete"
    );

    Ok(CubeRenderer {
        bindings,
        draw,
        spin: SpinState::new(config.spin),
        view,
        projection,
        frames: 0,
    })
}

fn resolve_attribute<C: GraphicsContext>(
    ctx: &C,
    program: ProgramId,
    name: &str,
) -> Result<AttribLocation, SetupError> {
    let raw = ctx.attrib_location(program, name);
    AttribLocation::from_raw(raw).ok_or_else(|| {
        tracing::error!(attribute = name, raw, "failed to get storage location");
        SetupError::AttributeNotFound(name.to_string())
    })
}

fn lookup_uniform<C: GraphicsContext>(
    ctx: &C,
    program: ProgramId,
    name: &str,
) -> Option<UniformLocation> {
    let location = ctx.uniform_location(program, name);
    if location.is_none() {
        tracing::warn!(uniform = name, "uniform not found; uploads will be skipped");
    }
    location
}

fn upload_matrix<C: GraphicsContext>(ctx: &mut C, location: Option<UniformLocation>, m: &Mat4) {
    if let Some(location) = location {
        ctx.uniform_matrix4(location, m);
    }
}

/// Owns the per-frame state: the spin, the draw object and the bindings.
#[derive(Debug, Clone)]
pub struct CubeRenderer {
    bindings: ProgramBindings,
    draw: CubeDraw,
    spin: SpinState,
    view: Mat4,
    projection: Mat4,
    frames: u64,
}

impl CubeRenderer {
    /// Run one frame callback and return the angle that was drawn.
    ///
    /// `now` is the scheduler timestamp in milliseconds, `None` for a direct
    /// call. Advances the spin, uploads the model matrix, clears color and
    /// depth, draws the cube and presents.
    pub fn frame<C: GraphicsContext>(
        &mut self,
        ctx: &mut C,
        now: Option<f64>,
    ) -> Result<f64, ContextError> {
        let angle = self.spin.advance(now);
        upload_matrix(ctx, self.bindings.model, &self.spin.model_matrix());

        ctx.clear(ClearMask::COLOR_AND_DEPTH);
        self.draw.draw(ctx);
        ctx.present()?;

        self.frames += 1;
        tracing::trace!(frame = self.frames, angle, "frame drawn");
        Ok(angle)
    }

    pub fn bindings(&self) -> &ProgramBindings {
        &self.bindings
    }

    pub fn draw(&self) -> &CubeDraw {
        &self.draw
    }

    pub fn spin(&self) -> &SpinState {
        &self.spin
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    /// Frames drawn so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}
