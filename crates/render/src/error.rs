/// Failures raised by a graphics context.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("failed to create rendering surface: {0}")]
    Surface(String),
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("failed to create GPU device: {0}")]
    Device(String),
    #[error("shader interface error: {0}")]
    Shader(String),
    #[error("failed to present frame: {0}")]
    Present(String),
}

/// Failures that abort cube setup before the frame loop starts.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("failed to get storage location of attribute `{0}`")]
    AttributeNotFound(String),
    #[error(transparent)]
    Context(#[from] ContextError),
}
