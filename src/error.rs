use crate::backdrop::Lifecycle;

/// Errors surfaced by the backdrop and its hosts
#[derive(thiserror::Error, Debug)]
pub enum BackdropError {
    /// No GPU adapter can drive the host surface
    #[error("Failed to find appropriate adapter: {0}")]
    Adapter(String),

    /// Adapter found but device creation failed
    #[error("Failed to create device: {0}")]
    Device(String),

    /// Window could not produce a render surface
    #[error("Failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    /// Frame acquisition failed for a reason other than a stale surface
    #[error("Surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    /// Config file could not be read
    #[error("Config IO error: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// Config file is not valid JSON for `BackdropConfig`
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Config parsed but holds a value the scene cannot be built from
    #[error("Invalid config field `{field}`: {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },

    /// Operation not allowed in the current lifecycle state
    #[error("Cannot {operation} a backdrop that is {state:?}")]
    InvalidTransition {
        operation: &'static str,
        state: Lifecycle,
    },
}

pub type Result<T> = std::result::Result<T, BackdropError>;
