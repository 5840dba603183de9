use orrery_common::BodyId;
use orrery_kernel::SceneError;
use orrery_render::RenderError;

/// Errors from loading or building a scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneBuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid scene: {0}")]
    Kernel(#[from] SceneError),
    #[error("render error: {0}")]
    Render(#[from] RenderError),
    #[error("{id}: {field} sets both a period and a velocity")]
    ConflictingRate { id: BodyId, field: &'static str },
    #[error("unknown preset {0:?}")]
    UnknownPreset(String),
}
