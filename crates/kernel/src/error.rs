use orrery_common::BodyId;

/// Scene-construction failures. The per-tick path never fails once an
/// [`OrbitalSystem`](crate::OrbitalSystem) has been built.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("body {0} not found")]
    NotFound(BodyId),
    #[error("body {0} is part of a parent cycle")]
    CyclicParent(BodyId),
    #[error("body {id} has a non-finite {field}")]
    InvalidVelocity { id: BodyId, field: &'static str },
    #[error("body {id} has an invalid {field}")]
    InvalidParameter { id: BodyId, field: &'static str },
    #[error("body {rejected} has no parent but {existing} is already the root")]
    MultipleRoots { existing: BodyId, rejected: BodyId },
    #[error("scene has no root body")]
    MissingRoot,
    #[error("id {0} is already registered")]
    DuplicateId(BodyId),
}
