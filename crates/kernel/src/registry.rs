use std::collections::HashMap;

use orrery_common::{BodyId, RenderHandle};

use crate::body::{Attachment, Body};
use crate::error::SceneError;

/// Insertion-ordered store of bodies and attachments.
///
/// Registration validates each entry in isolation (finite parameters, unique
/// ids, a single root). Cross references (parents, leaders) are resolved when
/// the registry is turned into an [`OrbitalSystem`](crate::OrbitalSystem).
#[derive(Debug, Clone, Default)]
pub struct BodyRegistry {
    bodies: Vec<Body>,
    attachments: Vec<Attachment>,
    index: HashMap<BodyId, Slot>,
    root: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Body(usize),
    Attachment(usize),
}

impl BodyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a body. Exactly one body may omit its parent.
    pub fn register(&mut self, body: Body) -> Result<(), SceneError> {
        body.validate()?;
        if self.index.contains_key(&body.id) {
            return Err(SceneError::DuplicateId(body.id));
        }
        if body.is_root() {
            if let Some(existing) = self.root {
                return Err(SceneError::MultipleRoots {
                    existing: self.bodies[existing].id.clone(),
                    rejected: body.id,
                });
            }
            self.root = Some(self.bodies.len());
        }
        tracing::debug!(id = %body.id, parent = ?body.parent, "registered body");
        self.index
            .insert(body.id.clone(), Slot::Body(self.bodies.len()));
        self.bodies.push(body);
        Ok(())
    }

    /// Add an attachment that mirrors a body's position.
    pub fn attach(&mut self, attachment: Attachment) -> Result<(), SceneError> {
        attachment.validate()?;
        if self.index.contains_key(&attachment.id) {
            return Err(SceneError::DuplicateId(attachment.id));
        }
        tracing::debug!(id = %attachment.id, leader = %attachment.leader, "registered attachment");
        self.index.insert(
            attachment.id.clone(),
            Slot::Attachment(self.attachments.len()),
        );
        self.attachments.push(attachment);
        Ok(())
    }

    pub fn get(&self, id: &BodyId) -> Result<&Body, SceneError> {
        match self.index.get(id) {
            Some(Slot::Body(i)) => Ok(&self.bodies[*i]),
            _ => Err(SceneError::NotFound(id.clone())),
        }
    }

    pub fn get_attachment(&self, id: &BodyId) -> Result<&Attachment, SceneError> {
        match self.index.get(id) {
            Some(Slot::Attachment(i)) => Ok(&self.attachments[*i]),
            _ => Err(SceneError::NotFound(id.clone())),
        }
    }

    /// Bodies whose parent is `id`, in insertion order.
    pub fn children(&self, id: &BodyId) -> Result<Vec<&Body>, SceneError> {
        self.get(id)?;
        Ok(self
            .bodies
            .iter()
            .filter(|b| b.parent.as_ref() == Some(id))
            .collect())
    }

    /// Attachments led by `id`, in insertion order.
    pub fn attachments_of(&self, id: &BodyId) -> Vec<&Attachment> {
        self.attachments
            .iter()
            .filter(|a| &a.leader == id)
            .collect()
    }

    /// Bind a render object to an already registered body or attachment.
    pub fn set_render_handle(
        &mut self,
        id: &BodyId,
        handle: RenderHandle,
    ) -> Result<(), SceneError> {
        match self.index.get(id) {
            Some(Slot::Body(i)) => self.bodies[*i].render_handle = Some(handle),
            Some(Slot::Attachment(i)) => self.attachments[*i].render_handle = Some(handle),
            None => return Err(SceneError::NotFound(id.clone())),
        }
        Ok(())
    }

    pub fn root(&self) -> Option<&Body> {
        self.root.map(|i| &self.bodies[i])
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Number of bodies (attachments excluded).
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub(crate) fn slot(&self, id: &BodyId) -> Option<Slot> {
        self.index.get(id).copied()
    }

    pub(crate) fn root_index(&self) -> Option<usize> {
        self.root
    }

    pub(crate) fn bodies_mut(&mut self) -> &mut [Body] {
        &mut self.bodies
    }

    /// Read bodies while writing attachments.
    pub(crate) fn split_mut(&mut self) -> (&[Body], &mut [Attachment]) {
        (&self.bodies, &mut self.attachments)
    }
}
