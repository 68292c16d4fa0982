//! Ordered shape storage for a room.

use crate::geometry::{self, contained_by};
use crate::shapes::{Shape, ShapeId};
use kurbo::{Point, Rect};
use std::collections::HashSet;
use thiserror::Error;

/// Errors raised by store mutations.
#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("Duplicate shape id: {0}")]
    DuplicateId(ShapeId),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Shapes in z-order: insertion order, later entries drawn on top.
#[derive(Debug, Clone, Default)]
pub struct ShapeStore {
    shapes: Vec<Shape>,
    ids: HashSet<ShapeId>,
}

impl ShapeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a shape on top of the stack.
    pub fn append(&mut self, shape: Shape) -> StoreResult<()> {
        if self.ids.contains(shape.id()) {
            return Err(StoreError::DuplicateId(shape.id().clone()));
        }
        self.ids.insert(shape.id().clone());
        self.shapes.push(shape);
        Ok(())
    }

    /// Remove the shape with exactly this id. Unknown ids are a no-op.
    pub fn remove_by_id(&mut self, id: &ShapeId) -> Option<Shape> {
        let index = self.shapes.iter().position(|s| s.id() == id)?;
        self.ids.remove(id);
        Some(self.shapes.remove(index))
    }

    /// Map an id to the local id of the shape that answers to it.
    ///
    /// Local ids win over origin aliases.
    pub fn resolve(&self, id: &ShapeId) -> Option<ShapeId> {
        if self.ids.contains(id) {
            return Some(id.clone());
        }
        self.shapes
            .iter()
            .find(|s| s.answers_to(id))
            .map(|s| s.id().clone())
    }

    /// Apply `f` to the most recently appended shape.
    pub fn mutate_last<R>(&mut self, f: impl FnOnce(&mut Shape) -> R) -> Option<R> {
        self.shapes.last_mut().map(f)
    }

    /// Apply `f` to the shape with this id.
    pub fn mutate_by_id<R>(&mut self, id: &ShapeId, f: impl FnOnce(&mut Shape) -> R) -> Option<R> {
        self.shapes.iter_mut().find(|s| s.id() == id).map(f)
    }

    pub fn find_by_id(&self, id: &ShapeId) -> Option<&Shape> {
        if !self.ids.contains(id) {
            return None;
        }
        self.shapes.iter().find(|s| s.id() == id)
    }

    pub fn contains(&self, id: &ShapeId) -> bool {
        self.ids.contains(id)
    }

    /// Topmost shape under `point`, searching from the top of the stack.
    pub fn topmost_at(&self, point: Point) -> Option<&Shape> {
        self.shapes
            .iter()
            .rev()
            .find(|s| geometry::hit_test(point, s))
    }

    /// Ids of every shape whose bounds lie inside `region`, in z-order.
    pub fn ids_within(&self, region: Rect) -> Vec<ShapeId> {
        self.shapes
            .iter()
            .filter(|s| contained_by(s.bounds(), region))
            .map(|s| s.id().clone())
            .collect()
    }

    /// All shapes, bottom to top.
    pub fn all(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn last(&self) -> Option<&Shape> {
        self.shapes.last()
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Union of all shape bounds, `None` for an empty store.
    pub fn bounds(&self) -> Option<Rect> {
        geometry::union_bounds(&self.shapes)
    }
}
