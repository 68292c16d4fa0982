//! Selection set and the click/marquee gesture that edits it.

use crate::shapes::ShapeId;
use crate::store::ShapeStore;
use kurbo::{Point, Rect};

/// Ordered set of selected shape ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<ShapeId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[ShapeId] {
        &self.ids
    }

    pub fn contains(&self, id: &ShapeId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Replace the whole selection. Returns whether it changed.
    pub fn replace(&mut self, ids: impl IntoIterator<Item = ShapeId>) -> bool {
        let mut next: Vec<ShapeId> = Vec::new();
        for id in ids {
            if !next.contains(&id) {
                next.push(id);
            }
        }
        if next == self.ids {
            return false;
        }
        self.ids = next;
        true
    }

    /// Add `id` if absent, remove it if present.
    pub fn toggle(&mut self, id: ShapeId) {
        match self.ids.iter().position(|s| *s == id) {
            Some(index) => {
                self.ids.remove(index);
            }
            None => self.ids.push(id),
        }
    }

    /// Drop `id` from the selection. Returns whether it was selected.
    pub fn remove(&mut self, id: &ShapeId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|s| s != id);
        self.ids.len() != before
    }

    /// Returns whether anything was selected.
    pub fn clear(&mut self) -> bool {
        let had = !self.ids.is_empty();
        self.ids.clear();
        had
    }
}

/// Rubber-band rectangle between the press point and the current pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marquee {
    pub anchor: Point,
    pub corner: Point,
}

impl Marquee {
    /// Normalized rectangle covered by the drag.
    pub fn rect(&self) -> Rect {
        Rect::from_points(self.anchor, self.corner)
    }
}

/// Gesture state while the select tool is active.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SelectMode {
    #[default]
    Idle,
    /// Press landed on a shape or extended the selection.
    Click,
    Marquee(Marquee),
}

/// Drives the selection from pointer gestures in model space.
#[derive(Debug, Clone, Default)]
pub struct SelectionManager {
    selection: Selection,
    mode: SelectMode,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn mode(&self) -> SelectMode {
        self.mode
    }

    /// Current marquee rectangle, if a marquee drag is in progress.
    pub fn marquee(&self) -> Option<Rect> {
        match self.mode {
            SelectMode::Marquee(m) => Some(m.rect()),
            _ => None,
        }
    }

    /// Press at `point`. Returns whether the selection changed.
    ///
    /// A hit selects the shape, or toggles it when `additive`. A miss clears the
    /// selection and starts a marquee, unless `additive` is held, in which case
    /// nothing happens.
    pub fn pointer_down(&mut self, point: Point, additive: bool, store: &ShapeStore) -> bool {
        let hit = store.topmost_at(point).map(|s| s.id().clone());
        match (hit, additive) {
            (Some(id), false) => {
                self.mode = SelectMode::Click;
                self.selection.replace([id])
            }
            (Some(id), true) => {
                self.mode = SelectMode::Click;
                self.selection.toggle(id);
                true
            }
            (None, true) => {
                self.mode = SelectMode::Idle;
                false
            }
            (None, false) => {
                self.mode = SelectMode::Marquee(Marquee {
                    anchor: point,
                    corner: point,
                });
                self.selection.clear()
            }
        }
    }

    /// Pointer moved. Returns whether the marquee changed.
    pub fn pointer_move(&mut self, point: Point) -> bool {
        match &mut self.mode {
            SelectMode::Marquee(m) if m.corner != point => {
                m.corner = point;
                true
            }
            _ => false,
        }
    }

    /// Release at `point`. Returns whether the selection changed.
    ///
    /// A marquee selects exactly the shapes fully inside it, edges included.
    pub fn pointer_up(&mut self, point: Point, store: &ShapeStore) -> bool {
        let mode = std::mem::take(&mut self.mode);
        match mode {
            SelectMode::Marquee(mut m) => {
                m.corner = point;
                self.selection.replace(store.ids_within(m.rect()))
            }
            _ => false,
        }
    }

    /// Abandon any gesture in progress.
    pub fn cancel_gesture(&mut self) {
        self.mode = SelectMode::Idle;
    }

    /// Forget a shape that left the store. Returns whether it was selected.
    pub fn prune(&mut self, id: &ShapeId) -> bool {
        self.selection.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Geometry, Rectangle, Shape, ShapeStyle, UserId};

    fn store_with(rects: &[(&str, f64, f64, f64)]) -> ShapeStore {
        let mut store = ShapeStore::new();
        for (id, x, y, size) in rects {
            store
                .append(Shape::new(
                    ShapeId::new(*id),
                    Geometry::Rectangle(Rectangle::new(Point::new(*x, *y), *size, *size)),
                    ShapeStyle::default(),
                    UserId::new("tester"),
                ))
                .unwrap();
        }
        store
    }

    #[test]
    fn test_click_selects_topmost() {
        let store = store_with(&[("a", 0.0, 0.0, 100.0), ("b", 20.0, 20.0, 30.0)]);
        let mut manager = SelectionManager::new();
        assert!(manager.pointer_down(Point::new(30.0, 30.0), false, &store));
        assert_eq!(manager.selection().ids(), &[ShapeId::new("b")]);
        assert!(!manager.pointer_up(Point::new(30.0, 30.0), &store));
        assert_eq!(manager.mode(), SelectMode::Idle);
    }

    #[test]
    fn test_additive_click_toggles() {
        let store = store_with(&[("a", 0.0, 0.0, 10.0), ("b", 100.0, 100.0, 10.0)]);
        let mut manager = SelectionManager::new();
        manager.pointer_down(Point::new(5.0, 5.0), false, &store);
        manager.pointer_up(Point::new(5.0, 5.0), &store);
        manager.pointer_down(Point::new(105.0, 105.0), true, &store);
        manager.pointer_up(Point::new(105.0, 105.0), &store);
        assert_eq!(manager.selection().len(), 2);

        manager.pointer_down(Point::new(5.0, 5.0), true, &store);
        assert_eq!(manager.selection().ids(), &[ShapeId::new("b")]);
    }

    #[test]
    fn test_additive_miss_keeps_selection() {
        let store = store_with(&[("a", 0.0, 0.0, 10.0)]);
        let mut manager = SelectionManager::new();
        manager.pointer_down(Point::new(5.0, 5.0), false, &store);
        manager.pointer_up(Point::new(5.0, 5.0), &store);

        assert!(!manager.pointer_down(Point::new(500.0, 500.0), true, &store));
        assert!(manager.marquee().is_none());
        assert_eq!(manager.selection().len(), 1);
    }

    #[test]
    fn test_marquee_selects_contained_only() {
        let store = store_with(&[("inside", 10.0, 10.0, 50.0), ("straddle", 50.0, 50.0, 100.0)]);
        let mut manager = SelectionManager::new();

        assert!(!manager.pointer_down(Point::new(-1.0, -1.0), false, &store));
        assert!(manager.pointer_move(Point::new(40.0, 40.0)));
        assert_eq!(manager.marquee(), Some(Rect::new(-1.0, -1.0, 40.0, 40.0)));
        assert!(manager.pointer_up(Point::new(100.0, 100.0), &store));

        assert_eq!(manager.selection().ids(), &[ShapeId::new("inside")]);
        assert!(manager.marquee().is_none());
    }

    #[test]
    fn test_miss_clears_selection() {
        let store = store_with(&[("a", 0.0, 0.0, 10.0)]);
        let mut manager = SelectionManager::new();
        manager.pointer_down(Point::new(5.0, 5.0), false, &store);
        manager.pointer_up(Point::new(5.0, 5.0), &store);

        assert!(manager.pointer_down(Point::new(300.0, 300.0), false, &store));
        assert!(manager.selection().is_empty());
    }

    #[test]
    fn test_replace_dedups_and_reports_change() {
        let mut selection = Selection::new();
        assert!(selection.replace([ShapeId::new("a"), ShapeId::new("a"), ShapeId::new("b")]));
        assert_eq!(selection.len(), 2);
        assert!(!selection.replace([ShapeId::new("a"), ShapeId::new("b")]));
        assert!(selection.remove(&ShapeId::new("a")));
        assert!(!selection.remove(&ShapeId::new("a")));
    }
}
