//! A participant's live view of one room.
//!
//! [`RoomSession`] owns the shape store, view transform, selection and tool
//! state for a room, and is the single dispatch point for pointer, keyboard,
//! wheel and channel input. Every handler runs to completion and redraws the
//! surface before returning.

use crate::input::{Command, KeyPress, Modifiers, MouseButton, PointerEvent, ShortcutRegistry};
use crate::seed::{self, SeedRecord};
use crate::selection::SelectionManager;
use crate::shapes::{Freehand, Geometry, SerializableColor, Shape, ShapeId, UserId};
use crate::store::ShapeStore;
use crate::surface::{Frame, Surface, SurfaceError};
use crate::sync::{Channel, RemoteEdit, SyncAdapter};
use crate::tools::{ToolKind, ToolState, ToolManager};
use crate::view::{ViewTransform, wheel_zoom_factor};
use kurbo::{Point, Size, Vec2};
use thiserror::Error;

/// Offset applied to duplicated shapes, in model units.
pub const DUPLICATE_OFFSET: f64 = 20.0;

/// Errors raised by session construction and commands.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No render context available for the canvas")]
    MissingRenderContext,

    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Who is entering which room, and how big the canvas is.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub room_id: String,
    pub user_id: UserId,
    /// Viewport size in screen pixels.
    pub viewport: Size,
}

impl SessionConfig {
    pub fn new(room_id: impl Into<String>, user_id: impl Into<String>, viewport: Size) -> Self {
        Self {
            room_id: room_id.into(),
            user_id: UserId::new(user_id),
            viewport,
        }
    }
}

/// Callbacks into the surrounding UI.
#[derive(Default)]
pub struct SessionHooks {
    on_scale_change: Option<Box<dyn FnMut(u32)>>,
    on_selection_change: Option<Box<dyn FnMut(&[ShapeId])>>,
}

impl SessionHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the new zoom percentage.
    pub fn on_scale_change(mut self, f: impl FnMut(u32) + 'static) -> Self {
        self.on_scale_change = Some(Box::new(f));
        self
    }

    /// Called with the selected ids after every selection change.
    pub fn on_selection_change(mut self, f: impl FnMut(&[ShapeId]) + 'static) -> Self {
        self.on_selection_change = Some(Box::new(f));
        self
    }
}

fn is_drawable(size: Size) -> bool {
    size.width.is_finite() && size.height.is_finite() && size.width > 0.0 && size.height > 0.0
}

/// One participant's session in one room.
pub struct RoomSession {
    config: SessionConfig,
    store: ShapeStore,
    view: ViewTransform,
    selection: SelectionManager,
    tools: ToolManager,
    sync: SyncAdapter,
    surface: Box<dyn Surface>,
    hooks: SessionHooks,
    joined: bool,
    active: bool,
}

impl RoomSession {
    /// Enter a room: seed the store, attach the surface and announce ourselves.
    ///
    /// Fails with [`SessionError::MissingRenderContext`] when the viewport is
    /// not drawable or the surface cannot attach to it.
    pub fn enter(
        config: SessionConfig,
        channel: Box<dyn Channel>,
        mut surface: Box<dyn Surface>,
        seed: &[SeedRecord],
        hooks: SessionHooks,
    ) -> SessionResult<Self> {
        if !is_drawable(config.viewport) {
            log::error!("Refusing to enter room with viewport {:?}", config.viewport);
            return Err(SessionError::MissingRenderContext);
        }
        if let Err(e) = surface.attach(config.viewport) {
            log::error!("Surface unavailable: {}", e);
            return Err(SessionError::MissingRenderContext);
        }

        let mut store = ShapeStore::new();
        let loaded = seed::load_seed(seed, &mut store);
        let sync = SyncAdapter::new(config.room_id.clone(), channel);
        log::info!(
            "Entering room {} as {} with {} seeded shapes",
            config.room_id,
            config.user_id,
            loaded
        );

        let mut session = Self {
            config,
            store,
            view: ViewTransform::new(),
            selection: SelectionManager::new(),
            tools: ToolManager::new(),
            sync,
            surface,
            hooks,
            joined: false,
            active: true,
        };
        session.join_if_open();
        session.redraw();
        Ok(session)
    }

    // ---- input dispatch ----

    /// Route a pointer event to the active tool. Positions are in screen space.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        if !self.active {
            return;
        }
        match event {
            PointerEvent::Down {
                position,
                button: MouseButton::Left,
                modifiers,
            } => self.pointer_down(position, modifiers),
            PointerEvent::Move { position } => self.pointer_move(position),
            PointerEvent::Up {
                position,
                button: MouseButton::Left,
            } => self.pointer_up(position),
            PointerEvent::Wheel { position, delta } => self.wheel(position, delta.y),
            PointerEvent::Down { .. } | PointerEvent::Up { .. } => {}
        }
    }

    /// Run the command bound to a key, if any. Returns the command executed.
    pub fn handle_key(&mut self, press: &KeyPress) -> Option<Command> {
        if !self.active {
            return None;
        }
        let command = ShortcutRegistry::resolve(press)?;
        match command {
            Command::DeleteSelection => {
                self.delete_selection();
            }
            Command::ClearSelection => self.clear_selection(),
            Command::Undo => {
                self.undo();
            }
            Command::DuplicateSelection => {
                self.duplicate_selection();
            }
        }
        Some(command)
    }

    /// Apply one inbound frame. Malformed frames are logged and dropped.
    pub fn handle_message(&mut self, frame: &str) {
        if !self.active {
            return;
        }
        match SyncAdapter::decode(frame) {
            Ok(Some(edit)) => self.apply_remote(edit),
            Ok(None) => {}
            Err(e) => log::warn!("Dropping malformed message: {}", e),
        }
    }

    /// Drain the channel and apply every frame. Returns the number of frames seen.
    pub fn poll_channel(&mut self) -> usize {
        if !self.active {
            return 0;
        }
        let frames = self.sync.poll();
        self.join_if_open();
        for frame in &frames {
            self.handle_message(frame);
        }
        frames.len()
    }

    /// The viewport changed size.
    pub fn resize(&mut self, size: Size) {
        if !self.active {
            return;
        }
        if !is_drawable(size) {
            log::warn!("Ignoring resize to {:?}", size);
            return;
        }
        if let Err(e) = self.surface.attach(size) {
            log::warn!("Surface rejected resize: {}", e);
            return;
        }
        self.config.viewport = size;
        self.redraw();
    }

    // ---- commands ----

    /// Switch tools. Clears the selection and drops any gesture in progress.
    pub fn set_tool(&mut self, tool: ToolKind) {
        if !self.active {
            return;
        }
        if let ToolState::Sketching { shape_id } = self.tools.set_tool(tool) {
            log::debug!("Discarding unfinished stroke {}", shape_id);
            self.store.remove_by_id(&shape_id);
        }
        self.selection.cancel_gesture();
        if self.selection.selection_mut().clear() {
            self.notify_selection();
        }
        self.redraw();
    }

    pub fn set_stroke_width(&mut self, width: f64) {
        self.tools.set_stroke_width(width);
    }

    pub fn set_stroke_color(&mut self, color: SerializableColor) {
        self.tools.set_stroke_color(color);
    }

    /// `None` draws new shapes without fill.
    pub fn set_fill_color(&mut self, color: Option<SerializableColor>) {
        self.tools.set_fill_color(color);
    }

    pub fn zoom_in(&mut self) {
        self.change_view(ViewTransform::zoom_in);
    }

    pub fn zoom_out(&mut self) {
        self.change_view(ViewTransform::zoom_out);
    }

    /// Set zoom to `percent` (100 = 1:1), clamped to the allowed range.
    pub fn set_zoom(&mut self, percent: f64) {
        self.change_view(|view| view.set_zoom_percent(percent));
    }

    pub fn reset_view(&mut self) {
        self.change_view(ViewTransform::reset);
    }

    /// Frame every shape in the viewport. Does nothing for an empty room.
    pub fn fit_to_content(&mut self) {
        let Some(bounds) = self.store.bounds() else {
            return;
        };
        let viewport = self.config.viewport;
        self.change_view(|view| view.fit_to_content(bounds, viewport));
    }

    /// Encode the committed shapes with the surface's exporter.
    pub fn export_image(&mut self) -> SessionResult<Vec<u8>> {
        Ok(self.surface.export(self.store.all())?)
    }

    /// Remove every shape for everyone in the room.
    pub fn clear_all(&mut self) {
        if !self.active {
            return;
        }
        self.tools.cancel();
        self.selection.cancel_gesture();
        self.store.clear();
        self.selection.selection_mut().clear();
        self.sync.broadcast_clear();
        self.notify_selection();
        self.redraw();
    }

    /// Remove the newest shape if this participant drew it.
    pub fn undo(&mut self) -> bool {
        if !self.active {
            return false;
        }
        let Some(last) = self.store.last() else {
            return false;
        };
        if last.author != self.config.user_id {
            log::debug!("Undo skipped: newest shape belongs to {}", last.author);
            return false;
        }
        let id = last.id().clone();
        let removed = self.remove_local(&id);
        self.redraw();
        removed
    }

    /// Clone every selected shape with an offset and select the clones.
    /// Returns how many were created.
    pub fn duplicate_selection(&mut self) -> usize {
        if !self.active {
            return 0;
        }
        let offset = Vec2::new(DUPLICATE_OFFSET, DUPLICATE_OFFSET);
        let copies: Vec<Shape> = self
            .selection
            .selection()
            .ids()
            .iter()
            .filter_map(|id| self.store.find_by_id(id))
            .map(|shape| shape.duplicate(offset, &self.config.user_id))
            .collect();
        if copies.is_empty() {
            return 0;
        }

        let mut created = Vec::with_capacity(copies.len());
        for copy in copies {
            match self.store.append(copy.clone()) {
                Ok(()) => {
                    self.sync.broadcast_draw(&copy);
                    created.push(copy.id().clone());
                }
                Err(e) => log::warn!("Duplicate rejected: {}", e),
            }
        }
        let count = created.len();
        self.selection.selection_mut().replace(created);
        self.notify_selection();
        self.redraw();
        count
    }

    /// Remove every selected shape, broadcasting each removal.
    pub fn delete_selection(&mut self) -> usize {
        if !self.active {
            return 0;
        }
        let ids = self.selection.selection().ids().to_vec();
        if ids.is_empty() {
            return 0;
        }
        let mut removed = 0;
        for id in &ids {
            if let Some(shape) = self.store.remove_by_id(id) {
                self.sync.broadcast_erase(shape.wire_id());
                removed += 1;
            }
        }
        self.selection.selection_mut().clear();
        self.notify_selection();
        self.redraw();
        removed
    }

    pub fn clear_selection(&mut self) {
        if !self.active {
            return;
        }
        self.selection.cancel_gesture();
        if self.selection.selection_mut().clear() {
            self.notify_selection();
        }
        self.redraw();
    }

    /// Leave the room. Safe to call more than once; every later call and
    /// every handler becomes a no-op.
    pub fn teardown(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.tools.cancel();
        self.selection.cancel_gesture();
        self.sync.leave();
        log::info!("Left room {}", self.config.room_id);
    }

    // ---- queries ----

    pub fn shapes(&self) -> &[Shape] {
        self.store.all()
    }

    pub fn shape_count(&self) -> usize {
        self.store.len()
    }

    pub fn selected_ids(&self) -> &[ShapeId] {
        self.selection.selection().ids()
    }

    /// Selected shapes in z-order.
    pub fn selected_shapes(&self) -> Vec<&Shape> {
        let selection = self.selection.selection();
        self.store
            .all()
            .iter()
            .filter(|s| selection.contains(s.id()))
            .collect()
    }

    pub fn zoom_percent(&self) -> u32 {
        self.view.zoom_percent()
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn tool(&self) -> ToolKind {
        self.tools.current_tool
    }

    pub fn room_id(&self) -> &str {
        &self.config.room_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.config.user_id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Cursor hint for the current tool and gesture.
    pub fn cursor(&self) -> &'static str {
        match self.tools.state {
            ToolState::Panning { .. } => "grabbing",
            _ => self.tools.current_tool.cursor(),
        }
    }

    // ---- pointer handling ----

    fn pointer_down(&mut self, screen: Point, modifiers: Modifiers) {
        if self.tools.is_active() {
            // A release was missed; finish that gesture first.
            self.pointer_up(screen);
        }
        let point = self.view.to_model_space(screen);
        match self.tools.current_tool {
            ToolKind::Select => {
                self.tools.state = ToolState::Selecting;
                if self
                    .selection
                    .pointer_down(point, modifiers.additive(), &self.store)
                {
                    self.notify_selection();
                }
            }
            ToolKind::Rectangle | ToolKind::Ellipse | ToolKind::Line => {
                self.tools.begin_drag(point);
            }
            ToolKind::Freehand => {
                let shape = Shape::create(
                    Geometry::Freehand(Freehand::new(point)),
                    self.tools.current_style.clone(),
                    self.config.user_id.clone(),
                );
                let shape_id = shape.id().clone();
                match self.store.append(shape) {
                    Ok(()) => self.tools.state = ToolState::Sketching { shape_id },
                    Err(e) => log::warn!("Could not start stroke: {}", e),
                }
            }
            ToolKind::Eraser => {
                self.tools.state = ToolState::Erasing;
                self.erase_at(point);
            }
            ToolKind::Hand => {
                self.tools.state = ToolState::Panning { last: screen };
            }
        }
        self.redraw();
    }

    fn pointer_move(&mut self, screen: Point) {
        let point = self.view.to_model_space(screen);
        let changed = match self.tools.state.clone() {
            ToolState::Idle => false,
            ToolState::Panning { last } => {
                self.view.pan_by(screen - last);
                self.tools.state = ToolState::Panning { last: screen };
                true
            }
            ToolState::Selecting => self.selection.pointer_move(point),
            ToolState::Drawing { .. } => self.tools.update_drag(point),
            ToolState::Sketching { shape_id } => self.extend_stroke(&shape_id, point),
            ToolState::Erasing => self.erase_at(point),
        };
        if changed {
            self.redraw();
        }
    }

    fn pointer_up(&mut self, screen: Point) {
        let point = self.view.to_model_space(screen);
        match self.tools.state.clone() {
            ToolState::Idle => return,
            ToolState::Selecting => {
                self.tools.cancel();
                if self.selection.pointer_up(point, &self.store) {
                    self.notify_selection();
                }
            }
            ToolState::Drawing { .. } => {
                if let Some(geometry) = self.tools.finish_drag(point) {
                    self.commit(geometry);
                }
            }
            ToolState::Sketching { shape_id } => {
                self.tools.cancel();
                if let Some(shape) = self.store.find_by_id(&shape_id) {
                    self.sync.broadcast_draw(shape);
                }
            }
            ToolState::Erasing | ToolState::Panning { .. } => {
                self.tools.cancel();
            }
        }
        self.redraw();
    }

    fn wheel(&mut self, screen: Point, delta_y: f64) {
        if self.view.zoom_at(screen, wheel_zoom_factor(delta_y)) {
            self.notify_scale();
            self.redraw();
        }
    }

    fn extend_stroke(&mut self, shape_id: &ShapeId, point: Point) -> bool {
        let extend = |shape: &mut Shape| shape.push_point(point);
        if self.store.last().is_some_and(|s| s.id() == shape_id) {
            self.store.mutate_last(extend).unwrap_or(false)
        } else {
            // A remote shape landed on top mid-stroke.
            self.store.mutate_by_id(shape_id, extend).unwrap_or(false)
        }
    }

    fn erase_at(&mut self, point: Point) -> bool {
        let Some(id) = self.store.topmost_at(point).map(|s| s.id().clone()) else {
            return false;
        };
        self.remove_local(&id)
    }

    // ---- mutations ----

    fn commit(&mut self, geometry: Geometry) {
        let shape = Shape::create(
            geometry,
            self.tools.current_style.clone(),
            self.config.user_id.clone(),
        );
        log::debug!("Committing {:?} {}", shape.kind(), shape.id());
        match self.store.append(shape.clone()) {
            Ok(()) => self.sync.broadcast_draw(&shape),
            Err(e) => log::warn!("Rejected local shape: {}", e),
        }
    }

    fn remove_local(&mut self, id: &ShapeId) -> bool {
        let Some(shape) = self.store.remove_by_id(id) else {
            return false;
        };
        self.sync.broadcast_erase(shape.wire_id());
        if self.selection.prune(id) {
            self.notify_selection();
        }
        true
    }

    fn apply_remote(&mut self, edit: RemoteEdit) {
        match edit {
            RemoteEdit::Draw { record, author } => {
                let origin_id = record.id.as_ref().map(|id| id.to_shape_id());
                if let Some(origin) = &origin_id {
                    if self.store.resolve(origin).is_some() {
                        log::warn!("Ignoring replayed draw of {}", origin);
                        return;
                    }
                }
                let geometry = match record.geometry() {
                    Ok(geometry) => geometry,
                    Err(e) => {
                        log::warn!("Dropping remote draw: {}", e);
                        return;
                    }
                };
                let shape = Shape::new(
                    ShapeId::generate("remote"),
                    geometry,
                    record.style(),
                    author.unwrap_or_else(UserId::unknown),
                )
                .with_origin(origin_id);
                if let Err(e) = self.store.append(shape) {
                    log::warn!("Rejected remote shape: {}", e);
                    return;
                }
            }
            RemoteEdit::Erase(id) => {
                let Some(local) = self.store.resolve(&id) else {
                    log::debug!("Remote erase of unknown shape {}", id);
                    return;
                };
                self.store.remove_by_id(&local);
                if self.selection.prune(&local) {
                    self.notify_selection();
                }
                if matches!(&self.tools.state, ToolState::Sketching { shape_id } if *shape_id == local)
                {
                    self.tools.cancel();
                }
            }
            RemoteEdit::Clear => {
                if matches!(self.tools.state, ToolState::Sketching { .. }) {
                    self.tools.cancel();
                }
                self.selection.cancel_gesture();
                self.store.clear();
                self.selection.selection_mut().clear();
                self.notify_selection();
            }
            RemoteEdit::Select => {}
        }
        self.redraw();
    }

    // ---- plumbing ----

    fn join_if_open(&mut self) {
        if !self.joined && self.sync.is_open() {
            self.sync.join();
            self.joined = true;
        }
    }

    fn change_view(&mut self, f: impl FnOnce(&mut ViewTransform)) {
        if !self.active {
            return;
        }
        let before = self.view.zoom_percent();
        f(&mut self.view);
        if self.view.zoom_percent() != before {
            self.notify_scale();
        }
        self.redraw();
    }

    fn notify_scale(&mut self) {
        let percent = self.view.zoom_percent();
        if let Some(f) = self.hooks.on_scale_change.as_mut() {
            f(percent);
        }
    }

    fn notify_selection(&mut self) {
        let ids = self.selection.selection().ids();
        if let Some(f) = self.hooks.on_selection_change.as_mut() {
            f(ids);
        }
    }

    fn redraw(&mut self) {
        let frame = Frame {
            shapes: self.store.all(),
            view: self.view,
            selection: self.selection.selection(),
            marquee: self.selection.marquee(),
            preview: self.tools.preview(),
            viewport: self.config.viewport,
        };
        self.surface.redraw(&frame);
    }
}

impl Drop for RoomSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::ShapeKind;
    use crate::surface::HeadlessSurface;
    use crate::sync::{MemoryChannel, WireMessage};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Harness {
        session: RoomSession,
        channel: MemoryChannel,
        surface: HeadlessSurface,
    }

    fn harness_with(channel: MemoryChannel, hooks: SessionHooks) -> Harness {
        let surface = HeadlessSurface::new();
        let session = RoomSession::enter(
            SessionConfig::new("room-1", "alice", Size::new(800.0, 600.0)),
            Box::new(channel.clone()),
            Box::new(surface.clone()),
            &[],
            hooks,
        )
        .unwrap();
        channel.take_sent();
        Harness {
            session,
            channel,
            surface,
        }
    }

    fn harness() -> Harness {
        harness_with(MemoryChannel::open(), SessionHooks::new())
    }

    fn drag(session: &mut RoomSession, from: (f64, f64), to: (f64, f64)) {
        session.handle_pointer(PointerEvent::down(from.0, from.1));
        session.handle_pointer(PointerEvent::moved(to.0, to.1));
        session.handle_pointer(PointerEvent::up(to.0, to.1));
    }

    fn sent_kinds(channel: &MemoryChannel) -> Vec<&'static str> {
        channel.sent_messages().iter().map(WireMessage::kind).collect()
    }

    fn remote_draw(id: &str, x: f64, y: f64) -> String {
        let shape = format!(
            r#"{{"shape":{{"id":"{id}","type":"rectangle","x":{x},"y":{y},"width":20,"height":20}}}}"#
        );
        serde_json::json!({"type": "draw", "data": shape, "userId": "bob"}).to_string()
    }

    #[test]
    fn test_enter_sends_join_and_redraws() {
        let channel = MemoryChannel::open();
        let surface = HeadlessSurface::new();
        let _session = RoomSession::enter(
            SessionConfig::new("room-1", "alice", Size::new(800.0, 600.0)),
            Box::new(channel.clone()),
            Box::new(surface.clone()),
            &[],
            SessionHooks::new(),
        )
        .unwrap();
        assert_eq!(sent_kinds(&channel), vec!["join_room"]);
        assert_eq!(surface.redraw_count(), 1);
        assert_eq!(surface.viewport(), Some(Size::new(800.0, 600.0)));
    }

    #[test]
    fn test_enter_without_render_context_fails() {
        let result = RoomSession::enter(
            SessionConfig::new("room-1", "alice", Size::new(800.0, 600.0)),
            Box::new(MemoryChannel::open()),
            Box::new(HeadlessSurface::unavailable()),
            &[],
            SessionHooks::new(),
        );
        assert!(matches!(result, Err(SessionError::MissingRenderContext)));

        let result = RoomSession::enter(
            SessionConfig::new("room-1", "alice", Size::new(0.0, 600.0)),
            Box::new(MemoryChannel::open()),
            Box::new(HeadlessSurface::new()),
            &[],
            SessionHooks::new(),
        );
        assert!(matches!(result, Err(SessionError::MissingRenderContext)));
    }

    #[test]
    fn test_join_deferred_until_channel_opens() {
        let channel = MemoryChannel::new();
        let mut h = harness_with(channel.clone(), SessionHooks::new());
        assert!(channel.sent().is_empty());

        channel.set_open(true);
        h.session.poll_channel();
        h.session.poll_channel();
        assert_eq!(sent_kinds(&channel), vec!["join_room"]);
    }

    #[test]
    fn test_sub_threshold_rectangle_discarded() {
        let mut h = harness();
        h.session.set_tool(ToolKind::Rectangle);
        drag(&mut h.session, (100.0, 100.0), (101.0, 101.0));
        assert_eq!(h.session.shape_count(), 0);
        assert!(h.channel.sent().is_empty());

        drag(&mut h.session, (100.0, 100.0), (110.0, 110.0));
        assert_eq!(h.session.shape_count(), 1);
        assert_eq!(sent_kinds(&h.channel), vec!["draw"]);
        assert_eq!(h.session.shapes()[0].kind(), ShapeKind::Rectangle);
    }

    #[test]
    fn test_preview_does_not_touch_store() {
        let mut h = harness();
        h.session.set_tool(ToolKind::Ellipse);
        h.session.handle_pointer(PointerEvent::down(10.0, 10.0));
        h.session.handle_pointer(PointerEvent::moved(80.0, 60.0));
        assert_eq!(h.session.shape_count(), 0);
        assert!(h.surface.last_frame().unwrap().has_preview);

        h.session.handle_pointer(PointerEvent::up(80.0, 60.0));
        assert_eq!(h.session.shape_count(), 1);
        assert!(!h.surface.last_frame().unwrap().has_preview);
    }

    #[test]
    fn test_drawing_respects_view_transform() {
        let mut h = harness();
        h.session.set_zoom(200.0);
        h.session.set_tool(ToolKind::Line);
        drag(&mut h.session, (0.0, 0.0), (100.0, 0.0));
        let bounds = h.session.shapes()[0].bounds();
        assert!((bounds.x1 - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_freehand_stroke_broadcast_on_release() {
        let mut h = harness();
        h.session.set_tool(ToolKind::Freehand);
        h.session.handle_pointer(PointerEvent::down(0.0, 0.0));
        h.session.handle_pointer(PointerEvent::moved(5.0, 5.0));
        h.session.handle_pointer(PointerEvent::moved(10.0, 12.0));
        assert_eq!(h.session.shape_count(), 1);
        assert!(h.channel.sent().is_empty());

        h.session.handle_pointer(PointerEvent::up(10.0, 12.0));
        assert_eq!(sent_kinds(&h.channel), vec!["draw"]);
        match h.session.shapes()[0].geometry() {
            Geometry::Freehand(f) => assert_eq!(f.points.len(), 3),
            other => panic!("unexpected geometry {other:?}"),
        }
    }

    #[test]
    fn test_tool_switch_discards_unfinished_stroke() {
        let mut h = harness();
        h.session.set_tool(ToolKind::Freehand);
        h.session.handle_pointer(PointerEvent::down(0.0, 0.0));
        h.session.handle_pointer(PointerEvent::moved(5.0, 5.0));
        h.session.set_tool(ToolKind::Select);
        assert_eq!(h.session.shape_count(), 0);
        assert!(h.channel.sent().is_empty());
    }

    #[test]
    fn test_eraser_drag_removes_every_hit() {
        let mut h = harness();
        h.session.set_tool(ToolKind::Rectangle);
        drag(&mut h.session, (0.0, 0.0), (20.0, 20.0));
        drag(&mut h.session, (100.0, 0.0), (120.0, 20.0));
        h.channel.take_sent();

        h.session.set_tool(ToolKind::Eraser);
        h.session.handle_pointer(PointerEvent::down(10.0, 10.0));
        h.session.handle_pointer(PointerEvent::moved(60.0, 10.0));
        h.session.handle_pointer(PointerEvent::moved(110.0, 10.0));
        h.session.handle_pointer(PointerEvent::up(110.0, 10.0));

        assert_eq!(h.session.shape_count(), 0);
        assert_eq!(sent_kinds(&h.channel), vec!["erase", "erase"]);
    }

    #[test]
    fn test_hand_pans_in_screen_units() {
        let mut h = harness();
        h.session.set_zoom(250.0);
        h.session.set_tool(ToolKind::Hand);
        h.session.handle_pointer(PointerEvent::down(100.0, 100.0));
        assert_eq!(h.session.cursor(), "grabbing");
        h.session.handle_pointer(PointerEvent::moved(130.0, 90.0));
        h.session.handle_pointer(PointerEvent::up(130.0, 90.0));
        assert_eq!(h.session.view().pan, Vec2::new(30.0, -10.0));
        assert_eq!(h.session.cursor(), "grab");
    }

    #[test]
    fn test_wheel_zooms_with_any_tool() {
        let zooms = Rc::new(RefCell::new(Vec::new()));
        let sink = zooms.clone();
        let mut h = harness_with(
            MemoryChannel::open(),
            SessionHooks::new().on_scale_change(move |p| sink.borrow_mut().push(p)),
        );
        h.session.set_tool(ToolKind::Freehand);
        h.session.handle_pointer(PointerEvent::Wheel {
            position: Point::new(400.0, 300.0),
            delta: Vec2::new(0.0, -100.0),
        });
        assert_eq!(h.session.zoom_percent(), 110);
        assert_eq!(*zooms.borrow(), vec![110]);
        assert_eq!(h.session.shape_count(), 0);
    }

    #[test]
    fn test_selection_hook_and_marquee() {
        let selections = Rc::new(RefCell::new(Vec::new()));
        let sink = selections.clone();
        let mut h = harness_with(
            MemoryChannel::open(),
            SessionHooks::new().on_selection_change(move |ids| sink.borrow_mut().push(ids.len())),
        );
        h.session.set_tool(ToolKind::Rectangle);
        drag(&mut h.session, (10.0, 10.0), (60.0, 60.0));
        drag(&mut h.session, (90.0, 90.0), (140.0, 140.0));

        h.session.set_tool(ToolKind::Select);
        selections.borrow_mut().clear();
        h.session.handle_pointer(PointerEvent::down(-20.0, -20.0));
        h.session.handle_pointer(PointerEvent::moved(100.0, 100.0));
        assert_eq!(
            h.surface.last_frame().unwrap().marquee,
            Some(kurbo::Rect::new(-20.0, -20.0, 100.0, 100.0))
        );
        h.session.handle_pointer(PointerEvent::up(100.0, 100.0));

        assert_eq!(h.session.selected_shapes().len(), 1);
        assert_eq!(*selections.borrow(), vec![1]);
        assert!(h.surface.last_frame().unwrap().marquee.is_none());
    }

    #[test]
    fn test_marquee_touching_shape_edge_selects_it() {
        let mut h = harness();
        h.session.set_tool(ToolKind::Rectangle);
        drag(&mut h.session, (10.0, 10.0), (60.0, 60.0));

        h.session.set_tool(ToolKind::Select);
        drag(&mut h.session, (10.0, 0.0), (100.0, 100.0));
        assert_eq!(h.session.selected_ids(), vec![h.session.shapes()[0].id().clone()]);
    }

    #[test]
    fn test_tool_switch_reports_only_real_selection_changes() {
        let selections = Rc::new(RefCell::new(Vec::new()));
        let sink = selections.clone();
        let mut h = harness_with(
            MemoryChannel::open(),
            SessionHooks::new().on_selection_change(move |ids| sink.borrow_mut().push(ids.len())),
        );
        h.session.set_tool(ToolKind::Rectangle);
        h.session.set_tool(ToolKind::Ellipse);
        assert!(selections.borrow().is_empty());

        drag(&mut h.session, (0.0, 0.0), (40.0, 40.0));
        h.session.set_tool(ToolKind::Select);
        h.session.handle_pointer(PointerEvent::down(20.0, 20.0));
        h.session.handle_pointer(PointerEvent::up(20.0, 20.0));
        assert_eq!(*selections.borrow(), vec![1]);

        h.session.set_tool(ToolKind::Hand);
        assert_eq!(*selections.borrow(), vec![1, 0]);
    }

    #[test]
    fn test_shift_click_extends_selection() {
        let mut h = harness();
        h.session.set_tool(ToolKind::Rectangle);
        drag(&mut h.session, (0.0, 0.0), (20.0, 20.0));
        drag(&mut h.session, (100.0, 0.0), (120.0, 20.0));

        h.session.set_tool(ToolKind::Select);
        h.session.handle_pointer(PointerEvent::down(10.0, 10.0));
        h.session.handle_pointer(PointerEvent::up(10.0, 10.0));
        h.session.handle_pointer(PointerEvent::Down {
            position: Point::new(110.0, 10.0),
            button: MouseButton::Left,
            modifiers: Modifiers::SHIFT,
        });
        h.session.handle_pointer(PointerEvent::up(110.0, 10.0));
        assert_eq!(h.session.selected_ids().len(), 2);
    }

    #[test]
    fn test_delete_key_removes_selection() {
        let mut h = harness();
        h.session.set_tool(ToolKind::Rectangle);
        drag(&mut h.session, (0.0, 0.0), (20.0, 20.0));
        drag(&mut h.session, (100.0, 0.0), (120.0, 20.0));
        h.session.set_tool(ToolKind::Select);
        drag(&mut h.session, (-10.0, -10.0), (200.0, 200.0));
        assert_eq!(h.session.selected_ids().len(), 2);
        h.channel.take_sent();

        let command = h.session.handle_key(&KeyPress::new("Delete", Modifiers::NONE));
        assert_eq!(command, Some(Command::DeleteSelection));
        assert_eq!(h.session.shape_count(), 0);
        assert!(h.session.selected_ids().is_empty());
        assert_eq!(sent_kinds(&h.channel), vec!["erase", "erase"]);
    }

    #[test]
    fn test_escape_clears_selection() {
        let mut h = harness();
        h.session.set_tool(ToolKind::Rectangle);
        drag(&mut h.session, (0.0, 0.0), (20.0, 20.0));
        h.session.set_tool(ToolKind::Select);
        h.session.handle_pointer(PointerEvent::down(10.0, 10.0));
        h.session.handle_pointer(PointerEvent::up(10.0, 10.0));
        assert_eq!(h.session.selected_ids().len(), 1);

        h.session.handle_key(&KeyPress::new("Escape", Modifiers::NONE));
        assert!(h.session.selected_ids().is_empty());
        assert_eq!(h.session.shape_count(), 1);
    }

    #[test]
    fn test_undo_only_removes_own_shapes() {
        let mut h = harness();
        h.session.set_tool(ToolKind::Rectangle);
        drag(&mut h.session, (0.0, 0.0), (20.0, 20.0));
        h.channel.take_sent();

        assert!(h.session.undo());
        assert_eq!(h.session.shape_count(), 0);
        assert_eq!(sent_kinds(&h.channel), vec!["erase"]);

        h.session.handle_message(&remote_draw("rect-remote", 0.0, 0.0));
        h.channel.take_sent();
        let command = h.session.handle_key(&KeyPress::new("z", Modifiers::CTRL));
        assert_eq!(command, Some(Command::Undo));
        assert_eq!(h.session.shape_count(), 1);
        assert!(h.channel.sent().is_empty());
    }

    #[test]
    fn test_duplicate_selection() {
        let mut h = harness();
        h.session.set_tool(ToolKind::Rectangle);
        drag(&mut h.session, (0.0, 0.0), (20.0, 20.0));
        h.session.set_tool(ToolKind::Select);
        h.session.handle_pointer(PointerEvent::down(10.0, 10.0));
        h.session.handle_pointer(PointerEvent::up(10.0, 10.0));
        let original = h.session.selected_ids()[0].clone();
        h.channel.take_sent();

        assert_eq!(h.session.duplicate_selection(), 1);
        assert_eq!(h.session.shape_count(), 2);
        assert_eq!(sent_kinds(&h.channel), vec!["draw"]);
        let selected = h.session.selected_shapes();
        assert_eq!(selected.len(), 1);
        assert_ne!(selected[0].id(), &original);
        assert_eq!(selected[0].bounds(), kurbo::Rect::new(20.0, 20.0, 40.0, 40.0));
        assert_eq!(selected[0].author.as_str(), "alice");
    }

    #[test]
    fn test_remote_draw_then_erase_restores_store() {
        let mut h = harness();
        h.session.set_tool(ToolKind::Line);
        drag(&mut h.session, (0.0, 0.0), (50.0, 0.0));
        let before: Vec<ShapeId> = h.session.shapes().iter().map(|s| s.id().clone()).collect();

        h.session.handle_message(&remote_draw("rect-77", 100.0, 100.0));
        assert_eq!(h.session.shape_count(), 2);
        let remote = &h.session.shapes()[1];
        assert!(remote.id().as_str().starts_with("remote-"));
        assert_eq!(remote.author.as_str(), "bob");

        h.session
            .handle_message(r#"{"type":"erase","data":"{\"shapeId\":\"rect-77\"}"}"#);
        let after: Vec<ShapeId> = h.session.shapes().iter().map(|s| s.id().clone()).collect();
        assert_eq!(before, after);

        // Erasing again is a no-op.
        h.session
            .handle_message(r#"{"type":"erase","data":"{\"shapeId\":\"rect-77\"}"}"#);
        assert_eq!(h.session.shape_count(), 1);
    }

    #[test]
    fn test_replayed_remote_draw_rejected() {
        let mut h = harness();
        h.session.handle_message(&remote_draw("rect-5", 0.0, 0.0));
        h.session.handle_message(&remote_draw("rect-5", 0.0, 0.0));
        assert_eq!(h.session.shape_count(), 1);
    }

    #[test]
    fn test_remote_erase_prunes_selection() {
        let mut h = harness();
        h.session.handle_message(&remote_draw("rect-5", 0.0, 0.0));
        h.session.handle_pointer(PointerEvent::down(10.0, 10.0));
        h.session.handle_pointer(PointerEvent::up(10.0, 10.0));
        assert_eq!(h.session.selected_ids().len(), 1);

        h.session
            .handle_message(r#"{"type":"erase","data":{"shapeId":"rect-5"}}"#);
        assert!(h.session.selected_ids().is_empty());
    }

    #[test]
    fn test_remote_clear_and_malformed_frames() {
        let mut h = harness();
        h.session.handle_message(&remote_draw("rect-5", 0.0, 0.0));
        h.session.handle_message("{ not json");
        h.session.handle_message(r#"{"type":"draw","data":"{\"shape\":{\"type\":\"hexagon\"}}"}"#);
        h.session.handle_message(r#"{"type":"chat","message":"hello"}"#);
        assert_eq!(h.session.shape_count(), 1);

        h.session.handle_message(r#"{"type":"clear","roomId":"room-1"}"#);
        assert_eq!(h.session.shape_count(), 0);
        assert!(h.session.is_active());
    }

    #[test]
    fn test_poll_channel_applies_inbound() {
        let mut h = harness();
        h.channel.push_inbound(remote_draw("a", 0.0, 0.0));
        h.channel.push_inbound(remote_draw("b", 50.0, 50.0));
        assert_eq!(h.session.poll_channel(), 2);
        assert_eq!(h.session.shape_count(), 2);
    }

    #[test]
    fn test_clear_all_broadcasts() {
        let mut h = harness();
        h.session.set_tool(ToolKind::Rectangle);
        drag(&mut h.session, (0.0, 0.0), (20.0, 20.0));
        h.channel.take_sent();

        h.session.clear_all();
        assert_eq!(h.session.shape_count(), 0);
        assert_eq!(sent_kinds(&h.channel), vec!["clear"]);
    }

    #[test]
    fn test_zoom_commands_and_fit() {
        let mut h = harness();
        h.session.zoom_in();
        assert_eq!(h.session.zoom_percent(), 120);
        h.session.zoom_out();
        assert_eq!(h.session.zoom_percent(), 100);
        h.session.set_zoom(900.0);
        assert_eq!(h.session.zoom_percent(), 500);
        h.session.reset_view();
        assert_eq!(h.session.zoom_percent(), 100);

        // Nothing to fit.
        h.session.fit_to_content();
        assert_eq!(h.session.zoom_percent(), 100);

        h.session.set_tool(ToolKind::Rectangle);
        drag(&mut h.session, (0.0, 0.0), (10.0, 10.0));
        h.session.fit_to_content();
        assert_eq!(h.session.zoom_percent(), 200);
    }

    #[test]
    fn test_export_uses_surface() {
        let mut h = harness();
        h.session.handle_message(&remote_draw("rect-5", 0.0, 0.0));
        let bytes = h.session.export_image().unwrap();
        let records: Vec<serde_json::Value> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["id"], "rect-5");
    }

    #[test]
    fn test_resize_and_redraws() {
        let mut h = harness();
        let before = h.surface.redraw_count();
        h.session.resize(Size::new(1024.0, 768.0));
        assert_eq!(h.surface.viewport(), Some(Size::new(1024.0, 768.0)));
        assert_eq!(h.surface.redraw_count(), before + 1);

        h.session.resize(Size::new(-1.0, 10.0));
        assert_eq!(h.surface.viewport(), Some(Size::new(1024.0, 768.0)));
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let mut h = harness();
        h.session.teardown();
        assert_eq!(sent_kinds(&h.channel), vec!["leave_room"]);
        assert!(h.channel.is_closed());

        h.session.teardown();
        h.session.handle_message(&remote_draw("a", 0.0, 0.0));
        h.session.handle_pointer(PointerEvent::down(1.0, 1.0));
        assert_eq!(h.session.shape_count(), 0);
        assert_eq!(h.channel.sent().len(), 1);
    }

    #[test]
    fn test_teardown_on_closed_channel_sends_nothing() {
        let channel = MemoryChannel::new();
        let mut h = harness_with(channel.clone(), SessionHooks::new());
        h.session.teardown();
        assert!(channel.sent().is_empty());
        assert!(channel.is_closed());
    }

    #[test]
    fn test_drop_leaves_room() {
        let h = harness();
        let channel = h.channel.clone();
        drop(h);
        assert_eq!(sent_kinds(&channel), vec!["leave_room"]);
    }
}
