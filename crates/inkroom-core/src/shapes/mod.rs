//! Shape definitions for the shared canvas.

mod ellipse;
mod freehand;
mod line;
mod rectangle;

pub use ellipse::Ellipse;
pub use freehand::Freehand;
pub use line::Line;
pub use rectangle::Rectangle;

use kurbo::{BezPath, Point, Rect, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{SystemTime, UNIX_EPOCH};
#[cfg(target_arch = "wasm32")]
use web_time::{SystemTime, UNIX_EPOCH};

/// Thinnest stroke a shape may carry.
pub const MIN_STROKE_WIDTH: u8 = 1;
/// Thickest stroke a shape may carry.
pub const MAX_STROKE_WIDTH: u8 = 10;

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().strip_prefix('#')?;
        if !digits.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match digits.len() {
            3 => {
                let mut out = [0u8; 3];
                for (slot, c) in out.iter_mut().zip(digits.chars()) {
                    let v = c.to_digit(16)? as u8;
                    *slot = v * 16 + v;
                }
                Some(Self::new(out[0], out[1], out[2], 255))
            }
            6 => Some(Self::new(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
                255,
            )),
            8 => Some(Self::new(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
                channel(&digits[6..8])?,
            )),
            _ => None,
        }
    }

    /// Format as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Style properties for shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    /// Stroke width in model units, always within 1..=10.
    pub stroke_width: u8,
    pub stroke_color: SerializableColor,
    /// `None` means the interior is left unpainted.
    pub fill_color: Option<SerializableColor>,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            stroke_width: 2,
            stroke_color: SerializableColor::black(),
            fill_color: None,
        }
    }
}

impl ShapeStyle {
    /// Clamp an arbitrary requested width into the allowed stroke range.
    pub fn clamp_stroke_width(width: f64) -> u8 {
        if !width.is_finite() {
            return MIN_STROKE_WIDTH;
        }
        width
            .round()
            .clamp(MIN_STROKE_WIDTH as f64, MAX_STROKE_WIDTH as f64) as u8
    }

    pub fn stroke(&self) -> Color {
        self.stroke_color.into()
    }

    pub fn fill(&self) -> Option<Color> {
        self.fill_color.map(Color::from)
    }
}

/// Identifier of a shape, unique within a live store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(String);

impl ShapeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh id of the form `<tag>-<millis>-<random>`.
    pub fn generate(tag: &str) -> Self {
        let random = Uuid::new_v4().simple().to_string();
        Self(format!("{tag}-{}-{}", now_millis(), &random[..12]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShapeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ShapeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identity of a participant in a room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Author recorded for remote shapes that arrive without one.
    pub const UNKNOWN: &'static str = "unknown";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn unknown() -> Self {
        Self::new(Self::UNKNOWN)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// The four drawable kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
    Line,
    Freehand,
}

impl ShapeKind {
    /// Prefix used when generating ids for this kind.
    pub fn id_tag(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "rect",
            ShapeKind::Ellipse => "ellipse",
            ShapeKind::Line => "line",
            ShapeKind::Freehand => "pencil",
        }
    }
}

/// Common geometric behaviour of every shape kind.
pub trait ShapeGeometry {
    /// Axis-aligned bounding box in model space.
    fn bounds(&self) -> Rect;
    /// Whether `point` lies on or within `tolerance` of the shape.
    fn hit_test(&self, point: Point, tolerance: f64) -> bool;
    /// Outline suitable for stroking and filling.
    fn to_path(&self) -> BezPath;
    /// Move every coordinate by `delta`.
    fn translate(&mut self, delta: Vec2);
}

/// Kind-specific geometry of a shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Rectangle(Rectangle),
    Ellipse(Ellipse),
    Line(Line),
    Freehand(Freehand),
}

impl Geometry {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Geometry::Rectangle(_) => ShapeKind::Rectangle,
            Geometry::Ellipse(_) => ShapeKind::Ellipse,
            Geometry::Line(_) => ShapeKind::Line,
            Geometry::Freehand(_) => ShapeKind::Freehand,
        }
    }

    fn as_dyn(&self) -> &dyn ShapeGeometry {
        match self {
            Geometry::Rectangle(g) => g,
            Geometry::Ellipse(g) => g,
            Geometry::Line(g) => g,
            Geometry::Freehand(g) => g,
        }
    }

    fn as_dyn_mut(&mut self) -> &mut dyn ShapeGeometry {
        match self {
            Geometry::Rectangle(g) => g,
            Geometry::Ellipse(g) => g,
            Geometry::Line(g) => g,
            Geometry::Freehand(g) => g,
        }
    }
}

impl ShapeGeometry for Geometry {
    fn bounds(&self) -> Rect {
        self.as_dyn().bounds()
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.as_dyn().hit_test(point, tolerance)
    }

    fn to_path(&self) -> BezPath {
        self.as_dyn().to_path()
    }

    fn translate(&mut self, delta: Vec2) {
        self.as_dyn_mut().translate(delta);
    }
}

/// A committed canvas shape.
///
/// The geometry variant is fixed at construction, so a shape never changes kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    id: ShapeId,
    origin_id: Option<ShapeId>,
    geometry: Geometry,
    pub style: ShapeStyle,
    pub author: UserId,
    /// Creation time in milliseconds since the epoch.
    pub timestamp: u64,
}

impl Shape {
    pub fn new(id: ShapeId, geometry: Geometry, style: ShapeStyle, author: UserId) -> Self {
        Self {
            id,
            origin_id: None,
            geometry,
            style,
            author,
            timestamp: now_millis(),
        }
    }

    /// Build a shape with a freshly generated id for its kind.
    pub fn create(geometry: Geometry, style: ShapeStyle, author: UserId) -> Self {
        let id = ShapeId::generate(geometry.kind().id_tag());
        Self::new(id, geometry, style, author)
    }

    /// Remember the id this shape carried on the peer that drew it.
    pub fn with_origin(mut self, origin_id: Option<ShapeId>) -> Self {
        self.origin_id = origin_id;
        self
    }

    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn id(&self) -> &ShapeId {
        &self.id
    }

    pub fn origin_id(&self) -> Option<&ShapeId> {
        self.origin_id.as_ref()
    }

    /// The id peers know this shape by.
    pub fn wire_id(&self) -> &ShapeId {
        self.origin_id.as_ref().unwrap_or(&self.id)
    }

    /// Whether `id` names this shape, either locally or by its origin id.
    pub fn answers_to(&self, id: &ShapeId) -> bool {
        &self.id == id || self.origin_id.as_ref() == Some(id)
    }

    pub fn kind(&self) -> ShapeKind {
        self.geometry.kind()
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn bounds(&self) -> Rect {
        self.geometry.bounds()
    }

    pub fn to_path(&self) -> BezPath {
        self.geometry.to_path()
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.geometry.translate(delta);
    }

    /// Append a sample to a freehand stroke. Returns false for other kinds.
    pub fn push_point(&mut self, point: Point) -> bool {
        match &mut self.geometry {
            Geometry::Freehand(freehand) => {
                freehand.push(point);
                true
            }
            _ => false,
        }
    }

    /// Copy this shape under a new id, shifted by `offset` and owned by `author`.
    pub fn duplicate(&self, offset: Vec2, author: &UserId) -> Shape {
        let mut geometry = self.geometry.clone();
        geometry.translate(offset);
        Shape::create(geometry, self.style.clone(), author.clone())
    }
}
