//! Flat shape record exchanged with peers and loaded from persisted seeds.

use super::{SyncError, SyncResult};
use crate::shapes::{
    Ellipse, Freehand, Geometry, Line, Rectangle, SerializableColor, Shape, ShapeId, ShapeStyle,
};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Fill value meaning "no fill".
pub const TRANSPARENT: &str = "transparent";

/// An id that may arrive as a JSON string or number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Text(String),
    Number(serde_json::Number),
}

impl WireId {
    pub fn to_shape_id(&self) -> ShapeId {
        match self {
            WireId::Text(s) => ShapeId::new(s.clone()),
            WireId::Number(n) => ShapeId::new(n.to_string()),
        }
    }
}

impl From<&ShapeId> for WireId {
    fn from(id: &ShapeId) -> Self {
        WireId::Text(id.as_str().to_string())
    }
}

/// Shape kind tag on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireKind {
    Rectangle,
    Ellipse,
    Line,
    #[serde(alias = "freehand")]
    Pencil,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WirePoint {
    pub x: f64,
    pub y: f64,
}

impl From<Point> for WirePoint {
    fn from(p: Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<WirePoint> for Point {
    fn from(p: WirePoint) -> Self {
        Point::new(p.x, p.y)
    }
}

fn default_stroke_width() -> f64 {
    2.0
}

fn default_stroke_color() -> String {
    "#000000".to_string()
}

fn default_fill_color() -> String {
    TRANSPARENT.to_string()
}

/// Peer-visible layout of a shape.
///
/// Ellipses put their center in `x`/`y` and radii in `width`/`height`.
/// Lines put their end point in `width`/`height`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<WireId>,
    #[serde(rename = "type")]
    pub kind: WireKind,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<WirePoint>>,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
    #[serde(default = "default_stroke_color")]
    pub stroke_color: String,
    #[serde(default = "default_fill_color")]
    pub fill_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

/// `{ "shape": ... }` envelope carried in draw payloads and seed data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeEnvelope {
    pub shape: ShapeRecord,
}

impl ShapeRecord {
    /// Flatten a shape into its wire layout.
    pub fn from_shape(shape: &Shape) -> Self {
        let (kind, x, y, width, height, points) = match shape.geometry() {
            Geometry::Rectangle(r) => (
                WireKind::Rectangle,
                r.origin.x,
                r.origin.y,
                Some(r.width),
                Some(r.height),
                None,
            ),
            Geometry::Ellipse(e) => (
                WireKind::Ellipse,
                e.center.x,
                e.center.y,
                Some(e.radius_x),
                Some(e.radius_y),
                None,
            ),
            Geometry::Line(l) => (
                WireKind::Line,
                l.start.x,
                l.start.y,
                Some(l.end.x),
                Some(l.end.y),
                None,
            ),
            Geometry::Freehand(f) => {
                let start = f.start();
                (
                    WireKind::Pencil,
                    start.x,
                    start.y,
                    None,
                    None,
                    Some(f.points.iter().copied().map(WirePoint::from).collect()),
                )
            }
        };

        Self {
            id: Some(WireId::from(shape.wire_id())),
            kind,
            x,
            y,
            width,
            height,
            points,
            stroke_width: f64::from(shape.style.stroke_width),
            stroke_color: shape.style.stroke_color.to_hex(),
            fill_color: shape
                .style
                .fill_color
                .map(|c| c.to_hex())
                .unwrap_or_else(default_fill_color),
            user_id: Some(shape.author.to_string()),
            timestamp: Some(shape.timestamp),
        }
    }

    /// Rebuild kind-specific geometry, rejecting non-finite coordinates.
    pub fn geometry(&self) -> SyncResult<Geometry> {
        let finite = |v: f64, field: &'static str| {
            if v.is_finite() {
                Ok(v)
            } else {
                Err(SyncError::InvalidField(field))
            }
        };
        let x = finite(self.x, "x")?;
        let y = finite(self.y, "y")?;
        let width = finite(self.width.unwrap_or(0.0), "width")?;
        let height = finite(self.height.unwrap_or(0.0), "height")?;

        let geometry = match self.kind {
            WireKind::Rectangle => Geometry::Rectangle(Rectangle::new(Point::new(x, y), width, height)),
            WireKind::Ellipse => Geometry::Ellipse(Ellipse::new(Point::new(x, y), width, height)),
            WireKind::Line => Geometry::Line(Line::new(Point::new(x, y), Point::new(width, height))),
            WireKind::Pencil => {
                let points = self
                    .points
                    .as_ref()
                    .ok_or(SyncError::MissingField("points"))?
                    .iter()
                    .map(|p| {
                        Ok(Point::new(finite(p.x, "points")?, finite(p.y, "points")?))
                    })
                    .collect::<SyncResult<Vec<_>>>()?;
                if points.is_empty() {
                    return Err(SyncError::InvalidField("points"));
                }
                Geometry::Freehand(Freehand::from_points(points))
            }
        };
        Ok(geometry)
    }

    /// Style with clamped width; unparseable colors fall back to defaults.
    pub fn style(&self) -> ShapeStyle {
        let stroke_color = SerializableColor::from_hex(&self.stroke_color).unwrap_or_else(|| {
            log::debug!("Unrecognized stroke color {:?}, using black", self.stroke_color);
            SerializableColor::black()
        });
        let fill_color = if self.fill_color.eq_ignore_ascii_case(TRANSPARENT) {
            None
        } else {
            SerializableColor::from_hex(&self.fill_color)
        };
        ShapeStyle {
            stroke_width: ShapeStyle::clamp_stroke_width(self.stroke_width),
            stroke_color,
            fill_color,
        }
    }
}
