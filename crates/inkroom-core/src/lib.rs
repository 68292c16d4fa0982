//! InkRoom Core Library
//!
//! Platform-agnostic shape model, view transform, tools and room sync for the
//! InkRoom shared canvas. Rendering backends plug in through [`Surface`].

pub mod geometry;
pub mod input;
pub mod seed;
pub mod selection;
pub mod session;
pub mod shapes;
pub mod store;
pub mod surface;
pub mod sync;
pub mod tools;
pub mod view;

pub use input::{Command, KeyPress, Modifiers, MouseButton, PointerEvent, ShortcutRegistry};
pub use seed::{SeedRecord, load_seed, parse_seed};
pub use selection::{Selection, SelectionManager};
pub use session::{RoomSession, SessionConfig, SessionError, SessionHooks, SessionResult};
pub use shapes::{Geometry, SerializableColor, Shape, ShapeId, ShapeKind, ShapeStyle, UserId};
pub use store::{ShapeStore, StoreError};
pub use surface::{Frame, HeadlessSurface, Surface, SurfaceError};
#[cfg(not(target_arch = "wasm32"))]
pub use sync::{ConnectionState, WebSocketChannel};
pub use sync::{Channel, MemoryChannel, SyncAdapter, SyncError};
pub use tools::{Preview, ToolKind, ToolManager, ToolState};
pub use view::ViewTransform;
