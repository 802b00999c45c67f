pub mod errors;
pub mod events;
pub mod id;
pub mod types;

pub use errors::{ConfigError, DockError, PlatformError};
pub use events::{EventBus, WindowEvent};
pub use id::{new_id, SessionId};
pub use types::{CommandOrigin, Geometry, TabInfo, WindowId, WindowInfo, WindowKind, WindowState};

pub type Result<T> = std::result::Result<T, DockError>;
