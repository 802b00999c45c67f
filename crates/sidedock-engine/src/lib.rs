//! Docking simulation engine.
//!
//! Keeps satellite windows attached to the side of their anchor window on a
//! host that has no native docking, reacting to moves, resizes, focus
//! changes and window closes, and rediscovering docked pairs after restarts.

pub mod companion;
pub mod engine;
pub mod features;
pub mod layout;
pub mod platform;
pub mod reattach;
pub mod registry;
pub mod session;

pub use companion::{CompanionPage, CompanionUrls};
pub use engine::{CheckOptions, DockingEngine, PollingState};
pub use features::ActiveFeatures;
pub use layout::DockLayout;
pub use platform::{HostCapabilities, TabTreeProvider, WindowService, WindowValueStore};
pub use reattach::{Discovery, ReattachReport, StartupKind};
pub use registry::{TrackedWindow, WindowRegistry};
pub use session::{SessionIdentity, SessionIdentityStore};
