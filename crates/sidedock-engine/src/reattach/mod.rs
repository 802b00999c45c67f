//! Rediscovering docked windows after a restart.

pub mod discovery;
mod startup;

pub use discovery::{
    find_sidebar_windows, match_anchor, wait_for_collaborator, AnchorMatch, Classification,
    DiscoveredSatellite, Discovery, DiscoveryOptions,
};
pub use startup::{ReattachReport, StartupKind};
