//! Scenarios played against an in-memory host.

use std::sync::Arc;
use std::time::Duration;

use sidedock_common::{DockError, Geometry, WindowId, WindowKind};
use sidedock_config::SharedConfig;
use sidedock_engine::platform::VirtualHost;
use sidedock_engine::{DockingEngine, HostCapabilities};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::cli::RunArgs;

const ANCHOR_WIDTH: i32 = 900;
const ANCHOR_HEIGHT: i32 = 640;
const DRIFT_STEP: i32 = 40;

fn anchor_geometry(index: usize) -> Geometry {
    let offset = i32::try_from(index).unwrap_or(0);
    Geometry::new(400 + offset * 60, 80 + offset * 40, ANCHOR_WIDTH, ANCHOR_HEIGHT)
}

/// Open anchors, dock a satellite to each and let the engine keep them
/// together until the duration elapses or the user interrupts.
pub async fn run(config: SharedConfig, args: &RunArgs) -> Result<(), DockError> {
    let host = Arc::new(VirtualHost::new());
    let engine = DockingEngine::new(HostCapabilities::from_virtual_host(host.clone()), config);
    engine.start().await;

    let anchors: Vec<WindowId> = (0..args.anchors)
        .map(|i| host.open_window(WindowKind::Normal, anchor_geometry(i), &["about:newtab"]))
        .collect();
    for anchor in &anchors {
        let satellite = engine.open_docked_window(*anchor).await?;
        info!(%anchor, satellite = %satellite.id, "docked satellite opened");
    }

    let deadline = tokio::time::sleep_until(Instant::now() + Duration::from_secs(args.duration_secs));
    tokio::pin!(deadline);
    let mut drift = tokio::time::interval(Duration::from_secs(1));
    drift.tick().await;
    let mut step: i32 = 0;

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
            _ = drift.tick(), if args.drift => {
                step += 1;
                let dx = if step % 2 == 0 { -DRIFT_STEP } else { DRIFT_STEP };
                for anchor in &anchors {
                    if let Some(window) = host.window(*anchor) {
                        let mut geometry = window.geometry;
                        geometry.left += dx;
                        geometry.top += dx / 4;
                        host.move_window(*anchor, geometry);
                    }
                }
                debug!(step, dx, polling = ?engine.polling_state(), "anchors drifted");
            }
        }
    }

    engine.shutdown();
    for record in engine.tracked_windows() {
        let satellite = host.window(record.satellite_id).map(|w| w.geometry);
        let anchor = host.window(record.anchor_id).map(|w| w.geometry);
        info!(
            satellite = %record.satellite_id,
            anchor = %record.anchor_id,
            satellite_geometry = ?satellite,
            anchor_geometry = ?anchor,
            "final geometry"
        );
    }
    info!(commands = host.commands().len(), "simulation finished");
    Ok(())
}

/// Seed a host with one docked pair and an unrelated window, then print
/// how discovery classifies them.
pub async fn discover(config: SharedConfig) -> Result<(), DockError> {
    let host = Arc::new(VirtualHost::new());
    let capabilities = HostCapabilities::from_virtual_host(host.clone());

    let anchor = host.open_window(WindowKind::Normal, anchor_geometry(0), &["about:newtab"]);
    host.open_window(
        WindowKind::Normal,
        Geometry::new(1500, 80, 800, 600),
        &["https://example.com/", "https://example.org/"],
    );
    let seeding = DockingEngine::new(capabilities.clone(), config.clone());
    seeding.open_docked_window(anchor).await?;
    seeding.shutdown();
    drop(seeding);

    let engine = DockingEngine::new(capabilities, config);
    let discovery = engine.find_sidebar_windows().await?;
    println!("{}", serde_json::to_string_pretty(&discovery)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchors_are_staggered() {
        assert_eq!(anchor_geometry(0), Geometry::new(400, 80, 900, 640));
        assert_eq!(anchor_geometry(2), Geometry::new(520, 160, 900, 640));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn run_completes_with_drifting_anchors() {
        let config = SharedConfig::default();
        let args = RunArgs {
            anchors: 2,
            duration_secs: 3,
            drift: true,
        };
        run(config, &args).await.unwrap();
    }
}
