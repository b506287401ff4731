//! Scan task
//!
//! Runs one scan with the configured defaults: set up, then advance one
//! position at a time until the path is exhausted. A position that keeps
//! failing is reported and skipped, leaving a gap in the log's pixel
//! sequence, and the scan carries on with the next one.

use defmt::*;
use embassy_time::Delay;

use specscan_core::config::{ScanDefaults, SensorConfig};
use specscan_core::log::{DateTime, MirroredStore};
use specscan_core::scan::{ScanOrchestrator, ScanRequest};
use specscan_drivers::sensor::C12880ma;
use specscan_hal_rp2040::{EmbassyClock, PushPull, UartRecordStore, VideoInput};

use crate::mirror::DefmtMirror;
use crate::motion::SharedMotion;

/// Attempts per position before it is skipped
pub const MAX_PIXEL_RETRIES: u8 = 3;

/// Spectrometer as wired on the board
pub type BoardSensor =
    C12880ma<PushPull<'static>, PushPull<'static>, VideoInput<'static>, Delay, EmbassyClock>;

/// Log destination: UART stream mirrored to the probe
pub type BoardStore = MirroredStore<UartRecordStore<'static>, DefmtMirror>;

/// Orchestrator for the board
pub type Scanner = ScanOrchestrator<SharedMotion, BoardSensor, BoardStore>;

/// Scan task - records one full scan, then parks the servos
#[embassy_executor::task]
pub async fn scan_task(mut scanner: Scanner, defaults: ScanDefaults, sensor: SensorConfig) {
    info!("Scan task started");

    let request = ScanRequest {
        log_name: defaults.log_name.as_str(),
        overwrite: defaults.overwrite,
        extent_xy_deg: defaults.extent_xy_deg,
        step_xy_deg: defaults.step_xy_deg,
        integration_s: sensor.integration_s,
        path: defaults.path,
        // No RTC on the board
        captured_at: DateTime::default(),
    };

    match scanner.setup(&request).await {
        Ok(()) => info!(
            "Scanning {} positions, {} path, {} s exposure",
            scanner.pixel_count(),
            request.path.as_str(),
            request.integration_s
        ),
        Err(e) => {
            error!("Scan setup failed: {}", e);
            scanner.motion_mut().turn_all_off(false);
            return;
        }
    }

    let mut failures = 0u8;
    loop {
        match scanner.advance().await {
            Ok(true) => {
                failures = 0;
                debug!("Pixel {}/{}", scanner.cursor(), scanner.pixel_count());
            }
            Ok(false) => {
                info!(
                    "Scan complete: {} pixels recorded",
                    scanner.cursor().saturating_sub(scanner.skipped())
                );
                break;
            }
            Err(e) => {
                failures += 1;
                warn!(
                    "Position {} failed ({}), attempt {}/{}",
                    scanner.cursor(),
                    e,
                    failures,
                    MAX_PIXEL_RETRIES
                );
                if failures >= MAX_PIXEL_RETRIES {
                    let index = scanner.cursor();
                    if let Some(point) = scanner.skip() {
                        error!(
                            "Pixel {} at ({}, {}) deg not recorded: {}",
                            index, point.x, point.y, e
                        );
                    }
                    failures = 0;
                }
            }
        }
    }

    scanner.motion_mut().turn_all_off(false);
    if scanner.skipped() > 0 {
        warn!("{} positions skipped", scanner.skipped());
    }
    info!("Servos parked");
}
