//! Specscan - Pan/Tilt Spectral Scanner Firmware
//!
//! Main firmware binary for an RP2040 board carrying a C12880MA
//! micro-spectrometer on a pan/tilt pair of hobby servos. The head sweeps
//! the configured field and streams one spectral frame per position to the
//! log UART, mirrored to the debug probe.

#![no_std]
#![no_main]

use core::cell::RefCell;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel, Config as AdcConfig};
use embassy_rp::gpio::{Level, Output, Pull};
use embassy_rp::pwm::Pwm;
use embassy_rp::uart::{Config as UartConfig, UartTx};
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::Delay;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use specscan_core::config::{self as scanner_config, parse_config, ScannerConfig, SensorCalibration};
use specscan_core::log::MirroredStore;
use specscan_core::motion::MotionController;
use specscan_core::scan::{ScanOrchestrator, SLOT_PAN, SLOT_TILT};
use specscan_drivers::sensor::C12880ma;
use specscan_drivers::servo::PwmServo;
use specscan_hal_rp2040::{
    servo_config, AdcChannel, EmbassyClock, GpioAllocator, PushPull, ServoOutput,
    UartRecordStore, VideoInput,
};

use crate::mirror::DefmtMirror;
use crate::motion::{Controller, SharedController, SharedMotion};

mod channels;
mod mirror;
mod motion;
mod tasks;

/// Embedded configuration (compiled into firmware)
/// Edit scanner.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../scanner.toml");

/// Board wiring: pan servo (PWM slice 0 A)
const BOARD_PAN_PIN: u8 = 16;
/// Board wiring: tilt servo (PWM slice 0 B)
const BOARD_TILT_PIN: u8 = 17;
/// Board wiring: sensor clock
const BOARD_CLK_PIN: u8 = 2;
/// Board wiring: sensor start pulse
const BOARD_ST_PIN: u8 = 3;
/// Board wiring: sensor video (ADC0)
const BOARD_VIDEO_PIN: u8 = 26;
/// Board wiring: log UART TX (UART0)
const BOARD_LOG_TX_PIN: u8 = 0;

/// Log UART baud rate
const LOG_BAUD: u32 = 115_200;

static CONTROLLER: StaticCell<SharedController> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Specscan firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config();
    check_wiring(&config);

    // Servos share PWM slice 0; the counter runs at 1 MHz
    let pwm = Pwm::new_output_ab(
        p.PWM_SLICE0,
        p.PIN_16,
        p.PIN_17,
        servo_config(config.pan.pwm_hz),
    );
    let (Some(pan_out), Some(tilt_out)) = pwm.split() else {
        error!("Servo PWM outputs unavailable");
        return;
    };
    if config.tilt.pwm_hz != config.pan.pwm_hz {
        warn!(
            "Tilt pwm_hz {} ignored, slice shared with pan at {}",
            config.tilt.pwm_hz, config.pan.pwm_hz
        );
    }
    let pan = PwmServo::from_config(ServoOutput::new(pan_out, config.pan.pwm_hz), &config.pan);
    let tilt = PwmServo::from_config(ServoOutput::new(tilt_out, config.pan.pwm_hz), &config.tilt);

    let controller = match build_controller(&config, pan, tilt) {
        Some(c) => c,
        None => {
            error!("Motion controller setup failed");
            return;
        }
    };
    let controller: &'static SharedController =
        CONTROLLER.init(Mutex::new(RefCell::new(controller)));
    info!("Motion controller initialized");

    // Spectrometer: bit-banged CLK/ST, blocking ADC on the video line
    let clk = PushPull::new(Output::new(p.PIN_2, Level::Low));
    let st = PushPull::new(Output::new(p.PIN_3, Level::Low));
    let adc = Adc::new_blocking(p.ADC, AdcConfig::default());
    let video = VideoInput::new(adc, Channel::new_pin(p.PIN_26, Pull::None));

    let mut sensor = C12880ma::new(
        clk,
        st,
        video,
        Delay,
        EmbassyClock,
        SensorCalibration::C12880MA,
    );
    sensor.begin();
    info!(
        "Spectrometer initialized, {} us readout overhead",
        sensor.min_integration_us()
    );

    // Log stream
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = LOG_BAUD;
    let log_tx = UartTx::new_blocking(p.UART0, p.PIN_0, uart_config);
    let store = MirroredStore::new(UartRecordStore::new(log_tx), DefmtMirror::new());
    info!("Log UART initialized at {} baud", LOG_BAUD);

    let scanner = ScanOrchestrator::new(
        SharedMotion::new(controller),
        sensor,
        store,
        config.motion,
    );

    // Spawn tasks
    spawner
        .spawn(tasks::tick_task(controller, config.motion.tick_period_ms))
        .unwrap();
    spawner
        .spawn(tasks::scan_task(scanner, config.scan.clone(), config.sensor))
        .unwrap();

    info!("All tasks spawned, firmware running");
}

/// Parse the embedded configuration
///
/// Falls back to the built-in defaults if scanner.toml does not parse.
/// This should only happen during development, since build.rs validates
/// the same file.
fn load_config() -> ScannerConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Parsed embedded configuration successfully");
            log_packed(&config);
            config
        }
        Err(e) => {
            error!("Failed to parse embedded config: {}", e);
            error!("Using built-in defaults");
            ScannerConfig::default()
        }
    }
}

/// Dump the configuration in postcard form for host-side tooling
fn log_packed(config: &ScannerConfig) {
    let mut buf = [0u8; 256];
    match scanner_config::encode(config, &mut buf) {
        Ok(packed) => {
            let packed: &[u8] = packed;
            debug!("Config ({} bytes): {=[u8]:x}", packed.len(), packed)
        }
        Err(e) => warn!("Config could not be packed: {}", e),
    }
}

/// Compare the configured pins with the board wiring
///
/// Pins are fixed by the board; a config that names others is reported,
/// not obeyed.
fn check_wiring(config: &ScannerConfig) {
    let wiring = [
        ("servo.pan", config.pan.pin, BOARD_PAN_PIN),
        ("servo.tilt", config.tilt.pin, BOARD_TILT_PIN),
        ("sensor.clk", config.sensor.clk_pin, BOARD_CLK_PIN),
        ("sensor.st", config.sensor.st_pin, BOARD_ST_PIN),
        ("sensor.video", config.sensor.video_pin, BOARD_VIDEO_PIN),
    ];
    for (name, configured, wired) in wiring {
        if configured != wired {
            warn!("{} configured on gpio{}, board uses gpio{}", name, configured, wired);
        }
    }

    if AdcChannel::from_gpio(config.sensor.video_pin).is_none() {
        warn!("sensor.video gpio{} has no ADC channel", config.sensor.video_pin);
    }

    let mut pins = GpioAllocator::new();
    let claimed = pins.allocate_all(&[
        config.pan.pin,
        config.tilt.pin,
        config.sensor.clk_pin,
        config.sensor.st_pin,
        config.sensor.video_pin,
        BOARD_LOG_TX_PIN,
    ]);
    if let Err((pin, e)) = claimed {
        warn!("Configured pins conflict at gpio{}: {}", pin, e);
    }
}

/// Register both servos with their roles
fn build_controller(
    config: &ScannerConfig,
    pan: motion::BoardServo,
    tilt: motion::BoardServo,
) -> Option<Controller> {
    let mut controller = MotionController::new(config.motion.tick_period_ms);
    controller.add_axis(SLOT_PAN, pan).ok()?;
    controller.add_axis(SLOT_TILT, tilt).ok()?;
    controller.set_axis_role(SLOT_PAN, config.pan.role).ok()?;
    controller.set_axis_role(SLOT_TILT, config.tilt.role).ok()?;
    Some(controller)
}
