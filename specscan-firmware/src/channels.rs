//! Inter-task signals
//!
//! The scan task and the motion tick task share the controller through a
//! critical-section mutex; these signals carry the hand-offs between them.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

/// A move was started; the tick task should run until motion is idle
pub static ARM: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// The controller reported idle after the last armed move
pub static SETTLED: Signal<CriticalSectionRawMutex, ()> = Signal::new();
