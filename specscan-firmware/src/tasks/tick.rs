//! Motion tick task
//!
//! Sleeps until a move is armed, then steps the controller once per tick
//! period until every axis has reached its target.

use defmt::*;
use embassy_time::{Duration, Ticker};

use specscan_core::motion::MotionState;

use crate::channels::{ARM, SETTLED};
use crate::motion::SharedController;

/// Tick task - drives trajectory steps while motion is in progress
#[embassy_executor::task]
pub async fn tick_task(controller: &'static SharedController, tick_period_ms: u32) {
    info!("Tick task started ({} ms period)", tick_period_ms);

    loop {
        ARM.wait().await;

        let mut ticker = Ticker::every(Duration::from_millis(tick_period_ms.max(1) as u64));
        loop {
            ticker.next().await;

            let state = controller.lock(|c| c.borrow_mut().tick());
            if state == MotionState::Idle {
                SETTLED.signal(());
                break;
            }
        }
    }
}
