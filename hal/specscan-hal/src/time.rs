//! Time source abstraction

/// Free-running monotonic clock with microsecond resolution
pub trait Monotonic {
    /// Microseconds since an arbitrary, fixed origin
    fn now_us(&self) -> u64;

    /// Microseconds elapsed since `start` (saturating)
    fn elapsed_us(&self, start: u64) -> u64 {
        self.now_us().saturating_sub(start)
    }
}
