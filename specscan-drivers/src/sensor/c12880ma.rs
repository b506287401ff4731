//! Hamamatsu C12880MA micro-spectrometer
//!
//! The sensor has no frame buffer: pixels appear on the analog video line
//! one per clock cycle and must be sampled between edges. Everything is
//! bit-banged on two outputs (CLK, ST) with a blocking microsecond delay:
//!
//! ```text
//! ST   ___/‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾\_________________________________________
//! CLK  _|‾|_|‾|_|‾|_|‾|_ ... _|‾|_ ...48... _ ...40... _|‾|_|‾|_ ...288...
//!      prime  3 start   T0 integrate  T1      T2        T3 sample+pulse  T4
//! ```
//!
//! Integration runs from T0 until the 48th pulse after ST falls, so the
//! timed part of the exposure is shortened by the measured duration of a
//! 48-pulse burst (see [`C12880ma::calibrate_min_integration_time`]).
//!
//! A read is synchronous and never yields. On a cooperative executor this
//! keeps every other task, including the motion tick, off the core until
//! the frame is complete.

use embedded_hal::delay::DelayNs;
use specscan_core::config::SensorCalibration;
use specscan_core::spectrum::{AcquisitionTimings, Samples, SpectralFrame, WavelengthTable, MAX_CHANNELS};
use specscan_core::traits::SpectralSensor;
use specscan_hal::{AnalogInput, Monotonic, OutputPin};

/// C12880MA driver
pub struct C12880ma<CLK, ST, V, D, T> {
    clk: CLK,
    st: ST,
    video: V,
    delay: D,
    clock: T,
    calibration: SensorCalibration,
    integration_s: f32,
    min_integration_us: u64,
}

impl<CLK, ST, V, D, T> C12880ma<CLK, ST, V, D, T>
where
    CLK: OutputPin,
    ST: OutputPin,
    V: AnalogInput,
    D: DelayNs,
    T: Monotonic,
{
    /// Create a driver; call [`C12880ma::begin`] before the first read
    pub fn new(clk: CLK, st: ST, video: V, delay: D, clock: T, calibration: SensorCalibration) -> Self {
        Self {
            clk,
            st,
            video,
            delay,
            clock,
            calibration,
            integration_s: 0.0,
            min_integration_us: 0,
        }
    }

    /// Drive both lines low and measure the protocol overhead
    pub fn begin(&mut self) {
        self.clk.set_low();
        self.st.set_low();
        self.calibrate_min_integration_time();
    }

    /// Time one integration-end burst
    ///
    /// The result is the shortest exposure the sensor can deliver and is
    /// subtracted from every requested exposure. Returns microseconds.
    pub fn calibrate_min_integration_time(&mut self) -> u64 {
        let start = self.clock.now_us();
        self.pulse_clock(self.calibration.integration_end_pulses);
        self.min_integration_us = self.clock.elapsed_us(start);
        self.min_integration_us
    }

    /// Measured protocol overhead in microseconds
    pub fn min_integration_us(&self) -> u64 {
        self.min_integration_us
    }

    /// Calibration in use
    pub fn calibration(&self) -> &SensorCalibration {
        &self.calibration
    }

    /// Timed part of the exposure
    fn timed_integration_us(&self) -> u64 {
        let requested = (self.integration_s as f64 * 1_000_000.0) as u64;
        requested.saturating_sub(self.min_integration_us)
    }

    /// Full clock cycles, low-high-low
    fn pulse_clock(&mut self, count: u32) {
        let half = self.calibration.clock_half_period_us;
        for _ in 0..count {
            self.clk.set_high();
            self.delay.delay_us(half);
            self.clk.set_low();
            self.delay.delay_us(half);
        }
    }

    /// Keep clocking until `duration_us` has elapsed
    fn pulse_clock_for(&mut self, duration_us: u64) {
        let start = self.clock.now_us();
        while self.clock.elapsed_us(start) < duration_us {
            self.pulse_clock(1);
        }
    }

    /// Acquire one frame
    pub fn read_frame(&mut self) -> SpectralFrame {
        let c = self.calibration;
        let channels = c.channels.min(MAX_CHANNELS);
        let mut samples = Samples::new();
        let mut faults = 0u16;

        // Prime with ST low
        self.pulse_clock(c.priming_pulses);

        // Start pulse; integration begins
        self.st.set_high();
        self.delay.delay_us(c.clock_half_period_us);
        self.pulse_clock(c.start_pulses);
        let integration_start_us = self.clock.now_us();

        self.pulse_clock_for(self.timed_integration_us());

        // Stop pulse; integration ends after the next burst
        self.st.set_low();
        let start_low_us = self.clock.now_us();
        self.pulse_clock(c.integration_end_pulses);
        let integration_end_us = self.clock.now_us();

        self.pulse_clock(c.readout_lead_pulses);
        let readout_start_us = self.clock.now_us();

        for _ in 0..channels {
            let sample = match self.video.read() {
                Ok(code) => code,
                Err(_) => {
                    faults = faults.saturating_add(1);
                    0
                }
            };
            // Capacity checked above
            let _ = samples.push(sample);
            self.pulse_clock(1);
        }
        let readout_end_us = self.clock.now_us();

        SpectralFrame::new(
            samples,
            AcquisitionTimings {
                integration_start_us,
                start_low_us,
                integration_end_us,
                readout_start_us,
                readout_end_us,
            },
            faults,
        )
    }
}

impl<CLK, ST, V, D, T> SpectralSensor for C12880ma<CLK, ST, V, D, T>
where
    CLK: OutputPin,
    ST: OutputPin,
    V: AnalogInput,
    D: DelayNs,
    T: Monotonic,
{
    fn channel_count(&self) -> usize {
        self.calibration.channels.min(MAX_CHANNELS)
    }

    fn set_integration_time_s(&mut self, seconds: f32) {
        self.integration_s = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    }

    fn integration_time_s(&self) -> f32 {
        self.integration_s
    }

    fn read(&mut self) -> SpectralFrame {
        self.read_frame()
    }

    fn wavelengths(&self) -> WavelengthTable {
        WavelengthTable::from_calibration(&self.calibration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;
    use specscan_hal::AdcError;
    use std::vec::Vec;

    /// Shared record of everything the driver did to the bus
    #[derive(Default)]
    struct Bus {
        now_ns: u64,
        clk_high: bool,
        st_high: bool,
        /// Rising clock edges in each ST phase: before the first rise,
        /// while high, after the fall
        edges_before_st: u32,
        edges_st_high: u32,
        edges_after_st: u32,
        st_rises: u32,
        /// `edges_after_st` at each sample
        sample_edges: Vec<u32>,
        /// Conversions that fail, by sample index
        failing: Vec<usize>,
    }

    struct Clk<'a>(&'a RefCell<Bus>);
    struct St<'a>(&'a RefCell<Bus>);
    struct Video<'a>(&'a RefCell<Bus>);
    struct Delay<'a>(&'a RefCell<Bus>);
    struct Clock<'a>(&'a RefCell<Bus>);

    impl OutputPin for Clk<'_> {
        fn set_high(&mut self) {
            let mut bus = self.0.borrow_mut();
            if !bus.clk_high {
                if bus.st_high {
                    bus.edges_st_high += 1;
                } else if bus.st_rises == 0 {
                    bus.edges_before_st += 1;
                } else {
                    bus.edges_after_st += 1;
                }
            }
            bus.clk_high = true;
        }

        fn set_low(&mut self) {
            self.0.borrow_mut().clk_high = false;
        }

        fn is_set_high(&self) -> bool {
            self.0.borrow().clk_high
        }
    }

    impl OutputPin for St<'_> {
        fn set_high(&mut self) {
            let mut bus = self.0.borrow_mut();
            if !bus.st_high {
                bus.st_rises += 1;
            }
            bus.st_high = true;
        }

        fn set_low(&mut self) {
            self.0.borrow_mut().st_high = false;
        }

        fn is_set_high(&self) -> bool {
            self.0.borrow().st_high
        }
    }

    impl AnalogInput for Video<'_> {
        fn resolution_bits(&self) -> u8 {
            12
        }

        fn read(&mut self) -> Result<u16, AdcError> {
            let mut bus = self.0.borrow_mut();
            let index = bus.sample_edges.len();
            let edges = bus.edges_after_st;
            bus.sample_edges.push(edges);
            if bus.failing.contains(&index) {
                Err(AdcError::Conversion)
            } else {
                Ok(1000 + index as u16)
            }
        }
    }

    impl DelayNs for Delay<'_> {
        fn delay_ns(&mut self, ns: u32) {
            self.0.borrow_mut().now_ns += ns as u64;
        }
    }

    impl Monotonic for Clock<'_> {
        fn now_us(&self) -> u64 {
            self.0.borrow().now_ns / 1000
        }
    }

    type Sensor<'a> = C12880ma<Clk<'a>, St<'a>, Video<'a>, Delay<'a>, Clock<'a>>;

    fn sensor(bus: &RefCell<Bus>) -> Sensor<'_> {
        let mut sensor = C12880ma::new(
            Clk(bus),
            St(bus),
            Video(bus),
            Delay(bus),
            Clock(bus),
            SensorCalibration::C12880MA,
        );
        sensor.begin();
        sensor
    }

    /// Zero the edge counters after begin()
    fn reset_counts(bus: &RefCell<Bus>) {
        let mut bus = bus.borrow_mut();
        bus.edges_before_st = 0;
        bus.edges_st_high = 0;
        bus.edges_after_st = 0;
        bus.st_rises = 0;
    }

    #[test]
    fn test_begin_calibrates_overhead() {
        let bus = RefCell::new(Bus::default());
        let sensor = sensor(&bus);
        // 48 cycles of 2 x 1 us
        assert_eq!(sensor.min_integration_us(), 96);
        assert!(!bus.borrow().clk_high);
        assert!(!bus.borrow().st_high);
    }

    #[test]
    fn test_pulse_counts_per_phase() {
        let bus = RefCell::new(Bus::default());
        let mut sensor = sensor(&bus);
        reset_counts(&bus);
        sensor.set_integration_time_s(0.0);

        let frame = sensor.read();
        let bus = bus.borrow();

        assert_eq!(bus.edges_before_st, 1);
        assert_eq!(bus.edges_st_high, 3);
        assert_eq!(bus.st_rises, 1);
        // 48 + 40 before the first pixel, one per pixel after it
        assert_eq!(bus.sample_edges.len(), 288);
        assert_eq!(bus.sample_edges[0], 88);
        assert_eq!(bus.sample_edges[287], 88 + 287);
        assert_eq!(bus.edges_after_st, 88 + 288);
        assert_eq!(frame.len(), 288);
    }

    #[test]
    fn test_channel_count_independent_of_exposure() {
        for seconds in [0.0, 0.000_05, 0.002, -1.0, f32::NAN] {
            let bus = RefCell::new(Bus::default());
            let mut sensor = sensor(&bus);
            sensor.set_integration_time_s(seconds);
            let frame = sensor.read();
            assert_eq!(frame.len(), sensor.channel_count());
            assert_eq!(frame.len(), 288);
            assert!(frame.timings.is_ordered());
        }
    }

    #[test]
    fn test_integration_window() {
        let bus = RefCell::new(Bus::default());
        let mut sensor = sensor(&bus);
        sensor.set_integration_time_s(0.002);
        let frame = sensor.read();

        let t = frame.timings;
        let timed = t.start_low_us - t.integration_start_us;
        // 2000 us requested less the 96 us burst, in whole 2 us cycles
        assert!((1904..=1906).contains(&timed), "timed = {}", timed);
        assert_eq!(t.integration_end_us - t.start_low_us, 96);
        assert_eq!(t.readout_start_us - t.integration_end_us, 80);
        assert_eq!(t.readout_us(), 576);
        // Effective exposure is the requested one, to within a cycle
        assert!((2000..=2002).contains(&t.integration_us()));
    }

    #[test]
    fn test_zero_exposure_skips_timed_phase() {
        let bus = RefCell::new(Bus::default());
        let mut sensor = sensor(&bus);
        reset_counts(&bus);
        sensor.set_integration_time_s(0.0);
        let frame = sensor.read();

        assert_eq!(frame.timings.start_low_us, frame.timings.integration_start_us);
        assert_eq!(bus.borrow().edges_st_high, 3);
    }

    #[test]
    fn test_exposure_setter_clamps() {
        let bus = RefCell::new(Bus::default());
        let mut sensor = sensor(&bus);
        sensor.set_integration_time_s(-0.5);
        assert_eq!(sensor.integration_time_s(), 0.0);
        sensor.set_integration_time_s(f32::NAN);
        assert_eq!(sensor.integration_time_s(), 0.0);
        sensor.set_integration_time_s(0.25);
        assert_eq!(sensor.integration_time_s(), 0.25);
    }

    #[test]
    fn test_failed_conversions_recorded_as_zero() {
        let bus = RefCell::new(Bus::default());
        bus.borrow_mut().failing = vec![0, 100];
        let mut sensor = sensor(&bus);
        let frame = sensor.read();

        assert_eq!(frame.len(), 288);
        assert_eq!(frame.conversion_faults, 2);
        assert_eq!(frame.samples()[0], 0);
        assert_eq!(frame.samples()[1], 1001);
        assert_eq!(frame.samples()[100], 0);
    }

    #[test]
    fn test_wavelengths_cover_channels() {
        let bus = RefCell::new(Bus::default());
        let sensor = sensor(&bus);
        let table = sensor.wavelengths();
        assert_eq!(table.len(), 288);
        assert!(table.is_strictly_increasing());
    }
}
