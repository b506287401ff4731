//! Configuration types
//!
//! Board-agnostic configuration for the scanner: servo ranges, motion
//! timing, sensor wiring and calibration, and scan defaults. Parsed at boot
//! from the embedded TOML file; optionally packed as postcard binary data.

pub mod calibration;
pub mod hardware;
pub mod toml;

pub use calibration::SensorCalibration;
pub use hardware::*;
pub use toml::{parse_config, ParseError, ParseErrorKind};

/// Configuration errors
///
/// All of these are fatal for the operation that raised them: nothing is
/// retried or patched up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Path kind name not recognised
    UnknownPathKind,
    /// Step not positive, or extent negative or not finite
    InvalidGeometry,
    /// Scan would visit more positions than a path can hold
    PathTooLong,
    /// Config file could not be parsed
    Parse(ParseError),
    /// Binary config could not be packed or unpacked
    Encoding,
}

impl From<ParseError> for ConfigError {
    fn from(e: ParseError) -> Self {
        ConfigError::Parse(e)
    }
}

/// Pack a configuration into `buf` as postcard binary data
///
/// Returns the used prefix of `buf`.
#[cfg(feature = "postcard")]
pub fn encode<'a>(config: &ScannerConfig, buf: &'a mut [u8]) -> Result<&'a mut [u8], ConfigError> {
    postcard::to_slice(config, buf).map_err(|_| ConfigError::Encoding)
}

/// Unpack a configuration written by [`encode`]
#[cfg(feature = "postcard")]
pub fn decode(bytes: &[u8]) -> Result<ScannerConfig, ConfigError> {
    postcard::from_bytes(bytes).map_err(|_| ConfigError::Encoding)
}

#[cfg(all(test, feature = "postcard"))]
mod tests {
    use super::*;

    #[test]
    fn test_binary_config_survives_packing() {
        let mut config = ScannerConfig::default();
        config.motion.pixel_move_ms = 350;
        config.scan.step_xy_deg = (2.5, 2.5);

        let mut buf = [0u8; 256];
        let used = encode(&config, &mut buf).unwrap().len();
        let decoded = decode(&buf[..used]).unwrap();

        assert_eq!(decoded, config);
    }

    #[test]
    fn test_truncated_binary_config_is_rejected() {
        let config = ScannerConfig::default();
        let mut buf = [0u8; 256];
        let used = encode(&config, &mut buf).unwrap().len();
        assert_eq!(decode(&buf[..used / 2]), Err(ConfigError::Encoding));
    }
}
