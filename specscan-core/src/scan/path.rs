//! Scan path generation
//!
//! A path is the ordered list of angular offsets (degrees, relative to the
//! origin) the head visits. The number of positions depends only on the
//! extent and step; the path kind decides the order.

use core::str::FromStr;

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Maximum positions in one scan
pub const MAX_PATH_POINTS: usize = 4096;

/// Tolerance for extent/step ratios that land just under an integer
const RATIO_EPSILON: f32 = 1e-4;

/// Order in which scan positions are visited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PathKind {
    /// Rectangular spiral outward from the origin
    #[default]
    Spiral,
    /// Centred grid, rows top to bottom, alternating direction
    Raster,
}

impl PathKind {
    /// Name used in config files and scan logs
    pub fn as_str(&self) -> &'static str {
        match self {
            PathKind::Spiral => "spiral",
            PathKind::Raster => "raster",
        }
    }
}

impl FromStr for PathKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spiral" | "rect_spiral" => Ok(PathKind::Spiral),
            "raster" => Ok(PathKind::Raster),
            _ => Err(ConfigError::UnknownPathKind),
        }
    }
}

/// Angular offset from the scan origin in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanPoint {
    /// Pan offset
    pub x: f32,
    /// Tilt offset
    pub y: f32,
}

impl ScanPoint {
    /// The scan origin
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    /// Create a point
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Ordered scan positions
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPath {
    kind: PathKind,
    points: Vec<ScanPoint, MAX_PATH_POINTS>,
}

impl ScanPath {
    /// A path with no positions
    pub const fn empty() -> Self {
        Self {
            kind: PathKind::Spiral,
            points: Vec::new(),
        }
    }

    /// Positions in visiting order
    pub fn points(&self) -> &[ScanPoint] {
        &self.points
    }

    /// Position at `index`
    pub fn get(&self, index: usize) -> Option<ScanPoint> {
        self.points.get(index).copied()
    }

    /// Number of positions
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True for a path with no positions
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// How the path was generated
    pub fn kind(&self) -> PathKind {
        self.kind
    }
}

/// Positions along one axis: `floor(extent / step) + 1`
fn axis_count(extent: f32, step: f32) -> Result<usize, ConfigError> {
    if !extent.is_finite() || !step.is_finite() || extent < 0.0 || step <= 0.0 {
        return Err(ConfigError::InvalidGeometry);
    }
    let ratio = extent / step + RATIO_EPSILON;
    if ratio >= MAX_PATH_POINTS as f32 {
        return Err(ConfigError::PathTooLong);
    }
    Ok(ratio as usize + 1)
}

/// Grid size (columns, rows) for an extent and step
fn grid(extent_xy: (f32, f32), step_xy: (f32, f32)) -> Result<(usize, usize), ConfigError> {
    let nx = axis_count(extent_xy.0, step_xy.0)?;
    let ny = axis_count(extent_xy.1, step_xy.1)?;
    if nx * ny > MAX_PATH_POINTS {
        return Err(ConfigError::PathTooLong);
    }
    Ok((nx, ny))
}

/// Number of positions a scan of this extent and step visits
pub fn pixel_count(extent_xy: (f32, f32), step_xy: (f32, f32)) -> Result<usize, ConfigError> {
    grid(extent_xy, step_xy).map(|(nx, ny)| nx * ny)
}

/// Generate the positions of a scan
///
/// # Arguments
/// * `kind` - Visiting order
/// * `extent_xy` - Field size (x, y) in degrees; must be non-negative
/// * `step_xy` - Pitch (x, y) in degrees; must be positive
pub fn generate(
    kind: PathKind,
    extent_xy: (f32, f32),
    step_xy: (f32, f32),
) -> Result<ScanPath, ConfigError> {
    let (nx, ny) = grid(extent_xy, step_xy)?;
    let mut path = ScanPath {
        kind,
        points: Vec::new(),
    };
    match kind {
        PathKind::Spiral => spiral(&mut path.points, nx * ny, step_xy),
        PathKind::Raster => raster(&mut path.points, nx, ny, step_xy),
    }
    Ok(path)
}

/// Rectangular spiral: +x 1, +y 1, -x 2, -y 2, +x 3, ...
fn spiral(points: &mut Vec<ScanPoint, MAX_PATH_POINTS>, count: usize, step_xy: (f32, f32)) {
    let (mut x, mut y) = (0i32, 0i32);
    let mut emit = |x: i32, y: i32| {
        // count <= MAX_PATH_POINTS, checked by grid()
        let _ = points.push(ScanPoint::new(x as f32 * step_xy.0, y as f32 * step_xy.1));
    };

    emit(x, y);
    let mut emitted = 1;
    let mut run = 1;
    let mut sign = 1;

    while emitted < count {
        for horizontal in [true, false] {
            for _ in 0..run {
                if emitted == count {
                    return;
                }
                if horizontal {
                    x += sign;
                } else {
                    y += sign;
                }
                emit(x, y);
                emitted += 1;
            }
        }
        sign = -sign;
        run += 1;
    }
}

/// Centred grid, top row first, alternating row direction
fn raster(points: &mut Vec<ScanPoint, MAX_PATH_POINTS>, nx: usize, ny: usize, step_xy: (f32, f32)) {
    let half_x = (nx - 1) as f32 / 2.0;
    let half_y = (ny - 1) as f32 / 2.0;

    for row in 0..ny {
        let y = (half_y - row as f32) * step_xy.1;
        for col in 0..nx {
            let col = if row % 2 == 0 { col } else { nx - 1 - col };
            let x = (col as f32 - half_x) * step_xy.0;
            // nx * ny <= MAX_PATH_POINTS, checked by grid()
            let _ = points.push(ScanPoint::new(x, y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contains(path: &ScanPath, x: f32, y: f32) -> bool {
        path.points().iter().any(|p| p.x == x && p.y == y)
    }

    #[test]
    fn test_pixel_count() {
        assert_eq!(pixel_count((30.0, 30.0), (5.0, 5.0)), Ok(49));
        assert_eq!(pixel_count((10.0, 10.0), (5.0, 5.0)), Ok(9));
        assert_eq!(pixel_count((0.0, 0.0), (5.0, 5.0)), Ok(1));
        assert_eq!(pixel_count((12.0, 4.0), (5.0, 5.0)), Ok(3));
        // 0.3 / 0.1 lands just under 3 in floating point
        assert_eq!(pixel_count((0.3, 0.0), (0.1, 1.0)), Ok(4));
    }

    #[test]
    fn test_raster_covers_grid() {
        let path = generate(PathKind::Raster, (30.0, 30.0), (5.0, 5.0)).unwrap();
        assert_eq!(path.len(), 49);
        assert_eq!(path.kind(), PathKind::Raster);

        for i in 0..7 {
            for j in 0..7 {
                let x = -15.0 + 5.0 * i as f32;
                let y = -15.0 + 5.0 * j as f32;
                assert!(contains(&path, x, y), "missing ({}, {})", x, y);
            }
        }
        for (i, a) in path.points().iter().enumerate() {
            for b in &path.points()[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_raster_rows_alternate() {
        let path = generate(PathKind::Raster, (30.0, 30.0), (5.0, 5.0)).unwrap();
        let points = path.points();

        // Row 0 at the top, left to right
        assert_eq!(points[0], ScanPoint::new(-15.0, 15.0));
        assert_eq!(points[6], ScanPoint::new(15.0, 15.0));
        // Row 1 right to left
        assert_eq!(points[7], ScanPoint::new(15.0, 10.0));
        assert_eq!(points[13], ScanPoint::new(-15.0, 10.0));
        // Last row (6, even) left to right at the bottom
        assert_eq!(points[48], ScanPoint::new(15.0, -15.0));

        for row in points.chunks(7) {
            assert!(row.iter().all(|p| p.y == row[0].y));
        }
    }

    #[test]
    fn test_spiral_order() {
        let path = generate(PathKind::Spiral, (10.0, 10.0), (5.0, 5.0)).unwrap();
        let expected = [
            (0.0, 0.0),
            (5.0, 0.0),
            (5.0, 5.0),
            (0.0, 5.0),
            (-5.0, 5.0),
            (-5.0, 0.0),
            (-5.0, -5.0),
            (0.0, -5.0),
            (5.0, -5.0),
        ];
        assert_eq!(path.len(), 9);
        for (point, (x, y)) in path.points().iter().zip(expected) {
            assert_eq!(*point, ScanPoint::new(x, y));
        }
    }

    #[test]
    fn test_spiral_stops_mid_ring() {
        // 3 x 2 grid: six positions
        let path = generate(PathKind::Spiral, (10.0, 5.0), (5.0, 5.0)).unwrap();
        assert_eq!(path.len(), 6);
        assert_eq!(path.get(5), Some(ScanPoint::new(-5.0, 0.0)));
    }

    #[test]
    fn test_single_point() {
        for kind in [PathKind::Spiral, PathKind::Raster] {
            let path = generate(kind, (0.0, 0.0), (1.0, 1.0)).unwrap();
            assert_eq!(path.points(), &[ScanPoint::ORIGIN]);
        }
    }

    #[test]
    fn test_invalid_geometry() {
        let cases = [
            ((10.0, 10.0), (0.0, 5.0)),
            ((10.0, 10.0), (5.0, -1.0)),
            ((-1.0, 10.0), (5.0, 5.0)),
            ((f32::NAN, 10.0), (5.0, 5.0)),
            ((10.0, 10.0), (f32::INFINITY, 5.0)),
        ];
        for (extent, step) in cases {
            assert_eq!(
                generate(PathKind::Raster, extent, step),
                Err(ConfigError::InvalidGeometry)
            );
        }
    }

    #[test]
    fn test_path_too_long() {
        assert_eq!(
            generate(PathKind::Spiral, (90.0, 90.0), (1.0, 1.0)),
            Err(ConfigError::PathTooLong)
        );
        assert_eq!(
            pixel_count((1.0e9, 0.0), (1.0, 1.0)),
            Err(ConfigError::PathTooLong)
        );
        assert_eq!(pixel_count((63.0, 63.0), (1.0, 1.0)), Ok(4096));
    }

    #[test]
    fn test_path_kind_names() {
        assert_eq!("raster".parse(), Ok(PathKind::Raster));
        assert_eq!("spiral".parse(), Ok(PathKind::Spiral));
        assert_eq!("rect_spiral".parse(), Ok(PathKind::Spiral));
        assert_eq!("zigzag".parse::<PathKind>(), Err(ConfigError::UnknownPathKind));
        assert_eq!(PathKind::Raster.as_str(), "raster");
    }
}
