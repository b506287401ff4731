//! Spectral sensor drivers

pub mod c12880ma;

pub use c12880ma::C12880ma;
