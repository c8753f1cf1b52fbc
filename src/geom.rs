//! Minimal geometry kernel used by the floor-plate engine.
//!
//! Points and vectors are 3D. Most floor-plate algorithms work in plan
//! projection, using `(f64, f64)` tuples the same way the clipping code does.

pub mod bboxes;
pub mod plan;
pub mod point;
pub mod polygon;
pub mod projection;
pub mod segment;
pub mod solid;
pub mod vector;

use anyhow::{Result, anyhow};

/// Geometric precision
pub const EPS: f64 = 1e-10;

/// Approximate equality for scalars.
pub trait IsClose {
    fn is_close(&self, other: f64) -> bool;
    fn is_close_tol(&self, other: f64, tol: f64) -> bool;
}

impl IsClose for f64 {
    fn is_close(&self, other: f64) -> bool {
        (self - other).abs() < EPS
    }

    fn is_close_tol(&self, other: f64, tol: f64) -> bool {
        (self - other).abs() <= tol
    }
}

/// Checks an object identifier and returns an owned copy.
///
/// Identifiers end up in face names (`<id>..Face<n>`) so they must be
/// non-empty, shorter than 100 characters and free of whitespace-only content.
pub fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Identifier must not be empty"));
    }
    if name.chars().count() >= 100 {
        return Err(anyhow!("Identifier must be < 100 characters: {name}"));
    }
    if name.contains("..") {
        return Err(anyhow!("Identifier must not contain '..': {name}"));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_close() {
        assert!(1.0.is_close(1.0 + 1e-12));
        assert!(!1.0.is_close(1.001));
        assert!(1.0.is_close_tol(1.005, 0.01));
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Office_1").is_ok());
        assert!(validate_name("  ").is_err());
        assert!(validate_name("a..b").is_err());
        assert!(validate_name(&"x".repeat(120)).is_err());
    }
}
