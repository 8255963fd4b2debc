#![forbid(unsafe_code)]

//! Geometry primitives shared across the adapter boundary.
//!
//! The owning node reports per-axis sizing modes, an opacity scalar, and a
//! 16-scalar column-major transform. Velum never computes geometry itself;
//! it only forwards what the node hands it.

use serde::{Deserialize, Serialize};

/// How one axis of a surface is sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeMode {
    /// Fixed pixel size.
    Absolute,
    /// Proportional to the parent.
    Relative,
    /// Measured by the renderer from the surface's own content.
    Render,
}

impl SizeMode {
    /// Parse the wire discriminant, or `None` for reserved values.
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Absolute),
            1 => Some(Self::Relative),
            2 => Some(Self::Render),
            _ => None,
        }
    }

    /// The wire discriminant for this mode.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Absolute => 0,
            Self::Relative => 1,
            Self::Render => 2,
        }
    }

    /// Whether this axis is measured by the renderer.
    #[inline]
    pub fn is_render(self) -> bool {
        self == Self::Render
    }
}

/// A 16-scalar transform in matrix order.
pub type Transform = [f64; 16];

/// The identity transform.
#[rustfmt::skip]
pub const IDENTITY: Transform = [
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 1.0, 0.0,
    0.0, 0.0, 0.0, 1.0,
];
