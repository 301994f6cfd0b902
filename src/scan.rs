// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Laser scan input record and the crate error type.
//!
//! [`LaserScan`] mirrors the ROS `sensor_msgs/LaserScan` message: a single
//! sweep of range readings taken at uniform angular increments. The header is
//! an opaque token that is copied into the projected cloud unmodified.

use edgefirst_schemas::std_msgs::Header;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single planar laser sweep.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LaserScan {
    /// Passed through to the projected cloud.
    pub header: Header,
    /// Angle of the first reading in radians.
    pub angle_min: f64,
    /// Angle of the last reading in radians.
    pub angle_max: f64,
    /// Angular distance between consecutive readings in radians.
    pub angle_increment: f64,
    /// Time between consecutive readings in seconds.
    #[serde(default)]
    pub time_increment: f64,
    /// Time between complete scans in seconds.
    #[serde(default)]
    pub scan_time: f64,
    /// Minimum valid range in meters (inclusive).
    pub range_min: f32,
    /// Maximum valid range in meters (exclusive).
    pub range_max: f32,
    /// Range readings in meters, one per beam.
    pub ranges: Vec<f32>,
    /// Intensity readings, either empty or one per beam.
    #[serde(default)]
    pub intensities: Vec<f32>,
}

impl LaserScan {
    /// Number of beams in the sweep.
    #[inline]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Returns true if the scan carries intensity readings.
    #[inline]
    pub fn has_intensities(&self) -> bool {
        !self.intensities.is_empty()
    }

    /// Angle in radians of the reading at `index`.
    #[inline]
    pub fn angle(&self, index: usize) -> f64 {
        self.angle_min + index as f64 * self.angle_increment
    }

    /// Check the structural invariants of the scan.
    ///
    /// Intensities must be empty or parallel to the ranges; a mismatch is a
    /// producer bug and is rejected rather than truncated.
    pub fn validate(&self) -> Result<(), Error> {
        if self.has_intensities() && self.intensities.len() != self.ranges.len() {
            return Err(Error::IntensityMismatch {
                ranges: self.ranges.len(),
                intensities: self.intensities.len(),
            });
        }
        Ok(())
    }
}

/// Common error type for projection, packing and decoding.
#[derive(Debug)]
pub enum Error {
    /// Intensity readings are present but not parallel to the ranges
    IntensityMismatch { ranges: usize, intensities: usize },
    /// A point carries a different number of values than the layout expects
    InvalidPoint {
        index: usize,
        expected: usize,
        found: usize,
    },
    /// Output buffer cannot hold the packed points
    BufferOverflow { required: usize, available: usize },
    /// Unexpected end of point data at given byte position
    UnexpectedEnd(usize),
    /// Clouds with different point layouts cannot be combined
    LayoutMismatch(String),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::IntensityMismatch {
                ranges,
                intensities,
            } => write!(
                f,
                "intensity count {} does not match range count {}",
                intensities, ranges
            ),
            Error::InvalidPoint {
                index,
                expected,
                found,
            } => write!(
                f,
                "point {} has {} values, layout expects {}",
                index, found, expected
            ),
            Error::BufferOverflow {
                required,
                available,
            } => write!(
                f,
                "buffer overflow: {} bytes required, {} available",
                required, available
            ),
            Error::UnexpectedEnd(len) => write!(f, "unexpected end of data at {} bytes", len),
            Error::LayoutMismatch(msg) => write!(f, "layout mismatch: {}", msg),
        }
    }
}
