// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Laser scan to PointCloud2 projection.
//!
//! ```text
//! LaserScan ──► AngleCache ──► assemble_points ──► create_cloud ──► PointCloud2
//!                (cos, sin)     (FieldLayout)       (PointFormat)
//! ```

use crate::{
    angles::AngleCache,
    formats::create_cloud,
    layout::{ChannelOptions, FieldLayout},
    points::assemble_points,
    scan::{Error, LaserScan},
};
use edgefirst_schemas::sensor_msgs::PointCloud2;
use tracing::instrument;

/// Projects laser scans into point clouds.
///
/// The projector keeps the cosine/sine basis of the last scan geometry and
/// reuses it while the beam count and angular bounds stay the same. It is
/// not meant to be shared between threads; use one projector per scan
/// stream.
#[derive(Debug, Default)]
pub struct LaserProjector {
    angles: AngleCache,
}

impl LaserProjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Project a single laser scan into a point cloud in the scan's frame.
    ///
    /// # Arguments
    ///
    /// * `scan` - The input laser scan
    /// * `range_cutoff` - Additional range cutoff, applied only when tighter
    ///   than `scan.range_max`. Negative values disable it.
    /// * `channels` - Optional channels to include per point
    ///
    /// # Returns
    ///
    /// A single-row, little-endian, non-dense cloud holding only the beams
    /// with `range_min <= range < cutoff`.
    #[instrument(skip_all, fields(n_beams = scan.len()))]
    pub fn project_laser(
        &mut self,
        scan: &LaserScan,
        range_cutoff: f64,
        channels: ChannelOptions,
    ) -> Result<PointCloud2, Error> {
        scan.validate()?;

        let (cos, sin) = self.angles.basis(
            scan.len(),
            scan.angle_min,
            scan.angle_max,
            scan.angle_increment,
        );
        let layout = FieldLayout::build(scan.has_intensities(), channels);
        let points = assemble_points(scan, cos, sin, &layout, range_cutoff);

        create_cloud(scan.header.clone(), layout.into_fields(), &points)
    }

    /// Access the angle cache.
    pub fn angles(&self) -> &AngleCache {
        &self.angles
    }
}
