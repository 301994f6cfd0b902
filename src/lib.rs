// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! EdgeFirst Laser Projection Library
//!
//! This library projects planar laser scans into packed `PointCloud2`
//! records.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌───────────────┐     ┌──────────────────┐     ┌──────────────┐
//! │  LaserScan  │ ──► │  AngleCache   │ ──► │ assemble_points  │ ──► │ create_cloud │
//! │  (ranges)   │     │  (cos / sin)  │     │ (filter, values) │     │ (LE packing) │
//! └─────────────┘     └───────────────┘     └──────────────────┘     └──────────────┘
//!                                                    ▲                       │
//!                                             ┌─────────────┐                ▼
//!                                             │ FieldLayout │          PointCloud2
//!                                             └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`angles`]: Cached per-beam cosine/sine basis
//! - [`layout`]: Channel selection and field layout
//! - [`points`]: Range filtering and per-point values
//! - [`formats`]: PointCloud2 packing and decoding
//! - [`concat`]: Merging clouds from several scanners
//! - [`projector`]: The projection pipeline
//! - [`scan`]: Laser scan input and error type
//!
//! # Example
//!
//! ```ignore
//! use edgefirst_laserproj::{ChannelOptions, LaserProjector};
//!
//! let mut projector = LaserProjector::new();
//! let cloud = projector.project_laser(&scan, -1.0, ChannelOptions::default())?;
//! assert_eq!(cloud.row_step, cloud.point_step * cloud.width);
//! ```

pub mod angles;
pub mod concat;
pub mod formats;
pub mod layout;
pub mod points;
pub mod projector;
pub mod scan;

// Re-exports for convenience
pub use angles::AngleCache;
pub use concat::concatenate;
pub use formats::{PointFieldType, PointFormat, create_cloud, read_points};
pub use layout::{ChannelKind, ChannelOptions, FieldLayout};
pub use points::{Points, assemble_points};
pub use projector::LaserProjector;
pub use scan::{Error, LaserScan};
