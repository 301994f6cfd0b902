// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use clap::Parser;
use edgefirst_laserproj::{ChannelKind, ChannelOptions};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Laser scan records, one JSON LaserScan per line.
    #[arg(env)]
    pub scan: PathBuf,

    /// Second scanner's records.  When given, the Nth record of each file
    /// is projected and the two clouds are concatenated.
    #[arg(long, env)]
    pub scan2: Option<PathBuf>,

    /// Output file for length-prefixed CDR PointCloud2 records.  Writes to
    /// stdout when omitted.
    #[arg(short, long, env)]
    pub output: Option<PathBuf>,

    /// Additional range cutoff in meters.  Only applied when tighter than
    /// the scan's range_max, negative values disable it.
    #[arg(long, env, default_value = "-1.0", allow_hyphen_values = true)]
    pub range_cutoff: f64,

    /// Optional per-point channels to include.
    #[arg(
        long,
        env,
        value_enum,
        value_delimiter = ',',
        default_values_t = [ChannelKind::Intensity, ChannelKind::Index]
    )]
    pub channels: Vec<ChannelKind>,

    /// Only include x, y and z.
    #[arg(long, env, conflicts_with = "channels")]
    pub no_channels: bool,

    /// Override the frame_id of the published clouds
    #[arg(long, env)]
    pub frame_id: Option<String>,

    /// Number of projected clouds buffered per scan stream
    #[arg(long, env, default_value = "4")]
    pub queue_depth: usize,

    /// Application log level
    #[arg(long, env, default_value = "info")]
    pub rust_log: LevelFilter,
}

impl Args {
    pub fn channel_options(&self) -> ChannelOptions {
        if self.no_channels {
            ChannelOptions::NONE
        } else {
            self.channels.iter().copied().collect()
        }
    }
}
