// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Channel selection and PointCloud2 field layout.
//!
//! Every projected point starts with `x`, `y`, `z` as FLOAT32. Optional
//! channels are appended after them in a fixed order, which is also the
//! order the assembler emits values in:
//!
//! ```text
//! ┌───────┬───────┬───────┬───────────┬───────┬───────────┬────────┬──────┬──────┬──────┐
//! │ x:f32 │ y:f32 │ z:f32 │ intensity │ index │ distances │ stamps │ vp_x │ vp_y │ vp_z │
//! │ 0     │ 4     │ 8     │ f32       │ i32   │ f32       │ f32    │ f32  │ f32  │ f32  │
//! └───────┴───────┴───────┴───────────┴───────┴───────────┴────────┴──────┴──────┴──────┘
//! ```
//!
//! Disabled channels take no space, so offsets after them shift down.

use crate::formats::PointFieldType;
use clap::ValueEnum;
use edgefirst_schemas::sensor_msgs::PointField;
use std::fmt;

/// Optional per-point attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum ChannelKind {
    /// Reflected intensity of the beam
    Intensity,
    /// Index of the beam within the scan
    Index,
    /// Raw range reading
    Distance,
    /// Time offset of the beam from the start of the scan
    Timestamp,
    /// Viewpoint origin (three fields)
    Viewpoint,
}

impl ChannelKind {
    /// All channels in layout order.
    pub const ALL: [ChannelKind; 5] = [
        ChannelKind::Intensity,
        ChannelKind::Index,
        ChannelKind::Distance,
        ChannelKind::Timestamp,
        ChannelKind::Viewpoint,
    ];

    /// Legacy bitmask value of the channel.
    pub const fn bit(self) -> u8 {
        match self {
            ChannelKind::Intensity => 0x01,
            ChannelKind::Index => 0x02,
            ChannelKind::Distance => 0x04,
            ChannelKind::Timestamp => 0x08,
            ChannelKind::Viewpoint => 0x10,
        }
    }

    /// Field names and datatype contributed by the channel.
    pub fn fields(self) -> (&'static [&'static str], PointFieldType) {
        match self {
            ChannelKind::Intensity => (&["intensity"], PointFieldType::FLOAT32),
            ChannelKind::Index => (&["index"], PointFieldType::INT32),
            ChannelKind::Distance => (&["distances"], PointFieldType::FLOAT32),
            ChannelKind::Timestamp => (&["stamps"], PointFieldType::FLOAT32),
            ChannelKind::Viewpoint => (&["vp_x", "vp_y", "vp_z"], PointFieldType::FLOAT32),
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChannelKind::Intensity => write!(f, "intensity"),
            ChannelKind::Index => write!(f, "index"),
            ChannelKind::Distance => write!(f, "distance"),
            ChannelKind::Timestamp => write!(f, "timestamp"),
            ChannelKind::Viewpoint => write!(f, "viewpoint"),
        }
    }
}

/// Set of enabled channels.
///
/// Defaults to intensity and index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelOptions {
    pub intensity: bool,
    pub index: bool,
    pub distance: bool,
    pub timestamp: bool,
    pub viewpoint: bool,
}

impl ChannelOptions {
    pub const NONE: ChannelOptions = ChannelOptions {
        intensity: false,
        index: false,
        distance: false,
        timestamp: false,
        viewpoint: false,
    };

    pub const ALL: ChannelOptions = ChannelOptions {
        intensity: true,
        index: true,
        distance: true,
        timestamp: true,
        viewpoint: true,
    };

    /// Build from the legacy bitmask (`INTENSITY = 0x01` .. `VIEWPOINT =
    /// 0x10`). Unknown bits are ignored.
    pub fn from_bits(bits: u8) -> Self {
        let mut options = Self::NONE;
        for kind in ChannelKind::ALL {
            options.set(kind, bits & kind.bit() != 0);
        }
        options
    }

    pub fn bits(&self) -> u8 {
        self.enabled().fold(0, |bits, kind| bits | kind.bit())
    }

    pub fn contains(&self, kind: ChannelKind) -> bool {
        match kind {
            ChannelKind::Intensity => self.intensity,
            ChannelKind::Index => self.index,
            ChannelKind::Distance => self.distance,
            ChannelKind::Timestamp => self.timestamp,
            ChannelKind::Viewpoint => self.viewpoint,
        }
    }

    pub fn set(&mut self, kind: ChannelKind, enabled: bool) {
        match kind {
            ChannelKind::Intensity => self.intensity = enabled,
            ChannelKind::Index => self.index = enabled,
            ChannelKind::Distance => self.distance = enabled,
            ChannelKind::Timestamp => self.timestamp = enabled,
            ChannelKind::Viewpoint => self.viewpoint = enabled,
        }
    }

    /// Enabled channels in layout order.
    pub fn enabled(&self) -> impl Iterator<Item = ChannelKind> + '_ {
        ChannelKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            intensity: true,
            index: true,
            ..Self::NONE
        }
    }
}

impl FromIterator<ChannelKind> for ChannelOptions {
    fn from_iter<I: IntoIterator<Item = ChannelKind>>(iter: I) -> Self {
        let mut options = Self::NONE;
        for kind in iter {
            options.set(kind, true);
        }
        options
    }
}

/// Field layout of a projected point.
#[derive(Clone, Debug)]
pub struct FieldLayout {
    fields: Vec<PointField>,
    point_step: u32,
    channels: [Option<usize>; ChannelKind::ALL.len()],
}

impl FieldLayout {
    /// Build the layout for a scan with or without intensities.
    ///
    /// Intensity is dropped from the layout when the scan has none, even if
    /// requested. Any selection, including [`ChannelOptions::NONE`], yields
    /// at least the 12-byte `x`, `y`, `z` layout.
    pub fn build(has_intensity: bool, options: ChannelOptions) -> Self {
        let mut fields = Vec::with_capacity(10);
        let mut offset = 0u32;
        let mut push = |fields: &mut Vec<PointField>, name: &str, datatype: PointFieldType| {
            fields.push(PointField {
                name: String::from(name),
                offset,
                datatype: datatype as u8,
                count: 1,
            });
            offset += datatype.size() as u32;
        };

        for name in ["x", "y", "z"] {
            push(&mut fields, name, PointFieldType::FLOAT32);
        }

        let mut channels = [None; ChannelKind::ALL.len()];
        for (slot, kind) in ChannelKind::ALL.into_iter().enumerate() {
            if !options.contains(kind) || (kind == ChannelKind::Intensity && !has_intensity) {
                continue;
            }
            channels[slot] = Some(fields.len());
            let (names, datatype) = kind.fields();
            for &name in names {
                push(&mut fields, name, datatype);
            }
        }

        Self {
            fields,
            point_step: offset,
            channels,
        }
    }

    /// Ordered field descriptors.
    #[inline]
    pub fn fields(&self) -> &[PointField] {
        &self.fields
    }

    /// Consume the layout, returning the field descriptors.
    pub fn into_fields(self) -> Vec<PointField> {
        self.fields
    }

    /// Bytes per point.
    #[inline]
    pub fn point_step(&self) -> u32 {
        self.point_step
    }

    /// Number of values a point carries for this layout.
    pub fn value_count(&self) -> usize {
        self.fields.iter().map(|f| f.count as usize).sum()
    }

    /// Index of the first field contributed by `kind`, if present.
    pub fn channel(&self, kind: ChannelKind) -> Option<usize> {
        ChannelKind::ALL
            .iter()
            .position(|k| *k == kind)
            .and_then(|slot| self.channels[slot])
    }

    pub fn has_channel(&self, kind: ChannelKind) -> bool {
        self.channel(kind).is_some()
    }
}
