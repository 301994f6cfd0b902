// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! PointCloud2 packing and unpacking.
//!
//! A [`PointFormat`] is derived from a list of `PointField` descriptors. It is
//! an explicit schema of `(offset, datatype, count)` entries sorted by offset,
//! with gaps between fields left as zeroed padding:
//!
//! ```text
//! fields: x@0 f32, y@4 f32, z@8 f32, index@16 i32
//! ┌───────┬───────┬───────┬─────────┬────────┐
//! │ x:f32 │ y:f32 │ z:f32 │ pad(4)  │ i32    │
//! │ 4B    │ 4B    │ 4B    │ 00 00.. │ 4B     │
//! └───────┴───────┴───────┴─────────┴────────┘
//! point size = 20
//! ```
//!
//! Each value is written directly with `to_le_bytes` (or `to_be_bytes` when
//! decoding a big-endian cloud). Fields with an unknown datatype tag are
//! reported and skipped: they take no bytes in the format, and the values a
//! tuple carries for them are ignored.

use crate::{points::Points, scan::Error};
use edgefirst_schemas::{
    sensor_msgs::{PointCloud2, PointField},
    std_msgs::Header,
};
use tracing::{instrument, warn};

/// Point field data types for PointCloud2 messages.
///
/// These values correspond to the ROS sensor_msgs/PointField datatype field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PointFieldType {
    INT8 = 1,
    UINT8 = 2,
    INT16 = 3,
    UINT16 = 4,
    INT32 = 5,
    UINT32 = 6,
    FLOAT32 = 7,
    FLOAT64 = 8,
}

impl PointFieldType {
    /// Size in bytes of a single element.
    pub const fn size(self) -> usize {
        match self {
            PointFieldType::INT8 | PointFieldType::UINT8 => 1,
            PointFieldType::INT16 | PointFieldType::UINT16 => 2,
            PointFieldType::INT32 | PointFieldType::UINT32 | PointFieldType::FLOAT32 => 4,
            PointFieldType::FLOAT64 => 8,
        }
    }

    /// Write `value` converted to this type into the start of `out`.
    #[inline]
    fn write(self, value: f64, big_endian: bool, out: &mut [u8]) {
        macro_rules! put {
            ($t:ty) => {{
                let v = value as $t;
                let bytes = if big_endian {
                    v.to_be_bytes()
                } else {
                    v.to_le_bytes()
                };
                out[..bytes.len()].copy_from_slice(&bytes);
            }};
        }

        match self {
            PointFieldType::INT8 => put!(i8),
            PointFieldType::UINT8 => put!(u8),
            PointFieldType::INT16 => put!(i16),
            PointFieldType::UINT16 => put!(u16),
            PointFieldType::INT32 => put!(i32),
            PointFieldType::UINT32 => put!(u32),
            PointFieldType::FLOAT32 => put!(f32),
            PointFieldType::FLOAT64 => put!(f64),
        }
    }

    /// Read a value of this type from the start of `data`.
    #[inline]
    fn read(self, big_endian: bool, data: &[u8]) -> f64 {
        macro_rules! get {
            ($t:ty) => {{
                const N: usize = std::mem::size_of::<$t>();
                let mut bytes = [0u8; N];
                bytes.copy_from_slice(&data[..N]);
                let v = if big_endian {
                    <$t>::from_be_bytes(bytes)
                } else {
                    <$t>::from_le_bytes(bytes)
                };
                v as f64
            }};
        }

        match self {
            PointFieldType::INT8 => get!(i8),
            PointFieldType::UINT8 => get!(u8),
            PointFieldType::INT16 => get!(i16),
            PointFieldType::UINT16 => get!(u16),
            PointFieldType::INT32 => get!(i32),
            PointFieldType::UINT32 => get!(u32),
            PointFieldType::FLOAT32 => get!(f32),
            PointFieldType::FLOAT64 => get!(f64),
        }
    }
}

impl TryFrom<u8> for PointFieldType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PointFieldType::INT8),
            2 => Ok(PointFieldType::UINT8),
            3 => Ok(PointFieldType::INT16),
            4 => Ok(PointFieldType::UINT16),
            5 => Ok(PointFieldType::INT32),
            6 => Ok(PointFieldType::UINT32),
            7 => Ok(PointFieldType::FLOAT32),
            8 => Ok(PointFieldType::FLOAT64),
            other => Err(other),
        }
    }
}

/// One packed field of a [`PointFormat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatEntry {
    /// Byte offset within the point.
    pub offset: usize,
    pub datatype: PointFieldType,
    pub count: usize,
    /// Position of the field's first value within a point tuple.
    pub value: usize,
}

/// Byte format of a single point derived from its field descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointFormat {
    entries: Vec<FormatEntry>,
    size: usize,
    value_count: usize,
    is_bigendian: bool,
}

impl PointFormat {
    /// Derive the format for all `fields`.
    pub fn new(fields: &[PointField], is_bigendian: bool) -> Self {
        Self::with_names(fields, is_bigendian, None)
    }

    /// Derive the format for the fields whose name is in `names`, or all
    /// fields if `names` is `None`.
    ///
    /// Fields are laid out in offset order. When a field starts past the
    /// current end of the format the gap becomes padding. Fields with an
    /// unknown datatype are skipped with a warning.
    pub fn with_names(fields: &[PointField], is_bigendian: bool, names: Option<&[&str]>) -> Self {
        let mut value = 0;
        let mut indexed = Vec::with_capacity(fields.len());
        for field in fields {
            indexed.push((field, value));
            value += field.count as usize;
        }
        let value_count = value;

        indexed.sort_by_key(|(field, _)| field.offset);

        let mut entries = Vec::with_capacity(indexed.len());
        let mut offset = 0;
        for (field, value) in indexed {
            if let Some(names) = names {
                if !names.contains(&field.name.as_str()) {
                    continue;
                }
            }

            let field_offset = field.offset as usize;
            if offset < field_offset {
                offset = field_offset;
            }

            match PointFieldType::try_from(field.datatype) {
                Ok(datatype) => {
                    let count = field.count as usize;
                    entries.push(FormatEntry {
                        offset,
                        datatype,
                        count,
                        value,
                    });
                    offset += count * datatype.size();
                }
                Err(tag) => {
                    warn!(field = %field.name, datatype = tag, "skipping unknown PointField datatype");
                }
            }
        }

        Self {
            entries,
            size: offset,
            value_count,
            is_bigendian,
        }
    }

    /// Packed fields in offset order.
    #[inline]
    pub fn entries(&self) -> &[FormatEntry] {
        &self.entries
    }

    /// Bytes per point.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of values a point tuple must carry, one per element of every
    /// descriptor including skipped ones.
    #[inline]
    pub fn value_count(&self) -> usize {
        self.value_count
    }

    #[inline]
    pub fn is_bigendian(&self) -> bool {
        self.is_bigendian
    }

    /// Pack one point tuple into `out`, which must be at least
    /// [`Self::size`] bytes. Padding bytes are left untouched.
    #[inline]
    pub fn pack_point(&self, values: &[f64], out: &mut [u8]) {
        for entry in &self.entries {
            let width = entry.datatype.size();
            for k in 0..entry.count {
                let at = entry.offset + k * width;
                entry
                    .datatype
                    .write(values[entry.value + k], self.is_bigendian, &mut out[at..]);
            }
        }
    }

    /// Decode one point from `data`, appending its values in offset order.
    #[inline]
    pub fn unpack_point(&self, data: &[u8], values: &mut Vec<f64>) {
        for entry in &self.entries {
            let width = entry.datatype.size();
            for k in 0..entry.count {
                let at = entry.offset + k * width;
                values.push(entry.datatype.read(self.is_bigendian, &data[at..]));
            }
        }
    }
}

/// Pack `points` into a pre-allocated buffer.
///
/// Point `i` is written at `i * format.size()`. The packed region is zeroed
/// first so padding is deterministic. Nothing is written on error.
pub fn pack_points_into(format: &PointFormat, points: &Points, out: &mut [u8]) -> Result<(), Error> {
    let n_points = points.len();
    if n_points > 0 && points.stride() != format.value_count() {
        return Err(Error::InvalidPoint {
            index: 0,
            expected: format.value_count(),
            found: points.stride(),
        });
    }

    let step = format.size();
    let required = step * n_points;
    if out.len() < required {
        return Err(Error::BufferOverflow {
            required,
            available: out.len(),
        });
    }

    let out = &mut out[..required];
    out.fill(0);
    if step == 0 {
        return Ok(());
    }
    for (values, chunk) in points.iter().zip(out.chunks_exact_mut(step)) {
        format.pack_point(values, chunk);
    }

    Ok(())
}

/// Pack `points` into a new buffer of `format.size() * points.len()` bytes.
pub fn pack_points(format: &PointFormat, points: &Points) -> Result<Vec<u8>, Error> {
    let mut data = vec![0u8; format.size() * points.len()];
    pack_points_into(format, points, &mut data)?;
    Ok(data)
}

/// Create a single-row, little-endian PointCloud2 from value tuples.
///
/// `points` must carry one value per element of every descriptor in
/// `fields`, in descriptor order. The cloud is marked as not dense since
/// it is the output of range filtering.
#[instrument(skip_all, fields(n_points = points.len()))]
pub fn create_cloud(
    header: Header,
    fields: Vec<PointField>,
    points: &Points,
) -> Result<PointCloud2, Error> {
    let format = PointFormat::new(&fields, false);
    let data = pack_points(&format, points)?;
    let point_step = format.size() as u32;
    let width = points.len() as u32;

    Ok(PointCloud2 {
        header,
        height: 1,
        width,
        fields,
        is_bigendian: false,
        point_step,
        row_step: point_step * width,
        data,
        is_dense: false,
    })
}

/// Decode the points of `cloud`.
///
/// Only the fields named in `field_names` are decoded when given. Each
/// returned point holds the selected values in field offset order. Byte
/// order follows `cloud.is_bigendian`.
pub fn read_points(
    cloud: &PointCloud2,
    field_names: Option<&[&str]>,
) -> Result<Vec<Vec<f64>>, Error> {
    let format = PointFormat::with_names(&cloud.fields, cloud.is_bigendian, field_names);
    let point_step = cloud.point_step as usize;
    let row_step = cloud.row_step as usize;
    let n_values: usize = format.entries().iter().map(|e| e.count).sum();

    let mut points = Vec::with_capacity(cloud.width as usize * cloud.height as usize);
    for row in 0..cloud.height as usize {
        for col in 0..cloud.width as usize {
            let start = row * row_step + col * point_step;
            let end = start + format.size();
            let data = cloud
                .data
                .get(start..end)
                .ok_or(Error::UnexpectedEnd(cloud.data.len()))?;
            let mut values = Vec::with_capacity(n_values);
            format.unpack_point(data, &mut values);
            points.push(values);
        }
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgefirst_schemas::builtin_interfaces::Time;

    fn field(name: &str, offset: u32, datatype: u8) -> PointField {
        PointField {
            name: String::from(name),
            offset,
            datatype,
            count: 1,
        }
    }

    fn xyz() -> Vec<PointField> {
        vec![
            field("x", 0, PointFieldType::FLOAT32 as u8),
            field("y", 4, PointFieldType::FLOAT32 as u8),
            field("z", 8, PointFieldType::FLOAT32 as u8),
        ]
    }

    fn header() -> Header {
        Header {
            stamp: Time { sec: 3, nanosec: 7 },
            frame_id: String::from("laser"),
        }
    }

    #[test]
    fn test_format_contiguous() {
        let mut fields = xyz();
        fields.push(field("index", 12, PointFieldType::INT32 as u8));
        let format = PointFormat::new(&fields, false);
        assert_eq!(format.size(), 16);
        assert_eq!(format.value_count(), 4);
        assert_eq!(format.entries().len(), 4);
        assert_eq!(format.entries()[3].offset, 12);
        assert_eq!(format.entries()[3].datatype, PointFieldType::INT32);
    }

    #[test]
    fn test_format_padding_gap() {
        let mut fields = xyz();
        fields.push(field("index", 16, PointFieldType::INT32 as u8));
        let format = PointFormat::new(&fields, false);
        assert_eq!(format.size(), 20);
        assert_eq!(format.entries()[3].offset, 16);

        let points = Points::from_tuples(4, &[[1.0, 2.0, 3.0, -5.0]]).unwrap();
        let data = pack_points(&format, &points).unwrap();
        assert_eq!(data.len(), 20);
        assert_eq!(&data[12..16], &[0, 0, 0, 0]);
        assert_eq!(i32::from_le_bytes([data[16], data[17], data[18], data[19]]), -5);
    }

    #[test]
    fn test_format_sorts_by_offset() {
        let fields = vec![
            field("b", 4, PointFieldType::UINT16 as u8),
            field("a", 0, PointFieldType::FLOAT32 as u8),
        ];
        let format = PointFormat::new(&fields, false);
        assert_eq!(format.size(), 6);
        // Tuple order follows descriptor order, bytes follow offset order.
        assert_eq!(format.entries()[0].value, 1);
        assert_eq!(format.entries()[1].value, 0);

        let points = Points::from_tuples(2, &[[513.0, 1.5]]).unwrap();
        let data = pack_points(&format, &points).unwrap();
        assert_eq!(&data[0..4], &1.5f32.to_le_bytes());
        assert_eq!(&data[4..6], &513u16.to_le_bytes());
    }

    #[test]
    fn test_format_skips_unknown_datatype() {
        let mut fields = xyz();
        fields.push(field("mystery", 12, 42));
        fields.push(field("index", 16, PointFieldType::INT32 as u8));
        let format = PointFormat::new(&fields, false);
        assert_eq!(format.entries().len(), 4);
        assert_eq!(format.value_count(), 5);
        // The unknown field's bytes become padding before `index`.
        assert_eq!(format.size(), 20);

        let points = Points::from_tuples(5, &[[1.0, 2.0, 3.0, 99.0, 7.0]]).unwrap();
        let data = pack_points(&format, &points).unwrap();
        assert_eq!(&data[12..16], &[0, 0, 0, 0]);
        assert_eq!(&data[16..20], &7i32.to_le_bytes());
    }

    #[test]
    fn test_trailing_unknown_datatype_shortens_point() {
        let mut fields = xyz();
        fields.push(field("mystery", 12, 0));
        let format = PointFormat::new(&fields, false);
        assert_eq!(format.size(), 12);
        assert_eq!(format.value_count(), 4);
    }

    #[test]
    fn test_pack_all_datatypes() {
        let fields = vec![
            field("a", 0, PointFieldType::INT8 as u8),
            field("b", 1, PointFieldType::UINT8 as u8),
            field("c", 2, PointFieldType::INT16 as u8),
            field("d", 4, PointFieldType::UINT16 as u8),
            field("e", 6, PointFieldType::INT32 as u8),
            field("f", 10, PointFieldType::UINT32 as u8),
            field("g", 14, PointFieldType::FLOAT32 as u8),
            field("h", 18, PointFieldType::FLOAT64 as u8),
        ];
        let format = PointFormat::new(&fields, false);
        assert_eq!(format.size(), 26);

        let values = [-3.0, 200.0, -1000.0, 60000.0, -70000.0, 4e9, 0.25, -1.0e100];
        let points = Points::from_tuples(8, &[values]).unwrap();
        let data = pack_points(&format, &points).unwrap();
        assert_eq!(data[0] as i8, -3);
        assert_eq!(data[1], 200);
        assert_eq!(i16::from_le_bytes([data[2], data[3]]), -1000);
        assert_eq!(u16::from_le_bytes([data[4], data[5]]), 60000);
        assert_eq!(i32::from_le_bytes(data[6..10].try_into().unwrap()), -70000);
        assert_eq!(u32::from_le_bytes(data[10..14].try_into().unwrap()), 4_000_000_000);
        assert_eq!(f32::from_le_bytes(data[14..18].try_into().unwrap()), 0.25);
        assert_eq!(f64::from_le_bytes(data[18..26].try_into().unwrap()), -1.0e100);
    }

    #[test]
    fn test_pack_count_greater_than_one() {
        let fields = vec![PointField {
            name: String::from("rgb"),
            offset: 0,
            datatype: PointFieldType::UINT8 as u8,
            count: 3,
        }];
        let format = PointFormat::new(&fields, false);
        assert_eq!(format.size(), 3);
        let points = Points::from_tuples(3, &[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(pack_points(&format, &points).unwrap(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_pack_rejects_wrong_stride() {
        let format = PointFormat::new(&xyz(), false);
        let points = Points::from_tuples(2, &[[1.0, 2.0]]).unwrap();
        match pack_points(&format, &points) {
            Err(Error::InvalidPoint {
                expected, found, ..
            }) => {
                assert_eq!(expected, 3);
                assert_eq!(found, 2);
            }
            other => panic!("expected invalid point, got {:?}", other.map(|d| d.len())),
        }
    }

    #[test]
    fn test_pack_into_small_buffer() {
        let format = PointFormat::new(&xyz(), false);
        let points = Points::from_tuples(3, &[[1.0, 2.0, 3.0]]).unwrap();
        let mut out = [0xffu8; 8];
        assert!(matches!(
            pack_points_into(&format, &points, &mut out),
            Err(Error::BufferOverflow {
                required: 12,
                available: 8
            })
        ));
        assert_eq!(out, [0xff; 8]);
    }

    #[test]
    fn test_pack_into_zeroes_padding() {
        let mut fields = xyz();
        fields.push(field("index", 16, PointFieldType::INT32 as u8));
        let format = PointFormat::new(&fields, false);
        let points = Points::from_tuples(4, &[[1.0, 2.0, 3.0, 4.0]]).unwrap();
        let mut out = vec![0xffu8; 24];
        pack_points_into(&format, &points, &mut out).unwrap();
        assert_eq!(&out[12..16], &[0, 0, 0, 0]);
        // Bytes past the packed region are not touched.
        assert_eq!(&out[20..], &[0xff; 4]);
    }

    #[test]
    fn test_create_cloud_metadata() {
        let mut fields = xyz();
        fields.push(field("index", 12, PointFieldType::INT32 as u8));
        let points = Points::from_tuples(
            4,
            &[[1.0, 0.0, 0.0, 0.0], [0.0, 2.0, 0.0, 1.0], [-3.0, 0.0, 0.0, 3.0]],
        )
        .unwrap();
        let cloud = create_cloud(header(), fields, &points).unwrap();

        assert_eq!(cloud.header.frame_id, "laser");
        assert_eq!(cloud.header.stamp.sec, 3);
        assert_eq!(cloud.height, 1);
        assert_eq!(cloud.width, 3);
        assert_eq!(cloud.point_step, 16);
        assert_eq!(cloud.row_step, 48);
        assert_eq!(cloud.data.len(), 48);
        assert!(!cloud.is_dense);
        assert!(!cloud.is_bigendian);
        assert_eq!(cloud.fields.len(), 4);
    }

    #[test]
    fn test_create_cloud_empty() {
        let cloud = create_cloud(header(), xyz(), &Points::new(3)).unwrap();
        assert_eq!(cloud.width, 0);
        assert_eq!(cloud.point_step, 12);
        assert_eq!(cloud.row_step, 0);
        assert!(cloud.data.is_empty());
    }

    #[test]
    fn test_repack_is_byte_identical() {
        let mut fields = xyz();
        fields.push(field("stamps", 12, PointFieldType::FLOAT32 as u8));
        let points =
            Points::from_tuples(4, &[[0.1, 0.2, 0.3, 0.4], [1.1, -1.2, 0.0, 1e-3]]).unwrap();
        let a = create_cloud(header(), fields.clone(), &points).unwrap();
        let b = create_cloud(header(), fields, &points).unwrap();
        assert_eq!(a.data, b.data);
    }

    #[test]
    fn test_read_points_roundtrip_and_filter() {
        let mut fields = xyz();
        fields.push(field("index", 12, PointFieldType::INT32 as u8));
        let points =
            Points::from_tuples(4, &[[1.5, -2.5, 0.0, 7.0], [4.0, 8.0, 0.0, 9.0]]).unwrap();
        let cloud = create_cloud(header(), fields, &points).unwrap();

        let all = read_points(&cloud, None).unwrap();
        assert_eq!(all, vec![vec![1.5, -2.5, 0.0, 7.0], vec![4.0, 8.0, 0.0, 9.0]]);

        let subset = read_points(&cloud, Some(&["index", "x"])).unwrap();
        assert_eq!(subset, vec![vec![1.5, 7.0], vec![4.0, 9.0]]);
    }

    #[test]
    fn test_read_points_big_endian() {
        let fields = vec![field("v", 0, PointFieldType::UINT16 as u8)];
        let cloud = PointCloud2 {
            header: header(),
            height: 1,
            width: 2,
            fields,
            is_bigendian: true,
            point_step: 2,
            row_step: 4,
            data: vec![0x01, 0x02, 0x00, 0xff],
            is_dense: true,
        };
        let points = read_points(&cloud, None).unwrap();
        assert_eq!(points, vec![vec![258.0], vec![255.0]]);
    }

    #[test]
    fn test_read_points_truncated() {
        let mut cloud = create_cloud(
            header(),
            xyz(),
            &Points::from_tuples(3, &[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap(),
        )
        .unwrap();
        cloud.data.truncate(20);
        assert!(matches!(
            read_points(&cloud, None),
            Err(Error::UnexpectedEnd(20))
        ));
    }
}
