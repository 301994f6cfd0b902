// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Concatenation of projected clouds.
//!
//! Two scanners projected with the same channel options produce clouds with
//! the same layout, which can be merged by appending their point data. No
//! frame transform is applied: both clouds must already be expressed in the
//! frame of the first one.

use crate::scan::Error;
use edgefirst_schemas::sensor_msgs::{PointCloud2, PointField};

fn same_fields(a: &[PointField], b: &[PointField]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(a, b)| {
            a.name == b.name && a.offset == b.offset && a.datatype == b.datatype && a.count == b.count
        })
}

/// Append the points of `second` to `first`.
///
/// Both clouds must be single-row and share fields, point step and byte
/// order. The result keeps the header of `first`.
pub fn concatenate(first: PointCloud2, second: &PointCloud2) -> Result<PointCloud2, Error> {
    if !same_fields(&first.fields, &second.fields) {
        return Err(Error::LayoutMismatch(String::from("fields differ")));
    }
    if first.point_step != second.point_step {
        return Err(Error::LayoutMismatch(format!(
            "point step {} != {}",
            first.point_step, second.point_step
        )));
    }
    if first.is_bigendian != second.is_bigendian {
        return Err(Error::LayoutMismatch(String::from("byte order differs")));
    }
    for cloud in [&first, second] {
        if cloud.height > 1 {
            return Err(Error::LayoutMismatch(format!(
                "cloud has {} rows, expected 1",
                cloud.height
            )));
        }
    }

    let point_step = first.point_step as usize;
    let len_first = point_step * first.width as usize;
    let len_second = point_step * second.width as usize;
    if first.data.len() < len_first {
        return Err(Error::UnexpectedEnd(first.data.len()));
    }
    if second.data.len() < len_second {
        return Err(Error::UnexpectedEnd(second.data.len()));
    }

    let width = first.width + second.width;
    let mut data = first.data;
    data.truncate(len_first);
    data.extend_from_slice(&second.data[..len_second]);

    Ok(PointCloud2 {
        header: first.header,
        height: 1,
        width,
        fields: first.fields,
        is_bigendian: first.is_bigendian,
        point_step: first.point_step,
        row_step: first.point_step * width,
        data,
        is_dense: first.is_dense && second.is_dense,
    })
}
