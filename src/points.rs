// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Range filtering and per-point value assembly.

use crate::{
    layout::{ChannelKind, FieldLayout},
    scan::LaserScan,
};

/// Per-point value tuples stored contiguously with a fixed stride.
///
/// Each point holds one value per field element of its layout, in layout
/// order. Values are kept as `f64` and converted to the field datatype when
/// packed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Points {
    values: Vec<f64>,
    stride: usize,
}

impl Points {
    /// Create an empty set of points with `stride` values per point.
    pub fn new(stride: usize) -> Self {
        Self {
            values: Vec::new(),
            stride,
        }
    }

    /// Create an empty set with room for `capacity` points.
    pub fn with_capacity(stride: usize, capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(stride * capacity),
            stride,
        }
    }

    /// Build from explicit tuples. Every tuple must have `stride` values.
    ///
    /// Returns the index of the first offending tuple on length mismatch.
    pub fn from_tuples<T: AsRef<[f64]>>(stride: usize, tuples: &[T]) -> Result<Self, usize> {
        let mut points = Self::with_capacity(stride, tuples.len());
        for (index, tuple) in tuples.iter().enumerate() {
            let tuple = tuple.as_ref();
            if tuple.len() != stride {
                return Err(index);
            }
            points.values.extend_from_slice(tuple);
        }
        Ok(points)
    }

    /// Values per point.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        if self.stride == 0 {
            0
        } else {
            self.values.len() / self.stride
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values of the point at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&[f64]> {
        let start = index.checked_mul(self.stride)?;
        self.values.get(start..start.checked_add(self.stride)?)
    }

    /// Iterate over the point tuples in order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &[f64]> + '_ {
        // chunks_exact panics on a zero chunk size
        self.values.chunks_exact(self.stride.max(1))
    }

    /// Append one point.
    ///
    /// # Panics
    ///
    /// Panics if `values` does not have exactly `stride` entries.
    pub fn push(&mut self, values: &[f64]) {
        assert_eq!(values.len(), self.stride, "point stride mismatch");
        self.values.extend_from_slice(values);
    }
}

/// Effective upper range bound for a scan.
///
/// A negative `range_cutoff` selects the scan's own `range_max`; otherwise
/// the tighter of the two is used. The bound is in the precision of the
/// readings it is compared against.
#[inline]
pub fn effective_cutoff(range_cutoff: f64, range_max: f32) -> f32 {
    if range_cutoff < 0.0 {
        range_max
    } else {
        (range_cutoff as f32).min(range_max)
    }
}

/// Project and filter the readings of `scan` into value tuples for `layout`.
///
/// A reading `r` at beam `i` is kept iff `range_min <= r < cutoff`; anything
/// else (including NaN) is dropped, so the output holds only surviving
/// beams. `cos` and `sin` must hold one entry per beam.
///
/// The viewpoint channel is emitted as the sensor origin `(0, 0, 0)`.
pub fn assemble_points(
    scan: &LaserScan,
    cos: &[f64],
    sin: &[f64],
    layout: &FieldLayout,
    range_cutoff: f64,
) -> Points {
    debug_assert_eq!(cos.len(), scan.len());
    debug_assert_eq!(sin.len(), scan.len());

    let cutoff = effective_cutoff(range_cutoff, scan.range_max);
    let intensity = layout.has_channel(ChannelKind::Intensity) && scan.has_intensities();
    let index = layout.has_channel(ChannelKind::Index);
    let distance = layout.has_channel(ChannelKind::Distance);
    let timestamp = layout.has_channel(ChannelKind::Timestamp);
    let viewpoint = layout.has_channel(ChannelKind::Viewpoint);

    let stride = layout.value_count();
    let mut points = Points::with_capacity(stride, scan.len());
    let mut tuple = Vec::with_capacity(stride);

    for (i, ((&range, &c), &s)) in scan.ranges.iter().zip(cos).zip(sin).enumerate() {
        if !(range >= scan.range_min && range < cutoff) {
            continue;
        }
        let r = range as f64;

        tuple.clear();
        tuple.extend_from_slice(&[r * c, r * s, 0.0]);
        if intensity {
            tuple.push(scan.intensities[i] as f64);
        }
        if index {
            tuple.push(i as f64);
        }
        if distance {
            tuple.push(r);
        }
        if timestamp {
            tuple.push(i as f64 * scan.time_increment);
        }
        if viewpoint {
            tuple.extend_from_slice(&[0.0; 3]);
        }
        points.push(&tuple);
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{angles::AngleCache, layout::ChannelOptions, scan::tests::scan};

    fn assemble(scan: &LaserScan, options: ChannelOptions, range_cutoff: f64) -> Points {
        let mut cache = AngleCache::new();
        let (cos, sin) = cache.basis(
            scan.len(),
            scan.angle_min,
            scan.angle_max,
            scan.angle_increment,
        );
        let layout = FieldLayout::build(scan.has_intensities(), options);
        assemble_points(scan, cos, sin, &layout, range_cutoff)
    }

    #[test]
    fn test_effective_cutoff() {
        assert_eq!(effective_cutoff(-1.0, 5.0), 5.0);
        assert_eq!(effective_cutoff(3.0, 5.0), 3.0);
        assert_eq!(effective_cutoff(7.0, 5.0), 5.0);
        assert_eq!(effective_cutoff(0.0, 5.0), 0.0);
    }

    #[test]
    fn test_range_filter_bounds() {
        let mut s = scan(vec![0.05, 4.99, 5.0, 0.1, f32::NAN, f32::INFINITY], vec![]);
        s.range_max = 5.0;
        let points = assemble(&s, ChannelOptions::from_bits(0x02), -1.0);

        let kept: Vec<f64> = points.iter().map(|p| p[3]).collect();
        assert_eq!(kept, vec![1.0, 3.0]);
    }

    #[test]
    fn test_reading_on_inexact_bounds() {
        // 0.7 has no exact binary representation
        let mut s = scan(vec![0.7], vec![]);
        s.range_min = 0.7;
        assert_eq!(assemble(&s, ChannelOptions::NONE, -1.0).len(), 1);

        s.range_min = 0.1;
        s.range_max = 0.7;
        assert!(assemble(&s, ChannelOptions::NONE, -1.0).is_empty());

        s.range_max = 10.0;
        assert!(assemble(&s, ChannelOptions::NONE, 0.7).is_empty());
        assert_eq!(assemble(&s, ChannelOptions::NONE, 0.70001).len(), 1);
    }

    #[test]
    fn test_get_out_of_range() {
        let points = Points::from_tuples(3, &[[1.0, 2.0, 3.0]]).unwrap();
        assert_eq!(points.get(0), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(points.get(1), None);
        assert_eq!(points.get(usize::MAX / 3), None);
    }

    #[test]
    fn test_range_cutoff_tighter_than_max() {
        let s = scan(vec![1.0, 2.0, 3.0, 4.0], vec![]);
        let points = assemble(&s, ChannelOptions::from_bits(0x02), 2.5);
        assert_eq!(points.len(), 2);
        assert_eq!(points.get(1).unwrap()[3], 1.0);
    }

    #[test]
    fn test_values_in_layout_order() {
        let s = scan(vec![2.0, 1.0], vec![7.0, 9.0]);
        let points = assemble(&s, ChannelOptions::ALL, -1.0);
        assert_eq!(points.stride(), 10);
        assert_eq!(points.len(), 2);

        let p = points.get(1).unwrap();
        assert!(p[0].abs() < 1e-9);
        assert!((p[1] - 1.0).abs() < 1e-9);
        assert_eq!(p[2], 0.0);
        assert_eq!(p[3], 9.0);
        assert_eq!(p[4], 1.0);
        assert_eq!(p[5], 1.0);
        assert!((p[6] - 0.001).abs() < 1e-12);
        assert_eq!(&p[7..], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_intensity_requested_without_data() {
        let s = scan(vec![2.0, 1.0], vec![]);
        let points = assemble(&s, ChannelOptions::default(), -1.0);
        assert_eq!(points.stride(), 4);
        assert_eq!(points.get(0).unwrap(), &[2.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_empty_scan() {
        let s = scan(vec![], vec![]);
        let points = assemble(&s, ChannelOptions::default(), -1.0);
        assert!(points.is_empty());
        assert_eq!(points.iter().count(), 0);
    }

    #[test]
    fn test_from_tuples_rejects_short_tuple() {
        let tuples = vec![vec![1.0, 2.0, 3.0], vec![1.0, 2.0]];
        assert_eq!(Points::from_tuples(3, &tuples), Err(1));
        let points = Points::from_tuples(3, &tuples[..1]).unwrap();
        assert_eq!(points.len(), 1);
    }
}
