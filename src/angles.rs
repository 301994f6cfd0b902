// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Cached cosine/sine basis for projecting beam ranges.
//!
//! A laser's scan geometry rarely changes between sweeps, so the per-beam
//! unit vectors are computed once and reused until the beam count or the
//! angular bounds change.
//!
//! The cache key is `(N, angle_min, angle_max)`. The angle increment is not
//! part of the key: a producer that changes only `angle_increment` while
//! keeping the bounds and beam count fixed will be served the previous
//! basis. Call [`AngleCache::invalidate`] if that can happen.

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Geometry {
    n: usize,
    angle_min: f64,
    angle_max: f64,
}

/// Memoized per-beam cosine and sine vectors.
///
/// Owned by a single projector. The cache is mutated through `&mut self`
/// so concurrent use requires external synchronization.
#[derive(Debug, Default, Clone)]
pub struct AngleCache {
    geometry: Option<Geometry>,
    cos: Vec<f64>,
    sin: Vec<f64>,
    generation: u64,
}

impl AngleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the basis for the given geometry, recomputing it only when
    /// the beam count or angular bounds differ from the cached ones.
    pub fn basis(
        &mut self,
        n: usize,
        angle_min: f64,
        angle_max: f64,
        angle_increment: f64,
    ) -> (&[f64], &[f64]) {
        let geometry = Geometry {
            n,
            angle_min,
            angle_max,
        };

        if self.geometry != Some(geometry) {
            self.cos.clear();
            self.sin.clear();
            self.cos.reserve(n);
            self.sin.reserve(n);
            for index in 0..n {
                let (sin, cos) = (angle_min + index as f64 * angle_increment).sin_cos();
                self.cos.push(cos);
                self.sin.push(sin);
            }
            self.geometry = Some(geometry);
            self.generation += 1;
            debug!(
                n,
                angle_min, angle_max, angle_increment, "recomputed angle basis"
            );
        }

        (&self.cos, &self.sin)
    }

    /// Number of times the basis has been computed.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Force the next [`Self::basis`] call to recompute.
    pub fn invalidate(&mut self) {
        self.geometry = None;
    }
}
