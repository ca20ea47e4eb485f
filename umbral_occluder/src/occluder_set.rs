// Copyright 2025 the Umbral Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame selection of the most useful occluders.

use alloc::vec::Vec;
use glam::Vec3;
use umbral_geom::{BoundingBox, BoundingSphere};

use crate::shadow_volume::ShadowVolumeOccluder;

/// Tuning for [`OccluderSet`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OccluderSetOptions {
    /// Occluders hiding less than this fraction of the frustum are rejected on insert.
    pub minimum_volume: f32,
    /// Occluders kept by [`OccluderSet::finalize`].
    pub maximum_active: usize,
}

impl Default for OccluderSetOptions {
    fn default() -> Self {
        Self {
            minimum_volume: 0.005,
            maximum_active: 10,
        }
    }
}

/// Candidate occluders for one frame, ranked by how much they hide.
///
/// Collect with [`OccluderSet::insert`], then call [`OccluderSet::finalize`] once before
/// querying. All occluders must be in the same frame as the bounds tested against them.
#[derive(Clone, Debug, Default)]
pub struct OccluderSet {
    options: OccluderSetOptions,
    occluders: Vec<ShadowVolumeOccluder>,
}

impl OccluderSet {
    /// Create an empty set.
    pub fn new(options: OccluderSetOptions) -> Self {
        Self {
            options,
            occluders: Vec::new(),
        }
    }

    /// The options in effect.
    pub fn options(&self) -> &OccluderSetOptions {
        &self.options
    }

    /// Add a candidate. Returns `false` if it hides too little to be worth testing.
    pub fn insert(&mut self, occluder: ShadowVolumeOccluder) -> bool {
        if occluder.volume() < self.options.minimum_volume {
            log::trace!(
                "rejecting occluder {:?}: volume {} below {}",
                occluder.node_path(),
                occluder.volume(),
                self.options.minimum_volume
            );
            return false;
        }
        self.occluders.push(occluder);
        true
    }

    /// Rank the candidates and drop the redundant ones.
    ///
    /// Occluders are sorted by descending volume. An occluder whose front face is hidden
    /// by a larger one is removed, as is any hole of a surviving occluder that a larger
    /// occluder covers. At most `maximum_active` occluders remain.
    pub fn finalize(&mut self) {
        self.occluders.sort_by(|a, b| b.volume().total_cmp(&a.volume()));

        let mut kept: Vec<ShadowVolumeOccluder> = Vec::with_capacity(self.occluders.len());
        for mut occludee in self.occluders.drain(..) {
            let hidden = kept.iter().any(|occluder| {
                occluder.contains_points(occludee.occluder_volume().reference_vertices())
            });
            if hidden {
                log::trace!("occluder {:?} is itself occluded", occludee.node_path());
                continue;
            }
            let removed = occludee.retain_holes(|hole| {
                !kept
                    .iter()
                    .any(|occluder| occluder.contains_points(hole.reference_vertices()))
            });
            if removed > 0 {
                log::trace!(
                    "dropped {removed} covered holes of occluder {:?}",
                    occludee.node_path()
                );
            }
            kept.push(occludee);
        }
        if kept.len() > self.options.maximum_active {
            log::trace!(
                "keeping {} of {} occluders",
                self.options.maximum_active,
                kept.len()
            );
            kept.truncate(self.options.maximum_active);
        }
        self.occluders = kept;
    }

    /// The occluders, largest first once finalized.
    pub fn occluders(&self) -> &[ShadowVolumeOccluder] {
        &self.occluders
    }

    /// Number of occluders.
    pub fn len(&self) -> usize {
        self.occluders.len()
    }

    /// True if there are no occluders.
    pub fn is_empty(&self) -> bool {
        self.occluders.is_empty()
    }

    /// Drop every occluder, keeping the options.
    pub fn clear(&mut self) {
        self.occluders.clear();
    }

    /// True if some occluder hides the whole sphere.
    pub fn is_occluded_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.occluders.iter().any(|o| o.contains_sphere(sphere))
    }

    /// True if some occluder hides the whole box.
    pub fn is_occluded_box(&self, bb: &BoundingBox) -> bool {
        self.occluders.iter().any(|o| o.contains_box(bb))
    }

    /// True if some occluder hides every point.
    pub fn is_occluded_points(&self, points: &[Vec3]) -> bool {
        self.occluders.iter().any(|o| o.contains_points(points))
    }
}
