// Copyright 2025 the Umbral Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Occluder polygons in the occluding object's local frame.

use alloc::vec::Vec;
use glam::Vec3;

/// A convex planar polygon given as a vertex loop.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConvexPlanarPolygon {
    vertices: Vec<Vec3>,
}

impl ConvexPlanarPolygon {
    /// Create a polygon from its vertex loop.
    pub fn new(vertices: Vec<Vec3>) -> Self {
        Self { vertices }
    }

    /// Append a vertex to the loop.
    pub fn add(&mut self, vertex: Vec3) {
        self.vertices.push(vertex);
    }

    /// The vertex loop.
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// True if there are no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

impl From<Vec<Vec3>> for ConvexPlanarPolygon {
    fn from(vertices: Vec<Vec3>) -> Self {
        Self::new(vertices)
    }
}

/// An occluding polygon with optional see-through holes.
///
/// Holes lie in the occluder's plane and inside its outline.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConvexPlanarOccluder {
    occluder: ConvexPlanarPolygon,
    holes: Vec<ConvexPlanarPolygon>,
}

impl ConvexPlanarOccluder {
    /// Create an occluder without holes.
    pub fn new(occluder: impl Into<ConvexPlanarPolygon>) -> Self {
        Self {
            occluder: occluder.into(),
            holes: Vec::new(),
        }
    }

    /// Add a hole, builder style.
    pub fn with_hole(mut self, hole: impl Into<ConvexPlanarPolygon>) -> Self {
        self.add_hole(hole);
        self
    }

    /// Add a hole.
    pub fn add_hole(&mut self, hole: impl Into<ConvexPlanarPolygon>) {
        self.holes.push(hole.into());
    }

    /// The outline.
    pub fn occluder(&self) -> &ConvexPlanarPolygon {
        &self.occluder
    }

    /// Mutable access to the outline.
    pub fn occluder_mut(&mut self) -> &mut ConvexPlanarPolygon {
        &mut self.occluder
    }

    /// The holes.
    pub fn holes(&self) -> &[ConvexPlanarPolygon] {
        &self.holes
    }
}
