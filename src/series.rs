//! Slice and series containers. A series owns its slices exclusively; the
//! ordered id list and the id map are kept in 1:1 correspondence.

use crate::enums::{Orientation, PixelRepresentation};
use crate::geometry::{self, PermuteTable};
use crate::pixel::PixelBuffer;

use std::collections::HashMap;

pub type SliceId = String;

/// Default display window, derived from the sample range when not declared.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindowLevel {
    pub center: f64,
    pub width: f64,
}

/// Back-reference carried by a derived slice: the table it was derived
/// through, its depth index in the derived stack, and the source slice its
/// metadata was read from. Consumed by the pixel reslicer.
#[derive(Clone, Debug)]
pub struct ResliceOrigin {
    pub table: PermuteTable,
    pub frame: usize,
    pub source_slice: SliceId,
}

/// Geometric and value metadata of one slice, as extracted by the decoding
/// collaborator or synthesized for a derived plane.
///
/// `pixel_spacing` is `[row spacing, column spacing]`; `iop` is the
/// row-direction cosines followed by the column-direction cosines.
#[derive(Clone, Debug, Default)]
pub struct SliceGeometry {
    pub rows: usize,
    pub cols: usize,
    pub pixel_spacing: Option<[f32; 2]>,
    pub thickness: Option<f32>,
    pub iop: Option<[f32; 6]>,
    pub ipp: Option<[f32; 3]>,
    pub representation: PixelRepresentation,
    pub rescale_slope: f32,
    pub rescale_intercept: f32,
    pub window: Option<WindowLevel>,
    pub slice_location: Option<f32>,
    pub instance_number: Option<i32>,
    pub content_time: Option<f32>,
    pub cardiac_images: Option<u32>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct Slice {
    pub id: SliceId,
    pub geometry: SliceGeometry,
    pub pixels: Option<PixelBuffer>,
    pub origin: Option<ResliceOrigin>,
}

impl Slice {
    pub fn new(id: impl Into<SliceId>, geometry: SliceGeometry) -> Self {
        Self {
            id: id.into(),
            geometry,
            pixels: None,
            origin: None,
        }
    }

    pub fn with_pixels(mut self, pixels: PixelBuffer) -> Self {
        self.geometry.representation = pixels.representation();
        self.pixels = Some(pixels);
        self
    }
}

/// An ordered stack of slices in one orientation.
#[derive(Clone, Debug)]
pub struct Series {
    pub id: String,
    pub orientation: Orientation,
    slice_ids: Vec<SliceId>,
    slices: HashMap<SliceId, Slice>,
    pub current_index: usize,
    pub window: Option<WindowLevel>,
}

impl Series {
    pub fn new(id: impl Into<String>, orientation: Orientation) -> Self {
        Self {
            id: id.into(),
            orientation,
            slice_ids: Vec::new(),
            slices: HashMap::new(),
            current_index: 0,
            window: None,
        }
    }

    pub fn push(&mut self, slice: Slice) {
        self.slice_ids.push(slice.id.clone());
        self.slices.insert(slice.id.clone(), slice);
    }

    pub fn len(&self) -> usize {
        self.slice_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slice_ids.is_empty()
    }

    pub fn slice_ids(&self) -> &[SliceId] {
        &self.slice_ids
    }

    pub fn get(&self, id: &str) -> Option<&Slice> {
        self.slices.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Slice> {
        self.slices.get_mut(id)
    }

    pub fn at(&self, index: usize) -> Option<&Slice> {
        self.slice_ids.get(index).and_then(|id| self.slices.get(id))
    }

    pub fn at_mut(&mut self, index: usize) -> Option<&mut Slice> {
        let id = self.slice_ids.get(index)?.clone();
        self.slices.get_mut(&id)
    }

    pub fn first(&self) -> Option<&Slice> {
        self.at(0)
    }

    pub fn slices(&self) -> impl Iterator<Item = &Slice> {
        self.slice_ids.iter().filter_map(|id| self.slices.get(id))
    }

    /// Reorder the stack. Ids absent from `order` are dropped; ids unknown to
    /// the series are ignored.
    pub fn reorder(&mut self, order: &[SliceId]) {
        self.slice_ids = order
            .iter()
            .filter(|id| self.slices.contains_key(*id))
            .cloned()
            .collect();
        self.slices.retain(|id, _| self.slice_ids.contains(id));
    }

    /// Absolute distance between two slices measured along the stack normal.
    /// Zero for stacks of one slice or when geometry is missing.
    pub fn distance_between_slices(&self, idx1: usize, idx2: usize) -> f32 {
        if self.len() <= 1 {
            return 0.0;
        }
        let Some((a, b)) = self.at(idx1).zip(self.at(idx2)) else {
            return 0.0;
        };
        let Some(iop) = a.geometry.iop else {
            return 0.0;
        };
        let Some((ipp1, ipp2)) = a.geometry.ipp.zip(b.geometry.ipp) else {
            return 0.0;
        };
        let normal = geometry::normal(iop);
        (geometry::dot(ipp1, normal) - geometry::dot(ipp2, normal)).abs()
    }
}

/// Deterministic generator of fresh slice ids within a namespace.
#[derive(Clone, Debug)]
pub struct IdNamespace {
    prefix: String,
    next: u64,
}

impl IdNamespace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }

    pub fn next_id(&mut self) -> SliceId {
        let id = format!("{}.{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}
