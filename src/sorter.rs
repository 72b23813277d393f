//! Canonical depth ordering of a raw slice set. Strategies are tried in the
//! caller's priority order; the first that applies wins and total failure
//! degrades to the original order.

use crate::enums::SortMethod;
use crate::series::{Slice, SliceId};

use tracing::warn;

#[derive(Clone, Debug)]
pub struct SortOutcome {
    pub order: Vec<SliceId>,
    /// Strategy that produced the order, `None` when degraded.
    pub method: Option<SortMethod>,
    pub degraded: bool,
}

pub struct StackSorter;

impl StackSorter {
    /// Order `slices` into a canonical depth sequence. Equal keys keep their
    /// original relative order.
    pub fn sort(slices: &[Slice], methods: &[SortMethod]) -> SortOutcome {
        for &method in methods {
            let keyed = match method {
                SortMethod::InstanceNumber => Self::by_instance_number(slices),
                SortMethod::ContentTime => Self::by_content_time(slices),
                SortMethod::ImagePosition => Self::by_image_position(slices),
            };
            if let Some(order) = keyed {
                return SortOutcome {
                    order,
                    method: Some(method),
                    degraded: false,
                };
            }
        }

        warn!(
            tried = methods.len(),
            "no sort strategy applied, keeping original slice order"
        );
        SortOutcome {
            order: slices.iter().map(|s| s.id.clone()).collect(),
            method: None,
            degraded: true,
        }
    }

    fn by_instance_number(slices: &[Slice]) -> Option<Vec<SliceId>> {
        let keys: Option<Vec<f64>> = slices
            .iter()
            .map(|s| s.geometry.instance_number.map(f64::from))
            .collect();
        keys.map(|keys| Self::stable_order(slices, &keys))
    }

    fn by_content_time(slices: &[Slice]) -> Option<Vec<SliceId>> {
        // Acquisition time only orders explicitly time-resolved series.
        let phases = slices.first()?.geometry.cardiac_images?;
        if phases <= 1 {
            return None;
        }
        let keys: Option<Vec<f64>> = slices
            .iter()
            .map(|s| s.geometry.content_time.map(f64::from))
            .collect();
        keys.map(|keys| Self::stable_order(slices, &keys))
    }

    fn by_image_position(slices: &[Slice]) -> Option<Vec<SliceId>> {
        // Project positions onto the through-plane axis: the one least
        // represented by the in-plane cosines.
        let iop = slices.first()?.geometry.iop?;
        let mut axis = 0;
        let mut smallest = f32::INFINITY;
        for k in 0..3 {
            let in_plane = iop[k] * iop[k] + iop[k + 3] * iop[k + 3];
            if in_plane < smallest {
                smallest = in_plane;
                axis = k;
            }
        }
        let keys: Option<Vec<f64>> = slices
            .iter()
            .map(|s| s.geometry.ipp.map(|ipp| ipp[axis] as f64))
            .collect();
        keys.map(|keys| Self::stable_order(slices, &keys))
    }

    fn stable_order(slices: &[Slice], keys: &[f64]) -> Vec<SliceId> {
        let mut indices: Vec<usize> = (0..slices.len()).collect();
        indices.sort_by(|&a, &b| keys[a].total_cmp(&keys[b]));
        indices.into_iter().map(|i| slices[i].id.clone()).collect()
    }
}
