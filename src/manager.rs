//! Stateful orchestrator. One context object per viewer session owns every
//! series and pixel buffer it creates; derived orientations are built lazily
//! on first request and cached until `remove`.

use crate::enums::{Orientation, SortMethod};
use crate::error::ResliceError;
use crate::metadata_builder::ReslicedMetadataBuilder;
use crate::reslicer::PixelReslicer;
use crate::series::{IdNamespace, Series, Slice, WindowLevel};
use crate::sorter::StackSorter;

use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Cooperative cancellation for the full-volume reslice path, which is
/// O(slices * rows * cols) and may be long-running.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

type SeriesKey = (String, Orientation);

/// Owns the `series id -> orientation -> series` mapping. Writes hold the
/// store lock for the whole build, so duplicate populate calls for the same
/// key serialize instead of racing.
#[derive(Default)]
pub struct VolumeManager {
    store: RwLock<HashMap<SeriesKey, Series>>,
}

impl VolumeManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest a fully decoded native stack as the axial entry for
    /// `series_id`, replacing any previous entry. Slices are brought into
    /// canonical depth order by the given sort strategies; the default
    /// window is derived from the global sample range.
    pub fn ingest(
        &self,
        series_id: &str,
        slices: Vec<Slice>,
        sort_methods: &[SortMethod],
    ) -> Result<(), ResliceError> {
        if slices.is_empty() {
            return Err(ResliceError::EmptySeries);
        }
        Self::validate_dimensions(&slices)?;

        let outcome = StackSorter::sort(&slices, sort_methods);
        if outcome.degraded {
            warn!(series_id, "ingesting series in original slice order");
        }

        let mut series = Series::new(series_id, Orientation::Axial);
        for slice in slices {
            series.push(slice);
        }
        series.reorder(&outcome.order);

        let window = Self::annotate_sample_range(&mut series)?;
        series.window = Some(window);
        series.current_index = series.len() / 2;

        self.store
            .write()
            .insert((series_id.to_string(), Orientation::Axial), series);
        Ok(())
    }

    /// Ensure the entry for `(series_id, orientation)` is ready, building it
    /// if needed. The axial entry must have been ingested first; derived
    /// orientations are computed from it slice by slice, honoring `cancel`
    /// between slices.
    pub fn populate(
        &self,
        series_id: &str,
        orientation: Orientation,
        cancel: &CancelToken,
    ) -> Result<(), ResliceError> {
        let mut store = self.store.write();
        if store.contains_key(&(series_id.to_string(), orientation)) {
            debug!(series_id, orientation = orientation.label(), "cache hit");
            return Ok(());
        }
        if orientation == Orientation::Axial {
            return Err(ResliceError::NativeNotReady(series_id.to_string()));
        }

        let source = store
            .get(&(series_id.to_string(), Orientation::Axial))
            .ok_or_else(|| ResliceError::NativeNotReady(series_id.to_string()))?;

        let mut ids = IdNamespace::new(format!("{series_id}.{}", orientation.label()));
        let mut derived = ReslicedMetadataBuilder::build(
            series_id,
            Orientation::Axial,
            orientation,
            source,
            &mut ids,
        )?;

        let order: Vec<_> = derived.slice_ids().to_vec();
        for id in order {
            if cancel.is_cancelled() {
                return Err(ResliceError::Cancelled);
            }
            let pixels = {
                let slice = derived
                    .get(&id)
                    .ok_or_else(|| ResliceError::MissingPixels(id.clone()))?;
                PixelReslicer::reslice(slice, source)?
            };
            if let Some(slice) = derived.get_mut(&id) {
                slice.pixels = Some(pixels);
            }
        }

        let window = Self::annotate_sample_range(&mut derived)?;
        derived.window = Some(window);
        derived.current_index = derived.len() / 2;

        debug!(
            series_id,
            orientation = orientation.label(),
            slices = derived.len(),
            "derived series ready"
        );
        store.insert((series_id.to_string(), orientation), derived);
        Ok(())
    }

    /// The cached series for an orientation, if ready.
    pub fn get(
        &self,
        series_id: &str,
        orientation: Orientation,
    ) -> Option<MappedRwLockReadGuard<'_, Series>> {
        let key = (series_id.to_string(), orientation);
        RwLockReadGuard::try_map(self.store.read(), |store| store.get(&key)).ok()
    }

    pub fn current_index(&self, series_id: &str, orientation: Orientation) -> Option<usize> {
        self.get(series_id, orientation).map(|s| s.current_index)
    }

    /// Move the cursor of a ready series. Returns `false` when the entry is
    /// absent or the index is out of range.
    pub fn set_current_index(
        &self,
        series_id: &str,
        orientation: Orientation,
        index: usize,
    ) -> bool {
        let mut store = self.store.write();
        match store.get_mut(&(series_id.to_string(), orientation)) {
            Some(series) if index < series.len() => {
                series.current_index = index;
                true
            }
            _ => false,
        }
    }

    /// Purge every orientation entry for `series_id`, releasing the pixel
    /// buffers.
    pub fn remove(&self, series_id: &str) {
        let mut store = self.store.write();
        for orientation in Orientation::ALL {
            store.remove(&(series_id.to_string(), orientation));
        }
        debug!(series_id, "series removed");
    }

    /// Every slice in one stack must share rows, cols and representation,
    /// and each buffer must match its declared extent.
    fn validate_dimensions(slices: &[Slice]) -> Result<(), ResliceError> {
        let first = &slices[0].geometry;
        for slice in slices {
            let geo = &slice.geometry;
            let buffer_dim = slice.pixels.as_ref().map(|p| p.dim());
            if geo.rows != first.rows
                || geo.cols != first.cols
                || geo.representation != first.representation
                || buffer_dim.is_some_and(|dim| dim != (geo.rows, geo.cols))
            {
                return Err(ResliceError::InconsistentDimensions);
            }
        }
        Ok(())
    }

    /// Record per-slice min/max and return the default window for the whole
    /// stack (`width = max - min`, `center = (max + min) / 2`).
    fn annotate_sample_range(series: &mut Series) -> Result<WindowLevel, ResliceError> {
        let mut global: Option<(f64, f64)> = None;
        let order: Vec<_> = series.slice_ids().to_vec();
        for id in order {
            let slice = series
                .get_mut(&id)
                .ok_or_else(|| ResliceError::MissingPixels(id.clone()))?;
            let (min, max) = slice
                .pixels
                .as_ref()
                .and_then(|p| p.min_max())
                .ok_or_else(|| ResliceError::MissingPixels(id.clone()))?;
            slice.geometry.min_value = Some(min);
            slice.geometry.max_value = Some(max);
            global = Some(match global {
                Some((lo, hi)) => (lo.min(min), hi.max(max)),
                None => (min, max),
            });
        }
        let (min, max) = global.ok_or(ResliceError::EmptySeries)?;
        Ok(WindowLevel {
            center: (max + min) / 2.0,
            width: max - min,
        })
    }
}
