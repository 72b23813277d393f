//! # MPR-volume library
//!
//! This crate derives the two orthogonal orientations of a stack of decoded
//! 2D cross-sectional slices: per-slice geometric metadata (size, spacing,
//! orientation cosines, position, slice location) and the actual pixel
//! content, by axis-aligned nearest-voxel reslicing.
//!
//! The crate consumes already-decoded pixel buffers and already-extracted
//! geometric attributes; decoding image formats, rendering and I/O belong to
//! its collaborators. A [`VolumeManager`] created per viewer session owns
//! every series it builds:
//!  - the native stack is ingested once, sorted into canonical depth order
//!    by a prioritized chain of strategies,
//!  - Coronal and Sagittal stacks are built lazily on first `populate` and
//!    cached until `remove`.
//!
//! Derived pixel content is exact: every output pixel takes one source
//! pixel's value through a fixed signed axis permutation, so reslicing back
//! to the starting orientation restores the original volume voxel for voxel.
//!
//! # Examples
//!
//! Ingest a decoded axial stack and read the center sagittal slice:
//!
//! ```no_run
//! # use mpr_volume::{CancelToken, Orientation, SortMethod, VolumeManager};
//! # let decoded_slices = Vec::new();
//! let manager = VolumeManager::new();
//! manager
//!     .ingest("series-1", decoded_slices, &[SortMethod::InstanceNumber])
//!     .expect("native stack should ingest");
//! manager
//!     .populate("series-1", Orientation::Sagittal, &CancelToken::new())
//!     .expect("sagittal stack should build");
//! let sagittal = manager
//!     .get("series-1", Orientation::Sagittal)
//!     .expect("populated series is cached");
//! let center = sagittal.at(sagittal.current_index);
//! ```

pub mod enums;
pub mod error;
pub mod geometry;
pub mod manager;
pub mod metadata_builder;
pub mod pixel;
pub mod reslicer;
pub mod series;
pub mod sorter;

pub use enums::{Orientation, PixelRepresentation, SortMethod};
pub use error::ResliceError;
pub use manager::{CancelToken, VolumeManager};
pub use metadata_builder::{PlaneGeometry, ReslicedMetadataBuilder};
pub use pixel::PixelBuffer;
pub use reslicer::PixelReslicer;
pub use series::{IdNamespace, Series, Slice, SliceGeometry, WindowLevel};
pub use sorter::{SortOutcome, StackSorter};
