//! Nearest-voxel pixel content for a derived slice: every output pixel takes
//! exactly one source pixel's value by index inversion through the slice's
//! permute table. No interpolation, by design.

use crate::error::ResliceError;
use crate::geometry::PermuteTable;
use crate::pixel::PixelBuffer;
use crate::series::{Series, Slice};

use ndarray::{Array2, Zip};

pub struct PixelReslicer;

impl PixelReslicer {
    /// Compute the pixel buffer of a derived slice from the source series'
    /// cached buffers. The source is passed explicitly; nothing is read from
    /// shared state. Cost is O(rows * cols).
    pub fn reslice(target: &Slice, source: &Series) -> Result<PixelBuffer, ResliceError> {
        let origin = target
            .origin
            .as_ref()
            .ok_or_else(|| ResliceError::NotDerived(target.id.clone()))?;

        let first = source.first().ok_or(ResliceError::EmptySeries)?;
        let source_size = [first.geometry.cols, first.geometry.rows, source.len()];

        let table = origin.table;
        let depth = source_size[table[2].axis];
        if origin.frame >= depth {
            return Err(ResliceError::FrameOutOfRange {
                frame: origin.frame,
                depth,
            });
        }
        let frame = if table[2].flipped {
            depth - 1 - origin.frame
        } else {
            origin.frame
        };

        let rows = target.geometry.rows;
        let cols = target.geometry.cols;
        if cols != source_size[table[0].axis] || rows != source_size[table[1].axis] {
            return Err(ResliceError::InconsistentDimensions);
        }

        macro_rules! reslice_as {
            ($variant:ident) => {{
                let mut frames = Vec::with_capacity(source.len());
                for slice in source.slices() {
                    let array = match slice.pixels.as_ref() {
                        Some(PixelBuffer::$variant(array)) => array,
                        _ => return Err(ResliceError::MissingPixels(slice.id.clone())),
                    };
                    if array.dim() != (first.geometry.rows, first.geometry.cols) {
                        return Err(ResliceError::InconsistentDimensions);
                    }
                    frames.push(array);
                }
                PixelBuffer::$variant(invert_indices(&frames, &table, frame, rows, cols))
            }};
        }

        use crate::enums::PixelRepresentation::*;
        Ok(match first.geometry.representation {
            Uint8 => reslice_as!(Uint8),
            Sint8 => reslice_as!(Sint8),
            Uint16 => reslice_as!(Uint16),
            Sint16 => reslice_as!(Sint16),
            Uint32 => reslice_as!(Uint32),
            Sint32 => reslice_as!(Sint32),
        })
    }
}

/// Fill a `rows` x `cols` output plane. A flipped table entry mirrors the
/// corresponding target coordinate within its extent before it is placed
/// into the source coordinate triple; `frame` arrives already mirrored.
fn invert_indices<T: Copy + Default + Send + Sync>(
    frames: &[&Array2<T>],
    table: &PermuteTable,
    frame: usize,
    rows: usize,
    cols: usize,
) -> Array2<T> {
    let mut out = Array2::<T>::default((rows, cols));
    Zip::indexed(&mut out).par_for_each(|(j, i), px| {
        let mut coord = [0usize; 3];
        coord[table[0].axis] = if table[0].flipped { cols - 1 - i } else { i };
        coord[table[1].axis] = if table[1].flipped { rows - 1 - j } else { j };
        coord[table[2].axis] = frame;
        *px = frames[coord[2]][[coord[1], coord[0]]];
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::Orientation::{Axial, Coronal, Sagittal};
    use crate::metadata_builder::ReslicedMetadataBuilder;
    use crate::series::{IdNamespace, SliceGeometry};
    use ndarray::array;

    /// 2x2x2 axial stack with distinct voxel values 1..=8, frame-major.
    fn axial_fixture() -> Series {
        let frames = [array![[1u16, 2], [3, 4]], array![[5, 6], [7, 8]]];
        let mut series = Series::new("src", Axial);
        for (f, frame) in frames.into_iter().enumerate() {
            series.push(
                Slice::new(
                    format!("src.{f}"),
                    SliceGeometry {
                        rows: 2,
                        cols: 2,
                        pixel_spacing: Some([1.0, 1.0]),
                        thickness: Some(1.0),
                        iop: Some([1.0, 0.0, 0.0, 0.0, 1.0, 0.0]),
                        ipp: Some([0.0, 0.0, f as f32]),
                        ..SliceGeometry::default()
                    },
                )
                .with_pixels(PixelBuffer::Uint16(frame)),
            );
        }
        series
    }

    fn derive_with_pixels(source: &Series, from: crate::enums::Orientation, to: crate::enums::Orientation) -> Series {
        let mut ids = IdNamespace::new(format!("{}.derived", source.id));
        let mut derived =
            ReslicedMetadataBuilder::build("derived", from, to, source, &mut ids).unwrap();
        let order: Vec<_> = derived.slice_ids().to_vec();
        for id in order {
            let pixels = {
                let slice = derived.get(&id).unwrap();
                PixelReslicer::reslice(slice, source).unwrap()
            };
            derived.get_mut(&id).unwrap().pixels = Some(pixels);
        }
        derived
    }

    #[test]
    fn sagittal_pixels_from_axial_cube() {
        let source = axial_fixture();
        let derived = derive_with_pixels(&source, Axial, Sagittal);

        assert_eq!(derived.len(), 2);
        assert_eq!(
            derived.at(0).unwrap().pixels,
            Some(PixelBuffer::Uint16(array![[6, 8], [2, 4]]))
        );
        assert_eq!(
            derived.at(1).unwrap().pixels,
            Some(PixelBuffer::Uint16(array![[5, 7], [1, 3]]))
        );
    }

    #[test]
    fn coronal_pixels_from_axial_cube() {
        let source = axial_fixture();
        let derived = derive_with_pixels(&source, Axial, Coronal);

        // Coronal slice f fixes the source row; derived rows walk the frame
        // axis in reverse, so the far frame lands on top.
        assert_eq!(derived.len(), 2);
        assert_eq!(
            derived.at(0).unwrap().pixels,
            Some(PixelBuffer::Uint16(array![[5, 6], [1, 2]]))
        );
        assert_eq!(
            derived.at(1).unwrap().pixels,
            Some(PixelBuffer::Uint16(array![[7, 8], [3, 4]]))
        );
    }

    #[test]
    fn out_of_range_frame_is_reported() {
        let source = axial_fixture();
        let mut ids = IdNamespace::new("d");
        let mut derived =
            ReslicedMetadataBuilder::build("d", Axial, Sagittal, &source, &mut ids).unwrap();
        let slice = derived.at_mut(0).unwrap();
        slice.origin.as_mut().unwrap().frame = 9;
        assert!(matches!(
            PixelReslicer::reslice(derived.at(0).unwrap(), &source),
            Err(ResliceError::FrameOutOfRange { frame: 9, depth: 2 })
        ));
    }

    #[test]
    fn mismatched_source_buffer_is_reported() {
        let mut source = axial_fixture();
        let mut ids = IdNamespace::new("d");
        let derived =
            ReslicedMetadataBuilder::build("d", Axial, Sagittal, &source, &mut ids).unwrap();
        // Shrink one cached buffer after the metadata was built.
        source.at_mut(1).unwrap().pixels = Some(PixelBuffer::Uint16(array![[9u16]]));
        assert!(matches!(
            PixelReslicer::reslice(derived.at(0).unwrap(), &source),
            Err(ResliceError::InconsistentDimensions)
        ));
    }

    #[test]
    fn reslice_is_idempotent() {
        let source = axial_fixture();
        let mut ids = IdNamespace::new("d");
        let derived =
            ReslicedMetadataBuilder::build("d", Axial, Sagittal, &source, &mut ids).unwrap();
        let slice = derived.at(1).unwrap();
        let first = PixelReslicer::reslice(slice, &source).unwrap();
        let second = PixelReslicer::reslice(slice, &source).unwrap();
        assert_eq!(first.contiguous_bytes(), second.contiguous_bytes());
        assert!(first.contiguous_bytes().is_some());
    }

    #[test]
    fn axial_sagittal_axial_round_trip_restores_every_voxel() {
        let source = axial_fixture();
        let sagittal = derive_with_pixels(&source, Axial, Sagittal);
        let restored = derive_with_pixels(&sagittal, Sagittal, Axial);

        assert_eq!(restored.len(), source.len());
        for f in 0..source.len() {
            assert_eq!(
                restored.at(f).unwrap().pixels,
                source.at(f).unwrap().pixels,
                "frame {f}"
            );
        }
    }

    #[test]
    fn slice_without_origin_is_rejected() {
        let source = axial_fixture();
        let plain = Slice::new("plain", SliceGeometry::default());
        assert!(matches!(
            PixelReslicer::reslice(&plain, &source),
            Err(ResliceError::NotDerived(_))
        ));
    }

    #[test]
    fn missing_source_buffer_is_reported() {
        let mut source = axial_fixture();
        source.at_mut(1).unwrap().pixels = None;
        let mut ids = IdNamespace::new("d");
        let derived =
            ReslicedMetadataBuilder::build("d", Axial, Sagittal, &source, &mut ids).unwrap();
        assert!(matches!(
            PixelReslicer::reslice(derived.at(0).unwrap(), &source),
            Err(ResliceError::MissingPixels(id)) if id == "src.1"
        ));
    }
}
