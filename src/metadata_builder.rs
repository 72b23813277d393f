//! Derives the per-slice geometric metadata of an orthogonal stack from a
//! source series, without touching pixel data. The pixel stage consumes the
//! [`ResliceOrigin`] stored on every emitted slice.

use crate::enums::Orientation;
use crate::error::ResliceError;
use crate::geometry;
use crate::series::{IdNamespace, ResliceOrigin, Series, Slice, SliceGeometry};

/// Externally computed plane geometry for one output frame, used by
/// [`ReslicedMetadataBuilder::build_from_planes`].
#[derive(Clone, Copy, Debug)]
pub struct PlaneGeometry {
    pub iop: [f32; 6],
    pub ipp: [f32; 3],
}

pub struct ReslicedMetadataBuilder;

struct SourceFrame {
    iop: [f32; 6],
    ipp: [f32; 3],
    /// Index-space extents: `[cols, rows, frames]`.
    size: [usize; 3],
    /// Physical step per index along each axis:
    /// `[col spacing, row spacing, inter-slice distance]`.
    spacing: [f32; 3],
}

impl ReslicedMetadataBuilder {
    /// Build a metadata-only derived series for `to`, reading geometry from
    /// the first slice of `source` (acquired in `from`). Pixel buffers are
    /// left empty; ids are drawn from `ids`.
    pub fn build(
        target_series_id: &str,
        from: Orientation,
        to: Orientation,
        source: &Series,
        ids: &mut IdNamespace,
    ) -> Result<Series, ResliceError> {
        let table = geometry::permute_table(from, to)?;
        let frame = Self::read_source_frame(source)?;

        let to_size = [
            frame.size[table[0].axis],
            frame.size[table[1].axis],
            frame.size[table[2].axis],
        ];
        let to_spacing = geometry::permute_values(&table, frame.spacing);

        let row_dir = [frame.iop[0], frame.iop[1], frame.iop[2]];
        let col_dir = [frame.iop[3], frame.iop[4], frame.iop[5]];
        let source_normal = geometry::normal(frame.iop);
        let directions = [row_dir, col_dir, source_normal];

        let axes = geometry::permute_vectors(&table, directions);
        let resliced_iop = [
            axes[0][0], axes[0][1], axes[0][2],
            axes[1][0], axes[1][1], axes[1][2],
        ];
        let resliced_normal = geometry::cross(axes[0], axes[1]);
        let major = geometry::major_axis(resliced_normal);

        // The derived stack steps through the source axis named by the third
        // table entry, so the step direction and width come from that axis.
        let versor = directions[table[2].axis];
        let step = frame.spacing[table[2].axis];

        let mut base = frame.ipp;
        if table[1].flipped {
            // Target rows walk the source frame axis in reverse; the derived
            // reference corner sits past the far end of the stack.
            let span = frame.size[2] as f32 * frame.spacing[2];
            for k in 0..3 {
                base[k] += span * source_normal[k];
            }
        }

        let first = source.first().ok_or(ResliceError::EmptySeries)?;
        let template = first.geometry.clone();
        let source_slice_id = first.id.clone();

        let mut series = Series::new(target_series_id, to);
        for f in 0..to_size[2] {
            let index = if table[2].flipped {
                (to_size[2] - f) as f32
            } else {
                f as f32
            };
            let mut ipp = base;
            for k in 0..3 {
                ipp[k] += index * step * versor[k];
            }

            let slice = Self::derived_slice(
                ids.next_id(),
                &template,
                to_size,
                to_spacing,
                resliced_iop,
                ipp,
                ipp[major],
            );
            series.push(Slice {
                origin: Some(ResliceOrigin {
                    table,
                    frame: f,
                    source_slice: source_slice_id.clone(),
                }),
                ..slice
            });
        }
        Ok(series)
    }

    /// Variant for an external reformatting engine that already supplies one
    /// plane per output frame: a straight copy into the slice-metadata shape,
    /// with no axis inference and no reslice origin.
    pub fn build_from_planes(
        target_series_id: &str,
        to: Orientation,
        source: &Series,
        planes: &[PlaneGeometry],
        ids: &mut IdNamespace,
    ) -> Result<Series, ResliceError> {
        let first = source.first().ok_or(ResliceError::EmptySeries)?;
        let template = first.geometry.clone();
        let pixel_spacing = template
            .pixel_spacing
            .ok_or(ResliceError::SourceGeometryUnavailable("pixel spacing"))?;
        let size = [template.cols, template.rows, planes.len()];
        let spacing = [
            pixel_spacing[1],
            pixel_spacing[0],
            template.thickness.unwrap_or_default(),
        ];

        let mut series = Series::new(target_series_id, to);
        for plane in planes {
            let major = geometry::major_axis(geometry::normal(plane.iop));
            series.push(Self::derived_slice(
                ids.next_id(),
                &template,
                size,
                spacing,
                plane.iop,
                plane.ipp,
                plane.ipp[major],
            ));
        }
        Ok(series)
    }

    fn read_source_frame(source: &Series) -> Result<SourceFrame, ResliceError> {
        let first = source.first().ok_or(ResliceError::EmptySeries)?;
        let geo = &first.geometry;
        let iop = geo
            .iop
            .ok_or(ResliceError::SourceGeometryUnavailable("image orientation"))?;
        let ipp = geo
            .ipp
            .ok_or(ResliceError::SourceGeometryUnavailable("image position"))?;
        let pixel_spacing = geo
            .pixel_spacing
            .ok_or(ResliceError::SourceGeometryUnavailable("pixel spacing"))?;

        let inter_slice = geo
            .thickness
            .filter(|t| *t > 0.0)
            .or_else(|| {
                let d = source.distance_between_slices(0, 1);
                (d > 0.0).then_some(d)
            })
            .ok_or(ResliceError::SourceGeometryUnavailable("slice spacing"))?;

        Ok(SourceFrame {
            iop,
            ipp,
            size: [geo.cols, geo.rows, source.len()],
            spacing: [pixel_spacing[1], pixel_spacing[0], inter_slice],
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn derived_slice(
        id: String,
        template: &SliceGeometry,
        size: [usize; 3],
        spacing: [f32; 3],
        iop: [f32; 6],
        ipp: [f32; 3],
        location: f32,
    ) -> Slice {
        Slice::new(
            id,
            SliceGeometry {
                rows: size[1],
                cols: size[0],
                pixel_spacing: Some([spacing[1], spacing[0]]),
                thickness: Some(spacing[2]),
                iop: Some(iop),
                ipp: Some(ipp),
                representation: template.representation,
                rescale_slope: template.rescale_slope,
                rescale_intercept: template.rescale_intercept,
                window: None,
                slice_location: Some(location),
                instance_number: None,
                content_time: None,
                cardiac_images: None,
                // Recomputed after the pixel stage fills the buffer.
                min_value: None,
                max_value: None,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::Orientation::*;

    fn axial_source(cols: usize, rows: usize, frames: usize) -> Series {
        let mut series = Series::new("src", Axial);
        for f in 0..frames {
            series.push(Slice::new(
                format!("src.{f}"),
                SliceGeometry {
                    rows,
                    cols,
                    pixel_spacing: Some([1.0, 1.0]),
                    thickness: Some(1.0),
                    iop: Some([1.0, 0.0, 0.0, 0.0, 1.0, 0.0]),
                    ipp: Some([0.0, 0.0, f as f32]),
                    ..SliceGeometry::default()
                },
            ));
        }
        series
    }

    #[test]
    fn sagittal_metadata_from_axial_cube() {
        let source = axial_source(2, 2, 2);
        let mut ids = IdNamespace::new("src.sagittal");
        let derived =
            ReslicedMetadataBuilder::build("src/sagittal", Axial, Sagittal, &source, &mut ids)
                .unwrap();

        assert_eq!(derived.len(), 2);
        let first = derived.first().unwrap();
        assert_eq!(first.geometry.rows, 2);
        assert_eq!(first.geometry.cols, 2);
        assert_eq!(first.geometry.iop, Some([0.0, 1.0, 0.0, 0.0, 0.0, -1.0]));
        // Reversed walk along x, base shifted past the far frame.
        assert_eq!(first.geometry.ipp, Some([2.0, 0.0, 2.0]));
        assert_eq!(first.geometry.slice_location, Some(2.0));
        assert_eq!(derived.at(1).unwrap().geometry.ipp, Some([1.0, 0.0, 2.0]));
        assert_eq!(derived.at(1).unwrap().geometry.slice_location, Some(1.0));

        let origin = first.origin.as_ref().unwrap();
        assert_eq!(origin.frame, 0);
        assert_eq!(origin.source_slice, "src.0");
        assert!(first.geometry.min_value.is_none());
    }

    #[test]
    fn derived_extent_follows_the_stepped_axis() {
        // 4 cols x 3 rows x 2 frames: sagittal steps columns, coronal rows.
        let source = axial_source(4, 3, 2);
        let mut ids = IdNamespace::new("d");

        let sagittal =
            ReslicedMetadataBuilder::build("d", Axial, Sagittal, &source, &mut ids).unwrap();
        assert_eq!(sagittal.len(), 4);
        assert_eq!(sagittal.first().unwrap().geometry.cols, 3);
        assert_eq!(sagittal.first().unwrap().geometry.rows, 2);

        let coronal =
            ReslicedMetadataBuilder::build("d", Axial, Coronal, &source, &mut ids).unwrap();
        assert_eq!(coronal.len(), 3);
        assert_eq!(coronal.first().unwrap().geometry.cols, 4);
        assert_eq!(coronal.first().unwrap().geometry.rows, 2);
    }

    #[test]
    fn spacing_permutes_with_the_axes() {
        let mut source = axial_source(4, 3, 2);
        for f in 0..2 {
            let slice = source.at_mut(f).unwrap();
            slice.geometry.pixel_spacing = Some([0.5, 0.25]);
            slice.geometry.thickness = Some(2.0);
        }
        let mut ids = IdNamespace::new("d");
        let sagittal =
            ReslicedMetadataBuilder::build("d", Axial, Sagittal, &source, &mut ids).unwrap();
        let geo = &sagittal.first().unwrap().geometry;
        // Derived columns step the source row axis (0.5 mm), derived rows
        // step the source frame axis (2.0 mm).
        assert_eq!(geo.pixel_spacing, Some([2.0, 0.5]));
        assert_eq!(geo.thickness, Some(0.25));
    }

    #[test]
    fn missing_thickness_falls_back_to_slice_distance() {
        let mut source = axial_source(2, 2, 2);
        for f in 0..2 {
            let slice = source.at_mut(f).unwrap();
            slice.geometry.thickness = None;
            slice.geometry.ipp = Some([0.0, 0.0, 2.5 * f as f32]);
        }
        let mut ids = IdNamespace::new("d");
        let coronal =
            ReslicedMetadataBuilder::build("d", Axial, Coronal, &source, &mut ids).unwrap();
        // Inter-slice distance becomes the derived row spacing.
        assert_eq!(
            coronal.first().unwrap().geometry.pixel_spacing,
            Some([2.5, 1.0])
        );
    }

    #[test]
    fn missing_orientation_is_reported() {
        let mut source = axial_source(2, 2, 2);
        source.at_mut(0).unwrap().geometry.iop = None;
        let mut ids = IdNamespace::new("d");
        let result = ReslicedMetadataBuilder::build("d", Axial, Sagittal, &source, &mut ids);
        assert!(matches!(
            result,
            Err(ResliceError::SourceGeometryUnavailable("image orientation"))
        ));
    }

    #[test]
    fn externally_supplied_planes_are_copied_verbatim() {
        let source = axial_source(2, 2, 2);
        let planes = [
            PlaneGeometry {
                iop: [0.0, 1.0, 0.0, 0.0, 0.0, -1.0],
                ipp: [4.0, 0.0, 0.0],
            },
            PlaneGeometry {
                iop: [0.0, 1.0, 0.0, 0.0, 0.0, -1.0],
                ipp: [3.0, 0.0, 0.0],
            },
        ];
        let mut ids = IdNamespace::new("ext");
        let derived =
            ReslicedMetadataBuilder::build_from_planes("ext", Sagittal, &source, &planes, &mut ids)
                .unwrap();
        assert_eq!(derived.len(), 2);
        let first = derived.first().unwrap();
        assert_eq!(first.geometry.ipp, Some([4.0, 0.0, 0.0]));
        assert_eq!(first.geometry.slice_location, Some(4.0));
        assert!(first.origin.is_none());
    }
}
