//! Vector math for axis-aligned reslicing: orientation normals and the fixed
//! permutation tables between the three canonical planes.

use crate::enums::Orientation;
use crate::error::ResliceError;

/// One entry of a [`PermuteTable`]: which source axis a target axis maps to,
/// and whether the walk direction along it is reversed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignedAxis {
    pub axis: usize,
    pub flipped: bool,
}

const fn ax(axis: usize) -> SignedAxis {
    SignedAxis {
        axis,
        flipped: false,
    }
}

const fn ax_flip(axis: usize) -> SignedAxis {
    SignedAxis {
        axis,
        flipped: true,
    }
}

/// Maps target index axes (column, row, frame) onto source index axes.
///
/// `table[k].axis` names the source axis that target axis `k` steps through;
/// `table[k].flipped` reverses the walk direction within that axis' extent.
pub type PermuteTable = [SignedAxis; 3];

/// Cross product of two 3-vectors.
pub fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Dot product of two 3-vectors.
pub fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Plane normal of a 6-value image orientation: cross product of the
/// row-direction cosines (first three) and column-direction cosines (last
/// three).
pub fn normal(iop: [f32; 6]) -> [f32; 3] {
    cross(
        [iop[0], iop[1], iop[2]],
        [iop[3], iop[4], iop[5]],
    )
}

/// Index of the largest-magnitude component, the axis most nearly aligned
/// with the vector.
pub fn major_axis(v: [f32; 3]) -> usize {
    let mut major = 0;
    for k in 1..3 {
        if v[k].abs() > v[major].abs() {
            major = k;
        }
    }
    major
}

/// Fixed axis mapping between two canonical orientations.
///
/// Only the six ordered pairs of distinct canonical planes exist; any other
/// pair (including `from == to`) is an unsupported transform.
pub fn permute_table(
    from: Orientation,
    to: Orientation,
) -> Result<PermuteTable, ResliceError> {
    use Orientation::*;
    match (from, to) {
        (Sagittal, Coronal) => Ok([ax_flip(2), ax(1), ax(0)]),
        (Sagittal, Axial) => Ok([ax_flip(2), ax(0), ax_flip(1)]),
        (Coronal, Sagittal) => Ok([ax(2), ax(1), ax_flip(0)]),
        (Coronal, Axial) => Ok([ax(0), ax(2), ax_flip(1)]),
        (Axial, Sagittal) => Ok([ax(1), ax_flip(2), ax_flip(0)]),
        (Axial, Coronal) => Ok([ax(0), ax_flip(2), ax(1)]),
        (Axial, Axial) | (Coronal, Coronal) | (Sagittal, Sagittal) => {
            Err(ResliceError::UnsupportedTransform { from, to })
        }
    }
}

/// Reorder a 3-vector by a table's unsigned axis indices, ignoring flips.
pub fn permute_values(table: &PermuteTable, v: [f32; 3]) -> [f32; 3] {
    [v[table[0].axis], v[table[1].axis], v[table[2].axis]]
}

/// Reorder three vectors by a table's axis indices, negating a result vector
/// element-wise where the entry is flipped.
pub fn permute_vectors(table: &PermuteTable, vectors: [[f32; 3]; 3]) -> [[f32; 3]; 3] {
    let mut out = [[0.0; 3]; 3];
    for k in 0..3 {
        let src = vectors[table[k].axis];
        out[k] = if table[k].flipped {
            [-src[0], -src[1], -src[2]]
        } else {
            src
        };
    }
    out
}
