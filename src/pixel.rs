//! Owned, typed 2D pixel storage. One contiguous buffer per slice; the
//! variant fixes the storage type so derived slices inherit the source's
//! representation without conversion.

use crate::enums::PixelRepresentation;

use ndarray::Array2;
use rayon::prelude::*;

#[derive(Clone, Debug, PartialEq)]
pub enum PixelBuffer {
    Uint8(Array2<u8>),
    Sint8(Array2<i8>),
    Uint16(Array2<u16>),
    Sint16(Array2<i16>),
    Uint32(Array2<u32>),
    Sint32(Array2<i32>),
}

macro_rules! for_each_variant {
    ($self:expr, $array:ident => $body:expr) => {
        match $self {
            PixelBuffer::Uint8($array) => $body,
            PixelBuffer::Sint8($array) => $body,
            PixelBuffer::Uint16($array) => $body,
            PixelBuffer::Sint16($array) => $body,
            PixelBuffer::Uint32($array) => $body,
            PixelBuffer::Sint32($array) => $body,
        }
    };
}

impl PixelBuffer {
    pub fn representation(&self) -> PixelRepresentation {
        match self {
            PixelBuffer::Uint8(_) => PixelRepresentation::Uint8,
            PixelBuffer::Sint8(_) => PixelRepresentation::Sint8,
            PixelBuffer::Uint16(_) => PixelRepresentation::Uint16,
            PixelBuffer::Sint16(_) => PixelRepresentation::Sint16,
            PixelBuffer::Uint32(_) => PixelRepresentation::Uint32,
            PixelBuffer::Sint32(_) => PixelRepresentation::Sint32,
        }
    }

    /// Buffer shape as `(rows, cols)`.
    pub fn dim(&self) -> (usize, usize) {
        for_each_variant!(self, a => a.dim())
    }

    /// Sample at `(row, col)` widened to `f64`, which represents every
    /// supported storage type exactly.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        for_each_variant!(self, a => a.get((row, col)).map(|&v| v as f64))
    }

    /// Smallest and largest sample in the buffer, or `None` when empty.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        let (rows, cols) = self.dim();
        if rows * cols == 0 {
            return None;
        }
        let range = for_each_variant!(self, a => {
            a.into_par_iter()
                .map(|&v| v as f64)
                .fold(
                    || (f64::INFINITY, f64::NEG_INFINITY),
                    |(lo, hi), v| (lo.min(v), hi.max(v)),
                )
                .reduce(
                    || (f64::INFINITY, f64::NEG_INFINITY),
                    |(lo_a, hi_a), (lo_b, hi_b)| (lo_a.min(lo_b), hi_a.max(hi_b)),
                )
        });
        Some(range)
    }

    /// Raw bytes of the buffer when it is contiguous in standard layout.
    /// Byte-for-byte equal buffers hold identical pixel content.
    pub fn contiguous_bytes(&self) -> Option<&[u8]> {
        for_each_variant!(self, a => a.as_slice().map(bytemuck::cast_slice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn min_max_over_signed_samples() {
        let buffer = PixelBuffer::Sint16(array![[-40, 7], [1200, 0]]);
        assert_eq!(buffer.min_max(), Some((-40.0, 1200.0)));
        assert_eq!(buffer.representation(), PixelRepresentation::Sint16);
    }

    #[test]
    fn get_is_row_major() {
        let buffer = PixelBuffer::Uint8(array![[1, 2], [3, 4]]);
        assert_eq!(buffer.get(1, 0), Some(3.0));
        assert_eq!(buffer.get(2, 0), None);
    }

    #[test]
    fn contiguous_bytes_match_sample_width() {
        let buffer = PixelBuffer::Uint16(array![[1, 2], [3, 4]]);
        assert_eq!(buffer.contiguous_bytes().unwrap().len(), 8);
    }
}
