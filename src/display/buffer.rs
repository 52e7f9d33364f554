//! Packed-pixel staging buffers.
//!
//! The controller only accepts transfers aligned to its 16-bit memory lanes
//! (two lanes in 1 bpp mode), so a rectangle whose horizontal extent does
//! not land on a lane boundary gets padded with gap pixels on either side.
//! The gap positions transfer as zero and the panel ignores them; only the
//! byte geometry has to be exact.
//! Sub-pixels pack most significant first, except in 1 bpp mode where the
//! hardware expects the reverse order.

use itertools::iproduct;

use crate::command::PixelFormat;
use crate::Error;

use alloc::vec;
use alloc::vec::Vec;

/// One rectangular transfer: the target rectangle, its computed alignment
/// gaps and stride, and an owned byte buffer of `stride * height`. Created
/// fresh for every draw and discarded after the transfer.
#[derive(Debug)]
pub struct DrawingBuffer {
    format: PixelFormat,
    x: u16,
    y: u16,
    width: u16,
    height: u16,
    gap_left: u16,
    gap_right: u16,
    stride: usize,
    data: Vec<u8>,
}

impl DrawingBuffer {
    /// Compute the gap and stride geometry for a rectangle and allocate its
    /// zeroed backing buffer. [`PixelFormat::Bpp3`] has no packing path and
    /// fails here, before anything reaches the hardware.
    pub fn new<E>(
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        format: PixelFormat,
    ) -> Result<Self, Error<E>> {
        if format == PixelFormat::Bpp3 {
            return Err(Error::UnsupportedPixelFormat(format));
        }
        let pack = format.pixels_per_pack();
        let gap_left = x % pack;
        let right_rem = (x + width) % pack;
        let gap_right = if right_rem == 0 { 0 } else { pack - right_rem };
        let stride = usize::from((width + gap_left + gap_right) / format.pixels_per_byte());
        Ok(DrawingBuffer {
            format,
            x,
            y,
            width,
            height,
            gap_left,
            gap_right,
            stride,
            data: vec![0u8; stride * usize::from(height)],
        })
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn x(&self) -> u16 {
        self.x
    }

    pub fn y(&self) -> u16 {
        self.y
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Pixels of padding before the rectangle in each packed row.
    pub fn gap_left(&self) -> u16 {
        self.gap_left
    }

    /// Pixels of padding after the rectangle in each packed row.
    pub fn gap_right(&self) -> u16 {
        self.gap_right
    }

    /// Bytes per packed row, gaps included.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The packed bytes, row-major, `stride * height` long.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Pack one row of 8-bit samples into the buffer.
    ///
    /// `samples` must hold at least `width` values; sample `i` lands at
    /// pixel column `x + i`. Each sample keeps its most significant bits.
    /// Rows are independent: no state crosses between calls, and packing
    /// the same inputs again into a fresh buffer is byte-identical.
    pub fn pack_row(&mut self, row: u16, samples: &[u8]) {
        debug_assert!(samples.len() >= usize::from(self.width));
        let bpp = self.format.bits_per_pixel();
        let ppb = usize::from(self.format.pixels_per_byte());
        let reversed = self.format == PixelFormat::Bpp1;
        let width = self.width as isize;
        let gap_left = self.gap_left as isize;

        let start = self.stride * usize::from(row);
        let target = &mut self.data[start..start + self.stride];
        for (i, p) in iproduct!(0..self.stride, 0..ppb) {
            // Walk the gap positions too; they just contribute nothing.
            let pixel = (i * ppb + p) as isize - gap_left;
            if pixel < 0 || pixel >= width {
                continue;
            }
            let sample = samples[pixel as usize] >> (8 - bpp);
            let shift = if reversed {
                bpp * p as u16
            } else {
                bpp * (ppb - 1 - p) as u16
            };
            target[i] |= sample << shift;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    fn buffer(x: u16, width: u16, format: PixelFormat) -> DrawingBuffer {
        DrawingBuffer::new::<()>(x, 0, width, 1, format).unwrap()
    }

    #[test]
    fn gap_example() {
        let b = buffer(10, 50, PixelFormat::Bpp4);
        assert_eq!(b.gap_left(), 2);
        assert_eq!(b.gap_right(), 0);
        assert_eq!(b.stride(), 26);
    }

    #[test]
    fn geometry_invariants_hold_everywhere() {
        let formats = [
            PixelFormat::Bpp1,
            PixelFormat::Bpp2,
            PixelFormat::Bpp4,
            PixelFormat::Bpp8,
        ];
        for (&format, x, width) in iproduct!(formats.iter(), 0..48u16, 1..48u16) {
            let b = buffer(x, width, format);
            let pack = format.pixels_per_pack();
            assert_eq!(b.gap_left(), x % pack);
            assert_eq!((b.gap_left() + width + b.gap_right()) % pack, 0);
            assert_eq!(
                b.stride() * usize::from(format.pixels_per_byte()),
                usize::from(b.gap_left() + width + b.gap_right())
            );
        }
    }

    #[test]
    fn bpp3_has_no_packing_path() {
        assert_eq!(
            DrawingBuffer::new::<()>(0, 0, 16, 1, PixelFormat::Bpp3).unwrap_err(),
            Error::UnsupportedPixelFormat(PixelFormat::Bpp3)
        );
    }

    #[test]
    fn bpp4_full_intensity_row() {
        let mut b = buffer(0, 16, PixelFormat::Bpp4);
        b.pack_row(0, &[0xFF; 16]);
        assert_eq!(b.data(), &[0xFF; 8][..]);
    }

    #[test]
    fn bpp4_packs_high_nibbles_msb_first() {
        let mut b = buffer(0, 4, PixelFormat::Bpp4);
        b.pack_row(0, &[0xAB, 0xCD, 0x00, 0x12]);
        assert_eq!(b.stride(), 2);
        assert_eq!(b.data(), &[0xAC, 0x01][..]);
    }

    #[test]
    fn bpp1_uses_reversed_bit_order() {
        let mut b = buffer(0, 32, PixelFormat::Bpp1);
        let mut row = [0u8; 32];
        row[0] = 0xFF;
        row[7] = 0xFF;
        row[8] = 0xFF;
        b.pack_row(0, &row);
        // Pixel 0 is the least significant bit of byte 0.
        assert_eq!(b.data(), &[0b1000_0001, 0b0000_0001, 0, 0][..]);
    }

    #[test]
    fn gap_positions_stay_zero() {
        // x = 1 with 8 bpp: one gap pixel left, stride covers 4 pixels.
        let mut b = buffer(1, 3, PixelFormat::Bpp8);
        assert_eq!((b.gap_left(), b.gap_right()), (1, 0));
        b.pack_row(0, &[10, 20, 30]);
        assert_eq!(b.data(), &[0, 10, 20, 30][..]);
    }

    #[test]
    fn packing_is_idempotent_per_row() {
        let samples: Vec<u8> = (0..50).map(|i| (i * 5) as u8).collect();
        let mut first = buffer(10, 50, PixelFormat::Bpp2);
        let mut second = buffer(10, 50, PixelFormat::Bpp2);
        first.pack_row(0, &samples);
        second.pack_row(0, &samples);
        assert_eq!(first.data(), second.data());
    }

    #[test]
    fn rows_are_independent() {
        let mut b = DrawingBuffer::new::<()>(0, 0, 16, 3, PixelFormat::Bpp4).unwrap();
        b.pack_row(1, &[0xFF; 16]);
        assert_eq!(&b.data()[..8], &[0; 8]);
        assert_eq!(&b.data()[8..16], &[0xFF; 8]);
        assert_eq!(&b.data()[16..], &[0; 8]);
    }
}
