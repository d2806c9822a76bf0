//! Pixel Buffer and Procedural Fill
//!
//! An owned 32-bit-per-pixel framebuffer plus the toy gradient renderer
//! that exercises it. Pixels are packed `0x00RRGGBB` in little-endian
//! words: red in bits 16–23, green in 8–15, blue in 0–7.

/// Bytes per packed pixel
pub const BYTES_PER_PIXEL: usize = 4;

/// Owned framebuffer, reallocated exactly when the client area resizes.
#[derive(Debug, Clone)]
pub struct VideoBuffer {
    width: usize,
    height: usize,
    pitch: usize,
    pixels: Vec<u8>,
}

impl VideoBuffer {
    /// Allocate a buffer of `width * height` packed pixels
    pub fn new(width: u32, height: u32) -> Self {
        let width = width as usize;
        let height = height as usize;
        VideoBuffer {
            width,
            height,
            pitch: width * BYTES_PER_PIXEL,
            pixels: vec![0; width * height * BYTES_PER_PIXEL],
        }
    }

    /// Width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes per row
    pub fn pitch(&self) -> usize {
        self.pitch
    }

    /// Raw pixel bytes, `height` rows of `pitch` bytes
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Packed pixel at `(x, y)`.
    ///
    /// # Panics
    /// Panics when the coordinate lies outside the buffer.
    pub fn pixel_at(&self, x: usize, y: usize) -> u32 {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        let offset = y * self.pitch + x * BYTES_PER_PIXEL;
        u32::from_le_bytes([
            self.pixels[offset],
            self.pixels[offset + 1],
            self.pixels[offset + 2],
            self.pixels[offset + 3],
        ])
    }

    /// Adopt new client dimensions.
    ///
    /// Releases the old pixel block and commits a single fresh one when the
    /// dimensions actually change; a resize to the current dimensions does
    /// not reallocate. Returns whether a reallocation happened.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        let width = width as usize;
        let height = height as usize;
        if width == self.width && height == self.height {
            return false;
        }
        self.width = width;
        self.height = height;
        self.pitch = width * BYTES_PER_PIXEL;
        self.pixels = vec![0; width * height * BYTES_PER_PIXEL];
        true
    }

    /// Fill with the scrolling color ramp.
    ///
    /// Red ramps with `x + x_offset`, blue with `y + y_offset`, both
    /// truncated to their low byte; green stays zero.
    pub fn render_gradient(&mut self, x_offset: i32, y_offset: i32) {
        if self.pitch == 0 {
            return;
        }
        for (y, row) in self.pixels.chunks_exact_mut(self.pitch).enumerate() {
            let blue = (y as i32).wrapping_add(y_offset) as u8;
            for (x, pixel) in row.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
                let red = (x as i32).wrapping_add(x_offset) as u8;
                let packed = ((red as u32) << 16) | (blue as u32);
                pixel.copy_from_slice(&packed.to_le_bytes());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_matches_dimensions() {
        let buffer = VideoBuffer::new(320, 180);
        assert_eq!(buffer.width(), 320);
        assert_eq!(buffer.height(), 180);
        assert_eq!(buffer.pitch(), 320 * BYTES_PER_PIXEL);
        assert_eq!(buffer.pixels().len(), 320 * 180 * BYTES_PER_PIXEL);
    }

    #[test]
    fn test_resize_reallocates_once_per_event() {
        let mut buffer = VideoBuffer::new(320, 180);
        let before = buffer.pixels().as_ptr();

        // A resize event reallocates and the new block matches the new
        // dimensions exactly.
        assert!(buffer.resize(640, 360));
        assert_eq!(buffer.pixels().len(), 640 * 360 * BYTES_PER_PIXEL);

        // Re-announcing the current dimensions is not a resize event.
        let after = buffer.pixels().as_ptr();
        assert!(!buffer.resize(640, 360));
        assert_eq!(buffer.pixels().as_ptr(), after);
        assert_eq!(buffer.pixels().len(), 640 * 360 * BYTES_PER_PIXEL);

        let _ = before;
    }

    #[test]
    fn test_gradient_packing() {
        let mut buffer = VideoBuffer::new(8, 8);
        buffer.render_gradient(0, 0);

        // red = x in bits 16-23, blue = y in bits 0-7, green zero.
        assert_eq!(buffer.pixel_at(0, 0), 0x0000_0000);
        assert_eq!(buffer.pixel_at(3, 0), 0x0003_0000);
        assert_eq!(buffer.pixel_at(0, 5), 0x0000_0005);
        assert_eq!(buffer.pixel_at(7, 7), 0x0007_0007);
    }

    #[test]
    fn test_gradient_offsets_truncate_to_low_byte() {
        let mut buffer = VideoBuffer::new(4, 4);
        buffer.render_gradient(300, -1);

        // 300 wraps to 44 in the red byte; -1 wraps to 255 in the blue byte.
        assert_eq!(buffer.pixel_at(0, 0), 0x002C_00FF);
        assert_eq!(buffer.pixel_at(1, 1), 0x002D_0000);
    }

    #[test]
    fn test_zero_sized_buffer_is_harmless() {
        let mut buffer = VideoBuffer::new(0, 0);
        buffer.render_gradient(10, 10);
        assert!(buffer.pixels().is_empty());
    }
}
