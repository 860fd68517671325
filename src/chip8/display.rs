/// Monochrome display buffer, row-major, `true` = pixel on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Display {
    width: usize,
    height: usize,
    pixels: Vec<bool>,
}

impl Display {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![false; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Get the state of a pixel (true = on, false = off).
    /// Coordinates outside the buffer read as off.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.pixels[y * self.width + x]
    }

    /// Iterates over the buffer one row at a time, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.pixels.chunks_exact(self.width)
    }

    pub fn clear(&mut self) {
        self.pixels.fill(false);
    }

    /// XORs `sprite` onto the buffer, one byte per row, MSB leftmost.
    ///
    /// The origin wraps around the buffer, the sprite body is clipped at
    /// the right and bottom edges. Returns true if any pixel was erased.
    pub fn draw_sprite(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let x_pos = x % self.width;
        let y_pos = y % self.height;

        // Don't draw out of bounds
        let row_count = std::cmp::min(sprite.len(), self.height - y_pos);
        let col_count = std::cmp::min(8, self.width - x_pos);

        let mut any_erased = false;
        for (row, sprite_byte) in sprite.iter().take(row_count).enumerate() {
            for col in 0..col_count {
                if (sprite_byte & (0x80 >> col)) == 0 {
                    continue;
                }

                let pixel = &mut self.pixels[(y_pos + row) * self.width + x_pos + col];
                *pixel ^= true;

                if !*pixel {
                    any_erased = true;
                }
            }
        }

        any_erased
    }

    /// Number of sprite rows that land on screen when drawing at `y`.
    pub(crate) fn visible_rows(&self, y: usize, rows: usize) -> usize {
        std::cmp::min(rows, self.height - y % self.height)
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new(64, 32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GLYPH_ZERO: [u8; 5] = [0xF0, 0x90, 0x90, 0x90, 0xF0];

    fn lit(display: &Display) -> Vec<(usize, usize)> {
        let mut on = Vec::new();
        for y in 0..display.height() {
            for x in 0..display.width() {
                if display.pixel(x, y) {
                    on.push((x, y));
                }
            }
        }
        on
    }

    #[test]
    fn draws_glyph_bits_without_collision() {
        let mut display = Display::default();
        let collided = display.draw_sprite(0, 0, &GLYPH_ZERO);

        assert!(!collided);
        for (row, byte) in GLYPH_ZERO.iter().enumerate() {
            for col in 0..8 {
                assert_eq!(display.pixel(col, row), byte & (0x80 >> col) != 0);
            }
        }
        assert_eq!(lit(&display).len(), 14);
    }

    #[test]
    fn drawing_twice_erases_and_collides() {
        let mut display = Display::default();
        display.draw_sprite(3, 4, &GLYPH_ZERO);
        let collided = display.draw_sprite(3, 4, &GLYPH_ZERO);

        assert!(collided);
        assert_eq!(display, Display::default());
    }

    #[test]
    fn origin_wraps_around() {
        let mut display = Display::default();
        display.draw_sprite(64 + 2, 32 + 1, &[0x80]);

        assert_eq!(lit(&display), vec![(2, 1)]);
    }

    #[test]
    fn body_is_clipped_at_right_edge() {
        let mut display = Display::default();
        display.draw_sprite(60, 0, &[0xFF]);

        assert_eq!(lit(&display), vec![(60, 0), (61, 0), (62, 0), (63, 0)]);
    }

    #[test]
    fn body_is_clipped_at_bottom_edge() {
        let mut display = Display::default();
        display.draw_sprite(0, 30, &[0x80, 0x80, 0x80, 0x80]);

        assert_eq!(lit(&display), vec![(0, 30), (0, 31)]);
        assert_eq!(display.visible_rows(30, 4), 2);
    }

    #[test]
    fn clear_turns_everything_off() {
        let mut display = Display::new(128, 64);
        display.draw_sprite(100, 50, &[0xFF, 0xFF]);
        display.clear();

        assert!(lit(&display).is_empty());
        assert_eq!(display.rows().count(), 64);
    }
}
