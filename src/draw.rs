//! Software drawing into an RGBA frame buffer.

pub type Rgba = (u8, u8, u8, u8);

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;

pub struct Canvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    pub fn new(frame: &'a mut [u8], width: u32, height: u32) -> Self {
        Self { frame, width, height }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear(&mut self, (r, g, b, a): Rgba) {
        for px in self.frame.chunks_exact_mut(4) {
            px.copy_from_slice(&[r, g, b, a]);
        }
    }

    pub fn blend_pixel(&mut self, x: i32, y: i32, (r, g, b, a): Rgba) {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return;
        }
        let idx = ((y as u32 * self.width + x as u32) * 4) as usize;
        let Some(px) = self.frame.get_mut(idx..idx + 4) else {
            return;
        };
        let alpha = a as u16;
        let inverse = 255 - alpha;
        for (dst, src) in px.iter_mut().zip([r, g, b]) {
            *dst = ((src as u16 * alpha + *dst as u16 * inverse) / 255) as u8;
        }
        px[3] = 255;
    }

    /// Fill a rectangle given in play-area coordinates, clipped to the frame.
    pub fn fill_rect(&mut self, left: f32, top: f32, right: f32, bottom: f32, color: Rgba) {
        let x0 = left.round().max(0.0) as i32;
        let y0 = top.round().max(0.0) as i32;
        let x1 = right.round().min(self.width as f32) as i32;
        let y1 = bottom.round().min(self.height as f32) as i32;
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend_pixel(x, y, color);
            }
        }
    }

    /// Fill the ellipse inscribed in the given rectangle.
    pub fn fill_ellipse(&mut self, left: f32, top: f32, right: f32, bottom: f32, color: Rgba) {
        let rx = (right - left) / 2.0;
        let ry = (bottom - top) / 2.0;
        if rx <= 0.0 || ry <= 0.0 {
            return;
        }
        let cx = left + rx;
        let cy = top + ry;
        for y in top.floor() as i32..bottom.ceil() as i32 {
            let dy = (y as f32 + 0.5 - cy) / ry;
            if dy.abs() > 1.0 {
                continue;
            }
            let half = rx * (1.0 - dy * dy).sqrt();
            for x in (cx - half).round() as i32..(cx + half).round() as i32 {
                self.blend_pixel(x, y, color);
            }
        }
    }

    /// Draw text with its top-left corner at `(x, y)`. Returns the drawn width.
    pub fn draw_text(&mut self, text: &str, x: i32, y: i32, scale: u32, color: Rgba) -> u32 {
        let mut cursor = x;
        for ch in text.chars() {
            if let Some(rows) = glyph_5x7(ch) {
                self.draw_glyph(&rows, cursor, y, scale, color);
            }
            cursor += advance(scale) as i32;
        }
        (cursor - x) as u32
    }

    /// Draw text centered on `(cx, cy)`.
    pub fn draw_text_centered(&mut self, text: &str, cx: f32, cy: f32, scale: u32, color: Rgba) {
        let (w, h) = text_size(text, scale);
        let x = (cx - w as f32 / 2.0).round() as i32;
        let y = (cy - h as f32 / 2.0).round() as i32;
        self.draw_text(text, x, y, scale, color);
    }

    fn draw_glyph(&mut self, rows: &[u8; 7], x: i32, y: i32, scale: u32, color: Rgba) {
        let scale = scale as i32;
        for (ry, row) in rows.iter().enumerate() {
            for rx in 0..GLYPH_WIDTH as i32 {
                if (row >> (GLYPH_WIDTH as i32 - 1 - rx)) & 1 == 0 {
                    continue;
                }
                for sy in 0..scale {
                    for sx in 0..scale {
                        self.blend_pixel(x + rx * scale + sx, y + ry as i32 * scale + sy, color);
                    }
                }
            }
        }
    }
}

fn advance(scale: u32) -> u32 {
    (GLYPH_WIDTH + 1) * scale
}

/// Pixel size of `text` at `scale`, without trailing spacing.
pub fn text_size(text: &str, scale: u32) -> (u32, u32) {
    let count = text.chars().count() as u32;
    let width = (count * advance(scale)).saturating_sub(scale);
    (width, GLYPH_HEIGHT * scale)
}

fn glyph_5x7(ch: char) -> Option<[u8; 7]> {
    Some(match ch.to_ascii_uppercase() {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b11110, 0b10001, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100],
        'E' => [0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01110],
        'H' => [0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001, 0b10001],
        'I' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b11111],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b10010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b11011, 0b10001],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        ':' => [0b00000, 0b00100, 0b00000, 0b00000, 0b00100, 0b00000, 0b00000],
        '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100],
        '/' => [0b00001, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b10000],
        '-' => [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
        ' ' => [0; 7],
        _ => return None,
    })
}
