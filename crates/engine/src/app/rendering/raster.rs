use super::color::Rgba;

/// Decoded RGBA8 image.
pub struct Sprite {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Sprite {
    fn texel(&self, x: u32, y: u32) -> Rgba {
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        match self.rgba.get(offset..offset + 4) {
            Some(px) => [px[0], px[1], px[2], px[3]],
            None => [0, 0, 0, 0],
        }
    }
}

/// Clipped drawing onto an RGBA8 frame buffer.
pub struct Canvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    pub fn new(frame: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            frame,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear(&mut self, color: Rgba) {
        for pixel in self.frame.chunks_exact_mut(4) {
            pixel.copy_from_slice(&color);
        }
    }

    /// Source-over blend; out-of-bounds writes are dropped.
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 || color[3] == 0 {
            return;
        }
        let Some(offset) = (y as usize)
            .checked_mul(self.width as usize)
            .and_then(|row| row.checked_add(x as usize))
            .and_then(|pixel| pixel.checked_mul(4))
        else {
            return;
        };
        let Some(dst) = self.frame.get_mut(offset..offset + 4) else {
            return;
        };
        if color[3] == 255 {
            dst.copy_from_slice(&color);
            return;
        }
        let alpha = color[3] as u32;
        for channel in 0..3 {
            let blended = (color[channel] as u32 * alpha + dst[channel] as u32 * (255 - alpha)) / 255;
            dst[channel] = blended as u8;
        }
        dst[3] = 255;
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgba> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        self.frame
            .get(offset..offset + 4)
            .map(|px| [px[0], px[1], px[2], px[3]])
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Rgba) {
        let left = x.max(0);
        let top = y.max(0);
        let right = x.saturating_add(width).min(self.width as i32);
        let bottom = y.saturating_add(height).min(self.height as i32);
        for py in top..bottom {
            for px in left..right {
                self.blend_pixel(px, py, color);
            }
        }
    }

    pub fn rect_outline(&mut self, x: i32, y: i32, width: i32, height: i32, color: Rgba) {
        if width <= 0 || height <= 0 {
            return;
        }
        let right = x + width - 1;
        let bottom = y + height - 1;
        for px in x..=right {
            self.blend_pixel(px, y, color);
            self.blend_pixel(px, bottom, color);
        }
        for py in (y + 1)..bottom {
            self.blend_pixel(x, py, color);
            self.blend_pixel(right, py, color);
        }
    }

    pub fn line(&mut self, from: (f64, f64), to: (f64, f64), color: Rgba) {
        let (mut x0, mut y0) = (from.0.round() as i32, from.1.round() as i32);
        let (x1, y1) = (to.0.round() as i32, to.1.round() as i32);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let step_x = if x0 < x1 { 1 } else { -1 };
        let step_y = if y0 < y1 { 1 } else { -1 };
        let mut error = dx + dy;
        loop {
            self.blend_pixel(x0, y0, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let doubled = error * 2;
            if doubled >= dy {
                error += dy;
                x0 += step_x;
            }
            if doubled <= dx {
                error += dx;
                y0 += step_y;
            }
        }
    }

    pub fn polyline(&mut self, points: &[(f64, f64)], color: Rgba) {
        for pair in points.windows(2) {
            self.line(pair[0], pair[1], color);
        }
    }

    pub fn polygon_outline(&mut self, points: &[(f64, f64)], color: Rgba) {
        self.polyline(points, color);
        if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
            self.line(last, first, color);
        }
    }

    /// Scanline fill sampled at pixel centres; any simple polygon.
    pub fn fill_polygon(&mut self, points: &[(f64, f64)], color: Rgba) {
        if points.len() < 3 {
            return;
        }
        let min_y = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let max_y = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
        let top = (min_y.floor() as i32).max(0);
        let bottom = (max_y.ceil() as i32).min(self.height as i32);
        let mut crossings = Vec::with_capacity(points.len());
        for py in top..bottom {
            let sample_y = py as f64 + 0.5;
            crossings.clear();
            for (index, &(ax, ay)) in points.iter().enumerate() {
                let (bx, by) = points[(index + 1) % points.len()];
                if (ay <= sample_y) != (by <= sample_y) {
                    crossings.push(ax + (sample_y - ay) / (by - ay) * (bx - ax));
                }
            }
            crossings.sort_by(f64::total_cmp);
            for span in crossings.chunks_exact(2) {
                let start = (span[0] - 0.5).ceil() as i32;
                let end = (span[1] - 0.5).floor() as i32;
                for px in start.max(0)..=end.min(self.width as i32 - 1) {
                    self.blend_pixel(px, py, color);
                }
            }
        }
    }

    /// Draws the whole sprite stretched into the destination rectangle.
    pub fn blit_scaled(&mut self, sprite: &Sprite, x: f64, y: f64, width: f64, height: f64) {
        if sprite.width == 0 || sprite.height == 0 || width < 1.0 || height < 1.0 {
            return;
        }
        let left = x.round() as i32;
        let top = y.round() as i32;
        let out_w = width.round() as i32;
        let out_h = height.round() as i32;
        let scale_x = sprite.width as f64 / out_w as f64;
        let scale_y = sprite.height as f64 / out_h as f64;
        for dy in 0..out_h {
            let py = top + dy;
            if py < 0 || py >= self.height as i32 {
                continue;
            }
            let src_y = ((dy as f64 * scale_y) as u32).min(sprite.height - 1);
            for dx in 0..out_w {
                let px = left + dx;
                if px < 0 || px >= self.width as i32 {
                    continue;
                }
                let src_x = ((dx as f64 * scale_x) as u32).min(sprite.width - 1);
                self.blend_pixel(px, py, sprite.texel(src_x, src_y));
            }
        }
    }
}
