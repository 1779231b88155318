//! Procedural colour maps
//!
//! The scene ships without image files, so the brick walls, the door and the
//! snowy ground are painted into RGBA8 buffers at startup. Patterns are
//! deterministic: the same size always produces the same pixels.

/// An RGBA8 image generated in memory
#[derive(Debug, Clone, PartialEq)]
pub struct ProceduralTexture {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl ProceduralTexture {
    fn paint(name: &str, width: u32, height: u32, mut shade: impl FnMut(u32, u32) -> [u8; 3]) -> Self {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let [r, g, b] = shade(x, y);
                pixels.extend_from_slice(&[r, g, b, 255]);
            }
        }

        Self {
            name: name.to_string(),
            width,
            height,
            pixels,
        }
    }

    /// Colour of a single pixel, `None` outside the image
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    /// Staggered red-brown bricks with grey mortar
    pub fn bricks(size: u32) -> Self {
        let size = size.max(16);
        let rows = 8;
        let columns = 4;
        let brick_h = size / rows;
        let brick_w = size / columns;
        let mortar = (size / 64).max(1);

        Self::paint("bricks", size, size, |x, y| {
            let row = y / brick_h;
            let offset = if row % 2 == 1 { brick_w / 2 } else { 0 };
            let shifted = (x + offset) % size;
            let column = shifted / brick_w;

            let in_mortar = y % brick_h < mortar || shifted % brick_w < mortar;
            if in_mortar {
                let n = (hash(x, y, 7) * 20.0) as u8;
                return [150 + n, 145 + n, 135 + n];
            }

            // One base tone per brick, fine grain per pixel
            let tone = hash(column, row, 1) * 40.0;
            let grain = hash(x, y, 2) * 18.0;
            [
                (120.0 + tone + grain) as u8,
                (48.0 + tone * 0.4 + grain * 0.5) as u8,
                (36.0 + tone * 0.3 + grain * 0.5) as u8,
            ]
        })
    }

    /// Vertical dark wooden planks inside a frame
    pub fn wooden_door(size: u32) -> Self {
        let size = size.max(16);
        let planks = 5;
        let plank_w = size / planks;
        let frame = size / 16;
        let gap = (size / 128).max(1);

        Self::paint("wooden_door", size, size, |x, y| {
            if x < frame || y < frame || x >= size - frame || y >= size - frame {
                return [58, 36, 22];
            }
            if x % plank_w < gap {
                return [30, 18, 10];
            }

            // Grain streaks running along the plank
            let plank = x / plank_w;
            let streak = ((x as f32 * 0.9 + hash(plank, 0, 3) * 10.0).sin() * 0.5 + 0.5) * 22.0;
            let noise = hash(x, y / 4, 4) * 12.0;
            [
                (96.0 + streak + noise) as u8,
                (62.0 + streak * 0.6 + noise * 0.6) as u8,
                (38.0 + streak * 0.3 + noise * 0.3) as u8,
            ]
        })
    }

    /// Bluish white snow with soft drifts and sparkle
    pub fn snow_ground(size: u32) -> Self {
        let size = size.max(16);
        let cell = (size / 16).max(1);

        Self::paint("snow_ground", size, size, |x, y| {
            // Bilinear value noise over a coarse grid gives gentle drifts
            let drift = value_noise(x as f32 / cell as f32, y as f32 / cell as f32) * 30.0;
            let sparkle = if hash(x, y, 9) > 0.985 { 20.0 } else { 0.0 };
            let base = 205.0 + drift + sparkle;
            [
                base.min(255.0) as u8,
                (base + 5.0).min(255.0) as u8,
                (base + 15.0).min(255.0) as u8,
            ]
        })
    }
}

/// Integer hash mapped to `[0, 1)`
fn hash(x: u32, y: u32, seed: u32) -> f32 {
    let mut h = x
        .wrapping_mul(0x27d4_eb2d)
        .wrapping_add(y.wrapping_mul(0x1656_67b1))
        .wrapping_add(seed.wrapping_mul(0x9e37_79b9));
    h ^= h >> 15;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    (h & 0x00ff_ffff) as f32 / 0x0100_0000 as f32
}

fn value_noise(x: f32, y: f32) -> f32 {
    let (x0, y0) = (x.floor(), y.floor());
    let (tx, ty) = (x - x0, y - y0);
    let (ix, iy) = (x0 as u32, y0 as u32);

    let smooth = |t: f32| t * t * (3.0 - 2.0 * t);
    let (sx, sy) = (smooth(tx), smooth(ty));

    let a = hash(ix, iy, 11);
    let b = hash(ix + 1, iy, 11);
    let c = hash(ix, iy + 1, 11);
    let d = hash(ix + 1, iy + 1, 11);

    let top = a + (b - a) * sx;
    let bottom = c + (d - c) * sx;
    top + (bottom - top) * sy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_textures_have_rgba_pixels() {
        for texture in [
            ProceduralTexture::bricks(128),
            ProceduralTexture::wooden_door(128),
            ProceduralTexture::snow_ground(128),
        ] {
            assert_eq!(texture.pixels.len(), 128 * 128 * 4, "{}", texture.name);
            assert!(texture.pixels.chunks(4).all(|p| p[3] == 255));
        }
    }

    #[test]
    fn test_textures_are_deterministic() {
        assert_eq!(ProceduralTexture::bricks(64), ProceduralTexture::bricks(64));
        assert_eq!(
            ProceduralTexture::snow_ground(64),
            ProceduralTexture::snow_ground(64)
        );
    }

    #[test]
    fn test_snow_is_bright_and_bricks_are_red() {
        let snow = ProceduralTexture::snow_ground(64);
        let [r, g, b, _] = snow.pixel(10, 10).unwrap();
        assert!(r >= 200 && g >= 200 && b >= 200);

        let bricks = ProceduralTexture::bricks(64);
        // Inside the first brick, away from the mortar lines
        let [r, g, b, _] = bricks.pixel(5, 4).unwrap();
        assert!(r > g && r > b);
    }

    #[test]
    fn test_pixel_outside_image_is_none() {
        let door = ProceduralTexture::wooden_door(32);
        assert!(door.pixel(32, 0).is_none());
        assert!(door.pixel(0, 31).is_some());
    }

    #[test]
    fn test_tiny_sizes_are_clamped() {
        assert_eq!(ProceduralTexture::bricks(1).width, 16);
    }
}
