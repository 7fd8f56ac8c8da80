use std::path::Path;

use macroquad::texture::Image;

use crate::error::ConfigError;

/// Per-pixel opacity bitmap used for exact overlap tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollisionMask {
    pub width: u32,
    pub height: u32,
    /// Row-major opacity bits.
    bits: Vec<bool>,
}

/// Alpha at or above this is opaque.
pub const ALPHA_THRESHOLD: u8 = 127;

impl CollisionMask {
    pub fn solid(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![true; (width * height) as usize],
        }
    }

    /// Filled ellipse inscribed in the bounding box. Approximates a rounded sprite.
    pub fn ellipse(width: u32, height: u32) -> Self {
        let rx = width as f32 * 0.5;
        let ry = height as f32 * 0.5;
        let mut bits = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                let dx = (x as f32 + 0.5 - rx) / rx;
                let dy = (y as f32 + 0.5 - ry) / ry;
                bits.push(dx * dx + dy * dy <= 1.0);
            }
        }
        Self {
            width,
            height,
            bits,
        }
    }

    /// Build from a row-major alpha channel. `None` if the buffer is the wrong size.
    pub fn from_alpha(width: u32, height: u32, alpha: &[u8]) -> Option<Self> {
        if alpha.len() != (width * height) as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            bits: alpha.iter().map(|a| *a >= ALPHA_THRESHOLD).collect(),
        })
    }

    /// Opacity from the alpha channel of an RGBA image.
    pub fn from_image(image: &Image) -> Option<Self> {
        let alpha: Vec<u8> = image.bytes.chunks_exact(4).map(|px| px[3]).collect();
        Self::from_alpha(image.width() as u32, image.height() as u32, &alpha)
    }

    /// Decode a sprite file (PNG and friends) into a mask.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let image = Image::from_file_with_format(&bytes, None).map_err(|e| ConfigError::Mask {
            path: path.to_path_buf(),
            message: format!("{e:?}"),
        })?;
        let mask = Self::from_image(&image).ok_or_else(|| ConfigError::Mask {
            path: path.to_path_buf(),
            message: "pixel data does not match image size".to_string(),
        })?;
        log::info!(
            "mask {}: {}x{}, {} opaque pixels",
            path.display(),
            mask.width,
            mask.height,
            mask.count()
        );
        Ok(mask)
    }

    pub fn flipped_vertical(&self) -> Self {
        let w = self.width as usize;
        let bits = self
            .bits
            .chunks(w.max(1))
            .rev()
            .flat_map(|row| row.iter().copied())
            .collect();
        Self {
            width: self.width,
            height: self.height,
            bits,
        }
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return false;
        }
        self.bits[y as usize * self.width as usize + x as usize]
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    /// First opaque pixel shared with `other` when `other`'s origin sits at
    /// `offset` relative to ours. The point is in our coordinates.
    pub fn overlap(&self, other: &CollisionMask, offset: (i32, i32)) -> Option<(i32, i32)> {
        let (ox, oy) = offset;
        let x0 = ox.max(0);
        let y0 = oy.max(0);
        let x1 = (self.width as i32).min(ox + other.width as i32);
        let y1 = (self.height as i32).min(oy + other.height as i32);

        for y in y0..y1 {
            for x in x0..x1 {
                if self.get(x, y) && other.get(x - ox, y - oy) {
                    return Some((x, y));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_rectangles_overlap_only_when_touching() {
        let a = CollisionMask::solid(10, 10);
        let b = CollisionMask::solid(5, 5);
        assert_eq!(a.overlap(&b, (9, 9)), Some((9, 9)));
        assert_eq!(a.overlap(&b, (10, 0)), None);
        assert_eq!(a.overlap(&b, (-5, 0)), None);
        assert_eq!(a.overlap(&b, (-4, -4)), Some((0, 0)));
    }

    #[test]
    fn ellipse_corners_are_transparent() {
        let e = CollisionMask::ellipse(20, 10);
        assert!(!e.get(0, 0));
        assert!(e.get(10, 5));

        // A 2x2 block touching only the bounding-box corner misses the ellipse.
        let block = CollisionMask::solid(2, 2);
        assert_eq!(e.overlap(&block, (-1, -1)), None);
        assert!(e.overlap(&block, (9, 4)).is_some());
    }

    #[test]
    fn from_alpha_thresholds_and_checks_length() {
        let mask = CollisionMask::from_alpha(2, 2, &[0, 255, 126, 127]).unwrap();
        assert!(!mask.get(0, 0));
        assert!(mask.get(1, 0));
        assert!(!mask.get(0, 1));
        assert!(mask.get(1, 1));
        assert!(CollisionMask::from_alpha(2, 2, &[0; 3]).is_none());
    }

    #[test]
    fn image_alpha_channel_drives_opacity() {
        let image = Image {
            bytes: vec![
                255, 0, 0, 255, 255, 0, 0, 0, // row 0
                0, 0, 0, 200, 9, 9, 9, 100, // row 1
            ],
            width: 2,
            height: 2,
        };
        let mask = CollisionMask::from_image(&image).unwrap();
        assert!(mask.get(0, 0));
        assert!(!mask.get(1, 0));
        assert!(mask.get(0, 1));
        assert!(!mask.get(1, 1));
        assert_eq!(mask.count(), 2);
    }

    #[test]
    fn unreadable_mask_file_is_a_config_error() {
        let path = std::env::temp_dir().join(format!("flock_mask_{}.png", std::process::id()));
        std::fs::write(&path, b"not an image").unwrap();
        assert!(matches!(
            CollisionMask::load(&path),
            Err(ConfigError::Mask { .. })
        ));
        let _ = std::fs::remove_file(&path);

        assert!(matches!(
            CollisionMask::load(Path::new("/nonexistent/flock_mask.png")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn vertical_flip_reverses_rows() {
        let mask = CollisionMask::from_alpha(1, 3, &[255, 0, 0]).unwrap();
        let flipped = mask.flipped_vertical();
        assert!(flipped.get(0, 2));
        assert!(!flipped.get(0, 0));
        assert_eq!(flipped.count(), 1);
    }
}
