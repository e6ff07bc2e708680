//! Axis-aligned bounding box of a blob.

use glam::Vec2;

/// Pixel-aligned bounding box given as top-left corner and size.
///
/// A box of width 1 covers exactly the column `x`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    #[inline]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Box covering the inclusive ranges `x_min..=x_max`, `y_min..=y_max`.
    #[inline]
    pub const fn from_extents(x_min: u32, x_max: u32, y_min: u32, y_max: u32) -> Self {
        Self {
            x: x_min,
            y: y_min,
            width: x_max - x_min + 1,
            height: y_max - y_min + 1,
        }
    }

    #[inline]
    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// Last column inside the box.
    #[inline]
    pub const fn x_max(&self) -> u32 {
        self.x + self.width - 1
    }

    /// Last row inside the box.
    #[inline]
    pub const fn y_max(&self) -> u32 {
        self.y + self.height - 1
    }

    #[inline]
    pub const fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    #[inline]
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}
