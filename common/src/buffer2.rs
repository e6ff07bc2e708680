use std::ops::Index;

/// Row-major single-channel frame. Sample `(x, y)` lives at `y * width + x`.
#[derive(Debug, Clone)]
pub struct Buffer2<T> {
    pixels: Vec<T>,
    width: usize,
    height: usize,
}

impl<T> Buffer2<T> {
    pub fn new(width: usize, height: usize, pixels: Vec<T>) -> Self {
        assert_eq!(
            pixels.len(),
            width * height,
            "frame of {}x{} needs {} samples, got {}",
            width,
            height,
            width * height,
            pixels.len()
        );
        Self {
            pixels,
            width,
            height,
        }
    }

    pub fn new_filled(width: usize, height: usize, value: T) -> Self
    where
        T: Clone,
    {
        Self::new(width, height, vec![value; width * height])
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &T {
        debug_assert!(x < self.width && y < self.height);
        &self.pixels[y * self.width + x]
    }

    /// Sample at `(x, y)`, or `None` outside the frame.
    #[inline]
    pub fn try_get(&self, x: usize, y: usize) -> Option<&T> {
        (x < self.width && y < self.height).then(|| &self.pixels[y * self.width + x])
    }

    /// Columns `x0..=x1` of row `y`, or `None` unless all of them are inside
    /// the frame.
    #[inline]
    pub fn row_span(&self, y: usize, x0: usize, x1: usize) -> Option<&[T]> {
        if y >= self.height || x0 > x1 || x1 >= self.width {
            return None;
        }
        let start = y * self.width;
        Some(&self.pixels[start + x0..=start + x1])
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[T] {
        &self.pixels
    }
}

impl<T> Index<(usize, usize)> for Buffer2<T> {
    type Output = T;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &T {
        self.get(x, y)
    }
}
