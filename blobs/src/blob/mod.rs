//! Finished blob records.
//!
//! A [`Blob`] owns its runs. Geometric properties and image moments are
//! computed on demand, in that order:
//!
//! 1. [`Blob::sort`] (unless the runs are known to be sorted)
//! 2. [`Blob::calculate_properties`]: bounds, pixel count, box centre
//! 3. [`Blob::calculate_moments`]: raw/central/normalized moments, centroid
//!    and orientation
//!
//! Reading a property before its step ran panics. The check is a flag test
//! and stays on in release builds, so an unready blob never passes for a
//! valid zero-sized one.


use std::fmt;

use common::Buffer2;
use glam::Vec2;

use crate::bid::Bid;
use crate::bounds::Bounds;
use crate::error::{BlobError, Result};
use crate::hline::Line32;

/// Geometry computed by [`Blob::calculate_properties`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Properties {
    /// Box centre, replaced by the pixel centroid once moments are computed.
    pub center: Vec2,
    pub num_pixels: u64,
    pub bounds: Bounds,
}

/// Image moments up to order 2 in x and y, indexed `[x order][y order]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    /// Raw moments `sum(x^i * y^j)`.
    pub m: [[f64; 3]; 3],
    /// Central moments about the centroid.
    pub mu: [[f64; 3]; 3],
    /// Central moments divided by `mu[0][0]`.
    pub mu_normalized: [[f64; 3]; 3],
    /// Major axis angle in radians.
    pub orientation: f32,
}

/// A connected region stored as runs, with lazily computed properties.
#[derive(Debug, Clone, Default)]
pub struct Blob {
    lines: Vec<Line32>,
    properties: Option<Properties>,
    moments: Option<Moments>,
}

impl Blob {
    /// Takes ownership of `lines` without copying.
    pub fn new(lines: Vec<Line32>) -> Self {
        Self {
            lines,
            properties: None,
            moments: None,
        }
    }

    #[inline]
    pub fn lines(&self) -> &[Line32] {
        &self.lines
    }

    #[inline]
    pub fn into_lines(self) -> Vec<Line32> {
        self.lines
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sorts runs top-to-bottom, left-to-right.
    ///
    /// Properties and identity assume sorted runs; unsorted runs give a wrong
    /// identity without any error.
    pub fn sort(&mut self) {
        self.lines.sort_unstable();
    }

    pub fn is_sorted(&self) -> bool {
        self.lines.windows(2).all(|w| w[0] <= w[1])
    }

    /// Identity derived from the first run and the run count.
    pub fn blob_id(&self) -> Bid {
        Bid::from_blob(self)
    }

    /// Computes bounds, pixel count and box centre. Repeated calls are no-ops.
    pub fn calculate_properties(&mut self) -> Result<()> {
        if self.properties.is_some() {
            return Ok(());
        }
        if self.lines.is_empty() {
            return Err(BlobError::EmptyBlob);
        }

        let mut x_min = u32::MAX;
        let mut x_max = 0;
        let mut y_min = u32::MAX;
        let mut y_max = 0;
        let mut num_pixels = 0u64;

        for line in &self.lines {
            x_min = x_min.min(line.x0());
            x_max = x_max.max(line.x1());
            y_min = y_min.min(line.y());
            y_max = y_max.max(line.y());
            num_pixels += line.len() as u64;
        }

        let bounds = Bounds::from_extents(x_min, x_max, y_min, y_max);
        self.properties = Some(Properties {
            center: bounds.pos() + bounds.size() * 0.5,
            num_pixels,
            bounds,
        });
        Ok(())
    }

    /// Computes moment tables, the pixel centroid and the orientation.
    ///
    /// Requires [`Blob::calculate_properties`] to have run.
    pub fn calculate_moments(&mut self) -> Result<()> {
        if self.moments.is_some() {
            return Ok(());
        }
        let Some(properties) = self.properties.as_mut() else {
            return Err(BlobError::PropertiesNotReady);
        };

        let mut m = [[0.0f64; 3]; 3];
        for line in &self.lines {
            let y = line.y() as f64;
            let y2 = y * y;
            for x in line.x0()..=line.x1() {
                let x = x as f64;
                let x2 = x * x;
                m[0][0] += 1.0;
                m[0][1] += y;
                m[0][2] += y2;
                m[1][0] += x;
                m[1][1] += x * y;
                m[1][2] += x * y2;
                m[2][0] += x2;
                m[2][1] += x2 * y;
                m[2][2] += x2 * y2;
            }
        }

        let cx = m[1][0] / m[0][0];
        let cy = m[0][1] / m[0][0];
        properties.center = Vec2::new(cx as f32, cy as f32);

        let mut mu = [[0.0f64; 3]; 3];
        for line in &self.lines {
            let vy = line.y() as f64 - cy;
            let vy2 = vy * vy;
            for x in line.x0()..=line.x1() {
                let vx = x as f64 - cx;
                let vx2 = vx * vx;
                mu[0][0] += 1.0;
                mu[0][1] += vy;
                mu[0][2] += vy2;
                mu[1][0] += vx;
                mu[1][1] += vx * vy;
                mu[1][2] += vx * vy2;
                mu[2][0] += vx2;
                mu[2][1] += vx2 * vy;
                mu[2][2] += vx2 * vy2;
            }
        }

        let inv = 1.0 / mu[0][0];
        let mut mu_normalized = [[0.0f64; 3]; 3];
        for (row, mu_row) in mu_normalized.iter_mut().zip(mu.iter()) {
            for (value, &raw) in row.iter_mut().zip(mu_row.iter()) {
                *value = raw * inv;
            }
        }

        let orientation = 0.5
            * (2.0 * mu_normalized[1][1]).atan2(mu_normalized[2][0] - mu_normalized[0][2]);

        self.moments = Some(Moments {
            m,
            mu,
            mu_normalized,
            orientation: orientation as f32,
        });
        Ok(())
    }

    #[inline]
    pub fn properties_ready(&self) -> bool {
        self.properties.is_some()
    }

    #[inline]
    pub fn moments_ready(&self) -> bool {
        self.moments.is_some()
    }

    /// Computed properties, if [`Blob::calculate_properties`] ran.
    #[inline]
    pub fn properties(&self) -> Option<&Properties> {
        self.properties.as_ref()
    }

    /// Computed moments, if [`Blob::calculate_moments`] ran.
    #[inline]
    pub fn try_moments(&self) -> Option<&Moments> {
        self.moments.as_ref()
    }

    #[inline]
    fn ready_properties(&self) -> &Properties {
        match &self.properties {
            Some(properties) => properties,
            None => panic!("Blob properties have not been calculated yet"),
        }
    }

    pub fn center(&self) -> Vec2 {
        self.ready_properties().center
    }

    pub fn bounds(&self) -> Bounds {
        self.ready_properties().bounds
    }

    pub fn num_pixels(&self) -> u64 {
        self.ready_properties().num_pixels
    }

    pub fn moments(&self) -> &Moments {
        match &self.moments {
            Some(moments) => moments,
            None => panic!("Blob moments have not been calculated yet"),
        }
    }

    pub fn orientation(&self) -> f32 {
        self.moments().orientation
    }

    /// Copies the samples under every run out of `background`, in run order.
    ///
    /// The result holds exactly [`Blob::num_pixels`] values. Runs reaching
    /// outside the image are an error.
    pub fn calculate_pixels(&self, background: &Buffer2<u8>) -> Result<Vec<u8>> {
        let Some(properties) = self.properties.as_ref() else {
            return Err(BlobError::PropertiesNotReady);
        };

        let mut pixels = Vec::with_capacity(properties.num_pixels as usize);
        for line in &self.lines {
            let row = background
                .row_span(line.y() as usize, line.x0() as usize, line.x1() as usize)
                .ok_or_else(|| BlobError::OutOfBounds {
                    line: line.to_string(),
                    width: background.width(),
                    height: background.height(),
                })?;
            pixels.extend_from_slice(row);
        }

        debug_assert_eq!(pixels.len() as u64, properties.num_pixels);
        Ok(pixels)
    }

    /// Moves every run by `(dx, dy)` and drops computed properties.
    ///
    /// Fails without modifying the blob if any run leaves the encodable range.
    pub fn add_offset(&mut self, dx: i32, dy: i32) -> Result<()> {
        let moved = self
            .lines
            .iter()
            .map(|line| {
                let x0 = line.x0().checked_add_signed(dx);
                let x1 = line.x1().checked_add_signed(dx);
                let y = line.y().checked_add_signed(dy);
                match (x0, x1, y) {
                    (Some(x0), Some(x1), Some(y)) => Line32::new(x0, x1, y),
                    _ => Err(BlobError::OffsetOutOfRange {
                        line: line.to_string(),
                        dx,
                        dy,
                    }),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        self.lines = moved;
        self.properties = None;
        self.moments = None;
        Ok(())
    }
}

impl From<Vec<Line32>> for Blob {
    fn from(lines: Vec<Line32>) -> Self {
        Self::new(lines)
    }
}

impl fmt::Display for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.properties {
            Some(properties) => write!(
                f,
                "Blob<pos:({},{}) size:({},{})>",
                properties.center.x,
                properties.center.y,
                properties.bounds.width,
                properties.bounds.height
            ),
            None => write!(f, "Blob<lines:{}>", self.lines.len()),
        }
    }
}
