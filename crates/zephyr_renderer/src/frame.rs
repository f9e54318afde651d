//! Per-pixel frame buffers and the disjoint row bands render tasks write to.

use crate::postproc::{self, FrameChannels, PostProcess};
use crate::renderer::{color_to_rgba, PixelSample};
use crate::{Color, PixelRect, RenderError, RenderResult};
use image::{Rgba, RgbaImage};
use std::mem;
use zephyr_math::Vec3;

/// Row-major pixel buffers for one image.
///
/// `color` holds the accumulated radiance, `normal` and `depth` the primary
/// hit of the most recent pass, and `final_color` the post-processed color
/// that gets converted for display.
#[derive(Debug, Clone)]
pub struct Frame {
    width: u32,
    height: u32,
    color: Vec<Color>,
    normal: Vec<Vec3>,
    depth: Vec<f32>,
    final_color: Vec<Color>,
}

fn filled<T: Copy>(value: T, len: usize, width: u32, height: u32) -> RenderResult<Vec<T>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| RenderError::Allocation {
            width,
            height,
            bytes: len.saturating_mul(mem::size_of::<T>()),
        })?;
    buffer.resize(len, value);
    Ok(buffer)
}

/// Drop `skip` elements from the front of `slice`, then split off and return
/// the next `take`.
fn carve<'a, T>(slice: &mut &'a mut [T], skip: usize, take: usize) -> &'a mut [T] {
    let rest = mem::take(slice);
    let (_, rest) = rest.split_at_mut(skip);
    let (band, rest) = rest.split_at_mut(take);
    *slice = rest;
    band
}

impl Frame {
    /// Allocate a black frame with every depth at infinity.
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidResolution { width, height });
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or(RenderError::InvalidResolution { width, height })?;

        Ok(Self {
            width,
            height,
            color: filled(Color::ZERO, len, width, height)?,
            normal: filled(Vec3::ZERO, len, width, height)?,
            depth: filled(f32::INFINITY, len, width, height)?,
            final_color: filled(Color::ZERO, len, width, height)?,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.color.len()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Reset every buffer to its initial state.
    pub fn clear(&mut self) {
        self.color.fill(Color::ZERO);
        self.normal.fill(Vec3::ZERO);
        self.depth.fill(f32::INFINITY);
        self.final_color.fill(Color::ZERO);
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn color(&self) -> &[Color] {
        &self.color
    }

    pub fn color_mut(&mut self) -> &mut [Color] {
        &mut self.color
    }

    pub fn normal(&self) -> &[Vec3] {
        &self.normal
    }

    pub fn depth(&self) -> &[f32] {
        &self.depth
    }

    pub fn final_color(&self) -> &[Color] {
        &self.final_color
    }

    pub fn color_at(&self, x: u32, y: u32) -> Color {
        self.color[self.index(x, y)]
    }

    pub fn final_at(&self, x: u32, y: u32) -> Color {
        self.final_color[self.index(x, y)]
    }

    pub fn depth_at(&self, x: u32, y: u32) -> f32 {
        self.depth[self.index(x, y)]
    }

    /// Copy the last-pass normal and depth buffers from `other`.
    pub fn copy_geometry_from(&mut self, other: &Frame) -> RenderResult<()> {
        self.check_same_size(other)?;
        self.normal.copy_from_slice(&other.normal);
        self.depth.copy_from_slice(&other.depth);
        Ok(())
    }

    pub(crate) fn check_same_size(&self, other: &Frame) -> RenderResult<()> {
        if self.dimensions() != other.dimensions() {
            return Err(RenderError::FrameMismatch {
                expected: self.dimensions(),
                actual: other.dimensions(),
            });
        }
        Ok(())
    }

    /// Split the frame into one mutable band per rectangle.
    ///
    /// Rectangles must span the full width, be sorted by `min_y` and must not
    /// overlap; rows not covered by any rectangle are left untouched. The
    /// returned bands borrow disjoint parts of the frame, so they can be
    /// written from different threads at once.
    pub fn bands_mut(&mut self, rects: &[PixelRect]) -> RenderResult<Vec<FrameBand<'_>>> {
        let width = self.width as usize;
        let mut color = self.color.as_mut_slice();
        let mut normal = self.normal.as_mut_slice();
        let mut depth = self.depth.as_mut_slice();
        let mut row = 0u32;
        let mut bands = Vec::with_capacity(rects.len());

        for rect in rects {
            if rect.min_x != 0 || rect.max_x != self.width {
                return Err(RenderError::TaskLayout(format!(
                    "{rect:?} does not span the full width {}",
                    self.width
                )));
            }
            if rect.min_y < row || rect.max_y > self.height || rect.min_y > rect.max_y {
                return Err(RenderError::TaskLayout(format!(
                    "{rect:?} overlaps a previous band or leaves the {}x{} frame",
                    self.width, self.height
                )));
            }

            let skip = (rect.min_y - row) as usize * width;
            let take = rect.height() as usize * width;

            bands.push(FrameBand {
                rect: *rect,
                width: self.width,
                color: carve(&mut color, skip, take),
                normal: carve(&mut normal, skip, take),
                depth: carve(&mut depth, skip, take),
            });
            row = rect.max_y;
        }

        Ok(bands)
    }

    /// Filter `color` into `final_color`.
    pub fn postprocess(&mut self, mode: PostProcess, radius: usize) {
        let channels = FrameChannels {
            width: self.width as usize,
            height: self.height as usize,
            color: &self.color,
            normal: &self.normal,
            depth: &self.depth,
        };
        postproc::apply(mode, radius, channels, &mut self.final_color);
    }

    /// Gamma-corrected RGBA8 image of `final_color`.
    pub fn to_rgba(&self, gamma: f32) -> RgbaImage {
        let mut image = RgbaImage::new(self.width, self.height);
        self.write_rgba(gamma, &mut image);
        image
    }

    /// Convert `final_color` into an existing image of the same size.
    pub fn write_rgba(&self, gamma: f32, image: &mut RgbaImage) {
        for (pixel, color) in image.pixels_mut().zip(&self.final_color) {
            *pixel = Rgba(color_to_rgba(*color, gamma));
        }
    }
}

/// Mutable view of the rows of a [`Frame`] covered by one render task.
pub struct FrameBand<'a> {
    rect: PixelRect,
    width: u32,
    color: &'a mut [Color],
    normal: &'a mut [Vec3],
    depth: &'a mut [f32],
}

impl<'a> FrameBand<'a> {
    pub fn rect(&self) -> PixelRect {
        self.rect
    }

    /// Store a sample for the absolute pixel `(x, y)`.
    ///
    /// Panics if the pixel lies outside this band.
    pub fn set(&mut self, x: u32, y: u32, sample: PixelSample) {
        assert!(
            self.rect.contains(x, y),
            "pixel ({x}, {y}) outside band {:?}",
            self.rect
        );
        let i = (y - self.rect.min_y) as usize * self.width as usize + x as usize;
        self.color[i] = sample.color;
        self.normal[i] = sample.normal;
        self.depth[i] = sample.depth;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition_rows;

    fn sample(value: f32) -> PixelSample {
        PixelSample {
            color: Color::splat(value),
            normal: Vec3::Y,
            depth: value,
        }
    }

    #[test]
    fn test_new_frame_is_cleared() {
        let frame = Frame::new(4, 3).unwrap();
        assert_eq!(frame.pixel_count(), 12);
        assert!(frame.color().iter().all(|c| *c == Color::ZERO));
        assert!(frame.depth().iter().all(|d| *d == f32::INFINITY));
    }

    #[test]
    fn test_zero_resolution_rejected() {
        assert!(matches!(
            Frame::new(0, 10),
            Err(RenderError::InvalidResolution { width: 0, height: 10 })
        ));
    }

    #[test]
    fn test_bands_cover_frame_disjointly() {
        let mut frame = Frame::new(5, 11).unwrap();
        let rects: Vec<PixelRect> = partition_rows(5, 11, 3).iter().map(|t| t.rect).collect();

        {
            let mut bands = frame.bands_mut(&rects).unwrap();
            assert_eq!(bands.len(), 3);
            for (n, band) in bands.iter_mut().enumerate() {
                let rect = band.rect();
                for y in rect.min_y..rect.max_y {
                    for x in rect.min_x..rect.max_x {
                        band.set(x, y, sample(n as f32 + 1.0));
                    }
                }
            }
        }

        for task in partition_rows(5, 11, 3) {
            let expected = task.worker as f32 + 1.0;
            for y in task.rect.min_y..task.rect.max_y {
                for x in 0..5 {
                    assert_eq!(frame.color_at(x, y), Color::splat(expected));
                    assert_eq!(frame.depth_at(x, y), expected);
                }
            }
        }
    }

    #[test]
    fn test_bands_reject_bad_layout() {
        let mut frame = Frame::new(4, 4).unwrap();

        let overlapping = [PixelRect::rows(4, 0, 3), PixelRect::rows(4, 2, 4)];
        assert!(matches!(
            frame.bands_mut(&overlapping),
            Err(RenderError::TaskLayout(_))
        ));

        let narrow = [PixelRect {
            min_x: 0,
            max_x: 2,
            min_y: 0,
            max_y: 4,
        }];
        assert!(frame.bands_mut(&narrow).is_err());

        let too_tall = [PixelRect::rows(4, 0, 5)];
        assert!(frame.bands_mut(&too_tall).is_err());
    }

    #[test]
    #[should_panic]
    fn test_band_write_outside_rect_panics() {
        let mut frame = Frame::new(2, 4).unwrap();
        let mut bands = frame.bands_mut(&[PixelRect::rows(2, 0, 2)]).unwrap();
        bands[0].set(0, 3, sample(1.0));
    }

    #[test]
    fn test_to_rgba_applies_gamma() {
        let mut frame = Frame::new(2, 1).unwrap();
        frame.color_mut()[0] = Color::splat(0.25);
        frame.color_mut()[1] = Color::splat(4.0);
        frame.postprocess(PostProcess::None, 1);

        let image = frame.to_rgba(2.0);
        assert_eq!(image.get_pixel(0, 0).0, [127, 127, 127, 255]);
        assert_eq!(image.get_pixel(1, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_copy_geometry_checks_size() {
        let mut a = Frame::new(2, 2).unwrap();
        let b = Frame::new(3, 2).unwrap();
        assert!(matches!(
            a.copy_geometry_from(&b),
            Err(RenderError::FrameMismatch { .. })
        ));
    }
}
