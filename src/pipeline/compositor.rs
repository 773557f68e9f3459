//! Green-screen pass: keeps colour pixels that land on a tracked body in the
//! body-index mask and clears everything else to transparent black.

use crate::{
    error::{KeyerError, KeyerResult},
    types::{BodyIndexFrame, ColorFrame, DepthFrame, DepthSpacePoint, NO_BODY},
};

use super::{
    pixel_buffer::{BYTES_PER_PIXEL, DirtyRect, PixelBuffer},
    rgba_converter,
    sensor::{CoordinateMapper, StreamMetadata},
};

#[derive(Debug)]
pub struct BackgroundRemover {
    metadata: StreamMetadata,
    /// One entry per colour pixel, rebuilt from the current depth frame on
    /// every call.
    color_to_depth: Vec<DepthSpacePoint>,
}

impl BackgroundRemover {
    pub fn new(metadata: StreamMetadata) -> Self {
        BackgroundRemover {
            metadata,
            color_to_depth: vec![DepthSpacePoint::UNMAPPED; metadata.color_pixels()],
        }
    }

    pub fn color_to_depth(&self) -> &[DepthSpacePoint] {
        &self.color_to_depth
    }

    /// Copies `color` into `output` and zeroes every background pixel. The
    /// buffer is only committed once the whole frame has been written.
    pub fn composite(
        &mut self,
        mapper: &dyn CoordinateMapper,
        color: &ColorFrame,
        depth: &DepthFrame,
        body_index: &BodyIndexFrame,
        output: &mut PixelBuffer,
    ) -> KeyerResult<DirtyRect> {
        self.check_dimensions(color, depth, body_index, output)?;

        mapper.map_color_frame_to_depth_space(depth, &mut self.color_to_depth)?;

        let mut scope = output.lock();
        rgba_converter::copy_color_frame(color, scope.pixels_mut())?;
        mask_background(scope.pixels_mut(), &self.color_to_depth, body_index);

        let full = DirtyRect::new(0, 0, self.metadata.color_width, self.metadata.color_height);
        scope.add_dirty_rect(full);
        Ok(scope.commit().unwrap_or(full))
    }

    fn check_dimensions(
        &self,
        color: &ColorFrame,
        depth: &DepthFrame,
        body_index: &BodyIndexFrame,
        output: &PixelBuffer,
    ) -> KeyerResult<()> {
        let meta = self.metadata;
        let color_dims = (meta.color_width, meta.color_height);
        let depth_dims = (meta.depth_width, meta.depth_height);

        let checks = [
            ("color frame", color_dims, (color.width, color.height)),
            ("output buffer", color_dims, (output.width(), output.height())),
            ("depth frame", depth_dims, (depth.width, depth.height)),
            ("body index frame", depth_dims, (body_index.width, body_index.height)),
        ];
        for (what, expected, actual) in checks {
            if expected != actual {
                return Err(KeyerError::DimensionMismatch {
                    what,
                    expected,
                    actual,
                });
            }
        }

        if body_index.data.len() < meta.depth_pixels() {
            return Err(KeyerError::BufferTooSmall {
                what: "body index",
                expected: meta.depth_pixels(),
                actual: body_index.data.len(),
            });
        }
        Ok(())
    }
}

/// Zeroes every pixel of `pixels` whose mapped depth location is missing,
/// out of bounds or not on a body. `pixels` and `color_to_depth` are both in
/// colour raster order.
pub fn mask_background(
    pixels: &mut [u8],
    color_to_depth: &[DepthSpacePoint],
    body_index: &BodyIndexFrame,
) {
    for (px, point) in pixels
        .chunks_exact_mut(BYTES_PER_PIXEL)
        .zip(color_to_depth.iter())
    {
        if !is_body_pixel(point, body_index) {
            px.fill(0);
        }
    }
}

#[inline]
fn is_body_pixel(point: &DepthSpacePoint, body_index: &BodyIndexFrame) -> bool {
    match point.to_pixel(body_index.width, body_index.height) {
        Some((x, y)) => body_index.at(x, y) != NO_BODY,
        None => false,
    }
}
