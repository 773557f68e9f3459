use crate::{
    error::{KeyerError, KeyerResult},
    types::{CameraSpacePoint, ColorSpacePoint, DepthFrame, DepthSpacePoint},
};

use super::sensor::{CoordinateMapper, StreamMetadata};

/// Pinhole intrinsics in pixels. Camera space is metres, X right, Y up,
/// Z away from the sensor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

impl Intrinsics {
    #[inline]
    fn project(&self, point: CameraSpacePoint) -> (f32, f32) {
        (
            self.fx * point.x / point.z + self.cx,
            self.cy - self.fy * point.y / point.z,
        )
    }

    #[inline]
    fn unproject(&self, u: f32, v: f32, z: f32) -> CameraSpacePoint {
        CameraSpacePoint::new((u - self.cx) * z / self.fx, (self.cy - v) * z / self.fy, z)
    }
}

/// Two pinhole cameras sharing an orientation, offset by a fixed baseline.
#[derive(Clone, Debug)]
pub struct PinholeMapper {
    metadata: StreamMetadata,
    depth: Intrinsics,
    color: Intrinsics,
    /// Translation from depth-camera space into colour-camera space.
    baseline: CameraSpacePoint,
}

impl PinholeMapper {
    pub fn new(
        metadata: StreamMetadata,
        depth: Intrinsics,
        color: Intrinsics,
        baseline: CameraSpacePoint,
    ) -> Self {
        PinholeMapper {
            metadata,
            depth,
            color,
            baseline,
        }
    }

    /// Typical factory calibration for a 512x424 depth / 1920x1080 colour rig.
    pub fn kinect_v2() -> Self {
        Self::new(
            StreamMetadata {
                color_width: 1920,
                color_height: 1080,
                depth_width: 512,
                depth_height: 424,
            },
            Intrinsics {
                fx: 365.5,
                fy: 365.5,
                cx: 255.5,
                cy: 211.5,
            },
            Intrinsics {
                fx: 1081.4,
                fy: 1081.4,
                cx: 959.5,
                cy: 539.5,
            },
            CameraSpacePoint::new(-0.052, 0.0, 0.0),
        )
    }

    pub fn metadata(&self) -> StreamMetadata {
        self.metadata
    }

    /// Raw depth behind an already-written map entry; `u16::MAX` when unset.
    fn depth_at(&self, depth: &DepthFrame, point: DepthSpacePoint) -> u16 {
        if !point.x.is_finite() || !point.y.is_finite() {
            return u16::MAX;
        }
        let idx = point.y as usize * self.metadata.depth_width as usize + point.x as usize;
        depth.data.get(idx).copied().unwrap_or(u16::MAX)
    }

    fn to_color_camera(&self, point: CameraSpacePoint) -> CameraSpacePoint {
        CameraSpacePoint::new(
            point.x + self.baseline.x,
            point.y + self.baseline.y,
            point.z + self.baseline.z,
        )
    }
}

impl CoordinateMapper for PinholeMapper {
    fn camera_to_color(&self, point: CameraSpacePoint) -> ColorSpacePoint {
        let point = self.to_color_camera(point);
        if point.z <= 0.0 {
            return ColorSpacePoint::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
        }
        let (x, y) = self.color.project(point);
        ColorSpacePoint::new(x, y)
    }

    fn camera_to_depth(&self, point: CameraSpacePoint) -> DepthSpacePoint {
        if point.z <= 0.0 {
            return DepthSpacePoint::UNMAPPED;
        }
        let (x, y) = self.depth.project(point);
        DepthSpacePoint::new(x, y)
    }

    fn map_color_frame_to_depth_space(
        &self,
        depth: &DepthFrame,
        out: &mut [DepthSpacePoint],
    ) -> KeyerResult<()> {
        let meta = self.metadata;
        if (depth.width, depth.height) != (meta.depth_width, meta.depth_height) {
            return Err(KeyerError::DimensionMismatch {
                what: "depth frame",
                expected: (meta.depth_width, meta.depth_height),
                actual: (depth.width, depth.height),
            });
        }
        if depth.data.len() < meta.depth_pixels() {
            return Err(KeyerError::BufferTooSmall {
                what: "depth frame",
                expected: meta.depth_pixels(),
                actual: depth.data.len(),
            });
        }
        if out.len() != meta.color_pixels() {
            return Err(KeyerError::BufferTooSmall {
                what: "color-to-depth map",
                expected: meta.color_pixels(),
                actual: out.len(),
            });
        }

        out.fill(DepthSpacePoint::UNMAPPED);

        let color_w = meta.color_width as f32;
        let color_h = meta.color_height as f32;
        for v in 0..meta.depth_height {
            for u in 0..meta.depth_width {
                let raw = depth.data[(v * meta.depth_width + u) as usize];
                if raw == 0 {
                    continue;
                }
                let z = f32::from(raw) / 1000.0;
                let (u, v) = (u as f32, v as f32);

                // Splat the depth pixel over the colour pixels its footprint covers.
                let a = self.to_color_camera(self.depth.unproject(u - 0.5, v - 0.5, z));
                let b = self.to_color_camera(self.depth.unproject(u + 0.5, v + 0.5, z));
                let (ax, ay) = self.color.project(a);
                let (bx, by) = self.color.project(b);

                let x0 = ax.min(bx).round().clamp(0.0, color_w) as usize;
                let x1 = ax.max(bx).round().clamp(0.0, color_w) as usize;
                let y0 = ay.min(by).round().clamp(0.0, color_h) as usize;
                let y1 = ay.max(by).round().clamp(0.0, color_h) as usize;

                // Nearer surfaces win where parallax makes footprints overlap.
                let target = DepthSpacePoint::new(u, v);
                for row in y0..y1 {
                    let offset = row * meta.color_width as usize;
                    for slot in &mut out[offset + x0..offset + x1] {
                        if raw <= self.depth_at(depth, *slot) {
                            *slot = target;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
