#![allow(dead_code)]

use std::{collections::VecDeque, sync::Arc};

use depth_keyer::{
    KeyerError, KeyerResult,
    pipeline::{CoordinateMapper, FrameSensor, HandlePool, MultiSourceFrame, StreamMetadata},
    types::{
        Body, BodyFrame, BodyIndexFrame, CameraSpacePoint, ColorFormat, ColorFrame,
        ColorSpacePoint, DepthFrame, DepthSpacePoint, NO_BODY,
    },
};

pub const COLOR_W: u32 = 1920;
pub const COLOR_H: u32 = 1080;
pub const DEPTH_W: u32 = 512;
pub const DEPTH_H: u32 = 424;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn metadata() -> StreamMetadata {
    StreamMetadata {
        color_width: COLOR_W,
        color_height: COLOR_H,
        depth_width: DEPTH_W,
        depth_height: DEPTH_H,
    }
}

/// Camera X/Y are colour pixels; colour pixels scale linearly onto the
/// depth grid.
#[derive(Clone, Debug)]
pub struct LinearMapper {
    pub meta: StreamMetadata,
}

impl CoordinateMapper for LinearMapper {
    fn camera_to_color(&self, point: CameraSpacePoint) -> ColorSpacePoint {
        if point.z <= 0.0 {
            return ColorSpacePoint::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
        }
        ColorSpacePoint::new(point.x, point.y)
    }

    fn camera_to_depth(&self, point: CameraSpacePoint) -> DepthSpacePoint {
        if point.z <= 0.0 {
            return DepthSpacePoint::UNMAPPED;
        }
        let sx = self.meta.depth_width as f32 / self.meta.color_width as f32;
        let sy = self.meta.depth_height as f32 / self.meta.color_height as f32;
        DepthSpacePoint::new(point.x * sx, point.y * sy)
    }

    fn map_color_frame_to_depth_space(
        &self,
        _depth: &DepthFrame,
        out: &mut [DepthSpacePoint],
    ) -> KeyerResult<()> {
        let sx = self.meta.depth_width as f32 / self.meta.color_width as f32;
        let sy = self.meta.depth_height as f32 / self.meta.color_height as f32;
        let width = self.meta.color_width as usize;
        for (i, point) in out.iter_mut().enumerate() {
            let (x, y) = ((i % width) as f32, (i / width) as f32);
            *point = DepthSpacePoint::new(x * sx, y * sy);
        }
        // The first colour row has no depth coverage.
        for point in out.iter_mut().take(width) {
            *point = DepthSpacePoint::UNMAPPED;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Delivery {
    pub drop_color: bool,
    pub drop_depth: bool,
    pub drop_body_index: bool,
    pub drop_body: bool,
    pub disconnect: bool,
    pub nothing: bool,
}

impl Delivery {
    pub fn full() -> Self {
        Self::default()
    }
}

pub struct Scene {
    pub color: ColorFrame,
    pub depth: DepthFrame,
    pub body_index: BodyIndexFrame,
    pub bodies: Vec<Body>,
}

impl Scene {
    /// Opaque colour everywhere, one body occupying a depth-space rectangle.
    pub fn with_body_rect(u0: u32, v0: u32, u1: u32, v1: u32, bodies: Vec<Body>) -> Self {
        let color: Vec<u8> = (0..COLOR_W * COLOR_H)
            .flat_map(|i| [(i % 251) as u8 + 1, 20, 30, 255])
            .collect();
        let mut mask = vec![NO_BODY; (DEPTH_W * DEPTH_H) as usize];
        for v in v0..v1 {
            for u in u0..u1 {
                mask[(v * DEPTH_W + u) as usize] = 0;
            }
        }
        Scene {
            color: ColorFrame {
                width: COLOR_W,
                height: COLOR_H,
                format: ColorFormat::Rgba,
                data: Arc::from(color),
            },
            depth: DepthFrame {
                width: DEPTH_W,
                height: DEPTH_H,
                data: Arc::from(vec![2000u16; (DEPTH_W * DEPTH_H) as usize]),
            },
            body_index: BodyIndexFrame {
                width: DEPTH_W,
                height: DEPTH_H,
                data: Arc::from(mask),
            },
            bodies,
        }
    }
}

/// Replays a fixed scene; each acquisition follows the next scripted
/// [`Delivery`] (full frames once the script runs out).
pub struct ScriptedSensor {
    pub mapper: LinearMapper,
    pub pool: HandlePool,
    pub scene: Scene,
    pub script: VecDeque<Delivery>,
    open: bool,
}

impl ScriptedSensor {
    pub fn new(scene: Scene) -> Self {
        ScriptedSensor {
            mapper: LinearMapper { meta: metadata() },
            pool: HandlePool::new(8),
            scene,
            script: VecDeque::new(),
            open: false,
        }
    }

    pub fn push(&mut self, delivery: Delivery) {
        self.script.push_back(delivery);
    }
}

impl FrameSensor for ScriptedSensor {
    fn open(&mut self) -> KeyerResult<StreamMetadata> {
        self.open = true;
        Ok(metadata())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn metadata(&self) -> StreamMetadata {
        metadata()
    }

    fn mapper(&self) -> &dyn CoordinateMapper {
        &self.mapper
    }

    fn acquire_latest(&mut self) -> KeyerResult<Option<MultiSourceFrame>> {
        let delivery = self.script.pop_front().unwrap_or_default();
        if delivery.disconnect {
            return Err(KeyerError::disconnected("scripted unplug"));
        }
        if delivery.nothing {
            return Ok(None);
        }

        let mut frame = MultiSourceFrame::default();
        if !delivery.drop_color {
            frame.color = self.pool.wrap(self.scene.color.clone());
        }
        if !delivery.drop_depth {
            frame.depth = self.pool.wrap(self.scene.depth.clone());
        }
        if !delivery.drop_body_index {
            frame.body_index = self.pool.wrap(self.scene.body_index.clone());
        }
        if !delivery.drop_body {
            frame.body = self.pool.wrap(BodyFrame {
                bodies: self.scene.bodies.clone(),
            });
        }
        Ok(Some(frame))
    }
}
