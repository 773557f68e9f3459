//! Software stand-in for a depth-camera rig: one person-shaped box standing
//! in front of a wall, with scripted hand states and stream dropouts.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::Sender;

use crate::{
    error::{KeyerError, KeyerResult},
    types::{
        Body, BodyFrame, BodyIndexFrame, CameraSpacePoint, ClippedEdges, ColorFormat, ColorFrame,
        DepthFrame, HandState, JointType, NO_BODY, TrackingState,
    },
};

use super::{
    mapper::PinholeMapper,
    pump::FrameArrived,
    sensor::{CoordinateMapper, FrameSensor, HandlePool, MultiSourceFrame, StreamMetadata},
};

/// In-flight handles per sub-frame stream, like a real sensor's frame pool.
pub const DEFAULT_HANDLE_POOL: usize = 8;

const WALL_DEPTH_MM: u16 = 4000;
const BODY_DEPTH_M: f32 = 2.0;
/// Body extent in camera space: (min x, min y, max x, max y).
const BODY_BOX: (f32, f32, f32, f32) = (-0.3, -0.9, 0.3, 0.7);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamKind {
    Color,
    Depth,
    BodyIndex,
    Body,
}

#[derive(Clone, Copy, Debug)]
struct Dropout {
    stream: StreamKind,
    every: u64,
}

pub struct SyntheticRig {
    mapper: PinholeMapper,
    metadata: StreamMetadata,
    pool: HandlePool,
    color_format: ColorFormat,
    open: bool,
    disconnected: bool,
    frame_index: u64,
    dropout: Option<Dropout>,
    hand_left: HandState,
    hand_right: HandState,
    clipped_edges: ClippedEdges,
    scene: Option<Scene>,
}

struct Scene {
    color: ColorFrame,
    depth: DepthFrame,
    body_index: BodyIndexFrame,
}

impl SyntheticRig {
    pub fn new(mapper: PinholeMapper) -> Self {
        SyntheticRig {
            metadata: mapper.metadata(),
            mapper,
            pool: HandlePool::new(DEFAULT_HANDLE_POOL),
            color_format: ColorFormat::Bgra,
            open: false,
            disconnected: false,
            frame_index: 0,
            dropout: None,
            hand_left: HandState::Closed,
            hand_right: HandState::Open,
            clipped_edges: ClippedEdges::NONE,
            scene: None,
        }
    }

    pub fn with_color_format(mut self, format: ColorFormat) -> Self {
        self.color_format = format;
        self.scene = None;
        self
    }

    pub fn with_pool(mut self, pool: HandlePool) -> Self {
        self.pool = pool;
        self
    }

    pub fn pool(&self) -> &HandlePool {
        &self.pool
    }

    pub fn set_hands(&mut self, left: HandState, right: HandState) {
        self.hand_left = left;
        self.hand_right = right;
    }

    pub fn set_clipped_edges(&mut self, edges: ClippedEdges) {
        self.clipped_edges = edges;
    }

    /// Leaves `stream` out of every `every`-th frame (counting from 1).
    pub fn set_dropout(&mut self, stream: StreamKind, every: u64) {
        self.dropout = (every > 0).then_some(Dropout { stream, every });
    }

    /// Makes every later acquisition fail as if the device were unplugged.
    pub fn disconnect(&mut self) {
        self.disconnected = true;
    }

    pub fn frames_delivered(&self) -> u64 {
        self.frame_index
    }

    fn is_dropped(&self, stream: StreamKind) -> bool {
        match self.dropout {
            Some(d) => d.stream == stream && self.frame_index % d.every == 0,
            None => false,
        }
    }

    fn build_scene(&self) -> Scene {
        let meta = self.metadata;

        // Depth-space silhouette of the body box.
        let top_left = self.mapper.camera_to_depth(CameraSpacePoint::new(
            BODY_BOX.0,
            BODY_BOX.3,
            BODY_DEPTH_M,
        ));
        let bottom_right = self.mapper.camera_to_depth(CameraSpacePoint::new(
            BODY_BOX.2,
            BODY_BOX.1,
            BODY_DEPTH_M,
        ));
        let inside = |u: u32, v: u32| {
            let (u, v) = (u as f32, v as f32);
            u >= top_left.x && u <= bottom_right.x && v >= top_left.y && v <= bottom_right.y
        };

        let mut depth = Vec::with_capacity(meta.depth_pixels());
        let mut body_index = Vec::with_capacity(meta.depth_pixels());
        for v in 0..meta.depth_height {
            for u in 0..meta.depth_width {
                if inside(u, v) {
                    depth.push((BODY_DEPTH_M * 1000.0) as u16);
                    body_index.push(0);
                } else {
                    depth.push(WALL_DEPTH_MM);
                    body_index.push(NO_BODY);
                }
            }
        }

        Scene {
            color: color_pattern(meta.color_width, meta.color_height, self.color_format),
            depth: DepthFrame {
                width: meta.depth_width,
                height: meta.depth_height,
                data: Arc::from(depth),
            },
            body_index: BodyIndexFrame {
                width: meta.depth_width,
                height: meta.depth_height,
                data: Arc::from(body_index),
            },
        }
    }

    fn body_frame(&self) -> BodyFrame {
        let (x0, y0, x1, y1) = BODY_BOX;
        let mid_x = (x0 + x1) / 2.0;
        let z = BODY_DEPTH_M;
        let mut body = Body {
            tracking_id: 72_057_594_037_928_000,
            is_tracked: true,
            clipped_edges: self.clipped_edges,
            hand_left_state: self.hand_left,
            hand_right_state: self.hand_right,
            ..Body::default()
        };

        let joints = [
            (JointType::Head, mid_x, y1 - 0.1),
            (JointType::Neck, mid_x, y1 - 0.25),
            (JointType::SpineShoulder, mid_x, y1 - 0.3),
            (JointType::SpineMid, mid_x, 0.0),
            (JointType::SpineBase, mid_x, -0.3),
            (JointType::ShoulderLeft, x0 + 0.1, y1 - 0.3),
            (JointType::ElbowLeft, x0 - 0.05, 0.0),
            (JointType::WristLeft, x0 - 0.1, 0.1),
            (JointType::HandLeft, x0 - 0.12, 0.15),
            (JointType::ShoulderRight, x1 - 0.1, y1 - 0.3),
            (JointType::ElbowRight, x1 + 0.05, 0.0),
            (JointType::WristRight, x1 + 0.1, 0.1),
            (JointType::HandRight, x1 + 0.12, 0.15),
            (JointType::HipLeft, x0 + 0.15, -0.35),
            (JointType::KneeLeft, x0 + 0.15, -0.6),
            (JointType::AnkleLeft, x0 + 0.15, y0 + 0.05),
            (JointType::HipRight, x1 - 0.15, -0.35),
            (JointType::KneeRight, x1 - 0.15, -0.6),
            (JointType::AnkleRight, x1 - 0.15, y0 + 0.05),
        ];
        for (joint, x, y) in joints {
            body.set_joint(joint, CameraSpacePoint::new(x, y, z), TrackingState::Tracked);
        }
        // Feet sit just behind the sensor's view of the floor.
        body.set_joint(
            JointType::FootLeft,
            CameraSpacePoint::new(x0 + 0.15, y0, z),
            TrackingState::Inferred,
        );
        body.set_joint(
            JointType::FootRight,
            CameraSpacePoint::new(x1 - 0.15, y0, z),
            TrackingState::Inferred,
        );

        let mut bodies = vec![Body::default(); 6];
        bodies[0] = body;
        BodyFrame { bodies }
    }
}

impl Default for SyntheticRig {
    fn default() -> Self {
        Self::new(PinholeMapper::kinect_v2())
    }
}

impl FrameSensor for SyntheticRig {
    fn open(&mut self) -> KeyerResult<StreamMetadata> {
        if self.disconnected {
            return Err(KeyerError::disconnected("synthetic rig unplugged"));
        }
        if self.scene.is_none() {
            self.scene = Some(self.build_scene());
        }
        self.open = true;
        Ok(self.metadata)
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn metadata(&self) -> StreamMetadata {
        self.metadata
    }

    fn mapper(&self) -> &dyn CoordinateMapper {
        &self.mapper
    }

    fn acquire_latest(&mut self) -> KeyerResult<Option<MultiSourceFrame>> {
        if self.disconnected {
            return Err(KeyerError::disconnected("synthetic rig unplugged"));
        }
        if !self.open {
            return Err(KeyerError::SensorNotOpen);
        }
        if self.scene.is_none() {
            self.scene = Some(self.build_scene());
        }
        self.frame_index += 1;

        let body = self.body_frame();
        let Some(scene) = self.scene.as_ref() else {
            return Ok(None);
        };

        let mut frame = MultiSourceFrame::default();
        if !self.is_dropped(StreamKind::Color) {
            frame.color = self.pool.wrap(scene.color.clone());
        }
        if !self.is_dropped(StreamKind::Depth) {
            frame.depth = self.pool.wrap(scene.depth.clone());
        }
        if !self.is_dropped(StreamKind::BodyIndex) {
            frame.body_index = self.pool.wrap(scene.body_index.clone());
        }
        if !self.is_dropped(StreamKind::Body) {
            frame.body = self.pool.wrap(body);
        }
        Ok(Some(frame))
    }
}

fn color_pattern(width: u32, height: u32, format: ColorFormat) -> ColorFrame {
    let mut data = Vec::with_capacity(width as usize * height as usize * format.bytes_per_pixel());
    for y in 0..height {
        for x in 0..width {
            let r = (x * 255 / width.max(1)) as u8;
            let g = (y * 255 / height.max(1)) as u8;
            let b = 160u8;
            match format {
                ColorFormat::Rgba => data.extend_from_slice(&[r, g, b, 255]),
                ColorFormat::Bgra => data.extend_from_slice(&[b, g, r, 255]),
                ColorFormat::Yuyv => {
                    // Luma ramp with neutral chroma, two pixels per U/V pair.
                    let luma = r / 2 + g / 2;
                    let chroma = 128u8;
                    data.extend_from_slice(&[luma, chroma]);
                }
            }
        }
    }
    ColorFrame {
        width,
        height,
        format,
        data: Arc::from(data),
    }
}

/// Background thread emitting [`FrameArrived`] events at a fixed rate.
#[derive(Debug)]
pub struct TickSource {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl TickSource {
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for TickSource {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Sends an event every `interval`, `limit` times (forever when `None`). The
/// sender is dropped when the thread ends, which closes the channel.
pub fn start_tick_source(
    interval: Duration,
    limit: Option<u64>,
    tx: Sender<FrameArrived>,
) -> TickSource {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();

    let handle = thread::spawn(move || {
        let mut sent = 0u64;
        while !stop_flag.load(Ordering::Relaxed) {
            if limit.is_some_and(|limit| sent >= limit) {
                break;
            }
            thread::sleep(interval);
            // Drop the event if the pump is still busy with the previous one.
            let _ = tx.try_send(FrameArrived {
                timestamp: Instant::now(),
            });
            sent += 1;
        }
        log::debug!("tick source finished after {sent} events");
    });

    TickSource {
        stop,
        handle: Some(handle),
    }
}
