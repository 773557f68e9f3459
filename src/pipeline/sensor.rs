use std::ops::Deref;

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::{
    error::KeyerResult,
    types::{
        BodyFrame, BodyIndexFrame, CameraSpacePoint, ColorFrame, ColorSpacePoint, DepthFrame,
        DepthSpacePoint,
    },
};

/// Fixed stream resolutions, known once the sensor is open.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamMetadata {
    pub color_width: u32,
    pub color_height: u32,
    pub depth_width: u32,
    pub depth_height: u32,
}

impl StreamMetadata {
    pub fn color_pixels(&self) -> usize {
        self.color_width as usize * self.color_height as usize
    }

    pub fn depth_pixels(&self) -> usize {
        self.depth_width as usize * self.depth_height as usize
    }
}

pub trait CoordinateMapper {
    fn camera_to_color(&self, point: CameraSpacePoint) -> ColorSpacePoint;

    fn camera_to_depth(&self, point: CameraSpacePoint) -> DepthSpacePoint;

    /// Fills `out` (one entry per colour pixel, row-major) with the depth
    /// pixel each colour pixel lands on, or [`DepthSpacePoint::UNMAPPED`].
    fn map_color_frame_to_depth_space(
        &self,
        depth: &DepthFrame,
        out: &mut [DepthSpacePoint],
    ) -> KeyerResult<()>;
}

/// One synchronized delivery from the sensor. Any sub-frame may have expired
/// before it was read.
#[derive(Debug, Default)]
pub struct MultiSourceFrame {
    pub color: Option<Leased<ColorFrame>>,
    pub depth: Option<Leased<DepthFrame>>,
    pub body_index: Option<Leased<BodyIndexFrame>>,
    pub body: Option<Leased<BodyFrame>>,
}

pub trait FrameSensor {
    fn open(&mut self) -> KeyerResult<StreamMetadata>;

    fn close(&mut self);

    fn is_open(&self) -> bool;

    fn metadata(&self) -> StreamMetadata;

    fn mapper(&self) -> &dyn CoordinateMapper;

    /// Never blocks. `Ok(None)` when nothing new is ready; `Err` only when
    /// the stream itself has failed.
    fn acquire_latest(&mut self) -> KeyerResult<Option<MultiSourceFrame>>;
}

/// Bounded pool of in-flight frame handles. A handle goes back to the pool
/// when its [`FrameLease`] drops.
#[derive(Clone, Debug)]
pub struct HandlePool {
    capacity: usize,
    release_tx: Sender<()>,
    available_rx: Receiver<()>,
}

impl HandlePool {
    pub fn new(capacity: usize) -> Self {
        let (release_tx, available_rx) = bounded(capacity);
        for _ in 0..capacity {
            let _ = release_tx.try_send(());
        }
        HandlePool {
            capacity,
            release_tx,
            available_rx,
        }
    }

    pub fn try_lease(&self) -> Option<FrameLease> {
        self.available_rx.try_recv().ok()?;
        Some(FrameLease {
            release_tx: self.release_tx.clone(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.available_rx.len()
    }

    pub fn wrap<T>(&self, frame: T) -> Option<Leased<T>> {
        self.try_lease().map(|lease| Leased {
            frame,
            _lease: lease,
        })
    }
}

#[derive(Debug)]
pub struct FrameLease {
    release_tx: Sender<()>,
}

impl Drop for FrameLease {
    fn drop(&mut self) {
        let _ = self.release_tx.try_send(());
    }
}

/// A sub-frame holding one handle from the sensor's pool.
#[derive(Debug)]
pub struct Leased<T> {
    frame: T,
    _lease: FrameLease,
}

impl<T> Deref for Leased<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.frame
    }
}
