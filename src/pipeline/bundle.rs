use crate::{
    error::KeyerResult,
    types::{BodyFrame, BodyIndexFrame, ColorFrame, DepthFrame},
};

use super::sensor::{FrameSensor, Leased, MultiSourceFrame};

/// All four sub-frames of one tick. Dropping the bundle hands every frame
/// handle back to the sensor.
#[derive(Debug)]
pub struct FrameBundle {
    pub color: Leased<ColorFrame>,
    pub depth: Leased<DepthFrame>,
    pub body_index: Leased<BodyIndexFrame>,
    pub body: Leased<BodyFrame>,
}

impl FrameBundle {
    /// Returns `Ok(None)` unless every sub-frame is available. Whatever was
    /// acquired is released before returning.
    pub fn acquire<S: FrameSensor + ?Sized>(sensor: &mut S) -> KeyerResult<Option<FrameBundle>> {
        let Some(frame) = sensor.acquire_latest()? else {
            log::trace!("no multi-source frame ready");
            return Ok(None);
        };
        Ok(Self::from_multi(frame))
    }

    pub fn from_multi(frame: MultiSourceFrame) -> Option<FrameBundle> {
        let missing = missing_streams(&frame);
        if !missing.is_empty() {
            log::debug!("skipping tick, unavailable: {}", missing.join(", "));
            return None;
        }

        let MultiSourceFrame {
            color: Some(color),
            depth: Some(depth),
            body_index: Some(body_index),
            body: Some(body),
        } = frame
        else {
            return None;
        };

        Some(FrameBundle {
            color,
            depth,
            body_index,
            body,
        })
    }
}

fn missing_streams(frame: &MultiSourceFrame) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if frame.color.is_none() {
        missing.push("color");
    }
    if frame.depth.is_none() {
        missing.push("depth");
    }
    if frame.body_index.is_none() {
        missing.push("body index");
    }
    if frame.body.is_none() {
        missing.push("body");
    }
    missing
}
