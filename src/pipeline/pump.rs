use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;

use crate::{
    config::KeyerConfig,
    error::KeyerResult,
    types::Body,
};

use super::{
    bundle::FrameBundle,
    compositor::BackgroundRemover,
    overlay::OverlayLayer,
    pixel_buffer::PixelBuffer,
    sensor::{FrameSensor, StreamMetadata},
    skeleton::SkeletonRenderer,
};

/// Signal from the sensor that a synchronized frame is ready.
#[derive(Clone, Copy, Debug)]
pub struct FrameArrived {
    pub timestamp: Instant,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PumpPhase {
    /// No frame has been composited yet.
    Priming,
    Steady,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Composited,
    /// Something was unavailable; nothing changed.
    Skipped,
    /// A non-fatal error stopped the tick; nothing changed.
    Abandoned,
}

/// Read-only view of the two outputs after a tick.
pub struct FrameOutput<'a> {
    pub raster: &'a PixelBuffer,
    pub overlay: &'a OverlayLayer,
}

/// Per-tick hooks for instrumentation and display.
pub trait FrameObserver {
    fn before_frame(&mut self, _phase: PumpPhase) {}

    fn after_frame(&mut self, _phase: PumpPhase, _output: &FrameOutput<'_>) {}
}

pub struct FramePump<S: FrameSensor> {
    sensor: S,
    metadata: StreamMetadata,
    remover: BackgroundRemover,
    renderer: SkeletonRenderer,
    raster: PixelBuffer,
    overlay: OverlayLayer,
    bodies: Vec<Body>,
    phase: PumpPhase,
    observer: Option<Box<dyn FrameObserver>>,
}

impl<S: FrameSensor> FramePump<S> {
    /// Opens `sensor` and sizes every reusable buffer from its metadata.
    pub fn new(mut sensor: S, config: KeyerConfig) -> KeyerResult<Self> {
        let metadata = if sensor.is_open() {
            sensor.metadata()
        } else {
            sensor.open()?
        };
        log::info!(
            "sensor open: color {}x{}, depth {}x{}",
            metadata.color_width,
            metadata.color_height,
            metadata.depth_width,
            metadata.depth_height
        );

        Ok(FramePump {
            metadata,
            remover: BackgroundRemover::new(metadata),
            raster: PixelBuffer::new(metadata.color_width, metadata.color_height),
            overlay: OverlayLayer::new(metadata.color_width, metadata.color_height),
            bodies: vec![Body::default(); config.body_capacity],
            renderer: SkeletonRenderer::new(config),
            sensor,
            phase: PumpPhase::Priming,
            observer: None,
        })
    }

    pub fn metadata(&self) -> StreamMetadata {
        self.metadata
    }

    pub fn phase(&self) -> PumpPhase {
        self.phase
    }

    pub fn raster(&self) -> &PixelBuffer {
        &self.raster
    }

    pub fn overlay(&self) -> &OverlayLayer {
        &self.overlay
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    pub fn set_observer(&mut self, observer: Box<dyn FrameObserver>) {
        self.observer = Some(observer);
    }

    pub fn take_observer(&mut self) -> Option<Box<dyn FrameObserver>> {
        self.observer.take()
    }

    /// Runs one tick. Only fatal sensor errors are returned.
    pub fn tick(&mut self) -> KeyerResult<TickOutcome> {
        let Some(bundle) = FrameBundle::acquire(&mut self.sensor)? else {
            return Ok(TickOutcome::Skipped);
        };

        if let Some(observer) = self.observer.as_mut() {
            observer.before_frame(self.phase);
        }

        let processed = self.process(&bundle);
        drop(bundle);

        if let Err(err) = processed {
            if err.is_fatal() {
                return Err(err);
            }
            log::warn!("abandoning frame: {err}");
            return Ok(TickOutcome::Abandoned);
        }

        if let Some(observer) = self.observer.as_mut() {
            let output = FrameOutput {
                raster: &self.raster,
                overlay: &self.overlay,
            };
            observer.after_frame(self.phase, &output);
        }

        if self.phase == PumpPhase::Priming {
            log::info!("first frame composited");
            self.phase = PumpPhase::Steady;
        }
        Ok(TickOutcome::Composited)
    }

    fn process(&mut self, bundle: &FrameBundle) -> KeyerResult<()> {
        let mapper = self.sensor.mapper();
        self.remover.composite(
            mapper,
            &bundle.color,
            &bundle.depth,
            &bundle.body_index,
            &mut self.raster,
        )?;

        let overflow = bundle.body.refresh_bodies(&mut self.bodies);
        if overflow > 0 {
            log::debug!(
                "{overflow} bodies past the {} slot capacity ignored",
                self.bodies.len()
            );
        }
        self.renderer.render(&self.bodies, mapper, &mut self.overlay);
        Ok(())
    }

    /// Ticks once per event until the channel disconnects. Pending events are
    /// collapsed so only the newest frame is processed.
    pub fn run(&mut self, events: &Receiver<FrameArrived>) -> KeyerResult<()> {
        while let Some(event) = recv_latest_event(events) {
            log::trace!("frame event, {:?} old", event.timestamp.elapsed());
            if let Err(err) = self.tick() {
                log::error!("sensor failure, stopping pump: {err}");
                return Err(err);
            }
        }
        log::info!("frame events closed, pump stopped");
        Ok(())
    }

    pub fn close(mut self) {
        self.sensor.close();
    }
}

impl<S: FrameSensor> Drop for FramePump<S> {
    fn drop(&mut self) {
        if self.sensor.is_open() {
            self.sensor.close();
        }
    }
}

fn recv_latest_event(events: &Receiver<FrameArrived>) -> Option<FrameArrived> {
    let mut event = events.recv().ok()?;
    while let Ok(newer) = events.try_recv() {
        event = newer;
    }
    Some(event)
}

/// Logs composited frames per second.
pub struct FpsCounter {
    window_start: Instant,
    frames: u32,
    last_fps: Option<f32>,
}

impl FpsCounter {
    pub fn new() -> Self {
        FpsCounter {
            window_start: Instant::now(),
            frames: 0,
            last_fps: None,
        }
    }

    pub fn last_fps(&self) -> Option<f32> {
        self.last_fps
    }

    fn record(&mut self, now: Instant) {
        self.frames += 1;
        let elapsed = now.duration_since(self.window_start);
        if elapsed >= Duration::from_secs(1) {
            let fps = self.frames as f32 / elapsed.as_secs_f32();
            log::info!("FPS: {fps:.1}");
            self.last_fps = Some(fps);
            self.frames = 0;
            self.window_start = now;
        }
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameObserver for FpsCounter {
    fn before_frame(&mut self, phase: PumpPhase) {
        // Time spent opening the stream shouldn't count against the first window.
        if phase == PumpPhase::Priming {
            self.window_start = Instant::now();
            self.frames = 0;
        }
    }

    fn after_frame(&mut self, _phase: PumpPhase, _output: &FrameOutput<'_>) {
        self.record(Instant::now());
    }
}
