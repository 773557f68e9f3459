pub mod bundle;
pub mod compositor;
pub mod mapper;
pub mod overlay;
pub mod pixel_buffer;
pub mod pump;
pub mod rgba_converter;
pub mod sensor;
pub mod skeleton;
pub mod synthetic;

// Re-exports for convenience
pub use bundle::FrameBundle;
pub use compositor::BackgroundRemover;
pub use mapper::{Intrinsics, PinholeMapper};
pub use overlay::{OverlayLayer, Primitive, Rect};
pub use pixel_buffer::{DirtyRect, PixelBuffer, WriteScope};
pub use pump::{
    FpsCounter, FrameArrived, FrameObserver, FrameOutput, FramePump, PumpPhase, TickOutcome,
};
pub use sensor::{
    CoordinateMapper, FrameLease, FrameSensor, HandlePool, Leased, MultiSourceFrame,
    StreamMetadata,
};
pub use skeleton::SkeletonRenderer;
pub use synthetic::{StreamKind, SyntheticRig, TickSource, start_tick_source};
