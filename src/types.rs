use std::sync::Arc;

/// Body-index value for depth pixels not occupied by any tracked body.
pub const NO_BODY: u8 = 0xFF;

pub const JOINT_COUNT: usize = 25;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CameraSpacePoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl CameraSpacePoint {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ColorSpacePoint {
    pub x: f32,
    pub y: f32,
}

impl ColorSpacePoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DepthSpacePoint {
    pub x: f32,
    pub y: f32,
}

impl DepthSpacePoint {
    /// Marks a colour pixel with no depth correspondence.
    pub const UNMAPPED: DepthSpacePoint = DepthSpacePoint {
        x: f32::NEG_INFINITY,
        y: f32::NEG_INFINITY,
    };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Nearest depth pixel, or `None` for the sentinel or anything outside
    /// `width` x `height`.
    #[inline]
    pub fn to_pixel(&self, width: u32, height: u32) -> Option<(u32, u32)> {
        if !self.x.is_finite() || !self.y.is_finite() {
            return None;
        }
        let dx = (self.x + 0.5).floor();
        let dy = (self.y + 0.5).floor();
        if dx < 0.0 || dy < 0.0 || dx >= width as f32 || dy >= height as f32 {
            return None;
        }
        Some((dx as u32, dy as u32))
    }
}

/// Straight (non-premultiplied) RGBA colour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba([0, 0, 0, 0]);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    pub fn alpha(&self) -> u8 {
        self.0[3]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorFormat {
    Rgba,
    Bgra,
    Yuyv,
}

impl ColorFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            ColorFormat::Rgba | ColorFormat::Bgra => 4,
            ColorFormat::Yuyv => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ColorFormat::Rgba => "RGBA",
            ColorFormat::Bgra => "BGRA",
            ColorFormat::Yuyv => "YUYV",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ColorFrame {
    pub width: u32,
    pub height: u32,
    pub format: ColorFormat,
    pub data: Arc<[u8]>,
}

/// Depth in millimetres, row-major, 0 where the sensor has no reading.
#[derive(Clone, Debug)]
pub struct DepthFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u16]>,
}

#[derive(Clone, Debug)]
pub struct BodyIndexFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
}

impl BodyIndexFrame {
    #[inline]
    pub fn at(&self, x: u32, y: u32) -> u8 {
        let idx = y as usize * self.width as usize + x as usize;
        self.data.get(idx).copied().unwrap_or(NO_BODY)
    }
}

#[derive(Clone, Debug)]
pub struct BodyFrame {
    pub bodies: Vec<Body>,
}

impl BodyFrame {
    /// Copies this frame's bodies into `bodies` slot by slot, keeping the
    /// caller's allocation. Slots the frame does not fill are reset to an
    /// untracked body. Bodies beyond `bodies.len()` are dropped; the return
    /// value counts them.
    pub fn refresh_bodies(&self, bodies: &mut [Body]) -> usize {
        let mut incoming = self.bodies.iter();
        for dst in bodies.iter_mut() {
            match incoming.next() {
                Some(src) => dst.clone_from(src),
                None => *dst = Body::default(),
            }
        }
        incoming.len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JointType {
    SpineBase,
    SpineMid,
    Neck,
    Head,
    ShoulderLeft,
    ElbowLeft,
    WristLeft,
    HandLeft,
    ShoulderRight,
    ElbowRight,
    WristRight,
    HandRight,
    HipLeft,
    KneeLeft,
    AnkleLeft,
    FootLeft,
    HipRight,
    KneeRight,
    AnkleRight,
    FootRight,
    SpineShoulder,
    HandTipLeft,
    ThumbLeft,
    HandTipRight,
    ThumbRight,
}

impl JointType {
    pub const ALL: [JointType; JOINT_COUNT] = [
        JointType::SpineBase,
        JointType::SpineMid,
        JointType::Neck,
        JointType::Head,
        JointType::ShoulderLeft,
        JointType::ElbowLeft,
        JointType::WristLeft,
        JointType::HandLeft,
        JointType::ShoulderRight,
        JointType::ElbowRight,
        JointType::WristRight,
        JointType::HandRight,
        JointType::HipLeft,
        JointType::KneeLeft,
        JointType::AnkleLeft,
        JointType::FootLeft,
        JointType::HipRight,
        JointType::KneeRight,
        JointType::AnkleRight,
        JointType::FootRight,
        JointType::SpineShoulder,
        JointType::HandTipLeft,
        JointType::ThumbLeft,
        JointType::HandTipRight,
        JointType::ThumbRight,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrackingState {
    #[default]
    NotTracked,
    Inferred,
    Tracked,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Joint {
    pub position: CameraSpacePoint,
    pub tracking_state: TrackingState,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HandState {
    #[default]
    Unknown,
    NotTracked,
    Open,
    Closed,
    Lasso,
}

impl HandState {
    pub fn label(&self) -> &'static str {
        match self {
            HandState::Unknown => "unknown",
            HandState::NotTracked => "not tracked",
            HandState::Open => "open",
            HandState::Closed => "closed",
            HandState::Lasso => "lasso",
        }
    }
}

/// Frame edges a body extends past.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClippedEdges(u8);

impl ClippedEdges {
    pub const NONE: ClippedEdges = ClippedEdges(0);
    pub const RIGHT: ClippedEdges = ClippedEdges(1);
    pub const LEFT: ClippedEdges = ClippedEdges(1 << 1);
    pub const TOP: ClippedEdges = ClippedEdges(1 << 2);
    pub const BOTTOM: ClippedEdges = ClippedEdges(1 << 3);

    pub fn contains(self, other: ClippedEdges) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for ClippedEdges {
    type Output = ClippedEdges;

    fn bitor(self, rhs: ClippedEdges) -> ClippedEdges {
        ClippedEdges(self.0 | rhs.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Body {
    pub tracking_id: u64,
    pub is_tracked: bool,
    pub joints: [Joint; JOINT_COUNT],
    pub clipped_edges: ClippedEdges,
    pub hand_left_state: HandState,
    pub hand_right_state: HandState,
}

impl Body {
    pub fn joint(&self, joint: JointType) -> &Joint {
        &self.joints[joint.index()]
    }

    pub fn set_joint(&mut self, joint: JointType, position: CameraSpacePoint, state: TrackingState) {
        self.joints[joint.index()] = Joint {
            position,
            tracking_state: state,
        };
    }
}
