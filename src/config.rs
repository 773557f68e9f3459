use crate::types::Rgba;

pub const JOINT_Z_EPSILON: f32 = 0.1;
pub const HAND_MARKER_RADIUS: f32 = 30.0;
pub const CLIP_BAR_THICKNESS: f32 = 10.0;
pub const BONE_THICKNESS: f32 = 6.0;
pub const JOINT_RADIUS: f32 = 3.0;
pub const BODY_CAPACITY: usize = 6;

/// Tunables shared by the compositor, the overlay renderer and the pump.
#[derive(Clone, Debug)]
pub struct KeyerConfig {
    /// Joints with negative camera-space Z are pushed to this depth before
    /// projection.
    pub joint_z_epsilon: f32,
    pub hand_marker_radius: f32,
    pub clip_bar_thickness: f32,
    pub hand_closed_color: Rgba,
    pub hand_open_color: Rgba,
    pub hand_lasso_color: Rgba,
    pub clip_edge_color: Rgba,
    /// Canvas fill under the overlay primitives. Defaults to alpha 0 so the
    /// composited raster shows through unchanged; give it a low alpha for a
    /// tinted canvas.
    pub overlay_background: Rgba,
    pub draw_bones: bool,
    pub bone_thickness: f32,
    pub joint_radius: f32,
    pub tracked_bone_color: Rgba,
    pub inferred_bone_color: Rgba,
    pub tracked_joint_color: Rgba,
    pub inferred_joint_color: Rgba,
    pub body_capacity: usize,
}

impl Default for KeyerConfig {
    fn default() -> Self {
        KeyerConfig {
            joint_z_epsilon: JOINT_Z_EPSILON,
            hand_marker_radius: HAND_MARKER_RADIUS,
            clip_bar_thickness: CLIP_BAR_THICKNESS,
            hand_closed_color: Rgba::new(255, 0, 0, 128),
            hand_open_color: Rgba::new(0, 255, 0, 128),
            hand_lasso_color: Rgba::new(0, 0, 255, 128),
            clip_edge_color: Rgba::new(255, 0, 0, 255),
            overlay_background: Rgba::TRANSPARENT,
            draw_bones: false,
            bone_thickness: BONE_THICKNESS,
            joint_radius: JOINT_RADIUS,
            tracked_bone_color: Rgba::new(56, 189, 248, 255),
            inferred_bone_color: Rgba::new(148, 163, 184, 255),
            tracked_joint_color: Rgba::new(248, 113, 113, 255),
            inferred_joint_color: Rgba::new(250, 204, 21, 255),
            body_capacity: BODY_CAPACITY,
        }
    }
}
