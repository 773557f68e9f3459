use crate::{
    config::KeyerConfig,
    types::{
        Body, CameraSpacePoint, ClippedEdges, ColorSpacePoint, HandState, JOINT_COUNT, JointType,
        TrackingState,
    },
};

use super::{
    overlay::{OverlayBuilder, OverlayLayer, Rect},
    sensor::CoordinateMapper,
};

use JointType::*;

pub const BONES: &[(JointType, JointType)] = &[
    // Torso
    (Head, Neck),
    (Neck, SpineShoulder),
    (SpineShoulder, SpineMid),
    (SpineMid, SpineBase),
    (SpineShoulder, ShoulderRight),
    (SpineShoulder, ShoulderLeft),
    (SpineBase, HipRight),
    (SpineBase, HipLeft),
    // Right arm
    (ShoulderRight, ElbowRight),
    (ElbowRight, WristRight),
    (WristRight, HandRight),
    (HandRight, HandTipRight),
    (WristRight, ThumbRight),
    // Left arm
    (ShoulderLeft, ElbowLeft),
    (ElbowLeft, WristLeft),
    (WristLeft, HandLeft),
    (HandLeft, HandTipLeft),
    (WristLeft, ThumbLeft),
    // Right leg
    (HipRight, KneeRight),
    (KneeRight, AnkleRight),
    (AnkleRight, FootRight),
    // Left leg
    (HipLeft, KneeLeft),
    (KneeLeft, AnkleLeft),
    (AnkleLeft, FootLeft),
];

/// Pushes joints behind the sensor plane to `epsilon` so projection stays
/// finite.
pub fn clamp_joint_depth(mut point: CameraSpacePoint, epsilon: f32) -> CameraSpacePoint {
    if point.z < 0.0 {
        point.z = epsilon;
    }
    point
}

#[derive(Clone, Debug)]
pub struct SkeletonRenderer {
    config: KeyerConfig,
}

impl SkeletonRenderer {
    pub fn new(config: KeyerConfig) -> Self {
        SkeletonRenderer { config }
    }

    pub fn project_joint(
        &self,
        mapper: &dyn CoordinateMapper,
        point: CameraSpacePoint,
    ) -> ColorSpacePoint {
        mapper.camera_to_color(clamp_joint_depth(point, self.config.joint_z_epsilon))
    }

    /// Rebuilds `layer` from the tracked bodies in `bodies`.
    pub fn render(&self, bodies: &[Body], mapper: &dyn CoordinateMapper, layer: &mut OverlayLayer) {
        let mut frame = layer.begin(self.config.overlay_background);

        for body in bodies.iter().filter(|body| body.is_tracked) {
            self.draw_clipped_edges(body.clipped_edges, &mut frame);

            let mut points = [ColorSpacePoint::default(); JOINT_COUNT];
            for (point, joint) in points.iter_mut().zip(body.joints.iter()) {
                *point = self.project_joint(mapper, joint.position);
            }

            if self.config.draw_bones {
                self.draw_body(body, &points, &mut frame);
            }

            self.draw_hand(body.hand_left_state, points[HandLeft.index()], &mut frame);
            self.draw_hand(body.hand_right_state, points[HandRight.index()], &mut frame);
        }

        frame.finish();
    }

    fn draw_hand(&self, state: HandState, at: ColorSpacePoint, frame: &mut OverlayBuilder<'_>) {
        let color = match state {
            HandState::Closed => self.config.hand_closed_color,
            HandState::Open => self.config.hand_open_color,
            HandState::Lasso => self.config.hand_lasso_color,
            HandState::Unknown | HandState::NotTracked => return,
        };
        frame.fill_circle((at.x, at.y), self.config.hand_marker_radius, color);
    }

    fn draw_clipped_edges(&self, edges: ClippedEdges, frame: &mut OverlayBuilder<'_>) {
        if edges.is_empty() {
            return;
        }
        let bounds = frame.clip();
        let thickness = self.config.clip_bar_thickness;
        let color = self.config.clip_edge_color;

        if edges.contains(ClippedEdges::BOTTOM) {
            frame.fill_rect(
                Rect::new(0.0, bounds.height - thickness, bounds.width, thickness),
                color,
            );
        }
        if edges.contains(ClippedEdges::TOP) {
            frame.fill_rect(Rect::new(0.0, 0.0, bounds.width, thickness), color);
        }
        if edges.contains(ClippedEdges::LEFT) {
            frame.fill_rect(Rect::new(0.0, 0.0, thickness, bounds.height), color);
        }
        if edges.contains(ClippedEdges::RIGHT) {
            frame.fill_rect(
                Rect::new(bounds.width - thickness, 0.0, thickness, bounds.height),
                color,
            );
        }
    }

    fn draw_body(&self, body: &Body, points: &[ColorSpacePoint], frame: &mut OverlayBuilder<'_>) {
        for &(a, b) in BONES {
            let (ja, jb) = (body.joint(a), body.joint(b));
            if ja.tracking_state == TrackingState::NotTracked
                || jb.tracking_state == TrackingState::NotTracked
            {
                continue;
            }
            // Two inferred ends means we are only guessing at the bone.
            if ja.tracking_state == TrackingState::Inferred
                && jb.tracking_state == TrackingState::Inferred
            {
                continue;
            }

            let both_tracked = ja.tracking_state == TrackingState::Tracked
                && jb.tracking_state == TrackingState::Tracked;
            let (thickness, color) = if both_tracked {
                (self.config.bone_thickness, self.config.tracked_bone_color)
            } else {
                (1.0, self.config.inferred_bone_color)
            };

            let (pa, pb) = (points[a.index()], points[b.index()]);
            frame.line((pa.x, pa.y), (pb.x, pb.y), thickness, color);
        }

        for (joint, point) in body.joints.iter().zip(points.iter()) {
            let color = match joint.tracking_state {
                TrackingState::Tracked => self.config.tracked_joint_color,
                TrackingState::Inferred => self.config.inferred_joint_color,
                TrackingState::NotTracked => continue,
            };
            frame.fill_circle((point.x, point.y), self.config.joint_radius, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::KeyerResult,
        pipeline::overlay::Primitive,
        types::{DepthFrame, DepthSpacePoint, Rgba},
    };

    /// Camera X/Y are already colour pixels; refuses non-positive Z like a
    /// real projection would.
    struct PassThrough;

    impl CoordinateMapper for PassThrough {
        fn camera_to_color(&self, point: CameraSpacePoint) -> ColorSpacePoint {
            if point.z <= 0.0 {
                return ColorSpacePoint::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
            }
            ColorSpacePoint::new(point.x, point.y)
        }

        fn camera_to_depth(&self, point: CameraSpacePoint) -> DepthSpacePoint {
            DepthSpacePoint::new(point.x, point.y)
        }

        fn map_color_frame_to_depth_space(
            &self,
            _depth: &DepthFrame,
            out: &mut [DepthSpacePoint],
        ) -> KeyerResult<()> {
            out.fill(DepthSpacePoint::UNMAPPED);
            Ok(())
        }
    }

    fn body_with_hands(left: HandState, right: HandState) -> Body {
        let mut body = Body {
            tracking_id: 1,
            is_tracked: true,
            hand_left_state: left,
            hand_right_state: right,
            ..Body::default()
        };
        body.set_joint(HandLeft, CameraSpacePoint::new(100.0, 200.0, 1.5), TrackingState::Tracked);
        body.set_joint(HandRight, CameraSpacePoint::new(300.0, 200.0, 1.5), TrackingState::Tracked);
        body
    }

    fn render(bodies: &[Body], config: KeyerConfig) -> OverlayLayer {
        let mut layer = OverlayLayer::new(640, 480);
        SkeletonRenderer::new(config).render(bodies, &PassThrough, &mut layer);
        layer
    }

    #[test]
    fn negative_depth_clamps_to_epsilon() {
        let clamped = clamp_joint_depth(CameraSpacePoint::new(0.2, 0.1, -0.5), 0.1);
        assert_eq!(clamped.z, 0.1);
        let untouched = clamp_joint_depth(CameraSpacePoint::new(0.2, 0.1, 2.0), 0.1);
        assert_eq!(untouched.z, 2.0);

        let renderer = SkeletonRenderer::new(KeyerConfig::default());
        let projected = renderer.project_joint(&PassThrough, CameraSpacePoint::new(5.0, 6.0, -3.0));
        assert!(projected.is_finite());
    }

    #[test]
    fn hand_states_pick_marker_colours() {
        let config = KeyerConfig::default();
        let cases = [
            (HandState::Closed, Some(config.hand_closed_color)),
            (HandState::Open, Some(config.hand_open_color)),
            (HandState::Lasso, Some(config.hand_lasso_color)),
            (HandState::Unknown, None),
            (HandState::NotTracked, None),
        ];

        for (state, expected) in cases {
            let layer = render(&[body_with_hands(state, HandState::Unknown)], config.clone());
            let circles: Vec<_> = layer.circles().collect();
            match expected {
                Some(color) => {
                    assert_eq!(circles.len(), 1, "{}", state.label());
                    assert_eq!(*circles[0].0, (100.0, 200.0));
                    assert_eq!(circles[0].1, config.hand_marker_radius);
                    assert_eq!(circles[0].2, color);
                }
                None => assert!(circles.is_empty(), "{}", state.label()),
            }
        }
    }

    #[test]
    fn clipped_top_and_left_produce_two_full_bars() {
        let mut body = body_with_hands(HandState::Unknown, HandState::Unknown);
        body.clipped_edges = ClippedEdges::TOP | ClippedEdges::LEFT;
        let config = KeyerConfig::default();
        let layer = render(&[body], config.clone());

        let rects: Vec<_> = layer.rects().map(|(r, _)| *r).collect();
        let t = config.clip_bar_thickness;
        assert_eq!(
            rects,
            vec![
                Rect::new(0.0, 0.0, 640.0, t),
                Rect::new(0.0, 0.0, t, 480.0),
            ]
        );
        assert!(layer.rects().all(|(_, c)| c == config.clip_edge_color));
    }

    #[test]
    fn bottom_and_right_bars_hug_far_edges() {
        let mut body = body_with_hands(HandState::Unknown, HandState::Unknown);
        body.clipped_edges = ClippedEdges::BOTTOM | ClippedEdges::RIGHT;
        let layer = render(&[body], KeyerConfig::default());

        let rects: Vec<_> = layer.rects().map(|(r, _)| *r).collect();
        assert_eq!(
            rects,
            vec![
                Rect::new(0.0, 470.0, 640.0, 10.0),
                Rect::new(630.0, 0.0, 10.0, 480.0),
            ]
        );
    }

    #[test]
    fn untracked_bodies_draw_nothing() {
        let mut body = body_with_hands(HandState::Closed, HandState::Open);
        body.is_tracked = false;
        body.clipped_edges = ClippedEdges::TOP;
        let layer = render(&[body], KeyerConfig::default());
        assert!(layer.primitives().is_empty());
    }

    #[test]
    fn rendering_replaces_previous_overlay() {
        let mut layer = OverlayLayer::new(640, 480);
        let renderer = SkeletonRenderer::new(KeyerConfig::default());
        let busy = body_with_hands(HandState::Closed, HandState::Open);
        renderer.render(&[busy], &PassThrough, &mut layer);
        assert_eq!(layer.circles().count(), 2);

        renderer.render(&[Body::default()], &PassThrough, &mut layer);
        assert!(layer.primitives().is_empty());
    }

    #[test]
    fn bones_are_optional() {
        let mut body = body_with_hands(HandState::Unknown, HandState::Unknown);
        body.set_joint(WristLeft, CameraSpacePoint::new(90.0, 180.0, 1.5), TrackingState::Tracked);
        body.set_joint(HandTipLeft, CameraSpacePoint::new(95.0, 230.0, 1.5), TrackingState::Inferred);

        let plain = render(&[body.clone()], KeyerConfig::default());
        assert!(plain.primitives().is_empty());

        let config = KeyerConfig {
            draw_bones: true,
            ..KeyerConfig::default()
        };
        let layer = render(&[body], config.clone());
        let lines: Vec<_> = layer
            .primitives()
            .iter()
            .filter_map(|p| match p {
                Primitive::Line { thickness, color, .. } => Some((*thickness, *color)),
                _ => None,
            })
            .collect();
        // WristLeft-HandLeft is tracked, HandLeft-HandTipLeft is inferred.
        assert_eq!(
            lines,
            vec![
                (config.bone_thickness, config.tracked_bone_color),
                (1.0, config.inferred_bone_color),
            ]
        );
        // Four joints with a tracking state get a dot.
        assert_eq!(layer.circles().count(), 4);
        assert!(layer.circles().any(|(_, _, c)| c == config.inferred_joint_color));
        assert!(layer.circles().all(|(_, _, c)| c != Rgba::TRANSPARENT));
    }
}
