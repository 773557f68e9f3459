use image::RgbaImage;

use crate::types::Rgba;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        (x1 > x0 && y1 > y0).then(|| Rect::new(x0, y0, x1 - x0, y1 - y0))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    FillRect {
        rect: Rect,
        color: Rgba,
    },
    FillCircle {
        center: (f32, f32),
        radius: f32,
        color: Rgba,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        thickness: f32,
        color: Rgba,
    },
}

/// Vector annotations drawn above the keyed raster. Rebuilt from scratch
/// every frame and clipped to the output resolution.
#[derive(Clone, Debug)]
pub struct OverlayLayer {
    width: u32,
    height: u32,
    background: Rgba,
    primitives: Vec<Primitive>,
    generation: u64,
}

impl OverlayLayer {
    pub fn new(width: u32, height: u32) -> Self {
        OverlayLayer {
            width,
            height,
            background: Rgba::TRANSPARENT,
            primitives: Vec::new(),
            generation: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clip(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f32, self.height as f32)
    }

    pub fn background(&self) -> Rgba {
        self.background
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Number of completed rebuilds.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Drops every primitive and starts a new frame on `background`.
    pub fn begin(&mut self, background: Rgba) -> OverlayBuilder<'_> {
        self.primitives.clear();
        self.background = background;
        OverlayBuilder { layer: self }
    }

    pub fn circles(&self) -> impl Iterator<Item = (&(f32, f32), f32, Rgba)> {
        self.primitives.iter().filter_map(|p| match p {
            Primitive::FillCircle {
                center,
                radius,
                color,
            } => Some((center, *radius, *color)),
            _ => None,
        })
    }

    pub fn rects(&self) -> impl Iterator<Item = (&Rect, Rgba)> {
        self.primitives.iter().filter_map(|p| match p {
            Primitive::FillRect { rect, color } => Some((rect, *color)),
            _ => None,
        })
    }

    /// Alpha-blends the background and every primitive onto `target`.
    pub fn rasterize_over(&self, target: &mut RgbaImage) {
        let width = target.width().min(self.width);
        let height = target.height().min(self.height);
        if self.background.alpha() > 0 {
            fill_rect(target, width, height, &self.clip(), self.background);
        }
        for primitive in &self.primitives {
            match primitive {
                Primitive::FillRect { rect, color } => {
                    fill_rect(target, width, height, rect, *color)
                }
                Primitive::FillCircle {
                    center,
                    radius,
                    color,
                } => fill_circle(target, width, height, *center, *radius, *color),
                Primitive::Line {
                    from,
                    to,
                    thickness,
                    color,
                } => draw_line(target, width, height, *from, *to, *thickness, *color),
            }
        }
    }
}

pub struct OverlayBuilder<'a> {
    layer: &'a mut OverlayLayer,
}

impl OverlayBuilder<'_> {
    pub fn clip(&self) -> Rect {
        self.layer.clip()
    }

    /// Rectangles are trimmed to the layer; ones entirely outside it are
    /// dropped.
    pub fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        if let Some(rect) = rect.intersect(&self.layer.clip()) {
            self.layer.primitives.push(Primitive::FillRect { rect, color });
        }
    }

    pub fn fill_circle(&mut self, center: (f32, f32), radius: f32, color: Rgba) {
        if !center.0.is_finite() || !center.1.is_finite() || radius <= 0.0 {
            return;
        }
        self.layer.primitives.push(Primitive::FillCircle {
            center,
            radius,
            color,
        });
    }

    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), thickness: f32, color: Rgba) {
        let finite = [from.0, from.1, to.0, to.1].iter().all(|v| v.is_finite());
        if !finite {
            return;
        }
        self.layer.primitives.push(Primitive::Line {
            from,
            to,
            thickness,
            color,
        });
    }

    pub fn finish(self) {
        self.layer.generation += 1;
    }
}

fn fill_rect(target: &mut RgbaImage, width: u32, height: u32, rect: &Rect, color: Rgba) {
    let x0 = rect.x.max(0.0).round() as i32;
    let y0 = rect.y.max(0.0).round() as i32;
    let x1 = rect.right().round() as i32;
    let y1 = rect.bottom().round() as i32;
    for y in y0..y1 {
        for x in x0..x1 {
            blend_pixel(target, width, height, x, y, color);
        }
    }
}

fn fill_circle(
    target: &mut RgbaImage,
    width: u32,
    height: u32,
    center: (f32, f32),
    radius: f32,
    color: Rgba,
) {
    let (cx, cy) = (center.0.round() as i32, center.1.round() as i32);
    let r = radius.round() as i32;
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r * r {
                blend_pixel(target, width, height, cx + dx, cy + dy, color);
            }
        }
    }
}

fn draw_line(
    target: &mut RgbaImage,
    width: u32,
    height: u32,
    p0: (f32, f32),
    p1: (f32, f32),
    thickness: f32,
    color: Rgba,
) {
    let (mut x0, mut y0) = (p0.0 as i32, p0.1 as i32);
    let (x1, y1) = (p1.0 as i32, p1.1 as i32);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let radius = ((thickness.round() as i32).max(1) - 1) / 2;

    loop {
        for ox in -radius..=radius {
            for oy in -radius..=radius {
                if ox.abs() + oy.abs() <= radius {
                    blend_pixel(target, width, height, x0 + ox, y0 + oy, color);
                }
            }
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn blend_pixel(target: &mut RgbaImage, width: u32, height: u32, x: i32, y: i32, color: Rgba) {
    if x < 0 || y < 0 {
        return;
    }
    let (ux, uy) = (x as u32, y as u32);
    if ux >= width || uy >= height {
        return;
    }
    let dst = target.get_pixel_mut(ux, uy);
    dst.0 = blend(dst.0, color.0);
}

/// Straight-alpha source-over.
fn blend(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let sa = u32::from(src[3]);
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }
    let da = u32::from(dst[3]);
    let inv = 255 - sa;
    let out_a = sa + (da * inv + 127) / 255;
    if out_a == 0 {
        return [0, 0, 0, 0];
    }
    let mut out = [0u8; 4];
    for i in 0..3 {
        let c = u32::from(src[i]) * sa * 255 + u32::from(dst[i]) * da * inv;
        out[i] = ((c / 255 + out_a / 2) / out_a).min(255) as u8;
    }
    out[3] = out_a.min(255) as u8;
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_discards_previous_primitives() {
        let mut layer = OverlayLayer::new(10, 10);
        let mut frame = layer.begin(Rgba::TRANSPARENT);
        frame.fill_circle((1.0, 1.0), 2.0, Rgba::new(255, 0, 0, 255));
        frame.finish();
        assert_eq!(layer.primitives().len(), 1);

        layer.begin(Rgba::TRANSPARENT).finish();
        assert!(layer.primitives().is_empty());
        assert_eq!(layer.generation(), 2);
    }

    #[test]
    fn rects_are_clipped_to_layer() {
        let mut layer = OverlayLayer::new(10, 10);
        let mut frame = layer.begin(Rgba::TRANSPARENT);
        frame.fill_rect(Rect::new(-5.0, 8.0, 20.0, 5.0), Rgba::new(0, 0, 0, 255));
        frame.fill_rect(Rect::new(20.0, 20.0, 5.0, 5.0), Rgba::new(0, 0, 0, 255));
        frame.finish();

        let rects: Vec<_> = layer.rects().map(|(r, _)| *r).collect();
        assert_eq!(rects, vec![Rect::new(0.0, 8.0, 10.0, 2.0)]);
    }

    #[test]
    fn non_finite_circles_are_dropped() {
        let mut layer = OverlayLayer::new(10, 10);
        let mut frame = layer.begin(Rgba::TRANSPARENT);
        frame.fill_circle((f32::NEG_INFINITY, 1.0), 2.0, Rgba::new(0, 0, 0, 255));
        frame.finish();
        assert_eq!(layer.circles().count(), 0);
    }

    #[test]
    fn rasterize_blends_and_clips() {
        let mut layer = OverlayLayer::new(4, 4);
        let mut frame = layer.begin(Rgba::TRANSPARENT);
        frame.fill_circle((0.0, 0.0), 1.0, Rgba::new(255, 0, 0, 255));
        frame.fill_rect(Rect::new(3.0, 3.0, 1.0, 1.0), Rgba::new(0, 255, 0, 128));
        frame.finish();

        let mut image = RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 255, 255]));
        layer.rasterize_over(&mut image);

        assert_eq!(image.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(1, 0).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(2, 2).0, [0, 0, 255, 255]);
        let mixed = image.get_pixel(3, 3).0;
        assert_eq!(mixed[3], 255);
        assert!(mixed[1] > 100 && mixed[2] > 100);
    }

    #[test]
    fn blend_over_transparent_keeps_source_colour() {
        assert_eq!(blend([0, 0, 0, 0], [200, 100, 50, 128]), [200, 100, 50, 128]);
    }
}
