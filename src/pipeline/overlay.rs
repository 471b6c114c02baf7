use crate::{
    game::Target,
    types::{Frame, HandSide, PixelPoint, SegmentationMask},
};

/// BlazePose body connections (face, torso, arms with hands, legs with feet).
pub const POSE_CONNECTIONS: &[(usize, usize)] = &[
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 7),
    (0, 4),
    (4, 5),
    (5, 6),
    (6, 8),
    (9, 10),
    (11, 12),
    (11, 13),
    (13, 15),
    (15, 17),
    (15, 19),
    (15, 21),
    (17, 19),
    (12, 14),
    (14, 16),
    (16, 18),
    (16, 20),
    (16, 22),
    (18, 20),
    (11, 23),
    (12, 24),
    (23, 24),
    (23, 25),
    (24, 26),
    (25, 27),
    (26, 28),
    (27, 29),
    (28, 30),
    (29, 31),
    (30, 32),
    (27, 31),
    (28, 32),
];

pub const SKELETON_LINE_THICKNESS: i32 = 3;
const SKELETON_POINT_RADIUS: i32 = 4;
const OUTLINE_THICKNESS: i32 = 2;
const WHITE: [u8; 4] = [255, 255, 255, 255];
const BURST_RINGS: i32 = 3;

/// Something to draw on top of the camera image, in draw order.
#[derive(Clone, Debug, PartialEq)]
pub enum Annotation {
    Pose { points: Vec<(f32, f32)> },
    HandMarker { side: HandSide, at: PixelPoint, radius: i32 },
    /// Expanding rings signalling a touch.
    Burst { center: PixelPoint, radius: i32 },
    Target(Target),
}

pub fn hand_color(side: HandSide) -> [u8; 4] {
    match side {
        HandSide::Right => [0, 0, 255, 255],
        HandSide::Left => [255, 0, 0, 255],
    }
}

pub fn render_annotations(frame: &mut Frame, annotations: &[Annotation]) {
    let mut canvas = Canvas::new(&mut frame.rgba, frame.width, frame.height);
    for annotation in annotations {
        match annotation {
            Annotation::Pose { points } => canvas.draw_pose(points),
            Annotation::HandMarker { side, at, radius } => {
                canvas.fill_circle(*at, *radius, hand_color(*side));
                canvas.stroke_circle(*at, *radius, OUTLINE_THICKNESS, WHITE);
            }
            Annotation::Burst { center, radius } => {
                for ring in 0..BURST_RINGS {
                    let fade = (ring * 50) as u8;
                    let color = [255 - fade, 255 - fade, 0, 255];
                    canvas.stroke_circle(*center, radius + 10 + ring * 15, OUTLINE_THICKNESS, color);
                }
            }
            Annotation::Target(target) => {
                let [r, g, b] = target.color;
                canvas.fill_circle(target.center, target.radius, [r, g, b, 255]);
                canvas.stroke_circle(target.center, target.radius, OUTLINE_THICKNESS, WHITE);
            }
        }
    }
}

/// Darkens everything the mask marks as background.
pub fn dim_background(frame: &mut Frame, mask: &SegmentationMask, strength: f32) {
    let strength = strength.clamp(0.0, 1.0);
    let width = frame.width;
    for (idx, px) in frame.rgba.chunks_exact_mut(4).enumerate() {
        let x = idx as u32 % width.max(1);
        let y = idx as u32 / width.max(1);
        let background = 1.0 - mask.get(x, y).clamp(0.0, 1.0);
        let keep = 1.0 - strength * background;
        for c in &mut px[..3] {
            *c = (*c as f32 * keep).round() as u8;
        }
    }
}

pub struct Canvas<'a> {
    buffer: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    pub fn new(buffer: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            buffer,
            width,
            height,
        }
    }

    pub fn draw_pose(&mut self, points: &[(f32, f32)]) {
        if points.len() < 2 {
            return;
        }

        let line_color = [224u8, 224u8, 224u8, 255u8];
        for &(a, b) in POSE_CONNECTIONS {
            if let (Some(pa), Some(pb)) = (points.get(a), points.get(b)) {
                self.draw_line(*pa, *pb, line_color, SKELETON_LINE_THICKNESS);
            }
        }

        for (idx, &(x, y)) in points.iter().enumerate() {
            if !(x.is_finite() && y.is_finite()) {
                continue;
            }
            // Odd indices past the face are the subject's left side.
            let color = if idx > 10 && idx % 2 == 1 {
                [255u8, 138u8, 0u8, 255u8]
            } else {
                [0u8, 217u8, 231u8, 255u8]
            };
            self.fill_circle(
                PixelPoint::new(x as i32, y as i32),
                SKELETON_POINT_RADIUS,
                color,
            );
        }
    }

    /// Segments are clipped to the canvas (widened by the stroke) before rasterising;
    /// segments with non-finite endpoints are skipped.
    pub fn draw_line(&mut self, p0: (f32, f32), p1: (f32, f32), color: [u8; 4], thickness: i32) {
        let radius = (thickness.max(1) - 1) / 2;
        let Some((p0, p1)) = self.clip_segment(p0, p1, radius) else {
            return;
        };
        let (mut x0, mut y0) = (p0.0 as i32, p0.1 as i32);
        let (x1, y1) = (p1.0 as i32, p1.1 as i32);
        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.stamp(x0, y0, radius, color);
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

    /// Liang-Barsky clip against the canvas grown by `pad` pixels on every side.
    fn clip_segment(
        &self,
        p0: (f32, f32),
        p1: (f32, f32),
        pad: i32,
    ) -> Option<((f64, f64), (f64, f64))> {
        if ![p0.0, p0.1, p1.0, p1.1].iter().all(|v| v.is_finite()) {
            return None;
        }
        let pad = f64::from(pad);
        let (x_min, y_min) = (-pad, -pad);
        let (x_max, y_max) = (f64::from(self.width) + pad, f64::from(self.height) + pad);
        let (x0, y0) = (f64::from(p0.0), f64::from(p0.1));
        let (dx, dy) = (f64::from(p1.0) - x0, f64::from(p1.1) - y0);

        let (mut t0, mut t1) = (0.0f64, 1.0f64);
        for (p, q) in [
            (-dx, x0 - x_min),
            (dx, x_max - x0),
            (-dy, y0 - y_min),
            (dy, y_max - y0),
        ] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }
        Some((
            (x0 + t0 * dx, y0 + t0 * dy),
            (x0 + t1 * dx, y0 + t1 * dy),
        ))
    }

    pub fn fill_circle(&mut self, center: PixelPoint, radius: i32, color: [u8; 4]) {
        let radius = radius.max(0);
        let r2 = i64::from(radius) * i64::from(radius);
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if i64::from(dx * dx + dy * dy) <= r2 {
                    self.put_pixel(center.x.saturating_add(dx), center.y.saturating_add(dy), color);
                }
            }
        }
    }

    /// Ring of the given thickness centered on the circle's rim.
    pub fn stroke_circle(&mut self, center: PixelPoint, radius: i32, thickness: i32, color: [u8; 4]) {
        let inner = (radius - thickness / 2).max(0);
        let outer = inner + thickness.max(1);
        let (inner2, outer2) = (inner * inner, outer * outer);
        for dy in -outer..=outer {
            for dx in -outer..=outer {
                let d2 = dx * dx + dy * dy;
                if d2 >= inner2 && d2 < outer2 {
                    self.put_pixel(center.x.saturating_add(dx), center.y.saturating_add(dy), color);
                }
            }
        }
    }

    fn stamp(&mut self, x: i32, y: i32, radius: i32, color: [u8; 4]) {
        self.put_pixel(x, y, color);
        for ox in -radius..=radius {
            for oy in -radius..=radius {
                if (ox != 0 || oy != 0) && ox.abs() + oy.abs() <= radius {
                    self.put_pixel(x + ox, y + oy, color);
                }
            }
        }
    }

    pub fn put_pixel(&mut self, x: i32, y: i32, color: [u8; 4]) {
        if x < 0 || y < 0 {
            return;
        }
        let (ux, uy) = (x as u32, y as u32);
        if ux >= self.width || uy >= self.height {
            return;
        }
        let idx = (uy as usize * self.width as usize + ux as usize) * 4;
        if let Some(px) = self.buffer.get_mut(idx..idx + 4) {
            px.copy_from_slice(&color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(width: u32, height: u32) -> Frame {
        Frame::new(vec![0u8; (width * height * 4) as usize], width, height)
    }

    fn pixel(frame: &Frame, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y * frame.width + x) * 4) as usize;
        [
            frame.rgba[idx],
            frame.rgba[idx + 1],
            frame.rgba[idx + 2],
            frame.rgba[idx + 3],
        ]
    }

    #[test]
    fn target_is_filled_with_white_rim() {
        let mut frame = blank(200, 200);
        let target = Target {
            center: PixelPoint::new(100, 100),
            radius: 40,
            color: [10, 200, 60],
        };
        render_annotations(&mut frame, &[Annotation::Target(target)]);
        assert_eq!(pixel(&frame, 100, 100), [10, 200, 60, 255]);
        assert_eq!(pixel(&frame, 140, 100), WHITE);
        assert_eq!(pixel(&frame, 150, 100), [0, 0, 0, 0]);
    }

    #[test]
    fn hand_markers_use_side_colors() {
        let mut frame = blank(100, 100);
        render_annotations(
            &mut frame,
            &[
                Annotation::HandMarker {
                    side: HandSide::Left,
                    at: PixelPoint::new(20, 20),
                    radius: 15,
                },
                Annotation::HandMarker {
                    side: HandSide::Right,
                    at: PixelPoint::new(70, 70),
                    radius: 15,
                },
            ],
        );
        assert_eq!(pixel(&frame, 20, 20), hand_color(HandSide::Left));
        assert_eq!(pixel(&frame, 70, 70), hand_color(HandSide::Right));
    }

    #[test]
    fn drawing_off_canvas_is_clipped() {
        let mut frame = blank(50, 50);
        render_annotations(
            &mut frame,
            &[
                Annotation::Burst {
                    center: PixelPoint::new(-500, 900),
                    radius: 40,
                },
                Annotation::Pose {
                    points: vec![(-10.0, -10.0), (1000.0, 1000.0), (25.0, 25.0)],
                },
            ],
        );
        assert_eq!(frame.rgba.len(), 50 * 50 * 4);
    }

    #[test]
    fn runaway_skeleton_points_are_skipped_or_clipped() {
        let mut frame = blank(64, 48);
        render_annotations(
            &mut frame,
            &[Annotation::Pose {
                points: vec![
                    (-1.0e9, 24.0),
                    (f32::INFINITY, 24.0),
                    (f32::NAN, 10.0),
                    (32.0, 4.8),
                    (1.0e9, 24.0),
                ],
            }],
        );
        // The (0, 4) connection spans the whole canvas once clipped.
        assert_eq!(pixel(&frame, 0, 24), [224, 224, 224, 255]);
        assert_eq!(pixel(&frame, 63, 24), [224, 224, 224, 255]);
        // The finite head point still gets its dot.
        assert_eq!(pixel(&frame, 32, 4), [0, 217, 231, 255]);
    }

    #[test]
    fn clipped_line_keeps_its_direction() {
        let mut frame = blank(20, 20);
        let mut canvas = Canvas::new(&mut frame.rgba, 20, 20);
        canvas.draw_line((-100.0, -100.0), (10.0, 10.0), WHITE, 1);
        assert_eq!(pixel(&frame, 5, 5), WHITE);
        assert_eq!(pixel(&frame, 0, 0), WHITE);
        assert_eq!(pixel(&frame, 11, 11), [0, 0, 0, 0]);
    }

    #[test]
    fn background_is_dimmed_outside_mask() {
        let mut frame = Frame::new(vec![200u8; 2 * 1 * 4], 2, 1);
        let mask = SegmentationMask {
            width: 2,
            height: 1,
            values: vec![1.0, 0.0],
        };
        dim_background(&mut frame, &mask, 0.5);
        assert_eq!(pixel(&frame, 0, 0)[0], 200);
        assert_eq!(pixel(&frame, 1, 0)[0], 100);
        assert_eq!(pixel(&frame, 1, 0)[3], 200);
    }
}
