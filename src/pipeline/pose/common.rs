use anyhow::{Context, Result, anyhow};
use fast_image_resize as fir;
use ndarray::Array4;
use rayon::prelude::*;

use crate::types::{Frame, Landmark, PoseJoint, SegmentationMask, Skeleton};

pub const POSE_INPUT_SIZE: u32 = 256;
/// Landmarks the model emits: 33 body joints followed by 6 auxiliary ROI points.
pub const POSE_OUTPUT_LANDMARKS: usize = 39;
const VALUES_PER_LANDMARK: usize = 5;
/// Tracking crops are this much larger than the previous body's bounding box.
const ROI_EXPANSION: f32 = 1.25;
const ROI_MIN_VISIBILITY: f32 = 0.5;

/// One model landmark: x, y, z in input pixels, then visibility and presence logits.
pub type RawLandmark = [f32; VALUES_PER_LANDMARK];

#[derive(Clone, Debug)]
pub struct LetterboxInfo {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub orig_w: u32,
    pub orig_h: u32,
}

#[derive(Clone, Debug)]
pub struct CropTransform {
    pub center: (f32, f32),
    pub side: f32,
    pub angle: f32,
    pub output_size: u32,
}

/// Maps model input pixels back onto the source frame.
#[derive(Clone, Debug)]
pub enum Projection {
    Letterbox(LetterboxInfo),
    Crop(CropTransform),
}

impl Projection {
    pub fn project(&self, x: f32, y: f32) -> (f32, f32) {
        match self {
            Projection::Letterbox(lb) => ((x - lb.pad_x) / lb.scale, (y - lb.pad_y) / lb.scale),
            Projection::Crop(crop) => crop.project(x, y),
        }
    }

    /// Frame pixels per model input pixel.
    pub fn frame_pixels_per_input(&self) -> f32 {
        match self {
            Projection::Letterbox(lb) => 1.0 / lb.scale,
            Projection::Crop(crop) => crop.side / crop.output_size as f32,
        }
    }
}

impl CropTransform {
    pub fn project(&self, x: f32, y: f32) -> (f32, f32) {
        let half = self.output_size as f32 / 2.0;
        let scale = self.side / self.output_size as f32;
        let dx = (x - half) * scale;
        let dy = (y - half) * scale;
        let (sin, cos) = self.angle.sin_cos();
        (
            self.center.0 + dx * cos - dy * sin,
            self.center.1 + dx * sin + dy * cos,
        )
    }
}

fn check_frame(frame: &Frame) -> Result<()> {
    let expected_len = (frame.width as usize)
        .saturating_mul(frame.height as usize)
        .saturating_mul(4);
    if frame.width == 0 || frame.height == 0 || frame.rgba.len() != expected_len {
        return Err(anyhow!(
            "frame buffer size mismatch: got {} bytes for {}x{}",
            frame.rgba.len(),
            frame.width,
            frame.height
        ));
    }
    Ok(())
}

/// Scales the whole frame into a square input, padding the short side with black.
pub fn prepare_letterbox(frame: &Frame, target_size: u32) -> Result<(Array4<f32>, LetterboxInfo)> {
    check_frame(frame)?;

    let scale = target_size as f32 / (frame.width.max(frame.height) as f32);
    let new_w = ((frame.width as f32 * scale).round() as u32).clamp(1, target_size);
    let new_h = ((frame.height as f32 * scale).round() as u32).clamp(1, target_size);

    let src_image = fir::images::Image::from_vec_u8(
        frame.width,
        frame.height,
        frame.rgba.clone(),
        fir::PixelType::U8x4,
    )?;
    let mut dst_image = fir::images::Image::new(new_w, new_h, fir::PixelType::U8x4);
    let mut resizer = fir::Resizer::new();
    let resize_options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Interpolation(fir::FilterType::Bilinear));
    resizer
        .resize(&src_image, &mut dst_image, Some(&resize_options))
        .context("fast resize failed")?;
    let resized = dst_image.into_vec();

    let pad_x = ((target_size - new_w) / 2) as usize;
    let pad_y = ((target_size - new_h) / 2) as usize;
    let side = target_size as usize;
    let src_stride = new_w as usize * 4;

    let mut data = vec![0f32; side * side * 3];
    data.par_chunks_exact_mut(side * 3)
        .enumerate()
        .for_each(|(row, dst)| {
            if row < pad_y || row >= pad_y + new_h as usize {
                return;
            }
            let src = &resized[(row - pad_y) * src_stride..(row - pad_y + 1) * src_stride];
            for (col, px) in src.chunks_exact(4).enumerate() {
                let offset = (pad_x + col) * 3;
                dst[offset] = px[0] as f32 / 255.0;
                dst[offset + 1] = px[1] as f32 / 255.0;
                dst[offset + 2] = px[2] as f32 / 255.0;
            }
        });

    let input = Array4::<f32>::from_shape_vec((1, side, side, 3), data)
        .map_err(|err| anyhow!("failed to build input tensor: {err}"))?;

    let letterbox = LetterboxInfo {
        scale,
        pad_x: pad_x as f32,
        pad_y: pad_y as f32,
        orig_w: frame.width,
        orig_h: frame.height,
    };
    Ok((input, letterbox))
}

/// Samples a rotated square around `center` into a model input.
pub fn prepare_rotated_crop(
    frame: &Frame,
    center: (f32, f32),
    side: f32,
    angle: f32,
    output_size: u32,
) -> Result<(Array4<f32>, CropTransform)> {
    check_frame(frame)?;
    if !(side.is_finite() && side > 0.0) {
        return Err(anyhow!("invalid crop side {side}"));
    }

    let transform = CropTransform {
        center,
        side,
        angle,
        output_size,
    };
    let size = output_size as usize;
    let mut data = vec![0f32; size * size * 3];
    data.par_chunks_exact_mut(size * 3)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..size {
                let (sx, sy) = transform.project(x as f32 + 0.5, y as f32 + 0.5);
                row[x * 3..x * 3 + 3].copy_from_slice(&sample_rgb(frame, sx, sy));
            }
        });

    let array = Array4::<f32>::from_shape_vec((1, size, size, 3), data)
        .map_err(|err| anyhow!("failed to build rotated crop tensor: {err}"))?;
    Ok((array, transform))
}

fn sample_rgb(frame: &Frame, x: f32, y: f32) -> [f32; 3] {
    if x.is_nan() || y.is_nan() {
        return [0.0, 0.0, 0.0];
    }
    let x0 = x.floor();
    let y0 = y.floor();
    let (w, h) = (frame.width as i32, frame.height as i32);
    let fetch = |cx: f32, cy: f32| -> [f32; 3] {
        let ix = cx as i32;
        let iy = cy as i32;
        if ix < 0 || iy < 0 || ix >= w || iy >= h {
            return [0.0, 0.0, 0.0];
        }
        let idx = (iy as usize * frame.width as usize + ix as usize) * 4;
        [
            frame.rgba[idx] as f32 / 255.0,
            frame.rgba[idx + 1] as f32 / 255.0,
            frame.rgba[idx + 2] as f32 / 255.0,
        ]
    };

    let fx = x - x0;
    let fy = y - y0;
    let c00 = fetch(x0, y0);
    let c10 = fetch(x0 + 1.0, y0);
    let c01 = fetch(x0, y0 + 1.0);
    let c11 = fetch(x0 + 1.0, y0 + 1.0);

    let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
    let mut out = [0.0; 3];
    for c in 0..3 {
        out[c] = lerp(lerp(c00[c], c10[c], fx), lerp(c01[c], c11[c], fx), fy);
    }
    out
}

pub fn decode_landmarks(flat: &[f32]) -> Result<Vec<RawLandmark>> {
    let needed = PoseJoint::COUNT * VALUES_PER_LANDMARK;
    if flat.len() < needed {
        return Err(anyhow!(
            "unexpected landmarks length: got {}, need {needed}",
            flat.len()
        ));
    }

    Ok(flat
        .chunks_exact(VALUES_PER_LANDMARK)
        .take(PoseJoint::COUNT)
        .map(|chunk| [chunk[0], chunk[1], chunk[2], chunk[3], chunk[4]])
        .collect())
}

/// Converts model-space landmarks into a normalized skeleton for `frame`.
pub fn build_skeleton(
    raw: &[RawLandmark],
    confidence: f32,
    projection: &Projection,
    frame: &Frame,
) -> Skeleton {
    let (w, h) = (frame.width as f32, frame.height as f32);
    let depth_scale = projection.frame_pixels_per_input() / w;
    let landmarks = raw
        .iter()
        .map(|&[x, y, z, visibility, _presence]| {
            let (px, py) = projection.project(x, y);
            Landmark::new(px / w, py / h, z * depth_scale, sigmoid(visibility))
        })
        .collect();
    Skeleton::new(landmarks, confidence.clamp(0.0, 1.0))
}

/// Resamples square mask logits onto the frame, undoing the letterbox.
pub fn resample_mask(logits: &[f32], mask_size: u32, letterbox: &LetterboxInfo) -> SegmentationMask {
    let (width, height) = (letterbox.orig_w, letterbox.orig_h);
    let size = mask_size as usize;
    let input_to_mask = mask_size as f32 / POSE_INPUT_SIZE as f32;
    let mut values = vec![0f32; width as usize * height as usize];
    values
        .par_chunks_exact_mut(width as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let my = ((y as f32 + 0.5) * letterbox.scale + letterbox.pad_y) * input_to_mask;
            for (x, value) in row.iter_mut().enumerate() {
                let mx = ((x as f32 + 0.5) * letterbox.scale + letterbox.pad_x) * input_to_mask;
                let (ix, iy) = (mx as usize, my as usize);
                if ix < size && iy < size {
                    if let Some(&logit) = logits.get(iy * size + ix) {
                        *value = sigmoid(logit);
                    }
                }
            }
        });
    SegmentationMask {
        width,
        height,
        values,
    }
}

/// Square region around the visible joints of `skeleton`, rotated so the torso points up.
pub fn tracking_roi(skeleton: &Skeleton, frame_w: u32, frame_h: u32) -> Option<(f32, f32, f32, f32)> {
    let (w, h) = (frame_w as f32, frame_h as f32);
    let visible: Vec<(f32, f32)> = skeleton
        .landmarks()
        .iter()
        .filter(|lm| lm.visibility >= ROI_MIN_VISIBILITY && lm.x.is_finite() && lm.y.is_finite())
        .map(|lm| (lm.x * w, lm.y * h))
        .collect();
    if visible.len() < 2 {
        return None;
    }

    let (min_x, max_x, min_y, max_y) = visible.iter().fold(
        (f32::MAX, f32::MIN, f32::MAX, f32::MIN),
        |acc, &(x, y)| (acc.0.min(x), acc.1.max(x), acc.2.min(y), acc.3.max(y)),
    );
    let side = (max_x - min_x).max(max_y - min_y) * ROI_EXPANSION;
    if side < 1.0 {
        return None;
    }
    let center = ((min_x + max_x) * 0.5, (min_y + max_y) * 0.5);
    Some((center.0, center.1, side, torso_angle(skeleton, w, h)))
}

fn torso_angle(skeleton: &Skeleton, w: f32, h: f32) -> f32 {
    let mid = |a: PoseJoint, b: PoseJoint| -> Option<(f32, f32)> {
        let (la, lb) = (skeleton.joint(a)?, skeleton.joint(b)?);
        if la.visibility < ROI_MIN_VISIBILITY || lb.visibility < ROI_MIN_VISIBILITY {
            return None;
        }
        Some(((la.x + lb.x) * 0.5 * w, (la.y + lb.y) * 0.5 * h))
    };
    let (Some(shoulders), Some(hips)) = (
        mid(PoseJoint::LeftShoulder, PoseJoint::RightShoulder),
        mid(PoseJoint::LeftHip, PoseJoint::RightHip),
    ) else {
        return 0.0;
    };
    let (vx, vy) = (shoulders.0 - hips.0, shoulders.1 - hips.1);
    if vx.abs() < f32::EPSILON && vy.abs() < f32::EPSILON {
        return 0.0;
    }
    vx.atan2(-vy)
}

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn gray_frame(width: u32, height: u32) -> Frame {
        Frame::new(vec![128u8; (width * height * 4) as usize], width, height)
    }

    #[test]
    fn letterbox_pads_short_side() {
        let frame = gray_frame(640, 480);
        let (input, lb) = prepare_letterbox(&frame, POSE_INPUT_SIZE).unwrap();
        assert_eq!(input.shape(), &[1, 256, 256, 3]);
        assert_relative_eq!(lb.scale, 0.4);
        assert_eq!(lb.pad_x, 0.0);
        assert_eq!(lb.pad_y, 32.0);
        // Padding rows stay black, image rows carry the gray value.
        assert_eq!(input[[0, 0, 10, 0]], 0.0);
        assert_relative_eq!(input[[0, 128, 10, 0]], 128.0 / 255.0, epsilon = 0.01);
    }

    #[test]
    fn letterbox_projection_round_trips_to_frame_pixels() {
        let lb = LetterboxInfo {
            scale: 0.4,
            pad_x: 0.0,
            pad_y: 32.0,
            orig_w: 640,
            orig_h: 480,
        };
        let projection = Projection::Letterbox(lb);
        let (x, y) = projection.project(128.0, 128.0);
        assert_relative_eq!(x, 320.0);
        assert_relative_eq!(y, 240.0);
    }

    #[test]
    fn unrotated_crop_maps_center_to_center() {
        let crop = CropTransform {
            center: (300.0, 200.0),
            side: 512.0,
            angle: 0.0,
            output_size: 256,
        };
        let (x, y) = crop.project(128.0, 128.0);
        assert_relative_eq!(x, 300.0);
        assert_relative_eq!(y, 200.0);
        let (x, _) = crop.project(256.0, 128.0);
        assert_relative_eq!(x, 556.0);
    }

    #[test]
    fn rejects_mismatched_buffers() {
        let frame = Frame::new(vec![0u8; 10], 4, 4);
        assert!(prepare_letterbox(&frame, POSE_INPUT_SIZE).is_err());
        assert!(prepare_rotated_crop(&frame, (2.0, 2.0), 4.0, 0.0, 8).is_err());
    }

    #[test]
    fn decodes_body_joints_only() {
        let flat: Vec<f32> = (0..POSE_OUTPUT_LANDMARKS * 5).map(|v| v as f32).collect();
        let decoded = decode_landmarks(&flat).unwrap();
        assert_eq!(decoded.len(), PoseJoint::COUNT);
        assert_eq!(decoded[1], [5.0, 6.0, 7.0, 8.0, 9.0]);
        assert!(decode_landmarks(&flat[..100]).is_err());
    }

    #[test]
    fn skeleton_is_normalized_to_frame() {
        let frame = gray_frame(640, 480);
        let projection = Projection::Letterbox(LetterboxInfo {
            scale: 0.4,
            pad_x: 0.0,
            pad_y: 32.0,
            orig_w: 640,
            orig_h: 480,
        });
        let raw = vec![[128.0, 128.0, 0.0, 10.0, 10.0]; PoseJoint::COUNT];
        let skeleton = build_skeleton(&raw, 1.4, &projection, &frame);
        let wrist = skeleton.joint(PoseJoint::LeftWrist).unwrap();
        assert_relative_eq!(wrist.x, 0.5);
        assert_relative_eq!(wrist.y, 0.5);
        assert!(wrist.visibility > 0.99);
        assert_eq!(skeleton.confidence(), 1.0);
    }

    #[test]
    fn tracking_roi_covers_visible_joints() {
        let mut landmarks = vec![Landmark::new(0.0, 0.0, 0.0, 0.0); PoseJoint::COUNT];
        landmarks[PoseJoint::LeftShoulder.index()] = Landmark::new(0.4, 0.25, 0.0, 0.9);
        landmarks[PoseJoint::RightShoulder.index()] = Landmark::new(0.6, 0.25, 0.0, 0.9);
        landmarks[PoseJoint::LeftHip.index()] = Landmark::new(0.4, 0.75, 0.0, 0.9);
        landmarks[PoseJoint::RightHip.index()] = Landmark::new(0.6, 0.75, 0.0, 0.9);
        let skeleton = Skeleton::new(landmarks, 0.9);

        let (cx, cy, side, angle) = tracking_roi(&skeleton, 400, 400).unwrap();
        assert_relative_eq!(cx, 200.0, epsilon = 1e-3);
        assert_relative_eq!(cy, 200.0, epsilon = 1e-3);
        assert_relative_eq!(side, 250.0, epsilon = 1e-3);
        assert_relative_eq!(angle, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn mask_follows_letterbox() {
        let lb = LetterboxInfo {
            scale: 1.0,
            pad_x: 0.0,
            pad_y: 128.0,
            orig_w: 256,
            orig_h: 128,
        };
        // Foreground only in the lower half of the square mask.
        let logits: Vec<f32> = (0..256 * 256)
            .map(|i| if i / 256 >= 192 { 20.0 } else { -20.0 })
            .collect();
        let mask = resample_mask(&logits, 256, &lb);
        assert_eq!((mask.width, mask.height), (256, 128));
        assert!(mask.get(10, 10) < 0.01);
        assert!(mask.get(10, 100) > 0.99);
    }
}
