use std::time::Instant;

use rayon::prelude::*;

#[derive(Clone, Debug)]
pub struct Frame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: Instant,
}

impl Frame {
    pub fn new(rgba: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            rgba,
            width,
            height,
            timestamp: Instant::now(),
        }
    }

    /// Flips the frame left-to-right in place so the player sees a mirror image.
    pub fn mirror_horizontal(&mut self) {
        let stride = self.width as usize * 4;
        if stride == 0 {
            return;
        }
        self.rgba.par_chunks_exact_mut(stride).for_each(|row| {
            let pixels = row.len() / 4;
            for i in 0..pixels / 2 {
                let j = pixels - 1 - i;
                for c in 0..4 {
                    row.swap(i * 4 + c, j * 4 + c);
                }
            }
        });
    }
}

/// The 33 body joints produced by BlazePose-style landmark models, in model output order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoseJoint {
    Nose,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl PoseJoint {
    pub const COUNT: usize = 33;

    pub const ALL: [PoseJoint; Self::COUNT] = [
        PoseJoint::Nose,
        PoseJoint::LeftEyeInner,
        PoseJoint::LeftEye,
        PoseJoint::LeftEyeOuter,
        PoseJoint::RightEyeInner,
        PoseJoint::RightEye,
        PoseJoint::RightEyeOuter,
        PoseJoint::LeftEar,
        PoseJoint::RightEar,
        PoseJoint::MouthLeft,
        PoseJoint::MouthRight,
        PoseJoint::LeftShoulder,
        PoseJoint::RightShoulder,
        PoseJoint::LeftElbow,
        PoseJoint::RightElbow,
        PoseJoint::LeftWrist,
        PoseJoint::RightWrist,
        PoseJoint::LeftPinky,
        PoseJoint::RightPinky,
        PoseJoint::LeftIndex,
        PoseJoint::RightIndex,
        PoseJoint::LeftThumb,
        PoseJoint::RightThumb,
        PoseJoint::LeftHip,
        PoseJoint::RightHip,
        PoseJoint::LeftKnee,
        PoseJoint::RightKnee,
        PoseJoint::LeftAnkle,
        PoseJoint::RightAnkle,
        PoseJoint::LeftHeel,
        PoseJoint::RightHeel,
        PoseJoint::LeftFootIndex,
        PoseJoint::RightFootIndex,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            PoseJoint::Nose => "nose",
            PoseJoint::LeftEyeInner => "left_eye_inner",
            PoseJoint::LeftEye => "left_eye",
            PoseJoint::LeftEyeOuter => "left_eye_outer",
            PoseJoint::RightEyeInner => "right_eye_inner",
            PoseJoint::RightEye => "right_eye",
            PoseJoint::RightEyeOuter => "right_eye_outer",
            PoseJoint::LeftEar => "left_ear",
            PoseJoint::RightEar => "right_ear",
            PoseJoint::MouthLeft => "mouth_left",
            PoseJoint::MouthRight => "mouth_right",
            PoseJoint::LeftShoulder => "left_shoulder",
            PoseJoint::RightShoulder => "right_shoulder",
            PoseJoint::LeftElbow => "left_elbow",
            PoseJoint::RightElbow => "right_elbow",
            PoseJoint::LeftWrist => "left_wrist",
            PoseJoint::RightWrist => "right_wrist",
            PoseJoint::LeftPinky => "left_pinky",
            PoseJoint::RightPinky => "right_pinky",
            PoseJoint::LeftIndex => "left_index",
            PoseJoint::RightIndex => "right_index",
            PoseJoint::LeftThumb => "left_thumb",
            PoseJoint::RightThumb => "right_thumb",
            PoseJoint::LeftHip => "left_hip",
            PoseJoint::RightHip => "right_hip",
            PoseJoint::LeftKnee => "left_knee",
            PoseJoint::RightKnee => "right_knee",
            PoseJoint::LeftAnkle => "left_ankle",
            PoseJoint::RightAnkle => "right_ankle",
            PoseJoint::LeftHeel => "left_heel",
            PoseJoint::RightHeel => "right_heel",
            PoseJoint::LeftFootIndex => "left_foot_index",
            PoseJoint::RightFootIndex => "right_foot_index",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandSide {
    Left,
    Right,
}

impl HandSide {
    pub const BOTH: [HandSide; 2] = [HandSide::Right, HandSide::Left];

    pub fn wrist(self) -> PoseJoint {
        match self {
            HandSide::Left => PoseJoint::LeftWrist,
            HandSide::Right => PoseJoint::RightWrist,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HandSide::Left => "Left Hand",
            HandSide::Right => "Right Hand",
        }
    }
}

/// One joint in normalized image coordinates; `z` is depth relative to the hips.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32, visibility: f32) -> Self {
        Self { x, y, z, visibility }
    }
}

/// Per-pixel foreground probability at frame resolution.
#[derive(Clone, Debug)]
pub struct SegmentationMask {
    pub width: u32,
    pub height: u32,
    pub values: Vec<f32>,
}

impl SegmentationMask {
    pub fn get(&self, x: u32, y: u32) -> f32 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.values
            .get((y * self.width + x) as usize)
            .copied()
            .unwrap_or(0.0)
    }
}

/// A single detected body. Landmarks are indexed by [`PoseJoint::index`].
#[derive(Clone, Debug)]
pub struct Skeleton {
    landmarks: Vec<Landmark>,
    confidence: f32,
    segmentation: Option<SegmentationMask>,
}

impl Skeleton {
    pub fn new(landmarks: Vec<Landmark>, confidence: f32) -> Self {
        Self {
            landmarks,
            confidence,
            segmentation: None,
        }
    }

    pub fn with_segmentation(mut self, mask: SegmentationMask) -> Self {
        self.segmentation = Some(mask);
        self
    }

    pub fn joint(&self, joint: PoseJoint) -> Option<&Landmark> {
        self.landmarks.get(joint.index())
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn segmentation(&self) -> Option<&SegmentationMask> {
        self.segmentation.as_ref()
    }

    /// Landmarks scaled to pixel space, for drawing.
    pub fn projected(&self, width: u32, height: u32) -> Vec<(f32, f32)> {
        self.landmarks
            .iter()
            .map(|lm| (lm.x * width as f32, lm.y * height as f32))
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_swaps_columns_per_row() {
        // 3x2 frame, each pixel tagged by its column in the red channel.
        let mut rgba = Vec::new();
        for _row in 0..2 {
            for col in 0..3u8 {
                rgba.extend_from_slice(&[col, 0, 0, 255]);
            }
        }
        let mut frame = Frame::new(rgba, 3, 2);
        frame.mirror_horizontal();

        let reds: Vec<u8> = frame.rgba.chunks_exact(4).map(|px| px[0]).collect();
        assert_eq!(reds, vec![2, 1, 0, 2, 1, 0]);
    }

    #[test]
    fn joint_lookup_follows_model_order() {
        assert_eq!(PoseJoint::LeftWrist.index(), 15);
        assert_eq!(PoseJoint::RightWrist.index(), 16);
        assert_eq!(PoseJoint::ALL.len(), PoseJoint::COUNT);
        for (idx, joint) in PoseJoint::ALL.iter().enumerate() {
            assert_eq!(joint.index(), idx);
        }
    }

    #[test]
    fn skeleton_with_too_few_landmarks_has_no_wrist() {
        let skeleton = Skeleton::new(vec![Landmark::new(0.5, 0.5, 0.0, 1.0); 10], 0.9);
        assert!(skeleton.joint(PoseJoint::Nose).is_some());
        assert!(skeleton.joint(HandSide::Left.wrist()).is_none());
    }
}
