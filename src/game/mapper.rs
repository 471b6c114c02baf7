use crate::{
    error::MappingError,
    types::{HandSide, PixelPoint, PoseJoint, Skeleton},
};

/// Why a hand has no pixel position this frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Absence {
    /// The estimator found no body.
    NoSkeleton,
    /// A body was found but the joint is not part of it.
    JointMissing(PoseJoint),
    /// The joint exists but its data cannot be mapped.
    Malformed(MappingError),
}

#[derive(Clone, Debug, PartialEq)]
pub enum HandPosition {
    Located(PixelPoint),
    Unknown(Absence),
}

impl HandPosition {
    pub fn point(&self) -> Option<PixelPoint> {
        match self {
            HandPosition::Located(point) => Some(*point),
            HandPosition::Unknown(_) => None,
        }
    }

    pub fn is_located(&self) -> bool {
        matches!(self, HandPosition::Located(_))
    }

    /// Set when the joint was present but unusable, which points at a model or decode bug
    /// rather than an empty scene.
    pub fn malformed(&self) -> Option<&MappingError> {
        match self {
            HandPosition::Unknown(Absence::Malformed(err)) => Some(err),
            _ => None,
        }
    }
}

pub fn locate_hand(
    skeleton: Option<&Skeleton>,
    side: HandSide,
    width: u32,
    height: u32,
) -> HandPosition {
    locate_joint(skeleton, side.wrist(), width, height)
}

pub fn locate_joint(
    skeleton: Option<&Skeleton>,
    joint: PoseJoint,
    width: u32,
    height: u32,
) -> HandPosition {
    let Some(skeleton) = skeleton else {
        return HandPosition::Unknown(Absence::NoSkeleton);
    };
    let Some(landmark) = skeleton.joint(joint) else {
        return HandPosition::Unknown(Absence::JointMissing(joint));
    };
    match to_pixels(joint, landmark.x, landmark.y, width, height) {
        Ok(point) => HandPosition::Located(point),
        Err(err) => HandPosition::Unknown(Absence::Malformed(err)),
    }
}

fn to_pixels(
    joint: PoseJoint,
    x: f32,
    y: f32,
    width: u32,
    height: u32,
) -> Result<PixelPoint, MappingError> {
    if width == 0 || height == 0 {
        return Err(MappingError::EmptyFrame { width, height });
    }
    if !x.is_finite() || !y.is_finite() {
        return Err(MappingError::NonFinite { joint, x, y });
    }
    let px = (f64::from(x) * f64::from(width)).trunc();
    let py = (f64::from(y) * f64::from(height)).trunc();
    let range = f64::from(i32::MIN)..=f64::from(i32::MAX);
    if !range.contains(&px) || !range.contains(&py) {
        return Err(MappingError::Overflow { joint });
    }
    Ok(PixelPoint::new(px as i32, py as i32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Landmark;

    fn skeleton_with_wrists(left: (f32, f32), right: (f32, f32)) -> Skeleton {
        let mut landmarks = vec![Landmark::new(0.5, 0.5, 0.0, 0.9); PoseJoint::COUNT];
        landmarks[PoseJoint::LeftWrist.index()] = Landmark::new(left.0, left.1, -0.1, 0.9);
        landmarks[PoseJoint::RightWrist.index()] = Landmark::new(right.0, right.1, -0.2, 0.9);
        Skeleton::new(landmarks, 0.95)
    }

    #[test]
    fn maps_normalized_wrists_to_pixels() {
        let skeleton = skeleton_with_wrists((0.25, 0.5), (0.75, 0.1));
        assert_eq!(
            locate_hand(Some(&skeleton), HandSide::Left, 640, 480),
            HandPosition::Located(PixelPoint::new(160, 240))
        );
        assert_eq!(
            locate_hand(Some(&skeleton), HandSide::Right, 640, 480),
            HandPosition::Located(PixelPoint::new(480, 48))
        );
    }

    #[test]
    fn truncates_toward_zero() {
        let skeleton = skeleton_with_wrists((0.3999, -0.0001), (0.5, 0.5));
        assert_eq!(
            locate_hand(Some(&skeleton), HandSide::Left, 100, 100),
            HandPosition::Located(PixelPoint::new(39, 0))
        );
    }

    #[test]
    fn off_frame_wrists_still_map() {
        let skeleton = skeleton_with_wrists((1.2, -0.3), (0.5, 0.5));
        assert_eq!(
            locate_hand(Some(&skeleton), HandSide::Left, 640, 480),
            HandPosition::Located(PixelPoint::new(768, -144))
        );
    }

    #[test]
    fn missing_skeleton_is_unknown() {
        assert_eq!(
            locate_hand(None, HandSide::Right, 640, 480),
            HandPosition::Unknown(Absence::NoSkeleton)
        );
    }

    #[test]
    fn truncated_skeleton_reports_missing_joint() {
        let skeleton = Skeleton::new(vec![Landmark::new(0.5, 0.5, 0.0, 1.0); 12], 0.8);
        let hand = locate_hand(Some(&skeleton), HandSide::Right, 640, 480);
        assert_eq!(
            hand,
            HandPosition::Unknown(Absence::JointMissing(PoseJoint::RightWrist))
        );
        assert!(hand.malformed().is_none());
    }

    #[test]
    fn malformed_data_is_distinguishable() {
        let skeleton = skeleton_with_wrists((f32::NAN, 0.5), (f32::INFINITY, 0.5));
        let left = locate_hand(Some(&skeleton), HandSide::Left, 640, 480);
        assert!(matches!(
            left.malformed(),
            Some(MappingError::NonFinite {
                joint: PoseJoint::LeftWrist,
                ..
            })
        ));
        assert!(locate_hand(Some(&skeleton), HandSide::Right, 640, 480)
            .malformed()
            .is_some());

        let huge = skeleton_with_wrists((1.0e9, 0.5), (0.5, 0.5));
        assert_eq!(
            locate_hand(Some(&huge), HandSide::Left, 640, 480).malformed(),
            Some(&MappingError::Overflow {
                joint: PoseJoint::LeftWrist
            })
        );
    }

    #[test]
    fn empty_frame_is_malformed() {
        let skeleton = skeleton_with_wrists((0.5, 0.5), (0.5, 0.5));
        assert_eq!(
            locate_hand(Some(&skeleton), HandSide::Left, 0, 480).malformed(),
            Some(&MappingError::EmptyFrame {
                width: 0,
                height: 480
            })
        );
    }
}
