use super::{HandPosition, Target};
use crate::types::PixelPoint;

/// Closed-disk test: a hand exactly on the rim counts as a touch.
pub fn is_colliding(hand: &HandPosition, target: &Target) -> bool {
    let Some(point) = hand.point() else {
        return false;
    };
    let dx = i64::from(point.x) - i64::from(target.center.x);
    let dy = i64::from(point.y) - i64::from(target.center.y);
    let radius = i64::from(target.radius);
    dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy)) <= radius * radius
}

pub fn distance(point: PixelPoint, target: &Target) -> f64 {
    let dx = f64::from(point.x) - f64::from(target.center.x);
    let dy = f64::from(point.y) - f64::from(target.center.y);
    dx.hypot(dy)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::game::Absence;

    fn target_at(x: i32, y: i32) -> Target {
        Target {
            center: PixelPoint::new(x, y),
            radius: 40,
            color: [0, 255, 0],
        }
    }

    fn hand(x: i32, y: i32) -> HandPosition {
        HandPosition::Located(PixelPoint::new(x, y))
    }

    #[test]
    fn hand_on_center_collides() {
        let target = target_at(100, 100);
        assert!(is_colliding(&hand(100, 100), &target));
        assert_relative_eq!(distance(PixelPoint::new(100, 100), &target), 0.0);
    }

    #[test]
    fn rim_is_inclusive() {
        let target = target_at(100, 100);
        assert!(is_colliding(&hand(140, 100), &target));
        assert!(is_colliding(&hand(100, 60), &target));
        // 24-32-40 right triangle lands exactly on the rim.
        assert!(is_colliding(&hand(124, 132), &target));
        assert!(!is_colliding(&hand(141, 100), &target));
        assert!(!is_colliding(&hand(100, 141), &target));
    }

    #[test]
    fn one_pixel_past_the_rim_misses() {
        let target = target_at(141, 100);
        let point = PixelPoint::new(100, 100);
        assert_relative_eq!(distance(point, &target), 41.0);
        assert!(!is_colliding(&HandPosition::Located(point), &target));
    }

    #[test]
    fn unknown_hand_never_collides() {
        let target = target_at(100, 100);
        for absence in [
            Absence::NoSkeleton,
            Absence::JointMissing(crate::types::PoseJoint::LeftWrist),
        ] {
            assert!(!is_colliding(&HandPosition::Unknown(absence), &target));
        }
    }

    #[test]
    fn far_coordinates_do_not_overflow() {
        let target = target_at(100, 100);
        assert!(!is_colliding(&hand(i32::MAX, i32::MIN), &target));
    }
}
