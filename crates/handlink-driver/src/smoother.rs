//! 指数平滑
//!
//! `current += (target - current) * alpha`，每帧无条件执行（包括丢失手部信号的帧），
//! 所以信号丢失时位姿以有界速率回到中立位而不是瞬间跳变。
//! 夹爪不参与平滑，直接取目标值。

use crate::state::Pose;

/// 单步缓动
#[inline]
pub fn ease(current: f64, target: f64, alpha: f64) -> f64 {
    current + (target - current) * alpha
}

/// 将 `current` 向 `target` 推进一步
pub fn smooth(current: &mut Pose, target: &Pose, alpha: f64) {
    for (c, t) in current.angles.iter_mut().zip(target.angles.iter()) {
        *c = ease(*c, *t, alpha);
    }
    current.gripper = target.gripper;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Gripper, Joint};
    use proptest::prelude::*;

    #[test]
    fn test_single_step_is_exact() {
        let mut current = Pose::new([0.0, 100.0, 180.0], Gripper::Open);
        let target = Pose::new([90.0, 90.0, 90.0], Gripper::Closed);
        smooth(&mut current, &target, 0.1);
        assert_eq!(current.angles[Joint::Base], 0.0 + (90.0 - 0.0) * 0.1);
        assert_eq!(current.angles[Joint::Shoulder], 100.0 + (90.0 - 100.0) * 0.1);
        assert_eq!(current.angles[Joint::Elbow], 180.0 + (90.0 - 180.0) * 0.1);
        // 夹爪直接跟随
        assert_eq!(current.gripper, Gripper::Closed);
    }

    #[test]
    fn test_alpha_one_snaps() {
        let mut current = Pose::new([10.0, 20.0, 30.0], Gripper::Closed);
        let target = Pose::new([170.0, 160.0, 150.0], Gripper::Open);
        smooth(&mut current, &target, 1.0);
        assert_eq!(current, target);
    }

    #[test]
    fn test_converges_to_constant_target() {
        let mut current = Pose::new([0.0, 180.0, 45.0], Gripper::Open);
        let target = Pose::NEUTRAL;
        for _ in 0..2000 {
            smooth(&mut current, &target, 0.1);
        }
        for joint in Joint::ALL {
            assert!((current.angles[joint] - 90.0).abs() < 1e-9);
        }
    }

    proptest! {
        #[test]
        fn prop_step_never_overshoots(
            current in 0.0f64..180.0,
            target in 0.0f64..180.0,
            alpha in 0.001f64..=1.0,
        ) {
            let next = ease(current, target, alpha);
            let (lo, hi) = if current <= target { (current, target) } else { (target, current) };
            prop_assert!(next >= lo - 1e-9 && next <= hi + 1e-9);
            prop_assert!((target - next).abs() <= (target - current).abs() + 1e-9);
        }
    }
}
