//! 单帧信号处理
//!
//! 每帧的处理顺序：
//!
//! 1. 检测到手：映射 → 滑动平均 → 加 trim → 钳位 [0, 180] → `target`；捏合检测 → 夹爪
//! 2. 没有手：清空所有滤波窗口，`target` 置为中立位
//! 3. 无论有没有手：`current` 向 `target` 平滑一步
//!
//! 死区判断和发送在 [`Teleop`](crate::Teleop) 里完成。

use crate::config::PipelineConfig;
use crate::landmark::HandLandmarks;
use crate::mapper::{detect_gripper, finish_angle, raw_angles};
use crate::smoother::smooth;
use crate::state::{ANGLE_MAX, Gripper, Joint, JointArray, PipelineState, Pose};
use handlink_protocol::ArmCommand;
use std::fmt;
use tracing::trace;

/// 单帧处理结果（状态显示用）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// 本帧是否检测到有效的手
    pub hand_present: bool,
    /// 本帧目标位姿
    pub target: Pose,
    /// 平滑后四舍五入的命令
    pub command: ArmCommand,
}

impl FrameReport {
    pub fn gripper(&self) -> Gripper {
        self.target.gripper
    }

    /// 各关节行程百分比（`angle / 180 * 100`）
    pub fn travel_percent(&self) -> JointArray<f64> {
        JointArray::new([self.command.base, self.command.shoulder, self.command.elbow])
            .map(|angle| f64::from(angle) / ANGLE_MAX * 100.0)
    }
}

impl fmt::Display for FrameReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "base {:>3}° shoulder {:>3}° elbow {:>3}° gripper {:<5}{}",
            self.command.base,
            self.command.shoulder,
            self.command.elbow,
            self.gripper().label(),
            if self.hand_present { "" } else { " (no hand)" }
        )
    }
}

/// 推进一帧
///
/// `hand` 中用到的关键点含非有限值时按信号丢失处理。
pub fn advance(
    state: &mut PipelineState,
    config: &PipelineConfig,
    hand: Option<&HandLandmarks>,
) -> FrameReport {
    let hand = hand.filter(|h| h.is_finite());

    match hand {
        Some(hand) => {
            let raw = raw_angles(hand, config);
            let filtered = state.filters.push(raw, config.filter_window);
            state.target = Pose {
                angles: filtered
                    .map_with_joint(|joint, angle| finish_angle(angle, config.joint(joint))),
                gripper: detect_gripper(hand, config.pinch_threshold),
            };
        },
        None => {
            state.filters.clear();
            state.target = Pose::NEUTRAL;
        },
    }

    smooth(&mut state.current, &state.target, config.smoothing);

    let command = state.current_command();
    trace!(
        "frame: hand={} target=({:.1}, {:.1}, {:.1}) command={:?}",
        hand.is_some(),
        state.target.angles[Joint::Base],
        state.target.angles[Joint::Shoulder],
        state.target.angles[Joint::Elbow],
        command
    );

    FrameReport {
        hand_present: hand.is_some(),
        target: state.target,
        command,
    }
}
