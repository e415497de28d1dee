//! 死区门限
//!
//! 与最近一次成功发送的命令比较，变化足够大才发出新命令，避免串行链路被刷爆。

use handlink_protocol::ArmCommand;

/// 初始 `last_sent`：所有字段越界，保证第一帧一定发送
pub const SENTINEL_COMMAND: ArmCommand = ArmCommand::new(-999, -999, -999, -1);

/// 是否需要发送
///
/// 任一关节 `|current - last_sent| >= threshold`，或夹爪状态不同时返回 `true`。
/// 比较在四舍五入后的整数上进行。
pub fn should_emit(current: &ArmCommand, last_sent: &ArmCommand, threshold: f64) -> bool {
    let joint_moved = [
        (current.base, last_sent.base),
        (current.shoulder, last_sent.shoulder),
        (current.elbow, last_sent.elbow),
    ]
    .iter()
    .any(|&(now, sent)| f64::from((now - sent).abs()) >= threshold);

    joint_moved || current.gripper != last_sent.gripper
}
