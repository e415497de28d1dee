//! 流水线状态
//!
//! 关节索引、位姿类型，以及帧循环独占持有的 [`PipelineState`]。
//!
//! # 示例
//!
//! ```rust
//! use handlink_driver::{Joint, JointArray};
//!
//! let angles = JointArray::new([90.0, 45.0, 135.0]);
//! assert_eq!(angles[Joint::Shoulder], 45.0);
//!
//! let doubled = angles.map(|a| a * 2.0);
//! assert_eq!(doubled[Joint::Elbow], 270.0);
//! ```

use crate::deadband::SENTINEL_COMMAND;
use crate::filter::FilterBank;
use handlink_protocol::ArmCommand;
use std::fmt;
use std::ops::{Index, IndexMut};

/// 舵机全局角度下限（度）
pub const ANGLE_MIN: f64 = handlink_protocol::ANGLE_MIN as f64;
/// 舵机全局角度上限（度）
pub const ANGLE_MAX: f64 = handlink_protocol::ANGLE_MAX as f64;
/// 中立位角度（度）
pub const NEUTRAL_ANGLE: f64 = 90.0;

/// 旋转关节
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Joint {
    /// 底座旋转
    Base = 0,
    /// 肩部
    Shoulder = 1,
    /// 肘部
    Elbow = 2,
}

impl Joint {
    /// 所有关节
    pub const ALL: [Joint; 3] = [Joint::Base, Joint::Shoulder, Joint::Elbow];

    /// 关节索引（0-2）
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// 关节名称
    pub const fn name(self) -> &'static str {
        match self {
            Joint::Base => "base",
            Joint::Shoulder => "shoulder",
            Joint::Elbow => "elbow",
        }
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 关节数组
///
/// 按 [`Joint`] 索引的 3 元素容器。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointArray<T> {
    data: [T; 3],
}

impl<T> JointArray<T> {
    #[inline]
    pub const fn new(data: [T; 3]) -> Self {
        JointArray { data }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.data.iter_mut()
    }

    pub fn into_array(self) -> [T; 3] {
        self.data
    }

    /// 映射转换
    pub fn map<U, F>(self, f: F) -> JointArray<U>
    where
        F: FnMut(T) -> U,
    {
        JointArray::new(self.data.map(f))
    }

    /// 带关节的映射转换
    pub fn map_with_joint<U, F>(self, mut f: F) -> JointArray<U>
    where
        F: FnMut(Joint, T) -> U,
    {
        let [a, b, c] = self.data;
        JointArray::new([
            f(Joint::Base, a),
            f(Joint::Shoulder, b),
            f(Joint::Elbow, c),
        ])
    }
}

impl<T: Copy> JointArray<T> {
    /// 所有元素相同
    #[inline]
    pub const fn splat(value: T) -> Self {
        JointArray { data: [value; 3] }
    }
}

impl<T> Index<Joint> for JointArray<T> {
    type Output = T;

    #[inline]
    fn index(&self, joint: Joint) -> &T {
        &self.data[joint.index()]
    }
}

impl<T> IndexMut<Joint> for JointArray<T> {
    #[inline]
    fn index_mut(&mut self, joint: Joint) -> &mut T {
        &mut self.data[joint.index()]
    }
}

/// 夹爪状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Gripper {
    /// 闭合（捏合），中立位默认值
    #[default]
    Closed = 0,
    /// 张开
    Open = 1,
}

impl Gripper {
    /// 报文中的取值
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// 状态显示文本
    pub const fn label(self) -> &'static str {
        match self {
            Gripper::Closed => "CLOSE",
            Gripper::Open => "OPEN",
        }
    }
}

impl fmt::Display for Gripper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 执行器位姿（角度单位：度）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub angles: JointArray<f64>,
    pub gripper: Gripper,
}

impl Pose {
    /// 中立位：(90°, 90°, 90°)，夹爪闭合
    pub const NEUTRAL: Pose = Pose {
        angles: JointArray::splat(NEUTRAL_ANGLE),
        gripper: Gripper::Closed,
    };

    pub const fn new(angles: [f64; 3], gripper: Gripper) -> Self {
        Self {
            angles: JointArray::new(angles),
            gripper,
        }
    }

    /// 四舍五入为整数命令
    pub fn to_command(&self) -> ArmCommand {
        let [base, shoulder, elbow] = self.angles.map(|a| a.round() as i32).into_array();
        ArmCommand::new(base, shoulder, elbow, self.gripper.as_i32())
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// 流水线状态
///
/// 帧循环独占持有，每帧以可变借用传入各阶段；没有跨帧共享的其他状态。
///
/// - `target`: 滤波后、平滑前的目标位姿，每帧覆盖
/// - `current`: 平滑后的实际命令位姿，只由平滑器修改
/// - `last_sent`: 最近一次确认发送成功的命令，初始为越界哨兵值
/// - `filters`: 每关节的滑动平均窗口
#[derive(Debug, Clone)]
pub struct PipelineState {
    pub target: Pose,
    pub current: Pose,
    pub last_sent: ArmCommand,
    pub filters: FilterBank,
}

impl PipelineState {
    /// 初始状态：目标与当前均为中立位
    pub fn new(filter_window: usize) -> Self {
        Self {
            target: Pose::NEUTRAL,
            current: Pose::NEUTRAL,
            last_sent: SENTINEL_COMMAND,
            filters: FilterBank::new(filter_window),
        }
    }

    /// 当前位姿对应的整数命令（夹爪直接取目标值）
    pub fn current_command(&self) -> ArmCommand {
        Pose {
            angles: self.current.angles,
            gripper: self.target.gripper,
        }
        .to_command()
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_FILTER_WINDOW)
    }
}
