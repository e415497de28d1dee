//! 几何特征 → 关节角度映射
//!
//! | 关节 | 特征 | 定义域 |
//! |------|------|--------|
//! | base | `1 - wrist.x`（镜像） | [0, 1] |
//! | shoulder | 手腕到掌根距离（深度代理） | [0.05, 0.25] |
//! | elbow | `wrist.y` | [0, 1] |
//!
//! 输入不做预钳位，超出定义域的特征会线性外推；最终角度在滤波、加 trim 之后
//! 统一钳位到全局区间 [0, 180]。

use crate::config::{JointConfig, PipelineConfig};
use crate::landmark::HandLandmarks;
use crate::state::{Gripper, Joint, JointArray};

/// 特征定义域 `(in_min, in_max)`
pub type Domain = (f64, f64);

pub const BASE_DOMAIN: Domain = (0.0, 1.0);
pub const SHOULDER_DOMAIN: Domain = (0.05, 0.25);
pub const ELBOW_DOMAIN: Domain = (0.0, 1.0);

/// 关节的特征定义域
pub const fn domain(joint: Joint) -> Domain {
    match joint {
        Joint::Base => BASE_DOMAIN,
        Joint::Shoulder => SHOULDER_DOMAIN,
        Joint::Elbow => ELBOW_DOMAIN,
    }
}

/// 线性插值 `[in_min, in_max] → [out_min, out_max]`
///
/// `in_min == in_max` 时输出 `out_min`。
#[inline]
pub fn map_range(v: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    let span = in_max - in_min;
    if span == 0.0 {
        return out_min;
    }
    out_min + (v - in_min) * (out_max - out_min) / span
}

/// 按关节配置映射单个特征值（未加 trim、未钳位）
#[inline]
pub fn map_joint(v: f64, domain: Domain, config: &JointConfig) -> f64 {
    let (out_min, out_max) = config.output_range();
    map_range(v, domain.0, domain.1, out_min, out_max)
}

/// 关节的几何特征值
pub fn feature(hand: &HandLandmarks, joint: Joint) -> f64 {
    match joint {
        Joint::Base => 1.0 - hand.wrist().x,
        Joint::Shoulder => hand.palm_size(),
        Joint::Elbow => hand.wrist().y,
    }
}

/// 一只手 → 三个关节的原始角度
pub fn raw_angles(hand: &HandLandmarks, config: &PipelineConfig) -> JointArray<f64> {
    JointArray::new(Joint::ALL).map(|joint| {
        map_joint(feature(hand, joint), domain(joint), config.joint(joint))
    })
}

/// 滤波后的角度加 trim 并钳位到 [0, 180]
#[inline]
pub fn finish_angle(filtered: f64, config: &JointConfig) -> f64 {
    PipelineConfig::clamp_angle(filtered + f64::from(config.trim))
}

/// 捏合检测：拇指尖与食指尖距离小于阈值时闭合
pub fn detect_gripper(hand: &HandLandmarks, pinch_threshold: f64) -> Gripper {
    if hand.pinch_distance() < pinch_threshold {
        Gripper::Closed
    } else {
        Gripper::Open
    }
}
