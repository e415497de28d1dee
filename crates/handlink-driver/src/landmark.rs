//! 手部关键点
//!
//! 检测器每帧输出 0 或 1 只手，每只手 21 个按语义固定索引排列的关键点，
//! 坐标归一化到图像尺寸（0.0..=1.0）。流水线只用到其中 4 个。

use crate::DriverError;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// 每只手的关键点数量
pub const LANDMARK_COUNT: usize = 21;

/// 手腕
pub const WRIST: usize = 0;
/// 拇指指尖
pub const THUMB_TIP: usize = 4;
/// 食指指尖
pub const INDEX_TIP: usize = 8;
/// 中指掌指关节（掌根参考点）
pub const MIDDLE_MCP: usize = 9;

/// 单个关键点（图像归一化坐标）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Landmark {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// 图像平面内的欧氏距离（忽略 z）
    pub fn planar_distance(&self, other: &Landmark) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// 一只手的 21 个关键点
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandLandmarks {
    points: [Landmark; LANDMARK_COUNT],
}

impl HandLandmarks {
    pub const fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// 从切片构造，长度必须为 21
    pub fn from_slice(points: &[Landmark]) -> Result<Self, DriverError> {
        let points: [Landmark; LANDMARK_COUNT] =
            points.try_into().map_err(|_| DriverError::InvalidLandmarks {
                expected: LANDMARK_COUNT,
                actual: points.len(),
            })?;
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }

    pub fn wrist(&self) -> &Landmark {
        &self.points[WRIST]
    }

    /// 拇指尖与食指尖的平面距离（捏合程度）
    pub fn pinch_distance(&self) -> f64 {
        self.points[THUMB_TIP].planar_distance(&self.points[INDEX_TIP])
    }

    /// 手腕与掌根的平面距离（手到相机深度的代理量）
    pub fn palm_size(&self) -> f64 {
        self.points[WRIST].planar_distance(&self.points[MIDDLE_MCP])
    }

    /// 流水线用到的关键点是否都是有限值
    pub fn is_finite(&self) -> bool {
        [WRIST, THUMB_TIP, INDEX_TIP, MIDDLE_MCP]
            .iter()
            .all(|&i| self.points[i].is_finite())
    }
}

impl Index<usize> for HandLandmarks {
    type Output = Landmark;

    fn index(&self, index: usize) -> &Landmark {
        &self.points[index]
    }
}

impl Serialize for HandLandmarks {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.points.as_slice().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for HandLandmarks {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let points = Vec::<Landmark>::deserialize(deserializer)?;
        HandLandmarks::from_slice(&points).map_err(serde::de::Error::custom)
    }
}

/// 手部姿态来源（外部检测器）
///
/// 每帧调用一次 `detect()`；没有检测到手时返回 `None`。
pub trait PoseSource {
    fn detect(&mut self) -> Option<HandLandmarks>;

    /// 来源是否已经结束（录制回放到末尾等）
    fn is_exhausted(&self) -> bool {
        false
    }
}
