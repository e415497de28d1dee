//! 流水线配置
//!
//! 每帧开始时读取一次，帧内不可变，帧间可以热更新。
//!
//! 配置文件为 TOML，按键单独解析：缺失、类型错误或越界的值回退到默认值并记录警告，
//! 不会让整帧失败。
//!
//! ```toml
//! smoothing = 0.1
//! filter_window = 3
//! deadband = 1.5
//! pinch_threshold = 0.05
//!
//! [base]
//! min = 0
//! max = 180
//! reversed = true
//! trim = 0
//! ```

use crate::DriverError;
use crate::state::{ANGLE_MAX, ANGLE_MIN, Joint};
use serde::Serialize;
use thiserror::Error;
use toml::{Table, Value};
use tracing::warn;

/// 默认平滑系数
pub const DEFAULT_SMOOTHING: f64 = 0.1;
/// 默认滤波窗口大小
pub const DEFAULT_FILTER_WINDOW: usize = 3;
/// 滤波窗口上限
pub const MAX_FILTER_WINDOW: usize = 64;
/// 默认死区阈值（度）
pub const DEFAULT_DEADBAND: f64 = 1.5;
/// 默认捏合阈值（归一化距离）
pub const DEFAULT_PINCH_THRESHOLD: f64 = 0.05;

/// 单关节配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JointConfig {
    /// 映射下限（度）
    pub min: f64,
    /// 映射上限（度）
    pub max: f64,
    /// 反向映射
    pub reversed: bool,
    /// 校准偏移（度），映射后叠加
    pub trim: i32,
}

impl JointConfig {
    pub const fn new(min: f64, max: f64, reversed: bool) -> Self {
        Self {
            min,
            max,
            reversed,
            trim: 0,
        }
    }

    /// 关节默认配置
    pub const fn default_for(joint: Joint) -> Self {
        match joint {
            Joint::Base => Self::new(0.0, 180.0, true),
            Joint::Shoulder => Self::new(20.0, 160.0, false),
            Joint::Elbow => Self::new(20.0, 160.0, true),
        }
    }

    /// 有效输出区间 `(out_min, out_max)`，反向时交换
    pub fn output_range(&self) -> (f64, f64) {
        if self.reversed {
            (self.max, self.min)
        } else {
            (self.min, self.max)
        }
    }

    /// `min <= max` 且均为有限值
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// 流水线配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PipelineConfig {
    /// 指数平滑系数，取值 (0, 1]
    pub smoothing: f64,
    /// 滑动平均窗口大小，取值 1..=64
    pub filter_window: usize,
    /// 死区阈值（度），取值 >= 0
    pub deadband: f64,
    /// 捏合阈值（归一化距离），取值 > 0
    pub pinch_threshold: f64,
    pub base: JointConfig,
    pub shoulder: JointConfig,
    pub elbow: JointConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            smoothing: DEFAULT_SMOOTHING,
            filter_window: DEFAULT_FILTER_WINDOW,
            deadband: DEFAULT_DEADBAND,
            pinch_threshold: DEFAULT_PINCH_THRESHOLD,
            base: JointConfig::default_for(Joint::Base),
            shoulder: JointConfig::default_for(Joint::Shoulder),
            elbow: JointConfig::default_for(Joint::Elbow),
        }
    }
}

/// 配置解析问题（已用默认值替代，不会向上传播）
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{key}: {reason}")]
pub struct ConfigParseError {
    pub key: String,
    pub reason: String,
}

impl ConfigParseError {
    fn new(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl PipelineConfig {
    pub fn joint(&self, joint: Joint) -> &JointConfig {
        match joint {
            Joint::Base => &self.base,
            Joint::Shoulder => &self.shoulder,
            Joint::Elbow => &self.elbow,
        }
    }

    pub fn joint_mut(&mut self, joint: Joint) -> &mut JointConfig {
        match joint {
            Joint::Base => &mut self.base,
            Joint::Shoulder => &mut self.shoulder,
            Joint::Elbow => &mut self.elbow,
        }
    }

    /// 宽松解析 TOML 文本
    ///
    /// 返回解析后的配置以及所有被默认值替代的问题。
    /// 整个文档无法解析时返回默认配置和一条问题记录。
    pub fn from_toml_lenient(text: &str) -> (Self, Vec<ConfigParseError>) {
        match text.parse::<Table>() {
            Ok(table) => Self::from_table(&table),
            Err(e) => (
                Self::default(),
                vec![ConfigParseError::new("<document>", e.to_string())],
            ),
        }
    }

    /// 从 TOML 表逐键解析
    pub fn from_table(table: &Table) -> (Self, Vec<ConfigParseError>) {
        let mut config = Self::default();
        let mut issues = Vec::new();

        for joint in Joint::ALL {
            if let Some(value) = table.get(joint.name()) {
                *config.joint_mut(joint) = parse_joint(joint, value, &mut issues);
            }
        }

        if let Some(value) = table.get("smoothing") {
            config.smoothing = parse_f64(value)
                .filter(|a| *a > 0.0 && *a <= 1.0)
                .unwrap_or_else(|| {
                    issues.push(invalid("smoothing", value, "expected a number in (0, 1]"));
                    DEFAULT_SMOOTHING
                });
        }

        if let Some(value) = table.get("filter_window") {
            config.filter_window = parse_f64(value)
                .filter(|n| n.fract() == 0.0 && *n >= 1.0 && *n <= MAX_FILTER_WINDOW as f64)
                .map(|n| n as usize)
                .unwrap_or_else(|| {
                    issues.push(invalid(
                        "filter_window",
                        value,
                        "expected an integer in 1..=64",
                    ));
                    DEFAULT_FILTER_WINDOW
                });
        }

        if let Some(value) = table.get("deadband") {
            config.deadband = parse_f64(value)
                .filter(|d| *d >= 0.0)
                .unwrap_or_else(|| {
                    issues.push(invalid("deadband", value, "expected a number >= 0"));
                    DEFAULT_DEADBAND
                });
        }

        if let Some(value) = table.get("pinch_threshold") {
            config.pinch_threshold = parse_f64(value)
                .filter(|p| *p > 0.0)
                .unwrap_or_else(|| {
                    issues.push(invalid("pinch_threshold", value, "expected a number > 0"));
                    DEFAULT_PINCH_THRESHOLD
                });
        }

        for key in table.keys() {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                issues.push(ConfigParseError::new(key.as_str(), "unknown key, ignored"));
            }
        }

        for issue in &issues {
            warn!("Config fallback to default: {}", issue);
        }

        (config, issues)
    }

    /// 序列化为 TOML 文本
    pub fn to_toml_string(&self) -> Result<String, DriverError> {
        toml::to_string_pretty(self).map_err(|e| DriverError::Config(e.to_string()))
    }

    /// 全局角度区间内的钳位
    pub fn clamp_angle(angle: f64) -> f64 {
        angle.clamp(ANGLE_MIN, ANGLE_MAX)
    }
}

const KNOWN_KEYS: [&str; 7] = [
    "base",
    "shoulder",
    "elbow",
    "smoothing",
    "filter_window",
    "deadband",
    "pinch_threshold",
];

fn invalid(key: &str, value: &Value, expected: &str) -> ConfigParseError {
    ConfigParseError::new(key, format!("{} (got {})", expected, value))
}

/// 数值解析：整数、浮点数或数字字符串，只接受有限值
fn parse_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Integer(i) => *i as f64,
        Value::Float(f) => *f,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

fn parse_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Boolean(b) => Some(*b),
        Value::Integer(0) => Some(false),
        Value::Integer(1) => Some(true),
        Value::String(s) => s.trim().parse::<bool>().ok(),
        _ => None,
    }
}

fn parse_joint(joint: Joint, value: &Value, issues: &mut Vec<ConfigParseError>) -> JointConfig {
    let default = JointConfig::default_for(joint);
    let Some(table) = value.as_table() else {
        issues.push(invalid(joint.name(), value, "expected a table"));
        return default;
    };

    let key = |field: &str| format!("{}.{}", joint.name(), field);
    let mut config = default;

    if let Some(v) = table.get("min") {
        config.min = parse_f64(v).unwrap_or_else(|| {
            issues.push(invalid(&key("min"), v, "expected a number"));
            default.min
        });
    }
    if let Some(v) = table.get("max") {
        config.max = parse_f64(v).unwrap_or_else(|| {
            issues.push(invalid(&key("max"), v, "expected a number"));
            default.max
        });
    }
    if let Some(v) = table.get("reversed") {
        config.reversed = parse_bool(v).unwrap_or_else(|| {
            issues.push(invalid(&key("reversed"), v, "expected a boolean"));
            default.reversed
        });
    }
    if let Some(v) = table.get("trim") {
        // 小数部分截断
        config.trim = parse_f64(v)
            .filter(|t| t.abs() <= ANGLE_MAX)
            .map(|t| t.trunc() as i32)
            .unwrap_or_else(|| {
                issues.push(invalid(&key("trim"), v, "expected an integer in -180..=180"));
                default.trim
            });
    }

    if !config.is_valid() {
        issues.push(ConfigParseError::new(
            joint.name(),
            format!("min {} > max {}, joint reset to defaults", config.min, config.max),
        ));
        return default;
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.base, JointConfig::new(0.0, 180.0, true));
        assert_eq!(config.shoulder, JointConfig::new(20.0, 160.0, false));
        assert_eq!(config.elbow, JointConfig::new(20.0, 160.0, true));
        assert_eq!(config.smoothing, 0.1);
        assert_eq!(config.filter_window, 3);
        assert_eq!(config.deadband, 1.5);
        assert_eq!(config.pinch_threshold, 0.05);
    }

    #[test]
    fn test_output_range_swaps_when_reversed() {
        let mut joint = JointConfig::new(20.0, 160.0, false);
        assert_eq!(joint.output_range(), (20.0, 160.0));
        joint.reversed = true;
        assert_eq!(joint.output_range(), (160.0, 20.0));
    }

    #[test]
    fn test_parse_full_document() {
        let text = r#"
            smoothing = 0.25
            filter_window = 5
            deadband = 2
            pinch_threshold = 0.04

            [base]
            min = 10
            max = 170
            reversed = false
            trim = -5

            [elbow]
            trim = 3
        "#;
        let (config, issues) = PipelineConfig::from_toml_lenient(text);
        assert!(issues.is_empty(), "unexpected issues: {:?}", issues);
        assert_eq!(config.smoothing, 0.25);
        assert_eq!(config.filter_window, 5);
        assert_eq!(config.deadband, 2.0);
        assert_eq!(config.pinch_threshold, 0.04);
        assert_eq!(
            config.base,
            JointConfig {
                min: 10.0,
                max: 170.0,
                reversed: false,
                trim: -5
            }
        );
        assert_eq!(config.elbow.trim, 3);
        assert_eq!(config.shoulder, JointConfig::default_for(Joint::Shoulder));
    }

    #[test]
    fn test_invalid_values_fall_back_per_key() {
        let text = r#"
            smoothing = "fast"
            filter_window = 0
            deadband = -1.0
            pinch_threshold = 0.06

            [shoulder]
            trim = "abc"
            min = 30
        "#;
        let (config, issues) = PipelineConfig::from_toml_lenient(text);
        assert_eq!(config.smoothing, DEFAULT_SMOOTHING);
        assert_eq!(config.filter_window, DEFAULT_FILTER_WINDOW);
        assert_eq!(config.deadband, DEFAULT_DEADBAND);
        // 合法的键保留
        assert_eq!(config.pinch_threshold, 0.06);
        assert_eq!(config.shoulder.min, 30.0);
        assert_eq!(config.shoulder.trim, 0);

        let keys: Vec<_> = issues.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["shoulder.trim", "smoothing", "filter_window", "deadband"]
        );
    }

    #[test]
    fn test_fractional_filter_window_rejected() {
        let (config, issues) = PipelineConfig::from_toml_lenient("filter_window = 3.5");
        assert_eq!(config.filter_window, DEFAULT_FILTER_WINDOW);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].key, "filter_window");

        let (config, issues) = PipelineConfig::from_toml_lenient("filter_window = 5.0");
        assert!(issues.is_empty(), "{:?}", issues);
        assert_eq!(config.filter_window, 5);
    }

    #[test]
    fn test_trim_accepts_strings_and_truncates() {
        let (config, issues) = PipelineConfig::from_toml_lenient(
            r#"
            [base]
            trim = "7"
            [shoulder]
            trim = -3.9
            "#,
        );
        assert!(issues.is_empty());
        assert_eq!(config.base.trim, 7);
        assert_eq!(config.shoulder.trim, -3);
    }

    #[test]
    fn test_inverted_limits_reset_joint() {
        let (config, issues) = PipelineConfig::from_toml_lenient(
            r#"
            [elbow]
            min = 150
            max = 30
            "#,
        );
        assert_eq!(config.elbow, JointConfig::default_for(Joint::Elbow));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].key, "elbow");
    }

    #[test]
    fn test_malformed_document_uses_defaults() {
        let (config, issues) = PipelineConfig::from_toml_lenient("smoothing = = 3");
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].key, "<document>");
    }

    #[test]
    fn test_unknown_key_reported() {
        let (_, issues) = PipelineConfig::from_toml_lenient("speed = 3");
        assert_eq!(issues[0].key, "speed");
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = PipelineConfig::default();
        config.base.trim = 4;
        config.filter_window = 7;
        let text = config.to_toml_string().unwrap();
        let (parsed, issues) = PipelineConfig::from_toml_lenient(&text);
        assert!(issues.is_empty(), "{:?}", issues);
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_clamp_angle() {
        assert_eq!(PipelineConfig::clamp_angle(-10.0), 0.0);
        assert_eq!(PipelineConfig::clamp_angle(200.0), 180.0);
        assert_eq!(PipelineConfig::clamp_angle(45.0), 45.0);
    }
}
