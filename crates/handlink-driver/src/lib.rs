//! 驱动层模块
//!
//! 手部关键点 → 机械臂命令的逐帧信号流水线：
//! - 几何特征映射（范围、反向、trim）
//! - 滑动平均滤波与指数平滑
//! - 死区门限
//! - 单发送锁存下的非阻塞发送（[`Teleop`]）
//! - 固定刷新率的帧循环与配置热更新
//!
//! # 使用场景
//!
//! ```rust
//! use handlink_driver::{PipelineConfig, PipelineState, advance};
//!
//! let mut state = PipelineState::default();
//! let config = PipelineConfig::default();
//!
//! // 没有检测到手：目标回到中立位
//! let report = advance(&mut state, &config, None);
//! assert_eq!(report.command.base, 90);
//! ```

pub mod config;
pub mod deadband;
mod error;
pub mod filter;
pub mod landmark;
pub mod mapper;
pub mod metrics;
pub mod pipeline;
pub mod replay;
pub mod runner;
pub mod smoother;
pub mod source;
pub mod state;
mod teleop;

pub use config::{ConfigParseError, JointConfig, PipelineConfig};
pub use deadband::{SENTINEL_COMMAND, should_emit};
pub use error::DriverError;
pub use filter::{FilterBank, FilterWindow};
pub use landmark::{HandLandmarks, LANDMARK_COUNT, Landmark, PoseSource};
pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use pipeline::{FrameReport, advance};
pub use replay::ReplaySource;
pub use runner::{LoopConfig, LoopSummary, StopReason, run_loop};
pub use source::{ConfigSource, SharedConfig, StaticConfig, TomlFileSource};
pub use state::*;
pub use teleop::{Dispatch, Teleop, TickOutcome};
