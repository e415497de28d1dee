//! Handlink SDK - 手势遥操作舵机机械臂
//!
//! # 架构设计
//!
//! 从底层到高层：
//!
//! - **协议层** (`protocol`): 命令报文编码/解码
//! - **链路层** (`link`): 传输抽象、连接状态机、单发送锁存
//! - **驱动层** (`driver`): 逐帧信号流水线、帧循环、配置热更新
//!
//! # 快速开始
//!
//! ```rust
//! use handlink_sdk::prelude::*;
//!
//! let mut state = PipelineState::default();
//! let report = advance(&mut state, &PipelineConfig::default(), None);
//! assert_eq!(Packet::encode(&report.command).unwrap().payload(), "B090S090E090G000");
//! ```

pub mod prelude;

pub mod protocol {
    pub use handlink_protocol::*;
}

pub mod link {
    pub use handlink_link::*;
}

pub mod driver {
    pub use handlink_driver::*;
}

pub use handlink_driver::{
    DriverError, PipelineConfig, PipelineState, Teleop, advance, run_loop,
};
pub use handlink_link::{ConnectError, DeviceSelector, SendError};
pub use handlink_protocol::{ArmCommand, Packet, ProtocolError};

use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// 使用 `RUST_LOG` 过滤（默认 `info`），并把 `log` crate 的记录转发到 `tracing`。
/// 重复调用是安全的，只有第一次生效。
pub fn init_logger() {
    init_logger_with("info");
}

/// 以指定的默认过滤级别初始化日志（`RUST_LOG` 优先）
pub fn init_logger_with(default_directive: &str) {
    let _ = tracing_log::LogTracer::init();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
