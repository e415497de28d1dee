//! 驱动层错误类型定义

use handlink_link::ConnectError;
use thiserror::Error;

/// 驱动层错误类型
///
/// 只有连接失败、配置错误和帧循环参数错误会走到这里；
/// 单帧内的编码或发送失败只记录日志，不会变成 `DriverError`。
#[derive(Error, Debug)]
pub enum DriverError {
    /// 连接错误
    #[error("Connect error: {0}")]
    Connect(#[from] ConnectError),

    /// 关键点数量不对
    #[error("Invalid landmarks: expected {expected} points, got {actual}")]
    InvalidLandmarks { expected: usize, actual: usize },

    /// 录制文件格式错误
    #[error("Invalid recording at line {line}: {reason}")]
    Replay { line: usize, reason: String },

    /// 配置错误
    #[error("Config error: {0}")]
    Config(String),

    /// 帧循环参数错误
    #[error("Invalid loop config: {0}")]
    InvalidLoopConfig(String),

    /// 文件读写错误
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
}
