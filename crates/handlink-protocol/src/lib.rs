//! # Handlink Protocol
//!
//! 控制板命令报文定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `constants`: 报文格式与设备寻址常量
//! - `packet`: 命令报文编码/解码
//!
//! ## 报文格式
//!
//! ```text
//! "B" ddd "S" ddd "E" ddd "G" ddd "\r\n"
//! ```
//!
//! 每个 `ddd` 为 3 位零填充十进制数，总长度固定 18 字节。

pub mod constants;
pub mod packet;

// 重新导出常用类型
pub use constants::*;
pub use packet::*;

use thiserror::Error;

/// 协议编解码错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Value {value} for field {field} does not fit in 3 digits")]
    FieldOutOfRange { field: char, value: i32 },

    #[error("Invalid packet length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Unexpected tag at byte {position}: expected '{expected}', found 0x{found:02X}")]
    UnexpectedTag {
        position: usize,
        expected: char,
        found: u8,
    },

    #[error("Invalid digit 0x{byte:02X} in field {field}")]
    InvalidDigit { field: char, byte: u8 },

    #[error("Missing CRLF terminator")]
    MissingTerminator,
}
