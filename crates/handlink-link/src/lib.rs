//! # Handlink Link Layer
//!
//! 命令链路抽象层：把已编码的报文字节送到远端控制板。
//!
//! 物理层（BLE GATT、串口、UDP……）由 [`Transport`] 实现负责；
//! 本 crate 只规定会话契约：
//!
//! - 连接状态机：`Disconnected → Connecting → Connected`，任何失败或断开回到 `Disconnected`
//! - 单发送锁存：同一时刻最多一个未完成的发送，忙碌时的调用被丢弃而不是排队
//! - 发送结果通过 [`SendTicket`] 异步返回，调用方不阻塞
//! - 意外断开通过 [`LinkEvent`] 通知

use std::fmt;
use thiserror::Error;

mod link;
pub mod state;
pub mod ticket;
pub mod udp;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use link::Link;
pub use state::{AtomicLinkState, LinkState};
pub use ticket::{BusyLatch, Completer, LatchGuard, SendTicket};
pub use udp::{UdpSession, UdpTransport};

/// 连接错误（需要上报给操作者，显式重试）
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No device matches {0}")]
    NotFound(String),
    #[error("Invalid device address: {0}")]
    InvalidAddress(String),
    #[error("Connection timeout")]
    Timeout,
    #[error("Connection rejected: {0}")]
    Rejected(String),
}

/// 发送错误（只在本地记录诊断日志，不向帧循环传播）
#[derive(Error, Debug)]
pub enum SendError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Link not connected")]
    NotConnected,
    #[error("Another send is still in flight")]
    Busy,
    #[error("Send rejected: {0}")]
    Rejected(String),
    #[error("Send timeout")]
    Timeout,
    #[error("Send abandoned before completion")]
    Abandoned,
}

/// 目标设备选择器
///
/// 设备标识与服务/特征寻址都是配置常量，不属于核心逻辑。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSelector {
    /// 设备名前缀
    pub name_prefix: String,
    /// 服务 UUID
    pub service_uuid: String,
    /// 写入特征 UUID
    pub characteristic_uuid: String,
    /// 传输层地址（如 UDP 的 `host:port`），由具体传输解释
    pub address: Option<String>,
}

impl DeviceSelector {
    /// 使用默认服务寻址，指定传输层地址
    pub fn with_address(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            ..Self::default()
        }
    }
}

impl Default for DeviceSelector {
    fn default() -> Self {
        Self {
            name_prefix: handlink_protocol::DEVICE_NAME_PREFIX.to_string(),
            service_uuid: handlink_protocol::UART_SERVICE_UUID.to_string(),
            characteristic_uuid: handlink_protocol::UART_RX_CHARACTERISTIC_UUID.to_string(),
            address: None,
        }
    }
}

impl fmt::Display for DeviceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.address {
            Some(address) => write!(f, "{}* @ {}", self.name_prefix, address),
            None => write!(f, "{}*", self.name_prefix),
        }
    }
}

/// 会话事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// 远端或底层链路意外断开
    Disconnected { reason: String },
}

/// 已建立的传输会话
pub trait Session {
    /// 发送一帧报文
    ///
    /// 立即返回；结果通过 [`SendTicket`] 获取。
    /// 已有未完成的发送时返回 [`SendError::Busy`]，本次调用被丢弃。
    fn send(&mut self, bytes: &[u8]) -> Result<SendTicket, SendError>;

    /// 是否有未完成的发送
    fn is_busy(&self) -> bool;

    /// 取出一个待处理的会话事件（非阻塞）
    fn poll_event(&mut self) -> Option<LinkEvent>;

    /// 主动断开；不取消已在途的发送
    fn disconnect(&mut self);

    /// 设备名称（用于状态显示）
    fn device_name(&self) -> &str;
}

/// 传输实现
pub trait Transport {
    type Session: Session;

    /// 按选择器连接设备
    fn connect(&mut self, selector: &DeviceSelector) -> Result<Self::Session, ConnectError>;
}
