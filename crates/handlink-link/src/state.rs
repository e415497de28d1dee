//! 链路状态定义
//!
//! 定义传输会话的连接状态，以及用于跨线程读取的原子版本。

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// 链路连接状态
///
/// # 状态转换
///
/// ```text
/// Disconnected ──connect()──► Connecting ──成功──► Connected
///       ▲                          │                   │
///       └──────────失败────────────┘                   │
///       └─────────disconnect() / 意外断开──────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum LinkState {
    /// 未连接（默认）
    #[default]
    Disconnected = 0,

    /// 正在连接
    Connecting = 1,

    /// 已连接，可以发送报文
    Connected = 2,
}

impl LinkState {
    /// 从 u8 转换
    ///
    /// 如果值无效，返回 Disconnected。
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Connecting,
            2 => Self::Connected,
            _ => Self::Disconnected,
        }
    }

    /// 转换为 u8
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// 是否已连接
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        };
        f.write_str(name)
    }
}

/// 链路状态（原子版本，用于线程间共享）
///
/// 帧循环是唯一的写入方；状态显示等观察者可以在其他线程读取。
#[derive(Debug, Default)]
pub struct AtomicLinkState {
    inner: AtomicU8,
}

impl AtomicLinkState {
    /// 创建新的原子状态
    pub fn new(state: LinkState) -> Self {
        Self {
            inner: AtomicU8::new(state.as_u8()),
        }
    }

    /// 获取当前状态
    pub fn get(&self, ordering: Ordering) -> LinkState {
        LinkState::from_u8(self.inner.load(ordering))
    }

    /// 设置状态
    pub fn set(&self, state: LinkState, ordering: Ordering) {
        self.inner.store(state.as_u8(), ordering);
    }

    /// 比较并交换
    ///
    /// 如果当前值等于 `current`，则设置为 `new` 并返回 true，否则返回 false。
    pub fn compare_exchange(
        &self,
        current: LinkState,
        new: LinkState,
        success: Ordering,
        failure: Ordering,
    ) -> bool {
        self.inner
            .compare_exchange(current.as_u8(), new.as_u8(), success, failure)
            .is_ok()
    }
}
