//! 链路管理器
//!
//! 持有传输实现与当前会话，维护连接状态机。

use crate::{
    AtomicLinkState, ConnectError, DeviceSelector, LinkEvent, LinkState, SendError, SendTicket,
    Session, Transport,
};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tracing::{debug, info, warn};

/// 链路管理器
///
/// 帧循环通过它发送报文；连接/断开由操作者显式触发。
/// 状态以 [`AtomicLinkState`] 发布，其他线程可以通过 [`Link::state_handle`] 只读观察。
pub struct Link<T: Transport> {
    transport: T,
    session: Option<T::Session>,
    state: Arc<AtomicLinkState>,
}

impl<T: Transport> Link<T> {
    /// 创建未连接的链路
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            session: None,
            state: Arc::new(AtomicLinkState::new(LinkState::Disconnected)),
        }
    }

    /// 连接设备
    ///
    /// 已连接时先断开旧会话。失败后状态回到 `Disconnected`，错误原样返回给调用方。
    pub fn connect(&mut self, selector: &DeviceSelector) -> Result<(), ConnectError> {
        if self.session.is_some() {
            self.disconnect();
        }

        self.state.set(LinkState::Connecting, Ordering::Release);
        debug!("Connecting to {}", selector);

        match self.transport.connect(selector) {
            Ok(session) => {
                info!("Link connected: {}", session.device_name());
                self.session = Some(session);
                self.state.set(LinkState::Connected, Ordering::Release);
                Ok(())
            },
            Err(e) => {
                warn!("Link connect to {} failed: {}", selector, e);
                self.state.set(LinkState::Disconnected, Ordering::Release);
                Err(e)
            },
        }
    }

    /// 主动断开
    pub fn disconnect(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.disconnect();
            info!("Link disconnected: {}", session.device_name());
        }
        self.state.set(LinkState::Disconnected, Ordering::Release);
    }

    /// 处理会话事件
    ///
    /// 意外断开时丢弃会话并回到 `Disconnected`，返回该事件供调用方显示。
    pub fn poll_events(&mut self) -> Option<LinkEvent> {
        let event = self.session.as_mut()?.poll_event()?;
        match &event {
            LinkEvent::Disconnected { reason } => {
                warn!("Link lost: {}", reason);
                self.session = None;
                self.state.set(LinkState::Disconnected, Ordering::Release);
            },
        }
        Some(event)
    }

    /// 发送报文
    ///
    /// 未连接时返回 [`SendError::NotConnected`]，忙碌时返回 [`SendError::Busy`]。
    pub fn send(&mut self, bytes: &[u8]) -> Result<SendTicket, SendError> {
        match self.session.as_mut() {
            Some(session) => session.send(bytes),
            None => Err(SendError::NotConnected),
        }
    }

    /// 当前状态
    pub fn state(&self) -> LinkState {
        self.state.get(Ordering::Acquire)
    }

    /// 共享状态句柄
    pub fn state_handle(&self) -> Arc<AtomicLinkState> {
        Arc::clone(&self.state)
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// 会话是否有未完成的发送
    pub fn is_busy(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_busy())
    }

    /// 已连接设备名
    pub fn device_name(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.device_name())
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

impl<T: Transport> Drop for Link<T> {
    fn drop(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.disconnect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockOutcome, MockTransport};

    #[test]
    fn test_connect_and_disconnect() {
        let transport = MockTransport::new("mock-arm");
        let handle = transport.handle();
        let mut link = Link::new(transport);
        assert_eq!(link.state(), LinkState::Disconnected);

        link.connect(&DeviceSelector::default()).unwrap();
        assert_eq!(link.state(), LinkState::Connected);
        assert_eq!(link.device_name(), Some("mock-arm"));
        assert!(handle.is_connected());

        link.disconnect();
        assert_eq!(link.state(), LinkState::Disconnected);
        assert!(!handle.is_connected());
        assert!(matches!(link.send(b"x"), Err(SendError::NotConnected)));
    }

    #[test]
    fn test_connect_failure_returns_to_disconnected() {
        let transport = MockTransport::new("mock-arm");
        let handle = transport.handle();
        handle.fail_next_connect("out of range");
        let mut link = Link::new(transport);

        let err = link.connect(&DeviceSelector::default()).unwrap_err();
        assert!(matches!(err, ConnectError::Rejected(_)));
        assert_eq!(link.state(), LinkState::Disconnected);

        // 显式重试成功
        link.connect(&DeviceSelector::default()).unwrap();
        assert!(link.is_connected());
    }

    #[test]
    fn test_involuntary_disconnect() {
        let transport = MockTransport::new("mock-arm");
        let handle = transport.handle();
        let mut link = Link::new(transport);
        link.connect(&DeviceSelector::default()).unwrap();

        assert!(link.poll_events().is_none());
        handle.drop_connection("gatt server disconnected");

        let event = link.poll_events().expect("event expected");
        assert_eq!(
            event,
            LinkEvent::Disconnected {
                reason: "gatt server disconnected".into()
            }
        );
        assert_eq!(link.state(), LinkState::Disconnected);
        assert!(matches!(link.send(b"x"), Err(SendError::NotConnected)));
    }

    #[test]
    fn test_busy_while_in_flight() {
        let transport = MockTransport::new("mock-arm");
        let handle = transport.handle();
        handle.push_outcome(MockOutcome::Hold);
        let mut link = Link::new(transport);
        link.connect(&DeviceSelector::default()).unwrap();

        let mut ticket = link.send(b"first").unwrap();
        assert!(link.is_busy());
        assert!(matches!(link.send(b"second"), Err(SendError::Busy)));
        assert_eq!(handle.dropped_busy(), 1);

        assert!(handle.complete_held(Ok(())));
        assert!(matches!(ticket.try_result(), Some(Ok(()))));
        assert!(!link.is_busy());
        assert_eq!(handle.delivered(), vec![b"first".to_vec()]);
    }

    #[test]
    fn test_state_handle_is_shared() {
        let mut link = Link::new(MockTransport::new("mock-arm"));
        let observer = link.state_handle();
        link.connect(&DeviceSelector::default()).unwrap();
        assert_eq!(observer.get(Ordering::Acquire), LinkState::Connected);
    }
}
