//! Mock 传输（无硬件依赖）
//!
//! 测试通过 [`MockHandle`] 脚本化每次发送的结果、注入连接失败和意外断开，
//! 并检查实际投递的报文。

use crate::{
    BusyLatch, ConnectError, DeviceSelector, LinkEvent, SendError, SendTicket, Session, Transport,
    ticket::Completer,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// 单次发送的脚本结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockOutcome {
    /// 立即成功（默认）
    #[default]
    Succeed,
    /// 立即失败
    Fail,
    /// 保持未完成，直到 [`MockHandle::complete_held`]
    Hold,
}

#[derive(Debug, Default)]
struct MockInner {
    connected: bool,
    connect_failure: Option<String>,
    outcomes: VecDeque<MockOutcome>,
    events: VecDeque<LinkEvent>,
    attempted: Vec<Vec<u8>>,
    delivered: Vec<Vec<u8>>,
    dropped_busy: usize,
    held: Option<(Vec<u8>, Completer)>,
}

/// Mock 传输的控制句柄（可克隆，与会话共享状态）
#[derive(Debug, Clone, Default)]
pub struct MockHandle {
    inner: Arc<Mutex<MockInner>>,
}

impl MockHandle {
    /// 追加一次发送的脚本结果；脚本耗尽后默认成功
    pub fn push_outcome(&self, outcome: MockOutcome) {
        self.inner.lock().outcomes.push_back(outcome);
    }

    /// 下一次连接失败
    pub fn fail_next_connect(&self, reason: impl Into<String>) {
        self.inner.lock().connect_failure = Some(reason.into());
    }

    /// 模拟意外断开
    pub fn drop_connection(&self, reason: impl Into<String>) {
        let mut inner = self.inner.lock();
        inner.connected = false;
        inner.events.push_back(LinkEvent::Disconnected {
            reason: reason.into(),
        });
    }

    /// 完成被保持的发送；没有保持中的发送时返回 false
    pub fn complete_held(&self, result: Result<(), SendError>) -> bool {
        let held = self.inner.lock().held.take();
        match held {
            Some((bytes, completer)) => {
                if result.is_ok() {
                    self.inner.lock().delivered.push(bytes);
                }
                completer.complete(result);
                true
            },
            None => false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.inner.lock().connected
    }

    /// 所有发送尝试（不含因忙碌被丢弃的调用）
    pub fn attempted(&self) -> Vec<Vec<u8>> {
        self.inner.lock().attempted.clone()
    }

    /// 成功投递的报文
    pub fn delivered(&self) -> Vec<Vec<u8>> {
        self.inner.lock().delivered.clone()
    }

    /// 因忙碌被丢弃的调用次数
    pub fn dropped_busy(&self) -> usize {
        self.inner.lock().dropped_busy
    }
}

/// Mock 传输
#[derive(Debug)]
pub struct MockTransport {
    name: String,
    handle: MockHandle,
}

impl MockTransport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handle: MockHandle::default(),
        }
    }

    /// 获取控制句柄
    pub fn handle(&self) -> MockHandle {
        self.handle.clone()
    }
}

impl Transport for MockTransport {
    type Session = MockSession;

    fn connect(&mut self, _selector: &DeviceSelector) -> Result<MockSession, ConnectError> {
        let mut inner = self.handle.inner.lock();
        if let Some(reason) = inner.connect_failure.take() {
            return Err(ConnectError::Rejected(reason));
        }
        inner.connected = true;
        Ok(MockSession {
            name: self.name.clone(),
            handle: self.handle.clone(),
            latch: BusyLatch::new(),
        })
    }
}

/// Mock 会话
#[derive(Debug)]
pub struct MockSession {
    name: String,
    handle: MockHandle,
    latch: BusyLatch,
}

impl Session for MockSession {
    fn send(&mut self, bytes: &[u8]) -> Result<SendTicket, SendError> {
        let mut inner = self.handle.inner.lock();
        if !inner.connected {
            return Err(SendError::NotConnected);
        }
        let Some(guard) = self.latch.try_acquire() else {
            inner.dropped_busy += 1;
            return Err(SendError::Busy);
        };

        inner.attempted.push(bytes.to_vec());
        let (ticket, completer) = SendTicket::pending(Some(guard));
        match inner.outcomes.pop_front().unwrap_or_default() {
            MockOutcome::Succeed => {
                inner.delivered.push(bytes.to_vec());
                completer.complete(Ok(()));
            },
            MockOutcome::Fail => {
                completer.complete(Err(SendError::Rejected("mock write failure".into())));
            },
            MockOutcome::Hold => {
                inner.held = Some((bytes.to_vec(), completer));
            },
        }
        Ok(ticket)
    }

    fn is_busy(&self) -> bool {
        self.latch.is_busy()
    }

    fn poll_event(&mut self) -> Option<LinkEvent> {
        self.handle.inner.lock().events.pop_front()
    }

    fn disconnect(&mut self) {
        self.handle.inner.lock().connected = false;
    }

    fn device_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected() -> (MockSession, MockHandle) {
        let mut transport = MockTransport::new("mock");
        let handle = transport.handle();
        let session = transport.connect(&DeviceSelector::default()).unwrap();
        (session, handle)
    }

    #[test]
    fn test_scripted_outcomes() {
        let (mut session, handle) = connected();
        handle.push_outcome(MockOutcome::Fail);

        let mut first = session.send(b"a").unwrap();
        assert!(matches!(first.try_result(), Some(Err(SendError::Rejected(_)))));

        let mut second = session.send(b"b").unwrap();
        assert!(matches!(second.try_result(), Some(Ok(()))));

        assert_eq!(handle.attempted(), vec![b"a".to_vec(), b"b".to_vec()]);
        assert_eq!(handle.delivered(), vec![b"b".to_vec()]);
    }

    #[test]
    fn test_send_after_drop_connection() {
        let (mut session, handle) = connected();
        handle.drop_connection("lost");
        assert!(matches!(session.send(b"a"), Err(SendError::NotConnected)));
        assert!(matches!(
            session.poll_event(),
            Some(LinkEvent::Disconnected { .. })
        ));
    }

    #[test]
    fn test_complete_held_without_pending() {
        let (_session, handle) = connected();
        assert!(!handle.complete_held(Ok(())));
    }
}
