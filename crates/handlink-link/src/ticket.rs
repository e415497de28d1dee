//! 发送凭据与忙碌锁存
//!
//! 每次 `Session::send` 返回一个 [`SendTicket`]，帧循环在后续帧中轮询它，
//! 不阻塞当前帧。会话内部用 [`BusyLatch`] 保证同一时刻最多一个未完成的发送。

use crate::SendError;
use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// 忙碌锁存
///
/// `try_acquire()` 成功后返回 [`LatchGuard`]，guard 释放（drop）时锁存自动复位。
#[derive(Debug, Clone, Default)]
pub struct BusyLatch {
    flag: Arc<AtomicBool>,
}

impl BusyLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// 是否有未完成的发送
    pub fn is_busy(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// 尝试占用锁存，已被占用时返回 None
    pub fn try_acquire(&self) -> Option<LatchGuard> {
        self.flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| LatchGuard {
                flag: Arc::clone(&self.flag),
            })
    }
}

/// 锁存占用凭据，drop 时释放
#[derive(Debug)]
pub struct LatchGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for LatchGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// 发送完成端（由传输实现持有）
///
/// 调用 [`Completer::complete`] 先释放锁存再投递结果，
/// 因此帧循环观察到结果时会话一定已经空闲。
/// 未调用 `complete` 就被 drop 时，对应凭据得到 [`SendError::Abandoned`]。
#[derive(Debug)]
pub struct Completer {
    tx: Sender<Result<(), SendError>>,
    guard: Option<LatchGuard>,
}

impl Completer {
    /// 投递发送结果
    pub fn complete(self, result: Result<(), SendError>) {
        let Completer { tx, guard } = self;
        drop(guard);
        // 凭据可能已被丢弃，结果无人关心
        let _ = tx.send(result);
    }
}

/// 发送凭据（一次写入的完成句柄）
#[derive(Debug)]
pub struct SendTicket {
    rx: Receiver<Result<(), SendError>>,
}

impl SendTicket {
    /// 创建一对未完成的凭据与完成端
    ///
    /// `guard` 为会话忙碌锁存的占用凭据，随完成端一起释放。
    pub fn pending(guard: Option<LatchGuard>) -> (Self, Completer) {
        let (tx, rx) = bounded(1);
        (Self { rx }, Completer { tx, guard })
    }

    /// 创建已完成的凭据（同步传输使用）
    pub fn ready(result: Result<(), SendError>) -> Self {
        let (ticket, completer) = Self::pending(None);
        completer.complete(result);
        ticket
    }

    /// 非阻塞查询结果
    ///
    /// - `None`: 仍在发送中
    /// - `Some(Ok(()))`: 发送成功
    /// - `Some(Err(_))`: 发送失败或完成端被丢弃
    ///
    /// 结果只会返回一次，之后再查询得到 `Some(Err(SendError::Abandoned))`。
    pub fn try_result(&mut self) -> Option<Result<(), SendError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(SendError::Abandoned)),
        }
    }

    /// 阻塞等待结果（带超时）
    pub fn wait_timeout(self, timeout: Duration) -> Result<(), SendError> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => Err(SendError::Timeout),
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => Err(SendError::Abandoned),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latch_acquire_release() {
        let latch = BusyLatch::new();
        assert!(!latch.is_busy());

        let guard = latch.try_acquire().expect("latch should be free");
        assert!(latch.is_busy());
        assert!(latch.try_acquire().is_none(), "second acquire must fail");

        drop(guard);
        assert!(!latch.is_busy());
        assert!(latch.try_acquire().is_some());
    }

    #[test]
    fn test_ready_ticket() {
        let mut ticket = SendTicket::ready(Ok(()));
        assert!(matches!(ticket.try_result(), Some(Ok(()))));
    }

    #[test]
    fn test_pending_ticket_completes() {
        let latch = BusyLatch::new();
        let (mut ticket, completer) = SendTicket::pending(latch.try_acquire());
        assert!(ticket.try_result().is_none());
        assert!(latch.is_busy());

        completer.complete(Err(SendError::Rejected("nack".into())));
        assert!(!latch.is_busy());
        assert!(matches!(ticket.try_result(), Some(Err(SendError::Rejected(_)))));
    }

    #[test]
    fn test_dropped_completer_abandons_ticket() {
        let latch = BusyLatch::new();
        let (mut ticket, completer) = SendTicket::pending(latch.try_acquire());
        drop(completer);
        assert!(!latch.is_busy());
        assert!(matches!(ticket.try_result(), Some(Err(SendError::Abandoned))));
    }

    #[test]
    fn test_wait_timeout() {
        let (ticket, _completer) = SendTicket::pending(None);
        let result = ticket.wait_timeout(Duration::from_millis(5));
        assert!(matches!(result, Err(SendError::Timeout)));
    }
}
