//! UDP 传输
//!
//! 每帧报文作为一个 UDP 数据报发送到控制板（或其网关）。
//! 写入在后台线程完成，`send()` 立即返回 [`SendTicket`]。

use crate::{
    BusyLatch, ConnectError, DeviceSelector, LinkEvent, SendError, SendTicket, Session, Transport,
    ticket::Completer,
};
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, unbounded};
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::thread;
use tracing::{trace, warn};

/// UDP 传输
///
/// 选择器的 `address` 字段必须是 `host:port` 形式的 UDP 地址。
#[derive(Debug, Clone)]
pub struct UdpTransport {
    bind_addr: SocketAddr,
}

impl UdpTransport {
    /// 使用系统分配的本地端口
    pub fn new() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 0)),
        }
    }

    /// 指定本地绑定地址
    pub fn with_bind_addr(bind_addr: SocketAddr) -> Self {
        Self { bind_addr }
    }
}

impl Default for UdpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UdpTransport {
    type Session = UdpSession;

    fn connect(&mut self, selector: &DeviceSelector) -> Result<UdpSession, ConnectError> {
        let address = selector
            .address
            .as_deref()
            .ok_or_else(|| ConnectError::NotFound(selector.to_string()))?;
        let peer: SocketAddr = address
            .parse()
            .map_err(|e| ConnectError::InvalidAddress(format!("{}: {}", address, e)))?;

        let socket = UdpSocket::bind(self.bind_addr)?;
        socket.connect(peer)?;

        let (job_tx, job_rx) = bounded::<WriteJob>(1);
        let (event_tx, event_rx) = unbounded();
        let worker = thread::Builder::new()
            .name("handlink-udp-tx".into())
            .spawn(move || tx_loop(socket, job_rx, event_tx))?;

        Ok(UdpSession {
            name: format!("udp:{}", peer),
            jobs: Some(job_tx),
            events: event_rx,
            latch: BusyLatch::new(),
            worker: Some(worker),
        })
    }
}

struct WriteJob {
    bytes: Vec<u8>,
    completer: Completer,
}

/// 写线程主循环
///
/// 通道关闭（会话断开）或对端拒收时退出。
fn tx_loop(socket: UdpSocket, jobs: Receiver<WriteJob>, events: Sender<LinkEvent>) {
    for job in jobs.iter() {
        match socket.send(&job.bytes) {
            Ok(n) => {
                trace!("UDP TX {} bytes", n);
                job.completer.complete(Ok(()));
            },
            Err(e) if e.kind() == ErrorKind::ConnectionRefused => {
                warn!("UDP peer refused datagram: {}", e);
                job.completer.complete(Err(SendError::Io(e)));
                let _ = events.send(LinkEvent::Disconnected {
                    reason: "peer refused connection".into(),
                });
                break;
            },
            Err(e) => {
                job.completer.complete(Err(SendError::Io(e)));
            },
        }
    }
    trace!("UDP TX thread: loop exited");
}

/// UDP 会话
#[derive(Debug)]
pub struct UdpSession {
    name: String,
    jobs: Option<Sender<WriteJob>>,
    events: Receiver<LinkEvent>,
    latch: BusyLatch,
    worker: Option<thread::JoinHandle<()>>,
}

impl Session for UdpSession {
    fn send(&mut self, bytes: &[u8]) -> Result<SendTicket, SendError> {
        let jobs = self.jobs.as_ref().ok_or(SendError::NotConnected)?;
        let guard = self.latch.try_acquire().ok_or(SendError::Busy)?;

        let (ticket, completer) = SendTicket::pending(Some(guard));
        let job = WriteJob {
            bytes: bytes.to_vec(),
            completer,
        };
        match jobs.try_send(job) {
            Ok(()) => Ok(ticket),
            // job（连同锁存占用）在此被丢弃
            Err(TrySendError::Full(_)) => Err(SendError::Busy),
            Err(TrySendError::Disconnected(_)) => Err(SendError::NotConnected),
        }
    }

    fn is_busy(&self) -> bool {
        self.latch.is_busy()
    }

    fn poll_event(&mut self) -> Option<LinkEvent> {
        self.events.try_recv().ok()
    }

    fn disconnect(&mut self) {
        // 关闭通道，写线程处理完在途数据报后退出
        self.jobs = None;
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            warn!("UDP TX thread panicked");
        }
    }

    fn device_name(&self) -> &str {
        &self.name
    }
}

impl Drop for UdpSession {
    fn drop(&mut self) {
        self.disconnect();
    }
}
