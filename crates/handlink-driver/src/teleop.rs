//! 遥操作驱动
//!
//! [`Teleop`] 持有流水线状态与链路，每帧调用一次 [`Teleop::tick`]：
//!
//! 1. 处理链路事件（意外断开）
//! 2. 回收上一帧发出的发送结果：成功才更新 `last_sent`，失败只记录日志
//! 3. 推进流水线（映射、滤波、平滑）
//! 4. 链路已连接且空闲时，经过死区判断后编码并发送
//!
//! 发送不会阻塞帧循环：[`SendTicket`] 留到下一帧再查询。

use crate::DriverError;
use crate::config::PipelineConfig;
use crate::deadband::should_emit;
use crate::landmark::HandLandmarks;
use crate::metrics::PipelineMetrics;
use crate::pipeline::{FrameReport, advance};
use crate::state::PipelineState;
use handlink_link::{DeviceSelector, Link, LinkEvent, LinkState, SendError, SendTicket, Transport};
use handlink_protocol::{ArmCommand, Packet};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// 本帧的发送结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// 已发出报文（结果可能在下一帧才确认）
    Sent(Packet),
    /// 变化低于死区阈值
    Suppressed,
    /// 上一次发送仍未完成，本帧丢弃
    Busy,
    /// 链路未连接
    Offline,
    /// 发送被拒绝或立即失败
    Failed,
    /// 命令超出报文字段范围
    EncodeError,
}

/// 单帧输出
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub report: FrameReport,
    pub dispatch: Dispatch,
    /// 本帧检测到的链路事件
    pub event: Option<LinkEvent>,
}

struct InFlight {
    ticket: SendTicket,
    command: ArmCommand,
}

/// 遥操作驱动
pub struct Teleop<T: Transport> {
    state: PipelineState,
    link: Link<T>,
    in_flight: Option<InFlight>,
    metrics: Arc<PipelineMetrics>,
    last_packet: Option<Packet>,
}

impl<T: Transport> Teleop<T> {
    pub fn new(transport: T) -> Self {
        Self::with_state(transport, PipelineState::default())
    }

    pub fn with_state(transport: T, state: PipelineState) -> Self {
        Self {
            state,
            link: Link::new(transport),
            in_flight: None,
            metrics: Arc::new(PipelineMetrics::new()),
            last_packet: None,
        }
    }

    /// 连接设备（操作者触发，失败需要显式重试）
    pub fn connect(&mut self, selector: &DeviceSelector) -> Result<(), DriverError> {
        self.in_flight = None;
        self.link.connect(selector)?;
        Ok(())
    }

    pub fn disconnect(&mut self) {
        self.in_flight = None;
        self.link.disconnect();
    }

    /// 推进一帧
    pub fn tick(&mut self, config: &PipelineConfig, hand: Option<&HandLandmarks>) -> TickOutcome {
        PipelineMetrics::incr(&self.metrics.frames_total);

        let event = self.link.poll_events();
        if event.is_some() {
            PipelineMetrics::incr(&self.metrics.disconnects);
            self.in_flight = None;
        }

        self.reap_in_flight();

        let report = advance(&mut self.state, config, hand);
        if report.hand_present {
            PipelineMetrics::incr(&self.metrics.frames_with_hand);
        } else {
            PipelineMetrics::incr(&self.metrics.signal_lost);
        }

        let dispatch = self.dispatch(report.command, config.deadband);
        trace!("dispatch: {:?}", dispatch);

        TickOutcome {
            report,
            dispatch,
            event,
        }
    }

    fn dispatch(&mut self, command: ArmCommand, deadband: f64) -> Dispatch {
        if !self.link.is_connected() {
            PipelineMetrics::incr(&self.metrics.offline_skips);
            return Dispatch::Offline;
        }
        if self.in_flight.is_some() || self.link.is_busy() {
            PipelineMetrics::incr(&self.metrics.busy_drops);
            return Dispatch::Busy;
        }
        if !should_emit(&command, &self.state.last_sent, deadband) {
            PipelineMetrics::incr(&self.metrics.suppressed);
            return Dispatch::Suppressed;
        }

        let packet = match Packet::encode(&command) {
            Ok(packet) => packet,
            Err(e) => {
                warn!("Cannot encode {:?}: {}", command, e);
                PipelineMetrics::incr(&self.metrics.encode_errors);
                return Dispatch::EncodeError;
            },
        };
        self.last_packet = Some(packet);

        match self.link.send(packet.as_bytes()) {
            Ok(ticket) => {
                PipelineMetrics::incr(&self.metrics.tx_attempts);
                self.in_flight = Some(InFlight { ticket, command });
                // 同步完成的传输本帧即可确认
                self.reap_in_flight();
                Dispatch::Sent(packet)
            },
            Err(SendError::Busy) => {
                PipelineMetrics::incr(&self.metrics.busy_drops);
                Dispatch::Busy
            },
            Err(e) => {
                debug!("Send {} failed: {}", packet, e);
                PipelineMetrics::incr(&self.metrics.tx_failures);
                Dispatch::Failed
            },
        }
    }

    /// 查询未完成的发送；成功时更新 `last_sent`
    fn reap_in_flight(&mut self) {
        let Some(in_flight) = self.in_flight.as_mut() else {
            return;
        };
        let Some(result) = in_flight.ticket.try_result() else {
            return;
        };
        let command = in_flight.command;
        self.in_flight = None;

        match result {
            Ok(()) => {
                self.state.last_sent = command;
                PipelineMetrics::incr(&self.metrics.tx_confirmed);
            },
            Err(e) => {
                debug!("Send of {:?} failed: {}", command, e);
                PipelineMetrics::incr(&self.metrics.tx_failures);
            },
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// 重置流水线状态（回到中立位，`last_sent` 回到哨兵值）
    pub fn reset(&mut self, filter_window: usize) {
        info!("Pipeline state reset");
        self.state = PipelineState::new(filter_window);
        self.in_flight = None;
    }

    pub fn link(&self) -> &Link<T> {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut Link<T> {
        &mut self.link
    }

    pub fn link_state(&self) -> LinkState {
        self.link.state()
    }

    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        Arc::clone(&self.metrics)
    }

    /// 最近一次尝试发送的报文
    pub fn last_packet(&self) -> Option<&Packet> {
        self.last_packet.as_ref()
    }

    /// 是否有未确认的发送
    pub fn has_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }
}
