//! 帧循环指标
//!
//! 原子计数器，帧循环线程写入，任意线程读取快照。

use std::sync::atomic::{AtomicU64, Ordering};

/// 帧循环实时指标
///
/// ```rust
/// use handlink_driver::PipelineMetrics;
/// use std::sync::atomic::Ordering;
///
/// let metrics = PipelineMetrics::new();
/// metrics.frames_total.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(metrics.snapshot().frames_total, 1);
/// ```
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// 处理的总帧数
    pub frames_total: AtomicU64,

    /// 检测到手部的帧数
    pub frames_with_hand: AtomicU64,

    /// 信号丢失帧数（无手或关键点非有限值）
    pub signal_lost: AtomicU64,

    /// 被死区抑制的帧数
    pub suppressed: AtomicU64,

    /// 因上一次发送未完成而丢弃的帧数
    pub busy_drops: AtomicU64,

    /// 链路未连接时跳过的帧数
    pub offline_skips: AtomicU64,

    /// 发起的发送次数
    pub tx_attempts: AtomicU64,

    /// 确认成功的发送次数
    pub tx_confirmed: AtomicU64,

    /// 发送失败次数（同步拒绝或异步失败）
    pub tx_failures: AtomicU64,

    /// 编码失败次数
    pub encode_errors: AtomicU64,

    /// 意外断开次数
    pub disconnects: AtomicU64,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// 获取指标快照
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_total: self.frames_total.load(Ordering::Relaxed),
            frames_with_hand: self.frames_with_hand.load(Ordering::Relaxed),
            signal_lost: self.signal_lost.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            busy_drops: self.busy_drops.load(Ordering::Relaxed),
            offline_skips: self.offline_skips.load(Ordering::Relaxed),
            tx_attempts: self.tx_attempts.load(Ordering::Relaxed),
            tx_confirmed: self.tx_confirmed.load(Ordering::Relaxed),
            tx_failures: self.tx_failures.load(Ordering::Relaxed),
            encode_errors: self.encode_errors.load(Ordering::Relaxed),
            disconnects: self.disconnects.load(Ordering::Relaxed),
        }
    }

    /// 重置所有计数器
    pub fn reset(&self) {
        for counter in [
            &self.frames_total,
            &self.frames_with_hand,
            &self.signal_lost,
            &self.suppressed,
            &self.busy_drops,
            &self.offline_skips,
            &self.tx_attempts,
            &self.tx_confirmed,
            &self.tx_failures,
            &self.encode_errors,
            &self.disconnects,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// 指标快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub frames_total: u64,
    pub frames_with_hand: u64,
    pub signal_lost: u64,
    pub suppressed: u64,
    pub busy_drops: u64,
    pub offline_skips: u64,
    pub tx_attempts: u64,
    pub tx_confirmed: u64,
    pub tx_failures: u64,
    pub encode_errors: u64,
    pub disconnects: u64,
}

impl MetricsSnapshot {
    /// 手部检测率（百分比），没有帧时返回 0.0
    pub fn hand_rate(&self) -> f64 {
        if self.frames_total == 0 {
            return 0.0;
        }
        (self.frames_with_hand as f64 / self.frames_total as f64) * 100.0
    }

    /// 发送成功率（百分比），没有发送时返回 100.0
    pub fn tx_success_rate(&self) -> f64 {
        let finished = self.tx_confirmed + self.tx_failures;
        if finished == 0 {
            return 100.0;
        }
        (self.tx_confirmed as f64 / finished as f64) * 100.0
    }
}
