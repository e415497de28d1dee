//! 帧循环
//!
//! 以固定刷新率驱动 [`Teleop`]：每帧读取配置快照、取一帧手部姿态、推进一步，
//! 用 `spin_sleep` 补齐到下一帧的截止时间。
//!
//! 循环在以下任一情况下结束：
//! - 停止标志被置位（Ctrl+C）
//! - 达到 `max_frames`
//! - 姿态来源结束（回放到末尾）

use crate::DriverError;
use crate::landmark::PoseSource;
use crate::metrics::MetricsSnapshot;
use crate::source::ConfigSource;
use crate::teleop::{Teleop, TickOutcome};
use handlink_link::Transport;
use spin_sleep::SpinSleeper;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// 默认刷新率（Hz）
pub const DEFAULT_FREQUENCY_HZ: f64 = 60.0;

/// 最低刷新率（Hz），对应 1000 秒一帧
pub const MIN_FREQUENCY_HZ: f64 = 0.001;

/// 帧循环配置
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// 刷新率（Hz）
    pub frequency_hz: f64,

    /// 最大帧数（None 表示一直运行）
    pub max_frames: Option<usize>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        LoopConfig {
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            max_frames: None,
        }
    }
}

impl LoopConfig {
    /// 帧周期；刷新率无效时返回错误而不是 panic
    pub fn period(&self) -> Result<Duration, DriverError> {
        self.validate()?;
        Duration::try_from_secs_f64(1.0 / self.frequency_hz).map_err(|e| {
            DriverError::InvalidLoopConfig(format!(
                "Invalid frequency_hz: {} ({})",
                self.frequency_hz, e
            ))
        })
    }

    fn validate(&self) -> Result<(), DriverError> {
        if !self.frequency_hz.is_finite() || self.frequency_hz < MIN_FREQUENCY_HZ {
            return Err(DriverError::InvalidLoopConfig(format!(
                "Invalid frequency_hz: {} (must be >= {})",
                self.frequency_hz, MIN_FREQUENCY_HZ
            )));
        }
        if self.frequency_hz > 1000.0 {
            warn!(
                "Very high frame rate: {} Hz. Pose sources rarely deliver more than 120 Hz.",
                self.frequency_hz
            );
        }
        Ok(())
    }
}

/// 循环结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Interrupted,
    MaxFrames,
    SourceExhausted,
}

/// 循环运行摘要
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopSummary {
    pub frames: usize,
    pub reason: StopReason,
    pub elapsed: Duration,
    pub metrics: MetricsSnapshot,
}

/// 运行帧循环（阻塞）
///
/// `on_frame` 在每帧结束后调用，用于状态显示。
pub fn run_loop<T, P, C, F>(
    teleop: &mut Teleop<T>,
    poses: &mut P,
    config: &mut C,
    loop_config: &LoopConfig,
    stop: &AtomicBool,
    mut on_frame: F,
) -> Result<LoopSummary, DriverError>
where
    T: Transport,
    P: PoseSource + ?Sized,
    C: ConfigSource + ?Sized,
    F: FnMut(&TickOutcome),
{
    let period = loop_config.period()?;
    let sleeper = SpinSleeper::default();
    let started = Instant::now();
    let mut frames = 0;

    info!(
        "Frame loop started at {} Hz (max frames: {:?})",
        loop_config.frequency_hz, loop_config.max_frames
    );

    let reason = loop {
        if stop.load(Ordering::Relaxed) {
            break StopReason::Interrupted;
        }
        if let Some(max_frames) = loop_config.max_frames
            && frames >= max_frames
        {
            break StopReason::MaxFrames;
        }
        if poses.is_exhausted() {
            break StopReason::SourceExhausted;
        }

        let frame_start = Instant::now();

        let frame_config = config.current();
        let hand = poses.detect();
        let outcome = teleop.tick(&frame_config, hand.as_ref());
        if let Some(event) = &outcome.event {
            warn!("Link event: {:?}", event);
        }
        on_frame(&outcome);
        frames += 1;

        let busy = frame_start.elapsed();
        match period.checked_sub(busy) {
            Some(remaining) => sleeper.sleep(remaining),
            None => debug!("Frame {} overran its period by {:?}", frames, busy - period),
        }
    };

    let summary = LoopSummary {
        frames,
        reason,
        elapsed: started.elapsed(),
        metrics: teleop.metrics().snapshot(),
    };
    info!(
        "Frame loop stopped ({:?}) after {} frames in {:.2?}",
        summary.reason, summary.frames, summary.elapsed
    );
    Ok(summary)
}
