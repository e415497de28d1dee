//! run 命令
//!
//! 回放录制的手部姿态，驱动帧循环，发送到 UDP 网关或只打印（dry-run）。

use anyhow::{Context, Result};
use clap::Args;
use handlink_sdk::driver::{
    Dispatch, Joint, LoopConfig, LoopSummary, ReplaySource, Teleop, TickOutcome, TomlFileSource,
    run_loop,
};
use handlink_sdk::link::{
    ConnectError, DeviceSelector, LinkEvent, SendError, SendTicket, Session, Transport,
    UdpTransport,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

use super::config::resolve_config_file;

/// 帧循环命令参数
#[derive(Args, Debug)]
pub struct RunCommand {
    /// 录制文件（JSON lines，每行 21 个关键点或 null）
    #[arg(short, long)]
    pub input: PathBuf,

    /// UDP 目标地址（host:port）
    #[arg(short, long, conflicts_with = "dry_run")]
    pub target: Option<String>,

    /// 不连接设备，只打印报文
    #[arg(long)]
    pub dry_run: bool,

    /// 配置文件（修改后下一帧生效）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 刷新率（Hz）
    #[arg(short, long, default_value_t = 60.0)]
    pub rate: f64,

    /// 最多运行的帧数
    #[arg(long)]
    pub frames: Option<usize>,

    /// 回放到末尾后从头开始
    #[arg(long = "loop")]
    pub looping: bool,

    /// 每隔多少帧打印一次状态（0 表示不打印）
    #[arg(long, default_value_t = 30)]
    pub status_every: usize,
}

impl RunCommand {
    pub fn execute(&self) -> Result<()> {
        if self.target.is_none() && !self.dry_run {
            anyhow::bail!("需要 --target <host:port> 或 --dry-run");
        }

        let poses = ReplaySource::open(&self.input)
            .with_context(|| format!("加载录制失败: {}", self.input.display()))?
            .looping(self.looping);
        println!("📁 录制: {} ({} 帧)", self.input.display(), poses.len());

        let config_path = resolve_config_file(self.config.as_deref())?;
        println!("⚙️  配置: {}", config_path.display());
        let config = TomlFileSource::new(config_path);

        let loop_config = LoopConfig {
            frequency_hz: self.rate,
            max_frames: self.frames,
        };

        let stop = Arc::new(AtomicBool::new(false));
        let handler_stop = Arc::clone(&stop);
        ctrlc::set_handler(move || {
            handler_stop.store(true, Ordering::Relaxed);
        })
        .context("设置 Ctrl+C 处理失败")?;

        let summary = match &self.target {
            Some(target) => {
                let selector = DeviceSelector::with_address(target);
                self.drive(UdpTransport::new(), &selector, poses, config, &loop_config, &stop)?
            },
            None => {
                let selector = DeviceSelector::default();
                self.drive(DryRunTransport, &selector, poses, config, &loop_config, &stop)?
            },
        };

        print_summary(&summary);
        Ok(())
    }

    fn drive<T: Transport>(
        &self,
        transport: T,
        selector: &DeviceSelector,
        mut poses: ReplaySource,
        mut config: TomlFileSource,
        loop_config: &LoopConfig,
        stop: &AtomicBool,
    ) -> Result<LoopSummary> {
        let mut teleop = Teleop::new(transport);
        teleop
            .connect(selector)
            .with_context(|| format!("连接失败: {}", selector))?;
        println!(
            "🔗 已连接: {}",
            teleop.link().device_name().unwrap_or("unknown")
        );

        let status_every = self.status_every;
        let mut frame = 0usize;
        let summary = run_loop(
            &mut teleop,
            &mut poses,
            &mut config,
            loop_config,
            stop,
            |outcome| {
                frame += 1;
                print_frame(frame, outcome, status_every);
            },
        )?;

        teleop.disconnect();
        info!("Disconnected after {} frames", summary.frames);
        Ok(summary)
    }
}

fn print_frame(frame: usize, outcome: &TickOutcome, status_every: usize) {
    if let Some(LinkEvent::Disconnected { reason }) = &outcome.event {
        println!("⚠️  链路断开: {}", reason);
    }
    if status_every > 0 && frame % status_every == 0 {
        let travel = outcome.report.travel_percent();
        println!(
            "[{:>6}] {}  ({:>3.0}% {:>3.0}% {:>3.0}%)",
            frame,
            outcome.report,
            travel[Joint::Base],
            travel[Joint::Shoulder],
            travel[Joint::Elbow],
        );
    }
    if let Dispatch::Sent(packet) = &outcome.dispatch {
        println!("  → {}", packet);
    }
}

fn print_summary(summary: &LoopSummary) {
    let m = &summary.metrics;
    println!();
    println!("📊 运行结果 ({:?}):", summary.reason);
    println!("  帧数: {} ({:.2?})", summary.frames, summary.elapsed);
    println!("  检测到手: {:.1}%", m.hand_rate());
    println!(
        "  发送: {} 次，确认 {}，失败 {}（成功率 {:.1}%）",
        m.tx_attempts,
        m.tx_confirmed,
        m.tx_failures,
        m.tx_success_rate()
    );
    println!(
        "  死区抑制: {}，忙碌丢弃: {}，离线跳过: {}",
        m.suppressed, m.busy_drops, m.offline_skips
    );
}

/// 空传输：每次发送立即成功，报文由 `print_frame` 打印
struct DryRunTransport;

struct DryRunSession;

impl Transport for DryRunTransport {
    type Session = DryRunSession;

    fn connect(&mut self, _selector: &DeviceSelector) -> Result<DryRunSession, ConnectError> {
        Ok(DryRunSession)
    }
}

impl Session for DryRunSession {
    fn send(&mut self, _bytes: &[u8]) -> Result<SendTicket, SendError> {
        Ok(SendTicket::ready(Ok(())))
    }

    fn is_busy(&self) -> bool {
        false
    }

    fn poll_event(&mut self) -> Option<LinkEvent> {
        None
    }

    fn disconnect(&mut self) {}

    fn device_name(&self) -> &str {
        "dry-run"
    }
}
