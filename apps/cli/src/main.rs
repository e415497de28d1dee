//! # Handlink CLI
//!
//! 手势遥操作命令行工具。
//!
//! ```bash
//! # 回放一段录制，发送到 UDP 网关
//! handlink-cli run --input session.jsonl --target 192.168.4.1:9000
//!
//! # 不连接设备，只打印会发出的报文
//! handlink-cli run --input session.jsonl --dry-run
//!
//! # 报文工具
//! handlink-cli encode 90 135 45 --gripper open
//! handlink-cli decode B090S135E045G001
//!
//! # 查看生效的配置
//! handlink-cli config show
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{ConfigCommand, DecodeCommand, EncodeCommand, RunCommand};

/// Handlink CLI - 手势遥操作工具
#[derive(Parser, Debug)]
#[command(name = "handlink-cli")]
#[command(about = "Command-line interface for hand-pose arm teleoperation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 运行帧循环（回放录制的手部姿态）
    Run {
        #[command(flatten)]
        args: RunCommand,
    },

    /// 编码命令报文
    Encode {
        #[command(flatten)]
        args: EncodeCommand,
    },

    /// 解码命令报文
    Decode {
        #[command(flatten)]
        args: DecodeCommand,
    },
}

fn main() -> Result<()> {
    // 初始化日志（RUST_LOG 优先，默认 info）
    handlink_sdk::init_logger();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config(cmd) => cmd.execute(),

        Commands::Run { args } => args.execute(),

        Commands::Encode { args } => args.execute(),

        Commands::Decode { args } => args.execute(),
    }
}
