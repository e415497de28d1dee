//! 配置管理命令
//!
//! 流水线配置文件默认位于 `<config_dir>/handlink/config.toml`。

use anyhow::{Context, Result};
use clap::Subcommand;
use handlink_sdk::driver::PipelineConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// 默认配置目录
fn config_dir() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;

    path.push("handlink");
    Ok(path)
}

/// 默认配置文件路径
pub fn default_config_file() -> Result<PathBuf> {
    let mut path = config_dir()?;
    path.push("config.toml");
    Ok(path)
}

/// 命令行指定的路径优先，否则使用默认路径
pub fn resolve_config_file(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => default_config_file(),
    }
}

/// 读取并宽松解析配置文件；文件不存在时返回默认配置
fn load(path: &Path) -> Result<(PipelineConfig, Vec<String>)> {
    if !path.exists() {
        return Ok((PipelineConfig::default(), Vec::new()));
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
    let (config, issues) = PipelineConfig::from_toml_lenient(&text);
    Ok((config, issues.iter().map(ToString::to_string).collect()))
}

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 打印生效的配置（无效值已替换为默认值）
    Show {
        /// 配置文件路径
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// 检查配置文件，列出被替换为默认值的项
    Check {
        /// 配置文件路径
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// 写入默认配置文件
    Init {
        /// 配置文件路径
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// 覆盖已有文件
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    pub fn execute(self) -> Result<()> {
        match self {
            ConfigCommand::Show { config } => Self::show_(config.as_deref()),

            ConfigCommand::Check { config } => Self::check_(config.as_deref()),

            ConfigCommand::Init { config, force } => Self::init_(config.as_deref(), force),
        }
    }

    fn show_(explicit: Option<&Path>) -> Result<()> {
        let path = resolve_config_file(explicit)?;
        let (config, _) = load(&path)?;

        println!("# {}", path.display());
        print!("{}", config.to_toml_string()?);
        Ok(())
    }

    fn check_(explicit: Option<&Path>) -> Result<()> {
        let path = resolve_config_file(explicit)?;
        println!("配置文件: {}", path.display());

        if !path.exists() {
            println!("  (不存在，使用默认配置)");
            return Ok(());
        }

        let (_, issues) = load(&path)?;
        if issues.is_empty() {
            println!("✅ 配置有效");
            return Ok(());
        }

        for issue in &issues {
            println!("  ⚠️  {}", issue);
        }
        anyhow::bail!("{} 项配置无效，已回退到默认值", issues.len());
    }

    fn init_(explicit: Option<&Path>, force: bool) -> Result<()> {
        let path = resolve_config_file(explicit)?;
        if path.exists() && !force {
            anyhow::bail!("配置文件已存在: {}（使用 --force 覆盖）", path.display());
        }
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).context("创建配置目录失败")?;
        }

        let content = format!(
            "# Handlink pipeline configuration\n\n{}",
            PipelineConfig::default().to_toml_string()?
        );
        fs::write(&path, content).context("写入配置文件失败")?;
        println!("✅ 已写入默认配置: {}", path.display());
        Ok(())
    }
}
