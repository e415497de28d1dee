//! 配置来源
//!
//! 帧循环在每帧开始时调用一次 [`ConfigSource::current`]，得到本帧使用的配置快照。

use crate::config::PipelineConfig;
use arc_swap::ArcSwap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{info, warn};

/// 每帧读取的配置来源
pub trait ConfigSource {
    fn current(&mut self) -> PipelineConfig;
}

/// 固定配置
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticConfig(pub PipelineConfig);

impl ConfigSource for StaticConfig {
    fn current(&mut self) -> PipelineConfig {
        self.0
    }
}

impl ConfigSource for PipelineConfig {
    fn current(&mut self) -> PipelineConfig {
        *self
    }
}

/// 可跨线程热替换的配置
///
/// 克隆得到的句柄共享同一份配置；任意线程 `store()` 后，下一帧生效。
#[derive(Debug, Clone)]
pub struct SharedConfig {
    inner: Arc<ArcSwap<PipelineConfig>>,
}

impl SharedConfig {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(config)),
        }
    }

    pub fn load(&self) -> PipelineConfig {
        **self.inner.load()
    }

    pub fn store(&self, config: PipelineConfig) {
        self.inner.store(Arc::new(config));
    }

    /// 在当前配置基础上修改
    pub fn update(&self, f: impl Fn(&mut PipelineConfig)) {
        self.inner.rcu(|current| {
            let mut next = **current;
            f(&mut next);
            next
        });
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl ConfigSource for SharedConfig {
    fn current(&mut self) -> PipelineConfig {
        self.load()
    }
}

/// TOML 文件配置
///
/// 文件修改时间变化时重新读取并宽松解析；文件缺失或读取失败时保留上一次的有效配置。
#[derive(Debug)]
pub struct TomlFileSource {
    path: PathBuf,
    config: PipelineConfig,
    modified: Option<SystemTime>,
    read_failed: bool,
}

impl TomlFileSource {
    /// 打开配置文件；文件不存在时先使用默认配置，之后出现时自动加载
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let mut source = Self {
            path: path.into(),
            config: PipelineConfig::default(),
            modified: None,
            read_failed: false,
        };
        source.reload_if_changed();
        source
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 最近一次有效配置
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 检查修改时间，有变化时重新加载。返回是否重新加载。
    pub fn reload_if_changed(&mut self) -> bool {
        let modified = match fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                self.report_failure(&e);
                return false;
            },
        };
        if self.modified == Some(modified) {
            return false;
        }

        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                self.report_failure(&e);
                return false;
            },
        };

        let (config, issues) = PipelineConfig::from_toml_lenient(&text);
        self.config = config;
        self.modified = Some(modified);
        self.read_failed = false;
        info!(
            "Loaded config from {} ({} fallback(s))",
            self.path.display(),
            issues.len()
        );
        true
    }

    // 同一次失败只警告一次
    fn report_failure(&mut self, error: &std::io::Error) {
        if !self.read_failed {
            warn!(
                "Cannot read config {}: {}, keeping last good config",
                self.path.display(),
                error
            );
            self.read_failed = true;
        }
    }
}

impl ConfigSource for TomlFileSource {
    fn current(&mut self) -> PipelineConfig {
        self.reload_if_changed();
        self.config
    }
}
