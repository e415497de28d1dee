//! 命令定义和实现

pub mod config;
pub mod packet;
pub mod run;

pub use config::ConfigCommand;
pub use packet::{DecodeCommand, EncodeCommand};
pub use run::RunCommand;
