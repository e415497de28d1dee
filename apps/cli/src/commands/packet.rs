//! 报文工具命令

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use handlink_sdk::protocol::{ArmCommand, Packet};

/// 夹爪状态参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GripperArg {
    Open,
    Closed,
}

impl GripperArg {
    fn value(self) -> i32 {
        match self {
            GripperArg::Open => 1,
            GripperArg::Closed => 0,
        }
    }
}

/// 编码命令参数
#[derive(Args, Debug)]
pub struct EncodeCommand {
    /// 底座角度（度）
    #[arg(allow_negative_numbers = true)]
    pub base: i32,

    /// 肩部角度（度）
    #[arg(allow_negative_numbers = true)]
    pub shoulder: i32,

    /// 肘部角度（度）
    #[arg(allow_negative_numbers = true)]
    pub elbow: i32,

    /// 夹爪状态
    #[arg(short, long, value_enum, default_value_t = GripperArg::Closed)]
    pub gripper: GripperArg,

    /// 越界值钳位到 0..=999 而不是报错
    #[arg(long)]
    pub saturate: bool,
}

impl EncodeCommand {
    pub fn execute(&self) -> Result<()> {
        let command = ArmCommand::new(self.base, self.shoulder, self.elbow, self.gripper.value());
        let packet = self.encode(&command)?;
        println!("{}", packet);
        println!("{}", hex(packet.as_bytes()));
        Ok(())
    }

    fn encode(&self, command: &ArmCommand) -> Result<Packet> {
        if self.saturate {
            return Ok(Packet::encode_saturating(command));
        }
        Packet::encode(command).context("编码失败（使用 --saturate 钳位越界值）")
    }
}

/// 解码命令参数
#[derive(Args, Debug)]
pub struct DecodeCommand {
    /// 报文文本，如 `B090S135E045G001`（可带 `\r\n` 结尾）
    pub packet: String,

    /// 以 JSON 输出
    #[arg(long)]
    pub json: bool,
}

impl DecodeCommand {
    pub fn execute(&self) -> Result<()> {
        let command = decode_text(&self.packet)?;
        if self.json {
            println!("{}", serde_json::to_string(&command)?);
        } else {
            println!(
                "base={} shoulder={} elbow={} gripper={}",
                command.base, command.shoulder, command.elbow, command.gripper
            );
        }
        Ok(())
    }
}

/// 接受原始 CRLF 或字面 `\r\n` 转义
fn decode_text(text: &str) -> Result<ArmCommand> {
    let unescaped = text.trim_end_matches("\\r\\n");
    let trimmed = unescaped.trim_end_matches(['\r', '\n']);
    Packet::decode(trimmed.as_bytes()).with_context(|| format!("无法解码报文: {:?}", text))
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_text_variants() {
        let expected = ArmCommand::new(90, 135, 45, 1);
        assert_eq!(decode_text("B090S135E045G001").unwrap(), expected);
        assert_eq!(decode_text("B090S135E045G001\r\n").unwrap(), expected);
        assert_eq!(decode_text("B090S135E045G001\\r\\n").unwrap(), expected);
        assert!(decode_text("B90S135E045G001").is_err());
    }

    #[test]
    fn test_encode_rejects_out_of_range_unless_saturating() {
        let mut cmd = EncodeCommand {
            base: 1200,
            shoulder: 90,
            elbow: 90,
            gripper: GripperArg::Open,
            saturate: false,
        };
        let command = ArmCommand::new(1200, 90, 90, 1);
        assert!(cmd.encode(&command).is_err());

        cmd.saturate = true;
        assert_eq!(cmd.encode(&command).unwrap().payload(), "B999S090E090G001");
    }

    #[test]
    fn test_hex() {
        assert_eq!(hex(b"B0\r\n"), "42 30 0D 0A");
    }
}
