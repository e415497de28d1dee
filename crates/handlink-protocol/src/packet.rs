//! 命令报文编码/解码
//!
//! 将四个整数（底座/肩部/肘部角度与夹爪状态）序列化为定长 ASCII 报文。
//!
//! 上游会把角度钳位到 0..=180，但编码器不依赖这一点：
//! 超出 3 位字段范围的值由 [`Packet::encode`] 拒绝，或由
//! [`Packet::encode_saturating`] 饱和到 0..=999。

use crate::ProtocolError;
use crate::constants::*;
use std::fmt;

/// 一帧执行器命令（编码前的整数形式）
///
/// 角度单位为度，`gripper` 为 0（闭合）或 1（张开）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArmCommand {
    pub base: i32,
    pub shoulder: i32,
    pub elbow: i32,
    pub gripper: i32,
}

impl ArmCommand {
    /// 创建命令
    pub const fn new(base: i32, shoulder: i32, elbow: i32, gripper: i32) -> Self {
        Self {
            base,
            shoulder,
            elbow,
            gripper,
        }
    }

    /// 按报文字段顺序返回各值（B, S, E, G）
    pub const fn fields(&self) -> [i32; 4] {
        [self.base, self.shoulder, self.elbow, self.gripper]
    }

    fn from_fields(fields: [i32; 4]) -> Self {
        let [base, shoulder, elbow, gripper] = fields;
        Self::new(base, shoulder, elbow, gripper)
    }
}

impl TryFrom<&[u8]> for ArmCommand {
    type Error = ProtocolError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Packet::decode(bytes)
    }
}

/// 已编码的命令报文（固定 18 字节，含 CRLF）
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Packet {
    bytes: [u8; PACKET_LEN],
}

impl Packet {
    /// 编码命令
    ///
    /// 任一字段为负或大于 999 时返回 [`ProtocolError::FieldOutOfRange`]。
    ///
    /// ```rust
    /// use handlink_protocol::{ArmCommand, Packet};
    ///
    /// let packet = Packet::encode(&ArmCommand::new(90, 135, 45, 1)).unwrap();
    /// assert_eq!(packet.as_bytes(), b"B090S135E045G001\r\n");
    /// ```
    pub fn encode(command: &ArmCommand) -> Result<Self, ProtocolError> {
        for (tag, value) in FIELD_TAGS.iter().zip(command.fields()) {
            if !(0..=FIELD_MAX).contains(&value) {
                return Err(ProtocolError::FieldOutOfRange {
                    field: *tag as char,
                    value,
                });
            }
        }
        Ok(Self::write(command.fields()))
    }

    /// 编码命令，越界字段饱和到 0..=999
    pub fn encode_saturating(command: &ArmCommand) -> Self {
        Self::write(command.fields().map(|v| v.clamp(0, FIELD_MAX)))
    }

    fn write(fields: [i32; 4]) -> Self {
        let mut bytes = [0u8; PACKET_LEN];
        for (i, (tag, value)) in FIELD_TAGS.iter().zip(fields).enumerate() {
            let offset = i * (1 + FIELD_DIGITS);
            bytes[offset] = *tag;
            // 调用方保证 0 <= value <= 999
            let value = value as u32;
            bytes[offset + 1] = b'0' + (value / 100 % 10) as u8;
            bytes[offset + 2] = b'0' + (value / 10 % 10) as u8;
            bytes[offset + 3] = b'0' + (value % 10) as u8;
        }
        bytes[PAYLOAD_LEN..].copy_from_slice(TERMINATOR);
        Self { bytes }
    }

    /// 解码报文
    ///
    /// 接受完整报文（18 字节，含 CRLF）或仅有效载荷（16 字节）。
    pub fn decode(bytes: &[u8]) -> Result<ArmCommand, ProtocolError> {
        let payload = match bytes.len() {
            PACKET_LEN => {
                if &bytes[PAYLOAD_LEN..] != TERMINATOR {
                    return Err(ProtocolError::MissingTerminator);
                }
                &bytes[..PAYLOAD_LEN]
            },
            PAYLOAD_LEN => bytes,
            actual => {
                return Err(ProtocolError::InvalidLength {
                    expected: PACKET_LEN,
                    actual,
                });
            },
        };

        let mut fields = [0i32; 4];
        for (i, tag) in FIELD_TAGS.iter().enumerate() {
            let offset = i * (1 + FIELD_DIGITS);
            if payload[offset] != *tag {
                return Err(ProtocolError::UnexpectedTag {
                    position: offset,
                    expected: *tag as char,
                    found: payload[offset],
                });
            }

            let mut value = 0i32;
            for &byte in &payload[offset + 1..offset + 1 + FIELD_DIGITS] {
                if !byte.is_ascii_digit() {
                    return Err(ProtocolError::InvalidDigit {
                        field: *tag as char,
                        byte,
                    });
                }
                value = value * 10 + i32::from(byte - b'0');
            }
            fields[i] = value;
        }

        Ok(ArmCommand::from_fields(fields))
    }

    /// 完整报文字节（含 CRLF）
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// 有效载荷文本（不含 CRLF），用于日志显示
    pub fn payload(&self) -> &str {
        // 报文只包含 ASCII 字节
        std::str::from_utf8(&self.bytes[..PAYLOAD_LEN]).unwrap_or_default()
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.payload())
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Packet").field(&self.payload()).finish()
    }
}

impl AsRef<[u8]> for Packet {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}
