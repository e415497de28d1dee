//! 协议相关常量定义
//!
//! 集中定义报文格式和设备寻址常量，避免在代码中散落"魔法数"。

/// 底座字段标签
pub const TAG_BASE: u8 = b'B';
/// 肩部字段标签
pub const TAG_SHOULDER: u8 = b'S';
/// 肘部字段标签
pub const TAG_ELBOW: u8 = b'E';
/// 夹爪字段标签
pub const TAG_GRIPPER: u8 = b'G';

/// 报文字段顺序（标签）
pub const FIELD_TAGS: [u8; 4] = [TAG_BASE, TAG_SHOULDER, TAG_ELBOW, TAG_GRIPPER];

/// 每个字段的十进制位数（零填充）
pub const FIELD_DIGITS: usize = 3;

/// 单个字段可表示的最大值
pub const FIELD_MAX: i32 = 999;

/// 有效载荷长度：4 × (1 字节标签 + 3 字节数字)
pub const PAYLOAD_LEN: usize = FIELD_TAGS.len() * (1 + FIELD_DIGITS);

/// 报文结束符
pub const TERMINATOR: &[u8; 2] = b"\r\n";

/// 完整报文长度（有效载荷 + CRLF）
pub const PACKET_LEN: usize = PAYLOAD_LEN + TERMINATOR.len();

/// 舵机全局角度下限（度）
pub const ANGLE_MIN: i32 = 0;
/// 舵机全局角度上限（度）
pub const ANGLE_MAX: i32 = 180;

/// Nordic UART 服务 UUID
pub const UART_SERVICE_UUID: &str = "6e400001-b5a3-f393-e0a9-e50e24dcca9e";

/// Nordic UART RX 特征 UUID（主机写入方向）
pub const UART_RX_CHARACTERISTIC_UUID: &str = "6e400003-b5a3-f393-e0a9-e50e24dcca9e";

/// 控制板广播名前缀
pub const DEVICE_NAME_PREFIX: &str = "BBC micro:bit";
