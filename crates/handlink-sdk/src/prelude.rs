//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use handlink_sdk::prelude::*;
//! ```

// 流水线
pub use handlink_driver::{
    ConfigSource, Dispatch, FrameReport, Gripper, HandLandmarks, Joint, JointArray,
    JointConfig, Landmark, LoopConfig, PipelineConfig, PipelineState, PoseSource, Pose,
    ReplaySource, SharedConfig, StaticConfig, Teleop, TickOutcome, TomlFileSource, advance,
    run_loop,
};

// 链路
pub use handlink_link::{DeviceSelector, LinkState, Transport, UdpTransport};

// 协议
pub use handlink_protocol::{ArmCommand, Packet};

// 错误类型
pub use handlink_driver::DriverError;
pub use handlink_link::{ConnectError, SendError};
pub use handlink_protocol::ProtocolError;
