//! 流水线端到端场景测试
//!
//! 通过 Mock 传输驱动完整的 Teleop，验证信号丢失、发送失败重试、忙碌丢帧等行为。

use handlink_sdk::driver::{SENTINEL_COMMAND, landmark};
use handlink_sdk::link::mock::{MockHandle, MockOutcome, MockTransport};
use handlink_sdk::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 构造一只手：手腕位置、掌根距离、捏合距离
fn hand(wrist_x: f64, wrist_y: f64, palm: f64, pinch: f64) -> HandLandmarks {
    let wrist = Landmark::new(wrist_x, wrist_y, 0.0);
    let mut points = [wrist; landmark::LANDMARK_COUNT];
    points[landmark::MIDDLE_MCP] = Landmark::new(wrist_x, wrist_y - palm, 0.0);
    points[landmark::THUMB_TIP] = Landmark::new(0.4, 0.4, 0.0);
    points[landmark::INDEX_TIP] = Landmark::new(0.4 + pinch, 0.4, 0.0);
    HandLandmarks::new(points)
}

fn connected_teleop() -> (Teleop<MockTransport>, MockHandle) {
    let transport = MockTransport::new("BBC micro:bit [zevip]");
    let handle = transport.handle();
    let mut teleop = Teleop::new(transport);
    teleop
        .connect(&DeviceSelector::default())
        .expect("mock connect");
    (teleop, handle)
}

#[test]
fn first_frame_always_emits() {
    let (mut teleop, handle) = connected_teleop();
    assert_eq!(teleop.state().last_sent, SENTINEL_COMMAND);

    let outcome = teleop.tick(&PipelineConfig::default(), None);
    assert!(matches!(outcome.dispatch, Dispatch::Sent(_)));
    assert_eq!(handle.delivered(), vec![b"B090S090E090G000\r\n".to_vec()]);
}

#[test]
fn signal_loss_returns_smoothly_to_neutral() {
    let (mut teleop, _handle) = connected_teleop();
    let config = PipelineConfig::default();

    // 手放在远离中立位的地方，张开
    let far = hand(0.05, 0.95, 0.24, 0.2);
    for _ in 0..60 {
        teleop.tick(&config, Some(&far));
    }
    let start = teleop.state().current;
    assert_eq!(start.gripper, Gripper::Open);
    for joint in Joint::ALL {
        assert!(
            (start.angles[joint] - 90.0).abs() > 20.0,
            "{} should be far from neutral, got {}",
            joint,
            start.angles[joint]
        );
    }

    let mut previous = start;
    for frame in 0..10 {
        let outcome = teleop.tick(&config, None);
        let current = teleop.state().current;

        // 夹爪第一帧就回到闭合
        assert_eq!(current.gripper, Gripper::Closed, "frame {}", frame);
        assert_eq!(outcome.report.gripper(), Gripper::Closed);

        for joint in Joint::ALL {
            let before = (previous.angles[joint] - 90.0).abs();
            let after = (current.angles[joint] - 90.0).abs();
            assert!(after < before, "{} not approaching neutral", joint);
            // 没有越过中立位
            assert_eq!(
                (previous.angles[joint] - 90.0).signum(),
                (current.angles[joint] - 90.0).signum()
            );
        }
        previous = current;
    }
    assert!(teleop.state().filters.is_empty());
}

#[test]
fn send_failure_is_retried_next_frame() {
    let (mut teleop, handle) = connected_teleop();
    let config = PipelineConfig::default();
    let pose = hand(0.3, 0.6, 0.12, 0.2);

    // 先稳定到一个姿态
    for _ in 0..200 {
        teleop.tick(&config, Some(&pose));
    }
    let settled = teleop.state().last_sent;
    let sent_before = handle.attempted().len();

    // 移动手，第 N 帧发送失败
    let moved = hand(0.7, 0.3, 0.2, 0.01);
    handle.push_outcome(MockOutcome::Fail);
    let outcome = teleop.tick(&config, Some(&moved));
    let failed_packet = match outcome.dispatch {
        Dispatch::Sent(packet) => packet,
        other => panic!("expected a send attempt, got {:?}", other),
    };
    assert_eq!(teleop.state().last_sent, settled);

    // 第 N+1 帧重新尝试
    let outcome = teleop.tick(&config, Some(&moved));
    assert!(matches!(outcome.dispatch, Dispatch::Sent(_)));
    assert_eq!(handle.attempted().len(), sent_before + 2);
    assert_ne!(teleop.state().last_sent, settled);
    assert!(!handle.delivered().contains(&failed_packet.as_bytes().to_vec()));
}

#[test]
fn busy_link_drops_instead_of_queueing() {
    let (mut teleop, handle) = connected_teleop();
    let config = PipelineConfig::default();
    handle.push_outcome(MockOutcome::Hold);

    teleop.tick(&config, None);
    let mut busy = 0;
    for i in 0..5 {
        let outcome = teleop.tick(&config, Some(&hand(0.1 * i as f64, 0.5, 0.15, 0.2)));
        if outcome.dispatch == Dispatch::Busy {
            busy += 1;
        }
    }
    assert_eq!(busy, 5);
    assert_eq!(handle.attempted().len(), 1);
    assert_eq!(teleop.state().last_sent, SENTINEL_COMMAND);

    assert!(handle.complete_held(Ok(())));
    let outcome = teleop.tick(&config, Some(&hand(0.9, 0.5, 0.15, 0.2)));
    assert!(matches!(outcome.dispatch, Dispatch::Sent(_)));
    assert_eq!(handle.attempted().len(), 2);
}

#[test]
fn deadband_absorbs_sensor_jitter() {
    let (mut teleop, handle) = connected_teleop();
    let config = PipelineConfig::default();
    let mut rng = StdRng::seed_from_u64(42);

    let jittered = |rng: &mut StdRng| {
        hand(
            0.5 + rng.gen_range(-0.002..0.002),
            0.5 + rng.gen_range(-0.002..0.002),
            0.15 + rng.gen_range(-0.001..0.001),
            0.2,
        )
    };

    for _ in 0..200 {
        let h = jittered(&mut rng);
        teleop.tick(&config, Some(&h));
    }
    let settled = handle.attempted().len();

    for _ in 0..300 {
        let h = jittered(&mut rng);
        teleop.tick(&config, Some(&h));
    }
    // 抖动幅度 < 1°，死区 1.5° 下不再发送
    assert_eq!(handle.attempted().len(), settled);
    assert!(teleop.metrics().snapshot().suppressed >= 300);
}

#[test]
fn every_delivered_packet_is_well_formed() {
    let (mut teleop, handle) = connected_teleop();
    let mut rng = StdRng::seed_from_u64(7);
    let mut config = PipelineConfig::default();
    config.smoothing = 0.5;
    config.base.trim = 25;

    for _ in 0..400 {
        let h = hand(
            rng.gen_range(-0.2..1.2),
            rng.gen_range(-0.2..1.2),
            rng.gen_range(0.0..0.4),
            rng.gen_range(0.0..0.1),
        );
        let input = if rng.gen_bool(0.2) { None } else { Some(&h) };
        teleop.tick(&config, input);
    }

    let delivered = handle.delivered();
    assert!(delivered.len() > 10);
    for bytes in delivered {
        assert_eq!(bytes.len(), 18);
        let command = Packet::decode(&bytes).expect("well-formed packet");
        for angle in [command.base, command.shoulder, command.elbow] {
            assert!((0..=180).contains(&angle));
        }
        assert!(command.gripper == 0 || command.gripper == 1);
    }
}

#[test]
fn reconnect_after_unexpected_disconnect() {
    let (mut teleop, handle) = connected_teleop();
    let config = PipelineConfig::default();
    teleop.tick(&config, None);

    handle.drop_connection("gatt server disconnected");
    let outcome = teleop.tick(&config, None);
    assert!(outcome.event.is_some());
    assert_eq!(teleop.link_state(), LinkState::Disconnected);

    // 断开期间流水线继续运行
    let outcome = teleop.tick(&config, Some(&hand(0.9, 0.5, 0.15, 0.2)));
    assert_eq!(outcome.dispatch, Dispatch::Offline);
    assert!(outcome.report.hand_present);

    teleop.connect(&DeviceSelector::default()).unwrap();
    let outcome = teleop.tick(&config, Some(&hand(0.9, 0.5, 0.15, 0.2)));
    assert!(matches!(outcome.dispatch, Dispatch::Sent(_)));
}
