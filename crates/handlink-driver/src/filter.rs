//! 滑动平均滤波
//!
//! 每个关节维护最近 N 个原始角度的 FIFO 窗口，输出为窗口内样本的算术平均。
//! 窗口清空后刚开始的几帧样本不足 N 个，此时按实际样本数求平均，
//! 以稍弱的平滑换取更快的恢复。

use crate::state::{Joint, JointArray};
use std::collections::VecDeque;

/// 单关节滑动平均窗口
#[derive(Debug, Clone, PartialEq)]
pub struct FilterWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl FilterWindow {
    /// 创建窗口，容量至少为 1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// 压入新样本并返回当前平均值
    pub fn push(&mut self, sample: f64) -> f64 {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
        self.mean().unwrap_or(sample)
    }

    /// 当前平均值，窗口为空时返回 None
    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }

    /// 修改容量；缩小时丢弃最旧的样本
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// 三个关节的滤波窗口
#[derive(Debug, Clone, PartialEq)]
pub struct FilterBank {
    windows: [FilterWindow; 3],
}

impl FilterBank {
    pub fn new(capacity: usize) -> Self {
        Self {
            windows: std::array::from_fn(|_| FilterWindow::new(capacity)),
        }
    }

    /// 压入一帧原始角度，返回各关节的平均值
    ///
    /// `capacity` 每帧从配置读取，变化时各窗口同步调整。
    pub fn push(&mut self, raw: JointArray<f64>, capacity: usize) -> JointArray<f64> {
        raw.map_with_joint(|joint, sample| {
            let window = &mut self.windows[joint.index()];
            if window.capacity() != capacity.max(1) {
                window.set_capacity(capacity);
            }
            window.push(sample)
        })
    }

    /// 同时清空所有窗口（信号丢失时调用）
    pub fn clear(&mut self) {
        for window in &mut self.windows {
            window.clear();
        }
    }

    pub fn window(&self, joint: Joint) -> &FilterWindow {
        &self.windows[joint.index()]
    }

    /// 所有窗口是否均为空
    pub fn is_empty(&self) -> bool {
        self.windows.iter().all(FilterWindow::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_under_full_window_averages_available_samples() {
        let mut window = FilterWindow::new(3);
        assert_eq!(window.push(10.0), 10.0);
        assert_eq!(window.push(20.0), 15.0);
        assert_eq!(window.push(30.0), 20.0);
    }

    #[test]
    fn test_eviction_drops_oldest() {
        let mut window = FilterWindow::new(3);
        for v in [100.0, 10.0, 20.0] {
            window.push(v);
        }
        // 第 N+1 个样本挤出第一个
        assert_eq!(window.push(30.0), 20.0);
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn test_clear_restarts_from_empty() {
        let mut window = FilterWindow::new(3);
        window.push(50.0);
        window.push(70.0);
        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.mean(), None);
        assert_eq!(window.push(5.0), 5.0);
    }

    #[test]
    fn test_zero_capacity_is_treated_as_one() {
        let mut window = FilterWindow::new(0);
        assert_eq!(window.capacity(), 1);
        window.push(1.0);
        assert_eq!(window.push(2.0), 2.0);
    }

    #[test]
    fn test_shrinking_capacity_keeps_newest() {
        let mut window = FilterWindow::new(5);
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            window.push(v);
        }
        window.set_capacity(2);
        assert_eq!(window.mean(), Some(4.5));
    }

    #[test]
    fn test_bank_clears_atomically() {
        let mut bank = FilterBank::new(3);
        bank.push(JointArray::new([1.0, 2.0, 3.0]), 3);
        assert!(!bank.is_empty());
        bank.clear();
        assert!(bank.is_empty());
        for joint in Joint::ALL {
            assert!(bank.window(joint).is_empty());
        }
    }

    #[test]
    fn test_bank_follows_capacity_changes() {
        let mut bank = FilterBank::new(3);
        for v in [10.0, 20.0, 30.0] {
            bank.push(JointArray::splat(v), 3);
        }
        let out = bank.push(JointArray::splat(40.0), 1);
        assert_eq!(out, JointArray::splat(40.0));
        assert_eq!(bank.window(Joint::Base).capacity(), 1);
    }

    proptest! {
        #[test]
        fn prop_mean_of_k_samples(
            samples in prop::collection::vec(0.0f64..180.0, 1..=5),
        ) {
            let mut window = FilterWindow::new(5);
            let mut last = 0.0;
            for s in &samples {
                last = window.push(*s);
            }
            let expected = samples.iter().sum::<f64>() / samples.len() as f64;
            prop_assert!((last - expected).abs() < 1e-9);
        }

        #[test]
        fn prop_overflow_excludes_first(
            samples in prop::collection::vec(0.0f64..180.0, 4..=4),
        ) {
            let n = 3;
            let mut window = FilterWindow::new(n);
            let mut last = 0.0;
            for s in &samples {
                last = window.push(*s);
            }
            let expected = samples[1..].iter().sum::<f64>() / n as f64;
            prop_assert!((last - expected).abs() < 1e-9);
        }
    }
}
