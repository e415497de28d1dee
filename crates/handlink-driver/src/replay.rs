//! 录制回放姿态来源
//!
//! 每行一帧 JSON：21 个关键点的数组，或者 `null` 表示这一帧没有检测到手。
//! 空行忽略。
//!
//! ```text
//! [{"x":0.52,"y":0.61,"z":0.0}, ... 21 个点 ...]
//! null
//! ```

use crate::DriverError;
use crate::landmark::{HandLandmarks, PoseSource};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// 录制回放
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    frames: Vec<Option<HandLandmarks>>,
    cursor: usize,
    looping: bool,
}

impl ReplaySource {
    pub fn new(frames: Vec<Option<HandLandmarks>>) -> Self {
        Self {
            frames,
            cursor: 0,
            looping: false,
        }
    }

    /// 回放到末尾后从头开始
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, DriverError> {
        let file = File::open(path.as_ref())?;
        let source = Self::from_reader(BufReader::new(file))?;
        debug!(
            "Loaded {} frames from {}",
            source.len(),
            path.as_ref().display()
        );
        Ok(source)
    }

    /// 逐行解析；任一行格式错误时返回带行号的错误
    pub fn from_reader(reader: impl BufRead) -> Result<Self, DriverError> {
        let mut frames = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let frame: Option<HandLandmarks> = serde_json::from_str(line).map_err(|e| {
                DriverError::Replay {
                    line: index + 1,
                    reason: e.to_string(),
                }
            })?;
            frames.push(frame);
        }
        Ok(Self::new(frames))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// 剩余帧数（循环模式下无意义）
    pub fn remaining(&self) -> usize {
        self.frames.len().saturating_sub(self.cursor)
    }
}

impl PoseSource for ReplaySource {
    fn detect(&mut self) -> Option<HandLandmarks> {
        if self.cursor >= self.frames.len() {
            if !self.looping || self.frames.is_empty() {
                return None;
            }
            self.cursor = 0;
        }
        let frame = self.frames[self.cursor];
        self.cursor += 1;
        frame
    }

    fn is_exhausted(&self) -> bool {
        self.frames.is_empty() || (!self.looping && self.cursor >= self.frames.len())
    }
}

/// 逐帧脚本来源（测试和演示用）
impl PoseSource for VecDeque<Option<HandLandmarks>> {
    fn detect(&mut self) -> Option<HandLandmarks> {
        self.pop_front().flatten()
    }

    fn is_exhausted(&self) -> bool {
        self.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::test_support::hand;
    use std::io::Cursor;

    fn recording() -> String {
        let frame = serde_json::to_string(&hand(0.25, 0.5, 0.1, 0.2)).unwrap();
        format!("{frame}\nnull\n\n{frame}\n")
    }

    #[test]
    fn test_parse_lines() {
        let source = ReplaySource::from_reader(Cursor::new(recording())).unwrap();
        assert_eq!(source.len(), 3);
        assert_eq!(source.remaining(), 3);
    }

    #[test]
    fn test_replay_in_order_then_exhausted() {
        let mut source = ReplaySource::from_reader(Cursor::new(recording())).unwrap();
        assert!(source.detect().is_some());
        assert!(source.detect().is_none());
        assert!(!source.is_exhausted());
        let last = source.detect().unwrap();
        assert_eq!(last.wrist().x, 0.25);
        assert!(source.is_exhausted());
        assert!(source.detect().is_none());
    }

    #[test]
    fn test_looping() {
        let mut source = ReplaySource::new(vec![Some(hand(0.1, 0.1, 0.1, 0.1)), None]).looping(true);
        for _ in 0..3 {
            assert!(source.detect().is_some());
            assert!(source.detect().is_none());
        }
        assert!(!source.is_exhausted());
    }

    #[test]
    fn test_bad_line_reports_line_number() {
        let text = format!("null\n[1, 2, 3]\n{}", recording());
        let err = ReplaySource::from_reader(Cursor::new(text)).unwrap_err();
        match err {
            DriverError::Replay { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_wrong_point_count_rejected() {
        let err = ReplaySource::from_reader(Cursor::new("[{\"x\":0.1,\"y\":0.2}]")).unwrap_err();
        assert!(err.to_string().contains("21"), "{}", err);
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ReplaySource::open(dir.path().join("nope.jsonl")).unwrap_err();
        assert!(matches!(err, DriverError::Io(_)));
    }
}
