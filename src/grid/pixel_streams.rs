//! 像素 → 时间戳流 的只读集合（加载器交给核心的数据）
//!
//! 加载时未通过校验的像素单独记录原因，只让涉及它的像素对失败。

use super::selection::PixelId;
use crate::core::TimestampStream;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct PixelStreams {
    streams: BTreeMap<PixelId, TimestampStream>,
    rejected: BTreeMap<PixelId, String>,
}

impl PixelStreams {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入一个像素的流，返回被替换的旧流
    pub fn insert(&mut self, pixel: PixelId, stream: TimestampStream) -> Option<TimestampStream> {
        self.rejected.remove(&pixel);
        self.streams.insert(pixel, stream)
    }

    /// 记录一个校验失败的像素
    pub fn reject(&mut self, pixel: PixelId, reason: impl Into<String>) {
        self.streams.remove(&pixel);
        self.rejected.insert(pixel, reason.into());
    }

    /// 像素被拒绝的原因
    pub fn rejection(&self, pixel: PixelId) -> Option<&str> {
        self.rejected.get(&pixel).map(String::as_str)
    }

    pub fn rejected_ids(&self) -> Vec<PixelId> {
        self.rejected.keys().copied().collect()
    }

    #[inline]
    pub fn get(&self, pixel: PixelId) -> Option<&TimestampStream> {
        self.streams.get(&pixel)
    }

    pub fn contains(&self, pixel: PixelId) -> bool {
        self.streams.contains_key(&pixel)
    }

    /// 按像素编号升序
    pub fn pixel_ids(&self) -> Vec<PixelId> {
        self.streams.keys().copied().collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

impl FromIterator<(PixelId, TimestampStream)> for PixelStreams {
    fn from_iter<I: IntoIterator<Item = (PixelId, TimestampStream)>>(iter: I) -> Self {
        Self {
            streams: iter.into_iter().collect(),
            rejected: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_and_reinsert() {
        let mut streams = PixelStreams::new();
        streams.insert(1, TimestampStream::new(vec![1, 2], 2).unwrap());
        streams.reject(1, "像素 1: 长度不符");

        assert!(!streams.contains(1));
        assert_eq!(streams.rejection(1), Some("像素 1: 长度不符"));
        assert_eq!(streams.rejected_ids(), vec![1]);

        streams.insert(1, TimestampStream::new(vec![1, 2], 2).unwrap());
        assert!(streams.contains(1));
        assert_eq!(streams.rejection(1), None);
    }
}
