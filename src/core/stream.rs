//! 单像素时间戳流模型
//!
//! 一个像素的时间戳按采集周期（acquisition cycle）等长切分，
//! 用 `INVALID_TIMESTAMP` 标记没有探测事件的槽位。

use crate::error::{CorrelationError, CorrelationResult};
use crate::tools::constants::sensor::INVALID_TIMESTAMP;

/// 判断原始时间戳是否为真实探测事件
#[inline]
pub fn is_valid_timestamp(value: i64) -> bool {
    value != INVALID_TIMESTAMP
}

/// 单像素时间戳流（只读快照）
///
/// 不变量：
/// - `cycle_length > 0`
/// - `len > 0` 且 `len % cycle_length == 0`（每个采集周期一份）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampStream {
    values: Vec<i64>,
    cycle_length: usize,
}

impl TimestampStream {
    /// 创建时间戳流并校验周期不变量
    pub fn new(values: Vec<i64>, cycle_length: usize) -> CorrelationResult<Self> {
        if cycle_length == 0 {
            return Err(CorrelationError::MalformedStream(
                "采集周期长度必须大于0".to_string(),
            ));
        }

        if values.is_empty() {
            return Err(CorrelationError::MalformedStream(
                "时间戳流为空，至少需要一个采集周期".to_string(),
            ));
        }

        if values.len() % cycle_length != 0 {
            return Err(CorrelationError::MalformedStream(format!(
                "长度 {} 不是采集周期长度 {} 的整数倍",
                values.len(),
                cycle_length
            )));
        }

        Ok(Self {
            values,
            cycle_length,
        })
    }

    /// 总长度（所有采集周期的槽位数）
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 构造后永远非空，保留该方法以配合 `len()`
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn cycle_length(&self) -> usize {
        self.cycle_length
    }

    /// 采集周期数量
    #[inline]
    pub fn cycle_count(&self) -> usize {
        self.values.len() / self.cycle_length
    }

    /// 读取指定索引的原始值（包括无效标记），越界返回None
    #[inline]
    pub fn value_at(&self, index: usize) -> Option<i64> {
        self.values.get(index).copied()
    }

    /// 指定索引是否为真实时间戳；越界视为无效
    #[inline]
    pub fn is_valid(&self, index: usize) -> bool {
        self.value_at(index).is_some_and(is_valid_timestamp)
    }

    /// 原始数据切片
    #[inline]
    pub fn values(&self) -> &[i64] {
        &self.values
    }

    /// 第 `k` 个采集周期（从0开始）的切片
    pub fn cycle(&self, k: usize) -> Option<&[i64]> {
        let start = k.checked_mul(self.cycle_length)?;
        let end = start.checked_add(self.cycle_length)?;
        self.values.get(start..end)
    }

    /// 真实探测事件数量
    pub fn valid_count(&self) -> usize {
        self.values
            .iter()
            .filter(|&&value| is_valid_timestamp(value))
            .count()
    }
}
