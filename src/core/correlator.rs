//! 成对符合相关器
//!
//! 对两个像素的时间戳流，在同一采集周期内做全组合扫描：
//! A中每个有效事件与B当前周期窗口内的所有有效事件求差，
//! 只保留落在符合窗口 `[-W, W]` 内的 Δt。
//!
//! ## 周期计数规则
//!
//! 周期计数 `acq` 从0开始，只在扫描到**有效**的A事件、且其索引是周期长度的
//! 整数倍时加一。因此周期首槽位无效时，该周期剩余事件仍按上一个周期匹配；
//! `acq == 0` 时（首个周期首槽位无效）候选索引越界，直接跳过。

use super::config::{CorrelationConfig, validate_window};
use super::stream::{TimestampStream, is_valid_timestamp};
use crate::error::{CorrelationError, CorrelationResult};

/// 一个像素对的 Δt 多重集（保留重复值）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeltaSet {
    deltas: Vec<i64>,
}

impl DeltaSet {
    pub fn from_vec(deltas: Vec<i64>) -> Self {
        Self { deltas }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    pub fn min(&self) -> Option<i64> {
        self.deltas.iter().copied().min()
    }

    pub fn max(&self) -> Option<i64> {
        self.deltas.iter().copied().max()
    }

    #[inline]
    pub fn as_slice(&self) -> &[i64] {
        &self.deltas
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.deltas.iter().copied()
    }

    pub fn into_vec(self) -> Vec<i64> {
        self.deltas
    }

    /// 排序后的副本（多重集比较用）
    pub fn sorted(&self) -> Vec<i64> {
        let mut sorted = self.deltas.clone();
        sorted.sort_unstable();
        sorted
    }
}

/// 扫描状态：当前采集周期计数 + 已保留的 Δt
struct ScanState {
    acq: usize,
    deltas: Vec<i64>,
}

/// 绑定了符合窗口的相关器
#[derive(Debug, Clone, Copy)]
pub struct PairCorrelator {
    window_ps: i64,
}

impl PairCorrelator {
    /// 从配置创建相关器（负窗口在此处报错）
    pub fn new(config: &CorrelationConfig) -> CorrelationResult<Self> {
        Self::with_window(config.window_ps)
    }

    pub fn with_window(window_ps: i64) -> CorrelationResult<Self> {
        validate_window(window_ps)?;
        Ok(Self { window_ps })
    }

    #[inline]
    pub fn window_ps(&self) -> i64 {
        self.window_ps
    }

    /// 计算两个流之间的 Δt = A[j] - B[n]
    ///
    /// 长度不同的流也允许，B侧越界的候选索引直接跳过。
    pub fn correlate(
        &self,
        a: &TimestampStream,
        b: &TimestampStream,
    ) -> CorrelationResult<DeltaSet> {
        if a.cycle_length() != b.cycle_length() {
            return Err(CorrelationError::MalformedStream(format!(
                "两个流的采集周期长度不一致: {} vs {}",
                a.cycle_length(),
                b.cycle_length()
            )));
        }

        let cycle = a.cycle_length();
        let window = self.window_ps;
        let b_values = b.values();

        let state = a
            .values()
            .iter()
            .enumerate()
            .filter(|&(_, &value)| is_valid_timestamp(value))
            .fold(
                ScanState {
                    acq: 0,
                    deltas: Vec::new(),
                },
                |mut state, (j, &a_value)| {
                    if j % cycle == 0 {
                        state.acq += 1;
                    }
                    if state.acq == 0 {
                        return state;
                    }

                    let start = cycle * (state.acq - 1);
                    let end = (start + cycle).min(b_values.len());
                    if start >= end {
                        return state;
                    }

                    state.deltas.extend(
                        b_values[start..end]
                            .iter()
                            .filter(|&&b_value| is_valid_timestamp(b_value))
                            .filter_map(|&b_value| a_value.checked_sub(b_value))
                            .filter(|delta| (-window..=window).contains(delta)),
                    );
                    state
                },
            );

        Ok(DeltaSet::from_vec(state.deltas))
    }
}

/// 便捷函数：用给定窗口相关两个流
pub fn correlate(
    a: &TimestampStream,
    b: &TimestampStream,
    window_ps: i64,
) -> CorrelationResult<DeltaSet> {
    PairCorrelator::with_window(window_ps)?.correlate(a, b)
}
