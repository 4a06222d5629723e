//! Δt 直方图与峰值定位
//!
//! 以 `min(Δt)` 为起点、固定宽度切分bin，最后一条边恰好落在 `max(Δt)`，
//! 因此最后一个bin可能比其他bin窄。
//!
//! ## 边界归属规则
//!
//! - 全局最小值归入第一个bin
//! - 恰好落在内部共享边上的值归入**较低索引**的bin
//! - 全局最大值归入最后一个bin
//!
//! 峰值位置对这一规则敏感，修改前请确认下游是否依赖旧的归属方式。

use super::config::{validate_bin_count, validate_bin_width};
use super::correlator::DeltaSet;
use crate::error::{CorrelationError, CorrelationResult};

/// 直方图峰值
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramPeak {
    /// 峰值bin的索引（并列时取最小索引）
    pub bin_index: usize,

    /// 峰值bin中心（皮秒）
    pub position: f64,

    /// 峰值bin计数
    pub count: u64,
}

impl HistogramPeak {
    /// 两位小数格式的峰值位置（用于图表标题和报告）
    pub fn formatted(&self) -> String {
        format!("{:.2}", self.position)
    }
}

/// 单个bin的只读视图
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub lower_edge: f64,
    pub upper_edge: f64,
    pub count: u64,
}

/// 固定宽度的 Δt 直方图
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaHistogram {
    /// bin边（长度 = bin数 + 1）
    edges: Vec<f64>,

    /// 每个bin的计数
    counts: Vec<u64>,

    bin_width: f64,
}

impl DeltaHistogram {
    /// 对非空 Δt 集合建立直方图
    ///
    /// # 错误
    ///
    /// - `EmptyDeltaSet`：没有任何符合事件，不存在峰值
    /// - `InvalidInput`：bin宽度不是正有限值，或bin数超过上限
    pub fn build(deltas: &DeltaSet, bin_width: f64) -> CorrelationResult<Self> {
        Self::from_values(deltas.as_slice(), bin_width)
    }

    /// 直接从 Δt 切片建立直方图
    pub fn from_values(values: &[i64], bin_width: f64) -> CorrelationResult<Self> {
        validate_bin_width(bin_width)?;

        let (Some(&min), Some(&max)) = (values.iter().min(), values.iter().max()) else {
            return Err(CorrelationError::EmptyDeltaSet);
        };

        validate_bin_count(max as f64 - min as f64, bin_width)?;
        let edges = compute_edges(min as f64, max as f64, bin_width);
        let mut counts = vec![0u64; edges.len() - 1];

        for &value in values {
            counts[bin_index(&edges, value as f64)] += 1;
        }

        Ok(Self {
            edges,
            counts,
            bin_width,
        })
    }

    #[inline]
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    #[inline]
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    #[inline]
    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    #[inline]
    pub fn bin_count(&self) -> usize {
        self.counts.len()
    }

    /// 所有bin计数之和（等于 Δt 数量）
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// 按升序遍历所有bin
    pub fn bins(&self) -> impl Iterator<Item = HistogramBin> + '_ {
        self.edges
            .windows(2)
            .zip(&self.counts)
            .map(|(edge, &count)| HistogramBin {
                lower_edge: edge[0],
                upper_edge: edge[1],
                count,
            })
    }

    /// 计数最大的bin中心；并列时取第一个
    pub fn peak(&self) -> HistogramPeak {
        let (bin_index, count) = self.counts.iter().copied().enumerate().fold(
            (0usize, 0u64),
            |(best_index, best_count), (index, count)| {
                if count > best_count {
                    (index, count)
                } else {
                    (best_index, best_count)
                }
            },
        );

        HistogramPeak {
            bin_index,
            position: (self.edges[bin_index] + self.edges[bin_index + 1]) / 2.0,
            count,
        }
    }
}

/// bin边：`min + k·width`（严格小于max的部分）再加上 `max` 本身
///
/// `min == max` 时得到 `[v, v]`，即单个零宽bin。
fn compute_edges(min: f64, max: f64, bin_width: f64) -> Vec<f64> {
    let mut edges = vec![min];
    let mut k = 1u64;
    loop {
        let edge = min + k as f64 * bin_width;
        if edge >= max {
            break;
        }
        edges.push(edge);
        k += 1;
    }
    edges.push(max);
    edges
}

/// 右闭区间归属：第一个 `>= value` 的边决定bin，第一个bin同时包含最小值
#[inline]
fn bin_index(edges: &[f64], value: f64) -> usize {
    let last_bin = edges.len() - 2;
    edges
        .partition_point(|&edge| edge < value)
        .saturating_sub(1)
        .min(last_bin)
}

/// 对 Δt 集合一步完成建直方图和找峰值
pub fn analyze_deltas(
    deltas: &DeltaSet,
    bin_width: f64,
) -> CorrelationResult<(DeltaHistogram, HistogramPeak)> {
    let histogram = DeltaHistogram::build(deltas, bin_width)?;
    let peak = histogram.peak();
    Ok((histogram, peak))
}
