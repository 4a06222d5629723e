//! 批处理状态管理模块
//!
//! 批量模式下逐文件累计成功/失败数，并按错误类别归档失败文件名。
//! 单个文件失败不影响后续文件。

use crate::error::{CorrelationError, ErrorCategory};
use crate::grid::GridReport;
use std::collections::BTreeMap;

/// 批处理统计快照
#[derive(Debug, Clone, Default)]
pub struct BatchStatsSnapshot {
    /// 成功处理的文件数
    pub processed: usize,
    /// 失败的文件数
    pub failed: usize,
    /// 所有成功文件中得到符合峰的像素对总数
    pub coincidence_pairs: usize,
    /// 所有成功文件中失败的像素对总数
    pub failed_pairs: usize,
    /// 错误分类统计（错误类型 -> 失败文件列表）
    pub error_stats: BTreeMap<ErrorCategory, Vec<String>>,
}

impl BatchStatsSnapshot {
    pub fn total(&self) -> usize {
        self.processed + self.failed
    }

    /// 成功率（百分比）；没有文件时为 0
    pub fn success_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.processed as f64 / total as f64 * 100.0,
        }
    }
}

/// 批处理统计（串行累加）
#[derive(Debug, Default)]
pub struct BatchStats {
    inner: BatchStatsSnapshot,
}

impl BatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一个成功文件，返回累计成功数
    #[inline]
    pub fn record_success(&mut self, report: &GridReport) -> usize {
        self.inner.processed += 1;
        self.inner.coincidence_pairs += report.coincidence_count();
        self.inner.failed_pairs += report.failed_count();
        self.inner.processed
    }

    /// 记录一个失败文件并归类，返回累计失败数
    pub fn record_failure(&mut self, error: &CorrelationError, filename: String) -> usize {
        let category = ErrorCategory::from_error(error);
        self.inner.failed += 1;
        self.inner
            .error_stats
            .entry(category)
            .or_default()
            .push(filename);
        self.inner.failed
    }

    pub fn snapshot(&self) -> BatchStatsSnapshot {
        self.inner.clone()
    }
}

/// 显示批量处理汇总
pub fn show_batch_summary(snapshot: &BatchStatsSnapshot) {
    println!();
    println!("[INFO] 批量处理完成 / Batch finished");
    println!(
        "   成功处理 / Processed: {} / {} ({:.1}%)",
        snapshot.processed,
        snapshot.total(),
        snapshot.success_rate()
    );
    println!(
        "   符合像素对 / Coincidence pairs: {}",
        snapshot.coincidence_pairs
    );
    if snapshot.failed_pairs > 0 {
        println!("   失败像素对 / Failed pairs: {}", snapshot.failed_pairs);
    }

    if snapshot.failed > 0 {
        println!("   失败文件 / Failed files: {}", snapshot.failed);
        for (category, files) in &snapshot.error_stats {
            println!("      [{}] {}", category.display_name(), files.join(", "));
        }
    }
}
