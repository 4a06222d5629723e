//! LinoSPAD2 delta-t coincidence grid
//!
//! 对LinoSPAD2单光子探测器阵列的5个像素两两计算同一采集周期内的
//! 时间戳差（Δt），在符合窗口内统计直方图并定位峰值。
//!
//! ## 核心特性
//! - 按采集周期对齐的成对符合相关器（±W 皮秒窗口）
//! - 固定宽度bin的Δt直方图，峰值取计数最大bin的中点
//! - 5像素 → 10像素对的网格枚举，串行或rayon并行，输出顺序一致
//! - 单个像素对失败不影响其他像素对

pub mod core;
pub mod error;
pub mod grid;
pub mod tools;

// 重新导出核心类型
pub use core::{
    CorrelationConfig, DeltaHistogram, DeltaSet, HistogramPeak, PairCorrelator, TimestampStream,
};
pub use error::{CorrelationError, CorrelationResult, ErrorCategory};
pub use grid::{
    ExecutionMode, GridAnalyzer, GridRenderer, GridReport, PairOutcome, PairResult, PixelSelection,
    PixelStreams,
};
