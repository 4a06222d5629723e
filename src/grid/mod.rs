//! 像素对网格模块
//!
//! 5个像素 → 10个像素对，驱动相关器和直方图，并把结果交给渲染器。

pub mod analyzer;
pub mod pixel_streams;
pub mod selection;

pub use analyzer::{
    ExecutionMode, GridAnalyzer, GridRenderer, GridReport, PairHistogram, PairOutcome, PairResult,
};
pub use pixel_streams::PixelStreams;
pub use selection::{PixelId, PixelPair, PixelSelection};
