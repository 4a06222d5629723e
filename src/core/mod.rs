//! 核心算法模块
//!
//! 时间戳流模型、成对符合相关器、Δt直方图与峰值定位。

pub mod config;
pub mod correlator;
pub mod histogram;
pub mod stream;

// 重新导出公共接口
pub use config::CorrelationConfig;
pub use correlator::{DeltaSet, PairCorrelator, correlate};
pub use histogram::{DeltaHistogram, HistogramBin, HistogramPeak, analyze_deltas};
pub use stream::{TimestampStream, is_valid_timestamp};
