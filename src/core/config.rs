//! 相关性分析配置
//!
//! 周期长度、符合窗口、bin宽度三个常量由核心持有，调用方可覆盖。

use crate::error::{CorrelationError, CorrelationResult};
use crate::tools::constants::{defaults, histogram_limits};
use serde::{Deserialize, Serialize};

/// 一次网格分析共享的配置（运行期间不可变）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationConfig {
    /// 每个采集周期的数据行数
    pub cycle_length: usize,

    /// 对称符合窗口（皮秒）
    pub window_ps: i64,

    /// 直方图bin宽度（皮秒）
    pub bin_width: f64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            cycle_length: defaults::CYCLE_LENGTH,
            window_ps: defaults::COINCIDENCE_WINDOW_PS,
            bin_width: defaults::BIN_WIDTH_PS,
        }
    }
}

impl CorrelationConfig {
    /// 校验配置，必须在任何相关计算之前调用
    pub fn validate(&self) -> CorrelationResult<()> {
        validate_window(self.window_ps)?;
        validate_bin_width(self.bin_width)?;
        // 窗口内 Δt 的跨度最多为 2W
        validate_bin_count(2.0 * self.window_ps as f64, self.bin_width)?;

        if self.cycle_length == 0 {
            return Err(CorrelationError::InvalidInput(
                "采集周期长度必须大于0".to_string(),
            ));
        }

        Ok(())
    }
}

#[inline]
pub(crate) fn validate_window(window_ps: i64) -> CorrelationResult<()> {
    if window_ps < 0 {
        return Err(CorrelationError::WindowConfig(window_ps));
    }
    Ok(())
}

#[inline]
pub(crate) fn validate_bin_width(bin_width: f64) -> CorrelationResult<()> {
    if !bin_width.is_finite() || bin_width <= 0.0 {
        return Err(CorrelationError::InvalidInput(format!(
            "bin宽度必须为正有限值: {bin_width}"
        )));
    }
    Ok(())
}

/// 跨度 `span` 按 `bin_width` 切分后的bin数不能超过上限
#[inline]
pub(crate) fn validate_bin_count(span: f64, bin_width: f64) -> CorrelationResult<()> {
    let bins = (span / bin_width).ceil();
    if bins > histogram_limits::MAX_BINS as f64 {
        return Err(CorrelationError::InvalidInput(format!(
            "直方图bin数 {bins} 超过上限 {}，请增大bin宽度或缩小符合窗口",
            histogram_limits::MAX_BINS
        )));
    }
    Ok(())
}
