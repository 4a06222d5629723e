//! 时间戳文件加载
//!
//! 读取已解包的像素时间戳（JSON），转换为核心使用的 `PixelStreams`。
//! LinoSPAD2原始二进制的解包由外部服务完成，这里只消费其输出。
//!
//! 文件格式：
//!
//! ```json
//! { "cycle_length": 512, "pixels": { "3": [12, -1, 4051, ...], "4": [...] } }
//! ```

use crate::core::TimestampStream;
use crate::error::{CorrelationError, CorrelationResult, format_error};
use crate::grid::{PixelId, PixelStreams};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// 时间戳文件的序列化结构
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamFile {
    /// 缺省时使用命令行/配置中的周期长度
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle_length: Option<usize>,

    /// 像素编号 → 原始时间戳（-1 表示无事件）
    pub pixels: BTreeMap<PixelId, Vec<i64>>,
}

impl StreamFile {
    /// 校验每个像素的流并构建 `PixelStreams`
    ///
    /// 单个像素的流不合法时只记录到拒绝列表，不影响其他像素；
    /// 它是否导致失败由网格分析时是否被选中决定。
    pub fn into_streams(self, default_cycle_length: usize) -> CorrelationResult<PixelStreams> {
        let cycle_length = self.cycle_length.unwrap_or(default_cycle_length);

        if self.pixels.is_empty() {
            return Err(CorrelationError::FormatError(
                "文件中没有任何像素数据".to_string(),
            ));
        }

        let mut streams = PixelStreams::new();
        for (pixel, values) in self.pixels {
            match TimestampStream::new(values, cycle_length) {
                Ok(stream) => {
                    streams.insert(pixel, stream);
                }
                Err(CorrelationError::MalformedStream(reason)) => {
                    debug!(pixel, %reason, "像素时间戳流未通过校验");
                    streams.reject(pixel, reason);
                }
                Err(other) => return Err(other),
            }
        }
        Ok(streams)
    }
}

/// 从JSON文本解析
pub fn parse_stream_json(
    text: &str,
    default_cycle_length: usize,
) -> CorrelationResult<PixelStreams> {
    let file: StreamFile = serde_json::from_str(text)?;
    file.into_streams(default_cycle_length)
}

/// 读取并解析时间戳文件
pub fn load_stream_file(
    path: &Path,
    default_cycle_length: usize,
) -> CorrelationResult<PixelStreams> {
    let text = std::fs::read_to_string(path)?;
    let file: StreamFile =
        serde_json::from_str(&text).map_err(|e| format_error(&path.display().to_string(), e))?;
    file.into_streams(default_cycle_length)
}

/// 写出时间戳文件（测试数据和外部解包器的对接格式）
pub fn save_stream_file(path: &Path, file: &StreamFile) -> CorrelationResult<()> {
    let text = serde_json::to_string(file)?;
    std::fs::write(path, text)?;
    Ok(())
}
