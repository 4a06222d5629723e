//! 工具模块集合
//!
//! 包含CLI、文件加载与扫描、格式化等工具模块，支持main.rs的流程控制。

pub mod batch_state;
pub mod cli;
pub mod constants;
pub mod formatter;
pub mod loader;
pub mod processor;
pub mod scanner;
pub mod utils;

// 重新导出主要的公共接口
pub use batch_state::{BatchStats, BatchStatsSnapshot, show_batch_summary};
pub use cli::{AppConfig, parse_args, parse_args_from, show_completion_info, show_startup_info};
pub use formatter::{GridDocument, JsonReportRenderer, PairRecord, TableRenderer, read_report};
pub use loader::{StreamFile, load_stream_file, parse_stream_json, save_stream_file};
pub use processor::{FileOutcome, process_batch, process_stream_file, process_streams};
pub use scanner::{scan_stream_files, show_scan_results};
pub use utils::path;
