//! LinoSPAD2 delta-t grid - 主程序入口
//!
//! 纯流程控制器，负责协调各个工具模块完成符合时间分析任务。

use linospad_delta_t::{
    error::{CorrelationError, ErrorCategory},
    tools::{self, AppConfig},
};
use std::process;
use tracing_subscriber::EnvFilter;

/// 错误退出码定义
mod exit_codes {
    /// 通用错误
    pub const GENERAL_ERROR: i32 = 1;
    /// 格式/输入错误
    pub const FORMAT_ERROR: i32 = 2;
    /// 配置错误（窗口、bin宽度、像素选择）
    pub const CONFIG_ERROR: i32 = 3;
    /// 资源/并发错误
    pub const RESOURCE_ERROR: i32 = 5;
}

/// 获取错误建议文本
fn get_error_suggestion(error: &CorrelationError) -> &'static str {
    match error {
        CorrelationError::InvalidInput(_) => {
            "检查命令行参数是否正确，使用 --help 查看完整用法 / Check if command-line arguments are correct, use --help to see full usage"
        }
        CorrelationError::ResourceError(_) => {
            "资源不可用，请使用 --serial 或降低 --threads / Resource unavailable, try --serial or a lower --threads"
        }
        _ => match ErrorCategory::from_error(error) {
            ErrorCategory::Io => {
                "检查文件路径是否正确，文件是否存在且可读 / Check if file path is correct, file exists and is readable"
            }
            ErrorCategory::Format => {
                "确保输入为时间戳JSON文件，且每个像素的数据长度是周期长度的整数倍 / Ensure input is a timestamp JSON file whose pixel arrays are whole cycles"
            }
            ErrorCategory::Config => {
                "检查 --window 和 --bin-width 的取值 / Check --window and --bin-width values"
            }
            ErrorCategory::NoCoincidence => {
                "尝试增大 --window / Try a wider --window"
            }
            ErrorCategory::Other => {
                "请检查输入文件和参数设置 / Please check input file and parameter settings"
            }
        },
    }
}

/// 错误处理和建议
fn handle_error(error: CorrelationError) -> ! {
    eprintln!("[ERROR] 错误 / Error: {error}");
    eprintln!("[INFO] 建议 / Suggestion: {}", get_error_suggestion(&error));

    let exit_code = match &error {
        CorrelationError::InvalidInput(_) => exit_codes::FORMAT_ERROR,
        CorrelationError::ResourceError(_) => exit_codes::RESOURCE_ERROR,
        _ => match ErrorCategory::from_error(&error) {
            ErrorCategory::Format => exit_codes::FORMAT_ERROR,
            ErrorCategory::Config => exit_codes::CONFIG_ERROR,
            ErrorCategory::Io | ErrorCategory::NoCoincidence | ErrorCategory::Other => {
                exit_codes::GENERAL_ERROR
            }
        },
    };

    process::exit(exit_code);
}

/// 初始化日志：RUST_LOG 优先，否则默认 warn（--verbose 时 debug），输出到stderr
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 重复初始化时静默失败
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// 批量处理目录中的时间戳文件
fn process_batch_mode(config: &AppConfig) -> Result<(), CorrelationError> {
    let stream_files = tools::scan_stream_files(&config.input_path)?;
    tools::show_scan_results(config, &stream_files);

    if stream_files.is_empty() {
        return Ok(());
    }

    let snapshot = tools::process_batch(config, &stream_files)?;
    tools::show_batch_summary(&snapshot);
    Ok(())
}

/// 单文件处理模式
fn process_single_mode(config: &AppConfig) -> Result<(), CorrelationError> {
    let outcome = tools::process_stream_file(&config.input_path, config)?;
    let report = &outcome.report;

    println!(
        "[INFO] 符合 / Coincidence: {}，无符合 / None: {}，失败 / Failed: {}",
        report.coincidence_count(),
        report.no_coincidence_count(),
        report.failed_count()
    );
    println!("[INFO] 报告 / Report: {}", outcome.report_path.display());
    Ok(())
}

/// 应用程序主逻辑（便于测试和复用）
fn run() -> Result<(), CorrelationError> {
    // 1. 解析命令行参数
    let config = tools::parse_args()?;
    init_tracing(config.verbose);

    // 2. 显示启动信息
    tools::show_startup_info(&config);

    // 3. 根据模式选择处理方式
    if config.is_batch_mode() {
        process_batch_mode(&config)?;
    } else {
        process_single_mode(&config)?;
    }

    tools::show_completion_info(&config);
    Ok(())
}

fn main() {
    if let Err(error) = run() {
        handle_error(error);
    }
}
