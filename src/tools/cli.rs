//! 命令行接口模块
//!
//! 负责命令行参数解析、配置管理和程序信息展示。

use super::constants::{defaults, sensor::GRID_PIXELS};
use crate::core::CorrelationConfig;
use crate::error::{CorrelationError, CorrelationResult};
use crate::grid::{ExecutionMode, PixelId, PixelSelection};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// 应用程序版本信息
const VERSION: &str = env!("CARGO_PKG_VERSION");
const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// 应用程序配置
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 单个时间戳文件，或包含多个时间戳文件的目录
    pub input_path: PathBuf,

    /// 参与分析的5个像素
    pub pixels: Vec<PixelId>,

    /// 周期长度 / 符合窗口 / bin宽度
    pub correlation: CorrelationConfig,

    /// 并行线程数；None 表示串行
    pub parallel_threads: Option<usize>,

    /// 报告输出目录（缺省为 `<输入目录>/results/delta_t`）
    pub output_dir: Option<PathBuf>,

    /// 是否显示详细信息
    pub verbose: bool,
}

impl AppConfig {
    /// 智能判断是否为批量模式（基于路径类型）
    #[inline]
    pub fn is_batch_mode(&self) -> bool {
        self.input_path.is_dir()
    }

    #[inline]
    pub fn execution_mode(&self) -> ExecutionMode {
        match self.parallel_threads {
            Some(threads) => ExecutionMode::Parallel { threads },
            None => ExecutionMode::Serial,
        }
    }

    /// 校验相关配置和像素选择（在处理任何文件之前调用）
    pub fn validate(&self) -> CorrelationResult<()> {
        self.correlation.validate()?;
        PixelSelection::new(&self.pixels)?;
        Ok(())
    }

    /// 某个输入文件对应的报告目录
    pub fn results_dir_for(&self, input_file: &Path) -> PathBuf {
        match &self.output_dir {
            Some(dir) => dir.clone(),
            None => super::utils::get_parent_dir(input_file).join(defaults::RESULTS_SUBDIR),
        }
    }
}

/// 构建命令行定义
pub fn build_command() -> Command {
    Command::new("delta-t-grid")
        .version(VERSION)
        .about(DESCRIPTION)
        .author("LinoSPAD2 Analysis Team")
        .arg(
            Arg::new("INPUT")
                .help("时间戳文件(.json)或目录路径。如果不指定，将扫描当前目录")
                .required(false)
                .value_parser(value_parser!(PathBuf))
                .index(1),
        )
        .arg(
            Arg::new("pixels")
                .long("pixels")
                .short('p')
                .help("参与分析的5个像素编号，逗号分隔，例如 3,4,5,6,7")
                .required(true)
                .value_delimiter(',')
                .value_parser(value_parser!(u16)),
        )
        .arg(
            Arg::new("cycle-length")
                .long("cycle-length")
                .help("每个采集周期的数据行数 [默认: 512]")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("window")
                .long("window")
                .short('w')
                .help("符合窗口（皮秒），仅保留 |Δt| ≤ W；2W/bin宽度 不能超过100万个bin [默认: 300]")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(i64)),
        )
        .arg(
            Arg::new("bin-width")
                .long("bin-width")
                .help("直方图bin宽度（皮秒） [默认: 17.857]")
                .value_parser(value_parser!(f64)),
        )
        .arg(
            Arg::new("threads")
                .long("threads")
                .short('j')
                .help("并行处理像素对的线程数 [默认: 4]")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("serial")
                .long("serial")
                .help("串行处理像素对（禁用并行）")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("报告输出目录")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("显示详细处理信息")
                .action(ArgAction::SetTrue),
        )
}

/// 解析命令行参数并创建配置
pub fn parse_args() -> CorrelationResult<AppConfig> {
    config_from_matches(&build_command().get_matches())
}

/// 从任意参数列表解析（测试和嵌入调用用）
pub fn parse_args_from<I, T>(args: I) -> CorrelationResult<AppConfig>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = build_command()
        .try_get_matches_from(args)
        .map_err(|e| CorrelationError::InvalidInput(e.to_string()))?;
    config_from_matches(&matches)
}

fn config_from_matches(matches: &ArgMatches) -> CorrelationResult<AppConfig> {
    let pixels: Vec<PixelId> = matches
        .get_many::<u16>("pixels")
        .map(|values| values.copied().collect())
        .unwrap_or_default();

    if pixels.len() != GRID_PIXELS {
        return Err(CorrelationError::InvalidInput(format!(
            "--pixels 需要恰好 {GRID_PIXELS} 个像素，实际 {} 个",
            pixels.len()
        )));
    }

    let correlation = CorrelationConfig {
        cycle_length: get_or(matches, "cycle-length", defaults::CYCLE_LENGTH),
        window_ps: get_or(matches, "window", defaults::COINCIDENCE_WINDOW_PS),
        bin_width: get_or(matches, "bin-width", defaults::BIN_WIDTH_PS),
    };

    let parallel_threads = if matches.get_flag("serial") {
        None
    } else {
        Some(get_or(matches, "threads", defaults::PARALLEL_THREADS))
    };

    let input_path = matches
        .get_one::<PathBuf>("INPUT")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));

    let config = AppConfig {
        input_path,
        pixels,
        correlation,
        parallel_threads,
        output_dir: matches.get_one::<PathBuf>("output").cloned(),
        verbose: matches.get_flag("verbose"),
    };
    config.validate()?;
    Ok(config)
}

#[inline]
fn get_or<T: Clone + Send + Sync + 'static>(matches: &ArgMatches, id: &str, default: T) -> T {
    matches.get_one::<T>(id).cloned().unwrap_or(default)
}

/// 显示程序启动信息
pub fn show_startup_info(config: &AppConfig) {
    println!("LinoSPAD2 delta-t grid v{VERSION}");
    println!("{DESCRIPTION}");
    if config.verbose {
        println!(
            "[INFO] 像素 / Pixels: {:?}, 周期 / Cycle: {}, 窗口 / Window: {} ps, bin: {} ps",
            config.pixels,
            config.correlation.cycle_length,
            config.correlation.window_ps,
            config.correlation.bin_width
        );
    }
    println!();
}

/// 显示程序完成信息
pub fn show_completion_info(config: &AppConfig) {
    if config.verbose {
        println!("[OK] 所有任务处理完成 / All tasks completed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config =
            parse_args_from(["delta-t-grid", "data.json", "--pixels", "3,4,5,6,7"]).unwrap();
        assert_eq!(config.input_path, PathBuf::from("data.json"));
        assert_eq!(config.pixels, vec![3, 4, 5, 6, 7]);
        assert_eq!(config.correlation, CorrelationConfig::default());
        assert_eq!(
            config.execution_mode(),
            ExecutionMode::Parallel {
                threads: defaults::PARALLEL_THREADS
            }
        );
        assert!(!config.verbose);
    }

    #[test]
    fn test_overrides() {
        let config = parse_args_from([
            "delta-t-grid",
            "--pixels",
            "10,20,30,40,50",
            "--cycle-length",
            "256",
            "--window",
            "150",
            "--bin-width",
            "35.714",
            "--serial",
            "-o",
            "out",
            "-v",
        ])
        .unwrap();
        assert_eq!(config.input_path, PathBuf::from("."));
        assert_eq!(config.correlation.cycle_length, 256);
        assert_eq!(config.correlation.window_ps, 150);
        assert_eq!(config.correlation.bin_width, 35.714);
        assert_eq!(config.execution_mode(), ExecutionMode::Serial);
        assert_eq!(config.output_dir, Some(PathBuf::from("out")));
        assert!(config.verbose);
    }

    #[test]
    fn test_negative_window_rejected_at_parse() {
        let result = parse_args_from(["delta-t-grid", "--pixels", "1,2,3,4,5", "--window", "-10"]);
        assert!(matches!(result, Err(CorrelationError::WindowConfig(-10))));
    }

    #[test]
    fn test_bad_correlation_values_rejected_at_parse() {
        for extra in [
            ["--bin-width", "0"],
            ["--cycle-length", "0"],
            ["--window", "10000000000"],
        ] {
            let mut args = vec!["delta-t-grid", "--pixels", "1,2,3,4,5"];
            args.extend(extra);
            assert!(
                matches!(parse_args_from(args), Err(CorrelationError::InvalidInput(_))),
                "{extra:?} 应该被拒绝 / should be rejected"
            );
        }
    }

    #[test]
    fn test_duplicate_pixels_rejected_at_parse() {
        let result = parse_args_from(["delta-t-grid", "--pixels", "1,2,3,4,4"]);
        assert!(matches!(result, Err(CorrelationError::InvalidInput(_))));
    }

    #[test]
    fn test_wrong_pixel_count() {
        let result = parse_args_from(["delta-t-grid", "--pixels", "1,2,3"]);
        assert!(matches!(result, Err(CorrelationError::InvalidInput(_))));
    }

    #[test]
    fn test_missing_pixels() {
        assert!(parse_args_from(["delta-t-grid", "data.json"]).is_err());
    }

    #[test]
    fn test_results_dir() {
        let mut config = parse_args_from(["delta-t-grid", "--pixels", "1,2,3,4,5"]).unwrap();
        assert_eq!(
            config.results_dir_for(Path::new("/data/run1/frame.json")),
            PathBuf::from("/data/run1/results/delta_t")
        );
        config.output_dir = Some(PathBuf::from("/tmp/out"));
        assert_eq!(
            config.results_dir_for(Path::new("/data/run1/frame.json")),
            PathBuf::from("/tmp/out")
        );
    }
}
