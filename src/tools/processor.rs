//! 文件处理模块
//!
//! 负责时间戳文件的加载、网格分析和结果输出（单文件与批量）。

use super::batch_state::{BatchStats, BatchStatsSnapshot};
use super::cli::AppConfig;
use super::formatter::{JsonReportRenderer, TableRenderer};
use super::{loader, utils};
use crate::error::{CorrelationError, CorrelationResult, ErrorCategory};
use crate::grid::{ExecutionMode, GridAnalyzer, GridReport, PixelSelection, PixelStreams};
use std::path::{Path, PathBuf};
use tracing::warn;

/// 单个文件的处理结果
#[derive(Debug)]
pub struct FileOutcome {
    pub report: GridReport,
    /// 写出的JSON报告
    pub report_path: PathBuf,
}

/// 处理单个时间戳文件：加载 → 10个像素对 → 表格 + JSON报告
pub fn process_stream_file(path: &Path, config: &AppConfig) -> CorrelationResult<FileOutcome> {
    if config.verbose {
        println!("[INFO] 加载时间戳文件 / Loading: {}", path.display());
    }

    let streams = loader::load_stream_file(path, config.correlation.cycle_length)?;
    let selection = PixelSelection::new(&config.pixels)?;
    warn_missing_pixels(&streams, &selection, path);

    if config.verbose {
        println!(
            "   像素流 / Pixel streams: {}，周期数 / Cycles: {}",
            streams.len(),
            streams
                .pixel_ids()
                .first()
                .and_then(|&id| streams.get(id))
                .map(|s| s.cycle_count())
                .unwrap_or(0)
        );
    }

    process_streams(&streams, &selection, path, config)
}

/// 对已加载的像素流执行网格分析并输出（嵌入调用用）
pub fn process_streams(
    streams: &PixelStreams,
    selection: &PixelSelection,
    source: &Path,
    config: &AppConfig,
) -> CorrelationResult<FileOutcome> {
    let analyzer = GridAnalyzer::new(config.correlation)?;

    let table = TableRenderer::new(utils::extract_filename_lossy(source));
    let json = JsonReportRenderer::new(
        config.results_dir_for(source),
        source,
        selection.pixels(),
        config.correlation,
    );
    let mut renderers = (table, json);

    // 线程池创建失败时回退到串行（渲染器此时尚未收到任何像素对）
    let report = match analyzer.run(streams, selection, config.execution_mode(), &mut renderers) {
        Err(CorrelationError::ResourceError(msg)) => {
            eprintln!(
                "[WARNING] 并行处理失败 / Parallel processing failed: {msg}，回退到串行模式 / fallback to serial"
            );
            analyzer.run(streams, selection, ExecutionMode::Serial, &mut renderers)?
        }
        other => other?,
    };

    let report_path = renderers.1.report_path();
    if config.verbose {
        println!("[OK] 报告已保存 / Report saved: {}", report_path.display());
    }

    Ok(FileOutcome {
        report,
        report_path,
    })
}

/// 批量处理：配置先整体校验，之后逐文件处理，单个文件失败只计入统计
pub fn process_batch(
    config: &AppConfig,
    stream_files: &[PathBuf],
) -> CorrelationResult<BatchStatsSnapshot> {
    config.validate()?;

    let mut stats = BatchStats::new();

    for (index, stream_file) in stream_files.iter().enumerate() {
        let filename = utils::extract_filename_lossy(stream_file);
        if config.verbose {
            println!(
                "[PROCESSING] [{}/{}] 处理 / Processing: {filename}",
                index + 1,
                stream_files.len(),
            );
        }

        match process_stream_file(stream_file, config) {
            Ok(outcome) => {
                stats.record_success(&outcome.report);
                if config.verbose {
                    println!("   [OK] 处理成功 / Processing succeeded");
                }
            }
            Err(e) => {
                let category = ErrorCategory::from_error(&e);
                if config.verbose {
                    println!("   [FAIL] 处理失败 / Processing failed");
                    println!("      文件 / File: {}", stream_file.display());
                    println!("      类别 / Category: {}", category.display_name());
                    println!("      错误 / Error: {e}");
                    if let Some(source) = std::error::Error::source(&e) {
                        println!("      原因 / Cause: {source}");
                    }
                } else {
                    println!(
                        "[FAIL] [{}/{}] {filename} - [{}] {e} / 处理失败",
                        index + 1,
                        stream_files.len(),
                        category.display_name()
                    );
                }
                stats.record_failure(&e, filename);
            }
        }
    }

    Ok(stats.snapshot())
}

fn warn_missing_pixels(streams: &PixelStreams, selection: &PixelSelection, path: &Path) {
    for &pixel in selection.pixels() {
        if let Some(reason) = streams.rejection(pixel) {
            warn!(
                pixel,
                file = %path.display(),
                %reason,
                "所选像素的时间戳流不合法，相关像素对将失败"
            );
        } else if !streams.contains(pixel) {
            warn!(
                pixel,
                file = %path.display(),
                "所选像素在文件中没有时间戳，相关像素对将失败"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::cli::parse_args_from;
    use crate::tools::formatter::{PairStatus, read_report};
    use crate::tools::loader::{StreamFile, save_stream_file};

    fn write_frame(dir: &Path) -> PathBuf {
        let path = dir.join("frame.json");
        let mut file = StreamFile {
            cycle_length: Some(3),
            ..Default::default()
        };
        file.pixels.insert(1, vec![5, -1, 20]);
        file.pixels.insert(2, vec![0, 10, -1]);
        file.pixels.insert(3, vec![-1, -1, -1]);
        file.pixels.insert(4, vec![40, 41, 42]);
        save_stream_file(&path, &file).unwrap();
        path
    }

    #[test]
    fn test_process_writes_report_next_to_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_frame(dir.path());
        let config = parse_args_from([
            "delta-t-grid",
            "--pixels",
            "1,2,3,4,5",
            "--window",
            "20",
            "--serial",
        ])
        .unwrap();

        let outcome = process_stream_file(&path, &config).unwrap();
        assert_eq!(
            outcome.report_path,
            dir.path().join("results/delta_t/frame_delta_t_grid.json")
        );
        assert_eq!(outcome.report.outcomes.len(), 10);
        // 像素5不在文件中：涉及它的4个像素对失败
        assert_eq!(outcome.report.failed_count(), 4);

        let doc = read_report(&outcome.report_path).unwrap();
        assert_eq!(doc.pairs[0].status, PairStatus::Coincidence);
        assert_eq!(doc.pairs[3].status, PairStatus::Failed);
    }

    #[test]
    fn test_malformed_pixel_fails_only_its_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.json");
        let mut file = StreamFile {
            cycle_length: Some(3),
            ..Default::default()
        };
        for pixel in 1..=4 {
            file.pixels.insert(pixel, vec![10, 20, 30]);
        }
        file.pixels.insert(5, vec![1, 2]);
        // 未被选中的坏像素不影响任何像素对
        file.pixels.insert(99, vec![1]);
        save_stream_file(&path, &file).unwrap();

        let config =
            parse_args_from(["delta-t-grid", "--pixels", "1,2,3,4,5", "--serial"]).unwrap();
        let outcome = process_stream_file(&path, &config).unwrap();

        assert_eq!(outcome.report.coincidence_count(), 6);
        assert_eq!(outcome.report.failed_count(), 4);
        for o in &outcome.report.outcomes {
            if let crate::grid::PairResult::Failed(err) = &o.result {
                assert_eq!(o.pair.second, 5);
                assert!(matches!(err, CorrelationError::MalformedStream(m) if m.contains("像素 5")));
            }
        }
        assert!(outcome.report_path.exists());
    }

    #[test]
    fn test_batch_rejects_bad_config_before_any_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_frame(dir.path());
        let mut config = parse_args_from(["delta-t-grid", "--pixels", "1,2,3,4,5"]).unwrap();
        config.input_path = dir.path().to_path_buf();
        config.correlation.window_ps = -1;

        let result = process_batch(&config, &[path]);
        assert!(matches!(result, Err(CorrelationError::WindowConfig(-1))));
        assert!(!dir.path().join("results").exists());
    }

    #[test]
    fn test_batch_counts_files() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_frame(dir.path());
        let bad = dir.path().join("broken.json");
        std::fs::write(&bad, "{ broken").unwrap();
        let config =
            parse_args_from(["delta-t-grid", "--pixels", "1,2,3,4,5", "--window", "20"]).unwrap();

        let snapshot = process_batch(&config, &[bad, good]).unwrap();
        assert_eq!(snapshot.processed, 1);
        assert_eq!(snapshot.failed, 1);
        assert_eq!(snapshot.error_stats[&ErrorCategory::Format], vec!["broken.json"]);
    }

    #[test]
    fn test_wrong_pixel_count_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_frame(dir.path());
        let mut config = parse_args_from(["delta-t-grid", "--pixels", "1,2,3,4,5"]).unwrap();
        config.pixels = vec![1, 2, 3];
        assert!(matches!(
            process_stream_file(&path, &config),
            Err(CorrelationError::InvalidInput(_))
        ));
    }
}
