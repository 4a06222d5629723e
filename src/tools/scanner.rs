//! 文件扫描模块
//!
//! 批量模式下扫描目录中的时间戳文件（只看顶层，不递归子目录）。

use super::cli::AppConfig;
use super::utils;
use crate::error::{CorrelationError, CorrelationResult};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 支持的时间戳文件扩展名
const SUPPORTED_EXTENSIONS: &[&str] = &["json"];

/// 扫描目录中的时间戳文件，按路径排序
pub fn scan_stream_files(dir_path: &Path) -> CorrelationResult<Vec<PathBuf>> {
    if !dir_path.exists() {
        return Err(CorrelationError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("目录不存在: {}", dir_path.display()),
        )));
    }

    if !dir_path.is_dir() {
        return Err(CorrelationError::InvalidInput(format!(
            "路径不是目录: {}",
            dir_path.display()
        )));
    }

    let mut stream_files = Vec::new();

    for entry in WalkDir::new(dir_path).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| CorrelationError::IoError(e.into()))?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if is_supported(path) && !is_report(path) {
            stream_files.push(path.to_path_buf());
        }
    }

    stream_files.sort();
    Ok(stream_files)
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// 跳过本工具自己写出的报告（输出目录与输入目录相同时）
fn is_report(path: &Path) -> bool {
    utils::extract_filename(path).ends_with(super::formatter::REPORT_SUFFIX)
}

/// 显示文件扫描结果
pub fn show_scan_results(config: &AppConfig, stream_files: &[PathBuf]) {
    if stream_files.is_empty() {
        println!(
            "[WARNING] 在目录 {} 中没有找到时间戳文件 / No timestamp files found",
            config.input_path.display()
        );
        println!("   支持的格式 / Supported formats: JSON");
        return;
    }

    println!("[INFO] 扫描目录 / Scanning: {}", config.input_path.display());
    println!(
        "[INFO] 找到 {} 个时间戳文件 / Found {} timestamp files",
        stream_files.len(),
        stream_files.len()
    );

    if config.verbose {
        for (i, file) in stream_files.iter().enumerate() {
            println!("   {}. {}", i + 1, utils::extract_filename_lossy(file));
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.json"), "{}").unwrap();
        std::fs::write(dir.path().join("a.JSON"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        std::fs::write(dir.path().join("a_delta_t_grid.json"), "{}").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.json"), "{}").unwrap();

        let files = scan_stream_files(dir.path()).unwrap();
        let names: Vec<&str> = files.iter().map(|p| utils::extract_filename(p)).collect();
        assert_eq!(names, vec!["a.JSON", "b.json"]);
    }

    #[test]
    fn test_scan_missing_dir() {
        let result = scan_stream_files(Path::new("/nonexistent/linospad"));
        assert!(matches!(result, Err(CorrelationError::IoError(_))));
    }

    #[test]
    fn test_scan_file_is_not_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("frame.json");
        std::fs::write(&file, "{}").unwrap();
        assert!(matches!(
            scan_stream_files(&file),
            Err(CorrelationError::InvalidInput(_))
        ));
    }
}
