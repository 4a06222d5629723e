//! 输出格式化模块
//!
//! 网格结果的两种渲染器：终端表格（comfy-table）和JSON报告文件。
//! 报告文件命名为 `<数据文件名>_delta_t_grid.json`。

use super::utils;
use crate::core::CorrelationConfig;
use crate::error::CorrelationResult;
use crate::grid::{GridRenderer, PairOutcome, PairResult, PixelId};
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::UTF8_FULL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 应用程序版本信息
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 报告文件名后缀
pub const REPORT_SUFFIX: &str = "_delta_t_grid.json";

// ============================================================================
// 终端表格
// ============================================================================

/// 终端表格渲染器
pub struct TableRenderer {
    title: String,
    table: Table,
    echo: bool,
}

impl TableRenderer {
    /// `finish` 时打印到stdout
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_echo(title, true)
    }

    /// 只构建表格不打印（测试和嵌入调用用）
    pub fn buffered(title: impl Into<String>) -> Self {
        Self::with_echo(title, false)
    }

    fn with_echo(title: impl Into<String>, echo: bool) -> Self {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_content_arrangement(if echo {
            ContentArrangement::Dynamic
        } else {
            ContentArrangement::Disabled
        });
        table.set_header(vec![
            "Pixels / 像素对",
            "Cell / 位置",
            "Δt / 数量",
            "Bins",
            "Peak (ps) / 峰值位置",
        ]);

        Self {
            title: title.into(),
            table,
            echo,
        }
    }

    pub fn to_text(&self) -> String {
        format!("{}\n{}", self.title, self.table)
    }
}

impl GridRenderer for TableRenderer {
    fn render_pair(&mut self, outcome: &PairOutcome) -> CorrelationResult<()> {
        let pair = &outcome.pair;
        let (count, bins, peak) = match &outcome.result {
            PairResult::Coincidence(hist) => (
                hist.delta_count.to_string(),
                hist.histogram.bin_count().to_string(),
                hist.peak.formatted(),
            ),
            PairResult::NoCoincidence => (
                "0".to_string(),
                "-".to_string(),
                "无符合 / no coincidence".to_string(),
            ),
            PairResult::Failed(err) => ("-".to_string(), "-".to_string(), format!("[FAIL] {err}")),
        };

        self.table.add_row(vec![
            Cell::new(pair.to_string()),
            Cell::new(format!("({}, {})", pair.row, pair.col)),
            Cell::new(count).set_alignment(CellAlignment::Right),
            Cell::new(bins).set_alignment(CellAlignment::Right),
            Cell::new(peak).set_alignment(CellAlignment::Right),
        ]);
        Ok(())
    }

    fn finish(&mut self) -> CorrelationResult<()> {
        if self.echo {
            println!("{}", self.to_text());
        }
        Ok(())
    }
}

// ============================================================================
// JSON报告
// ============================================================================

/// 像素对状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairStatus {
    Coincidence,
    NoCoincidence,
    Failed,
}

/// 单个像素对的报告记录（交给可视化层的全部数据）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairRecord {
    pub pixels: [PixelId; 2],
    pub row: usize,
    pub col: usize,
    pub status: PairStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak_position: Option<f64>,
    /// 两位小数的峰值位置
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak_label: Option<String>,
    #[serde(default)]
    pub bin_edges: Vec<f64>,
    #[serde(default)]
    pub bin_counts: Vec<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&PairOutcome> for PairRecord {
    fn from(outcome: &PairOutcome) -> Self {
        let pair = &outcome.pair;
        let mut record = PairRecord {
            pixels: [pair.first, pair.second],
            row: pair.row,
            col: pair.col,
            status: PairStatus::NoCoincidence,
            delta_count: None,
            peak_position: None,
            peak_label: None,
            bin_edges: Vec::new(),
            bin_counts: Vec::new(),
            error: None,
        };

        match &outcome.result {
            PairResult::Coincidence(hist) => {
                record.status = PairStatus::Coincidence;
                record.delta_count = Some(hist.delta_count);
                record.peak_position = Some(hist.peak.position);
                record.peak_label = Some(hist.peak.formatted());
                record.bin_edges = hist.histogram.edges().to_vec();
                record.bin_counts = hist.histogram.counts().to_vec();
            }
            PairResult::NoCoincidence => {
                record.delta_count = Some(0);
            }
            PairResult::Failed(err) => {
                record.status = PairStatus::Failed;
                record.error = Some(err.to_string());
            }
        }

        record
    }
}

/// 一个数据文件的完整报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridDocument {
    pub tool: String,
    pub version: String,
    pub generated_at: String,
    pub source: String,
    pub pixels: Vec<PixelId>,
    pub config: CorrelationConfig,
    pub pairs: Vec<PairRecord>,
}

/// JSON报告渲染器：收集所有像素对，`finish` 时写入报告文件
pub struct JsonReportRenderer {
    output_dir: PathBuf,
    source: PathBuf,
    document: GridDocument,
    written: Option<PathBuf>,
}

impl JsonReportRenderer {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        source: &Path,
        pixels: &[PixelId],
        config: CorrelationConfig,
    ) -> Self {
        let document = GridDocument {
            tool: "delta-t-grid".to_string(),
            version: VERSION.to_string(),
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            source: utils::extract_filename_lossy(source),
            pixels: pixels.to_vec(),
            config,
            pairs: Vec::new(),
        };

        Self {
            output_dir: output_dir.into(),
            source: source.to_path_buf(),
            document,
            written: None,
        }
    }

    /// 报告文件路径：`<输出目录>/<数据文件stem>_delta_t_grid.json`
    pub fn report_path(&self) -> PathBuf {
        let stem = utils::extract_file_stem_string(&self.source);
        self.output_dir.join(format!("{stem}{REPORT_SUFFIX}"))
    }

    pub fn document(&self) -> &GridDocument {
        &self.document
    }

    /// `finish` 成功后写出的文件
    pub fn written_path(&self) -> Option<&Path> {
        self.written.as_deref()
    }
}

impl GridRenderer for JsonReportRenderer {
    fn render_pair(&mut self, outcome: &PairOutcome) -> CorrelationResult<()> {
        self.document.pairs.push(PairRecord::from(outcome));
        Ok(())
    }

    fn finish(&mut self) -> CorrelationResult<()> {
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.report_path();
        let text = serde_json::to_string_pretty(&self.document)?;
        std::fs::write(&path, text)?;
        self.written = Some(path);
        Ok(())
    }
}

/// 读取已写出的报告（下游可视化层和测试使用）
pub fn read_report(path: &Path) -> CorrelationResult<GridDocument> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
