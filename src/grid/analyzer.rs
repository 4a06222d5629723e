//! 网格分析驱动
//!
//! 对选中的5个像素枚举10个像素对，逐对执行相关器 + 直方图/峰值，
//! 把结果交给外部渲染器。像素对之间没有共享可变状态，
//! 并行模式下每个像素对一个rayon任务，最后按枚举顺序汇合，
//! 输出与串行模式完全一致。

use super::pixel_streams::PixelStreams;
use super::selection::{PixelId, PixelPair, PixelSelection};
use crate::core::{
    CorrelationConfig, DeltaHistogram, HistogramPeak, PairCorrelator, TimestampStream,
    analyze_deltas,
};
use crate::error::{CorrelationError, CorrelationResult, malformed_stream};
use crate::tools::utils::effective_parallel_degree;
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// 一个像素对成功得到的直方图结果
#[derive(Debug, Clone, PartialEq)]
pub struct PairHistogram {
    /// 窗口内 Δt 数量（等于直方图计数总和）
    pub delta_count: usize,
    pub histogram: DeltaHistogram,
    pub peak: HistogramPeak,
}

/// 单个像素对的处理结果
#[derive(Debug)]
pub enum PairResult {
    Coincidence(PairHistogram),

    /// 窗口内没有符合事件，跳过直方图
    NoCoincidence,

    /// 流错误等，仅中止该像素对
    Failed(CorrelationError),
}

/// 交给渲染器的单元：像素对身份 + 结果
#[derive(Debug)]
pub struct PairOutcome {
    pub pair: PixelPair,
    pub result: PairResult,
}

impl PairOutcome {
    pub fn histogram(&self) -> Option<&PairHistogram> {
        match &self.result {
            PairResult::Coincidence(hist) => Some(hist),
            _ => None,
        }
    }

    pub fn is_coincidence(&self) -> bool {
        matches!(self.result, PairResult::Coincidence(_))
    }
}

/// 外部渲染层接口
///
/// 渲染器负责所有呈现、文件命名和输出目录决策。
pub trait GridRenderer {
    /// 按枚举顺序逐对调用
    fn render_pair(&mut self, outcome: &PairOutcome) -> CorrelationResult<()>;

    /// 整个网格处理完成后调用一次
    fn finish(&mut self) -> CorrelationResult<()> {
        Ok(())
    }
}

impl<R: GridRenderer + ?Sized> GridRenderer for &mut R {
    fn render_pair(&mut self, outcome: &PairOutcome) -> CorrelationResult<()> {
        (**self).render_pair(outcome)
    }

    fn finish(&mut self) -> CorrelationResult<()> {
        (**self).finish()
    }
}

/// 同时驱动两个渲染器（例如表格 + JSON报告）
impl<A: GridRenderer, B: GridRenderer> GridRenderer for (A, B) {
    fn render_pair(&mut self, outcome: &PairOutcome) -> CorrelationResult<()> {
        self.0.render_pair(outcome)?;
        self.1.render_pair(outcome)
    }

    fn finish(&mut self) -> CorrelationResult<()> {
        self.0.finish()?;
        self.1.finish()
    }
}

/// 执行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Serial,
    Parallel { threads: usize },
}

/// 一个网格的全部结果（按枚举顺序）
#[derive(Debug, Default)]
pub struct GridReport {
    pub outcomes: Vec<PairOutcome>,
}

impl GridReport {
    pub fn coincidence_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_coincidence()).count()
    }

    pub fn no_coincidence_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, PairResult::NoCoincidence))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, PairResult::Failed(_)))
            .count()
    }
}

/// 网格分析器（配置在构造时校验）
#[derive(Debug, Clone, Copy)]
pub struct GridAnalyzer {
    config: CorrelationConfig,
    correlator: PairCorrelator,
}

impl GridAnalyzer {
    /// 负窗口等配置错误在任何相关计算之前报告
    pub fn new(config: CorrelationConfig) -> CorrelationResult<Self> {
        config.validate()?;
        let correlator = PairCorrelator::new(&config)?;
        Ok(Self { config, correlator })
    }

    #[inline]
    pub fn config(&self) -> &CorrelationConfig {
        &self.config
    }

    /// 处理单个像素对；空 Δt 集合和流错误都被收敛为结果，而不是向上抛出
    pub fn analyze_pair(&self, streams: &PixelStreams, pair: &PixelPair) -> PairOutcome {
        let result = match self.correlate_pair(streams, pair) {
            Ok(hist) => {
                debug!(
                    pair = %pair,
                    deltas = hist.delta_count,
                    bins = hist.histogram.bin_count(),
                    peak = hist.peak.position,
                    "像素对完成"
                );
                PairResult::Coincidence(hist)
            }
            Err(CorrelationError::EmptyDeltaSet) => {
                debug!(pair = %pair, "符合窗口内没有事件");
                PairResult::NoCoincidence
            }
            Err(err) => {
                warn!(pair = %pair, error = %err, "像素对处理失败");
                PairResult::Failed(err)
            }
        };

        PairOutcome { pair: *pair, result }
    }

    fn correlate_pair(
        &self,
        streams: &PixelStreams,
        pair: &PixelPair,
    ) -> CorrelationResult<PairHistogram> {
        let a = lookup(streams, pair.first)?;
        let b = lookup(streams, pair.second)?;

        let deltas = self.correlator.correlate(a, b)?;
        let (histogram, peak) = analyze_deltas(&deltas, self.config.bin_width)?;

        Ok(PairHistogram {
            delta_count: deltas.len(),
            histogram,
            peak,
        })
    }

    /// 串行处理整个网格
    pub fn analyze_grid(&self, streams: &PixelStreams, selection: &PixelSelection) -> GridReport {
        let outcomes = selection
            .pairs()
            .iter()
            .map(|pair| self.analyze_pair(streams, pair))
            .collect();
        GridReport { outcomes }
    }

    /// 每个像素对一个任务，在专用rayon线程池中并行处理
    ///
    /// 结果按枚举顺序重排，与 `analyze_grid` 输出一致。
    pub fn analyze_grid_parallel(
        &self,
        streams: &PixelStreams,
        selection: &PixelSelection,
        threads: usize,
    ) -> CorrelationResult<GridReport> {
        let pairs = selection.pairs();
        let threads = effective_parallel_degree(threads, Some(pairs.len()));

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("delta-t-worker-{i}"))
            .build()
            .map_err(|e| CorrelationError::ResourceError(format!("线程池创建失败: {e}")))?;
        info!(threads, "并行处理像素对");

        let mut outcomes: Vec<PairOutcome> = pool.install(|| {
            pairs
                .par_iter()
                .map(|pair| self.analyze_pair(streams, pair))
                .collect()
        });

        // 按原始顺序排序结果（保证输出顺序）
        outcomes.sort_by_key(|outcome| outcome.pair.index);

        Ok(GridReport { outcomes })
    }

    /// 按执行模式处理网格，并把每个结果按顺序交给渲染器
    pub fn run<R: GridRenderer + ?Sized>(
        &self,
        streams: &PixelStreams,
        selection: &PixelSelection,
        mode: ExecutionMode,
        renderer: &mut R,
    ) -> CorrelationResult<GridReport> {
        info!(pixels = ?selection.pixels(), ?mode, "开始网格分析");

        let report = match mode {
            ExecutionMode::Serial => self.analyze_grid(streams, selection),
            ExecutionMode::Parallel { threads } => {
                self.analyze_grid_parallel(streams, selection, threads)?
            }
        };

        for outcome in &report.outcomes {
            renderer.render_pair(outcome)?;
        }
        renderer.finish()?;

        info!(
            coincidence = report.coincidence_count(),
            no_coincidence = report.no_coincidence_count(),
            failed = report.failed_count(),
            "网格分析完成"
        );
        Ok(report)
    }
}

/// 加载时被拒绝的像素报告其流错误，完全缺失的像素报告输入错误
fn lookup(streams: &PixelStreams, pixel: PixelId) -> CorrelationResult<&TimestampStream> {
    if let Some(stream) = streams.get(pixel) {
        return Ok(stream);
    }
    match streams.rejection(pixel) {
        Some(reason) => Err(malformed_stream(&format!("像素 {pixel}"), reason)),
        None => Err(CorrelationError::InvalidInput(format!(
            "像素 {pixel} 没有时间戳数据"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streams_for(pixels: &[PixelId], values: Vec<Vec<i64>>, cycle: usize) -> PixelStreams {
        pixels
            .iter()
            .copied()
            .zip(values)
            .map(|(pixel, v)| (pixel, TimestampStream::new(v, cycle).unwrap()))
            .collect()
    }

    fn small_config() -> CorrelationConfig {
        CorrelationConfig {
            cycle_length: 3,
            window_ps: 20,
            bin_width: 17.857,
        }
    }

    #[derive(Default)]
    struct RecordingRenderer {
        seen: Vec<(usize, bool)>,
        finished: bool,
    }

    impl GridRenderer for RecordingRenderer {
        fn render_pair(&mut self, outcome: &PairOutcome) -> CorrelationResult<()> {
            self.seen.push((outcome.pair.index, outcome.is_coincidence()));
            Ok(())
        }

        fn finish(&mut self) -> CorrelationResult<()> {
            self.finished = true;
            Ok(())
        }
    }

    #[test]
    fn test_negative_window_rejected_before_run() {
        let config = CorrelationConfig {
            window_ps: -1,
            ..Default::default()
        };
        assert!(matches!(
            GridAnalyzer::new(config),
            Err(CorrelationError::WindowConfig(-1))
        ));
    }

    #[test]
    fn test_pair_outcomes_classified() {
        let pixels = [1, 2, 3, 4, 5];
        let streams = streams_for(
            &pixels,
            vec![
                vec![5, -1, 20],
                vec![0, 10, -1],
                vec![-1, -1, -1],
                vec![100, 200, 300],
                vec![101, -1, -1],
            ],
            3,
        );
        let analyzer = GridAnalyzer::new(small_config()).unwrap();
        let selection = PixelSelection::new(&pixels).unwrap();
        let report = analyzer.analyze_grid(&streams, &selection);

        assert_eq!(report.outcomes.len(), 10);
        // 1-2：场景A，4个 Δt
        let first = report.outcomes[0].histogram().unwrap();
        assert_eq!(first.delta_count, 4);
        assert_eq!(first.histogram.total(), 4);
        // 1-3：像素3全部无效
        assert!(matches!(
            report.outcomes[1].result,
            PairResult::NoCoincidence
        ));
        // 4-5：100-101 = -1
        let last = report.outcomes[9].histogram().unwrap();
        assert_eq!(last.delta_count, 1);
        assert_eq!(last.peak.position, -1.0);
    }

    #[test]
    fn test_missing_pixel_fails_only_its_pairs() {
        let pixels = [1, 2, 3, 4, 5];
        let streams = streams_for(
            &pixels[..4],
            vec![vec![0, 1, 2], vec![0, 1, 2], vec![0, 1, 2], vec![0, 1, 2]],
            3,
        );
        let analyzer = GridAnalyzer::new(small_config()).unwrap();
        let selection = PixelSelection::new(&pixels).unwrap();
        let report = analyzer.analyze_grid(&streams, &selection);

        assert_eq!(report.failed_count(), 4);
        assert_eq!(report.coincidence_count(), 6);
        for outcome in &report.outcomes {
            let touches_missing = outcome.pair.first == 5 || outcome.pair.second == 5;
            assert_eq!(matches!(outcome.result, PairResult::Failed(_)), touches_missing);
        }
    }

    #[test]
    fn test_cycle_mismatch_fails_pair() {
        let mut streams = streams_for(
            &[1, 2, 3, 4],
            vec![vec![0, 1, 2], vec![0, 1, 2], vec![0, 1, 2], vec![0, 1, 2]],
            3,
        );
        streams.insert(5, TimestampStream::new(vec![0, 1], 2).unwrap());

        let analyzer = GridAnalyzer::new(small_config()).unwrap();
        let selection = PixelSelection::new(&[1, 2, 3, 4, 5]).unwrap();
        let report = analyzer.analyze_grid(&streams, &selection);

        let failed: Vec<&PairOutcome> = report
            .outcomes
            .iter()
            .filter(|o| matches!(o.result, PairResult::Failed(CorrelationError::MalformedStream(_))))
            .collect();
        assert_eq!(failed.len(), 4);
    }

    #[test]
    fn test_parallel_matches_serial() {
        let pixels = [7, 8, 9, 10, 11];
        let values: Vec<Vec<i64>> = (0..5i64)
            .map(|p| {
                (0..30)
                    .map(|i| if (i + p) % 4 == 0 { -1 } else { i * 13 + p * 7 })
                    .collect()
            })
            .collect();
        let streams = streams_for(&pixels, values, 3);
        let analyzer = GridAnalyzer::new(small_config()).unwrap();
        let selection = PixelSelection::new(&pixels).unwrap();

        let serial = analyzer.analyze_grid(&streams, &selection);
        let parallel = analyzer
            .analyze_grid_parallel(&streams, &selection, 4)
            .unwrap();

        assert_eq!(serial.outcomes.len(), parallel.outcomes.len());
        for (s, p) in serial.outcomes.iter().zip(&parallel.outcomes) {
            assert_eq!(s.pair, p.pair);
            assert_eq!(s.histogram(), p.histogram());
        }
    }

    #[test]
    fn test_run_forwards_in_order() {
        let pixels = [1, 2, 3, 4, 5];
        let streams = streams_for(&pixels, vec![vec![0, 1, 2]; 5], 3);
        let analyzer = GridAnalyzer::new(small_config()).unwrap();
        let selection = PixelSelection::new(&pixels).unwrap();
        let mut renderer = RecordingRenderer::default();

        let report = analyzer
            .run(
                &streams,
                &selection,
                ExecutionMode::Parallel { threads: 3 },
                &mut renderer,
            )
            .unwrap();

        assert!(renderer.finished);
        let order: Vec<usize> = renderer.seen.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, (0..10).collect::<Vec<_>>());
        assert!(renderer.seen.iter().all(|(_, ok)| *ok));
        assert_eq!(report.coincidence_count(), 10);
    }

    #[test]
    fn test_tuple_renderer_fans_out() {
        let pixels = [1, 2, 3, 4, 5];
        let streams = streams_for(&pixels, vec![vec![0, 1, 2]; 5], 3);
        let analyzer = GridAnalyzer::new(small_config()).unwrap();
        let selection = PixelSelection::new(&pixels).unwrap();

        let mut pair = (RecordingRenderer::default(), RecordingRenderer::default());
        analyzer
            .run(&streams, &selection, ExecutionMode::Serial, &mut pair)
            .unwrap();

        assert_eq!(pair.0.seen.len(), 10);
        assert_eq!(pair.1.seen.len(), 10);
        assert!(pair.0.finished && pair.1.finished);
    }
}
