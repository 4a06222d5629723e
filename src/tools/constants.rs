//! 常量和默认配置集中管理
//!
//! 将所有重要常量集中定义，避免"默认值漂移"和重复定义

/// LinoSPAD2硬件常量
pub mod sensor {
    /// 无事件标记
    ///
    /// 解包后的时间戳数组用 -1 表示该槽位没有探测事件
    pub const INVALID_TIMESTAMP: i64 = -1;

    /// 每个网格的像素数量（5个像素 → 10个像素对）
    pub const GRID_PIXELS: usize = 5;
}

/// 默认配置值
pub mod defaults {
    /// 每个采集周期每个像素的数据行数
    pub const CYCLE_LENGTH: usize = 512;

    /// 符合窗口（皮秒），仅保留 |Δt| ≤ W 的差值
    pub const COINCIDENCE_WINDOW_PS: i64 = 300;

    /// 直方图bin宽度（皮秒）
    ///
    /// 硬件原生时间分辨率
    pub const BIN_WIDTH_PS: f64 = 17.857;

    /// 默认并行线程数
    pub const PARALLEL_THREADS: usize = 4;

    /// 默认报告输出子目录（相对于输入数据所在目录）
    pub const RESULTS_SUBDIR: &str = "results/delta_t";
}

/// 并发度限制常量
pub mod parallel_limits {
    /// 最小并发度
    pub const MIN_PARALLEL_DEGREE: usize = 1;

    /// 最大并发度
    ///
    /// 一个网格只有10个像素对，更多线程没有意义
    pub const MAX_PARALLEL_DEGREE: usize = 16;
}

/// 直方图限制常量
pub mod histogram_limits {
    /// 单个直方图允许的最大bin数
    ///
    /// 窗口 ±W、宽度 w 时bin数约为 2W/w；默认配置约34个bin
    pub const MAX_BINS: usize = 1_000_000;
}
