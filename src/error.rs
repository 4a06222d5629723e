//! 统一错误处理框架
//!
//! 相关性计算、直方图统计、数据加载共用的错误类型定义。

use std::fmt;
use std::io;

/// 符合时间分析相关的统一错误类型
#[derive(Debug)]
pub enum CorrelationError {
    /// 时间戳流违反长度/周期不变量（仅中止当前像素对）
    MalformedStream(String),

    /// 符合窗口为负数（配置阶段即报错，任何相关计算之前）
    WindowConfig(i64),

    /// 像素对在窗口内没有任何符合事件
    EmptyDeltaSet,

    /// 输入验证错误（像素选择、bin宽度、命令行参数）
    InvalidInput(String),

    /// 时间戳文件格式错误
    FormatError(String),

    /// 文件I/O错误
    IoError(io::Error),

    /// 资源访问错误（线程池创建等）
    ResourceError(String),
}

impl fmt::Display for CorrelationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationError::MalformedStream(msg) => write!(f, "时间戳流格式错误: {msg}"),
            CorrelationError::WindowConfig(window) => {
                write!(f, "符合窗口不能为负数: {window} ps")
            }
            CorrelationError::EmptyDeltaSet => write!(f, "符合窗口内没有delta t数据"),
            CorrelationError::InvalidInput(msg) => write!(f, "输入验证失败: {msg}"),
            CorrelationError::FormatError(msg) => write!(f, "数据格式错误: {msg}"),
            CorrelationError::IoError(err) => write!(f, "文件I/O错误: {err}"),
            CorrelationError::ResourceError(msg) => write!(f, "资源访问错误: {msg}"),
        }
    }
}

impl std::error::Error for CorrelationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CorrelationError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for CorrelationError {
    fn from(err: io::Error) -> Self {
        CorrelationError::IoError(err)
    }
}

impl From<serde_json::Error> for CorrelationError {
    fn from(err: serde_json::Error) -> Self {
        CorrelationError::FormatError(format!("JSON解析错误: {err}"))
    }
}

/// 相关性分析操作的标准Result类型
pub type CorrelationResult<T> = Result<T, CorrelationError>;

// ==================== 错误转换Helper函数 ====================

/// 创建时间戳流错误的helper函数
#[inline]
pub fn malformed_stream<E: fmt::Display>(context: &str, err: E) -> CorrelationError {
    CorrelationError::MalformedStream(format!("{context}: {err}"))
}

/// 创建格式错误的helper函数
#[inline]
pub fn format_error<E: fmt::Display>(context: &str, err: E) -> CorrelationError {
    CorrelationError::FormatError(format!("{context}: {err}"))
}

// ==================== 错误分类系统 ====================
// 用于批量处理中的错误统计和退出码映射

/// 错误类别枚举（用于批量处理统计）
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub enum ErrorCategory {
    /// 时间戳流或文件格式问题
    Format,
    /// 配置问题（窗口、bin宽度、像素选择）
    Config,
    /// I/O相关错误（文件不存在、权限不足等）
    Io,
    /// 没有符合事件
    NoCoincidence,
    /// 其他未分类错误
    Other,
}

impl ErrorCategory {
    /// 从CorrelationError提取错误类别
    pub fn from_error(e: &CorrelationError) -> Self {
        match e {
            CorrelationError::MalformedStream(_) | CorrelationError::FormatError(_) => Self::Format,
            CorrelationError::WindowConfig(_) | CorrelationError::InvalidInput(_) => Self::Config,
            CorrelationError::IoError(_) => Self::Io,
            CorrelationError::EmptyDeltaSet => Self::NoCoincidence,
            CorrelationError::ResourceError(_) => Self::Other,
        }
    }

    /// 获取错误类别的显示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Format => "格式错误",
            Self::Config => "配置错误",
            Self::Io => "I/O错误",
            Self::NoCoincidence => "无符合事件",
            Self::Other => "其他错误",
        }
    }
}
