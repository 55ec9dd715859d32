use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 问卷页面获取失败
    Fetch(FetchError),
    /// 单个题目结构解析失败
    Parse(ParseError),
    /// 页面脚本执行失败
    Script(ScriptError),
    /// 页面导航失败
    Navigation(NavigationError),
    /// 浏览器相关错误
    Browser(BrowserError),
    /// 文件操作错误
    File(FileError),
    /// LLM 服务错误
    Llm(LlmError),
    /// 业务逻辑错误
    Business(BusinessError),
    /// 配置错误
    Config(ConfigError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Fetch(e) => write!(f, "获取错误: {}", e),
            AppError::Parse(e) => write!(f, "解析错误: {}", e),
            AppError::Script(e) => write!(f, "脚本错误: {}", e),
            AppError::Navigation(e) => write!(f, "导航错误: {}", e),
            AppError::Browser(e) => write!(f, "浏览器错误: {}", e),
            AppError::File(e) => write!(f, "文件错误: {}", e),
            AppError::Llm(e) => write!(f, "LLM错误: {}", e),
            AppError::Business(e) => write!(f, "业务错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Fetch(e) => Some(e),
            AppError::Parse(e) => Some(e),
            AppError::Script(e) => Some(e),
            AppError::Navigation(e) => Some(e),
            AppError::Browser(e) => Some(e),
            AppError::File(e) => Some(e),
            AppError::Llm(e) => Some(e),
            AppError::Business(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 问卷页面获取错误
#[derive(Debug)]
pub enum FetchError {
    /// 网络请求失败
    RequestFailed {
        url: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// HTTP 状态码非成功
    BadStatus { url: String, status: u16 },
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::RequestFailed { url, source } => {
                write!(f, "请求 {} 失败: {}", url, source)
            }
            FetchError::BadStatus { url, status } => {
                write!(f, "HTTP请求失败 ({}): {}", url, status)
            }
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::RequestFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 单个题目结构错误（该题被跳过，不影响整体解析）
#[derive(Debug)]
pub enum ParseError {
    /// 缺少 topic 属性
    MissingOrdinal,
    /// topic 属性不是合法题号
    InvalidOrdinal { raw: String },
    /// 无法识别的题型且无法推断
    UnrecognizedBlock { ordinal: usize, type_code: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingOrdinal => write!(f, "题目缺少 topic 属性"),
            ParseError::InvalidOrdinal { raw } => write!(f, "无效的题号: '{}'", raw),
            ParseError::UnrecognizedBlock { ordinal, type_code } => {
                write!(f, "第 {} 题题型 '{}' 无法识别", ordinal, type_code)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// 页面脚本错误
#[derive(Debug)]
pub enum ScriptError {
    /// 执行脚本失败
    EvaluationFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 脚本返回了显式的错误标记
    ErrorTag { message: String },
    /// 脚本返回值无法识别
    UnexpectedResult { raw: String },
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::EvaluationFailed { source } => write!(f, "执行脚本失败: {}", source),
            ScriptError::ErrorTag { message } => write!(f, "脚本返回错误: {}", message),
            ScriptError::UnexpectedResult { raw } => write!(f, "无法识别的脚本结果: {}", raw),
        }
    }
}

impl std::error::Error for ScriptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScriptError::EvaluationFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 页面导航错误
#[derive(Debug)]
pub enum NavigationError {
    /// 导航失败
    Failed {
        url: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 无法获取页面
    SurfaceUnavailable { reason: String },
}

impl fmt::Display for NavigationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationError::Failed { url, source } => {
                write!(f, "导航到 {} 失败: {}", url, source)
            }
            NavigationError::SurfaceUnavailable { reason } => {
                write!(f, "无法获取页面: {}", reason)
            }
        }
    }
}

impl std::error::Error for NavigationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NavigationError::Failed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 浏览器相关错误
#[derive(Debug)]
pub enum BrowserError {
    /// 连接浏览器失败
    ConnectionFailed {
        port: u16,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 创建页面失败
    PageCreationFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 浏览器配置失败
    ConfigurationFailed { reason: String },
}

impl fmt::Display for BrowserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrowserError::ConnectionFailed { port, source } => {
                write!(f, "无法连接到浏览器 (端口: {}): {}", port, source)
            }
            BrowserError::PageCreationFailed { source } => {
                write!(f, "创建页面失败: {}", source)
            }
            BrowserError::ConfigurationFailed { reason } => {
                write!(f, "浏览器配置失败: {}", reason)
            }
        }
    }
}

impl std::error::Error for BrowserError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BrowserError::ConnectionFailed { source, .. }
            | BrowserError::PageCreationFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            BrowserError::ConfigurationFailed { .. } => None,
        }
    }
}

/// 文件操作错误
#[derive(Debug)]
pub enum FileError {
    /// 文件不存在
    NotFound { path: String },
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// TOML 解析失败
    TomlParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::NotFound { path } => write!(f, "文件不存在: {}", path),
            FileError::ReadFailed { path, source } => {
                write!(f, "读取文件失败 ({}): {}", path, source)
            }
            FileError::WriteFailed { path, source } => {
                write!(f, "写入文件失败 ({}): {}", path, source)
            }
            FileError::TomlParseFailed { path, source } => {
                write!(f, "TOML解析失败 ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::ReadFailed { source, .. }
            | FileError::WriteFailed { source, .. }
            | FileError::TomlParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            FileError::NotFound { .. } => None,
        }
    }
}

/// LLM 服务错误
#[derive(Debug)]
pub enum LlmError {
    /// API 调用失败
    ApiCallFailed {
        model: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回内容为空
    EmptyContent { model: String },
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::ApiCallFailed { model, source } => {
                write!(f, "LLM API调用失败 (模型: {}): {}", model, source)
            }
            LlmError::EmptyContent { model } => {
                write!(f, "LLM返回内容为空 (模型: {})", model)
            }
        }
    }
}

impl std::error::Error for LlmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LlmError::ApiCallFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            LlmError::EmptyContent { .. } => None,
        }
    }
}

/// 业务逻辑错误
#[derive(Debug)]
pub enum BusinessError {
    /// 索引超出范围
    IndexOutOfRange { index: usize, len: usize },
    /// 任务已在运行中
    AlreadyRunning,
}

impl fmt::Display for BusinessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusinessError::IndexOutOfRange { index, len } => {
                write!(f, "索引 {} 超出范围 (共 {} 项)", index, len)
            }
            BusinessError::AlreadyRunning => write!(f, "任务已在运行中"),
        }
    }
}

impl std::error::Error for BusinessError {}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 问卷链接无效
    InvalidUrl { url: String },
    /// 目标份数无效
    InvalidTargetCount,
    /// 并发数超出范围
    ConcurrencyOutOfRange { value: usize, max: usize },
    /// 间隔区间无效
    InvalidInterval { min: u64, max: u64 },
    /// 题目配置无效
    InvalidQuestion { ordinal: usize, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidUrl { url } => write!(f, "无效的问卷星链接: '{}'", url),
            ConfigError::InvalidTargetCount => write!(f, "目标份数必须大于 0"),
            ConfigError::ConcurrencyOutOfRange { value, max } => {
                write!(f, "并发数 {} 超出范围 [1, {}]", value, max)
            }
            ConfigError::InvalidInterval { min, max } => {
                write!(f, "间隔区间无效: 最小值 {} 大于最大值 {}", min, max)
            }
            ConfigError::InvalidQuestion { ordinal, reason } => {
                write!(f, "第 {} 题配置无效: {}", ordinal, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ========== 从常见错误类型转换 ==========
// anyhow 已经为所有实现了 std::error::Error 的类型提供了自动转换

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Script(ScriptError::EvaluationFailed {
            source: Box::new(err),
        })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Other(format!("JSON序列化失败: {}", err))
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建页面获取失败错误
    pub fn fetch_failed(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Fetch(FetchError::RequestFailed {
            url: url.into(),
            source: Box::new(source),
        })
    }

    /// 创建导航失败错误
    pub fn navigation_failed(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Navigation(NavigationError::Failed {
            url: url.into(),
            source: Box::new(source),
        })
    }

    /// 创建浏览器连接错误
    pub fn browser_connection_failed(
        port: u16,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Browser(BrowserError::ConnectionFailed {
            port,
            source: Box::new(source),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建LLM API调用错误
    pub fn llm_api_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Llm(LlmError::ApiCallFailed {
            model: model.into(),
            source: Box::new(source),
        })
    }

    /// 是否属于单次尝试内可吸收的错误（脚本/导航）
    pub fn is_attempt_error(&self) -> bool {
        matches!(self, AppError::Script(_) | AppError::Navigation(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
