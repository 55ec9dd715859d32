use std::str::FromStr;
use std::time::Duration;

/// 运行模式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunMode {
    /// 打开浏览器，循环填写提交
    #[default]
    Run,
    /// 只解析问卷结构，写回配置文件
    Parse,
    /// 按当前配置抽样一份答案并打印
    Preview,
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "run" => Ok(RunMode::Run),
            "parse" => Ok(RunMode::Parse),
            "preview" => Ok(RunMode::Preview),
            other => Err(format!("未知的运行模式: {}", other)),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    pub mode: RunMode,
    /// 浏览器调试端口（连接已打开的浏览器）
    pub browser_debug_port: u16,
    /// 连接失败时自动启动浏览器，是否无头
    pub headless: bool,
    /// 浏览器可执行文件路径，为空时自动查找
    pub chrome_executable: Option<String>,
    /// 问卷运行配置文件（TOML）
    pub survey_file: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- 页面等待 ---
    /// 打开页面后的等待
    pub page_load_delay_ms: u64,
    /// 填写后的等待
    pub fill_delay_ms: u64,
    /// 翻页后的等待
    pub advance_delay_ms: u64,
    /// 点击提交后的等待
    pub submit_delay_ms: u64,
    // --- AI 填空 ---
    pub ai_enabled: bool,
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// 每道填空题生成的答案数
    pub ai_answer_count: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            browser_debug_port: 9222,
            headless: true,
            chrome_executable: None,
            survey_file: "survey.toml".to_string(),
            output_log_file: "output.txt".to_string(),
            verbose_logging: false,
            page_load_delay_ms: 2000,
            fill_delay_ms: 500,
            advance_delay_ms: 1000,
            submit_delay_ms: 2000,
            ai_enabled: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.deepseek.com/v1".to_string(),
            llm_model_name: "deepseek-chat".to_string(),
            ai_answer_count: 5,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            mode: env_parse("SURVEY_MODE").unwrap_or(default.mode),
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT").unwrap_or(default.browser_debug_port),
            headless: env_parse("HEADLESS").unwrap_or(default.headless),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().filter(|v| !v.is_empty()).or(default.chrome_executable),
            survey_file: std::env::var("SURVEY_FILE").unwrap_or(default.survey_file),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(default.verbose_logging),
            page_load_delay_ms: env_parse("PAGE_LOAD_DELAY_MS").unwrap_or(default.page_load_delay_ms),
            fill_delay_ms: env_parse("FILL_DELAY_MS").unwrap_or(default.fill_delay_ms),
            advance_delay_ms: env_parse("ADVANCE_DELAY_MS").unwrap_or(default.advance_delay_ms),
            submit_delay_ms: env_parse("SUBMIT_DELAY_MS").unwrap_or(default.submit_delay_ms),
            ai_enabled: env_parse("AI_ENABLED").unwrap_or(default.ai_enabled),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            ai_answer_count: env_parse("AI_ANSWER_COUNT").unwrap_or(default.ai_answer_count),
        }
    }

    /// 页面等待时长
    pub fn settle_delays(&self) -> SettleDelays {
        SettleDelays {
            page_load: Duration::from_millis(self.page_load_delay_ms),
            fill: Duration::from_millis(self.fill_delay_ms),
            advance: Duration::from_millis(self.advance_delay_ms),
            submit: Duration::from_millis(self.submit_delay_ms),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// 页面变动后的固定等待
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SettleDelays {
    pub page_load: Duration,
    pub fill: Duration,
    pub advance: Duration,
    pub submit: Duration,
}

impl SettleDelays {
    /// 全部为 0（测试用）
    pub fn none() -> Self {
        Self {
            page_load: Duration::ZERO,
            fill: Duration::ZERO,
            advance: Duration::ZERO,
            submit: Duration::ZERO,
        }
    }
}

impl Default for SettleDelays {
    fn default() -> Self {
        Config::default().settle_delays()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_mode_parse() {
        assert_eq!("parse".parse::<RunMode>(), Ok(RunMode::Parse));
        assert_eq!(" Preview ".parse::<RunMode>(), Ok(RunMode::Preview));
        assert_eq!("RUN".parse::<RunMode>(), Ok(RunMode::Run));
        assert!("dry".parse::<RunMode>().is_err());
    }

    #[test]
    fn test_settle_delays() {
        let config = Config {
            page_load_delay_ms: 10,
            submit_delay_ms: 30,
            ..Config::default()
        };
        let delays = config.settle_delays();
        assert_eq!(delays.page_load, Duration::from_millis(10));
        assert_eq!(delays.fill, Duration::from_millis(500));
        assert_eq!(delays.submit, Duration::from_millis(30));
        assert_eq!(SettleDelays::none().advance, Duration::ZERO);
    }
}
