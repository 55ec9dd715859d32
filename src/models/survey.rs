use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::question_list::QuestionList;

/// 并发数上限
pub const MAX_CONCURRENCY: usize = 12;

/// 问卷运行配置（由调用方持有，运行期间只读）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyConfig {
    /// 问卷链接
    pub url: String,
    /// 目标成功份数
    pub target_count: usize,
    /// 并发数（同时使用的页面数）
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// 两次提交之间的最小间隔（秒）
    #[serde(default)]
    pub interval_min: u64,
    /// 两次提交之间的最大间隔（秒）
    #[serde(default)]
    pub interval_max: u64,
    /// 累计失败上限，未设置时不限制
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_failures: Option<usize>,
    #[serde(default)]
    pub questions: QuestionList,
}

fn default_concurrency() -> usize {
    1
}

impl SurveyConfig {
    pub fn new(url: impl Into<String>, target_count: usize) -> Self {
        Self {
            url: url.into(),
            target_count,
            concurrency: default_concurrency(),
            interval_min: 0,
            interval_max: 0,
            max_failures: None,
            questions: QuestionList::new(),
        }
    }

    /// 验证配置是否有效
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_survey_url(&self.url) {
            return Err(ConfigError::InvalidUrl {
                url: self.url.clone(),
            });
        }

        if self.target_count == 0 {
            return Err(ConfigError::InvalidTargetCount);
        }

        if !(1..=MAX_CONCURRENCY).contains(&self.concurrency) {
            return Err(ConfigError::ConcurrencyOutOfRange {
                value: self.concurrency,
                max: MAX_CONCURRENCY,
            });
        }

        if self.interval_min > self.interval_max {
            return Err(ConfigError::InvalidInterval {
                min: self.interval_min,
                max: self.interval_max,
            });
        }

        let mut seen = HashSet::new();
        for question in &self.questions {
            question.validate()?;
            if !seen.insert(question.ordinal) {
                return Err(ConfigError::InvalidQuestion {
                    ordinal: question.ordinal,
                    reason: "题号重复".to_string(),
                });
            }
        }

        Ok(())
    }

    /// 是否配置了间隔等待
    pub fn has_interval(&self) -> bool {
        self.interval_max > 0
    }
}

/// 检查是否为有效的问卷星链接
pub fn is_valid_survey_url(url: &str) -> bool {
    let trimmed = url.trim().to_lowercase();
    !trimmed.is_empty() && (trimmed.contains("wjx.cn") || trimmed.contains("wjx.top"))
}

/// 执行状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// 空闲
    #[default]
    Idle,
    /// 运行中
    Running,
    /// 暂停（保留，目前不会进入）
    Paused,
    /// 已停止
    Stopped,
    /// 已完成
    Completed,
}

impl ExecutionStatus {
    pub fn display_name(self) -> &'static str {
        match self {
            ExecutionStatus::Idle => "空闲",
            ExecutionStatus::Running => "运行中",
            ExecutionStatus::Paused => "已暂停",
            ExecutionStatus::Stopped => "已停止",
            ExecutionStatus::Completed => "已完成",
        }
    }
}

/// 执行结果快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: usize,
    pub failed: usize,
    pub total: usize,
}

impl ExecutionResult {
    pub fn new(success: usize, failed: usize, total: usize) -> Self {
        Self {
            success,
            failed,
            total,
        }
    }

    /// 进度百分比：floor((success + failed) * 100 / total)
    pub fn progress(&self) -> usize {
        if self.total > 0 {
            (self.success + self.failed) * 100 / self.total
        } else {
            0
        }
    }
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    pub fn display_name(self) -> &'static str {
        match self {
            LogLevel::Info => "信息",
            LogLevel::Success => "成功",
            LogLevel::Warning => "警告",
            LogLevel::Error => "错误",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::QuestionModel;

    fn valid_config() -> SurveyConfig {
        let mut config = SurveyConfig::new("https://www.wjx.cn/vm/abc.aspx", 3);
        config.questions.push(QuestionModel::single(1, 4));
        config.questions.push(QuestionModel::multiple(2, 3));
        config
    }

    #[test]
    fn test_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_url_domains() {
        assert!(is_valid_survey_url("https://v.wjx.cn/vm/x.aspx"));
        assert!(is_valid_survey_url("  HTTPS://WWW.WJX.TOP/vm/x.aspx "));
        assert!(!is_valid_survey_url("https://example.com/survey"));
        assert!(!is_valid_survey_url("   "));
    }

    #[test]
    fn test_invalid_fields() {
        let mut config = valid_config();
        config.target_count = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTargetCount)
        ));

        let mut config = valid_config();
        config.concurrency = MAX_CONCURRENCY + 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ConcurrencyOutOfRange { .. })
        ));

        let mut config = valid_config();
        config.interval_min = 5;
        config.interval_max = 2;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidInterval { min: 5, max: 2 })
        ));
    }

    #[test]
    fn test_duplicate_ordinal() {
        let mut config = valid_config();
        config.questions.push(QuestionModel::single(1, 2));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidQuestion { ordinal: 1, .. })
        ));
    }

    #[test]
    fn test_progress() {
        assert_eq!(ExecutionResult::new(0, 0, 3).progress(), 0);
        assert_eq!(ExecutionResult::new(1, 0, 3).progress(), 33);
        assert_eq!(ExecutionResult::new(2, 0, 3).progress(), 66);
        assert_eq!(ExecutionResult::new(3, 0, 3).progress(), 100);
        assert_eq!(ExecutionResult::new(1, 1, 3).progress(), 66);
        assert_eq!(ExecutionResult::new(0, 0, 0).progress(), 0);
    }

    #[test]
    fn test_config_from_toml() {
        let config: SurveyConfig = toml::from_str(
            r#"
            url = "https://www.wjx.cn/vm/abc.aspx"
            target_count = 10
            interval_min = 1
            interval_max = 3

            [[questions]]
            type = "single_choice"
            ordinal = 1
            option_count = 4
            distribution_mode = "custom"
            weights = [10.0, 0.0, 0.0, 0.0]

            [[questions]]
            type = "text"
            ordinal = 2
            text_candidates = ["很好", "张三||13800000000"]
            "#,
        )
        .unwrap();

        assert_eq!(config.concurrency, 1);
        assert_eq!(config.questions.len(), 2);
        assert_eq!(
            config.questions.get(0).and_then(|q| q.weights.clone()),
            Some(vec![10.0, 0.0, 0.0, 0.0])
        );
        assert!(config.validate().is_ok());
    }
}
