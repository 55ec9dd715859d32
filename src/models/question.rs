use phf::phf_map;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 填空题的默认答案
pub const DEFAULT_TEXT_ANSWER: &str = "无";

/// 多项填空答案的分隔符，例如 `张三||13800000000`
pub const MULTI_PART_DELIMITER: &str = "||";

/// 多选题默认的单项选中概率（百分比）
pub const DEFAULT_INCLUSION_PROBABILITY: f64 = 50.0;

/// 滑块题的取值个数
pub const SLIDER_OPTION_COUNT: usize = 100;

/// 题目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// 单选题
    SingleChoice,
    /// 多选题
    MultipleChoice,
    /// 下拉题
    Dropdown,
    /// 矩阵题
    Matrix,
    /// 量表题（滑块题、排序题也归入此类）
    Scale,
    /// 填空题
    Text,
    /// 多项填空题
    MultiText,
    /// 位置题
    Location,
}

impl QuestionType {
    /// 获取中文名称
    pub fn display_name(self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "单选题",
            QuestionType::MultipleChoice => "多选题",
            QuestionType::Dropdown => "下拉题",
            QuestionType::Matrix => "矩阵题",
            QuestionType::Scale => "量表题",
            QuestionType::Text => "填空题",
            QuestionType::MultiText => "多项填空题",
            QuestionType::Location => "位置题",
        }
    }

    /// 是否属于填空类题型
    pub fn is_text_family(self) -> bool {
        matches!(
            self,
            QuestionType::Text | QuestionType::MultiText | QuestionType::Location
        )
    }
}

/// 量表题的具体控件形态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleWidget {
    /// 普通量表
    #[default]
    Standard,
    /// 滑块（取值 1-100）
    Slider,
    /// 排序（随机排列点击顺序）
    Ranking,
}

/// 分布模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionMode {
    /// 完全随机
    #[default]
    Random,
    /// 平均分配
    Equal,
    /// 自定义配比
    Custom,
}

impl DistributionMode {
    pub fn display_name(self) -> &'static str {
        match self {
            DistributionMode::Random => "完全随机",
            DistributionMode::Equal => "平均分配",
            DistributionMode::Custom => "自定义配比",
        }
    }
}

/// 作答表族
///
/// 页面上的每个题目块按 `type` 属性归入一个表族，
/// 编译后的作答表以 (表族, 族内序号) 为键。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerFamily {
    Text,
    Single,
    Multiple,
    Scale,
    Matrix,
    Dropdown,
    Slider,
    Ranking,
}

/// 页面题型代码 → 表族
static TYPE_CODES: phf::Map<&'static str, AnswerFamily> = phf_map! {
    "1" => AnswerFamily::Text,
    "2" => AnswerFamily::Text,
    "3" => AnswerFamily::Single,
    "4" => AnswerFamily::Multiple,
    "5" => AnswerFamily::Scale,
    "6" => AnswerFamily::Matrix,
    "7" => AnswerFamily::Dropdown,
    "8" => AnswerFamily::Slider,
    "11" => AnswerFamily::Ranking,
};

impl AnswerFamily {
    /// 从页面 `type` 属性解析表族
    pub fn from_type_code(code: &str) -> Option<Self> {
        TYPE_CODES.get(code.trim()).copied()
    }

    /// 所有已知的 (题型代码, 表族) 对
    pub fn type_codes() -> impl Iterator<Item = (&'static str, AnswerFamily)> {
        TYPE_CODES.entries().map(|(code, family)| (*code, *family))
    }
}

/// 归一化后的题目模型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionModel {
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// 页面题号（从 1 开始，对应页面的 topic 属性）
    pub ordinal: usize,
    #[serde(default = "default_option_count")]
    pub option_count: usize,
    /// 矩阵题行数
    #[serde(default = "default_row_count")]
    pub row_count: usize,
    #[serde(default)]
    pub distribution_mode: DistributionMode,
    /// 自定义权重（Custom 模式下长度必须等于 option_count）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<Vec<f64>>,
    /// 多选题各选项概率（百分比 0-100）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_option_probabilities: Option<Vec<f64>>,
    /// 填空候选答案
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub text_candidates: Vec<String>,
    #[serde(default)]
    pub is_location: bool,
    #[serde(default)]
    pub widget: ScaleWidget,
    /// 题干（仅用于日志和 AI 生成答案）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

fn default_option_count() -> usize {
    4
}

fn default_row_count() -> usize {
    1
}

impl QuestionModel {
    /// 创建指定题型的题目，其余字段取默认值
    pub fn new(question_type: QuestionType, ordinal: usize) -> Self {
        Self {
            question_type,
            ordinal,
            option_count: default_option_count(),
            row_count: default_row_count(),
            distribution_mode: DistributionMode::Random,
            weights: None,
            per_option_probabilities: None,
            text_candidates: Vec::new(),
            is_location: question_type == QuestionType::Location,
            widget: ScaleWidget::Standard,
            title: None,
        }
    }

    /// 单选题
    pub fn single(ordinal: usize, option_count: usize) -> Self {
        Self {
            option_count,
            ..Self::new(QuestionType::SingleChoice, ordinal)
        }
    }

    /// 多选题，默认每个选项 50% 概率
    pub fn multiple(ordinal: usize, option_count: usize) -> Self {
        Self {
            option_count,
            per_option_probabilities: Some(vec![DEFAULT_INCLUSION_PROBABILITY; option_count]),
            ..Self::new(QuestionType::MultipleChoice, ordinal)
        }
    }

    /// 填空题
    pub fn text(ordinal: usize, candidates: Vec<String>) -> Self {
        Self {
            text_candidates: candidates,
            ..Self::new(QuestionType::Text, ordinal)
        }
    }

    /// 设置自定义权重
    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.distribution_mode = DistributionMode::Custom;
        self.weights = Some(weights);
        self
    }

    /// 修改题型（填空/多项填空/位置题之间切换）
    pub fn with_type(mut self, question_type: QuestionType) -> Self {
        self.question_type = question_type;
        self.is_location |= question_type == QuestionType::Location;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// 该题对应的作答表族
    pub fn family(&self) -> AnswerFamily {
        match self.question_type {
            QuestionType::Text | QuestionType::MultiText | QuestionType::Location => {
                AnswerFamily::Text
            }
            QuestionType::SingleChoice => AnswerFamily::Single,
            QuestionType::MultipleChoice => AnswerFamily::Multiple,
            QuestionType::Dropdown => AnswerFamily::Dropdown,
            QuestionType::Matrix => AnswerFamily::Matrix,
            QuestionType::Scale => match self.widget {
                ScaleWidget::Standard => AnswerFamily::Scale,
                ScaleWidget::Slider => AnswerFamily::Slider,
                ScaleWidget::Ranking => AnswerFamily::Ranking,
            },
        }
    }

    /// 实际用于抽取的候选答案（未配置时为默认答案）
    pub fn effective_candidates(&self) -> Vec<String> {
        if self.text_candidates.is_empty() {
            vec![DEFAULT_TEXT_ANSWER.to_string()]
        } else {
            self.text_candidates.clone()
        }
    }

    /// 候选答案是否只有默认值
    pub fn has_default_candidates(&self) -> bool {
        self.text_candidates.is_empty()
            || self
                .text_candidates
                .iter()
                .all(|candidate| candidate == DEFAULT_TEXT_ANSWER)
    }

    /// 校验题目自身的不变量
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidQuestion {
            ordinal: self.ordinal,
            reason,
        };

        if self.ordinal == 0 {
            return Err(invalid("题号必须从 1 开始".to_string()));
        }

        if !self.question_type.is_text_family() && self.option_count < 2 {
            return Err(invalid(format!("选项数 {} 小于 2", self.option_count)));
        }

        if self.question_type == QuestionType::Matrix && self.row_count < 1 {
            return Err(invalid("矩阵题至少需要 1 行".to_string()));
        }

        if self.distribution_mode == DistributionMode::Custom {
            match &self.weights {
                Some(weights) if weights.len() == self.option_count => {}
                Some(weights) => {
                    return Err(invalid(format!(
                        "权重个数 {} 与选项数 {} 不一致",
                        weights.len(),
                        self.option_count
                    )))
                }
                None => return Err(invalid("自定义配比缺少权重".to_string())),
            }
        }

        if let Some(probabilities) = &self.per_option_probabilities {
            if probabilities.len() != self.option_count {
                return Err(invalid(format!(
                    "概率个数 {} 与选项数 {} 不一致",
                    probabilities.len(),
                    self.option_count
                )));
            }
            if probabilities.iter().any(|p| !(0.0..=100.0).contains(p)) {
                return Err(invalid("概率必须在 0-100 之间".to_string()));
            }
        }

        Ok(())
    }

    /// 获取题目摘要描述
    pub fn summary(&self) -> String {
        if self.question_type.is_text_family() {
            let samples = if self.text_candidates.is_empty() {
                "未设置".to_string()
            } else {
                self.text_candidates
                    .iter()
                    .take(3)
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(" | ")
            };
            return if self.is_location {
                format!("位置题: {}", samples)
            } else {
                format!("填空题: {}", samples)
            };
        }

        match self.question_type {
            QuestionType::Matrix => format!(
                "{}行 × {}列 - {}",
                self.row_count,
                self.option_count,
                self.distribution_mode.display_name()
            ),
            QuestionType::MultipleChoice => match &self.per_option_probabilities {
                Some(probabilities) if self.distribution_mode != DistributionMode::Random => {
                    let weights = probabilities
                        .iter()
                        .map(|p| format!("{}%", *p as i64))
                        .collect::<Vec<_>>()
                        .join(",");
                    format!("{}个选项 - 权重 {}", self.option_count, weights)
                }
                _ => format!("{}个选项 - 随机多选", self.option_count),
            },
            _ => match (&self.distribution_mode, &self.weights) {
                (DistributionMode::Custom, Some(weights)) => {
                    let ratio = weights
                        .iter()
                        .map(|w| {
                            if w.fract() == 0.0 {
                                format!("{}", *w as i64)
                            } else {
                                format!("{:.1}", w)
                            }
                        })
                        .collect::<Vec<_>>()
                        .join(":");
                    format!("{}个选项 - 配比 {}", self.option_count, ratio)
                }
                _ => format!(
                    "{}个选项 - {}",
                    self.option_count,
                    self.distribution_mode.display_name()
                ),
            },
        }
    }
}
