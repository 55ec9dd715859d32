//! 作答脚本编译器 - 业务能力层
//!
//! 把题目列表编译成三段页面脚本（填写 / 翻页提交 / 状态检测）。
//! 编译过程是确定的，随机抽样只在脚本于页面上求值时发生，
//! 因此同一份脚本反复执行会得到不同的答卷。

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::error::AppResult;
use crate::models::question::{
    AnswerFamily, DistributionMode, QuestionModel, DEFAULT_INCLUSION_PROBABILITY,
};
use crate::services::script_templates::{
    ADVANCE_SCRIPT, FILL_TEMPLATE, STATUS_CHECK_SCRIPT, TABLES_PLACEHOLDER,
};

/// (表族, 族内序号)，序列化为 `["single", 0]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FamilyKey(pub AnswerFamily, pub usize);

/// 按表族组织的作答表
///
/// 由完整题目列表一次性构建；族内序号按题目在列表中的先后计算，
/// `index` 记录页面题号到键的映射，页面脚本据此取表，不依赖页内计数。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnswerTables {
    /// 页面题型代码 → 表族
    pub codes: BTreeMap<&'static str, AnswerFamily>,
    /// 页面题号 → (表族, 族内序号)
    pub index: BTreeMap<String, FamilyKey>,
    /// 填空候选答案
    pub text: Vec<Vec<String>>,
    /// 单选权重，`None` 表示均匀随机
    pub single: Vec<Option<Vec<f64>>>,
    /// 多选各选项概率（百分比）
    pub multiple: Vec<Vec<f64>>,
    pub scale: Vec<Option<Vec<f64>>>,
    /// 矩阵列权重（每行独立抽取）
    pub matrix: Vec<Option<Vec<f64>>>,
    pub dropdown: Vec<Option<Vec<f64>>>,
    /// 滑块、排序题不需要配置，只计数以保持序号稳定
    #[serde(skip)]
    pub slider: usize,
    #[serde(skip)]
    pub ranking: usize,
}

impl AnswerTables {
    /// 从完整题目列表构建作答表
    pub fn build(questions: &[QuestionModel]) -> Self {
        let mut tables = AnswerTables {
            codes: AnswerFamily::type_codes().collect(),
            ..Default::default()
        };

        for question in questions {
            let family = question.family();
            let local_index = match family {
                AnswerFamily::Text => {
                    tables.text.push(question.effective_candidates());
                    tables.text.len() - 1
                }
                AnswerFamily::Single => push_weights(&mut tables.single, question),
                AnswerFamily::Scale => push_weights(&mut tables.scale, question),
                AnswerFamily::Matrix => push_weights(&mut tables.matrix, question),
                AnswerFamily::Dropdown => push_weights(&mut tables.dropdown, question),
                AnswerFamily::Multiple => {
                    let probabilities = question
                        .per_option_probabilities
                        .clone()
                        .unwrap_or_else(|| {
                            vec![DEFAULT_INCLUSION_PROBABILITY; question.option_count]
                        });
                    tables.multiple.push(probabilities);
                    tables.multiple.len() - 1
                }
                AnswerFamily::Slider => {
                    tables.slider += 1;
                    tables.slider - 1
                }
                AnswerFamily::Ranking => {
                    tables.ranking += 1;
                    tables.ranking - 1
                }
            };

            tables
                .index
                .insert(question.ordinal.to_string(), FamilyKey(family, local_index));
        }

        tables
    }

    /// 按题号查找键
    pub fn key_for(&self, ordinal: usize) -> Option<FamilyKey> {
        self.index.get(&ordinal.to_string()).copied()
    }

    /// 选择类题目的权重表（单选/量表/矩阵/下拉）
    pub fn weights_for(&self, key: FamilyKey) -> Option<&Option<Vec<f64>>> {
        let FamilyKey(family, index) = key;
        match family {
            AnswerFamily::Single => self.single.get(index),
            AnswerFamily::Scale => self.scale.get(index),
            AnswerFamily::Matrix => self.matrix.get(index),
            AnswerFamily::Dropdown => self.dropdown.get(index),
            _ => None,
        }
    }
}

/// 随机/平均分配都按均匀抽取处理，只有自定义配比写入权重
fn push_weights(table: &mut Vec<Option<Vec<f64>>>, question: &QuestionModel) -> usize {
    let weights = match question.distribution_mode {
        DistributionMode::Custom => question.weights.clone(),
        DistributionMode::Random | DistributionMode::Equal => None,
    };
    table.push(weights);
    table.len() - 1
}

/// 编译产物，运行期间不可变
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptBundle {
    /// 填写当前页
    pub fill: String,
    /// 翻页或提交
    pub advance: String,
    /// 状态检测
    pub status_check: String,
}

/// 作答脚本编译器
pub struct AnswerScriptCompiler;

impl AnswerScriptCompiler {
    /// 编译题目列表
    pub fn compile(questions: &[QuestionModel]) -> AppResult<ScriptBundle> {
        let tables = AnswerTables::build(questions);
        let tables_json = serde_json::to_string(&tables)?;

        debug!(
            "作答表编译完成: {} 道题目, JSON {} 字节",
            tables.index.len(),
            tables_json.len()
        );

        Ok(ScriptBundle {
            fill: FILL_TEMPLATE.replace(TABLES_PLACEHOLDER, &tables_json),
            advance: ADVANCE_SCRIPT.to_string(),
            status_check: STATUS_CHECK_SCRIPT.to_string(),
        })
    }
}

/// 去掉脚本返回值外层可能残留的引号和空白
fn normalize_tag(raw: &str) -> &str {
    raw.trim().trim_matches('"').trim()
}

/// 填写脚本的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillOutcome {
    /// 已填写的题目数
    Filled(usize),
    /// 脚本内部捕获到的错误
    Error(String),
    /// 无法识别的返回值
    Unrecognized(String),
}

impl FillOutcome {
    pub fn from_tag(raw: &str) -> Self {
        let tag = normalize_tag(raw);
        if let Some(count) = tag.strip_prefix("filled:") {
            return match count.trim().parse() {
                Ok(count) => FillOutcome::Filled(count),
                Err(_) => FillOutcome::Unrecognized(tag.to_string()),
            };
        }
        if let Some(message) = tag.strip_prefix("error:") {
            return FillOutcome::Error(message.to_string());
        }
        FillOutcome::Unrecognized(tag.to_string())
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, FillOutcome::Filled(_))
    }
}

/// 翻页脚本的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceAction {
    Next,
    Submit,
    NotFound,
}

impl AdvanceAction {
    pub fn from_tag(raw: &str) -> Self {
        match normalize_tag(raw) {
            "next" => AdvanceAction::Next,
            "submit" => AdvanceAction::Submit,
            _ => AdvanceAction::NotFound,
        }
    }
}

/// 页面状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    Completed,
    QuotaExceeded,
    InProgress,
}

impl PageStatus {
    pub fn from_tag(raw: &str) -> Self {
        match normalize_tag(raw) {
            "completed" => PageStatus::Completed,
            "quota_exceeded" => PageStatus::QuotaExceeded,
            _ => PageStatus::InProgress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{QuestionType, ScaleWidget};

    fn sample_questions() -> Vec<QuestionModel> {
        let mut slider = QuestionModel::new(QuestionType::Scale, 4);
        slider.option_count = 100;
        slider.widget = ScaleWidget::Slider;

        let mut scale = QuestionModel::new(QuestionType::Scale, 5);
        scale.option_count = 5;
        scale.distribution_mode = DistributionMode::Equal;

        vec![
            QuestionModel::single(1, 4).with_weights(vec![10.0, 0.0, 0.0, 0.0]),
            QuestionModel::text(2, vec!["张三||138".to_string()]),
            QuestionModel::single(3, 2),
            slider,
            scale,
            QuestionModel::multiple(6, 3),
        ]
    }

    #[test]
    fn test_tables_keyed_by_family_local_index() {
        let tables = AnswerTables::build(&sample_questions());

        assert_eq!(tables.key_for(1), Some(FamilyKey(AnswerFamily::Single, 0)));
        assert_eq!(tables.key_for(2), Some(FamilyKey(AnswerFamily::Text, 0)));
        assert_eq!(tables.key_for(3), Some(FamilyKey(AnswerFamily::Single, 1)));
        assert_eq!(tables.key_for(4), Some(FamilyKey(AnswerFamily::Slider, 0)));
        // 滑块题不占用量表表族的序号
        assert_eq!(tables.key_for(5), Some(FamilyKey(AnswerFamily::Scale, 0)));
        assert_eq!(tables.key_for(6), Some(FamilyKey(AnswerFamily::Multiple, 0)));
        assert_eq!(tables.key_for(7), None);

        assert_eq!(
            tables.weights_for(FamilyKey(AnswerFamily::Single, 0)),
            Some(&Some(vec![10.0, 0.0, 0.0, 0.0]))
        );
        assert_eq!(tables.weights_for(FamilyKey(AnswerFamily::Single, 1)), Some(&None));
        // 平均分配按均匀抽取
        assert_eq!(tables.weights_for(FamilyKey(AnswerFamily::Scale, 0)), Some(&None));
        assert_eq!(tables.multiple, vec![vec![50.0, 50.0, 50.0]]);
        assert_eq!(tables.text, vec![vec!["张三||138".to_string()]]);
    }

    #[test]
    fn test_empty_text_candidates_fall_back_to_default() {
        let tables = AnswerTables::build(&[QuestionModel::text(1, vec![])]);
        assert_eq!(tables.text, vec![vec!["无".to_string()]]);
    }

    #[test]
    fn test_compile_embeds_tables() {
        let bundle = AnswerScriptCompiler::compile(&sample_questions()).unwrap();

        assert!(!bundle.fill.contains(TABLES_PLACEHOLDER));
        assert!(bundle.fill.contains(r#""1":["single",0]"#));
        assert!(bundle.fill.contains(r#""4":["slider",0]"#));
        assert!(bundle.fill.contains(r#""single":[[10.0,0.0,0.0,0.0],null]"#));
        assert!(bundle.fill.contains(r#""11":"ranking""#));
        assert!(bundle.fill.contains("return 'filled:' + filled;"));
        assert!(bundle.advance.contains("'submit'"));
        assert!(bundle.status_check.contains("quota_exceeded"));
    }

    #[test]
    fn test_compile_is_deterministic() {
        let questions = sample_questions();
        let first = AnswerScriptCompiler::compile(&questions).unwrap();
        let second = AnswerScriptCompiler::compile(&questions).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_compile_escapes_text() {
        let questions = vec![QuestionModel::text(1, vec!["他说\"好\"\n</script>".to_string()])];
        let bundle = AnswerScriptCompiler::compile(&questions).unwrap();
        assert!(bundle.fill.contains(r#"他说\"好\"\n</script>"#));
    }

    #[test]
    fn test_result_tags() {
        assert_eq!(FillOutcome::from_tag("filled:3"), FillOutcome::Filled(3));
        assert_eq!(FillOutcome::from_tag("\"filled:0\""), FillOutcome::Filled(0));
        assert_eq!(
            FillOutcome::from_tag("error:boom"),
            FillOutcome::Error("boom".to_string())
        );
        assert!(!FillOutcome::from_tag("filled:x").is_filled());
        assert!(!FillOutcome::from_tag("null").is_filled());

        assert_eq!(AdvanceAction::from_tag("next"), AdvanceAction::Next);
        assert_eq!(AdvanceAction::from_tag("\"submit\""), AdvanceAction::Submit);
        assert_eq!(AdvanceAction::from_tag("not_found"), AdvanceAction::NotFound);

        assert_eq!(PageStatus::from_tag("completed"), PageStatus::Completed);
        assert_eq!(PageStatus::from_tag("quota_exceeded"), PageStatus::QuotaExceeded);
        assert_eq!(PageStatus::from_tag("in_progress"), PageStatus::InProgress);
        assert_eq!(PageStatus::from_tag("garbage"), PageStatus::InProgress);
    }
}
