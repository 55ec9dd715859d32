//! 随机作答 - 业务能力层
//!
//! 与页面脚本中的抽样算法保持一致的 Rust 实现，
//! 用于预览一份随机答卷以及计算提交间隔。

use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::models::question::{
    AnswerFamily, DistributionMode, QuestionModel, DEFAULT_INCLUSION_PROBABILITY,
    MULTI_PART_DELIMITER, SLIDER_OPTION_COUNT,
};
use crate::models::survey::SurveyConfig;

/// 加权抽取一个选项下标
///
/// 权重为 `None`、为空、或总和 ≤ 0 时退化为在 `option_count` 个选项上均匀抽取。
/// 负权重视为 0。
pub fn weighted_index<R: Rng + ?Sized>(
    rng: &mut R,
    weights: Option<&[f64]>,
    option_count: usize,
) -> usize {
    let uniform = |rng: &mut R| {
        if option_count == 0 {
            0
        } else {
            rng.gen_range(0..option_count)
        }
    };

    let weights = match weights {
        Some(weights) if !weights.is_empty() => weights,
        _ => return uniform(rng),
    };

    let total: f64 = weights.iter().map(|w| w.max(0.0)).sum();
    if !(total > 0.0) {
        return uniform(rng);
    }

    let r = rng.gen::<f64>() * total;
    let mut sum = 0.0;
    for (i, weight) in weights.iter().enumerate() {
        sum += weight.max(0.0);
        // 严格大于：r 取到 0 时也不会落在权重为 0 的选项上
        if sum > r {
            return i;
        }
    }

    // 浮点累加误差，落到最后一个有权重的选项
    weights
        .iter()
        .rposition(|w| *w > 0.0)
        .unwrap_or(weights.len() - 1)
}

/// 多选题：每个选项按概率独立抽取，结果为空时随机补选一个
pub fn multi_select<R: Rng + ?Sized>(
    rng: &mut R,
    probabilities: Option<&[f64]>,
    option_count: usize,
) -> Vec<usize> {
    if option_count == 0 {
        return Vec::new();
    }

    let mut selected: Vec<usize> = (0..option_count)
        .filter(|i| {
            let p = probabilities
                .and_then(|ps| ps.get(*i))
                .copied()
                .unwrap_or(DEFAULT_INCLUSION_PROBABILITY);
            rng.gen::<f64>() * 100.0 < p
        })
        .collect();

    if selected.is_empty() {
        selected.push(rng.gen_range(0..option_count));
    }
    selected
}

/// 排序题：Fisher–Yates 洗牌得到点击顺序
pub fn shuffle_order<R: Rng + ?Sized>(rng: &mut R, item_count: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..item_count).collect();
    order.shuffle(rng);
    order
}

/// 滑块题：1-100 均匀取整
pub fn uniform_slider<R: Rng + ?Sized>(rng: &mut R) -> usize {
    rng.gen_range(1..=SLIDER_OPTION_COUNT)
}

/// 把一条候选答案分配到 `field_count` 个输入框
///
/// 包含分隔符时按位置分配，多出的输入框复用第一段；否则每个输入框填同一值。
pub fn distribute_text(candidate: &str, field_count: usize) -> Vec<String> {
    if candidate.contains(MULTI_PART_DELIMITER) {
        let parts: Vec<&str> = candidate.split(MULTI_PART_DELIMITER).collect();
        (0..field_count)
            .map(|i| {
                parts
                    .get(i)
                    .filter(|part| !part.is_empty())
                    .or_else(|| parts.first())
                    .map(|part| part.to_string())
                    .unwrap_or_default()
            })
            .collect()
    } else {
        vec![candidate.to_string(); field_count]
    }
}

/// 计算本次提交后的等待时长，区间为 0 时不等待
pub fn draw_interval<R: Rng + ?Sized>(rng: &mut R, config: &SurveyConfig) -> Option<Duration> {
    if !config.has_interval() {
        return None;
    }

    let seconds = if config.interval_min == config.interval_max {
        config.interval_min
    } else {
        rng.gen_range(config.interval_min..=config.interval_max)
    };

    (seconds > 0).then(|| Duration::from_secs(seconds))
}

/// 单题的一次抽样结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SampledAnswer {
    /// 各输入框的值
    Text(Vec<String>),
    /// 选中的选项下标
    Choice(usize),
    /// 多选选中的下标
    Choices(Vec<usize>),
    /// 矩阵各行选中的列下标
    Rows(Vec<usize>),
    /// 滑块值
    Slider(usize),
    /// 排序点击顺序
    Order(Vec<usize>),
}

/// 预览答卷中的一题
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewItem {
    pub ordinal: usize,
    pub family: AnswerFamily,
    pub answer: SampledAnswer,
}

fn choice_weights(question: &QuestionModel) -> Option<&[f64]> {
    match question.distribution_mode {
        DistributionMode::Custom => question.weights.as_deref(),
        DistributionMode::Random | DistributionMode::Equal => None,
    }
}

/// 按题目配置抽样一份答卷（不接触页面）
pub fn preview_answers<R: Rng + ?Sized>(
    rng: &mut R,
    questions: &[QuestionModel],
) -> Vec<PreviewItem> {
    questions
        .iter()
        .map(|question| {
            let family = question.family();
            let answer = match family {
                AnswerFamily::Text => {
                    let candidates = question.effective_candidates();
                    let candidate = candidates
                        .choose(rng)
                        .cloned()
                        .unwrap_or_default();
                    let field_count = candidate.split(MULTI_PART_DELIMITER).count().max(1);
                    SampledAnswer::Text(distribute_text(&candidate, field_count))
                }
                AnswerFamily::Single | AnswerFamily::Scale | AnswerFamily::Dropdown => {
                    SampledAnswer::Choice(weighted_index(
                        rng,
                        choice_weights(question),
                        question.option_count,
                    ))
                }
                AnswerFamily::Matrix => SampledAnswer::Rows(
                    (0..question.row_count.max(1))
                        .map(|_| {
                            weighted_index(rng, choice_weights(question), question.option_count)
                        })
                        .collect(),
                ),
                AnswerFamily::Multiple => SampledAnswer::Choices(multi_select(
                    rng,
                    question.per_option_probabilities.as_deref(),
                    question.option_count,
                )),
                AnswerFamily::Slider => SampledAnswer::Slider(uniform_slider(rng)),
                AnswerFamily::Ranking => {
                    SampledAnswer::Order(shuffle_order(rng, question.option_count))
                }
            };

            PreviewItem {
                ordinal: question.ordinal,
                family,
                answer,
            }
        })
        .collect()
}
