//! AI 答案生成 - 业务能力层
//!
//! 为只有默认答案的填空题生成候选答案
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务（如 DeepSeek, Doubao 等）

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, LlmError};
use crate::models::question::QuestionModel;
use crate::utils::logging::truncate_text;

/// AI 答案生成器
///
/// 职责：
/// - 根据题干生成若干简短口语化的回答
/// - 任何失败都返回空列表，由调用方保留默认答案
pub struct AnswerGenerator {
    client: Client<OpenAIConfig>,
    model_name: String,
    answer_count: usize,
}

impl AnswerGenerator {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            answer_count: config.ai_answer_count,
        }
    }

    /// 为题干生成候选答案，失败时返回空列表
    pub async fn generate_candidates(&self, title: &str) -> Vec<String> {
        info!("🤖 正在为题目生成答案: {}", truncate_text(title, 50));

        match self.request_answers(title).await {
            Ok(content) => {
                let answers = parse_ai_response(&content, self.answer_count);
                if answers.is_empty() {
                    warn!("⚠️ 未能从响应中解析出有效答案");
                } else {
                    info!("✓ 成功生成 {} 个答案", answers.len());
                }
                answers
            }
            Err(e) => {
                warn!("⚠️ AI 生成答案失败: {}", e);
                Vec::new()
            }
        }
    }

    /// 为列表中所有"有题干且只有默认答案"的填空题补充候选答案
    ///
    /// 返回被补充的题目数
    pub async fn augment(&self, questions: &mut [QuestionModel]) -> usize {
        let mut augmented = 0;
        for question in questions.iter_mut() {
            if !question.question_type.is_text_family() || !question.has_default_candidates() {
                continue;
            }
            let Some(title) = question.title.clone() else {
                continue;
            };

            let answers = self.generate_candidates(&title).await;
            if !answers.is_empty() {
                question.text_candidates = answers;
                augmented += 1;
            }
        }
        augmented
    }

    async fn request_answers(&self, title: &str) -> Result<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content("你是一个问卷填写助手，回答要简短、真实、口语化。")
            .build()?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(build_prompt(title, self.answer_count))
            .build()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .temperature(0.8)
            .max_tokens(200u32)
            .build()?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AppError::llm_api_failed(&self.model_name, e))?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                AppError::Llm(LlmError::EmptyContent {
                    model: self.model_name.clone(),
                })
            })?;

        debug!("LLM 原始响应: {}", truncate_text(&content, 100));
        Ok(content)
    }
}

fn build_prompt(title: &str, count: usize) -> String {
    format!(
        "请为问卷题目'{}'生成 {} 个简短、真实、口语化的回答。请直接返回 JSON 数组格式，不要包含 Markdown 标记。",
        title, count
    )
}

/// 从模型响应中解析答案数组
///
/// 依次尝试：整体 JSON、```json 代码块、任意 ``` 代码块。最多保留 `limit` 条。
pub fn parse_ai_response(content: &str, limit: usize) -> Vec<String> {
    let candidates = [
        Some(content.trim()),
        fenced_block(content, "```json"),
        fenced_block(content, "```"),
    ];

    candidates
        .into_iter()
        .flatten()
        .find_map(|body| match serde_json::from_str::<JsonValue>(body) {
            Ok(JsonValue::Array(items)) => Some(items),
            _ => None,
        })
        .map(|items| {
            items
                .into_iter()
                .take(limit)
                .map(|item| match item {
                    JsonValue::String(s) => s,
                    other => other.to_string(),
                })
                .filter(|answer| !answer.trim().is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn fenced_block<'a>(content: &'a str, fence: &str) -> Option<&'a str> {
    let start = content.find(fence)? + fence.len();
    let end = start + content[start..].find("```")?;
    Some(content[start..end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let answers = parse_ai_response(r#"["挺好的", "还需要改进", "非常满意"]"#, 5);
        assert_eq!(answers, vec!["挺好的", "还需要改进", "非常满意"]);
    }

    #[test]
    fn test_parse_fenced_blocks() {
        let json_block = "好的，答案如下：\n```json\n[\"a\", \"b\"]\n```\n";
        assert_eq!(parse_ai_response(json_block, 5), vec!["a", "b"]);

        let bare_block = "```\n[\"c\"]\n```";
        assert_eq!(parse_ai_response(bare_block, 5), vec!["c"]);
    }

    #[test]
    fn test_parse_limits_and_stringifies() {
        let answers = parse_ai_response(r#"[1, "二", 3, 4, 5, 6, 7]"#, 5);
        assert_eq!(answers, vec!["1", "二", "3", "4", "5"]);
    }

    #[test]
    fn test_parse_failure_is_empty() {
        assert!(parse_ai_response("我不知道", 5).is_empty());
        assert!(parse_ai_response(r#"{"a": 1}"#, 5).is_empty());
        assert!(parse_ai_response("```json\nnot json\n```", 5).is_empty());
    }

    #[test]
    fn test_prompt_mentions_title_and_count() {
        let prompt = build_prompt("您对食堂的建议是？", 5);
        assert!(prompt.contains("您对食堂的建议是？"));
        assert!(prompt.contains("5 个"));
    }

    /// 测试真实 LLM 调用
    #[tokio::test]
    #[ignore]
    async fn test_generate_candidates_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let generator = AnswerGenerator::new(&Config::from_env());
        let answers = generator.generate_candidates("您对食堂的建议是？").await;

        println!("生成的答案: {:?}", answers);
        assert!(!answers.is_empty());
    }
}
