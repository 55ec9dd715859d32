//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"导航"和"执行 JS"的能力

use async_trait::async_trait;
use chromiumoxide::Page;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{AppError, AppResult, ScriptError};
use crate::infrastructure::page_surface::PageSurface;

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 navigate() / eval() 能力
/// - 不认识问卷和题目
/// - 不处理业务流程
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> AppResult<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value().map_err(|e| {
            AppError::Script(ScriptError::UnexpectedResult { raw: e.to_string() })
        })?;
        Ok(json_value)
    }

    /// 执行 JS 代码，结果转成字符串
    ///
    /// 字符串结果去掉 JSON 引号，其余类型按 JSON 文本返回
    pub async fn eval_string(&self, js_code: impl Into<String>) -> AppResult<String> {
        let value = self.eval(js_code).await?;
        Ok(match value {
            JsonValue::String(s) => s,
            JsonValue::Null => String::new(),
            other => other.to_string(),
        })
    }
}

#[async_trait]
impl PageSurface for JsExecutor {
    async fn navigate(&self, url: &str) -> AppResult<()> {
        debug!("导航到: {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| AppError::navigation_failed(url, e))?;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> AppResult<String> {
        self.eval_string(script).await
    }
}
