//! # Survey Filler
//!
//! 一个用于问卷星（wjx.cn）问卷自动填写的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `PageSurface` - 导航 + 执行脚本的最小契约
//! - `JsExecutor` - 基于 chromiumoxide 的实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `SurveyParser` - 把问卷 HTML 解析为题目列表
//! - `AnswerScriptCompiler` - 把题目配置编译为页面脚本
//! - `AnswerGenerator` - AI 生成填空答案
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一份问卷"的完整处理流程
//! - `AttemptCtx` - 上下文封装（尝试序号 + 页面槽位）
//! - `AttemptFlow` - 流程编排（打开 → 填写 → 翻页/提交 → 检测完成）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/submission` - 循环提交直到达到目标份数
//! - `orchestrator/app` - 应用入口，管理配置和浏览器
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::{connect_to_browser_and_page, launch_browser};
pub use config::{Config, RunMode, SettleDelays};
pub use error::{AppError, AppResult};
pub use infrastructure::{JsExecutor, PageSurface, SurfaceProvider};
pub use models::{
    ExecutionResult, ExecutionStatus, LogLevel, QuestionList, QuestionModel, QuestionType,
    SurveyConfig,
};
pub use orchestrator::{App, RunObserver, SubmissionOrchestrator, TracingObserver};
pub use services::{AnswerScriptCompiler, ScriptBundle, SurveyParser};
pub use workflow::{AttemptCtx, AttemptFlow, AttemptOutcome};
