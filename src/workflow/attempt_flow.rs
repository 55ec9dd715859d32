//! 单次提交流程 - 流程层
//!
//! 核心职责：定义"一份问卷"从打开到提交的完整流程
//!
//! 流程顺序：
//! 1. 打开问卷 → 检测配额
//! 2. 填写当前页
//! 3. 翻页/提交循环（最多 10 轮），每轮检测是否已完成

use std::sync::Arc;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::SettleDelays;
use crate::error::{AppError, AppResult, ScriptError};
use crate::infrastructure::PageSurface;
use crate::services::{AdvanceAction, FillOutcome, PageStatus, ScriptBundle};
use crate::workflow::attempt_ctx::AttemptCtx;

/// 翻页循环的最大轮数
pub const MAX_ADVANCE_STEPS: usize = 10;

/// 单次尝试的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// 提交成功
    Success,
    /// 设备已达填写上限（按成功计）
    QuotaExceeded,
    /// 未能完成提交
    Failed(String),
    /// 收到停止请求，未完成（按失败计）
    Cancelled,
}

/// 单次提交流程
///
/// - 编排一次尝试的完整步骤
/// - 决定何时填写、何时翻页、何时判定成功
/// - 不持有页面，由调用方传入
pub struct AttemptFlow {
    url: String,
    scripts: Arc<ScriptBundle>,
    delays: SettleDelays,
}

impl AttemptFlow {
    pub fn new(url: impl Into<String>, scripts: Arc<ScriptBundle>, delays: SettleDelays) -> Self {
        Self {
            url: url.into(),
            scripts,
            delays,
        }
    }

    /// 在给定页面上执行一次完整的填写提交
    ///
    /// 导航或脚本执行失败时返回错误，由调用方计为失败
    pub async fn run(
        &self,
        surface: &dyn PageSurface,
        ctx: &AttemptCtx,
        cancel: &CancellationToken,
    ) -> AppResult<AttemptOutcome> {
        debug!("{} 打开问卷页面", ctx);
        surface.navigate(&self.url).await?;
        sleep(self.delays.page_load).await;

        if self.check_status(surface).await? == PageStatus::QuotaExceeded {
            warn!("{} ⚠️ 检测到设备已达到最大填写次数", ctx);
            return Ok(AttemptOutcome::QuotaExceeded);
        }

        let filled = self.fill(surface).await?;
        debug!("{} ✓ 已填写 {} 道题目", ctx, filled);
        sleep(self.delays.fill).await;

        for step in 1..=MAX_ADVANCE_STEPS {
            if cancel.is_cancelled() {
                info!("{} 收到停止请求，放弃本次填写", ctx);
                return Ok(AttemptOutcome::Cancelled);
            }

            let action = AdvanceAction::from_tag(&surface.evaluate(&self.scripts.advance).await?);
            sleep(self.delays.advance).await;

            if self.check_status(surface).await? == PageStatus::Completed {
                return Ok(AttemptOutcome::Success);
            }

            match action {
                AdvanceAction::Submit => {
                    debug!("{} 📤 已点击提交", ctx);
                    sleep(self.delays.submit).await;
                    return Ok(match self.check_status(surface).await? {
                        PageStatus::Completed => AttemptOutcome::Success,
                        _ => AttemptOutcome::Failed("提交后未检测到完成页面".to_string()),
                    });
                }
                AdvanceAction::Next => {
                    debug!("{} ➡️ 第 {} 轮翻页，继续填写", ctx, step);
                    let raw = surface.evaluate(&self.scripts.fill).await?;
                    let outcome = FillOutcome::from_tag(&raw);
                    if !outcome.is_filled() {
                        warn!("{} ⚠️ 新页面填写异常: {:?}", ctx, outcome);
                    }
                    sleep(self.delays.fill).await;
                }
                AdvanceAction::NotFound => {
                    debug!("{} 第 {} 轮未找到翻页或提交按钮", ctx, step);
                }
            }
        }

        Ok(AttemptOutcome::Failed(format!(
            "{} 轮翻页后仍未完成",
            MAX_ADVANCE_STEPS
        )))
    }

    async fn check_status(&self, surface: &dyn PageSurface) -> AppResult<PageStatus> {
        let raw = surface.evaluate(&self.scripts.status_check).await?;
        Ok(PageStatus::from_tag(&raw))
    }

    async fn fill(&self, surface: &dyn PageSurface) -> AppResult<usize> {
        let raw = surface.evaluate(&self.scripts.fill).await?;
        match FillOutcome::from_tag(&raw) {
            FillOutcome::Filled(count) => Ok(count),
            FillOutcome::Error(message) => Err(AppError::Script(ScriptError::ErrorTag { message })),
            FillOutcome::Unrecognized(raw) => {
                Err(AppError::Script(ScriptError::UnexpectedResult { raw }))
            }
        }
    }
}
