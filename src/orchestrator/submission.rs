//! 提交编排器 - 编排层
//!
//! ## 职责
//!
//! 反复执行"打开 → 填写 → 翻页/提交"，直到已计数的尝试（成功 + 失败）达到目标份数，
//! 或收到停止请求。
//!
//! ## 并发模型
//!
//! - 按 `concurrency` 启动若干工作任务，每个任务独占一个页面
//! - 成功/失败计数是共享的原子变量，观察者可随时读取
//! - 开始一次尝试前先从共享的名额计数中预留一份，名额用完后工作任务退出，
//!   因此 `success + failed` 不会超过目标，进度不会超过 100%
//! - 停止是协作式的：只在尝试之间和翻页循环内检查取消令牌，
//!   正在进行的导航或脚本执行不会被打断；被停止打断的尝试按失败计

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::{JoinHandle, JoinSet};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::config::SettleDelays;
use crate::error::{AppError, AppResult, BusinessError};
use crate::infrastructure::SurfaceProvider;
use crate::models::survey::{ExecutionResult, ExecutionStatus, LogLevel, SurveyConfig};
use crate::orchestrator::observer::RunObserver;
use crate::services::sampling::draw_interval;
use crate::services::AnswerScriptCompiler;
use crate::workflow::{AttemptCtx, AttemptFlow, AttemptOutcome};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// 各工作任务共享的运行状态
struct Shared {
    status: Mutex<ExecutionStatus>,
    success: AtomicUsize,
    failed: AtomicUsize,
    /// 已计数 + 进行中的尝试数，不超过 total
    reserved: AtomicUsize,
    attempts: AtomicUsize,
    failure_cap_hit: AtomicBool,
    total: usize,
}

impl Shared {
    fn new(total: usize) -> Self {
        Self {
            status: Mutex::new(ExecutionStatus::Idle),
            success: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            reserved: AtomicUsize::new(0),
            attempts: AtomicUsize::new(0),
            failure_cap_hit: AtomicBool::new(false),
            total,
        }
    }

    fn reset(&self) {
        self.success.store(0, Ordering::SeqCst);
        self.failed.store(0, Ordering::SeqCst);
        self.reserved.store(0, Ordering::SeqCst);
        self.attempts.store(0, Ordering::SeqCst);
        self.failure_cap_hit.store(false, Ordering::SeqCst);
    }

    fn snapshot(&self) -> ExecutionResult {
        ExecutionResult::new(
            self.success.load(Ordering::SeqCst),
            self.failed.load(Ordering::SeqCst),
            self.total,
        )
    }

    /// 已计数的尝试是否用完了目标份数
    fn attempts_exhausted(&self) -> bool {
        self.success.load(Ordering::SeqCst) + self.failed.load(Ordering::SeqCst) >= self.total
    }

    fn status(&self) -> ExecutionStatus {
        *lock(&self.status)
    }

    /// 设置状态，返回是否发生变化
    fn replace_status(&self, status: ExecutionStatus) -> bool {
        let mut current = lock(&self.status);
        let changed = *current != status;
        *current = status;
        changed
    }
}

/// 提交编排器
///
/// 持有编译好的脚本和页面提供者，管理一次运行的生命周期
pub struct SubmissionOrchestrator {
    config: Arc<SurveyConfig>,
    flow: Arc<AttemptFlow>,
    provider: Arc<dyn SurfaceProvider>,
    observer: Arc<dyn RunObserver>,
    shared: Arc<Shared>,
    token: Mutex<CancellationToken>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SubmissionOrchestrator {
    /// 校验配置并编译作答脚本
    pub fn new(
        config: SurveyConfig,
        provider: Arc<dyn SurfaceProvider>,
        observer: Arc<dyn RunObserver>,
        delays: SettleDelays,
    ) -> AppResult<Self> {
        config.validate()?;

        let scripts = Arc::new(AnswerScriptCompiler::compile(config.questions.as_slice())?);
        let flow = Arc::new(AttemptFlow::new(config.url.clone(), scripts, delays));
        let shared = Arc::new(Shared::new(config.target_count));

        Ok(Self {
            config: Arc::new(config),
            flow,
            provider,
            observer,
            shared,
            token: Mutex::new(CancellationToken::new()),
            handle: Mutex::new(None),
        })
    }

    /// 开始运行（Idle / Stopped / Completed → Running），计数清零
    pub fn start(&self) -> AppResult<()> {
        {
            let mut status = lock(&self.shared.status);
            if *status == ExecutionStatus::Running {
                self.observer.on_log("任务已在运行中", LogLevel::Warning);
                return Err(AppError::Business(BusinessError::AlreadyRunning));
            }
            *status = ExecutionStatus::Running;
        }

        // 上一次运行停止后可能仍有尝试未结束
        if let Some(previous) = lock(&self.handle).take() {
            previous.abort();
        }

        self.shared.reset();
        let token = CancellationToken::new();
        *lock(&self.token) = token.clone();

        self.observer.on_status_change(ExecutionStatus::Running);
        self.observer.on_log(
            &format!("开始执行任务，目标: {}份", self.config.target_count),
            LogLevel::Info,
        );

        let run = Arc::new(RunLoop {
            config: self.config.clone(),
            flow: self.flow.clone(),
            provider: self.provider.clone(),
            observer: self.observer.clone(),
            shared: self.shared.clone(),
            token,
        });
        *lock(&self.handle) = Some(tokio::spawn(run.execute()));

        Ok(())
    }

    /// 请求停止（Running → Stopped），在下一个检查点生效
    pub fn stop(&self) {
        let was_running = {
            let mut status = lock(&self.shared.status);
            if *status == ExecutionStatus::Running {
                *status = ExecutionStatus::Stopped;
                true
            } else {
                false
            }
        };

        if was_running {
            lock(&self.token).cancel();
            self.observer.on_status_change(ExecutionStatus::Stopped);
            self.observer.on_log("任务已停止", LogLevel::Warning);
        }
    }

    /// 强制结束，不等待进行中的尝试
    pub fn release(&self) {
        lock(&self.token).cancel();
        if let Some(handle) = lock(&self.handle).take() {
            handle.abort();
        }
        if self.shared.status() == ExecutionStatus::Running
            && self.shared.replace_status(ExecutionStatus::Stopped)
        {
            self.observer.on_status_change(ExecutionStatus::Stopped);
        }
    }

    /// 等待本次运行结束
    pub async fn wait(&self) -> ExecutionResult {
        let handle = lock(&self.handle).take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    error!("运行任务异常退出: {}", e);
                }
            }
        }
        self.result()
    }

    /// 开始并等待结束
    pub async fn run(&self) -> AppResult<ExecutionResult> {
        self.start()?;
        Ok(self.wait().await)
    }

    pub fn status(&self) -> ExecutionStatus {
        self.shared.status()
    }

    pub fn result(&self) -> ExecutionResult {
        self.shared.snapshot()
    }
}

impl Drop for SubmissionOrchestrator {
    fn drop(&mut self) {
        self.release();
    }
}

/// 一次运行的上下文，由所有工作任务共享
struct RunLoop {
    config: Arc<SurveyConfig>,
    flow: Arc<AttemptFlow>,
    provider: Arc<dyn SurfaceProvider>,
    observer: Arc<dyn RunObserver>,
    shared: Arc<Shared>,
    token: CancellationToken,
}

impl RunLoop {
    async fn execute(self: Arc<Self>) {
        let mut workers = JoinSet::new();
        for slot in 0..self.config.concurrency.max(1) {
            let run = self.clone();
            workers.spawn(async move { run.worker(slot).await });
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                // 该任务预留的名额不会再被计数，其余任务在下一个检查点停下
                error!("工作任务异常退出: {}", e);
                self.observer
                    .on_log(&format!("工作任务异常退出: {}", e), LogLevel::Error);
                self.token.cancel();
            }
        }

        self.finish();
    }

    async fn worker(&self, slot: usize) {
        debug!("工作任务 {} 启动", slot);

        while self.reserve_slot() {
            let attempt = self.shared.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            let ctx = AttemptCtx::new(attempt, slot);

            let outcome = match self.provider.acquire(slot).await {
                Ok(surface) => self.flow.run(surface.as_ref(), &ctx, &self.token).await,
                Err(e) => Err(e),
            };

            self.record(&ctx, outcome);
            self.observer.on_progress(self.shared.snapshot());

            if self.shared.attempts_exhausted() {
                break;
            }

            tokio::task::yield_now().await;
            self.wait_interval().await;
        }

        debug!("工作任务 {} 结束", slot);
    }

    /// 预留一份目标名额；名额用完或已取消时返回 false
    fn reserve_slot(&self) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        let total = self.shared.total;
        self.shared
            .reserved
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                (current < total).then_some(current + 1)
            })
            .is_ok()
    }

    /// 统计一次尝试的结果
    fn record(&self, ctx: &AttemptCtx, outcome: AppResult<AttemptOutcome>) {
        match outcome {
            Ok(AttemptOutcome::Success) => self.count_success(ctx, ""),
            Ok(AttemptOutcome::QuotaExceeded) => {
                self.count_success(ctx, "（设备已达到最大填写次数）")
            }
            Ok(AttemptOutcome::Failed(reason)) => self.count_failure(ctx, &reason),
            Ok(AttemptOutcome::Cancelled) => self.count_failure(ctx, "收到停止请求，本次未完成"),
            Err(e) => {
                let reason = if e.is_attempt_error() {
                    format!("执行出错: {}", e)
                } else {
                    format!("无法获取页面: {}", e)
                };
                self.count_failure(ctx, &reason);
            }
        }
    }

    fn count_success(&self, ctx: &AttemptCtx, note: &str) {
        let count = self.shared.success.fetch_add(1, Ordering::SeqCst) + 1;
        self.observer.on_log(
            &format!(
                "{} [成功] 已完成 {}/{} 份{}",
                ctx, count, self.shared.total, note
            ),
            LogLevel::Success,
        );
    }

    fn count_failure(&self, ctx: &AttemptCtx, reason: &str) {
        let count = self.shared.failed.fetch_add(1, Ordering::SeqCst) + 1;
        self.observer.on_log(
            &format!("{} [失败] 失败 {} 次: {}", ctx, count, reason),
            LogLevel::Error,
        );

        if let Some(cap) = self.config.max_failures {
            if count >= cap && !self.shared.failure_cap_hit.swap(true, Ordering::SeqCst) {
                self.observer.on_log(
                    &format!("失败次数达到上限 {}，停止任务", cap),
                    LogLevel::Error,
                );
                self.token.cancel();
            }
        }
    }

    fn next_interval(&self) -> Option<Duration> {
        draw_interval(&mut rand::thread_rng(), &self.config)
    }

    /// 两次尝试之间的随机等待，可被停止打断
    async fn wait_interval(&self) {
        if self.token.is_cancelled() || self.shared.attempts_exhausted() {
            return;
        }
        let Some(wait) = self.next_interval() else {
            return;
        };

        self.observer.on_log(
            &format!("等待 {} 秒后继续...", wait.as_secs()),
            LogLevel::Info,
        );
        tokio::select! {
            _ = sleep(wait) => {}
            _ = self.token.cancelled() => {}
        }
    }

    /// 运行结束：收到停止请求（含失败上限、任务异常）为 Stopped，否则为 Completed
    fn finish(&self) {
        let result = self.shared.snapshot();
        let final_status = if self.token.is_cancelled() {
            ExecutionStatus::Stopped
        } else {
            ExecutionStatus::Completed
        };

        if self.shared.replace_status(final_status) {
            self.observer.on_status_change(final_status);
        }

        if final_status == ExecutionStatus::Completed {
            self.observer.on_log(
                &format!(
                    "任务完成！成功: {}, 失败: {}",
                    result.success, result.failed
                ),
                LogLevel::Success,
            );
        }
    }
}
