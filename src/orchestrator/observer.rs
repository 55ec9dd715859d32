//! 运行观察者
//!
//! 编排层只通过这三个回调向外报告状态、进度和日志

use tracing::{error, info, warn};

use crate::models::survey::{ExecutionResult, ExecutionStatus, LogLevel};
use crate::utils::logging::append_log_line;

/// 运行观察者，回调可能来自任意工作任务
pub trait RunObserver: Send + Sync {
    fn on_status_change(&self, _status: ExecutionStatus) {}

    fn on_progress(&self, _result: ExecutionResult) {}

    fn on_log(&self, _message: &str, _level: LogLevel) {}
}

/// 把事件写入 tracing，可选同时追加到日志文件
#[derive(Debug, Default, Clone)]
pub struct TracingObserver {
    log_file: Option<String>,
}

impl TracingObserver {
    pub fn with_log_file(path: impl Into<String>) -> Self {
        Self {
            log_file: Some(path.into()),
        }
    }
}

impl RunObserver for TracingObserver {
    fn on_status_change(&self, status: ExecutionStatus) {
        info!("🔄 状态变更: {}", status.display_name());
    }

    fn on_progress(&self, result: ExecutionResult) {
        info!(
            "📊 进度 {}% (成功 {} / 失败 {} / 目标 {})",
            result.progress(),
            result.success,
            result.failed,
            result.total
        );
    }

    fn on_log(&self, message: &str, level: LogLevel) {
        match level {
            LogLevel::Info => info!("{}", message),
            LogLevel::Success => info!("✅ {}", message),
            LogLevel::Warning => warn!("⚠️ {}", message),
            LogLevel::Error => error!("❌ {}", message),
        }

        if let Some(path) = &self.log_file {
            if let Err(e) = append_log_line(path, message, level) {
                warn!("写入日志文件失败: {}", e);
            }
        }
    }
}
