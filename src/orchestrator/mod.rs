//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责运行生命周期和并发调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 加载问卷配置，题目为空时解析问卷页面
//! - 可选：AI 为填空题生成候选答案
//! - 按运行模式解析 / 预览 / 提交
//! - 管理浏览器资源，输出最终统计
//!
//! ### `submission` - 提交编排器
//! - 启动 / 停止 / 等待一次运行
//! - 控制并发数量，保证成功份数不超过目标
//! - 维护成功、失败计数和状态
//!
//! ### `observer` - 运行观察者
//! - 状态变更、进度、日志三个回调
//!
//! ## 层次关系
//!
//! ```text
//! app (加载配置 / 选择模式)
//!     ↓
//! submission (循环直到达到目标份数)
//!     ↓
//! workflow::AttemptFlow (处理一份问卷)
//!     ↓
//! services (能力层：compile / sample / parse)
//!     ↓
//! infrastructure (基础设施：PageSurface)
//! ```

pub mod app;
pub mod observer;
pub mod submission;

// 重新导出主要类型
pub use app::App;
pub use observer::{RunObserver, TracingObserver};
pub use submission::SubmissionOrchestrator;
