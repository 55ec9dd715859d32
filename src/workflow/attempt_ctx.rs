//! 尝试上下文
//!
//! 封装"这是第几次尝试、在哪个页面上进行"这一信息

use std::fmt::Display;

/// 单次提交尝试的上下文
#[derive(Debug, Clone, Copy)]
pub struct AttemptCtx {
    /// 全局尝试序号（从 1 开始，仅用于日志显示）
    pub attempt: usize,

    /// 页面槽位
    pub slot: usize,
}

impl AttemptCtx {
    pub fn new(attempt: usize, slot: usize) -> Self {
        Self { attempt, slot }
    }
}

impl Display for AttemptCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[尝试 {} 页面#{}]", self.attempt, self.slot)
    }
}
