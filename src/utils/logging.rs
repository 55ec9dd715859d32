/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::fs::{self, OpenOptions};
use std::io::Write;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::survey::{ExecutionResult, LogLevel, SurveyConfig};

/// 初始化 tracing 输出
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("survey_filler={}", default_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n问卷填写日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 向日志文件追加一行
pub fn append_log_line(log_file_path: &str, message: &str, level: LogLevel) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;
    writeln!(
        file,
        "[{}] [{}] {}",
        chrono::Local::now().format("%H:%M:%S"),
        level.display_name(),
        message
    )?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(survey: &SurveyConfig) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 问卷自动填写");
    info!("🔗 问卷链接: {}", survey.url);
    info!(
        "🎯 目标份数: {} | 📊 并发数: {}",
        survey.target_count, survey.concurrency
    );
    if survey.has_interval() {
        info!(
            "⏱️ 提交间隔: {}-{} 秒",
            survey.interval_min, survey.interval_max
        );
    }
    info!("{}", "=".repeat(60));
}

/// 输出题目配置列表
pub fn log_questions(survey: &SurveyConfig) {
    info!("📋 共 {} 道题目:", survey.questions.len());
    for question in &survey.questions {
        info!(
            "  第 {} 题 [{}] {}",
            question.ordinal,
            question.question_type.display_name(),
            question.summary()
        );
    }
}

/// 打印最终统计信息
pub fn print_final_stats(result: &ExecutionResult, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", result.success, result.total);
    info!("❌ 失败: {}", result.failed);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("您对食堂的建议是？", 4), "您对食堂...");
        assert_eq!(truncate_text("短", 4), "短");
    }

    #[test]
    fn test_log_file_lines() {
        let path = std::env::temp_dir().join(format!("survey_filler_log_{}.txt", std::process::id()));
        let path = path.to_string_lossy().to_string();

        init_log_file(&path).unwrap();
        append_log_line(&path, "第 1 份提交成功", LogLevel::Success).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("问卷填写日志"));
        assert!(content.contains("[成功] 第 1 份提交成功"));

        let _ = std::fs::remove_file(&path);
    }
}
