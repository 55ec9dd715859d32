use std::path::Path;

use tokio::fs;
use tracing::info;

use crate::error::{AppError, AppResult, FileError};
use crate::models::survey::SurveyConfig;

/// 从 TOML 文件加载问卷配置
pub async fn load_survey_config(toml_file_path: &Path) -> AppResult<SurveyConfig> {
    let path = toml_file_path.display().to_string();
    if !toml_file_path.exists() {
        return Err(AppError::File(FileError::NotFound { path }));
    }

    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|e| AppError::file_read_failed(&path, e))?;

    let config: SurveyConfig = toml::from_str(&content).map_err(|e| {
        AppError::File(FileError::TomlParseFailed {
            path: path.clone(),
            source: Box::new(e),
        })
    })?;

    info!(
        "成功加载问卷配置: 目标 {} 份, {} 道题目",
        config.target_count,
        config.questions.len()
    );

    Ok(config)
}

/// 将问卷配置写回 TOML 文件（例如保存解析出的题目）
pub async fn save_survey_config(toml_file_path: &Path, config: &SurveyConfig) -> AppResult<()> {
    let path = toml_file_path.display().to_string();
    let content = toml::to_string_pretty(config).map_err(|e| AppError::File(FileError::WriteFailed {
        path: path.clone(),
        source: Box::new(e),
    }))?;

    fs::write(toml_file_path, content).await.map_err(|e| {
        AppError::File(FileError::WriteFailed {
            path: path.clone(),
            source: Box::new(e),
        })
    })?;

    info!("问卷配置已保存至: {}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::QuestionModel;

    #[tokio::test]
    async fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!(
            "survey_filler_loader_{}.toml",
            std::process::id()
        ));

        let mut config = SurveyConfig::new("https://www.wjx.cn/vm/abc.aspx", 5);
        config.interval_max = 2;
        config
            .questions
            .push(QuestionModel::single(1, 4).with_weights(vec![1.0, 1.0, 2.0, 0.0]));
        config
            .questions
            .push(QuestionModel::text(2, vec!["张三||13800000000".to_string()]));

        save_survey_config(&path, &config).await.unwrap();
        let loaded = load_survey_config(&path).await.unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_invalid_toml() {
        let path = std::env::temp_dir().join(format!(
            "survey_filler_invalid_{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "url = ").unwrap();

        let result = load_survey_config(&path).await;
        let _ = std::fs::remove_file(&path);

        assert!(matches!(
            result,
            Err(AppError::File(FileError::TomlParseFailed { .. }))
        ));
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join("survey_filler_definitely_missing.toml");
        let result = tokio_test::block_on(load_survey_config(&path));
        assert!(matches!(
            tokio_test::assert_err!(result),
            AppError::File(FileError::NotFound { .. })
        ));
    }
}
