use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::browser::{connect_to_browser_and_page, launch_browser};
use crate::config::{Config, RunMode};
use crate::infrastructure::{ChromiumSurfaceProvider, SurfaceProvider};
use crate::models::{load_survey_config, save_survey_config, SurveyConfig};
use crate::orchestrator::observer::TracingObserver;
use crate::orchestrator::submission::SubmissionOrchestrator;
use crate::services::sampling::preview_answers;
use crate::services::{AnswerGenerator, SurveyParser};
use crate::utils::logging::{init_log_file, log_questions, log_startup, print_final_stats};

/// 应用主结构
pub struct App {
    config: Config,
    survey: SurveyConfig,
    /// 配置中的题目是否来自本次解析
    parsed: bool,
}

impl App {
    /// 初始化应用：加载问卷配置，必要时解析页面并生成填空答案
    pub async fn initialize(config: Config) -> Result<Self> {
        init_log_file(&config.output_log_file)?;

        info!("📁 正在加载问卷配置: {}", config.survey_file);
        let mut survey = load_survey_config(Path::new(&config.survey_file)).await?;

        let parsed = survey.questions.is_empty() || config.mode == RunMode::Parse;
        if parsed {
            info!("🔍 正在解析问卷结构: {}", survey.url);
            let parsed_survey = SurveyParser::fetch_and_parse(&survey.url).await?;
            if let Some(title) = &parsed_survey.title {
                info!("📋 问卷标题: {}", title);
            }
            if parsed_survey.questions.is_empty() {
                warn!("⚠️ 未解析到任何题目");
            }
            survey.questions = parsed_survey.questions.into();
        }

        if config.ai_enabled {
            let generator = AnswerGenerator::new(&config);
            let augmented = generator.augment(survey.questions.as_mut_slice()).await;
            info!("🤖 AI 已为 {} 道填空题生成答案", augmented);
        }

        survey.validate()?;

        Ok(Self {
            config,
            survey,
            parsed,
        })
    }

    /// 按运行模式执行
    pub async fn run(&self) -> Result<()> {
        match self.config.mode {
            RunMode::Parse => self.write_parsed().await,
            RunMode::Preview => self.print_preview(),
            RunMode::Run => self.submit().await,
        }
    }

    async fn write_parsed(&self) -> Result<()> {
        log_questions(&self.survey);
        save_survey_config(Path::new(&self.config.survey_file), &self.survey).await?;
        info!(
            "💾 已写入 {} 道题目到 {}",
            self.survey.questions.len(),
            self.config.survey_file
        );
        println!("{}", toml::to_string_pretty(&self.survey)?);
        Ok(())
    }

    fn print_preview(&self) -> Result<()> {
        let preview = preview_answers(&mut rand::thread_rng(), self.survey.questions.as_slice());
        println!("{}", serde_json::to_string_pretty(&preview)?);
        Ok(())
    }

    async fn submit(&self) -> Result<()> {
        log_startup(&self.survey);
        log_questions(&self.survey);

        if self.parsed {
            save_survey_config(Path::new(&self.config.survey_file), &self.survey).await?;
        }

        let provider = self.open_browser().await?;
        let observer = Arc::new(TracingObserver::with_log_file(
            self.config.output_log_file.clone(),
        ));
        let orchestrator = Arc::new(SubmissionOrchestrator::new(
            self.survey.clone(),
            provider,
            observer,
            self.config.settle_delays(),
        )?);

        let stopper = orchestrator.clone();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("⏹️ 收到中断信号，等待当前尝试结束...");
                stopper.stop();
            }
        });

        let result = orchestrator.run().await;
        interrupt.abort();

        print_final_stats(&result?, &self.config.output_log_file);
        Ok(())
    }

    /// 优先连接已打开的浏览器，失败时自动启动
    async fn open_browser(&self) -> Result<Arc<dyn SurfaceProvider>> {
        match connect_to_browser_and_page(self.config.browser_debug_port, Some(&self.survey.url))
            .await
        {
            Ok((browser, page)) => Ok(Arc::new(ChromiumSurfaceProvider::with_initial_page(
                browser, page,
            ))),
            Err(e) => {
                warn!("⚠️ 无法连接已打开的浏览器: {}，改为自动启动", e);
                let browser = launch_browser(
                    self.config.headless,
                    self.config.chrome_executable.as_deref(),
                )
                .await?;
                Ok(Arc::new(ChromiumSurfaceProvider::new(browser)))
            }
        }
    }
}
