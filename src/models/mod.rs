pub mod loaders;
pub mod question;
pub mod question_list;
pub mod survey;

pub use loaders::{load_survey_config, save_survey_config};
pub use question::{AnswerFamily, DistributionMode, QuestionModel, QuestionType, ScaleWidget};
pub use question_list::QuestionList;
pub use survey::{ExecutionResult, ExecutionStatus, LogLevel, SurveyConfig, MAX_CONCURRENCY};
