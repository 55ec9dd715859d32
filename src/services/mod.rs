pub mod answer_compiler;
pub mod answer_generator;
pub mod document_fetcher;
pub mod sampling;
mod script_templates;
pub mod survey_parser;

pub use answer_compiler::{
    AdvanceAction, AnswerScriptCompiler, AnswerTables, FamilyKey, FillOutcome, PageStatus,
    ScriptBundle,
};
pub use answer_generator::AnswerGenerator;
pub use document_fetcher::DocumentFetcher;
pub use survey_parser::{ParsedSurvey, SurveyParser};
