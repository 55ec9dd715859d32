//! 问卷结构解析 - 业务能力层
//!
//! 从问卷页面 HTML 推断题目列表。解析是纯函数：
//! 找不到题目容器或一个题目都不认识时返回空列表，不视为错误；
//! 单个题目结构异常时跳过该题。

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

use crate::error::{AppResult, ParseError};
use crate::models::question::{
    AnswerFamily, QuestionModel, QuestionType, ScaleWidget, DEFAULT_TEXT_ANSWER, SLIDER_OPTION_COUNT,
};
use crate::services::document_fetcher::DocumentFetcher;

const CONTAINER: &str = "#divQuestion";
const BLOCK: &str = "div[topic]";
const TEXT_FIELDS: &str = "input[type='text'], textarea";
const CHOICE_OPTIONS: &str = ".ui-controlgroup > div";
const SCALE_OPTIONS: &str = ".scale-rating li, .ui-controlgroup li, .ui-controlgroup > div";
const RANKING_ITEMS: &str = "ul > li";
const STEM: &str = ".topichtml, .field-label";

const TITLE_SELECTORS: [&str; 7] = [
    "#divTitle h1",
    "#divTitle",
    ".surveytitle",
    ".survey-title",
    ".htitle",
    "#htitle",
    "title",
];

/// 一次解析的结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSurvey {
    pub title: Option<String>,
    pub questions: Vec<QuestionModel>,
}

/// 问卷结构解析器
pub struct SurveyParser;

impl SurveyParser {
    /// 解析题目列表
    pub fn parse(markup: &str) -> Vec<QuestionModel> {
        let document = Html::parse_document(markup);
        parse_questions(&document)
    }

    /// 解析题目列表和问卷标题
    pub fn parse_document(markup: &str) -> ParsedSurvey {
        let document = Html::parse_document(markup);
        ParsedSurvey {
            title: title_of(&document),
            questions: parse_questions(&document),
        }
    }

    /// 提取问卷标题，去掉末尾的 "- 问卷星" 后缀
    pub fn extract_title(markup: &str) -> Option<String> {
        title_of(&Html::parse_document(markup))
    }

    /// 拉取问卷页面并解析
    ///
    /// 只有页面获取失败时返回错误
    pub async fn fetch_and_parse(url: &str) -> AppResult<ParsedSurvey> {
        let fetcher = DocumentFetcher::new()?;
        let html = fetcher.fetch(url).await?;
        let parsed = Self::parse_document(&html);

        info!(
            "✓ 问卷解析完成: {}，共 {} 道题目",
            parsed.title.as_deref().unwrap_or("(无标题)"),
            parsed.questions.len()
        );
        Ok(parsed)
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn count(scope: ElementRef<'_>, css: &str) -> usize {
    let Some(sel) = selector(css) else {
        return 0;
    };
    let n = scope.select(&sel).count();
    n
}

fn first_in<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let sel = selector(css)?;
    let found = scope.select(&sel).next();
    found
}

fn first_in_document<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let sel = selector(css)?;
    let found = document.select(&sel).next();
    found
}

fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_of(document: &Html) -> Option<String> {
    let suffix = Regex::new(r"[-|]\s*问卷星.*$").ok()?;

    TITLE_SELECTORS.iter().find_map(|css| {
        let text = text_of(first_in_document(document, css)?);
        if text.is_empty() {
            return None;
        }
        Some(suffix.replace(&text, "").trim().to_string())
    })
}

fn parse_questions(document: &Html) -> Vec<QuestionModel> {
    let Some(container) = first_in_document(document, CONTAINER) else {
        debug!("未找到题目容器 {}", CONTAINER);
        return Vec::new();
    };
    let Some(block_selector) = selector(BLOCK) else {
        return Vec::new();
    };

    let questions = container
        .select(&block_selector)
        .filter_map(|block| match parse_block(block, document) {
            Ok(question) => question,
            Err(e) => {
                debug!("跳过题目: {}", e);
                None
            }
        })
        .collect();
    questions
}

fn ordinal_of(block: ElementRef<'_>) -> Result<usize, ParseError> {
    let raw = block
        .value()
        .attr("topic")
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or(ParseError::MissingOrdinal)?;

    raw.parse().map_err(|_| ParseError::InvalidOrdinal {
        raw: raw.to_string(),
    })
}

/// 解析单个题目块；无法识别且无法推断的题目返回 `Ok(None)`
fn parse_block(
    block: ElementRef<'_>,
    document: &Html,
) -> Result<Option<QuestionModel>, ParseError> {
    let ordinal = ordinal_of(block)?;
    let type_code = block.value().attr("type").unwrap_or_default().trim();

    let question = match AnswerFamily::from_type_code(type_code) {
        Some(AnswerFamily::Text) => Some(parse_text(block, ordinal)),
        Some(AnswerFamily::Single) => Some(QuestionModel::single(
            ordinal,
            count(block, CHOICE_OPTIONS).max(2),
        )),
        Some(AnswerFamily::Multiple) => Some(QuestionModel::multiple(
            ordinal,
            count(block, CHOICE_OPTIONS).max(2),
        )),
        Some(AnswerFamily::Scale) => Some(QuestionModel {
            option_count: count(block, SCALE_OPTIONS).max(2),
            ..QuestionModel::new(QuestionType::Scale, ordinal)
        }),
        Some(AnswerFamily::Matrix) => Some(parse_matrix(document, ordinal)),
        Some(AnswerFamily::Dropdown) => Some(parse_dropdown(block, document, ordinal)),
        Some(AnswerFamily::Slider) => Some(QuestionModel {
            option_count: SLIDER_OPTION_COUNT,
            widget: ScaleWidget::Slider,
            ..QuestionModel::new(QuestionType::Scale, ordinal)
        }),
        Some(AnswerFamily::Ranking) => Some(QuestionModel {
            option_count: count(block, RANKING_ITEMS).max(2),
            widget: ScaleWidget::Ranking,
            ..QuestionModel::new(QuestionType::Scale, ordinal)
        }),
        None => parse_unknown(block, ordinal, type_code)?,
    };

    Ok(question.map(|question| match stem_of(block) {
        Some(stem) => question.with_title(stem),
        None => question,
    }))
}

fn stem_of(block: ElementRef<'_>) -> Option<String> {
    let stem = text_of(first_in(block, STEM)?);
    (!stem.is_empty()).then_some(stem)
}

fn parse_text(block: ElementRef<'_>, ordinal: usize) -> QuestionModel {
    let has_map_hint = match selector("input[verify]") {
        Some(sel) => {
            let hinted = block.select(&sel).any(|input| {
                let verify = input.value().attr("verify").unwrap_or_default();
                verify.contains("地图") || verify.to_lowercase().contains("map")
            });
            hinted
        }
        None => false,
    };
    let is_location = first_in(block, ".get_Local").is_some() || has_map_hint;

    let question_type = if count(block, TEXT_FIELDS) > 1 {
        QuestionType::MultiText
    } else {
        QuestionType::Text
    };

    QuestionModel {
        is_location,
        ..QuestionModel::text(ordinal, vec![DEFAULT_TEXT_ANSWER.to_string()])
    }
    .with_type(question_type)
}

/// 矩阵题：行数取自 `#divRefTab{n}`，列数取自表头行 `#drv{n}_1` 减去标签列
fn parse_matrix(document: &Html, ordinal: usize) -> QuestionModel {
    let (rows, columns) = match first_in_document(document, &format!("#divRefTab{}", ordinal)) {
        Some(table) => {
            let rows = count(table, "tr[rowindex]");
            let columns = first_in_document(document, &format!("#drv{}_1", ordinal))
                .map_or(0, |header| count(header, "td").saturating_sub(1));
            (rows, columns)
        }
        None => (0, 0),
    };

    QuestionModel {
        option_count: columns.max(2),
        row_count: rows.max(1),
        ..QuestionModel::new(QuestionType::Matrix, ordinal)
    }
}

/// 下拉题：忽略 value 为空或 "0" 的占位选项
fn parse_dropdown(block: ElementRef<'_>, document: &Html, ordinal: usize) -> QuestionModel {
    let select = first_in(block, "select")
        .or_else(|| first_in_document(document, &format!("#q{}", ordinal)));

    let valid_options = match (select, selector("option")) {
        (Some(select), Some(option)) => {
            let n = select
                .select(&option)
                .filter(|option| {
                    let value = option.value().attr("value").unwrap_or_default().trim();
                    !value.is_empty() && value != "0"
                })
                .count();
            n
        }
        _ => 0,
    };

    QuestionModel {
        option_count: valid_options.max(2),
        ..QuestionModel::new(QuestionType::Dropdown, ordinal)
    }
}

/// 未知题型：有输入框按填空题，有选项按单选题，否则跳过
fn parse_unknown(
    block: ElementRef<'_>,
    ordinal: usize,
    type_code: &str,
) -> Result<Option<QuestionModel>, ParseError> {
    if count(block, TEXT_FIELDS) > 0 {
        return Ok(Some(QuestionModel::text(
            ordinal,
            vec![DEFAULT_TEXT_ANSWER.to_string()],
        )));
    }

    let options = count(block, CHOICE_OPTIONS);
    if options > 0 {
        return Ok(Some(QuestionModel::single(ordinal, options.max(2))));
    }

    debug!(
        "{}",
        ParseError::UnrecognizedBlock {
            ordinal,
            type_code: type_code.to_string(),
        }
    );
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SURVEY_HTML: &str = r#"
    <html>
    <head><title>大学生消费习惯调查 - 问卷星</title></head>
    <body>
      <div id="divTitle"><h1>大学生消费习惯调查</h1></div>
      <div id="divQuestion">
        <div topic="1" type="3">
          <div class="topichtml">你的性别</div>
          <div class="ui-controlgroup"><div>男</div><div>女</div></div>
        </div>
        <div topic="2" type="4">
          <div class="ui-controlgroup"><div>A</div><div>B</div><div>C</div></div>
        </div>
        <div topic="3" type="1">
          <div class="field-label">你的建议</div>
          <textarea></textarea>
        </div>
        <div topic="4" type="2">
          <input type="text" /><input type="text" verify="地图" />
        </div>
        <div topic="5" type="5">
          <ul class="scale-rating"><li>1</li><li>2</li><li>3</li><li>4</li><li>5</li></ul>
        </div>
        <div topic="6" type="6">
          <table id="divRefTab6">
            <tr id="drv6_1"><td>标签</td><td>a</td><td>b</td><td>c</td></tr>
            <tr rowindex="0"><td>行1</td></tr>
            <tr rowindex="1"><td>行2</td></tr>
          </table>
        </div>
        <div topic="7" type="7">
          <select>
            <option value="">请选择</option>
            <option value="0">--</option>
            <option value="1">北京</option>
            <option value="2">上海</option>
            <option value="3">广州</option>
          </select>
        </div>
        <div topic="8" type="8"><input type="hidden" /></div>
        <div topic="9" type="11"><ul><li>x</li><li>y</li><li>z</li></ul></div>
      </div>
    </body>
    </html>
    "#;

    #[test]
    fn test_parse_every_type() {
        let questions = SurveyParser::parse(SURVEY_HTML);
        assert_eq!(questions.len(), 9);

        let ordinals: Vec<usize> = questions.iter().map(|q| q.ordinal).collect();
        assert_eq!(ordinals, (1..=9).collect::<Vec<_>>());

        assert_eq!(questions[0].question_type, QuestionType::SingleChoice);
        assert_eq!(questions[0].option_count, 2);
        assert_eq!(questions[0].title.as_deref(), Some("你的性别"));

        assert_eq!(questions[1].question_type, QuestionType::MultipleChoice);
        assert_eq!(questions[1].per_option_probabilities, Some(vec![50.0; 3]));

        assert_eq!(questions[2].question_type, QuestionType::Text);
        assert_eq!(questions[2].title.as_deref(), Some("你的建议"));
        assert!(!questions[2].is_location);

        assert_eq!(questions[3].question_type, QuestionType::MultiText);
        assert!(questions[3].is_location);

        assert_eq!(questions[4].question_type, QuestionType::Scale);
        assert_eq!(questions[4].option_count, 5);

        assert_eq!(questions[5].question_type, QuestionType::Matrix);
        assert_eq!(questions[5].row_count, 2);
        assert_eq!(questions[5].option_count, 3);

        assert_eq!(questions[6].question_type, QuestionType::Dropdown);
        assert_eq!(questions[6].option_count, 3);

        assert_eq!(questions[7].family(), AnswerFamily::Slider);
        assert_eq!(questions[7].option_count, 100);

        assert_eq!(questions[8].family(), AnswerFamily::Ranking);
        assert_eq!(questions[8].option_count, 3);

        assert!(questions.iter().all(|q| q.validate().is_ok()));
    }

    #[test]
    fn test_empty_documents() {
        assert!(SurveyParser::parse("").is_empty());
        assert!(SurveyParser::parse("<html><body><p>hi</p></body></html>").is_empty());
        assert!(SurveyParser::parse(r#"<div id="divQuestion"></div>"#).is_empty());
    }

    #[test]
    fn test_clamps_and_fallbacks() {
        let html = r#"
        <div id="divQuestion">
          <div topic="1" type="3"><div class="ui-controlgroup"><div>only</div></div></div>
          <div topic="2" type="6"></div>
          <div topic="3" type="7"><select><option value="">请选择</option></select></div>
          <div topic="4" type="99"><input type="text" /></div>
          <div topic="5" type="99"><div class="ui-controlgroup"><div>a</div><div>b</div><div>c</div></div></div>
          <div topic="6" type="99"><span>说明文字</span></div>
          <div topic="" type="3"></div>
          <div topic="x" type="3"></div>
        </div>
        "#;

        let questions = SurveyParser::parse(html);
        assert_eq!(questions.len(), 5);

        assert_eq!(questions[0].option_count, 2);
        assert_eq!(questions[1].row_count, 1);
        assert_eq!(questions[1].option_count, 2);
        assert_eq!(questions[2].option_count, 2);

        assert_eq!(questions[3].question_type, QuestionType::Text);
        assert_eq!(questions[3].text_candidates, vec!["无".to_string()]);

        assert_eq!(questions[4].question_type, QuestionType::SingleChoice);
        assert_eq!(questions[4].option_count, 3);
    }

    #[test]
    fn test_dropdown_resolved_by_ordinal() {
        let html = r#"
        <div id="divQuestion"><div topic="3" type="7"></div></div>
        <select id="q3">
          <option value="0">请选择</option>
          <option value="1">a</option><option value="2">b</option>
          <option value="3">c</option><option value="4">d</option>
        </select>
        "#;
        let questions = SurveyParser::parse(html);
        assert_eq!(questions[0].option_count, 4);
    }

    #[test]
    fn test_extract_title() {
        assert_eq!(
            SurveyParser::extract_title(SURVEY_HTML).as_deref(),
            Some("大学生消费习惯调查")
        );
        assert_eq!(
            SurveyParser::extract_title("<title>满意度调查 | 问卷星 在线</title>").as_deref(),
            Some("满意度调查")
        );
        assert_eq!(SurveyParser::extract_title("<p></p>"), None);

        let parsed = SurveyParser::parse_document(SURVEY_HTML);
        assert_eq!(parsed.title.as_deref(), Some("大学生消费习惯调查"));
        assert_eq!(parsed.questions.len(), 9);
    }
}
