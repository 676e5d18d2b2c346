//! Text and JSON output for fast (non-interactive) mode
//!
//! Question and answer bodies arrive as HTML and are converted to wrapped
//! plain text for the terminal.

use chrono::DateTime;
use serde_json::Value;

use crate::search::{Answer, Question, SearchResult};

/// Width used when the terminal size is unknown (pipes, CI)
pub const DEFAULT_WIDTH: usize = 80;

/// Printed when a search matched questions but none had an accepted answer
pub const NO_RESULTS_MESSAGE: &str = "No questions with an accepted answer were found.";

/// Current terminal width in columns
pub fn terminal_width() -> usize {
    crossterm::terminal::size()
        .ok()
        .map(|(columns, _)| columns as usize)
        .filter(|columns| *columns > 0)
        .unwrap_or(DEFAULT_WIDTH)
}

/// Formats epoch seconds as a UTC calendar date (`YYYY-MM-DD`)
pub fn format_date(epoch: i64) -> String {
    DateTime::from_timestamp(epoch, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| epoch.to_string())
}

/// Converts an HTML body to plain text wrapped at `width`
///
/// Falls back to the raw HTML if it cannot be converted.
pub fn html_to_text(html: &str, width: usize) -> String {
    match html2text::from_read(html.as_bytes(), width) {
        Ok(text) => text.trim_end().to_string(),
        Err(e) => {
            tracing::debug!(error = %e, "html conversion failed; showing raw body");
            html.to_string()
        }
    }
}

pub fn format_question(question: &Question, width: usize) -> String {
    format!(
        "Question | {} | {} votes\n\n{}\n\n{}",
        format_date(question.creation_date),
        question.score,
        question.title,
        html_to_text(&question.body, width)
    )
}

pub fn format_answer(answer: &Answer, width: usize) -> String {
    format!(
        "Answer | {} | {} votes\n\n{}",
        format_date(answer.creation_date),
        answer.score,
        html_to_text(&answer.body, width)
    )
}

/// Full text rendering of one result, framed by horizontal rules
pub fn format_result(result: &SearchResult, width: usize) -> String {
    let rule = "-".repeat(width);
    format!(
        "{rule}\n{}\n{rule}\n{}\n{rule}\nQuestion link: {}\n",
        format_question(&result.question, width),
        format_answer(&result.answer, width),
        result.question.link,
    )
}

/// Pretty JSON list of results, in the same shape that is cached
pub fn format_json(results: &[SearchResult]) -> Result<String, serde_json::Error> {
    let list = Value::Array(results.iter().map(SearchResult::to_json).collect());
    serde_json::to_string_pretty(&list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::fixtures;

    #[test]
    fn test_format_date_is_utc() {
        assert_eq!(format_date(1_235_349_008), "2009-02-23");
        assert_eq!(format_date(0), "1970-01-01");
    }

    #[test]
    fn test_html_to_text_strips_tags() {
        let text = html_to_text("<p>Use <code>Vec::new()</code> here</p>", 80);
        assert!(text.contains("Vec::new()"));
        assert!(!text.contains("<p>"));
    }

    #[test]
    fn test_format_result_sections() {
        let result = fixtures::result(12);

        let text = format_result(&result, 40);

        assert!(text.starts_with(&"-".repeat(40)));
        assert!(text.contains("Question | 2010-07-26 | 10 votes"));
        assert!(text.contains("Question 12"));
        assert!(text.contains("Question body 12"));
        assert!(text.contains("Answer | 2010-07-26 | 5 votes"));
        assert!(text.contains("Answer body 12"));
        assert!(text.ends_with("Question link: https://stackoverflow.com/questions/12\n"));
    }

    #[test]
    fn test_negative_score_is_shown() {
        let mut question = fixtures::question(1, Some(1));
        question.score = -3;
        assert!(format_question(&question, 80).contains("| -3 votes"));
    }

    #[test]
    fn test_format_json_is_list_of_results() {
        let results = vec![fixtures::result(1), fixtures::result(2)];

        let json = format_json(&results).unwrap();
        let parsed: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.as_array().map(Vec::len), Some(2));
        assert_eq!(parsed[1]["question"]["question_id"], 2);
        assert!(json.contains('\n'), "output should be pretty printed");
    }

    #[test]
    fn test_format_json_empty() {
        assert_eq!(format_json(&[]).unwrap(), "[]");
    }
}
