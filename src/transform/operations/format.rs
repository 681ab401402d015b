//! Format operation

use crate::domain::parse_date;
use crate::transform::rules::{CaseStyle, FormatParams};
use chrono::format::{Item, StrftimeItems};

/// Reject strftime patterns chrono cannot render
pub fn validate_date_format(pattern: &str) -> Result<(), String> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        Err(format!("invalid date_format '{pattern}'"))
    } else {
        Ok(())
    }
}

/// Result of formatting one string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatted {
    pub text: String,
    /// Set when `date_format` was requested but the text is not a date
    pub date_error: Option<String>,
}

/// Normalise a string: trim, collapse, case, then date layout
pub fn format_text(text: &str, params: &FormatParams) -> Formatted {
    let mut out = if params.trim {
        text.trim().to_string()
    } else {
        text.to_string()
    };

    if params.collapse_whitespace {
        out = collapse_whitespace(&out);
    }

    if let Some(case) = params.case {
        out = apply_case(&out, case);
    }

    let mut date_error = None;
    if let Some(pattern) = params.date_format.as_deref() {
        match parse_date(&out) {
            Some(parsed) => out = parsed.datetime.format(pattern).to_string(),
            None => date_error = Some("value is not a recognised date".to_string()),
        }
    }

    Formatted {
        text: out,
        date_error,
    }
}

/// Replace every whitespace run with one space, keeping edges as they are
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_run {
                out.push(' ');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

/// Apply a letter case style
pub fn apply_case(text: &str, case: CaseStyle) -> String {
    match case {
        CaseStyle::Upper => text.to_uppercase(),
        CaseStyle::Lower => text.to_lowercase(),
        CaseStyle::Title => text
            .split(' ')
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" "),
        CaseStyle::Sentence => capitalize(text),
    }
}

/// Classify the case style a string already has
pub fn detect_case(text: &str) -> Option<CaseStyle> {
    if !text.chars().any(char::is_alphabetic) {
        return None;
    }
    if text == text.to_uppercase() {
        Some(CaseStyle::Upper)
    } else if text == text.to_lowercase() {
        Some(CaseStyle::Lower)
    } else if text == apply_case(text, CaseStyle::Title) {
        Some(CaseStyle::Title)
    } else {
        None
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("hello world", CaseStyle::Upper, "HELLO WORLD" ; "upper")]
    #[test_case("Hello World", CaseStyle::Lower, "hello world" ; "lower")]
    #[test_case("hELLO wORLD", CaseStyle::Title, "Hello World" ; "title")]
    #[test_case("hELLO wORLD", CaseStyle::Sentence, "Hello world" ; "sentence")]
    fn test_apply_case(input: &str, case: CaseStyle, expected: &str) {
        assert_eq!(apply_case(input, case), expected);
    }

    #[test]
    fn test_format_text_pipeline() {
        let params = FormatParams {
            case: Some(CaseStyle::Title),
            trim: true,
            collapse_whitespace: true,
            date_format: None,
        };
        let formatted = format_text("  ada   LOVELACE ", &params);
        assert_eq!(formatted.text, "Ada Lovelace");
        assert!(formatted.date_error.is_none());
    }

    #[test]
    fn test_format_date() {
        let params = FormatParams {
            date_format: Some("%d/%m/%Y".to_string()),
            ..FormatParams::default()
        };
        assert_eq!(format_text("1990-04-12", &params).text, "12/04/1990");

        let bad = format_text("someday", &params);
        assert_eq!(bad.text, "someday");
        assert!(bad.date_error.is_some());
    }

    #[test]
    fn test_validate_date_format() {
        assert!(validate_date_format("%Y-%m-%d").is_ok());
        assert!(validate_date_format("%Q").is_err());
    }

    #[test_case("ABC", Some(CaseStyle::Upper) ; "upper")]
    #[test_case("abc def", Some(CaseStyle::Lower) ; "lower")]
    #[test_case("Abc Def", Some(CaseStyle::Title) ; "title")]
    #[test_case("aBc", None ; "mixed")]
    #[test_case("123", None ; "no letters")]
    fn test_detect_case(input: &str, expected: Option<CaseStyle>) {
        assert_eq!(detect_case(input), expected);
    }
}
