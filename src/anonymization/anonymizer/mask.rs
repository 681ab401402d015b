//! Masking strategy

use crate::anonymization::rules::MaskParams;
use crate::domain::display_text;
use serde_json::Value;

/// Width of the masked run when the original length is not preserved
const FIXED_MASK_WIDTH: usize = 4;

/// Mask a non-null value; the result is always a string
pub fn mask_value(value: &Value, params: &MaskParams, preserve_format: bool) -> Option<Value> {
    let text = display_text(value)?;
    Some(Value::String(mask_text(&text, params, preserve_format)))
}

/// Mask text fully or partially
///
/// In partial mode an email keeps its `@domain` and only the local part is
/// masked, so `alice@example.com` becomes `a****@example.com`.
pub fn mask_text(text: &str, params: &MaskParams, preserve_format: bool) -> String {
    if text.is_empty() {
        return String::new();
    }

    if !params.partial {
        return mask_segment(text, 0, 0, params.mask_char, preserve_format);
    }

    match split_email(text) {
        Some((local, domain)) => format!(
            "{}{domain}",
            mask_segment(local, params.keep_start, 0, params.mask_char, preserve_format)
        ),
        None => mask_segment(
            text,
            params.keep_start,
            params.keep_end,
            params.mask_char,
            preserve_format,
        ),
    }
}

fn split_email(text: &str) -> Option<(&str, &str)> {
    let at = text.find('@')?;
    let domain = &text[at + 1..];
    if at == 0 || domain.contains('@') || !domain.contains('.') {
        return None;
    }
    Some((&text[..at], &text[at..]))
}

fn mask_segment(
    text: &str,
    keep_start: usize,
    keep_end: usize,
    mask_char: char,
    preserve_format: bool,
) -> String {
    let chars: Vec<char> = text.chars().collect();
    let (keep_start, keep_end) = if keep_start.saturating_add(keep_end) >= chars.len() {
        (0, 0)
    } else {
        (keep_start, keep_end)
    };

    let head: String = chars[..keep_start].iter().collect();
    let tail: String = chars[chars.len() - keep_end..].iter().collect();
    let middle = &chars[keep_start..chars.len() - keep_end];

    let masked: String = if preserve_format {
        middle
            .iter()
            .map(|c| if c.is_alphanumeric() { mask_char } else { *c })
            .collect()
    } else {
        std::iter::repeat(mask_char).take(FIXED_MASK_WIDTH).collect()
    };

    format!("{head}{masked}{tail}")
}
