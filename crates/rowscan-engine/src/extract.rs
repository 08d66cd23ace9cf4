//! Field extraction.
//!
//! A field definition extracts one named scalar from a text buffer: the
//! lambda chain runs first, then the range delimiters narrow the buffer (a
//! sequence is folded back into a single string before any delimiter
//! applies), then the pattern picks the value. Extraction never fails; a
//! buffer the field cannot match simply yields no value, and the caller
//! decides whether that matters.

use regex::Regex;

use rowscan_layout::{Buffer, FieldDef, apply_chain};

/// Result of applying one field definition to a buffer.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// The extracted value, stripped of surrounding whitespace.
    pub value: Option<String>,
    /// The buffer the next field should scan.
    ///
    /// With `pop_out`, the first occurrence of the extracted value is
    /// removed from the pre-lambda source; otherwise this is the
    /// post-lambda source unchanged.
    pub residual: String,
}

/// Applies a field definition to a source buffer.
pub fn extract_field(field: &FieldDef, source: &str) -> Extraction {
    let mut buffer = apply_chain(&field.lambdas, Buffer::Text(source.to_string()));
    let post_lambda = buffer.clone().fold();

    if field.has_range() {
        buffer = Buffer::Text(apply_ranges(field, buffer.fold()));
    }

    let value = match &buffer {
        Buffer::Lines(lines) => lines
            .iter()
            .find_map(|line| match_value(&field.format, line)),
        Buffer::Text(text) => match_value(&field.format, text),
    };
    let value = value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    let residual = match &value {
        Some(value) if field.pop_out => source.replacen(value.as_str(), "", 1),
        _ => post_lambda,
    };

    Extraction { value, residual }
}

/// Applies the range delimiters: end first, then start.
fn apply_ranges(field: &FieldDef, text: String) -> String {
    let mut text = text;
    if let Some(end) = field.token_end {
        text = text.chars().take(end + 1).collect();
    }
    if let Some(start) = field.token_start {
        text = text.chars().skip(start).collect();
    }
    if let Some(marker) = &field.ends_with
        && let Some(position) = text.find(marker.as_str())
    {
        text.truncate(position);
    }
    if let Some(marker) = &field.starts_with
        && let Some(position) = text.find(marker.as_str())
    {
        text = text[position + marker.len()..].to_string();
    }
    text
}

/// Applies a pattern to a string: with capture groups, the first non-empty
/// capture wins; without, the value runs from the match start to the end of
/// the input.
pub(crate) fn match_value(pattern: &Regex, text: &str) -> Option<String> {
    let captures = pattern.captures(text)?;
    if captures.len() > 1 {
        (1..captures.len()).find_map(|group| {
            captures
                .get(group)
                .map(|capture| capture.as_str())
                .filter(|capture| !capture.is_empty())
                .map(str::to_string)
        })
    } else {
        captures.get(0).map(|whole| text[whole.start()..].to_string())
    }
}

#[cfg(test)]
mod tests {
    use rowscan_layout::Layout;

    use super::*;

    /// Builds the resolved fields of a one-context layout.
    fn fields(yaml_fields: &str) -> Vec<FieldDef> {
        let yaml = format!("l:\n  - name: ctx\n    fields:\n{yaml_fields}");
        let layout = Layout::from_str(&yaml).unwrap();
        layout.contexts()[0].fields.clone()
    }

    #[test]
    fn test_extract_with_capture_group() {
        let field = &fields("      - name: rank\n        format: \"^\\\\s*(\\\\d+)\\\\)\"\n")[0];
        let out = extract_field(field, "  3) ROSSI MARIO  1:02.33");
        assert_eq!(out.value.as_deref(), Some("3"));
    }

    #[test]
    fn test_pop_out_removes_value_from_residual() {
        let field = &fields("      - name: timing\n        format: \"(\\\\d+:\\\\d{2}\\\\.\\\\d{2})\"\n")[0];
        let out = extract_field(field, "ROSSI 1:02.33 M45");
        assert_eq!(out.value.as_deref(), Some("1:02.33"));
        assert!(!out.residual.contains("1:02.33"));
        assert!(out.residual.contains("ROSSI"));
    }

    #[test]
    fn test_no_pop_out_returns_post_lambda_source() {
        let field = &fields(
            "      - name: timing\n        pop_out: false\n        lambda: strip\n        format: \"(\\\\d+\\\\.\\\\d+)\"\n",
        )[0];
        let out = extract_field(field, "  29.81  ");
        assert_eq!(out.value.as_deref(), Some("29.81"));
        assert_eq!(out.residual, "29.81");
    }

    #[test]
    fn test_no_match_yields_none_and_keeps_source() {
        let field = &fields("      - name: rank\n        format: \"^(\\\\d+)$\"\n")[0];
        let out = extract_field(field, "no digits here");
        assert!(out.value.is_none());
        assert_eq!(out.residual, "no digits here");
    }

    #[test]
    fn test_default_pattern_detects_column_header() {
        let field = &fields("      - name: Pos\n")[0];
        let out = extract_field(field, "  POS  ATLETA  TEMPO");
        assert_eq!(out.value.as_deref(), Some("POS"));
    }

    #[test]
    fn test_token_range_narrows_the_buffer() {
        let field = &fields(
            "      - name: swimmer\n        token_start: 4\n        token_end: 14\n        format: \"([A-Z ]+)\"\n",
        )[0];
        let out = extract_field(field, "  3)ROSSI MARIO 1:02.33");
        assert_eq!(out.value.as_deref(), Some("ROSSI MARIO"));
    }

    #[test]
    fn test_starts_with_and_ends_with_delimiters() {
        let field = &fields(
            "      - name: team\n        starts_with: \"- \"\n        ends_with: \" /\"\n        format: \"(.+)\"\n",
        )[0];
        let out = extract_field(field, "ROSSI - NUOTO CLUB / M45");
        assert_eq!(out.value.as_deref(), Some("NUOTO CLUB"));
    }

    #[test]
    fn test_split_lambda_matches_first_token() {
        let field = &fields(
            "      - name: rank\n        lambda: split\n        format: \"^(\\\\d+)$\"\n",
        )[0];
        let out = extract_field(field, "  7 ROSSI 29.81");
        assert_eq!(out.value.as_deref(), Some("7"));
    }

    #[test]
    fn test_no_capture_pattern_takes_match_start_to_end() {
        let field = &fields("      - name: tail\n        format: \"M45\"\n")[0];
        let out = extract_field(field, "ROSSI M45 NUOTO");
        assert_eq!(out.value.as_deref(), Some("M45 NUOTO"));
    }

    #[test]
    fn test_sequence_folds_before_ranges() {
        // split produces a sequence; token_end must see it re-joined.
        let field = &fields(
            "      - name: head\n        lambda: split\n        token_end: 2\n        format: \"(.+)\"\n",
        )[0];
        let out = extract_field(field, "abc def");
        assert_eq!(out.value.as_deref(), Some("abc"));
    }
}
