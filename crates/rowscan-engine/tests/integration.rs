//! End-to-end scans: documents, layouts, and the merged tree.

use std::time::Duration;

use rowscan_engine::{Document, FormatParser, ParseError, ScanOptions};
use rowscan_layout::{Layout, LayoutStore};

/// A meeting layout: one header, repeatable events, repeatable results.
const MEETING_LAYOUT: &str = r#"
fin.meeting:
  - name: header
    at_fixed_row: 0
    fields:
      - name: title
        format: "^(.+?) - "
      - name: date
        format: "(\\d{4}-\\d{2}-\\d{2})"
  - name: event
    parent: header
    repeat: true
    required: false
    format: "^Event\\s+(\\d+)"
  - name: result
    parent: event
    repeat: true
    required: false
    fields:
      - name: swimmer
        format: "^([A-Z]+)"
      - name: timing
        format: "(\\d+\\.\\d{2})"
"#;

fn parser_for(descriptions: &[&str]) -> FormatParser {
    let layouts = descriptions
        .iter()
        .map(|text| Layout::from_str(text).unwrap())
        .collect();
    FormatParser::new(LayoutStore::from_layouts(layouts))
}

#[test]
fn test_two_pages_merge_into_one_header() {
    let parser = parser_for(&[MEETING_LAYOUT]);
    let document = Document::parse(
        "Winter Meeting - 2024-01-06\n\
         Event 12\n\
         ROSSI 31.22\n\
         BIANCHI 32.01\n\
         \u{000C}\
         Winter Meeting - 2024-01-06\n\
         Event 13\n\
         VERDI 30.11\n",
    );

    let outcome = parser.scan(&document).unwrap();
    assert_eq!(outcome.report.result_format.as_deref(), Some("fin.meeting"));
    assert_eq!(outcome.report.checks[0].valid_at, vec![0, 1]);

    // Exactly one header child, holding the union of both pages' events.
    assert_eq!(outcome.root.rows.len(), 1);
    let header = &outcome.root.rows[0];
    assert_eq!(header.field("title"), Some("Winter Meeting"));
    assert_eq!(header.field("date"), Some("2024-01-06"));

    let events: Vec<&str> = header.rows.iter().map(|row| row.key.as_str()).collect();
    assert_eq!(events, vec!["12", "13"]);

    let swimmers: Vec<&str> = header.rows[0]
        .rows
        .iter()
        .map(|row| row.field("swimmer").unwrap())
        .collect();
    assert_eq!(swimmers, vec!["ROSSI", "BIANCHI"]);
    assert_eq!(header.rows[1].rows[0].field("swimmer"), Some("VERDI"));
}

#[test]
fn test_forward_parent_reference_resolves_at_match_time() {
    let layout = r#"
rel.teams:
  - name: rel_team
    parent: rel_category
    repeat: true
    required: false
    format: "^Team:\\s+(.+)$"
  - name: rel_category
    repeat: true
    format: "^Category:\\s+(.+)$"
"#;
    let parser = parser_for(&[layout]);
    let document = Document::parse("Category: M45\nTeam: NUOTO CLUB\n");

    let outcome = parser.scan(&document).unwrap();
    assert_eq!(outcome.report.result_format.as_deref(), Some("rel.teams"));
    let category = &outcome.root.rows[0];
    assert_eq!(category.name, "rel_category");
    assert_eq!(category.key, "M45");
    // The team landed as a row of the latest valid category.
    assert_eq!(category.rows[0].name, "rel_team");
    assert_eq!(category.rows[0].key, "NUOTO CLUB");
}

#[test]
fn test_alias_node_is_stored_under_canonical_name() {
    let layout = r#"
fin.alias:
  - name: header
    at_fixed_row: 0
    format: "^(Meeting)$"
  - name: results
    parent: header
    required: false
    format: "^R\\s+(\\w+)"
  - name: alt_results
    parent: header
    alternative_of: results
    required: false
    format: "^ALT\\s+(\\w+)"
"#;
    let parser = parser_for(&[layout]);
    let document = Document::parse("Meeting\nALT one\n");

    let outcome = parser.scan(&document).unwrap();
    assert_eq!(outcome.report.result_format.as_deref(), Some("fin.alias"));
    let header = &outcome.root.rows[0];
    // The canonical context never matched, yet the produced node carries
    // its name.
    assert_eq!(header.rows.len(), 1);
    assert_eq!(header.rows[0].name, "results");
    assert_eq!(header.rows[0].key, "one");
}

#[test]
fn test_missing_optional_row_shrinks_consumption() {
    let layout = r#"
fin.block:
  - name: entry
    row_span: 3
    rows:
      - name: first
        format: "^A\\s+(\\w+)"
      - name: middle
        required: false
        format: "^M\\s+(\\w+)"
      - name: last
        format: "^B\\s+(\\w+)"
  - name: tail
    format: "^tail$"
"#;
    let parser = parser_for(&[layout]);
    // The middle row is absent: the block consumes two rows and the next
    // context picks up right after them.
    let document = Document::parse("A one\nB two\ntail\n");

    let outcome = parser.scan(&document).unwrap();
    assert_eq!(outcome.report.result_format.as_deref(), Some("fin.block"));
    let names: Vec<&str> = outcome.root.rows.iter().map(|row| row.name.as_str()).collect();
    assert_eq!(names, vec!["entry", "tail"]);
    assert_eq!(outcome.root.rows[0].key, "one|two");
}

#[test]
fn test_zero_budget_reports_pathological_pattern() {
    let store = LayoutStore::from_layouts(vec![Layout::from_str(MEETING_LAYOUT).unwrap()]);
    let options = ScanOptions {
        context_budget: Duration::ZERO,
        ..ScanOptions::default()
    };
    let parser = FormatParser::with_options(store, options);
    let document = Document::parse("Winter Meeting - 2024-01-06\n");

    let err = parser.scan(&document).unwrap_err();
    match err {
        ParseError::PathologicalPattern { context, .. } => assert_eq!(context, "header"),
        other => panic!("expected a pathological-pattern error, got {other}"),
    }
}

#[test]
fn test_empty_page_between_populated_pages() {
    let parser = parser_for(&[MEETING_LAYOUT]);
    let document = Document::parse(
        "Winter Meeting - 2024-01-06\nEvent 1\n\u{000C}\u{000C}Winter Meeting - 2024-01-06\nEvent 2\n",
    );

    let outcome = parser.scan(&document).unwrap();
    assert_eq!(outcome.report.empty_pages, vec![1]);
    assert_eq!(outcome.report.pages, 3);
    let header = &outcome.root.rows[0];
    let events: Vec<&str> = header.rows.iter().map(|row| row.key.as_str()).collect();
    assert_eq!(events, vec!["1", "2"]);
}

#[test]
fn test_family_fallback_mid_document() {
    // The strict variant only knows single-digit events; page two needs the
    // wider sibling from the same family.
    let strict = r#"
fin.narrow:
  - name: header
    at_fixed_row: 0
    format: "^(Meeting)$"
  - name: event
    parent: header
    repeat: true
    required: false
    format: "^Event\\s+(\\d)$"
"#;
    let wide = r#"
fin.wide:
  - name: header
    at_fixed_row: 0
    format: "^(Meeting)$"
  - name: event
    parent: header
    repeat: true
    required: false
    format: "^Event\\s+(\\d+)$"
"#;
    let other_family = r#"
uisp.any:
  - name: anything
    format: "(.+)"
"#;
    let parser = parser_for(&[strict, wide, other_family]);
    let document = Document::parse("Meeting\nEvent 7\n\u{000C}Meeting\nEvent 42\n");

    let outcome = parser.scan(&document).unwrap();
    // Page one matched fin.narrow; page two only fits fin.wide, which is
    // still within the winning family.
    assert_eq!(outcome.report.result_format.as_deref(), Some("fin.wide"));
    let header = &outcome.root.rows[0];
    let events: Vec<&str> = header.rows.iter().map(|row| row.key.as_str()).collect();
    assert_eq!(events, vec!["7", "42"]);
    // The foreign family was never consulted after the first page matched.
    let uisp = outcome
        .report
        .checks
        .iter()
        .find(|check| check.layout == "uisp.any")
        .unwrap();
    assert!(uisp.valid_at.is_empty());
}

#[test]
fn test_root_serialises_to_the_documented_shape() {
    let parser = parser_for(&[MEETING_LAYOUT]);
    let document = Document::parse("Winter Meeting - 2024-01-06\nEvent 3\nROSSI 31.22\n");

    let outcome = parser.scan(&document).unwrap();
    let json = serde_json::to_value(&outcome.root).unwrap();
    assert_eq!(json["name"], "root");
    assert_eq!(json["rows"][0]["fields"]["title"], "Winter Meeting");
    assert_eq!(json["rows"][0]["rows"][0]["key"], "3");
    assert_eq!(
        json["rows"][0]["rows"][0]["rows"][0]["fields"]["timing"],
        "31.22"
    );
}

#[test]
fn test_partial_success_keeps_matched_pages() {
    let parser = parser_for(&[MEETING_LAYOUT]);
    // Page two does not fit the layout at all.
    let document = Document::parse(
        "Winter Meeting - 2024-01-06\nEvent 1\n\u{000C}completely unrelated content\n",
    );

    let outcome = parser.scan(&document).unwrap();
    assert_eq!(outcome.report.result_format.as_deref(), Some("fin.meeting"));
    assert_eq!(outcome.report.checks[0].valid_at, vec![0]);
    // The first page's data survived the failure on the second.
    let header = &outcome.root.rows[0];
    assert_eq!(header.rows[0].key, "1");
}
