use super::*;

#[test]
fn json_output_is_parseable_and_lists_target_dir() {
    let text = help_json();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let fields = value["fields"].as_array().unwrap();
    assert!(fields.iter().any(|f| f["name"] == "target_dir"));
}

#[test]
fn markdown_output_has_a_header_row_and_one_row_per_field() {
    let text = help_markdown();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), FIELDS.len() + 2);
    assert!(lines[0].contains("field"));
}
