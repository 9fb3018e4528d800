use ndarray::ArrayD;
use serde_json::json;

use super::*;
use crate::slice::Variable;
use crate::store::Dtype;

fn view_with_time(values: Vec<f64>) -> Dataset {
    let mut ds = Dataset::new();
    let n = values.len();
    ds.variables.insert(
        "time".to_string(),
        Variable {
            dims: vec!["time".to_string()],
            dtype: Dtype::F64,
            data: ArrayD::from_shape_vec(vec![n], values).unwrap(),
            attrs: Default::default(),
        },
    );
    ds
}

#[test]
fn resolves_lower_and_upper_bound_over_a_step() {
    let view = view_with_time(vec![0.0, 1.0, 2.0, 3.0]);
    let mut attrs = Map::new();
    attrs.insert("time_coverage_start".to_string(), json!(r#"{{ lower_bound(time, "lower") }}"#));
    attrs.insert("time_coverage_end".to_string(), json!(r#"{{ upper_bound(time, "upper") }}"#));

    let out = evaluate(attrs, &view).unwrap();
    assert_eq!(out["time_coverage_start"], json!("0"));
    assert_eq!(out["time_coverage_end"], json!("3"));
}

#[test]
fn single_valued_array_has_zero_width_bounds() {
    let view = view_with_time(vec![5.0]);
    let mut attrs = Map::new();
    attrs.insert("x".to_string(), json!(r#"{{ lower_bound(time, "center") }}"#));
    let out = evaluate(attrs, &view).unwrap();
    assert_eq!(out["x"], json!("5"));
}

#[test]
fn unknown_variable_is_a_config_error() {
    let view = view_with_time(vec![0.0, 1.0]);
    let mut attrs = Map::new();
    attrs.insert("x".to_string(), json!(r#"{{ lower_bound(missing, "lower") }}"#));
    let err = evaluate(attrs, &view).unwrap_err();
    assert!(err.is_kind(crate::Kind::Config));
}

#[test]
fn plain_strings_pass_through_untouched() {
    let view = view_with_time(vec![0.0, 1.0]);
    let mut attrs = Map::new();
    attrs.insert("title".to_string(), json!("no expression here"));
    let out = evaluate(attrs, &view).unwrap();
    assert_eq!(out["title"], json!("no expression here"));
}
