//! `--help-config` rendering: a hand-written field table, not a derived
//! JSON Schema document, since the raw/validated split already doubles as
//! the source of truth and a generated schema would just restate it.

struct Field {
    name: &'static str,
    kind: &'static str,
    default: &'static str,
    doc: &'static str,
}

const FIELDS: &[Field] = &[
    Field { name: "target_dir", kind: "string", default: "(required)", doc: "URI of the cube to create or append to." },
    Field { name: "target_storage_options", kind: "table<string,string>", default: "{}", doc: "Backend-specific options for target_dir (credentials, endpoints)." },
    Field { name: "append_dim", kind: "string", default: "\"time\"", doc: "Name of the dimension slices are concatenated along." },
    Field { name: "append_step", kind: "null | number | \"+\" | \"-\" | duration string", default: "null", doc: "Constraint on the coordinate step between consecutive appends." },
    Field { name: "fixed_dims", kind: "table<string,integer>", default: "{}", doc: "Dimensions whose size is pinned across every slice." },
    Field { name: "included_variables", kind: "array<string> | null", default: "null", doc: "If set, only these variables are written; others are dropped." },
    Field { name: "excluded_variables", kind: "array<string>", default: "[]", doc: "Variables to drop even if present in the slice." },
    Field { name: "variables", kind: "table<string, variable>", default: "{}", doc: "Per-variable dims/encoding/attrs overrides, keyed by variable name." },
    Field { name: "attrs", kind: "table", default: "{}", doc: "Literal cube-level attributes applied at CREATE." },
    Field { name: "attrs_update_mode", kind: "\"keep\" | \"replace\" | \"update\" | \"ignore\"", default: "\"replace\"", doc: "How a slice's attrs reconcile with the cube's on append." },
    Field { name: "permit_eval", kind: "bool", default: "false", doc: "Allow `{{ expr }}` attribute value evaluation." },
    Field { name: "zarr_version", kind: "integer", default: "2", doc: "Zarr metadata version; only 2 is supported." },
    Field { name: "slice_storage_options", kind: "table<string,string>", default: "{}", doc: "Backend-specific options for resolving slice URIs." },
    Field { name: "slice_engine", kind: "string | null", default: "null", doc: "Override for the library used to open slice datasets." },
    Field { name: "slice_polling", kind: "bool | {interval, timeout}", default: "false", doc: "Poll for a not-yet-available slice instead of failing immediately." },
    Field { name: "slice_source", kind: "string | null", default: "null", doc: "Pluggable slice source identifier, for generated or templated slices." },
    Field { name: "slice_source_kwargs", kind: "table", default: "{}", doc: "Arguments passed through to slice_source." },
    Field { name: "persist_mem_slices", kind: "bool", default: "false", doc: "Persist in-memory slices to temp_dir before processing." },
    Field { name: "temp_dir", kind: "string", default: "(platform temp dir)", doc: "Scratch directory for staged writes ahead of commit." },
    Field { name: "temp_storage_options", kind: "table<string,string>", default: "{}", doc: "Backend-specific options for temp_dir." },
    Field { name: "disable_rollback", kind: "bool", default: "false", doc: "Skip rollback on failure, leaving partial state for inspection." },
    Field { name: "force_new", kind: "bool", default: "false", doc: "Delete an existing cube at target_dir before creating a new one." },
    Field { name: "dry_run", kind: "bool", default: "false", doc: "Validate and log the transaction without writing anything." },
    Field { name: "profiling", kind: "bool", default: "false", doc: "Log per-stage timing at debug level." },
    Field { name: "logging", kind: "{level}", default: "{level = \"info\"}", doc: "Logger verbosity, one of the standard log levels." },
    Field { name: "extra", kind: "table", default: "{}", doc: "Unvalidated pass-through data for downstream tooling." },
];

pub fn help_json() -> String {
    let mut entries = Vec::with_capacity(FIELDS.len());
    for field in FIELDS {
        entries.push(serde_json::json!({
            "name": field.name,
            "type": field.kind,
            "default": field.default,
            "description": field.doc,
        }));
    }
    let doc = serde_json::json!({ "fields": entries });
    serde_json::to_string_pretty(&doc).unwrap_or_default()
}

pub fn help_markdown() -> String {
    let mut out = String::from("| field | type | default | description |\n|---|---|---|---|\n");
    for field in FIELDS {
        out.push_str(&format!(
            "| `{}` | {} | `{}` | {} |\n",
            field.name, field.kind, field.default, field.doc
        ));
    }
    out
}

#[cfg(test)]
#[path = "schema_test.rs"]
mod schema_test;
