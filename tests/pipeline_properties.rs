// Behavioural properties of the declaration-sync pipeline against real files.

use std::fs;
use std::path::Path;

use declsmith::domain::declaration::KeyValueMember;
use declsmith::domain::merger::MemberMerger;
use declsmith::infrastructure::{FsSourceStore, PrettyPrinter, SynTreeParser};
use declsmith::{DeclarationSpec, MemberSpec, SyncDeclaration, SyncError, SyncOutcome};
use syn::{Fields, Item};

fn sync_with(path: &Path, spec: &DeclarationSpec, merger: MemberMerger) -> declsmith::Result<declsmith::SyncReport> {
    SyncDeclaration {
        store: &FsSourceStore,
        parser: &SynTreeParser,
        printer: &PrettyPrinter,
        merger,
    }
    .run(path, spec)
}

fn sync(path: &Path, spec: &DeclarationSpec) -> declsmith::SyncReport {
    sync_with(path, spec, MemberMerger::default()).unwrap()
}

fn parse(path: &Path) -> syn::File {
    syn::parse_file(&fs::read_to_string(path).unwrap()).unwrap()
}

fn struct_fields(file: &syn::File, name: &str) -> Vec<String> {
    file.items
        .iter()
        .find_map(|item| match item {
            Item::Struct(s) if s.ident == name => Some(s),
            _ => None,
        })
        .map(|s| match &s.fields {
            Fields::Named(named) => named
                .named
                .iter()
                .map(|f| f.ident.as_ref().unwrap().to_string())
                .collect(),
            _ => Vec::new(),
        })
        .unwrap_or_default()
}

fn widget_spec(fields: &[&str]) -> DeclarationSpec {
    DeclarationSpec::structure("Widget").members(fields.iter().map(|f| MemberSpec::field(f, "String")))
}

// ═══════════════════════════════════════════════════════════════════
// Scenarios
// ═══════════════════════════════════════════════════════════════════

#[test]
fn scenario_1_struct_from_absent_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model").join("widget.rs");

    let report = sync(&path, &widget_spec(&["id", "name"]));

    assert_eq!(report.outcome, SyncOutcome::Created);
    assert_eq!(report.appended, 2);
    let file = parse(&path);
    assert_eq!(file.items.len(), 1);
    assert_eq!(struct_fields(&file, "Widget"), vec!["id", "name"]);
}

#[test]
fn scenario_2_field_appended_to_hand_written_struct() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("widget.rs");
    fs::write(&path, "pub struct Widget {\n    pub id: String,\n}\n").unwrap();

    let report = sync(&path, &widget_spec(&["name"]));

    assert_eq!(report.outcome, SyncOutcome::Merged);
    assert_eq!(struct_fields(&parse(&path), "Widget"), vec!["id", "name"]);
}

#[test]
fn scenario_3_hand_added_field_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("widget.rs");
    fs::write(
        &path,
        "pub struct Widget {\n    pub id: String,\n    pub extra: bool,\n}\n",
    )
    .unwrap();

    let report = sync(&path, &widget_spec(&["id"]));

    assert_eq!(report.appended, 0);
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("pub extra: bool"), "{text}");
    assert_eq!(struct_fields(&parse(&path), "Widget"), vec!["id", "extra"]);
}

#[test]
fn scenario_4_constructor_gains_param_and_key_value() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("widget.rs");
    fs::write(
        &path,
        r#"
pub fn new_widget(id: String) -> Widget {
    let id = id.trim().to_string();
    audit("new widget");
    Widget { id }
}
"#,
    )
    .unwrap();
    let spec = DeclarationSpec::constructor("new_widget", "Widget")
        .member(MemberSpec::param("id", "String"))
        .member(MemberSpec::param("name", "String"))
        .member(MemberSpec::key_value("id", "id"))
        .member(MemberSpec::key_value("name", "name"));

    let report = sync(&path, &spec);

    assert_eq!(report.outcome, SyncOutcome::Merged);
    assert_eq!(report.appended, 2);
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("pub fn new_widget(id: String, name: String) -> Widget {"), "{text}");
    assert!(text.contains("let id = id.trim().to_string();"), "{text}");
    assert!(text.contains("audit(\"new widget\");"), "{text}");
    assert!(text.contains("Widget { id, name }"), "{text}");
}

#[test]
fn scenario_5_rerun_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("widget.rs");
    let spec = widget_spec(&["id", "name"]);

    sync(&path, &spec);
    let first = fs::read(&path).unwrap();
    let report = sync(&path, &spec);
    let second = fs::read(&path).unwrap();

    assert_eq!(first, second);
    assert!(!report.changed);
    assert_eq!(report.appended, 0);
}

// ═══════════════════════════════════════════════════════════════════
// Properties
// ═══════════════════════════════════════════════════════════════════

#[test]
fn additive_application_of_subset_then_superset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("widget.rs");

    sync(&path, &widget_spec(&["id"]));
    let text = fs::read_to_string(&path).unwrap();
    fs::write(&path, text.replace("pub id: String,", "pub id: String,\n    pub note: String,")).unwrap();
    sync(&path, &widget_spec(&["id", "name", "price"]));
    sync(&path, &widget_spec(&["id"]));

    assert_eq!(
        struct_fields(&parse(&path), "Widget"),
        vec!["id", "note", "name", "price"]
    );
}

#[test]
fn identity_is_scoped_by_name_and_kind() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("widget.rs");
    fs::write(
        &path,
        "pub struct Widget {\n    pub id: String,\n}\npub struct Gadget {\n    pub id: String,\n}\n",
    )
    .unwrap();

    sync(&path, &DeclarationSpec::structure("Gadget").member(MemberSpec::field("name", "String")));
    sync(
        &path,
        &DeclarationSpec::interface("Widget").member(MemberSpec::method("id", &[], &["String"])),
    );

    let file = parse(&path);
    assert_eq!(struct_fields(&file, "Widget"), vec!["id"]);
    assert_eq!(struct_fields(&file, "Gadget"), vec!["id", "name"]);
    assert!(file
        .items
        .iter()
        .any(|item| matches!(item, Item::Trait(t) if t.ident == "Widget")));
}

#[test]
fn parse_failure_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("widget.rs");
    let broken = "pub struct Widget {\n    pub id: String,\n\nfn oops( {\n";
    fs::write(&path, broken).unwrap();

    let err = sync_with(&path, &widget_spec(&["name"]), MemberMerger::default()).unwrap_err();

    assert!(matches!(err, SyncError::Parse { .. }), "{err}");
    assert_eq!(fs::read_to_string(&path).unwrap(), broken);
}

#[test]
fn malformed_member_is_reported_before_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("widget.rs");
    fs::write(&path, "pub struct Widget {}\n").unwrap();

    let spec = DeclarationSpec::structure("Widget").member(MemberSpec::field("id", "Vec<"));
    let err = sync_with(&path, &spec, MemberMerger::default()).unwrap_err();

    assert!(err.is_defect(), "{err}");
    assert_eq!(fs::read_to_string(&path).unwrap(), "pub struct Widget {}\n");
}

#[test]
fn key_values_without_a_literal_to_hold_them_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("widget.rs");
    let spec = DeclarationSpec::constructor("new_widget", "Result<Widget, Error>")
        .member(MemberSpec::param("id", "String"))
        .member(MemberSpec::key_value("id", "id"));

    assert!(spec.validate().is_ok());
    let err = sync_with(&path, &spec, MemberMerger::default()).unwrap_err();

    assert!(matches!(err, SyncError::UnsupportedShape { .. }), "{err}");
    assert!(!path.exists());
}

#[test]
fn imports_are_merged_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("widget.rs");
    fs::write(
        &path,
        "use serde::{Deserialize, Serialize};\n\npub struct Widget {}\n",
    )
    .unwrap();
    let spec = widget_spec(&["id"])
        .import("serde::Serialize")
        .import("std::collections::HashMap");

    let first = sync(&path, &spec);
    let second = sync(&path, &spec);

    assert_eq!((first.imports_added, second.imports_added), (1, 0));
    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.matches("use ").count(), 2, "{text}");
}

#[test]
fn partially_present_group_import_adds_only_missing_leaves() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("widget.rs");
    fs::write(&path, "use serde::Serialize;\npub struct Widget {}\n").unwrap();
    let spec = widget_spec(&["id"]).import("serde::{Deserialize, Serialize}");

    let report = sync(&path, &spec);

    assert_eq!(report.imports_added, 1);
    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.matches("Serialize;").count(), 1, "{text}");
    assert!(text.contains("use serde::Serialize;\nuse serde::Deserialize;"), "{text}");
}

#[test]
fn deeper_bound_merges_one_more_level() {
    let existing = "pub static CONFIG: Config = Config {\n    server: Server {\n        tls: Tls { key: None },\n    },\n};\n";
    let spec = DeclarationSpec::variable("CONFIG", "Config").member(MemberSpec::nested(
        "server",
        "Server",
        vec![KeyValueMember {
            key: "tls".to_string(),
            value: declsmith::domain::declaration::ValueExpr::Composite(
                declsmith::domain::declaration::CompositeLiteral {
                    type_name: "Tls".to_string(),
                    entries: vec![KeyValueMember::new("cert", "None")],
                },
            ),
        }],
    ));

    let dir = tempfile::tempdir().unwrap();
    let shallow = dir.path().join("shallow.rs");
    let deep = dir.path().join("deep.rs");
    fs::write(&shallow, existing).unwrap();
    fs::write(&deep, existing).unwrap();

    let shallow_report = sync(&shallow, &spec);
    let deep_report = sync_with(&deep, &spec, MemberMerger::new(3).unwrap()).unwrap();

    assert_eq!(shallow_report.appended, 0);
    assert_eq!(deep_report.appended, 1);
    assert!(fs::read_to_string(&deep).unwrap().contains("cert: None"));
}

#[test]
fn method_registration_keeps_hand_statements() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("routes.rs");
    fs::write(
        &path,
        r#"
pub struct Router {
    pub routes: Vec<(&'static str, &'static str)>,
}

impl Router {
    pub fn register_routes(&mut self) {
        self.routes.push(("/health", "health"));
    }
}
"#,
    )
    .unwrap();
    let spec = DeclarationSpec::method("&mut Router", "register_routes")
        .member(MemberSpec::statement("self.routes.push((\"/widgets\", \"widget\"));"));

    let first = sync(&path, &spec);
    let second = sync(&path, &spec);

    assert_eq!((first.appended, second.appended), (1, 0));
    let text = fs::read_to_string(&path).unwrap();
    let health = text.find("/health").unwrap();
    let widgets = text.find("/widgets").unwrap();
    assert!(health < widgets, "{text}");
}
