// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `#[derive(Model)]` through registration and the codec.

use chrono::{DateTime, TimeZone, Utc};
use parley::rpc::{AppInfo, HttpMethod, ProcedureDef, Registry};
use parley::{Codec, CodecError, CodecOptions, Field, KeyCasing, Model, Optional, TypeDef};
use serde_json::json;

/// Importance of a note.
#[derive(Model, Debug, Clone, Copy, PartialEq)]
#[model(rename_all = "lowercase")]
enum Priority {
    Low,
    High,
}

#[derive(Model, Debug, Clone, PartialEq)]
#[model(anonymous)]
struct Location {
    lat: f64,
    lon: f64,
}

/// A stored note.
#[derive(Model, Debug, Clone, PartialEq)]
struct Note {
    id: String,
    title: String,
    priority: Priority,
    created_at: DateTime<Utc>,
    /// Free-form labels.
    tags: Vec<String>,
    archived_at: Option<DateTime<Utc>>,
    location: Optional<Location>,
    #[model(rename = "etag")]
    revision: u64,
    #[deprecated]
    legacy_color: Optional<String>,
}

#[derive(Model, Debug, Clone, PartialEq)]
#[model(discriminator = "kind", rename_all = "snake_case")]
enum NoteEvent {
    NoteCreated { note: Note },
    NoteDeleted { id: String },
    Cleared,
}

#[derive(Model, Debug, Clone, PartialEq)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

#[derive(Model, Debug, Clone, PartialEq)]
struct PatchNote {
    id: String,
    title: Field<String>,
}

#[derive(Model)]
struct Wrapper {
    event: NoteEvent,
    tree: TreeNode,
    patch: PatchNote,
}

fn registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .register(
            ProcedureDef::new("notes.everything", HttpMethod::Post, "/notes/everything"),
            &Wrapper::shape(),
            &Note::shape(),
        )
        .expect("register");
    registry.validate().expect("valid");
    registry
}

#[allow(deprecated)]
fn note() -> Note {
    Note {
        id: "n1".into(),
        title: "Groceries".into(),
        priority: Priority::High,
        created_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
        tags: vec!["home".into()],
        archived_at: None,
        location: Optional::Absent,
        revision: 9_007_199_254_740_993,
        legacy_color: Optional::Absent,
    }
}

#[test]
fn test_definitions_from_derive() {
    let registry = registry();
    let names: Vec<_> = registry.definitions().iter().map(|(n, _)| n).collect();
    assert_eq!(
        names,
        vec![
            "Note",
            "NoteEvent",
            "NotesEverythingEventNoteCreatedNoteLocationParams",
            "PatchNote",
            "TreeNode",
            "Wrapper",
        ]
    );
    let procedure = registry.procedure("notes.everything").expect("procedure");
    assert_eq!(procedure.params.as_deref(), Some("Wrapper"));
    assert_eq!(procedure.response.as_deref(), Some("Note"));
}

#[test]
fn test_record_wire_form() {
    let registry = registry();
    let options = CodecOptions::default();
    let codec = Codec::new(registry.definitions(), &options);
    let def = TypeDef::reference("Note");

    let json = codec.encode_json(&note().to_value(), &def).expect("encode");
    assert_eq!(
        json,
        json!({
            "id": "n1",
            "title": "Groceries",
            "priority": "high",
            "createdAt": "2026-01-02T03:04:05.000Z",
            "tags": ["home"],
            "archivedAt": null,
            "etag": "9007199254740993",
        })
    );

    let decoded = Note::from_value(codec.decode_json(json, &def).expect("decode")).expect("model");
    assert_eq!(decoded, note());
}

#[test]
fn test_nested_anonymous_record() {
    let registry = registry();
    let options = CodecOptions::default();
    let codec = Codec::new(registry.definitions(), &options);
    let mut with_location = note();
    with_location.location = Optional::Present(Location { lat: 1.5, lon: -2.0 });

    let bytes = codec
        .encode_model(&with_location, &TypeDef::reference("Note"))
        .expect("encode");
    let decoded: Note = codec
        .decode_model(&bytes, &TypeDef::reference("Note"))
        .expect("decode");
    assert_eq!(decoded.location, Optional::Present(Location { lat: 1.5, lon: -2.0 }));
}

#[test]
fn test_union_is_flat() {
    let registry = registry();
    let options = CodecOptions::default();
    let codec = Codec::new(registry.definitions(), &options);
    let def = TypeDef::reference("NoteEvent");

    let deleted = NoteEvent::NoteDeleted { id: "n1".into() };
    let json = codec.encode_json(&deleted.to_value(), &def).expect("encode");
    assert_eq!(json, json!({"kind": "note_deleted", "id": "n1"}));
    let back = NoteEvent::from_value(codec.decode_json(json, &def).expect("decode")).expect("model");
    assert_eq!(back, deleted);

    let json = codec
        .encode_json(&NoteEvent::Cleared.to_value(), &def)
        .expect("encode");
    assert_eq!(json, json!({"kind": "cleared"}));

    let created = NoteEvent::NoteCreated { note: note() };
    let bytes = codec.encode_model(&created, &def).expect("encode");
    assert_eq!(codec.decode_model::<NoteEvent>(&bytes, &def).expect("decode"), created);

    let err = codec.decode(br#"{"kind":"bogus"}"#, &def).unwrap_err();
    assert!(matches!(err, CodecError::UnknownTag { ref tag, .. } if tag == "bogus"));
}

#[test]
fn test_unknown_enum_value() {
    let registry = registry();
    let options = CodecOptions::default();
    let codec = Codec::new(registry.definitions(), &options);
    let mut json = codec
        .encode_json(&note().to_value(), &TypeDef::reference("Note"))
        .expect("encode");
    json["priority"] = json!("urgent");
    let err = codec
        .decode_json(json, &TypeDef::reference("Note"))
        .unwrap_err();
    assert_eq!(
        err,
        CodecError::UnknownEnumValue {
            path: "/priority".into(),
            value: "urgent".into(),
        }
    );
}

#[test]
fn test_three_state_field() {
    let registry = registry();
    let options = CodecOptions::default();
    let codec = Codec::new(registry.definitions(), &options);
    let def = TypeDef::reference("PatchNote");
    let decode = |body: &str| -> PatchNote { codec.decode_model(body.as_bytes(), &def).expect("decode") };

    assert_eq!(decode(r#"{"id":"p"}"#).title, Field::Absent);
    assert_eq!(decode(r#"{"id":"p","title":null}"#).title, Field::Null);
    assert_eq!(
        decode(r#"{"id":"p","title":"new"}"#).title,
        Field::Present("new".to_string())
    );

    let patch = PatchNote {
        id: "p".into(),
        title: Field::Null,
    };
    let json = codec.encode_json(&patch.to_value(), &def).expect("encode");
    assert_eq!(json, json!({"id": "p", "title": null}));
}

#[test]
fn test_recursive_record() {
    let registry = registry();
    let options = CodecOptions::default();
    let codec = Codec::new(registry.definitions(), &options);
    let def = TypeDef::reference("TreeNode");
    let body = br#"{"label":"root","children":[{"label":"leaf","children":[]}]}"#;
    let tree: TreeNode = codec.decode_model(body, &def).expect("decode");
    assert_eq!(tree.children[0].label, "leaf");
    assert!(tree.children[0].children.is_empty());
}

#[test]
fn test_docs_and_deprecation_in_schema() {
    let registry = registry();
    let info = AppInfo {
        title: "notes".into(),
        description: None,
        version: "0.1.0".into(),
    };
    let schema = registry.export_schema(&info, "", KeyCasing::Camel).to_json();
    let note = &schema["definitions"]["Note"];
    assert_eq!(note["metadata"]["description"], "A stored note.");
    assert_eq!(note["metadata"]["id"], "Note");
    assert_eq!(
        note["properties"]["tags"]["metadata"]["description"],
        "Free-form labels."
    );
    assert_eq!(
        note["optionalProperties"]["legacyColor"]["metadata"]["isDeprecated"],
        true
    );
    assert_eq!(note["properties"]["priority"]["enum"], json!(["low", "high"]));
    assert_eq!(
        note["properties"]["priority"]["metadata"]["description"],
        "Importance of a note."
    );
    assert_eq!(note["properties"]["etag"], json!({"type": "uint64"}));
    assert_eq!(
        schema["definitions"]["NoteEvent"]["discriminator"],
        "kind"
    );
    assert_eq!(
        schema["definitions"]["NoteEvent"]["mapping"]["cleared"],
        json!({"properties": {}})
    );
}

#[test]
fn test_snake_casing_applies_to_keys_only() {
    let registry = registry();
    let options = CodecOptions {
        key_casing: KeyCasing::Snake,
        ..CodecOptions::default()
    };
    let codec = Codec::new(registry.definitions(), &options);
    let json = codec
        .encode_json(&note().to_value(), &TypeDef::reference("Note"))
        .expect("encode");
    assert_eq!(json["created_at"], "2026-01-02T03:04:05.000Z");
    assert_eq!(json["priority"], "high");
    assert!(json.get("createdAt").is_none());
}
