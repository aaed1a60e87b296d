use gitlab_emoji::webhook::{Awardable, LabelRef, SchemaRevision};
use gitlab_emoji::{EmojiEvent, Error, FlexId, decode_event, encode_event};
use serde_json::{Value, json};

const LEGACY_ISSUE: &str = include_str!("fixtures/legacy_issue.json");
const WORK_ITEM: &str = include_str!("fixtures/work_item.json");
const CURRENT_ISSUE: &str = include_str!("fixtures/current_issue.json");
const NOTE_ON_MR: &str = include_str!("fixtures/note_on_merge_request.json");

fn decode(body: &str) -> EmojiEvent {
    decode_event(body.as_bytes()).unwrap()
}

#[test]
fn test_minimal_payload_mixed_timestamp_formats() {
    let body = r#"{"object_kind":"award","user":{"id":1,"username":"alice"},"object_attributes":{"created_at":"2025-12-09 20:44:22 UTC","updated_at":"2025-12-09T20:44:22Z"}}"#;
    let event = decode(body);

    assert_eq!(event.object_kind, "award");
    let user = event.user.as_ref().unwrap();
    assert_eq!(user.id, 1);
    assert_eq!(user.username, "alice");
    assert_eq!(user.name, "");
    assert!(event.project.is_none());

    let attrs = event.object_attributes.as_ref().unwrap();
    let created = attrs.created_at.unwrap();
    let updated = attrs.updated_at.unwrap();
    assert_eq!(created, updated);
    assert_eq!(created.to_string(), "2025-12-09T20:44:22Z");
}

#[test]
fn test_legacy_issue_payload() {
    let event = decode(LEGACY_ISSUE);

    assert_eq!(event.revision(), SchemaRevision::Legacy);
    assert_eq!(event.project_id, 6);
    let project = event.project.as_ref().unwrap();
    assert_eq!(project.path_with_namespace, "flightjs/Flight");
    assert!(project.description.is_none());

    match event.awardable() {
        Some(Awardable::Issue(issue)) => {
            assert_eq!(issue.id, 73);
            assert_eq!(issue.milestone_id, Some(3));
            assert!(issue.closed_at.is_none());
            assert_eq!(issue.severity.as_deref(), Some("unknown"));
        }
        other => panic!("expected issue, got {other:?}"),
    }
}

#[test]
fn test_work_item_payload() {
    let event = decode(WORK_ITEM);

    assert_eq!(event.revision(), SchemaRevision::WorkItem);
    assert!(event.issue.is_none());

    let item = event.work_item.as_ref().unwrap();
    assert_eq!(item.kind, "Task");
    assert_eq!(item.weight, Some(3));
    assert!(item.relative_position.is_none());
    let labels: Vec<&str> = item.labels.iter().map(LabelRef::title).collect();
    assert_eq!(labels, ["backend", "webhooks"]);

    let edited = item.last_edited_at.unwrap();
    assert_eq!(edited.offset().local_minus_utc(), 3600);
    assert_eq!(edited.to_string(), "2025-12-02T10:00:00+01:00");

    assert!(matches!(event.awardable(), Some(Awardable::WorkItem(w)) if w.iid == 7));
}

#[test]
fn test_current_payload_with_issue_and_work_item() {
    let event = decode(CURRENT_ISSUE);

    assert_eq!(event.revision(), SchemaRevision::Current);
    let issue = event.issue.as_ref().unwrap();
    let status = issue.status.as_ref().unwrap();
    assert_eq!(status.name, "In progress");
    assert_eq!(status.category.as_deref(), Some("in_progress"));
    assert!(matches!(status.id, Some(FlexId::Text(_))));

    match &issue.labels[0] {
        LabelRef::Detailed(label) => {
            assert_eq!(label.title, "bug");
            assert_eq!(label.kind.as_deref(), Some("ProjectLabel"));
        }
        other => panic!("expected detailed label, got {other:?}"),
    }

    let work_item = event.work_item.as_ref().unwrap();
    assert_eq!(issue.created_at, work_item.created_at);
}

#[test]
fn test_note_award_prefers_note_over_parent() {
    let event = decode(NOTE_ON_MR);

    assert_eq!(event.revision(), SchemaRevision::Undetermined);
    match event.awardable() {
        Some(Awardable::Note(note)) => {
            assert_eq!(note.id, 5150);
            assert_eq!(note.kind.as_deref(), Some("DiffNote"));
            assert_eq!(note.position.as_ref().unwrap()["new_line"], 12);
        }
        other => panic!("expected note, got {other:?}"),
    }

    let attrs = event.object_attributes.as_ref().unwrap();
    assert_eq!(attrs.created_at, attrs.updated_at);
}

#[test]
fn test_merge_request_details() {
    let event = decode(NOTE_ON_MR);
    let mr = event.merge_request.as_ref().unwrap();

    assert_eq!(mr.source.as_ref().unwrap().default_branch.as_deref(), Some("main"));
    let commit = mr.last_commit.as_ref().unwrap();
    assert_eq!(commit.author.as_ref().unwrap().email, "alice@example.com");
    assert_eq!(commit.timestamp.unwrap().to_string(), "2025-11-19T09:58:00+01:00");
    assert_eq!(mr.reviewer_ids, [3]);
    assert_eq!(mr.merge_params.as_ref().unwrap()["force_remove_source_branch"], "1");
}

#[test]
fn test_approval_rule_ids_as_number_or_string() {
    let event = decode(NOTE_ON_MR);
    let rules = &event.merge_request.as_ref().unwrap().approval_rules;

    assert_eq!(rules[0].id, Some(FlexId::Int(21)));
    assert_eq!(rules[1].id, Some(FlexId::Text("22".to_string())));
    assert_eq!(
        rules[0].merge_request_id.as_ref().and_then(FlexId::as_i64),
        rules[1].merge_request_id.as_ref().and_then(FlexId::as_i64),
    );
    assert!(rules[0].approval_policy_rule_id.is_none());
    assert_eq!(rules[1].scan_result_policy_id, Some(FlexId::Int(17)));
}

#[test]
fn test_identifier_field_number_then_string() {
    for id in [json!(811), json!("811")] {
        let body = json!({
            "object_kind": "emoji",
            "merge_request": {"approval_rules": [{"merge_request_id": id}]}
        });
        let event = decode(&body.to_string());
        let rule = &event.merge_request.unwrap().approval_rules[0];
        assert_eq!(rule.merge_request_id.as_ref().and_then(FlexId::as_i64), Some(811));
    }
}

#[test]
fn test_opaque_fields_round_trip_verbatim() {
    let event = decode(NOTE_ON_MR);
    let encoded: Value = serde_json::from_str(&encode_event(&event, false).unwrap()).unwrap();
    let rule = &encoded["merge_request"]["approval_rules"][1];

    assert_eq!(rule["orchestration_policy_idx"], json!(0));
    assert_eq!(rule["applicable_post_merge"], json!({"enabled": true}));
    assert_eq!(rule["id"], json!("22"));
    assert_eq!(rule["scan_result_policy_id"], json!(17));
}

#[test]
fn test_encode_canonicalizes_timestamps() {
    let event = decode(WORK_ITEM);
    let encoded: Value = serde_json::from_str(&encode_event(&event, false).unwrap()).unwrap();

    assert_eq!(encoded["object_attributes"]["created_at"], "2025-12-09T20:44:22Z");
    assert_eq!(encoded["object_attributes"]["updated_at"], "2025-12-09T20:44:22Z");
    assert_eq!(encoded["work_item"]["created_at"], "2025-12-01T09:15:00Z");
    assert_eq!(encoded["work_item"]["type"], "Task");
    assert_eq!(encoded["user"]["username"], "alice");
    assert!(encoded.get("issue").is_none());
}

#[test]
fn test_encode_decode_is_stable() {
    for body in [LEGACY_ISSUE, WORK_ITEM, CURRENT_ISSUE, NOTE_ON_MR] {
        let first = encode_event(&decode(body), false).unwrap();
        let second = encode_event(&decode(&first), false).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_bad_timestamp_rejects_whole_payload() {
    let body = r#"{"object_kind":"emoji","object_attributes":{"created_at":"yesterday"}}"#;
    let err = decode_event(body.as_bytes()).unwrap_err();

    assert!(matches!(err, Error::Decode(_)));
    assert!(err.to_string().contains("unable to parse time \"yesterday\""));
}

#[test]
fn test_unlisted_zone_abbreviation_decodes() {
    let body = r#"{"object_kind":"award","object_attributes":{"created_at":"2025-12-09 20:44:22 BST","updated_at":"2025-12-09 20:44:22 AEST"}}"#;
    let event = decode(body);
    let attrs = event.object_attributes.unwrap();

    assert_eq!(attrs.created_at.unwrap().to_string(), "2025-12-09T20:44:22Z");
    assert_eq!(attrs.created_at, attrs.updated_at);
}

#[test]
fn test_identifier_field_outside_i64_range() {
    for id in ["811.0", "1e3", "18446744073709551615"] {
        let body = format!(r#"{{"merge_request":{{"approval_rules":[{{"id":{id}}}]}}}}"#);
        let event = decode(&body);
        let rule = &event.merge_request.unwrap().approval_rules[0];
        assert!(matches!(rule.id, Some(FlexId::Number(_))), "{id}");
    }
}

#[test]
fn test_structural_type_mismatch_rejected() {
    let body = r#"{"object_kind":"emoji","project_id":"forty-two"}"#;
    assert!(matches!(decode_event(body.as_bytes()), Err(Error::Decode(_))));

    let body = r#"{"merge_request":{"approval_rules":[{"id":true}]}}"#;
    assert!(matches!(decode_event(body.as_bytes()), Err(Error::Decode(_))));
}

#[test]
fn test_invalid_json_rejected() {
    assert!(decode_event(b"{\"object_kind\":").is_err());
    assert!(decode_event(b"").is_err());
}
