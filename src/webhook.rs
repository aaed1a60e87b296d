//! GitLab "Emoji events" webhook payloads.
//!
//! GitLab has changed this payload several times: older deliveries carry an
//! `issue`, newer ones a `work_item`, and the latest both. One superset
//! [`EmojiEvent`] covers all of them; every target object is optional.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::flex_id::FlexId;
use crate::flexible_time::FlexibleTime;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmojiEvent {
    pub object_kind: String,
    pub event_type: String,
    pub user: Option<EmojiUser>,
    pub project_id: i64,
    pub project: Option<EmojiProject>,
    pub object_attributes: Option<EmojiAttributes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<Issue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_item: Option<WorkItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<Note>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_request: Option<MergeRequest>,
}

/// The user who awarded the emoji.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmojiUser {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmojiProject {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub web_url: String,
    pub avatar_url: Option<String>,
    pub git_ssh_url: String,
    pub git_http_url: String,
    pub namespace: String,
    pub visibility_level: i64,
    pub path_with_namespace: String,
    pub default_branch: Option<String>,
    pub ci_config_path: Option<String>,
    pub homepage: String,
    pub url: String,
    pub ssh_url: String,
    pub http_url: String,
}

/// Source and target projects of a merge request use the same shape as the
/// event's own project.
pub type ProjectInfo = EmojiProject;

/// The award itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmojiAttributes {
    pub user_id: i64,
    pub created_at: Option<FlexibleTime>,
    pub id: i64,
    /// Emoji name, e.g. `thumbsup`.
    pub name: String,
    pub awardable_type: String,
    pub awardable_id: i64,
    pub updated_at: Option<FlexibleTime>,
    pub awarded_on_url: String,
}

/// A label, either as a bare name or as the full label record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelRef {
    Name(String),
    Detailed(Label),
}

impl LabelRef {
    pub fn title(&self) -> &str {
        match self {
            LabelRef::Name(name) => name,
            LabelRef::Detailed(label) => &label.title,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Label {
    pub id: i64,
    pub title: String,
    pub color: String,
    pub project_id: Option<i64>,
    pub group_id: Option<i64>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub template: bool,
    pub created_at: Option<FlexibleTime>,
    pub updated_at: Option<FlexibleTime>,
}

/// Work item status, sent by newer GitLab versions next to the issue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueStatus {
    pub id: Option<FlexId>,
    pub name: String,
    pub color: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub icon_name: Option<String>,
}

/// The older generic issue target, reintroduced in the newest payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Issue {
    pub author_id: i64,
    pub closed_at: Option<FlexibleTime>,
    pub confidential: bool,
    pub created_at: Option<FlexibleTime>,
    pub description: Option<String>,
    pub discussion_locked: Option<bool>,
    pub due_date: Option<String>,
    pub id: i64,
    pub iid: i64,
    pub last_edited_at: Option<FlexibleTime>,
    pub last_edited_by_id: Option<i64>,
    pub milestone_id: Option<i64>,
    pub moved_to_id: Option<i64>,
    pub duplicated_to_id: Option<i64>,
    pub project_id: i64,
    pub relative_position: Option<i64>,
    pub state_id: i64,
    pub time_estimate: i64,
    pub title: String,
    pub updated_at: Option<FlexibleTime>,
    pub updated_by_id: Option<i64>,
    pub weight: Option<i64>,
    pub health_status: Option<String>,
    pub url: String,
    pub total_time_spent: i64,
    pub time_change: i64,
    pub human_total_time_spent: Option<String>,
    pub human_time_change: Option<String>,
    pub human_time_estimate: Option<String>,
    pub assignee_ids: Vec<i64>,
    pub assignee_id: Option<i64>,
    pub labels: Vec<LabelRef>,
    pub state: String,
    pub severity: Option<String>,
    pub status: Option<IssueStatus>,
}

/// GitLab's generalized issue-like object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkItem {
    pub author_id: i64,
    pub closed_at: Option<FlexibleTime>,
    pub confidential: bool,
    pub created_at: Option<FlexibleTime>,
    pub description: Option<String>,
    pub discussion_locked: Option<bool>,
    pub due_date: Option<String>,
    pub id: i64,
    pub iid: i64,
    pub last_edited_at: Option<FlexibleTime>,
    pub last_edited_by_id: Option<i64>,
    pub milestone_id: Option<i64>,
    pub moved_to_id: Option<i64>,
    pub duplicated_to_id: Option<i64>,
    pub project_id: i64,
    pub relative_position: Option<i64>,
    pub state_id: i64,
    pub time_estimate: i64,
    pub title: String,
    pub updated_at: Option<FlexibleTime>,
    pub updated_by_id: Option<i64>,
    pub weight: Option<i64>,
    pub health_status: Option<String>,
    /// Work item type name, e.g. `Issue` or `Task`.
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub total_time_spent: i64,
    pub time_change: i64,
    pub assignee_ids: Vec<i64>,
    pub assignee_id: Option<i64>,
    pub labels: Vec<LabelRef>,
    pub state: String,
    pub severity: Option<String>,
}

/// A comment. Diff positions are kept as raw JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Note {
    pub attachment: Option<String>,
    pub author_id: i64,
    pub change_position: Option<Value>,
    pub commit_id: Option<String>,
    pub created_at: Option<FlexibleTime>,
    pub discussion_id: String,
    pub id: i64,
    pub line_code: Option<String>,
    pub note: String,
    pub noteable_id: Option<i64>,
    pub noteable_type: String,
    pub original_position: Option<Value>,
    pub position: Option<Value>,
    pub project_id: i64,
    pub resolved_at: Option<FlexibleTime>,
    pub resolved_by_id: Option<i64>,
    pub resolved_by_push: Option<bool>,
    pub st_diff: Option<Value>,
    pub system: bool,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub updated_at: Option<FlexibleTime>,
    pub updated_by_id: Option<i64>,
    pub description: String,
    pub url: String,
    pub internal: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitAuthor {
    pub name: String,
    pub email: String,
}

/// Head commit of a merge request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitInfo {
    pub id: String,
    pub message: String,
    pub title: String,
    pub timestamp: Option<FlexibleTime>,
    pub url: String,
    pub author: Option<CommitAuthor>,
}

/// Merge request approval rule.
///
/// Identifier fields arrive as numbers or strings depending on the GitLab
/// version. `orchestration_policy_idx` and `applicable_post_merge` have no
/// stable type and are kept as raw JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalRule {
    pub id: Option<FlexId>,
    pub approvals_required: i64,
    pub name: String,
    pub rule_type: String,
    pub report_type: Option<String>,
    pub merge_request_id: Option<FlexId>,
    pub section: Option<String>,
    pub modified_from_project_rule: bool,
    pub orchestration_policy_idx: Option<Value>,
    pub vulnerabilities_allowed: i64,
    pub scanners: Vec<String>,
    pub severity_levels: Vec<String>,
    pub vulnerability_states: Vec<String>,
    pub security_orchestration_policy_configuration_id: Option<FlexId>,
    pub scan_result_policy_id: Option<FlexId>,
    pub applicable_post_merge: Option<Value>,
    pub project_id: Option<FlexId>,
    pub approval_policy_rule_id: Option<FlexId>,
    pub created_at: Option<FlexibleTime>,
    pub updated_at: Option<FlexibleTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeRequest {
    pub assignee_id: Option<i64>,
    pub author_id: i64,
    pub created_at: Option<FlexibleTime>,
    pub description: Option<String>,
    pub draft: bool,
    pub head_pipeline_id: Option<i64>,
    pub id: i64,
    pub iid: i64,
    pub last_edited_at: Option<FlexibleTime>,
    pub last_edited_by_id: Option<i64>,
    pub merge_commit_sha: Option<String>,
    pub merge_error: Option<String>,
    pub merge_params: Option<Value>,
    pub merge_status: String,
    pub merge_user_id: Option<i64>,
    pub merge_when_pipeline_succeeds: bool,
    pub milestone_id: Option<i64>,
    pub source_branch: String,
    pub source_project_id: i64,
    pub state_id: i64,
    pub target_branch: String,
    pub target_project_id: i64,
    pub time_estimate: i64,
    pub title: String,
    pub updated_at: Option<FlexibleTime>,
    pub updated_by_id: Option<i64>,
    pub prepared_at: Option<FlexibleTime>,
    pub url: String,
    pub source: Option<ProjectInfo>,
    pub target: Option<ProjectInfo>,
    pub last_commit: Option<CommitInfo>,
    pub work_in_progress: bool,
    pub total_time_spent: i64,
    pub time_change: i64,
    pub human_total_time_spent: Option<String>,
    pub human_time_change: Option<String>,
    pub human_time_estimate: Option<String>,
    pub assignee_ids: Vec<i64>,
    pub reviewer_ids: Vec<i64>,
    pub labels: Vec<LabelRef>,
    pub state: String,
    pub blocking_discussions_resolved: bool,
    pub first_contribution: bool,
    pub detailed_merge_status: Option<String>,
    pub approval_rules: Vec<ApprovalRule>,
}

/// The object that received the emoji.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Awardable<'a> {
    Issue(&'a Issue),
    WorkItem(&'a WorkItem),
    Note(&'a Note),
    MergeRequest(&'a MergeRequest),
}

impl Awardable<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            Awardable::Issue(_) => "issue",
            Awardable::WorkItem(_) => "work item",
            Awardable::Note(_) => "note",
            Awardable::MergeRequest(_) => "merge request",
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Awardable::Issue(issue) => issue.id,
            Awardable::WorkItem(item) => item.id,
            Awardable::Note(note) => note.id,
            Awardable::MergeRequest(mr) => mr.id,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Awardable::Issue(issue) => &issue.url,
            Awardable::WorkItem(item) => &item.url,
            Awardable::Note(note) => &note.url,
            Awardable::MergeRequest(mr) => &mr.url,
        }
    }
}

/// Payload shape, inferred from which target objects are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaRevision {
    /// `issue` without `work_item`.
    Legacy,
    /// `work_item` without `issue`.
    WorkItem,
    /// `issue` and `work_item` together.
    Current,
    /// Neither, so any revision could have produced it.
    Undetermined,
}

impl EmojiEvent {
    /// The object the emoji was awarded on.
    ///
    /// Note awards also carry the note's parent issue or merge request, so
    /// `object_attributes.awardable_type` decides first. Without a usable
    /// type, the first populated target wins.
    pub fn awardable(&self) -> Option<Awardable<'_>> {
        let issue = self.issue.as_ref().map(Awardable::Issue);
        let work_item = self.work_item.as_ref().map(Awardable::WorkItem);
        let note = self.note.as_ref().map(Awardable::Note);
        let merge_request = self.merge_request.as_ref().map(Awardable::MergeRequest);

        let by_type = match self.awardable_type() {
            Some("Issue") | Some("WorkItem") => work_item.or(issue),
            Some("Note") | Some("DiscussionNote") | Some("DiffNote") => note,
            Some("MergeRequest") => merge_request,
            _ => None,
        };

        by_type
            .or(issue)
            .or(work_item)
            .or(note)
            .or(merge_request)
    }

    pub fn awardable_type(&self) -> Option<&str> {
        self.object_attributes
            .as_ref()
            .map(|attrs| attrs.awardable_type.as_str())
            .filter(|kind| !kind.is_empty())
    }

    pub fn revision(&self) -> SchemaRevision {
        match (self.issue.is_some(), self.work_item.is_some()) {
            (true, true) => SchemaRevision::Current,
            (false, true) => SchemaRevision::WorkItem,
            (true, false) => SchemaRevision::Legacy,
            (false, false) => SchemaRevision::Undetermined,
        }
    }
}

/// Decodes one webhook body. Any malformed field, timestamps included,
/// rejects the whole payload.
pub fn decode_event(body: &[u8]) -> Result<EmojiEvent> {
    let event: EmojiEvent = serde_json::from_slice(body).map_err(|e| {
        warn!("Failed to parse emoji event payload: {}", e);
        Error::Decode(e)
    })?;

    debug!(
        object_kind = %event.object_kind,
        revision = ?event.revision(),
        "Decoded emoji event"
    );
    Ok(event)
}

pub fn decode_event_str(body: &str) -> Result<EmojiEvent> {
    decode_event(body.as_bytes())
}

/// Re-encodes an event. Timestamps come out in canonical RFC 3339 form.
pub fn encode_event(event: &EmojiEvent, pretty: bool) -> Result<String> {
    let encoded = if pretty {
        serde_json::to_string_pretty(event)
    } else {
        serde_json::to_string(event)
    };
    encoded.map_err(Error::Encode)
}

pub fn summarize(event: &EmojiEvent) -> String {
    let user = event
        .user
        .as_ref()
        .map(|u| u.username.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("unknown user");
    let emoji = event
        .object_attributes
        .as_ref()
        .map(|attrs| attrs.name.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("emoji");
    let project = event
        .project
        .as_ref()
        .map(|p| p.path_with_namespace.as_str())
        .filter(|path| !path.is_empty())
        .unwrap_or("unknown project");

    match event.awardable() {
        Some(target) => format!(
            "{} awarded :{}: on {} {} in {}",
            user,
            emoji,
            target.kind(),
            target.id(),
            project
        ),
        None => format!("{} awarded :{}: in {}", user, emoji, project),
    }
}
