use chrono::NaiveDate;
use egui::Color32;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use uuid::Uuid;

use super::dates::{normalize_range, parse_day, DateInput, FallbackPolicy, FallbackReason};
use super::status::{status_colors, status_progress, ColorPair};

/// A single task as shown in the table and on the timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Percentage in `[0, 100]`. `None` derives it from `status`.
    pub progress: Option<f32>,
    pub status: Option<String>,
    /// Explicit bar color; overrides the status colors.
    pub color: Option<Color32>,
    /// Declared parent, for records delivered as a flat list.
    pub parent_id: Option<String>,
    pub subtasks: Vec<Task>,
    /// Set when one of the dates was substituted during normalization.
    pub date_fallback: Option<FallbackReason>,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            start,
            end: end.max(start),
            progress: None,
            status: None,
            color: None,
            parent_id: None,
            subtasks: Vec::new(),
            date_fallback: None,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_progress(mut self, progress: f32) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_subtasks(mut self, subtasks: Vec<Task>) -> Self {
        self.subtasks = subtasks;
        self
    }

    pub fn has_children(&self) -> bool {
        !self.subtasks.is_empty()
    }

    /// Explicit progress if present, otherwise the status percentage, clamped to `[0, 100]`.
    pub fn effective_progress(&self) -> f32 {
        match self.progress {
            Some(p) if p.is_finite() => p.clamp(0.0, 100.0),
            Some(_) => 0.0,
            None => self.status.as_deref().map(status_progress).unwrap_or(0) as f32,
        }
    }

    pub fn colors(&self) -> ColorPair {
        match self.color {
            Some(c) => ColorPair::from_base(c),
            None => status_colors(self.status.as_deref().unwrap_or("")),
        }
    }
}

/// Depth-first, pre-order iterator over every task in a forest.
pub struct Walk<'a> {
    stack: Vec<&'a Task>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Task;

    fn next(&mut self) -> Option<&'a Task> {
        let task = self.stack.pop()?;
        self.stack.extend(task.subtasks.iter().rev());
        Some(task)
    }
}

pub fn walk(forest: &[Task]) -> Walk<'_> {
    Walk {
        stack: forest.iter().rev().collect(),
    }
}

/// One task record in the shape the task API delivers it.
///
/// The API has shipped several spellings of the same field over time and a
/// record may carry more than one. Each spelling is its own field; when they
/// disagree the first one in this order wins:
///
/// - name: `name`, `taskName`, `title` (first non-blank)
/// - start: `start`, `startDate`, `createdAt` (first that parses, else first present)
/// - end: `end`, `endDate`, `dueDate` (same rule as start)
/// - id: `id`, `_id`
/// - parent: `parentId`, `parent`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default, rename = "_id", deserialize_with = "lenient_id")]
    pub legacy_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub task_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub start: DateInput,
    #[serde(default)]
    pub start_date: DateInput,
    #[serde(default)]
    pub created_at: DateInput,
    #[serde(default)]
    pub end: DateInput,
    #[serde(default)]
    pub end_date: DateInput,
    #[serde(default)]
    pub due_date: DateInput,
    #[serde(default)]
    pub progress: Option<f32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_color")]
    pub color: Option<Color32>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub parent_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub parent: Option<String>,
    /// Kept raw so one malformed subtask does not reject its parent.
    #[serde(default)]
    pub subtasks: Vec<Value>,
}

/// A record that could not be turned into a task.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecord {
    pub label: String,
    pub reason: String,
}

/// A task whose dates were substituted.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackNote {
    pub task_id: String,
    pub task_name: String,
    pub reason: FallbackReason,
}

/// Everything that went wrong, non-fatally, while converting records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionLog {
    pub skipped: Vec<SkippedRecord>,
    pub fallbacks: Vec<FallbackNote>,
}

impl ConversionLog {
    pub fn skip(&mut self, label: impl Into<String>, reason: impl ToString) {
        let label = label.into();
        let reason = reason.to_string();
        log::warn!("Skipping task '{}': {}", label, reason);
        self.skipped.push(SkippedRecord { label, reason });
    }

    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.fallbacks.is_empty()
    }
}

impl TaskRecord {
    /// Deserialize one record from a JSON value. A record of the wrong shape
    /// is recorded in `report` under its name, its id, or `fallback_label`.
    pub fn from_value(value: Value, fallback_label: &str, report: &mut ConversionLog) -> Option<Self> {
        let label = value_label(&value).unwrap_or_else(|| fallback_label.to_string());
        match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                report.skip(label, e);
                None
            }
        }
    }

    fn display_name(&self) -> Option<&str> {
        [Some(self.name.as_str()), self.task_name.as_deref(), self.title.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|n| !n.is_empty())
    }

    fn label(&self) -> String {
        match (self.display_name(), self.id.as_ref().or(self.legacy_id.as_ref())) {
            (Some(name), _) => name.to_string(),
            (None, Some(id)) => id.clone(),
            (None, None) => "(unnamed)".to_string(),
        }
    }

    /// Normalize this record and its subtasks into a [`Task`].
    ///
    /// A record whose dates cannot be normalized is recorded in `report` and
    /// yields `None`; its subtasks go with it. Failing subtasks are dropped
    /// individually.
    pub fn into_task(
        self,
        today: NaiveDate,
        policy: FallbackPolicy,
        report: &mut ConversionLog,
    ) -> Option<Task> {
        let start = first_date([&self.start, &self.start_date, &self.created_at]);
        let end = first_date([&self.end, &self.end_date, &self.due_date]);
        let resolution = match normalize_range(start, end, today, policy) {
            Ok(r) => r,
            Err(e) => {
                report.skip(self.label(), e);
                return None;
            }
        };

        let name = self.display_name().unwrap_or("(untitled)").to_string();
        let id = [self.id, self.legacy_id]
            .into_iter()
            .flatten()
            .find(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let date_fallback = resolution.fallback().cloned();
        if let Some(reason) = &date_fallback {
            log::warn!("Task '{}' ({}): substituted dates, {}", name, id, reason);
            report.fallbacks.push(FallbackNote {
                task_id: id.clone(),
                task_name: name.clone(),
                reason: reason.clone(),
            });
        }

        let subtasks = self
            .subtasks
            .into_iter()
            .enumerate()
            .filter_map(|(i, value)| {
                let fallback = format!("subtask {} of '{}'", i + 1, name);
                TaskRecord::from_value(value, &fallback, report)?.into_task(today, policy, report)
            })
            .map(|mut child| {
                child.parent_id = Some(id.clone());
                child
            })
            .collect();

        let range = resolution.range();
        Some(Task {
            id,
            name,
            start: range.start(),
            end: range.end(),
            progress: self.progress,
            status: self.status.filter(|s| !s.trim().is_empty()),
            color: self.color,
            parent_id: [self.parent_id, self.parent]
                .into_iter()
                .flatten()
                .find(|p| !p.trim().is_empty()),
            subtasks,
            date_fallback,
        })
    }
}

/// The first candidate that parses, else the first one present, so a bad
/// value is still reported.
fn first_date<'a>(candidates: [&'a DateInput; 3]) -> &'a DateInput {
    candidates
        .iter()
        .copied()
        .find(|d| parse_day(d).is_ok())
        .or_else(|| candidates.iter().copied().find(|d| **d != DateInput::Missing))
        .unwrap_or(candidates[0])
}

/// A human label for a raw record: its name under any spelling, else its id.
fn value_label(value: &Value) -> Option<String> {
    let text = |key: &str| match value.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    };
    ["name", "taskName", "title", "id", "_id"]
        .into_iter()
        .find_map(text)
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
        RawId::Text(s) => s,
        RawId::Signed(n) => n.to_string(),
        RawId::Unsigned(n) => n.to_string(),
    }))
}

fn lenient_color<'de, D>(deserializer: D) -> Result<Option<Color32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| match parse_hex_color(&s) {
        Ok(c) => Some(c),
        Err(e) => {
            log::warn!("Ignoring task color: {}", e);
            None
        }
    }))
}

/// Parse `#RRGGBB` or `#RRGGBBAA`.
pub fn parse_hex_color(s: &str) -> Result<Color32, String> {
    let hex = s.trim().trim_start_matches('#');
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(format!("invalid hex color '{}': only hex digits are allowed", s));
    }
    let channel = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
            .ok_or_else(|| format!("invalid hex color '{}'", s))
    };
    match hex.len() {
        6 => Ok(Color32::from_rgb(channel(0)?, channel(2)?, channel(4)?)),
        8 => Ok(Color32::from_rgba_unmultiplied(
            channel(0)?,
            channel(2)?,
            channel(4)?,
            channel(6)?,
        )),
        _ => Err(format!("invalid hex color '{}': expected 6 or 8 hex digits", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        day(2024, 6, 1)
    }

    #[test]
    fn record_aliases_match_api_field_names() {
        let json = r##"{
            "_id": 42,
            "taskName": "Write docs",
            "createdAt": "2024-01-01T09:30:00Z",
            "dueDate": "2024-01-04",
            "status": "In Progress",
            "color": "#3366cc",
            "parentId": "7"
        }"##;
        let record: TaskRecord = serde_json::from_str(json).unwrap();
        let mut report = ConversionLog::default();
        let task = record
            .into_task(today(), FallbackPolicy::Substitute, &mut report)
            .unwrap();

        assert_eq!(task.id, "42");
        assert_eq!(task.name, "Write docs");
        assert_eq!(task.start, day(2024, 1, 1));
        assert_eq!(task.end, day(2024, 1, 4));
        assert_eq!(task.color, Some(Color32::from_rgb(0x33, 0x66, 0xcc)));
        assert_eq!(task.parent_id.as_deref(), Some("7"));
        assert!(report.is_clean());
    }

    #[test]
    fn inverted_record_normalizes_to_zero_duration() {
        let record = TaskRecord {
            id: Some("a".into()),
            name: "Backwards".into(),
            start: "2024-01-10".into(),
            end: "2024-01-02".into(),
            ..Default::default()
        };
        let mut report = ConversionLog::default();
        let task = record
            .into_task(today(), FallbackPolicy::Substitute, &mut report)
            .unwrap();
        assert_eq!(task.start, task.end);
        assert!(task.date_fallback.is_none());
    }

    #[test]
    fn missing_dates_are_substituted_and_reported() {
        let record = TaskRecord {
            id: Some("a".into()),
            name: "Undated".into(),
            ..Default::default()
        };
        let mut report = ConversionLog::default();
        let task = record
            .into_task(today(), FallbackPolicy::Substitute, &mut report)
            .unwrap();
        assert_eq!(task.start, today());
        assert_eq!(task.end, day(2024, 6, 7));
        assert!(task.date_fallback.is_some());
        assert_eq!(report.fallbacks.len(), 1);
        assert_eq!(report.fallbacks[0].task_id, "a");
    }

    #[test]
    fn drop_policy_skips_record_but_keeps_good_siblings() {
        let json = r#"{
            "id": "p", "name": "Parent", "start": "2024-01-01", "end": "2024-01-05",
            "subtasks": [
                {"id": "c1", "name": "Good", "start": "2024-01-02", "end": "2024-01-03"},
                {"id": "c2", "name": "Bad", "start": "whenever", "end": "2024-01-03"}
            ]
        }"#;
        let record: TaskRecord = serde_json::from_str(json).unwrap();
        let mut report = ConversionLog::default();
        let task = record
            .into_task(today(), FallbackPolicy::Drop, &mut report)
            .unwrap();
        assert_eq!(task.subtasks.len(), 1);
        assert_eq!(task.subtasks[0].id, "c1");
        assert_eq!(task.subtasks[0].parent_id.as_deref(), Some("p"));
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].label, "Bad");
    }

    #[test]
    fn blank_ids_get_generated() {
        let record = TaskRecord {
            id: Some("  ".into()),
            start: "2024-01-01".into(),
            end: "2024-01-01".into(),
            ..Default::default()
        };
        let mut report = ConversionLog::default();
        let task = record
            .into_task(today(), FallbackPolicy::Substitute, &mut report)
            .unwrap();
        assert!(Uuid::parse_str(&task.id).is_ok());
        assert_eq!(task.name, "(untitled)");
    }

    #[test]
    fn invalid_color_is_ignored() {
        let record: TaskRecord =
            serde_json::from_str(r##"{"id": "x", "color": "#12"}"##).unwrap();
        assert_eq!(record.color, None);
    }

    #[test]
    fn hex_colors_need_hex_digits_only() {
        assert_eq!(parse_hex_color("#1a2B3c"), Ok(Color32::from_rgb(0x1a, 0x2b, 0x3c)));
        assert_eq!(
            parse_hex_color("ff000080"),
            Ok(Color32::from_rgba_unmultiplied(0xff, 0, 0, 0x80))
        );
        assert!(parse_hex_color("#+f+f+f").is_err());
        assert!(parse_hex_color("#12 456").is_err());
        assert!(parse_hex_color("#ggggggg").is_err());
    }

    #[test]
    fn spellings_of_one_field_follow_a_fixed_order() {
        let json = r#"{
            "id": "a", "_id": "legacy",
            "taskName": "Old name", "title": "Older name",
            "startDate": "2024-02-01", "createdAt": "2024-01-01",
            "endDate": "soon", "dueDate": "2024-02-09",
            "parentId": "", "parent": "p"
        }"#;
        let record: TaskRecord = serde_json::from_str(json).unwrap();
        let mut report = ConversionLog::default();
        let task = record
            .into_task(today(), FallbackPolicy::Substitute, &mut report)
            .unwrap();
        assert_eq!(task.id, "a");
        assert_eq!(task.name, "Old name");
        assert_eq!(task.start, day(2024, 2, 1));
        assert_eq!(task.end, day(2024, 2, 9));
        assert_eq!(task.parent_id.as_deref(), Some("p"));
        assert!(report.is_clean());
    }

    #[test]
    fn malformed_subtask_is_skipped_alone() {
        let json = r#"{
            "id": "p", "name": "Parent", "start": "2024-01-01", "end": "2024-01-05",
            "subtasks": [
                {"id": "c1", "name": "Good", "start": "2024-01-02", "end": "2024-01-03"},
                {"id": "c2", "name": "Wrong shape", "progress": "lots"},
                ["not", "a", "record"]
            ]
        }"#;
        let record: TaskRecord = serde_json::from_str(json).unwrap();
        let mut report = ConversionLog::default();
        let task = record
            .into_task(today(), FallbackPolicy::Substitute, &mut report)
            .unwrap();
        assert_eq!(task.subtasks.len(), 1);
        let labels: Vec<&str> = report.skipped.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["Wrong shape", "subtask 3 of 'Parent'"]);
    }

    #[test]
    fn progress_is_clamped_or_derived_from_status() {
        let d = day(2024, 1, 1);
        assert_eq!(Task::new("a", "A", d, d).with_progress(150.0).effective_progress(), 100.0);
        assert_eq!(Task::new("a", "A", d, d).with_progress(-5.0).effective_progress(), 0.0);
        assert_eq!(Task::new("a", "A", d, d).with_progress(f32::NAN).effective_progress(), 0.0);
        assert_eq!(Task::new("a", "A", d, d).with_status("in_review").effective_progress(), 75.0);
        assert_eq!(Task::new("a", "A", d, d).effective_progress(), 0.0);
    }

    #[test]
    fn walk_visits_every_task_in_preorder() {
        let d = day(2024, 1, 1);
        let forest = vec![
            Task::new("a", "A", d, d).with_subtasks(vec![
                Task::new("a1", "A1", d, d)
                    .with_subtasks(vec![Task::new("a1x", "A1x", d, d)]),
                Task::new("a2", "A2", d, d),
            ]),
            Task::new("b", "B", d, d),
        ];
        let ids: Vec<&str> = walk(&forest).map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["a", "a1", "a1x", "a2", "b"]);
    }
}
