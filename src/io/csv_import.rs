use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;

use super::records::convert_records;
use super::LoadReport;
use crate::error::{Error, Result};
use crate::model::dates::DateInput;
use crate::model::task::{parse_hex_color, ConversionLog, TaskRecord};
use crate::model::FallbackPolicy;

/// Columns we know how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Name,
    Start,
    End,
    Status,
    Progress,
    Id,
    Parent,
    Color,
}

/// Detect delimiter by checking the first line for common separators.
fn detect_delimiter(first_line: &str) -> u8 {
    let semicolons = first_line.matches(';').count();
    let commas = first_line.matches(',').count();
    let tabs = first_line.matches('\t').count();

    if semicolons >= commas && semicolons >= tabs {
        b';'
    } else if tabs >= commas {
        b'\t'
    } else {
        b','
    }
}

/// Normalize a header string to a canonical column key.
fn normalize_header(h: &str) -> String {
    h.trim().to_lowercase().replace([' ', '-', '_'], "")
}

fn header_to_column(normalized: &str) -> Option<Column> {
    match normalized {
        "name" | "task" | "tasklabel" | "taskname" | "label" | "title" | "activity" => {
            Some(Column::Name)
        }
        "start" | "startdate" | "from" | "begin" | "begindate" | "createdat" => Some(Column::Start),
        "end" | "enddate" | "to" | "finish" | "finishdate" | "due" | "duedate" => Some(Column::End),
        "status" | "state" | "stage" => Some(Column::Status),
        "progress" | "percent" | "percentcomplete" | "complete" | "done" => Some(Column::Progress),
        "id" | "taskid" | "key" => Some(Column::Id),
        "parent" | "parentid" | "parenttask" | "parentname" | "subtaskof" => Some(Column::Parent),
        "color" | "colour" => Some(Column::Color),
        _ => None,
    }
}

/// Import tasks from a CSV file.
pub fn import_csv(path: &Path, today: NaiveDate, policy: FallbackPolicy) -> Result<LoadReport> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let report = parse_csv(&content, today, policy)?;
    log::info!("{} from {}", report.summary(), path.display());
    Ok(report)
}

/// Parse CSV text into tasks.
///
/// Auto-detects the delimiter (comma, semicolon, tab) and matches headers
/// flexibly ("Task Label", "Start Date", ...). The parent column may hold
/// either a task id or a task name.
pub fn parse_csv(content: &str, today: NaiveDate, policy: FallbackPolicy) -> Result<LoadReport> {
    let first_line = content.lines().next().unwrap_or("");
    let delimiter = detect_delimiter(first_line);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let columns: Vec<Option<Column>> = headers
        .iter()
        .map(|h| header_to_column(&normalize_header(h)))
        .collect();

    let has = |c: Column| columns.contains(&Some(c));
    if !(has(Column::Name) && has(Column::Start) && has(Column::End)) {
        return Err(Error::MissingColumns {
            found: headers.iter().map(str::to_string).collect(),
        });
    }

    let mut records = Vec::new();
    let mut unreadable = Vec::new();

    for (i, result) in reader.records().enumerate() {
        let row = i + 2;
        let fields = match result {
            Ok(r) => r,
            Err(e) => {
                unreadable.push((format!("row {}", row), e.to_string()));
                continue;
            }
        };

        let mut record = TaskRecord::default();
        for (field, column) in fields.iter().zip(&columns) {
            let value = || Some(field.to_string()).filter(|v| !v.is_empty());
            match column {
                Some(Column::Name) => record.name = field.to_string(),
                Some(Column::Start) => record.start = DateInput::from(value()),
                Some(Column::End) => record.end = DateInput::from(value()),
                Some(Column::Status) => record.status = value(),
                Some(Column::Progress) => record.progress = parse_progress(field),
                Some(Column::Id) => record.id = value(),
                Some(Column::Parent) => record.parent_id = value(),
                Some(Column::Color) => record.color = parse_hex_color(field).ok(),
                None => {}
            }
        }

        if record.name.is_empty() {
            unreadable.push((format!("row {}", row), "no task name".to_string()));
            continue;
        }
        records.push(record);
    }

    resolve_parent_names(&mut records);

    let unreadable_count = unreadable.len();
    let mut report = match convert_records(records, today, policy, ConversionLog::default()) {
        Err(Error::Empty { skipped }) => {
            return Err(Error::Empty {
                skipped: skipped + unreadable_count,
            })
        }
        other => other?,
    };
    if report.tasks.is_empty() && unreadable_count > 0 {
        return Err(Error::Empty {
            skipped: unreadable_count,
        });
    }
    for (label, reason) in unreadable {
        report.conversion.skip(label, reason);
    }
    Ok(report)
}

/// Accept `40`, `40%` or `0.4` style progress values.
fn parse_progress(field: &str) -> Option<f32> {
    let value: f32 = field.trim_end_matches('%').trim().parse().ok()?;
    if !field.ends_with('%') && value > 0.0 && value <= 1.0 && field.contains('.') {
        Some(value * 100.0)
    } else {
        Some(value)
    }
}

/// Rows without an id get one, and parent names are rewritten to those ids.
/// Parents that match neither an id nor a name are left for orphan handling.
fn resolve_parent_names(records: &mut [TaskRecord]) {
    for record in records.iter_mut() {
        if record.id.is_none() {
            record.id = Some(uuid::Uuid::new_v4().to_string());
        }
    }

    let ids: Vec<String> = records.iter().filter_map(|r| r.id.clone()).collect();
    let name_to_id: HashMap<String, String> = records
        .iter()
        .filter_map(|r| Some((r.name.to_lowercase(), r.id.clone()?)))
        .collect();

    for record in records.iter_mut() {
        let Some(parent) = record.parent_id.as_deref() else {
            continue;
        };
        if ids.iter().any(|id| id == parent) {
            continue;
        }
        if let Some(id) = name_to_id.get(&parent.to_lowercase()) {
            record.parent_id = Some(id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn detects_delimiters() {
        assert_eq!(detect_delimiter("a;b;c"), b';');
        assert_eq!(detect_delimiter("a\tb\tc"), b'\t');
        assert_eq!(detect_delimiter("a,b,c"), b',');
    }

    #[test]
    fn reads_semicolon_export_with_parents_by_name() {
        let csv = "Task Label;Start Date;End Date;Status;Parent\n\
                   Planning;01/01/2024;10/01/2024;In Progress;\n\
                   Kickoff;01/01/2024;02/01/2024;Done;planning\n\
                   Launch;15/01/2024;15/01/2024;Todo;\n";
        let report = parse_csv(csv, today(), FallbackPolicy::Substitute).unwrap();
        assert_eq!(report.tasks.len(), 2);
        let planning = &report.tasks[0];
        assert_eq!(planning.name, "Planning");
        assert_eq!(planning.end, day(1, 10));
        assert_eq!(planning.subtasks[0].name, "Kickoff");
        assert_eq!(planning.subtasks[0].effective_progress(), 100.0);
        assert!(report.orphans.is_empty());
    }

    #[test]
    fn reads_comma_export_with_ids_progress_and_color() {
        let csv = "id,name,start,end,progress,parent,color\n\
                   t1,Root,2024-02-01,2024-02-05,25%,,#ff0000\n\
                   t2,Child,2024-02-02,2024-02-03,0.5,t1,\n\
                   t3,Stray,2024-02-02,2024-02-03,10,t9,\n";
        let report = parse_csv(csv, today(), FallbackPolicy::Substitute).unwrap();
        let root = &report.tasks[0];
        assert_eq!(root.id, "t1");
        assert_eq!(root.progress, Some(25.0));
        assert_eq!(root.color, Some(egui::Color32::from_rgb(255, 0, 0)));
        assert_eq!(root.subtasks[0].progress, Some(50.0));
        assert_eq!(report.tasks[1].id, "t3");
        assert_eq!(report.orphans.len(), 1);
    }

    #[test]
    fn missing_required_columns_is_an_error() {
        let err = parse_csv("name;start\nA;2024-01-01\n", today(), FallbackPolicy::Substitute)
            .unwrap_err();
        assert!(matches!(err, Error::MissingColumns { found } if found == ["name", "start"]));
    }

    #[test]
    fn nameless_rows_are_skipped_and_reported() {
        let csv = "name,start,end\n,2024-01-01,2024-01-02\nReal,2024-01-01,2024-01-02\n";
        let report = parse_csv(csv, today(), FallbackPolicy::Substitute).unwrap();
        assert_eq!(report.tasks.len(), 1);
        assert_eq!(report.conversion.skipped.len(), 1);
        assert_eq!(report.conversion.skipped[0].label, "row 2");
    }

    #[test]
    fn only_bad_rows_is_an_error() {
        let csv = "name,start,end\nA,bad,bad\n,2024-01-01,2024-01-02\n";
        let err = parse_csv(csv, today(), FallbackPolicy::Drop).unwrap_err();
        assert!(matches!(err, Error::Empty { skipped: 2 }));
    }

    #[test]
    fn progress_formats() {
        assert_eq!(parse_progress("40"), Some(40.0));
        assert_eq!(parse_progress("40%"), Some(40.0));
        assert_eq!(parse_progress("0.4"), Some(40.0));
        assert_eq!(parse_progress("1"), Some(1.0));
        assert_eq!(parse_progress("n/a"), None);
    }

    #[test]
    fn imports_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("tasks.csv");
        std::fs::write(&path, "name,start,end\nA,2024-01-01,2024-01-02\n").unwrap();
        let report = import_csv(&path, today(), FallbackPolicy::Substitute).unwrap();
        assert_eq!(report.task_count(), 1);
    }
}
