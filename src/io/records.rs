//! Task lists as delivered by the task API, read from a saved JSON response.

use std::path::Path;

use chrono::NaiveDate;
use serde_json::Value;

use super::LoadReport;
use crate::error::{Error, Result};
use crate::model::task::{ConversionLog, TaskRecord};
use crate::model::tree::build_forest;
use crate::model::FallbackPolicy;

/// Load tasks from a JSON file.
pub fn load_tasks(path: &Path, today: NaiveDate, policy: FallbackPolicy) -> Result<LoadReport> {
    let json = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let report = parse_tasks(&json, today, policy)?;
    log::info!("{} from {}", report.summary(), path.display());
    Ok(report)
}

/// Parse a bare array of records, or an envelope `{"data": [...]}` / `{"tasks": [...]}`.
pub fn parse_tasks(json: &str, today: NaiveDate, policy: FallbackPolicy) -> Result<LoadReport> {
    let value: Value = serde_json::from_str(json)?;
    let list = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data").or_else(|| map.remove("tasks")) {
            Some(Value::Array(items)) => items,
            _ => return Err(Error::NoTaskList),
        },
        _ => return Err(Error::NoTaskList),
    };

    // Records are read one at a time; a malformed one is skipped, not fatal.
    let mut conversion = ConversionLog::default();
    let records: Vec<TaskRecord> = list
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| TaskRecord::from_value(item, &format!("record {}", i + 1), &mut conversion))
        .collect();
    convert_records(records, today, policy, conversion)
}

/// Normalize records and assemble them into a forest. `conversion` may
/// already hold records skipped while reading.
pub(crate) fn convert_records(
    records: Vec<TaskRecord>,
    today: NaiveDate,
    policy: FallbackPolicy,
    mut conversion: ConversionLog,
) -> Result<LoadReport> {
    let tasks: Vec<_> = records
        .into_iter()
        .filter_map(|record| record.into_task(today, policy, &mut conversion))
        .collect();

    if tasks.is_empty() && !conversion.skipped.is_empty() {
        return Err(Error::Empty {
            skipped: conversion.skipped.len(),
        });
    }

    let (tasks, orphans) = build_forest(tasks);
    Ok(LoadReport {
        tasks,
        conversion,
        orphans,
    })
}
