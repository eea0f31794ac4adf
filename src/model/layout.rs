//! Projects tasks onto the timeline: clamped dates, pixel geometry, colors
//! and progress for every bar, plus the today marker.

use chrono::NaiveDate;

use super::dates::FallbackReason;
use super::status::ColorPair;
use super::task::Task;
use super::timeline::TimelineWindow;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("task '{id}' ends ({end}) before it starts ({start})")]
    InvertedRange {
        id: String,
        start: NaiveDate,
        end: NaiveDate,
    },
    #[error("day width must be a positive number, got {0}")]
    InvalidDayWidth(f32),
}

/// Geometry and styling of one task bar.
#[derive(Debug, Clone, PartialEq)]
pub struct BarLayout {
    /// Index of the row (in the order the tasks were given) this bar belongs to.
    pub row: usize,
    pub task_id: String,
    pub clamped_start: NaiveDate,
    pub clamped_end: NaiveDate,
    /// The task starts before the window and was pulled in.
    pub cut_left: bool,
    /// The task ends after the window and was pulled in.
    pub cut_right: bool,
    pub offset_days: i64,
    pub duration_days: i64,
    pub left: f32,
    pub width: f32,
    pub progress_percent: u8,
    /// `progress_percent / 100`, for the bar fill.
    pub progress_fraction: f32,
    pub colors: ColorPair,
    pub fallback: Option<FallbackReason>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TodayMarker {
    pub offset_days: i64,
    /// Centre of today's column.
    pub x: f32,
}

/// A task left out of the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedTask {
    pub row: usize,
    pub task_id: String,
    pub error: LayoutError,
}

/// Everything the chart needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineLayout {
    pub window: TimelineWindow,
    pub day_width: f32,
    pub bars: Vec<BarLayout>,
    pub dropped: Vec<DroppedTask>,
    pub today: Option<TodayMarker>,
}

/// The percentage shown to the user: `round(clamp(progress, 0, 100))`.
pub fn display_percent(progress: f32) -> u8 {
    if progress.is_finite() {
        progress.clamp(0.0, 100.0).round() as u8
    } else {
        0
    }
}

/// Lay out a single task against the window.
pub fn project_task(
    task: &Task,
    window: &TimelineWindow,
    day_width: f32,
    row: usize,
) -> Result<BarLayout, LayoutError> {
    if !(day_width.is_finite() && day_width > 0.0) {
        return Err(LayoutError::InvalidDayWidth(day_width));
    }
    if task.end < task.start {
        return Err(LayoutError::InvertedRange {
            id: task.id.clone(),
            start: task.start,
            end: task.end,
        });
    }

    let clamped_start = window.clamp(task.start);
    let clamped_end = window.clamp(task.end);
    let offset_days = window.offset_of(clamped_start);
    let duration_days = ((clamped_end - clamped_start).num_days() + 1).max(1);
    let progress_percent = display_percent(task.effective_progress());

    Ok(BarLayout {
        row,
        task_id: task.id.clone(),
        clamped_start,
        clamped_end,
        cut_left: task.start < window.start,
        cut_right: task.end > window.end,
        offset_days,
        duration_days,
        left: offset_days as f32 * day_width,
        width: duration_days as f32 * day_width,
        progress_percent,
        progress_fraction: progress_percent as f32 / 100.0,
        colors: task.colors(),
        fallback: task.date_fallback.clone(),
    })
}

/// Today's column, if it falls inside the window.
pub fn today_marker(window: &TimelineWindow, day_width: f32, today: NaiveDate) -> Option<TodayMarker> {
    window.contains(today).then(|| {
        let offset_days = window.offset_of(today);
        TodayMarker {
            offset_days,
            x: (offset_days as f32 + 0.5) * day_width,
        }
    })
}

/// Lay out every task, one row each. A task that cannot be projected is
/// logged and left out; the rest are still laid out.
pub fn project_tasks<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
    window: TimelineWindow,
    day_width: f32,
    today: NaiveDate,
) -> TimelineLayout {
    let mut bars = Vec::new();
    let mut dropped = Vec::new();

    for (row, task) in tasks.into_iter().enumerate() {
        match project_task(task, &window, day_width, row) {
            Ok(bar) => bars.push(bar),
            Err(error) => {
                log::warn!("Leaving task '{}' off the timeline: {}", task.name, error);
                dropped.push(DroppedTask {
                    row,
                    task_id: task.id.clone(),
                    error,
                });
            }
        }
    }

    TimelineLayout {
        window,
        day_width,
        bars,
        dropped,
        today: today_marker(&window, day_width, today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::status::{status_colors, DEFAULT_COLORS};
    use egui::Color32;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn window(start: NaiveDate, end: NaiveDate) -> TimelineWindow {
        TimelineWindow { start, end }
    }

    #[test]
    fn bar_geometry_follows_day_width() {
        let w = window(day(2024, 1, 1), day(2024, 1, 14));
        let task = Task::new("a", "A", day(2024, 1, 3), day(2024, 1, 5));
        let bar = project_task(&task, &w, 36.0, 0).unwrap();
        assert_eq!(bar.offset_days, 2);
        assert_eq!(bar.duration_days, 3);
        assert_eq!(bar.left, 72.0);
        assert_eq!(bar.width, 108.0);
        assert!(!bar.cut_left && !bar.cut_right);
    }

    #[test]
    fn single_day_task_is_one_column_wide() {
        let w = window(day(2024, 1, 1), day(2024, 1, 7));
        let task = Task::new("a", "A", day(2024, 1, 7), day(2024, 1, 7));
        let bar = project_task(&task, &w, 20.0, 0).unwrap();
        assert_eq!(bar.offset_days, 6);
        assert_eq!(bar.duration_days, 1);
        assert_eq!(bar.width, 20.0);
    }

    #[test]
    fn tasks_outside_the_window_are_pulled_to_its_edges() {
        let w = window(day(2024, 1, 10), day(2024, 1, 20));

        let before = Task::new("b", "B", day(2023, 12, 1), day(2023, 12, 5));
        let bar = project_task(&before, &w, 10.0, 0).unwrap();
        assert_eq!(bar.clamped_start, w.start);
        assert_eq!(bar.clamped_end, w.start);
        assert_eq!((bar.offset_days, bar.duration_days), (0, 1));

        let straddling = Task::new("s", "S", day(2024, 1, 15), day(2024, 2, 15));
        let bar = project_task(&straddling, &w, 10.0, 1).unwrap();
        assert_eq!(bar.clamped_end, w.end);
        assert_eq!((bar.offset_days, bar.duration_days), (5, 6));
        assert!(bar.cut_right && !bar.cut_left);
    }

    #[test]
    fn bars_always_fit_inside_the_window() {
        let w = window(day(2024, 1, 10), day(2024, 1, 20));
        let span = w.day_count();
        let starts = [day(2023, 12, 1), day(2024, 1, 10), day(2024, 1, 15), day(2024, 1, 20), day(2024, 3, 1)];
        for start in starts {
            for len in [0u64, 1, 5, 40] {
                let end = start + chrono::Days::new(len);
                let bar = project_task(&Task::new("t", "T", start, end), &w, 36.0, 0).unwrap();
                assert!(bar.offset_days >= 0);
                assert!(bar.offset_days + bar.duration_days <= span, "{start} +{len}");
            }
        }
    }

    #[test]
    fn progress_is_clamped_and_rounded_for_display() {
        let w = window(day(2024, 1, 1), day(2024, 1, 7));
        let d = day(2024, 1, 2);
        let over = project_task(&Task::new("a", "A", d, d).with_progress(150.0), &w, 36.0, 0).unwrap();
        let under = project_task(&Task::new("b", "B", d, d).with_progress(-5.0), &w, 36.0, 0).unwrap();
        let part = project_task(&Task::new("c", "C", d, d).with_progress(33.6), &w, 36.0, 0).unwrap();
        assert_eq!(over.progress_percent, 100);
        assert_eq!(under.progress_percent, 0);
        assert_eq!(part.progress_percent, 34);
        assert_eq!(part.progress_fraction, 0.34);
        assert_eq!(display_percent(f32::INFINITY), 0);
    }

    #[test]
    fn explicit_color_overrides_status() {
        let w = window(day(2024, 1, 1), day(2024, 1, 7));
        let d = day(2024, 1, 2);
        let mut task = Task::new("a", "A", d, d).with_status("blocked");
        assert_eq!(project_task(&task, &w, 36.0, 0).unwrap().colors, status_colors("blocked"));

        task.color = Some(Color32::from_rgb(10, 20, 30));
        assert_eq!(project_task(&task, &w, 36.0, 0).unwrap().colors.bar, Color32::from_rgb(10, 20, 30));

        let unknown = Task::new("u", "U", d, d).with_status("archived");
        assert_eq!(project_task(&unknown, &w, 36.0, 0).unwrap().colors, DEFAULT_COLORS);
    }

    #[test]
    fn today_marker_only_inside_the_window() {
        let w = window(day(2024, 1, 1), day(2024, 1, 7));
        let marker = today_marker(&w, 36.0, day(2024, 1, 3)).unwrap();
        assert_eq!(marker.offset_days, 2);
        assert_eq!(marker.x, 90.0);
        assert!(today_marker(&w, 36.0, day(2024, 1, 8)).is_none());
        assert!(today_marker(&w, 36.0, day(2023, 12, 31)).is_none());
    }

    #[test]
    fn broken_task_is_dropped_and_the_rest_render() {
        let w = window(day(2024, 1, 1), day(2024, 1, 7));
        let good = Task::new("g", "Good", day(2024, 1, 2), day(2024, 1, 3));
        let mut broken = Task::new("b", "Broken", day(2024, 1, 5), day(2024, 1, 5));
        broken.end = day(2024, 1, 1);
        let tail = Task::new("t", "Tail", day(2024, 1, 4), day(2024, 1, 6));

        let layout = project_tasks([&good, &broken, &tail], w, 36.0, day(2024, 1, 2));
        assert_eq!(layout.bars.len(), 2);
        assert_eq!(layout.dropped.len(), 1);
        assert_eq!(layout.dropped[0].row, 1);
        assert!(matches!(layout.dropped[0].error, LayoutError::InvertedRange { .. }));
        let rows: Vec<(usize, &str)> = layout.bars.iter().map(|b| (b.row, b.task_id.as_str())).collect();
        assert_eq!(rows, [(0, "g"), (2, "t")]);
        assert!(layout.today.is_some());
    }

    #[test]
    fn zero_day_width_drops_everything() {
        let w = window(day(2024, 1, 1), day(2024, 1, 7));
        let task = Task::new("a", "A", day(2024, 1, 2), day(2024, 1, 3));
        let layout = project_tasks([&task], w, 0.0, day(2024, 1, 2));
        assert!(layout.bars.is_empty());
        assert_eq!(layout.dropped[0].error, LayoutError::InvalidDayWidth(0.0));
    }
}
