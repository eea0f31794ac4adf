use chrono::{Days, NaiveDate};

use super::dates::DayRange;
use super::task::{walk, Task};

/// The narrowest window ever shown, in days.
pub const MIN_WINDOW_DAYS: i64 = 7;
pub const DEFAULT_DAY_WIDTH: f32 = 36.0;
pub const MIN_DAY_WIDTH: f32 = 8.0;
pub const MAX_DAY_WIDTH: f32 = 96.0;

/// The visible date range against which all bars are positioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimelineWindow {
    /// Derive the window from an explicit range, or else from every task in
    /// the forest, widened to at least [`MIN_WINDOW_DAYS`].
    pub fn compute(explicit: Option<DayRange>, tasks: &[Task], today: NaiveDate) -> Self {
        let base = explicit.unwrap_or_else(|| {
            let start = walk(tasks).map(|t| t.start).min();
            let end = walk(tasks).map(|t| t.end).max();
            match (start, end) {
                (Some(start), Some(end)) => DayRange::new(start, end),
                _ => DayRange::single(today),
            }
        });
        Self::with_minimum_span(base)
    }

    fn with_minimum_span(range: DayRange) -> Self {
        if range.day_count() >= MIN_WINDOW_DAYS {
            return Self {
                start: range.start(),
                end: range.end(),
            };
        }
        let span = Days::new((MIN_WINDOW_DAYS - 1) as u64);
        match range.start().checked_add_days(span) {
            Some(end) => Self {
                start: range.start(),
                end,
            },
            // Up against the end of the calendar: grow backwards instead.
            None => Self {
                start: range.end().checked_sub_days(span).unwrap_or(range.start()),
                end: range.end(),
            },
        }
    }

    pub fn range(&self) -> DayRange {
        DayRange::new(self.start, self.end)
    }

    /// Inclusive day count.
    pub fn day_count(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Pull a date inward to the nearest window boundary.
    pub fn clamp(&self, day: NaiveDate) -> NaiveDate {
        day.clamp(self.start, self.end)
    }

    /// Whole days from the window start to `day`.
    pub fn offset_of(&self, day: NaiveDate) -> i64 {
        (day - self.start).num_days()
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

/// Controls what granularity the timeline header labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineScale {
    Days,
    Weeks,
    Months,
}

/// Zoom and header scale of the chart. The window itself is recomputed
/// every frame from the task list.
#[derive(Debug, Clone)]
pub struct TimelineViewport {
    pub scale: TimelineScale,
    /// Pixels per day (controls zoom level).
    pub day_width: f32,
}

impl Default for TimelineViewport {
    fn default() -> Self {
        Self::new(DEFAULT_DAY_WIDTH)
    }
}

impl TimelineViewport {
    pub fn new(day_width: f32) -> Self {
        Self {
            scale: TimelineScale::Days,
            day_width: sanitize_day_width(day_width),
        }
    }

    /// Convert a date to an x-pixel offset from the window start.
    pub fn date_to_x(&self, window: &TimelineWindow, date: NaiveDate) -> f32 {
        window.offset_of(date) as f32 * self.day_width
    }

    /// Convert an x-pixel offset back to the date whose column contains it.
    pub fn x_to_date(&self, window: &TimelineWindow, x: f32) -> NaiveDate {
        let days = (x / self.day_width).floor().max(0.0) as u64;
        window
            .start
            .checked_add_days(Days::new(days))
            .map_or(window.end, |d| d.min(window.end))
    }

    /// Total width in pixels for the window.
    pub fn total_width(&self, window: &TimelineWindow) -> f32 {
        window.day_count() as f32 * self.day_width
    }

    pub fn zoom_in(&mut self) {
        self.day_width = (self.day_width * 1.2).min(MAX_DAY_WIDTH);
    }

    pub fn zoom_out(&mut self) {
        self.day_width = (self.day_width / 1.2).max(MIN_DAY_WIDTH);
    }

    pub fn reset_zoom(&mut self) {
        self.day_width = DEFAULT_DAY_WIDTH;
    }
}

/// Bring a configured day width into the supported zoom range.
pub fn sanitize_day_width(width: f32) -> f32 {
    if width.is_finite() {
        width.clamp(MIN_DAY_WIDTH, MAX_DAY_WIDTH)
    } else {
        DEFAULT_DAY_WIDTH
    }
}
