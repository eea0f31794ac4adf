//! Status vocabulary used by the task API, and the colors and progress
//! percentages it maps to.

use egui::Color32;

/// Bar fill plus the darker shade used for the progress portion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPair {
    pub bar: Color32,
    pub progress: Color32,
}

impl ColorPair {
    pub const fn new(bar: Color32, progress: Color32) -> Self {
        Self { bar, progress }
    }

    /// Derive a pair from a single explicit task color.
    pub fn from_base(base: Color32) -> Self {
        let shade = |c: u8| (c as f32 * 0.7).round() as u8;
        Self {
            bar: base,
            progress: Color32::from_rgb(shade(base.r()), shade(base.g()), shade(base.b())),
        }
    }
}

pub const DEFAULT_COLORS: ColorPair = ColorPair::new(
    Color32::from_rgb(156, 163, 175),
    Color32::from_rgb(107, 114, 128),
);

const STATUS_TABLE: &[(&str, u8, ColorPair)] = &[
    (
        "not_started",
        0,
        ColorPair::new(Color32::from_rgb(148, 163, 184), Color32::from_rgb(100, 116, 139)),
    ),
    (
        "pending",
        10,
        ColorPair::new(Color32::from_rgb(245, 158, 11), Color32::from_rgb(180, 83, 9)),
    ),
    (
        "todo",
        20,
        ColorPair::new(Color32::from_rgb(100, 116, 139), Color32::from_rgb(71, 85, 105)),
    ),
    (
        "in_progress",
        50,
        ColorPair::new(Color32::from_rgb(59, 130, 246), Color32::from_rgb(29, 78, 216)),
    ),
    (
        "in_review",
        75,
        ColorPair::new(Color32::from_rgb(168, 85, 247), Color32::from_rgb(126, 34, 206)),
    ),
    (
        "blocked",
        30,
        ColorPair::new(Color32::from_rgb(239, 68, 68), Color32::from_rgb(185, 28, 28)),
    ),
    (
        "completed",
        100,
        ColorPair::new(Color32::from_rgb(34, 197, 94), Color32::from_rgb(21, 128, 61)),
    ),
    (
        "done",
        100,
        ColorPair::new(Color32::from_rgb(34, 197, 94), Color32::from_rgb(21, 128, 61)),
    ),
    (
        "closed",
        100,
        ColorPair::new(Color32::from_rgb(16, 185, 129), Color32::from_rgb(4, 120, 87)),
    ),
];

/// Canonical key for a free-text status: lowercase, words joined by `_`.
pub fn normalize_status(status: &str) -> String {
    status
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

fn lookup(status: &str) -> Option<&'static (&'static str, u8, ColorPair)> {
    let key = normalize_status(status);
    STATUS_TABLE.iter().find(|(name, _, _)| *name == key)
}

/// Progress percentage implied by a status. Unknown statuses imply 0.
pub fn status_progress(status: &str) -> u8 {
    lookup(status).map(|(_, pct, _)| *pct).unwrap_or(0)
}

/// Bar colors for a status. Unknown statuses get the default gray pair.
pub fn status_colors(status: &str) -> ColorPair {
    lookup(status)
        .map(|(_, _, colors)| *colors)
        .unwrap_or(DEFAULT_COLORS)
}

/// Human label for a status key, e.g. `in_progress` -> `In progress`.
pub fn status_label(status: &str) -> String {
    let key = normalize_status(status);
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>().replace('_', " "),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_whitespace_and_separators() {
        assert_eq!(normalize_status("  In Progress "), "in_progress");
        assert_eq!(normalize_status("IN-REVIEW"), "in_review");
        assert_eq!(normalize_status("not__started"), "not_started");
    }

    #[test]
    fn vocabulary_maps_to_fixed_percentages() {
        let expected = [
            ("not_started", 0),
            ("pending", 10),
            ("todo", 20),
            ("in_progress", 50),
            ("in_review", 75),
            ("blocked", 30),
            ("completed", 100),
            ("done", 100),
            ("closed", 100),
        ];
        for (status, pct) in expected {
            assert_eq!(status_progress(status), pct, "{status}");
        }
        assert_eq!(status_progress("archived"), 0);
    }

    #[test]
    fn unknown_status_is_default_gray() {
        assert_eq!(status_colors("archived"), DEFAULT_COLORS);
        assert_eq!(status_colors(""), DEFAULT_COLORS);
        assert_ne!(status_colors("Blocked"), DEFAULT_COLORS);
    }

    #[test]
    fn explicit_color_gets_darker_progress_shade() {
        let pair = ColorPair::from_base(Color32::from_rgb(100, 200, 50));
        assert_eq!(pair.bar, Color32::from_rgb(100, 200, 50));
        assert_eq!(pair.progress, Color32::from_rgb(70, 140, 35));
    }

    #[test]
    fn labels_read_naturally() {
        assert_eq!(status_label("IN_PROGRESS"), "In progress");
        assert_eq!(status_label(""), "");
    }
}
