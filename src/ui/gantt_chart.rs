use crate::model::layout::{BarLayout, TodayMarker};
use crate::model::status::status_label;
use crate::model::{Row, TimelineLayout, TimelineScale, TimelineViewport, TimelineWindow};
use crate::ui::theme;
use chrono::{Datelike, NaiveDate};
use egui::{Color32, Pos2, Rect, Rounding, Sense, Stroke, Ui, Vec2};

const ROW_HEIGHT: f32 = theme::ROW_HEIGHT;
const ROW_PADDING: f32 = theme::ROW_GAP;
const HEADER_HEIGHT: f32 = theme::HEADER_HEIGHT;

/// What the user did in the chart this frame.
#[derive(Debug, Clone, Default)]
pub struct ChartInteraction {
    pub focus: Option<String>,
    /// Ctrl+click adds the task to the checked rows.
    pub select: Option<String>,
    pub clear_focus: bool,
    pub toggle_expand: Option<String>,
    pub zoom_changed: bool,
}

/// Render the Gantt chart area (right panel).
pub fn show_gantt_chart(
    rows: &[Row<'_>],
    layout: &TimelineLayout,
    viewport: &mut TimelineViewport,
    focused: Option<&str>,
    show_today: bool,
    ui: &mut Ui,
) -> ChartInteraction {
    let mut interaction = ChartInteraction::default();
    let available = ui.available_size();
    let chart_width = viewport.total_width(&layout.window).max(available.x);
    let chart_height = HEADER_HEIGHT + (rows.len() as f32 * (ROW_HEIGHT + ROW_PADDING)) + 40.0;

    let scroll_delta = ui.input(|i| i.smooth_scroll_delta);
    let zoom_requested = ui.rect_contains_pointer(ui.max_rect()) && ui.input(|i| i.modifiers.ctrl);

    egui::ScrollArea::both()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            let canvas_height = chart_height.max(available.y);
            let (response, painter) =
                ui.allocate_painter(Vec2::new(chart_width, canvas_height), Sense::click());
            let origin = response.rect.min;
            let mut consumed_click = false;

            painter.rect_filled(response.rect, 0.0, theme::BG_DARK);

            // Alternating row backgrounds
            for i in 0..rows.len() {
                let y = row_top(origin, i);
                let row_bg = if i % 2 == 0 { theme::BG_PANEL } else { theme::BG_DARK };
                painter.rect_filled(
                    Rect::from_min_size(
                        Pos2::new(origin.x, y),
                        Vec2::new(chart_width, ROW_HEIGHT + ROW_PADDING),
                    ),
                    0.0,
                    row_bg,
                );
                painter.line_segment(
                    [
                        Pos2::new(origin.x, y + ROW_HEIGHT + ROW_PADDING),
                        Pos2::new(origin.x + chart_width, y + ROW_HEIGHT + ROW_PADDING),
                    ],
                    Stroke::new(0.5, theme::BORDER_SUBTLE),
                );
            }

            draw_timeline_grid(&painter, origin, &layout.window, viewport, canvas_height);
            draw_timeline_header(&painter, origin, &layout.window, viewport, chart_width);

            if show_today {
                if let Some(marker) = layout.today {
                    draw_today_line(&painter, origin, marker, canvas_height);
                }
            }

            if rows.is_empty() {
                painter.text(
                    Pos2::new(
                        origin.x + available.x / 2.0,
                        origin.y + HEADER_HEIGHT + 60.0,
                    ),
                    egui::Align2::CENTER_CENTER,
                    "No tasks to display. Open a task list from the File menu.",
                    theme::font_header(),
                    theme::TEXT_DIM,
                );
            }

            for bar in &layout.bars {
                let Some(row) = rows.get(bar.row) else {
                    continue;
                };
                let task = row.task;
                let is_focused = focused == Some(task.id.as_str());
                let bar_rect = draw_task_bar(&painter, origin, bar, &task.name, is_focused);

                let bar_response = ui.interact(
                    bar_rect,
                    ui.make_persistent_id(("task-bar", task.id.as_str())),
                    Sense::click(),
                );
                if bar_response.double_clicked() && row.has_children {
                    interaction.toggle_expand = Some(task.id.clone());
                    consumed_click = true;
                } else if bar_response.clicked() && ui.input(|i| i.modifiers.command) {
                    interaction.select = Some(task.id.clone());
                    consumed_click = true;
                } else if bar_response.clicked() {
                    interaction.focus = Some(task.id.clone());
                    consumed_click = true;
                }
                if bar_response.hovered() {
                    ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
                }
                bar_response.on_hover_ui(|ui| {
                    ui.strong(&task.name);
                    ui.label(format!(
                        "{} → {}",
                        task.start.format("%d/%m/%Y"),
                        task.end.format("%d/%m/%Y"),
                    ));
                    if let Some(status) = &task.status {
                        ui.label(format!("Status: {}", status_label(status)));
                    }
                    ui.label(format!("Progress: {}%", bar.progress_percent));
                    if let Some(reason) = &bar.fallback {
                        ui.colored_label(theme::WARNING, format!("Dates substituted: {}", reason));
                    }
                });
            }

            for dropped in &layout.dropped {
                let y = row_top(origin, dropped.row) + ROW_HEIGHT / 2.0;
                painter.text(
                    Pos2::new(origin.x + 8.0, y),
                    egui::Align2::LEFT_CENTER,
                    format!("{}  {}", egui_phosphor::regular::WARNING, dropped.error),
                    theme::font_small(),
                    theme::WARNING,
                );
            }

            if let Some(pos) = response.hover_pos() {
                if pos.y < origin.y + HEADER_HEIGHT {
                    let date = viewport.x_to_date(&layout.window, pos.x - origin.x);
                    response.clone().on_hover_text(date.format("%A %d %B %Y").to_string());
                }
            }

            // Empty click on background clears focus
            if response.clicked() && !consumed_click {
                interaction.clear_focus = true;
            }
        });

    // Zoom with Ctrl+scroll; the layout picks up the new width next frame.
    if zoom_requested {
        if scroll_delta.y > 0.0 {
            viewport.zoom_in();
            interaction.zoom_changed = true;
        } else if scroll_delta.y < 0.0 {
            viewport.zoom_out();
            interaction.zoom_changed = true;
        }
    }

    interaction
}

fn row_top(origin: Pos2, row: usize) -> f32 {
    origin.y + HEADER_HEIGHT + row as f32 * (ROW_HEIGHT + ROW_PADDING)
}

/// Vertical grid lines and weekend shading below the header.
fn draw_timeline_grid(
    painter: &egui::Painter,
    origin: Pos2,
    window: &TimelineWindow,
    viewport: &TimelineViewport,
    height: f32,
) {
    let top = origin.y + HEADER_HEIGHT;
    let bottom = origin.y + height;
    for date in window.days() {
        let x = origin.x + viewport.date_to_x(window, date);
        let is_weekend = date.weekday().num_days_from_monday() >= 5;
        if is_weekend && viewport.scale == TimelineScale::Days {
            painter.rect_filled(
                Rect::from_min_max(Pos2::new(x, top), Pos2::new(x + viewport.day_width, bottom)),
                0.0,
                theme::BG_WEEKEND,
            );
        }
        let boundary = match viewport.scale {
            TimelineScale::Days => true,
            TimelineScale::Weeks => date.weekday().num_days_from_monday() == 0,
            TimelineScale::Months => date.day() == 1,
        };
        if boundary {
            painter.line_segment(
                [Pos2::new(x, top), Pos2::new(x, bottom)],
                Stroke::new(0.5, theme::GRID_LINE),
            );
        }
    }
}

fn draw_timeline_header(
    painter: &egui::Painter,
    origin: Pos2,
    window: &TimelineWindow,
    viewport: &TimelineViewport,
    width: f32,
) {
    painter.rect_filled(
        Rect::from_min_size(origin, Vec2::new(width, HEADER_HEIGHT)),
        0.0,
        theme::BG_HEADER,
    );
    painter.line_segment(
        [
            Pos2::new(origin.x, origin.y + HEADER_HEIGHT),
            Pos2::new(origin.x + width, origin.y + HEADER_HEIGHT),
        ],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );

    let month_label = |date: NaiveDate, x: f32| {
        painter.text(
            Pos2::new(x + 3.0, origin.y + 12.0),
            egui::Align2::LEFT_CENTER,
            date.format("%b %Y").to_string(),
            theme::font_header(),
            theme::TEXT_PRIMARY,
        );
    };

    // The first column always carries its month so the axis is never unlabelled.
    month_label(window.start, origin.x);

    for date in window.days() {
        let x = origin.x + viewport.date_to_x(window, date);
        if date.day() == 1 && date != window.start {
            month_label(date, x);
        }

        match viewport.scale {
            TimelineScale::Days => {
                if viewport.day_width >= 20.0 {
                    let is_weekend = date.weekday().num_days_from_monday() >= 5;
                    let day_color = if is_weekend {
                        theme::TEXT_DIM
                    } else {
                        theme::TEXT_SECONDARY
                    };
                    painter.text(
                        Pos2::new(x + viewport.day_width / 2.0, origin.y + 30.0),
                        egui::Align2::CENTER_CENTER,
                        date.format("%d").to_string(),
                        theme::font_sub(),
                        day_color,
                    );
                }
            }
            TimelineScale::Weeks => {
                if date.weekday().num_days_from_monday() == 0 {
                    painter.text(
                        Pos2::new(x + 3.0, origin.y + 30.0),
                        egui::Align2::LEFT_CENTER,
                        date.format("W%V").to_string(),
                        theme::font_sub(),
                        theme::TEXT_SECONDARY,
                    );
                }
            }
            TimelineScale::Months => {}
        }
    }
}

fn draw_today_line(painter: &egui::Painter, origin: Pos2, marker: TodayMarker, height: f32) {
    let x = origin.x + marker.x;

    painter.line_segment(
        [
            Pos2::new(x, origin.y + HEADER_HEIGHT),
            Pos2::new(x, origin.y + height),
        ],
        Stroke::new(1.5, theme::TODAY_LINE),
    );

    // Top badge
    let badge_w = 42.0;
    let badge_rect = Rect::from_min_size(
        Pos2::new(x - badge_w / 2.0, origin.y + HEADER_HEIGHT - 1.0),
        Vec2::new(badge_w, 14.0),
    );
    painter.rect_filled(badge_rect, Rounding::same(3.0), theme::TODAY_LINE);
    painter.text(
        badge_rect.center(),
        egui::Align2::CENTER_CENTER,
        "Today",
        theme::font_small(),
        Color32::WHITE,
    );
}

fn draw_task_bar(
    painter: &egui::Painter,
    origin: Pos2,
    bar: &BarLayout,
    name: &str,
    is_focused: bool,
) -> Rect {
    let inset = theme::BAR_INSET;
    let y = row_top(origin, bar.row) + ROW_PADDING;
    let bar_rect = Rect::from_min_size(
        Pos2::new(origin.x + bar.left + 1.0, y + inset),
        Vec2::new((bar.width - 2.0).max(4.0), ROW_HEIGHT - inset * 2.0),
    );
    let rounding = Rounding::same(theme::BAR_ROUNDING);

    // Soft shadow
    painter.rect_filled(
        bar_rect.translate(Vec2::new(1.0, 2.0)),
        rounding,
        Color32::from_black_alpha(35),
    );

    painter.rect_filled(bar_rect, rounding, bar.colors.bar);

    // Progress fill
    if bar.progress_fraction > 0.0 {
        let progress_rect = Rect::from_min_size(
            bar_rect.min,
            Vec2::new(bar_rect.width() * bar.progress_fraction, bar_rect.height()),
        );
        painter.rect_filled(progress_rect, rounding, bar.colors.progress);
    }

    // Arrow tips where the task runs past the window
    let mid = bar_rect.center().y;
    let tip = 5.0;
    if bar.cut_left {
        painter.add(egui::Shape::convex_polygon(
            vec![
                Pos2::new(bar_rect.left() + 3.0, mid),
                Pos2::new(bar_rect.left() + 3.0 + tip, mid - tip),
                Pos2::new(bar_rect.left() + 3.0 + tip, mid + tip),
            ],
            Color32::from_white_alpha(160),
            Stroke::NONE,
        ));
    }
    if bar.cut_right {
        painter.add(egui::Shape::convex_polygon(
            vec![
                Pos2::new(bar_rect.right() - 3.0, mid),
                Pos2::new(bar_rect.right() - 3.0 - tip, mid + tip),
                Pos2::new(bar_rect.right() - 3.0 - tip, mid - tip),
            ],
            Color32::from_white_alpha(160),
            Stroke::NONE,
        ));
    }

    if bar.fallback.is_some() {
        painter.rect_stroke(bar_rect, rounding, Stroke::new(1.5, theme::WARNING));
    }

    if is_focused {
        painter.rect_stroke(
            bar_rect.expand(1.5),
            Rounding::same(theme::BAR_ROUNDING + 1.5),
            Stroke::new(2.0, theme::BORDER_ACCENT),
        );
    }

    // Task name on bar (single line, clipped to bar bounds)
    if bar_rect.width() > 30.0 {
        let galley = painter.layout_no_wrap(name.to_string(), theme::font_bar(), theme::TEXT_ON_BAR);
        let clipped = painter.with_clip_rect(bar_rect.shrink2(Vec2::new(4.0, 0.0)));
        let text_y = bar_rect.top() + (bar_rect.height() - galley.size().y) / 2.0;
        let text_x = bar_rect.left() + if bar.cut_left { 12.0 } else { 6.0 };
        clipped.galley(Pos2::new(text_x, text_y), galley, Color32::TRANSPARENT);
    }

    bar_rect
}
