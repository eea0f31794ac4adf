use crate::model::layout::display_percent;
use crate::model::sort::{SortDirection, SortKey, SortSpec};
use crate::model::{Row, SelectionState};
use crate::ui::theme;
use egui::{Color32, Pos2, RichText, Stroke, Ui};
use egui_phosphor::regular as icons;

/// Actions that the task table can request.
pub enum TaskTableAction {
    None,
    Focus(String),
    Expand(String),
    Collapse(String),
    ToggleSelect(String),
    SelectVisible,
    ClearSelection,
    Sort(SortKey),
}

/// Render the left-side task table panel.
pub fn show_task_table(
    rows: &[Row<'_>],
    selection: &SelectionState,
    focused: Option<&str>,
    sort: Option<SortSpec>,
    ui: &mut Ui,
) -> TaskTableAction {
    let mut action = TaskTableAction::None;

    // Header area
    ui.add_space(2.0);
    ui.horizontal(|ui| {
        ui.label(
            RichText::new("Tasks")
                .strong()
                .size(15.0)
                .color(theme::TEXT_PRIMARY),
        );
        ui.add_space(4.0);
        ui.label(
            RichText::new(format!("({} shown)", rows.len()))
                .size(11.0)
                .color(theme::TEXT_DIM),
        );

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if !selection.is_empty() {
                if ui.small_button("Clear").clicked() {
                    action = TaskTableAction::ClearSelection;
                }
                ui.label(
                    RichText::new(format!("{} selected", selection.len()))
                        .size(11.0)
                        .color(theme::ACCENT),
                );
            } else if !rows.is_empty() && ui.small_button("Select shown").clicked() {
                action = TaskTableAction::SelectVisible;
            }
        });
    });

    ui.add_space(6.0);
    ui.separator();
    ui.add_space(2.0);

    // Column headers
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 4.0;
        ui.add_space(46.0); // caret + checkbox
        if let Some(key) = sort_header(ui, "TASK", SortKey::Name, sort, 150.0) {
            action = TaskTableAction::Sort(key);
        }
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.spacing_mut().item_spacing.x = 4.0;
            ui.add_space(4.0);
            for (label, key, width) in [
                ("DONE", SortKey::Progress, 40.0),
                ("END", SortKey::End, 44.0),
                ("START", SortKey::Start, 44.0),
                ("STATUS", SortKey::Status, 56.0),
            ] {
                if let Some(key) = sort_header(ui, label, key, sort, width) {
                    action = TaskTableAction::Sort(key);
                }
            }
        });
    });

    ui.add_space(2.0);

    if rows.is_empty() {
        ui.add_space(20.0);
        ui.vertical_centered(|ui| {
            ui.label(RichText::new("No tasks loaded").color(theme::TEXT_DIM));
        });
        return action;
    }

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for (i, row) in rows.iter().enumerate() {
                let task = row.task;
                let is_focused = focused == Some(task.id.as_str());
                let mut is_checked = selection.is_selected(&task.id);

                let row_bg = if is_focused {
                    theme::BG_FOCUSED
                } else if is_checked {
                    theme::BG_SELECTED
                } else if i % 2 == 0 {
                    theme::BG_PANEL
                } else {
                    theme::BG_DARK
                };

                let frame = egui::Frame::none()
                    .fill(row_bg)
                    .rounding(4.0)
                    .inner_margin(egui::Margin::symmetric(6.0, 3.0));

                let mut inner_hovered = false;
                let frame_resp = frame.show(ui, |ui| {
                    ui.set_min_height(theme::ROW_HEIGHT - 6.0);
                    ui.horizontal(|ui| {
                        ui.spacing_mut().item_spacing.x = 4.0;
                        ui.add_space(row.depth as f32 * theme::INDENT_WIDTH);

                        // Expand / collapse caret
                        if row.has_children {
                            let icon = if row.is_expanded {
                                icons::CARET_DOWN
                            } else {
                                icons::CARET_RIGHT
                            };
                            let caret = ui.add(
                                egui::Button::new(RichText::new(icon).color(theme::TEXT_SECONDARY))
                                    .frame(false)
                                    .min_size(egui::vec2(16.0, 16.0)),
                            );
                            let hint = if row.is_expanded { "Collapse" } else { "Expand" };
                            let caret = caret.on_hover_text(hint);
                            inner_hovered |= caret.hovered();
                            if caret.clicked() {
                                action = expand_or_collapse(row);
                            }
                        } else {
                            ui.add_space(20.0);
                        }

                        let checkbox = ui.checkbox(&mut is_checked, "");
                        inner_hovered |= checkbox.hovered();
                        if checkbox.changed() {
                            action = TaskTableAction::ToggleSelect(task.id.clone());
                        }

                        let colors = task.colors();
                        let (dot_rect, _) =
                            ui.allocate_exact_size(egui::vec2(8.0, 8.0), egui::Sense::hover());
                        ui.painter().circle_filled(dot_rect.center(), 4.0, colors.bar);

                        let name_color = if row.is_subtask {
                            theme::TEXT_SECONDARY
                        } else {
                            theme::TEXT_PRIMARY
                        };
                        let mut name = RichText::new(&task.name).size(12.0).color(name_color);
                        if is_focused {
                            name = name.color(Color32::WHITE).strong();
                        }
                        ui.add(egui::Label::new(name).truncate());

                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.spacing_mut().item_spacing.x = 6.0;

                            let percent = display_percent(task.effective_progress());
                            progress_ring(ui, percent, colors.bar);

                            ui.label(
                                RichText::new(task.end.format("%m/%d").to_string())
                                    .size(10.0)
                                    .color(theme::TEXT_SECONDARY),
                            );
                            ui.label(
                                RichText::new(task.start.format("%m/%d").to_string())
                                    .size(10.0)
                                    .color(theme::TEXT_SECONDARY),
                            );
                            if task.date_fallback.is_some() {
                                ui.label(RichText::new(icons::WARNING).color(theme::WARNING))
                                    .on_hover_text("Dates were missing or invalid and have been substituted");
                            }
                        });
                    });
                });

                // Make entire row clickable, leaving the caret and checkbox their own clicks
                let row_rect = frame_resp.response.rect;
                if !inner_hovered && ui.rect_contains_pointer(row_rect) {
                    let (clicked, double_clicked) = ui.input(|i| {
                        (
                            i.pointer.primary_clicked(),
                            i.pointer.button_double_clicked(egui::PointerButton::Primary),
                        )
                    });
                    if double_clicked && row.has_children {
                        action = expand_or_collapse(row);
                    } else if clicked {
                        action = TaskTableAction::Focus(task.id.clone());
                    }
                }

                // Small gap between rows
                ui.add_space(theme::ROW_GAP);
            }
        });

    action
}

fn expand_or_collapse(row: &Row<'_>) -> TaskTableAction {
    let id = row.task.id.clone();
    if row.is_expanded {
        TaskTableAction::Collapse(id)
    } else {
        TaskTableAction::Expand(id)
    }
}

/// A clickable column header showing the current sort direction.
fn sort_header(
    ui: &mut Ui,
    label: &str,
    key: SortKey,
    sort: Option<SortSpec>,
    width: f32,
) -> Option<SortKey> {
    let arrow = match sort {
        Some(spec) if spec.key == key => match spec.direction {
            SortDirection::Ascending => icons::CARET_UP,
            SortDirection::Descending => icons::CARET_DOWN,
        },
        _ => "",
    };
    let text = RichText::new(format!("{label} {arrow}"))
        .size(9.0)
        .color(theme::TEXT_DIM)
        .strong();
    let response = ui.add_sized([width, 16.0], egui::Button::new(text).frame(false));
    response.clicked().then_some(key)
}

/// Circular progress indicator with the rounded percentage in the middle.
fn progress_ring(ui: &mut Ui, percent: u8, color: Color32) {
    let size = 22.0;
    let (rect, response) = ui.allocate_exact_size(egui::vec2(size, size), egui::Sense::hover());
    let painter = ui.painter();
    let center = rect.center();
    let radius = size / 2.0 - 2.0;

    painter.circle_stroke(center, radius, Stroke::new(2.5, theme::RING_TRACK));

    if percent > 0 {
        let sweep = std::f32::consts::TAU * percent as f32 / 100.0;
        let steps = ((percent as usize * 48) / 100).max(2);
        let start = -std::f32::consts::FRAC_PI_2;
        let points: Vec<Pos2> = (0..=steps)
            .map(|s| {
                let angle = start + sweep * s as f32 / steps as f32;
                center + radius * egui::vec2(angle.cos(), angle.sin())
            })
            .collect();
        painter.add(egui::Shape::line(points, Stroke::new(2.5, color)));
    }

    painter.text(
        center,
        egui::Align2::CENTER_CENTER,
        percent.to_string(),
        theme::font_small(),
        theme::TEXT_SECONDARY,
    );
    response.on_hover_text(format!("{percent}% complete"));
}
