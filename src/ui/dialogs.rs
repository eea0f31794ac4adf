use crate::app::TimelineApp;
use crate::ui::theme;
use egui::{Color32, Context, RichText, Window};
use egui_phosphor::regular as icons;

/// Render the "Timeline Range" dialog.
pub fn show_range_dialog(app: &mut TimelineApp, ctx: &Context) {
    let mut should_close = false;
    Window::new(RichText::new("Timeline Range").strong().size(14.0))
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([theme::DIALOG_WIDTH, 0.0])
        .show(ctx, |ui| {
            ui.visuals_mut().extreme_bg_color = theme::BG_FIELD;
            ui.add_space(4.0);

            egui::Grid::new("range_grid")
                .num_columns(2)
                .striped(false)
                .spacing([12.0, 8.0])
                .show(ui, |ui| {
                    ui.label(RichText::new("From").color(theme::TEXT_SECONDARY));
                    ui.add(
                        egui_extras::DatePickerButton::new(&mut app.range_start)
                            .id_salt("range_dp_start"),
                    );
                    ui.end_row();

                    ui.label(RichText::new("To").color(theme::TEXT_SECONDARY));
                    ui.add(
                        egui_extras::DatePickerButton::new(&mut app.range_end)
                            .id_salt("range_dp_end"),
                    );
                    ui.end_row();
                });

            if app.range_end < app.range_start {
                ui.add_space(4.0);
                ui.label(
                    RichText::new("End is before start; the range will be a single day.")
                        .small()
                        .color(theme::WARNING),
                );
            }

            ui.add_space(6.0);
            ui.separator();
            ui.add_space(4.0);

            ui.horizontal(|ui| {
                let apply_btn = egui::Button::new(RichText::new("Apply").color(Color32::WHITE))
                    .fill(theme::ACCENT)
                    .rounding(egui::Rounding::same(4.0));
                if ui.add_sized([80.0, 28.0], apply_btn).clicked() {
                    app.apply_range();
                    should_close = true;
                }
                if ui.add_sized([80.0, 28.0], egui::Button::new("Automatic")).clicked() {
                    app.clear_range();
                    should_close = true;
                }
                if ui.add_sized([80.0, 28.0], egui::Button::new("Cancel")).clicked() {
                    should_close = true;
                }
            });
            ui.add_space(2.0);
        });

    if should_close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.show_range_dialog = false;
    }
}

/// Render the "About" dialog.
pub fn show_about_dialog(app: &mut TimelineApp, ctx: &Context) {
    let mut should_close = false;
    Window::new("About")
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([theme::DIALOG_WIDTH, 180.0])
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(12.0);
                ui.heading(RichText::new("Taskline").strong());
                ui.add_space(2.0);
                ui.label(
                    RichText::new(format!("Version {}", env!("CARGO_PKG_VERSION")))
                        .color(theme::TEXT_SECONDARY),
                );
                ui.add_space(10.0);
                ui.label("A read-only task tree and timeline viewer");
                ui.label("built with Rust and egui.");
                ui.add_space(14.0);
                if ui.add_sized([100.0, 28.0], egui::Button::new("Close")).clicked() {
                    should_close = true;
                }
            });
        });
    if should_close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.show_about = false;
    }
}

/// Render the load report: skipped records, substituted dates and orphaned tasks.
pub fn show_load_report(app: &mut TimelineApp, ctx: &Context) {
    let mut should_close = false;

    Window::new(RichText::new("Load Report").strong().size(14.0))
        .resizable(true)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .default_size([520.0, 380.0])
        .show(ctx, |ui| {
            ui.label(RichText::new(&app.status_message).color(theme::TEXT_SECONDARY));
            ui.add_space(6.0);

            egui::ScrollArea::vertical()
                .max_height(300.0)
                .show(ui, |ui| {
                    let conversion = &app.conversion;
                    if conversion.is_clean() && app.orphans.is_empty() {
                        ui.label(
                            RichText::new(format!("{} Every record loaded cleanly.", icons::CHECK_CIRCLE))
                                .color(theme::TEXT_PRIMARY),
                        );
                    }

                    if !conversion.skipped.is_empty() {
                        section_heading(ui, "Skipped records", conversion.skipped.len());
                        egui::Grid::new("report_skipped")
                            .num_columns(2)
                            .striped(true)
                            .spacing([12.0, 4.0])
                            .show(ui, |ui| {
                                for skipped in &conversion.skipped {
                                    ui.label(RichText::new(&skipped.label).strong());
                                    ui.label(&skipped.reason);
                                    ui.end_row();
                                }
                            });
                        ui.add_space(8.0);
                    }

                    if !conversion.fallbacks.is_empty() {
                        section_heading(ui, "Substituted dates", conversion.fallbacks.len());
                        egui::Grid::new("report_fallbacks")
                            .num_columns(2)
                            .striped(true)
                            .spacing([12.0, 4.0])
                            .show(ui, |ui| {
                                for note in &conversion.fallbacks {
                                    ui.label(RichText::new(&note.task_name).strong())
                                        .on_hover_text(&note.task_id);
                                    ui.label(note.reason.to_string());
                                    ui.end_row();
                                }
                            });
                        ui.add_space(8.0);
                    }

                    if !app.orphans.is_empty() {
                        section_heading(ui, "Shown at top level", app.orphans.len());
                        for orphan in &app.orphans {
                            ui.label(RichText::new(orphan.to_string()).small());
                        }
                    }
                });

            ui.add_space(4.0);
            ui.separator();
            ui.add_space(4.0);
            if ui.add_sized([80.0, 28.0], egui::Button::new("Close")).clicked() {
                should_close = true;
            }
            ui.add_space(2.0);
        });

    if should_close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.show_load_report = false;
    }
}

fn section_heading(ui: &mut egui::Ui, title: &str, count: usize) {
    ui.label(
        RichText::new(format!("{} {} ({})", icons::WARNING, title, count))
            .strong()
            .color(theme::WARNING),
    );
    ui.add_space(2.0);
}
