use crate::app::TimelineApp;
use crate::model::{FallbackPolicy, TimelineScale};
use crate::ui::theme;
use egui::{menu, RichText, Ui};
use egui_phosphor::regular as icons;

/// Render the top toolbar / menu bar.
pub fn show_toolbar(app: &mut TimelineApp, ui: &mut Ui) {
    menu::bar(ui, |ui| {
        ui.menu_button(RichText::new("  File  ").font(theme::font_menu()), |ui| {
            if ui.button(format!("{} Open JSON...      Ctrl+O", icons::FOLDER_OPEN)).clicked() {
                app.open_json();
                ui.close_menu();
            }
            if ui.button(format!("{} Import CSV...", icons::FILE_CSV)).clicked() {
                app.import_csv();
                ui.close_menu();
            }
            if ui
                .add_enabled(app.file_path.is_some(), egui::Button::new(format!("{} Reload", icons::ARROW_CLOCKWISE)))
                .clicked()
            {
                app.reload();
                ui.close_menu();
            }
            ui.separator();
            if ui.button(format!("{} Export Visible Rows...", icons::EXPORT)).clicked() {
                app.export_csv();
                ui.close_menu();
            }
            ui.separator();
            if ui.button(format!("{} Open Settings Folder", icons::GEAR)).clicked() {
                let dir = crate::settings::AppSettings::config_dir();
                if let Err(e) = std::fs::create_dir_all(&dir).and_then(|_| open::that(&dir)) {
                    log::warn!("Could not open {}: {}", dir.display(), e);
                    app.status_message = format!("Could not open settings folder: {}", e);
                }
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  View  ").font(theme::font_menu()), |ui| {
            if ui.button("  Zoom In        Ctrl+Scroll ↑").clicked() {
                app.viewport.zoom_in();
                ui.close_menu();
            }
            if ui.button("  Zoom Out      Ctrl+Scroll ↓").clicked() {
                app.viewport.zoom_out();
                ui.close_menu();
            }
            if ui.button("  Reset Zoom").clicked() {
                app.viewport.reset_zoom();
                ui.close_menu();
            }
            ui.separator();
            ui.label(RichText::new("Timeline Scale").small().weak());
            for (scale, label) in [
                (TimelineScale::Days, "Days"),
                (TimelineScale::Weeks, "Weeks"),
                (TimelineScale::Months, "Months"),
            ] {
                if ui.radio_value(&mut app.viewport.scale, scale, label).clicked() {
                    ui.close_menu();
                }
            }
            ui.separator();
            if ui.checkbox(&mut app.settings.show_today_marker, "Show Today Marker").changed() {
                app.persist_settings();
            }
            ui.separator();
            if ui.button(format!("{} Expand All", icons::ARROWS_OUT_SIMPLE)).clicked() {
                app.expand_all();
                ui.close_menu();
            }
            if ui.button(format!("{} Collapse All", icons::ARROWS_IN_SIMPLE)).clicked() {
                app.collapse_all();
                ui.close_menu();
            }
            if ui
                .add_enabled(app.sort.is_some(), egui::Button::new(format!("{} Source Order", icons::SORT_ASCENDING)))
                .clicked()
            {
                app.clear_sort();
                ui.close_menu();
            }
            ui.separator();
            if ui.button(format!("{} Timeline Range...", icons::CALENDAR)).clicked() {
                app.open_range_dialog();
                ui.close_menu();
            }
            if ui
                .add_enabled(app.explicit_range.is_some(), egui::Button::new("  Automatic Range"))
                .clicked()
            {
                app.clear_range();
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  Data  ").font(theme::font_menu()), |ui| {
            ui.label(RichText::new("Missing or invalid dates").small().weak());
            let before = app.settings.fallback_policy;
            ui.radio_value(
                &mut app.settings.fallback_policy,
                FallbackPolicy::Substitute,
                "Substitute defaults",
            );
            ui.radio_value(
                &mut app.settings.fallback_policy,
                FallbackPolicy::Drop,
                "Skip the task",
            );
            if app.settings.fallback_policy != before {
                app.persist_settings();
                app.reload();
                ui.close_menu();
            }
            ui.separator();
            let issues = app.issue_count();
            let label = if issues > 0 {
                format!("{} Load Report ({})", icons::WARNING, issues)
            } else {
                format!("{} Load Report", icons::LIST_CHECKS)
            };
            if ui.button(label).clicked() {
                app.show_load_report = true;
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  Help  ").font(theme::font_menu()), |ui| {
            if ui.button("About").clicked() {
                app.show_about = true;
                ui.close_menu();
            }
        });

        // Right-aligned source name
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let range = if app.explicit_range.is_some() { " (fixed range)" } else { "" };
            ui.label(
                RichText::new(format!("{}{}", app.source_name, range))
                    .size(11.0)
                    .weak(),
            );
        });
    });
}
