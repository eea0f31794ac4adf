use chrono::NaiveDate;
use std::path::{Path, PathBuf};

use crate::io::LoadReport;
use crate::model::task::{walk, ConversionLog};
use crate::model::timeline::DEFAULT_DAY_WIDTH;
use crate::model::tree::OrphanDiagnostic;
use crate::model::{
    flatten_rows, project_tasks, sort_forest, DayRange, ExpansionState, SelectionState, SortKey,
    SortSpec, Task, TimelineViewport, TimelineWindow,
};
use crate::settings::AppSettings;
use crate::ui;
use crate::ui::gantt_chart::ChartInteraction;
use crate::ui::task_table::TaskTableAction;

/// Main application state.
pub struct TimelineApp {
    pub settings: AppSettings,
    /// Task forest as loaded, in source order.
    source: Vec<Task>,
    /// `source` with the current sort applied; this is what gets displayed.
    tasks: Vec<Task>,
    pub source_name: String,
    pub file_path: Option<PathBuf>,
    pub viewport: TimelineViewport,
    pub expansion: ExpansionState,
    pub selection: SelectionState,
    pub focused_task: Option<String>,
    pub sort: Option<SortSpec>,
    pub explicit_range: Option<DayRange>,

    // Dialog state
    pub show_range_dialog: bool,
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
    pub show_about: bool,
    pub show_load_report: bool,

    // Last load diagnostics
    pub conversion: ConversionLog,
    pub orphans: Vec<OrphanDiagnostic>,

    // Status message
    pub status_message: String,
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv") || ext.eq_ignore_ascii_case("txt"))
        .unwrap_or(false)
}

fn link_parents(tasks: &mut [Task], parent: Option<&str>) {
    for task in tasks {
        task.parent_id = parent.map(str::to_string);
        let id = task.id.clone();
        link_parents(&mut task.subtasks, Some(&id));
    }
}

impl TimelineApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        // Register Phosphor icon font as a fallback so icons render inline with text
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);

        let settings = AppSettings::load();
        let today = today();
        let last_file = settings.last_file.clone();

        let mut app = Self {
            viewport: TimelineViewport::new(settings.day_width),
            settings,
            source: Vec::new(),
            tasks: Vec::new(),
            source_name: String::new(),
            file_path: None,
            expansion: ExpansionState::default(),
            selection: SelectionState::default(),
            focused_task: None,
            sort: None,
            explicit_range: None,
            show_range_dialog: false,
            range_start: today,
            range_end: today,
            show_about: false,
            show_load_report: false,
            conversion: ConversionLog::default(),
            orphans: Vec::new(),
            status_message: "Ready".to_string(),
        };

        match last_file {
            Some(path) if path.exists() => app.load_file(path),
            _ => app.load_sample(),
        }
        app
    }

    /// Sample data shown when there is nothing to reopen.
    fn sample_tasks(today: NaiveDate) -> Vec<Task> {
        let day = |offset: i64| today + chrono::Duration::days(offset);

        let planning = Task::new("planning", "Planning", day(-5), day(8))
            .with_status("in_progress")
            .with_subtasks(vec![
                Task::new("kickoff", "Project Kickoff", day(-5), day(-2)).with_status("done"),
                Task::new("requirements", "Requirements Gathering", day(-2), day(5))
                    .with_progress(60.0),
                Task::new("signoff", "Planning Sign-off", day(8), day(8)).with_status("todo"),
            ]);

        let mut backend = Task::new("backend", "Backend Development", day(6), day(28))
            .with_status("in_progress")
            .with_progress(15.0)
            .with_subtasks(vec![
                Task::new("api", "API Endpoints", day(6), day(16)).with_status("in_review"),
                Task::new("storage", "Storage Layer", day(12), day(28)).with_status("blocked"),
            ]);
        backend.color = Some(egui::Color32::from_rgb(106, 90, 205));

        let execution = Task::new("execution", "Execution", day(6), day(30))
            .with_status("pending")
            .with_subtasks(vec![
                Task::new("ui-design", "UI Design", day(6), day(18)).with_status("todo"),
                backend,
                Task::new("qa", "Testing & QA", day(22), day(30)).with_status("not_started"),
            ]);

        let launch = Task::new("launch", "Launch", day(32), day(32)).with_status("not_started");

        let mut tasks = vec![planning, execution, launch];
        link_parents(&mut tasks, None);
        tasks
    }

    fn load_sample(&mut self) {
        let report = LoadReport {
            tasks: Self::sample_tasks(today()),
            ..Default::default()
        };
        self.file_path = None;
        self.source_name = "Sample tasks".to_string();
        self.apply_report(report);
        self.expansion.expand_all(&self.source);
    }

    // --- File operations ---

    pub fn open_json(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Task JSON", &["json"])
            .pick_file()
        {
            self.load_file(path);
        }
    }

    pub fn import_csv(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv", "txt"])
            .pick_file()
        {
            self.load_file(path);
        }
    }

    /// Re-read the current file, e.g. after the fallback policy changed.
    pub fn reload(&mut self) {
        match self.file_path.clone() {
            Some(path) => self.load_file(path),
            None => self.load_sample(),
        }
    }

    pub fn load_file(&mut self, path: PathBuf) {
        let policy = self.settings.fallback_policy;
        let result = if is_csv(&path) {
            crate::io::csv_import::import_csv(&path, today(), policy)
        } else {
            crate::io::records::load_tasks(&path, today(), policy)
        };

        match result {
            Ok(report) => {
                self.source_name = path
                    .file_name()
                    .and_then(|s| s.to_str())
                    .unwrap_or("Tasks")
                    .to_string();
                let reopened = self.file_path.as_deref() == Some(path.as_path());
                if !reopened {
                    self.explicit_range = None;
                }
                self.file_path = Some(path.clone());
                self.apply_report(report);
                if !reopened {
                    self.expansion.collapse_all();
                }

                if self.settings.last_file.as_deref() != Some(path.as_path()) {
                    self.settings.last_file = Some(path);
                    self.persist_settings();
                }
            }
            Err(e) => {
                log::error!("Failed to load {}: {}", path.display(), e);
                self.status_message = format!("Error loading {}: {}", path.display(), e);
            }
        }
    }

    fn apply_report(&mut self, report: LoadReport) {
        self.status_message = report.summary();
        self.show_load_report = report.has_issues();

        self.source = report.tasks;
        self.conversion = report.conversion;
        self.orphans = report.orphans;

        self.expansion.retain_existing(&self.source);
        self.selection.retain_existing(&self.source);
        if let Some(id) = &self.focused_task {
            if !walk(&self.source).any(|t| &t.id == id) {
                self.focused_task = None;
            }
        }
        self.rebuild_view();
    }

    fn rebuild_view(&mut self) {
        self.tasks = self.source.clone();
        if let Some(spec) = self.sort {
            sort_forest(&mut self.tasks, spec);
        }
    }

    pub fn export_csv(&mut self) {
        let rows = flatten_rows(&self.tasks, &self.expansion);
        if rows.is_empty() {
            self.status_message = "Nothing to export: no visible rows".to_string();
            return;
        }

        let stem = self
            .file_path
            .as_deref()
            .and_then(|p| p.file_stem())
            .and_then(|s| s.to_str())
            .unwrap_or("tasks");
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .set_file_name(format!("{}-rows.csv", stem))
            .save_file()
        {
            match crate::io::csv_export::export_rows(&rows, &path) {
                Ok(count) => {
                    self.status_message = format!("Exported {} rows to CSV", count);
                }
                Err(e) => {
                    log::error!("CSV export failed: {}", e);
                    self.status_message = format!("CSV export failed: {}", e);
                }
            }
        }
    }

    pub fn persist_settings(&mut self) {
        if let Err(e) = self.settings.save() {
            log::warn!("Could not save settings: {}", e);
            self.status_message = format!("Could not save settings: {}", e);
        }
    }

    // --- View operations ---

    pub fn set_sort(&mut self, key: SortKey) {
        self.sort = Some(SortSpec::toggled(self.sort, key));
        self.rebuild_view();
    }

    pub fn clear_sort(&mut self) {
        self.sort = None;
        self.rebuild_view();
    }

    pub fn expand_all(&mut self) {
        self.expansion.expand_all(&self.source);
    }

    pub fn collapse_all(&mut self) {
        self.expansion.collapse_all();
    }

    pub fn open_range_dialog(&mut self) {
        let range = TimelineWindow::compute(self.explicit_range, &self.tasks, today()).range();
        self.range_start = range.start();
        self.range_end = range.end();
        self.show_range_dialog = true;
    }

    pub fn apply_range(&mut self) {
        let range = DayRange::new(self.range_start, self.range_end);
        self.status_message = format!(
            "Timeline fixed to {} – {}",
            range.start().format("%Y-%m-%d"),
            range.end().format("%Y-%m-%d")
        );
        self.explicit_range = Some(range);
    }

    pub fn clear_range(&mut self) {
        self.explicit_range = None;
        self.status_message = "Timeline range follows the tasks".to_string();
    }

    pub fn issue_count(&self) -> usize {
        self.conversion.skipped.len() + self.conversion.fallbacks.len() + self.orphans.len()
    }

    fn apply_table_action(&mut self, action: TaskTableAction) {
        match action {
            TaskTableAction::Focus(id) => self.focused_task = Some(id),
            TaskTableAction::Expand(id) => self.expansion.expand(&id),
            TaskTableAction::Collapse(id) => self.expansion.collapse(&id),
            TaskTableAction::ToggleSelect(id) => self.selection.toggle(&id),
            TaskTableAction::ClearSelection => self.selection.clear(),
            TaskTableAction::Sort(key) => self.set_sort(key),
            // Needs the visible rows; handled while they are still borrowed.
            TaskTableAction::SelectVisible | TaskTableAction::None => {}
        }
    }

    fn apply_chart_interaction(&mut self, interaction: ChartInteraction) {
        if interaction.clear_focus {
            self.focused_task = None;
        }
        if let Some(id) = interaction.focus {
            if let Some(task) = walk(&self.tasks).find(|t| t.id == id) {
                self.status_message = format!(
                    "{} ({} – {}, {}%)",
                    task.name,
                    task.start.format("%Y-%m-%d"),
                    task.end.format("%Y-%m-%d"),
                    crate::model::layout::display_percent(task.effective_progress())
                );
            }
            self.focused_task = Some(id);
        }
        if let Some(id) = interaction.select {
            self.selection.select(&id);
        }
        if let Some(id) = interaction.toggle_expand {
            self.expansion.toggle(&id);
        }
        if interaction.zoom_changed {
            self.status_message = format!("{:.0} px per day", self.viewport.day_width);
        }
    }
}

impl eframe::App for TimelineApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ui::theme::apply_theme(ctx);

        // Handle keyboard shortcuts outside closures to avoid borrow issues
        if ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::O)) {
            self.open_json();
        }

        // Top panel: toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui::toolbar::show_toolbar(self, ui);
        });

        let today = today();
        let window = TimelineWindow::compute(self.explicit_range, &self.tasks, today);
        let total_tasks = walk(&self.tasks).count();

        let (task_action, chart_interaction) = {
            let rows = flatten_rows(&self.tasks, &self.expansion);
            let layout = project_tasks(
                rows.iter().map(|row| row.task),
                window,
                self.viewport.day_width,
                today,
            );

            // Bottom panel: status bar
            egui::TopBottomPanel::bottom("status_bar")
                .exact_height(ui::theme::STATUS_BAR_HEIGHT)
                .frame(
                    egui::Frame::default()
                        .fill(ui::theme::BG_HEADER)
                        .inner_margin(egui::Margin::symmetric(10.0, 0.0)),
                )
                .show(ctx, |ui| {
                    ui.horizontal_centered(|ui| {
                        ui.label(
                            egui::RichText::new(&self.status_message)
                                .size(11.0)
                                .color(ui::theme::TEXT_SECONDARY),
                        );
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.label(
                                egui::RichText::new(format!(
                                    "Zoom: {:.0}%",
                                    self.viewport.day_width / DEFAULT_DAY_WIDTH * 100.0
                                ))
                                .size(10.5)
                                .color(ui::theme::TEXT_DIM),
                            );
                            ui.label(egui::RichText::new(" · ").size(10.5).color(ui::theme::TEXT_DIM));
                            ui.label(
                                egui::RichText::new(format!(
                                    "{} – {}",
                                    window.start.format("%Y-%m-%d"),
                                    window.end.format("%Y-%m-%d")
                                ))
                                .size(10.5)
                                .color(ui::theme::TEXT_DIM),
                            );
                            ui.label(egui::RichText::new(" · ").size(10.5).color(ui::theme::TEXT_DIM));
                            ui.label(
                                egui::RichText::new(format!("Rows: {} of {}", rows.len(), total_tasks))
                                    .size(10.5)
                                    .color(ui::theme::TEXT_DIM),
                            );
                        });
                    });
                });

            // Left panel: task table
            let mut task_action = TaskTableAction::None;
            egui::SidePanel::left("task_panel")
                .default_width(ui::theme::SIDE_PANEL_WIDTH)
                .min_width(280.0)
                .max_width(ui::theme::SIDE_PANEL_WIDTH * 2.0)
                .resizable(true)
                .frame(
                    egui::Frame::default()
                        .fill(ui::theme::BG_PANEL)
                        .inner_margin(egui::Margin::same(8.0))
                        .stroke(egui::Stroke::new(1.0, ui::theme::BORDER_SUBTLE)),
                )
                .show(ctx, |ui| {
                    task_action = ui::task_table::show_task_table(
                        &rows,
                        &self.selection,
                        self.focused_task.as_deref(),
                        self.sort,
                        ui,
                    );
                });

            if let TaskTableAction::SelectVisible = task_action {
                self.selection.select_rows(&rows);
            }

            // Central panel: Gantt chart
            let chart_frame = egui::Frame::default()
                .fill(ui::theme::BG_DARK)
                .inner_margin(egui::Margin::ZERO);
            let chart_interaction = egui::CentralPanel::default()
                .frame(chart_frame)
                .show(ctx, |ui| {
                    ui::gantt_chart::show_gantt_chart(
                        &rows,
                        &layout,
                        &mut self.viewport,
                        self.focused_task.as_deref(),
                        self.settings.show_today_marker,
                        ui,
                    )
                })
                .inner;

            (task_action, chart_interaction)
        };

        self.apply_table_action(task_action);
        self.apply_chart_interaction(chart_interaction);

        // Keep the persisted zoom level in step with the viewport
        if self.viewport.day_width != self.settings.day_width {
            self.settings.day_width = self.viewport.day_width;
            self.persist_settings();
        }

        // Dialogs
        if self.show_range_dialog {
            ui::dialogs::show_range_dialog(self, ctx);
        }
        if self.show_about {
            ui::dialogs::show_about_dialog(self, ctx);
        }
        if self.show_load_report {
            ui::dialogs::show_load_report(self, ctx);
        }
    }
}
