use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, DatePickerButton, TableBuilder};

use crate::color::SignPalette;
use crate::data::export::ExportFormat;
use crate::data::methodology::MethodologyView;
use crate::state::{AppState, ChartMode};

// ---------------------------------------------------------------------------
// Left side panel – index selection, summary, methodology
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    // ---- Logo (centered) ----
    let logo = egui::include_image!("../../assets/logo.png");
    ui.vertical_centered(|ui: &mut Ui| {
        ui.add(
            egui::Image::new(logo)
                .max_width(ui.available_width() * 0.3)
                .max_height(64.0)
                .rounding(4.0),
        );
    });
    ui.add_space(4.0);

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            index_selector(ui, state);
            ui.separator();
            date_window(ui, state);
            ui.separator();
            chart_options(ui, state);
            ui.separator();
            summary_table(ui, state);
            ui.separator();
            methodology(ui, state.methodology_view());
        });
}

fn index_selector(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Index");

    if state.catalog.is_empty() {
        ui.label("No indices loaded.");
        return;
    }

    let names: Vec<String> = state.catalog.names().map(str::to_string).collect();
    let current = state.selected.clone().unwrap_or_default();
    egui::ComboBox::from_id_salt("index_select")
        .selected_text(&current)
        .width(ui.available_width() * 0.9)
        .show_ui(ui, |ui: &mut Ui| {
            for name in &names {
                if ui.selectable_label(current == *name, name).clicked() {
                    state.select_index(name);
                }
            }
        });

    if let Some(series) = state.selected_series() {
        let range = series
            .time_range()
            .map(|(a, b)| format!("{a} → {b}"))
            .unwrap_or_default();
        ui.small(format!(
            "{} observations ({} present)  {range}",
            series.len(),
            series.present_count()
        ));
        if let Some(path) = state.catalog.source_of(&series.name) {
            ui.small(RichText::new(path.display().to_string()).weak());
        }
    }
}

fn date_window(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Period");

    let Some((first, last)) = state.selected_series().and_then(|s| s.time_range()) else {
        ui.label("—");
        return;
    };
    let (mut start, mut end) = state.window.unwrap_or((first, last));

    let mut changed = false;
    ui.horizontal(|ui: &mut Ui| {
        ui.label("From");
        changed |= ui
            .push_id("window_start", |ui: &mut Ui| ui.add(DatePickerButton::new(&mut start)))
            .inner
            .changed();
    });
    ui.horizontal(|ui: &mut Ui| {
        ui.label("To");
        changed |= ui
            .push_id("window_end", |ui: &mut Ui| ui.add(DatePickerButton::new(&mut end)))
            .inner
            .changed();
    });
    if changed {
        state.set_window(start, end);
    }

    if ui
        .add_enabled(state.window.is_some(), egui::Button::new("Full record"))
        .clicked()
    {
        state.reset_window();
    }
}

fn chart_options(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Chart");
    ui.horizontal(|ui: &mut Ui| {
        ui.radio_value(&mut state.chart_mode, ChartMode::Bars, "Anomaly bars");
        ui.radio_value(&mut state.chart_mode, ChartMode::Lines, "Lines");
    });

    if state.chart_mode == ChartMode::Lines {
        let others: Vec<String> = state
            .catalog
            .names()
            .filter(|n| state.selected.as_deref() != Some(*n))
            .map(str::to_string)
            .collect();
        egui::CollapsingHeader::new(format!("Overlay  ({}/{})", state.overlays.len(), others.len()))
            .id_salt("overlays")
            .default_open(false)
            .show(ui, |ui: &mut Ui| {
                for name in &others {
                    let mut checked = state.overlays.contains(name);
                    if ui.checkbox(&mut checked, name).changed() {
                        state.toggle_overlay(name);
                    }
                }
            });
    }

    ui.horizontal(|ui: &mut Ui| {
        ui.label("Download as");
        for format in ExportFormat::ALL {
            ui.radio_value(&mut state.export_format, format, format.label());
        }
    });
    if ui
        .add_enabled(state.selected.is_some(), egui::Button::new("Download…"))
        .clicked()
    {
        let format = state.export_format;
        export_dialog(state, format);
    }
}

fn summary_table(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Latest values");

    let rows = state.summary.clone();
    let sign_palette = SignPalette::default();
    let mut clicked: Option<String> = None;

    ui.push_id("summary_table", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::auto().at_least(80.0))
            .column(Column::auto().at_least(50.0))
            .column(Column::remainder())
            .header(20.0, |mut header| {
                header.col(|ui| {
                    ui.strong("Index");
                });
                header.col(|ui| {
                    ui.strong("Value");
                });
                header.col(|ui| {
                    ui.strong("Month");
                });
            })
            .body(|mut body| {
                for row in &rows {
                    body.row(18.0, |mut table_row| {
                        table_row.col(|ui| match &row.key {
                            Some(key) => {
                                let selected = state.selected.as_deref() == Some(key.as_str());
                                if ui.selectable_label(selected, &row.label).clicked() {
                                    clicked = Some(key.clone());
                                }
                            }
                            None => {
                                ui.label(RichText::new(&row.label).weak());
                            }
                        });
                        table_row.col(|ui| {
                            let text = row.latest.value_text();
                            let color = row
                                .latest
                                .0
                                .and_then(|o| o.value)
                                .filter(|v| *v != 0.0)
                                .map(|v| sign_palette.color_for(v));
                            match color {
                                Some(c) => ui.label(RichText::new(text).color(c)),
                                None => ui.label(text),
                            };
                        });
                        table_row.col(|ui| {
                            ui.label(row.latest.date_text());
                        });
                    });
                }
            });
    });

    if let Some(key) = clicked {
        state.select_index(&key);
    }
}

fn methodology(ui: &mut Ui, view: MethodologyView<'_>) {
    ui.strong("Methodology");
    match view {
        MethodologyView::Available(_) => {
            ui.label(view.description());
        }
        MethodologyView::NotAvailable => {
            ui.label(RichText::new(view.description()).italics());
        }
    }
    if let Some(link) = view.link() {
        ui.hyperlink_to("Data access", link);
    }
    if let Some(citation) = view.citation() {
        ui.small(citation);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open dataset folder…").clicked() {
                open_folder_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
            ui.separator();
            for format in ExportFormat::ALL {
                let button = egui::Button::new(format!("Export {format}…"));
                if ui.add_enabled(state.selected.is_some(), button).clicked() {
                    export_dialog(state, format);
                    ui.close_menu();
                }
            }
        });

        ui.separator();

        ui.label(format!(
            "{} indices from {}",
            state.catalog.len(),
            state.config.dataset_dir.display()
        ));

        if !state.load_failures.is_empty() {
            let details = state
                .load_failures
                .iter()
                .map(|(path, e)| format!("{}: {e}", path.display()))
                .collect::<Vec<_>>()
                .join("\n");
            ui.separator();
            ui.label(RichText::new(format!("{} skipped", state.load_failures.len())).color(Color32::YELLOW))
                .on_hover_text(details);
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            if msg.starts_with("Warning") || msg.starts_with("Error") {
                ui.label(RichText::new(msg).color(Color32::RED));
            } else {
                ui.label(msg);
            }
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_folder_dialog(state: &mut AppState) {
    let folder = rfd::FileDialog::new()
        .set_title("Open dataset folder")
        .set_directory(&state.config.dataset_dir)
        .pick_folder();

    if let Some(dir) = folder {
        log::info!("Switching dataset directory to {}", dir.display());
        state.set_dataset_dir(dir);
    }
}

pub fn export_dialog(state: &mut AppState, format: ExportFormat) {
    let file = rfd::FileDialog::new()
        .set_title(format!("Export {format}"))
        .add_filter(format.label(), &[format.extension()])
        .set_file_name(state.export_file_name(format))
        .save_file();

    if let Some(path) = file {
        match state.export_visible(&path, format) {
            Ok(()) => {
                state.status_message = Some(format!("Exported {}", path.display()));
            }
            Err(e) => {
                log::error!("Export failed: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
