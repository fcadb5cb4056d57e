//! Settings window: track pickers, subtitle tools, live media info

use eframe::egui;

use crate::coordinator::PlaybackCoordinator;
use crate::models::{format_size, TrackId, TrackKind};

/// State the settings window keeps between frames.
#[derive(Default)]
pub struct SettingsWindow {
    pub search_query: String,
}

impl SettingsWindow {
    /// Draw the settings window. `open` follows egui's window close button.
    pub fn show(
        &mut self,
        ctx: &egui::Context,
        open: &mut bool,
        coordinator: &mut PlaybackCoordinator,
        subtitle_languages: &[String],
    ) {
        let mut still_open = *open;
        egui::Window::new("⚙ Video Settings")
            .open(&mut still_open)
            .resizable(true)
            .default_width(420.0)
            .show(ctx, |ui| {
                self.video_section(ui, coordinator);
                ui.separator();
                self.subtitle_section(ui, coordinator, subtitle_languages);
                ui.separator();
                Self::info_section(ui, coordinator);
            });
        *open = still_open;
    }

    fn video_section(&mut self, ui: &mut egui::Ui, coordinator: &mut PlaybackCoordinator) {
        ui.heading("Video");
        let video: Vec<(TrackId, String, bool)> = coordinator
            .tracks_of(TrackKind::Video)
            .map(|t| (t.id, t.label.clone(), t.enabled))
            .collect();
        if video.is_empty() {
            ui.label("No video track");
            return;
        }
        let selected_label = video
            .iter()
            .find(|(_, _, enabled)| *enabled)
            .map(|(_, label, _)| label.clone())
            .unwrap_or_else(|| "None".to_string());

        ui.horizontal(|ui| {
            ui.label("Video track:");
            egui::ComboBox::from_id_salt("settings_video_track")
                .selected_text(selected_label.clone())
                .show_ui(ui, |ui| {
                    for (id, label, enabled) in &video {
                        if ui.selectable_label(*enabled, label).clicked() {
                            coordinator.select_track(*id);
                        }
                    }
                });
        });
        ui.horizontal(|ui| {
            ui.label("Video type:");
            ui.label(selected_label);
        });
    }

    fn subtitle_section(
        &mut self,
        ui: &mut egui::Ui,
        coordinator: &mut PlaybackCoordinator,
        subtitle_languages: &[String],
    ) {
        ui.heading("Subtitle");
        ui.horizontal(|ui| {
            ui.label("Delay (s):");
            ui.add(
                egui::DragValue::new(&mut coordinator.subtitles_mut().delay_seconds)
                    .speed(0.1)
                    .range(-60.0..=60.0),
            );
        });
        ui.horizontal(|ui| {
            ui.label("Title:");
            ui.text_edit_singleline(&mut self.search_query);
            if ui.button("🔍 Search Subtitle").clicked() {
                let query = self.search_query.clone();
                coordinator
                    .subtitles_mut()
                    .search(&query, subtitle_languages);
            }
        });
        let status = coordinator.subtitles().search_status.clone();
        if !status.is_empty() {
            ui.label(status);
        }
    }

    fn info_section(ui: &mut egui::Ui, coordinator: &PlaybackCoordinator) {
        ui.heading("Information");
        let info = coordinator.dynamic_info();
        egui::Grid::new("media_info_grid")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                let mut keys: Vec<&String> = info.metadata.keys().collect();
                keys.sort();
                for key in keys {
                    ui.label(key);
                    ui.label(&info.metadata[key]);
                    ui.end_row();
                }
                if info.fps > 0.0 {
                    ui.label("FPS");
                    ui.label(format!("{:.2}", info.fps));
                    ui.end_row();
                }
                if info.video_bitrate > 0 {
                    ui.label("Video bitrate");
                    ui.label(format!("{}/s", format_size(info.video_bitrate)));
                    ui.end_row();
                }
                if info.audio_bitrate > 0 {
                    ui.label("Audio bitrate");
                    ui.label(format!("{}/s", format_size(info.audio_bitrate)));
                    ui.end_row();
                }
                ui.label("Dropped frames");
                ui.label(info.dropped_frames.to_string());
                ui.end_row();
                if info.file_size > 0 {
                    ui.label("File size");
                    ui.label(format_size(info.file_size));
                    ui.end_row();
                }
                if let Some(url) = coordinator.url() {
                    ui.label("Source");
                    ui.label(url);
                    ui.end_row();
                }
            });
    }
}
