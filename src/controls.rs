//! Transport controls overlay: playback buttons, track menus, time bar

use std::time::{Duration, Instant};

use eframe::egui;

use crate::coordinator::PlaybackCoordinator;
use crate::models::{
    format_duration, transport_indicator, TrackId, TrackKind, TransportIndicator, PLAYBACK_RATES,
};

/// Controls disappear after this much pointer/key inactivity while playing.
pub const OVERLAY_HIDE_AFTER: Duration = Duration::from_secs(4);

/// Width classes standing in for the per-platform layout splits of the
/// usual phone/TV/desktop builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutClass {
    Compact,
    Regular,
}

impl LayoutClass {
    pub fn from_width(width: f32) -> Self {
        if width < 700.0 {
            LayoutClass::Compact
        } else {
            LayoutClass::Regular
        }
    }

    /// Volume slider width scales with the window in regular layouts.
    pub fn volume_slider_width(self, window_width: f32) -> f32 {
        match self {
            LayoutClass::Compact => 60.0,
            LayoutClass::Regular => window_width / 6.0,
        }
    }
}

/// Whether the overlay should hide, given inactivity time and context.
/// Paused or held (scrubbing, open menu, settings) overlays never hide.
pub fn overlay_should_hide(inactive_for: Duration, playing: bool, hold: bool) -> bool {
    playing && !hold && inactive_for >= OVERLAY_HIDE_AFTER
}

/// The `isMaskShow` of this player: tracks overlay visibility from user
/// activity.
pub struct OverlayVisibility {
    visible: bool,
    last_activity: Instant,
}

impl OverlayVisibility {
    pub fn new() -> Self {
        Self {
            visible: true,
            last_activity: Instant::now(),
        }
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Any pointer or key activity shows the controls and restarts the timer.
    pub fn note_activity(&mut self) {
        self.visible = true;
        self.last_activity = Instant::now();
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn toggle(&mut self) {
        if self.visible {
            self.visible = false;
        } else {
            self.note_activity();
        }
    }

    /// Advance the auto-hide timer once per frame.
    pub fn tick(&mut self, playing: bool, hold: bool) {
        if self.visible && overlay_should_hide(self.last_activity.elapsed(), playing, hold) {
            self.visible = false;
        }
    }
}

pub struct ControlsOverlay;

impl ControlsOverlay {
    /// Draw the full overlay: option row, transport row, title row, time bar.
    pub fn show(
        ui: &mut egui::Ui,
        coordinator: &mut PlaybackCoordinator,
        title: &str,
        skip_seconds: f64,
        layout: LayoutClass,
        show_settings: &mut bool,
    ) {
        Self::option_row(ui, coordinator, layout, show_settings);
        ui.add_space(4.0);
        Self::transport_row(ui, coordinator, skip_seconds);
        if layout == LayoutClass::Regular {
            Self::title_row(ui, coordinator, title);
        }
        ui.add_space(4.0);
        Self::time_row(ui, coordinator);
    }

    fn option_row(
        ui: &mut egui::Ui,
        coordinator: &mut PlaybackCoordinator,
        layout: LayoutClass,
        show_settings: &mut bool,
    ) {
        ui.horizontal(|ui| {
            let mute_icon = if coordinator.is_muted() { "🔇" } else { "🔊" };
            if ui.button(mute_icon).on_hover_text("Mute").clicked() {
                coordinator.toggle_muted();
            }

            let window_width = ui.ctx().screen_rect().width();
            let mut volume = coordinator.volume();
            let slider = egui::Slider::new(&mut volume, 0.0..=1.0).show_value(false);
            let response = ui
                .scope(|ui| {
                    ui.spacing_mut().slider_width = layout.volume_slider_width(window_width);
                    ui.add(slider)
                })
                .inner;
            if response.changed() {
                coordinator.set_volume(volume);
            }

            let fill_label = if coordinator.aspect_fill() {
                "⛶ Fit"
            } else {
                "⛶ Fill"
            };
            if ui
                .button(fill_label)
                .on_hover_text("Toggle aspect fill")
                .clicked()
            {
                coordinator.toggle_aspect_fill();
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("ℹ").on_hover_text("Media info").clicked() {
                    *show_settings = !*show_settings;
                }
                Self::rate_menu(ui, coordinator);
                Self::subtitle_menu(ui, coordinator);
                Self::audio_menu(ui, coordinator);
            });
        });
    }

    fn transport_row(ui: &mut egui::Ui, coordinator: &mut PlaybackCoordinator, skip_seconds: f64) {
        ui.vertical_centered(|ui| {
            ui.horizontal(|ui| {
                let half = ui.available_width() / 2.0;
                ui.add_space(half - 90.0);

                let seekable = coordinator.seekable();
                if seekable {
                    let back = format!("⏪{}", skip_seconds as i64);
                    if ui.button(back).clicked() {
                        coordinator.skip(-skip_seconds);
                    }
                } else {
                    ui.add_space(44.0);
                }

                // Exactly one transport indicator is shown per state
                match transport_indicator(coordinator.state()) {
                    TransportIndicator::Play => {
                        let play = egui::RichText::new("▶").size(28.0);
                        if ui.button(play).clicked() {
                            coordinator.play();
                        }
                    }
                    TransportIndicator::Pause => {
                        let pause = egui::RichText::new("⏸").size(28.0);
                        if ui.button(pause).clicked() {
                            coordinator.pause();
                        }
                    }
                    TransportIndicator::Spinner => {
                        ui.add(egui::Spinner::new().size(32.0));
                    }
                    TransportIndicator::ErrorSlash => {
                        let slash = egui::RichText::new("🚫").size(28.0);
                        ui.add_enabled(false, egui::Button::new(slash));
                    }
                }

                if seekable {
                    let forward = format!("{}⏩", skip_seconds as i64);
                    if ui.button(forward).clicked() {
                        coordinator.skip(skip_seconds);
                    }
                }
            });
        });
    }

    fn title_row(ui: &mut egui::Ui, coordinator: &PlaybackCoordinator, title: &str) {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(title).strong());
            if let Some(error) = coordinator.last_error() {
                ui.colored_label(egui::Color32::RED, format!("⚠ {}", error));
            }
        });
    }

    fn time_row(ui: &mut egui::Ui, coordinator: &mut PlaybackCoordinator) {
        let time = coordinator.time();
        if time.is_live() {
            ui.horizontal(|ui| {
                ui.label("Live Streaming");
            });
            return;
        }

        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(format_duration(time.current_time)).monospace());

            let mut position = time.current_time;
            let slider_width = ui.available_width() - 60.0;
            let response = ui
                .scope(|ui| {
                    ui.spacing_mut().slider_width = slider_width.max(50.0);
                    ui.add(
                        egui::Slider::new(&mut position, 0.0..=time.total_time)
                            .show_value(false),
                    )
                })
                .inner;

            // The scrub contract: drags touch only the displayed time,
            // release issues the single seek. A stationary click on the rail
            // or a keyboard nudge never crosses the drag threshold, so value
            // changes outside a drag open a scrub too; the pointer going up
            // (or a change with no pointer down at all) closes it.
            if response.drag_started() {
                coordinator.begin_scrub();
            }
            if response.changed() {
                if !coordinator.is_scrubbing() {
                    coordinator.begin_scrub();
                }
                coordinator.scrub_to(position);
                if !ui.input(|i| i.pointer.primary_down()) {
                    coordinator.end_scrub();
                }
            }
            if response.drag_stopped() || (response.clicked() && coordinator.is_scrubbing()) {
                coordinator.end_scrub();
            }

            ui.label(egui::RichText::new(format_duration(time.total_time)).monospace());
        });
    }

    fn audio_menu(ui: &mut egui::Ui, coordinator: &mut PlaybackCoordinator) {
        let audio: Vec<(TrackId, String, bool)> = coordinator
            .tracks_of(TrackKind::Audio)
            .map(|t| (t.id, t.label.clone(), t.enabled))
            .collect();
        if audio.is_empty() {
            return;
        }
        let selected_label = audio
            .iter()
            .find(|(_, _, enabled)| *enabled)
            .map(|(_, label, _)| label.clone())
            .unwrap_or_else(|| "Audio".to_string());

        egui::ComboBox::from_id_salt("audio_track")
            .selected_text(format!("🎵 {}", selected_label))
            .show_ui(ui, |ui| {
                for (id, label, enabled) in &audio {
                    if ui.selectable_label(*enabled, label).clicked() {
                        coordinator.select_track(*id);
                    }
                }
            });
    }

    fn subtitle_menu(ui: &mut egui::Ui, coordinator: &mut PlaybackCoordinator) {
        let infos: Vec<(String, String)> = coordinator
            .subtitles()
            .infos()
            .iter()
            .map(|info| (info.id.clone(), info.name.clone()))
            .collect();
        if infos.is_empty() {
            return;
        }
        let selected = coordinator.subtitles().selected().cloned();
        let selected_name = coordinator
            .subtitles()
            .selected_info()
            .map(|info| info.name.clone())
            .unwrap_or_else(|| "Off".to_string());

        egui::ComboBox::from_id_salt("subtitle_track")
            .selected_text(format!("💬 {}", selected_name))
            .show_ui(ui, |ui| {
                if ui.selectable_label(selected.is_none(), "Off").clicked() {
                    coordinator.select_subtitle(None);
                }
                for (id, name) in &infos {
                    let active = selected.as_deref() == Some(id.as_str());
                    if ui.selectable_label(active, name).clicked() {
                        coordinator.select_subtitle(Some(id.clone()));
                    }
                }
            });
    }

    fn rate_menu(ui: &mut egui::Ui, coordinator: &mut PlaybackCoordinator) {
        let current = coordinator.rate();
        egui::ComboBox::from_id_salt("playback_rate")
            .selected_text(format!("{}x", current))
            .show_ui(ui, |ui| {
                for rate in PLAYBACK_RATES {
                    if ui.selectable_label(current == *rate, format!("{}x", rate)).clicked() {
                        coordinator.set_rate(*rate);
                    }
                }
            });
    }
}
