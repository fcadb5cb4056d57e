//! Vireo - a cross-platform video player
//! eframe/egui shell around a decoupled playback coordinator

// Hide console window on Windows release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

// Use mimalloc for faster memory allocation (Linux, macOS)
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::Path;

use eframe::egui;
use tracing::info;

mod config;
mod controls;
mod coordinator;
mod engine;
mod ffmpeg_player;
mod models;
mod settings;
mod subtitle;
mod video_view;

use config::AppConfig;
use controls::{ControlsOverlay, LayoutClass, OverlayVisibility};
use coordinator::PlaybackCoordinator;
use ffmpeg_player::FfmpegEngine;
use settings::SettingsWindow;
use subtitle::{is_subtitle_file, DirectorySource, SubtitleInfo, SubtitleModel, SubtitleOrigin};
use video_view::VideoSurface;

/// Application icon: a play triangle on a dark rounded square.
fn load_icon() -> egui::IconData {
    let size: usize = 64;
    let mut rgba = vec![0u8; size * size * 4];

    for y in 0..size {
        for x in 0..size {
            let idx = (y * size + x) * 4;
            let nx = x as f32 / size as f32;
            let ny = y as f32 / size as f32;

            // Rounded rectangle background
            let corner_radius = 0.125;
            let in_rounded_rect = {
                let dx = if nx < corner_radius {
                    corner_radius - nx
                } else if nx > 1.0 - corner_radius {
                    nx - (1.0 - corner_radius)
                } else {
                    0.0
                };
                let dy = if ny < corner_radius {
                    corner_radius - ny
                } else if ny > 1.0 - corner_radius {
                    ny - (1.0 - corner_radius)
                } else {
                    0.0
                };
                dx * dx + dy * dy <= corner_radius * corner_radius
            };
            if !in_rounded_rect {
                continue;
            }

            // Teal-to-blue gradient background
            let t = nx * 0.5 + ny * 0.5;
            let r = (30.0 + (40.0 - 30.0) * t) as u8;
            let g = (160.0 + (100.0 - 160.0) * t) as u8;
            let b = (150.0 + (210.0 - 150.0) * t) as u8;

            // Play triangle in the center
            let px = nx - 0.38;
            let py = ny - 0.5;
            let in_play = px >= 0.0 && px <= 0.3 && py.abs() <= (0.3 - px) * 0.66;

            if in_play {
                rgba[idx] = 255;
                rgba[idx + 1] = 255;
                rgba[idx + 2] = 255;
            } else {
                rgba[idx] = r;
                rgba[idx + 1] = g;
                rgba[idx + 2] = b;
            }
            rgba[idx + 3] = 255;
        }
    }

    egui::IconData {
        rgba,
        width: size as u32,
        height: size as u32,
    }
}

/// Media file extensions offered by the open dialog.
const MEDIA_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "webm", "ts", "m2ts", "flv", "wmv", "mp3", "flac", "aac", "ogg",
];

fn main() -> Result<(), eframe::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("vireo=info")),
        )
        .init();

    // Force X11 backend on Linux before any windowing code runs
    #[cfg(target_os = "linux")]
    {
        std::env::set_var("WINIT_UNIX_BACKEND", "x11");
        std::env::remove_var("WAYLAND_DISPLAY");
    }

    let icon = load_icon();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 650.0])
            .with_min_inner_size([480.0, 320.0])
            .with_icon(icon)
            .with_drag_and_drop(true),
        vsync: true,
        hardware_acceleration: eframe::HardwareAcceleration::Preferred,
        ..Default::default()
    };

    eframe::run_native(
        "Vireo",
        options,
        Box::new(|cc| {
            // Add emoji font support
            let mut fonts = egui::FontDefinitions::default();

            #[cfg(target_os = "windows")]
            {
                if let Ok(font_data) = std::fs::read("C:\\Windows\\Fonts\\seguiemj.ttf") {
                    fonts.font_data.insert(
                        "emoji".to_owned(),
                        egui::FontData::from_owned(font_data).into(),
                    );
                    fonts
                        .families
                        .entry(egui::FontFamily::Proportional)
                        .or_default()
                        .push("emoji".to_owned());
                }
            }

            #[cfg(target_os = "linux")]
            {
                let emoji_paths = [
                    "/usr/share/fonts/truetype/noto/NotoColorEmoji.ttf",
                    "/usr/share/fonts/noto-emoji/NotoColorEmoji.ttf",
                    "/usr/share/fonts/google-noto-emoji/NotoColorEmoji.ttf",
                    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
                ];
                for path in emoji_paths {
                    if let Ok(font_data) = std::fs::read(path) {
                        fonts.font_data.insert(
                            "emoji".to_owned(),
                            egui::FontData::from_owned(font_data).into(),
                        );
                        fonts
                            .families
                            .entry(egui::FontFamily::Proportional)
                            .or_default()
                            .push("emoji".to_owned());
                        break;
                    }
                }
            }

            #[cfg(target_os = "macos")]
            {
                if let Ok(font_data) =
                    std::fs::read("/System/Library/Fonts/Apple Color Emoji.ttc")
                {
                    fonts.font_data.insert(
                        "emoji".to_owned(),
                        egui::FontData::from_owned(font_data).into(),
                    );
                    fonts
                        .families
                        .entry(egui::FontFamily::Proportional)
                        .or_default()
                        .push("emoji".to_owned());
                }
            }

            cc.egui_ctx.set_fonts(fonts);

            let config = AppConfig::load();
            if config.dark_mode {
                cc.egui_ctx.set_visuals(egui::Visuals::dark());
            } else {
                cc.egui_ctx.set_visuals(egui::Visuals::light());
            }
            // Font size preference scales the whole UI
            if config.font_size != 12 {
                cc.egui_ctx.set_zoom_factor(config.font_size as f32 / 12.0);
            }
            Ok(Box::new(VireoApp::new(config)))
        }),
    )
}

struct VireoApp {
    coordinator: PlaybackCoordinator,
    config: AppConfig,
    surface: VideoSurface,
    overlay: OverlayVisibility,
    settings: SettingsWindow,
    show_settings: bool,
    show_open_url: bool,
    url_input: String,
    title: String,
    fullscreen: bool,
}

impl VireoApp {
    fn new(config: AppConfig) -> Self {
        let mut subtitles = SubtitleModel::new(config.subtitle_search_url.clone());
        subtitles.add_source(Box::new(DirectorySource));
        let mut coordinator =
            PlaybackCoordinator::new(Box::new(FfmpegEngine::new()), subtitles);
        coordinator.set_volume(config.volume);
        coordinator.set_muted(config.muted);
        coordinator.set_rate(config.playback_rate);
        coordinator.set_aspect_fill(config.aspect_fill);

        Self {
            coordinator,
            config,
            surface: VideoSurface::new(),
            overlay: OverlayVisibility::new(),
            settings: SettingsWindow::default(),
            show_settings: false,
            show_open_url: false,
            url_input: String::new(),
            title: String::new(),
            fullscreen: false,
        }
    }

    fn open(&mut self, url: &str) {
        info!(url, "opening media");
        self.title = Path::new(url)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| url.to_string());
        self.surface.clear();
        self.coordinator.open(url);
        self.config.add_recent(url);
        self.config.save();
        self.overlay.note_activity();
    }

    /// Sidecar subtitle picked or dropped while media is open.
    fn add_subtitle_file(&mut self, path: &Path) {
        let info = SubtitleInfo {
            id: format!("file:{}", path.display()),
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            origin: SubtitleOrigin::File(path.to_path_buf()),
        };
        let id = info.id.clone();
        self.coordinator.subtitles_mut().merge(vec![info]);
        self.coordinator.select_subtitle(Some(id));
    }

    fn open_file_dialog(&mut self) {
        let picked = rfd::FileDialog::new()
            .set_title("Open Media")
            .add_filter("Media", MEDIA_EXTENSIONS)
            .add_filter("Subtitles", subtitle::SUBTITLE_EXTENSIONS)
            .add_filter("All Files", &["*"])
            .pick_file();
        if let Some(path) = picked {
            if is_subtitle_file(&path) {
                self.add_subtitle_file(&path);
            } else {
                self.open(&path.display().to_string());
            }
        }
    }

    fn set_fullscreen(&mut self, ctx: &egui::Context, on: bool) {
        self.fullscreen = on;
        ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(on));
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        // Don't steal keys from text fields
        if ctx.wants_keyboard_input() {
            return;
        }
        let skip = self.config.skip_seconds;
        ctx.input(|i| {
            if i.key_pressed(egui::Key::Space) {
                self.coordinator.toggle_play_pause();
            }
            if i.key_pressed(egui::Key::ArrowLeft) {
                self.coordinator.skip(-skip);
            }
            if i.key_pressed(egui::Key::ArrowRight) {
                self.coordinator.skip(skip);
            }
            if i.key_pressed(egui::Key::ArrowUp) {
                let volume = self.coordinator.volume();
                self.coordinator.set_volume(volume + 0.2);
            }
            if i.key_pressed(egui::Key::ArrowDown) {
                let volume = self.coordinator.volume();
                self.coordinator.set_volume(volume - 0.2);
            }
            if i.key_pressed(egui::Key::M) {
                self.coordinator.toggle_muted();
            }
            if i.key_pressed(egui::Key::I) {
                self.show_settings = !self.show_settings;
            }
            if i.key_pressed(egui::Key::F) {
                self.fullscreen = !self.fullscreen;
            }
            if i.key_pressed(egui::Key::Escape) {
                if self.show_settings {
                    self.show_settings = false;
                } else if self.overlay.visible() && self.coordinator.state().is_playing() {
                    self.overlay.hide();
                } else if self.fullscreen {
                    self.fullscreen = false;
                }
            }
        });
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped: Vec<_> = ctx.input(|i| i.raw.dropped_files.clone());
        for file in dropped {
            if let Some(path) = file.path {
                if is_subtitle_file(&path) {
                    self.add_subtitle_file(&path);
                } else {
                    self.open(&path.display().to_string());
                }
            }
        }
    }

    /// Sync coordinator preferences back into the persisted config.
    fn sync_config(&mut self) {
        self.config.volume = self.coordinator.volume();
        self.config.muted = self.coordinator.is_muted();
        self.config.playback_rate = self.coordinator.rate();
        self.config.aspect_fill = self.coordinator.aspect_fill();
    }

    fn menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("📁 Open File...").clicked() {
                        ui.close();
                        self.open_file_dialog();
                    }
                    if ui.button("🌐 Open URL...").clicked() {
                        ui.close();
                        self.show_open_url = true;
                    }
                    if !self.config.recent_files.is_empty() {
                        ui.separator();
                        let recent = self.config.recent_files.clone();
                        for url in recent {
                            let name = Path::new(&url)
                                .file_name()
                                .map(|n| n.to_string_lossy().into_owned())
                                .unwrap_or_else(|| url.clone());
                            if ui.button(name).clicked() {
                                ui.close();
                                self.open(&url);
                            }
                        }
                    }
                });
                ui.menu_button("View", |ui| {
                    if ui.button("⛶ Fullscreen").clicked() {
                        ui.close();
                        self.fullscreen = !self.fullscreen;
                    }
                    if ui.button("⚙ Video Settings").clicked() {
                        ui.close();
                        self.show_settings = !self.show_settings;
                    }
                });
            });
        });
    }

    fn open_url_window(&mut self, ctx: &egui::Context) {
        if !self.show_open_url {
            return;
        }
        let mut open = true;
        let mut submitted = false;
        egui::Window::new("🌐 Open URL")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let response = ui.text_edit_singleline(&mut self.url_input);
                    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        submitted = true;
                    }
                    if ui.button("Open").clicked() {
                        submitted = true;
                    }
                });
            });
        if submitted && !self.url_input.trim().is_empty() {
            let url = self.url_input.trim().to_string();
            self.open(&url);
            self.show_open_url = false;
        } else {
            self.show_open_url = open && !submitted;
        }
    }
}

impl eframe::App for VireoApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.coordinator.pump();

        let frame = self.coordinator.take_frame();
        self.surface.update(ctx, frame);

        let was_fullscreen = self.fullscreen;
        self.handle_keys(ctx);
        self.handle_dropped_files(ctx);
        if self.fullscreen != was_fullscreen {
            let on = self.fullscreen;
            self.set_fullscreen(ctx, on);
        }

        // Pointer or key activity reveals the overlay
        let activity = ctx.input(|i| {
            i.pointer.delta() != egui::Vec2::ZERO
                || i.pointer.any_pressed()
                || !i.keys_down.is_empty()
        });
        if activity {
            self.overlay.note_activity();
        }
        let hold = self.coordinator.is_scrubbing() || self.show_settings || self.show_open_url;
        self.overlay
            .tick(self.coordinator.state().is_playing(), hold);

        if !self.fullscreen {
            self.menu_bar(ctx);
        }

        if self.overlay.visible() && self.coordinator.url().is_some() {
            egui::TopBottomPanel::bottom("controls")
                .frame(
                    egui::Frame::default()
                        .fill(egui::Color32::from_black_alpha(200))
                        .inner_margin(8),
                )
                .show(ctx, |ui| {
                    let layout = LayoutClass::from_width(ctx.screen_rect().width());
                    ControlsOverlay::show(
                        ui,
                        &mut self.coordinator,
                        &self.title,
                        self.config.skip_seconds,
                        layout,
                        &mut self.show_settings,
                    );
                });
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::default().fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                let rect = ui.available_rect_before_wrap();
                let response = ui.allocate_rect(rect, egui::Sense::click());

                if self.surface.has_frame() {
                    self.surface
                        .paint(ui, rect, self.coordinator.aspect_fill());
                } else if self.coordinator.url().is_none() {
                    ui.scope_builder(egui::UiBuilder::new().max_rect(rect), |ui| {
                        ui.centered_and_justified(|ui| {
                            ui.label(
                                egui::RichText::new("Drop a file here or use File ▸ Open")
                                    .size(18.0)
                                    .color(egui::Color32::GRAY),
                            );
                        });
                    });
                }

                if response.clicked() {
                    self.overlay.toggle();
                }
                if response.double_clicked() {
                    let on = !self.fullscreen;
                    self.set_fullscreen(ctx, on);
                }
            });

        if self.show_settings {
            let mut open = self.show_settings;
            let languages = self.config.subtitle_languages.clone();
            self.settings
                .show(ctx, &mut open, &mut self.coordinator, &languages);
            self.show_settings = open;
        }

        self.open_url_window(ctx);
        self.sync_config();

        // Keep frames coming while media is in motion
        if self.coordinator.state().is_playing() {
            ctx.request_repaint();
        } else {
            ctx.request_repaint_after(std::time::Duration::from_millis(250));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.sync_config();
        self.config.save();
        self.coordinator.stop();
    }
}
