//! Video surface: uploads decoded frames and paints them fit or fill

use eframe::egui;

use crate::engine::VideoFrame;

/// Compute where the video lands inside the available rect. Fit letterboxes;
/// fill covers the whole rect and center-crops the overflow.
pub fn display_rect(available: egui::Rect, video_size: [f32; 2], aspect_fill: bool) -> egui::Rect {
    let [vw, vh] = video_size;
    if vw <= 0.0 || vh <= 0.0 {
        return available;
    }
    let sx = available.width() / vw;
    let sy = available.height() / vh;
    let scale = if aspect_fill { sx.max(sy) } else { sx.min(sy) };
    let size = egui::vec2(vw * scale, vh * scale);
    egui::Rect::from_center_size(available.center(), size)
}

/// Holds the egui texture for the latest decoded frame.
pub struct VideoSurface {
    texture: Option<egui::TextureHandle>,
}

impl VideoSurface {
    pub fn new() -> Self {
        Self { texture: None }
    }

    pub fn clear(&mut self) {
        self.texture = None;
    }

    pub fn has_frame(&self) -> bool {
        self.texture.is_some()
    }

    /// Upload a new frame if one arrived this frame.
    pub fn update(&mut self, ctx: &egui::Context, frame: Option<VideoFrame>) {
        if let Some(frame) = frame {
            let image = egui::ColorImage::from_rgb(
                [frame.width as usize, frame.height as usize],
                &frame.data,
            );
            self.texture = Some(ctx.load_texture("video_frame", image, egui::TextureOptions::LINEAR));
        }
    }

    /// Paint the current frame into `available`, clipped so fill mode crops
    /// instead of spilling into neighboring panels.
    pub fn paint(&self, ui: &mut egui::Ui, available: egui::Rect, aspect_fill: bool) {
        let painter = ui.painter().with_clip_rect(available);
        painter.rect_filled(available, 0.0, egui::Color32::BLACK);
        if let Some(ref texture) = self.texture {
            let rect = display_rect(available, texture.size_vec2().into(), aspect_fill);
            painter.image(
                texture.id(),
                rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
    }
}
