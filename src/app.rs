// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! The app owns the annotation [`Session`] and the surface controller and
//! wires egui panels, menus and native dialogs to them. Raster decoding and
//! document parsing run on a background thread and are picked up on the next
//! frame.

use crate::ui::{canvas, properties, toolbar};
use dentmark::config::Settings;
use dentmark::controller::fullscreen::FullscreenState;
use dentmark::controller::surface::{Mode, SurfaceController};
use dentmark::io::document::{self, Document};
use dentmark::io::export::{get_all_images_for_export, marker_summary_text, write_png};
use dentmark::io::media::{ImageLoader, LoadedImage, RasterLoader};
use dentmark::models::image::NewImage;
use dentmark::models::marker::Point;
use dentmark::models::session::{Confirm, Session};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::time::Instant;

/// Confirmation through a native yes/no dialog.
struct DialogConfirm;

impl Confirm for DialogConfirm {
    fn confirm(&self, message: &str) -> bool {
        let answer = rfd::MessageDialog::new()
            .set_title("Confirm")
            .set_description(message)
            .set_buttons(rfd::MessageButtons::YesNo)
            .show();
        matches!(answer, rfd::MessageDialogResult::Yes)
    }
}

/// Result of a background load.
enum Loaded {
    Images(Vec<(PathBuf, LoadedImage)>),
    Document(Document),
}

/// Main application state.
pub struct DentmarkApp {
    session: Session,
    controller: SurfaceController,
    fullscreen: FullscreenState,
    loader: ImageLoader,

    /// Display textures keyed by image URL
    textures: HashMap<String, egui::TextureHandle>,

    /// Size slider shown in the toolbar
    size_slider: f64,

    /// Last container size reported by the canvas
    last_container: Option<(f64, f64)>,

    /// Receiver for background loading
    background: Option<Receiver<Result<Loaded, String>>>,

    /// Loading state message
    loading_message: Option<String>,
}

impl DentmarkApp {
    pub fn new(settings: Settings) -> Self {
        Self {
            session: Session::new(&settings),
            controller: SurfaceController::new(&settings),
            fullscreen: FullscreenState::default(),
            loader: ImageLoader,
            textures: HashMap::new(),
            size_slider: 0.0,
            last_container: None,
            background: None,
            loading_message: None,
        }
    }

    /// Decode picked image files in the background.
    fn add_image_files(&mut self, paths: Vec<PathBuf>) {
        let (sender, receiver) = channel();
        self.background = Some(receiver);
        self.loading_message = Some(format!("Loading {} image(s)...", paths.len()));

        std::thread::spawn(move || {
            let mut loaded = Vec::new();
            for path in paths {
                match dentmark::io::media::load_image(&path) {
                    Ok(img) => {
                        log::info!("Loaded image: {} ({}x{})", path.display(), img.width, img.height);
                        loaded.push((path, img));
                    }
                    Err(e) => log::error!("Failed to load image {}: {}", path.display(), e),
                }
            }
            let result = if loaded.is_empty() {
                Err("No image could be loaded".to_string())
            } else {
                Ok(Loaded::Images(loaded))
            };
            let _ = sender.send(result);
        });
    }

    /// Parse a marker document in the background.
    fn open_document(&mut self, path: PathBuf) {
        let (sender, receiver) = channel();
        self.background = Some(receiver);
        self.loading_message = Some("Loading markers...".to_string());

        std::thread::spawn(move || {
            let result = document::import_json(&path)
                .map(Loaded::Document)
                .map_err(|e| format!("Failed to import {}: {}", path.display(), e));
            let _ = sender.send(result);
        });
    }

    fn finish_loading(&mut self, ctx: &egui::Context, loaded: Loaded) {
        match loaded {
            Loaded::Images(images) => {
                for (path, img) in images {
                    let url = path.to_string_lossy().to_string();
                    let description = path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default();
                    self.insert_texture(ctx, &url, &img);
                    self.session.add_image(NewImage {
                        image_url: url,
                        description,
                        natural_size: (img.width, img.height),
                    });
                }
                let needs_surface = self
                    .session
                    .current_image()
                    .is_some_and(|i| i.surface().is_none());
                if let (true, Some(index)) = (needs_surface, self.session.active_index()) {
                    self.switch_image(index);
                }
            }
            Loaded::Document(doc) => {
                if self.session.load_document(&doc, &self.loader) {
                    self.controller.reset();
                    log::info!("Markers loaded");
                } else {
                    log::warn!("Marker document could not be applied");
                }
            }
        }
    }

    fn insert_texture(&mut self, ctx: &egui::Context, url: &str, img: &LoadedImage) {
        let size = [img.width as usize, img.height as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, img.pixels.as_raw());
        let texture = ctx.load_texture(url, color_image, egui::TextureOptions::LINEAR);
        self.textures.insert(url.to_string(), texture);
    }

    /// Make sure the active image has a texture; decodes on demand after a
    /// document load or crop.
    fn ensure_texture(&mut self, ctx: &egui::Context) {
        let Some(url) = self.session.current_image().map(|i| i.image_url.clone()) else {
            return;
        };
        if self.textures.contains_key(&url) {
            return;
        }
        match self.loader.load(&url) {
            Ok(img) => self.insert_texture(ctx, &url, &img),
            Err(e) => {
                log::warn!("No texture for active image: {}", e);
                // Placeholder so the failure is not retried every frame.
                let blank = egui::ColorImage::new([1, 1], egui::Color32::from_gray(60));
                let texture = ctx.load_texture(&url, blank, egui::TextureOptions::LINEAR);
                self.textures.insert(url, texture);
            }
        }
    }

    fn switch_image(&mut self, index: usize) {
        self.controller.reset();
        if !self.session.switch_image(index, &self.loader) {
            log::warn!("Image {} has no surface", index);
        }
    }

    /// Save markers of all images, format chosen by extension.
    fn save_document(&self, path: PathBuf) {
        let doc = self.session.to_document();
        let extension = path.extension().and_then(|s| s.to_str());
        let result = match extension {
            Some("yaml") | Some("yml") => document::export_yaml(&doc, &path),
            Some("json") => document::export_json(&doc, &path),
            _ => {
                log::error!("Unsupported file extension: {:?}", extension);
                return;
            }
        };
        match result {
            Ok(()) => log::info!("Saved markers to {}", path.display()),
            Err(e) => log::error!("Failed to save markers: {}", e),
        }
    }

    /// Render every image at native resolution into `dir`, one after another.
    fn export_images(&self, dir: PathBuf) {
        let exported = get_all_images_for_export(&self.session, &self.loader);
        for (i, image) in exported.iter().enumerate() {
            let path = dir.join(format!("{:02}_{}.png", i + 1, image.id));
            if let Err(e) = write_png(&image.pixels, &path) {
                log::error!("Failed to write {}: {}", path.display(), e);
            }
        }
        log::info!("Exported {} images to {}", exported.len(), dir.display());
    }

    fn export_report(&self, path: PathBuf) {
        match std::fs::write(&path, marker_summary_text(&self.session)) {
            Ok(()) => log::info!("Wrote report to {}", path.display()),
            Err(e) => log::error!("Failed to write report: {}", e),
        }
    }

    fn undo(&mut self) {
        if self.session.undo() {
            self.controller.clear_selection();
            log::info!("Undo");
        }
    }

    fn redo(&mut self) {
        if self.session.redo() {
            self.controller.clear_selection();
            log::info!("Redo");
        }
    }

    fn zoom(&mut self, factor: f64) {
        let anchor = self
            .last_container
            .map_or(Point::default(), |(w, h)| Point::new(w / 2.0, h / 2.0));
        self.controller.zoom_at(&mut self.session, factor, anchor);
    }

    fn toggle_fullscreen(&mut self, ctx: &egui::Context) {
        let screen = ctx
            .input(|i| i.viewport().monitor_size)
            .map_or((1920.0, 1080.0), |s| (s.x as f64, s.y as f64));
        if self.fullscreen.toggle(&mut self.session, screen) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(self.fullscreen.is_active()));
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Add Image...").clicked() {
                    if let Some(paths) = rfd::FileDialog::new()
                        .add_filter("Images", &["jpg", "jpeg", "png", "bmp", "tiff", "tif"])
                        .pick_files()
                    {
                        self.add_image_files(paths);
                    }
                    ui.close_menu();
                }
                if ui.button("Open Markers...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Markers", &["json"])
                        .pick_file()
                    {
                        self.open_document(path);
                    }
                    ui.close_menu();
                }
                ui.separator();
                ui.menu_button("Save Markers", |ui| {
                    if ui.button("Save as JSON...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("JSON", &["json"])
                            .set_file_name("markers.json")
                            .save_file()
                        {
                            self.save_document(path);
                        }
                        ui.close_menu();
                    }
                    if ui.button("Save as YAML...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("YAML", &["yaml", "yml"])
                            .set_file_name("markers.yaml")
                            .save_file()
                        {
                            self.save_document(path);
                        }
                        ui.close_menu();
                    }
                });
                ui.menu_button("Export", |ui| {
                    if ui.button("Images as PNG...").clicked() {
                        if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                            self.export_images(dir);
                        }
                        ui.close_menu();
                    }
                    if ui.button("Report as TXT...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Text", &["txt"])
                            .set_file_name("report.txt")
                            .save_file()
                        {
                            self.export_report(path);
                        }
                        ui.close_menu();
                    }
                });
                ui.separator();
                if ui.button("Quit").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });

            ui.menu_button("Edit", |ui| {
                if ui
                    .add_enabled(self.session.can_undo(), egui::Button::new("Undo (Ctrl+Z)"))
                    .clicked()
                {
                    self.undo();
                    ui.close_menu();
                }
                if ui
                    .add_enabled(self.session.can_redo(), egui::Button::new("Redo (Ctrl+Shift+Z)"))
                    .clicked()
                {
                    self.redo();
                    ui.close_menu();
                }
                ui.separator();
                if ui
                    .add_enabled(self.controller.delete_enabled(), egui::Button::new("Delete Selected"))
                    .clicked()
                {
                    self.controller.delete_selection(&mut self.session);
                    ui.close_menu();
                }
            });

            ui.menu_button("View", |ui| {
                if ui.button("Zoom In").clicked() {
                    self.zoom(1.25);
                    ui.close_menu();
                }
                if ui.button("Zoom Out").clicked() {
                    self.zoom(0.8);
                    ui.close_menu();
                }
                if ui.button("Reset Zoom").clicked() {
                    self.controller.reset_view(&mut self.session);
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Toggle Fullscreen (F11)").clicked() {
                    self.toggle_fullscreen(ctx);
                    ui.close_menu();
                }
            });
        });
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.controller.set_mode(&mut self.session, Mode::Idle);
            self.controller.clear_selection();
        }
        if ctx.input(|i| i.key_pressed(egui::Key::F11)) {
            self.toggle_fullscreen(ctx);
        }
        if ctx.wants_keyboard_input() {
            return;
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace)) {
            self.controller.delete_selection(&mut self.session);
        }
        if ctx.input(|i| i.modifiers.command && i.key_pressed(egui::Key::Z) && !i.modifiers.shift) {
            self.undo();
        }
        if ctx.input(|i| {
            (i.modifiers.command && i.modifiers.shift && i.key_pressed(egui::Key::Z))
                || (i.modifiers.command && i.key_pressed(egui::Key::Y))
        }) {
            self.redo();
        }
    }

    fn handle_canvas(&mut self, action: canvas::CanvasAction) {
        let now = Instant::now();
        let session = &mut self.session;
        match action {
            canvas::CanvasAction::PointerDown(p) => {
                self.controller.pointer_down(session, p, now);
            }
            canvas::CanvasAction::PointerMove(p) => {
                self.controller.pointer_move(session, p);
            }
            canvas::CanvasAction::PointerUp(p) => {
                self.controller.pointer_up(session, p, now);
            }
            canvas::CanvasAction::DoubleClick(p) => {
                self.controller.double_click(session, p);
            }
            canvas::CanvasAction::Zoom(factor, anchor) => {
                self.controller.zoom_at(session, factor, anchor);
            }
            canvas::CanvasAction::None => {}
        }
    }
}

impl eframe::App for DentmarkApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for completed background loading
        if let Some(ref receiver) = self.background {
            if let Ok(result) = receiver.try_recv() {
                self.background = None;
                self.loading_message = None;
                match result {
                    Ok(loaded) => self.finish_loading(ctx, loaded),
                    Err(e) => log::error!("{}", e),
                }
            }
        }
        if self.loading_message.is_some() {
            ctx.request_repaint();
        }

        let now = Instant::now();
        if self.controller.tick(&mut self.session, now) {
            log::debug!("Surface refitted to {:?}", self.session.container());
        }
        self.ensure_texture(ctx);

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| self.menu_bar(ctx, ui));

        let toolbar_action = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| toolbar::show(ui, &mut self.session, &mut self.size_slider))
            .inner;
        match toolbar_action {
            toolbar::ToolbarAction::SetMode(mode) => {
                self.controller.set_mode(&mut self.session, mode);
            }
            toolbar::ToolbarAction::SizeSlider(value) => {
                let changed = self.controller.apply_size_slider(&mut self.session, value);
                log::debug!("Size slider {:.1} applied to {} markers", value, changed);
            }
            toolbar::ToolbarAction::ApplyCrop => {
                if !self.controller.apply_crop(&mut self.session, &self.loader) {
                    log::warn!("Crop was not applied");
                }
            }
            toolbar::ToolbarAction::AspectRatio(ratio) => {
                if let Some(bounds) = self
                    .session
                    .current_image()
                    .and_then(|i| i.surface())
                    .map(|s| s.bounds())
                {
                    self.controller.crop.set_aspect_ratio(ratio, &bounds);
                }
            }
            toolbar::ToolbarAction::None => {}
        }

        let properties_action = egui::SidePanel::right("images")
            .default_width(260.0)
            .show(ctx, |ui| properties::show(ui, &self.session))
            .inner;
        match properties_action {
            properties::PropertiesAction::SelectImage(index) => self.switch_image(index),
            properties::PropertiesAction::RemoveImage(index) => {
                if self.session.remove_image(index, &DialogConfirm) {
                    self.controller.reset();
                    if let Some(active) = self.session.active_index() {
                        self.switch_image(active);
                    }
                }
            }
            properties::PropertiesAction::SetWorkMode(mode) => {
                if self.session.images().is_empty()
                    || DialogConfirm.confirm("Changing the work mode removes all images. Continue?")
                {
                    self.session.set_work_mode(mode);
                    self.controller.reset();
                    self.textures.clear();
                }
            }
            properties::PropertiesAction::None => {}
        }

        self.handle_keys(ctx);

        let (canvas_action, available) = egui::CentralPanel::default()
            .show(ctx, |ui| {
                if let Some(ref message) = self.loading_message {
                    ui.centered_and_justified(|ui| {
                        ui.vertical_centered(|ui| {
                            ui.add_space(20.0);
                            ui.spinner();
                            ui.add_space(10.0);
                            ui.label(
                                egui::RichText::new(message)
                                    .size(16.0)
                                    .color(egui::Color32::from_gray(200)),
                            );
                        });
                    });
                    (canvas::CanvasAction::None, ui.available_size())
                } else {
                    let texture = self
                        .session
                        .current_image()
                        .and_then(|i| self.textures.get(&i.image_url));
                    canvas::show(ui, &self.session, &self.controller, texture)
                }
            })
            .inner;
        self.handle_canvas(canvas_action);

        let container = (available.x as f64, available.y as f64);
        if container.0 > 1.0 && container.1 > 1.0 && self.last_container != Some(container) {
            self.last_container = Some(container);
            self.controller.on_resize(container.0, container.1, now);
        }

        if self.controller.take_preview().is_some() || self.controller.resize_pending() {
            ctx.request_repaint();
        }
    }
}
