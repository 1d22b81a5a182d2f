//! Core application state and lifecycle.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use commboard_core::board::BoardError;
use commboard_core::editor::Editor;
use commboard_core::export::{ExportState, ExportTarget, RasterOptions, run_export};
use commboard_core::input::{InputState, MouseButton, PointerEvent};
use commboard_core::layout::{PageLayout, ViewTransform};
use commboard_render::{BoardRenderer, ImageCache, PAGE_MARGIN, RenderContext, Renderer};
use kurbo::{Point, Rect, Size};
use thiserror::Error;
use vello::util::RenderSurface;
use vello::wgpu::PresentMode;
use vello::{AaConfig, RenderParams, RendererOptions};
use winit::application::ApplicationHandler;
#[cfg(not(target_arch = "wasm32"))]
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, ModifiersState, NamedKey};
use winit::window::{Window, WindowId};

use crate::assets::{AssetEvent, AssetLoader};
use crate::config::AppConfig;
use crate::event_handler::EventHandler;
use crate::export::GpuExportBackend;
use crate::shortcuts::ShortcutRegistry;
use crate::ui::{BOARD_FULL_MESSAGE, ExportView, UiAction, UiState, render_ui};

/// Start-up failures. Nothing after start-up is fatal.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to create event loop: {0}")]
    EventLoop(String),
    #[error("Failed to create window: {0}")]
    Window(String),
    #[error("Failed to create surface: {0}")]
    Surface(String),
    #[error("Failed to create renderer: {0}")]
    Renderer(String),
}

#[cfg(target_arch = "wasm32")]
thread_local! {
    /// Surface created by the async initializer, waiting to be picked up by
    /// the event loop.
    static PENDING_SURFACE: RefCell<Option<(vello::util::RenderContext, RenderSurface<'static>)>> =
        const { RefCell::new(None) };
}

/// Map a winit button onto the buttons the editor tracks.
fn map_button(button: winit::event::MouseButton) -> Option<MouseButton> {
    match button {
        winit::event::MouseButton::Left => Some(MouseButton::Left),
        winit::event::MouseButton::Right => Some(MouseButton::Right),
        winit::event::MouseButton::Middle => Some(MouseButton::Middle),
        _ => None,
    }
}

/// Convert an egui rect in points to physical pixels.
fn to_physical(rect: egui::Rect, pixels_per_point: f32) -> Rect {
    let ppp = pixels_per_point as f64;
    Rect::new(
        rect.min.x as f64 * ppp,
        rect.min.y as f64 * ppp,
        rect.max.x as f64 * ppp,
        rect.max.y as f64 * ppp,
    )
}

/// Runtime state for the application.
struct AppState {
    // Windowing
    window: Arc<Window>,
    surface: RenderSurface<'static>,

    // Rendering
    vello_renderer: vello::Renderer,
    board_renderer: BoardRenderer,
    /// Texture blitter for RGBA->surface format conversion (needed for WebGPU/WASM)
    texture_blitter: vello::wgpu::util::TextureBlitter,
    images: ImageCache,

    // egui
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
    ui_state: UiState,
    /// Library tile textures keyed by image path.
    textures: HashMap<String, egui::TextureHandle>,

    // State
    editor: Editor,
    input: InputState,
    modifiers: ModifiersState,
    config: AppConfig,
    assets: AssetLoader,
    export: Rc<RefCell<ExportState>>,

    // Event handling
    event_handler: EventHandler,
    /// Canvas area left between the panels, in physical pixels.
    canvas_rect: Rect,
    /// Whether the page has been laid out at least once.
    frame_laid_out: bool,
}

impl AppState {
    /// Check if a screen position belongs to the panels rather than the page.
    fn is_over_ui(&self, position: Point) -> bool {
        self.ui_state.is_modal_open()
            || self.egui_ctx.is_pointer_over_area()
            || !self.canvas_rect.contains(position)
    }

    /// Start the catalog listing.
    fn load_catalog(&mut self) {
        if self.editor.begin_catalog_load() && !self.assets.load_catalog() {
            log::debug!("Catalog load already running");
        }
    }

    /// Apply finished loads and request any images now needed.
    fn process_assets(&mut self) {
        for event in self.assets.poll() {
            match event {
                AssetEvent::Catalog(listing) => {
                    let outcome = self.editor.finish_catalog_load(listing);
                    log::info!(
                        "Library has {} symbols{}",
                        self.editor.catalog.len(),
                        if outcome.is_fallback() { " (fallback)" } else { "" }
                    );
                    let stale = self
                        .ui_state
                        .popup
                        .as_deref()
                        .is_some_and(|id| !self.editor.catalog.contains(id));
                    if stale {
                        self.ui_state.close_popup();
                    }
                }
                AssetEvent::Image { path, bytes } => match bytes {
                    Ok(bytes) => {
                        if self.images.insert_bytes(&path, &bytes).is_ok() {
                            self.upload_texture(&path);
                        }
                    }
                    Err(e) => {
                        log::warn!("Failed to load image {}: {}", path, e);
                        self.images.mark_failed(&path);
                    }
                },
            }
        }

        let wanted: Vec<String> = self
            .editor
            .visible_symbols()
            .iter()
            .map(|s| s.image_path.clone())
            .chain(
                self.editor
                    .board
                    .slots()
                    .iter()
                    .flatten()
                    .map(|s| s.image_path.clone()),
            )
            .collect();
        let missing = self.images.missing(wanted.iter().map(String::as_str));
        self.assets.request_images(missing);
    }

    /// Create the egui texture for a decoded image.
    fn upload_texture(&mut self, path: &str) {
        if self.textures.contains_key(path) {
            return;
        }
        let Some(image) = self.images.get(path) else {
            return;
        };
        let color_image = egui::ColorImage::from_rgba_unmultiplied(
            [image.width as usize, image.height as usize],
            image.data.data(),
        );
        let handle = self
            .egui_ctx
            .load_texture(path, color_image, egui::TextureOptions::LINEAR);
        self.textures.insert(path.to_string(), handle);
    }

    /// Apply one UI action. Returns true if an export was requested.
    fn handle_ui_action(&mut self, action: UiAction) -> bool {
        match action {
            UiAction::SetQuery(query) => self.editor.filter.query = query,
            UiAction::ToggleTag(tag) => {
                self.editor.filter.toggle_tag(&tag);
            }
            UiAction::ClearFilter => self.editor.filter.clear(),
            UiAction::OpenPopup(id) => self.ui_state.open_popup(&id),
            UiAction::ClosePopup => self.ui_state.close_popup(),
            UiAction::AddSymbol(id) => match self.editor.add_to_board(&id) {
                Ok(index) => {
                    log::debug!("Added {} at cell {}", id, index);
                    self.ui_state.close_popup();
                }
                Err(BoardError::Full) => {
                    self.ui_state.popup_error = Some(BOARD_FULL_MESSAGE.to_string());
                }
                Err(e) => self.ui_state.popup_error = Some(e.to_string()),
            },
            UiAction::BeginDrag(id) => {
                let pointer = self.input.pointer_position.unwrap_or(Point::ZERO);
                if self.editor.begin_catalog_drag(&id, pointer) {
                    log::debug!("Dragging {} from the library", id);
                }
            }
            UiAction::ApplyPreset(index) => {
                if let Some(preset) = self.editor.config.presets.get(index).cloned() {
                    match self.editor.apply_preset(&preset) {
                        Ok(true) => log::info!("Grid set to {}", preset.label),
                        Ok(false) => {}
                        Err(e) => log::warn!("Preset {} rejected: {}", preset.label, e),
                    }
                }
            }
            UiAction::SetFontScale(scale) => {
                if let Err(e) = self.editor.set_font_scale(scale) {
                    log::warn!("Font scale rejected: {}", e);
                }
            }
            UiAction::ExportPng => return true,
            UiAction::DismissAlert => self.ui_state.alert = None,
        }
        false
    }

    /// Run an export through the window's GPU device.
    fn start_export(&mut self, render_cx: &vello::util::RenderContext) {
        if !self.editor.can_export() {
            log::debug!("Export ignored: board is empty");
            return;
        }
        if self.export.borrow_mut().try_begin().is_err() {
            return;
        }

        let target = self
            .frame_laid_out
            .then(|| ExportTarget::capture(&self.editor.board));
        let options = RasterOptions::with_scale(self.config.board.export_scale);
        let device_handle = &render_cx.devices[self.surface.dev_id];
        let mut backend = GpuExportBackend::new(
            device_handle.device.clone(),
            device_handle.queue.clone(),
            self.images.clone(),
            self.config.clone(),
        );
        let export = Rc::clone(&self.export);

        #[cfg(not(target_arch = "wasm32"))]
        {
            let result = pollster::block_on(run_export(
                &mut backend,
                target.as_ref(),
                &options,
                |phase| export.borrow_mut().report(&phase),
            ));
            self.images.merge(backend.images());
            export.borrow_mut().complete(result);
        }

        #[cfg(target_arch = "wasm32")]
        {
            let window = self.window.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let result = run_export(&mut backend, target.as_ref(), &options, |phase| {
                    export.borrow_mut().report(&phase)
                })
                .await;
                export.borrow_mut().complete(result);
                window.request_redraw();
            });
        }
    }

    fn handle_key(&mut self, key: &Key) -> bool {
        match key.as_ref() {
            Key::Named(NamedKey::Escape) => {
                if self.ui_state.alert.take().is_some() {
                    return false;
                }
                if self.ui_state.popup.is_some() {
                    self.ui_state.close_popup();
                } else if self.event_handler.cancel(&mut self.editor) {
                    log::debug!("Drag cancelled");
                }
                false
            }
            Key::Character(c) if self.modifiers.control_key() && c.eq_ignore_ascii_case("e") => {
                true
            }
            _ => false,
        }
    }

    fn handle_cursor_moved(&mut self, position: Point) {
        self.input
            .handle_pointer_event(PointerEvent::Move { position });
        let over_ui = self.is_over_ui(position);
        if self
            .event_handler
            .handle_move(&mut self.editor, position, over_ui)
        {
            self.window.request_redraw();
        }
    }

    fn handle_mouse_input(&mut self, pressed: bool, button: MouseButton) {
        let Some(position) = self.input.pointer_position else {
            return;
        };

        if pressed {
            // Presses over the panels belong to egui.
            if self.is_over_ui(position) {
                return;
            }
            self.input.begin_frame();
            self.input
                .handle_pointer_event(PointerEvent::Down { position, button });
            if button == MouseButton::Left {
                let result = self
                    .event_handler
                    .handle_press(&mut self.editor, &self.input, position);
                log::trace!("Canvas press: {:?}", result);
            }
        } else {
            self.input
                .handle_pointer_event(PointerEvent::Up { position, button });
            if button == MouseButton::Left {
                let over_ui = self.is_over_ui(position);
                if let Some(outcome) =
                    self.event_handler
                        .handle_release(&mut self.editor, position, over_ui)
                {
                    log::debug!("Drop finished: {:?}", outcome);
                }
            }
        }
        self.window.request_redraw();
    }

    /// Run the UI, lay out the page and draw a frame.
    fn render(&mut self, render_cx: &vello::util::RenderContext) {
        self.process_assets();

        {
            let mut export = self.export.borrow_mut();
            export.tick();
            if let Some(alert) = export.take_alert() {
                self.ui_state.alert = Some(alert);
            }
            // Keep drawing until the completion status clears.
            if export.time_until_clear().is_some() {
                self.window.request_redraw();
            }
        }

        // Run egui and collect actions
        let (is_exporting, status) = {
            let export = self.export.borrow();
            (export.is_exporting(), export.status().map(str::to_owned))
        };
        let export_view = ExportView {
            is_exporting,
            status: status.as_deref(),
        };
        let cursor = self
            .input
            .pointer_position
            .filter(|p| self.editor.drag.is_dragging() || !self.is_over_ui(*p))
            .map(|p| self.event_handler.cursor_for(&self.editor, p));

        let egui_input = self.egui_state.take_egui_input(&self.window);
        let mut ui_output = None;
        let full_output = self.egui_ctx.run(egui_input, |ctx| {
            ui_output = Some(render_ui(
                ctx,
                &mut self.ui_state,
                &self.editor,
                &self.textures,
                export_view,
            ));
            if let Some(cursor) = cursor {
                ctx.set_cursor_icon(cursor);
            }
        });
        let egui::FullOutput {
            platform_output,
            textures_delta,
            shapes,
            pixels_per_point,
            ..
        } = full_output;
        self.egui_state
            .handle_platform_output(&self.window, platform_output);
        let egui_primitives = self.egui_ctx.tessellate(shapes, pixels_per_point);

        let mut export_requested = false;
        if let Some(output) = ui_output {
            for action in output.actions {
                export_requested |= self.handle_ui_action(action);
            }
            self.canvas_rect = to_physical(output.canvas_rect, pixels_per_point);
        }
        if export_requested {
            self.start_export(render_cx);
        }

        // Lay out the page inside the canvas area
        let margin = PAGE_MARGIN * pixels_per_point as f64;
        let view = ViewTransform::fit(self.canvas_rect, margin);
        self.event_handler
            .update_view(PageLayout::for_board(&self.editor.board), view);
        self.frame_laid_out = true;

        let width = self.surface.config.width;
        let height = self.surface.config.height;
        let ctx = RenderContext::new(
            &self.editor.board,
            &self.editor.drag,
            &self.images,
            Size::new(width as f64, height as f64),
        )
        .with_view(view)
        .with_scale_factor(self.window.scale_factor())
        .with_background(self.config.background_color);
        self.board_renderer.build_scene(&ctx);
        let scene = self.board_renderer.take_scene();

        let device_handle = &render_cx.devices[self.surface.dev_id];
        let device = &device_handle.device;
        let queue = &device_handle.queue;

        let surface_texture = match self.surface.surface.get_current_texture() {
            Ok(t) => t,
            Err(e) => {
                log::warn!("Failed to get surface texture: {:?}", e);
                return;
            }
        };

        let params = RenderParams {
            base_color: self.config.background_color,
            width,
            height,
            antialiasing_method: AaConfig::Area,
        };

        // Vello's compute shaders need a StorageBinding target, which WebGPU
        // only supports for Rgba8Unorm; the surface may be Bgra8Unorm.
        let render_texture = device.create_texture(&vello::wgpu::TextureDescriptor {
            label: Some("vello render texture"),
            size: vello::wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: vello::wgpu::TextureDimension::D2,
            format: vello::wgpu::TextureFormat::Rgba8Unorm,
            usage: vello::wgpu::TextureUsages::STORAGE_BINDING
                | vello::wgpu::TextureUsages::COPY_SRC
                | vello::wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let render_texture_view =
            render_texture.create_view(&vello::wgpu::TextureViewDescriptor::default());

        if let Err(e) = self.vello_renderer.render_to_texture(
            device,
            queue,
            &scene,
            &render_texture_view,
            &params,
        ) {
            log::error!("Failed to render: {:?}", e);
            return;
        }

        let surface_view = surface_texture
            .texture
            .create_view(&vello::wgpu::TextureViewDescriptor::default());

        {
            let mut blit_encoder =
                device.create_command_encoder(&vello::wgpu::CommandEncoderDescriptor {
                    label: Some("blit encoder"),
                });
            self.texture_blitter.copy(
                device,
                &mut blit_encoder,
                &render_texture_view,
                &surface_view,
            );
            queue.submit(std::iter::once(blit_encoder.finish()));
        }

        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [width, height],
            pixels_per_point,
        };

        {
            let mut egui_encoder =
                device.create_command_encoder(&vello::wgpu::CommandEncoderDescriptor {
                    label: Some("egui encoder"),
                });
            self.egui_renderer.update_buffers(
                device,
                queue,
                &mut egui_encoder,
                &egui_primitives,
                &screen_descriptor,
            );

            let render_pass = egui_encoder.begin_render_pass(&vello::wgpu::RenderPassDescriptor {
                label: Some("egui render pass"),
                color_attachments: &[Some(vello::wgpu::RenderPassColorAttachment {
                    view: &surface_view,
                    resolve_target: None,
                    ops: vello::wgpu::Operations {
                        // Keep the page drawn by vello
                        load: vello::wgpu::LoadOp::Load,
                        store: vello::wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            // egui-wgpu wants a 'static render pass
            let mut render_pass = render_pass.forget_lifetime();
            self.egui_renderer
                .render(&mut render_pass, &egui_primitives, &screen_descriptor);
            drop(render_pass);

            queue.submit(std::iter::once(egui_encoder.finish()));
        }

        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
        surface_texture.present();
        self.window.request_redraw();
    }
}

/// Main application struct.
pub struct App {
    config: AppConfig,
    state: Option<AppState>,
    render_cx: Option<vello::util::RenderContext>,
    /// Window waiting for async surface creation (WASM only)
    pending_window: Option<Arc<Window>>,
    /// Flag to indicate async init is in progress
    #[cfg(target_arch = "wasm32")]
    init_in_progress: bool,
}

impl App {
    /// Create a new application with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            state: None,
            render_cx: None,
            pending_window: None,
            #[cfg(target_arch = "wasm32")]
            init_in_progress: false,
        }
    }

    /// Run the application.
    pub async fn run(config: AppConfig) {
        let event_loop = match EventLoop::new() {
            Ok(event_loop) => event_loop,
            Err(e) => {
                log::error!("{}", AppError::EventLoop(e.to_string()));
                return;
            }
        };
        let app = App::new(config);

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::EventLoopExtWebSys;
            event_loop.spawn_app(app);
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let mut app = app;
            if let Err(e) = event_loop.run_app(&mut app) {
                log::error!("Event loop error: {}", e);
            }
        }
    }

    /// Finish initialization after the surface is created.
    fn finish_init(
        &mut self,
        window: Arc<Window>,
        surface: RenderSurface<'static>,
    ) -> Result<(), AppError> {
        let render_cx = self
            .render_cx
            .as_ref()
            .ok_or_else(|| AppError::Renderer("render context missing".to_string()))?;
        let device = &render_cx.devices[surface.dev_id].device;

        let vello_renderer = vello::Renderer::new(device, RendererOptions::default())
            .map_err(|e| AppError::Renderer(format!("{:?}", e)))?;
        let texture_blitter =
            vello::wgpu::util::TextureBlitter::new(device, surface.config.format);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(
            device,
            surface.config.format,
            egui_wgpu::RendererOptions::default(),
        );

        log::info!(
            "Communication Board initialized - {}x{}",
            surface.config.width,
            surface.config.height
        );
        ShortcutRegistry::log_all();

        let canvas_rect = Rect::new(
            0.0,
            0.0,
            surface.config.width as f64,
            surface.config.height as f64,
        );
        let mut state = AppState {
            window: window.clone(),
            surface,
            vello_renderer,
            board_renderer: BoardRenderer::new(),
            texture_blitter,
            images: ImageCache::new(),
            egui_ctx,
            egui_state,
            egui_renderer,
            ui_state: UiState::default(),
            textures: HashMap::new(),
            editor: Editor::new(self.config.board.clone()),
            input: InputState::new(),
            modifiers: ModifiersState::empty(),
            config: self.config.clone(),
            assets: AssetLoader::new(&self.config),
            export: Rc::new(RefCell::new(ExportState::new())),
            event_handler: EventHandler::new(),
            canvas_rect,
            frame_laid_out: false,
        };
        state.load_catalog();

        self.state = Some(state);
        self.pending_window = None;

        window.request_redraw();
        Ok(())
    }

    /// Pick up a surface created by the async initializer.
    #[cfg(target_arch = "wasm32")]
    fn poll_pending_surface(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = self.pending_window.clone() else {
            return;
        };

        if let Some((render_cx, surface)) = PENDING_SURFACE.with(|slot| slot.borrow_mut().take()) {
            self.render_cx = Some(render_cx);
            if let Err(e) = self.finish_init(window, surface) {
                log::error!("{}", e);
                event_loop.exit();
            }
            return;
        }

        if !self.init_in_progress {
            self.init_in_progress = true;
            let size = window.inner_size();
            let width = size.width.max(1);
            let height = size.height.max(1);
            let window_clone = window.clone();

            wasm_bindgen_futures::spawn_local(async move {
                log::info!("Creating surface asynchronously...");
                let mut render_cx = vello::util::RenderContext::new();
                match render_cx
                    .create_surface(window_clone.clone(), width, height, PresentMode::AutoVsync)
                    .await
                {
                    Ok(surface) => {
                        log::info!("Surface created successfully");
                        PENDING_SURFACE.with(|slot| *slot.borrow_mut() = Some((render_cx, surface)));
                    }
                    Err(e) => log::error!("{}", AppError::Surface(format!("{:?}", e))),
                }
                window_clone.request_redraw();
            });
        }

        // Keep the event loop running until the surface arrives
        window.request_redraw();
    }

    #[cfg(target_arch = "wasm32")]
    fn web_window_attributes(&self) -> Result<winit::window::WindowAttributes, AppError> {
        use wasm_bindgen::JsCast;
        use winit::platform::web::WindowAttributesExtWebSys;

        let missing = |what: &str| AppError::Window(what.to_string());
        let web_window = web_sys::window().ok_or_else(|| missing("No window"))?;
        let document = web_window.document().ok_or_else(|| missing("No document"))?;

        if let Some(loading) = document.get_element_by_id("loading") {
            loading.remove();
        }

        let canvas = document
            .get_element_by_id("commboard-canvas")
            .and_then(|e| e.dyn_into::<web_sys::HtmlCanvasElement>().ok())
            .or_else(|| {
                let app_div = document.get_element_by_id("app")?;
                let canvas = document.create_element("canvas").ok()?;
                canvas.set_id("commboard-canvas");
                app_div.append_child(&canvas).ok()?;
                canvas.dyn_into::<web_sys::HtmlCanvasElement>().ok()
            })
            .ok_or_else(|| missing("Failed to create canvas"))?;

        let viewport_width = web_window
            .inner_width()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(self.config.width as f64);
        let viewport_height = web_window
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(self.config.height as f64);
        let dpr = web_window.device_pixel_ratio();
        canvas.set_width((viewport_width * dpr) as u32);
        canvas.set_height((viewport_height * dpr) as u32);

        let style = canvas.style();
        for (property, value) in [
            ("width", "100%"),
            ("height", "100%"),
            ("display", "block"),
            ("position", "fixed"),
            ("top", "0"),
            ("left", "0"),
        ] {
            let _ = style.set_property(property, value);
        }
        log::info!(
            "Canvas created: {}x{} (dpr: {})",
            viewport_width,
            viewport_height,
            dpr
        );

        Ok(Window::default_attributes()
            .with_title(&self.config.title)
            .with_canvas(Some(canvas)))
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() || self.pending_window.is_some() {
            return;
        }

        log::info!("Creating window...");

        #[cfg(not(target_arch = "wasm32"))]
        let window_attrs = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));

        #[cfg(target_arch = "wasm32")]
        let window_attrs = match self.web_window_attributes() {
            Ok(attrs) => attrs,
            Err(e) => {
                log::error!("{}", e);
                event_loop.exit();
                return;
            }
        };

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("{}", AppError::Window(e.to_string()));
                event_loop.exit();
                return;
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            let size = window.inner_size();
            let (width, height) = if size.width == 0 || size.height == 0 {
                (self.config.width, self.config.height)
            } else {
                (size.width, size.height)
            };
            log::info!("Surface size: {}x{}", width, height);

            let render_cx = self
                .render_cx
                .get_or_insert_with(vello::util::RenderContext::new);
            let surface = match pollster::block_on(render_cx.create_surface(
                window.clone(),
                width,
                height,
                PresentMode::AutoVsync,
            )) {
                Ok(surface) => surface,
                Err(e) => {
                    log::error!("{}", AppError::Surface(format!("{:?}", e)));
                    event_loop.exit();
                    return;
                }
            };
            if let Err(e) = self.finish_init(window, surface) {
                log::error!("{}", e);
                event_loop.exit();
            }
        }

        // On WASM the surface is created asynchronously once events flow
        #[cfg(target_arch = "wasm32")]
        {
            window.request_redraw();
            self.pending_window = Some(window);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        #[cfg(target_arch = "wasm32")]
        if self.state.is_none() {
            self.poll_pending_surface(event_loop);
            return;
        }

        let Some(state) = &mut self.state else {
            return;
        };

        // Let egui see every event first
        let egui_response = state.egui_state.on_window_event(&state.window, &event);
        if egui_response.repaint {
            state.window.request_redraw();
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if size.width == 0 || size.height == 0 {
                    return;
                }
                if let Some(render_cx) = self.render_cx.as_mut() {
                    render_cx.resize_surface(&mut state.surface, size.width, size.height);
                }
                state.window.request_redraw();
            }

            WindowEvent::RedrawRequested => {
                let Some(render_cx) = self.render_cx.as_ref() else {
                    return;
                };
                state.render(render_cx);
            }

            WindowEvent::CursorMoved { position, .. } => {
                state.handle_cursor_moved(Point::new(position.x, position.y));
            }

            WindowEvent::CursorLeft { .. } => {
                state.input.handle_pointer_event(PointerEvent::Left);
                if state.editor.drag.is_dragging() {
                    state.editor.drag.drag_over(None);
                }
            }

            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => {
                if let Some(button) = map_button(button) {
                    state.handle_mouse_input(button_state == ElementState::Pressed, button);
                }
            }

            WindowEvent::ModifiersChanged(modifiers) => {
                state.modifiers = modifiers.state();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                // Typing in the search box is egui's
                if event.state != ElementState::Pressed
                    || egui_response.consumed
                    || state.egui_ctx.wants_keyboard_input()
                {
                    return;
                }
                if state.handle_key(&event.logical_key) {
                    if let Some(render_cx) = self.render_cx.as_ref() {
                        state.start_export(render_cx);
                    }
                }
                state.window.request_redraw();
            }

            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_button() {
        assert_eq!(
            map_button(winit::event::MouseButton::Left),
            Some(MouseButton::Left)
        );
        assert_eq!(map_button(winit::event::MouseButton::Back), None);
    }

    #[test]
    fn test_to_physical() {
        let rect = egui::Rect::from_min_max(egui::pos2(300.0, 0.0), egui::pos2(980.0, 860.0));
        assert_eq!(
            to_physical(rect, 2.0),
            Rect::new(600.0, 0.0, 1960.0, 1720.0)
        );
    }
}
