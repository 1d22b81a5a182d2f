//! GPU export backend: renders the page offscreen with Vello and delivers
//! the PNG through a save dialog (native) or a browser download (WASM).

use crate::config::AppConfig;
use commboard_core::catalog::BoxFuture;
use commboard_core::export::{
    ExportBackend, ExportError, ExportResult, ExportTarget, RasterImage, RasterOptions,
};
use commboard_render::{BoardRenderer, ImageCache};
use peniko::Color;
use vello::wgpu;
use vello::{AaConfig, RenderParams, RendererOptions, Scene};

/// Row alignment wgpu requires for texture-to-buffer copies.
const COPY_ROW_ALIGNMENT: u32 = 256;

/// Bytes per padded row for a readback of `width` RGBA pixels.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    (width * 4).next_multiple_of(COPY_ROW_ALIGNMENT)
}

/// Strip wgpu's row padding from a readback buffer.
pub fn unpad_rows(data: &[u8], width: u32, height: u32, bytes_per_row: u32) -> Vec<u8> {
    let row_len = (width * 4) as usize;
    let mut rgba = Vec::with_capacity(row_len * height as usize);
    for row in 0..height as usize {
        let start = row * bytes_per_row as usize;
        rgba.extend_from_slice(&data[start..start + row_len]);
    }
    rgba
}

/// Decode freshly read bytes into the cache. Returns true if the image
/// decoded.
fn store_image(images: &mut ImageCache, path: &str, bytes: Result<Vec<u8>, String>) -> bool {
    match bytes {
        Ok(bytes) => images.insert_bytes(path, &bytes).is_ok(),
        Err(e) => {
            log::warn!("Image {} unavailable for export: {}", path, e);
            images.mark_failed(path);
            false
        }
    }
}

/// A readback in flight: the buffer being filled from the export texture.
struct Readback {
    buffer: wgpu::Buffer,
    width: u32,
    height: u32,
    bytes_per_row: u32,
}

impl Readback {
    /// Copy the mapped buffer out without padding.
    fn finish(self) -> RasterImage {
        let rgba = {
            let data = self.buffer.slice(..).get_mapped_range();
            unpad_rows(&data, self.width, self.height, self.bytes_per_row)
        };
        self.buffer.unmap();
        RasterImage {
            width: self.width,
            height: self.height,
            rgba,
        }
    }
}

/// Exports through the window's GPU device.
pub struct GpuExportBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    renderer: Option<vello::Renderer>,
    board_renderer: BoardRenderer,
    images: ImageCache,
    config: AppConfig,
}

impl GpuExportBackend {
    /// Create a backend. `images` seeds the cache with what the preview has
    /// already decoded.
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        images: ImageCache,
        config: AppConfig,
    ) -> Self {
        Self {
            device,
            queue,
            renderer: None,
            board_renderer: BoardRenderer::new(),
            images,
            config,
        }
    }

    /// The decoded images, including any loaded for the export.
    pub fn images(&self) -> &ImageCache {
        &self.images
    }

    /// Render the scene into a texture and queue the copy into a mappable
    /// buffer.
    fn submit(&mut self, scene: &Scene, width: u32, height: u32, base_color: Color) -> ExportResult<Readback> {
        if self.renderer.is_none() {
            let renderer = vello::Renderer::new(&self.device, RendererOptions::default())
                .map_err(|e| ExportError::Render(format!("Failed to create renderer: {:?}", e)))?;
            self.renderer = Some(renderer);
        }
        let Some(renderer) = self.renderer.as_mut() else {
            return Err(ExportError::Render("renderer unavailable".to_string()));
        };

        let extent = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("png export texture"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let params = RenderParams {
            base_color,
            width,
            height,
            antialiasing_method: AaConfig::Area,
        };
        renderer
            .render_to_texture(&self.device, &self.queue, scene, &texture_view, &params)
            .map_err(|e| ExportError::Render(format!("{:?}", e)))?;

        let bytes_per_row = padded_bytes_per_row(width);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("png readback buffer"),
            size: (bytes_per_row * height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("png copy encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            extent,
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        Ok(Readback {
            buffer,
            width,
            height,
            bytes_per_row,
        })
    }

    /// Wait for the readback (blocking - native only).
    #[cfg(not(target_arch = "wasm32"))]
    async fn map_readback(&self, readback: Readback) -> ExportResult<RasterImage> {
        let (tx, rx) = std::sync::mpsc::channel();
        readback
            .buffer
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |result| {
                tx.send(result).ok();
            });
        let _ = self.device.poll(wgpu::PollType::wait_indefinitely());

        match rx.recv() {
            Ok(Ok(())) => Ok(readback.finish()),
            Ok(Err(e)) => Err(ExportError::Render(format!("Failed to map buffer: {:?}", e))),
            Err(e) => Err(ExportError::Render(format!("Readback callback dropped: {}", e))),
        }
    }

    /// Wait for the readback by yielding to the browser once per frame.
    #[cfg(target_arch = "wasm32")]
    async fn map_readback(&self, readback: Readback) -> ExportResult<RasterImage> {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicBool, Ordering};
        use wasm_bindgen::{JsCast, JsValue};

        // ~10 seconds at 60fps
        const MAX_ATTEMPTS: u32 = 600;

        let mapped = Arc::new(AtomicBool::new(false));
        let failed = Arc::new(AtomicBool::new(false));
        {
            let mapped = mapped.clone();
            let failed = failed.clone();
            readback
                .buffer
                .slice(..)
                .map_async(wgpu::MapMode::Read, move |result| {
                    if result.is_ok() {
                        mapped.store(true, Ordering::SeqCst);
                    } else {
                        log::error!("Buffer mapping failed: {:?}", result);
                        failed.store(true, Ordering::SeqCst);
                    }
                });
        }

        let mut attempts = 0u32;
        while !mapped.load(Ordering::SeqCst) {
            if failed.load(Ordering::SeqCst) {
                return Err(ExportError::Render("Failed to map buffer".to_string()));
            }
            attempts += 1;
            if attempts >= MAX_ATTEMPTS {
                return Err(ExportError::Render(format!(
                    "Timeout waiting for buffer mapping after {} frames",
                    attempts
                )));
            }

            // requestAnimationFrame yields to the task queue where WebGPU
            // callbacks run; a resolved promise would not.
            let promise = js_sys::Promise::new(&mut |resolve, _reject| {
                let Some(window) = web_sys::window() else {
                    let _ = resolve.call0(&JsValue::NULL);
                    return;
                };
                let closure = wasm_bindgen::closure::Closure::once_into_js(move || {
                    let _ = resolve.call0(&JsValue::NULL);
                });
                let _ = window.request_animation_frame(closure.unchecked_ref());
            });
            let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
        }
        log::info!("Buffer mapping completed after {} frames", attempts);
        Ok(readback.finish())
    }
}

impl ExportBackend for GpuExportBackend {
    fn max_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    fn load_images<'a>(&'a mut self, paths: &'a [String]) -> BoxFuture<'a, usize> {
        Box::pin(async move {
            let mut loaded = 0;
            for path in paths {
                if self.images.get(path).is_some() {
                    loaded += 1;
                    continue;
                }
                #[cfg(not(target_arch = "wasm32"))]
                let bytes = crate::assets::read_image(&self.config, path);
                #[cfg(target_arch = "wasm32")]
                let bytes = crate::assets::read_image(&self.config, path).await;
                if store_image(&mut self.images, path, bytes) {
                    loaded += 1;
                }
            }
            loaded
        })
    }

    fn rasterize<'a>(
        &'a mut self,
        target: &'a ExportTarget,
        options: &'a RasterOptions,
    ) -> BoxFuture<'a, ExportResult<RasterImage>> {
        Box::pin(async move {
            let (scene, size) = self.board_renderer.build_export_scene(
                &target.board,
                &target.layout,
                &self.images,
                options.scale,
            );
            let width = size.width as u32;
            let height = size.height as u32;
            let [r, g, b, a] = options.background;
            let readback = self.submit(&scene, width, height, Color::from_rgba8(r, g, b, a))?;
            self.map_readback(readback).await
        })
    }

    fn deliver<'a>(
        &'a mut self,
        file_name: &'a str,
        png: Vec<u8>,
    ) -> BoxFuture<'a, ExportResult<()>> {
        Box::pin(async move { deliver_png(file_name, &png) })
    }
}

/// Save the PNG through a native file dialog. Cancelling is not an error.
#[cfg(not(target_arch = "wasm32"))]
fn deliver_png(file_name: &str, png: &[u8]) -> ExportResult<()> {
    let dialog = rfd::FileDialog::new()
        .set_title("Export PNG")
        .set_file_name(file_name)
        .add_filter("PNG Image", &["png"]);

    match dialog.save_file() {
        Some(path) => {
            std::fs::write(&path, png)
                .map_err(|e| ExportError::Delivery(format!("Failed to write PNG: {}", e)))?;
            log::info!("Exported PNG to: {:?}", path);
        }
        None => log::info!("Export dialog cancelled"),
    }
    Ok(())
}

/// Trigger a browser download of the PNG.
#[cfg(target_arch = "wasm32")]
fn deliver_png(file_name: &str, png: &[u8]) -> ExportResult<()> {
    use wasm_bindgen::JsCast;

    let delivery = |what: &str| ExportError::Delivery(what.to_string());
    let window = web_sys::window().ok_or_else(|| delivery("No window"))?;
    let document = window.document().ok_or_else(|| delivery("No document"))?;

    let uint8_array = js_sys::Uint8Array::from(png);
    let blob_parts = js_sys::Array::new();
    blob_parts.push(&uint8_array);

    let options = web_sys::BlobPropertyBag::new();
    options.set_type("image/png");

    let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&blob_parts, &options)
        .map_err(|_| delivery("Failed to create blob"))?;
    let url = web_sys::Url::create_object_url_with_blob(&blob)
        .map_err(|_| delivery("Failed to create URL"))?;

    let a = document
        .create_element("a")
        .map_err(|_| delivery("Failed to create element"))?
        .dyn_into::<web_sys::HtmlAnchorElement>()
        .map_err(|_| delivery("Failed to cast to anchor"))?;
    a.set_href(&url);
    a.set_download(file_name);
    a.click();

    web_sys::Url::revoke_object_url(&url).ok();
    log::info!("PNG download triggered: {} ({} bytes)", file_name, png.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use commboard_core::export::encode_png;

    #[test]
    fn test_padded_bytes_per_row() {
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(3176), 12800);
    }

    #[test]
    fn test_unpad_rows() {
        // Two rows of one pixel, each padded to 8 bytes.
        let data = [1, 2, 3, 4, 0, 0, 0, 0, 5, 6, 7, 8, 0, 0, 0, 0];
        assert_eq!(unpad_rows(&data, 1, 2, 8), vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_store_image() {
        let png = encode_png(&RasterImage {
            width: 2,
            height: 2,
            rgba: vec![255; 16],
        })
        .unwrap();

        let mut images = ImageCache::new();
        assert!(store_image(&mut images, "/assets/bath.png", Ok(png)));
        assert!(!store_image(&mut images, "/assets/car.png", Err("missing".into())));
        assert!(!store_image(&mut images, "/assets/toilet.png", Ok(b"junk".to_vec())));

        assert!(images.get("/assets/bath.png").is_some());
        assert!(images.is_failed("/assets/car.png"));
        assert!(images.is_failed("/assets/toilet.png"));
    }
}
