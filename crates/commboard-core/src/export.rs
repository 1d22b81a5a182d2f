//! Export pipeline: phases, re-entrancy guard and PNG encoding.
//!
//! The platform-specific work (image loading, offscreen rendering, file
//! delivery) sits behind [`ExportBackend`]; [`run_export`] drives it through
//! the phases and reports each one.

use crate::board::Board;
use crate::catalog::BoxFuture;
use crate::layout::{PageLayout, page_size};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

// Use web-time on WASM, std::time otherwise
#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// Output pixels per page pixel.
pub const EXPORT_SCALE: f64 = 4.0;

/// How long the completion message stays up.
pub const STATUS_CLEAR_DELAY: Duration = Duration::from_secs(1);

/// Export errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExportError {
    #[error("Export already in progress")]
    Busy,
    #[error("Could not find preview element to export")]
    TargetMissing,
    #[error("Output {width}x{height} exceeds the maximum texture size {max}")]
    TooLarge { width: u32, height: u32, max: u32 },
    #[error("Render error: {0}")]
    Render(String),
    #[error("Encode error: {0}")]
    Encode(String),
    #[error("Delivery error: {0}")]
    Delivery(String),
}

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Progress of an export, shown to the user as a status line.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportPhase {
    Started,
    ElementFound,
    LoadingImages(usize),
    Rendering,
    Encoding,
    Downloading { width: u32, height: u32 },
    Complete,
    Failed(ExportError),
}

impl fmt::Display for ExportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => write!(f, "Starting export..."),
            Self::ElementFound => write!(f, "Found preview element"),
            Self::LoadingImages(n) => write!(f, "Loading {} images...", n),
            Self::Rendering => write!(f, "Creating high-resolution image..."),
            Self::Encoding => write!(f, "Generating high-resolution PNG..."),
            Self::Downloading { width, height } => {
                write!(f, "Downloading PNG ({}x{})...", width, height)
            }
            Self::Complete => write!(f, "Download complete!"),
            Self::Failed(e) => write!(f, "Error: {}", e),
        }
    }
}

/// Rasterization settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    /// Output pixels per page pixel.
    pub scale: f64,
    /// Background colour as RGBA8.
    pub background: [u8; 4],
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            scale: EXPORT_SCALE,
            background: [255, 255, 255, 255],
        }
    }
}

impl RasterOptions {
    /// Options with a custom scale.
    pub fn with_scale(scale: f64) -> Self {
        Self {
            scale,
            ..Self::default()
        }
    }

    /// Pixel size of the exported page.
    pub fn output_size(&self) -> (u32, u32) {
        let page = page_size();
        (
            (page.width * self.scale).round() as u32,
            (page.height * self.scale).round() as u32,
        )
    }
}

/// What gets exported: a snapshot of the laid-out page.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportTarget {
    pub board: Board,
    pub layout: PageLayout,
}

impl ExportTarget {
    /// Snapshot a board with its page layout.
    pub fn capture(board: &Board) -> Self {
        Self {
            board: board.clone(),
            layout: PageLayout::for_board(board),
        }
    }

    /// Distinct image paths referenced by the board, in slot order.
    pub fn image_paths(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.board
            .slots()
            .iter()
            .flatten()
            .filter(|s| seen.insert(s.image_path.as_str()))
            .map(|s| s.image_path.clone())
            .collect()
    }
}

/// Raw RGBA8 pixels read back from the rasterizer.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    /// Tightly packed rows, 4 bytes per pixel.
    pub rgba: Vec<u8>,
}

/// A finished export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
}

/// Platform side of the export.
pub trait ExportBackend {
    /// Largest texture edge the rasterizer can produce.
    fn max_dimension(&self) -> u32;

    /// Make the given images available to the rasterizer. Returns how many
    /// loaded; failures are logged and rendered as placeholders.
    fn load_images<'a>(&'a mut self, paths: &'a [String]) -> BoxFuture<'a, usize>;

    /// Render the target offscreen.
    fn rasterize<'a>(
        &'a mut self,
        target: &'a ExportTarget,
        options: &'a RasterOptions,
    ) -> BoxFuture<'a, ExportResult<RasterImage>>;

    /// Hand the encoded file to the user.
    fn deliver<'a>(&'a mut self, file_name: &'a str, png: Vec<u8>)
    -> BoxFuture<'a, ExportResult<()>>;
}

/// Name of the exported file.
pub fn export_file_name(width: u32, height: u32) -> String {
    format!("communication-board-{}x{}.png", width, height)
}

/// Encode RGBA pixel data to PNG bytes.
pub fn encode_png(image: &RasterImage) -> ExportResult<Vec<u8>> {
    let expected = image.width as usize * image.height as usize * 4;
    if image.rgba.len() != expected {
        return Err(ExportError::Encode(format!(
            "expected {} bytes of pixel data, got {}",
            expected,
            image.rgba.len()
        )));
    }

    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, image.width, image.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(|e| ExportError::Encode(e.to_string()))?;
        writer
            .write_image_data(&image.rgba)
            .map_err(|e| ExportError::Encode(e.to_string()))?;
    }
    Ok(png_data)
}

/// Run one export from start to delivery.
///
/// `target` is `None` when there is no laid-out page to capture. Every phase
/// is passed to `report` before it runs; on error the sequence stops and the
/// error is returned without a `Failed` report, which is left to the caller.
pub async fn run_export<B: ExportBackend + ?Sized>(
    backend: &mut B,
    target: Option<&ExportTarget>,
    options: &RasterOptions,
    mut report: impl FnMut(ExportPhase),
) -> ExportResult<ExportSummary> {
    report(ExportPhase::Started);
    let target = target.ok_or(ExportError::TargetMissing)?;
    report(ExportPhase::ElementFound);

    let paths = target.image_paths();
    report(ExportPhase::LoadingImages(paths.len()));
    let loaded = backend.load_images(&paths).await;
    if loaded < paths.len() {
        log::warn!("{} of {} images failed to load", paths.len() - loaded, paths.len());
    }

    let (width, height) = options.output_size();
    let max = backend.max_dimension();
    if width == 0 || height == 0 || width > max || height > max {
        return Err(ExportError::TooLarge { width, height, max });
    }

    report(ExportPhase::Rendering);
    let image = backend.rasterize(target, options).await?;

    report(ExportPhase::Encoding);
    let png = encode_png(&image)?;

    let file_name = export_file_name(image.width, image.height);
    report(ExportPhase::Downloading {
        width: image.width,
        height: image.height,
    });
    let bytes = png.len();
    backend.deliver(&file_name, png).await?;

    report(ExportPhase::Complete);
    Ok(ExportSummary {
        file_name,
        width: image.width,
        height: image.height,
        bytes,
    })
}

/// UI-side export state: the re-entrancy guard, status line and alert.
#[derive(Debug, Clone, Default)]
pub struct ExportState {
    is_exporting: bool,
    status: Option<String>,
    alert: Option<String>,
    completed_at: Option<Instant>,
}

impl ExportState {
    /// Create an idle export state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the exporter. Fails with [`ExportError::Busy`] while an export
    /// is running.
    pub fn try_begin(&mut self) -> ExportResult<()> {
        if self.is_exporting {
            log::debug!("Export ignored: already exporting");
            return Err(ExportError::Busy);
        }
        self.is_exporting = true;
        self.status = None;
        self.alert = None;
        self.completed_at = None;
        Ok(())
    }

    /// Check if an export is in flight.
    pub fn is_exporting(&self) -> bool {
        self.is_exporting
    }

    /// Current status line.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Record a phase.
    pub fn report(&mut self, phase: &ExportPhase) {
        log::info!("Export: {}", phase);
        self.status = Some(phase.to_string());
    }

    /// Record success. The guard stays up until the status is cleared.
    pub fn finish(&mut self, summary: &ExportSummary) {
        log::info!(
            "Exported {} ({} bytes)",
            summary.file_name,
            summary.bytes
        );
        self.report(&ExportPhase::Complete);
        self.completed_at = Some(Instant::now());
    }

    /// Record a failure: status line, alert, and the guard is released.
    pub fn fail(&mut self, error: ExportError) {
        log::error!("Error exporting: {}", error);
        self.alert = Some(format!("Error exporting: {}", error));
        self.status = Some(ExportPhase::Failed(error).to_string());
        self.is_exporting = false;
        self.completed_at = None;
    }

    /// Record the result of a run.
    pub fn complete(&mut self, result: ExportResult<ExportSummary>) {
        match result {
            Ok(summary) => self.finish(&summary),
            Err(e) => self.fail(e),
        }
    }

    /// Pending blocking alert, taken once.
    pub fn take_alert(&mut self) -> Option<String> {
        self.alert.take()
    }

    /// Clear the completion status once its delay has passed. Returns true
    /// if anything changed.
    pub fn tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    /// [`ExportState::tick`] against an explicit clock.
    pub fn tick_at(&mut self, now: Instant) -> bool {
        match self.completed_at {
            Some(done) if now.duration_since(done) >= STATUS_CLEAR_DELAY => {
                self.completed_at = None;
                self.is_exporting = false;
                self.status = None;
                true
            }
            _ => false,
        }
    }

    /// Time until the completion status clears, if one is showing.
    pub fn time_until_clear(&self) -> Option<Duration> {
        self.time_until_clear_at(Instant::now())
    }

    /// [`ExportState::time_until_clear`] measured from `now`.
    pub fn time_until_clear_at(&self, now: Instant) -> Option<Duration> {
        self.completed_at
            .map(|done| STATUS_CLEAR_DELAY.saturating_sub(now.saturating_duration_since(done)))
    }
}
