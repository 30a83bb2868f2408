//! Zoom controller (fit-to-window)
//!
//! The window is authoritative: zoom is always the fit ratio between the
//! window's logical size and the image's pixel size. Zooming in or out asks
//! the host for a new window size and derives zoom from what will actually
//! be shown.

use anyhow::Result;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::constants::{window, zoom};
use crate::images::ImageSource;
use crate::types::{ImageDimensions, ImageRef, LogicalSize, MonitorWorkArea};
use crate::window::WindowHost;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Fit ratio of `image` inside `area`, 2 decimals, within the level bounds
pub fn fit_zoom(area: LogicalSize, image: ImageDimensions) -> f64 {
    if area.is_empty() || image.width == 0 || image.height == 0 {
        return zoom::IDENTITY;
    }
    let ratio = (area.width / image.width as f64).min(area.height / image.height as f64);
    round2(ratio).clamp(zoom::MIN_LEVEL, zoom::MAX_LEVEL)
}

/// Window sizes this controller requested and has not yet seen echoed back.
///
/// Hosts report resizes in request order. A matching resize consumes its
/// request and every older one; a resize matching nothing is a user resize
/// and retires the oldest request, which the host evidently adjusted.
#[derive(Debug, Default, Clone)]
pub struct ResizeGuard {
    pending: VecDeque<LogicalSize>,
}

impl ResizeGuard {
    pub fn expect(&mut self, size: LogicalSize) {
        self.pending.push_back(size);
    }

    /// `true` if `size` was one of ours
    pub fn observe(&mut self, size: LogicalSize) -> bool {
        let matched = self
            .pending
            .iter()
            .position(|p| p.approx_eq(&size, zoom::RESIZE_MATCH_TOLERANCE));
        match matched {
            Some(i) => {
                self.pending.drain(..=i);
                true
            }
            None => {
                if let Some(dropped) = self.pending.pop_front() {
                    debug!(width = dropped.width, height = dropped.height, "Request granted at another size");
                }
                false
            }
        }
    }

    /// Drop an expectation for a request the host rejected
    pub fn withdraw(&mut self, size: LogicalSize) {
        if let Some(i) = self.pending.iter().rposition(|p| *p == size) {
            self.pending.remove(i);
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Handle for one in-flight dimension probe
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionProbe {
    generation: u64,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ZoomController {
    zoom_level: f64,
    image: Option<ImageDimensions>,
    probe_generation: u64,
    guard: ResizeGuard,
}

impl Default for ZoomController {
    fn default() -> Self {
        Self {
            zoom_level: zoom::IDENTITY,
            image: None,
            probe_generation: 0,
            guard: ResizeGuard::default(),
        }
    }
}

fn default_window_size() -> LogicalSize {
    LogicalSize::new(window::DEFAULT_WIDTH as f64, window::DEFAULT_HEIGHT as f64)
}

fn window_size(host: &dyn WindowHost) -> LogicalSize {
    match host.window_geometry() {
        Ok(geometry) => geometry.logical_size(),
        Err(e) => {
            warn!(error = %format!("{e:#}"), "Window geometry unavailable, using defaults");
            default_window_size()
        }
    }
}

fn work_area(host: &dyn WindowHost) -> LogicalSize {
    match host.monitor_work_area() {
        Ok(area) => area.logical_size(),
        Err(e) => {
            warn!(error = %format!("{e:#}"), "Monitor work area unavailable, using defaults");
            MonitorWorkArea {
                width: window::DEFAULT_WIDTH,
                height: window::DEFAULT_HEIGHT,
                scale: window::DEFAULT_SCALE,
            }
            .logical_size()
        }
    }
}

impl ZoomController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zoom_level(&self) -> f64 {
        self.zoom_level
    }

    pub fn image_dimensions(&self) -> Option<ImageDimensions> {
        self.image
    }

    pub fn guard(&self) -> &ResizeGuard {
        &self.guard
    }

    /// Size the image is drawn at, in logical pixels
    pub fn rendered_size(&self) -> Option<LogicalSize> {
        self.image.map(|image| {
            LogicalSize::new(
                image.width as f64 * self.zoom_level,
                image.height as f64 * self.zoom_level,
            )
        })
    }

    // ---------------------------------------------------------------------
    // Image changes
    // ---------------------------------------------------------------------

    /// Forget the current image and invalidate pending probes
    pub fn begin_probe(&mut self, path: &Path) -> DimensionProbe {
        self.probe_generation += 1;
        self.image = None;
        self.zoom_level = zoom::IDENTITY;
        DimensionProbe {
            generation: self.probe_generation,
            path: path.to_path_buf(),
        }
    }

    /// Apply probed dimensions and reset zoom to fit. `false` if stale.
    pub fn finish_probe(
        &mut self,
        host: &dyn WindowHost,
        probe: DimensionProbe,
        result: Result<ImageDimensions>,
    ) -> bool {
        if probe.generation != self.probe_generation {
            debug!(path = %probe.path.display(), "Discarding stale dimension probe");
            return false;
        }
        match result {
            Ok(dimensions) => {
                self.image = Some(dimensions);
                self.zoom_level = fit_zoom(window_size(host), dimensions);
                debug!(path = %probe.path.display(), zoom = self.zoom_level, "Fit zoom");
            }
            Err(e) => {
                warn!(path = %probe.path.display(), error = %format!("{e:#}"), "Could not read image size");
            }
        }
        true
    }

    /// Reset to fit for a newly visible image (or clear with `None`)
    pub fn on_image_changed(
        &mut self,
        host: &dyn WindowHost,
        images: &dyn ImageSource,
        image: Option<&ImageRef>,
    ) {
        let Some(image) = image else {
            self.clear();
            return;
        };
        let probe = self.begin_probe(&image.path);
        let result = images.image_dimensions(&image.path);
        self.finish_probe(host, probe, result);
    }

    /// Leave the viewer: no image, identity zoom, no pending work
    pub fn clear(&mut self) {
        self.probe_generation += 1;
        self.image = None;
        self.zoom_level = zoom::IDENTITY;
        self.guard.clear();
    }

    // ---------------------------------------------------------------------
    // User zoom
    // ---------------------------------------------------------------------

    pub fn zoom_in(&mut self, host: &mut dyn WindowHost) -> f64 {
        self.zoom_by(host, zoom::IN_FACTOR)
    }

    pub fn zoom_out(&mut self, host: &mut dyn WindowHost) -> f64 {
        self.zoom_by(host, zoom::OUT_FACTOR)
    }

    fn zoom_by(&mut self, host: &mut dyn WindowHost, factor: f64) -> f64 {
        let Some(image) = self.image else {
            debug!("Zoom ignored, no image dimensions");
            return self.zoom_level;
        };

        let target = round2(self.zoom_level * factor).min(zoom::MAX_LEVEL);
        let wanted = LogicalSize::new(image.width as f64 * target, image.height as f64 * target);
        let max = work_area(host);
        let size = LogicalSize::new(
            wanted.width.max(zoom::MIN_WINDOW_EDGE).min(max.width).round(),
            wanted.height.max(zoom::MIN_WINDOW_EDGE).min(max.height).round(),
        );

        // What will be shown is the fit for the window we actually get
        let clamped = !size.approx_eq(&wanted, zoom::RESIZE_MATCH_TOLERANCE);
        let level = if clamped { fit_zoom(size, image) } else { target };

        if !self.resize_window(host, size) {
            return self.zoom_level;
        }

        debug!(from = self.zoom_level, to = level, clamped, width = size.width, height = size.height, "Zoom");
        self.zoom_level = level;
        level
    }

    /// Programmatic resize whose echo will not be taken as a user resize
    pub fn resize_window(&mut self, host: &mut dyn WindowHost, size: LogicalSize) -> bool {
        self.guard.expect(size);
        if let Err(e) = host.set_window_size(size) {
            warn!(error = %format!("{e:#}"), "Window resize failed");
            self.guard.withdraw(size);
            return false;
        }
        true
    }

    /// Fit for the current window without resizing it
    pub fn reset_zoom(&mut self, host: &dyn WindowHost) -> f64 {
        if let Some(image) = self.image {
            self.zoom_level = fit_zoom(window_size(host), image);
        }
        self.zoom_level
    }

    // ---------------------------------------------------------------------
    // Window events
    // ---------------------------------------------------------------------

    /// Handle an observed resize. Returns `true` if it was a user resize.
    ///
    /// Zoom is refit to the reported size either way: a request may land
    /// after the image it was made for was fitted against the old window.
    pub fn on_window_resized(&mut self, size: LogicalSize) -> bool {
        let own = self.guard.observe(size);
        if let Some(image) = self.image {
            self.zoom_level = fit_zoom(size, image);
        }
        debug!(width = size.width, height = size.height, own, zoom = self.zoom_level, "Window resized");
        !own
    }
}
