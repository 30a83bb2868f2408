//! Window-manager and dialog capabilities consumed by the engine
//!
//! The host owns the real window; the engine only asks for geometry and
//! requests sizes. Resize and close notifications flow back in through
//! [`crate::app::App`] event handlers.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::types::{LogicalSize, MonitorWorkArea, WindowGeometry};

pub trait WindowHost {
    fn window_geometry(&self) -> Result<WindowGeometry>;

    /// Request a new inner size. The host reports the outcome later as a
    /// resize event; the request is not applied synchronously.
    fn set_window_size(&mut self, size: LogicalSize) -> Result<()>;

    fn set_window_position(&mut self, x: i32, y: i32) -> Result<()>;

    /// Work area of the monitor the window is on
    fn monitor_work_area(&self) -> Result<MonitorWorkArea>;
}

/// User-cancelable pickers. `None` means the user cancelled.
pub trait DialogProvider {
    fn select_folder(&mut self) -> Option<PathBuf>;
    fn select_image_file(&mut self, start_dir: Option<&Path>) -> Option<PathBuf>;
    fn select_profile_file(&mut self) -> Option<PathBuf>;
    fn select_save_target(&mut self) -> Option<PathBuf>;
}

/// In-memory window used when no real window manager is attached.
///
/// Size requests are clamped to the work area and queued as resize events,
/// mimicking a window manager that applies them asynchronously.
#[derive(Debug, Clone)]
pub struct HeadlessWindow {
    geometry: WindowGeometry,
    work_area: MonitorWorkArea,
    pending_events: Vec<LogicalSize>,
}

impl HeadlessWindow {
    pub fn new(geometry: WindowGeometry, work_area: MonitorWorkArea) -> Self {
        Self {
            geometry,
            work_area,
            pending_events: Vec::new(),
        }
    }

    /// Resize events the "window manager" has produced since the last call
    pub fn take_resize_events(&mut self) -> Vec<LogicalSize> {
        std::mem::take(&mut self.pending_events)
    }

    /// Simulate the user dragging the window edge
    pub fn user_resize(&mut self, size: LogicalSize) {
        self.apply(size);
    }

    fn apply(&mut self, size: LogicalSize) {
        let max = self.work_area.logical_size();
        let scale = self.geometry.scale;
        let width = size.width.min(max.width).max(1.0);
        let height = size.height.min(max.height).max(1.0);
        self.geometry.width = (width * scale).round() as u32;
        self.geometry.height = (height * scale).round() as u32;
        self.pending_events.push(self.geometry.logical_size());
    }
}

impl Default for HeadlessWindow {
    fn default() -> Self {
        let geometry = WindowGeometry::default();
        Self::new(
            geometry,
            MonitorWorkArea {
                width: 1920,
                height: 1080,
                scale: geometry.scale,
            },
        )
    }
}

impl WindowHost for HeadlessWindow {
    fn window_geometry(&self) -> Result<WindowGeometry> {
        Ok(self.geometry)
    }

    fn set_window_size(&mut self, size: LogicalSize) -> Result<()> {
        debug!(width = size.width, height = size.height, "Headless resize requested");
        self.apply(size);
        Ok(())
    }

    fn set_window_position(&mut self, x: i32, y: i32) -> Result<()> {
        self.geometry.x = x;
        self.geometry.y = y;
        Ok(())
    }

    fn monitor_work_area(&self) -> Result<MonitorWorkArea> {
        Ok(self.work_area)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scriptable hosts for zoom and app tests

    use super::*;
    use anyhow::bail;
    use std::collections::VecDeque;

    /// A window host whose every call fails
    pub struct BrokenWindow;

    impl WindowHost for BrokenWindow {
        fn window_geometry(&self) -> Result<WindowGeometry> {
            bail!("no window")
        }
        fn set_window_size(&mut self, _size: LogicalSize) -> Result<()> {
            bail!("no window")
        }
        fn set_window_position(&mut self, _x: i32, _y: i32) -> Result<()> {
            bail!("no window")
        }
        fn monitor_work_area(&self) -> Result<MonitorWorkArea> {
            bail!("no window")
        }
    }

    /// Holds size requests until [`DeferredWindow::apply_requests`], like a
    /// window manager that answers on its own schedule
    #[derive(Debug, Default)]
    pub struct DeferredWindow {
        pub geometry: WindowGeometry,
        requested: Vec<LogicalSize>,
    }

    impl DeferredWindow {
        /// Apply every queued request; returns the resulting resize events
        pub fn apply_requests(&mut self) -> Vec<LogicalSize> {
            let requested = std::mem::take(&mut self.requested);
            for size in &requested {
                self.geometry.width = size.width.round() as u32;
                self.geometry.height = size.height.round() as u32;
            }
            requested
        }
    }

    impl WindowHost for DeferredWindow {
        fn window_geometry(&self) -> Result<WindowGeometry> {
            Ok(self.geometry)
        }
        fn set_window_size(&mut self, size: LogicalSize) -> Result<()> {
            self.requested.push(size);
            Ok(())
        }
        fn set_window_position(&mut self, x: i32, y: i32) -> Result<()> {
            self.geometry.x = x;
            self.geometry.y = y;
            Ok(())
        }
        fn monitor_work_area(&self) -> Result<MonitorWorkArea> {
            Ok(MonitorWorkArea {
                width: 1920,
                height: 1080,
                scale: 1.0,
            })
        }
    }

    /// Answers dialogs from a queue; an exhausted queue means "cancelled"
    #[derive(Default)]
    pub struct ScriptedDialogs {
        pub answers: VecDeque<PathBuf>,
    }

    impl ScriptedDialogs {
        pub fn answering(paths: &[&str]) -> Self {
            Self {
                answers: paths.iter().map(PathBuf::from).collect(),
            }
        }
    }

    impl DialogProvider for ScriptedDialogs {
        fn select_folder(&mut self) -> Option<PathBuf> {
            self.answers.pop_front()
        }
        fn select_image_file(&mut self, _start_dir: Option<&Path>) -> Option<PathBuf> {
            self.answers.pop_front()
        }
        fn select_profile_file(&mut self) -> Option<PathBuf> {
            self.answers.pop_front()
        }
        fn select_save_target(&mut self) -> Option<PathBuf> {
            self.answers.pop_front()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_clamps_to_work_area_and_queues_event() {
        let mut window = HeadlessWindow::default();
        window.set_window_size(LogicalSize::new(5000.0, 300.0)).unwrap();

        let geometry = window.window_geometry().unwrap();
        assert_eq!((geometry.width, geometry.height), (1920, 300));
        assert_eq!(window.take_resize_events(), vec![LogicalSize::new(1920.0, 300.0)]);
        assert!(window.take_resize_events().is_empty());
    }

    #[test]
    fn test_headless_respects_scale() {
        let mut window = HeadlessWindow::new(
            WindowGeometry { x: 0, y: 0, width: 1600, height: 1200, scale: 2.0 },
            MonitorWorkArea { width: 3840, height: 2160, scale: 2.0 },
        );
        window.set_window_size(LogicalSize::new(1000.0, 600.0)).unwrap();
        let geometry = window.window_geometry().unwrap();
        assert_eq!((geometry.width, geometry.height), (2000, 1200));
        assert_eq!(geometry.logical_size(), LogicalSize::new(1000.0, 600.0));
    }
}
