//! Clipboard copies offered by the viewer's context menu

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Destination for copied images and text
pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> Result<()>;

    /// `rgba` holds `width * height` pixels, 4 bytes each
    fn set_image(&mut self, width: usize, height: usize, rgba: Vec<u8>) -> Result<()>;
}

/// The desktop clipboard.
///
/// The connection is opened on first use and kept for the life of the
/// process; on X11 copied contents disappear when their owner is dropped.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    fn connection(&mut self) -> Result<&mut arboard::Clipboard> {
        if self.inner.is_none() {
            self.inner = Some(arboard::Clipboard::new().context("Failed to open clipboard")?);
        }
        self.inner.as_mut().context("Clipboard unavailable")
    }
}

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        self.connection()?
            .set_text(text)
            .context("Failed to copy text to clipboard")
    }

    fn set_image(&mut self, width: usize, height: usize, rgba: Vec<u8>) -> Result<()> {
        let data = arboard::ImageData {
            width,
            height,
            bytes: rgba.into(),
        };
        self.connection()?
            .set_image(data)
            .context("Failed to copy image to clipboard")
    }
}

/// Decode `path` and put its pixels on the clipboard
pub fn copy_image_file(sink: &mut dyn ClipboardSink, path: &Path) -> Result<()> {
    let image = image::ImageReader::open(path)
        .with_context(|| format!("Failed to open image: {}", path.display()))?
        .decode()
        .with_context(|| format!("Failed to decode image: {}", path.display()))?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    sink.set_image(width as usize, height as usize, rgba.into_raw())?;
    info!(path = %path.display(), width, height, "Copied image");
    Ok(())
}

pub fn copy_path(sink: &mut dyn ClipboardSink, path: &Path) -> Result<()> {
    sink.set_text(&path.to_string_lossy())?;
    info!(path = %path.display(), "Copied path");
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Copied {
        Text(String),
        Image { width: usize, height: usize, bytes: usize },
    }

    /// Records copies; clones share one log
    #[derive(Debug, Clone, Default)]
    pub struct RecordingClipboard {
        pub copied: Rc<RefCell<Vec<Copied>>>,
    }

    impl ClipboardSink for RecordingClipboard {
        fn set_text(&mut self, text: &str) -> Result<()> {
            self.copied.borrow_mut().push(Copied::Text(text.to_string()));
            Ok(())
        }

        fn set_image(&mut self, width: usize, height: usize, rgba: Vec<u8>) -> Result<()> {
            self.copied.borrow_mut().push(Copied::Image {
                width,
                height,
                bytes: rgba.len(),
            });
            Ok(())
        }
    }
}
