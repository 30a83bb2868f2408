//! Viewer navigation state for the currently open card
//!
//! The navigator tracks which image of a folder is visible, in either
//! sequential or shuffled order. Loading is split into [`ViewerNavigator::begin_load`]
//! and [`ViewerNavigator::finish_load`] so a scan that completes after the
//! user moved on is dropped instead of applied.

pub mod shuffle;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::ViewerError;
use crate::images::ImageSource;
use crate::types::ImageRef;

/// Position inside the image list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavMode {
    /// `index` is the logical index
    Sequential { index: usize },
    /// `permutation[position]` is the logical index
    Shuffled { permutation: Vec<usize>, position: usize },
}

impl Default for NavMode {
    fn default() -> Self {
        NavMode::Sequential { index: 0 }
    }
}

impl NavMode {
    fn position(&self) -> usize {
        match self {
            NavMode::Sequential { index } => *index,
            NavMode::Shuffled { position, .. } => *position,
        }
    }

    fn set_position(&mut self, new_position: usize) {
        match self {
            NavMode::Sequential { index } => *index = new_position,
            NavMode::Shuffled { position, .. } => *position = new_position,
        }
    }

    fn logical(&self) -> usize {
        match self {
            NavMode::Sequential { index } => *index,
            NavMode::Shuffled { permutation, position } => {
                permutation.get(*position).copied().unwrap_or(0)
            }
        }
    }
}

/// Read model for the position indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    /// Position in the active order (shuffled or not)
    pub current_index: usize,
    pub total_images: usize,
    /// Logical index of the visible image
    pub actual_index: usize,
}

/// Handle for one in-flight image load
#[derive(Debug, Clone, PartialEq)]
pub struct LoadTicket {
    generation: u64,
    pub card_id: String,
    pub folder: PathBuf,
    initial_index: usize,
    shuffle: bool,
}

/// Viewer session for one card
pub struct ViewerNavigator {
    card_id: Option<String>,
    title: String,
    folder: Option<PathBuf>,
    images: Vec<ImageRef>,
    mode: NavMode,
    h_flip: bool,
    is_loading: bool,
    error: Option<ViewerError>,
    generation: u64,
    rng: StdRng,
}

impl Default for ViewerNavigator {
    fn default() -> Self {
        Self::with_rng(StdRng::from_rng(&mut rand::rng()))
    }
}

impl ViewerNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Navigator drawing shuffle orders from `rng`
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            card_id: None,
            title: String::new(),
            folder: None,
            images: Vec::new(),
            mode: NavMode::default(),
            h_flip: false,
            is_loading: false,
            error: None,
            generation: 0,
            rng,
        }
    }

    // ---------------------------------------------------------------------
    // Loading
    // ---------------------------------------------------------------------

    /// Start a session for `card_id`. Any load still in flight becomes stale.
    pub fn begin_load(
        &mut self,
        card_id: &str,
        title: &str,
        folder: &Path,
        initial_index: usize,
        h_flip: bool,
        shuffle: bool,
    ) -> LoadTicket {
        self.generation += 1;
        self.card_id = Some(card_id.to_string());
        self.title = title.to_string();
        self.folder = Some(folder.to_path_buf());
        self.images.clear();
        self.mode = NavMode::default();
        self.h_flip = h_flip;
        self.is_loading = true;
        self.error = None;

        debug!(card_id = %card_id, folder = %folder.display(), generation = self.generation, "Loading images");
        LoadTicket {
            generation: self.generation,
            card_id: card_id.to_string(),
            folder: folder.to_path_buf(),
            initial_index,
            shuffle,
        }
    }

    /// Apply the outcome of a scan. Returns `false` if the ticket is stale.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<ImageRef>, ViewerError>,
    ) -> bool {
        if ticket.generation != self.generation {
            debug!(card_id = %ticket.card_id, "Discarding stale image load");
            return false;
        }
        self.is_loading = false;

        let images = match result {
            Ok(images) if images.is_empty() => {
                warn!(folder = %ticket.folder.display(), "Folder has no images");
                self.error = Some(ViewerError::EmptyFolder(ticket.folder));
                return true;
            }
            Ok(images) => images,
            Err(e) => {
                warn!(card_id = %ticket.card_id, error = %e, "Failed to load images");
                self.error = Some(e);
                return true;
            }
        };

        let start = ticket.initial_index.min(images.len() - 1);
        self.mode = if ticket.shuffle {
            NavMode::Shuffled {
                permutation: shuffle::shuffled_indices(images.len(), start, &mut self.rng),
                position: 0,
            }
        } else {
            NavMode::Sequential { index: start }
        };
        self.images = images;

        info!(
            card_id = %ticket.card_id,
            count = self.images.len(),
            index = start,
            shuffle = ticket.shuffle,
            "Viewer session ready"
        );
        true
    }

    /// Synchronous load through `source`
    #[allow(clippy::too_many_arguments)]
    pub fn load_images(
        &mut self,
        source: &dyn ImageSource,
        card_id: &str,
        title: &str,
        folder: &Path,
        initial_index: usize,
        h_flip: bool,
        shuffle: bool,
    ) -> bool {
        let ticket = self.begin_load(card_id, title, folder, initial_index, h_flip, shuffle);
        let result = source.enumerate_images(folder);
        self.finish_load(ticket, result)
    }

    /// Back to the empty state; pending loads become stale
    pub fn reset(&mut self) {
        self.generation += 1;
        self.card_id = None;
        self.title.clear();
        self.folder = None;
        self.images.clear();
        self.mode = NavMode::default();
        self.h_flip = false;
        self.is_loading = false;
        self.error = None;
    }

    // ---------------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------------

    /// Advance with wraparound. Returns whether a session image is shown.
    pub fn go_to_next(&mut self) -> bool {
        let count = self.images.len();
        if count == 0 {
            return false;
        }
        let next = (self.mode.position() + 1) % count;
        self.mode.set_position(next);
        true
    }

    pub fn go_to_prev(&mut self) -> bool {
        let count = self.images.len();
        if count == 0 {
            return false;
        }
        let prev = (self.mode.position() + count - 1) % count;
        self.mode.set_position(prev);
        true
    }

    /// Jump to a position in the active order, clamped to the list
    pub fn go_to_index(&mut self, index: usize) -> bool {
        let count = self.images.len();
        if count == 0 {
            return false;
        }
        self.mode.set_position(index.min(count - 1));
        true
    }

    pub fn toggle_shuffle(&mut self) {
        let enabled = !self.shuffle_enabled();
        self.set_shuffle(enabled);
    }

    /// Switch order without changing the visible image. Without images there
    /// is nothing to order and the call does nothing.
    pub fn set_shuffle(&mut self, enabled: bool) {
        if enabled == self.shuffle_enabled() || self.images.is_empty() {
            return;
        }
        let anchor = self.mode.logical();
        self.mode = if enabled {
            NavMode::Shuffled {
                permutation: shuffle::shuffled_indices(self.images.len(), anchor, &mut self.rng),
                position: 0,
            }
        } else {
            NavMode::Sequential { index: anchor }
        };
        debug!(shuffle = enabled, anchor, "Shuffle toggled");
    }

    pub fn toggle_h_flip(&mut self) {
        self.h_flip = !self.h_flip;
    }

    pub fn set_h_flip(&mut self, enabled: bool) {
        self.h_flip = enabled;
    }

    // ---------------------------------------------------------------------
    // Read model
    // ---------------------------------------------------------------------

    pub fn card_id(&self) -> Option<&str> {
        self.card_id.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn folder(&self) -> Option<&Path> {
        self.folder.as_deref()
    }

    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    pub fn mode(&self) -> &NavMode {
        &self.mode
    }

    pub fn current_index(&self) -> usize {
        self.mode.position()
    }

    /// Index of the visible image in the unshuffled list
    pub fn logical_index(&self) -> usize {
        self.mode.logical()
    }

    pub fn current_image(&self) -> Option<&ImageRef> {
        self.images.get(self.mode.logical())
    }

    pub fn navigation_state(&self) -> NavigationState {
        NavigationState {
            current_index: self.current_index(),
            total_images: self.images.len(),
            actual_index: self.logical_index(),
        }
    }

    pub fn shuffle_enabled(&self) -> bool {
        matches!(self.mode, NavMode::Shuffled { .. })
    }

    pub fn h_flip_enabled(&self) -> bool {
        self.h_flip
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&ViewerError> {
        self.error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }
}
