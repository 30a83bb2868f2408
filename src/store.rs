//! Profile store: the single owner of the active profile document
//!
//! All card/tag/app-state mutations are synchronous and in-memory. Nothing
//! here writes to disk on its own; callers decide when to call
//! [`ProfileStore::save_current_profile`].

use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::profile::now_rfc3339;
use crate::config::{
    AppConfig, AppStatePatch, Card, CardPatch, CardTag, CardWithStatus, ProfileDocument,
    RecentProfile, Tag,
};
use crate::constants::config::PROFILE_EXTENSION;
use crate::error::StoreError;
use crate::images::{ImageSource, folder_problem};
use crate::ordered;
use crate::persistence::{PersistenceBridge, normalize_profile_path};
use crate::window::DialogProvider;

pub struct ProfileStore<P: PersistenceBridge> {
    persistence: P,
    current: Option<ProfileDocument>,
    current_path: Option<PathBuf>,
    app_config: AppConfig,
    initialized: bool,
    /// Last failure message, read-and-cleared by the UI
    error: Option<String>,
}

/// Default card title for a folder: its last path component
pub fn default_card_title(folder: &Path) -> String {
    folder
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| folder.display().to_string())
}

impl<P: PersistenceBridge> ProfileStore<P> {
    pub fn new(persistence: P) -> Self {
        Self {
            persistence,
            current: None,
            current_path: None,
            app_config: AppConfig::default(),
            initialized: false,
            error: None,
        }
    }

    /// Load the app config once; later calls are no-ops
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        match self.persistence.load_app_config() {
            Ok(config) => self.app_config = config,
            Err(e) => {
                let err = StoreError::persistence(e.context("Failed to load app config"));
                self.note(&err);
            }
        }
        self.initialized = true;
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn is_loaded(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&ProfileDocument> {
        self.current.as_ref()
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    /// File name of the current profile without the `.ivprofile` extension
    pub fn current_profile_name(&self) -> String {
        let Some(path) = &self.current_path else {
            return String::new();
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        name.strip_suffix(&format!(".{PROFILE_EXTENSION}"))
            .map(str::to_string)
            .unwrap_or(name)
    }

    pub fn app_config(&self) -> &AppConfig {
        &self.app_config
    }

    pub fn recent_profiles(&self) -> &[RecentProfile] {
        &self.app_config.recent_profiles
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn take_error(&mut self) -> Option<String> {
        self.error.take()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    fn note(&mut self, err: &StoreError) {
        match err {
            StoreError::Persistence(_) => error!(error = %err, "Profile store operation failed"),
            _ => warn!(error = %err, "Profile store operation rejected"),
        }
        self.error = Some(err.to_string());
    }

    /// Record the failure (if any) in the message field and pass it through
    fn record<T>(&mut self, result: Result<T, StoreError>) -> Result<T, StoreError> {
        if let Err(err) = &result {
            self.note(err);
        }
        result
    }

    fn doc_mut(&mut self) -> Result<&mut ProfileDocument, StoreError> {
        self.current.as_mut().ok_or(StoreError::NoActiveProfile)
    }

    // ---------------------------------------------------------------------
    // Document lifecycle
    // ---------------------------------------------------------------------

    fn remember_recent(&mut self, path: &Path) {
        self.app_config.add_recent(&path.to_string_lossy());
        // Non-fatal: the document is already open
        if let Err(e) = self.persistence.save_app_config(&self.app_config) {
            warn!(error = %format!("{e:#}"), "Failed to update recent profiles");
        }
    }

    fn install(&mut self, path: PathBuf, mut doc: ProfileDocument) {
        ordered::sort_stable(&mut doc.cards);
        if let Some(previous) = &self.current_path
            && previous != &path
        {
            info!(previous = %previous.display(), "Discarding in-memory profile without saving");
        }
        info!(path = %path.display(), cards = doc.cards.len(), "Profile is now current");
        self.current = Some(doc);
        self.current_path = Some(path);
    }

    /// Replace the current document with the one at `path`
    pub fn open_profile(&mut self, path: &Path) -> Result<(), StoreError> {
        self.error = None;
        let result = self
            .persistence
            .load_profile_document(path)
            .map_err(|e| StoreError::persistence(e.context("Could not open profile")));
        let doc = self.record(result)?;

        self.install(path.to_path_buf(), doc);
        self.remember_recent(path);
        Ok(())
    }

    /// Create a fresh document at `path` (`.ivprofile` appended if missing)
    pub fn create_profile(&mut self, path: &Path) -> Result<(), StoreError> {
        self.error = None;
        let path = normalize_profile_path(path);
        let result = self
            .persistence
            .create_profile_document(&path)
            .map_err(|e| StoreError::persistence(e.context("Could not create profile")));
        let doc = self.record(result)?;

        self.install(path.clone(), doc);
        self.remember_recent(&path);
        Ok(())
    }

    pub fn save_current_profile(&mut self) -> Result<(), StoreError> {
        let result = match (&self.current, &self.current_path) {
            (Some(doc), Some(path)) => self
                .persistence
                .save_profile_document(path, doc)
                .map_err(|e| StoreError::persistence(e.context("Could not save profile"))),
            _ => Err(StoreError::NoActiveProfile),
        };
        self.record(result)
    }

    /// Write the current document to `path` and make that the current path
    pub fn save_profile_as(&mut self, path: &Path) -> Result<(), StoreError> {
        let path = normalize_profile_path(path);
        let result = match &self.current {
            Some(doc) => self
                .persistence
                .save_profile_document(&path, doc)
                .map_err(|e| StoreError::persistence(e.context("Could not save profile"))),
            None => Err(StoreError::NoActiveProfile),
        };
        self.record(result)?;

        self.current_path = Some(path.clone());
        self.remember_recent(&path);
        Ok(())
    }

    pub fn close_profile(&mut self) {
        self.current = None;
        self.current_path = None;
        self.error = None;
    }

    pub fn remove_from_history(&mut self, path: &str) -> Result<(), StoreError> {
        if !self.app_config.remove_recent(path) {
            return Ok(());
        }
        let result = self
            .persistence
            .save_app_config(&self.app_config)
            .map_err(|e| StoreError::persistence(e.context("Could not update history")));
        self.record(result)
    }

    /// `Ok(false)` when the user cancels the dialog
    pub fn open_profile_with_dialog(
        &mut self,
        dialogs: &mut dyn DialogProvider,
    ) -> Result<bool, StoreError> {
        match dialogs.select_profile_file() {
            Some(path) => self.open_profile(&path).map(|()| true),
            None => Ok(false),
        }
    }

    pub fn create_profile_with_dialog(
        &mut self,
        dialogs: &mut dyn DialogProvider,
    ) -> Result<bool, StoreError> {
        match dialogs.select_save_target() {
            Some(path) => self.create_profile(&path).map(|()| true),
            None => Ok(false),
        }
    }

    pub fn save_profile_as_with_dialog(
        &mut self,
        dialogs: &mut dyn DialogProvider,
    ) -> Result<bool, StoreError> {
        if self.current.is_none() {
            return self.record(Err(StoreError::NoActiveProfile));
        }
        match dialogs.select_save_target() {
            Some(path) => self.save_profile_as(&path).map(|()| true),
            None => Ok(false),
        }
    }

    /// Let the user pick a thumbnail image, starting in the card's folder
    pub fn choose_thumbnail_with_dialog(
        &mut self,
        card_id: &str,
        dialogs: &mut dyn DialogProvider,
    ) -> Result<bool, StoreError> {
        let card = self.require_card(card_id)?;
        let Some(image) = dialogs.select_image_file(Some(Path::new(&card.folder_path))) else {
            return Ok(false);
        };
        let patch = CardPatch {
            thumbnail: Some(Some(image.to_string_lossy().to_string())),
            ..CardPatch::default()
        };
        self.update_card(card_id, patch).map(|_| true)
    }

    // ---------------------------------------------------------------------
    // Cards
    // ---------------------------------------------------------------------

    /// Append a card after every existing one
    pub fn add_card(
        &mut self,
        folder_path: &str,
        title: &str,
        thumbnail: Option<String>,
    ) -> Result<Card, StoreError> {
        let result = self.doc_mut().map(|doc| {
            let now = now_rfc3339();
            let card = Card {
                id: Uuid::new_v4().to_string(),
                title: title.to_string(),
                folder_path: folder_path.to_string(),
                thumbnail,
                sort_order: ordered::next_sort_order(&doc.cards),
                created_at: now.clone(),
                updated_at: now,
            };
            doc.cards.push(card.clone());
            doc.touch();
            card
        });
        let card = self.record(result)?;
        info!(card_id = %card.id, folder = %card.folder_path, sort_order = card.sort_order, "Added card");
        Ok(card)
    }

    /// Add a card with the folder name as title and its first image as thumbnail
    pub fn add_card_for_folder(
        &mut self,
        folder: &Path,
        images: &dyn ImageSource,
    ) -> Result<Card, StoreError> {
        let thumbnail = match images.first_image(folder) {
            Ok(first) => first.map(|image| image.path.to_string_lossy().to_string()),
            Err(e) => {
                warn!(folder = %folder.display(), error = %e, "No thumbnail for new card");
                None
            }
        };
        self.add_card(
            &folder.to_string_lossy(),
            &default_card_title(folder),
            thumbnail,
        )
    }

    /// Shallow-merge `patch` into the card; always refreshes timestamps
    pub fn update_card(&mut self, card_id: &str, patch: CardPatch) -> Result<Card, StoreError> {
        let result = self.doc_mut().and_then(|doc| {
            let card = doc
                .card_mut(card_id)
                .ok_or_else(|| StoreError::CardNotFound(card_id.to_string()))?;
            if let Some(title) = patch.title {
                card.title = title;
            }
            if let Some(folder_path) = patch.folder_path {
                card.folder_path = folder_path;
            }
            if let Some(thumbnail) = patch.thumbnail {
                card.thumbnail = thumbnail;
            }
            card.updated_at = now_rfc3339();
            let updated = card.clone();
            doc.updated_at = updated.updated_at.clone();
            Ok(updated)
        });
        self.record(result)
    }

    /// Remove the card and every tag association that references it
    pub fn delete_card(&mut self, card_id: &str) -> Result<bool, StoreError> {
        let result = self.doc_mut().and_then(|doc| {
            let position = doc
                .cards
                .iter()
                .position(|c| c.id == card_id)
                .ok_or_else(|| StoreError::CardNotFound(card_id.to_string()))?;
            doc.cards.remove(position);
            let before = doc.card_tags.len();
            doc.card_tags.retain(|ct| ct.card_id != card_id);
            doc.touch();
            Ok(before - doc.card_tags.len())
        });
        let severed = self.record(result)?;
        info!(card_id = %card_id, severed_tags = severed, "Deleted card");
        Ok(true)
    }

    /// Reassign sort keys so cards follow `ordered_ids`; unnamed cards follow
    pub fn reorder_cards<S: AsRef<str>>(&mut self, ordered_ids: &[S]) -> Result<(), StoreError> {
        let result = self.doc_mut().map(|doc| {
            let cards = std::mem::take(&mut doc.cards);
            doc.cards = ordered::reorder(cards, ordered_ids);
            doc.touch();
        });
        self.record(result)
    }

    pub fn card(&self, card_id: &str) -> Option<&Card> {
        self.current.as_ref()?.card(card_id)
    }

    /// Like [`Self::card`], but a miss is recorded as an error
    pub fn require_card(&mut self, card_id: &str) -> Result<Card, StoreError> {
        let result = match &self.current {
            Some(doc) => doc
                .card(card_id)
                .cloned()
                .ok_or_else(|| StoreError::CardNotFound(card_id.to_string())),
            None => Err(StoreError::NoActiveProfile),
        };
        self.record(result)
    }

    /// Cards in display order; empty without a document
    pub fn cards(&self) -> Vec<&Card> {
        self.current
            .as_ref()
            .map(ProfileDocument::sorted_cards)
            .unwrap_or_default()
    }

    /// Cards in display order with their folder checked on disk
    pub fn cards_with_status(&self) -> Vec<CardWithStatus> {
        self.cards()
            .into_iter()
            .map(|card| {
                let problem = folder_problem(Path::new(&card.folder_path));
                CardWithStatus {
                    card: card.clone(),
                    is_valid: problem.is_none(),
                    error_message: problem,
                }
            })
            .collect()
    }

    // ---------------------------------------------------------------------
    // Tags
    // ---------------------------------------------------------------------

    pub fn add_tag(&mut self, name: &str, color: Option<String>) -> Result<Tag, StoreError> {
        let result = self.doc_mut().map(|doc| {
            let tag = Tag {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                color,
            };
            doc.tags.push(tag.clone());
            doc.touch();
            tag
        });
        self.record(result)
    }

    /// Associate a tag with a card. `Ok(false)` if already associated.
    pub fn assign_tag(&mut self, card_id: &str, tag_id: &str) -> Result<bool, StoreError> {
        let result = self.doc_mut().and_then(|doc| {
            if doc.card(card_id).is_none() {
                return Err(StoreError::CardNotFound(card_id.to_string()));
            }
            if !doc.tags.iter().any(|t| t.id == tag_id) {
                return Err(StoreError::TagNotFound(tag_id.to_string()));
            }
            if doc.card_tags.iter().any(|ct| ct.card_id == card_id && ct.tag_id == tag_id) {
                return Ok(false);
            }
            doc.card_tags.push(CardTag {
                card_id: card_id.to_string(),
                tag_id: tag_id.to_string(),
            });
            doc.touch();
            Ok(true)
        });
        self.record(result)
    }

    pub fn tags_for_card(&self, card_id: &str) -> Vec<&Tag> {
        let Some(doc) = &self.current else {
            return Vec::new();
        };
        doc.card_tags
            .iter()
            .filter(|ct| ct.card_id == card_id)
            .filter_map(|ct| doc.tags.iter().find(|t| t.id == ct.tag_id))
            .collect()
    }

    // ---------------------------------------------------------------------
    // App state
    // ---------------------------------------------------------------------

    /// Merge into the resume state. Silently does nothing without a document,
    /// since window-close paths call this opportunistically.
    pub fn update_app_state(&mut self, patch: AppStatePatch) -> bool {
        match self.current.as_mut() {
            Some(doc) => {
                doc.app_state.apply(patch);
                doc.touch();
                true
            }
            None => false,
        }
    }

    /// The card named by `appState.lastCardId`, if it still exists
    pub fn resume_card(&self) -> Option<&Card> {
        let doc = self.current.as_ref()?;
        let card_id = doc.app_state.last_card_id.as_deref()?;
        doc.card(card_id)
    }
}
