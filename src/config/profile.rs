//! Profile document model (the contents of an `.ivprofile` file)
//!
//! Field names are camelCase on disk; they are the compatibility contract
//! for round-tripping documents written by earlier versions.

use serde::{Deserialize, Serialize};

use crate::constants::{config, window};
use crate::ordered::SortKeyed;
use crate::types::Page;

/// Current time as an RFC 3339 string (document timestamp format)
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// A user-registered folder bookmark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub title: String,
    pub folder_path: String,
    pub thumbnail: Option<String>,
    pub sort_order: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl SortKeyed for Card {
    fn sort_id(&self) -> &str {
        &self.id
    }

    fn sort_order(&self) -> i32 {
        self.sort_order
    }

    fn set_sort_order(&mut self, order: i32) {
        self.sort_order = order;
    }
}

/// Partial card update. `None` leaves a field untouched;
/// `thumbnail: Some(None)` clears the thumbnail.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardPatch {
    pub title: Option<String>,
    pub folder_path: Option<String>,
    pub thumbnail: Option<Option<String>>,
}

impl CardPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.folder_path.is_none() && self.thumbnail.is_none()
    }
}

/// Card plus the result of checking its folder on disk
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardWithStatus {
    #[serde(flatten)]
    pub card: Card,
    pub is_valid: bool,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// Card <-> tag association
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardTag {
    pub card_id: String,
    pub tag_id: String,
}

/// Last known window placement. Position is optional so a fresh profile
/// lets the window manager pick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowState {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowState {
    fn default() -> Self {
        Self {
            x: None,
            y: None,
            width: window::DEFAULT_WIDTH,
            height: window::DEFAULT_HEIGHT,
        }
    }
}

/// Resume point stored inside the profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default)]
    pub last_page: Page,
    #[serde(default)]
    pub last_card_id: Option<String>,
    #[serde(default)]
    pub last_image_index: usize,
    #[serde(default)]
    pub h_flip_enabled: bool,
    #[serde(default)]
    pub shuffle_enabled: bool,
    #[serde(default)]
    pub window: WindowState,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            last_page: Page::Index,
            last_card_id: None,
            last_image_index: 0,
            h_flip_enabled: false,
            shuffle_enabled: false,
            window: WindowState::default(),
        }
    }
}

/// Partial `AppState` update; `last_card_id: Some(None)` clears the card
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppStatePatch {
    pub last_page: Option<Page>,
    pub last_card_id: Option<Option<String>>,
    pub last_image_index: Option<usize>,
    pub h_flip_enabled: Option<bool>,
    pub shuffle_enabled: Option<bool>,
    pub window: Option<WindowState>,
}

impl AppState {
    pub fn apply(&mut self, patch: AppStatePatch) {
        if let Some(page) = patch.last_page {
            self.last_page = page;
        }
        if let Some(card_id) = patch.last_card_id {
            self.last_card_id = card_id;
        }
        if let Some(index) = patch.last_image_index {
            self.last_image_index = index;
        }
        if let Some(h_flip) = patch.h_flip_enabled {
            self.h_flip_enabled = h_flip;
        }
        if let Some(shuffle) = patch.shuffle_enabled {
            self.shuffle_enabled = shuffle;
        }
        if let Some(window) = patch.window {
            self.window = window;
        }
    }
}

/// Whole profile document. Owned by the profile store; never self-saves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDocument {
    pub version: String,
    pub updated_at: String,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub card_tags: Vec<CardTag>,
    #[serde(default)]
    pub app_state: AppState,
}

impl Default for ProfileDocument {
    fn default() -> Self {
        Self {
            version: config::DOCUMENT_VERSION.to_string(),
            updated_at: now_rfc3339(),
            cards: Vec::new(),
            tags: Vec::new(),
            card_tags: Vec::new(),
            app_state: AppState::default(),
        }
    }
}

impl ProfileDocument {
    pub fn touch(&mut self) {
        self.updated_at = now_rfc3339();
    }

    pub fn card(&self, card_id: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == card_id)
    }

    pub fn card_mut(&mut self, card_id: &str) -> Option<&mut Card> {
        self.cards.iter_mut().find(|c| c.id == card_id)
    }

    /// Cards in display order (by sort key, ties by insertion)
    pub fn sorted_cards(&self) -> Vec<&Card> {
        let mut cards: Vec<&Card> = self.cards.iter().collect();
        cards.sort_by_key(|c| c.sort_order);
        cards
    }
}
