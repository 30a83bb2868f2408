//! Application controller
//!
//! Ties the profile store, the viewer session and the zoom controller to one
//! window. Owns page routing, restore-on-open, and the points at which the
//! profile is written back (leaving the viewer, window close, Ctrl+S).

use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::clipboard::{self, ClipboardSink, SystemClipboard};
use crate::config::{AppStatePatch, Card, WindowState};
use crate::error::StoreError;
use crate::images::ImageSource;
use crate::keymap::{self, IndexAction, KeyInput, MenuAction, ViewerAction};
use crate::persistence::PersistenceBridge;
use crate::store::ProfileStore;
use crate::types::{LogicalSize, Page};
use crate::viewer::ViewerNavigator;
use crate::window::{DialogProvider, WindowHost};
use crate::zoom::ZoomController;

/// Columns assumed for grid navigation until the host reports its layout
const DEFAULT_GRID_COLUMNS: usize = 4;

pub struct App<P: PersistenceBridge, S: ImageSource, W: WindowHost> {
    store: ProfileStore<P>,
    images: S,
    window: W,
    navigator: ViewerNavigator,
    zoom: ZoomController,
    page: Page,
    selection: Option<usize>,
    columns: usize,
    context_menu_open: bool,
    clipboard: Box<dyn ClipboardSink>,
}

impl<P: PersistenceBridge, S: ImageSource, W: WindowHost> App<P, S, W> {
    pub fn new(store: ProfileStore<P>, images: S, window: W) -> Self {
        Self::with_navigator(store, images, window, ViewerNavigator::new())
    }

    pub fn with_navigator(
        mut store: ProfileStore<P>,
        images: S,
        window: W,
        navigator: ViewerNavigator,
    ) -> Self {
        store.initialize();
        Self {
            store,
            images,
            window,
            navigator,
            zoom: ZoomController::new(),
            page: Page::Index,
            selection: None,
            columns: DEFAULT_GRID_COLUMNS,
            context_menu_open: false,
            clipboard: Box::new(SystemClipboard::default()),
        }
    }

    /// Replace the desktop clipboard the context menu copies to
    pub fn with_clipboard(mut self, clipboard: impl ClipboardSink + 'static) -> Self {
        self.clipboard = Box::new(clipboard);
        self
    }

    pub fn store(&self) -> &ProfileStore<P> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ProfileStore<P> {
        &mut self.store
    }

    pub fn images(&self) -> &S {
        &self.images
    }

    pub fn window(&self) -> &W {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut W {
        &mut self.window
    }

    pub fn navigator(&self) -> &ViewerNavigator {
        &self.navigator
    }

    pub fn zoom(&self) -> &ZoomController {
        &self.zoom
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    /// Column count of the rendered card grid
    pub fn set_columns(&mut self, columns: usize) {
        self.columns = columns.max(1);
    }

    pub fn context_menu_open(&self) -> bool {
        self.context_menu_open
    }

    pub fn close_context_menu(&mut self) {
        self.context_menu_open = false;
    }

    // ---------------------------------------------------------------------
    // Profiles
    // ---------------------------------------------------------------------

    /// Open a profile and resume where it was left
    pub fn open_profile(&mut self, path: &Path) -> Result<(), StoreError> {
        self.leave_viewer_without_saving();
        self.store.open_profile(path)?;
        self.restore();
        Ok(())
    }

    pub fn create_profile(&mut self, path: &Path) -> Result<(), StoreError> {
        self.leave_viewer_without_saving();
        self.store.create_profile(path)?;
        self.page = Page::Index;
        self.selection = None;
        Ok(())
    }

    /// Let the user pick a profile to open. `Ok(false)` when cancelled.
    pub fn open_profile_with_dialog(
        &mut self,
        dialogs: &mut dyn DialogProvider,
    ) -> Result<bool, StoreError> {
        let opened = self.store.open_profile_with_dialog(dialogs)?;
        if opened {
            self.leave_viewer_without_saving();
            self.restore();
        }
        Ok(opened)
    }

    pub fn create_profile_with_dialog(
        &mut self,
        dialogs: &mut dyn DialogProvider,
    ) -> Result<bool, StoreError> {
        let created = self.store.create_profile_with_dialog(dialogs)?;
        if created {
            self.leave_viewer_without_saving();
            self.selection = None;
        }
        Ok(created)
    }

    /// Write the profile, with the current session, to a new location
    pub fn save_profile_as_with_dialog(
        &mut self,
        dialogs: &mut dyn DialogProvider,
    ) -> Result<bool, StoreError> {
        let patch = self.snapshot();
        self.store.update_app_state(patch);
        self.store.save_profile_as_with_dialog(dialogs)
    }

    /// Pick a thumbnail for the selected card. `Ok(false)` when nothing is
    /// selected or the dialog is cancelled.
    pub fn choose_thumbnail_with_dialog(
        &mut self,
        dialogs: &mut dyn DialogProvider,
    ) -> Result<bool, StoreError> {
        match self.selected_card_id() {
            Some(card_id) => self.store.choose_thumbnail_with_dialog(&card_id, dialogs),
            None => Ok(false),
        }
    }

    /// Most recent profile, if any still opens
    pub fn open_last_profile(&mut self) -> Option<PathBuf> {
        let candidates: Vec<PathBuf> = self
            .store
            .recent_profiles()
            .iter()
            .map(|r| PathBuf::from(&r.path))
            .collect();
        for path in candidates {
            match self.open_profile(&path) {
                Ok(()) => return Some(path),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping recent profile"),
            }
        }
        None
    }

    fn restore(&mut self) {
        self.selection = None;
        self.page = Page::Index;
        let Some(doc) = self.store.current() else {
            return;
        };
        let state = doc.app_state.clone();

        let size = LogicalSize::new(state.window.width as f64, state.window.height as f64);
        if !size.is_empty() {
            self.zoom.resize_window(&mut self.window, size);
        }
        if let (Some(x), Some(y)) = (state.window.x, state.window.y)
            && let Err(e) = self.window.set_window_position(x, y)
        {
            warn!(error = %format!("{e:#}"), "Could not restore window position");
        }

        if state.last_page != Page::Viewer {
            return;
        }
        let Some(card) = self.store.resume_card().cloned() else {
            info!(card_id = ?state.last_card_id, "Resume card is gone, staying on index");
            return;
        };
        info!(card_id = %card.id, index = state.last_image_index, "Resuming viewer");
        self.start_viewer(
            &card,
            state.last_image_index,
            state.h_flip_enabled,
            state.shuffle_enabled,
        );
    }

    // ---------------------------------------------------------------------
    // Viewer lifecycle
    // ---------------------------------------------------------------------

    /// Open a card from the index, keeping the remembered flip/shuffle flags
    pub fn open_card(&mut self, card_id: &str) -> Result<(), StoreError> {
        let card = self.store.require_card(card_id)?;
        let (h_flip, shuffle) = self
            .store
            .current()
            .map(|doc| (doc.app_state.h_flip_enabled, doc.app_state.shuffle_enabled))
            .unwrap_or_default();
        self.start_viewer(&card, 0, h_flip, shuffle);
        Ok(())
    }

    fn start_viewer(&mut self, card: &Card, index: usize, h_flip: bool, shuffle: bool) {
        self.page = Page::Viewer;
        self.context_menu_open = false;
        self.navigator.load_images(
            &self.images,
            &card.id,
            &card.title,
            Path::new(&card.folder_path),
            index,
            h_flip,
            shuffle,
        );
        self.image_changed();
        self.store.update_app_state(AppStatePatch {
            last_page: Some(Page::Viewer),
            last_card_id: Some(Some(card.id.clone())),
            ..AppStatePatch::default()
        });
    }

    /// Back to the index; the session is written to the profile and saved
    pub fn leave_viewer(&mut self) -> Result<(), StoreError> {
        if self.page != Page::Viewer {
            return Ok(());
        }
        let mut patch = self.snapshot();
        patch.last_page = Some(Page::Index);
        self.store.update_app_state(patch);
        self.leave_viewer_without_saving();
        self.store.save_current_profile()
    }

    fn leave_viewer_without_saving(&mut self) {
        self.navigator.reset();
        self.zoom.clear();
        self.context_menu_open = false;
        self.page = Page::Index;
    }

    /// Resume state for the current page, window included
    fn snapshot(&self) -> AppStatePatch {
        let mut patch = AppStatePatch {
            last_page: Some(self.page),
            window: self.window_state(),
            ..AppStatePatch::default()
        };
        if self.page == Page::Viewer
            && let Some(card_id) = self.navigator.card_id()
        {
            patch.last_card_id = Some(Some(card_id.to_string()));
            patch.last_image_index = Some(self.navigator.logical_index());
            patch.h_flip_enabled = Some(self.navigator.h_flip_enabled());
            patch.shuffle_enabled = Some(self.navigator.shuffle_enabled());
        }
        patch
    }

    fn window_state(&self) -> Option<WindowState> {
        match self.window.window_geometry() {
            Ok(geometry) => {
                let size = geometry.logical_size();
                Some(WindowState {
                    x: Some(geometry.x),
                    y: Some(geometry.y),
                    width: size.width.round() as u32,
                    height: size.height.round() as u32,
                })
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Window geometry unavailable, not saving it");
                None
            }
        }
    }

    fn image_changed(&mut self) {
        self.zoom
            .on_image_changed(&self.window, &self.images, self.navigator.current_image());
    }

    // ---------------------------------------------------------------------
    // Viewer commands
    // ---------------------------------------------------------------------

    pub fn next_image(&mut self) {
        if self.navigator.go_to_next() {
            self.image_changed();
        }
    }

    pub fn prev_image(&mut self) {
        if self.navigator.go_to_prev() {
            self.image_changed();
        }
    }

    pub fn go_to_image(&mut self, index: usize) {
        if self.navigator.go_to_index(index) {
            self.image_changed();
        }
    }

    pub fn toggle_shuffle(&mut self) {
        self.navigator.toggle_shuffle();
    }

    pub fn toggle_h_flip(&mut self) {
        self.navigator.toggle_h_flip();
    }

    pub fn copy_current_image(&mut self) -> anyhow::Result<()> {
        let image = self.navigator.current_image().context("No image is shown")?;
        clipboard::copy_image_file(self.clipboard.as_mut(), &image.path)
    }

    pub fn copy_current_path(&mut self) -> anyhow::Result<()> {
        let image = self.navigator.current_image().context("No image is shown")?;
        clipboard::copy_path(self.clipboard.as_mut(), &image.path)
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.zoom.zoom_in(&mut self.window)
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.zoom.zoom_out(&mut self.window)
    }

    pub fn reset_zoom(&mut self) -> f64 {
        self.zoom.reset_zoom(&self.window)
    }

    // ---------------------------------------------------------------------
    // Host events
    // ---------------------------------------------------------------------

    pub fn on_window_resized(&mut self, size: LogicalSize) {
        self.zoom.on_window_resized(size);
    }

    /// Persist resume state before the window goes away
    pub fn on_close_requested(&mut self) -> Result<(), StoreError> {
        if !self.store.is_loaded() {
            return Ok(());
        }
        let patch = self.snapshot();
        self.store.update_app_state(patch);
        info!(page = ?self.page, "Saving on close");
        self.store.save_current_profile()
    }

    /// Dispatch a key press for the current page. Returns whether it was used.
    pub fn handle_key(&mut self, input: KeyInput, dialogs: &mut dyn DialogProvider) -> bool {
        match self.page {
            Page::Viewer => {
                if self.context_menu_open {
                    if let Some(action) = keymap::menu_action(input) {
                        self.apply_menu_action(action);
                        return true;
                    }
                    self.context_menu_open = false;
                }
                match keymap::viewer_action(input) {
                    Some(action) => {
                        self.apply_viewer_action(action);
                        true
                    }
                    None => false,
                }
            }
            Page::Index => match keymap::index_action(input) {
                Some(action) => {
                    self.apply_index_action(action, dialogs);
                    true
                }
                None => false,
            },
        }
    }

    fn apply_viewer_action(&mut self, action: ViewerAction) {
        debug!(?action, "Viewer key");
        match action {
            ViewerAction::Prev => self.prev_image(),
            ViewerAction::Next => self.next_image(),
            ViewerAction::ToggleHFlip => self.toggle_h_flip(),
            ViewerAction::ToggleShuffle => self.toggle_shuffle(),
            ViewerAction::ZoomIn => {
                self.zoom_in();
            }
            ViewerAction::ZoomOut => {
                self.zoom_out();
            }
            ViewerAction::ZoomReset => {
                self.reset_zoom();
            }
            ViewerAction::Leave => {
                // Failure is already in the store's message field
                let _ = self.leave_viewer();
            }
            ViewerAction::ContextMenu => self.context_menu_open = !self.context_menu_open,
        }
    }

    fn apply_menu_action(&mut self, action: MenuAction) {
        debug!(?action, "Menu key");
        let result = match action {
            MenuAction::CopyImage => self.copy_current_image(),
            MenuAction::CopyPath => self.copy_current_path(),
            MenuAction::Close => Ok(()),
        };
        if let Err(e) = result {
            warn!(error = %format!("{e:#}"), "Copy failed");
        }
        self.context_menu_open = false;
    }

    fn apply_index_action(&mut self, action: IndexAction, dialogs: &mut dyn DialogProvider) {
        debug!(?action, "Index key");
        match action {
            IndexAction::AddCard => {
                if let Some(folder) = dialogs.select_folder() {
                    let _ = self.store.add_card_for_folder(&folder, &self.images);
                }
            }
            IndexAction::Save => {
                let _ = self.store.save_current_profile();
            }
            IndexAction::DeleteSelected => self.delete_selected(),
            IndexAction::OpenSelected => {
                if let Some(card_id) = self.selected_card_id() {
                    let _ = self.open_card(&card_id);
                }
            }
            IndexAction::Move(direction) => {
                let count = self.store.cards().len();
                self.selection = keymap::move_selection(self.selection, direction, self.columns, count);
            }
        }
    }

    fn selected_card_id(&self) -> Option<String> {
        let index = self.selection?;
        self.store.cards().get(index).map(|card| card.id.clone())
    }

    fn delete_selected(&mut self) {
        let Some(card_id) = self.selected_card_id() else {
            return;
        };
        if self.store.delete_card(&card_id).is_ok() {
            let remaining = self.store.cards().len();
            self.selection = self
                .selection
                .filter(|_| remaining > 0)
                .map(|i| i.min(remaining - 1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppState, ProfileDocument};
    use crate::images::testing::StaticImages;
    use crate::keymap::Key;
    use crate::persistence::testing::MemoryPersistence;
    use crate::clipboard::testing::{Copied, RecordingClipboard};
    use crate::window::HeadlessWindow;
    use crate::window::testing::{DeferredWindow, ScriptedDialogs};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const PATH: &str = "/profiles/home.ivprofile";

    type TestApp = App<MemoryPersistence, StaticImages, HeadlessWindow>;

    fn card(id: &str, folder: &str, sort_order: i32) -> Card {
        Card {
            id: id.into(),
            title: id.to_uppercase(),
            folder_path: folder.into(),
            thumbnail: None,
            sort_order,
            created_at: "2025-01-01T00:00:00+00:00".into(),
            updated_at: "2025-01-01T00:00:00+00:00".into(),
        }
    }

    fn app_with(doc: ProfileDocument, images: StaticImages) -> TestApp {
        let store = ProfileStore::new(MemoryPersistence::with_document(PATH, doc));
        let navigator = ViewerNavigator::with_rng(StdRng::seed_from_u64(77));
        let mut app = App::with_navigator(store, images, HeadlessWindow::default(), navigator);
        app.open_profile(Path::new(PATH)).unwrap();
        app
    }

    fn pump(app: &mut TestApp) {
        let events = app.window_mut().take_resize_events();
        for event in events {
            app.on_window_resized(event);
        }
    }

    fn press(app: &mut TestApp, key: &str) -> bool {
        let input: KeyInput = key.parse().unwrap();
        app.handle_key(input, &mut ScriptedDialogs::default())
    }

    fn visible(app: &TestApp) -> String {
        app.navigator()
            .current_image()
            .map(|i| i.filename.clone())
            .unwrap_or_default()
    }

    fn saved_state(app: &TestApp) -> AppState {
        app.store().persistence().document(PATH).unwrap().app_state
    }

    #[test]
    fn test_restore_opens_viewer_on_same_logical_image() {
        let mut doc = ProfileDocument::default();
        doc.cards.push(card("c1", "/pics/c1", 0));
        doc.app_state = AppState {
            last_page: Page::Viewer,
            last_card_id: Some("c1".into()),
            last_image_index: 3,
            shuffle_enabled: true,
            ..AppState::default()
        };
        let app = app_with(doc, StaticImages::default().with_folder("/pics/c1", 10, 800, 600));

        assert_eq!(app.page(), Page::Viewer);
        assert_eq!(app.navigator().card_id(), Some("c1"));
        assert!(app.navigator().shuffle_enabled());
        assert_eq!(app.navigator().logical_index(), 3);
        assert_eq!(visible(&app), "img_003.jpg");
        assert_eq!(app.navigator().navigation_state().total_images, 10);
    }

    #[test]
    fn test_dangling_resume_card_stays_on_index() {
        let mut doc = ProfileDocument::default();
        doc.cards.push(card("c1", "/pics/c1", 0));
        doc.app_state.last_page = Page::Viewer;
        doc.app_state.last_card_id = Some("deleted".into());
        let app = app_with(doc, StaticImages::default());

        assert_eq!(app.page(), Page::Index);
        assert!(app.navigator().card_id().is_none());
        assert_eq!(app.store().error(), None);
    }

    #[test]
    fn test_restore_window_geometry() {
        let mut doc = ProfileDocument::default();
        doc.app_state.window = WindowState { x: Some(40), y: Some(30), width: 1000, height: 700 };
        let mut app = app_with(doc, StaticImages::default());

        let geometry = app.window().window_geometry().unwrap();
        assert_eq!((geometry.x, geometry.y, geometry.width, geometry.height), (40, 30, 1000, 700));
        pump(&mut app);
        assert_eq!(app.zoom().guard().pending(), 0);
    }

    #[test]
    fn test_restore_refits_when_window_resize_lands_late() {
        let mut doc = ProfileDocument::default();
        doc.cards.push(card("c1", "/pics/c1", 0));
        doc.app_state = AppState {
            last_page: Page::Viewer,
            last_card_id: Some("c1".into()),
            window: WindowState { x: None, y: None, width: 1000, height: 700 },
            ..AppState::default()
        };
        let store = ProfileStore::new(MemoryPersistence::with_document(PATH, doc));
        let images = StaticImages::default().with_folder("/pics/c1", 3, 1600, 1000);
        let mut app = App::new(store, images, DeferredWindow::default());
        app.open_profile(Path::new(PATH)).unwrap();

        assert_eq!(app.page(), Page::Viewer);
        // Still fitted against the default 1280x800 window
        assert_eq!(app.zoom().zoom_level(), 0.8);

        let events = app.window_mut().apply_requests();
        assert_eq!(events, vec![LogicalSize::new(1000.0, 700.0)]);
        for event in events {
            app.on_window_resized(event);
        }
        assert_eq!(app.zoom().zoom_level(), 0.63);
        assert_eq!(app.zoom().guard().pending(), 0);
    }

    #[test]
    fn test_add_open_navigate_and_shuffle() {
        let images = StaticImages::default().with_folder("/pics/a", 5, 1600, 1000);
        let mut app = app_with(ProfileDocument::default(), images);

        let mut dialogs = ScriptedDialogs::answering(&["/pics/a"]);
        assert!(app.handle_key(KeyInput::ctrl(Key::Char('n')), &mut dialogs));
        let cards = app.store().cards();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].sort_order, 0);
        let card_id = cards[0].id.clone();

        app.open_card(&card_id).unwrap();
        assert_eq!(app.page(), Page::Viewer);
        assert_eq!(app.navigator().images().len(), 5);
        assert_eq!(app.navigator().current_index(), 0);

        press(&mut app, "left");
        assert_eq!(app.navigator().current_index(), 4);
        let shown = visible(&app);

        press(&mut app, "r");
        assert!(app.navigator().shuffle_enabled());
        assert_eq!(app.navigator().current_index(), 0);
        assert_eq!(visible(&app), shown);

        press(&mut app, "r");
        assert!(!app.navigator().shuffle_enabled());
        assert_eq!(visible(&app), shown);
    }

    #[test]
    fn test_changing_image_resets_zoom() {
        let mut doc = ProfileDocument::default();
        doc.cards.push(card("c1", "/pics/c1", 0));
        let mut app = app_with(doc, StaticImages::default().with_folder("/pics/c1", 3, 1600, 1000));
        app.open_card("c1").unwrap();
        assert_eq!(app.zoom().zoom_level(), 0.8);

        press(&mut app, "+");
        pump(&mut app);
        assert_eq!(app.zoom().zoom_level(), 0.96);

        press(&mut app, "right");
        // Fit for the (now larger) window, not the zoomed level
        assert_eq!(app.zoom().zoom_level(), 0.96);
        press(&mut app, "-");
        pump(&mut app);
        assert_eq!(app.zoom().zoom_level(), 0.8);

        app.window_mut().user_resize(LogicalSize::new(800.0, 500.0));
        pump(&mut app);
        assert_eq!(app.zoom().zoom_level(), 0.5);
        press(&mut app, "0");
        assert_eq!(app.zoom().zoom_level(), 0.5);
    }

    #[test]
    fn test_leave_viewer_saves_resume_state() {
        let mut doc = ProfileDocument::default();
        doc.cards.push(card("c1", "/pics/c1", 0));
        let mut app = app_with(doc, StaticImages::default().with_folder("/pics/c1", 6, 100, 100));
        app.open_card("c1").unwrap();
        press(&mut app, "right");
        press(&mut app, "right");
        press(&mut app, "h");

        assert!(press(&mut app, "q"));
        assert_eq!(app.page(), Page::Index);
        assert!(app.navigator().images().is_empty());

        let state = saved_state(&app);
        assert_eq!(state.last_page, Page::Index);
        assert_eq!(state.last_card_id.as_deref(), Some("c1"));
        assert_eq!(state.last_image_index, 2);
        assert!(state.h_flip_enabled);
        assert!(!state.shuffle_enabled);
    }

    #[test]
    fn test_close_in_viewer_resumes_there() {
        let mut doc = ProfileDocument::default();
        doc.cards.push(card("c1", "/pics/c1", 0));
        let images = StaticImages::default().with_folder("/pics/c1", 10, 100, 100);
        let mut app = app_with(doc, images);
        app.open_card("c1").unwrap();
        app.toggle_shuffle();
        app.next_image();
        let logical = app.navigator().logical_index();

        app.on_close_requested().unwrap();
        let state = saved_state(&app);
        assert_eq!(state.last_page, Page::Viewer);
        assert_eq!(state.last_image_index, logical);
        assert!(state.shuffle_enabled);
        assert_eq!(state.window.width, 1280);

        // Reopen from what was saved
        let saved = app.store().persistence().document(PATH).unwrap();
        let images = StaticImages::default().with_folder("/pics/c1", 10, 100, 100);
        let reopened = app_with(saved, images);
        assert_eq!(reopened.page(), Page::Viewer);
        assert_eq!(reopened.navigator().logical_index(), logical);
    }

    #[test]
    fn test_empty_folder_viewer_can_leave() {
        let mut doc = ProfileDocument::default();
        doc.cards.push(card("c1", "/pics/empty", 0));
        let mut app = app_with(doc, StaticImages::default().with_folder("/pics/empty", 0, 1, 1));
        app.open_card("c1").unwrap();

        assert!(app.navigator().error().is_some());
        assert!(press(&mut app, "right"));
        assert!(press(&mut app, "escape"));
        assert_eq!(app.page(), Page::Index);
    }

    #[test]
    fn test_open_unknown_card() {
        let mut app = app_with(ProfileDocument::default(), StaticImages::default());
        assert_eq!(
            app.open_card("nope").unwrap_err(),
            StoreError::CardNotFound("nope".into())
        );
        assert_eq!(app.page(), Page::Index);
        assert!(app.store_mut().take_error().is_some());
    }

    #[test]
    fn test_index_selection_and_delete() {
        let mut doc = ProfileDocument::default();
        for (i, id) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            doc.cards.push(card(id, "/x", i as i32));
        }
        let mut app = app_with(doc, StaticImages::default());
        app.set_columns(2);

        press(&mut app, "down");
        assert_eq!(app.selection(), Some(0));
        press(&mut app, "down");
        press(&mut app, "right");
        assert_eq!(app.selection(), Some(3));

        press(&mut app, "delete");
        let ids: Vec<_> = app.store().cards().iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "e"]);
        assert_eq!(app.selection(), Some(3));

        press(&mut app, "enter");
        assert_eq!(app.page(), Page::Viewer);
        assert_eq!(app.navigator().card_id(), Some("e"));
    }

    #[test]
    fn test_ctrl_s_saves() {
        let mut app = app_with(ProfileDocument::default(), StaticImages::default());
        let before = app.store().persistence().saves.get();
        assert!(press(&mut app, "ctrl+s"));
        assert_eq!(app.store().persistence().saves.get(), before + 1);
    }

    #[test]
    fn test_space_toggles_context_menu() {
        let mut doc = ProfileDocument::default();
        doc.cards.push(card("c1", "/pics/c1", 0));
        let mut app = app_with(doc, StaticImages::default().with_folder("/pics/c1", 2, 10, 10));
        app.open_card("c1").unwrap();
        press(&mut app, "space");
        assert!(app.context_menu_open());
        app.close_context_menu();
        assert!(!app.context_menu_open());
    }

    #[test]
    fn test_context_menu_copies_current_image_path() {
        let mut doc = ProfileDocument::default();
        doc.cards.push(card("c1", "/pics/c1", 0));
        let clipboard = RecordingClipboard::default();
        let mut app = app_with(doc, StaticImages::default().with_folder("/pics/c1", 3, 10, 10))
            .with_clipboard(clipboard.clone());
        app.open_card("c1").unwrap();
        press(&mut app, "right");

        press(&mut app, "space");
        assert!(press(&mut app, "p"));
        assert!(!app.context_menu_open());
        let expected = app.navigator().current_image().unwrap().path.to_string_lossy().to_string();
        assert_eq!(clipboard.copied.borrow().as_slice(), &[Copied::Text(expected.clone())]);
        assert!(expected.ends_with("img_001.jpg"));

        // Without the menu open the same key is not a copy
        assert!(!press(&mut app, "p"));
        assert_eq!(clipboard.copied.borrow().len(), 1);
    }

    #[test]
    fn test_context_menu_image_copy_failure_closes_menu() {
        let mut doc = ProfileDocument::default();
        doc.cards.push(card("c1", "/pics/c1", 0));
        let clipboard = RecordingClipboard::default();
        let mut app = app_with(doc, StaticImages::default().with_folder("/pics/c1", 2, 10, 10))
            .with_clipboard(clipboard.clone());
        app.open_card("c1").unwrap();

        press(&mut app, "space");
        // The listed image is not on disk, so decoding fails
        assert!(press(&mut app, "c"));
        assert!(!app.context_menu_open());
        assert!(clipboard.copied.borrow().is_empty());
        assert!(app.copy_current_image().is_err());
    }

    #[test]
    fn test_other_keys_close_menu_and_still_act() {
        let mut doc = ProfileDocument::default();
        doc.cards.push(card("c1", "/pics/c1", 0));
        let mut app = app_with(doc, StaticImages::default().with_folder("/pics/c1", 3, 10, 10));
        app.open_card("c1").unwrap();

        press(&mut app, "space");
        assert!(press(&mut app, "right"));
        assert!(!app.context_menu_open());
        assert_eq!(app.navigator().current_index(), 1);

        press(&mut app, "space");
        assert!(press(&mut app, "escape"));
        assert_eq!(app.page(), Page::Viewer);
    }

    #[test]
    fn test_copy_without_image_fails() {
        let mut app = app_with(ProfileDocument::default(), StaticImages::default())
            .with_clipboard(RecordingClipboard::default());
        assert!(app.copy_current_path().is_err());
    }

    #[test]
    fn test_open_profile_with_dialog_restores() {
        let mut other = ProfileDocument::default();
        other.cards.push(card("o1", "/pics/o1", 0));
        other.app_state.last_page = Page::Viewer;
        other.app_state.last_card_id = Some("o1".into());
        let persistence = MemoryPersistence::with_document(PATH, ProfileDocument::default());
        persistence
            .documents
            .borrow_mut()
            .insert(PathBuf::from("/profiles/other.ivprofile"), other);
        let store = ProfileStore::new(persistence);
        let images = StaticImages::default().with_folder("/pics/o1", 2, 10, 10);
        let mut app = App::new(store, images, HeadlessWindow::default());
        app.open_profile(Path::new(PATH)).unwrap();

        assert!(!app.open_profile_with_dialog(&mut ScriptedDialogs::default()).unwrap());
        assert_eq!(app.store().current_path(), Some(Path::new(PATH)));

        let mut dialogs = ScriptedDialogs::answering(&["/profiles/other.ivprofile"]);
        assert!(app.open_profile_with_dialog(&mut dialogs).unwrap());
        assert_eq!(app.page(), Page::Viewer);
        assert_eq!(app.navigator().card_id(), Some("o1"));
    }

    #[test]
    fn test_create_profile_with_dialog_leaves_viewer() {
        let mut doc = ProfileDocument::default();
        doc.cards.push(card("c1", "/pics/c1", 0));
        let mut app = app_with(doc, StaticImages::default().with_folder("/pics/c1", 2, 10, 10));
        app.open_card("c1").unwrap();

        let mut dialogs = ScriptedDialogs::answering(&["/profiles/fresh"]);
        assert!(app.create_profile_with_dialog(&mut dialogs).unwrap());
        assert_eq!(app.page(), Page::Index);
        assert!(app.store().cards().is_empty());
        assert_eq!(
            app.store().current_path(),
            Some(Path::new("/profiles/fresh.ivprofile"))
        );
    }

    #[test]
    fn test_save_as_with_dialog_includes_session() {
        let mut doc = ProfileDocument::default();
        doc.cards.push(card("c1", "/pics/c1", 0));
        let mut app = app_with(doc, StaticImages::default().with_folder("/pics/c1", 4, 10, 10));
        app.open_card("c1").unwrap();
        press(&mut app, "right");

        let mut dialogs = ScriptedDialogs::answering(&["/profiles/copy.ivprofile"]);
        assert!(app.save_profile_as_with_dialog(&mut dialogs).unwrap());
        let saved = app
            .store()
            .persistence()
            .document("/profiles/copy.ivprofile")
            .unwrap();
        assert_eq!(saved.app_state.last_page, Page::Viewer);
        assert_eq!(saved.app_state.last_image_index, 1);
    }

    #[test]
    fn test_choose_thumbnail_for_selected_card() {
        let mut doc = ProfileDocument::default();
        doc.cards.push(card("c1", "/pics/c1", 0));
        let mut app = app_with(doc, StaticImages::default());

        let mut dialogs = ScriptedDialogs::answering(&["/pics/c1/cover.jpg"]);
        assert!(!app.choose_thumbnail_with_dialog(&mut dialogs).unwrap());

        press(&mut app, "down");
        assert!(app.choose_thumbnail_with_dialog(&mut dialogs).unwrap());
        let card = app.store().card("c1").unwrap();
        assert_eq!(card.thumbnail.as_deref(), Some("/pics/c1/cover.jpg"));
    }

    #[test]
    fn test_unmapped_keys_are_ignored() {
        let mut app = app_with(ProfileDocument::default(), StaticImages::default());
        assert!(!press(&mut app, "x"));
    }

    #[test]
    fn test_open_last_profile_skips_missing() {
        let persistence = MemoryPersistence::with_document(PATH, ProfileDocument::default());
        {
            let mut config = persistence.app_config.borrow_mut();
            config.add_recent("/gone.ivprofile");
            config.add_recent(PATH);
            config.add_recent("/also-gone.ivprofile");
        }
        let store = ProfileStore::new(persistence);
        let mut app = App::new(store, StaticImages::default(), HeadlessWindow::default());
        assert_eq!(app.open_last_profile(), Some(PathBuf::from(PATH)));
        assert_eq!(app.store().current_path(), Some(Path::new(PATH)));
    }
}
