use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use crate::action::{Action, ExportPhase};
use crate::catalog::Catalog;
use crate::event::Event;
use crate::export::{self, ExportKind};
use crate::state::PageState;
use crate::types::{Character, Episode, Location, ResourceKind};

/// Cards left below the selection before the next page is requested.
/// This is the terminal counterpart of a near-bottom scroll threshold.
const LOAD_AHEAD: usize = 5;

/// Selection step for Ctrl+d / Ctrl+u.
const PAGE_STEP: usize = 10;

/// How long the "export finished" status stays in the status bar.
const EXPORT_DONE_TTL: Duration = Duration::from_secs(3);

/// What the export subsystem is doing, for the status bar.
#[derive(Debug, Clone, Default)]
pub enum ExportStatus {
    #[default]
    Idle,
    Running(ExportPhase),
    Done { packed: usize, archive: PathBuf },
    Failed(String),
}

pub struct App {
    pub tab: ResourceKind,

    // Per-kind pagination state
    pub characters: PageState<Character>,
    pub episodes: PageState<Episode>,
    pub locations: PageState<Location>,

    // Per-kind cursor into the card list; survives tab switches
    pub character_index: usize,
    pub episode_index: usize,
    pub location_index: usize,

    pub export: ExportStatus,
    pub notice: Option<String>,
    pub ticks: u64,
    pub should_quit: bool,

    catalog: Arc<dyn Catalog>,
    export_dir: PathBuf,
    action_tx: mpsc::UnboundedSender<Action>,
}

impl App {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        export_dir: PathBuf,
        start_tab: ResourceKind,
        action_tx: mpsc::UnboundedSender<Action>,
    ) -> Self {
        Self {
            tab: start_tab,

            characters: PageState::default(),
            episodes: PageState::default(),
            locations: PageState::default(),

            character_index: 0,
            episode_index: 0,
            location_index: 0,

            export: ExportStatus::default(),
            notice: None,
            ticks: 0,
            should_quit: false,

            catalog,
            export_dir,
            action_tx,
        }
    }

    pub fn handle_event(&self, event: Event) -> Action {
        match event {
            Event::Init => Action::SwitchTab(self.tab),
            Event::Tick => Action::Tick,
            Event::Key(key) => self.handle_key(key),
            Event::Render => Action::None,
        }
    }

    fn handle_key(&self, key: KeyEvent) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => Action::Quit,
                KeyCode::Char('d') => Action::PageDown,
                KeyCode::Char('u') => Action::PageUp,
                _ => Action::None,
            };
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
            KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,
            KeyCode::Char('g') => Action::GoToTop,
            KeyCode::Char('G') => Action::GoToBottom,
            KeyCode::Char('1') => Action::SwitchTab(ResourceKind::Characters),
            KeyCode::Char('2') => Action::SwitchTab(ResourceKind::Episodes),
            KeyCode::Char('3') => Action::SwitchTab(ResourceKind::Locations),
            KeyCode::Tab => Action::NextTab,
            KeyCode::BackTab => Action::PrevTab,
            KeyCode::Char('d') => match self.tab {
                ResourceKind::Characters => Action::Export(ExportKind::Characters),
                ResourceKind::Locations => Action::Export(ExportKind::Locations),
                // Episodes ship no image archive.
                ResourceKind::Episodes => Action::None,
            },
            KeyCode::Char('o') => Action::OpenImage,
            KeyCode::Char('y') => Action::YankImageUrl,
            _ => Action::None,
        }
    }

    pub fn update(&mut self, action: Action) {
        // User input clears transient feedback; background actions
        // (ticks, fetch results, export progress) must not.
        if is_user_input(&action) {
            self.notice = None;
            if matches!(self.export, ExportStatus::Failed(_)) {
                self.export = ExportStatus::Idle;
            }
        }

        match action {
            Action::Quit => self.should_quit = true,
            Action::Tick => self.ticks = self.ticks.wrapping_add(1),

            Action::ScrollUp => self.move_selection(-1),
            Action::ScrollDown => self.move_selection(1),
            Action::PageUp => self.move_selection(-(PAGE_STEP as isize)),
            Action::PageDown => self.move_selection(PAGE_STEP as isize),
            Action::GoToTop => *self.selected_mut() = 0,
            Action::GoToBottom => {
                let last = self.active_len().saturating_sub(1);
                *self.selected_mut() = last;
                self.maybe_fetch_more();
            }

            Action::SwitchTab(kind) => {
                self.tab = kind;
                // First visit loads page one; revisits just re-project
                // the accumulated list, so cards never duplicate.
                if self.kind_is_empty(kind) {
                    self.trigger_fetch(kind);
                }
            }
            Action::NextTab => self.update(Action::SwitchTab(self.tab.next())),
            Action::PrevTab => self.update(Action::SwitchTab(self.tab.prev())),

            Action::CharactersLoaded(items) => self.characters.finish_page(items),
            Action::EpisodesLoaded(items) => self.episodes.finish_page(items),
            Action::LocationsLoaded(items) => self.locations.finish_page(items),
            Action::PageFailed(kind, message) => {
                tracing::warn!(%kind, %message, "page fetch failed");
                match kind {
                    ResourceKind::Characters => self.characters.finish_error(message),
                    ResourceKind::Episodes => self.episodes.finish_error(message),
                    ResourceKind::Locations => self.locations.finish_error(message),
                }
            }

            Action::Export(kind) => self.start_export(kind),
            Action::ExportProgress(phase) => self.export = ExportStatus::Running(phase),
            Action::ExportDone { packed, archive } => {
                self.export = ExportStatus::Done { packed, archive };
                let tx = self.action_tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(EXPORT_DONE_TTL).await;
                    tx.send(Action::ClearExportStatus).ok();
                });
            }
            Action::ExportFailed(message) => self.export = ExportStatus::Failed(message),
            Action::ClearExportStatus => {
                if matches!(self.export, ExportStatus::Done { .. }) {
                    self.export = ExportStatus::Idle;
                }
            }

            Action::OpenImage => {
                if let Some(url) = self.selected_image_url() {
                    if let Err(err) = open::that(&url) {
                        self.notice = Some(format!("could not open {url}: {err}"));
                    }
                }
            }
            Action::YankImageUrl => {
                if let Some(url) = self.selected_image_url() {
                    match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(url.clone())) {
                        Ok(()) => self.notice = Some(format!("copied {url}")),
                        Err(err) => self.notice = Some(format!("clipboard error: {err}")),
                    }
                }
            }

            Action::None => {}
        }
    }

    /// CDN URL of the selected card's image, when it has one.
    pub fn selected_image_url(&self) -> Option<String> {
        let path = match self.tab {
            ResourceKind::Characters => self
                .characters
                .items()
                .get(self.character_index)?
                .portrait_path
                .as_deref(),
            ResourceKind::Episodes => self
                .episodes
                .items()
                .get(self.episode_index)?
                .image_path
                .as_deref(),
            ResourceKind::Locations => self
                .locations
                .items()
                .get(self.location_index)?
                .image_path
                .as_deref(),
        }?;
        Some(self.catalog.image_url(path))
    }

    pub fn active_len(&self) -> usize {
        match self.tab {
            ResourceKind::Characters => self.characters.len(),
            ResourceKind::Episodes => self.episodes.len(),
            ResourceKind::Locations => self.locations.len(),
        }
    }

    pub fn active_loading(&self) -> bool {
        match self.tab {
            ResourceKind::Characters => self.characters.is_loading(),
            ResourceKind::Episodes => self.episodes.is_loading(),
            ResourceKind::Locations => self.locations.is_loading(),
        }
    }

    pub fn active_error(&self) -> Option<&str> {
        match self.tab {
            ResourceKind::Characters => self.characters.error(),
            ResourceKind::Episodes => self.episodes.error(),
            ResourceKind::Locations => self.locations.error(),
        }
    }

    fn selected_mut(&mut self) -> &mut usize {
        match self.tab {
            ResourceKind::Characters => &mut self.character_index,
            ResourceKind::Episodes => &mut self.episode_index,
            ResourceKind::Locations => &mut self.location_index,
        }
    }

    fn kind_is_empty(&self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::Characters => self.characters.is_empty(),
            ResourceKind::Episodes => self.episodes.is_empty(),
            ResourceKind::Locations => self.locations.is_empty(),
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.active_len();
        let selected = self.selected_mut();
        let new = selected.saturating_add_signed(delta);
        *selected = if len == 0 { 0 } else { new.min(len - 1) };
        self.maybe_fetch_more();
    }

    /// Load-more trigger: every selection movement near the end of the
    /// active list requests the next page. Redundant triggers are
    /// absorbed by the in-flight guard.
    fn maybe_fetch_more(&mut self) {
        let near_end = match self.tab {
            ResourceKind::Characters => self.characters.near_end(self.character_index, LOAD_AHEAD),
            ResourceKind::Episodes => self.episodes.near_end(self.episode_index, LOAD_AHEAD),
            ResourceKind::Locations => self.locations.near_end(self.location_index, LOAD_AHEAD),
        };
        if near_end {
            self.trigger_fetch(self.tab);
        }
    }

    fn trigger_fetch(&mut self, kind: ResourceKind) {
        let tx = self.action_tx.clone();
        let catalog = Arc::clone(&self.catalog);

        match kind {
            ResourceKind::Characters => {
                let Some(page) = self.characters.begin_fetch() else {
                    return;
                };
                tokio::spawn(async move {
                    match catalog.characters(page).await {
                        Ok(items) => tx.send(Action::CharactersLoaded(items)).ok(),
                        Err(e) => tx
                            .send(Action::PageFailed(ResourceKind::Characters, e.to_string()))
                            .ok(),
                    };
                });
            }
            ResourceKind::Episodes => {
                let Some(page) = self.episodes.begin_fetch() else {
                    return;
                };
                tokio::spawn(async move {
                    match catalog.episodes(page).await {
                        Ok(items) => tx.send(Action::EpisodesLoaded(items)).ok(),
                        Err(e) => tx
                            .send(Action::PageFailed(ResourceKind::Episodes, e.to_string()))
                            .ok(),
                    };
                });
            }
            ResourceKind::Locations => {
                let Some(page) = self.locations.begin_fetch() else {
                    return;
                };
                tokio::spawn(async move {
                    match catalog.locations(page).await {
                        Ok(items) => tx.send(Action::LocationsLoaded(items)).ok(),
                        Err(e) => tx
                            .send(Action::PageFailed(ResourceKind::Locations, e.to_string()))
                            .ok(),
                    };
                });
            }
        }
    }

    fn start_export(&mut self, kind: ExportKind) {
        // One export at a time; the key is ignored while one runs.
        if matches!(self.export, ExportStatus::Running(_)) {
            return;
        }
        self.export = ExportStatus::Running(ExportPhase::FetchingData);

        let catalog = Arc::clone(&self.catalog);
        let tx = self.action_tx.clone();
        let out_dir = self.export_dir.clone();
        tokio::spawn(export::run(catalog, kind, out_dir, tx));
    }
}

fn is_user_input(action: &Action) -> bool {
    matches!(
        action,
        Action::ScrollUp
            | Action::ScrollDown
            | Action::PageUp
            | Action::PageDown
            | Action::GoToTop
            | Action::GoToBottom
            | Action::SwitchTab(_)
            | Action::NextTab
            | Action::PrevTab
            | Action::Export(_)
            | Action::OpenImage
            | Action::YankImageUrl
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::timeout;

    use crate::error::{CromulentError, Result};

    /// Catalog double serving fixed-size character pages until a given
    /// total is reached, counting every page request.
    struct CountingCatalog {
        total_characters: usize,
        page_size: usize,
        requests: AtomicUsize,
    }

    impl CountingCatalog {
        fn new(total_characters: usize, page_size: usize) -> Self {
            Self {
                total_characters,
                page_size,
                requests: AtomicUsize::new(0),
            }
        }

        fn requests(&self) -> usize {
            self.requests.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Catalog for CountingCatalog {
        async fn characters(&self, page: u32) -> Result<Vec<Character>> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            let start = (page as usize - 1) * self.page_size;
            let end = (start + self.page_size).min(self.total_characters);
            Ok((start..end)
                .map(|i| Character {
                    name: format!("character {i}"),
                    portrait_path: Some(format!("/character/{i}.webp")),
                    status: None,
                    age: None,
                    occupation: None,
                    gender: None,
                    phrases: Vec::new(),
                })
                .collect())
        }

        async fn episodes(&self, _page: u32) -> Result<Vec<Episode>> {
            Ok(Vec::new())
        }

        async fn locations(&self, _page: u32) -> Result<Vec<Location>> {
            Err(CromulentError::Api("locations are down".to_string()))
        }

        async fn image(&self, _path: &str) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }

        fn image_url(&self, path: &str) -> String {
            format!("cdn/500{path}")
        }
    }

    async fn pump(app: &mut App, rx: &mut mpsc::UnboundedReceiver<Action>) {
        let action = timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for an action")
            .expect("action channel closed");
        app.update(action);
    }

    fn app_with(catalog: Arc<dyn Catalog>) -> (App, mpsc::UnboundedReceiver<Action>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = App::new(catalog, PathBuf::from("."), ResourceKind::Characters, tx);
        (app, rx)
    }

    #[tokio::test]
    async fn first_tab_visit_loads_one_page() {
        let catalog = Arc::new(CountingCatalog::new(20, 8));
        let (mut app, mut rx) = app_with(catalog.clone());

        app.update(Action::SwitchTab(ResourceKind::Characters));
        pump(&mut app, &mut rx).await;

        assert_eq!(app.characters.len(), 8);
        assert_eq!(catalog.requests(), 1);
    }

    #[tokio::test]
    async fn scroll_while_fetching_issues_no_second_request() {
        let catalog = Arc::new(CountingCatalog::new(20, 8));
        let (mut app, mut rx) = app_with(catalog.clone());

        app.update(Action::SwitchTab(ResourceKind::Characters));
        // The first page is still in flight; this scroll lands inside
        // the load-ahead window but must be absorbed by the guard.
        app.update(Action::ScrollDown);
        pump(&mut app, &mut rx).await;

        assert_eq!(catalog.requests(), 1);
        assert_eq!(app.characters.len(), 8);
    }

    #[tokio::test]
    async fn reaching_the_bottom_requests_the_next_page() {
        let catalog = Arc::new(CountingCatalog::new(20, 8));
        let (mut app, mut rx) = app_with(catalog.clone());

        app.update(Action::SwitchTab(ResourceKind::Characters));
        pump(&mut app, &mut rx).await;

        app.update(Action::GoToBottom);
        pump(&mut app, &mut rx).await;

        assert_eq!(catalog.requests(), 2);
        assert_eq!(app.characters.len(), 16);
    }

    #[tokio::test]
    async fn exhausted_kind_ignores_further_scrolling() {
        let catalog = Arc::new(CountingCatalog::new(4, 8));
        let (mut app, mut rx) = app_with(catalog.clone());

        app.update(Action::SwitchTab(ResourceKind::Characters));
        pump(&mut app, &mut rx).await;
        // Page two comes back empty and exhausts the kind.
        app.update(Action::GoToBottom);
        pump(&mut app, &mut rx).await;
        assert!(app.characters.is_exhausted());

        let before = catalog.requests();
        app.update(Action::ScrollDown);
        app.update(Action::GoToBottom);
        assert_eq!(catalog.requests(), before);
    }

    #[tokio::test]
    async fn tab_switches_never_duplicate_cards() {
        let catalog = Arc::new(CountingCatalog::new(20, 8));
        let (mut app, mut rx) = app_with(catalog.clone());

        app.update(Action::SwitchTab(ResourceKind::Characters));
        pump(&mut app, &mut rx).await;
        let loaded = app.characters.len();

        app.update(Action::SwitchTab(ResourceKind::Episodes));
        pump(&mut app, &mut rx).await; // episodes page one (empty)
        app.update(Action::SwitchTab(ResourceKind::Characters));
        app.update(Action::SwitchTab(ResourceKind::Episodes));
        app.update(Action::SwitchTab(ResourceKind::Characters));

        assert_eq!(app.characters.len(), loaded);
        // Characters were fetched exactly once across all the switches.
        assert_eq!(catalog.requests(), 1);
    }

    #[tokio::test]
    async fn failed_page_surfaces_an_error_and_keeps_the_cursor() {
        let catalog = Arc::new(CountingCatalog::new(0, 8));
        let (mut app, mut rx) = app_with(catalog);

        app.update(Action::SwitchTab(ResourceKind::Locations));
        pump(&mut app, &mut rx).await;

        assert_eq!(app.tab, ResourceKind::Locations);
        assert!(app.locations.error().is_some());
        assert!(!app.locations.is_exhausted());
        // The kind stays retryable: another switch away and back
        // re-triggers the same page.
        app.update(Action::SwitchTab(ResourceKind::Locations));
        pump(&mut app, &mut rx).await;
        assert!(app.locations.error().is_some());
    }

    #[tokio::test]
    async fn export_key_is_ignored_while_an_export_runs() {
        let catalog = Arc::new(CountingCatalog::new(4, 8));
        let (mut app, _rx) = app_with(catalog);

        app.export = ExportStatus::Running(ExportPhase::Packaging);
        app.update(Action::Export(ExportKind::Characters));

        // Still in the phase set before; the second request did not
        // restart the pipeline.
        assert!(matches!(
            app.export,
            ExportStatus::Running(ExportPhase::Packaging)
        ));
    }

    #[tokio::test]
    async fn selected_image_url_tracks_the_selection() {
        let catalog = Arc::new(CountingCatalog::new(8, 8));
        let (mut app, mut rx) = app_with(catalog);

        app.update(Action::SwitchTab(ResourceKind::Characters));
        pump(&mut app, &mut rx).await;

        assert_eq!(
            app.selected_image_url().as_deref(),
            Some("cdn/500/character/0.webp")
        );
        app.update(Action::ScrollDown);
        assert_eq!(
            app.selected_image_url().as_deref(),
            Some("cdn/500/character/1.webp")
        );
    }
}
