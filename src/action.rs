use std::path::PathBuf;

use crate::export::ExportKind;
use crate::types::{Character, Episode, Location, ResourceKind};

/// Stage a running export is in, as shown in the status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPhase {
    FetchingData,
    Downloading { done: usize, total: usize },
    Packaging,
}

#[derive(Debug, Clone)]
pub enum Action {
    Quit,
    Tick,

    // Selection movement within the active tab
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    GoToTop,
    GoToBottom,

    // Tabs
    SwitchTab(ResourceKind),
    NextTab,
    PrevTab,

    // Pagination: append one fetched page to a kind's accumulated list
    CharactersLoaded(Vec<Character>),
    EpisodesLoaded(Vec<Episode>),
    LocationsLoaded(Vec<Location>),
    PageFailed(ResourceKind, String),

    // Bulk image export
    Export(ExportKind),
    ExportProgress(ExportPhase),
    ExportDone { packed: usize, archive: PathBuf },
    ExportFailed(String),
    ClearExportStatus,

    // Selected-card operations
    OpenImage,
    YankImageUrl,

    None,
}
