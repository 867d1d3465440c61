//! Bulk image export: drain a resource kind to exhaustion, fetch every
//! image it references, and pack them into one zip archive.
//!
//! The drain runs its own page cursor and never reads or writes the
//! tab pagination state, so a running export cannot race the normal
//! scroll-driven fetches.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use zip::write::FileOptions;

use crate::action::{Action, ExportPhase};
use crate::catalog::Catalog;
use crate::error::{CromulentError, Result};

/// Kinds offered for bulk image export. Episodes are deliberately not
/// represented here; only characters and locations ship image sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Characters,
    Locations,
}

impl ExportKind {
    pub fn archive_name(self) -> &'static str {
        match self {
            ExportKind::Characters => "simpsons_personnages.zip",
            ExportKind::Locations => "simpsons_lieux.zip",
        }
    }

    /// Subfolder the images live under inside the archive.
    pub fn folder(self) -> &'static str {
        match self {
            ExportKind::Characters => "personnages",
            ExportKind::Locations => "lieux",
        }
    }
}

/// One drained item that carries an image reference.
#[derive(Debug, Clone)]
struct ImageRef {
    name: String,
    path: String,
}

#[derive(Debug)]
struct Drained {
    /// Items seen across all pages, with or without an image.
    total: usize,
    images: Vec<ImageRef>,
}

#[derive(Debug)]
struct Outcome {
    packed: usize,
    archive: PathBuf,
}

/// Run one full export, reporting progress through the action channel.
pub async fn run(
    catalog: Arc<dyn Catalog>,
    kind: ExportKind,
    out_dir: PathBuf,
    tx: mpsc::UnboundedSender<Action>,
) {
    tx.send(Action::ExportProgress(ExportPhase::FetchingData)).ok();

    match export_archive(catalog.as_ref(), kind, &out_dir, &tx).await {
        Ok(outcome) => {
            tracing::info!(archive = %outcome.archive.display(), packed = outcome.packed, "export finished");
            tx.send(Action::ExportDone {
                packed: outcome.packed,
                archive: outcome.archive,
            })
            .ok();
        }
        Err(err) => {
            tracing::warn!(%err, "export failed");
            tx.send(Action::ExportFailed(err.to_string())).ok();
        }
    }
}

async fn export_archive(
    catalog: &dyn Catalog,
    kind: ExportKind,
    out_dir: &Path,
    tx: &mpsc::UnboundedSender<Action>,
) -> Result<Outcome> {
    let drained = drain_all(catalog, kind).await;
    if drained.total == 0 {
        return Err(CromulentError::Export("no data to download".to_string()));
    }
    if drained.images.is_empty() {
        return Err(CromulentError::Export("no images to download".to_string()));
    }

    let total = drained.images.len();
    tx.send(Action::ExportProgress(ExportPhase::Downloading { done: 0, total }))
        .ok();

    // Images are fetched one at a time; a failed image is skipped, it
    // counts toward "attempted" but not "packed".
    let mut entries: Vec<(String, Vec<u8>)> = Vec::with_capacity(total);
    for image in &drained.images {
        match catalog.image(&image.path).await {
            Ok(bytes) => {
                entries.push((entry_name(kind, image), bytes));
                tx.send(Action::ExportProgress(ExportPhase::Downloading {
                    done: entries.len(),
                    total,
                }))
                .ok();
            }
            Err(err) => {
                tracing::warn!(name = %image.name, %err, "image fetch failed, skipping");
            }
        }
    }

    if entries.is_empty() {
        return Err(CromulentError::Export(
            "every image download failed".to_string(),
        ));
    }

    tx.send(Action::ExportProgress(ExportPhase::Packaging)).ok();

    let archive = out_dir.join(kind.archive_name());
    write_archive(&archive, &entries)?;

    Ok(Outcome {
        packed: entries.len(),
        archive,
    })
}

/// Drain every page of `kind` with a cursor independent of the tab
/// state. A failed page request ends the drain the same way an empty
/// page does: whatever was collected up to that point is kept.
async fn drain_all(catalog: &dyn Catalog, kind: ExportKind) -> Drained {
    let mut drained = Drained {
        total: 0,
        images: Vec::new(),
    };
    let mut page = 1u32;

    loop {
        let batch = match fetch_refs(catalog, kind, page).await {
            Ok(batch) => batch,
            Err(err) => {
                tracing::warn!(page, %err, "page fetch failed, ending drain early");
                break;
            }
        };
        if batch.is_empty() {
            break;
        }

        drained.total += batch.len();
        drained
            .images
            .extend(batch.into_iter().filter_map(|(name, path)| {
                path.filter(|p| !p.is_empty()).map(|path| ImageRef { name, path })
            }));
        page += 1;
    }

    drained
}

/// One page of `kind`, reduced to (display name, image path) pairs.
async fn fetch_refs(
    catalog: &dyn Catalog,
    kind: ExportKind,
    page: u32,
) -> Result<Vec<(String, Option<String>)>> {
    match kind {
        ExportKind::Characters => Ok(catalog
            .characters(page)
            .await?
            .into_iter()
            .map(|c| (c.name, c.portrait_path))
            .collect()),
        ExportKind::Locations => Ok(catalog
            .locations(page)
            .await?
            .into_iter()
            .map(|l| (l.name, l.image_path))
            .collect()),
    }
}

fn entry_name(kind: ExportKind, image: &ImageRef) -> String {
    format!(
        "{}/{}.{}",
        kind.folder(),
        sanitize_filename(&image.name),
        extension(&image.path)
    )
}

/// Extension of the image path: the segment after the last dot, or
/// "img" when the path carries none.
fn extension(path: &str) -> &str {
    match path.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && !ext.contains('/') => ext,
        _ => "img",
    }
}

fn write_archive(path: &Path, entries: &[(String, Vec<u8>)]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = zip::ZipWriter::new(file);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (name, bytes) in entries {
        writer.start_file(name.clone(), options)?;
        writer.write_all(bytes)?;
    }

    writer.finish()?;
    Ok(())
}

/// Make a display name safe for use as an archive entry name.
///
/// Leading and trailing whitespace is trimmed, whitespace and the
/// characters `< > : " / \ | ? *` become underscores, and underscore
/// runs collapse to one. A name with nothing left after cleanup
/// becomes a single underscore. Two names may sanitize to the same
/// entry; the later one wins inside the archive.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_underscore = false;

    for ch in name.trim().chars() {
        let mapped = if ch.is_whitespace()
            || matches!(ch, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*')
        {
            '_'
        } else {
            ch
        };

        if mapped == '_' {
            if !last_underscore {
                out.push('_');
            }
            last_underscore = true;
        } else {
            out.push(mapped);
            last_underscore = false;
        }
    }

    let cleaned = out.trim_matches('_');
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::types::{Character, Episode, Location};

    /// What one scripted page request should produce.
    enum PageScript {
        Items(Vec<Character>),
        Fail,
    }

    /// Catalog double serving scripted character pages. Pages past the
    /// end of the script come back empty, signalling exhaustion.
    struct ScriptedCatalog {
        pages: Vec<PageScript>,
        fail_images: bool,
        page_requests: AtomicUsize,
    }

    impl ScriptedCatalog {
        fn new(pages: Vec<PageScript>) -> Self {
            Self {
                pages,
                fail_images: false,
                page_requests: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Catalog for ScriptedCatalog {
        async fn characters(&self, page: u32) -> crate::error::Result<Vec<Character>> {
            self.page_requests.fetch_add(1, Ordering::SeqCst);
            match self.pages.get((page - 1) as usize) {
                Some(PageScript::Items(items)) => Ok(items.clone()),
                Some(PageScript::Fail) => {
                    Err(CromulentError::Api("scripted page failure".to_string()))
                }
                None => Ok(Vec::new()),
            }
        }

        async fn episodes(&self, _page: u32) -> crate::error::Result<Vec<Episode>> {
            Ok(Vec::new())
        }

        async fn locations(&self, _page: u32) -> crate::error::Result<Vec<Location>> {
            Ok(Vec::new())
        }

        async fn image(&self, path: &str) -> crate::error::Result<Vec<u8>> {
            if self.fail_images {
                Err(CromulentError::Api("scripted image failure".to_string()))
            } else {
                Ok(path.as_bytes().to_vec())
            }
        }

        fn image_url(&self, path: &str) -> String {
            format!("cdn/500{path}")
        }
    }

    fn character(name: &str, portrait: Option<&str>) -> Character {
        Character {
            name: name.to_string(),
            portrait_path: portrait.map(str::to_string),
            status: None,
            age: None,
            occupation: None,
            gender: None,
            phrases: Vec::new(),
        }
    }

    // Progress sends are fire-and-forget, so a closed receiver is fine here.
    fn channel() -> mpsc::UnboundedSender<Action> {
        mpsc::unbounded_channel().0
    }

    #[tokio::test]
    async fn archive_contains_only_items_with_images() {
        let catalog = ScriptedCatalog::new(vec![PageScript::Items(vec![
            character("Bart Simpson", Some("/character/5.webp")),
            character("Troy McClure", None),
            character("Lionel Hutz", Some("/character/8.png")),
        ])]);
        let dir = tempfile::tempdir().unwrap();

        let outcome = export_archive(&catalog, ExportKind::Characters, dir.path(), &channel())
            .await
            .unwrap();
        assert_eq!(outcome.packed, 2);

        let file = std::fs::File::open(dir.path().join("simpsons_personnages.zip")).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        assert_eq!(archive.len(), 2);
        assert!(archive.by_name("personnages/Bart_Simpson.webp").is_ok());
        assert!(archive.by_name("personnages/Lionel_Hutz.png").is_ok());
    }

    #[tokio::test]
    async fn all_image_failures_produce_no_archive() {
        let mut catalog = ScriptedCatalog::new(vec![PageScript::Items(vec![
            character("Homer", Some("/character/1.webp")),
            character("Marge", Some("/character/2.webp")),
        ])]);
        catalog.fail_images = true;
        let dir = tempfile::tempdir().unwrap();

        let result = export_archive(&catalog, ExportKind::Characters, dir.path(), &channel()).await;
        assert!(matches!(result, Err(CromulentError::Export(_))));
        assert!(!dir.path().join("simpsons_personnages.zip").exists());
    }

    #[tokio::test]
    async fn empty_dataset_fails_before_any_image_fetch() {
        let catalog = ScriptedCatalog::new(Vec::new());
        let dir = tempfile::tempdir().unwrap();

        let result = export_archive(&catalog, ExportKind::Characters, dir.path(), &channel()).await;
        assert!(matches!(result, Err(CromulentError::Export(_))));
    }

    #[tokio::test]
    async fn drain_stops_at_the_first_empty_page() {
        let catalog = ScriptedCatalog::new(vec![
            PageScript::Items(vec![character("Homer", Some("/c/1.webp"))]),
            PageScript::Items(vec![character("Marge", Some("/c/2.webp"))]),
        ]);

        let drained = drain_all(&catalog, ExportKind::Characters).await;
        assert_eq!(drained.total, 2);
        assert_eq!(drained.images.len(), 2);
        // Two item pages plus the empty page that ends the drain.
        assert_eq!(catalog.page_requests.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn page_failure_mid_drain_keeps_earlier_items() {
        let catalog = ScriptedCatalog::new(vec![
            PageScript::Items(vec![
                character("Homer", Some("/c/1.webp")),
                character("Marge", Some("/c/2.webp")),
            ]),
            PageScript::Fail,
        ]);

        let drained = drain_all(&catalog, ExportKind::Characters).await;
        assert_eq!(drained.total, 2);
        assert_eq!(drained.images.len(), 2);
        assert_eq!(catalog.page_requests.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn sanitize_spec_examples() {
        assert_eq!(sanitize_filename("Bart Simpson / "), "Bart_Simpson");
        assert_eq!(sanitize_filename("Kwik-E-Mart??"), "Kwik-E-Mart");
        assert_eq!(sanitize_filename("???"), "_");
    }

    #[test]
    fn sanitize_collapses_runs() {
        assert_eq!(sanitize_filename("Itchy   &   Scratchy"), "Itchy_&_Scratchy");
        assert_eq!(sanitize_filename(r#"a<b>c:d"e/f\g|h?i*j"#), "a_b_c_d_e_f_g_h_i_j");
        assert_eq!(sanitize_filename("  Moe's Tavern  "), "Moe's_Tavern");
    }

    #[test]
    fn extension_handles_odd_paths() {
        assert_eq!(extension("/character/1.webp"), "webp");
        assert_eq!(extension("/location/moe.tavern.png"), "png");
        assert_eq!(extension("/character/noext"), "img");
        assert_eq!(extension("/char.acter/noext"), "img");
    }

    #[test]
    fn entry_names_carry_folder_and_extension() {
        let image = ImageRef {
            name: "Bart Simpson".to_string(),
            path: "/character/5.webp".to_string(),
        };
        assert_eq!(
            entry_name(ExportKind::Characters, &image),
            "personnages/Bart_Simpson.webp"
        );
        assert_eq!(
            entry_name(ExportKind::Locations, &image),
            "lieux/Bart_Simpson.webp"
        );
    }
}
