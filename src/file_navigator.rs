// src/file_navigator.rs - Directory cursor and paging for the panel file list
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no such directory: {0}")]
    NoSuchDir(String),
}

/// One entry in a media directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Source of printable files. The firmware owns the physical card; this
/// trait is the read-only view the navigator pages over.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn is_present(&self) -> bool;
    async fn list_dir(&self, rel: &str) -> Result<Vec<MediaEntry>, MediaError>;
}

/// Media rooted in a host directory.
pub struct FsMediaStore {
    root: PathBuf,
}

impl FsMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl MediaStore for FsMediaStore {
    async fn is_present(&self) -> bool {
        tokio::fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    async fn list_dir(&self, rel: &str) -> Result<Vec<MediaEntry>, MediaError> {
        let dir = if rel.is_empty() {
            self.root.clone()
        } else {
            self.root.join(rel)
        };
        let mut reader = tokio::fs::read_dir(&dir).await?;
        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            entries.push(MediaEntry { name, is_dir });
        }
        Ok(entries)
    }
}

/// In-memory media, for tests and bench runs without a card. Keyed by
/// relative directory path ("" is the root).
#[derive(Default)]
pub struct MemoryMediaStore {
    pub present: bool,
    pub dirs: HashMap<String, Vec<MediaEntry>>,
}

impl MemoryMediaStore {
    pub fn new() -> Self {
        Self {
            present: true,
            dirs: HashMap::new(),
        }
    }

    pub fn absent() -> Self {
        Self {
            present: false,
            dirs: HashMap::new(),
        }
    }

    pub fn add_file(&mut self, dir: &str, name: &str) -> &mut Self {
        self.dirs.entry(dir.to_string()).or_default().push(MediaEntry {
            name: name.to_string(),
            is_dir: false,
        });
        self
    }

    pub fn add_dir(&mut self, dir: &str, name: &str) -> &mut Self {
        self.dirs.entry(dir.to_string()).or_default().push(MediaEntry {
            name: name.to_string(),
            is_dir: true,
        });
        self.dirs.entry(join_rel(dir, name)).or_default();
        self
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn is_present(&self) -> bool {
        self.present
    }

    async fn list_dir(&self, rel: &str) -> Result<Vec<MediaEntry>, MediaError> {
        self.dirs
            .get(rel)
            .cloned()
            .ok_or_else(|| MediaError::NoSuchDir(rel.to_string()))
    }
}

fn join_rel(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

fn is_gcode(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".gco") || lower.ends_with(".gcode")
}

/// Cursor over the media tree. The panel asks for pages of entries and
/// navigates with "up one level" / "enter folder" tokens; the cursor is the
/// only state kept between those requests.
pub struct FileNavigator<M> {
    media: M,
    folders: Vec<String>,
}

/// One listing row as sent to the panel: the selectable token line followed
/// by the display line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow {
    pub token: String,
    pub display: String,
}

impl<M: MediaStore> FileNavigator<M> {
    pub fn new(media: M) -> Self {
        Self {
            media,
            folders: Vec::new(),
        }
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    /// Back to the card root.
    pub fn reset(&mut self) {
        self.folders.clear();
    }

    pub fn up_dir(&mut self) {
        self.folders.pop();
    }

    pub fn change_dir(&mut self, name: &str) {
        self.folders.push(name.to_string());
    }

    pub fn current_dir(&self) -> String {
        self.folders.join("/")
    }

    pub async fn is_media_present(&self) -> bool {
        self.media.is_present().await
    }

    /// One page of the current directory: folders first, then G-code files,
    /// both alphabetical. Other file types are not shown to the panel.
    pub async fn page(&self, start: usize, count: usize) -> Vec<ListingRow> {
        let dir = self.current_dir();
        let mut entries = match self.media.list_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!("media listing failed for '{}': {}", dir, err);
                return Vec::new();
            }
        };
        entries.retain(|e| e.is_dir || is_gcode(&e.name));
        entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then(a.name.cmp(&b.name)));

        entries
            .into_iter()
            .skip(start)
            .take(count)
            .map(|entry| {
                if entry.is_dir {
                    ListingRow {
                        token: entry.name.clone(),
                        display: format!("{}/", entry.name),
                    }
                } else {
                    ListingRow {
                        token: format!("/{}", join_rel(&dir, &entry.name)),
                        display: entry.name,
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media() -> MemoryMediaStore {
        let mut media = MemoryMediaStore::new();
        media
            .add_file("", "benchy.gco")
            .add_file("", "zebra.gcode")
            .add_file("", "notes.txt")
            .add_dir("", "calibration")
            .add_file("calibration", "cube.gco");
        media
    }

    #[tokio::test]
    async fn page_lists_folders_first_and_filters_non_gcode() {
        let nav = FileNavigator::new(media());
        let rows = nav.page(0, 4).await;
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].token, "calibration");
        assert_eq!(rows[0].display, "calibration/");
        assert_eq!(rows[1].token, "/benchy.gco");
        assert_eq!(rows[1].display, "benchy.gco");
        assert_eq!(rows[2].token, "/zebra.gcode");
    }

    #[tokio::test]
    async fn paging_window_is_respected() {
        let nav = FileNavigator::new(media());
        let rows = nav.page(1, 1).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].token, "/benchy.gco");
        assert!(nav.page(10, 4).await.is_empty());
    }

    #[tokio::test]
    async fn traversal_changes_the_listing_root() {
        let mut nav = FileNavigator::new(media());
        nav.change_dir("calibration");
        let rows = nav.page(0, 4).await;
        assert_eq!(rows[0].token, "/calibration/cube.gco");
        nav.up_dir();
        assert_eq!(nav.current_dir(), "");
        nav.change_dir("calibration");
        nav.reset();
        assert_eq!(nav.current_dir(), "");
    }

    #[tokio::test]
    async fn fs_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("part.gco"), b"G28\n").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let store = FsMediaStore::new(dir.path());
        assert!(store.is_present().await);
        let nav = FileNavigator::new(store);
        let rows = nav.page(0, 4).await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].display, "sub/");
        assert_eq!(rows[1].token, "/part.gco");
    }

    #[tokio::test]
    async fn absent_media_reports_not_present() {
        let nav = FileNavigator::new(MemoryMediaStore::absent());
        assert!(!nav.is_media_present().await);
    }
}
