//! Photo upload: the whole batch is checked in memory before anything touches
//! the disk, so a rejected batch never leaves files behind.

use std::fs;
use std::path::{Path, PathBuf};

use axum::extract::{Multipart, State};
use axum::Json;
use quote_engine::OrderId;
use rand::RngCore;
use serde::Serialize;
use tracing::info;

use crate::error::ApiError;
use crate::routes::AppState;

pub const FIELD_NAME: &str = "images";
pub const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "webp", "gif", "heic", "heif"];

pub fn extension_of(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    (!ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric())).then_some(ext)
}

pub fn is_image_name(name: &str) -> bool {
    extension_of(name).map_or(false, |ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Phones often send an empty media type, so a known extension is enough.
pub fn is_image(name: &str, content_type: Option<&str>) -> bool {
    content_type.map_or(false, |ct| ct.starts_with("image/")) || is_image_name(name)
}

fn random_hex(n: usize) -> String {
    let mut buf = vec![0u8; n];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

pub fn new_order_id() -> OrderId {
    let mut bytes = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut bytes);
    OrderId::from_bytes(bytes)
}

pub fn stored_name(original: &str) -> String {
    let ext = extension_of(original).unwrap_or_else(|| "jpg".to_string());
    format!("{}.{}", random_hex(6), ext)
}

#[derive(Debug, Clone)]
pub struct Incoming {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct Batch {
    pub accepted: Vec<Incoming>,
    pub skipped: Vec<String>,
    pub received: usize,
}

/// Splits a batch into accepted and skipped files. One oversized image
/// fails the whole batch.
pub fn plan_batch(files: Vec<Incoming>, max_bytes: usize) -> Result<Batch, ApiError> {
    if files.is_empty() {
        return Err(ApiError::NoImages);
    }
    let mut batch = Batch { received: files.len(), ..Default::default() };
    for f in files {
        if !is_image(&f.name, f.content_type.as_deref()) {
            batch.skipped.push(f.name);
            continue;
        }
        if f.bytes.len() > max_bytes {
            return Err(ApiError::ImageTooLarge { name: f.name, limit: max_bytes });
        }
        batch.accepted.push(f);
    }
    if batch.accepted.is_empty() {
        return Err(ApiError::NothingSaved { skipped: batch.skipped });
    }
    Ok(batch)
}

/// Image folders on local disk: `<root>/<order id>/<random>.<ext>`.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ImageStore { root: root.into() }
    }

    pub fn root(&self) -> &Path { &self.root }

    pub fn folder(&self, id: &OrderId) -> PathBuf {
        self.root.join(id.as_str())
    }

    pub fn write_batch(&self, id: &OrderId, files: &[Incoming]) -> std::io::Result<usize> {
        let dir = self.folder(id);
        fs::create_dir_all(&dir)?;
        let written = files.iter().try_for_each(|f| fs::write(dir.join(stored_name(&f.name)), &f.bytes));
        if let Err(e) = written {
            let _ = fs::remove_dir_all(&dir);
            return Err(e);
        }
        Ok(files.len())
    }

    /// Sorted visible file names, or `None` when the folder does not exist.
    pub fn list(&self, id: &OrderId) -> std::io::Result<Option<Vec<String>>> {
        let dir = self.folder(id);
        if !dir.is_dir() {
            return Ok(None);
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() { continue; }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') { continue; }
            names.push(name);
        }
        names.sort();
        Ok(Some(names))
    }

    /// Public urls of an order's images, as served under `/uploads`.
    pub fn image_urls(&self, id: &OrderId) -> std::io::Result<Option<Vec<String>>> {
        Ok(self.list(id)?.map(|names| names.into_iter().map(|n| format!("/uploads/{}/{}", id, n)).collect()))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub ok: bool,
    pub id: String,
    pub gallery_path: String,
    pub saved_count: usize,
    pub received_count: usize,
    pub skipped: Vec<String>,
}

async fn read_field(mut field: axum::extract::multipart::Field<'_>, max_bytes: usize) -> Result<Incoming, ApiError> {
    let name = field.file_name().filter(|n| !n.is_empty()).unwrap_or("image").to_string();
    let content_type = field.content_type().map(str::to_string);
    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        bytes.extend_from_slice(&chunk);
        // buffer at most limit + 1 bytes
        if bytes.len() > max_bytes {
            bytes.truncate(max_bytes + 1);
            if is_image(&name, content_type.as_deref()) {
                return Err(ApiError::ImageTooLarge { name, limit: max_bytes });
            }
        }
    }
    Ok(Incoming { name, content_type, bytes })
}

pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<UploadResponse>, ApiError> {
    let max = state.config.max_image_bytes;
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FIELD_NAME) {
            continue;
        }
        files.push(read_field(field, max).await?);
    }

    let batch = plan_batch(files, max)?;
    let id = new_order_id();
    let saved = state.images.write_batch(&id, &batch.accepted)?;
    info!(target = "shopper", id = %id, saved, received = batch.received, skipped = batch.skipped.len(), "upload stored");

    Ok(Json(UploadResponse {
        ok: true,
        gallery_path: format!("/u/{}", id),
        id: id.to_string(),
        saved_count: saved,
        received_count: batch.received,
        skipped: batch.skipped,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, ct: Option<&str>, len: usize) -> Incoming {
        Incoming { name: name.into(), content_type: ct.map(str::to_string), bytes: vec![7u8; len] }
    }

    #[test]
    fn test_image_detection() {
        assert!(is_image("IMG_0001.HEIC", None));
        assert!(is_image("photo", Some("image/png")));
        assert!(is_image("scan.jpeg", Some("")));
        assert!(!is_image("notes.txt", Some("text/plain")));
        assert!(!is_image("archive", None));
    }

    #[test]
    fn test_stored_name() {
        let n = stored_name("Photo.PNG");
        assert!(n.ends_with(".png"));
        assert_eq!(n.len(), 12 + 4);
        assert!(stored_name("no_extension").ends_with(".jpg"));
        assert!(stored_name("weird.p/ng").ends_with(".jpg"));
    }

    #[test]
    fn test_new_order_id() {
        let a = new_order_id();
        let b = new_order_id();
        assert_eq!(a.as_str().len(), 16);
        assert_ne!(a, b);
    }

    #[test]
    fn test_plan_batch() {
        let batch = plan_batch(vec![file("a.jpg", None, 10), file("b.txt", Some("text/plain"), 10)], 100).unwrap();
        assert_eq!(batch.accepted.len(), 1);
        assert_eq!(batch.skipped, vec!["b.txt".to_string()]);
        assert_eq!(batch.received, 2);
    }

    #[test]
    fn test_plan_batch_failures() {
        assert!(matches!(plan_batch(vec![], 100), Err(ApiError::NoImages)));
        assert!(matches!(
            plan_batch(vec![file("a.doc", None, 1)], 100),
            Err(ApiError::NothingSaved { skipped }) if skipped == vec!["a.doc".to_string()]
        ));
        assert!(matches!(
            plan_batch(vec![file("a.jpg", None, 10), file("b.jpg", None, 101), file("c.jpg", None, 10)], 100),
            Err(ApiError::ImageTooLarge { name, .. }) if name == "b.jpg"
        ));
        // a large non-image is just skipped
        assert!(plan_batch(vec![file("a.jpg", None, 10), file("big.zip", None, 500)], 100).is_ok());
    }

    #[test]
    fn test_store_write_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());
        let id = new_order_id();
        assert_eq!(store.list(&id).unwrap(), None);
        store.write_batch(&id, &[file("a.jpg", None, 3), file("b.png", None, 3)]).unwrap();
        fs::write(store.folder(&id).join(".DS_Store"), b"x").unwrap();
        let names = store.list(&id).unwrap().unwrap();
        assert_eq!(names.len(), 2);
        assert!(names.windows(2).all(|w| w[0] <= w[1]));
        let urls = store.image_urls(&id).unwrap().unwrap();
        assert!(urls[0].starts_with(&format!("/uploads/{}/", id)));
    }
}
