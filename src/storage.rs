use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::models::Post;

// Sub-directory of the upload root that holds post images.
const POST_IMAGE_DIR: &str = "posts";

#[derive(Clone, Debug)]
pub struct LocalImageStorage {
    pub upload_dir: PathBuf,
    pub base_url: String,
}

impl LocalImageStorage {
    pub fn new(upload_dir: String, base_url: String) -> Self {
        Self {
            upload_dir: PathBuf::from(upload_dir),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Writes the image under a fresh name and returns its storage-relative
    /// path, e.g. `posts/<uuid>.gif`.
    pub async fn save_image(
        &self,
        file_bytes: Bytes,
        original_filename: Option<&str>,
    ) -> Result<String, std::io::Error> {
        let extension = original_filename
            .and_then(|name| Path::new(name).extension().and_then(|ext| ext.to_str()))
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
            .unwrap_or_default();

        let unique_filename = format!("{}{}", Uuid::new_v4(), extension);
        let dir = self.upload_dir.join(POST_IMAGE_DIR);

        fs::create_dir_all(&dir).await?;
        fs::write(dir.join(&unique_filename), file_bytes).await?;

        Ok(format!("{}/{}", POST_IMAGE_DIR, unique_filename))
    }

    pub async fn delete_image(&self, image_path: &str) -> Result<(), std::io::Error> {
        let file_path = self.resolve(image_path)?;
        fs::remove_file(&file_path).await
    }

    pub async fn read_image(&self, image_path: &str) -> Result<Vec<u8>, std::io::Error> {
        let file_path = self.resolve(image_path)?;
        fs::read(&file_path).await
    }

    /// Public URL the upload directory is served under.
    pub fn public_url(&self, image_path: &str) -> String {
        format!("{}/{}", self.base_url, image_path)
    }

    /// Fills in `image_url` for a post that carries an image.
    pub fn attach_url(&self, mut post: Post) -> Post {
        post.image_url = post.image.as_deref().map(|path| self.public_url(path));
        post
    }

    // Stored paths are relative and never climb out of the upload dir.
    fn resolve(&self, image_path: &str) -> Result<PathBuf, std::io::Error> {
        let relative = Path::new(image_path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid image path: {}", image_path),
            ));
        }
        Ok(self.upload_dir.join(relative))
    }
}
