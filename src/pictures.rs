//! Profile picture storage: thumbnails written to the upload directory.

use std::path::{Path, PathBuf};

use actix_web::web;
use image::{DynamicImage, ImageBuffer, Rgb};
use log::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::user::DEFAULT_IMAGE;

/// Pictures are shrunk to fit inside this square, keeping their aspect ratio.
pub const THUMBNAIL_SIZE: u32 = 125;

/// Largest upload accepted for a profile picture.
pub const MAX_PICTURE_BYTES: usize = 2 * 1024 * 1024;

const ALLOWED_EXTENSIONS: [&str; 2] = ["jpg", "png"];

/// Lower-cased extension of an uploaded file name, if it is one we store.
pub fn allowed_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

fn resize_and_store(bytes: &[u8], path: &Path, ext: &str) -> Result<(), image::ImageError> {
    let thumbnail = image::load_from_memory(bytes)?.thumbnail(THUMBNAIL_SIZE, THUMBNAIL_SIZE);
    if ext == "jpg" {
        // JPEG has no alpha channel.
        DynamicImage::ImageRgb8(thumbnail.to_rgb8()).save(path)
    } else {
        thumbnail.save(path)
    }
}

/// Decodes an uploaded picture, thumbnails it and saves it under a random name.
///
/// Returns the stored file name (not the full path).
pub async fn save_picture(
    upload_dir: &str,
    original_name: &str,
    bytes: Vec<u8>,
) -> Result<String, AppError> {
    let ext = allowed_extension(original_name).ok_or_else(|| {
        AppError::ValidationError("picture: File does not have an approved extension: jpg, png".into())
    })?;
    if bytes.len() > MAX_PICTURE_BYTES {
        return Err(AppError::PayloadTooLarge(format!(
            "Picture exceeds {} bytes",
            MAX_PICTURE_BYTES
        )));
    }

    let filename = format!("{}.{}", Uuid::new_v4().simple(), ext);
    let path: PathBuf = Path::new(upload_dir).join(&filename);

    web::block(move || resize_and_store(&bytes, &path, &ext))
        .await
        .map_err(|e| AppError::InternalServerError(format!("Picture worker failed: {}", e)))?
        .map_err(|e| AppError::ValidationError(format!("picture: not a readable image ({})", e)))?;

    info!("stored profile picture {}", filename);
    Ok(filename)
}

/// Deletes a replaced picture. The shared default image is never removed.
pub async fn remove_picture(upload_dir: &str, filename: &str) {
    if filename == DEFAULT_IMAGE || filename.contains('/') || filename.contains("..") {
        return;
    }
    let path = Path::new(upload_dir).join(filename);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        warn!("could not remove old picture {}: {}", path.display(), e);
    }
}

/// Creates the upload directory and a plain grey default picture if they are missing.
pub fn ensure_upload_dir(upload_dir: &str) -> std::io::Result<()> {
    std::fs::create_dir_all(upload_dir)?;
    let default_path = Path::new(upload_dir).join(DEFAULT_IMAGE);
    if !default_path.exists() {
        let placeholder: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(THUMBNAIL_SIZE, THUMBNAIL_SIZE, Rgb([200, 200, 200]));
        DynamicImage::ImageRgb8(placeholder)
            .save(&default_path)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        info!("generated {}", default_path.display());
    }
    Ok(())
}
