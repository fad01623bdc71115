// upload.rs - Single image uploads buffered in memory and written to the upload dir

use super::error::ApiError;
use actix_multipart::Multipart;
use futures::TryStreamExt;
use mime::Mime;
use std::path::Path;
use tracing::{debug, error, warn};
use uuid::Uuid;

const IMAGE_FIELD: &str = "image";

#[derive(Debug)]
pub struct ImageFile {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
}

/// File extension for accepted image types, `None` for anything else
pub fn image_extension(content_type: &Mime) -> Option<&'static str> {
    match content_type.essence_str() {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

// Reads the `image` field, other fields are drained and ignored
pub async fn read_image(mut payload: Multipart, max_bytes: usize) -> Result<ImageFile, ApiError> {
    let mut image: Option<ImageFile> = None;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        let is_image = field.content_disposition().get_name() == Some(IMAGE_FIELD);
        if !is_image || image.is_some() {
            while field
                .try_next()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?
                .is_some()
            {}
            continue;
        }

        let extension = match field.content_type().and_then(image_extension) {
            Some(extension) => extension,
            None => {
                warn!("Rejected upload with content type {:?}", field.content_type());
                return Err(ApiError::BadRequest(
                    "Only jpeg, png, gif and webp images are allowed".to_string(),
                ));
            }
        };

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?
        {
            if bytes.len() + chunk.len() > max_bytes {
                warn!("Rejected upload larger than {} bytes", max_bytes);
                return Err(ApiError::BadRequest(format!(
                    "Image must not exceed {max_bytes} bytes"
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        image = Some(ImageFile { bytes, extension });
    }

    match image {
        Some(image) if !image.bytes.is_empty() => {
            debug!("Read {} byte image", image.bytes.len());
            Ok(image)
        }
        _ => Err(ApiError::BadRequest("image is required".to_string())),
    }
}

/// Writes the image under `dir` with a random name and returns the stored path
pub async fn save_image(dir: &Path, image: &ImageFile) -> Result<String, ApiError> {
    let path = dir.join(format!("{}.{}", Uuid::new_v4(), image.extension));

    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        error!("Error creating upload directory {}: {}", dir.display(), e);
        ApiError::Internal
    })?;
    tokio::fs::write(&path, &image.bytes).await.map_err(|e| {
        error!("Error writing image to {}: {}", path.display(), e);
        ApiError::Internal
    })?;

    Ok(path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_known_image_types_are_accepted() {
        assert_eq!(image_extension(&mime::IMAGE_PNG), Some("png"));
        assert_eq!(image_extension(&mime::IMAGE_JPEG), Some("jpg"));
        assert_eq!(image_extension(&"image/webp".parse().unwrap()), Some("webp"));
        assert_eq!(image_extension(&mime::IMAGE_SVG), None);
        assert_eq!(image_extension(&mime::APPLICATION_PDF), None);
    }

    #[actix_web::test]
    async fn saved_image_lands_in_the_upload_dir() {
        let dir = std::env::temp_dir().join(format!("uploads-{}", Uuid::new_v4()));
        let image = ImageFile {
            bytes: vec![0x89, b'P', b'N', b'G'],
            extension: "png",
        };

        let path = save_image(&dir, &image).await.unwrap();
        assert!(path.ends_with(".png"));
        assert_eq!(std::fs::read(&path).unwrap(), image.bytes);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
