//! Decoding and validation of uploaded assets

use crate::error::AppError;
use crate::store::NewAsset;
use crate::types::UploadRequest;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Largest decoded payload accepted by `POST /assets`
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

pub const DEFAULT_CATEGORY: &str = "Landscape";

/// Strip an optional `data:<mime>;base64,` header from a payload
fn strip_data_url(data: &str) -> &str {
    let trimmed = data.trim();
    match trimmed.strip_prefix("data:") {
        Some(rest) => match rest.split_once(";base64,") {
            Some((_, payload)) => payload,
            None => trimmed,
        },
        None => trimmed,
    }
}

/// Turn an upload body into a row ready for insertion
pub fn decode_upload(req: UploadRequest) -> Result<NewAsset, AppError> {
    let file = req.files.into_iter().next().unwrap_or_default();
    let (filename, data) = match (file.name, file.data) {
        (Some(name), Some(data)) if !name.trim().is_empty() && !data.trim().is_empty() => {
            (name, data)
        }
        _ => {
            return Err(AppError::InvalidInput(
                "Image data and filename are required".to_string(),
            ))
        }
    };

    let payload = strip_data_url(&data);
    // Reject oversize payloads before decoding
    if base64::decoded_len_estimate(payload.len()) > MAX_UPLOAD_BYTES + 2 {
        return Err(too_large());
    }

    let content = STANDARD
        .decode(payload)
        .map_err(|_| AppError::InvalidInput("Invalid base64 data".to_string()))?;

    if content.len() > MAX_UPLOAD_BYTES {
        return Err(too_large());
    }

    Ok(NewAsset {
        content,
        filename,
        description: req.description.unwrap_or_default(),
        category: req
            .category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
    })
}

fn too_large() -> AppError {
    AppError::InvalidInput("File size too large. Maximum size is 5MB".to_string())
}
