use std::path::PathBuf;

/// Course thumbnails and promo videos land here; rows only store the
/// public URL under `/api/v1/static/`.
pub fn get_uploads_dir() -> std::io::Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(cwd.join("uploads"))
}
