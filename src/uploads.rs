use std::path::PathBuf;
use uuid::Uuid;

use crate::error::ApiError;

fn data_dir() -> PathBuf {
    PathBuf::from(std::env::var("DATA_DIR").unwrap_or("./data".into()))
}

/// Store an uploaded lesson file under DATA_DIR and return the relative path
/// used as the lesson's file reference. Files are served back via /content.
pub async fn store_file(filename: &str, bytes: &[u8]) -> Result<String, ApiError> {
    let safe: String = filename
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let rel = format!("uploads/{}_{}", Uuid::new_v4(), safe);

    let base = data_dir();
    let dest = base.join(&rel);
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&dest, bytes).await?;
    Ok(rel)
}

/// Best-effort cleanup for an upload whose draft was rejected. Failures are
/// logged, not surfaced; the authoring error already on its way out is the
/// one the client needs.
pub async fn remove_file(rel: &str) {
    let path = data_dir().join(rel);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        tracing::warn!(error=%e, path=%path.display(), "failed to remove rejected upload");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejected_upload_is_cleaned_up() {
        let dir = std::env::temp_dir().join(format!("courseforge-test-{}", Uuid::new_v4()));
        std::env::set_var("DATA_DIR", &dir);

        let rel = store_file("deck one.pdf", b"%PDF-1.4").await.unwrap();
        assert!(rel.starts_with("uploads/"));
        assert!(rel.ends_with("deck_one.pdf"));
        let stored = dir.join(&rel);
        assert!(stored.exists());

        remove_file(&rel).await;
        assert!(!stored.exists());
    }
}
