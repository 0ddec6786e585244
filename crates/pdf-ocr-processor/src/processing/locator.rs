//! Latest-object lookup under a key prefix

use crate::context::RunContext;
use crate::error::{Error, Result};
use crate::providers::ObjectStore;
use crate::types::{DocumentRef, ObjectInfo};

/// Pick the newest object from a listing
///
/// Folder placeholder keys (ending in '/') are ignored. Objects sharing the
/// newest timestamp are ordered by key and the greatest key wins, so the
/// choice does not depend on listing order.
pub fn select_latest(objects: &[ObjectInfo]) -> Option<&ObjectInfo> {
    objects
        .iter()
        .filter(|o| !o.key.ends_with('/'))
        .max_by(|a, b| {
            a.last_modified
                .cmp(&b.last_modified)
                .then_with(|| a.key.cmp(&b.key))
        })
}

/// Find the most recently modified object under `prefix`
pub async fn find_latest_object(
    ctx: &RunContext,
    store: &dyn ObjectStore,
    bucket: &str,
    prefix: &str,
) -> Result<DocumentRef> {
    let objects = store.list_objects(bucket, prefix).await?;
    tracing::debug!(parent: &ctx.span, "Listed {} objects under {}/{}", objects.len(), bucket, prefix);

    let latest = select_latest(&objects).ok_or_else(|| {
        Error::NotFound(format!("No object found under s3://{}/{}", bucket, prefix))
    })?;

    tracing::info!(
        parent: &ctx.span,
        "Latest object: {} (modified {})",
        latest.key,
        latest.last_modified
    );
    Ok(DocumentRef::new(bucket, latest.key.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::object_store::MockObjectStore;
    use crate::providers::InMemoryObjectStore;
    use crate::types::InvocationContext;
    use chrono::{Duration, TimeZone, Utc};

    fn ctx() -> RunContext {
        RunContext::new(&InvocationContext::default())
    }

    #[tokio::test]
    async fn test_returns_newest() {
        let store = InMemoryObjectStore::new();
        let base = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        store.insert("b", "PDF_TEST/old.pdf", vec![1], base);
        store.insert("b", "PDF_TEST/new.pdf", vec![1], base + Duration::minutes(5));
        store.insert("b", "PDF_TEST/mid.pdf", vec![1], base + Duration::minutes(1));
        store.insert("b", "OTHER/newest.pdf", vec![1], base + Duration::hours(1));

        let doc = find_latest_object(&ctx(), &store, "b", "PDF_TEST/").await.unwrap();
        assert_eq!(doc, DocumentRef::new("b", "PDF_TEST/new.pdf"));
    }

    #[tokio::test]
    async fn test_empty_prefix_is_not_found() {
        let store = InMemoryObjectStore::new();
        store.insert("b", "OTHER/a.pdf", vec![1], Utc::now());

        let err = find_latest_object(&ctx(), &store, "b", "PDF_TEST/").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_listing_failure_propagates() {
        let mut store = MockObjectStore::new();
        store
            .expect_list_objects()
            .times(1)
            .returning(|_, prefix| Err(Error::transport("listing", prefix, "AccessDenied")));

        let err = find_latest_object(&ctx(), &store, "b", "PDF_TEST/").await.unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
    }

    #[test]
    fn test_tie_break_by_key() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let objects = vec![
            ObjectInfo { key: "PDF_TEST/a.pdf".into(), last_modified: at, size: 1 },
            ObjectInfo { key: "PDF_TEST/c.pdf".into(), last_modified: at, size: 1 },
            ObjectInfo { key: "PDF_TEST/b.pdf".into(), last_modified: at, size: 1 },
        ];
        assert_eq!(select_latest(&objects).unwrap().key, "PDF_TEST/c.pdf");

        let mut reversed = objects.clone();
        reversed.reverse();
        assert_eq!(select_latest(&reversed).unwrap().key, "PDF_TEST/c.pdf");
    }

    #[test]
    fn test_folder_markers_ignored() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let objects = vec![
            ObjectInfo { key: "PDF_TEST/".into(), last_modified: at + Duration::days(1), size: 0 },
            ObjectInfo { key: "PDF_TEST/a.pdf".into(), last_modified: at, size: 10 },
        ];
        assert_eq!(select_latest(&objects).unwrap().key, "PDF_TEST/a.pdf");
        assert!(select_latest(&objects[..1]).is_none());
    }
}
