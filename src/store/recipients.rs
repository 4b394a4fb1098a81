//! libSQL-backed subscriber list.
//!
//! Append-only and keyed by normalized email address.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::delivery::RecipientProvider;
use crate::error::DatabaseError;
use crate::store::migrations;

/// Result of a subscription attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadySubscribed,
}

/// Subscriber store.
///
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct RecipientStore {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl RecipientStore {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let store = Self::from_database(db).await?;
        info!(
            path = %path.display(),
            schema_version = migrations::latest_version(),
            "Recipient store opened"
        );
        Ok(store)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;
        Self::from_database(db).await
    }

    async fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        migrations::run_migrations(&conn).await?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    /// Add a subscriber. Existing addresses are left untouched.
    pub async fn add_recipient(&self, email: &str) -> Result<AddOutcome, DatabaseError> {
        let email = normalize_email(email)?;
        let inserted = self
            .conn
            .execute(
                "INSERT OR IGNORE INTO subscribers (email, created_at) VALUES (?1, ?2)",
                params![email.clone(), Utc::now().to_rfc3339()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("add_recipient: {e}")))?;

        if inserted == 0 {
            debug!(email = %email, "Already subscribed");
            Ok(AddOutcome::AlreadySubscribed)
        } else {
            info!(email = %email, "Subscriber added");
            Ok(AddOutcome::Added)
        }
    }

    /// All subscribers in the order they joined.
    pub async fn list_recipients(&self) -> Result<Vec<String>, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                "SELECT email FROM subscribers ORDER BY rowid ASC",
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_recipients: {e}")))?;

        let mut emails = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_recipients: {e}")))?
        {
            let email: String = row
                .get(0)
                .map_err(|e| DatabaseError::Query(format!("list_recipients: {e}")))?;
            emails.push(email);
        }
        Ok(emails)
    }
}

#[async_trait]
impl RecipientProvider for RecipientStore {
    async fn list_recipients(&self) -> Result<Vec<String>, DatabaseError> {
        RecipientStore::list_recipients(self).await
    }
}

/// Trim, lowercase, and validate an address.
pub fn normalize_email(raw: &str) -> Result<String, DatabaseError> {
    let email = raw.trim().to_lowercase();
    email
        .parse::<lettre::Address>()
        .map_err(|e| DatabaseError::InvalidEmail(format!("'{}': {e}", raw.trim())))?;
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> RecipientStore {
        RecipientStore::new_memory().await.unwrap()
    }

    #[tokio::test]
    async fn add_and_list_in_order() {
        let store = test_store().await;
        assert_eq!(store.add_recipient("b@example.com").await.unwrap(), AddOutcome::Added);
        assert_eq!(store.add_recipient("a@example.com").await.unwrap(), AddOutcome::Added);

        let list = store.list_recipients().await.unwrap();
        assert_eq!(list, vec!["b@example.com", "a@example.com"]);
    }

    #[tokio::test]
    async fn duplicate_is_ignored_case_insensitively() {
        let store = test_store().await;
        store.add_recipient("Friend@Example.com").await.unwrap();
        let again = store.add_recipient("  friend@example.COM ").await.unwrap();
        assert_eq!(again, AddOutcome::AlreadySubscribed);
        assert_eq!(store.list_recipients().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_email_rejected() {
        let store = test_store().await;
        let err = store.add_recipient("not an email").await.unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidEmail(_)));
        assert!(store.list_recipients().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let store = test_store().await;
        assert!(RecipientProvider::list_recipients(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("readings.db");

        {
            let store = RecipientStore::new_local(&path).await.unwrap();
            store.add_recipient("keep@example.com").await.unwrap();
        }

        let reopened = RecipientStore::new_local(&path).await.unwrap();
        assert_eq!(
            reopened.list_recipients().await.unwrap(),
            vec!["keep@example.com"]
        );
        let version = migrations::get_current_version(&reopened.conn).await.unwrap();
        assert_eq!(version, migrations::latest_version());
    }

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email("  A@B.org ").unwrap(), "a@b.org");
        assert!(normalize_email("@nohost").is_err());
    }
}
