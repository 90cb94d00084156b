//! Enquiry repository backed by `SQLite`.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::debug;

use super::model::{
    Enquiry, EnquiryFilter, EnquiryId, EnquiryStats, EnquiryStatus, EnquiryUpdate, NewEnquiry,
    SortOrder,
};
use super::store::EnquiryStore;
use crate::scoring::Priority;
use crate::{Error, Result};

const SELECT_ENQUIRY: &str = r"
    SELECT id, created_at, name, email, phone, service, budget, message,
           priority, status, notes, follow_up_sent_at
    FROM enquiries
";

/// Repository for enquiry storage and retrieval.
pub struct EnquiryRepository {
    pool: SqlitePool,
}

impl EnquiryRepository {
    /// Create a new repository with the given database path.
    ///
    /// Creates the database and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Create an in-memory repository for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Close the connection pool. Later operations fail with a database error.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS enquiries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at TEXT NOT NULL,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                phone TEXT,
                service TEXT,
                budget TEXT,
                message TEXT NOT NULL,
                priority TEXT NOT NULL DEFAULT 'COLD',
                status TEXT NOT NULL DEFAULT 'NEW',
                notes TEXT,
                follow_up_sent_at TEXT,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // Follow-up selection scans only unescalated rows
        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_enquiries_follow_up
            ON enquiries(status, created_at) WHERE follow_up_sent_at IS NULL
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_enquiries_created ON enquiries(created_at)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl EnquiryStore for EnquiryRepository {
    async fn create(&self, enquiry: &NewEnquiry) -> Result<EnquiryId> {
        let result = sqlx::query(
            r"
            INSERT INTO enquiries
                (created_at, name, email, phone, service, budget, message, priority, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'NEW')
            ",
        )
        .bind(encode_timestamp(enquiry.created_at))
        .bind(&enquiry.name)
        .bind(&enquiry.email)
        .bind(enquiry.phone.as_deref())
        .bind(enquiry.service.as_deref())
        .bind(enquiry.budget.as_deref())
        .bind(&enquiry.message)
        .bind(enquiry.priority.as_str())
        .execute(&self.pool)
        .await?;

        let id = EnquiryId::new(result.last_insert_rowid());
        debug!(%id, priority = %enquiry.priority, "Stored enquiry");
        Ok(id)
    }

    async fn find_by_id(&self, id: EnquiryId) -> Result<Option<Enquiry>> {
        let row = sqlx::query(&format!("{SELECT_ENQUIRY} WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_enquiry).transpose()
    }

    async fn find_many(&self, filter: &EnquiryFilter) -> Result<Vec<Enquiry>> {
        let mut query = QueryBuilder::<Sqlite>::new(SELECT_ENQUIRY);
        query.push(" WHERE 1 = 1");

        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        if !filter.priorities.is_empty() {
            query.push(" AND priority IN (");
            let mut list = query.separated(", ");
            for priority in &filter.priorities {
                list.push_bind(priority.as_str());
            }
            list.push_unseparated(")");
        }
        match filter.follow_up_sent {
            Some(true) => {
                query.push(" AND follow_up_sent_at IS NOT NULL");
            }
            Some(false) => {
                query.push(" AND follow_up_sent_at IS NULL");
            }
            None => {}
        }
        if let Some(before) = filter.created_before {
            query
                .push(" AND created_at < ")
                .push_bind(encode_timestamp(before));
        }
        if let Some(after) = filter.after_id {
            query.push(" AND id > ").push_bind(after.0);
        }
        query.push(match filter.order {
            SortOrder::Oldest => " ORDER BY id ASC",
            SortOrder::Newest => " ORDER BY created_at DESC, id DESC",
        });
        if let Some(limit) = filter.limit {
            query.push(" LIMIT ").push_bind(i64::from(limit));
        }

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_enquiry).collect()
    }

    async fn update(&self, id: EnquiryId, update: &EnquiryUpdate) -> Result<Enquiry> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!("{SELECT_ENQUIRY} WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(Error::NotFound(id))?;

        let mut enquiry = row_to_enquiry(&row)?;
        update.apply(&mut enquiry);

        sqlx::query(
            r"
            UPDATE enquiries
            SET status = ?,
                priority = ?,
                notes = ?,
                follow_up_sent_at = ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            ",
        )
        .bind(enquiry.status.as_str())
        .bind(enquiry.priority.as_str())
        .bind(enquiry.notes.as_deref())
        .bind(enquiry.follow_up_sent_at.map(encode_timestamp))
        .bind(id.0)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(enquiry)
    }

    async fn delete(&self, id: EnquiryId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM enquiries WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn stats(&self) -> Result<EnquiryStats> {
        let row = sqlx::query(
            r"
            SELECT
                COUNT(*) as total,
                COALESCE(SUM(CASE WHEN status = 'NEW' THEN 1 ELSE 0 END), 0) as new,
                COALESCE(SUM(CASE WHEN status = 'READ' THEN 1 ELSE 0 END), 0) as read,
                COALESCE(SUM(CASE WHEN status = 'REPLIED' THEN 1 ELSE 0 END), 0) as replied,
                COALESCE(SUM(CASE WHEN status = 'ARCHIVED' THEN 1 ELSE 0 END), 0) as archived,
                COALESCE(SUM(CASE WHEN priority = 'HOT' THEN 1 ELSE 0 END), 0) as hot,
                COALESCE(SUM(CASE WHEN priority = 'WARM' THEN 1 ELSE 0 END), 0) as warm,
                COALESCE(SUM(CASE WHEN priority = 'COLD' THEN 1 ELSE 0 END), 0) as cold,
                COALESCE(SUM(CASE WHEN follow_up_sent_at IS NOT NULL THEN 1 ELSE 0 END), 0)
                    as followed_up
            FROM enquiries
            ",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(EnquiryStats {
            total: count(&row, "total")?,
            new: count(&row, "new")?,
            read: count(&row, "read")?,
            replied: count(&row, "replied")?,
            archived: count(&row, "archived")?,
            hot: count(&row, "hot")?,
            warm: count(&row, "warm")?,
            cold: count(&row, "cold")?,
            followed_up: count(&row, "followed_up")?,
        })
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Fixed-width UTC form so timestamps compare correctly as text.
fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::InvalidRecord(format!("{column} '{value}': {e}")))
}

fn count(row: &SqliteRow, column: &str) -> Result<u32> {
    let value: i64 = row.try_get(column)?;
    u32::try_from(value).map_err(|_| Error::InvalidRecord(format!("{column} count {value}")))
}

/// Convert a database row to an `Enquiry`.
fn row_to_enquiry(row: &SqliteRow) -> Result<Enquiry> {
    let created_at: String = row.try_get("created_at")?;
    let follow_up_sent_at: Option<String> = row.try_get("follow_up_sent_at")?;

    Ok(Enquiry {
        id: EnquiryId::new(row.try_get("id")?),
        created_at: decode_timestamp("created_at", &created_at)?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        service: row.try_get("service")?,
        budget: row.try_get("budget")?,
        message: row.try_get("message")?,
        priority: Priority::parse(row.try_get("priority")?),
        status: EnquiryStatus::parse(row.try_get("status")?),
        notes: row.try_get("notes")?,
        follow_up_sent_at: follow_up_sent_at
            .map(|value| decode_timestamp("follow_up_sent_at", &value))
            .transpose()?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    fn new_enquiry(name: &str, priority: Priority, created_at: DateTime<Utc>) -> NewEnquiry {
        NewEnquiry {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: None,
            service: Some("Auction Bidding".to_string()),
            budget: Some("$750,000 - $1,000,000".to_string()),
            message: "We are looking to buy in the inner west.".to_string(),
            priority,
            created_at,
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = EnquiryRepository::in_memory().await.unwrap();

        let id = repo
            .create(&new_enquiry("Alice", Priority::Warm, at(1, 9)))
            .await
            .unwrap();
        let enquiry = repo.find_by_id(id).await.unwrap().unwrap();

        assert_eq!(enquiry.id, id);
        assert_eq!(enquiry.name, "Alice");
        assert_eq!(enquiry.created_at, at(1, 9));
        assert_eq!(enquiry.priority, Priority::Warm);
        assert_eq!(enquiry.status, EnquiryStatus::New);
        assert_eq!(enquiry.notes, None);
        assert_eq!(enquiry.follow_up_sent_at, None);
    }

    #[tokio::test]
    async fn test_find_missing() {
        let repo = EnquiryRepository::in_memory().await.unwrap();
        assert!(repo.find_by_id(EnquiryId::new(42)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let repo = EnquiryRepository::in_memory().await.unwrap();
        let update = EnquiryUpdate {
            status: Some(EnquiryStatus::Read),
            ..EnquiryUpdate::default()
        };

        let err = repo.update(EnquiryId::new(7), &update).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(id) if id == EnquiryId::new(7)));
    }

    #[tokio::test]
    async fn test_follow_up_time_is_set_once() {
        let repo = EnquiryRepository::in_memory().await.unwrap();
        let id = repo
            .create(&new_enquiry("Bob", Priority::Hot, at(1, 9)))
            .await
            .unwrap();

        repo.update(id, &EnquiryUpdate::follow_up_sent(at(4, 9)))
            .await
            .unwrap();
        let enquiry = repo
            .update(id, &EnquiryUpdate::follow_up_sent(at(5, 9)))
            .await
            .unwrap();

        assert_eq!(enquiry.follow_up_sent_at, Some(at(4, 9)));
        let stored = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.follow_up_sent_at, Some(at(4, 9)));
    }

    #[tokio::test]
    async fn test_append_note_preserves_lines() {
        let repo = EnquiryRepository::in_memory().await.unwrap();
        let id = repo
            .create(&new_enquiry("Carol", Priority::Cold, at(1, 9)))
            .await
            .unwrap();

        for line in ["first", "second"] {
            repo.update(
                id,
                &EnquiryUpdate {
                    append_note: Some(line.to_string()),
                    ..EnquiryUpdate::default()
                },
            )
            .await
            .unwrap();
        }

        let stored = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.notes.as_deref(), Some("first\nsecond"));
    }

    #[tokio::test]
    async fn test_find_many_filters() {
        let repo = EnquiryRepository::in_memory().await.unwrap();
        let old_hot = repo
            .create(&new_enquiry("Hot", Priority::Hot, at(1, 9)))
            .await
            .unwrap();
        repo.create(&new_enquiry("Cold", Priority::Cold, at(1, 9)))
            .await
            .unwrap();
        repo.create(&new_enquiry("Fresh", Priority::Warm, at(5, 9)))
            .await
            .unwrap();

        let filter = EnquiryFilter {
            status: Some(EnquiryStatus::New),
            priorities: vec![Priority::Hot, Priority::Warm],
            follow_up_sent: Some(false),
            created_before: Some(at(3, 9)),
            ..EnquiryFilter::default()
        };
        let found = repo.find_many(&filter).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, old_hot);
    }

    #[tokio::test]
    async fn test_find_many_pages_by_id() {
        let repo = EnquiryRepository::in_memory().await.unwrap();
        let mut ids = Vec::new();
        for i in 0..5 {
            let created = at(1, 9) + Duration::minutes(i);
            ids.push(
                repo.create(&new_enquiry("Page", Priority::Hot, created))
                    .await
                    .unwrap(),
            );
        }

        let first = repo
            .find_many(&EnquiryFilter {
                limit: Some(2),
                ..EnquiryFilter::default()
            })
            .await
            .unwrap();
        let second = repo
            .find_many(&EnquiryFilter {
                after_id: first.last().map(|e| e.id),
                limit: Some(2),
                ..EnquiryFilter::default()
            })
            .await
            .unwrap();

        assert_eq!(first.iter().map(|e| e.id).collect::<Vec<_>>(), ids[0..2]);
        assert_eq!(second.iter().map(|e| e.id).collect::<Vec<_>>(), ids[2..4]);
    }

    #[tokio::test]
    async fn test_find_many_newest_first() {
        let repo = EnquiryRepository::in_memory().await.unwrap();
        repo.create(&new_enquiry("Older", Priority::Hot, at(1, 9)))
            .await
            .unwrap();
        repo.create(&new_enquiry("Newer", Priority::Hot, at(2, 9)))
            .await
            .unwrap();

        let found = repo
            .find_many(&EnquiryFilter {
                order: SortOrder::Newest,
                ..EnquiryFilter::default()
            })
            .await
            .unwrap();

        assert_eq!(found[0].name, "Newer");
        assert_eq!(found[1].name, "Older");
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = EnquiryRepository::in_memory().await.unwrap();
        let id = repo
            .create(&new_enquiry("Dan", Priority::Cold, at(1, 9)))
            .await
            .unwrap();

        assert!(repo.delete(id).await.unwrap());
        assert!(!repo.delete(id).await.unwrap());
        assert!(repo.find_by_id(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stats() {
        let repo = EnquiryRepository::in_memory().await.unwrap();
        assert_eq!(repo.stats().await.unwrap(), EnquiryStats::default());

        let hot = repo
            .create(&new_enquiry("Hot", Priority::Hot, at(1, 9)))
            .await
            .unwrap();
        repo.create(&new_enquiry("Warm", Priority::Warm, at(1, 9)))
            .await
            .unwrap();
        let cold = repo
            .create(&new_enquiry("Cold", Priority::Cold, at(1, 9)))
            .await
            .unwrap();
        repo.update(hot, &EnquiryUpdate::follow_up_sent(at(4, 9)))
            .await
            .unwrap();
        repo.update(
            cold,
            &EnquiryUpdate {
                status: Some(EnquiryStatus::Archived),
                ..EnquiryUpdate::default()
            },
        )
        .await
        .unwrap();

        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.new, 2);
        assert_eq!(stats.archived, 1);
        assert_eq!(stats.hot, 1);
        assert_eq!(stats.warm, 1);
        assert_eq!(stats.cold, 1);
        assert_eq!(stats.followed_up, 1);
    }

    #[tokio::test]
    async fn test_closed_store_fails_loudly() {
        let repo = EnquiryRepository::in_memory().await.unwrap();
        repo.close().await;

        let err = repo
            .create(&new_enquiry("Eve", Priority::Hot, at(1, 9)))
            .await
            .unwrap_err();
        assert!(err.is_store_unavailable());
        assert!(repo.ping().await.unwrap_err().is_store_unavailable());
    }
}
