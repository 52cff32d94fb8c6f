//! Storage keys that must be removed from disk once rows are deleted.
//!
//! Collected before the DELETE because cascades take the rows with them.

use sqlx::PgExecutor;
use uuid::Uuid;

use crate::core::error::Result;

/// The file's own key plus those of its attachments
pub async fn for_file<'e, E: PgExecutor<'e>>(executor: E, file_id: Uuid) -> Result<Vec<String>> {
    let paths = sqlx::query_scalar::<_, String>(
        r#"
        SELECT storage_path FROM user_files WHERE id = $1
        UNION ALL
        SELECT storage_path FROM attachment_files WHERE user_file_id = $1
        "#,
    )
    .bind(file_id)
    .fetch_all(executor)
    .await?;

    Ok(paths)
}

/// Every file filed under the project and their attachments
pub async fn for_project<'e, E: PgExecutor<'e>>(
    executor: E,
    project_id: Uuid,
) -> Result<Vec<String>> {
    let paths = sqlx::query_scalar::<_, String>(
        r#"
        SELECT storage_path FROM user_files WHERE project_id = $1
        UNION ALL
        SELECT a.storage_path
        FROM attachment_files a
        JOIN user_files f ON f.id = a.user_file_id
        WHERE f.project_id = $1
        "#,
    )
    .bind(project_id)
    .fetch_all(executor)
    .await?;

    Ok(paths)
}

/// Files owned by the user or filed under one of the user's projects
pub async fn for_owner<'e, E: PgExecutor<'e>>(executor: E, owner_id: Uuid) -> Result<Vec<String>> {
    let paths = sqlx::query_scalar::<_, String>(
        r#"
        WITH doomed AS (
            SELECT id, storage_path FROM user_files
            WHERE owner_id = $1
               OR project_id IN (SELECT id FROM projects WHERE owner_id = $1)
        )
        SELECT storage_path FROM doomed
        UNION ALL
        SELECT a.storage_path
        FROM attachment_files a
        JOIN doomed d ON d.id = a.user_file_id
        "#,
    )
    .bind(owner_id)
    .fetch_all(executor)
    .await?;

    Ok(paths)
}
