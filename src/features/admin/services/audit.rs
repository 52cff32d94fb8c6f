//! Audit trail writes. Callers pass their open transaction so the entry
//! commits or rolls back together with the change it describes.

use sqlx::PgExecutor;
use tracing::debug;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::admin::models::AuditAction;

pub async fn record<'e, E: PgExecutor<'e>>(
    executor: E,
    actor_id: Uuid,
    action: AuditAction,
    target_id: Uuid,
    details: serde_json::Value,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (actor_id, action, target_type, target_id, details)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(actor_id)
    .bind(action)
    .bind(action.target_type())
    .bind(target_id)
    .bind(details)
    .execute(executor)
    .await?;

    debug!("Audit: {:?} on {} by {}", action, target_id, actor_id);
    Ok(())
}
