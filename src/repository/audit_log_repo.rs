// ==========================================
// B2B 批发订货门户 - 审计日志仓储
// ==========================================
// 红线: 所有导入/回滚/备份写入必须记录；仅追加，不做业务逻辑
// ==========================================

use crate::domain::audit_log::AuditLogEntry;
use crate::domain::types::AuditAction;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row, Transaction};
use std::sync::{Arc, Mutex};

// ==========================================
// AuditLogRepository - 审计日志仓储
// ==========================================
pub struct AuditLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AuditLogRepository {
    /// 创建新的审计日志仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn read_entry(row: &Row) -> rusqlite::Result<AuditLogEntry> {
        let action_raw: String = row.get(2)?;
        let detail_raw: Option<String> = row.get(5)?;

        Ok(AuditLogEntry {
            audit_id: row.get(0)?,
            actor: row.get(1)?,
            action: AuditAction::from_str(&action_raw).unwrap_or(AuditAction::Import),
            entity_type: row.get(3)?,
            entity_id: row.get(4)?,
            detail_json: detail_raw.and_then(|raw| serde_json::from_str(&raw).ok()),
            ip_address: row.get(6)?,
            user_agent: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    /// 在事务中插入审计日志（回滚等多表事务内复用）
    pub(crate) fn insert_tx(tx: &Transaction, entry: &AuditLogEntry) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT INTO audit_log (
                audit_id, actor, action, entity_type, entity_id,
                detail_json, ip_address, user_agent, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                entry.audit_id,
                entry.actor,
                entry.action.as_str(),
                entry.entity_type,
                entry.entity_id,
                entry.detail_json.as_ref().map(|v| v.to_string()),
                entry.ip_address,
                entry.user_agent,
                entry.created_at,
            ],
        )?;

        Ok(())
    }

    /// 插入审计日志
    pub fn insert(&self, entry: &AuditLogEntry) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        Self::insert_tx(&tx, entry)?;
        tx.commit()?;
        Ok(())
    }

    /// 查询某实体的审计日志（按时间倒序）
    pub fn list_by_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> RepositoryResult<Vec<AuditLogEntry>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            "SELECT audit_id, actor, action, entity_type, entity_id,
                    detail_json, ip_address, user_agent, created_at
             FROM audit_log
             WHERE entity_type = ?1 AND entity_id = ?2
             ORDER BY created_at DESC, audit_id DESC",
        )?;

        let rows = stmt.query_map(params![entity_type, entity_id], Self::read_entry)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }

        Ok(entries)
    }
}
