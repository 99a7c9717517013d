// ==========================================
// B2B 批发订货门户 - 回滚仓储
// ==========================================
// 职责: 回滚记录读写 + 回滚多表事务（删除/重放/记录/审计 全有或全无）
// 红线: import_rollback.run_id 唯一约束兜底「每导入至多一次回滚」——
//       两个并发回滚同时通过前置检查时，提交阶段必然只有一个成功
// ==========================================

use crate::domain::audit_log::AuditLogEntry;
use crate::domain::import::ImportRun;
use crate::domain::product::Product;
use crate::domain::rollback::RollbackRecord;
use crate::domain::types::{Actor, AuditAction, EntityType};
use crate::repository::audit_log_repo::AuditLogRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::product_repo_impl::ProductRepositoryImpl;
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ==========================================
// RollbackRepository - 回滚记录仓储
// ==========================================
pub struct RollbackRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RollbackRepository {
    /// 创建新的回滚仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn read_record(row: &Row) -> rusqlite::Result<RollbackRecord> {
        Ok(RollbackRecord {
            rollback_id: row.get(0)?,
            run_id: row.get(1)?,
            rolled_back_by: row.get(2)?,
            entities_restored: row.get(3)?,
            reason: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    /// 是否已存在某导入的回滚记录
    pub fn exists_for_run(&self, run_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM import_rollback WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    /// 查询某导入的回滚记录
    pub fn find_by_run(&self, run_id: &str) -> RepositoryResult<Option<RollbackRecord>> {
        let conn = self.get_conn()?;

        let result = conn.query_row(
            "SELECT rollback_id, run_id, rolled_back_by, entities_restored, reason, created_at
             FROM import_rollback WHERE run_id = ?1",
            params![run_id],
            Self::read_record,
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 执行回滚事务（四个子步骤全有或全无）
    ///
    /// # 子步骤
    /// a. 删除归属于该导入的全部商品（import_batch_id = run_id）
    /// b. 按快照逐条重建商品（保留原 ID 与字段值）
    /// c. 写入一条回滚记录（删除 + 重建 合计为 entities_restored）
    /// d. 写入一条 ROLLBACK 审计日志
    ///
    /// 任一子步骤失败 → 事务回滚，库中无任何残留效果，状态机停留在未回滚
    ///
    /// # 参数
    /// - run: 被回滚的导入台账记录
    /// - restore: 快照反序列化出的商品列表
    /// - actor: 执行人
    /// - reason: 回滚原因
    pub fn execute_rollback(
        &self,
        run: &ImportRun,
        restore: &[Product],
        actor: &Actor,
        reason: Option<&str>,
    ) -> RepositoryResult<RollbackRecord> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        // a. 删除归属商品
        let removed = tx.execute(
            "DELETE FROM product WHERE import_batch_id = ?1",
            params![run.run_id],
        )?;

        // b. 快照重放（INSERT OR REPLACE: 既有同 EAN 行回退到快照状态）
        let mut restored = 0usize;
        for product in restore {
            ProductRepositoryImpl::insert_product_tx(&tx, product, true)?;
            restored += 1;
        }

        let entities_restored = (removed + restored) as i64;

        // c. 回滚记录（唯一约束在此兜底并发回滚）
        let record = RollbackRecord {
            rollback_id: Uuid::new_v4().to_string(),
            run_id: run.run_id.clone(),
            rolled_back_by: actor.user_id.clone(),
            entities_restored,
            reason: reason.map(|r| r.to_string()),
            created_at: Utc::now(),
        };
        tx.execute(
            r#"
            INSERT INTO import_rollback (
                rollback_id, run_id, rolled_back_by, entities_restored, reason, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.rollback_id,
                record.run_id,
                record.rolled_back_by,
                record.entities_restored,
                record.reason,
                record.created_at,
            ],
        )?;

        // d. 审计日志
        let audit = AuditLogEntry::for_import_run(actor, AuditAction::Rollback, &run.run_id)
            .with_detail(&AuditLogEntry::rollback_detail(
                &run.run_id,
                EntityType::Product,
                entities_restored,
                reason,
                &run.file_name,
            ));
        AuditLogRepository::insert_tx(&tx, &audit)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(record)
    }
}
