// ==========================================
// B2B 批发订货门户 - 快照仓储
// ==========================================
// 红线: 快照整体写入、创建后只读；每个导入至多一条（UNIQUE 约束）
// ==========================================

use crate::domain::rollback::Snapshot;
use crate::domain::types::EntityType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// SnapshotRepository - 回滚快照仓储
// ==========================================
pub struct SnapshotRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SnapshotRepository {
    /// 创建新的快照仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn read_snapshot(row: &Row) -> rusqlite::Result<Snapshot> {
        let entity_type_raw: String = row.get(2)?;

        Ok(Snapshot {
            snapshot_id: row.get(0)?,
            run_id: row.get(1)?,
            entity_type: EntityType::from_str(&entity_type_raw).unwrap_or(EntityType::Product),
            snapshot_json: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    /// 写入快照
    ///
    /// # 返回
    /// - Err(UniqueConstraintViolation): 该导入已存在快照（一对一约束）
    pub fn insert(&self, snapshot: &Snapshot) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO import_snapshot (
                snapshot_id, run_id, entity_type, snapshot_json, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                snapshot.snapshot_id,
                snapshot.run_id,
                snapshot.entity_type.as_str(),
                snapshot.snapshot_json,
                snapshot.created_at,
            ],
        )?;

        Ok(())
    }

    /// 查询某导入的快照（结构上至多一条）
    pub fn find_by_run(&self, run_id: &str) -> RepositoryResult<Option<Snapshot>> {
        let conn = self.get_conn()?;

        let result = conn.query_row(
            "SELECT snapshot_id, run_id, entity_type, snapshot_json, created_at
             FROM import_snapshot WHERE run_id = ?1",
            params![run_id],
            Self::read_snapshot,
        );

        match result {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 是否存在某导入的快照
    pub fn exists_for_run(&self, run_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM import_snapshot WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }
}
