// ==========================================
// B2B 批发订货门户 - 导入台账 Repository 实现
// ==========================================
// 职责: 实现导入台账数据访问（使用 rusqlite）
// ==========================================

use crate::domain::import::{ImportRun, ImportStatistics};
use crate::domain::types::ImportStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::import_ledger_repo::ImportLedgerRepository;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

const RUN_COLUMNS: &str = "run_id, imported_by, file_name, total_rows, success_rows, \
     failed_rows, elapsed_ms, status, errors_json, warnings_json, created_at";

// ==========================================
// ImportLedgerRepositoryImpl
// ==========================================
pub struct ImportLedgerRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl ImportLedgerRepositoryImpl {
    /// 创建新的 Repository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 行 → ImportRun 映射（列顺序与 RUN_COLUMNS 对齐）
    pub(crate) fn read_run(row: &Row) -> rusqlite::Result<ImportRun> {
        let status_raw: String = row.get(7)?;

        Ok(ImportRun {
            run_id: row.get(0)?,
            imported_by: row.get(1)?,
            file_name: row.get(2)?,
            total_rows: row.get(3)?,
            success_rows: row.get(4)?,
            failed_rows: row.get(5)?,
            elapsed_ms: row.get(6)?,
            // 历史数据可能存在未知状态串，按条款顺序兜底为 FAILED
            status: ImportStatus::from_str(&status_raw).unwrap_or(ImportStatus::Failed),
            errors_json: row.get(8)?,
            warnings_json: row.get(9)?,
            created_at: row.get(10)?,
        })
    }

    fn query_recent(conn: &Connection, limit: usize) -> RepositoryResult<Vec<ImportRun>> {
        let sql = format!(
            "SELECT {} FROM import_run ORDER BY created_at DESC, run_id DESC LIMIT ?1",
            RUN_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt.query_map(params![limit as i64], Self::read_run)?;
        let mut runs = Vec::new();
        for row in rows {
            runs.push(row?);
        }
        Ok(runs)
    }
}

#[async_trait]
impl ImportLedgerRepository for ImportLedgerRepositoryImpl {
    async fn create_run(&self, run: &ImportRun) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO import_run (
                run_id, imported_by, file_name, total_rows, success_rows,
                failed_rows, elapsed_ms, status, errors_json, warnings_json, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                run.run_id,
                run.imported_by,
                run.file_name,
                run.total_rows,
                run.success_rows,
                run.failed_rows,
                run.elapsed_ms,
                run.status.as_str(),
                run.errors_json,
                run.warnings_json,
                run.created_at,
            ],
        )?;

        Ok(())
    }

    async fn get_run(&self, run_id: &str) -> RepositoryResult<Option<ImportRun>> {
        let conn = self.get_conn()?;

        let sql = format!("SELECT {} FROM import_run WHERE run_id = ?1", RUN_COLUMNS);
        let result = conn.query_row(&sql, params![run_id], Self::read_run);

        match result {
            Ok(run) => Ok(Some(run)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_runs(
        &self,
        page: u32,
        page_size: u32,
    ) -> RepositoryResult<(Vec<ImportRun>, i64)> {
        let conn = self.get_conn()?;

        let page = page.max(1);
        let offset = (page - 1) as i64 * page_size as i64;

        let sql = format!(
            "SELECT {} FROM import_run ORDER BY created_at DESC, run_id DESC LIMIT ?1 OFFSET ?2",
            RUN_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt.query_map(params![page_size as i64, offset], Self::read_run)?;
        let mut runs = Vec::new();
        for row in rows {
            runs.push(row?);
        }

        let total: i64 = conn.query_row("SELECT COUNT(*) FROM import_run", [], |row| row.get(0))?;

        Ok((runs, total))
    }

    async fn statistics(&self) -> RepositoryResult<ImportStatistics> {
        let conn = self.get_conn()?;

        let total_runs: i64 =
            conn.query_row("SELECT COUNT(*) FROM import_run", [], |row| row.get(0))?;

        let total_rows_imported: i64 = conn.query_row(
            "SELECT COALESCE(SUM(success_rows), 0) FROM import_run",
            [],
            |row| row.get(0),
        )?;

        // 粗口径: 累计成功行数 / 批次数 × 100（不是成功行/总行）
        let average_success_rate = if total_runs > 0 {
            (total_rows_imported as f64 / total_runs as f64) * 100.0
        } else {
            0.0
        };

        let recent_runs = Self::query_recent(&conn, 5)?;

        Ok(ImportStatistics {
            total_runs,
            total_rows_imported,
            average_success_rate,
            recent_runs,
        })
    }

    async fn purge_runs_older_than(&self, retention_days: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let cutoff = Utc::now() - Duration::days(retention_days);

        let tx = conn.unchecked_transaction()?;

        // 先解除快照/回滚的外键引用，再删台账
        tx.execute(
            "DELETE FROM import_snapshot WHERE run_id IN
                (SELECT run_id FROM import_run WHERE created_at < ?1)",
            params![cutoff],
        )?;
        tx.execute(
            "DELETE FROM import_rollback WHERE run_id IN
                (SELECT run_id FROM import_run WHERE created_at < ?1)",
            params![cutoff],
        )?;
        let purged = tx.execute(
            "DELETE FROM import_run WHERE created_at < ?1",
            params![cutoff],
        )?;

        tx.commit()?;
        Ok(purged)
    }
}
