// ==========================================
// B2B 批发订货门户 - 回滚引擎
// ==========================================
// 职责: 导入回滚的前置状态机 + 备份快照 + 影响预览
// 状态机: NEVER_ROLLED_BACK → ROLLED_BACK（终态，不可重复）
// ==========================================

use crate::domain::import::ImportRun;
use crate::domain::product::Product;
use crate::domain::rollback::{RollbackPreview, RollbackRecord, Snapshot};
use crate::domain::types::{Actor, AuditAction, EntityType};
use crate::domain::AuditLogEntry;
use crate::i18n::{t, t_with_args};
use crate::repository::audit_log_repo::AuditLogRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::import_ledger_repo::ImportLedgerRepository;
use crate::repository::import_ledger_repo_impl::ImportLedgerRepositoryImpl;
use crate::repository::product_repo::ProductRepository;
use crate::repository::product_repo_impl::ProductRepositoryImpl;
use crate::repository::rollback_repo::RollbackRepository;
use crate::repository::snapshot_repo::SnapshotRepository;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{info, instrument, warn};

// ==========================================
// RollbackError - 回滚引擎错误
// ==========================================
#[derive(Error, Debug)]
pub enum RollbackError {
    // ===== 前置条件错误（任何变更前拒绝）=====
    #[error("导入记录不存在: {0}")]
    RunNotFound(String),

    #[error("该导入已执行过回滚: {0}")]
    AlreadyRolledBack(String),

    #[error("该导入没有可用于回滚的快照: {0}")]
    NoSnapshot(String),

    #[error("该导入已存在快照: {0}")]
    SnapshotExists(String),

    // ===== 数据错误 =====
    #[error("快照数据无法解析: {0}")]
    SnapshotCorrupted(String),

    // ===== 存储错误 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result 类型别名
pub type RollbackEngineResult<T> = Result<T, RollbackError>;

// ==========================================
// RollbackOutcome / BackupOutcome - 引擎输出
// ==========================================
#[derive(Debug, Clone)]
pub struct RollbackOutcome {
    pub record: RollbackRecord,
    pub entities_restored: i64,
    pub message: String, // 本地化摘要
}

#[derive(Debug, Clone)]
pub struct BackupOutcome {
    pub snapshot_id: Option<String>, // 无可备份商品时为 None
    pub captured: usize,
    pub message: String,
}

// ==========================================
// RollbackEngine - 回滚引擎
// ==========================================
// 所有仓储共享同一连接：前置检查与回滚事务针对同一库
pub struct RollbackEngine {
    ledger_repo: ImportLedgerRepositoryImpl,
    product_repo: ProductRepositoryImpl,
    snapshot_repo: SnapshotRepository,
    rollback_repo: RollbackRepository,
    audit_repo: AuditLogRepository,
}

impl RollbackEngine {
    /// 创建新的回滚引擎
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }

    /// 从已有连接创建
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            ledger_repo: ImportLedgerRepositoryImpl::from_connection(conn.clone()),
            product_repo: ProductRepositoryImpl::from_connection(conn.clone()),
            snapshot_repo: SnapshotRepository::new(conn.clone()),
            rollback_repo: RollbackRepository::new(conn.clone()),
            audit_repo: AuditLogRepository::new(conn),
        }
    }

    /// 执行回滚（每导入至多一次）
    ///
    /// # 前置条件（任何变更前检查，失败无副作用）
    /// 1. 导入记录存在
    /// 2. 尚未回滚（重试已完成的回滚是报错的空操作，不是重复执行）
    /// 3. 存在快照
    ///
    /// # 事务
    /// 删除归属商品 + 快照重放 + 回滚记录 + 审计日志 全有或全无；
    /// 失败时状态机停留在未回滚，可安全重试
    #[instrument(skip(self, actor, reason))]
    pub async fn rollback(
        &self,
        run_id: &str,
        actor: &Actor,
        reason: Option<&str>,
    ) -> RollbackEngineResult<RollbackOutcome> {
        // 前置 1: 导入记录存在
        let run = self.require_run(run_id).await?;

        // 前置 2: 尚未回滚
        if self.rollback_repo.exists_for_run(run_id)? {
            return Err(RollbackError::AlreadyRolledBack(run_id.to_string()));
        }

        // 前置 3: 存在快照
        let snapshot = self
            .snapshot_repo
            .find_by_run(run_id)?
            .ok_or_else(|| RollbackError::NoSnapshot(run_id.to_string()))?;

        let restore: Vec<Product> = serde_json::from_str(&snapshot.snapshot_json)
            .map_err(|e| RollbackError::SnapshotCorrupted(e.to_string()))?;

        info!(
            run_id = %run_id,
            actor = %actor.user_id,
            restore = restore.len(),
            "开始回滚导入"
        );

        // 原子事务: 删除/重放/记录/审计
        let record = self
            .rollback_repo
            .execute_rollback(&run, &restore, actor, reason)?;

        let entities_restored = record.entities_restored;
        info!(
            run_id = %run_id,
            entities_restored = entities_restored,
            "回滚完成"
        );

        Ok(RollbackOutcome {
            record,
            entities_restored,
            message: t_with_args(
                "rollback.completed",
                &[("count", &entities_restored.to_string())],
            ),
        })
    }

    /// 为某导入创建备份快照（不执行回滚）
    ///
    /// 用途: 在后续高风险导入（如覆盖模式）前，固化该导入当前归属的商品集合
    #[instrument(skip(self, actor))]
    pub async fn create_backup(
        &self,
        run_id: &str,
        actor: &Actor,
    ) -> RollbackEngineResult<BackupOutcome> {
        let _run = self.require_run(run_id).await?;

        // 一对一约束: 已有快照时显式拒绝，而非静默追加
        if self.snapshot_repo.exists_for_run(run_id)? {
            return Err(RollbackError::SnapshotExists(run_id.to_string()));
        }

        let products = self.product_repo.find_by_import_batch(run_id).await?;

        if products.is_empty() {
            warn!(run_id = %run_id, "没有找到可备份的商品");
            return Ok(BackupOutcome {
                snapshot_id: None,
                captured: 0,
                message: t("rollback.backup_empty"),
            });
        }

        let snapshot = Snapshot::capture(run_id, EntityType::Product, &products)
            .map_err(|e| RollbackError::SnapshotCorrupted(e.to_string()))?;
        self.snapshot_repo.insert(&snapshot)?;

        let audit = AuditLogEntry::for_import_run(actor, AuditAction::Backup, run_id)
            .with_detail(&serde_json::json!({
                "snapshot_id": snapshot.snapshot_id,
                "entity_type": EntityType::Product.as_str(),
                "captured": products.len(),
            }));
        self.audit_repo.insert(&audit)?;

        info!(run_id = %run_id, captured = products.len(), "备份快照已创建");

        Ok(BackupOutcome {
            snapshot_id: Some(snapshot.snapshot_id),
            captured: products.len(),
            message: t_with_args(
                "rollback.backup_created",
                &[("count", &products.len().to_string())],
            ),
        })
    }

    /// 回滚影响预览（按实际计数，不做任何变更）
    pub async fn preview(&self, run_id: &str) -> RollbackEngineResult<RollbackPreview> {
        let _run = self.require_run(run_id).await?;

        let total_products = self.product_repo.count_all().await?;
        let attributable_products = self.product_repo.count_by_import_batch(run_id).await?;
        let snapshot = self.snapshot_repo.find_by_run(run_id)?;
        let already_rolled_back = self.rollback_repo.exists_for_run(run_id)?;

        let mut warnings = Vec::new();
        if already_rolled_back {
            warnings.push(t("rollback.already_rolled_back"));
        }
        if snapshot.is_none() {
            warnings.push(t("rollback.no_snapshot"));
        }

        Ok(RollbackPreview {
            total_products,
            attributable_products,
            snapshot_present: snapshot.is_some(),
            snapshot_entities: snapshot.map(|s| s.entity_count() as i64).unwrap_or(0),
            already_rolled_back,
            warnings,
        })
    }

    async fn require_run(&self, run_id: &str) -> RollbackEngineResult<ImportRun> {
        self.ledger_repo
            .get_run(run_id)
            .await?
            .ok_or_else(|| RollbackError::RunNotFound(run_id.to_string()))
    }
}
