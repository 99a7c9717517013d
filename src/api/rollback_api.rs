// ==========================================
// 导入回滚API
// ==========================================
// 职责: 封装导入回滚/备份/预览功能（仅管理员）
// 鉴权: 非管理员在任何检查与变更前拒绝
// ==========================================

use crate::api::ensure_admin;
use crate::api::error::{ApiError, ApiResult};
use crate::domain::rollback::{RollbackPreview, RollbackRecord};
use crate::domain::types::Actor;
use crate::engine::RollbackEngine;
use serde::{Deserialize, Serialize};

/// 回滚API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackApiResponse {
    /// 操作是否成功
    pub success: bool,
    /// 本地化结果摘要（含恢复实体数）
    pub message: String,
    /// 恢复/移除实体总数
    pub entities_restored: i64,
    /// 创建的回滚记录
    pub rollback: RollbackRecord,
}

/// 备份API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupApiResponse {
    /// 操作是否成功
    pub success: bool,
    /// 本地化结果摘要
    pub message: String,
    /// 创建的快照ID（无可备份商品时为 None）
    pub backup_id: Option<String>,
    /// 捕获的商品数
    pub captured: usize,
}

/// 回滚API
pub struct RollbackApi {
    db_path: String,
}

impl RollbackApi {
    /// 创建新的RollbackApi实例
    pub fn new(db_path: String) -> Self {
        Self { db_path }
    }

    /// 回滚一次导入（每导入至多一次）
    ///
    /// # 参数
    /// - import_id: 导入批次 ID
    /// - reason: 回滚原因（可选自由文本）
    /// - actor: 操作者（需管理员角色）
    ///
    /// # 拒绝条件（无副作用）
    /// - 非管理员 / 导入不存在 / 已回滚 / 无快照
    pub async fn rollback_import(
        &self,
        import_id: &str,
        reason: Option<&str>,
        actor: &Actor,
    ) -> ApiResult<RollbackApiResponse> {
        ensure_admin(actor)?;
        let import_id = Self::require_import_id(import_id)?;

        let engine = self.create_engine()?;
        let outcome = engine.rollback(import_id, actor, reason).await?;

        Ok(RollbackApiResponse {
            success: true,
            message: outcome.message,
            entities_restored: outcome.entities_restored,
            rollback: outcome.record,
        })
    }

    /// 回滚影响预览（真实计数，不做任何变更）
    pub async fn preview_rollback(
        &self,
        import_id: &str,
        actor: &Actor,
    ) -> ApiResult<RollbackPreview> {
        ensure_admin(actor)?;
        let import_id = Self::require_import_id(import_id)?;

        let engine = self.create_engine()?;
        Ok(engine.preview(import_id).await?)
    }

    /// 为导入创建备份快照（不执行回滚）
    pub async fn create_backup(
        &self,
        import_id: &str,
        actor: &Actor,
    ) -> ApiResult<BackupApiResponse> {
        ensure_admin(actor)?;
        let import_id = Self::require_import_id(import_id)?;

        let engine = self.create_engine()?;
        let outcome = engine.create_backup(import_id, actor).await?;

        Ok(BackupApiResponse {
            success: true,
            message: outcome.message,
            backup_id: outcome.snapshot_id,
            captured: outcome.captured,
        })
    }

    fn require_import_id(import_id: &str) -> ApiResult<&str> {
        let trimmed = import_id.trim();
        if trimmed.is_empty() {
            return Err(ApiError::InvalidInput("导入批次 ID 不能为空".to_string()));
        }
        Ok(trimmed)
    }

    fn create_engine(&self) -> ApiResult<RollbackEngine> {
        Ok(RollbackEngine::new(&self.db_path)?)
    }
}
