// ==========================================
// B2B 批发订货门户 - 回滚领域模型
// ==========================================
// 职责: 快照、回滚记录与回滚预览
// 红线: 每个导入至多一个快照、至多一次回滚（存储层唯一约束兜底）
// ==========================================

use crate::domain::types::EntityType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// Snapshot - 回滚快照
// ==========================================
// 用途: 捕获撤销一次导入所需的实体集合（整体捕获，创建后只读）
// 对齐: import_snapshot 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub snapshot_id: String,       // 快照 ID（UUID）
    pub run_id: String,            // 所属导入批次（唯一）
    pub entity_type: EntityType,   // 实体类型标记
    pub snapshot_json: String,     // 序列化实体数组
    pub created_at: DateTime<Utc>, // 捕获时间
}

impl Snapshot {
    /// 整体捕获一组实体为快照
    pub fn capture<T: Serialize>(
        run_id: &str,
        entity_type: EntityType,
        entities: &[T],
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            snapshot_id: Uuid::new_v4().to_string(),
            run_id: run_id.to_string(),
            entity_type,
            snapshot_json: serde_json::to_string(entities)?,
            created_at: Utc::now(),
        })
    }

    /// 快照中捕获的实体数量
    pub fn entity_count(&self) -> usize {
        serde_json::from_str::<Vec<serde_json::Value>>(&self.snapshot_json)
            .map(|v| v.len())
            .unwrap_or(0)
    }
}

// ==========================================
// RollbackRecord - 回滚记录
// ==========================================
// 用途: 某导入已被撤销的凭证；唯一约束实现「每导入至多一次回滚」
// 对齐: import_rollback 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackRecord {
    pub rollback_id: String,       // 回滚记录 ID（UUID）
    pub run_id: String,            // 所属导入批次（唯一）
    pub rolled_back_by: String,    // 执行人用户 ID
    pub entities_restored: i64,    // 恢复/移除实体总数（删除 + 重建合计）
    pub reason: Option<String>,    // 回滚原因
    pub created_at: DateTime<Utc>, // 执行时间
}

// ==========================================
// RollbackPreview - 回滚影响预览
// ==========================================
// 用途: 执行回滚前的真实影响评估（按实际计数，不是占位值）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackPreview {
    pub total_products: i64,        // 当前商品总数
    pub attributable_products: i64, // 归属于该导入的商品数（将被删除）
    pub snapshot_present: bool,     // 是否存在快照
    pub snapshot_entities: i64,     // 快照捕获的实体数（将被重建）
    pub already_rolled_back: bool,  // 是否已回滚
    pub warnings: Vec<String>,      // 阻碍回滚的前置条件提示
}
