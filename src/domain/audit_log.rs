// ==========================================
// B2B 批发订货门户 - 审计日志领域模型
// ==========================================
// 红线: 所有导入/回滚/备份写入必须记录
// 用途: 审计追踪，仅追加
// ==========================================

use crate::domain::types::{Actor, AuditAction, EntityType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

// ==========================================
// AuditLogEntry - 审计日志
// ==========================================
// 对齐: audit_log 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub audit_id: String,           // 日志 ID（UUID）
    pub actor: String,              // 操作人用户 ID
    pub action: AuditAction,        // 动作类型
    pub entity_type: String,        // 目标实体类型（如 "Import" / "Product"）
    pub entity_id: String,          // 目标实体 ID
    pub detail_json: Option<JsonValue>, // 结构化详情
    pub ip_address: String,         // 请求来源 IP
    pub user_agent: Option<String>, // 请求 User-Agent
    pub created_at: DateTime<Utc>,  // 记录时间
}

impl AuditLogEntry {
    /// 创建新的审计日志条目
    ///
    /// # 参数
    /// - actor: 操作者（鉴权层提供，含请求元信息）
    /// - action: 动作类型
    /// - entity_type / entity_id: 操作目标
    pub fn new(actor: &Actor, action: AuditAction, entity_type: &str, entity_id: &str) -> Self {
        Self {
            audit_id: Uuid::new_v4().to_string(),
            actor: actor.user_id.clone(),
            action,
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            detail_json: None,
            ip_address: actor.ip_address.clone(),
            user_agent: actor.user_agent.clone(),
            created_at: Utc::now(),
        }
    }

    /// 设置结构化详情 (转换为JSON)
    pub fn with_detail<T: Serialize>(mut self, detail: &T) -> Self {
        self.detail_json = serde_json::to_value(detail).ok();
        self
    }

    /// 针对导入批次的审计条目
    pub fn for_import_run(actor: &Actor, action: AuditAction, run_id: &str) -> Self {
        Self::new(actor, action, "Import", run_id)
    }

    /// 快照/回滚详情的统一负载结构
    pub fn rollback_detail(
        run_id: &str,
        entity_type: EntityType,
        entities_restored: i64,
        reason: Option<&str>,
        file_name: &str,
    ) -> JsonValue {
        serde_json::json!({
            "import_id": run_id,
            "entity_type": entity_type.as_str(),
            "entities_restored": entities_restored,
            "reason": reason,
            "file_name": file_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Role;

    fn admin() -> Actor {
        Actor {
            user_id: "admin-1".to_string(),
            role: Role::Admin,
            ip_address: "192.168.1.10".to_string(),
            user_agent: Some("portal-test".to_string()),
        }
    }

    #[test]
    fn test_entry_captures_actor_metadata() {
        let entry = AuditLogEntry::for_import_run(&admin(), AuditAction::Rollback, "run-9");

        assert_eq!(entry.actor, "admin-1");
        assert_eq!(entry.entity_type, "Import");
        assert_eq!(entry.entity_id, "run-9");
        assert_eq!(entry.ip_address, "192.168.1.10");
        assert_eq!(entry.action, AuditAction::Rollback);
    }

    #[test]
    fn test_rollback_detail_payload() {
        let detail = AuditLogEntry::rollback_detail(
            "run-9",
            EntityType::Product,
            7,
            Some("verkeerde prijzen"),
            "products.csv",
        );

        assert_eq!(detail["import_id"], "run-9");
        assert_eq!(detail["entities_restored"], 7);
        assert_eq!(detail["file_name"], "products.csv");
    }
}
