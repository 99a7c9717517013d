// ==========================================
// B2B 批发订货门户 - 领域类型
// ==========================================
// 职责: 核心枚举与值类型（字符串常量在此统一）
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Role - 用户角色
// ==========================================
// 说明: 会话鉴权由外部层提供，这里只消费其结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin, // 管理员（目录维护、导入、回滚）
    Buyer, // 采购客户（浏览、下单）
}

impl Role {
    /// 转换为字符串 (用于数据库存储/日志)
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Buyer => "BUYER",
        }
    }

    /// 从字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ADMIN" => Some(Role::Admin),
            "BUYER" => Some(Role::Buyer),
            _ => None,
        }
    }
}

// ==========================================
// Actor - 操作者
// ==========================================
// 用途: API 层鉴权与审计字段来源
// 来源: 外部会话层（黑盒）返回的用户信息 + 请求元信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,            // 用户标识
    pub role: Role,                 // 角色
    pub ip_address: String,         // 请求来源 IP（未知时为 "unknown"）
    pub user_agent: Option<String>, // 请求 User-Agent
}

impl Actor {
    /// 是否具有管理员权限
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// 构造系统操作者（CLI / 后台任务）
    pub fn system(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            role: Role::Admin,
            ip_address: "local".to_string(),
            user_agent: None,
        }
    }
}

// ==========================================
// ImportStatus - 导入状态
// ==========================================
// 派生规则: 成功数为 0 → FAILED；失败数为 0 → SUCCESS；其余 → PARTIAL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportStatus {
    Success,
    Partial,
    Failed,
}

impl ImportStatus {
    /// 根据成功/失败行数派生状态
    pub fn derive(success_rows: i64, failed_rows: i64) -> Self {
        if success_rows == 0 {
            ImportStatus::Failed
        } else if failed_rows == 0 {
            ImportStatus::Success
        } else {
            ImportStatus::Partial
        }
    }

    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStatus::Success => "SUCCESS",
            ImportStatus::Partial => "PARTIAL",
            ImportStatus::Failed => "FAILED",
        }
    }

    /// 从字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "SUCCESS" => Some(ImportStatus::Success),
            "PARTIAL" => Some(ImportStatus::Partial),
            "FAILED" => Some(ImportStatus::Failed),
            _ => None,
        }
    }
}

// ==========================================
// EntityType - 导入目标实体类型
// ==========================================
// 用途: 快照/台账中标记导入的目标实体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityType {
    Product,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Product => "Product",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Product" => Some(EntityType::Product),
            _ => None,
        }
    }
}

// ==========================================
// AuditAction - 审计动作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    Import,   // 批量导入
    Rollback, // 导入回滚
    Backup,   // 备份快照
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Import => "IMPORT",
            AuditAction::Rollback => "ROLLBACK",
            AuditAction::Backup => "BACKUP",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "IMPORT" => Some(AuditAction::Import),
            "ROLLBACK" => Some(AuditAction::Rollback),
            "BACKUP" => Some(AuditAction::Backup),
            _ => None,
        }
    }
}
