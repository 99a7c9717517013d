// ==========================================
// B2B 批发订货门户 - 领域层
// ==========================================
// 职责: 实体、值类型与领域不变式
// ==========================================

pub mod audit_log;
pub mod import;
pub mod product;
pub mod rollback;
pub mod types;

// 重导出核心类型
pub use audit_log::AuditLogEntry;
pub use import::{ImportReport, ImportRun, ImportStatistics, RowError, RowWarning};
pub use product::{Product, ProductDraft};
pub use rollback::{RollbackPreview, RollbackRecord, Snapshot};
pub use types::{Actor, AuditAction, EntityType, ImportStatus, Role};
