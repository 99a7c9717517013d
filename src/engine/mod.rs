// ==========================================
// B2B 批发订货门户 - 引擎层
// ==========================================
// 职责: 业务规则（回滚状态机等），仓储之上、API 之下
// ==========================================

pub mod rollback_engine;

// 重导出核心类型
pub use rollback_engine::{
    BackupOutcome, RollbackEngine, RollbackEngineResult, RollbackError, RollbackOutcome,
};
