// ==========================================
// B2B 批发订货门户 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

pub mod audit_log_repo;
pub mod error;
pub mod import_ledger_repo;
pub mod import_ledger_repo_impl;
pub mod product_repo;
pub mod product_repo_impl;
pub mod rollback_repo;
pub mod snapshot_repo;

// 重导出核心类型
pub use audit_log_repo::AuditLogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use import_ledger_repo::ImportLedgerRepository;
pub use import_ledger_repo_impl::ImportLedgerRepositoryImpl;
pub use product_repo::ProductRepository;
pub use product_repo_impl::ProductRepositoryImpl;
pub use rollback_repo::RollbackRepository;
pub use snapshot_repo::SnapshotRepository;
