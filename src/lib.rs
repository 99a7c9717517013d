// ==========================================
// B2B 批发订货门户 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 商品目录批量导入与回滚核心
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 外部数据
pub mod importer;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{Actor, AuditAction, EntityType, ImportStatus, Role};

// 领域实体
pub use domain::{
    AuditLogEntry, ImportReport, ImportRun, ImportStatistics, Product, ProductDraft,
    RollbackPreview, RollbackRecord, RowError, RowWarning, Snapshot,
};

// 导入层
pub use importer::{
    BatchProcessor, ColumnMapping, ImportOptions, ProductImporter, ProductImporterImpl,
    RowMapper, RowValidator,
};

// 引擎
pub use engine::RollbackEngine;

// API
pub use api::{ImportApi, RollbackApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "B2B批发订货门户";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";
