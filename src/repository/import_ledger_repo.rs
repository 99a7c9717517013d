// ==========================================
// B2B 批发订货门户 - 导入台账 Repository Trait
// ==========================================
// 职责: 定义导入台账数据访问接口（不包含业务逻辑）
// 红线: 台账只写自身存储，绝不改动业务实体
// ==========================================

use crate::domain::import::{ImportRun, ImportStatistics};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// ImportLedgerRepository Trait
// ==========================================
// 用途: 导入台账数据访问
// 实现者: ImportLedgerRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait ImportLedgerRepository: Send + Sync {
    /// 写入一条导入台账记录（每次上传一条，创建后不可变）
    async fn create_run(&self, run: &ImportRun) -> RepositoryResult<()>;

    /// 按 ID 查询导入记录
    async fn get_run(&self, run_id: &str) -> RepositoryResult<Option<ImportRun>>;

    /// 分页查询导入历史（按创建时间倒序）
    ///
    /// # 参数
    /// - page: 页码（1 基）
    /// - page_size: 每页记录数
    ///
    /// # 返回
    /// - (记录列表, 总数)
    async fn list_runs(&self, page: u32, page_size: u32)
        -> RepositoryResult<(Vec<ImportRun>, i64)>;

    /// 聚合统计
    ///
    /// 口径: average_success_rate = 累计成功行数 / 批次数 × 100（粗口径）
    async fn statistics(&self) -> RepositoryResult<ImportStatistics>;

    /// 清理超过保留期的台账记录（连同其快照与回滚记录）
    ///
    /// # 返回
    /// - 删除的台账记录数
    async fn purge_runs_older_than(&self, retention_days: i64) -> RepositoryResult<usize>;
}
