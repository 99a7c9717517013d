// ==========================================
// B2B 批发订货门户 - 商品 Repository Trait
// ==========================================
// 职责: 定义商品数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::product::Product;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// ProductRepository Trait
// ==========================================
// 用途: 商品主数据访问
// 实现者: ProductRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait ProductRepository: Send + Sync {
    // ===== 自然键查询 =====

    /// 检查 EAN 是否已存在
    async fn exists_by_ean(&self, ean: &str) -> RepositoryResult<bool>;

    /// 按 EAN 查询商品
    async fn find_by_ean(&self, ean: &str) -> RepositoryResult<Option<Product>>;

    /// 批量按 EAN 查询商品（前像捕获用）
    async fn find_by_eans(&self, eans: &[String]) -> RepositoryResult<Vec<Product>>;

    // ===== 写入 =====

    /// 插入商品（EAN 冲突时报唯一约束错误，绝不静默覆盖）
    async fn insert(&self, product: &Product) -> RepositoryResult<()>;

    /// 插入或覆盖商品（覆盖模式；同 EAN 的既有行被替换）
    async fn upsert(&self, product: &Product) -> RepositoryResult<()>;

    // ===== 导入归属查询 =====

    /// 统计商品总数
    async fn count_all(&self) -> RepositoryResult<i64>;

    /// 统计归属于某导入批次的商品数
    async fn count_by_import_batch(&self, run_id: &str) -> RepositoryResult<i64>;

    /// 查询归属于某导入批次的商品
    async fn find_by_import_batch(&self, run_id: &str) -> RepositoryResult<Vec<Product>>;
}
