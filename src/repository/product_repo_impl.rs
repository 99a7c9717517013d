// ==========================================
// B2B 批发订货门户 - 商品 Repository 实现
// ==========================================
// 职责: 实现商品数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::product::Product;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::product_repo::ProductRepository;
use async_trait::async_trait;
use rusqlite::{params, Connection, Row, Transaction};
use std::sync::{Arc, Mutex};

const PRODUCT_COLUMNS: &str = "product_id, name, brand, content, ean, \
     purchase_price_cents, retail_price_cents, stock_quantity, max_orderable_quantity, \
     star_rating, category, subcategory, description, tags_json, is_active, \
     import_batch_id, created_at, updated_at";

// ==========================================
// ProductRepositoryImpl
// ==========================================
pub struct ProductRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl ProductRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（与其他仓储共享同一连接时使用）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 行 → Product 映射（列顺序与 PRODUCT_COLUMNS 对齐）
    pub(crate) fn read_product(row: &Row) -> rusqlite::Result<Product> {
        let tags_json: String = row.get(13)?;
        let is_active: i64 = row.get(14)?;

        Ok(Product {
            product_id: row.get(0)?,
            name: row.get(1)?,
            brand: row.get(2)?,
            content: row.get(3)?,
            ean: row.get(4)?,
            purchase_price_cents: row.get(5)?,
            retail_price_cents: row.get(6)?,
            stock_quantity: row.get(7)?,
            max_orderable_quantity: row.get(8)?,
            star_rating: row.get(9)?,
            category: row.get(10)?,
            subcategory: row.get(11)?,
            description: row.get(12)?,
            tags: serde_json::from_str(&tags_json).unwrap_or_default(),
            is_active: is_active != 0,
            import_batch_id: row.get(15)?,
            created_at: row.get(16)?,
            updated_at: row.get(17)?,
        })
    }

    /// 在事务中插入商品（回滚重放/批量写入共用）
    ///
    /// # 参数
    /// - or_replace: true 时使用 INSERT OR REPLACE（同 EAN/同 ID 行被替换）
    pub(crate) fn insert_product_tx(
        tx: &Transaction,
        product: &Product,
        or_replace: bool,
    ) -> RepositoryResult<()> {
        let verb = if or_replace {
            "INSERT OR REPLACE"
        } else {
            "INSERT"
        };

        let sql = format!(
            r#"
            {} INTO product (
                product_id, name, brand, content, ean,
                purchase_price_cents, retail_price_cents, stock_quantity, max_orderable_quantity,
                star_rating, category, subcategory, description, tags_json, is_active,
                import_batch_id, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18
            )
            "#,
            verb
        );

        tx.execute(
            &sql,
            params![
                product.product_id,
                product.name,
                product.brand,
                product.content,
                product.ean,
                product.purchase_price_cents,
                product.retail_price_cents,
                product.stock_quantity,
                product.max_orderable_quantity,
                product.star_rating,
                product.category,
                product.subcategory,
                product.description,
                serde_json::to_string(&product.tags)?,
                product.is_active as i32,
                product.import_batch_id,
                product.created_at,
                product.updated_at,
            ],
        )?;

        Ok(())
    }

    fn insert_with(&self, product: &Product, or_replace: bool) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        Self::insert_product_tx(&tx, product, or_replace)?;
        tx.commit()?;
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for ProductRepositoryImpl {
    async fn exists_by_ean(&self, ean: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM product WHERE ean = ?1",
            params![ean],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    async fn find_by_ean(&self, ean: &str) -> RepositoryResult<Option<Product>> {
        let conn = self.get_conn()?;

        let sql = format!("SELECT {} FROM product WHERE ean = ?1", PRODUCT_COLUMNS);
        let result = conn.query_row(&sql, params![ean], Self::read_product);

        match result {
            Ok(product) => Ok(Some(product)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_eans(&self, eans: &[String]) -> RepositoryResult<Vec<Product>> {
        if eans.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.get_conn()?;

        let sql = format!("SELECT {} FROM product WHERE ean = ?1", PRODUCT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;

        let mut products = Vec::new();
        for ean in eans {
            let result = stmt.query_row(params![ean], Self::read_product);
            match result {
                Ok(product) => products.push(product),
                Err(rusqlite::Error::QueryReturnedNoRows) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(products)
    }

    async fn insert(&self, product: &Product) -> RepositoryResult<()> {
        self.insert_with(product, false)
    }

    async fn upsert(&self, product: &Product) -> RepositoryResult<()> {
        self.insert_with(product, true)
    }

    async fn count_all(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM product", [], |row| row.get(0))?;
        Ok(count)
    }

    async fn count_by_import_batch(&self, run_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM product WHERE import_batch_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    async fn find_by_import_batch(&self, run_id: &str) -> RepositoryResult<Vec<Product>> {
        let conn = self.get_conn()?;

        let sql = format!(
            "SELECT {} FROM product WHERE import_batch_id = ?1 ORDER BY created_at",
            PRODUCT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt.query_map(params![run_id], Self::read_product)?;
        let mut products = Vec::new();
        for row in rows {
            products.push(row?);
        }

        Ok(products)
    }
}
