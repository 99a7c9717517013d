// ==========================================
// B2B 批发订货门户 - 商品领域模型
// ==========================================
// 职责: 商品主数据与导入中间结构
// 红线: ean 为业务自然键（13 位数字），存储层唯一约束
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// Product - 商品主数据
// ==========================================
// 用途: 导入层写入，订货/定价层只读
// 对齐: product 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    // ===== 主键与自然键 =====
    pub product_id: String, // 内部标识（UUID）
    pub ean: String,        // 商品条码（13 位数字，唯一）

    // ===== 基础信息 =====
    pub name: String,    // 商品名称（≤100 字符）
    pub brand: String,   // 品牌（≤50 字符）
    pub content: String, // 规格内容（如 "500ml"）

    // ===== 价格（以分存储，避免浮点金额）=====
    pub purchase_price_cents: i64, // 进货价（分）
    pub retail_price_cents: i64,   // 建议零售价（分）

    // ===== 库存与订购限制 =====
    pub stock_quantity: i64,                // 库存数量
    pub max_orderable_quantity: Option<i64>, // 单次最大订购数量

    // ===== 展示信息 =====
    pub star_rating: i32,            // 星级评分（0-5，缺省 0）
    pub category: Option<String>,    // 分类
    pub subcategory: Option<String>, // 子分类
    pub description: Option<String>, // 描述
    pub tags: Vec<String>,           // 标签列表（存储为 JSON）

    // ===== 状态 =====
    pub is_active: bool, // 是否上架

    // ===== 导入归属 =====
    // 创建该商品的导入批次 ID；回滚按此字段定位归属商品
    pub import_batch_id: Option<String>,

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// ProductDraft - 导入中间结构体
// ==========================================
// 用途: 导入管道中间产物（字段映射 → 校验归一化 → 此结构 → 落库）
// 生命周期: 仅在导入流程内
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub brand: String,
    pub content: String,
    pub ean: String,
    pub purchase_price_cents: i64,
    pub retail_price_cents: i64,
    pub stock_quantity: i64,
    pub max_orderable_quantity: Option<i64>,
    pub star_rating: i32,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

impl ProductDraft {
    /// 转换为可落库的 Product，打上导入批次标记
    ///
    /// # 参数
    /// - import_batch_id: 本次导入的批次 ID（回滚归属依据）
    pub fn into_product(self, import_batch_id: &str) -> Product {
        let now = Utc::now();
        Product {
            product_id: Uuid::new_v4().to_string(),
            ean: self.ean,
            name: self.name,
            brand: self.brand,
            content: self.content,
            purchase_price_cents: self.purchase_price_cents,
            retail_price_cents: self.retail_price_cents,
            stock_quantity: self.stock_quantity,
            max_orderable_quantity: self.max_orderable_quantity,
            star_rating: self.star_rating,
            category: self.category,
            subcategory: self.subcategory,
            description: self.description,
            tags: self.tags,
            is_active: true,
            import_batch_id: Some(import_batch_id.to_string()),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ProductDraft {
        ProductDraft {
            name: "Mineraalwater".to_string(),
            brand: "BronCo".to_string(),
            content: "500ml".to_string(),
            ean: "8712345678906".to_string(),
            purchase_price_cents: 45,
            retail_price_cents: 129,
            stock_quantity: 240,
            max_orderable_quantity: Some(48),
            star_rating: 4,
            category: Some("Dranken".to_string()),
            subcategory: None,
            description: None,
            tags: vec!["water".to_string()],
        }
    }

    #[test]
    fn test_draft_into_product_tags_batch() {
        let product = draft().into_product("run-001");

        assert_eq!(product.ean, "8712345678906");
        assert_eq!(product.import_batch_id.as_deref(), Some("run-001"));
        assert!(product.is_active);
        assert!(!product.product_id.is_empty());
    }
}
