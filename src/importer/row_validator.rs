// ==========================================
// B2B 批发订货门户 - 行校验器实现
// ==========================================
// 职责: 按字段顺序校验映射后的行，归一化为 ProductDraft
// 规则: 首个失败字段即终止（每行至多一条错误）
// ==========================================

use crate::domain::product::ProductDraft;
use crate::i18n::{t, t_with_args};
use std::collections::HashMap;

// ==========================================
// FieldError / FieldWarning - 字段级结果
// ==========================================
// 说明: 行号与原始行数据由批处理层补充
#[derive(Debug, Clone)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct FieldWarning {
    pub field: &'static str,
    pub message: String,
}

// ==========================================
// RowValidator - 行校验器
// ==========================================
pub struct RowValidator;

impl RowValidator {
    /// 校验一条映射后的行记录
    ///
    /// # 校验顺序
    /// name → brand → content → ean → purchase_price → retail_price →
    /// stock_quantity → max_orderable_quantity(可选) → star_rating(可选) →
    /// category/subcategory/description(可选) → tags(可选)
    ///
    /// # 返回
    /// - Ok((draft, warnings)): 归一化后的商品草稿与行级警告
    /// - Err(FieldError): 首个失败字段（校验到此为止）
    pub fn validate(
        &self,
        fields: &HashMap<String, String>,
    ) -> Result<(ProductDraft, Vec<FieldWarning>), FieldError> {
        let mut warnings = Vec::new();

        // 商品名称: 非空，≤100 字符
        let name = Self::required(fields, "name", "validation.name_required")?;
        if name.chars().count() > 100 {
            return Err(FieldError {
                field: "name",
                message: t("validation.name_too_long"),
            });
        }

        // 品牌: 非空，≤50 字符
        let brand = Self::required(fields, "brand", "validation.brand_required")?;
        if brand.chars().count() > 50 {
            return Err(FieldError {
                field: "brand",
                message: t("validation.brand_too_long"),
            });
        }

        // 规格内容: 非空
        let content = Self::required(fields, "content", "validation.content_required")?;

        // EAN: 恰好 13 位数字
        let ean = Self::required(fields, "ean", "validation.ean_format")?;
        if ean.len() != 13 || !ean.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FieldError {
                field: "ean",
                message: t("validation.ean_format"),
            });
        }

        // 进货价 / 零售价: 金额格式（最多 2 位小数），归一化为分
        let purchase_price_cents = Self::price(fields, "purchase_price", "validation.purchase_price_format")?;
        let retail_price_cents = Self::price(fields, "retail_price", "validation.retail_price_format")?;

        // 库存数量: 非负整数
        let stock_raw = Self::required(fields, "stock_quantity", "validation.stock_format")?;
        if !Self::is_digits(&stock_raw) {
            return Err(FieldError {
                field: "stock_quantity",
                message: t("validation.stock_format"),
            });
        }
        let stock_quantity: i64 = stock_raw.parse().map_err(|_| FieldError {
            field: "stock_quantity",
            message: t("validation.stock_format"),
        })?;

        // 最大订购数量: 可选；无法解析时降级为警告并忽略
        let max_orderable_quantity = match fields.get("max_orderable_quantity") {
            Some(raw) if Self::is_digits(raw) => raw.parse::<i64>().ok(),
            Some(raw) => {
                warnings.push(FieldWarning {
                    field: "max_orderable_quantity",
                    message: t_with_args("validation.max_quantity_ignored", &[("value", raw)]),
                });
                None
            }
            None => None,
        };

        // 星级评分: 可选；出现时必须为 0-5 的单个数字
        let star_rating = match fields.get("star_rating") {
            Some(raw) => {
                let valid = raw.len() == 1 && matches!(raw.as_bytes()[0], b'0'..=b'5');
                if !valid {
                    return Err(FieldError {
                        field: "star_rating",
                        message: t("validation.rating_format"),
                    });
                }
                (raw.as_bytes()[0] - b'0') as i32
            }
            None => 0,
        };

        // 可选文本字段
        let category = fields.get("category").cloned();
        let subcategory = fields.get("subcategory").cloned();
        let description = fields.get("description").cloned();

        // 标签: 逗号分隔，逐项 TRIM，空项丢弃；缺失时为空列表
        let tags = fields
            .get("tags")
            .map(|raw| {
                raw.split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok((
            ProductDraft {
                name,
                brand,
                content,
                ean,
                purchase_price_cents,
                retail_price_cents,
                stock_quantity,
                max_orderable_quantity,
                star_rating,
                category,
                subcategory,
                description,
                tags,
            },
            warnings,
        ))
    }

    /// 提取必填字段（缺失即报错）
    fn required(
        fields: &HashMap<String, String>,
        field: &'static str,
        message_key: &str,
    ) -> Result<String, FieldError> {
        match fields.get(field) {
            Some(v) if !v.is_empty() => Ok(v.clone()),
            _ => Err(FieldError {
                field,
                message: t(message_key),
            }),
        }
    }

    /// 校验金额格式并归一化为分
    ///
    /// 接受 "12"、"12.5"、"12.50"；拒绝 "12.345"、"1,50"、"-3"
    fn price(
        fields: &HashMap<String, String>,
        field: &'static str,
        message_key: &str,
    ) -> Result<i64, FieldError> {
        let raw = Self::required(fields, field, message_key)?;

        let err = || FieldError {
            field,
            message: t(message_key),
        };

        let (whole, frac) = match raw.split_once('.') {
            Some((w, f)) => (w, f),
            None => (raw.as_str(), ""),
        };

        if whole.is_empty() || !Self::is_digits(whole) {
            return Err(err());
        }
        if !frac.is_empty() && (frac.len() > 2 || !Self::is_digits(frac)) {
            return Err(err());
        }
        if raw.ends_with('.') {
            return Err(err());
        }

        let whole_cents = whole
            .parse::<i64>()
            .ok()
            .and_then(|w| w.checked_mul(100))
            .ok_or_else(err)?;
        let frac_cents = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| err())? * 10,
            _ => frac.parse::<i64>().map_err(|_| err())?,
        };

        whole_cents.checked_add(frac_cents).ok_or_else(err)
    }

    fn is_digits(s: &str) -> bool {
        !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
    }
}
