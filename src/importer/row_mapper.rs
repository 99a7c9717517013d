// ==========================================
// B2B 批发订货门户 - 行映射器实现
// ==========================================
// 职责: 源列名 → 目标字段名投影（由操作员在导入前提供映射）
// 红线: 仅做重命名/投影，不做任何校验
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use std::collections::HashMap;

// ==========================================
// ColumnMapping - 列映射配置
// ==========================================
// 结构: 目标字段名 → 源列名（操作员上传文件时一并提交）
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    mapping: HashMap<String, String>,
}

impl ColumnMapping {
    /// 从字段名 → 列名映射构造
    pub fn new(mapping: HashMap<String, String>) -> Self {
        Self { mapping }
    }

    /// 从 JSON 字符串解析（批次级输入，解析失败在任何行处理前拒绝）
    pub fn from_json(json: &str) -> ImportResult<Self> {
        let mapping: HashMap<String, String> = serde_json::from_str(json)
            .map_err(|e| ImportError::InvalidColumnMapping(e.to_string()))?;
        Ok(Self::new(mapping))
    }

    /// 遍历 (目标字段, 源列名)；源列名为空串视为未映射
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.mapping
            .iter()
            .filter(|(_, col)| !col.trim().is_empty())
            .map(|(field, col)| (field.as_str(), col.as_str()))
    }

    /// 查询目标字段映射到的源列名
    pub fn source_column(&self, field: &str) -> Option<&str> {
        self.mapping
            .get(field)
            .map(|s| s.as_str())
            .filter(|s| !s.trim().is_empty())
    }
}

// ==========================================
// RowMapper - 行映射器
// ==========================================
pub struct RowMapper {
    mapping: ColumnMapping,
}

impl RowMapper {
    pub fn new(mapping: ColumnMapping) -> Self {
        Self { mapping }
    }

    /// 将原始行投影为目标字段记录
    ///
    /// # 规则
    /// - 未映射或源列缺失的字段省略
    /// - 值 TRIM 后为空串视为缺失（省略）
    ///
    /// # 返回
    /// - HashMap<目标字段名, 原始值>
    pub fn map_row(&self, row: &HashMap<String, String>) -> HashMap<String, String> {
        let mut mapped = HashMap::new();

        for (field, column) in self.mapping.entries() {
            if let Some(value) = row.get(column) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    mapped.insert(field.to_string(), trimmed.to_string());
                }
            }
        }

        mapped
    }
}
