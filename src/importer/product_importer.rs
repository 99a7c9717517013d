// ==========================================
// B2B 批发订货门户 - 商品导入 Trait
// ==========================================
// 职责: 定义商品导入接口（不包含实现）
// ==========================================

use crate::domain::import::ImportReport;
use crate::domain::types::Actor;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::row_mapper::ColumnMapping;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

// ==========================================
// ImportOptions - 导入选项
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// 已存在的自然键是否覆盖（缺省为拒绝重复，绝不静默覆盖）
    pub overwrite_existing: bool,
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 0）
// 实现者: CsvParser, ExcelParser, UniversalFileParser
pub trait FileParser: Send + Sync {
    /// 解析文件为有序原始行记录（HashMap<列名, 值>）
    ///
    /// # 返回
    /// - Ok(Vec<HashMap<String, String>>): 行记录列表（保持文件内顺序）
    /// - Err: 文件读取错误、格式错误
    fn parse_to_raw_rows(
        &self,
        file_path: &Path,
    ) -> ImportResult<Vec<HashMap<String, String>>>;
}

// ==========================================
// ProductImporter Trait
// ==========================================
// 用途: 商品导入主接口
// 实现者: ProductImporterImpl
#[async_trait]
pub trait ProductImporter: Send + Sync {
    /// 导入内存中的行序列
    ///
    /// # 导入流程
    /// 1. 批次级输入检查（空数据集在任何行处理前拒绝）
    /// 2. 预捕获可能被覆盖商品的前像快照
    /// 3. 批处理: 映射 → 校验 → 唯一性检查 → 落库（批内并发）
    /// 4. 写入导入台账 + 快照 + 审计日志
    ///
    /// # 参数
    /// - rows: 有序原始行序列
    /// - mapping: 操作员提交的列映射
    /// - options: 导入选项
    /// - actor: 发起人（已通过 API 层鉴权）
    /// - file_name: 源文件名（台账记录用）
    async fn import_rows(
        &self,
        rows: Vec<HashMap<String, String>>,
        mapping: ColumnMapping,
        options: ImportOptions,
        actor: &Actor,
        file_name: &str,
    ) -> ImportResult<ImportReport>;

    /// 从文件导入（解析后复用 import_rows）
    async fn import_from_file(
        &self,
        file_path: &Path,
        mapping: ColumnMapping,
        options: ImportOptions,
        actor: &Actor,
    ) -> ImportResult<ImportReport>;
}

/// 提取文件名（台账展示用）
pub(crate) fn display_file_name(file_path: &Path) -> Result<String, ImportError> {
    file_path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
        .ok_or_else(|| ImportError::FileNotFound(file_path.display().to_string()))
}
