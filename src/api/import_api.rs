// ==========================================
// 商品导入API
// ==========================================
// 职责: 封装商品批量导入相关功能（仅管理员）
// 鉴权: 非管理员在任何行处理前拒绝
// ==========================================

use crate::api::ensure_admin;
use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ImportConfigReader};
use crate::domain::import::{ImportReport, ImportRun, ImportStatistics, RowError, RowWarning};
use crate::domain::types::Actor;
use crate::importer::{
    ColumnMapping, ImportOptions, ProductImporter, ProductImporterImpl, UniversalFileParser,
};
use crate::repository::{
    AuditLogRepository, ImportLedgerRepository, ImportLedgerRepositoryImpl,
    ProductRepositoryImpl, RepositoryError, SnapshotRepository,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// 导入API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiResponse {
    /// 本次导入批次ID（台账/回滚追溯锚点）
    pub import_id: String,
    /// 总行数
    pub total_rows: i64,
    /// 成功行数
    pub successful_rows: i64,
    /// 失败行数
    pub failed_rows: i64,
    /// 行级错误明细（行号为原始输入 1 基位置）
    pub errors: Vec<RowError>,
    /// 行级警告明细
    pub warnings: Vec<RowWarning>,
    /// 导入耗时（毫秒）
    pub processing_time_ms: i64,
    /// 台账状态（SUCCESS / PARTIAL / FAILED）
    pub status: String,
}

impl ImportApiResponse {
    fn from_report(report: ImportReport) -> Self {
        Self {
            import_id: report.run.run_id.clone(),
            total_rows: report.run.total_rows,
            successful_rows: report.run.success_rows,
            failed_rows: report.run.failed_rows,
            errors: report.errors,
            warnings: report.warnings,
            processing_time_ms: report.elapsed.as_millis() as i64,
            status: report.run.status.as_str().to_string(),
        }
    }
}

/// 导入历史响应（带分页信息）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportHistoryResponse {
    /// 导入记录列表（按创建时间倒序）
    pub entries: Vec<ImportRun>,
    /// 总记录数
    pub total: i64,
    /// 页码（1 基）
    pub page: u32,
    /// 每页记录数
    pub page_size: u32,
}

/// 导入API
pub struct ImportApi {
    db_path: String,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    pub fn new(db_path: String) -> Self {
        Self { db_path }
    }

    /// 从文件导入商品数据
    ///
    /// # 参数
    /// - file_path: 文件路径（.csv/.xlsx/.xls）
    /// - column_mapping_json: 操作员提交的列映射（目标字段 → 源列名，JSON）
    /// - options: 导入选项
    /// - actor: 操作者（需管理员角色）
    ///
    /// # 返回
    /// - Ok(ImportApiResponse): 导入结果
    /// - Err(ApiError): 鉴权失败/批次级输入错误/存储错误
    pub async fn import_products_from_file(
        &self,
        file_path: &str,
        column_mapping_json: &str,
        options: ImportOptions,
        actor: &Actor,
    ) -> ApiResult<ImportApiResponse> {
        ensure_admin(actor)?;

        let mapping = ColumnMapping::from_json(column_mapping_json)?;
        let importer = self.create_importer().await?;

        let report = importer
            .import_from_file(Path::new(file_path), mapping, options, actor)
            .await?;

        Ok(ImportApiResponse::from_report(report))
    }

    /// 导入内存中的行序列（上传解析后的数据）
    ///
    /// # 参数
    /// - rows: 有序原始行序列
    /// - column_mapping_json: 列映射 JSON
    /// - file_name: 源文件名（台账记录用）
    pub async fn import_product_rows(
        &self,
        rows: Vec<HashMap<String, String>>,
        column_mapping_json: &str,
        options: ImportOptions,
        actor: &Actor,
        file_name: &str,
    ) -> ApiResult<ImportApiResponse> {
        ensure_admin(actor)?;

        let mapping = ColumnMapping::from_json(column_mapping_json)?;
        let importer = self.create_importer().await?;

        let report = importer
            .import_rows(rows, mapping, options, actor, file_name)
            .await?;

        Ok(ImportApiResponse::from_report(report))
    }

    /// 分页查询导入历史（按创建时间倒序）
    ///
    /// # 参数
    /// - page: 页码（1 基；0 按 1 处理）
    /// - page_size: 每页记录数（None 时使用配置默认值；限制在 1-100）
    pub async fn list_import_history(
        &self,
        page: u32,
        page_size: Option<u32>,
        actor: &Actor,
    ) -> ApiResult<ImportHistoryResponse> {
        ensure_admin(actor)?;

        let (ledger_repo, config) = self.open_ledger_and_config()?;

        let page = page.max(1);
        let page_size = match page_size {
            Some(size) => size,
            None => config
                .get_default_page_size()
                .await
                .map_err(|e| ApiError::InternalError(e.to_string()))?,
        }
        .clamp(1, 100);

        let (entries, total) = ledger_repo.list_runs(page, page_size).await?;

        Ok(ImportHistoryResponse {
            entries,
            total,
            page,
            page_size,
        })
    }

    /// 按 ID 查询单条导入记录
    pub async fn get_import_run(&self, run_id: &str, actor: &Actor) -> ApiResult<ImportRun> {
        ensure_admin(actor)?;

        let (ledger_repo, _config) = self.open_ledger_and_config()?;

        ledger_repo
            .get_run(run_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("导入记录不存在: {}", run_id)))
    }

    /// 导入台账聚合统计
    pub async fn import_statistics(&self, actor: &Actor) -> ApiResult<ImportStatistics> {
        ensure_admin(actor)?;

        let (ledger_repo, _config) = self.open_ledger_and_config()?;
        Ok(ledger_repo.statistics().await?)
    }

    /// 清理超过保留期的台账记录
    ///
    /// # 返回
    /// - 删除的台账记录数
    pub async fn purge_expired_runs(&self, actor: &Actor) -> ApiResult<usize> {
        ensure_admin(actor)?;

        let (ledger_repo, config) = self.open_ledger_and_config()?;
        let retention_days = config
            .get_ledger_retention_days()
            .await
            .map_err(|e| ApiError::InternalError(e.to_string()))?;

        let purged = ledger_repo.purge_runs_older_than(retention_days).await?;

        tracing::info!(purged = purged, retention_days = retention_days, "台账清理完成");
        Ok(purged)
    }

    /// 创建ProductImporter实例（全部仓储共享同一连接）
    async fn create_importer(
        &self,
    ) -> ApiResult<ProductImporterImpl<ImportLedgerRepositoryImpl, ProductRepositoryImpl>> {
        let conn = self.open_shared_connection()?;

        let ledger_repo = ImportLedgerRepositoryImpl::from_connection(conn.clone());
        let product_repo = ProductRepositoryImpl::from_connection(conn.clone());
        let snapshot_repo = SnapshotRepository::new(conn.clone());
        let audit_repo = AuditLogRepository::new(conn.clone());

        let config = ConfigManager::from_connection(conn)
            .map_err(|e| ApiError::InternalError(format!("创建配置读取器失败: {}", e)))?;
        let batch_size = config
            .get_batch_size()
            .await
            .map_err(|e| ApiError::InternalError(e.to_string()))?;

        Ok(ProductImporterImpl::new(
            ledger_repo,
            product_repo,
            snapshot_repo,
            audit_repo,
            Box::new(UniversalFileParser),
            batch_size,
        ))
    }

    fn open_ledger_and_config(
        &self,
    ) -> ApiResult<(ImportLedgerRepositoryImpl, ConfigManager)> {
        let conn = self.open_shared_connection()?;
        let ledger_repo = ImportLedgerRepositoryImpl::from_connection(conn.clone());
        let config = ConfigManager::from_connection(conn)
            .map_err(|e| ApiError::InternalError(format!("创建配置读取器失败: {}", e)))?;
        Ok((ledger_repo, config))
    }

    fn open_shared_connection(&self) -> ApiResult<Arc<Mutex<Connection>>> {
        let conn = crate::db::open_sqlite_connection(&self.db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))
            .map_err(ApiError::from)?;
        Ok(Arc::new(Mutex::new(conn)))
    }
}
