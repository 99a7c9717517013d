// ==========================================
// B2B 批发订货门户 - 商品导入器实现
// ==========================================
// 职责: 整合导入流程，从文件/行序列到数据库
// 流程: 解析 → 前像捕获 → 分批(映射→校验→唯一性→落库) → 台账 → 快照 → 审计
// ==========================================

use crate::domain::import::{ImportReport, ImportRun, RowError, RowWarning};
use crate::domain::rollback::Snapshot;
use crate::domain::types::{Actor, AuditAction, EntityType};
use crate::domain::AuditLogEntry;
use crate::i18n::t_with_args;
use crate::importer::batch_processor::{BatchProcessor, RowOutcome, RowProcessor};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::product_importer::{
    display_file_name, FileParser, ImportOptions, ProductImporter,
};
use crate::importer::row_mapper::{ColumnMapping, RowMapper};
use crate::importer::row_validator::RowValidator;
use crate::repository::audit_log_repo::AuditLogRepository;
use crate::repository::import_ledger_repo::ImportLedgerRepository;
use crate::repository::product_repo::ProductRepository;
use crate::repository::snapshot_repo::SnapshotRepository;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, instrument};
use uuid::Uuid;

// ==========================================
// ProductRowProcessor - 单行处理（映射 → 校验 → 唯一性 → 落库）
// ==========================================
struct ProductRowProcessor<'a, P: ProductRepository> {
    mapper: RowMapper,
    validator: &'a RowValidator,
    product_repo: &'a P,
    run_id: &'a str,
    overwrite: bool,
}

#[async_trait]
impl<P: ProductRepository> RowProcessor for ProductRowProcessor<'_, P> {
    async fn process_row(
        &self,
        row: &HashMap<String, String>,
        row_number: usize,
    ) -> ImportResult<RowOutcome> {
        // 阶段 1: 字段投影（纯重命名，无校验）
        let mapped = self.mapper.map_row(row);

        // 阶段 2: 字段顺序校验（首个失败字段即终止）
        let (draft, field_warnings) = match self.validator.validate(&mapped) {
            Ok(result) => result,
            Err(e) => {
                return Ok(RowOutcome::rejected(RowError {
                    row: row_number,
                    field: e.field.to_string(),
                    message: e.message,
                    data: serde_json::to_value(row).unwrap_or(serde_json::Value::Null),
                }));
            }
        };

        let warnings: Vec<RowWarning> = field_warnings
            .into_iter()
            .map(|w| RowWarning {
                row: row_number,
                field: w.field.to_string(),
                message: w.message,
            })
            .collect();

        // 阶段 3: 自然键唯一性检查（非覆盖模式下重复即拒绝，绝不合并）
        if !self.overwrite && self.product_repo.exists_by_ean(&draft.ean).await? {
            return Ok(RowOutcome::rejected(RowError {
                row: row_number,
                field: "ean".to_string(),
                message: t_with_args("validation.duplicate_ean", &[("ean", &draft.ean)]),
                data: serde_json::to_value(&draft).unwrap_or(serde_json::Value::Null),
            }));
        }

        // 阶段 4: 落库（两项检查都通过后才持久化）
        let product = draft.into_product(self.run_id);
        if self.overwrite {
            self.product_repo.upsert(&product).await?;
        } else {
            self.product_repo.insert(&product).await?;
        }

        Ok(RowOutcome::created(warnings))
    }
}

// ==========================================
// ProductImporterImpl - 商品导入器实现
// ==========================================
pub struct ProductImporterImpl<L, P>
where
    L: ImportLedgerRepository,
    P: ProductRepository,
{
    // 数据访问层
    ledger_repo: L,
    product_repo: P,
    snapshot_repo: SnapshotRepository,
    audit_repo: AuditLogRepository,

    // 导入组件
    file_parser: Box<dyn FileParser>,
    validator: RowValidator,
    batch_size: usize,
}

impl<L, P> ProductImporterImpl<L, P>
where
    L: ImportLedgerRepository,
    P: ProductRepository,
{
    /// 创建新的 ProductImporter 实例
    ///
    /// # 参数
    /// - ledger_repo: 导入台账仓储
    /// - product_repo: 商品仓储
    /// - snapshot_repo: 快照仓储
    /// - audit_repo: 审计日志仓储
    /// - file_parser: 文件解析器
    /// - batch_size: 批宽
    pub fn new(
        ledger_repo: L,
        product_repo: P,
        snapshot_repo: SnapshotRepository,
        audit_repo: AuditLogRepository,
        file_parser: Box<dyn FileParser>,
        batch_size: usize,
    ) -> Self {
        Self {
            ledger_repo,
            product_repo,
            snapshot_repo,
            audit_repo,
            file_parser,
            validator: RowValidator,
            batch_size,
        }
    }

    /// 收集行序列中映射到 ean 字段的候选值（前像捕获用）
    fn candidate_eans(rows: &[HashMap<String, String>], mapping: &ColumnMapping) -> Vec<String> {
        let Some(ean_column) = mapping.source_column("ean") else {
            return Vec::new();
        };

        let mut eans: Vec<String> = rows
            .iter()
            .filter_map(|row| row.get(ean_column))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        eans.sort();
        eans.dedup();
        eans
    }
}

#[async_trait]
impl<L, P> ProductImporter for ProductImporterImpl<L, P>
where
    L: ImportLedgerRepository + Send + Sync,
    P: ProductRepository + Send + Sync,
{
    #[instrument(skip(self, rows, mapping, actor), fields(run_id))]
    async fn import_rows(
        &self,
        rows: Vec<HashMap<String, String>>,
        mapping: ColumnMapping,
        options: ImportOptions,
        actor: &Actor,
        file_name: &str,
    ) -> ImportResult<ImportReport> {
        let start_time = Instant::now();
        let run_id = Uuid::new_v4().to_string();

        info!(run_id = %run_id, file_name = %file_name, total_rows = rows.len(), "开始批量导入商品");

        // === 步骤 1: 批次级输入检查 ===
        if rows.is_empty() {
            return Err(ImportError::EmptyDataset);
        }

        // === 步骤 2: 前像捕获 ===
        // 在任何破坏性写入前，捕获本次导入可能触达的既有商品（按候选 EAN）。
        // 空集合也是一次完整捕获：全新导入的前像本来就是空。
        debug!("步骤 2: 捕获前像快照");
        let eans = Self::candidate_eans(&rows, &mapping);
        let pre_image = self.product_repo.find_by_eans(&eans).await?;
        debug!(captured = pre_image.len(), "前像捕获完成");

        // === 步骤 3: 分批处理 ===
        debug!("步骤 3: 分批处理行序列");
        let processor = ProductRowProcessor {
            mapper: RowMapper::new(mapping),
            validator: &self.validator,
            product_repo: &self.product_repo,
            run_id: &run_id,
            overwrite: options.overwrite_existing,
        };
        let totals = BatchProcessor::new(self.batch_size)
            .run(&rows, &processor)
            .await;
        info!(
            success = totals.successful,
            failed = totals.failed,
            "分批处理完成"
        );

        let elapsed = start_time.elapsed();

        // === 步骤 4: 写入导入台账 ===
        let run = ImportRun::from_outcome(
            run_id.clone(),
            actor.user_id.clone(),
            file_name.to_string(),
            totals.total_rows as i64,
            totals.successful as i64,
            totals.failed as i64,
            elapsed.as_millis() as i64,
            &totals.errors,
            &totals.warnings,
        );
        self.ledger_repo.create_run(&run).await?;

        // === 步骤 5: 持久化前像快照（内容在步骤 2 捕获）===
        let snapshot = Snapshot::capture(&run_id, EntityType::Product, &pre_image)
            .map_err(|e| ImportError::InternalError(format!("快照序列化失败: {}", e)))?;
        self.snapshot_repo.insert(&snapshot)?;

        // === 步骤 6: 审计日志 ===
        let audit = AuditLogEntry::for_import_run(actor, AuditAction::Import, &run_id)
            .with_detail(&serde_json::json!({
                "file_name": file_name,
                "total_rows": run.total_rows,
                "success_rows": run.success_rows,
                "failed_rows": run.failed_rows,
                "status": run.status.as_str(),
                "overwrite_existing": options.overwrite_existing,
            }));
        self.audit_repo.insert(&audit)?;

        info!(
            run_id = %run_id,
            total = run.total_rows,
            success = run.success_rows,
            failed = run.failed_rows,
            status = run.status.as_str(),
            elapsed_ms = elapsed.as_millis(),
            "商品导入完成"
        );

        Ok(ImportReport {
            run,
            errors: totals.errors,
            warnings: totals.warnings,
            elapsed,
        })
    }

    async fn import_from_file(
        &self,
        file_path: &Path,
        mapping: ColumnMapping,
        options: ImportOptions,
        actor: &Actor,
    ) -> ImportResult<ImportReport> {
        let file_name = display_file_name(file_path)?;

        debug!(file = %file_path.display(), "解析导入文件");
        let rows = self.file_parser.parse_to_raw_rows(file_path)?;

        self.import_rows(rows, mapping, options, actor, &file_name)
            .await
    }
}
