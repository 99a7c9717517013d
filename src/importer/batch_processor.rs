// ==========================================
// B2B 批发订货门户 - 批处理器实现
// ==========================================
// 职责: 按固定批宽切分行序列，批内并发、批间串行
// 约定:
// - 批内全部行先启动再统一等待结算（单线程协作式并发，
//   在每次持久化调用处挂起），在飞行中的行操作数以批宽为上限
// - 单行意外失败降级为 field="unknown" 的行级错误，不中断批次
// - 错误/警告中的行号始终为原始输入的 1 基位置（携带批起始偏移）
// ==========================================

use crate::domain::import::{RowError, RowWarning};
use crate::i18n::t;
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;
use tracing::warn;

// ==========================================
// RowOutcome - 单行处理结果
// ==========================================
#[derive(Debug)]
pub struct RowOutcome {
    pub success: bool,
    pub error: Option<RowError>,
    pub warnings: Vec<RowWarning>,
}

impl RowOutcome {
    /// 行已成功落库
    pub fn created(warnings: Vec<RowWarning>) -> Self {
        Self {
            success: true,
            error: None,
            warnings,
        }
    }

    /// 行被拒绝（校验失败/自然键重复）
    pub fn rejected(error: RowError) -> Self {
        Self {
            success: false,
            error: Some(error),
            warnings: Vec::new(),
        }
    }
}

// ==========================================
// RowProcessor Trait - 单行处理接口
// ==========================================
// 实现者: ProductRowProcessor（映射 → 校验 → 唯一性检查 → 落库）
#[async_trait]
pub trait RowProcessor: Send + Sync {
    /// 处理一行
    ///
    /// # 参数
    /// - row: 原始行（列名 → 值）
    /// - row_number: 原始输入中的 1 基行号
    ///
    /// # 返回
    /// - Ok(RowOutcome): 行级成败（校验拒绝属于 Ok）
    /// - Err: 意外失败（由批处理器降级为行级错误）
    async fn process_row(
        &self,
        row: &HashMap<String, String>,
        row_number: usize,
    ) -> ImportResult<RowOutcome>;
}

// ==========================================
// BatchTotals - 全量汇总
// ==========================================
#[derive(Debug, Default)]
pub struct BatchTotals {
    pub total_rows: usize,
    pub successful: usize,
    pub failed: usize,
    pub errors: Vec<RowError>,
    pub warnings: Vec<RowWarning>,
}

// ==========================================
// BatchProcessor - 批处理器
// ==========================================
pub struct BatchProcessor {
    batch_size: usize,
}

impl BatchProcessor {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    /// 处理全量行序列
    ///
    /// # 流程
    /// 1. 按输入顺序切分为连续批次
    /// 2. 批内: 全部行操作先启动，等待全部结算
    /// 3. 批间: 上一批全部结算后才开始下一批
    /// 4. 聚合: 成功/失败计数 + 按行序错误/警告列表
    pub async fn run<P: RowProcessor>(
        &self,
        rows: &[HashMap<String, String>],
        processor: &P,
    ) -> BatchTotals {
        let mut totals = BatchTotals {
            total_rows: rows.len(),
            ..Default::default()
        };

        for (batch_idx, batch) in rows.chunks(self.batch_size).enumerate() {
            let start_offset = batch_idx * self.batch_size;

            // 批内并发: 先全部启动，再统一等待结算
            let row_futures = batch.iter().enumerate().map(|(idx, row)| {
                let row_number = start_offset + idx + 1;
                async move { processor.process_row(row, row_number).await }
            });

            let settled = join_all(row_futures).await;

            // 按批内顺序聚合，保证错误列表与输入顺序一致
            for (idx, result) in settled.into_iter().enumerate() {
                let row_number = start_offset + idx + 1;
                match result {
                    Ok(outcome) => {
                        if outcome.success {
                            totals.successful += 1;
                        } else {
                            totals.failed += 1;
                            if let Some(error) = outcome.error {
                                totals.errors.push(error);
                            }
                        }
                        totals.warnings.extend(outcome.warnings);
                    }
                    Err(e) => {
                        // 意外失败: 降级为行级错误，不中断批次/全量处理
                        warn!(row = row_number, error = %e, "行处理意外失败");
                        totals.failed += 1;
                        totals.errors.push(RowError {
                            row: row_number,
                            field: "unknown".to_string(),
                            message: t("import.row_unknown_failure"),
                            data: serde_json::to_value(&batch[idx])
                                .unwrap_or(serde_json::Value::Null),
                        });
                    }
                }
            }
        }

        totals
    }
}
