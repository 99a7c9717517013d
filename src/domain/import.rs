// ==========================================
// B2B 批发订货门户 - 导入领域模型
// ==========================================
// 职责: 导入台账实体与逐行结果结构
// ==========================================

use crate::domain::types::ImportStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;

// ==========================================
// ImportRun - 导入台账记录
// ==========================================
// 用途: 每次上传一条，审计与回滚的锚点
// 红线: 创建后不可变（回滚关联除外）
// 对齐: import_run 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRun {
    pub run_id: String,             // 导入批次 ID（UUID）
    pub imported_by: String,        // 发起人用户 ID
    pub file_name: String,          // 源文件名
    pub total_rows: i64,            // 总行数
    pub success_rows: i64,          // 成功行数
    pub failed_rows: i64,           // 失败行数
    pub elapsed_ms: i64,            // 处理耗时（毫秒）
    pub status: ImportStatus,       // SUCCESS / PARTIAL / FAILED
    pub errors_json: Option<String>, // 序列化错误列表（为空时 NULL）
    pub warnings_json: Option<String>, // 序列化警告列表（为空时 NULL）
    pub created_at: DateTime<Utc>,  // 创建时间
}

impl ImportRun {
    /// 由逐行处理结果构造台账记录（状态按成功/失败派生）
    #[allow(clippy::too_many_arguments)]
    pub fn from_outcome(
        run_id: String,
        imported_by: String,
        file_name: String,
        total_rows: i64,
        success_rows: i64,
        failed_rows: i64,
        elapsed_ms: i64,
        errors: &[RowError],
        warnings: &[RowWarning],
    ) -> Self {
        let errors_json = if errors.is_empty() {
            None
        } else {
            serde_json::to_string(errors).ok()
        };
        let warnings_json = if warnings.is_empty() {
            None
        } else {
            serde_json::to_string(warnings).ok()
        };

        Self {
            run_id,
            imported_by,
            file_name,
            total_rows,
            success_rows,
            failed_rows,
            elapsed_ms,
            status: ImportStatus::derive(success_rows, failed_rows),
            errors_json,
            warnings_json,
            created_at: Utc::now(),
        }
    }
}

// ==========================================
// RowError - 逐行错误
// ==========================================
// 用途: 导入结果中的行级错误条目（不单独落库，随台账序列化）
// 约定: row 为原始输入中的 1 基行号，与分批无关
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowError {
    pub row: usize,      // 原始输入 1 基行号
    pub field: String,   // 出错字段名（未知时为 "unknown"）
    pub message: String, // 本地化错误消息
    pub data: JsonValue, // 原始行数据（诊断用）
}

// ==========================================
// RowWarning - 逐行警告
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowWarning {
    pub row: usize,
    pub field: String,
    pub message: String,
}

// ==========================================
// ImportReport - 单次导入的完整结果
// ==========================================
// 用途: 导入器返回给 API 层的汇总
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub run: ImportRun,
    pub errors: Vec<RowError>,
    pub warnings: Vec<RowWarning>,
    pub elapsed: Duration,
}

// ==========================================
// ImportStatistics - 台账聚合统计
// ==========================================
// 说明: average_success_rate 为「累计成功行数 / 批次数」的粗口径，
//       与单批成功率无关（沿用既有口径）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportStatistics {
    pub total_runs: i64,            // 批次总数
    pub total_rows_imported: i64,   // 累计成功导入行数
    pub average_success_rate: f64,  // 成功行数 / 批次数 × 100
    pub recent_runs: Vec<ImportRun>, // 最近 5 次导入
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_outcome_derives_status_and_json() {
        let errors = vec![RowError {
            row: 2,
            field: "ean".to_string(),
            message: "bad".to_string(),
            data: serde_json::json!({}),
        }];

        let run = ImportRun::from_outcome(
            "r1".to_string(),
            "admin".to_string(),
            "products.csv".to_string(),
            3,
            2,
            1,
            12,
            &errors,
            &[],
        );

        assert_eq!(run.status, ImportStatus::Partial);
        assert!(run.errors_json.is_some());
        assert!(run.warnings_json.is_none());
        assert_eq!(run.success_rows + run.failed_rows, run.total_rows);
    }

    #[test]
    fn test_from_outcome_all_success() {
        let run = ImportRun::from_outcome(
            "r2".to_string(),
            "admin".to_string(),
            "products.csv".to_string(),
            5,
            5,
            0,
            3,
            &[],
            &[],
        );

        assert_eq!(run.status, ImportStatus::Success);
        assert!(run.errors_json.is_none());
    }
}
