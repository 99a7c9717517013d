// ==========================================
// B2B 批发订货门户 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换底层错误为用户友好的错误消息
// 语义: NotFound ≈ 404，InvalidInput/BusinessRuleViolation ≈ 400，
//       Unauthorized ≈ 401，其余 ≈ 500
// ==========================================

use crate::engine::rollback_engine::RollbackError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
/// 所有错误信息必须包含显式原因（可解释性）
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 鉴权错误
    // ==========================================
    #[error("无权限: {0}")]
    Unauthorized(String),

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将仓储层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::SerializationError(msg) => ApiError::InternalError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// 批次级输入错误归为 InvalidInput（任何行处理前拒绝）
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::EmptyDataset
            | ImportError::InvalidColumnMapping(_)
            | ImportError::FileNotFound(_)
            | ImportError::UnsupportedFormat(_) => ApiError::InvalidInput(err.to_string()),
            ImportError::RepositoryError(repo_err) => repo_err.into(),
            ImportError::Other(e) => ApiError::Other(e),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

// ==========================================
// 从 RollbackError 转换
// 前置条件错误: 资源缺失 ≈ 404，状态冲突 ≈ 400
// ==========================================
impl From<RollbackError> for ApiError {
    fn from(err: RollbackError) -> Self {
        match err {
            RollbackError::RunNotFound(_) | RollbackError::NoSnapshot(_) => {
                ApiError::NotFound(err.to_string())
            }
            RollbackError::AlreadyRolledBack(_) | RollbackError::SnapshotExists(_) => {
                ApiError::InvalidInput(err.to_string())
            }
            RollbackError::SnapshotCorrupted(msg) => ApiError::InternalError(msg),
            RollbackError::Repository(repo_err) => repo_err.into(),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "ImportRun".to_string(),
            id: "r-404".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("ImportRun"));
                assert!(msg.contains("r-404"));
            }
            _ => panic!("Expected NotFound"),
        }
    }

    #[test]
    fn test_rollback_precondition_mapping() {
        let api_err: ApiError = RollbackError::RunNotFound("x".to_string()).into();
        assert!(matches!(api_err, ApiError::NotFound(_)));

        let api_err: ApiError = RollbackError::AlreadyRolledBack("x".to_string()).into();
        assert!(matches!(api_err, ApiError::InvalidInput(_)));

        let api_err: ApiError = RollbackError::NoSnapshot("x".to_string()).into();
        assert!(matches!(api_err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_import_error_mapping() {
        let api_err: ApiError = ImportError::EmptyDataset.into();
        assert!(matches!(api_err, ApiError::InvalidInput(_)));

        let api_err: ApiError = ImportError::CsvParseError("kapot".to_string()).into();
        assert!(matches!(api_err, ApiError::ImportError(_)));
    }
}
