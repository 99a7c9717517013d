// ==========================================
// B2B 批发订货门户 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取批处理批宽
    ///
    /// # 返回
    /// - usize: 单批并发处理的行数上限
    ///
    /// # 默认值
    /// - 50
    async fn get_batch_size(&self) -> Result<usize, Box<dyn Error>>;

    /// 获取导入历史默认分页大小
    ///
    /// # 默认值
    /// - 10
    async fn get_default_page_size(&self) -> Result<u32, Box<dyn Error>>;

    /// 获取导入台账保留天数
    ///
    /// # 返回
    /// - i64: 保留天数（超期批次可清理）
    ///
    /// # 默认值
    /// - 90
    async fn get_ledger_retention_days(&self) -> Result<i64, Box<dyn Error>>;
}

/// 配置键常量
pub mod config_keys {
    /// 批处理批宽
    pub const IMPORT_BATCH_SIZE: &str = "import_batch_size";
    /// 导入历史默认分页大小
    pub const IMPORT_DEFAULT_PAGE_SIZE: &str = "import_default_page_size";
    /// 导入台账保留天数
    pub const IMPORT_LEDGER_RETENTION_DAYS: &str = "import_ledger_retention_days";
}
