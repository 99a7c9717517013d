// ==========================================
// B2B 批发订货门户 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::{config_keys, ImportConfigReader};
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 默认批宽
pub const DEFAULT_IMPORT_BATCH_SIZE: usize = 50;
/// 默认分页大小
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// 默认台账保留天数
pub const DEFAULT_LEDGER_RETENTION_DAYS: i64 = 90;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;

        Ok(())
    }

    /// 读取并解析数值配置；缺失或非法时回落默认值
    fn get_parsed_or<T: std::str::FromStr + PartialOrd>(
        &self,
        key: &str,
        default: T,
        min: T,
    ) -> Result<T, Box<dyn Error>> {
        let value = self
            .get_config_value(key)?
            .and_then(|v| v.trim().parse::<T>().ok())
            .filter(|v| *v >= min)
            .unwrap_or(default);
        Ok(value)
    }
}

#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_batch_size(&self) -> Result<usize, Box<dyn Error>> {
        self.get_parsed_or(config_keys::IMPORT_BATCH_SIZE, DEFAULT_IMPORT_BATCH_SIZE, 1)
    }

    async fn get_default_page_size(&self) -> Result<u32, Box<dyn Error>> {
        self.get_parsed_or(config_keys::IMPORT_DEFAULT_PAGE_SIZE, DEFAULT_PAGE_SIZE, 1)
    }

    async fn get_ledger_retention_days(&self) -> Result<i64, Box<dyn Error>> {
        self.get_parsed_or(
            config_keys::IMPORT_LEDGER_RETENTION_DAYS,
            DEFAULT_LEDGER_RETENTION_DAYS,
            1,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn test_manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_when_unset() {
        let config = test_manager();

        assert_eq!(config.get_batch_size().await.unwrap(), 50);
        assert_eq!(config.get_default_page_size().await.unwrap(), 10);
        assert_eq!(config.get_ledger_retention_days().await.unwrap(), 90);
    }

    #[tokio::test]
    async fn test_override_and_invalid_fallback() {
        let config = test_manager();

        config
            .set_global_config_value(config_keys::IMPORT_BATCH_SIZE, "25")
            .unwrap();
        assert_eq!(config.get_batch_size().await.unwrap(), 25);

        // 非法值回落默认
        config
            .set_global_config_value(config_keys::IMPORT_BATCH_SIZE, "0")
            .unwrap();
        assert_eq!(config.get_batch_size().await.unwrap(), 50);

        config
            .set_global_config_value(config_keys::IMPORT_BATCH_SIZE, "veel")
            .unwrap();
        assert_eq!(config.get_batch_size().await.unwrap(), 50);
    }
}
