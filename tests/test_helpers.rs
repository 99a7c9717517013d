// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、CSV fixture、行构造等功能
// ==========================================
#![allow(dead_code)]

use rusqlite::Connection;
use std::collections::HashMap;
use std::error::Error;
use std::io::Write;
use tempfile::NamedTempFile;
use wholesale_portal::domain::types::{Actor, Role};

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = Connection::open(&db_path)?;
    wholesale_portal::db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 管理员操作者
pub fn admin_actor() -> Actor {
    Actor {
        user_id: "admin-1".to_string(),
        role: Role::Admin,
        ip_address: "192.168.1.10".to_string(),
        user_agent: Some("portal-test".to_string()),
    }
}

/// 采购客户操作者（无管理权限）
pub fn buyer_actor() -> Actor {
    Actor {
        user_id: "buyer-1".to_string(),
        role: Role::Buyer,
        ip_address: "10.0.0.2".to_string(),
        user_agent: None,
    }
}

/// 标准列映射（目标字段 → 源列名，源列为荷兰语表头）
pub fn standard_mapping_json() -> String {
    r#"{
        "name": "Naam",
        "brand": "Merk",
        "content": "Inhoud",
        "ean": "EAN",
        "purchase_price": "Inkoopprijs",
        "retail_price": "Verkoopprijs",
        "stock_quantity": "Voorraad",
        "max_orderable_quantity": "MaxAantal",
        "star_rating": "Sterren",
        "category": "Categorie",
        "tags": "Labels"
    }"#
    .to_string()
}

/// 生成合法的 13 位 EAN（以序号结尾）
pub fn test_ean(seq: usize) -> String {
    format!("{:013}", 8710000000000usize + seq)
}

/// 构造一条合法的内存行（按源列名）
pub fn product_row(name: &str, ean: &str) -> HashMap<String, String> {
    let mut row = HashMap::new();
    row.insert("Naam".to_string(), name.to_string());
    row.insert("Merk".to_string(), "BronCo".to_string());
    row.insert("Inhoud".to_string(), "500ml".to_string());
    row.insert("EAN".to_string(), ean.to_string());
    row.insert("Inkoopprijs".to_string(), "0.45".to_string());
    row.insert("Verkoopprijs".to_string(), "1.29".to_string());
    row.insert("Voorraad".to_string(), "240".to_string());
    row
}

/// 构造 N 条合法行（EAN 按序号生成）
pub fn valid_rows(count: usize) -> Vec<HashMap<String, String>> {
    (1..=count)
        .map(|i| product_row(&format!("Product {}", i), &test_ean(i)))
        .collect()
}

/// 写入 CSV fixture 文件
pub fn write_csv_fixture(lines: &[&str]) -> NamedTempFile {
    let mut temp_file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    for line in lines {
        writeln!(temp_file, "{}", line).unwrap();
    }
    temp_file.flush().unwrap();
    temp_file
}

/// 统计商品总数
pub fn count_products(db_path: &str) -> i64 {
    let conn = Connection::open(db_path).unwrap();
    conn.query_row("SELECT COUNT(*) FROM product", [], |row| row.get(0))
        .unwrap()
}

/// 按 EAN 查询商品名称（不存在时 None）
pub fn product_name_by_ean(db_path: &str, ean: &str) -> Option<String> {
    let conn = Connection::open(db_path).unwrap();
    conn.query_row(
        "SELECT name FROM product WHERE ean = ?1",
        [ean],
        |row| row.get(0),
    )
    .ok()
}

/// 统计回滚记录数
pub fn count_rollbacks(db_path: &str) -> i64 {
    let conn = Connection::open(db_path).unwrap();
    conn.query_row("SELECT COUNT(*) FROM import_rollback", [], |row| row.get(0))
        .unwrap()
}

/// 统计审计日志数（按动作）
pub fn count_audit_entries(db_path: &str, action: &str) -> i64 {
    let conn = Connection::open(db_path).unwrap();
    conn.query_row(
        "SELECT COUNT(*) FROM audit_log WHERE action = ?1",
        [action],
        |row| row.get(0),
    )
    .unwrap()
}
