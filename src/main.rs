// ==========================================
// B2B 批发订货门户 - CLI 主入口
// ==========================================
// 技术栈: Rust + SQLite
// 用途: 本地运维入口（导入 / 历史 / 统计 / 回滚 / 备份 / 清理）
// ==========================================

use std::path::PathBuf;

use wholesale_portal::domain::types::Actor;
use wholesale_portal::importer::ImportOptions;
use wholesale_portal::{logging, ImportApi, RollbackApi};

fn default_db_path() -> String {
    if let Ok(path) = std::env::var("WHOLESALE_PORTAL_DB") {
        return path;
    }

    let mut dir: PathBuf = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.push("wholesale-portal");
    if let Err(e) = std::fs::create_dir_all(&dir) {
        eprintln!("无法创建数据目录 {}: {}", dir.display(), e);
    }
    dir.push("portal.db");
    dir.to_string_lossy().to_string()
}

fn print_usage() {
    eprintln!("用法: wholesale-portal <命令> [参数]");
    eprintln!();
    eprintln!("命令:");
    eprintln!("  import <文件> <列映射JSON文件> [--overwrite]   批量导入商品");
    eprintln!("  history [页码]                                导入历史（倒序分页）");
    eprintln!("  stats                                         台账聚合统计");
    eprintln!("  preview <导入ID>                              回滚影响预览");
    eprintln!("  backup <导入ID>                               创建备份快照");
    eprintln!("  rollback <导入ID> [原因]                      回滚一次导入");
    eprintln!("  purge                                         清理超期台账记录");
}

#[tokio::main]
async fn main() {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 批量导入与回滚核心", wholesale_portal::APP_NAME);
    tracing::info!("系统版本: {}", wholesale_portal::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径并初始化
    let db_path = default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    match wholesale_portal::db::open_sqlite_connection(&db_path) {
        Ok(conn) => {
            if let Err(e) = wholesale_portal::db::init_schema(&conn) {
                eprintln!("数据库初始化失败: {}", e);
                std::process::exit(1);
            }
            match wholesale_portal::db::read_schema_version(&conn) {
                Ok(Some(v)) if v != wholesale_portal::db::CURRENT_SCHEMA_VERSION => {
                    tracing::warn!(
                        found = v,
                        expected = wholesale_portal::db::CURRENT_SCHEMA_VERSION,
                        "schema_version 与当前代码不一致"
                    );
                }
                Err(e) => tracing::warn!(error = %e, "schema_version 读取失败"),
                _ => {}
            }
        }
        Err(e) => {
            eprintln!("数据库连接失败: {}", e);
            std::process::exit(1);
        }
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let actor = Actor::system("cli");

    let result = match args.first().map(|s| s.as_str()) {
        Some("import") => run_import(&db_path, &args[1..], &actor).await,
        Some("history") => run_history(&db_path, &args[1..], &actor).await,
        Some("stats") => run_stats(&db_path, &actor).await,
        Some("preview") => run_preview(&db_path, &args[1..], &actor).await,
        Some("backup") => run_backup(&db_path, &args[1..], &actor).await,
        Some("rollback") => run_rollback(&db_path, &args[1..], &actor).await,
        Some("purge") => run_purge(&db_path, &actor).await,
        _ => {
            print_usage();
            std::process::exit(2);
        }
    };

    if let Err(e) = result {
        eprintln!("错误: {}", e);
        std::process::exit(1);
    }
}

async fn run_import(db_path: &str, args: &[String], actor: &Actor) -> Result<(), String> {
    let (file, mapping_file) = match (args.first(), args.get(1)) {
        (Some(f), Some(m)) => (f, m),
        _ => return Err("import 需要 <文件> 与 <列映射JSON文件>".to_string()),
    };
    let overwrite = args.iter().any(|a| a == "--overwrite");

    let mapping_json =
        std::fs::read_to_string(mapping_file).map_err(|e| format!("读取列映射失败: {}", e))?;

    let api = ImportApi::new(db_path.to_string());
    let response = api
        .import_products_from_file(
            file,
            &mapping_json,
            ImportOptions {
                overwrite_existing: overwrite,
            },
            actor,
        )
        .await
        .map_err(|e| e.to_string())?;

    println!("导入批次: {}", response.import_id);
    println!(
        "状态: {}  总行数: {}  成功: {}  失败: {}  耗时: {}ms",
        response.status,
        response.total_rows,
        response.successful_rows,
        response.failed_rows,
        response.processing_time_ms
    );
    for error in &response.errors {
        println!("  行 {} [{}]: {}", error.row, error.field, error.message);
    }
    for warning in &response.warnings {
        println!("  行 {} [{}] 警告: {}", warning.row, warning.field, warning.message);
    }

    Ok(())
}

async fn run_history(db_path: &str, args: &[String], actor: &Actor) -> Result<(), String> {
    let page = args
        .first()
        .and_then(|p| p.parse::<u32>().ok())
        .unwrap_or(1);

    let api = ImportApi::new(db_path.to_string());
    let history = api
        .list_import_history(page, None, actor)
        .await
        .map_err(|e| e.to_string())?;

    println!(
        "导入历史（第 {} 页，每页 {}，共 {} 条）",
        history.page, history.page_size, history.total
    );
    for run in &history.entries {
        println!(
            "  {}  {}  {}  总 {} / 成功 {} / 失败 {}  by {}",
            run.created_at.format("%Y-%m-%d %H:%M:%S"),
            run.run_id,
            run.status.as_str(),
            run.total_rows,
            run.success_rows,
            run.failed_rows,
            run.imported_by
        );
    }

    Ok(())
}

async fn run_stats(db_path: &str, actor: &Actor) -> Result<(), String> {
    let api = ImportApi::new(db_path.to_string());
    let stats = api
        .import_statistics(actor)
        .await
        .map_err(|e| e.to_string())?;

    println!("批次总数: {}", stats.total_runs);
    println!("累计成功导入行数: {}", stats.total_rows_imported);
    println!("平均成功率（粗口径）: {:.1}", stats.average_success_rate);

    Ok(())
}

async fn run_preview(db_path: &str, args: &[String], actor: &Actor) -> Result<(), String> {
    let import_id = args.first().ok_or("preview 需要 <导入ID>")?;

    let api = RollbackApi::new(db_path.to_string());
    let preview = api
        .preview_rollback(import_id, actor)
        .await
        .map_err(|e| e.to_string())?;

    println!("商品总数: {}", preview.total_products);
    println!("归属该导入的商品数: {}", preview.attributable_products);
    println!(
        "快照: {}（{} 个实体）",
        if preview.snapshot_present { "有" } else { "无" },
        preview.snapshot_entities
    );
    println!("已回滚: {}", if preview.already_rolled_back { "是" } else { "否" });
    for warning in &preview.warnings {
        println!("  提示: {}", warning);
    }

    Ok(())
}

async fn run_backup(db_path: &str, args: &[String], actor: &Actor) -> Result<(), String> {
    let import_id = args.first().ok_or("backup 需要 <导入ID>")?;

    let api = RollbackApi::new(db_path.to_string());
    let response = api
        .create_backup(import_id, actor)
        .await
        .map_err(|e| e.to_string())?;

    println!("{}", response.message);
    if let Some(backup_id) = response.backup_id {
        println!("快照ID: {}", backup_id);
    }

    Ok(())
}

async fn run_rollback(db_path: &str, args: &[String], actor: &Actor) -> Result<(), String> {
    let import_id = args.first().ok_or("rollback 需要 <导入ID>")?;
    let reason = if args.len() > 1 {
        Some(args[1..].join(" "))
    } else {
        None
    };

    let api = RollbackApi::new(db_path.to_string());
    let response = api
        .rollback_import(import_id, reason.as_deref(), actor)
        .await
        .map_err(|e| e.to_string())?;

    println!("{}", response.message);
    println!("回滚记录: {}", response.rollback.rollback_id);

    Ok(())
}

async fn run_purge(db_path: &str, actor: &Actor) -> Result<(), String> {
    let api = ImportApi::new(db_path.to_string());
    let purged = api
        .purge_expired_runs(actor)
        .await
        .map_err(|e| e.to_string())?;

    println!("已清理台账记录: {}", purged);
    Ok(())
}
