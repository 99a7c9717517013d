// ==========================================
// 集成测试 - 导入 API 层（鉴权、批次级输入、台账查询）
// ==========================================
// 覆盖范围: ImportApi 鉴权门禁、批次级错误、历史分页、聚合统计、台账清理
// ==========================================

mod test_helpers;

use test_helpers::*;
use wholesale_portal::api::ApiError;
use wholesale_portal::importer::ImportOptions;
use wholesale_portal::{logging, ImportApi};

// ==========================================
// 测试用例 1: 鉴权在任何行处理前短路
// ==========================================

#[tokio::test]
async fn test_non_admin_rejected_before_processing() {
    logging::init_test();

    let (_temp_db, db_path) = create_test_db().expect("Failed to create test db");
    let api = ImportApi::new(db_path.clone());

    let result = api
        .import_product_rows(
            valid_rows(3),
            &standard_mapping_json(),
            ImportOptions::default(),
            &buyer_actor(),
            "verboden.csv",
        )
        .await;

    assert!(matches!(result, Err(ApiError::Unauthorized(_))));

    // 未处理任何行: 无商品、无台账
    assert_eq!(count_products(&db_path), 0);
    let history = api
        .list_import_history(1, None, &admin_actor())
        .await
        .unwrap();
    assert_eq!(history.total, 0);

    // 查询类接口同样拒绝非管理员
    let stats = api.import_statistics(&buyer_actor()).await;
    assert!(matches!(stats, Err(ApiError::Unauthorized(_))));
}

// ==========================================
// 测试用例 2: 批次级输入错误在任何行处理前拒绝
// ==========================================

#[tokio::test]
async fn test_run_level_input_errors() {
    logging::init_test();

    let (_temp_db, db_path) = create_test_db().expect("Failed to create test db");
    let api = ImportApi::new(db_path.clone());

    // 空数据集
    let empty = api
        .import_product_rows(
            Vec::new(),
            &standard_mapping_json(),
            ImportOptions::default(),
            &admin_actor(),
            "leeg.csv",
        )
        .await;
    assert!(matches!(empty, Err(ApiError::InvalidInput(_))));

    // 列映射 JSON 非法
    let bad_mapping = api
        .import_product_rows(
            valid_rows(1),
            "{kapot",
            ImportOptions::default(),
            &admin_actor(),
            "kapot.csv",
        )
        .await;
    assert!(matches!(bad_mapping, Err(ApiError::InvalidInput(_))));

    // 文件不存在
    let missing_file = api
        .import_products_from_file(
            "/nonexistent/products.csv",
            &standard_mapping_json(),
            ImportOptions::default(),
            &admin_actor(),
        )
        .await;
    assert!(matches!(missing_file, Err(ApiError::InvalidInput(_))));

    // 任何批次级错误都不得留下台账记录或商品
    assert_eq!(count_products(&db_path), 0);
    let history = api
        .list_import_history(1, None, &admin_actor())
        .await
        .unwrap();
    assert_eq!(history.total, 0);
}

// ==========================================
// 测试用例 3: 历史分页按创建时间倒序
// ==========================================

#[tokio::test]
async fn test_history_pagination_newest_first() {
    logging::init_test();

    let (_temp_db, db_path) = create_test_db().expect("Failed to create test db");
    let api = ImportApi::new(db_path.clone());

    // 三次导入（EAN 分段避免重复）
    for batch in 0..3usize {
        let rows = vec![product_row(
            &format!("Batch {}", batch),
            &test_ean(batch * 10 + 1),
        )];
        api.import_product_rows(
            rows,
            &standard_mapping_json(),
            ImportOptions::default(),
            &admin_actor(),
            &format!("batch-{}.csv", batch),
        )
        .await
        .unwrap();
    }

    let page1 = api
        .list_import_history(1, Some(2), &admin_actor())
        .await
        .unwrap();

    assert_eq!(page1.total, 3);
    assert_eq!(page1.entries.len(), 2);
    // 倒序: 第一条是最后一次导入
    assert_eq!(page1.entries[0].file_name, "batch-2.csv");
    assert!(page1.entries[0].created_at >= page1.entries[1].created_at);

    let page2 = api
        .list_import_history(2, Some(2), &admin_actor())
        .await
        .unwrap();
    assert_eq!(page2.entries.len(), 1);
    assert_eq!(page2.entries[0].file_name, "batch-0.csv");
}

// ==========================================
// 测试用例 4: 聚合统计粗口径
// ==========================================

#[tokio::test]
async fn test_statistics_crude_success_rate() {
    logging::init_test();

    let (_temp_db, db_path) = create_test_db().expect("Failed to create test db");
    let api = ImportApi::new(db_path.clone());

    // 批次 1: 2 行全成功
    api.import_product_rows(
        vec![
            product_row("A", &test_ean(1)),
            product_row("B", &test_ean(2)),
        ],
        &standard_mapping_json(),
        ImportOptions::default(),
        &admin_actor(),
        "a.csv",
    )
    .await
    .unwrap();

    // 批次 2: 1 行成功 1 行失败
    let mut rows = vec![
        product_row("C", &test_ean(3)),
        product_row("D", &test_ean(4)),
    ];
    rows[1].insert("EAN".to_string(), "12".to_string());
    api.import_product_rows(
        rows,
        &standard_mapping_json(),
        ImportOptions::default(),
        &admin_actor(),
        "b.csv",
    )
    .await
    .unwrap();

    let stats = api.import_statistics(&admin_actor()).await.unwrap();

    assert_eq!(stats.total_runs, 2);
    assert_eq!(stats.total_rows_imported, 3);
    // 粗口径: 3 行 / 2 批 × 100 = 150.0
    assert!((stats.average_success_rate - 150.0).abs() < f64::EPSILON);
    assert_eq!(stats.recent_runs.len(), 2);
}

// ==========================================
// 测试用例 5: 台账清理（保留期内记录不受影响）
// ==========================================

#[tokio::test]
async fn test_purge_keeps_recent_runs() {
    logging::init_test();

    let (_temp_db, db_path) = create_test_db().expect("Failed to create test db");
    let api = ImportApi::new(db_path.clone());

    api.import_product_rows(
        vec![product_row("Vers", &test_ean(1))],
        &standard_mapping_json(),
        ImportOptions::default(),
        &admin_actor(),
        "vers.csv",
    )
    .await
    .unwrap();

    // 默认保留期 90 天: 刚导入的记录不应被清理
    let purged = api.purge_expired_runs(&admin_actor()).await.unwrap();
    assert_eq!(purged, 0);

    let history = api
        .list_import_history(1, None, &admin_actor())
        .await
        .unwrap();
    assert_eq!(history.total, 1);
}

// ==========================================
// 测试用例 6: 单条台账查询
// ==========================================

#[tokio::test]
async fn test_get_import_run() {
    logging::init_test();

    let (_temp_db, db_path) = create_test_db().expect("Failed to create test db");
    let api = ImportApi::new(db_path.clone());

    let response = api
        .import_product_rows(
            vec![product_row("A", &test_ean(1))],
            &standard_mapping_json(),
            ImportOptions::default(),
            &admin_actor(),
            "a.csv",
        )
        .await
        .unwrap();

    let run = api
        .get_import_run(&response.import_id, &admin_actor())
        .await
        .unwrap();
    assert_eq!(run.file_name, "a.csv");
    assert_eq!(run.imported_by, "admin-1");

    let missing = api.get_import_run("geen-run", &admin_actor()).await;
    assert!(matches!(missing, Err(ApiError::NotFound(_))));
}
