use lakegate_db::{open_connection, paginate, with_connection, LakeMode, LakeSettings, Pagination};
use std::path::Path;

/// Settings rooted in `root` whose catalog extension points at a file that
/// does not exist, so the attach step always fails without touching the network.
fn fallback_settings(root: &Path) -> LakeSettings {
    let mut settings = LakeSettings::new(
        root.join("lake/ducklake.db"),
        root.join("lake/catalog.duckdb"),
        root.join("lake/data"),
    );
    settings.extension = root
        .join("missing.duckdb_extension")
        .display()
        .to_string();
    settings.seed_csv = root.join("currency.csv");
    settings
}

fn write_currency_csv(path: &Path) {
    std::fs::write(
        path,
        "code,name,rate\nUSD,US Dollar,1.0\nEUR,Euro,0.92\nJPY,Japanese Yen,151.3\n",
    )
    .expect("failed to write csv");
}

#[test]
fn fallback_without_csv_yields_empty_database() {
    let dir = tempfile::tempdir().unwrap();
    let settings = fallback_settings(dir.path());

    let conn = open_connection(&settings).expect("open should succeed despite attach failure");
    assert_eq!(conn.mode(), LakeMode::Fallback { seeded: false });
    conn.ping().expect("ping should succeed");
    assert!(conn.list_tables().unwrap().is_empty());
    conn.close().expect("close should succeed");

    assert!(settings.db_path.exists(), "database file is created");
    assert!(settings.data_path.is_dir(), "data directory is created");
}

#[test]
fn fallback_with_csv_seeds_currency_table() {
    let dir = tempfile::tempdir().unwrap();
    let settings = fallback_settings(dir.path());
    write_currency_csv(&settings.seed_csv);

    let tables = with_connection(&settings, |conn| {
        assert_eq!(conn.mode(), LakeMode::Fallback { seeded: true });
        conn.list_tables()
    })
    .unwrap();
    assert_eq!(tables, vec!["currency".to_string()]);

    let outcome = with_connection(&settings, |conn| {
        conn.execute_query(&paginate(
            "SELECT code, name FROM currency ORDER BY code",
            Pagination::new(Some(2), Some(1)).unwrap(),
        ))
    })
    .unwrap();
    assert_eq!(
        outcome.query,
        "SELECT code, name FROM currency ORDER BY code LIMIT 2 OFFSET 1"
    );
    assert_eq!(outcome.row_count(), 2);
    assert_eq!(outcome.rows[0], vec![serde_json::json!("JPY"), serde_json::json!("Japanese Yen")]);
    assert_eq!(outcome.rows[1][0], serde_json::json!("USD"));
}

#[test]
fn reopening_keeps_seeded_table_without_duplicating_rows() {
    let dir = tempfile::tempdir().unwrap();
    let settings = fallback_settings(dir.path());
    write_currency_csv(&settings.seed_csv);

    for _ in 0..2 {
        with_connection(&settings, |_| Ok(())).unwrap();
    }

    let outcome = with_connection(&settings, |conn| {
        conn.execute_query("SELECT count(*) FROM currency")
    })
    .unwrap();
    assert_eq!(outcome.rows, vec![vec![serde_json::json!(3)]]);
}

#[test]
fn missing_table_error_carries_engine_message() {
    let dir = tempfile::tempdir().unwrap();
    let settings = fallback_settings(dir.path());

    let err = with_connection(&settings, |conn| {
        conn.execute_query("SELECT * FROM no_such_table")
    })
    .expect_err("query against a missing table must fail");

    assert!(!err.is_connection_failure());
    assert!(err.to_string().contains("no_such_table"), "{err}");
}

#[test]
fn unopenable_database_path_is_a_connection_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = fallback_settings(dir.path());
    // A directory cannot be opened as a database file.
    settings.db_path = dir.path().to_path_buf();

    let err = open_connection(&settings).expect_err("opening a directory must fail");
    assert!(err.is_connection_failure(), "{err}");
}

#[test]
fn null_columns_keep_their_position() {
    let dir = tempfile::tempdir().unwrap();
    let settings = fallback_settings(dir.path());

    let outcome = with_connection(&settings, |conn| {
        conn.execute_query("SELECT NULL AS a, 1 AS b, NULL AS c UNION ALL SELECT 2, NULL, 3")
    })
    .unwrap();

    assert_eq!(
        outcome.rows,
        vec![
            vec![serde_json::Value::Null, serde_json::json!(1), serde_json::Value::Null],
            vec![serde_json::json!(2), serde_json::Value::Null, serde_json::json!(3)],
        ]
    );
}

#[test]
fn concurrent_connections_share_one_database() {
    const THREADS: usize = 16;
    const WRITES: usize = 20;

    let dir = tempfile::tempdir().unwrap();
    let settings = fallback_settings(dir.path());
    with_connection(&settings, |conn| {
        conn.execute_query("CREATE TABLE events (thread INTEGER, n INTEGER)")
    })
    .unwrap();

    std::thread::scope(|scope| {
        let workers: Vec<_> = (0..THREADS)
            .map(|thread| {
                let settings = &settings;
                scope.spawn(move || {
                    for n in 0..WRITES {
                        with_connection(settings, |conn| {
                            conn.execute_query(&format!("INSERT INTO events VALUES ({thread}, {n})"))
                        })
                        .unwrap_or_else(|e| panic!("write {thread}/{n} failed: {e}"));
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().expect("worker panicked");
        }
    });

    let outcome = with_connection(&settings, |conn| {
        conn.execute_query("SELECT count(*), count(DISTINCT thread) FROM events")
    })
    .unwrap();
    assert_eq!(
        outcome.rows,
        vec![vec![
            serde_json::json!(THREADS * WRITES),
            serde_json::json!(THREADS)
        ]]
    );

    let conn = open_connection(&settings).expect("database still opens after concurrent use");
    conn.ping().unwrap();
    conn.close().unwrap();
}
