// ==========================================
// 文档流转导入工具 - 命令行入口
// ==========================================
// 用法: docflow-import <file> [--kind K] [--shift N] [--db PATH] [--option key=value]...
// 输出: stdout 为 JSON 批次报告；日志输出到 stderr
// 退出码: 批次无法开始时非零；单行中止不影响退出码
// ==========================================

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Parser;
use docflow_import::config::ConfigManager;
use docflow_import::importer::{
    BatchImporter, BatchOptions, ImportSettings, ImporterRegistry, UniversalRowReader,
};
use docflow_import::repository::SqliteDocumentStore;
use docflow_import::{db, i18n, logging};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(Parser, Debug)]
#[command(name = "docflow-import", version, about = "导入收文/发文表格数据")]
struct Cli {
    /// 数据文件（.csv / .xlsx，首行为表头）
    file: PathBuf,

    /// 实体种类（IncomingLetter / OutgoingLetter，大小写不敏感）
    #[arg(long, default_value = "IncomingLetter")]
    kind: String,

    /// 本实体首字段在行内的偏移
    #[arg(long, default_value_t = 0)]
    shift: usize,

    /// SQLite 数据库路径
    #[arg(long, env = "DOCFLOW_IMPORT_DB_PATH")]
    db: Option<String>,

    /// 附加到每一行的选项，如 doc_register_id=3
    #[arg(long = "option", value_name = "KEY=VALUE")]
    options: Vec<String>,
}

fn parse_options(raw: &[String]) -> Result<HashMap<String, String>> {
    let mut options = HashMap::new();
    for item in raw {
        let Some((key, value)) = item.split_once('=') else {
            bail!("选项格式应为 key=value: {}", item);
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("选项名为空: {}", item);
        }
        options.insert(key.to_string(), value.to_string());
    }
    Ok(options)
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    tracing::info!("{} {}", docflow_import::APP_NAME, docflow_import::VERSION);

    let db_path = cli.db.clone().unwrap_or_else(db::default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let conn = db::open_sqlite_connection(&db_path)
        .with_context(|| format!("无法打开数据库: {}", db_path))?;
    db::init_schema(&conn).context("数据库初始化失败")?;
    let conn = Arc::new(Mutex::new(conn));

    let config = ConfigManager::from_connection(conn.clone())?;
    let store = SqliteDocumentStore::from_connection(conn);
    let settings = ImportSettings::load(&config, Local::now().date_naive())?;
    i18n::set_locale(&settings.diagnostics_locale);

    let options = BatchOptions {
        shift: cli.shift,
        extra_parameters: parse_options(&cli.options)?,
    };

    let registry = ImporterRegistry::with_defaults();
    let report = BatchImporter::new(&registry, &store, &settings).import_file(
        &cli.kind,
        &cli.file,
        &UniversalRowReader,
        &options,
    )?;

    let snapshot: serde_json::Value = serde_json::from_str(&config.get_config_snapshot()?)?;
    let report = report.with_config_snapshot(snapshot);

    let args = report.summary_args();
    let args: Vec<(&str, &str)> = args.iter().map(|(k, v)| (*k, v.as_str())).collect();
    eprintln!("{}", i18n::t_with_args("batch.summary", &args));

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
