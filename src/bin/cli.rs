use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use taskgenie_config::AppConfig;
use taskgenie_infrastructure::database::dump::{dump_database, restore_database};
use taskgenie_infrastructure::{DatabaseManager, Migrator};
use tracing_subscriber::EnvFilter;

/// CLI应用程序主结构
#[derive(Parser, Debug)]
#[command(name = "taskgenie-cli")]
#[command(version)]
#[command(about = "TaskGenie - 命令行管理工具")]
#[command(long_about = "提供数据库迁移、备份、恢复等运维功能的命令行接口")]
struct CliApp {
    #[command(subcommand)]
    command: Commands,

    /// 配置文件路径
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 数据库管理
    Db(DbCommands),
}

#[derive(Args, Debug)]
struct DbCommands {
    #[command(subcommand)]
    action: DbActions,
}

#[derive(Subcommand, Debug)]
enum DbActions {
    /// 升级数据库结构到指定版本
    Upgrade {
        /// 目标版本（默认最新）
        #[arg(long = "rev", default_value = "head")]
        revision: String,
    },
    /// 回退数据库结构
    Downgrade {
        /// 目标版本（默认回退一步；base表示回退全部）
        #[arg(long = "rev", default_value = "-1")]
        revision: String,
    },
    /// 生成新迁移步骤的代码骨架
    Revision {
        /// 迁移说明
        #[arg(short, long)]
        message: String,
        /// 根据模型自动生成（不支持，保留兼容）
        #[arg(short = 'a', long)]
        autogenerate: bool,
    },
    /// 查看当前迁移状态
    Status,
    /// 导出数据库为SQL文件
    Dump {
        /// 输出文件路径
        #[arg(long)]
        out: PathBuf,
    },
    /// 从SQL文件恢复数据库（覆盖现有数据）
    Restore {
        /// 输入文件路径
        #[arg(long = "in")]
        input: PathBuf,
        /// 跳过确认
        #[arg(short, long)]
        yes: bool,
    },
    /// 重置数据库（删除所有数据）
    Reset {
        /// 跳过确认
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = CliApp::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("✗ {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: CliApp) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref()).context("加载配置失败")?;

    match cli.command {
        Commands::Db(db) => handle_db_commands(db, &config).await,
    }
}

async fn handle_db_commands(db_cmd: DbCommands, config: &AppConfig) -> Result<()> {
    match db_cmd.action {
        DbActions::Upgrade { revision } => {
            let migrator = open_migrator(config).await?;
            let target = (revision != "head").then_some(revision.as_str());
            let applied = migrator.upgrade(target).await?;
            if applied.is_empty() {
                println!("✓ 数据库已是最新版本");
            } else {
                for step in &applied {
                    println!("  应用迁移: {step}");
                }
                println!("✓ 数据库已升级到 {revision}");
            }
        }
        DbActions::Downgrade { revision } => {
            let migrator = open_migrator(config).await?;
            let target = (revision != "-1").then_some(revision.as_str());
            let reverted = migrator.downgrade(target).await?;
            for step in &reverted {
                println!("  回退迁移: {step}");
            }
            println!("✓ 数据库已回退到 {revision}");
        }
        DbActions::Revision {
            message,
            autogenerate,
        } => {
            if autogenerate {
                println!("⚠ 迁移步骤为代码内置，不支持自动生成，输出骨架代码");
            }
            let next_number = Migrator::steps().len() + 1;
            print!("{}", revision_template(next_number, &message));
            println!();
            println!("✓ 请将以上骨架加入 crates/infrastructure/src/database/migrations.rs 并注册到 Migrator::steps()");
        }
        DbActions::Status => {
            let migrator = open_migrator(config).await?;
            let current = migrator.current_version().await?;
            println!("当前版本: {}", current.as_deref().unwrap_or("(未初始化)"));
            println!("最新版本: {}", Migrator::latest_version());
            let pending = migrator.pending().await?;
            if pending.is_empty() {
                println!("✓ 无待应用迁移");
            } else {
                println!("待应用迁移:");
                for step in pending {
                    println!("  {step}");
                }
            }
        }
        DbActions::Dump { out } => {
            if let Some(db_path) = config.database_path() {
                if !db_path.exists() {
                    return Err(anyhow::anyhow!("数据库文件不存在: {}", db_path.display()));
                }
            }
            let pool = open_pool(config).await?;
            let script = dump_database(pool.pool()).await?;
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&out, script)
                .with_context(|| format!("写入文件失败: {}", out.display()))?;
            println!("✓ 数据库已导出到 {}", out.display());
        }
        DbActions::Restore { input, yes } => {
            if !input.exists() {
                return Err(anyhow::anyhow!("输入文件不存在: {}", input.display()));
            }
            let db_path = file_database_path(config)?;

            if db_path.exists() && !yes {
                println!("⚠ 将覆盖现有数据库: {}", db_path.display());
                if !confirm("继续?")? {
                    println!("已取消恢复操作");
                    return Ok(());
                }
            }

            remove_database_files(&db_path)?;
            let pool = open_pool(config).await?;
            let script = std::fs::read_to_string(&input)
                .with_context(|| format!("读取文件失败: {}", input.display()))?;
            restore_database(pool.pool(), &script).await?;
            pool.close().await;
            println!("✓ 数据库已从 {} 恢复", input.display());
        }
        DbActions::Reset { yes } => {
            let db_path = file_database_path(config)?;
            if !db_path.exists() {
                println!("⚠ 数据库文件不存在");
                return Ok(());
            }

            if !yes {
                println!("⚠ 将删除数据库: {}", db_path.display());
                if !confirm("确定?")? {
                    println!("已取消重置操作");
                    return Ok(());
                }
            }

            remove_database_files(&db_path)?;
            println!("✓ 数据库已重置（文件已删除）");
        }
    }

    Ok(())
}

async fn open_pool(config: &AppConfig) -> Result<DatabaseManager> {
    config.ensure_app_dirs().context("创建应用目录失败")?;
    let url = config.database_url_resolved();
    DatabaseManager::connect(&url, &config.database)
        .await
        .with_context(|| format!("连接数据库失败: {url}"))
}

async fn open_migrator(config: &AppConfig) -> Result<Migrator> {
    let manager = open_pool(config).await?;
    Ok(Migrator::new(manager.pool().clone()))
}

fn file_database_path(config: &AppConfig) -> Result<PathBuf> {
    config
        .database_path()
        .ok_or_else(|| anyhow::anyhow!("当前数据库不是文件数据库，无法执行该操作"))
}

/// 同时清理WAL模式的附属文件
fn remove_database_files(db_path: &Path) -> Result<()> {
    for suffix in ["", "-wal", "-shm"] {
        let mut path = db_path.as_os_str().to_owned();
        path.push(suffix);
        let path = PathBuf::from(path);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("删除文件失败: {}", path.display()))?;
        }
    }
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} (y/N) ");
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

fn revision_template(number: usize, message: &str) -> String {
    let slug: String = message
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let step_id = format!("{number:03}_{slug}");
    let struct_name: String = slug
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();

    format!(
        r#"/// {number:03}: {message}
struct {struct_name};

#[async_trait]
impl MigrationStep for {struct_name} {{
    fn id(&self) -> &'static str {{
        "{step_id}"
    }}

    async fn apply(&self, tx: &mut Transaction<'_, Sqlite>) -> TaskGenieResult<()> {{
        todo!("apply schema change: {message}")
    }}

    async fn revert(&self, tx: &mut Transaction<'_, Sqlite>) -> TaskGenieResult<()> {{
        todo!("revert schema change: {message}")
    }}
}}
"#
    )
}
