use anyhow::{Context, Result};
use clap::Parser;
use taskgenie::app::Application;
use taskgenie::common;
use taskgenie_config::AppConfig;
use tracing::info;

/// 个人任务管理后端服务
#[derive(Parser, Debug)]
#[command(name = "taskgenie", version, about = "TaskGenie - 个人任务管理后端")]
struct Cli {
    /// 配置文件路径（默认读取 TASKGENIE_CONFIG_FILE 或 ~/.taskgenie/config.toml）
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// 日志级别，覆盖配置文件
    #[arg(short = 'l', long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// 日志格式，覆盖配置文件
    #[arg(long, value_name = "FORMAT", value_parser = ["json", "pretty"])]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("加载配置失败")?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }

    // 日志文件写入data_dir下，初始化日志前需要目录就位
    config.ensure_app_dirs().context("创建应用目录失败")?;
    let _log_guard = common::init_logging(&config)?;

    info!("启动TaskGenie后端服务");

    let app = Application::bootstrap(config).await?;
    let handle = app.start().await?;
    info!("服务已就绪: http://{}", handle.api_address());

    common::wait_for_shutdown_signal().await;
    info!("收到关闭信号，开始优雅关闭...");
    handle.shutdown().await?;

    info!("TaskGenie已退出");
    Ok(())
}
