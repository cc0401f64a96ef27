use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use taskgenie_api::{create_routes, AppState};
use taskgenie_config::{AppConfig, MigrationPolicy};
use taskgenie_domain::service::TaskService;
use taskgenie_infrastructure::{
    DatabaseManager, Migrator, SqliteAttachmentRepository, SqliteTaskRepository, StoreState,
};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// 应用程序：负责启动顺序（目录 → 连接池 → 迁移 → HTTP服务）
#[derive(Debug)]
pub struct Application {
    config: AppConfig,
    db: DatabaseManager,
    store_state: StoreState,
}

impl Application {
    /// 初始化存储层。按照配置的迁移策略决定迁移失败时是否继续启动。
    pub async fn bootstrap(config: AppConfig) -> Result<Self> {
        config.ensure_app_dirs().context("创建应用目录失败")?;

        let database_url = config.database_url_resolved();
        let db = DatabaseManager::connect(&database_url, &config.database)
            .await
            .context("创建数据库连接池失败")?;

        let store_state =
            run_startup_migrations(&db, config.migration.policy).await?;

        Ok(Self {
            config,
            db,
            store_state,
        })
    }

    pub fn store_state(&self) -> StoreState {
        self.store_state
    }

    /// 启动HTTP服务，返回可用于优雅关闭的句柄
    pub async fn start(self) -> Result<ApplicationHandle> {
        let pool = self.db.pool().clone();
        let service = Arc::new(TaskService::new(
            Arc::new(SqliteTaskRepository::new(pool.clone())),
            Arc::new(SqliteAttachmentRepository::new(pool.clone())),
        ));

        let state = AppState::new(service, pool, self.store_state);
        let router = create_routes(state);

        let bind_address = format!("{}:{}", self.config.server.host, self.config.server.port);
        let listener = tokio::net::TcpListener::bind(&bind_address)
            .await
            .with_context(|| format!("绑定地址失败: {bind_address}"))?;
        let api_address = listener.local_addr()?;
        info!("API服务监听于 {}", api_address);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        Ok(ApplicationHandle {
            api_address,
            shutdown_tx,
            server,
            db: self.db,
        })
    }
}

/// 启动时的迁移检查：需要迁移则自动升级到最新版本。
/// strict策略下迁移失败直接终止启动；permissive策略下记录告警并继续。
async fn run_startup_migrations(
    db: &DatabaseManager,
    policy: MigrationPolicy,
) -> Result<StoreState> {
    let migrator = Migrator::new(db.pool().clone());

    if !migrator.needs_migration().await? {
        info!("数据库结构已是最新版本");
        return Ok(StoreState::Ready);
    }

    let store_state = match migrator.current_version().await? {
        None => StoreState::Uninitialized,
        Some(_) => StoreState::Migrating,
    };
    info!(state = store_state.as_str(), "检测到数据库需要迁移，开始自动升级");
    match migrator.upgrade(None).await {
        Ok(applied) => {
            info!(steps = ?applied, "数据库迁移完成");
            Ok(StoreState::Ready)
        }
        Err(err) => match policy {
            MigrationPolicy::Strict => {
                Err(err).context("数据库迁移失败，服务终止启动")
            }
            MigrationPolicy::Permissive => {
                warn!(error = %err, "数据库迁移失败，按照permissive策略继续启动");
                Ok(StoreState::Degraded)
            }
        },
    }
}

/// 运行中的应用句柄
pub struct ApplicationHandle {
    api_address: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    server: JoinHandle<std::io::Result<()>>,
    db: DatabaseManager,
}

impl ApplicationHandle {
    pub fn api_address(&self) -> SocketAddr {
        self.api_address
    }

    /// 优雅关闭：停止接收新请求，等待在途请求完成后关闭连接池
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown_tx.send(());
        self.server.await.context("等待HTTP服务退出失败")??;
        self.db.close().await;
        info!("应用已优雅关闭");
        Ok(())
    }
}
