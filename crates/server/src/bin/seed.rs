use config::Config;
use db::DBService;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("warn,db=info,config=info,seed=info"))
        .init();

    let config = Config::load()?;
    let db = DBService::new(&config.database_url).await?;
    let inserted = db::seed::seed_demo_users(&db.pool).await?;

    tracing::info!(inserted, "Seeding finished");
    Ok(())
}
