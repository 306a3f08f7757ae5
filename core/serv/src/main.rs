use actix_web::{middleware, App, HttpServer};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use medshare_persistence::executor::DbExecutor;
use medshare_sharing::{Config, LoggingSink, RegistryFile, SharingService};

#[derive(Parser)]
#[command(name = "medshare", about, version)]
struct CliArgs {
    /// Daemon data dir; the sqlite database lives here
    #[arg(short, long, env = "MEDSHARE_DATA_DIR", default_value = "medshare-data")]
    datadir: PathBuf,

    /// Address to bind the REST API on
    #[arg(short, long, env = "MEDSHARE_API_ADDRESS", default_value = "127.0.0.1")]
    address: String,

    /// Port to bind the REST API on
    #[arg(short, long, env = "MEDSHARE_API_PORT", default_value = "7465")]
    port: u16,

    /// JSON file mapping equipment ids to their owning tenants
    #[arg(long, env = "MEDSHARE_EQUIPMENT_REGISTRY")]
    equipment_registry: PathBuf,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    std::env::set_var(
        "RUST_LOG",
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );
    env_logger::init();

    let args = CliArgs::parse();
    std::fs::create_dir_all(&args.datadir)
        .with_context(|| format!("Creating data dir: {}", args.datadir.display()))?;

    let db = DbExecutor::from_data_dir(&args.datadir, "medshare")?;
    let equipment = Arc::new(RegistryFile::load(&args.equipment_registry)?);
    let config = Arc::new(Config::from_env()?);
    let service = Arc::new(SharingService::new(
        &db,
        equipment,
        Arc::new(LoggingSink),
        config,
    )?);

    log::info!(
        "MedShare daemon listening on {}:{}.",
        args.address,
        args.port
    );
    let http_service = service.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .service(SharingService::bind_rest(http_service.clone()))
    })
    .bind((args.address.as_str(), args.port))?
    .run()
    .await?;
    Ok(())
}
