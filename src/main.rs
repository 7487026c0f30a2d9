use tracing::{error, info, warn};

use flasky::mail::{self, MailQueue};
use flasky::web::{AppState, WebServer};
use flasky::{Config, Database, RoleRepository};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = flasky::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        flasky::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = run(config).await {
        error!("Fatal: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> flasky::Result<()> {
    config.validate()?;
    info!("Flasky starting");

    let db = Database::open(&config.database.path).await?;
    {
        let mut tx = db.begin().await?;
        RoleRepository::new(&mut tx).insert_roles().await?;
        tx.commit().await?;
    }

    if config.mail.admin.is_none() {
        warn!("mail.admin is not set; nobody will be promoted to Administrator on registration");
    }

    let transport = mail::transport_from_config(&config.mail)
        .map_err(|e| flasky::FlaskyError::Mail(e.to_string()))?;
    let mail = MailQueue::start(transport);

    let state = AppState::new(db, &config, mail);
    let server = WebServer::new(&config.web, state)?;
    info!("Server configured on {}", server.addr());

    server.run().await
}
