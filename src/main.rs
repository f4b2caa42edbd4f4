use anyhow::Context;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use warden::{
    api::routes::create_router,
    cli::{
        init::{self, InitConfig, InitResult},
        output::Output,
        tokens, Cli, Commands,
    },
    db::DatabaseProvider,
    AppState, TokenService, WardenConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match cli.command() {
        Commands::Serve => serve(&cli, &output).await,
        Commands::Init {
            path,
            force,
            host,
            port,
        } => {
            let config = InitConfig {
                path: path.clone(),
                force: *force,
                host: host.clone(),
                port: *port,
            };
            match init::run(config, &output) {
                InitResult::Success | InitResult::AlreadyExists => Ok(()),
                InitResult::Error(e) => Err(anyhow::anyhow!(e)),
            }
        }
        Commands::Config { validate } => show_config(&cli, *validate, &output),
        Commands::Hash { password } => {
            tokens::hash_password(password)?;
            Ok(())
        }
        Commands::Inspect { token } => {
            tokens::inspect_token(token, &output)?;
            Ok(())
        }
        Commands::Verify { token } => {
            let config = load_config(&cli)?;
            let service = TokenService::new(&config.jwt_secret()?, config.auth.token_ttl_secs);
            tokens::verify_token(&service, token, &output)?;
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<WardenConfig> {
    WardenConfig::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))
}

fn init_tracing(log_level: &str, verbose: bool) {
    let fallback = if verbose { "debug" } else { log_level };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(cli: &Cli, output: &Output) -> anyhow::Result<()> {
    let config = match load_config(cli) {
        Ok(config) => config,
        Err(e) => {
            output.error(&format!("{:#}", e));
            output.hint("Run 'warden-server init' to create a configuration");
            return Err(e);
        }
    };

    init_tracing(&config.server.log_level, cli.verbose);
    output.banner();

    let jwt_secret = config.jwt_secret()?;
    let store = DatabaseProvider::from_config(&config.database)
        .create_client()
        .await
        .context("failed to open the user store")?;
    tracing::info!(database = %config.database.url, "user store ready");

    let addr = config.bind_address();
    let state = AppState::new(config, store, &jwt_secret);
    drop(jwt_secret);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("Warden listening on http://{}", addr);
    tracing::info!("OpenAPI document at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

fn show_config(cli: &Cli, validate: bool, output: &Output) -> anyhow::Result<()> {
    let config = load_config(cli)?;
    if validate {
        output.success(&format!("{} is valid", cli.config.display()));
        return Ok(());
    }

    output.header("Server");
    output.kv("host", &config.server.host);
    output.kv("port", &config.server.port.to_string());
    output.kv("log_level", &config.server.log_level);

    output.header("Auth");
    output.kv("jwt_secret_env", &config.auth.jwt_secret_env);
    output.kv("token_ttl_secs", &config.auth.token_ttl_secs.to_string());
    output.kv(
        "signin_failure_status",
        &config.auth.signin_failure_status().as_u16().to_string(),
    );

    output.header("Database");
    output.kv("url", &config.database.url);
    if let Some(env) = &config.database.turso_url_env {
        output.kv("turso_url_env", env);
    }

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::warn!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::warn!("received SIGTERM, shutting down"),
    }
}
