use std::sync::Arc;
use tokio::net::TcpListener;

use echocast::config::{Config, TransportMode};
use echocast::context::ExecutionContext;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "echocast=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env();
    print_banner(&config);

    let port = config.port;
    let context = Arc::new(ExecutionContext::new(config));

    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .expect("failed to bind");

    let actual_port = listener
        .local_addr()
        .expect("failed to get local address")
        .port();
    eprintln!("  \x1b[32m→ listening on 0.0.0.0:{actual_port}\x1b[0m");
    eprintln!();

    echocast::server::serve(listener, context, shutdown_signal())
        .await
        .expect("server error");
}

fn print_banner(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");
    let transport = match config.transport {
        TransportMode::Local => "local websocket".to_string(),
        TransportMode::Gateway => format!("gateway ({})", config.gateway_scheme),
    };
    let max_delay = match config.max_delay {
        Some(max) => format!("{}s", max.as_secs()),
        None => "unbounded".to_string(),
    };

    eprintln!();
    eprintln!("  \x1b[1;36mechocast\x1b[0m \x1b[2mv{version}\x1b[0m");
    eprintln!();
    eprintln!("  \x1b[2mport\x1b[0m         {}", config.port);
    eprintln!("  \x1b[2mdatabase\x1b[0m     {}", config.database_url);
    eprintln!("  \x1b[2mtransport\x1b[0m    {transport}");
    eprintln!("  \x1b[2mstage\x1b[0m        {}", config.stage);
    eprintln!("  \x1b[2mmax delay\x1b[0m    {max_delay}");
    eprintln!(
        "  \x1b[2mtimeout\x1b[0m      {}s",
        config.invocation_timeout.as_secs()
    );
    eprintln!();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
