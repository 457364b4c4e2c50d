use anyhow::Context;
use clap::Parser;
use disaster_report::location::{FALLBACK_URL, PRIMARY_URL};
use disaster_report::server::{self, ServerConfig};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Disaster Report Form — report intake page with IP-based location pre-fill.
///
/// Examples:
///   disaster-report
///   disaster-report --port 8080 --host 0.0.0.0
///   REPORT_LOOKUP_TIMEOUT_SECS=5 disaster-report
#[derive(Parser)]
#[command(name = "disaster-report", version, about, long_about = None)]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "REPORT_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on.
    #[arg(long, short = 'p', env = "REPORT_PORT", default_value_t = 8501)]
    port: u16,

    /// Upper bound for a whole location lookup. Each provider request gets two
    /// fifths of it, so the fallback still runs when the primary hangs.
    #[arg(long, env = "REPORT_LOOKUP_TIMEOUT_SECS", default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    lookup_timeout_secs: u64,

    /// Minutes of inactivity before a visitor's session is dropped.
    #[arg(long, env = "REPORT_SESSION_TTL_MINS", default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    session_ttl_mins: u64,

    /// Primary IP geolocation endpoint (ipinfo.io JSON format).
    #[arg(long, env = "REPORT_PRIMARY_URL", default_value = PRIMARY_URL)]
    primary_url: String,

    /// Fallback IP geolocation endpoint (ipapi.co JSON format).
    #[arg(long, env = "REPORT_FALLBACK_URL", default_value = FALLBACK_URL)]
    fallback_url: String,
}

impl From<Cli> for ServerConfig {
    fn from(cli: Cli) -> Self {
        Self {
            host: cli.host,
            port: cli.port,
            lookup_timeout: Duration::from_secs(cli.lookup_timeout_secs),
            session_ttl: Duration::from_secs(cli.session_ttl_mins * 60),
            primary_url: cli.primary_url,
            fallback_url: cli.fallback_url,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default filter.
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("disaster_report=info,info"));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .init();

    let config = ServerConfig::from(Cli::parse());
    tracing::debug!(?config, "configuration loaded");

    let addr = format!("{}:{}", config.host, config.port);
    server::start(config)
        .await
        .with_context(|| format!("server on {} failed", addr))
}
