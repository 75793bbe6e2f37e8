use clap::Parser;
use noughts_server::{Config, Server};
use std::net::{Ipv4Addr, SocketAddr};

/// Referee server for networked noughts and crosses
#[derive(Parser, Debug)]
#[command(name = "noughts-server")]
struct Args {
    /// TCP bind address
    #[arg(short, long, default_value_t = SocketAddr::from((Ipv4Addr::UNSPECIFIED, noughts::PORT)))]
    bind: SocketAddr,

    /// Hold matchmaking until an admin sends StartServer
    #[arg(long)]
    await_start: bool,
}

fn init_logging() {
    const LOG_ENV: &str = "RUST_LOG";
    use std::str::FromStr;
    use tracing::Level;
    use tracing_subscriber::EnvFilter;

    let filter = std::env::var(LOG_ENV)
        .map(|env| {
            EnvFilter::from_str(&env)
                .unwrap_or_else(|err| panic!("invalid `{}` environment variable {}", LOG_ENV, err))
        })
        .unwrap_or_else(|_| EnvFilter::default().add_directive(Level::INFO.into()));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let args = Args::parse();
    let server = Server::bind(
        args.bind,
        Config {
            await_start: args.await_start,
        },
    )
    .await?;
    tracing::info!(address = %server.local_addr()?, await_start = args.await_start, "Starting server");

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Interrupted"),
    }
    Ok(())
}
