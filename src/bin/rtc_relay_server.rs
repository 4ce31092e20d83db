//! Signaling relay binary entry point
//!
//! # Usage
//!
//! ```bash
//! # Defaults: bind 0.0.0.0:8080, serve ./static, Google STUN
//! cargo run --bin rtc-relay-server
//!
//! # Custom bind address and static directory
//! cargo run --bin rtc-relay-server -- \
//!   --bind-address 127.0.0.1:9090 \
//!   --static-dir ./demo
//!
//! # Configure STUN/TURN servers
//! cargo run --bin rtc-relay-server -- \
//!   --stun-servers stun:stun.l.google.com:19302 \
//!   --turn-servers turn:turn.example.com:3478:user:secret
//! ```

use clap::Parser;
use rtc_relay::{AllowedOrigins, RelayConfig, SignalingServer, TurnServerConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// WebRTC signaling relay
///
/// Accepts browser signaling connections over WebSocket, terminates a
/// server-side peer connection per client, and serves the demo client.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Listen address for the HTTP/WebSocket server
    #[arg(long, default_value = "0.0.0.0:8080", env = "RELAY_BIND_ADDRESS")]
    bind_address: String,

    /// Route that upgrades to the signaling channel
    #[arg(long, default_value = "/ws", env = "RELAY_SIGNALING_PATH")]
    signaling_path: String,

    /// Directory of static files served on every other route
    #[arg(long, default_value = "./static", env = "RELAY_STATIC_DIR")]
    static_dir: String,

    /// STUN servers (comma-separated)
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "stun:stun.l.google.com:19302",
        env = "RELAY_STUN_SERVERS"
    )]
    stun_servers: Vec<String>,

    /// TURN servers (format: turn:host:port:username:password, comma-separated)
    #[arg(long, value_delimiter = ',', env = "RELAY_TURN_SERVERS")]
    turn_servers: Vec<String>,

    /// Allowed signaling origins (comma-separated; default allows any)
    #[arg(long, value_delimiter = ',', env = "RELAY_ALLOWED_ORIGINS")]
    allowed_origins: Vec<String>,
}

/// Split a TURN argument of the form `turn:host:port:username:credential`
///
/// The credential is the final split field, so colons inside it survive.
fn parse_turn_server(s: &str) -> Result<TurnServerConfig, String> {
    let mut fields = s.splitn(5, ':');

    let scheme = fields.next().unwrap_or_default();
    if scheme != "turn" && scheme != "turns" {
        return Err(format!(
            "TURN server {:?} must use a turn: or turns: scheme",
            s
        ));
    }

    let (Some(host), Some(port), Some(username), Some(credential)) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(format!(
            "TURN server {:?} must have the form {}:host:port:username:credential",
            s, scheme
        ));
    };

    Ok(TurnServerConfig {
        url: format!("{}:{}:{}", scheme, host, port),
        username: username.to_string(),
        credential: credential.to_string(),
    })
}

fn build_config_from_args(args: &Args) -> Result<RelayConfig, String> {
    let mut turn_servers = Vec::new();
    for turn_str in &args.turn_servers {
        let turn_config = parse_turn_server(turn_str)?;
        info!(
            "Adding TURN server: {} (user: {})",
            turn_config.url, turn_config.username
        );
        turn_servers.push(turn_config);
    }

    let allowed_origins = if args.allowed_origins.is_empty() {
        AllowedOrigins::Any
    } else {
        AllowedOrigins::List(args.allowed_origins.clone())
    };

    Ok(RelayConfig {
        bind_address: args.bind_address.clone(),
        signaling_path: args.signaling_path.clone(),
        static_dir: args.static_dir.clone(),
        stun_servers: args.stun_servers.clone(),
        turn_servers,
        allowed_origins,
    })
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_tracing();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %args.bind_address,
        "Signaling relay starting"
    );

    let config = build_config_from_args(&args).map_err(|e| anyhow::anyhow!(e))?;
    let server = SignalingServer::new(config)?;
    server.serve().await?;

    Ok(())
}
