//! ShardCache - A Sharded In-Memory Memcached Server
//!
//! This is the main entry point for the ShardCache server.
//! It spawns the per-core storage workers, sets up the TCP listener, and
//! hands incoming connections to their own handler tasks.

use shardcache::connection::handle_connection;
use shardcache::core::router::CoreRouter;
use shardcache::core::worker::spawn_cores;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Server configuration
struct Config {
    /// Host to bind to
    host: String,
    /// Port to listen on
    port: u16,
    /// Number of storage cores to spawn
    cores: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 11211,
            cores: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args() -> Self {
        let mut config = Config::default();
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" | "-h" => {
                    if i + 1 < args.len() {
                        config.host = args[i + 1].clone();
                        i += 2;
                    } else {
                        eprintln!("Error: --host requires a value");
                        std::process::exit(1);
                    }
                }
                "--port" | "-p" => {
                    if i + 1 < args.len() {
                        config.port = args[i + 1].parse().unwrap_or_else(|_| {
                            eprintln!("Error: invalid port number");
                            std::process::exit(1);
                        });
                        i += 2;
                    } else {
                        eprintln!("Error: --port requires a value");
                        std::process::exit(1);
                    }
                }
                "--cores" | "-c" => {
                    if i + 1 < args.len() {
                        config.cores = args[i + 1].parse().unwrap_or_else(|_| {
                            eprintln!("Error: invalid core count");
                            std::process::exit(1);
                        });
                        if config.cores == 0 {
                            eprintln!("Error: core count must be at least 1");
                            std::process::exit(1);
                        }
                        i += 2;
                    } else {
                        eprintln!("Error: --cores requires a value");
                        std::process::exit(1);
                    }
                }
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("ShardCache version {}", shardcache::VERSION);
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                    print_help();
                    std::process::exit(1);
                }
            }
        }

        config
    }

    /// Returns the bind address as a string
    fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn print_help() {
    println!(
        r#"
ShardCache - A Sharded In-Memory Memcached Server

USAGE:
    shardcache [OPTIONS]

OPTIONS:
    -h, --host <HOST>      Host to bind to (default: 127.0.0.1)
    -p, --port <PORT>      Port to listen on (default: 11211)
    -c, --cores <CORES>    Number of storage cores (default: CPU count)
    -v, --version          Print version information
        --help             Print this help message

EXAMPLES:
    shardcache                       # Start on 127.0.0.1:11211
    shardcache --port 11212          # Start on port 11212
    shardcache --host 0.0.0.0 -c 8   # All interfaces, 8 storage cores

CONNECTING:
    Use any memcached client, or plain netcat:
    $ nc 127.0.0.1 11211
    set name 0 0 4
    Ariz
    STORED
    get name
    VALUE name 0 4
    Ariz
    END
"#
    );
}

fn print_banner(config: &Config) {
    println!(
        r#"
ShardCache v{} - Sharded In-Memory Memcached Server
──────────────────────────────────────────────────────────────
Server started on {} with {} storage core(s)
Ready to accept connections.

Use Ctrl+C (or the `shutdown` command) to stop the server.
"#,
        shardcache::VERSION,
        config.bind_address(),
        config.cores
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = Config::from_args();

    // Set up logging
    let _subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    // Print the banner
    print_banner(&config);

    // Spawn the per-core storage workers
    let router = spawn_cores(config.cores);
    info!("Spawned {} storage cores", config.cores);

    // The `shutdown` command and Ctrl+C both end up here
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    // Bind the TCP listener
    let listener = TcpListener::bind(config.bind_address()).await?;
    info!("Listening on {}", config.bind_address());

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Shutdown signal received, stopping server...");
    };

    // Main accept loop
    tokio::select! {
        _ = accept_loop(listener, router, shutdown_tx) => {}
        _ = ctrl_c => {}
        _ = shutdown_rx.changed() => {
            info!("Shutdown requested over the wire, stopping server...");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Main loop that accepts incoming connections
async fn accept_loop(
    listener: TcpListener,
    router: CoreRouter,
    shutdown: watch::Sender<bool>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let router = router.clone();
                let shutdown = shutdown.clone();

                // Spawn a task to handle this connection
                tokio::spawn(async move {
                    handle_connection(stream, addr, router, shutdown).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
