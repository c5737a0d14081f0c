use svr_server::Result;

#[tokio::main]
async fn main() -> Result<()> {
    use tracing_subscriber::{
        layer::SubscriberExt, util::SubscriberInitExt,
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "svr=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    if let Err(e) = cli::run().await {
        use colored::Colorize;
        eprintln!("{} {}", "error:".red(), e);
        std::process::exit(1);
    }

    Ok(())
}

mod cli {
    use crate::Result;
    use clap::{Parser, Subcommand};
    use std::path::PathBuf;

    #[derive(Parser, Debug)]
    #[clap(name = "svr-server", author, version, about, long_about = None)]
    pub struct SvrServer {
        #[clap(subcommand)]
        cmd: Command,
    }

    #[derive(Debug, Subcommand)]
    pub enum Command {
        /// Create a configuration file.
        Init {
            /// Path to the database file.
            #[clap(short, long)]
            path: Option<PathBuf>,

            /// Config file to write.
            config: PathBuf,
        },
        /// Start a server.
        Start {
            /// Bind to host:port.
            #[clap(short, long)]
            bind: Option<String>,

            /// Config file to load.
            config: PathBuf,
        },
    }

    pub async fn run() -> Result<()> {
        let args = SvrServer::parse();

        match args.cmd {
            Command::Init { config, path } => {
                service::init(config, path).await?;
            }
            Command::Start { bind, config } => {
                service::start(bind, config).await?;
            }
        }

        Ok(())
    }

    mod service {
        use axum_server::Handle;
        use svr_server::{
            Error, Result, Server, ServerConfig, StorageConfig,
        };
        use std::{net::SocketAddr, path::PathBuf, str::FromStr};

        /// Initialize default server configuration.
        pub async fn init(
            output: PathBuf,
            mut path: Option<PathBuf>,
        ) -> Result<()> {
            if output.exists() {
                return Err(Error::FileExists(output));
            }

            let mut config: ServerConfig = Default::default();
            if let Some(path) = path.take() {
                config.storage = StorageConfig { path };
            }

            let content = toml::to_string_pretty(&config)?;
            tokio::fs::write(output, content.as_bytes()).await?;
            Ok(())
        }

        /// Start a web server.
        pub async fn start(
            bind: Option<String>,
            config: PathBuf,
        ) -> Result<()> {
            let mut config = ServerConfig::load(&config).await?;

            if let Some(bind) = bind {
                let addr = SocketAddr::from_str(&bind)?;
                config.set_bind_address(addr);
            }

            let handle = Handle::new();
            Server::start(config, handle).await?;
            Ok(())
        }
    }
}
