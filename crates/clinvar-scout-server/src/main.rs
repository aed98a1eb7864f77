use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use clinvar_scout::monitor::decide_strategy;
use clinvar_scout::{Extractor, ExtractorConfig};
use clinvar_scout_server::config::{load_dotenv, ServerConfig};
use clinvar_scout_server::rest;
use clinvar_scout_server::validate::resolve_input;

#[derive(Parser)]
#[command(
    name = "clinvar-scout",
    about = "ClinVar Scout: adaptive extraction of ClinVar variant pages",
    version,
    after_help = "Run 'clinvar-scout <command> --help' for details on each command.\nRun 'clinvar-scout' with no command to start the server."
)]
struct Cli {
    /// Log level filter (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Extract one variant page and print the record as JSON
    Extract {
        /// Variation page URL, numeric variation ID, or VCV accession
        input: String,
        /// Print the raw record instead of the normalized one
        #[arg(long)]
        raw: bool,
        /// Always use the lightweight HTTP strategy
        #[arg(long, conflicts_with = "force_heavy")]
        force_light: bool,
        /// Always use the headless browser strategy
        #[arg(long)]
        force_heavy: bool,
    },
    /// Print the current resource picture and the strategy it implies
    Health,
    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

fn init_tracing(cli: &Cli) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    match cli.log_format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);
    load_dotenv();

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => {
            let mut server = ServerConfig::from_env();
            if let Some(port) = port {
                server.port = port;
            }
            let extractor = Extractor::new(ExtractorConfig::from_env());
            rest::start(server, extractor).await
        }
        Commands::Extract {
            input,
            raw,
            force_light,
            force_heavy,
        } => {
            let url = resolve_input(&input)?;
            let mut config = ExtractorConfig::from_env();
            if force_light || force_heavy {
                config.overrides.force_light = force_light;
                config.overrides.force_heavy = force_heavy;
            }
            let extractor = Extractor::new(config);
            let json = if raw {
                serde_json::to_string_pretty(&extractor.resolve(&url).await?)?
            } else {
                serde_json::to_string_pretty(&extractor.extract(&url).await?)?
            };
            println!("{json}");
            Ok(())
        }
        Commands::Health => {
            let extractor = Extractor::new(ExtractorConfig::from_env());
            let sample = extractor.sample_resources().await?;
            let strategy = decide_strategy(Some(&sample), extractor.config().overrides);
            let report = serde_json::json!({
                "resources": sample,
                "strategy": strategy,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "clinvar-scout", &mut std::io::stdout());
            Ok(())
        }
    }
}
