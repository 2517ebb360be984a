#[cfg(not(feature = "std"))]
fn main() {}

#[cfg(feature = "std")]
use broadside::{init_logging, sim, AiPlayer, Codec, ServerConfig, TcpClient, DEFAULT_BIND};

#[cfg(feature = "std")]
use clap::Parser;
#[cfg(feature = "std")]
use log::LevelFilter;
#[cfg(feature = "std")]
use rand::rngs::SmallRng;
#[cfg(feature = "std")]
use rand::SeedableRng;
#[cfg(feature = "std")]
use tokio::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[cfg(feature = "std")]
struct Cli {
    /// Log level (error, warn, info, debug, trace); overrides BROADSIDE_LOG.
    #[arg(long, global = true)]
    log_level: Option<LevelFilter>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
#[cfg(feature = "std")]
enum Commands {
    /// Run the match server.
    Serve {
        #[arg(long, default_value = DEFAULT_BIND)]
        bind: String,
        #[arg(long, default_value = "json", help = "Frame payload codec (json|bincode)")]
        codec: Codec,
        #[arg(long, default_value_t = 30)]
        io_timeout_secs: u64,
        #[arg(long, default_value_t = 300)]
        idle_timeout_secs: u64,
        #[arg(long, default_value_t = broadside::DEFAULT_MAX_FRAME_SIZE)]
        max_frame_size: u32,
        #[arg(long, help = "Fix RNG seed for reproducible first turns (e.g., --seed 12345)")]
        seed: Option<u64>,
    },
    /// Play a bot-vs-bot match in-process and print the result.
    Local {
        #[arg(long, default_value_t = 1)]
        seed1: u64,
        #[arg(long, default_value_t = 2)]
        seed2: u64,
    },
    /// Connect a bot to a running server.
    Bot {
        #[arg(long, default_value = "127.0.0.1:4000")]
        connect: String,
        #[arg(long)]
        identity: String,
        #[arg(long, help = "Join a named match instead of the lobby")]
        match_id: Option<String>,
        #[arg(long, default_value = "json")]
        codec: Codec,
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[cfg(feature = "std")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    match cli.command {
        Commands::Serve {
            bind,
            codec,
            io_timeout_secs,
            idle_timeout_secs,
            max_frame_size,
            seed,
        } => {
            let config = ServerConfig {
                bind,
                codec,
                io_timeout: Duration::from_secs(io_timeout_secs),
                idle_timeout: Duration::from_secs(idle_timeout_secs),
                max_frame_size,
                seed,
            };
            broadside::server::serve(config).await?;
        }
        Commands::Local { seed1, seed2 } => {
            let report = sim::run_local_match(seed1, seed2).await?;
            for bot in [&report.player1, &report.player2] {
                println!(
                    "{} ({}): {} shots, {} hits",
                    bot.identity,
                    bot.slot.map(|s| s.to_string()).unwrap_or_default(),
                    bot.shots,
                    bot.hits
                );
            }
            match report.winner {
                Some(w) => println!("Winner: {}", w),
                None => println!("No winner"),
            }
        }
        Commands::Bot {
            connect,
            identity,
            match_id,
            codec,
            seed,
        } => {
            let mut rng = match seed {
                Some(s) => SmallRng::seed_from_u64(s),
                None => SmallRng::from_rng(&mut rand::rng()),
            };
            let mut client = TcpClient::connect(&connect, codec).await?;
            let mut player = AiPlayer::new();
            let report = sim::run_bot(
                &mut client,
                &identity,
                match_id.as_deref(),
                &mut player,
                &mut rng,
            )
            .await?;
            println!("{}", serde_json::to_string(&report)?);
        }
    }
    Ok(())
}
