use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use goalclip_highlights::{
    GoalInfo, GoalKey, GoalLinkCache, HighlightResolver, ResolverConfig,
};

#[derive(Parser)]
#[command(name = "goalclip", about = "Goal highlight link resolver tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve one goal to an r/soccer clip link
    Resolve {
        #[arg(long)]
        match_id: u64,
        /// Match minute the goal was scored
        #[arg(long)]
        minute: u32,
        #[arg(long)]
        home: String,
        #[arg(long)]
        away: String,
        /// The away side scored (default: home)
        #[arg(long)]
        away_scored: bool,
        /// Kickoff time, RFC 3339 (default: now)
        #[arg(long)]
        kickoff: Option<DateTime<Utc>>,
    },
    /// List cached goal keys and their outcomes
    CacheList,
    /// Drop cache entries
    CacheClear {
        #[arg(long, requires = "minute")]
        match_id: Option<u64>,
        #[arg(long, requires = "match_id")]
        minute: Option<u32>,
        #[arg(long, conflicts_with_all = ["match_id", "minute"])]
        all: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ResolverConfig::from_env();

    match cli.command {
        Command::Resolve { match_id, minute, home, away, away_scored, kickoff } => {
            let goal = GoalInfo {
                match_id,
                minute,
                home_team: home,
                away_team: away,
                is_home_team: !away_scored,
                match_time: kickoff.unwrap_or_else(Utc::now),
            };

            let resolver = HighlightResolver::connect(config).await?;
            match resolver.resolve(&goal).await? {
                Some(link) => {
                    println!("{}", link.url);
                    println!("  title: {}", link.title);
                    println!("  post:  {}", link.post_url);
                }
                None => println!("No clip found for {}", goal.key()),
            }
        }
        Command::CacheList => {
            let cache = GoalLinkCache::open(&config.cache_path)?;
            if cache.is_empty() {
                println!("Cache is empty");
                return Ok(());
            }
            for key in cache.keys() {
                match cache.get(&key).and_then(|outcome| outcome.link().cloned()) {
                    Some(link) => println!("{key}  {}", link.url),
                    None => println!("{key}  (no clip found)"),
                }
            }
        }
        Command::CacheClear { match_id, minute, all } => {
            let cache = GoalLinkCache::open(&config.cache_path)?;
            if all {
                let count = cache.len();
                cache.clear_all()?;
                println!("Cleared {count} entries");
            } else if let (Some(match_id), Some(minute)) = (match_id, minute) {
                let key = GoalKey { match_id, minute };
                cache.clear(&key)?;
                println!("Cleared {key}");
            } else {
                bail!("Specify --match-id and --minute, or --all");
            }
        }
    }

    Ok(())
}
