//! Command line front end for the daily arena

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};

use daily_arena::clock::{Clock, FixedClock, SystemClock};
use daily_arena::creation::NewCharacter;
use daily_arena::identity;
use daily_arena::models::Ability;
use daily_arena::narrative::{mentioned_abilities, parse_battle_log, LogLine, Span};
use daily_arena::{Arena, ArenaConfig, ArenaError};

/// Exit status for failures worth retrying later (sysexits EX_TEMPFAIL)
const EXIT_TEMPFAIL: i32 = 75;

#[derive(Parser, Debug)]
#[command(name = "daily-arena", version, about = "One character a day, one battle")]
struct Cli {
    /// Config file (defaults to the app data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pretend today is this day (YYYY-MM-DD)
    #[arg(long, global = true)]
    today: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create today's character
    Create {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
    },
    /// Start today's battle for a character
    Battle {
        /// Defaults to the owner encoded in the character id
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        character: String,
    },
    /// Show a character from today's arena
    Character { id: String },
    /// Show one battle log
    Log { character: String, log: String },
    /// Everything created today
    Today,
    /// An owner's full history
    Book {
        #[arg(long)]
        owner: String,
    },
    /// Admin: all records of a day
    Admin {
        #[arg(long)]
        day: String,
    },
    /// Admin: the last N days
    RecentDays {
        #[arg(long, default_value_t = 30)]
        count: usize,
    },
    /// Admin: remove a character from a day
    Delete {
        #[arg(long)]
        day: String,
        #[arg(long)]
        character: String,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()).await {
        match e.downcast_ref::<ArenaError>() {
            Some(arena_error) => {
                error!("[cli] {}", arena_error);
                eprintln!("{}", arena_error.user_message());
                if arena_error.is_retryable() {
                    std::process::exit(EXIT_TEMPFAIL);
                }
            }
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = ArenaConfig::load(cli.config.as_deref()).map_err(|e| anyhow!(e))?;
    let clock: Arc<dyn Clock> = match &cli.today {
        Some(day) => Arc::new(FixedClock::at_day(day).map_err(|e| anyhow!(e))?),
        None => Arc::new(SystemClock),
    };
    info!("[cli] today is {}", clock.today());

    let arena = Arena::from_config(&config, clock)
        .map_err(|e| anyhow!(e))
        .context("Failed to open arena")?;

    match cli.command {
        Command::Create {
            owner,
            name,
            description,
            author,
            image_url,
        } => {
            let character = arena
                .forge
                .create(NewCharacter {
                    owner,
                    author_name: author,
                    name,
                    description,
                    image_url,
                })
                .await?;
            print_json(&character)?;
        }
        Command::Battle { owner, character } => {
            let owner = match owner {
                Some(owner) => owner,
                None => identity::owner_of(&character)
                    .ok_or(ArenaError::InvalidIdentity)?
                    .to_string(),
            };
            if arena.queries.has_battled(&owner, &character).await? {
                bail!(ArenaError::AlreadyBattled);
            }
            let outcome = arena
                .battles
                .run(&owner, &character)
                .await
                .map_err(|failure| {
                    info!("[cli] battle stopped at stage: {}", failure.stage);
                    failure.error
                })?;
            println!("{} {}", outcome.handle.character_id, outcome.handle.log_id);
            print_log(&outcome.record.log);
        }
        Command::Character { id } => {
            let character = arena.queries.character(&id).await?;
            println!("{} ({})", character.name, character.author_name);
            println!("{}", character.description);
            for raw in &character.abilities {
                let ability = Ability::parse(raw);
                println!("  - {}: {}", ability.name, ability.description);
            }
            println!();
            println!("{}", character.narrative);
            if !character.summary.is_empty() {
                println!();
                println!("{}", character.summary);
            }
        }
        Command::Log { character, log } => {
            let record = arena.queries.battle_log(&character, &log).await?;
            println!("{} vs {}", record.player_a.name, record.player_b.name);
            print_log(&record.log);
            let used = mentioned_abilities(&record.log);
            if !used.is_empty() {
                println!();
                println!("abilities used: {}", used.join(", "));
            }
            if !record.summary.is_empty() {
                println!();
                println!("{}", record.summary);
            }
        }
        Command::Today => print_json(&arena.queries.today_board().await?)?,
        Command::Book { owner } => print_json(&arena.queries.owner_book(&owner).await?)?,
        Command::Admin { day } => print_json(&arena.queries.day_records(&day).await?)?,
        Command::RecentDays { count } => {
            for day in arena.queries.recent_days(count) {
                println!("{}", day);
            }
        }
        Command::Delete { day, character } => {
            arena.queries.delete_character(&day, &character).await?;
            println!("deleted {}", character);
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_spans(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|span| match span {
            Span::Text(text) => text.clone(),
            Span::Ability(name) => format!("[{}]", name),
        })
        .collect()
}

fn print_log(log: &str) {
    for line in parse_battle_log(log) {
        match line {
            LogLine::Break => println!(),
            LogLine::Dialogue(spans) => println!("  \"{}\"", render_spans(&spans)),
            LogLine::Prose(spans) => println!("{}", render_spans(&spans)),
        }
    }
}
