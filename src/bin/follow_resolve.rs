//! follow-resolve
//!
//! Resolves a follow target against a marker snapshot and reports what the
//! viewer would follow.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use follow_resolver::{
    AliasCache, AliasLookup, FileKeyValueStore, FollowOrchestrator, FollowOutcome, FollowResult,
    FollowTarget, HttpAliasLookup, InMemoryRegistry, KeyValueStore, LogFollowAction, NoLookup,
    ResolverConfig,
};

/// CLI configuration
struct Config {
    /// JSON object of marker key -> marker record
    registry: PathBuf,
    /// What to follow
    target: Option<FollowTarget>,
    /// Where the alias cache lives
    cache_dir: Option<PathBuf>,
    /// Skip the remote lookup service
    offline: bool,
}

fn usage() {
    println!("follow-resolve - resolve and follow a player marker");
    println!();
    println!("USAGE:");
    println!("    follow-resolve --registry <FILE> (--player <UUID> | --name <NAME> | --url <URL>) [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -r, --registry <FILE>     Marker snapshot (JSON object of key -> marker)");
    println!("    -p, --player <UUID>       Follow by UUID, dashed or undashed");
    println!("    -n, --name <NAME>         Follow by player name (case-insensitive)");
    println!("    -u, --url <URL>           Viewer URL with follow_player / follow_player_name");
    println!("    -c, --cache-dir <DIR>     Alias cache directory [default: platform cache dir]");
    println!("        --offline             Do not query the remote lookup service");
    println!("    -h, --help                Print help information");
}

fn parse_args() -> Result<Config, String> {
    let args: Vec<String> = std::env::args().collect();
    let mut registry = None;
    let mut player = None;
    let mut name = None;
    let mut url_target = None;
    let mut cache_dir = None;
    let mut offline = false;

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = || {
            args.get(i + 1)
                .cloned()
                .ok_or_else(|| format!("{flag} requires a value"))
        };
        match flag {
            "--registry" | "-r" => registry = Some(PathBuf::from(value()?)),
            "--player" | "-p" => player = Some(value()?),
            "--name" | "-n" => name = Some(value()?),
            "--url" | "-u" => {
                url_target = FollowTarget::from_url(&value()?).map_err(|e| e.to_string())?;
            }
            "--cache-dir" | "-c" => cache_dir = Some(PathBuf::from(value()?)),
            "--offline" => {
                offline = true;
                i += 1;
                continue;
            }
            "--help" | "-h" => {
                usage();
                std::process::exit(0);
            }
            arg => return Err(format!("unknown argument: {arg}")),
        }
        i += 2;
    }

    let registry = registry.ok_or_else(|| "--registry is required".to_string())?;
    // Same precedence as the viewer: identifier first, then alias.
    let target = player
        .map(FollowTarget::Identifier)
        .or_else(|| name.map(FollowTarget::Alias))
        .or(url_target);

    Ok(Config {
        registry,
        target,
        cache_dir,
        offline,
    })
}

async fn run(config: Config) -> FollowResult<FollowOutcome> {
    let resolver_config = ResolverConfig::default().validate()?;

    let text = std::fs::read_to_string(&config.registry).map_err(follow_resolver::StorageError::from)?;
    let registry = Arc::new(InMemoryRegistry::from_json(&text)?);

    let store: Arc<dyn KeyValueStore> = Arc::new(match config.cache_dir {
        Some(dir) => FileKeyValueStore::open(dir)?,
        None => FileKeyValueStore::open_default()?,
    });
    let cache = Arc::new(AliasCache::from_config(store, &resolver_config));

    let lookup: Arc<dyn AliasLookup> = if config.offline {
        Arc::new(NoLookup)
    } else {
        Arc::new(HttpAliasLookup::from_config(&resolver_config)?)
    };

    let orchestrator = FollowOrchestrator::builder()
        .registry(registry)
        .cache(cache)
        .lookup(lookup)
        .action(Arc::new(LogFollowAction))
        .config(resolver_config)
        .build()?;

    Ok(orchestrator.run(config.target).await)
}

fn report(outcome: &FollowOutcome) -> ExitCode {
    match outcome {
        FollowOutcome::Followed {
            key,
            id,
            alias,
            via_fallback,
            ..
        } => {
            println!(
                "following {} ({}) at key {key}{}",
                alias.as_deref().unwrap_or("<unknown>"),
                id.to_display(),
                if *via_fallback { " [re-resolved by name]" } else { "" }
            );
            ExitCode::SUCCESS
        }
        FollowOutcome::NoTarget => {
            println!("nothing to follow");
            ExitCode::SUCCESS
        }
        FollowOutcome::NoRegistry => {
            println!("no marker registry available");
            ExitCode::from(1)
        }
        FollowOutcome::AliasNotFound {
            alias,
            available_keys,
        } => {
            println!("player name not found: {alias}");
            println!("available markers: {available_keys:?}");
            ExitCode::from(1)
        }
        FollowOutcome::EntityNotFound { id, available_keys } => {
            println!("player not found: {}", id.to_display());
            println!("available markers: {available_keys:?}");
            ExitCode::from(1)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = match parse_args() {
        Ok(config) => config,
        Err(message) => {
            eprintln!("error: {message}");
            eprintln!("run with --help for usage");
            return ExitCode::from(2);
        }
    };

    match run(config).await {
        Ok(outcome) => report(&outcome),
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}
