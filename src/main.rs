use color_eyre::{eyre::eyre, Result};
use easycorkage::{
    api::ConfiguredLookup,
    config::{Config, DEFAULT_CONFIG_PATH},
    db::Database,
    location,
    logging::{self, DEFAULT_LOG_DIR},
    place::extract_place_id,
    Resolver,
};
use std::path::PathBuf;
use tracing::{error, info};

const USAGE: &str = "\
Usage: easycorkage [--config <path>] [--log-dir <dir>] [-v|--verbose] <command>

Commands:
  resolve [--json] <url>  Extract a coordinate from a map URL
  place-id <url>          Print the place ID carried by a map URL
  import <csv>            Seed the restaurant store from a CSV file
  locate [--write]        Resolve every stored restaurant, optionally saving new coordinates
";

#[derive(Debug, PartialEq)]
enum Command {
    Help,
    Resolve { url: String, json: bool },
    PlaceId { url: String },
    Import { csv: PathBuf },
    Locate { write: bool },
}

#[derive(Debug, PartialEq)]
struct Cli {
    config: PathBuf,
    log_dir: PathBuf,
    verbose: bool,
    command: Command,
}

fn parse_cli(mut args: pico_args::Arguments) -> Result<Cli> {
    let help = args.contains(["-h", "--help"]);
    let verbose = args.contains(["-v", "--verbose"]);
    let config = args
        .opt_value_from_str("--config")?
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let log_dir = args
        .opt_value_from_str("--log-dir")?
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR));

    if help {
        return Ok(Cli {
            config,
            log_dir,
            verbose,
            command: Command::Help,
        });
    }

    let command = match args.subcommand()?.as_deref() {
        Some("resolve") => {
            let json = args.contains("--json");
            Command::Resolve {
                url: args.free_from_str()?,
                json,
            }
        }
        Some("place-id") => Command::PlaceId {
            url: args.free_from_str()?,
        },
        Some("import") => Command::Import {
            csv: args.free_from_str()?,
        },
        Some("locate") => Command::Locate {
            write: args.contains("--write"),
        },
        Some(other) => return Err(eyre!("Unknown command '{other}'\n\n{USAGE}")),
        None => Command::Help,
    };

    let rest = args.finish();
    if !rest.is_empty() {
        return Err(eyre!("Unexpected arguments: {:?}\n\n{USAGE}", rest));
    }

    Ok(Cli {
        config,
        log_dir,
        verbose,
        command,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = parse_cli(pico_args::Arguments::from_env())?;
    if cli.command == Command::Help {
        print!("{USAGE}");
        return Ok(());
    }

    let _log_guard = logging::initialize_logging(&cli.log_dir, cli.verbose)?;
    let config = Config::load(&cli.config);

    let result = run(&config, cli.command).await;
    if let Err(e) = &result {
        error!("Command failed: {:?}", e);
    }
    result
}

async fn run(config: &Config, command: Command) -> Result<()> {
    match command {
        Command::Help => {
            print!("{USAGE}");
            Ok(())
        }
        Command::Resolve { url, json } => resolve(config, url, json).await,
        Command::PlaceId { url } => {
            println!("{}", extract_place_id(&url).unwrap_or("none"));
            Ok(())
        }
        Command::Import { csv } => {
            let db = Database::open(&config.store.db_path)?;
            let count = db.import_csv(&csv)?;
            println!("Imported {count} restaurants into {}", config.store.db_path);
            Ok(())
        }
        Command::Locate { write } => locate_all(config, write).await,
    }
}

fn build_resolver(config: &Config) -> Result<Resolver<ConfiguredLookup>> {
    let extractor = config.geo.extractor();
    let lookup = ConfiguredLookup::from_config(&config.lookup, *extractor.bounds())?;
    Ok(Resolver::new(extractor, lookup))
}

async fn resolve(config: &Config, url: String, json: bool) -> Result<()> {
    let resolver = build_resolver(config)?;
    let resolution = resolver.locate(&url).await;
    info!("{} -> {}", url, resolution);
    if json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
    } else {
        println!("{resolution}");
    }
    Ok(())
}

async fn locate_all(config: &Config, write: bool) -> Result<()> {
    let db = Database::open(&config.store.db_path)?;
    let resolver = build_resolver(config)?;
    let restaurants = db.restaurants()?;

    let (mut resolved, mut updated) = (0, 0);
    for restaurant in &restaurants {
        let (resolution, was_updated) = if write {
            let located = location::refresh_location(&db, &resolver, restaurant).await?;
            (located.resolution, located.updated)
        } else {
            (location::locate_restaurant(&resolver, restaurant).await, false)
        };

        if resolution.is_resolved() {
            resolved += 1;
        }
        if was_updated {
            updated += 1;
        }
        println!("{:<32} {}", restaurant.name, resolution);
    }

    println!(
        "{resolved}/{} resolved, {updated} updated, {} distinct URLs parsed",
        restaurants.len(),
        resolver.extractions()
    );
    Ok(())
}
