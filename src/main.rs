use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rootcause::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crewremap::config::{DataPaths, load_all};
use crewremap::modpack::{MODPACK_FILE_NAME, build_modpack};

/// Swap voiced crew members between each other and package the result as a .wotmod
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding `mo/`, `special_voices.xml` and `tankmen/`
    #[clap(short, long, default_value = ".")]
    data_dir: PathBuf,

    /// Override the translation catalog directory
    #[clap(long)]
    catalogs: Option<PathBuf>,

    /// Override the special voices file
    #[clap(long)]
    voices: Option<PathBuf>,

    /// Override the nation crew file directory
    #[clap(long)]
    tankmen: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every crew member that can be swapped, ordered by name
    List {
        /// Print JSON instead of tab-separated text
        #[clap(long)]
        json: bool,
    },
    /// Build a modpack from SOURCE=TARGET swaps
    Build {
        /// Swaps of the form `source_slug=target_slug`
        #[clap(value_parser = parse_swap)]
        swaps: Vec<(String, String)>,

        /// JSON object of additional `{"source": "target"}` swaps
        #[clap(short, long)]
        mapping: Option<PathBuf>,

        /// Where to write the archive
        #[clap(short, long, default_value = MODPACK_FILE_NAME)]
        output: PathBuf,
    },
}

fn parse_swap(arg: &str) -> Result<(String, String), String> {
    arg.split_once('=')
        .map(|(source, target)| (source.to_string(), target.to_string()))
        .ok_or_else(|| format!("expected source=target, got {arg:?}"))
}

fn data_paths(args: &Args) -> DataPaths {
    let defaults = DataPaths::from_base_dir(&args.data_dir);
    DataPaths::builder()
        .catalogs_dir(args.catalogs.clone().unwrap_or(defaults.catalogs_dir))
        .voices_file(args.voices.clone().unwrap_or(defaults.voices_file))
        .tankmen_dir(args.tankmen.clone().unwrap_or(defaults.tankmen_dir))
        .build()
}

fn main() -> Result<(), Report> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let data = load_all(&data_paths(&args))?;

    match args.command {
        Command::List { json } => {
            let listing = data.roster.listing();
            if json {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                for tankman in listing {
                    println!(
                        "{}\t{} {}\t{}",
                        tankman.slug, tankman.first_name, tankman.last_name, tankman.icon
                    );
                }
            }
        }
        Command::Build {
            swaps,
            mapping,
            output,
        } => {
            let mut form: BTreeMap<String, String> = match mapping {
                Some(path) => {
                    let raw = std::fs::read(&path)
                        .context_with(|| format!("Failed to read mapping file {}", path.display()))?;
                    serde_json::from_slice::<BTreeMap<String, String>>(&raw)
                        .context_with(|| format!("Mapping file {} is not a JSON object of strings", path.display()))?
                }
                None => BTreeMap::new(),
            };
            form.extend(swaps);

            let archive = build_modpack(&data.roster, &form).context("Failed to build modpack")?;
            std::fs::write(&output, &archive)
                .context_with(|| format!("Failed to write {}", output.display()))?;
            info!(path = %output.display(), bytes = archive.len(), "wrote modpack");
        }
    }

    Ok(())
}
