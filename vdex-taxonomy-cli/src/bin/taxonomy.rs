use clap::{Arg, ArgAction, ArgMatches, Command};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use vdex_taxonomy::{
    TaxonomyConfig, TaxonomyRegistry, TermId, load_taxonomy_from_file, save_taxonomy_to_file,
};

fn cli() -> Command {
    Command::new("taxonomy")
        .version("0.1.0")
        .about("Import, export and inspect multi-language VDEX taxonomies")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .help("JSON configuration file"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .help("Log import and export details")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("import")
                .about("Import a VDEX file and save it as a JSON snapshot")
                .arg(Arg::new("xml").help("VDEX file").required(true).index(1))
                .arg(
                    Arg::new("snapshot")
                        .long("snapshot")
                        .short('s')
                        .help("Snapshot file to write")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Print a JSON snapshot as a VDEX document")
                .arg(Arg::new("snapshot").help("Snapshot file").required(true).index(1)),
        )
        .subcommand(
            Command::new("translate")
                .about("Print the display path of one term")
                .arg(Arg::new("xml").help("VDEX file").required(true).index(1))
                .arg(
                    Arg::new("id")
                        .help("Term identifier")
                        .required(true)
                        .index(2)
                        .value_parser(clap::value_parser!(TermId)),
                )
                .arg(
                    Arg::new("language")
                        .help("Language code (e.g., en, fr, pt-BR)")
                        .required(true)
                        .index(3),
                ),
        )
        .subcommand(
            Command::new("list")
                .about("List the terms of a VDEX file in one language")
                .arg(Arg::new("xml").help("VDEX file").required(true).index(1))
                .arg(
                    Arg::new("language")
                        .long("language")
                        .short('l')
                        .help("Language code (default: the taxonomy's default language)"),
                ),
        )
        .subcommand(
            Command::new("bundle-export")
                .about("Write JSON snapshots into a bundle directory of VDEX files")
                .arg(Arg::new("dir").help("Bundle directory").required(true).index(1))
                .arg(
                    Arg::new("snapshots")
                        .help("Snapshot files")
                        .required(true)
                        .num_args(1..)
                        .index(2),
                ),
        )
        .subcommand(
            Command::new("bundle-import")
                .about("Import every VDEX file of a bundle directory")
                .arg(Arg::new("dir").help("Bundle directory").required(true).index(1))
                .arg(
                    Arg::new("snapshots")
                        .long("snapshots")
                        .help("Directory to write one JSON snapshot per taxonomy into"),
                ),
        )
}

fn string_arg<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str, Box<dyn Error>> {
    matches
        .get_one::<String>(name)
        .map(|value| value.as_str())
        .ok_or_else(|| format!("Missing argument <{}>", name).into())
}

fn load_config(matches: &ArgMatches) -> Result<TaxonomyConfig, Box<dyn Error>> {
    match matches.get_one::<String>("config") {
        Some(path) => Ok(TaxonomyConfig::from_file(Path::new(path))?),
        None => Ok(TaxonomyConfig::default()),
    }
}

/// Import one VDEX file into a fresh registry, returning the taxonomy's name
fn import_file(registry: &mut TaxonomyRegistry, path: &str) -> Result<String, Box<dyn Error>> {
    let xml = fs::read(path).map_err(|e| format!("Failed to read {}: {}", path, e))?;
    Ok(registry.import_document(&xml, false)?)
}

fn run_import(matches: &ArgMatches, config: TaxonomyConfig) -> Result<(), Box<dyn Error>> {
    let xml = string_arg(matches, "xml")?;
    let snapshot = PathBuf::from(string_arg(matches, "snapshot")?);

    let mut registry = TaxonomyRegistry::new(config);
    let name = import_file(&mut registry, xml)?;
    let taxonomy = registry
        .get(&name)
        .ok_or_else(|| format!("Taxonomy '{}' was not registered", name))?;

    save_taxonomy_to_file(&snapshot, taxonomy)?;
    info!(
        "Saved taxonomy '{}' ({} entries, languages: {:?}) to {}",
        name,
        taxonomy.tree().len(),
        taxonomy.languages(),
        snapshot.display()
    );
    Ok(())
}

fn run_export(matches: &ArgMatches, config: TaxonomyConfig) -> Result<(), Box<dyn Error>> {
    let snapshot = string_arg(matches, "snapshot")?;
    let taxonomy = load_taxonomy_from_file(Path::new(snapshot), &config)?;
    print!("{}", taxonomy.export_document()?);
    Ok(())
}

fn run_translate(matches: &ArgMatches, config: TaxonomyConfig) -> Result<(), Box<dyn Error>> {
    let xml = string_arg(matches, "xml")?;
    let identifier = *matches
        .get_one::<TermId>("id")
        .ok_or("Missing argument <id>")?;
    let language = string_arg(matches, "language")?;

    let mut registry = TaxonomyRegistry::new(config);
    let name = import_file(&mut registry, xml)?;
    let taxonomy = registry
        .get(&name)
        .ok_or_else(|| format!("Taxonomy '{}' was not registered", name))?;

    let title = taxonomy.translate(identifier, language);
    if title.is_empty() {
        return Err(format!("Term {} has no caption in '{}'", identifier, language).into());
    }
    println!("{}", title);
    Ok(())
}

fn run_list(matches: &ArgMatches, config: TaxonomyConfig) -> Result<(), Box<dyn Error>> {
    let xml = string_arg(matches, "xml")?;
    let language = matches.get_one::<String>("language").map(|s| s.as_str());

    let mut registry = TaxonomyRegistry::new(config);
    let name = import_file(&mut registry, xml)?;
    let taxonomy = registry
        .get(&name)
        .ok_or_else(|| format!("Taxonomy '{}' was not registered", name))?;

    let vocabulary = taxonomy.vocabulary(language);
    debug!(
        "Listing {} terms of '{}' in {:?}",
        vocabulary.len(),
        vocabulary.name(),
        vocabulary.language()
    );
    for term in vocabulary.iter() {
        println!("{}\t{}", term.identifier, term.title);
    }
    Ok(())
}

fn run_bundle_export(matches: &ArgMatches, config: TaxonomyConfig) -> Result<(), Box<dyn Error>> {
    let dir = PathBuf::from(string_arg(matches, "dir")?);
    let snapshots = matches
        .get_many::<String>("snapshots")
        .ok_or("Missing argument <snapshots>")?;

    let mut registry = TaxonomyRegistry::new(config.clone());
    for snapshot in snapshots {
        let taxonomy = load_taxonomy_from_file(Path::new(snapshot), &config)?;
        if let Some(previous) = registry.insert(taxonomy) {
            info!("Snapshot {} replaces taxonomy '{}'", snapshot, previous.name());
        }
    }

    for path in registry.export_bundle(&dir)? {
        println!("{}", path.display());
    }
    Ok(())
}

fn run_bundle_import(matches: &ArgMatches, config: TaxonomyConfig) -> Result<(), Box<dyn Error>> {
    let dir = PathBuf::from(string_arg(matches, "dir")?);
    let snapshots = matches.get_one::<String>("snapshots").map(PathBuf::from);

    let mut registry = TaxonomyRegistry::new(config);
    let names = registry.import_bundle(&dir, false)?;

    if let Some(snapshots) = &snapshots {
        fs::create_dir_all(snapshots)
            .map_err(|e| format!("Failed to create {}: {}", snapshots.display(), e))?;
    }
    for name in &names {
        let taxonomy = registry
            .get(name)
            .ok_or_else(|| format!("Taxonomy '{}' was not registered", name))?;
        println!("{}\t{}", name, taxonomy.tree().len());

        if let Some(snapshots) = &snapshots {
            let path = snapshots.join(format!("{}.json", taxonomy.vocabulary_identifier()));
            save_taxonomy_to_file(&path, taxonomy)?;
            debug!("Saved snapshot {}", path.display());
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let matches = cli().get_matches();

    let level = if matches.get_flag("verbose") {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();

    let config = load_config(&matches)?;

    match matches.subcommand() {
        Some(("import", sub)) => run_import(sub, config),
        Some(("export", sub)) => run_export(sub, config),
        Some(("translate", sub)) => run_translate(sub, config),
        Some(("list", sub)) => run_list(sub, config),
        Some(("bundle-export", sub)) => run_bundle_export(sub, config),
        Some(("bundle-import", sub)) => run_bundle_import(sub, config),
        _ => Err("Unknown command".into()),
    }
}
