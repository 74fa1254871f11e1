//! Binary entrypoint for the `grounds` administration tool.
//!
//! Commands:
//! - `init` - write a starter `config.toml` and seed the world store
//! - `create-namespace <name>` - add a universe with its special places
//! - `build <kind> <name> [--namespace N] [args...]` - build an entity
//! - `set-attr <entity> <attrSpec>` - set an attribute, e.g. `hp[INTEGER]=10`
//! - `show <entity>` - print an entity and its attributes
//! - `list [--namespace N]` - list universes, or the entities in one
//! - `export [file]` / `import [file]` - move the world between the store and JSON
//!
//! Entities are named by `<universe>::<uuid>`, or by a bare uuid in the
//! default universe. See the library crate docs for module-level details.
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::info;

use grounds::config::Config;
use grounds::logutil::{escape_log, init_logging};
use grounds::validation::{validate_attr_name, validate_entity_name};
use grounds::world::entity::ATTR_UNIVERSE;
use grounds::world::{
    build_entity, Attr, Entity, EntityKind, EntityRef, Registry, WorldStore, WorldStoreBuilder,
};

#[derive(Parser)]
#[command(name = "grounds")]
#[command(about = "Administer a multi-universe world model")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration and seed the world store
    Init,
    /// Create a universe with its origin, lost+found and guest home
    CreateNamespace { name: String },
    /// Build an entity (thing, place, player, link, extension)
    Build {
        kind: String,
        name: String,
        /// Universe to build in (defaults to the configured one)
        #[arg(short, long)]
        namespace: Option<String>,
        /// Kind-specific build arguments
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Set an attribute from an attrSpec such as `hp[INTEGER]=10`
    SetAttr { entity: String, attr_spec: String },
    /// Show an entity
    Show { entity: String },
    /// List universes, or the entities of one universe
    List {
        #[arg(short, long)]
        namespace: Option<String>,
    },
    /// Write the whole world to a JSON file
    Export { file: Option<PathBuf> },
    /// Replace the stored world with the contents of a JSON file
    Import { file: Option<PathBuf> },
}

/// Open the configured store and load every universe into a fresh registry.
/// Guests never survive a reload.
fn open_world(config: &Config) -> Result<(WorldStore, Registry)> {
    let store = WorldStoreBuilder::new(config.world.store_path())
        .seed_namespace(config.world.default_namespace.clone())
        .open()?;
    let registry = Registry::new();
    store.load_registry(&registry)?;
    for namespace in registry.namespaces() {
        namespace.remove_guests();
    }
    Ok((store, registry))
}

fn entity_ref(config: &Config, text: &str) -> Result<EntityRef> {
    Ok(EntityRef::parse_in(&config.world.default_namespace, text)?)
}

fn print_entity(entity: &Entity, registry: &Registry) -> Result<()> {
    println!("{} {}", entity.kind(), entity.spec());
    println!("  name: {}", entity.name());
    if let Some(description) = entity.description() {
        println!("  description: {}", description);
    }
    match entity.location(registry)? {
        Some(place) => println!("  location: {} ({})", place.name(), place.spec()),
        None => {
            if let Some(dangling) = entity.location_ref()? {
                println!("  location: {} (missing)", dangling);
            }
        }
    }
    println!("  attributes:");
    for attr in entity.attrs() {
        println!("    {}", attr.to_attr_spec());
    }
    let mut contents: Vec<_> = entity.contents().into_iter().collect();
    contents.sort();
    if !contents.is_empty() {
        println!("  contents:");
        let universe = entity.universe_name();
        for id in contents {
            match registry.resolve_ref(&EntityRef::new(universe.clone(), id)) {
                Some(inner) => println!("    {} {} ({})", inner.kind(), inner.name(), id),
                None => println!("    {} (missing)", id),
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Init writes the config, so it cannot be loaded up front.
    let config = match cli.command {
        Commands::Init => None,
        _ => Some(Config::load(&cli.config).await?),
    };
    init_logging(config.as_ref().map(|c| &c.logging), cli.verbose);

    let Some(config) = config else {
        info!("Initializing new world configuration");
        let config = Config::default();
        if tokio::fs::metadata(&cli.config).await.is_ok() {
            return Err(anyhow!("{} already exists; refusing to overwrite", cli.config));
        }
        Config::create_default(&cli.config).await?;
        info!("Configuration file created at {}", cli.config);
        tokio::fs::create_dir_all(&config.world.data_dir).await?;
        let (store, registry) = open_world(&config)?;
        store.save_registry(&registry)?;
        info!(
            "World store ready at {} with universes {:?}",
            config.world.store_path().display(),
            registry.namespace_names()
        );
        return Ok(());
    };

    let (store, registry) = open_world(&config)?;

    match cli.command {
        Commands::Init => {}
        Commands::CreateNamespace { name } => {
            let namespace = registry.create_namespace(&name)?;
            store.save_registry(&registry)?;
            println!("{} origin {}", namespace.name(), namespace.origin()?.spec());
        }
        Commands::Build {
            kind,
            name,
            namespace,
            args,
        } => {
            let kind =
                EntityKind::parse(&kind).ok_or_else(|| anyhow!("unknown entity kind {}", kind))?;
            validate_entity_name(&name)?;
            let namespace = registry.get_namespace(
                namespace
                    .as_deref()
                    .unwrap_or(&config.world.default_namespace),
            )?;
            let entity = build_entity(kind, &name, &namespace, &args, &registry)?;
            let entity = namespace.add_entity(entity);
            store.save_registry(&registry)?;
            info!("Built {} {}", kind, escape_log(&name));
            println!("{}", entity.spec());
        }
        Commands::SetAttr { entity, attr_spec } => {
            let target = entity_ref(&config, &entity)?;
            let entity = registry
                .resolve_ref(&target)
                .ok_or_else(|| anyhow!("no entity {}", target))?;
            let attr = Attr::from_attr_spec(&attr_spec)?;
            validate_attr_name(attr.name())?;
            if attr.name() == ATTR_UNIVERSE {
                return Err(anyhow!("the {} attribute cannot be set by hand", ATTR_UNIVERSE));
            }
            entity.set_attr(attr);
            store.save_registry(&registry)?;
            print_entity(&entity, &registry)?;
        }
        Commands::Show { entity } => {
            let target = entity_ref(&config, &entity)?;
            let entity = registry
                .resolve_ref(&target)
                .ok_or_else(|| anyhow!("no entity {}", target))?;
            print_entity(&entity, &registry)?;
        }
        Commands::List { namespace: None } => {
            for namespace in registry.namespaces() {
                println!("{} ({} entities)", namespace.name(), namespace.len());
            }
            if let Some(saved) = store.saved_at()? {
                println!("last saved {}", saved.format("%Y-%m-%dT%H:%M:%SZ"));
            }
        }
        Commands::List {
            namespace: Some(name),
        } => {
            let namespace = registry.get_namespace(&name)?;
            let mut entities = namespace.entities();
            entities.sort_by_key(|e| (e.kind().as_str(), e.name()));
            for entity in entities {
                println!("{:<10} {:<24} {}", entity.kind(), entity.name(), entity.id());
            }
        }
        Commands::Export { file } => {
            let path = file.unwrap_or_else(|| config.world.world_file_path());
            registry.save_to_file(&path, config.world.safe_save)?;
            println!("exported {} universe(s) to {}", registry.namespaces().len(), path.display());
        }
        Commands::Import { file } => {
            let path = file.unwrap_or_else(|| config.world.world_file_path());
            let loaded = registry.load_from_file(&path)?;
            store.save_registry(&registry)?;
            println!("imported {} universe(s) from {}", loaded, path.display());
        }
    }

    Ok(())
}
