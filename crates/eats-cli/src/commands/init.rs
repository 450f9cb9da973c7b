use crate::config::Config;
use crate::support::{Context, print_json, yes_no};
use eats_store::MemoryStore;
use serde_json::json;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct InitOutcome {
    pub config_path: PathBuf,
    pub store_path: PathBuf,
    pub created_config: bool,
    pub created_store: bool,
}

/// Write the config (if absent) and an empty store (if absent).
pub fn init_layout(
    config_path: &Path,
    config: &Config,
    store_path: &Path,
) -> Result<InitOutcome, String> {
    let mut created_config = false;
    if !config_path.exists() {
        let mut config = config.clone();
        config.store.path = store_path.to_path_buf();
        config
            .save(config_path)
            .map_err(|e| format!("failed to initialize config: {e}"))?;
        created_config = true;
    } else if !config_path.is_file() {
        return Err(format!(
            "config path exists but is not a file: {}",
            config_path.display()
        ));
    }

    if store_path.exists() && !store_path.is_file() {
        return Err(format!(
            "store path exists but is not a file: {}",
            store_path.display()
        ));
    }
    let mut created_store = false;
    if !store_path.exists() {
        MemoryStore::new()
            .save_jsonl(store_path)
            .map_err(|e| format!("failed to initialize {}: {e}", store_path.display()))?;
        created_store = true;
    }

    Ok(InitOutcome {
        config_path: config_path.to_path_buf(),
        store_path: store_path.to_path_buf(),
        created_config,
        created_store,
    })
}

pub fn run(ctx: &Context, json_output: bool) {
    let outcome =
        init_layout(&ctx.config_path, &ctx.config, &ctx.store_path).unwrap_or_else(|e| {
            eprintln!("error: {e}");
            std::process::exit(1);
        });

    if json_output {
        print_json(&json!({
            "action": "init",
            "configPath": outcome.config_path.display().to_string(),
            "storePath": outcome.store_path.display().to_string(),
            "createdConfig": outcome.created_config,
            "createdStore": outcome.created_store,
        }));
    } else {
        println!("eats init");
        println!();
        println!("  config path: {}", outcome.config_path.display());
        println!("  store path: {}", outcome.store_path.display());
        println!("  created config: {}", yes_no(outcome.created_config));
        println!("  created store: {}", yes_no(outcome.created_store));
    }
}
