use eats_core::{EntityId, NamePreferences, PreferredName};
use eats_store::MemoryStore;
use serde_json::{Value, json};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cli::PreferenceArgs;
use crate::config::Config;

/// Resolved global options shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub config_path: PathBuf,
    pub config: Config,
    pub store_path: PathBuf,
}

impl Context {
    pub fn preferences(&self, args: &PreferenceArgs) -> NamePreferences {
        NamePreferences::new(
            args.prefer_authority.as_deref().map(Into::into),
            args.prefer_language.as_deref().map(Into::into),
            args.prefer_script.as_deref().map(Into::into),
        )
        .or(&self.config.preferences)
    }
}

pub fn context_or_exit(config_arg: &str, store_arg: Option<&str>) -> Context {
    let config_path = PathBuf::from(config_arg);
    let config = Config::load(&config_path).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    });
    let store_path = store_arg
        .map(PathBuf::from)
        .unwrap_or_else(|| config.store.path.clone());
    Context {
        config_path,
        config,
        store_path,
    }
}

pub fn load_store_or_exit(path: &Path) -> MemoryStore {
    if !path.exists() {
        eprintln!(
            "error: store file not found: {} (run `eats init` first)",
            path.display()
        );
        std::process::exit(1);
    }
    let store = MemoryStore::load_jsonl(path).unwrap_or_else(|e| {
        eprintln!("error: failed to load {}: {e}", path.display());
        std::process::exit(1);
    });
    debug!(
        path = %path.display(),
        entities = store.len(),
        index_rows = store.index().row_count(),
        "loaded store"
    );
    store
}

pub fn save_store_or_exit(store: &MemoryStore, path: &Path) {
    store.save_jsonl(path).unwrap_or_else(|e| {
        eprintln!("error: failed to save {}: {e}", path.display());
        std::process::exit(1);
    });
}

/// Unwrap `result` or print `error: {what}: {e}` and exit 1.
pub fn or_exit<T, E: Display>(result: Result<T, E>, what: &str) -> T {
    result.unwrap_or_else(|e| {
        eprintln!("error: {what}: {e}");
        std::process::exit(1);
    })
}

pub fn print_json(payload: &Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(payload).expect("json serialization")
    );
}

/// The display form of `preferred`, assembling names kept as parts.
pub fn preferred_form(store: &MemoryStore, preferred: PreferredName<'_>) -> String {
    match preferred.assertion() {
        Some(assertion) => store.assembled_form(&assertion.name).into_owned(),
        None => preferred.form().to_string(),
    }
}

pub fn preferred_name_payload(store: &MemoryStore, preferred: PreferredName<'_>) -> Value {
    match preferred.assertion() {
        Some(assertion) => json!({
            "assertionId": assertion.id(),
            "form": store.assembled_form(&assertion.name),
            "language": assertion.name.language,
            "script": assertion.name.script,
            "authority": assertion.authority(),
        }),
        None => json!({
            "assertionId": null,
            "form": preferred.form(),
        }),
    }
}

/// `#id preferred-form` for one line of text output.
pub fn entity_label(store: &MemoryStore, id: EntityId, preferences: &NamePreferences) -> String {
    let preferred = store
        .preferred_name(id, preferences)
        .map(|p| preferred_form(store, p))
        .unwrap_or_default();
    format!("#{id} {preferred}")
}

pub fn yes_no(ok: bool) -> &'static str {
    if ok { "yes" } else { "no" }
}
