use clap::{Args, Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_PATH;

#[derive(Parser)]
#[command(
    name = "eats",
    about = "EATS: entity authority records with name-form search and preferred-name resolution",
    version
)]
pub struct Cli {
    /// Path to the TOML config
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Path to the store JSONL (overrides the config)
    #[arg(long, global = true)]
    pub store: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the config file and an empty store
    Init {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage languages
    Language {
        #[command(subcommand)]
        command: LanguageCommands,
    },

    /// Manage scripts
    Script {
        #[command(subcommand)]
        command: ScriptCommands,
    },

    /// Manage authorities
    Authority {
        #[command(subcommand)]
        command: AuthorityCommands,
    },

    /// Manage entities and their non-name properties
    Entity {
        #[command(subcommand)]
        command: EntityCommands,
    },

    /// Manage name assertions
    Name {
        #[command(subcommand)]
        command: NameCommands,
    },

    /// Find entities whose names match a query
    Lookup {
        /// Search text; every word must prefix a word of some name
        query: String,

        /// Restrict to entities of this type (repeatable)
        #[arg(long = "entity-type")]
        entity_types: Vec<String>,

        #[command(flatten)]
        preferences: PreferenceArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the index forms generated for a name
    Forms {
        /// Name text
        name: String,

        /// Language code of the name
        #[arg(long)]
        language: Option<String>,

        /// Script code of the name
        #[arg(long)]
        script: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Regenerate the name index from stored names
    Reindex {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum LanguageCommands {
    /// Register a language
    Add {
        /// Language code (e.g. `en`, `mi`)
        code: String,

        /// Human-readable name
        name: String,

        /// Name part type, in display order (repeatable)
        #[arg(long = "name-part-type")]
        name_part_types: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum ScriptCommands {
    /// Register a script
    Add {
        /// Script code (e.g. `Latn`)
        code: String,

        /// Human-readable name
        name: String,

        /// Separator placed between name parts
        #[arg(long, default_value = " ")]
        separator: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum AuthorityCommands {
    /// Register an authority
    Add {
        #[command(flatten)]
        authority: AuthorityArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replace an authority's name and enabled components
    Update {
        #[command(flatten)]
        authority: AuthorityArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Clone, Debug)]
pub struct AuthorityArgs {
    /// Authority identifier
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Enabled language code (repeatable)
    #[arg(long = "language")]
    pub languages: Vec<String>,

    /// Enabled script code (repeatable)
    #[arg(long = "script")]
    pub scripts: Vec<String>,

    /// Enabled name type (repeatable)
    #[arg(long = "name-type")]
    pub name_types: Vec<String>,

    /// Enabled name part type (repeatable)
    #[arg(long = "name-part-type")]
    pub name_part_types: Vec<String>,

    /// Enabled entity type (repeatable)
    #[arg(long = "entity-type")]
    pub entity_types: Vec<String>,

    /// Enabled relationship type (repeatable)
    #[arg(long = "relationship-type")]
    pub relationship_types: Vec<String>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum EntityCommands {
    /// Create an entity
    Add {
        /// Authority asserting the entity's existence
        #[arg(long)]
        authority: String,

        /// Entity type to assert along with it
        #[arg(long)]
        entity_type: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show an entity's preferred name and all of its properties
    Show {
        /// Entity ID
        id: u64,

        #[command(flatten)]
        preferences: PreferenceArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Merge `source` into `target`
    Merge {
        /// Entity that receives the assertions
        target: u64,

        /// Entity that is retired
        source: u64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove an entity and every assertion about it
    Remove {
        /// Entity ID
        id: u64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Assert a relationship from one entity to another
    Relate {
        /// Domain entity ID
        domain: u64,

        /// Relationship type
        relationship_type: String,

        /// Range entity ID
        range: u64,

        /// Authority making the assertion
        #[arg(long)]
        authority: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Attach a free-text note
    Note {
        /// Entity ID
        id: u64,

        /// Note text
        note: String,

        /// Authority making the assertion
        #[arg(long)]
        authority: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum NameCommands {
    /// Assert a name for an entity
    Add {
        /// Entity ID
        entity: u64,

        /// Display form of the name; may be omitted when parts are given
        form: Option<String>,

        /// Name part as TYPE=FORM, in the name's language and script (repeatable)
        #[arg(long = "part", value_parser = parse_name_part)]
        parts: Vec<(String, String)>,

        /// Authority making the assertion
        #[arg(long)]
        authority: String,

        /// Language code
        #[arg(long)]
        language: String,

        /// Script code
        #[arg(long)]
        script: String,

        /// Name type
        #[arg(long, default_value = "regular")]
        name_type: String,

        /// Do not mark the name as preferred
        #[arg(long)]
        not_preferred: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change an existing name; omitted fields keep their values
    Update {
        /// Assertion ID
        assertion: u64,

        /// New display form
        form: Option<String>,

        /// Language code
        #[arg(long)]
        language: Option<String>,

        /// Script code
        #[arg(long)]
        script: Option<String>,

        /// Name type
        #[arg(long)]
        name_type: Option<String>,

        /// Replacement name part as TYPE=FORM (repeatable)
        #[arg(long = "part", value_parser = parse_name_part)]
        parts: Vec<(String, String)>,

        /// Mark the name as preferred
        #[arg(long, conflicts_with = "not_preferred")]
        preferred: bool,

        /// Clear the name's preferred flag
        #[arg(long)]
        not_preferred: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove a name assertion and its index rows
    Remove {
        /// Assertion ID
        assertion: u64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Display preferences; unset flags fall back to the config.
#[derive(Args, Clone, Debug, Default)]
pub struct PreferenceArgs {
    /// Preferred authority
    #[arg(long)]
    pub prefer_authority: Option<String>,

    /// Preferred language code
    #[arg(long)]
    pub prefer_language: Option<String>,

    /// Preferred script code
    #[arg(long)]
    pub prefer_script: Option<String>,
}

/// Parse `TYPE=FORM` into its two halves.
fn parse_name_part(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((part_type, form)) if !part_type.is_empty() && !form.is_empty() => {
            Ok((part_type.to_string(), form.to_string()))
        }
        _ => Err(format!("expected TYPE=FORM, got `{raw}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_name_part_splits_on_first_equals() {
        assert_eq!(
            parse_name_part("given=Jean=Paul"),
            Ok(("given".to_string(), "Jean=Paul".to_string()))
        );
        assert!(parse_name_part("given").is_err());
        assert!(parse_name_part("=Bach").is_err());
    }
}
