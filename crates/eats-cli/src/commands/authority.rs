use crate::cli::{AuthorityArgs, AuthorityCommands};
use crate::support::{Context, load_store_or_exit, or_exit, print_json, save_store_or_exit};
use eats_core::Authority;
use serde_json::json;

pub fn run(ctx: &Context, command: AuthorityCommands) {
    match command {
        AuthorityCommands::Add { authority, json } => run_write(ctx, authority, false, json),
        AuthorityCommands::Update { authority, json } => run_write(ctx, authority, true, json),
    }
}

fn build_authority(args: AuthorityArgs) -> Authority {
    Authority::new(args.id, args.name)
        .with_languages(args.languages)
        .with_scripts(args.scripts)
        .with_name_types(args.name_types)
        .with_name_part_types(args.name_part_types)
        .with_entity_types(args.entity_types)
        .with_relationship_types(args.relationship_types)
}

fn run_write(ctx: &Context, args: AuthorityArgs, update: bool, json_output: bool) {
    let mut store = load_store_or_exit(&ctx.store_path);
    let authority = build_authority(args);
    let action = if update {
        or_exit(
            store.update_authority(authority.clone()),
            "failed to update authority",
        );
        "authority.update"
    } else {
        or_exit(
            store.add_authority(authority.clone()),
            "failed to add authority",
        );
        "authority.add"
    };
    save_store_or_exit(&store, &ctx.store_path);

    if json_output {
        print_json(&json!({
            "action": action,
            "storePath": ctx.store_path.display().to_string(),
            "authority": authority,
        }));
    } else {
        let join = |items: Vec<&str>| {
            if items.is_empty() {
                "(none)".to_string()
            } else {
                items.join(", ")
            }
        };
        println!("eats {}", action.replace('.', " "));
        println!("  Authority: {} ({})", authority.id, authority.name);
        println!(
            "  Languages: {}",
            join(authority.languages.iter().map(|c| c.as_str()).collect())
        );
        println!(
            "  Scripts: {}",
            join(authority.scripts.iter().map(|c| c.as_str()).collect())
        );
        println!(
            "  Name types: {}",
            join(authority.name_types.iter().map(|c| c.as_str()).collect())
        );
        println!(
            "  Name part types: {}",
            join(authority.name_part_types.iter().map(|c| c.as_str()).collect())
        );
        println!(
            "  Entity types: {}",
            join(authority.entity_types.iter().map(|c| c.as_str()).collect())
        );
        println!("  Path: {}", ctx.store_path.display());
    }
}
