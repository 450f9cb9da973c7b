use crate::cli::LanguageCommands;
use crate::support::{Context, load_store_or_exit, or_exit, print_json, save_store_or_exit};
use eats_core::Language;
use serde_json::json;

pub fn run(ctx: &Context, command: LanguageCommands) {
    match command {
        LanguageCommands::Add {
            code,
            name,
            name_part_types,
            json,
        } => run_add(
            ctx,
            Language::new(code, name).with_name_part_types(name_part_types),
            json,
        ),
    }
}

fn run_add(ctx: &Context, language: Language, json_output: bool) {
    let mut store = load_store_or_exit(&ctx.store_path);
    or_exit(store.add_language(language.clone()), "failed to add language");
    save_store_or_exit(&store, &ctx.store_path);

    if json_output {
        print_json(&json!({
            "action": "language.add",
            "storePath": ctx.store_path.display().to_string(),
            "language": language,
        }));
    } else {
        println!("eats language add\n  Added: {} ({})", language.code, language.name);
        if !language.name_part_types.is_empty() {
            let order: Vec<&str> = language.name_part_types.iter().map(|t| t.as_str()).collect();
            println!("  Name part order: {}", order.join(", "));
        }
        println!("  Path: {}", ctx.store_path.display());
    }
}
