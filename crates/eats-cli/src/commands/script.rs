use crate::cli::ScriptCommands;
use crate::support::{Context, load_store_or_exit, or_exit, print_json, save_store_or_exit};
use eats_core::Script;
use serde_json::json;

pub fn run(ctx: &Context, command: ScriptCommands) {
    match command {
        ScriptCommands::Add {
            code,
            name,
            separator,
            json,
        } => run_add(ctx, code, name, separator, json),
    }
}

fn run_add(ctx: &Context, code: String, name: String, separator: String, json_output: bool) {
    let mut store = load_store_or_exit(&ctx.store_path);
    let script = Script::new(code, name).with_separator(separator);
    or_exit(store.add_script(script.clone()), "failed to add script");
    save_store_or_exit(&store, &ctx.store_path);

    if json_output {
        print_json(&json!({
            "action": "script.add",
            "storePath": ctx.store_path.display().to_string(),
            "script": script,
        }));
    } else {
        println!(
            "eats script add\n  Added: {} ({})\n  Path: {}",
            script.code,
            script.name,
            ctx.store_path.display()
        );
    }
}
