use crate::cli::NameCommands;
use crate::support::{Context, load_store_or_exit, or_exit, print_json, save_store_or_exit};
use eats_core::{AssertionId, AuthorityId, EntityId, Name, NamePart};
use serde_json::json;

pub fn run(ctx: &Context, command: NameCommands) {
    match command {
        NameCommands::Add {
            entity,
            form,
            parts,
            authority,
            language,
            script,
            name_type,
            not_preferred,
            json,
        } => {
            let name_parts = build_parts(&parts, &language, &script);
            run_add(
                ctx,
                EntityId(entity),
                AuthorityId::new(authority),
                Name::new(form.unwrap_or_default(), language, script, name_type)
                    .with_parts(name_parts),
                !not_preferred,
                json,
            )
        }

        NameCommands::Update {
            assertion,
            form,
            language,
            script,
            name_type,
            parts,
            preferred,
            not_preferred,
            json,
        } => run_update(
            ctx,
            UpdateArgs {
                assertion: AssertionId(assertion),
                form,
                language,
                script,
                name_type,
                parts,
                is_preferred: match (preferred, not_preferred) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
            },
            json,
        ),

        NameCommands::Remove { assertion, json } => {
            run_remove(ctx, AssertionId(assertion), json)
        }
    }
}

/// Parts from `TYPE=FORM` pairs. Each part is numbered within its type
/// in the order given.
fn build_parts(parts: &[(String, String)], language: &str, script: &str) -> Vec<NamePart> {
    let mut built: Vec<NamePart> = Vec::new();
    for (part_type, form) in parts {
        let earlier = built
            .iter()
            .filter(|part| part.name_part_type.as_str() == part_type.as_str())
            .count();
        let order = u32::try_from(earlier).unwrap_or(u32::MAX).saturating_add(1);
        built.push(NamePart::new(
            part_type.as_str(),
            form.as_str(),
            language,
            script,
            order,
        ));
    }
    built
}

fn run_add(
    ctx: &Context,
    entity: EntityId,
    authority: AuthorityId,
    name: Name,
    is_preferred: bool,
    json_output: bool,
) {
    let mut store = load_store_or_exit(&ctx.store_path);
    let assertion = or_exit(
        store.create_name_assertion(entity, &authority, name.clone(), is_preferred),
        "failed to add name",
    );
    save_store_or_exit(&store, &ctx.store_path);
    let terms: Vec<&str> = store.index().terms(assertion).collect();
    let form = store.assembled_form(&name);

    if json_output {
        print_json(&json!({
            "action": "name.add",
            "storePath": ctx.store_path.display().to_string(),
            "assertionId": assertion,
            "entityId": entity,
            "authority": authority,
            "name": name,
            "form": form,
            "isPreferred": is_preferred,
            "indexTerms": terms,
        }));
    } else {
        println!(
            "eats name add\n  Added: [{assertion}] {form} on #{entity} ({}/{}, {})\n  Index rows: {}\n  Path: {}",
            name.language,
            name.script,
            name.name_type,
            terms.len(),
            ctx.store_path.display()
        );
    }
}

struct UpdateArgs {
    assertion: AssertionId,
    form: Option<String>,
    language: Option<String>,
    script: Option<String>,
    name_type: Option<String>,
    parts: Vec<(String, String)>,
    is_preferred: Option<bool>,
}

fn run_update(ctx: &Context, args: UpdateArgs, json_output: bool) {
    let mut store = load_store_or_exit(&ctx.store_path);
    let current = or_exit(store.assertion(args.assertion), "failed to update name");
    let Some(current) = current.as_name() else {
        eprintln!(
            "error: failed to update name: assertion {} is not a name",
            args.assertion
        );
        std::process::exit(1);
    };
    let existing = &current.name;
    let mut name = Name::new(
        args.form.unwrap_or_else(|| existing.display_form.clone()),
        args.language
            .map(Into::into)
            .unwrap_or_else(|| existing.language.clone()),
        args.script
            .map(Into::into)
            .unwrap_or_else(|| existing.script.clone()),
        args.name_type
            .map(Into::into)
            .unwrap_or_else(|| existing.name_type.clone()),
    );
    name.parts = if args.parts.is_empty() {
        existing.parts.clone()
    } else {
        build_parts(&args.parts, name.language.as_str(), name.script.as_str())
    };
    let is_preferred = args.is_preferred.unwrap_or(current.is_preferred);
    or_exit(
        store.update_name_assertion(args.assertion, name.clone(), is_preferred),
        "failed to update name",
    );
    save_store_or_exit(&store, &ctx.store_path);
    let form = store.assembled_form(&name);

    if json_output {
        print_json(&json!({
            "action": "name.update",
            "storePath": ctx.store_path.display().to_string(),
            "assertionId": args.assertion,
            "name": name,
            "form": form,
            "isPreferred": is_preferred,
        }));
    } else {
        println!(
            "eats name update\n  Updated: [{}] {form} ({}/{}, {})\n  Path: {}",
            args.assertion,
            name.language,
            name.script,
            name.name_type,
            ctx.store_path.display()
        );
    }
}

fn run_remove(ctx: &Context, assertion: AssertionId, json_output: bool) {
    let mut store = load_store_or_exit(&ctx.store_path);
    let is_name = or_exit(store.assertion(assertion), "failed to remove name")
        .as_name()
        .is_some();
    if !is_name {
        eprintln!("error: failed to remove name: assertion {assertion} is not a name");
        std::process::exit(1);
    }
    let rows = store.index().terms(assertion).count();
    or_exit(store.remove_assertion(assertion), "failed to remove name");
    save_store_or_exit(&store, &ctx.store_path);

    if json_output {
        print_json(&json!({
            "action": "name.remove",
            "storePath": ctx.store_path.display().to_string(),
            "assertionId": assertion,
            "indexRowsRemoved": rows,
        }));
    } else {
        println!(
            "eats name remove\n  Removed: [{assertion}] ({rows} index rows)\n  Path: {}",
            ctx.store_path.display()
        );
    }
}
