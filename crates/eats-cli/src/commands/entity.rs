use crate::cli::{EntityCommands, PreferenceArgs};
use crate::support::{
    Context, entity_label, load_store_or_exit, or_exit, preferred_form, preferred_name_payload,
    print_json, save_store_or_exit,
};
use eats_core::{AuthorityId, EatsError, EntityId, PropertyAssertion};
use eats_store::{EntityRecord, MemoryStore};
use serde_json::json;
use std::collections::BTreeMap;

pub fn run(ctx: &Context, command: EntityCommands) {
    match command {
        EntityCommands::Add {
            authority,
            entity_type,
            json,
        } => run_add(ctx, authority, entity_type, json),

        EntityCommands::Show {
            id,
            preferences,
            json,
        } => run_show(ctx, id, preferences, json),

        EntityCommands::Merge {
            target,
            source,
            json,
        } => run_merge(ctx, target, source, json),

        EntityCommands::Remove { id, json } => run_remove(ctx, id, json),

        EntityCommands::Relate {
            domain,
            relationship_type,
            range,
            authority,
            json,
        } => run_relate(ctx, domain, relationship_type, range, authority, json),

        EntityCommands::Note {
            id,
            note,
            authority,
            json,
        } => run_note(ctx, id, note, authority, json),
    }
}

fn run_add(ctx: &Context, authority: String, entity_type: Option<String>, json_output: bool) {
    let mut store = load_store_or_exit(&ctx.store_path);
    let authority = AuthorityId::new(authority);
    let id = or_exit(store.create_entity(&authority), "failed to create entity");
    let type_assertion = entity_type.map(|entity_type| {
        or_exit(
            store.create_entity_type_assertion(id, &authority, entity_type.clone().into()),
            "failed to assert entity type",
        );
        entity_type
    });
    save_store_or_exit(&store, &ctx.store_path);

    if json_output {
        print_json(&json!({
            "action": "entity.add",
            "storePath": ctx.store_path.display().to_string(),
            "entityId": id,
            "authority": authority,
            "entityType": type_assertion,
        }));
    } else {
        println!("eats entity add\n  Created: #{id} (authority {authority})");
        if let Some(entity_type) = type_assertion {
            println!("  Entity type: {entity_type}");
        }
        println!("  Path: {}", ctx.store_path.display());
    }
}

/// Resolve `id`, following a merge redirect to the surviving entity.
fn resolve_entity_or_exit(store: &MemoryStore, id: EntityId) -> (&EntityRecord, Option<EntityId>) {
    match store.entity(id) {
        Ok(record) => (record, None),
        Err(EatsError::EntityMerged { old, new }) => (
            or_exit(store.entity(new), "failed to resolve merged entity"),
            Some(old),
        ),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

fn run_show(ctx: &Context, id: u64, preferences: PreferenceArgs, json_output: bool) {
    let store = load_store_or_exit(&ctx.store_path);
    let preferences = ctx.preferences(&preferences);
    let (record, merged_from) = resolve_entity_or_exit(&store, EntityId(id));
    let preferred = or_exit(
        store.preferred_name(record.id, &preferences),
        "failed to resolve preferred name",
    );

    if json_output {
        let mut property_counts: BTreeMap<&str, usize> = BTreeMap::new();
        for assertion in &record.assertions {
            *property_counts.entry(assertion.kind()).or_default() += 1;
        }
        print_json(&json!({
            "action": "entity.show",
            "requestedId": id,
            "mergedInto": merged_from.map(|_| record.id),
            "preferences": preferences,
            "preferredName": preferred_name_payload(&store, preferred),
            "propertyCounts": property_counts,
            "entity": record,
        }));
        return;
    }

    println!("eats entity show {id}");
    if merged_from.is_some() {
        println!("  Merged into: #{}", record.id);
    }
    println!("  Entity: #{} (created by {})", record.id, record.created_by);
    println!("  Preferred name: {}", preferred_form(&store, preferred));

    let preferred_id = preferred.assertion().map(|a| a.id());
    let names: Vec<_> = record.name_assertions().collect();
    if !names.is_empty() {
        println!("  Names:");
        for name in names {
            let marker = if Some(name.id()) == preferred_id {
                " *"
            } else {
                ""
            };
            println!(
                "    [{}] {} ({}/{}, {}, {}{}){marker}",
                name.id(),
                store.assembled_form(&name.name),
                name.name.language,
                name.name.script,
                name.name.name_type,
                name.authority(),
                if name.is_preferred { ", preferred" } else { "" },
            );
        }
    }
    for assertion in &record.assertions {
        match assertion {
            PropertyAssertion::Name(_) => {}
            PropertyAssertion::EntityType(a) => {
                println!("  Type: {} [{}] ({})", a.entity_type, a.header.id, a.header.authority);
            }
            PropertyAssertion::Relationship(a) => {
                println!(
                    "  Relationship: {} {} [{}] ({})",
                    a.relationship_type,
                    entity_label(&store, a.range_entity, &preferences),
                    a.header.id,
                    a.header.authority
                );
            }
            PropertyAssertion::Note(a) => {
                println!("  Note: {} [{}] ({})", a.note, a.header.id, a.header.authority);
            }
        }
    }
}

fn run_merge(ctx: &Context, target: u64, source: u64, json_output: bool) {
    let mut store = load_store_or_exit(&ctx.store_path);
    let (target, source) = (EntityId(target), EntityId(source));
    or_exit(
        store.merge_entities(target, source),
        "failed to merge entities",
    );
    save_store_or_exit(&store, &ctx.store_path);

    if json_output {
        print_json(&json!({
            "action": "entity.merge",
            "storePath": ctx.store_path.display().to_string(),
            "target": target,
            "source": source,
        }));
    } else {
        println!(
            "eats entity merge\n  Merged: #{source} -> #{target}\n  Path: {}",
            ctx.store_path.display()
        );
    }
}

fn run_remove(ctx: &Context, id: u64, json_output: bool) {
    let mut store = load_store_or_exit(&ctx.store_path);
    let removed = or_exit(store.remove_entity(EntityId(id)), "failed to remove entity");
    save_store_or_exit(&store, &ctx.store_path);

    if json_output {
        print_json(&json!({
            "action": "entity.remove",
            "storePath": ctx.store_path.display().to_string(),
            "entityId": removed.id,
            "assertionsRemoved": removed.assertions.len(),
        }));
    } else {
        println!(
            "eats entity remove\n  Removed: #{} ({} assertions)\n  Path: {}",
            removed.id,
            removed.assertions.len(),
            ctx.store_path.display()
        );
    }
}

fn run_relate(
    ctx: &Context,
    domain: u64,
    relationship_type: String,
    range: u64,
    authority: String,
    json_output: bool,
) {
    let mut store = load_store_or_exit(&ctx.store_path);
    let authority = AuthorityId::new(authority);
    let assertion = or_exit(
        store.create_relationship_assertion(
            EntityId(domain),
            &authority,
            relationship_type.clone().into(),
            EntityId(range),
        ),
        "failed to assert relationship",
    );
    save_store_or_exit(&store, &ctx.store_path);

    if json_output {
        print_json(&json!({
            "action": "entity.relate",
            "storePath": ctx.store_path.display().to_string(),
            "assertionId": assertion,
            "domain": domain,
            "relationshipType": relationship_type,
            "range": range,
            "authority": authority,
        }));
    } else {
        println!(
            "eats entity relate\n  Added: [{assertion}] #{domain} {relationship_type} #{range}\n  Path: {}",
            ctx.store_path.display()
        );
    }
}

fn run_note(ctx: &Context, id: u64, note: String, authority: String, json_output: bool) {
    let mut store = load_store_or_exit(&ctx.store_path);
    let authority = AuthorityId::new(authority);
    let assertion = or_exit(
        store.create_note_assertion(EntityId(id), &authority, note),
        "failed to add note",
    );
    save_store_or_exit(&store, &ctx.store_path);

    if json_output {
        print_json(&json!({
            "action": "entity.note",
            "storePath": ctx.store_path.display().to_string(),
            "assertionId": assertion,
            "entityId": id,
            "authority": authority,
        }));
    } else {
        println!(
            "eats entity note\n  Added: [{assertion}] on #{id}\n  Path: {}",
            ctx.store_path.display()
        );
    }
}
