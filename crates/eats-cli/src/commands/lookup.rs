use crate::cli::PreferenceArgs;
use crate::support::{
    Context, load_store_or_exit, preferred_form, preferred_name_payload, print_json,
};
use eats_core::EntityType;
use serde_json::json;

pub fn run(
    ctx: &Context,
    query: String,
    entity_types: Vec<String>,
    preferences: PreferenceArgs,
    json_output: bool,
) {
    let store = load_store_or_exit(&ctx.store_path);
    let preferences = ctx.preferences(&preferences);
    let entity_types: Vec<EntityType> = entity_types.into_iter().map(EntityType::from).collect();
    let matches = store.lookup_entities(&query, &entity_types);

    let rows: Vec<_> = matches
        .iter()
        .filter_map(|id| {
            let preferred = store.preferred_name(*id, &preferences).ok()?;
            Some((*id, preferred))
        })
        .collect();

    if json_output {
        let items: Vec<_> = rows
            .iter()
            .map(|(id, preferred)| {
                json!({
                    "entityId": id,
                    "preferredName": preferred_name_payload(&store, *preferred),
                })
            })
            .collect();
        print_json(&json!({
            "action": "lookup",
            "query": query,
            "entityTypes": entity_types,
            "preferences": preferences,
            "count": items.len(),
            "items": items,
        }));
    } else {
        println!("eats lookup {query:?}");
        println!("  Matches: {}", rows.len());
        for (id, preferred) in rows {
            println!("    - #{id} {}", preferred_form(&store, preferred));
        }
    }
}
