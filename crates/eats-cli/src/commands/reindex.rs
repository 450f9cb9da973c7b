use crate::support::{Context, load_store_or_exit, print_json, save_store_or_exit};
use eats_store::index_path_for;
use serde_json::json;

pub fn run(ctx: &Context, json_output: bool) {
    let mut store = load_store_or_exit(&ctx.store_path);
    let summary = store.reindex();
    save_store_or_exit(&store, &ctx.store_path);
    let index_path = index_path_for(&ctx.store_path);

    if json_output {
        print_json(&json!({
            "action": "reindex",
            "storePath": ctx.store_path.display().to_string(),
            "indexPath": index_path.display().to_string(),
            "snapshotRef": store.snapshot_ref(),
            "names": summary.names,
            "rows": summary.rows,
        }));
    } else {
        println!(
            "eats reindex\n  Names: {}\n  Index rows: {}\n  Index path: {}",
            summary.names,
            summary.rows,
            index_path.display()
        );
    }
}
