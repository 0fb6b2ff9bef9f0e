use std::env;
use std::sync::Arc;

use overlay_tree::OverlayConfig;
use overlay_tree::Result;
use overlay_tree::TreeRegistry;
use tracing::error;
use tracing::info;
use tracing_subscriber::EnvFilter;

const TREE_ID: &str = "demo";

const DEFAULT_KEYS: [&str; 10] = [
    "cool", "foo", "bar", "baz", "foobar", "widgets", "gadgets", "hello", "world", "sweet",
];

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    init_observability();

    let config = OverlayConfig::new()?.validate()?;
    let registry: Arc<TreeRegistry<String, usize>> = Arc::new(TreeRegistry::new(config)?);

    // Watcher: pushes the changed part of the tree, as a transport would
    let (mut events, subscription) = registry.subscribe(TREE_ID).into_receiver();
    let watcher_registry = Arc::clone(&registry);
    let watcher = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let snapshot = watcher_registry.snapshot(&event.id, &event.modified);
            match snapshot.to_json() {
                Ok(json) => info!(tree_id = %event.id, modified = ?event.modified, %json, "Tree changed"),
                Err(e) => error!(tree_id = %event.id, "Failed to encode snapshot: {:?}", e),
            }
        }
    });

    let mut keys: Vec<String> = env::args().skip(1).collect();
    if keys.is_empty() {
        keys = DEFAULT_KEYS.iter().map(|k| k.to_string()).collect();
    }

    for (i, key) in keys.iter().enumerate() {
        registry.upsert(TREE_ID, key.clone(), i);
    }
    if let Some(first) = keys.first() {
        registry.delete(TREE_ID, first);
    }

    println!("{}", registry.force_graph(TREE_ID).to_json_pretty()?);

    // Unsubscribing ends the watcher's stream once it has drained
    drop(subscription);
    if let Err(e) = watcher.await {
        error!("Watcher task failed: {:?}", e);
    }

    info!(trees = registry.tree_count(), "Exiting");
    Ok(())
}

fn init_observability() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
