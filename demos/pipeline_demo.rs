//! Build a knowledge base from a local docs directory and answer a query.
//!
//! ```text
//! RAGMILL_DOCS=./docs RAGMILL_DB=./knowledge.sqlite \
//!     cargo run --example pipeline_demo "how does chunk overlap work"
//! ```
//!
//! Points at a local Ollama by default; set `RAGMILL_MOCK=1` to run fully
//! offline with the deterministic mock provider.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing_subscriber::FmtSubscriber;

use ragmill::{
    DEFAULT_TOP_K, EmbeddingProvider, HttpEmbeddingConfig, HttpEmbeddingProvider,
    MockEmbeddingProvider, RagError, Retriever, SqliteVectorStore,
};

#[tokio::main]
async fn main() -> Result<(), RagError> {
    init_tracing();

    let docs_dir = env::var("RAGMILL_DOCS").unwrap_or_else(|_| "./docs".to_string());
    let db_path = env::var("RAGMILL_DB").unwrap_or_else(|_| "./knowledge.sqlite".to_string());
    let query = env::args()
        .nth(1)
        .unwrap_or_else(|| "what is this corpus about".to_string());

    let provider: Arc<dyn EmbeddingProvider> = if env::var("RAGMILL_MOCK").is_ok() {
        Arc::new(MockEmbeddingProvider::new())
    } else {
        Arc::new(HttpEmbeddingProvider::new(HttpEmbeddingConfig::default())?)
    };

    let store = SqliteVectorStore::open(PathBuf::from(&db_path)).await?;
    let retriever = Retriever::builder()
        .with_provider(provider)
        .with_store(Arc::new(store))
        .build()?;

    // Poll the tracker while the build runs, the way a dashboard would.
    let progress = retriever.progress().clone();
    let watcher = tokio::spawn(async move {
        loop {
            let snapshot = progress.snapshot();
            if snapshot.phase.is_terminal() {
                break;
            }
            println!(
                "  [{:?}] {}/{}",
                snapshot.phase, snapshot.done, snapshot.total
            );
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
    });

    let start = Instant::now();
    let summary = retriever.build_knowledge_base(&docs_dir, true).await?;
    let _ = watcher.await;
    println!(
        "Indexed {} chunks from {} documents in {:.1}s{}",
        summary.chunks,
        summary.documents,
        start.elapsed().as_secs_f64(),
        if summary.degraded {
            " (degraded: synthetic embeddings used)"
        } else {
            ""
        }
    );

    println!("\nQuery: {query}");
    for hit in retriever.retrieve_relevant(&query, DEFAULT_TOP_K).await? {
        let heading = hit.chunk.heading_context.as_deref().unwrap_or("-");
        println!(
            "  {:.3}  {}  [{}]",
            hit.similarity, hit.chunk.source_id, heading
        );
        let preview: String = hit.chunk.text.chars().take(120).collect();
        println!("         {preview}");
    }

    Ok(())
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let subscriber = FmtSubscriber::builder().with_env_filter("info").finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
