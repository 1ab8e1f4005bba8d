use tutorsearch_core::config::AppConfig;
use tutorsearch_core::traits::Embedder;
use tutorsearch_embed::load_embedder;

fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let embedder = load_embedder(&config.embedding)?;
    let texts = vec![config.search.query.clone(), "שיפוע של ישר".to_string()];
    let embs = embedder.embed_batch(&texts)?;
    println!("B={} dim={}", embs.len(), embedder.dim());
    Ok(())
}
