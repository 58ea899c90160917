//! Fill empty `doi` properties from Better BibTeX

use papernote::lookup::{self, BetterBibtexClient};
use papernote::{recipes, Result, WriteMode};

use crate::Context;

pub fn run(ctx: &Context) -> Result<()> {
    // Step 1: collect candidates up front
    let mut candidates = Vec::new();
    for doc in ctx.articles().and_filter(recipes::needs_doi).corpus()? {
        candidates.push(doc?);
    }
    if candidates.is_empty() {
        println!("fetch-dois: no article is missing a doi");
        return Ok(());
    }

    // Step 2: resolve them on the worker pool
    let client = BetterBibtexClient::new(&ctx.config.better_bibtex_url);
    let mode = if ctx.dry_run { None } else { Some(WriteMode::from_copy_flag(ctx.copy)) };
    let report = lookup::fetch_all(
        candidates,
        &ctx.config.citation_key_property,
        &client,
        ctx.config.workers,
        mode,
    );

    for (path, doi) in &report.updated {
        println!("{}: {}", ctx.display(path), doi);
    }
    for path in &report.unresolved {
        println!("{}: no doi found", ctx.display(path));
    }
    for (path, err) in &report.failed {
        eprintln!("{}: {}", ctx.display(path), err);
    }
    println!(
        "fetch-dois: {} updated, {} unresolved, {} failed",
        report.updated.len(),
        report.unresolved.len(),
        report.failed.len()
    );
    Ok(())
}
