//! Report articles without a bibliography record

use papernote::{recipes, Result};

use crate::Context;

pub fn run(ctx: &Context) -> Result<()> {
    let bibliography = ctx.bibliography()?;
    let key_property = ctx.config.citation_key_property.as_str();

    let mut checked = 0;
    let mut missing = Vec::new();
    for doc in ctx.articles().corpus()? {
        let doc = doc?;
        checked += 1;
        if !recipes::has_bibliography(&doc, &bibliography, key_property) {
            missing.push(ctx.display(doc.path()));
        }
    }

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&missing)?);
        return Ok(());
    }

    for path in &missing {
        println!("{}", path);
    }
    println!("check-bib: {} of {} article(s) have no bibliography record", missing.len(), checked);
    Ok(())
}
