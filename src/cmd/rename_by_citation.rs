//! Rename articles after their citation

use papernote::{recipes, Result};

use crate::Context;

pub fn run(ctx: &Context) -> Result<()> {
    let bibliography = ctx.bibliography()?;
    let key_property = ctx.config.citation_key_property.as_str();
    let abbreviations = &ctx.config.journal_abbreviations;

    let new_identifier = |doc: &papernote::NoteDocument| {
        recipes::record_for(doc, &bibliography, key_property)
            .and_then(|record| recipes::citation_identifier(record, abbreviations))
    };

    if ctx.dry_run {
        for doc in ctx.articles().corpus()? {
            let doc = doc?;
            match new_identifier(&doc) {
                Some(id) if id != doc.identifier() => {
                    println!("{} -> {}", ctx.display(doc.path()), id)
                }
                _ => {}
            }
        }
        return Ok(());
    }

    let report = ctx.articles().rename(|doc| Ok(new_identifier(&*doc)))?;

    for request in &report.renamed {
        println!("{} -> {}", ctx.display(&request.path), request.to);
    }
    println!(
        "rename-by-citation: {} note(s) renamed, {} reference(s) updated in {} note(s)",
        report.renamed.len(),
        report.substitutions,
        report.relinked.len()
    );
    Ok(())
}
