//! Rename one note and rewrite the links pointing at it

use papernote::{util, walker, Error, Result};

use crate::Context;

pub fn run(ctx: &Context, from: &str, to: &str) -> Result<()> {
    if util::sanitize_identifier(to) != to || to.is_empty() {
        return Err(Error::RenameConflict {
            from: from.to_string(),
            to: to.to_string(),
            reason: "name is empty or contains characters not allowed in filenames".to_string(),
        });
    }

    // Step 1: the source has to exist
    let doc = walker::find(&ctx.config.vault, &ctx.config.enumerate_options(), from)?;
    let source = doc.path().to_path_buf();

    if ctx.dry_run {
        println!("{} -> {} (dry run)", ctx.display(&source), to);
        return Ok(());
    }

    // Step 2: rename and relink
    let report = ctx
        .all_notes()
        .with_limit(None)
        .with_predicate(move |doc| doc.path() == source)
        .rename(|_| Ok(Some(to.to_string())))?;

    for request in &report.renamed {
        println!("{} -> {}", ctx.display(&request.path), request.to);
    }
    println!(
        "rename: {} reference(s) updated in {} note(s)",
        report.substitutions,
        report.relinked.len()
    );
    Ok(())
}
