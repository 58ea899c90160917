use papernote::constants as C;
use papernote::{recipes, Result};

use crate::Context;

pub fn run(ctx: &Context) -> Result<()> {
    let bibliography = ctx.bibliography()?;
    let key_property = ctx.config.citation_key_property.as_str();

    let mut changed = 0;
    let report = ctx
        .articles()
        .and_filter(|doc| doc.get(C::JOURNAL_PROPERTY).map_or(true, |v| v.is_empty()))
        .process(ctx.write_back(), |doc| {
            if recipes::add_journal(doc, &bibliography, key_property) {
                changed += 1;
            }
            Ok(())
        })?;

    ctx.summarize("add-journal", changed, &report);
    Ok(())
}
