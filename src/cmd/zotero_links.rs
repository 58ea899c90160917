use papernote::{recipes, Result};

use crate::Context;

pub fn run(ctx: &Context) -> Result<()> {
    let key_property = ctx.config.citation_key_property.as_str();
    let mut changed = 0;
    let report = ctx
        .articles()
        .and_filter(move |doc| recipes::citation_key(doc, key_property).is_some())
        .process(ctx.write_back(), |doc| {
            if recipes::update_zotero_link(doc, key_property) {
                changed += 1;
            }
            Ok(())
        })?;

    ctx.summarize("zotero-links", changed, &report);
    Ok(())
}
