use papernote::constants as C;
use papernote::{recipes, Result};

use crate::Context;

pub fn run(ctx: &Context) -> Result<()> {
    let mut changed = 0;
    let report = ctx
        .articles()
        .and_filter(|doc| doc.get(C::LINKS_PROPERTY).is_some())
        .process(ctx.write_back(), |doc| {
            if recipes::split_links(doc) {
                changed += 1;
            }
            Ok(())
        })?;

    ctx.summarize("split-links", changed, &report);
    Ok(())
}
