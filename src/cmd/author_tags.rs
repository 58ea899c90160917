use papernote::constants as C;
use papernote::{recipes, Result};

use crate::Context;

pub fn run(ctx: &Context) -> Result<()> {
    let mut changed = 0;
    let report = ctx
        .articles()
        .and_filter(|doc| !doc.values(C::AUTHORS_PROPERTY).is_empty())
        .process(ctx.write_back(), |doc| {
            if recipes::add_author_tags(doc) {
                changed += 1;
            }
            Ok(())
        })?;

    ctx.summarize("author-tags", changed, &report);
    Ok(())
}
