use papernote::constants as C;
use papernote::{recipes, Result};

use crate::Context;

pub fn run(ctx: &Context, tags: &[String]) -> Result<()> {
    let mut changed = 0;
    let report = ctx
        .articles()
        .and_filter(|doc| tags.iter().any(|t| doc.values(C::TAGS_PROPERTY).contains(&t.as_str())))
        .process(ctx.write_back(), |doc| {
            if recipes::move_tags_to_start(doc, tags) {
                changed += 1;
            }
            Ok(())
        })?;

    ctx.summarize("move-tags", changed, &report);
    Ok(())
}
