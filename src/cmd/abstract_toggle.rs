//! Fold or unfold abstract callouts

use papernote::constants as C;
use papernote::{recipes, Result};

use crate::Context;

pub fn run(ctx: &Context, open: bool) -> Result<()> {
    let mut changed = 0;
    let report = ctx
        .articles()
        .and_filter(|doc| !doc.has_property_value(C::TAGS_PROPERTY, C::STUB_TAG))
        .and_filter(|doc| doc.body().iter().any(|l| l.starts_with(C::ABSTRACT_CALLOUT)))
        .process(ctx.write_back(), |doc| {
            if recipes::toggle_abstract(doc, open) > 0 {
                changed += 1;
            }
            Ok(())
        })?;

    let action = if open { "abstract --open" } else { "abstract --close" };
    ctx.summarize(action, changed, &report);
    Ok(())
}
