use papernote::Result;

use crate::Context;

pub fn run(ctx: &Context, labels: &[String]) -> Result<()> {
    let mut changed = 0;
    let report = ctx.articles().process(ctx.write_back(), |doc| {
        let before = doc.properties().keys().join("\n");
        doc.reorder_properties(labels);
        if doc.properties().keys().join("\n") != before {
            changed += 1;
        }
        Ok(())
    })?;

    ctx.summarize("reorder", changed, &report);
    Ok(())
}
