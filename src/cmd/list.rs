//! List notes in the vault

use papernote::Result;

use crate::Context;

pub fn run(ctx: &Context, all: bool) -> Result<()> {
    let runner = if all { ctx.all_notes() } else { ctx.articles() };

    let mut paths = Vec::new();
    for doc in runner.corpus()? {
        paths.push(ctx.display(doc?.path()));
    }

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&paths)?);
    } else {
        for path in &paths {
            println!("{}", path);
        }
    }
    Ok(())
}
