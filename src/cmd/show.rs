//! Print the properties of one note

use serde_json::{Map, Value};

use papernote::{walker, PropertyValue, Result};

use crate::Context;

fn to_json(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::Empty => Value::Null,
        PropertyValue::Scalar(s) => Value::String(s.clone()),
        PropertyValue::List(items) => items.iter().cloned().map(Value::String).collect(),
    }
}

pub fn run(ctx: &Context, note: &str) -> Result<()> {
    let doc = walker::find(&ctx.config.vault, &ctx.config.enumerate_options(), note)?;

    if ctx.json {
        let mut map = Map::new();
        for property in doc.properties().iter() {
            map.insert(property.label().to_string(), to_json(property.value()));
        }
        println!("{}", serde_json::to_string_pretty(&Value::Object(map))?);
        return Ok(());
    }

    println!("{}", ctx.display(doc.path()));
    if doc.properties().is_empty() {
        println!("(no properties)");
    }
    for property in doc.properties().iter() {
        match property.value() {
            PropertyValue::List(items) => {
                println!("  {}:", property.label());
                for item in items {
                    println!("    - {}", item);
                }
            }
            value => println!("  {}: {}", property.label(), value),
        }
    }
    for warning in doc.warnings() {
        println!("  warning: {}", warning);
    }
    Ok(())
}
