use clap::Args;
use serde_json::{json, Value};

use decision_intel_core::records::categorize;

use crate::input;

/// Arguments for product categorization
#[derive(Args)]
pub struct CategorizeArgs {
    /// Product description; without it, one description per stdin line
    #[arg(long)]
    pub description: Option<String>,
}

fn classify(description: &str) -> Value {
    json!({
        "descricao": description,
        "categoria": categorize(Some(description)),
    })
}

pub fn run_categorize(args: CategorizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(ref description) = args.description {
        return Ok(classify(description));
    }

    let text = input::stdin::read_stdin_text()?
        .ok_or("--description is required (or pipe descriptions on stdin)")?;
    let rows: Vec<Value> = text.lines().map(|l| classify(l.trim())).collect();
    Ok(Value::Array(rows))
}
