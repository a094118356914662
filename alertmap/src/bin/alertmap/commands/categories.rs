use anyhow::Result;
use clap::Args;

use crate::context::RuntimeContext;
use crate::examples::ExampleGroup;
use crate::output::OutputManager;

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Category catalog",
    commands: &[
        "alertmap categories                     # List every category",
        "alertmap categories flooding            # Show a single category",
        "alertmap --output json categories       # Machine-readable listing",
    ],
}];

#[derive(Args)]
pub struct CategoriesArgs {
    /// Category key to show (optional, lists all if omitted)
    pub key: Option<String>,
}

pub fn handle_categories(args: CategoriesArgs, ctx: &RuntimeContext, output: &OutputManager) -> Result<()> {
    let catalog = ctx.catalog();
    let entries = match &args.key {
        Some(key) => match catalog.get(key) {
            Some(category) => vec![category.clone()],
            None => {
                output.error(&format!("Unknown category '{key}'"));
                let known: Vec<&str> = catalog.all().iter().map(|c| c.key.as_str()).collect();
                output.info(&format!("Known keys: {}", known.join(", ")));
                anyhow::bail!("Category not found");
            }
        },
        None => catalog.all().to_vec(),
    };

    output.heading(&format!("Categories ({})", entries.len()));
    output.display(&entries)
}
