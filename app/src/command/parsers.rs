use super::AppContext;

/// Prints every registered parser backend.
#[derive(Debug, Clone, Copy)]
pub struct ParsersStrategy;

impl super::CommandStrategy for ParsersStrategy {
    type Input = AppContext;

    async fn execute(&self, context: Self::Input) -> anyhow::Result<()> {
        println!("=== Registered parsers ===\n");
        for entry in context.registry.entries() {
            println!("{} ({})", entry.name, entry.class.type_name());
            if !entry.description.is_empty() {
                println!("  {}", entry.description);
            }
            if !entry.aliases.is_empty() {
                println!("  Aliases: {}", entry.aliases.join(", "));
            }
        }
        Ok(())
    }
}
