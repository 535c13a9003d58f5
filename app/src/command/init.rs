use arcspec_config::create_config;

use super::AppContext;

/// Writes an example profile into the config directory.
///
/// Refuses to overwrite an existing file.
#[derive(Debug, Clone, Copy)]
pub struct InitStrategy;

impl super::CommandStrategy for InitStrategy {
    type Input = AppContext;

    async fn execute(&self, context: Self::Input) -> anyhow::Result<()> {
        let path = create_config(&context.config_dir)?;

        println!("✅ Created profile at: {}", path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Set OPENAI_API_KEY or edit APIKey in the profile");
        println!("   2. Copy the file to <name>.ai.json for each assistant you want");
        println!("   3. Run 'arcspec chat --profile example' to start a conversation");
        println!();
        println!("🔧 Profile keys:");
        println!("   - ResponseType: parser backend ('arcspec parsers' lists them)");
        println!("   - Personality: system message pinned to every request");
        println!("   - max_history_tokens / max_history_messages: history window limits");
        println!();
        println!(
            "Parser manifests are read from: {}",
            context.parsers_dir.display()
        );
        Ok(())
    }
}
