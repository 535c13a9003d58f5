use arcspec_config::load_profiles;

use super::{AppContext, truncate};

const INTRO_WIDTH: usize = 48;

/// Prints a table of the valid profiles.
#[derive(Debug, Clone, Copy)]
pub struct ListStrategy;

impl super::CommandStrategy for ListStrategy {
    type Input = AppContext;

    async fn execute(&self, context: Self::Input) -> anyhow::Result<()> {
        let profiles = load_profiles(&context.config_dir)?;
        if profiles.is_empty() {
            println!(
                "No profiles found in {}. Run 'arcspec init' to create one.",
                context.config_dir.display()
            );
            return Ok(());
        }

        println!(
            "{:>3}  {:<16} {:<24} {:<20} Introduction",
            "#", "Profile", "Name", "Model"
        );
        for (index, profile) in profiles.iter().enumerate() {
            let intro = profile.schema.introduction.as_deref().unwrap_or("");
            println!(
                "{:>3}  {:<16} {:<24} {:<20} {}",
                index + 1,
                truncate(&profile.name, 16),
                truncate(&profile.schema.friendly_name, 24),
                truncate(&profile.schema.model, 20),
                truncate(intro, INTRO_WIDTH)
            );
        }
        Ok(())
    }
}
