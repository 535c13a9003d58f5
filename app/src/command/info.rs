use super::AppContext;

/// Prints what the profile's parser reports about itself, as JSON.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = (AppContext, String);

    async fn execute(&self, (context, query): Self::Input) -> anyhow::Result<()> {
        let profile = context.profile(&query)?;
        let parser = context.create_parser(&profile)?;

        println!("=== {profile} ===\n");
        println!("{}", serde_json::to_string_pretty(&parser.model_info())?);
        Ok(())
    }
}
