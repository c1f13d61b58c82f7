use super::Parser;

#[derive(Parser, Debug)]
#[command(name = "tradepost", about = "Contact requests, chat and notifications for the marketplace")]
pub struct Cli {
    /// Settings file; defaults to settings/dev.toml or settings/release.toml.
    #[arg(long)]
    pub settings: Option<String>,
}
