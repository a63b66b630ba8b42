pub mod args;
pub mod commands;

pub use args::{Args, Commands, ConfigCommands, DatabaseCommands};

use anyhow::Result;

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    commands::execute(args).await
}
