//! grayscout CLI — fetch public-domain images suggested by a text model and
//! convert them to grayscale.
//!
//! Usage: `grayscout <COUNT>`.

mod commands;

use color_eyre::eyre::Result;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = commands::parse_cli();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
