use anyhow::Context;
use env_logger::Env;
use haunted_winter::{config::AppConfig, HauntedApp};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env().context("failed to read configuration")?;
    let app = HauntedApp::new(config).context("failed to build the scene")?;
    app.run().context("application stopped with an error")
}
