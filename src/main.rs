use clap::Parser;
use survey_matrix::{CliArgs, LoggingConfig, init_logging, run};

fn main() -> anyhow::Result<()> {
    let _guard = init_logging(LoggingConfig::from_env())?;

    let cli = CliArgs::parse();
    let report = run(cli)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
