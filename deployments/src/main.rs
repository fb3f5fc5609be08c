// Environment variable loader (.env support)
use dotenv::dotenv;

use anyhow::Context;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// Shared project modules
use shared::{
    deployments::{load_deployment_records, merge_deployments},
    log_info, utils,
};

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Parse CLI arguments
    let matches = utils::parse_cli_args_deployments();
    let files: Vec<PathBuf> = matches
        .get_many::<PathBuf>("file")
        .context("At least one deployments file is required")?
        .cloned()
        .collect();
    let output = matches.get_one::<PathBuf>("output");
    let filter = if matches.get_flag("verbose") {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    // Read the deployment files, in merge order
    let records = load_deployment_records(&files).context("Failed to read deployments files")?;
    let table = merge_deployments(&records).context("Failed to merge deployments")?;
    log_info!(
        "Merged {} deployments file(s) into {} contract(s)",
        records.len(),
        table.len()
    );

    let json = table.to_json_pretty()?;
    println!("{}", json);

    if let Some(output) = output {
        fs::write(output, &json)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        log_info!("Deployments table written to {}", output.display());
    }

    Ok(())
}
