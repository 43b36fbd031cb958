//! ZoomEye CLI - search internet-facing assets and vulnerabilities
//!
//! Runs a single query or tool call and prints the JSON result to stdout.
//! Logs go to stderr.

use clap::Parser;
use serde_json::Value;
use tracing::info;

use zoomeye_query::cli::{parse_tool_arguments, Cli, Command};
use zoomeye_query::{logging, tools, ZoomEyeClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init_logging(&cli.logging_config());

    let client = ZoomEyeClient::new(cli.client_config())?;
    info!(base_url = client.base_url(), "ZoomEye client ready");

    let result = run(&client, &cli.command).await?;
    let output = tools::format_result(&result);
    if !output.is_empty() {
        println!("{}", output);
    }

    Ok(())
}

/// Executes the selected subcommand
async fn run(client: &ZoomEyeClient, command: &Command) -> anyhow::Result<Value> {
    let result = match command {
        Command::Search(args) => client.search(&args.to_params()).await?,
        Command::Vuln { id } => client.lookup_vulnerability(id).await?,
        Command::VulnSearch { keyword, page_size } => {
            client.search_vulnerabilities(keyword, *page_size).await?
        }
        Command::Tools => serde_json::to_value(tools::definitions())?,
        Command::Call { tool, arguments } => {
            let arguments = parse_tool_arguments(arguments.as_deref())?;
            tools::call_tool(client, tool, &arguments).await?
        }
    };
    Ok(result)
}
