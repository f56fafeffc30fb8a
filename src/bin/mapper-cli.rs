use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use request_mapper::config::{build_mapper, load_config, Deployment};
use request_mapper::mapper::MappingData;

#[derive(Parser)]
#[command(name = "mapper-cli")]
#[command(about = "Resolve requests against a deployment descriptor", long_about = None)]
struct Cli {
    /// Path to the TOML deployment descriptor.
    #[arg(short, long)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one request and print the mapping result
    Map {
        /// Virtual host of the request (empty selects the default host)
        #[arg(long, default_value = "")]
        host: String,

        /// Request path to resolve
        #[arg(long)]
        uri: String,

        /// Context version to prefer when several are live
        #[arg(long)]
        version: Option<String>,

        /// Print the raw mapping record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate the descriptor and print the deployment summary
    Check,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "request_mapper=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let (mapper, deployment) = build_mapper(&config);

    match cli.command {
        Commands::Map {
            host,
            uri,
            version,
            json,
        } => {
            let mut data = MappingData::new();
            mapper.map(&host, &uri, version.as_deref(), &mut data);
            if json {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                print_mapping(&data, &deployment);
            }
        }
        Commands::Check => {
            let (hosts, contexts, servlets) = deployment.summary();
            println!("descriptor OK: {hosts} host(s), {contexts} context version(s), {servlets} servlet(s)");
            for info in mapper.registered_hosts() {
                let kind = if info.alias { "alias" } else { "host" };
                println!("  {kind:5} {}", info.name);
            }
        }
    }

    Ok(())
}

fn print_mapping(data: &MappingData, deployment: &Deployment) {
    if let Some(redirect) = &data.redirect_path {
        println!("redirect      {redirect}");
        return;
    }
    let Some(wrapper) = data.wrapper else {
        println!("no match");
        return;
    };
    let servlet = deployment.servlet_name(wrapper).unwrap_or("<unknown>");
    println!("servlet       {servlet}");
    if let Some(host) = data.host.and_then(|h| deployment.host_name(h)) {
        println!("host          {host}");
    }
    if let Some(context) = data.context.and_then(|c| deployment.context_name(c)) {
        println!("context       {context}");
    }
    println!("context path  {}", data.context_path.as_deref().unwrap_or(""));
    println!("wrapper path  {}", data.wrapper_path.as_deref().unwrap_or(""));
    if let Some(path_info) = &data.path_info {
        println!("path info     {path_info}");
    }
    if let Some(request_path) = &data.request_path {
        println!("request path  {request_path}");
    }
}
