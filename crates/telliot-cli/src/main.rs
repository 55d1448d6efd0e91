//! Telliot Binary
//!
//! Command-line interface for building oracle queries, inspecting encoded
//! query data and reading values from an oracle contract.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ethers::abi::token::{LenientTokenizer, Tokenizer};
use ethers::abi::Token;
use telliot_chain::{ChainConfig, GatewayFactory};
use telliot_query::{QueryCodec, QueryId, QueryRegistry};
use tracing::{debug, info, Level};

#[derive(Parser)]
#[command(name = "telliot")]
#[command(about = "Oracle query encoding and contract reads")]
struct Args {
    /// Additional query type schemas (JSON)
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    /// Log at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a query and print its data and id
    Encode {
        /// Registered query type, e.g. SpotPrice
        query_type: String,

        /// Query parameters (name=value)
        #[arg(long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
    },
    /// Decode hex query data
    Decode {
        /// Query data, with or without 0x
        query_data: String,
    },
    /// Derive the id of hex query data
    Id {
        /// Query data, with or without 0x
        query_data: String,
    },
    /// List registered query types
    Types,
    /// Call a read-only contract function
    Read {
        /// Gateway configuration file (JSON)
        #[arg(long, conflicts_with_all = ["rpc_url", "address", "abi"])]
        config: Option<PathBuf>,

        /// JSON-RPC endpoint
        #[arg(long, requires_all = ["address", "abi"])]
        rpc_url: Option<String>,

        /// Contract address
        #[arg(long)]
        address: Option<String>,

        /// Contract ABI file
        #[arg(long)]
        abi: Option<PathBuf>,

        /// Timeout for each network step in milliseconds
        #[arg(long, default_value = "10000")]
        timeout_ms: u64,

        /// Function to call
        function: String,

        /// Function arguments (name=value)
        #[arg(long = "arg", value_parser = parse_key_value)]
        args: Vec<(String, String)>,

        /// Pass a query id as the function's only argument
        #[arg(long, conflicts_with = "args")]
        query_id: Option<String>,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String)> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(anyhow::anyhow!("expected name=value, got '{}'", s)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    let registry = load_registry(args.registry.as_ref())?;

    match args.command {
        Commands::Encode { query_type, params } => encode(&registry, &query_type, &params),
        Commands::Decode { query_data } => decode(&registry, &query_data),
        Commands::Id { query_data } => {
            let query_data = parse_hex(&query_data)?;
            println!("{}", QueryId::derive(&query_data));
            Ok(())
        }
        Commands::Types => {
            list_types(&registry);
            Ok(())
        }
        Commands::Read {
            config,
            rpc_url,
            address,
            abi,
            timeout_ms,
            function,
            args,
            query_id,
        } => {
            let config = match config {
                Some(path) => ChainConfig::load(&path)
                    .with_context(|| format!("failed to load {}", path.display()))?,
                None => ChainConfig {
                    rpc_url: rpc_url.context("--rpc-url or --config is required")?,
                    contract_address: address.context("--address is required")?,
                    abi: serde_json::Value::String(
                        abi.context("--abi is required")?.display().to_string(),
                    ),
                    timeout_ms,
                    base_dir: None,
                },
            };
            read(&config, &function, &args, query_id.as_deref()).await
        }
    }
}

fn load_registry(path: Option<&PathBuf>) -> Result<QueryRegistry> {
    let mut registry = QueryRegistry::builtin();
    if let Some(path) = path {
        let json = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        let added = registry
            .load_json(&json)
            .with_context(|| format!("invalid registry file {}", path.display()))?;
        debug!("Registered {} query types from {}", added, path.display());
    }
    Ok(registry)
}

fn encode(registry: &QueryRegistry, query_type: &str, params: &[(String, String)]) -> Result<()> {
    let query = registry.get(query_type)?.build_from_text(params)?;
    let query_data = query.query_data();

    println!("query_data: 0x{}", hex::encode(&query_data));
    println!("query_id:   {}", query.query_id().to_hex_prefixed());
    Ok(())
}

fn decode(registry: &QueryRegistry, query_data: &str) -> Result<()> {
    let query_data = parse_hex(query_data)?;
    let (type_name, inner) = QueryCodec::decode(&query_data)?;

    println!("type: {}", type_name);
    if !registry.contains(&type_name) {
        println!("parameters (undecoded): 0x{}", hex::encode(&inner));
        return Ok(());
    }

    let query = QueryCodec::decode_query(&query_data, registry)?;
    for parameter in query.parameters() {
        println!("  {} ({}): {}", parameter.name(), parameter.abi_type(), parameter.value());
    }
    println!("value type: {}", query.value_type().abi_type());
    println!("query_id: {}", query.query_id().to_hex_prefixed());
    Ok(())
}

fn list_types(registry: &QueryRegistry) {
    for schema in registry.iter() {
        let parameters: Vec<String> = schema
            .parameters
            .iter()
            .map(|parameter| format!("{} {}", parameter.abi_type, parameter.name))
            .collect();
        println!(
            "{}({}) -> {}{}",
            schema.type_name,
            parameters.join(", "),
            schema.value_type.abi_type(),
            if schema.value_type.packed() { " packed" } else { "" }
        );
    }
}

async fn read(config: &ChainConfig, function: &str, args: &[(String, String)], query_id: Option<&str>) -> Result<()> {
    let mut gateway = GatewayFactory::create_gateway(config)?;
    info!("Reading {} from {}", function, gateway.checksum_address());

    let response = match query_id {
        Some(query_id) => {
            let query_id: QueryId = query_id.parse()?;
            gateway.read_query(function, query_id).await
        }
        None => {
            let tokens = tokenize_args(gateway.abi(), function, args)?;
            gateway.read(function, &tokens).await
        }
    };

    let outputs = response.into_result()?;
    for output in outputs {
        println!("{}", output);
    }
    Ok(())
}

// Text arguments are typed by the function's declared inputs and an
// unknown argument name fails here. An unknown function yields no tokens so
// the gateway reports it.
fn tokenize_args(abi: &ethers::abi::Abi, function: &str, args: &[(String, String)]) -> Result<BTreeMap<String, Token>> {
    let Ok(function) = abi.function(function) else {
        return Ok(BTreeMap::new());
    };

    let mut tokens = BTreeMap::new();
    for (name, value) in args {
        let param = function
            .inputs
            .iter()
            .enumerate()
            .find(|(index, param)| param.name == *name || (param.name.is_empty() && index.to_string() == *name))
            .map(|(_, param)| param)
            .with_context(|| format!("{} has no input named '{}'", function.name, name))?;
        let token = LenientTokenizer::tokenize(&param.kind, value)
            .with_context(|| format!("'{}' is not a valid {}", value, param.kind))?;
        tokens.insert(name.clone(), token);
    }
    Ok(tokens)
}

fn parse_hex(raw: &str) -> Result<Vec<u8>> {
    let digits = raw.trim().strip_prefix("0x").unwrap_or(raw.trim());
    hex::decode(digits).context("query data is not valid hex")
}
