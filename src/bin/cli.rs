//! resplite CLI Client
//!
//! Sends one command to a server and prints the reply the way redis-cli does.

use std::process::ExitCode;

use clap::Parser;
use resplite::{Client, Config, Reply};
use tracing_subscriber::{fmt, EnvFilter};

/// resplite CLI
#[derive(Parser, Debug)]
#[command(name = "resplite-cli")]
#[command(about = "Send a single command to a RESP server")]
#[command(version)]
struct Args {
    /// Server host
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value = "6379")]
    port: u16,

    /// Password sent with AUTH
    #[arg(short = 'a', long, env = "RESPLITE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Database index selected after connecting
    #[arg(short = 'n', long, default_value = "0")]
    db: u32,

    /// Connect timeout in milliseconds
    #[arg(long, default_value = "5000")]
    connect_timeout_ms: u64,

    /// Read/write timeout in milliseconds (0 disables it)
    #[arg(short, long, default_value = "5000")]
    timeout_ms: u64,

    /// Command name followed by its arguments
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,resplite=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut builder = Config::builder()
        .host(&args.host)
        .port(args.port)
        .database(args.db)
        .connect_timeout_ms(args.connect_timeout_ms)
        .read_timeout_ms(args.timeout_ms)
        .write_timeout_ms(args.timeout_ms);
    if let Some(password) = &args.password {
        builder = builder.password(password);
    }
    let config = builder.build();

    tracing::debug!("Connecting to {}", config.addr());

    let client = match Client::open(&config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Could not connect to {}: {}", config.addr(), e);
            return ExitCode::FAILURE;
        }
    };

    let (name, rest) = args.command.split_at(1);
    let result = client.call(&name[0], rest);
    match &result {
        Ok(reply) => print!("{}", format_reply(reply, 0)),
        Err(e) => eprintln!("{}", e),
    }

    if succeeded(&result) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// A call succeeds when it returned a reply that is not an error reply
fn succeeded(result: &resplite::Result<Reply>) -> bool {
    matches!(result, Ok(reply) if !reply.is_error())
}

/// Render a reply as redis-cli does; `indent` aligns nested array items
fn format_reply(reply: &Reply, indent: usize) -> String {
    match reply {
        Reply::Status(text) => format!("{}\n", text),
        Reply::Error(text) => format!("(error) {}\n", text),
        Reply::Integer(n) => format!("(integer) {}\n", n),
        Reply::BulkString(Some(bytes)) => format!("\"{}\"\n", bytes.escape_ascii()),
        Reply::BulkString(None) | Reply::Array(None) => "(nil)\n".to_string(),
        Reply::Array(Some(items)) if items.is_empty() => "(empty array)\n".to_string(),
        Reply::Array(Some(items)) => {
            let width = items.len().to_string().len();
            let mut out = String::new();
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(&" ".repeat(indent));
                }
                let prefix = format!("{:>width$}) ", i + 1, width = width);
                out.push_str(&prefix);
                out.push_str(&format_reply(item, indent + prefix.len()));
            }
            out
        }
    }
}
