//! trapwatch: Listen for SNMP traps and print them.
//!
//! A thin polling consumer over [`trapsink::Session`], mostly useful
//! for checking that devices are actually sending.

use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use trapsink::{Session, TrapParams, Version};

/// Receive SNMP notifications and print them to stdout.
#[derive(Debug, Parser)]
#[command(name = "trapwatch", version, about)]
struct Args {
    /// Local address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// UDP port to listen on (162 needs privileges).
    #[arg(short, long, default_value_t = 1162)]
    port: u16,

    /// Accept only these community strings (repeatable). Default: any.
    #[arg(short, long = "community", value_name = "COMMUNITY")]
    communities: Vec<String>,

    /// Accept only these v3 usernames (repeatable). Default: any.
    #[arg(short, long = "user", value_name = "USER")]
    users: Vec<String>,

    /// Restrict to a single protocol version (1, 2c, or 3).
    #[arg(long, value_name = "VERSION")]
    snmp_version: Option<String>,

    /// Poll interval in milliseconds.
    #[arg(long, default_value_t = 200)]
    interval_ms: u64,
}

impl Args {
    fn params(&self) -> Result<TrapParams, String> {
        let mut params = TrapParams::new();
        for community in &self.communities {
            params = params.community(community.clone().into_bytes());
        }
        for user in &self.users {
            params = params.username(user.clone().into_bytes());
        }
        if let Some(raw) = &self.snmp_version {
            let version = match raw.as_str() {
                "1" => Version::V1,
                "2c" | "2" => Version::V2c,
                "3" => Version::V3,
                other => return Err(format!("unknown SNMP version: {}", other)),
            };
            params = params.versions([version]);
        }
        Ok(params)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let params = match args.params() {
        Ok(params) => params,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let session = Session::new(args.bind.clone(), args.port, params);
    if let Err(e) = session.connect().await {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }
    if let Some(addr) = session.local_addr().await {
        eprintln!("listening on {}", addr);
    }

    let interval = Duration::from_millis(args.interval_ms.max(1));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                if let Err(e) = session.close().await {
                    eprintln!("Error: {}", e);
                    return ExitCode::FAILURE;
                }
                // Print whatever arrived before shutdown
                if let Ok(traps) = session.get_no_wait() {
                    print_traps(&traps);
                }
                return ExitCode::SUCCESS;
            }
            _ = tokio::time::sleep(interval) => {
                if let Ok(traps) = session.get_no_wait() {
                    print_traps(&traps);
                }
            }
        }
    }
}

fn print_traps(traps: &[trapsink::ReceivedTrap]) {
    for trap in traps {
        println!("trap from {} ({} varbinds)", trap.source, trap.results.len());
        for result in &trap.results {
            println!("  {}", result);
        }
    }
}
