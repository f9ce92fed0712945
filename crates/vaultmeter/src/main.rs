//! vaultmeter - Vault backup metrics analyzer.
//!
//! Reads a flat-file Vault backup, classifies every record against the
//! live mount tables, and pushes labeled count/size totals to a Prometheus
//! pushgateway in one batch at the end of the run.

use std::path::PathBuf;

use clap::Parser;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

use vaultmeter_core::metrics::{MetricSet, PushTarget};
use vaultmeter_core::mounts::MountDirectory;
use vaultmeter_core::vault::VaultClient;
use vaultmeter_core::{analyzer, decoder};

/// Vault backup metrics analyzer.
#[derive(Parser)]
#[command(name = "vaultmeter", about = "Vault backup metrics analyzer", version)]
struct Args {
    /// Path to the backup file to analyze.
    backup: PathBuf,

    /// Pushgateway address (host:port or full URL).
    #[arg(long)]
    pushgateway: String,

    /// Pushgateway job name.
    #[arg(long, default_value = "vault_backup")]
    job: String,

    /// Extra grouping label, as name=value. Repeatable.
    #[arg(long = "label", value_parser = parse_label)]
    labels: Vec<(String, String)>,

    /// Vault address, for fetching the mount tables.
    #[arg(long, env = "VAULT_ADDR")]
    vault_addr: String,

    /// Vault token. Alternative to AppRole credentials.
    #[arg(long, env = "VAULT_TOKEN")]
    vault_token: Option<String>,

    /// AppRole role id, used with --secret-id when no token is given.
    #[arg(long, env = "VAULT_ROLE_ID")]
    role_id: Option<String>,

    /// AppRole secret id.
    #[arg(long, env = "VAULT_SECRET_ID")]
    secret_id: Option<String>,

    /// Read chunk size in bytes.
    #[arg(long, default_value_t = decoder::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Increase logging verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Parses a `name=value` grouping label.
fn parse_label(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("invalid label '{}', expected name=value", s)),
    }
}

/// Initializes the tracing subscriber with the appropriate log level.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("vaultmeter={}", level).parse().unwrap())
        .add_directive(format!("vaultmeter_core={}", level).parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    info!("vaultmeter {} starting", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let client = match (&args.vault_token, &args.role_id, &args.secret_id) {
        (Some(token), _, _) => VaultClient::new(&args.vault_addr, token),
        (None, Some(role_id), Some(secret_id)) => {
            VaultClient::approle_login(&args.vault_addr, role_id, secret_id)?
        }
        _ => return Err("either --vault-token or both --role-id and --secret-id required".into()),
    };

    let auth = client.list_auth_mounts()?;
    let secrets = client.list_secrets_mounts()?;
    info!(
        auth_backends = auth.len(),
        secrets_engines = secrets.len(),
        "mount directory built"
    );
    let directory = MountDirectory::new(auth, secrets);

    let metrics = MetricSet::new()?;
    let stats = analyzer::analyze_file(&args.backup, args.chunk_size, &directory, &metrics)?;

    if stats.records == 0 {
        info!("backup contained no records");
    }

    let mut target = PushTarget::new(&args.pushgateway, &args.job);
    for (name, value) in &args.labels {
        target.add_label(name, value);
    }
    target.push(&metrics)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_label() {
        assert_eq!(
            parse_label("env=prod").unwrap(),
            ("env".to_string(), "prod".to_string())
        );
        assert_eq!(
            parse_label("region=eu=west").unwrap(),
            ("region".to_string(), "eu=west".to_string())
        );
        assert!(parse_label("noequals").is_err());
        assert!(parse_label("=value").is_err());
    }
}
