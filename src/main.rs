//!
//! hrms CLI binary
//! ---------------
//! Command-line front end for the HRMS session client: log in, inspect the
//! restored session and its permitted routes, rotate the password, log out.

use tracing_subscriber::{EnvFilter, fmt};
use tracing::info;

use hrms_session::cli::{parse_args, run, usage, Command};
use hrms_session::{ClientConfig, HrmsClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let mut cfg = ClientConfig::from_env();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_args(&args, &mut cfg) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}\n\n{}", e, usage("hrms"));
            std::process::exit(2);
        }
    };
    if command == Command::Help {
        println!("{}", usage("hrms"));
        return Ok(());
    }

    info!(
        target: "hrms",
        "hrms starting: base_url='{}', session_dir='{}', timeout_ms={}",
        cfg.base_url, cfg.session_dir.display(), cfg.request_timeout.as_millis()
    );
    let client = HrmsClient::from_config(&cfg)?;
    run(command, &client).await
}
