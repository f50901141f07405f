//! RAX FTP Client - Entry Point
//!
//! Runs a single operation against the server described by `config.toml`
//! (or `RAX_FTP_CLIENT__*` environment variables).

use log::{error, info};
use std::process::ExitCode;

use rax_ftp_client::{ClientConfig, FtpClient};

const USAGE: &str = "usage: rax-ftp-client list [PATH] | mkdir PATH | put LOCAL REMOTE";

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let config = match ClientConfig::load("config") {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Using FTP server {}", config.control_endpoint());
    let client = FtpClient::new(config);

    let ok = match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["list"] => print_listing(&client, "").await,
        ["list", path] => print_listing(&client, path).await,
        ["mkdir", path] => client.make_directory(path).await,
        ["put", local, remote] => match tokio::fs::File::open(local).await {
            Ok(mut file) => client.upload(&mut file, remote).await,
            Err(e) => {
                error!("Cannot open {}: {}", local, e);
                false
            }
        },
        _ => {
            eprintln!("{}", USAGE);
            false
        }
    };

    client.disconnect().await;

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn print_listing(client: &FtpClient, path: &str) -> bool {
    match client.try_list(path).await {
        Ok(lines) => {
            for line in lines {
                println!("{}", line);
            }
            true
        }
        Err(e) => {
            error!("Listing {} failed: {}", path, e);
            false
        }
    }
}
