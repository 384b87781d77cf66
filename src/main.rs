use bet_ledger::client;
use color_eyre::eyre::{
    Result,
    eyre,
};
use std::path::PathBuf;

const DEFAULT_EXPORT_DIR: &str = ".";
const DEFAULT_LOG_DIR: &str = "~/.bet-ledger/logs";

fn print_usage_and_exit() -> ! {
    println!(
        "Usage: bet-ledger (--service-url <url> | --demo) [--export-dir <path>] [--log-dir <path>]\n\
         \n\
         Flags:\n\
           --service-url <url>  Data service base URL (calls POST <url>/rpc/<method>)\n\
           --demo               Use an in-memory service seeded with generated bets\n\
           --export-dir <path>  Where exports and saved charts go (default {DEFAULT_EXPORT_DIR})\n\
           --log-dir <path>     Where daily log files go (default {DEFAULT_LOG_DIR})\n\
         \n\
         Log level is read from RUST_LOG (default info)."
    );
    std::process::exit(0);
}

fn expand(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

fn parse_cli_args(args: impl IntoIterator<Item = String>) -> Result<client::AppConfig> {
    let mut args = args.into_iter();
    let mut service_url: Option<String> = None;
    let mut demo = false;
    let mut export_dir: Option<String> = None;
    let mut log_dir: Option<String> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--service-url" => {
                let url = args
                    .next()
                    .ok_or_else(|| eyre!("--service-url requires a URL argument"))?;
                if service_url.is_some() {
                    return Err(eyre!("--service-url may only be specified once"));
                }
                service_url = Some(url);
            }
            "--demo" => demo = true,
            "--export-dir" => {
                let dir = args
                    .next()
                    .ok_or_else(|| eyre!("--export-dir requires a path argument"))?;
                if export_dir.is_some() {
                    return Err(eyre!("--export-dir may only be specified once"));
                }
                export_dir = Some(dir);
            }
            "--log-dir" => {
                let dir = args
                    .next()
                    .ok_or_else(|| eyre!("--log-dir requires a path argument"))?;
                if log_dir.is_some() {
                    return Err(eyre!("--log-dir may only be specified once"));
                }
                log_dir = Some(dir);
            }
            "--help" | "-h" => print_usage_and_exit(),
            other => return Err(eyre!("Unknown argument: {other}")),
        }
    }

    let backend = match (service_url, demo) {
        (Some(url), false) => client::Backend::Remote { url },
        (None, true) => client::Backend::Demo,
        (Some(_), true) => {
            return Err(eyre!("--service-url and --demo are mutually exclusive"));
        }
        (None, false) => {
            return Err(eyre!("Select a data service with --service-url <url> or --demo"));
        }
    };

    Ok(client::AppConfig {
        backend,
        export_dir: expand(export_dir.as_deref().unwrap_or(DEFAULT_EXPORT_DIR)),
        log_dir: expand(log_dir.as_deref().unwrap_or(DEFAULT_LOG_DIR)),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let app_config = parse_cli_args(std::env::args().skip(1))?;
    let _log_guard = client::init_tracing(&app_config.log_dir)?;
    tracing::info!(backend = ?app_config.backend, "starting bet-ledger client");
    client::run_app(app_config).await
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_cli_args__remote_with_defaults() {
        // when
        let config = parse_cli_args(args(&["--service-url", "http://localhost:8000"])).unwrap();

        // then
        assert_eq!(
            config.backend,
            client::Backend::Remote {
                url: "http://localhost:8000".to_string()
            }
        );
        assert_eq!(config.export_dir, PathBuf::from("."));
    }

    #[test]
    fn parse_cli_args__demo_with_dirs() {
        let config =
            parse_cli_args(args(&["--demo", "--export-dir", "/tmp/out", "--log-dir", "/tmp/logs"]))
                .unwrap();
        assert_eq!(config.backend, client::Backend::Demo);
        assert_eq!(config.export_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.log_dir, PathBuf::from("/tmp/logs"));
    }

    #[test]
    fn parse_cli_args__requires_exactly_one_backend() {
        assert!(parse_cli_args(args(&[])).is_err());
        assert!(parse_cli_args(args(&["--demo", "--service-url", "http://x"])).is_err());
    }

    #[test]
    fn parse_cli_args__rejects_unknown_and_incomplete_flags() {
        assert!(parse_cli_args(args(&["--demo", "--verbose"])).is_err());
        assert!(parse_cli_args(args(&["--service-url"])).is_err());
    }
}
