use clap::Parser;

use pretrust::config::PretrustConfig;
use pretrust::report;
use pretrust::service::{ScanOptions, ScanService};

#[derive(Parser)]
#[command(
    name = "pretrust",
    version,
    about = "Pre-install security auditor for npm packages"
)]
struct Cli {
    /// Package specifier: name, name@version, @scope/name[@version],
    /// or a path to a .tgz / extracted directory.
    specifier: String,

    /// Emit the report as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Skip the repository health probe.
    #[arg(long)]
    no_github: bool,

    /// Skip the artifact/source diff.
    #[arg(long)]
    no_diff: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pretrust=warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    std::process::exit(run(cli).await);
}

async fn run(cli: Cli) -> i32 {
    let config = match PretrustConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("pretrust: {err:#}");
            return 2;
        }
    };

    let service = match ScanService::new(config) {
        Ok(service) => service,
        Err(err) => {
            eprintln!("pretrust: {err:#}");
            return 2;
        }
    };

    let options = ScanOptions {
        no_github: cli.no_github,
        no_diff: cli.no_diff,
    };
    let scan_report = match service.scan(&cli.specifier, options).await {
        Ok(scan_report) => scan_report,
        Err(err) => {
            eprintln!("pretrust: {err:#}");
            return 2;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&scan_report) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("pretrust: failed to serialize report: {err}");
                return 2;
            }
        }
    } else {
        print!("{}", report::render_text(&scan_report));
    }

    scan_report.grade.exit_code()
}
