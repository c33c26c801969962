use clap::Parser;
use colored::*;
use std::time::Instant;

mod behaviors;
mod checkout;
mod error;
mod load_tester;
mod profile;
mod ssm_discovery;
mod types;

use load_tester::{LoadTester, RunSettings};
use ssm_discovery::SSMGatewayDiscovery;
use types::Gateway;

#[derive(Parser, Debug)]
#[command(name = "gateway-load-tester")]
#[command(about = "Simulated shopper traffic against an e-commerce API gateway")]
#[command(version = "0.1.0")]
struct Args {
    /// Gateway base URL (falls back to SSM, then GATEWAY_URL, then http://localhost:8080)
    #[arg(long)]
    host: Option<String>,

    /// Number of concurrent simulated users
    #[arg(short, long, default_value = "10")]
    users: usize,

    /// Users launched per second
    #[arg(short = 'r', long, default_value = "1")]
    hatch_rate: String,

    /// Run time in seconds (0 = until stopped or iterations complete)
    #[arg(short = 't', long, default_value = "60")]
    run_time: usize,

    /// Stop each user after this many passes through its behaviors
    #[arg(long)]
    iterations: Option<usize>,

    /// Relative share of standard users (0 disables them)
    #[arg(long, default_value = "1")]
    standard_weight: usize,

    /// Relative share of high-load users (0 disables them)
    #[arg(long, default_value = "1")]
    high_load_weight: usize,

    /// SSM parameter holding the gateway URL
    #[arg(long)]
    ssm_parameter: Option<String>,

    /// AWS region
    #[arg(long, default_value = "us-east-1")]
    region: String,

    /// Show the scenario plan without sending requests
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose output showing individual request results
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn settings(&self) -> RunSettings {
        RunSettings {
            users: self.users,
            hatch_rate: self.hatch_rate.clone(),
            run_time: self.run_time,
            iterations: self.iterations,
            dry_run: self.dry_run,
            verbose: self.verbose,
            quiet: false,
        }
    }

    async fn gateway(&self) -> anyhow::Result<Gateway> {
        if let Some(host) = &self.host {
            return Ok(Gateway::with_url(host));
        }
        match &self.ssm_parameter {
            Some(parameter) => {
                SSMGatewayDiscovery::new(&self.region, parameter)
                    .await?
                    .discover_gateway()
                    .await
            }
            None => Ok(Gateway::from_env()),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("{}", "🚀 Gateway Load Tester".blue().bold());
    println!(
        "{}",
        format!(
            "Users: {}, Hatch rate: {}/s, Run time: {}s",
            args.users, args.hatch_rate, args.run_time
        )
        .bright_black()
    );

    let profiles = profile::user_kinds(args.standard_weight, args.high_load_weight);
    if profiles.is_empty() {
        anyhow::bail!("both user kinds have weight 0; nothing to run");
    }

    let gateway = args.gateway().await?;
    let start_time = Instant::now();

    let load_tester = LoadTester::new(args.settings(), gateway, profiles);

    if let Some(metrics) = load_tester.run_load_test().await? {
        load_tester.display_results(&metrics, start_time.elapsed());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_run_both_user_kinds_for_a_minute() {
        let args = Args::try_parse_from(["load-tester"]).unwrap();
        assert_eq!(args.users, 10);
        assert_eq!(args.hatch_rate, "1");
        assert_eq!(args.run_time, 60);
        assert_eq!(args.standard_weight, 1);
        assert_eq!(args.high_load_weight, 1);
        assert!(args.host.is_none());
        assert!(!args.dry_run);
    }

    #[test]
    fn run_controls_map_onto_settings() {
        let args = Args::try_parse_from([
            "load-tester",
            "--host",
            "http://gateway:8080/",
            "-u",
            "50",
            "-r",
            "5",
            "-t",
            "0",
            "--iterations",
            "3",
            "--high-load-weight",
            "0",
            "--dry-run",
            "-v",
        ])
        .unwrap();

        let settings = args.settings();
        assert_eq!(settings.users, 50);
        assert_eq!(settings.hatch_rate, "5");
        assert_eq!(settings.run_time, 0);
        assert_eq!(settings.iterations, Some(3));
        assert!(settings.dry_run);
        assert!(settings.verbose);
        assert!(!settings.quiet);
        assert_eq!(args.high_load_weight, 0);
    }

    #[tokio::test]
    async fn explicit_host_wins_over_discovery() {
        let args = Args::try_parse_from([
            "load-tester",
            "--host",
            "http://gateway:8080/",
            "--ssm-parameter",
            "/shop/gateway-url",
        ])
        .unwrap();

        let gateway = args.gateway().await.unwrap();
        assert_eq!(gateway.base_url, "http://gateway:8080");
    }
}
