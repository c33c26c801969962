use colored::*;
use goose::config::GooseConfiguration;
use goose::prelude::*;
use goose::GooseScheduler;
use std::time::Duration;

use crate::profile::UserProfile;
use crate::types::Gateway;

/// Run controls handed to the engine.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub users: usize,
    pub hatch_rate: String,
    /// Seconds; zero runs until stopped or until `iterations` complete.
    pub run_time: usize,
    pub iterations: Option<usize>,
    pub dry_run: bool,
    pub verbose: bool,
    pub quiet: bool,
}

pub struct LoadTester {
    settings: RunSettings,
    gateway: Gateway,
    profiles: Vec<UserProfile>,
}

impl LoadTester {
    pub fn new(settings: RunSettings, gateway: Gateway, profiles: Vec<UserProfile>) -> Self {
        Self {
            settings,
            gateway,
            profiles,
        }
    }

    pub fn build_attack(&self) -> Result<GooseAttack, GooseError> {
        // Iterations must be on the configuration itself; goose ignores it as a default.
        let mut configuration = GooseConfiguration::default();
        if let Some(iterations) = self.settings.iterations {
            configuration.iterations = iterations;
        }

        let mut attack = GooseAttack::initialize_with_config(configuration)?
            .set_scheduler(GooseScheduler::Random);

        for profile in &self.profiles {
            attack = attack.register_scenario(profile.clone().into_scenario()?);
        }

        attack = *attack.set_default(GooseDefault::Host, self.gateway.base_url.as_str())?;
        attack = *attack.set_default(GooseDefault::Users, self.settings.users)?;
        attack = *attack.set_default(GooseDefault::HatchRate, self.settings.hatch_rate.as_str())?;
        // No telnet/websocket controllers; this binary is driven by its flags.
        attack = *attack.set_default(GooseDefault::NoTelnet, true)?;
        attack = *attack.set_default(GooseDefault::NoWebSocket, true)?;

        // Goose rejects a run time combined with iterations.
        if self.settings.run_time > 0 && self.settings.iterations.is_none() {
            attack = *attack.set_default(GooseDefault::RunTime, self.settings.run_time)?;
        }
        if self.settings.verbose {
            attack = *attack.set_default(GooseDefault::Verbose, 1)?;
        }
        if self.settings.quiet {
            attack = *attack.set_default(GooseDefault::Quiet, 1)?;
        }

        Ok(attack)
    }

    pub async fn run_load_test(&self) -> anyhow::Result<Option<GooseMetrics>> {
        if self.settings.dry_run {
            self.display_plan();
            return Ok(None);
        }

        println!("{}", "\n🎯 Starting load test...".blue());
        println!(
            "{}",
            format!(
                "⚡ {} users against {}, hatch rate {}/s",
                self.settings.users, self.gateway.base_url, self.settings.hatch_rate
            )
            .yellow()
        );

        let metrics = self.build_attack()?.execute().await?;
        Ok(Some(metrics))
    }

    pub fn display_plan(&self) {
        println!("{}", "\n📝 Scenario plan (dry run)".blue().bold());
        println!("{}", "═".repeat(60).bright_black());
        println!("{}", format!("Gateway: {}", self.gateway.base_url).bright_black());

        let total_profile_weight: usize = self.profiles.iter().map(|p| p.weight).sum();
        for profile in &self.profiles {
            let user_share = if total_profile_weight > 0 {
                profile.weight as f64 / total_profile_weight as f64 * 100.0
            } else {
                0.0
            };
            println!(
                "{}",
                format!("\n👤 {} ({:.0}% of users)", profile.name, user_share)
                    .cyan()
                    .bold()
            );
            match profile.pause {
                Some(pause) => println!(
                    "{}",
                    format!(
                        "   Think time: {}s - {}s",
                        pause.min.as_secs_f64(),
                        pause.max.as_secs_f64()
                    )
                    .bright_black()
                ),
                None => println!("{}", "   Think time: none".bright_black()),
            }

            for entry in &profile.behaviors {
                println!(
                    "   • {:<24} weight {:>2}  ({:.1}%)",
                    entry.behavior.name(),
                    entry.weight,
                    profile.share(entry.behavior) * 100.0
                );
            }
        }

        println!("{}", format!("\n{}", "═".repeat(60)).bright_black());
    }

    pub fn display_results(&self, metrics: &GooseMetrics, total_time: Duration) {
        let mut breakdown: Vec<(&String, usize, usize)> = metrics
            .requests
            .iter()
            .map(|(key, aggregate)| (key, aggregate.success_count, aggregate.fail_count))
            .collect();
        breakdown.sort_by(|a, b| a.0.cmp(b.0));

        let successful_requests: usize = breakdown.iter().map(|(_, ok, _)| ok).sum();
        let failed_requests: usize = breakdown.iter().map(|(_, _, failed)| failed).sum();
        let total_requests = successful_requests + failed_requests;

        let requests_per_second = if total_time.as_secs_f64() > 0.0 {
            total_requests as f64 / total_time.as_secs_f64()
        } else {
            0.0
        };

        let success_rate = if total_requests > 0 {
            (successful_requests as f64 / total_requests as f64) * 100.0
        } else {
            0.0
        };

        println!("{}", "\n📊 Load Test Results".green().bold());
        println!("{}", "═".repeat(50).bright_black());

        println!("{}", format!("Total Requests: {}", total_requests).blue());
        println!("{}", format!("✓ Successful: {}", successful_requests).green());
        println!("{}", format!("✗ Failed: {}", failed_requests).red());
        println!("{}", format!("Success Rate: {:.1}%", success_rate).yellow());
        println!("{}", format!("Requests/Second: {:.1}", requests_per_second).magenta());
        println!("{}", format!("Total Test Time: {}ms", total_time.as_millis()).bright_black());

        println!("{}", "\n📈 Request Breakdown by Name:".blue().bold());
        println!("{}", "─".repeat(80).bright_black());

        for (name, success, failed) in breakdown {
            let total = success + failed;
            let rate = if total > 0 {
                (success as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            let line = format!("{}: {}/{} ({:.1}%)", name, success, total, rate);

            if rate >= 90.0 {
                println!("{}", format!("  ✓ {}", line).green());
            } else if rate >= 70.0 {
                println!("{}", format!("  ⚠ {}", line).yellow());
            } else {
                println!("{}", format!("  ✗ {}", line).red());
            }
        }

        println!("{}", format!("\n{}", "═".repeat(50)).bright_black());
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use wiremock::MockServer;

    pub fn single_pass() -> RunSettings {
        RunSettings {
            users: 1,
            hatch_rate: "1".to_string(),
            run_time: 0,
            iterations: Some(1),
            dry_run: false,
            verbose: false,
            quiet: true,
        }
    }

    /// One goose user runs `profile` once against the mock gateway.
    pub async fn run_single_pass(server: &MockServer, profile: UserProfile) -> GooseMetrics {
        let tester = LoadTester::new(single_pass(), Gateway::with_url(server.uri()), vec![profile]);
        tester
            .build_attack()
            .expect("attack builds")
            .execute()
            .await
            .expect("attack runs")
    }
}
