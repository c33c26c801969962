use aws_config::BehaviorVersion;
use aws_sdk_ssm::Client;
use colored::*;

use crate::types::Gateway;

/// Looks the gateway base URL up in SSM Parameter Store.
pub struct SSMGatewayDiscovery {
    client: Client,
    parameter: String,
}

impl SSMGatewayDiscovery {
    pub async fn new(region: &str, parameter: impl Into<String>) -> anyhow::Result<Self> {
        let region = aws_config::Region::new(region.to_string());
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .load()
            .await;

        Ok(Self {
            client: Client::new(&config),
            parameter: parameter.into(),
        })
    }

    pub async fn discover_gateway(&self) -> anyhow::Result<Gateway> {
        println!("{}", "🔍 Discovering gateway from SSM...".blue());

        match self
            .client
            .get_parameter()
            .name(&self.parameter)
            .with_decryption(true)
            .send()
            .await
        {
            Ok(result) => {
                if let Some(value) = result.parameter.and_then(|p| p.value) {
                    println!("{}", format!("✓ Found gateway: {}", value).green());
                    return Ok(Gateway::with_url(value));
                }
            }
            Err(err) => {
                if err.to_string().contains("ParameterNotFound") {
                    println!(
                        "{}",
                        format!("⚠️  Parameter not found: {}", self.parameter).yellow()
                    );
                } else {
                    println!(
                        "{}",
                        format!("❌ Error fetching {}: {}", self.parameter, err).red()
                    );
                }
            }
        }

        let fallback = Gateway::from_env();
        println!(
            "{}",
            format!("🔄 Using fallback gateway: {}", fallback.base_url).cyan()
        );
        Ok(fallback)
    }
}
