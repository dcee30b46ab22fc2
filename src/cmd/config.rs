use clap::{Args, Subcommand};

use crate::config::AppConfig;
use crate::error::AppResult;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Show the resolved configuration (secrets masked).
    Show,
}

pub fn run(config: &AppConfig, command: ConfigCommand) -> AppResult<()> {
    match command {
        ConfigCommand::Show => run_show(config),
    }
}

fn run_show(config: &AppConfig) -> AppResult<()> {
    println!("Slack bot token: {}", mask_secret(&config.slack_bot_token));
    println!(
        "Fallback recipient: {}",
        display_value(&config.fallback_recipient)
    );
    println!(
        "Firestore project: {}",
        display_value(&config.firestore.project_id)
    );
    println!("Firestore database: {}", config.firestore.database);
    println!(
        "Firestore access token: {}",
        mask_secret(&config.firestore.access_token)
    );
    println!(
        "Firestore emulator: {}",
        display_value(&config.firestore.emulator_host)
    );
    println!("Admin email: {}", config.admin_email);
    println!("Ticket URL base: {}", config.ticket_url_base);
    println!("HTTP timeout: {}s", config.http_timeout.as_secs());
    println!("JSON logs: {}", config.log_json);

    Ok(())
}

fn display_value(value: &Option<String>) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "<not set>".to_string())
}

fn mask_secret(value: &Option<String>) -> String {
    let token = value.as_deref().map(str::trim).unwrap_or_default();
    let chars: Vec<char> = token.chars().collect();
    match chars.len() {
        0 => "<not set>".to_string(),
        len if len > 8 => {
            let prefix: String = chars[..5].iter().collect();
            let suffix: String = chars[len - 3..].iter().collect();
            format!("{prefix}***{suffix}")
        }
        _ => "***".to_string(),
    }
}
