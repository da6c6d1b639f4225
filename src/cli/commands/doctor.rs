//! Doctor command - verify configuration and environment.

use crate::cli::Output;
use crate::config::Settings;
use console::style;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Earshot Doctor");
    println!();

    let mut checks = Vec::new();

    println!("{}", style("Provider").bold());
    let provider_checks = vec![
        check_api_key(
            &settings.provider.api_key_env,
            std::env::var(&settings.provider.api_key_env).ok(),
        ),
        check_base_url(&settings.provider.base_url),
    ];
    for check in &provider_checks {
        check.print();
    }
    checks.extend(provider_checks);

    println!();

    println!("{}", style("Directories").bold());
    let dir_check = check_uploads_dir(settings);
    dir_check.print();
    checks.push(dir_check);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file();
    config_check.print();
    checks.push(config_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before starting Earshot.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Earshot is ready to use.");
    }

    Ok(())
}

/// Check that the API key variable holds something plausible.
fn check_api_key(var: &str, value: Option<String>) -> CheckResult {
    let hint = format!("Set with: export {}='...'", var);
    match value {
        Some(key) if key.trim().is_empty() => CheckResult::error(var, "empty", &hint),
        Some(key) if key.len() > 12 => {
            let head: String = key.chars().take(4).collect();
            let tail: String = key.chars().skip(key.chars().count().saturating_sub(4)).collect();
            let masked = format!("{}...{}", head, tail);
            CheckResult::ok(var, &format!("configured ({})", masked))
        }
        Some(_) => CheckResult::warning(var, "set but looks too short", "Double-check the key"),
        None => CheckResult::error(var, "not set", &hint),
    }
}

fn check_base_url(base_url: &str) -> CheckResult {
    match url::Url::parse(base_url) {
        Ok(url) if url.scheme() == "https" => CheckResult::ok("Base URL", base_url),
        Ok(_) => CheckResult::warning(
            "Base URL",
            &format!("{} (not https)", base_url),
            "Plain HTTP sends the API key unencrypted",
        ),
        Err(e) => CheckResult::error(
            "Base URL",
            &format!("invalid: {}", e),
            "Fix provider.base_url in the config file",
        ),
    }
}

fn check_uploads_dir(settings: &Settings) -> CheckResult {
    let dir = settings.uploads_dir();
    if dir.is_dir() {
        CheckResult::ok("Uploads directory", &format!("{}", dir.display()))
    } else {
        CheckResult::warning(
            "Uploads directory",
            &format!("{} (will be created)", dir.display()),
            "Directory will be created when the server starts",
        )
    }
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            &format!("Create {} to override", config_path.display()),
        )
    }
}
