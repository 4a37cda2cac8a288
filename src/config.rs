use std::collections::HashSet;
use std::ops::RangeInclusive;

use crate::error::AppError;

pub const DEFAULT_DATABASE_PATH: &str = "menudealmoco.db";
const DEV_JWT_SECRET: &str = "menudealmoco-dev-secret-change-me";
pub const DEFAULT_PASSWORD_COST: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

/// Artificial latency and failure injection for demo deployments.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoSettings {
    pub latency_ms: Option<RangeInclusive<u64>>,
    pub failure_rate: f64,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            latency_ms: None,
            failure_rate: 0.0,
        }
    }
}

/// Service settings read from `MMD_*` environment variables.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_path: String,
    pub jwt_secret: String,
    pub environment: Environment,
    pub admin_emails: HashSet<String>,
    pub google_client_ids: Vec<String>,
    /// bcrypt work factor for new password hashes.
    pub password_cost: u32,
    pub seed_demo: bool,
    pub demo: DemoSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            environment: Environment::Development,
            admin_emails: HashSet::new(),
            google_client_ids: Vec::new(),
            password_cost: DEFAULT_PASSWORD_COST,
            seed_demo: false,
            demo: DemoSettings::default(),
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, AppError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(AppError::validation(format!("{key}: '{other}' is not a boolean"))),
    }
}

fn parse_latency(value: &str) -> Result<Option<RangeInclusive<u64>>, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let bad = || AppError::validation(format!("MMD_DEMO_LATENCY_MS: expected 'min-max', got '{value}'"));
    let (min, max) = match value.split_once('-') {
        Some((min, max)) => (min.trim(), max.trim()),
        None => (value, value),
    };
    let min: u64 = min.parse().map_err(|_| bad())?;
    let max: u64 = max.parse().map_err(|_| bad())?;
    if min > max {
        return Err(bad());
    }
    Ok(Some(min..=max))
}

fn split_csv(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup. Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(path) = lookup("MMD_DATABASE_PATH").filter(|p| !p.trim().is_empty()) {
            settings.database_path = path.trim().to_string();
        }

        if let Some(env) = lookup("MMD_ENV") {
            settings.environment = match env.trim().to_lowercase().as_str() {
                "production" | "prod" => Environment::Production,
                "development" | "dev" | "" => Environment::Development,
                other => {
                    return Err(AppError::validation(format!("MMD_ENV: unknown environment '{other}'")))
                }
            };
        }

        match lookup("JWT_SECRET_KEY").filter(|s| !s.is_empty()) {
            Some(secret) => settings.jwt_secret = secret,
            None if settings.environment == Environment::Production => {
                return Err(AppError::validation("JWT_SECRET_KEY must be set in production"));
            }
            None => {}
        }

        if let Some(emails) = lookup("MMD_ADMIN_EMAILS") {
            settings.admin_emails = split_csv(&emails).map(|e| e.to_lowercase()).collect();
        }
        if let Some(ids) = lookup("GOOGLE_CLIENT_IDS") {
            settings.google_client_ids = split_csv(&ids).collect();
        }
        if let Some(cost) = lookup("MMD_BCRYPT_COST") {
            settings.password_cost = cost
                .trim()
                .parse()
                .ok()
                .filter(|c| (4..=31).contains(c))
                .ok_or_else(|| AppError::validation("MMD_BCRYPT_COST must be between 4 and 31"))?;
        }
        if let Some(seed) = lookup("MMD_SEED_DEMO") {
            settings.seed_demo = parse_bool("MMD_SEED_DEMO", &seed)?;
        }
        if let Some(latency) = lookup("MMD_DEMO_LATENCY_MS") {
            settings.demo.latency_ms = parse_latency(&latency)?;
        }
        if let Some(rate) = lookup("MMD_DEMO_FAILURE_RATE") {
            let rate: f64 = rate.trim().parse().map_err(|_| {
                AppError::validation(format!("MMD_DEMO_FAILURE_RATE: '{rate}' is not a number"))
            })?;
            if !(0.0..=1.0).contains(&rate) {
                return Err(AppError::validation("MMD_DEMO_FAILURE_RATE must be between 0 and 1"));
            }
            settings.demo.failure_rate = rate;
        }

        Ok(settings)
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails.contains(&email.to_lowercase())
    }
}
