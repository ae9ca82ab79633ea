use config::{Config, Environment, File};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shop_models::DEFAULT_DEPOSIT_PERCENT;
use snafu::{ensure, ResultExt, Snafu};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Snafu)]
pub enum SettingsError {
    #[snafu(display("Failed to load config: {}", source))]
    Load { source: config::ConfigError },

    #[snafu(display("Failed to create config file: {}", source))]
    Create { source: std::io::Error },

    #[snafu(display("Failed to serialize default config: {}", source))]
    Serialize { source: toml::ser::Error },

    #[snafu(display("default_deposit_percent must be in (0, 100], got {}", percent))]
    InvalidDefaultPercent { percent: Decimal },

    #[snafu(display("pending_order_ttl_minutes {} is out of range", minutes))]
    InvalidPendingTtl { minutes: u64 },
}

type Result<T> = std::result::Result<T, SettingsError>;

/// Runtime settings, read from a TOML file and `SHOP_*` environment
/// variables (the environment wins).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Deposit percent used when no schedule range matches a total.
    pub default_deposit_percent: Decimal,
    /// Unpaid orders older than this are cancelled. 0 disables expiry.
    pub pending_order_ttl_minutes: u64,
    pub monitor_interval_secs: u64,
    pub currency: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_deposit_percent: DEFAULT_DEPOSIT_PERCENT,
            pending_order_ttl_minutes: 7 * 24 * 60,
            monitor_interval_secs: 60,
            currency: "USD".to_string(),
        }
    }
}

impl Settings {
    pub fn load(config_path: &Path) -> Result<Self> {
        // Create default config if it doesn't exist
        if !config_path.exists() {
            Self::create_default_config(config_path)?;
        }

        let settings = Config::builder()
            .add_source(File::from(config_path))
            .add_source(Environment::with_prefix("SHOP").try_parsing(true))
            .build()
            .context(LoadSnafu)?;

        let settings: Settings = settings.try_deserialize().context(LoadSnafu)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        let percent = self.default_deposit_percent;
        ensure!(
            percent > Decimal::ZERO && percent <= Decimal::ONE_HUNDRED,
            InvalidDefaultPercentSnafu { percent }
        );

        let minutes = self.pending_order_ttl_minutes;
        ensure!(
            minutes == 0 || self.pending_order_ttl().is_some(),
            InvalidPendingTtlSnafu { minutes }
        );
        Ok(())
    }

    fn create_default_config(path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(&Settings::default()).context(SerializeSnafu)?;
        std::fs::write(path, toml).context(CreateSnafu)?;

        tracing::info!("Created default config file at {}", path.display());
        Ok(())
    }

    #[must_use]
    pub fn pending_order_ttl(&self) -> Option<chrono::Duration> {
        match self.pending_order_ttl_minutes {
            0 => None,
            minutes => i64::try_from(minutes)
                .ok()
                .and_then(chrono::Duration::try_minutes),
        }
    }

    #[must_use]
    pub fn monitor_interval(&self) -> Duration {
        Duration::from_secs(self.monitor_interval_secs.max(1))
    }
}
