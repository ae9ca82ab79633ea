use crate::money::percent_of;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use snafu::{ensure, Snafu};
use uuid::Uuid;

/// Percent charged up front when no active range matches: pay in full.
pub const DEFAULT_DEPOSIT_PERCENT: Decimal = Decimal::ONE_HUNDRED;

/// One row of the deposit schedule. Both ends of the range are inclusive;
/// `max_total = None` means the range is open-ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositSetting {
    pub id: Uuid,
    pub min_total: Decimal,
    pub max_total: Option<Decimal>,
    pub percent: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Snafu, PartialEq)]
pub enum DepositError {
    #[snafu(display("Deposit percent must be above 0 and at most 100, got {}", percent))]
    InvalidPercent { percent: Decimal },

    #[snafu(display("Invalid range: {}", reason))]
    InvalidRange { reason: String },

    #[snafu(display("Range overlaps active deposit setting {}", other))]
    Overlap { other: Uuid },
}

impl DepositSetting {
    #[must_use]
    pub fn new(min_total: Decimal, max_total: Option<Decimal>, percent: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            min_total,
            max_total,
            percent,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn contains(&self, total: Decimal) -> bool {
        self.min_total <= total && self.max_total.map_or(true, |max| total <= max)
    }

    #[must_use]
    pub fn overlaps(&self, other: &DepositSetting) -> bool {
        let starts_before_other_ends = other.max_total.map_or(true, |max| self.min_total <= max);
        let other_starts_before_end = self.max_total.map_or(true, |max| other.min_total <= max);
        starts_before_other_ends && other_starts_before_end
    }

    /// Checks the row on its own: percent and range bounds.
    pub fn validate(&self) -> Result<(), DepositError> {
        ensure!(
            self.percent > Decimal::ZERO && self.percent <= Decimal::ONE_HUNDRED,
            InvalidPercentSnafu {
                percent: self.percent,
            }
        );
        ensure!(
            self.min_total >= Decimal::ZERO,
            InvalidRangeSnafu {
                reason: format!("min_total {} is negative", self.min_total),
            }
        );
        if let Some(max) = self.max_total {
            ensure!(
                max > self.min_total,
                InvalidRangeSnafu {
                    reason: format!("max_total {} must exceed min_total {}", max, self.min_total),
                }
            );
        }
        Ok(())
    }

    /// Checks the row against the rest of the schedule. Inactive rows on
    /// either side never conflict, and a row is never compared with itself.
    pub fn validate_against(&self, existing: &[DepositSetting]) -> Result<(), DepositError> {
        self.validate()?;
        if !self.is_active {
            return Ok(());
        }
        if let Some(other) = existing
            .iter()
            .filter(|s| s.is_active && s.id != self.id)
            .find(|s| self.overlaps(s))
        {
            return OverlapSnafu { other: other.id }.fail();
        }
        Ok(())
    }
}

/// Deposit amount for `total` at `percent`, rounded to cents.
#[must_use]
pub fn deposit_amount(total: Decimal, percent: Decimal) -> Decimal {
    percent_of(total, percent)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepositQuote {
    pub total: Decimal,
    pub percent: Decimal,
    pub deposit_amount: Decimal,
    pub balance: Decimal,
}

/// Active deposit ranges, ordered by `min_total`.
#[derive(Debug, Clone)]
pub struct DepositSchedule {
    settings: Vec<DepositSetting>,
    default_percent: Decimal,
}

impl DepositSchedule {
    #[must_use]
    pub fn new(settings: Vec<DepositSetting>, default_percent: Decimal) -> Self {
        let mut settings: Vec<_> = settings.into_iter().filter(|s| s.is_active).collect();
        settings.sort_by(|a, b| a.min_total.cmp(&b.min_total));
        Self {
            settings,
            default_percent,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &[DepositSetting] {
        &self.settings
    }

    #[must_use]
    pub fn deposit_percent_for(&self, total: Decimal) -> Decimal {
        self.settings
            .iter()
            .find(|s| s.contains(total))
            .map_or(self.default_percent, |s| s.percent)
    }

    #[must_use]
    pub fn quote(&self, total: Decimal) -> DepositQuote {
        let percent = self.deposit_percent_for(total);
        let deposit_amount = deposit_amount(total, percent);
        DepositQuote {
            total,
            percent,
            deposit_amount,
            balance: total - deposit_amount,
        }
    }
}
