//! Data model for a company's business settings.
//!
//! The backend serializes these records with snake_case field names and is
//! loose about numeric types: `overtime_rate` and the leave-day counts may
//! arrive as JSON numbers or as string-typed numerics (`"1.5"`, `"10"`), and
//! time-of-day fields may or may not carry seconds. Deserialization here
//! normalizes all of that so the rest of the crate only sees proper types.

use chrono::{DateTime, NaiveTime, Utc};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};

use crate::calc::parse_time_of_day;

/// How often salaries are paid out.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum SalaryCycle {
    #[default]
    Monthly,
    #[serde(rename = "Bi-Weekly")]
    BiWeekly,
    Weekly,
}

impl std::fmt::Display for SalaryCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Monthly => write!(f, "Monthly"),
            Self::BiWeekly => write!(f, "Bi-Weekly"),
            Self::Weekly => write!(f, "Weekly"),
        }
    }
}

/// A company's business settings as served by the backend.
///
/// At most one instance is cached per client session; `Default` yields the
/// fixed fallback record served whenever no backend response and no persisted
/// copy exist.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BusinessSettings {
    /// Backend-assigned record id. Absent on the default record.
    #[serde(default)]
    pub id: Option<i64>,
    /// Owning company. Absent on the default record.
    #[serde(default)]
    pub company_id: Option<i64>,
    #[serde(default)]
    pub salary_cycle: SalaryCycle,
    #[serde(
        default = "default_workday_start",
        deserialize_with = "deserialize_time"
    )]
    pub workday_start: NaiveTime,
    #[serde(default = "default_workday_end", deserialize_with = "deserialize_time")]
    pub workday_end: NaiveTime,
    #[serde(
        default = "default_annual_leave_days",
        deserialize_with = "deserialize_u32"
    )]
    pub annual_leave_days: u32,
    #[serde(
        default = "default_sick_leave_days",
        deserialize_with = "deserialize_u32"
    )]
    pub sick_leave_days: u32,
    /// Multiplier applied to the hourly rate for overtime hours (e.g. 1.5).
    #[serde(default = "default_overtime_rate", deserialize_with = "deserialize_f64")]
    pub overtime_rate: f64,
    /// ISO 4217-like currency code (e.g. "USD").
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Informational only on the client.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Informational only on the client.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for BusinessSettings {
    fn default() -> Self {
        Self {
            id: None,
            company_id: None,
            salary_cycle: SalaryCycle::Monthly,
            workday_start: default_workday_start(),
            workday_end: default_workday_end(),
            annual_leave_days: default_annual_leave_days(),
            sick_leave_days: default_sick_leave_days(),
            overtime_rate: default_overtime_rate(),
            currency: default_currency(),
            created_at: None,
            updated_at: None,
        }
    }
}

/// Partial settings record for updates.
///
/// Serializes only the fields that are set; `apply_to` performs the shallow
/// merge used by the optimistic local-update path.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_cycle: Option<SalaryCycle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workday_start: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workday_end: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_leave_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sick_leave_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overtime_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl SettingsUpdate {
    /// Shallow-merge this partial record into `base`.
    ///
    /// Backend-owned fields (`id`, `company_id`, timestamps) are taken from
    /// `base` unchanged.
    pub fn apply_to(&self, base: &BusinessSettings) -> BusinessSettings {
        let mut merged = base.clone();
        if let Some(cycle) = self.salary_cycle {
            merged.salary_cycle = cycle;
        }
        if let Some(start) = self.workday_start {
            merged.workday_start = start;
        }
        if let Some(end) = self.workday_end {
            merged.workday_end = end;
        }
        if let Some(days) = self.annual_leave_days {
            merged.annual_leave_days = days;
        }
        if let Some(days) = self.sick_leave_days {
            merged.sick_leave_days = days;
        }
        if let Some(rate) = self.overtime_rate {
            merged.overtime_rate = rate;
        }
        if let Some(currency) = &self.currency {
            merged.currency = currency.clone();
        }
        merged
    }
}

fn default_workday_start() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn default_workday_end() -> NaiveTime {
    NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn default_annual_leave_days() -> u32 {
    15
}

fn default_sick_leave_days() -> u32 {
    10
}

fn default_overtime_rate() -> f64 {
    1.5
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Accepts `HH:MM` and `HH:MM:SS`.
fn deserialize_time<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_time_of_day(&raw).ok_or_else(|| DeError::custom(format!("invalid time of day: {raw}")))
}

/// Accepts a JSON number or a string-typed numeric.
fn deserialize_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Text(s) => s.trim().parse::<f64>().map_err(DeError::custom),
    }
}

/// Accepts a JSON integer or a string-typed numeric.
fn deserialize_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u32),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Text(s) => s.trim().parse::<u32>().map_err(DeError::custom),
    }
}
