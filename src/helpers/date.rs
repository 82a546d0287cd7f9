//! Date helper functions

use anyhow::{anyhow, bail, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Locale};
use std::fmt::Write;
use chrono_tz::Tz;

use crate::config::DateConfig;

/// Formats content API timestamps for display
///
/// # Examples
/// ```ignore
/// formatter.format("2021-03-25T19:25:28+0000") // -> Some("25 mar 2021")
/// ```
#[derive(Debug, Clone)]
pub struct DateFormatter {
    locale: Locale,
    timezone: Tz,
    format: String,
}

impl DateFormatter {
    /// Build a formatter from the `date` section of the site config
    pub fn new(config: &DateConfig) -> Result<Self> {
        let locale = Locale::try_from(config.locale.as_str())
            .map_err(|_| anyhow!("Unknown date locale: {}", config.locale))?;
        let timezone: Tz = config
            .timezone
            .parse()
            .map_err(|e| anyhow!("Unknown timezone {}: {}", config.timezone, e))?;
        if StrftimeItems::new_with_locale(&config.format, locale).any(|item| item == Item::Error) {
            bail!("Invalid date format: {}", config.format);
        }

        Ok(Self {
            locale,
            timezone,
            format: config.format.clone(),
        })
    }

    /// Format a raw timestamp; `None` when it cannot be parsed
    pub fn format(&self, raw: &str) -> Option<String> {
        let date = parse_timestamp(raw)?;
        let mut out = String::new();
        write!(
            out,
            "{}",
            date.with_timezone(&self.timezone)
                .format_localized(&self.format, self.locale)
        )
        .ok()?;
        Some(out)
    }

    /// Format a nullable timestamp
    pub fn format_opt(&self, raw: Option<&str>) -> Option<String> {
        match raw {
            Some(raw) => {
                let formatted = self.format(raw);
                if formatted.is_none() {
                    tracing::warn!("Unparseable publication date: {}", raw);
                }
                formatted
            }
            None => None,
        }
    }
}

impl Default for DateFormatter {
    fn default() -> Self {
        Self {
            locale: Locale::pt_BR,
            timezone: Tz::UTC,
            format: "%-d %b %Y".to_string(),
        }
    }
}

/// Parse a content API timestamp.
///
/// The API emits offsets without a colon (`+0000`), so RFC 3339 alone is
/// not enough.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
}
