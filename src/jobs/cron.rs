//! Five-field cron expressions.
//!
//! Descriptors declare standard `minute hour day-of-month month day-of-week`
//! expressions. The cron engine underneath expects a leading seconds field,
//! so [`CronExpression::to_scheduler_format`] pins seconds to zero.
//!
//! When both day fields are restricted, standard cron fires on days matching
//! either of them. The engine combines them with AND, so
//! [`CronExpression::engine_schedule`] widens both day fields and firings are
//! filtered with [`CronExpression::matches`].

use std::fmt;

use chrono::{DateTime, Utc};
use croner::Cron;
use croner::parser::{CronParser, Seconds};
use jiff::Timestamp;

use crate::jobs::error::JobError;

const FIELD_NAMES: [&str; 5] = ["minute", "hour", "day-of-month", "month", "day-of-week"];

#[derive(Debug, Clone, PartialEq)]
pub struct CronExpression {
    fields: [String; 5],
    schedule: Cron,
}

impl CronExpression {
    pub fn parse(expression: &str) -> Result<Self, JobError> {
        let invalid = |reason: String| JobError::InvalidCronExpression {
            expression: expression.to_string(),
            reason,
        };

        let parts: Vec<&str> = expression.split_whitespace().collect();
        if parts.len() != 5 {
            return Err(invalid(format!("expected 5 fields, found {}", parts.len())));
        }

        for (part, name) in parts.iter().zip(FIELD_NAMES) {
            if !part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '*' | '/' | ',' | '-' | '?'))
            {
                return Err(invalid(format!("invalid characters in {} field '{}'", name, part)));
            }
        }

        let fields = [
            parts[0].to_string(),
            parts[1].to_string(),
            parts[2].to_string(),
            parts[3].to_string(),
            parts[4].to_string(),
        ];
        let six_field = format!("0 {}", fields.join(" "));

        let schedule = parser(false)
            .parse(&six_field)
            .map_err(|e| invalid(e.to_string()))?;
        // The engine parses with its own settings; reject anything it would.
        parser(true)
            .parse(&six_field)
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self { fields, schedule })
    }

    /// Six-field form with seconds fixed at zero.
    pub fn to_scheduler_format(&self) -> String {
        format!("0 {}", self.fields.join(" "))
    }

    /// Schedule handed to the cron engine.
    ///
    /// Identical to [`Self::to_scheduler_format`] unless both day fields are
    /// restricted, in which case both become `*` and the engine fires daily.
    pub fn engine_schedule(&self) -> String {
        if !self.restricts_both_days() {
            return self.to_scheduler_format();
        }
        format!(
            "0 {} {} * {} *",
            self.fields[0], self.fields[1], self.fields[3]
        )
    }

    /// Whether engine firings must be filtered through [`Self::matches`].
    pub fn restricts_both_days(&self) -> bool {
        is_restricted(&self.fields[2]) && is_restricted(&self.fields[4])
    }

    /// Whether the minute containing `at` is a fire time.
    pub fn matches(&self, at: Timestamp) -> bool {
        let minute = at.as_second() - at.as_second().rem_euclid(60);
        DateTime::<Utc>::from_timestamp(minute, 0)
            .and_then(|dt| self.schedule.is_time_matching(&dt).ok())
            .unwrap_or(false)
    }

    /// First fire time strictly after `after`, in UTC.
    pub fn next_after(&self, after: Timestamp) -> Option<Timestamp> {
        let nanos = u32::try_from(after.subsec_nanosecond()).unwrap_or(0);
        let start = DateTime::<Utc>::from_timestamp(after.as_second(), nanos)?;
        let next = self.schedule.find_next_occurrence(&start, false).ok()?;
        Timestamp::from_second(next.timestamp()).ok()
    }
}

fn parser(dom_and_dow: bool) -> CronParser {
    CronParser::builder()
        .seconds(Seconds::Required)
        .dom_and_dow(dom_and_dow)
        .build()
}

fn is_restricted(field: &str) -> bool {
    !matches!(field, "*" | "?")
}

impl fmt::Display for CronExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fields.join(" "))
    }
}
