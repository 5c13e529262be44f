//! Historical price query normalization
//!
//! The CLOB `/prices-history` endpoint accepts either a named `interval` ending
//! now, or an explicit `startTs`/`endTs` range in epoch seconds. Callers may also
//! send human-readable `startDate`/`endDate`, which are converted here. Only one
//! of those three selection modes may be used per request.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{GatewayError, GatewayResult};

/// Named lookback window ending at the current time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceInterval {
    /// Last month
    #[serde(rename = "1m")]
    OneMonth,
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "6h")]
    SixHours,
    #[serde(rename = "1h")]
    OneHour,
    /// Entire market lifetime
    #[serde(rename = "max")]
    Max,
}

impl PriceInterval {
    pub const ALL: [PriceInterval; 6] = [
        PriceInterval::OneMonth,
        PriceInterval::OneWeek,
        PriceInterval::OneDay,
        PriceInterval::SixHours,
        PriceInterval::OneHour,
        PriceInterval::Max,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceInterval::OneMonth => "1m",
            PriceInterval::OneWeek => "1w",
            PriceInterval::OneDay => "1d",
            PriceInterval::SixHours => "6h",
            PriceInterval::OneHour => "1h",
            PriceInterval::Max => "max",
        }
    }
}

impl FromStr for PriceInterval {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|i| i.as_str() == s).ok_or_else(|| {
            let accepted: Vec<&str> = Self::ALL.iter().map(|i| i.as_str()).collect();
            GatewayError::validation(format!(
                "Invalid interval '{}': expected one of {}",
                s,
                accepted.join(", ")
            ))
        })
    }
}

/// Raw `/prices-history` query parameters as sent by the caller
///
/// Everything is kept as text so malformed numbers surface as validation
/// errors instead of extractor rejections.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistoryParams {
    pub market: Option<String>,
    pub interval: Option<String>,
    pub start_ts: Option<String>,
    pub end_ts: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub fidelity: Option<String>,
}

/// Query in the exact shape the CLOB accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedHistoryQuery {
    pub market: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_ts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_ts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<PriceInterval>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fidelity: Option<u32>,
}

impl NormalizedHistoryQuery {
    /// Query string pairs for the upstream request
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("market", self.market.clone())];
        if let Some(interval) = self.interval {
            pairs.push(("interval", interval.as_str().to_string()));
        }
        if let Some(start) = self.start_ts {
            pairs.push(("startTs", start.to_string()));
        }
        if let Some(end) = self.end_ts {
            pairs.push(("endTs", end.to_string()));
        }
        if let Some(fidelity) = self.fidelity {
            pairs.push(("fidelity", fidelity.to_string()));
        }
        pairs
    }
}

impl PriceHistoryParams {
    /// Validate and convert into the upstream query shape
    pub fn normalize(&self) -> GatewayResult<NormalizedHistoryQuery> {
        let market = present(&self.market)
            .ok_or_else(|| GatewayError::validation("Missing required parameter: market"))?
            .to_string();

        let interval_fields = present_fields(&[("interval", &self.interval)]);
        let epoch_fields = present_fields(&[("startTs", &self.start_ts), ("endTs", &self.end_ts)]);
        let date_fields =
            present_fields(&[("startDate", &self.start_date), ("endDate", &self.end_date)]);

        let active_modes: Vec<&Vec<&str>> = [&interval_fields, &epoch_fields, &date_fields]
            .into_iter()
            .filter(|fields| !fields.is_empty())
            .collect();

        if active_modes.len() > 1 {
            let conflicting: Vec<&str> = active_modes.into_iter().flatten().copied().collect();
            return Err(GatewayError::validation(format!(
                "Conflicting time range parameters: {}. Use only one of interval, startTs/endTs or startDate/endDate",
                conflicting.join(", ")
            )));
        }

        let interval = present(&self.interval)
            .map(str::parse::<PriceInterval>)
            .transpose()?;

        let (start_ts, end_ts) = if !epoch_fields.is_empty() {
            (
                parse_epoch("startTs", &self.start_ts)?,
                parse_epoch("endTs", &self.end_ts)?,
            )
        } else {
            (
                parse_date("startDate", &self.start_date)?,
                parse_date("endDate", &self.end_date)?,
            )
        };

        if let (Some(start), Some(end)) = (start_ts, end_ts) {
            if start > end {
                return Err(GatewayError::validation(format!(
                    "Invalid time range: start ({}) is after end ({})",
                    start, end
                )));
            }
        }

        let fidelity = present(&self.fidelity)
            .map(|raw| match raw.parse::<u32>() {
                Ok(minutes) if minutes > 0 => Ok(minutes),
                _ => Err(GatewayError::validation(format!(
                    "Invalid fidelity '{}': expected a positive number of minutes",
                    raw
                ))),
            })
            .transpose()?;

        Ok(NormalizedHistoryQuery {
            market,
            start_ts,
            end_ts,
            interval,
            fidelity,
        })
    }
}

/// Convert a calendar date or timestamp into epoch seconds
///
/// A bare `YYYY-MM-DD` is midnight UTC. Full timestamps may be RFC 3339 or
/// zone-less (read as UTC). Sub-second precision is floored.
pub fn date_to_epoch_seconds(raw: &str) -> Option<i64> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp());
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.and_utc().timestamp())
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn present_fields<'a>(fields: &[(&'a str, &Option<String>)]) -> Vec<&'a str> {
    fields
        .iter()
        .filter(|(_, value)| present(value).is_some())
        .map(|(name, _)| *name)
        .collect()
}

fn parse_epoch(name: &str, value: &Option<String>) -> GatewayResult<Option<i64>> {
    present(value)
        .map(|raw| {
            raw.parse::<i64>().map_err(|_| {
                GatewayError::validation(format!(
                    "Invalid {} '{}': expected epoch seconds",
                    name, raw
                ))
            })
        })
        .transpose()
}

fn parse_date(name: &str, value: &Option<String>) -> GatewayResult<Option<i64>> {
    present(value)
        .map(|raw| {
            date_to_epoch_seconds(raw).ok_or_else(|| {
                GatewayError::validation(format!(
                    "Invalid {} '{}': expected YYYY-MM-DD or an ISO 8601 timestamp",
                    name, raw
                ))
            })
        })
        .transpose()
}
