use chrono::{Datelike, NaiveDate};

/// Encoding of calendar dates inside schedule keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateKeyFormat {
    /// `2024-02-01`. Sorts chronologically.
    #[default]
    Iso,
    /// `2/1/2024`: month/day/year without zero padding, as written by older deployments.
    Legacy,
}

impl DateKeyFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateKeyFormat::Iso => "iso",
            DateKeyFormat::Legacy => "legacy",
        }
    }

    pub fn format(&self, date: NaiveDate) -> String {
        match self {
            DateKeyFormat::Iso => date.format("%Y-%m-%d").to_string(),
            DateKeyFormat::Legacy => {
                format!("{}/{}/{}", date.month(), date.day(), date.year())
            }
        }
    }

    pub fn parse(&self, raw: &str) -> Option<NaiveDate> {
        match self {
            DateKeyFormat::Iso => NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok(),
            DateKeyFormat::Legacy => {
                let mut parts = raw.split('/');
                let month = parts.next()?.parse().ok()?;
                let day = parts.next()?.parse().ok()?;
                let year = parts.next()?.parse().ok()?;
                if parts.next().is_some() {
                    return None;
                }
                NaiveDate::from_ymd_opt(year, month, day)
            }
        }
    }
}

impl std::fmt::Display for DateKeyFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DateKeyFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "iso" => Ok(DateKeyFormat::Iso),
            "legacy" | "en-us" => Ok(DateKeyFormat::Legacy),
            _ => Err(format!("Invalid date key format: {}", s)),
        }
    }
}
