use std::fmt;
use std::str::FromStr;

use crate::error::AlgopackError;

const ACCEPTED: &str = "accepted values: '1min', '5min', '10min', '15min', '20min', '30min', \
     '1h', '2h', '3h', '6h', '12h', '1D', '5D', '10D', '1W', '2W', '4W', '1M'; \
     or codes 1, 10, 60, 24, 7, 31";

/// A candle granularity the service can serve natively.
///
/// The wire `interval` parameter carries the integer code of the variant
/// (1, 10, 60, 24, 7, 31).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandlePeriod {
    /// One minute (code 1).
    I1m,
    /// Ten minutes (code 10).
    I10m,
    /// One hour (code 60).
    I1h,
    /// One day (code 24).
    D1,
    /// One week (code 7).
    W1,
    /// One month (code 31).
    M1,
}

impl CandlePeriod {
    /// The integer code the service expects in the `interval` parameter.
    #[must_use]
    pub const fn interval(self) -> u32 {
        match self {
            Self::I1m => 1,
            Self::I10m => 10,
            Self::I1h => 60,
            Self::D1 => 24,
            Self::W1 => 7,
            Self::M1 => 31,
        }
    }

    /// Nominal bucket length in minutes (months count as 31 days).
    #[must_use]
    pub const fn minutes(self) -> u32 {
        match self {
            Self::I1m => 1,
            Self::I10m => 10,
            Self::I1h => 60,
            Self::D1 => 24 * 60,
            Self::W1 => 7 * 24 * 60,
            Self::M1 => 31 * 24 * 60,
        }
    }

    /// Resolve an integer period code.
    ///
    /// # Errors
    /// Returns [`AlgopackError::InvalidPeriod`] for codes outside
    /// `{1, 10, 60, 24, 7, 31}`.
    pub fn from_code(code: u32) -> Result<Self, AlgopackError> {
        match code {
            1 => Ok(Self::I1m),
            10 => Ok(Self::I10m),
            60 => Ok(Self::I1h),
            24 => Ok(Self::D1),
            7 => Ok(Self::W1),
            31 => Ok(Self::M1),
            other => Err(AlgopackError::InvalidPeriod(format!(
                "wrong period code: {other}; {ACCEPTED}"
            ))),
        }
    }
}

impl fmt::Display for CandlePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Self::I1m => "1min",
            Self::I10m => "10min",
            Self::I1h => "1h",
            Self::D1 => "1d",
            Self::W1 => "1w",
            Self::M1 => "1m",
        };
        f.write_str(token)
    }
}

impl FromStr for CandlePeriod {
    type Err = AlgopackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1min" => Ok(Self::I1m),
            "10min" => Ok(Self::I10m),
            "1h" => Ok(Self::I1h),
            "1d" => Ok(Self::D1),
            "1w" => Ok(Self::W1),
            "1m" => Ok(Self::M1),
            other => Err(AlgopackError::InvalidPeriod(format!(
                "wrong period value: '{other}'; {ACCEPTED}"
            ))),
        }
    }
}

/// A coarser bucketing the service cannot serve natively: the nearest
/// fetchable base granularity plus the local resampling target in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResamplePeriod {
    /// The granularity to request from the service.
    pub fetch: CandlePeriod,
    /// The bucket length to resample to, in minutes.
    pub target_minutes: u32,
}

impl ResamplePeriod {
    /// Parse a compound token like `"5min"`, `"2h"`, or `"10D"`.
    ///
    /// # Errors
    /// Returns [`AlgopackError::InvalidPeriod`] for anything outside the
    /// closed compound-token set.
    pub fn parse(token: &str) -> Result<Self, AlgopackError> {
        let digits: String = token.chars().take_while(char::is_ascii_digit).collect();
        let unit = &token[digits.len()..];
        let number: u32 = digits.parse().map_err(|_| invalid(token))?;

        let (fetch, target_minutes) = match (unit, number) {
            ("min", 5 | 10 | 15) => (CandlePeriod::I1m, number),
            ("min", 20 | 30) => (CandlePeriod::I10m, number),
            ("h" | "H", 1 | 2 | 3 | 6 | 12) => (CandlePeriod::I1h, number * 60),
            ("d" | "D", 1 | 5 | 10) => (CandlePeriod::D1, number * 24 * 60),
            ("w" | "W", 1 | 2 | 4) => (CandlePeriod::W1, number * 7 * 24 * 60),
            _ => return Err(invalid(token)),
        };
        Ok(Self {
            fetch,
            target_minutes,
        })
    }
}

fn invalid(token: &str) -> AlgopackError {
    AlgopackError::InvalidPeriod(format!("wrong period value: '{token}'; {ACCEPTED}"))
}

/// A caller-supplied period in any of the accepted shapes: an enumerated
/// period, an integer code, or a short string token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodSpec {
    /// Already-resolved period.
    Period(CandlePeriod),
    /// Integer code (1, 10, 60, 24, 7, 31).
    Code(u32),
    /// String token, possibly a compound resampling token.
    Token(String),
}

impl PeriodSpec {
    /// Resolve to a fetchable granularity plus an optional local resampling
    /// target. Plain periods and codes resolve to `(period, None)`; compound
    /// tokens resolve to their base granularity and target minutes.
    ///
    /// # Errors
    /// Returns [`AlgopackError::InvalidPeriod`] when the spec matches neither
    /// the native vocabulary nor the compound-token set.
    pub fn resolve(&self) -> Result<(CandlePeriod, Option<u32>), AlgopackError> {
        match self {
            Self::Period(p) => Ok((*p, None)),
            Self::Code(code) => CandlePeriod::from_code(*code).map(|p| (p, None)),
            Self::Token(token) => match token.parse::<CandlePeriod>() {
                Ok(p) => Ok((p, None)),
                Err(_) => {
                    let rp = ResamplePeriod::parse(token)?;
                    Ok((rp.fetch, Some(rp.target_minutes)))
                }
            },
        }
    }
}

impl From<CandlePeriod> for PeriodSpec {
    fn from(p: CandlePeriod) -> Self {
        Self::Period(p)
    }
}

impl From<u32> for PeriodSpec {
    fn from(code: u32) -> Self {
        Self::Code(code)
    }
}

impl From<&str> for PeriodSpec {
    fn from(token: &str) -> Self {
        Self::Token(token.to_owned())
    }
}

impl From<String> for PeriodSpec {
    fn from(token: String) -> Self {
        Self::Token(token)
    }
}

#[cfg(test)]
mod tests {
    use super::{CandlePeriod, PeriodSpec, ResamplePeriod};

    #[test]
    fn integer_codes_map_to_distinct_periods() {
        let codes = [1u32, 10, 60, 24, 7, 31];
        let mut seen = Vec::new();
        for code in codes {
            let period = CandlePeriod::from_code(code).unwrap();
            assert_eq!(period.interval(), code);
            assert!(!seen.contains(&period));
            seen.push(period);
        }
    }

    #[test]
    fn unsupported_code_is_rejected() {
        assert!(CandlePeriod::from_code(5).is_err());
        assert!(CandlePeriod::from_code(0).is_err());
    }

    #[test]
    fn string_tokens_mirror_integer_codes() {
        assert_eq!("1min".parse::<CandlePeriod>().unwrap(), CandlePeriod::I1m);
        assert_eq!("10min".parse::<CandlePeriod>().unwrap(), CandlePeriod::I10m);
        assert_eq!("1h".parse::<CandlePeriod>().unwrap(), CandlePeriod::I1h);
        assert_eq!("1d".parse::<CandlePeriod>().unwrap(), CandlePeriod::D1);
        assert_eq!("1w".parse::<CandlePeriod>().unwrap(), CandlePeriod::W1);
        assert_eq!("1m".parse::<CandlePeriod>().unwrap(), CandlePeriod::M1);
        assert!("2min".parse::<CandlePeriod>().is_err());
    }

    #[test]
    fn compound_tokens_resolve_to_base_and_target() {
        let five = ResamplePeriod::parse("5min").unwrap();
        assert_eq!(five.fetch, CandlePeriod::I1m);
        assert_eq!(five.target_minutes, 5);

        let twenty = ResamplePeriod::parse("20min").unwrap();
        assert_eq!(twenty.fetch, CandlePeriod::I10m);
        assert_eq!(twenty.target_minutes, 20);

        let two_hours = ResamplePeriod::parse("2h").unwrap();
        assert_eq!(two_hours.fetch, CandlePeriod::I1h);
        assert_eq!(two_hours.target_minutes, 120);

        let ten_days = ResamplePeriod::parse("10D").unwrap();
        assert_eq!(ten_days.fetch, CandlePeriod::D1);
        assert_eq!(ten_days.target_minutes, 14_400);

        let four_weeks = ResamplePeriod::parse("4W").unwrap();
        assert_eq!(four_weeks.fetch, CandlePeriod::W1);
        assert_eq!(four_weeks.target_minutes, 40_320);

        assert!(ResamplePeriod::parse("7min").is_err());
        assert!(ResamplePeriod::parse("4h").is_err());
        assert!(ResamplePeriod::parse("h").is_err());
    }

    #[test]
    fn spec_resolution_prefers_native_periods() {
        let (p, resample) = PeriodSpec::from("1h").resolve().unwrap();
        assert_eq!(p, CandlePeriod::I1h);
        assert!(resample.is_none());

        let (p, resample) = PeriodSpec::from("15min").resolve().unwrap();
        assert_eq!(p, CandlePeriod::I1m);
        assert_eq!(resample, Some(15));

        let (p, resample) = PeriodSpec::from(60u32).resolve().unwrap();
        assert_eq!(p, CandlePeriod::I1h);
        assert!(resample.is_none());

        assert!(PeriodSpec::from(5u32).resolve().is_err());
    }
}
