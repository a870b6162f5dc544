use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use validator::Validate;

use super::pagination::PageQuery;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreatePickupPointRequest {
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
}

/// Query string of `GET /pvz`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPickupPointsQuery {
    #[serde(flatten)]
    pub paging: PageQuery,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl ListPickupPointsQuery {
    /// Parsed `(startDate, endDate)`. A bound that is present but not RFC 3339
    /// is a bad request; empty values count as absent.
    pub fn date_bounds(
        &self,
    ) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), AppError> {
        Ok((
            parse_bound("startDate", self.start_date.as_deref())?,
            parse_bound("endDate", self.end_date.as_deref())?,
        ))
    }
}

fn parse_bound(name: &str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>, AppError> {
    match raw.filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|e| {
                AppError::BadRequest(anyhow::anyhow!(
                    "Invalid {} format, expected RFC 3339: {}",
                    name,
                    e
                ))
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_bounds() {
        let query = ListPickupPointsQuery {
            start_date: Some("2025-01-01T00:00:00Z".into()),
            end_date: Some("2025-01-02T00:00:00+03:00".into()),
            ..Default::default()
        };
        let (start, end) = query.date_bounds().unwrap();
        assert!(start.unwrap() < end.unwrap());
    }

    #[test]
    fn rejects_non_rfc3339_bound() {
        let query = ListPickupPointsQuery {
            start_date: Some("01.01.2025".into()),
            ..Default::default()
        };
        assert!(query.date_bounds().is_err());
    }
}
