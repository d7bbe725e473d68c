//! Yearly growth query
//!
//! Summed sales per year with the change against the previous year:
//! `(current - previous) / previous * 100`. The first year has no previous
//! year to compare against, so its growth is null.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::AnalyticsError;

/// Sales total for one year, as returned by the database
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct YearlyTotal {
    pub year: i32,
    pub total_sales: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearlyGrowth {
    pub year: i32,
    pub total_sales: f64,
    pub growth_percent: Option<f64>,
}

/// Attach growth percentages to year totals ordered by year
///
/// A previous total of zero leaves the growth null instead of dividing by it.
pub fn compute_growth(totals: &[YearlyTotal]) -> Vec<YearlyGrowth> {
    let mut previous: Option<f64> = None;
    totals
        .iter()
        .map(|total| {
            let growth_percent = match previous {
                Some(prev) if prev != 0.0 => Some((total.total_sales - prev) / prev * 100.0),
                _ => None,
            };
            previous = Some(total.total_sales);
            YearlyGrowth {
                year: total.year,
                total_sales: total.total_sales,
                growth_percent,
            }
        })
        .collect()
}

pub async fn fetch_totals(pool: &PgPool) -> Result<Vec<YearlyTotal>, AnalyticsError> {
    let totals = sqlx::query_as::<_, YearlyTotal>(
        r#"
        SELECT EXTRACT(YEAR FROM (document->>'Order Date')::date)::int4 AS year,
               COALESCE(SUM((document->>'Sales')::float8), 0)::float8 AS total_sales
        FROM orders
        WHERE document->>'Order Date' IS NOT NULL
        GROUP BY 1
        ORDER BY 1
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(totals)
}

pub async fn handle(pool: &PgPool) -> Result<Vec<YearlyGrowth>, AnalyticsError> {
    let totals = fetch_totals(pool).await?;
    Ok(compute_growth(&totals))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(pairs: &[(i32, f64)]) -> Vec<YearlyTotal> {
        pairs
            .iter()
            .map(|&(year, total_sales)| YearlyTotal { year, total_sales })
            .collect()
    }

    #[test]
    fn test_growth_against_previous_year() {
        let growth = compute_growth(&totals(&[(2021, 100.0), (2022, 150.0)]));
        assert_eq!(
            growth,
            vec![
                YearlyGrowth {
                    year: 2021,
                    total_sales: 100.0,
                    growth_percent: None,
                },
                YearlyGrowth {
                    year: 2022,
                    total_sales: 150.0,
                    growth_percent: Some(50.0),
                },
            ]
        );
    }

    #[test]
    fn test_decline_is_negative() {
        let growth = compute_growth(&totals(&[(2020, 200.0), (2021, 150.0), (2022, 300.0)]));
        assert_eq!(growth[1].growth_percent, Some(-25.0));
        assert_eq!(growth[2].growth_percent, Some(100.0));
    }

    #[test]
    fn test_zero_previous_total_has_no_growth() {
        let growth = compute_growth(&totals(&[(2020, 0.0), (2021, 50.0)]));
        assert_eq!(growth[1].growth_percent, None);
    }

    #[test]
    fn test_empty_input() {
        assert!(compute_growth(&[]).is_empty());
    }
}
