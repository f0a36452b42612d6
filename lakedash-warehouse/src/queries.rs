//! The dashboard's aggregation queries.

use serde::Serialize;

use crate::{Result, WarehouseClient, WarehouseError};

/// Default trips table (the sample NYC taxi dataset).
pub const DEFAULT_TRIPS_TABLE: &str = "samples.nyctaxi.trips";

/// Default row cap for the destination aggregation.
pub const DEFAULT_DESTINATION_LIMIT: usize = 200;

/// Average fare and trip count per pickup ZIP.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FareSummary {
    pub pickup_zip: Option<String>,
    pub avg_fare: Option<f64>,
    pub count: i64,
}

/// Trip count and average fare per pickup/dropoff ZIP pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DestinationSummary {
    pub pickup_zip: Option<String>,
    pub dropoff_zip: Option<String>,
    pub avg_fare: Option<f64>,
    pub count: i64,
}

/// Average fare amounts and trip counts per pickup ZIP.
pub async fn fares_by_zip(client: &WarehouseClient, table: &str) -> Result<Vec<FareSummary>> {
    validate_table_ident(table)?;
    let statement = format!(
        "select pickup_zip, avg(fare_amount) as avg_fare, count(*) as count \
         from {table} group by pickup_zip"
    );

    client
        .execute(&statement)
        .await?
        .iter()
        .map(|row| parse_fare_row(row))
        .collect()
}

/// Busiest pickup/dropoff ZIP pairs with their average fares, ordered by
/// trip count descending.
pub async fn top_destinations(
    client: &WarehouseClient,
    table: &str,
    limit: usize,
) -> Result<Vec<DestinationSummary>> {
    validate_table_ident(table)?;
    let statement = format!(
        "select pickup_zip, dropoff_zip, avg(fare_amount) as avg_fare, count(*) as count \
         from {table} group by pickup_zip, dropoff_zip order by count desc limit {limit}"
    );

    client
        .execute(&statement)
        .await?
        .iter()
        .map(|row| parse_destination_row(row))
        .collect()
}

/// Table names are interpolated into SQL text, so only plain
/// `catalog.schema.table` identifiers are allowed through.
fn validate_table_ident(table: &str) -> Result<()> {
    let ok = !table.is_empty()
        && table.split('.').all(|part| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
        });

    if ok {
        Ok(())
    } else {
        Err(WarehouseError::InvalidTable(table.to_string()))
    }
}

fn parse_fare_row(row: &[Option<String>]) -> Result<FareSummary> {
    if row.len() != 3 {
        return Err(WarehouseError::MalformedResponse(format!(
            "expected 3 columns in fare row, got {}",
            row.len()
        )));
    }
    Ok(FareSummary {
        pickup_zip: row[0].clone(),
        avg_fare: cell_f64(&row[1], "avg_fare")?,
        count: cell_i64(&row[2], "count")?,
    })
}

fn parse_destination_row(row: &[Option<String>]) -> Result<DestinationSummary> {
    if row.len() != 4 {
        return Err(WarehouseError::MalformedResponse(format!(
            "expected 4 columns in destination row, got {}",
            row.len()
        )));
    }
    Ok(DestinationSummary {
        pickup_zip: row[0].clone(),
        dropoff_zip: row[1].clone(),
        avg_fare: cell_f64(&row[2], "avg_fare")?,
        count: cell_i64(&row[3], "count")?,
    })
}

fn cell_f64(cell: &Option<String>, column: &str) -> Result<Option<f64>> {
    cell.as_deref()
        .map(|raw| {
            raw.parse::<f64>().map_err(|_| {
                WarehouseError::MalformedResponse(format!(
                    "column {column} is not numeric: {raw:?}"
                ))
            })
        })
        .transpose()
}

fn cell_i64(cell: &Option<String>, column: &str) -> Result<i64> {
    let raw = cell.as_deref().ok_or_else(|| {
        WarehouseError::MalformedResponse(format!("column {column} is unexpectedly null"))
    })?;
    raw.parse::<i64>().map_err(|_| {
        WarehouseError::MalformedResponse(format!("column {column} is not an integer: {raw:?}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    #[test]
    fn parses_a_fare_row() {
        let row = cells(&[Some("10001"), Some("12.5"), Some("42")]);
        let summary = parse_fare_row(&row).unwrap();
        assert_eq!(summary.pickup_zip.as_deref(), Some("10001"));
        assert_eq!(summary.avg_fare, Some(12.5));
        assert_eq!(summary.count, 42);
    }

    #[test]
    fn tolerates_null_zip_and_null_average() {
        let row = cells(&[None, None, Some("7")]);
        let summary = parse_fare_row(&row).unwrap();
        assert_eq!(summary.pickup_zip, None);
        assert_eq!(summary.avg_fare, None);
        assert_eq!(summary.count, 7);
    }

    #[test]
    fn rejects_rows_of_the_wrong_width() {
        let row = cells(&[Some("10001"), Some("12.5")]);
        assert!(matches!(
            parse_fare_row(&row),
            Err(WarehouseError::MalformedResponse(_))
        ));
    }

    #[test]
    fn rejects_a_null_count() {
        let row = cells(&[Some("10001"), Some("12.5"), None]);
        assert!(matches!(
            parse_fare_row(&row),
            Err(WarehouseError::MalformedResponse(_))
        ));
    }

    #[test]
    fn parses_a_destination_row() {
        let row = cells(&[Some("10001"), Some("11201"), Some("23.75"), Some("120")]);
        let summary = parse_destination_row(&row).unwrap();
        assert_eq!(summary.pickup_zip.as_deref(), Some("10001"));
        assert_eq!(summary.dropoff_zip.as_deref(), Some("11201"));
        assert_eq!(summary.avg_fare, Some(23.75));
        assert_eq!(summary.count, 120);
    }

    #[test]
    fn accepts_qualified_table_identifiers() {
        assert!(validate_table_ident("samples.nyctaxi.trips").is_ok());
        assert!(validate_table_ident("my_table").is_ok());
    }

    #[test]
    fn rejects_table_identifiers_with_sql_metacharacters() {
        assert!(validate_table_ident("trips; drop table app_config").is_err());
        assert!(validate_table_ident("samples..trips").is_err());
        assert!(validate_table_ident("").is_err());
        assert!(validate_table_ident("trips where 1=1").is_err());
    }
}
