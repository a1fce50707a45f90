//! Gazetteer import

use super::{ImportMode, ImportOptions, ImportSummary, RegionResolver};
use crate::error::ImportResult;
use crate::postcodes::PostcodeIndex;
use crate::sources::GazetteerRow;
use anag_common::db::geo;
use sqlx::SqliteConnection;
use tracing::{debug, trace};

/// Import gazetteer rows in order
///
/// Runs on the caller's connection; the caller owns the transaction. The
/// first failing row aborts the import and its error is returned unchanged.
pub async fn import_gazetteer<I>(
    conn: &mut SqliteConnection,
    rows: I,
    index: &PostcodeIndex,
    options: &ImportOptions,
) -> ImportResult<ImportSummary>
where
    I: IntoIterator<Item = ImportResult<GazetteerRow>>,
{
    let mut summary = ImportSummary::default();
    let mut regions = RegionResolver::default();

    for row in rows {
        let row = row?;
        summary.rows += 1;

        let postcode_country = row.iso_code == options.postcode_country;

        // Split mode leaves the postcode country to the postal table
        if options.mode == ImportMode::Split && postcode_country {
            trace!(line = row.line, "Skipping {} row", row.iso_code);
            summary.rows_skipped += 1;
            continue;
        }

        let (country, created) =
            geo::get_or_create_country(conn, &row.iso_code, &row.country_name).await?;
        if created {
            summary.countries_created += 1;
        }

        // Without a code column the province name doubles as its code
        let code = row.region_code.as_deref().unwrap_or(&row.region_name);
        let region = regions
            .resolve(conn, &country.iso_code, &row.region_name, code, &mut summary)
            .await?;

        let postcode = if options.mode == ImportMode::Merged && postcode_country {
            index.lookup(&row.city_name, &row.region_name)
        } else {
            None
        };

        let (mut city, created) =
            geo::get_or_create_city(conn, &region, &row.city_name, postcode).await?;

        if created {
            summary.cities_created += 1;
        } else if let Some(postcode) = postcode {
            if geo::backfill_city_postcode(conn, &mut city, postcode).await? {
                debug!(city = %city.name, postcode, "Backfilled postcode");
                summary.postcodes_backfilled += 1;
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anag_common::db::init::init_memory_database;

    fn row(iso: &str, country: &str, region: &str, city: &str) -> ImportResult<GazetteerRow> {
        Ok(GazetteerRow {
            line: 0,
            iso_code: iso.to_string(),
            country_name: country.to_string(),
            region_name: region.to_string(),
            region_code: None,
            city_name: city.to_string(),
        })
    }

    #[tokio::test]
    async fn test_dedup_within_run() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let summary = import_gazetteer(
            &mut conn,
            vec![
                row("ITA", "Italy", "Lombardia", "Milano"),
                row("ITA", "Italy", "Lombardia", "Bergamo"),
            ],
            &PostcodeIndex::new(),
            &ImportOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(summary.countries_created, 1);
        assert_eq!(summary.regions_created, 1);
        assert_eq!(summary.regions_seen, 1);
        assert_eq!(summary.cities_created, 2);

        let region = geo::find_region(&mut conn, "ITA", "Lombardia").await.unwrap().unwrap();
        assert_eq!(region.code, "Lombardia");
    }

    #[tokio::test]
    async fn test_postcode_only_for_postcode_country() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let mut index = PostcodeIndex::new();
        index.insert("nice".to_string(), "99999");
        index.insert("roma".to_string(), "00100");

        import_gazetteer(
            &mut conn,
            vec![
                row("FRA", "France", "Provence", "Nice"),
                row("ITA", "Italy", "Lazio", "Roma"),
            ],
            &index,
            &ImportOptions::default(),
        )
        .await
        .unwrap();

        let provence = geo::find_region(&mut conn, "FRA", "Provence").await.unwrap().unwrap();
        let nice = geo::find_city(&mut conn, provence.guid, "Nice").await.unwrap().unwrap();
        assert_eq!(nice.postcode, None);

        let lazio = geo::find_region(&mut conn, "ITA", "Lazio").await.unwrap().unwrap();
        let roma = geo::find_city(&mut conn, lazio.guid, "Roma").await.unwrap().unwrap();
        assert_eq!(roma.postcode.as_deref(), Some("00100"));
    }

    #[tokio::test]
    async fn test_split_mode_skips_postcode_country() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let options = ImportOptions {
            mode: ImportMode::Split,
            ..ImportOptions::default()
        };
        let summary = import_gazetteer(
            &mut conn,
            vec![
                row("ITA", "Italy", "Lazio", "Roma"),
                row("ESP", "Spain", "Madrid", "Madrid"),
            ],
            &PostcodeIndex::new(),
            &options,
        )
        .await
        .unwrap();

        assert_eq!(summary.rows, 2);
        assert_eq!(summary.rows_skipped, 1);
        assert_eq!(summary.countries_created, 1);
        assert!(geo::find_country(&mut conn, "ITA").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_row_error_stops_import() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let rows = vec![
            row("ITA", "Italy", "Lazio", "Roma"),
            Err(crate::error::ImportError::MalformedRow { line: 3, field: "city" }),
            row("ITA", "Italy", "Lazio", "Latina"),
        ];

        let result =
            import_gazetteer(&mut conn, rows, &PostcodeIndex::new(), &ImportOptions::default()).await;

        assert!(matches!(
            result,
            Err(crate::error::ImportError::MalformedRow { line: 3, .. })
        ));
        let lazio = geo::find_region(&mut conn, "ITA", "Lazio").await.unwrap().unwrap();
        assert!(geo::find_city(&mut conn, lazio.guid, "Latina").await.unwrap().is_none());
    }
}
