//! Direct postal-code table import (split mode)

use super::{ImportSummary, RegionResolver};
use crate::error::ImportResult;
use crate::sources::PostcodeRow;
use anag_common::db::geo;
use sqlx::SqliteConnection;

/// Import the postal-code table as regions and cities of one country
///
/// The country is get-or-created from `country_iso` / `country_name`. Each
/// row becomes a region keyed by its province name, coded with its province
/// code, and a city carrying its zip code. Empty provinces or places are
/// malformed rows; empty codes and zips are simply left unset.
pub async fn import_postcode_table<I>(
    conn: &mut SqliteConnection,
    rows: I,
    country_iso: &str,
    country_name: &str,
) -> ImportResult<ImportSummary>
where
    I: IntoIterator<Item = ImportResult<PostcodeRow>>,
{
    let mut summary = ImportSummary::default();
    let mut regions = RegionResolver::default();

    let (country, created) = geo::get_or_create_country(conn, country_iso, country_name).await?;
    if created {
        summary.countries_created += 1;
    }

    for row in rows {
        let row = row?;
        summary.rows += 1;

        row.require(&row.province, "province")?;
        row.require(&row.place, "place")?;

        let region = regions
            .resolve(conn, &country.iso_code, &row.province, &row.province_code, &mut summary)
            .await?;

        let zipcode = Some(row.zipcode.as_str()).filter(|z| !z.is_empty());
        let (mut city, created) = geo::get_or_create_city(conn, &region, &row.place, zipcode).await?;

        if created {
            summary.cities_created += 1;
        } else if let Some(zipcode) = zipcode {
            if geo::backfill_city_postcode(conn, &mut city, zipcode).await? {
                summary.postcodes_backfilled += 1;
            }
        }
    }

    Ok(summary)
}
