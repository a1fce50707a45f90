//! Country / Region / City store operations
//!
//! Write operations take a `&mut SqliteConnection` so the caller decides the
//! transaction boundary (the importer runs a whole file inside one). All
//! writes are get-or-create or backfill-only: nothing here deletes rows or
//! overwrites a non-empty value.

use crate::db::models::{City, Country, GeoCounts, Region};
use crate::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

fn parse_guid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| Error::InvalidGuid {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn country_from_row(row: &SqliteRow) -> Country {
    Country {
        iso_code: row.get("iso_code"),
        name: row.get("name"),
    }
}

fn region_from_row(row: &SqliteRow) -> Result<Region> {
    let guid: String = row.get("guid");
    let code: Option<String> = row.get("code");
    Ok(Region {
        guid: parse_guid(&guid)?,
        country_iso: row.get("country_iso"),
        name: row.get("name"),
        code: code.unwrap_or_default(),
    })
}

fn city_from_row(row: &SqliteRow) -> Result<City> {
    let guid: String = row.get("guid");
    let region_guid: String = row.get("region_guid");
    Ok(City {
        guid: parse_guid(&guid)?,
        region_guid: parse_guid(&region_guid)?,
        name: row.get("name"),
        postcode: row.get("postcode"),
    })
}

// ============================================================================
// Countries
// ============================================================================

pub async fn find_country(conn: &mut SqliteConnection, iso_code: &str) -> Result<Option<Country>> {
    let row = sqlx::query("SELECT iso_code, name FROM countries WHERE iso_code = ?")
        .bind(iso_code)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.as_ref().map(country_from_row))
}

/// Get or create a country by ISO code
///
/// `name` is only used on creation; an existing country keeps its name.
/// Returns the record and whether it was created.
pub async fn get_or_create_country(
    conn: &mut SqliteConnection,
    iso_code: &str,
    name: &str,
) -> Result<(Country, bool)> {
    if let Some(country) = find_country(conn, iso_code).await? {
        return Ok((country, false));
    }

    sqlx::query("INSERT INTO countries (iso_code, name) VALUES (?, ?)")
        .bind(iso_code)
        .bind(name)
        .execute(&mut *conn)
        .await?;

    tracing::debug!(iso_code, name, "Created country");

    Ok((
        Country {
            iso_code: iso_code.to_string(),
            name: name.to_string(),
        },
        true,
    ))
}

// ============================================================================
// Regions
// ============================================================================

pub async fn find_region(
    conn: &mut SqliteConnection,
    country_iso: &str,
    name: &str,
) -> Result<Option<Region>> {
    let row = sqlx::query(
        r#"
        SELECT guid, country_iso, name, code
        FROM regions
        WHERE country_iso = ? AND name = ?
        "#,
    )
    .bind(country_iso)
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    row.as_ref().map(region_from_row).transpose()
}

/// Get or create a region by `(country, name)`
///
/// `default_code` is only used on creation.
pub async fn get_or_create_region(
    conn: &mut SqliteConnection,
    country_iso: &str,
    name: &str,
    default_code: &str,
) -> Result<(Region, bool)> {
    if let Some(region) = find_region(conn, country_iso, name).await? {
        return Ok((region, false));
    }

    let region = Region {
        guid: Uuid::new_v4(),
        country_iso: country_iso.to_string(),
        name: name.to_string(),
        code: default_code.to_string(),
    };

    sqlx::query("INSERT INTO regions (guid, country_iso, name, code) VALUES (?, ?, ?, ?)")
        .bind(region.guid.to_string())
        .bind(&region.country_iso)
        .bind(&region.name)
        .bind(&region.code)
        .execute(&mut *conn)
        .await?;

    tracing::debug!(country_iso, name, code = default_code, "Created region");

    Ok((region, true))
}

/// Set the region code if it is still empty
///
/// Returns true when the stored value changed. A non-empty code is never
/// overwritten, and an empty `code` argument is a no-op.
pub async fn backfill_region_code(
    conn: &mut SqliteConnection,
    region: &mut Region,
    code: &str,
) -> Result<bool> {
    if region.has_code() || code.is_empty() {
        return Ok(false);
    }

    let result = sqlx::query(
        r#"
        UPDATE regions
        SET code = ?, updated_at = CURRENT_TIMESTAMP
        WHERE guid = ? AND (code IS NULL OR code = '')
        "#,
    )
    .bind(code)
    .bind(region.guid.to_string())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(false);
    }

    region.code = code.to_string();
    Ok(true)
}

// ============================================================================
// Cities
// ============================================================================

pub async fn find_city(
    conn: &mut SqliteConnection,
    region_guid: Uuid,
    name: &str,
) -> Result<Option<City>> {
    let row = sqlx::query(
        r#"
        SELECT guid, region_guid, name, postcode
        FROM cities
        WHERE region_guid = ? AND name = ?
        "#,
    )
    .bind(region_guid.to_string())
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    row.as_ref().map(city_from_row).transpose()
}

/// Get or create a city by `(region, name)`
///
/// `default_postcode` is only used on creation.
pub async fn get_or_create_city(
    conn: &mut SqliteConnection,
    region: &Region,
    name: &str,
    default_postcode: Option<&str>,
) -> Result<(City, bool)> {
    if let Some(city) = find_city(conn, region.guid, name).await? {
        return Ok((city, false));
    }

    let city = City {
        guid: Uuid::new_v4(),
        region_guid: region.guid,
        name: name.to_string(),
        postcode: default_postcode.map(str::to_string),
    };

    sqlx::query("INSERT INTO cities (guid, region_guid, name, postcode) VALUES (?, ?, ?, ?)")
        .bind(city.guid.to_string())
        .bind(city.region_guid.to_string())
        .bind(&city.name)
        .bind(&city.postcode)
        .execute(&mut *conn)
        .await?;

    Ok((city, true))
}

/// Set the city postcode if it is still empty
///
/// Returns true when the stored value changed.
pub async fn backfill_city_postcode(
    conn: &mut SqliteConnection,
    city: &mut City,
    postcode: &str,
) -> Result<bool> {
    if city.has_postcode() || postcode.is_empty() {
        return Ok(false);
    }

    let result = sqlx::query(
        r#"
        UPDATE cities
        SET postcode = ?, updated_at = CURRENT_TIMESTAMP
        WHERE guid = ? AND (postcode IS NULL OR postcode = '')
        "#,
    )
    .bind(postcode)
    .bind(city.guid.to_string())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(false);
    }

    city.postcode = Some(postcode.to_string());
    Ok(true)
}

// ============================================================================
// Read-only lookups
// ============================================================================

/// All countries ordered by name
pub async fn list_countries(pool: &SqlitePool) -> Result<Vec<Country>> {
    let rows = sqlx::query("SELECT iso_code, name FROM countries ORDER BY name, iso_code")
        .fetch_all(pool)
        .await?;

    Ok(rows.iter().map(country_from_row).collect())
}

/// Regions of one country ordered by name
pub async fn list_regions(pool: &SqlitePool, country_iso: &str) -> Result<Vec<Region>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, country_iso, name, code
        FROM regions
        WHERE country_iso = ?
        ORDER BY name
        "#,
    )
    .bind(country_iso)
    .fetch_all(pool)
    .await?;

    rows.iter().map(region_from_row).collect()
}

/// Cities of one region ordered by name
pub async fn list_cities(pool: &SqlitePool, region_guid: Uuid) -> Result<Vec<City>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, region_guid, name, postcode
        FROM cities
        WHERE region_guid = ?
        ORDER BY name
        "#,
    )
    .bind(region_guid.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(city_from_row).collect()
}

pub async fn count_geography(pool: &SqlitePool) -> Result<GeoCounts> {
    let (countries, regions, cities, cities_with_postcode) =
        sqlx::query_as::<_, (i64, i64, i64, i64)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM countries),
                (SELECT COUNT(*) FROM regions),
                (SELECT COUNT(*) FROM cities),
                (SELECT COUNT(*) FROM cities WHERE postcode IS NOT NULL AND postcode != '')
            "#,
        )
        .fetch_one(pool)
        .await?;

    Ok(GeoCounts {
        countries,
        regions,
        cities,
        cities_with_postcode,
    })
}
