//! CSV source readers
//!
//! Both sources are read through a header-name mapping so the column names of
//! a particular dataset release can be configured instead of hard-coded.
//! Rows are yielded one at a time in file order; nothing is buffered beyond
//! the current record.

use crate::error::{ImportError, ImportResult};
use anag_common::config::{GazetteerColumns, PostcodeColumns};
use csv::StringRecord;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One gazetteer row; every mandatory cell was present, possibly blank
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GazetteerRow {
    /// Line number in the source file (header is line 1)
    pub line: u64,
    pub iso_code: String,
    pub country_name: String,
    pub region_name: String,
    /// Only set when a province-code column is mapped and the cell is non-empty
    pub region_code: Option<String>,
    pub city_name: String,
}

/// One postal-code row; cells missing from a short record are empty
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostcodeRow {
    pub line: u64,
    pub province_code: String,
    pub province: String,
    pub place: String,
    pub zipcode: String,
}

impl PostcodeRow {
    pub(crate) fn require(&self, value: &str, field: &'static str) -> ImportResult<()> {
        if value.is_empty() {
            return Err(ImportError::MalformedRow {
                line: self.line,
                field,
            });
        }
        Ok(())
    }
}

fn csv_reader<R: Read>(rdr: R) -> csv::Reader<R> {
    // flexible: a short record becomes a MalformedRow with the field name
    // instead of an opaque UnequalLengths error
    csv::ReaderBuilder::new().flexible(true).from_reader(rdr)
}

fn column_position(headers: &StringRecord, column: &str, file: &str) -> ImportResult<usize> {
    headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}') == column)
        .ok_or_else(|| ImportError::MissingColumn {
            file: file.to_string(),
            column: column.to_string(),
        })
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

/// A mandatory cell must exist; a blank one is kept as an empty string
fn required(record: &StringRecord, pos: usize, field: &'static str) -> ImportResult<String> {
    record
        .get(pos)
        .map(str::to_string)
        .ok_or_else(|| ImportError::MalformedRow {
            line: line_of(record),
            field,
        })
}

fn optional(record: &StringRecord, pos: usize) -> String {
    record.get(pos).unwrap_or_default().to_string()
}

#[derive(Debug, Clone, Copy)]
struct GazetteerPositions {
    iso_code: usize,
    country: usize,
    province: usize,
    province_code: Option<usize>,
    city: usize,
}

/// Streaming reader over the world-cities gazetteer
pub struct GazetteerReader<R> {
    reader: csv::Reader<R>,
    positions: GazetteerPositions,
    record: StringRecord,
}

impl GazetteerReader<File> {
    pub fn open(path: &Path, columns: &GazetteerColumns) -> ImportResult<Self> {
        let file = File::open(path)?;
        Self::from_reader(file, columns, &path.display().to_string())
    }
}

impl<R: Read> GazetteerReader<R> {
    /// Wrap a reader, resolving the column mapping against its header row
    pub fn from_reader(rdr: R, columns: &GazetteerColumns, label: &str) -> ImportResult<Self> {
        let mut reader = csv_reader(rdr);
        let headers = reader.headers()?.clone();

        let positions = GazetteerPositions {
            iso_code: column_position(&headers, &columns.iso_code, label)?,
            country: column_position(&headers, &columns.country, label)?,
            province: column_position(&headers, &columns.province, label)?,
            province_code: columns
                .province_code
                .as_deref()
                .map(|c| column_position(&headers, c, label))
                .transpose()?,
            city: column_position(&headers, &columns.city, label)?,
        };

        Ok(Self {
            reader,
            positions,
            record: StringRecord::new(),
        })
    }

    fn parse(&self) -> ImportResult<GazetteerRow> {
        let record = &self.record;
        let p = self.positions;

        Ok(GazetteerRow {
            line: line_of(record),
            iso_code: required(record, p.iso_code, "iso_code")?,
            country_name: required(record, p.country, "country")?,
            region_name: required(record, p.province, "province")?,
            region_code: p
                .province_code
                .and_then(|pos| record.get(pos))
                .filter(|code| !code.is_empty())
                .map(str::to_string),
            city_name: required(record, p.city, "city")?,
        })
    }
}

impl<R: Read> Iterator for GazetteerReader<R> {
    type Item = ImportResult<GazetteerRow>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.record) {
            Ok(true) => Some(self.parse()),
            Ok(false) => None,
            Err(e) => Some(Err(e.into())),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PostcodePositions {
    province_code: usize,
    province: usize,
    place: usize,
    zipcode: usize,
}

/// Streaming reader over the postal-code table
pub struct PostcodeReader<R> {
    reader: csv::Reader<R>,
    positions: PostcodePositions,
    record: StringRecord,
}

impl PostcodeReader<File> {
    pub fn open(path: &Path, columns: &PostcodeColumns) -> ImportResult<Self> {
        let file = File::open(path)?;
        Self::from_reader(file, columns, &path.display().to_string())
    }
}

impl<R: Read> PostcodeReader<R> {
    pub fn from_reader(rdr: R, columns: &PostcodeColumns, label: &str) -> ImportResult<Self> {
        let mut reader = csv_reader(rdr);
        let headers = reader.headers()?.clone();

        let positions = PostcodePositions {
            province_code: column_position(&headers, &columns.province_code, label)?,
            province: column_position(&headers, &columns.province, label)?,
            place: column_position(&headers, &columns.place, label)?,
            zipcode: column_position(&headers, &columns.zipcode, label)?,
        };

        Ok(Self {
            reader,
            positions,
            record: StringRecord::new(),
        })
    }
}

impl<R: Read> Iterator for PostcodeReader<R> {
    type Item = ImportResult<PostcodeRow>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.record) {
            Ok(true) => {
                let record = &self.record;
                let p = self.positions;
                Some(Ok(PostcodeRow {
                    line: line_of(record),
                    province_code: optional(record, p.province_code),
                    province: optional(record, p.province),
                    place: optional(record, p.place),
                    zipcode: optional(record, p.zipcode),
                }))
            }
            Ok(false) => None,
            Err(e) => Some(Err(e.into())),
        }
    }
}
