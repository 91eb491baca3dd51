//! Bulk loading of delimited rating and item files.
//!
//! A rating line holds `user, item, rating` in its first three fields; any
//! further field (e.g. a timestamp) is ignored. An item line holds the item
//! identifier in its first field.

use std::io::Read;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::info;

use crate::datasets::Rating;
use crate::error::{RecommendError, Result};
use crate::storage::{Catalog, RatingStore};
use crate::{Float, ItemId};

#[cfg(test)]
mod tests;

/// Layout of a delimited file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimitedFormat {
    pub delimiter: u8,
    pub has_header: bool,
}

impl Default for DelimitedFormat {
    /// Comma separated with a header line.
    fn default() -> Self {
        DelimitedFormat {
            delimiter: b',',
            has_header: true,
        }
    }
}

impl DelimitedFormat {
    pub fn new(delimiter: u8, has_header: bool) -> Self {
        DelimitedFormat {
            delimiter,
            has_header,
        }
    }

    /// Tab separated without header, the layout of the MovieLens `u.data`
    /// file.
    pub fn tab_separated() -> Self {
        DelimitedFormat::new(b'\t', false)
    }

    /// Sets the field delimiter.
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets whether the first line is a header to skip.
    pub fn has_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }
}

/// Reads every rating of `reader`.
pub fn read_ratings<F: Float, R: Read>(reader: R, format: &DelimitedFormat) -> Result<Vec<Rating<F>>> {
    let mut ratings = Vec::new();
    for_each_record(reader, format, |line, record| {
        ratings.push(parse_rating(line, record)?);
        Ok(())
    })?;
    Ok(ratings)
}

/// Reads every item identifier of `reader`.
pub fn read_items<R: Read>(reader: R, format: &DelimitedFormat) -> Result<Vec<ItemId>> {
    let mut items = Vec::new();
    for_each_record(reader, format, |line, record| {
        items.push(parse_id(line, record, 0, "item")?);
        Ok(())
    })?;
    Ok(items)
}

/// Streams the ratings of `reader` into `store` and returns the number of
/// lines read. Ratings before a malformed line stay stored.
pub fn ingest_ratings<F, S, R>(store: &mut S, reader: R, format: &DelimitedFormat) -> Result<usize>
where
    F: Float,
    S: RatingStore<F> + ?Sized,
    R: Read,
{
    let n = for_each_record(reader, format, |line, record| {
        store.put_rating(parse_rating(line, record)?)
    })?;
    info!(ratings = n, "ratings ingested");
    Ok(n)
}

/// Streams the items of `reader` into `catalog` and returns the number of
/// lines read.
pub fn ingest_items<S, R>(catalog: &mut S, reader: R, format: &DelimitedFormat) -> Result<usize>
where
    S: Catalog + ?Sized,
    R: Read,
{
    let n = for_each_record(reader, format, |line, record| {
        catalog.put_item(parse_id(line, record, 0, "item")?)
    })?;
    info!(items = n, "items ingested");
    Ok(n)
}

fn for_each_record<R, C>(reader: R, format: &DelimitedFormat, mut consume: C) -> Result<usize>
where
    R: Read,
    C: FnMut(u64, &StringRecord) -> Result<()>,
{
    let mut reader = ReaderBuilder::new()
        .delimiter(format.delimiter)
        .has_headers(format.has_header)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut record = StringRecord::new();
    let mut n = 0;
    while reader.read_record(&mut record).map_err(from_csv)? {
        let line = record.position().map_or(0, |p| p.line());
        consume(line, &record)?;
        n += 1;
    }
    Ok(n)
}

fn from_csv(err: csv::Error) -> RecommendError {
    match err.kind() {
        csv::ErrorKind::Io(io) => RecommendError::Io(io.to_string()),
        _ => RecommendError::Ingest {
            line: err.position().map_or(0, |p| p.line()),
            message: err.to_string(),
        },
    }
}

fn field<'r>(line: u64, record: &'r StringRecord, index: usize, name: &str) -> Result<&'r str> {
    record
        .get(index)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| RecommendError::Ingest {
            line,
            message: format!("missing {} field", name),
        })
}

fn parse_id(line: u64, record: &StringRecord, index: usize, name: &str) -> Result<i64> {
    let raw = field(line, record, index, name)?;
    raw.parse().map_err(|_| RecommendError::Ingest {
        line,
        message: format!("invalid {} identifier {:?}", name, raw),
    })
}

fn parse_rating<F: Float>(line: u64, record: &StringRecord) -> Result<Rating<F>> {
    let user = parse_id(line, record, 0, "user")?;
    let item = parse_id(line, record, 1, "item")?;
    let raw = field(line, record, 2, "rating")?;
    let value = raw
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .and_then(F::from_f64)
        .ok_or_else(|| RecommendError::Ingest {
            line,
            message: format!("invalid rating {:?}", raw),
        })?;
    Ok(Rating::new(user, item, value))
}
