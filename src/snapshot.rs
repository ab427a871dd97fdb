//! Flat CSV snapshots passed between the collection and extraction phases.

use crate::error::Result;
use crate::results::ListingRecord;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
struct LinkRow {
    #[serde(rename = "Links")]
    link: String,
}

#[derive(Debug, Serialize)]
struct RecordRow<'a> {
    #[serde(rename = "Links")]
    link: &'a str,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Price")]
    price: &'a str,
    #[serde(rename = "Location")]
    location: &'a str,
    #[serde(rename = "Date")]
    date: &'a str,
    #[serde(rename = "Description")]
    description: &'a str,
}

/// Overwrites `path` with a `Links` column holding `links` in order
pub fn write_links(path: &Path, links: &[String]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["Links"])?;
    for link in links {
        writer.write_record([link.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads the `Links` column back, skipping blank rows
pub fn read_links(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut links = Vec::new();
    for row in reader.deserialize::<LinkRow>() {
        let row = row?;
        let link = row.link.trim();
        if !link.is_empty() {
            links.push(link.to_string());
        }
    }
    Ok(links)
}

/// Streams harvested records to the output snapshot, raw price text included
pub struct RecordWriter {
    writer: csv::Writer<File>,
}

impl RecordWriter {
    pub fn create(path: &Path) -> Result<Self> {
        // Header written by hand so a run without records still produces it
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)?;
        writer.write_record(["Links", "Name", "Price", "Location", "Date", "Description"])?;
        Ok(Self { writer })
    }

    pub fn write(&mut self, record: &ListingRecord) -> Result<()> {
        self.writer.serialize(RecordRow {
            link: &record.link,
            name: &record.name,
            price: &record.price,
            location: &record.location,
            date: &record.listed_at,
            description: &record.description,
        })?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
