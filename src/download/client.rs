use anyhow::{Context, Result};
use reqwest::blocking::Client;
use std::io::{Read, Write};
use std::path::Path;

use crate::ui::Ui;

/// Public OurAirports dump (`ident`, `gps_code`, `name`, ...)
pub const AIRPORTS_URL: &str = "https://davidmegginson.github.io/ourairports-data/airports.csv";

pub struct AirportsClient {
    client: Client,
    url: String,
}

impl AirportsClient {
    pub fn new() -> Result<Self> {
        Self::with_url(AIRPORTS_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent("accidents-sql")
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Download the airport database to the given path
    pub fn download(&self, dest: &Path, ui: &mut impl Ui) -> Result<u64> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("Failed to fetch {}", self.url))?;

        let total_size = response.content_length().unwrap_or(0);

        let mut file = std::fs::File::create(dest).context("Failed to create destination file")?;

        let mut downloaded: u64 = 0;
        let mut buffer = [0u8; 8192];
        let mut reader = response;

        loop {
            let bytes_read = reader
                .read(&mut buffer)
                .context("Failed to read from response")?;

            if bytes_read == 0 {
                break;
            }

            file.write_all(&buffer[..bytes_read])
                .context("Failed to write to file")?;

            downloaded += bytes_read as u64;
            ui.set_progress(downloaded, total_size, format_bytes(downloaded, total_size));
        }

        ui.log("Download complete");
        Ok(downloaded)
    }
}

/// Format bytes as human-readable string
fn format_bytes(current: u64, total: u64) -> String {
    fn fmt(bytes: u64) -> String {
        if bytes >= 1_000_000 {
            format!("{:.1} MB", bytes as f64 / 1_000_000.0)
        } else if bytes >= 1_000 {
            format!("{:.1} KB", bytes as f64 / 1_000.0)
        } else {
            format!("{} B", bytes)
        }
    }
    if total == 0 {
        fmt(current)
    } else {
        format!("{} / {}", fmt(current), fmt(total))
    }
}
