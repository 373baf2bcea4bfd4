//! Reference tables (brands, models, years, states, versions) kept as flat
//! CSV files and loaded into memory once.
//!
//! `ReferenceData` is an ordinary value: build it with [`ReferenceData::load`],
//! pass it to whoever needs it, and drop it when done.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::mem::take;
use std::path::Path;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct Brand {
    pub id: String,
    pub name: String,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub id: String,
    pub brand_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub id: String,
    pub name: String,
    pub abbreviation: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Version {
    pub id: String,
    pub model_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceData {
    pub brands: Vec<Brand>,
    pub models: Vec<Model>,
    pub years: Vec<i32>,
    pub states: Vec<State>,
    pub versions: Vec<Version>,
}

impl ReferenceData {
    /// Load every table from `dir`. Missing or unreadable files give empty tables.
    pub fn load(dir: &Path) -> Self {
        let data = Self {
            brands: load_table(dir, "brands.csv", |r| {
                Some(Brand {
                    id: r.get("id")?,
                    name: r.get("name")?,
                    logo_url: r.get("logo_url").filter(|u| !u.is_empty()),
                })
            }),
            models: load_table(dir, "models.csv", |r| {
                Some(Model {
                    id: r.get("id")?,
                    brand_id: r.get("brand_id")?,
                    name: r.get("name")?,
                })
            }),
            years: load_table(dir, "years.csv", |r| r.get("year")?.parse().ok()),
            states: load_table(dir, "states.csv", |r| {
                Some(State {
                    id: r.get("id")?,
                    name: r.get("name")?,
                    abbreviation: r.get("abbreviation").unwrap_or_default(),
                })
            }),
            versions: load_table(dir, "versions.csv", |r| {
                Some(Version {
                    id: r.get("id")?,
                    model_id: r.get("model_id")?,
                    name: r.get("name")?,
                })
            }),
        };

        info!(
            brands = data.brands.len(),
            models = data.models.len(),
            years = data.years.len(),
            states = data.states.len(),
            versions = data.versions.len(),
            "Reference data loaded from {}",
            dir.display()
        );
        data
    }

    pub fn brands(&self) -> Vec<&str> {
        self.brands.iter().map(|b| b.name.as_str()).collect()
    }

    pub fn models_by_brand(&self, brand_name: &str) -> Vec<&str> {
        let Some(brand) = self.brands.iter().find(|b| b.name == brand_name) else {
            return Vec::new();
        };
        self.models
            .iter()
            .filter(|m| m.brand_id == brand.id)
            .map(|m| m.name.as_str())
            .collect()
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn states(&self) -> Vec<&str> {
        self.states.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn versions_by_model(&self, model_name: &str) -> Vec<&str> {
        let Some(model) = self.models.iter().find(|m| m.name == model_name) else {
            return Vec::new();
        };
        self.versions
            .iter()
            .filter(|v| v.model_id == model.id)
            .map(|v| v.name.as_str())
            .collect()
    }

    pub fn brand_logo_url(&self, brand_name: &str) -> Option<&str> {
        self.brands
            .iter()
            .find(|b| b.name == brand_name)?
            .logo_url
            .as_deref()
    }

    /// Download a brand's logo image
    pub async fn fetch_brand_logo(
        &self,
        client: &reqwest::Client,
        brand_name: &str,
    ) -> Option<Vec<u8>> {
        let url = self.brand_logo_url(brand_name)?;

        let response = match client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                error!(brand = brand_name, error = %e, "Error retrieving logo");
                return None;
            }
        };
        if !response.status().is_success() {
            error!(brand = brand_name, status = %response.status(), "Failed to retrieve logo");
            return None;
        }
        match response.bytes().await {
            Ok(bytes) => Some(bytes.to_vec()),
            Err(e) => {
                error!(brand = brand_name, error = %e, "Error reading logo body");
                None
            }
        }
    }

    /// Write every table back to `dir`
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating reference directory {}", dir.display()))?;

        let brands = self.brands.iter().map(|b| {
            vec![b.id.clone(), b.name.clone(), b.logo_url.clone().unwrap_or_default()]
        });
        write_table(dir, "brands.csv", &["id", "name", "logo_url"], brands)?;

        let models = self
            .models
            .iter()
            .map(|m| vec![m.id.clone(), m.brand_id.clone(), m.name.clone()]);
        write_table(dir, "models.csv", &["id", "brand_id", "name"], models)?;

        let years = self.years.iter().map(|y| vec![y.to_string()]);
        write_table(dir, "years.csv", &["year"], years)?;

        let states = self
            .states
            .iter()
            .map(|s| vec![s.id.clone(), s.name.clone(), s.abbreviation.clone()]);
        write_table(dir, "states.csv", &["id", "name", "abbreviation"], states)?;

        let versions = self
            .versions
            .iter()
            .map(|v| vec![v.id.clone(), v.model_id.clone(), v.name.clone()]);
        write_table(dir, "versions.csv", &["id", "model_id", "name"], versions)?;

        info!("Reference data saved to {}", dir.display());
        Ok(())
    }
}

/// A data row addressed by header name
struct Row<'a> {
    headers: &'a HashMap<String, usize>,
    cells: &'a [String],
}

impl Row<'_> {
    fn get(&self, column: &str) -> Option<String> {
        let idx = *self.headers.get(column)?;
        self.cells.get(idx).map(|c| c.trim().to_string())
    }
}

fn load_table<T>(dir: &Path, file_name: &str, build: impl Fn(&Row<'_>) -> Option<T>) -> Vec<T> {
    let path = dir.join(file_name);
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) => {
            warn!("File {} could not be read: {}", path.display(), e);
            return Vec::new();
        }
    };

    let mut rows = parse_rows(&text).into_iter();
    let Some(header_row) = rows.next() else {
        return Vec::new();
    };
    let headers: HashMap<String, usize> = header_row
        .into_iter()
        .enumerate()
        .map(|(i, h)| (h.trim().trim_start_matches('\u{feff}').to_string(), i))
        .collect();

    let mut skipped = 0usize;
    let items: Vec<T> = rows
        .filter_map(|cells| {
            let item = build(&Row {
                headers: &headers,
                cells: &cells,
            });
            if item.is_none() {
                skipped += 1;
            }
            item
        })
        .collect();

    if skipped > 0 {
        warn!("Skipped {} malformed rows in {}", skipped, path.display());
    }
    items
}

/// Quote-aware CSV parser; tolerates CRLF and skips blank lines
fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => row.push(take(&mut field)),
            '\r' | '\n' if !in_quotes => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(take(&mut field));
                if row.len() == 1 && row[0].is_empty() {
                    row.clear();
                } else {
                    rows.push(take(&mut row));
                }
            }
            _ => field.push(ch),
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}

fn escape(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

fn write_table(
    dir: &Path,
    file_name: &str,
    headers: &[&str],
    rows: impl Iterator<Item = Vec<String>>,
) -> Result<()> {
    let mut out = headers.join(",");
    out.push('\n');
    for row in rows {
        let line: Vec<String> = row.iter().map(|c| escape(c)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }

    let path = dir.join(file_name);
    std::fs::write(&path, out).with_context(|| format!("writing {}", path.display()))
}
