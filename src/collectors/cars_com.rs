use crate::collectors::traits::Collector;
use crate::collectors::types::CollectorConfig;
use crate::error::ConfigError;
use crate::models::{Listing, SOURCE_CARS_COM};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, error, info};

pub const DEFAULT_BASE_URL: &str = "https://www.cars.com";
pub const DEFAULT_SEARCH_PATH: &str = "/shopping/results/";

/// HTML scraper for cars.com search results
pub struct CarsComCollector {
    name: String,
    base_url: String,
    search_path: String,
    config: CollectorConfig,
    client: Client,
}

impl CarsComCollector {
    /// Create a collector for the public cars.com site
    pub fn new(config: CollectorConfig) -> Result<Self> {
        Self::with_site(DEFAULT_BASE_URL, DEFAULT_SEARCH_PATH, config)
    }

    /// Create a collector for a custom host and search path
    pub fn with_site(
        base_url: impl Into<String>,
        search_path: impl Into<String>,
        config: CollectorConfig,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            name: "cars_com".to_string(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            search_path: search_path.into(),
            config,
            client,
        })
    }

    fn paging(&self) -> Result<(u32, Duration), ConfigError> {
        Ok((self.config.require_max_pages()?, self.config.require_delay()?))
    }

    async fn fetch_page(&self, page: u32) -> Result<Vec<Listing>> {
        let url = format!("{}{}?page={}", self.base_url, self.search_path, page);
        debug!("Fetching URL: {}", url);

        let html = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch cars.com page")?
            .error_for_status()
            .context("cars.com returned an error status")?
            .text()
            .await
            .context("Failed to read response body")?;

        debug!("Downloaded {} bytes of HTML", html.len());
        extract_listings(&html, &self.base_url)
    }
}

#[async_trait]
impl Collector for CarsComCollector {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate_config(&self) -> Result<(), ConfigError> {
        self.paging().map(|_| ())
    }

    async fn collect(&mut self) -> Vec<Listing> {
        let (max_pages, delay) = match self.paging() {
            Ok(paging) => paging,
            Err(e) => {
                error!(collector = %self.name, error = %e, "Invalid configuration");
                return Vec::new();
            }
        };

        let mut all_listings = Vec::new();

        for page in 1..=max_pages {
            info!("Collecting page {} of {}", page, max_pages);

            // Be polite to the server
            tokio::time::sleep(delay).await;

            match self.fetch_page(page).await {
                Ok(listings) => {
                    info!("Collected {} listings from page {}", listings.len(), page);
                    all_listings.extend(listings);
                }
                Err(e) => error!(page, error = ?e, "Error collecting page"),
            }
        }

        info!("Collected a total of {} listings", all_listings.len());
        all_listings
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector {css}: {e:?}"))
}

/// Pull listing cards out of a search results page
pub fn extract_listings(html: &str, base_url: &str) -> Result<Vec<Listing>> {
    let document = Html::parse_document(html);
    let card_sel = selector(".vehicle-card")?;
    let title_sel = selector(".title")?;
    let price_sel = selector(".price")?;
    let year_sel = selector(".year")?;
    let mileage_sel = selector(".mileage")?;
    let link_sel = selector("a")?;

    let listings = document
        .select(&card_sel)
        .map(|card| {
            let url = card
                .select(&link_sel)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(|href| absolute_url(base_url, href))
                .unwrap_or_default();

            Listing {
                title: Some(text_of(&card, &title_sel).unwrap_or_else(|| "Unknown".to_string())),
                price: Some(parse_price(&text_of(&card, &price_sel).unwrap_or_default())),
                year: text_of(&card, &year_sel).and_then(|y| y.parse().ok()),
                mileage: Some(parse_mileage(&text_of(&card, &mileage_sel).unwrap_or_default())),
                source: Some(SOURCE_CARS_COM.to_string()),
                url: Some(url),
                collected_at: Some(Utc::now()),
                ..Default::default()
            }
        })
        .collect();

    Ok(listings)
}

/// "$15,499.99" -> 15499.99; unreadable prices become 0
pub fn parse_price(text: &str) -> f64 {
    let numeric: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    numeric.parse().unwrap_or(0.0)
}

/// "45,210 mi." -> 45210; unreadable mileage becomes 0
pub fn parse_mileage(text: &str) -> i64 {
    let numeric: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    numeric.parse().unwrap_or(0)
}

fn text_of(card: &ElementRef<'_>, sel: &Selector) -> Option<String> {
    card.select(sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
}

fn absolute_url(base_url: &str, href: &str) -> String {
    if href.starts_with("//") {
        format!("https:{href}")
    } else if href.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), href)
    } else {
        href.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const PAGE: &str = r#"
        <html><body>
          <div class="vehicle-card">
            <a href="/vehicledetail/abc123/">
              <h2 class="title">2019 Honda Civic EX</h2>
            </a>
            <span class="price">$18,450</span>
            <span class="year">2019</span>
            <span class="mileage">32,100 mi.</span>
          </div>
          <div class="vehicle-card">
            <a href="https://dealer.example/car/9">link</a>
            <span class="price">Call for price</span>
          </div>
        </body></html>
    "#;

    #[test]
    fn extracts_cards_with_absolute_urls() {
        let listings = extract_listings(PAGE, "https://www.cars.com").unwrap();
        assert_eq!(listings.len(), 2);

        let first = &listings[0];
        assert_eq!(first.title.as_deref(), Some("2019 Honda Civic EX"));
        assert_eq!(first.price, Some(18450.0));
        assert_eq!(first.year, Some(2019));
        assert_eq!(first.mileage, Some(32100));
        assert_eq!(first.source.as_deref(), Some("cars.com"));
        assert_eq!(
            first.url.as_deref(),
            Some("https://www.cars.com/vehicledetail/abc123/")
        );

        let second = &listings[1];
        assert_eq!(second.title.as_deref(), Some("Unknown"));
        assert_eq!(second.price, Some(0.0));
        assert_eq!(second.year, None);
        assert_eq!(second.mileage, Some(0));
        assert_eq!(second.url.as_deref(), Some("https://dealer.example/car/9"));
    }

    #[test]
    fn number_parsing_is_lenient() {
        assert_eq!(parse_price("$15,499.99"), 15499.99);
        assert_eq!(parse_price("n/a"), 0.0);
        assert_eq!(parse_mileage("45,210 mi."), 45210);
        assert_eq!(parse_mileage(""), 0);
    }

    #[test]
    fn config_requires_pages_and_delay() {
        let collector = CarsComCollector::new(CollectorConfig {
            max_pages: Some(2),
            delay: None,
            filters: None,
        })
        .unwrap();
        assert_eq!(
            collector.validate_config(),
            Err(ConfigError::Missing { key: "delay" })
        );
    }

    #[tokio::test]
    async fn invalid_config_collects_nothing() {
        let mut collector = CarsComCollector::new(CollectorConfig {
            max_pages: Some(0),
            delay: Some(0.0),
            filters: None,
        })
        .unwrap();
        assert!(collector.collect().await.is_empty());
    }

    #[test]
    fn protocol_relative_links_get_a_scheme() {
        assert_eq!(
            absolute_url("https://www.cars.com", "//dealer.example/x"),
            "https://dealer.example/x"
        );
        assert_eq!(
            absolute_url("https://www.cars.com/", "/vehicledetail/1/"),
            "https://www.cars.com/vehicledetail/1/"
        );
    }

    fn card_page(page: &str) -> String {
        format!(
            r#"<html><body><div class="vehicle-card">
                 <a href="/vehicledetail/p{page}/"><h2 class="title">2020 Toyota Corolla LE</h2></a>
                 <span class="price">$19,000</span>
                 <span class="mileage">21,000 mi.</span>
               </div></body></html>"#
        )
    }

    /// Minimal HTTP server: page 2 answers 500, every other page one card
    async fn serve(listener: TcpListener, seen: Arc<Mutex<Vec<String>>>) {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = vec![0u8; 8192];
            let mut read = 0;
            while !buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf[read..]).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => read += n,
                }
            }

            let request = String::from_utf8_lossy(&buf[..read]).to_string();
            let path = request.split_whitespace().nth(1).unwrap_or_default().to_string();
            let page = path.rsplit("page=").next().unwrap_or_default().to_string();
            seen.lock().unwrap().push(path);

            let (status, body) = if page == "2" {
                ("500 Internal Server Error", "boom".to_string())
            } else {
                ("200 OK", card_page(&page))
            };
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    }

    #[tokio::test]
    async fn walks_every_page_and_survives_a_failed_one() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let seen = Arc::new(Mutex::new(Vec::new()));
        tokio::spawn(serve(listener, seen.clone()));

        let mut collector = CarsComCollector::with_site(
            &base,
            "/shopping/results/",
            CollectorConfig {
                max_pages: Some(3),
                delay: Some(0.0),
                filters: None,
            },
        )
        .unwrap();
        assert!(collector.validate_config().is_ok());

        let listings = collector.collect().await;

        assert_eq!(listings.len(), 2);
        assert_eq!(
            listings[0].url.as_deref(),
            Some(format!("{base}/vehicledetail/p1/").as_str())
        );
        assert_eq!(
            listings[1].url.as_deref(),
            Some(format!("{base}/vehicledetail/p3/").as_str())
        );
        assert_eq!(listings[1].price, Some(19000.0));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "/shopping/results/?page=1",
                "/shopping/results/?page=2",
                "/shopping/results/?page=3",
            ]
        );
    }
}
