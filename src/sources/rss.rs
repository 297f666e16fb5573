use std::time::Duration;

use feed_rs::parser;
use reqwest::blocking::Client;
use scraper::Html;

use crate::domain::Article;
use crate::sources::traits::{FetchError, NewsSource};

/// One RSS/Atom feed endpoint, usually a catalog entry.
pub struct RssSource {
    label: String,
    url: String,
    client: Client,
}

impl RssSource {
    pub fn new(label: impl Into<String>, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl NewsSource for RssSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn fetch(&self) -> Result<Vec<Article>, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| FetchError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Http(format!("status {}", response.status())));
        }

        let bytes = response.bytes().map_err(|e| FetchError::Http(e.to_string()))?;
        parse_articles(&bytes, &self.url)
    }
}

/// Parse feed bytes into articles tagged with the feed's own title, falling
/// back to `fallback_source` (the feed URL) when the feed has none. Entries
/// without a link are dropped: they can be neither cached nor de-duplicated.
pub(crate) fn parse_articles(
    bytes: &[u8],
    fallback_source: &str,
) -> Result<Vec<Article>, FetchError> {
    let feed = parser::parse(bytes).map_err(|e| FetchError::Parse(e.to_string()))?;

    let source = feed
        .title
        .map(|t| t.content.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| fallback_source.to_string());

    let articles: Vec<Article> = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let link = entry.links.into_iter().next().map(|l| l.href)?;

            let title = entry
                .title
                .map(|t| t.content.trim().to_string())
                .unwrap_or_default();

            // First non-empty of summary/content body, tags stripped so the
            // keyword matcher sees plain text.
            let summary = entry
                .summary
                .map(|t| t.content)
                .into_iter()
                .chain(entry.content.and_then(|c| c.body))
                .map(|html| html_to_text(&html))
                .find(|text| !text.is_empty())
                .unwrap_or_default();

            let published = entry.published.or(entry.updated);

            Some(
                Article::new(title, link)
                    .with_summary(summary)
                    .with_source(source.clone())
                    .with_published(published),
            )
        })
        .collect();

    if articles.is_empty() {
        return Err(FetchError::NoEntries);
    }

    Ok(articles)
}

/// Extract plain text from HTML content, preserving word boundaries.
pub(crate) fn html_to_text(html: &str) -> String {
    let document = Html::parse_fragment(html);
    let mut text = String::new();

    for node in document.root_element().descendants() {
        if let Some(text_node) = node.value().as_text() {
            text.push_str(text_node);
        }
        // Add space after block elements to preserve word boundaries
        if let Some(element) = node.value().as_element() {
            match element.name() {
                "p" | "br" | "div" | "li" => text.push(' '),
                _ => {}
            }
        }
    }

    // Collapse whitespace and trim
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const SAMPLE_RSS: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Detik Finance</title>
    <link>https://finance.detik.com/</link>
    <description>Berita ekonomi dan bisnis</description>
    <item>
      <title>Saham BBCA Menguat di Tengah Aksi Beli Asing</title>
      <link>https://finance.detik.com/bursa-dan-valas/d-100/saham-bbca</link>
      <description><![CDATA[<p>Saham PT Bank Central Asia Tbk. (BBCA) menguat 1,2 persen pada perdagangan Jumat.</p>]]></description>
      <pubDate>Fri, 31 May 2024 10:30:00 +0700</pubDate>
      <guid>https://finance.detik.com/bursa-dan-valas/d-100/saham-bbca</guid>
    </item>
    <item>
      <title>IHSG Ditutup Naik</title>
      <link>https://finance.detik.com/bursa-dan-valas/d-101/ihsg-naik</link>
      <description>Indeks Harga Saham Gabungan ditutup naik 0,5 persen.</description>
      <pubDate>Fri, 31 May 2024 09:00:00 +0700</pubDate>
      <guid>https://finance.detik.com/bursa-dan-valas/d-101/ihsg-naik</guid>
    </item>
  </channel>
</rss>"#;

    const SAMPLE_ATOM: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Kontan Investasi</title>
  <link href="https://investasi.kontan.co.id/"/>
  <id>https://investasi.kontan.co.id/feed</id>
  <updated>2024-05-31T08:00:00Z</updated>
  <entry>
    <title>Rekomendasi Saham Pilihan Pekan Ini</title>
    <link href="https://investasi.kontan.co.id/news/rekomendasi-saham"/>
    <id>https://investasi.kontan.co.id/news/rekomendasi-saham</id>
    <updated>2024-05-31T08:00:00Z</updated>
    <content type="html"><![CDATA[<p>Analis menjagokan sejumlah saham perbankan pekan ini.</p>]]></content>
  </entry>
  <entry>
    <title>Entri Tanpa Tautan</title>
    <id>urn:no-link</id>
    <updated>2024-05-31T07:00:00Z</updated>
  </entry>
</feed>"#;

    const EMPTY_RSS: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Feed Kosong</title>
    <link>https://example.com/</link>
    <description>Tidak ada berita</description>
  </channel>
</rss>"#;

    #[test]
    fn test_maps_rss_entries() {
        let articles = parse_articles(SAMPLE_RSS, "Fallback").unwrap();

        assert_eq!(articles.len(), 2);

        let first = &articles[0];
        assert_eq!(first.title, "Saham BBCA Menguat di Tengah Aksi Beli Asing");
        assert_eq!(
            first.link,
            "https://finance.detik.com/bursa-dan-valas/d-100/saham-bbca"
        );
        assert_eq!(first.source, "Detik Finance", "feed title wins over the label");
        assert_eq!(
            first.summary,
            "Saham PT Bank Central Asia Tbk. (BBCA) menguat 1,2 persen pada perdagangan Jumat.",
            "summary HTML is stripped"
        );
        // +0700 normalizes to UTC
        assert_eq!(
            first.published,
            Some(Utc.with_ymd_and_hms(2024, 5, 31, 3, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_atom_summary_falls_back_to_content_body() {
        let articles = parse_articles(SAMPLE_ATOM, "Fallback").unwrap();

        assert_eq!(articles.len(), 1, "the link-less entry is dropped");
        assert_eq!(articles[0].title, "Rekomendasi Saham Pilihan Pekan Ini");
        assert_eq!(
            articles[0].summary,
            "Analis menjagokan sejumlah saham perbankan pekan ini."
        );
        assert_eq!(articles[0].source, "Kontan Investasi");
        assert_eq!(
            articles[0].published,
            Some(Utc.with_ymd_and_hms(2024, 5, 31, 8, 0, 0).unwrap()),
            "updated stands in for a missing published date"
        );
    }

    #[test]
    fn test_titleless_feed_source_falls_back_to_url() {
        const NO_TITLE_RSS: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <item>
      <title>Berita tunggal</title>
      <link>https://example.com/berita</link>
    </item>
  </channel>
</rss>"#;

        let articles = parse_articles(NO_TITLE_RSS, "https://example.com/rss").unwrap();
        assert_eq!(articles[0].source, "https://example.com/rss");
    }

    #[test]
    fn test_empty_feed_is_no_entries() {
        let err = parse_articles(EMPTY_RSS, "Fallback").unwrap_err();
        assert_eq!(err, FetchError::NoEntries);
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let err = parse_articles(b"ini bukan xml", "Fallback").unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[test]
    fn test_html_to_text_collapses_markup() {
        let text = html_to_text("<p>Saham  <b>BBCA</b> naik.</p><p>Asing beli.</p>");
        assert_eq!(text, "Saham BBCA naik. Asing beli.");
    }

    #[test]
    fn test_fetch_against_local_server() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/rss")
            .with_status(200)
            .with_header("content-type", "application/rss+xml")
            .with_body(SAMPLE_RSS)
            .create();

        let source = RssSource::new(
            "Detik Finance",
            format!("{}/rss", server.url()),
            Duration::from_secs(5),
        );

        let articles = source.fetch().unwrap();
        assert_eq!(articles.len(), 2);
        mock.assert();
    }

    #[test]
    fn test_fetch_http_error_status() {
        let mut server = mockito::Server::new();
        server.mock("GET", "/rss").with_status(503).create();

        let source = RssSource::new(
            "Down",
            format!("{}/rss", server.url()),
            Duration::from_secs(5),
        );

        let err = source.fetch().unwrap_err();
        assert!(matches!(err, FetchError::Http(_)));
    }

    #[test]
    fn test_fetch_unreachable_host() {
        let source = RssSource::new(
            "Nowhere",
            "http://127.0.0.1:1/rss",
            Duration::from_secs(1),
        );

        let err = source.fetch().unwrap_err();
        assert!(matches!(err, FetchError::Http(_)));
    }
}
