use std::time::Duration;

use reqwest::blocking::Client;
use scraper::{Html, Selector};

/// Browser User-Agent for article pages and search feeds; several IDX news
/// sites refuse requests carrying a default client string.
pub(crate) const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Containers tried in order by the selector strategy. `.read__content` and
/// `.detail__body` cover the big Indonesian news sites.
const ARTICLE_SELECTORS: &[&str] = &[
    "article",
    ".article",
    ".post",
    ".read__content",
    ".detail__body",
    ".content",
];

/// Extracted text at or below this length is treated as a miss.
const MIN_CONTENT_LEN: usize = 120;

/// Best-effort main-text extraction from an article page. Single attempt,
/// bounded timeout; every failure is `None` so callers fall back to the
/// feed summary.
pub struct ContentExtractor {
    client: Client,
    reader_mode: bool,
}

impl ContentExtractor {
    pub fn new(reader_mode: bool, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .user_agent(BROWSER_UA)
                .build()
                .unwrap_or_else(|_| Client::new()),
            reader_mode,
        }
    }

    pub fn extract(&self, url: &str) -> Option<String> {
        if url.is_empty() {
            return None;
        }

        let response = self.client.get(url).send().ok()?;
        if !response.status().is_success() {
            return None;
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.contains("text/html"))
            .unwrap_or(false);
        if !is_html {
            return None;
        }

        let body = response.text().ok()?;
        self.extract_from_html(&body)
    }

    /// Strategy order: reader scoring (when enabled), known containers,
    /// then all paragraphs. Each stage must clear the length floor.
    fn extract_from_html(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);

        if self.reader_mode {
            if let Some(text) = densest_container(&document) {
                return Some(text);
            }
        }

        known_container_text(&document).or_else(|| joined_paragraph_text(&document))
    }
}

/// Reader strategy: pick the container whose paragraphs carry the most text,
/// discounting anchor text so menus and related-story boxes lose.
fn densest_container(document: &Html) -> Option<String> {
    let containers = Selector::parse("article, main, section, div").ok()?;
    let paragraphs = Selector::parse("p").ok()?;
    let anchors = Selector::parse("a").ok()?;

    let mut best: Option<(i64, String)> = None;

    for container in document.select(&containers) {
        let mut parts: Vec<String> = Vec::new();
        let mut text_len: i64 = 0;

        for p in container.select(&paragraphs) {
            let text = normalize_ws(&p.text().collect::<Vec<_>>().join(" "));
            if text.is_empty() {
                continue;
            }
            text_len += text.chars().count() as i64;
            parts.push(text);
        }

        let link_len: i64 = container
            .select(&anchors)
            .map(|a| {
                normalize_ws(&a.text().collect::<Vec<_>>().join(" "))
                    .chars()
                    .count() as i64
            })
            .sum();

        let score = text_len - link_len;
        if score <= 0 {
            continue;
        }

        let keep = match &best {
            Some((best_score, _)) => score > *best_score,
            None => true,
        };
        if keep {
            best = Some((score, parts.join(" ")));
        }
    }

    let (_, text) = best?;
    if text.chars().count() > MIN_CONTENT_LEN {
        Some(text)
    } else {
        None
    }
}

/// First known container with enough text wins; a thin match moves on to the
/// next selector, mirroring how article bodies vary across sites.
fn known_container_text(document: &Html) -> Option<String> {
    for raw in ARTICLE_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        if let Some(node) = document.select(&selector).next() {
            let text = normalize_ws(&node.text().collect::<Vec<_>>().join(" "));
            if text.chars().count() > MIN_CONTENT_LEN {
                return Some(text);
            }
        }
    }
    None
}

fn joined_paragraph_text(document: &Html) -> Option<String> {
    let paragraphs = Selector::parse("p").ok()?;

    let parts: Vec<String> = document
        .select(&paragraphs)
        .map(|p| normalize_ws(&p.text().collect::<Vec<_>>().join(" ")))
        .filter(|text| !text.is_empty())
        .collect();

    let text = parts.join(" ");
    if text.chars().count() > MIN_CONTENT_LEN {
        Some(text)
    } else {
        None
    }
}

fn normalize_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG_SENTENCE: &str = "Emiten perbankan mencatat pertumbuhan kredit dua digit \
sepanjang kuartal pertama, ditopang segmen korporasi dan konsumer yang pulih lebih cepat \
dari perkiraan para analis pasar modal.";

    fn extractor(reader_mode: bool) -> ContentExtractor {
        ContentExtractor::new(reader_mode, Duration::from_secs(2))
    }

    #[test]
    fn test_article_node_text_extracted() {
        let html = format!("<html><body><article><p>{}</p></article></body></html>", LONG_SENTENCE);

        let text = extractor(false).extract_from_html(&html).unwrap();
        assert!(text.contains("pertumbuhan kredit dua digit"));
    }

    #[test]
    fn test_short_paragraphs_yield_none() {
        let html = "<html><body><p>Pendek.</p><p>Juga pendek.</p></body></html>";
        assert_eq!(extractor(false).extract_from_html(html), None);
    }

    #[test]
    fn test_detik_container_class() {
        let html = format!(
            "<html><body><div class=\"detail__body\"><p>{}</p></div></body></html>",
            LONG_SENTENCE
        );

        let text = extractor(false).extract_from_html(&html).unwrap();
        assert!(text.starts_with("Emiten perbankan"));
    }

    #[test]
    fn test_paragraph_fallback_when_no_known_container() {
        let html = format!(
            "<html><body><section><p>{}</p><p>{}</p></section></body></html>",
            LONG_SENTENCE, LONG_SENTENCE
        );

        let text = extractor(false).extract_from_html(&html).unwrap();
        assert!(text.chars().count() > MIN_CONTENT_LEN);
    }

    #[test]
    fn test_reader_mode_prefers_dense_container() {
        let html = format!(
            concat!(
                "<html><body>",
                "<div id=\"nav\"><p><a href=\"/bursa\">Indeks harga saham gabungan bursa efek ",
                "hari ini dan rekomendasi lengkap para analis</a></p></div>",
                "<div id=\"isi\"><p>{}</p><p>{}</p></div>",
                "</body></html>"
            ),
            LONG_SENTENCE, LONG_SENTENCE
        );

        let text = extractor(true).extract_from_html(&html).unwrap();
        assert!(
            !text.contains("rekomendasi lengkap"),
            "anchor-only container must lose: {}",
            text
        );
        assert!(text.contains("pertumbuhan kredit"));
    }

    #[test]
    fn test_extract_happy_path_over_http() {
        let mut server = mockito::Server::new();
        let body = format!("<html><body><article><p>{}</p></article></body></html>", LONG_SENTENCE);
        server
            .mock("GET", "/artikel")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body(body)
            .create();

        let url = format!("{}/artikel", server.url());
        let text = extractor(false).extract(&url).unwrap();
        assert!(text.contains("Emiten perbankan"));
    }

    #[test]
    fn test_extract_rejects_non_html() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/api")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{\"ok\":true}")
            .create();

        let url = format!("{}/api", server.url());
        assert_eq!(extractor(false).extract(&url), None);
    }

    #[test]
    fn test_extract_rejects_error_status() {
        let mut server = mockito::Server::new();
        server.mock("GET", "/hilang").with_status(404).create();

        let url = format!("{}/hilang", server.url());
        assert_eq!(extractor(false).extract(&url), None);
    }

    #[test]
    fn test_extract_empty_url_is_none() {
        assert_eq!(extractor(true).extract(""), None);
    }
}
