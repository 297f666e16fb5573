use std::time::Duration;

use opml::{Outline, OPML};

use crate::errors::{SahamError, SahamResult};
use crate::sources::rss::RssSource;
use crate::sources::traits::NewsSource;

/// Built-in IDX finance feeds, selectable by label.
pub const CATALOG: &[(&str, &str)] = &[
    ("Detik Finance", "https://finance.detik.com/rss"),
    ("CNBC Indonesia", "https://www.cnbcindonesia.com/market/rss"),
    ("Kontan", "https://investasi.kontan.co.id/rss"),
    ("Bisnis Market", "https://market.bisnis.com/rss"),
    ("Kompas Money", "https://money.kompas.com/rss"),
    ("IDN Financials", "https://www.idnfinancials.com/id/rss"),
];

pub fn default_sources(timeout: Duration) -> Vec<Box<dyn NewsSource>> {
    CATALOG
        .iter()
        .map(|(label, url)| Box::new(RssSource::new(*label, *url, timeout)) as Box<dyn NewsSource>)
        .collect()
}

/// Resolve user-picked labels to sources, keeping catalog order semantics
/// (sources are fetched in the order given). Unknown labels are an input
/// error naming what the catalog offers.
pub fn select_sources(
    labels: &[String],
    timeout: Duration,
) -> SahamResult<Vec<Box<dyn NewsSource>>> {
    let mut sources: Vec<Box<dyn NewsSource>> = Vec::with_capacity(labels.len());

    for wanted in labels {
        let found = CATALOG
            .iter()
            .find(|(label, _)| label.eq_ignore_ascii_case(wanted.trim()));

        match found {
            Some((label, url)) => sources.push(Box::new(RssSource::new(*label, *url, timeout))),
            None => {
                let known: Vec<&str> = CATALOG.iter().map(|(label, _)| *label).collect();
                return Err(SahamError::InvalidInput(format!(
                    "unknown source '{}'; known sources: {}",
                    wanted,
                    known.join(", ")
                )));
            }
        }
    }

    Ok(sources)
}

/// Export the catalog as OPML for use in external feed readers.
pub fn catalog_opml() -> SahamResult<String> {
    let mut opml = OPML::default();
    opml.head = Some(opml::Head {
        title: Some("IDX News Sources".to_string()),
        ..Default::default()
    });

    for (label, url) in CATALOG {
        let outline = Outline {
            text: label.to_string(),
            r#type: Some("rss".to_string()),
            xml_url: Some(url.to_string()),
            title: Some(label.to_string()),
            ..Default::default()
        };
        opml.body.outlines.push(outline);
    }

    opml.to_string().map_err(|e| SahamError::Opml(e.to_string()))
}
