//! Self-hosted metadata source
//!
//! Harvests what the repository publishes about itself: HTML meta tags,
//! the first embedded JSON-LD block, linked JSON-LD documents found via
//! signposting, and signposted service descriptions. Each pass fills
//! only fields the previous passes left empty.

use tracing::warn;
use url::Url;

use crate::bag::{SelfHostedRecord, SourceOutput};
use crate::error::HarvestError;
use crate::fetch::Fetcher;
use crate::jsonld::{extract_catalog_metadata, Graph};
use crate::markup;
use crate::signposting::Signposting;
use crate::vocab::{MEDIA_JSONLD, REL_DESCRIBEDBY};

pub struct SelfHostedSource;

impl super::Source for SelfHostedSource {
    fn harvest(
        &self,
        fetcher: &Fetcher,
        repository_url: &Url,
    ) -> Result<SourceOutput, HarvestError> {
        let page = fetcher.get_page(repository_url.as_str())?;
        let signposting = Signposting::discover(
            fetcher,
            repository_url,
            &page.body,
            page.link_header.as_deref(),
        );

        let mut record = SelfHostedRecord::default();

        record.fill_missing_from(meta_tag_metadata(&page.body));

        if let Some(block) = embedded_jsonld(&page.body) {
            match Graph::from_jsonld(&block) {
                Ok(graph) => record.fill_missing_from(extract_catalog_metadata(&graph)),
                Err(e) => warn!("embedded JSON-LD skipped: {e}"),
            }
        }

        for link in signposting.links_by_relation(&[REL_DESCRIBEDBY], Some(&[MEDIA_JSONLD])) {
            let extracted = fetcher
                .get_text(&link.target, Some(MEDIA_JSONLD))
                .and_then(|body| Graph::from_jsonld(&body));
            match extracted {
                Ok(graph) => record.fill_missing_from(extract_catalog_metadata(&graph)),
                Err(e) => warn!(url = %link.target, "linked JSON-LD skipped: {e}"),
            }
        }

        let services = signposting.service_links();
        if record.services.is_empty() {
            record.services = services;
        }

        Ok(SourceOutput::SelfHosted(record))
    }
}

/// Metadata from plain HTML meta tags: description, a comma-separated
/// keyword list, and the author as publisher.
fn meta_tag_metadata(html: &str) -> SelfHostedRecord {
    let mut record = SelfHostedRecord::default();
    for element in markup::elements(html, "meta") {
        let Some(name) = markup::attr(&element.attrs, "name") else {
            continue;
        };
        let Some(content) = markup::attr(&element.attrs, "content") else {
            continue;
        };
        let content = content.trim();
        if content.is_empty() {
            continue;
        }
        if name.eq_ignore_ascii_case("description") && record.description.is_none() {
            record.description = Some(content.to_string());
        } else if name.eq_ignore_ascii_case("keywords") && record.keywords.is_empty() {
            record.keywords = content
                .split(',')
                .map(str::trim)
                .filter(|keyword| !keyword.is_empty())
                .map(str::to_string)
                .collect();
        } else if name.eq_ignore_ascii_case("author") && record.publisher.is_empty() {
            record.publisher = vec![content.to_string()];
        }
    }
    record
}

/// The first embedded `<script type="application/ld+json">` block.
fn embedded_jsonld(html: &str) -> Option<String> {
    markup::elements(html, "script")
        .into_iter()
        .find(|element| {
            markup::attr(&element.attrs, "type")
                .map(|t| t.trim().eq_ignore_ascii_case(MEDIA_JSONLD))
                .unwrap_or(false)
        })
        .map(|element| element.inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_tag_metadata() {
        let html = r#"<html><head>
            <meta name="description" content="A marine data archive">
            <meta name="keywords" content="ocean, sediment , climate,">
            <meta name="author" content="Example Institute">
            <meta name="viewport" content="width=device-width">
        </head></html>"#;
        let record = meta_tag_metadata(html);
        assert_eq!(record.description.as_deref(), Some("A marine data archive"));
        assert_eq!(record.keywords, vec!["ocean", "sediment", "climate"]);
        assert_eq!(record.publisher, vec!["Example Institute"]);
    }

    #[test]
    fn test_embedded_jsonld_takes_first_matching_block() {
        let html = r#"<html><head>
            <script type="text/javascript">var x = 1;</script>
            <script type="application/ld+json">{"@id": "first"}</script>
            <script type="application/ld+json">{"@id": "second"}</script>
        </head></html>"#;
        let block = embedded_jsonld(html).unwrap();
        assert!(block.contains("first"));
        assert!(!block.contains("second"));
    }

    #[test]
    fn test_embedded_jsonld_absent() {
        assert!(embedded_jsonld("<html><head></head></html>").is_none());
    }
}
