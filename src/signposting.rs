//! Signposting link discovery
//!
//! Collects the typed links a repository page exposes through HTML head
//! `<link>` elements, the HTTP `Link` response header, and any linkset
//! documents those point at, into one deduplicated sequence.
//!
//! Links are deduplicated by (target, relation): one target serving two
//! relations (say `service-doc` and `service-meta`) keeps both entries,
//! while exact repeats across the discovery passes collapse to the first
//! occurrence. Queries operate on the deduplicated sequence.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::bag::ServiceDescriptor;
use crate::fetch::Fetcher;
use crate::markup;
use crate::vocab::{
    MEDIA_LINKSET, MEDIA_LINKSET_JSON, REL_API_CATALOG, REL_LINKSET, REL_SERVICE_DOC,
    REL_SERVICE_META, SERVICE_SOURCE_FAIRICAT,
};

/// One typed link, immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypedLink {
    /// Resource the link is about (defaults to the page URL)
    pub anchor: String,
    /// Link target URI
    pub target: String,
    /// Relation name, lower-cased (open set: describedby, linkset, ...)
    pub relation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// The deduplicated signposting links of one page.
#[derive(Debug, Default)]
pub struct Signposting {
    links: Vec<TypedLink>,
}

impl Signposting {
    /// Discover links from a fetched page: head `<link>` elements, the
    /// `Link` header, and referenced linkset documents. Linkset fetch
    /// failures degrade that linkset only.
    pub fn discover(
        fetcher: &Fetcher,
        base_url: &Url,
        html: &str,
        link_header: Option<&str>,
    ) -> Self {
        let mut links = head_links(html, base_url);
        if let Some(header) = link_header {
            links.extend(parse_link_header(header, base_url.as_str()));
        }

        let mut expanded = Vec::new();
        for link in &links {
            if link.relation == REL_LINKSET || link.relation == REL_API_CATALOG {
                expanded.extend(expand_linkset(fetcher, link));
            }
        }
        links.extend(expanded);

        Signposting::from_links(links)
    }

    /// Build from an already-collected sequence, applying deduplication.
    pub fn from_links(links: Vec<TypedLink>) -> Self {
        Signposting {
            links: dedup_links(links),
        }
    }

    pub fn links(&self) -> &[TypedLink] {
        &self.links
    }

    /// Links whose relation is in `relations`, optionally restricted to a
    /// set of media types (links without a media type never match a
    /// media-type filter).
    pub fn links_by_relation(
        &self,
        relations: &[&str],
        media_types: Option<&[&str]>,
    ) -> Vec<&TypedLink> {
        self.links
            .iter()
            .filter(|link| relations.contains(&link.relation.as_str()))
            .filter(|link| match media_types {
                Some(types) => link
                    .media_type
                    .as_deref()
                    .map(|t| types.contains(&t))
                    .unwrap_or(false),
                None => true,
            })
            .collect()
    }

    /// Derive service descriptors from `service-doc`/`service-meta`
    /// links, merged by shared anchor: the anchor becomes the endpoint,
    /// `service-doc` contributes conforms_to and title, `service-meta`
    /// contributes service_desc and output_format.
    pub fn service_links(&self) -> Vec<ServiceDescriptor> {
        let mut services: Vec<ServiceDescriptor> = Vec::new();
        for link in self.links_by_relation(&[REL_SERVICE_DOC, REL_SERVICE_META], None) {
            let idx = match services
                .iter()
                .position(|s| s.endpoint_uri == link.anchor)
            {
                Some(idx) => idx,
                None => {
                    services.push(ServiceDescriptor {
                        endpoint_uri: link.anchor.clone(),
                        source: SERVICE_SOURCE_FAIRICAT.to_string(),
                        ..Default::default()
                    });
                    services.len() - 1
                }
            };
            let entry = &mut services[idx];
            match link.relation.as_str() {
                REL_SERVICE_DOC => {
                    entry.conforms_to = Some(link.target.clone());
                    if let Some(title) = &link.title {
                        entry.title = Some(title.clone());
                    }
                }
                _ => {
                    entry.service_desc = Some(link.target.clone());
                    if let Some(media_type) = &link.media_type {
                        entry.output_format = Some(media_type.clone());
                    }
                }
            }
        }
        services
    }
}

/// Parse `<link>` elements in the document head, resolving relative
/// targets against the base URL. Links without href or rel are dropped.
fn head_links(html: &str, base_url: &Url) -> Vec<TypedLink> {
    let mut links = Vec::new();
    let Some(head) = markup::head_slice(html) else {
        return links;
    };
    for element in markup::elements(head, "link") {
        let Some(href) = markup::attr(&element.attrs, "href") else {
            continue;
        };
        let Some(rel) = markup::attr(&element.attrs, "rel") else {
            continue;
        };
        let rel = rel.trim().to_ascii_lowercase();
        if rel.is_empty() || href.trim().is_empty() {
            continue;
        }
        let Ok(target) = base_url.join(href.trim()) else {
            continue;
        };
        links.push(TypedLink {
            anchor: base_url.as_str().to_string(),
            target: target.to_string(),
            relation: rel,
            media_type: markup::attr(&element.attrs, "type")
                .map(|t| t.trim().to_ascii_lowercase())
                .filter(|t| !t.is_empty()),
            profile: markup::attr(&element.attrs, "profile").filter(|p| !p.is_empty()),
            title: markup::attr(&element.attrs, "title").filter(|t| !t.is_empty()),
        });
    }
    links
}

/// Parse an HTTP `Link` header (or a text linkset body in the same
/// grammar): comma-separated entries of `<uri>` followed by
/// semicolon-separated parameters. A malformed entry is skipped without
/// aborting the rest; a missing anchor defaults to `anchor_default`.
pub fn parse_link_header(header: &str, anchor_default: &str) -> Vec<TypedLink> {
    let mut links = Vec::new();
    for entry in header.split(',') {
        let mut parts = entry.trim().split(';');
        let Some(target_part) = parts.next() else {
            continue;
        };
        let target_part = target_part.trim();
        if !(target_part.starts_with('<') && target_part.ends_with('>')) {
            continue;
        }
        let target = target_part[1..target_part.len() - 1].trim().to_string();
        if target.is_empty() {
            continue;
        }

        let mut relation = None;
        let mut media_type = None;
        let mut profile = None;
        let mut anchor = None;
        let mut title = None;
        for param in parts {
            let Some((key, value)) = param.split_once('=') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim().trim_matches('"').trim();
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "rel" => relation = Some(value.to_ascii_lowercase()),
                "type" => media_type = Some(value.to_ascii_lowercase()),
                "profile" => profile = Some(value.to_string()),
                "anchor" => anchor = Some(value.to_string()),
                "title" => title = Some(value.to_string()),
                _ => {}
            }
        }
        let Some(relation) = relation else {
            continue;
        };
        links.push(TypedLink {
            anchor: anchor.unwrap_or_else(|| anchor_default.to_string()),
            target,
            relation,
            media_type,
            profile,
            title,
        });
    }
    links
}

/// Dereference one linkset link and expand its entries. JSON linksets
/// contribute their `linkset` array; text linksets re-run the
/// link-header grammar on the body. Unknown formats contribute nothing.
fn expand_linkset(fetcher: &Fetcher, link: &TypedLink) -> Vec<TypedLink> {
    match link.media_type.as_deref() {
        Some(MEDIA_LINKSET_JSON) => match fetcher.get_json(&link.target) {
            Ok(doc) => parse_linkset_document(&doc),
            Err(e) => {
                warn!(url = %link.target, "skipping unreachable linkset: {e}");
                Vec::new()
            }
        },
        Some(MEDIA_LINKSET) => match fetcher.get_text(&link.target, Some(MEDIA_LINKSET)) {
            Ok(body) => parse_link_header(&body, &link.anchor),
            Err(e) => {
                warn!(url = %link.target, "skipping unreachable linkset: {e}");
                Vec::new()
            }
        },
        other => {
            debug!(media_type = ?other, url = %link.target, "unknown linkset format");
            Vec::new()
        }
    }
}

/// Expand a JSON linkset document: each `linkset` entry carries an
/// anchor plus one-or-many typed targets per relation key.
pub fn parse_linkset_document(doc: &Value) -> Vec<TypedLink> {
    let mut links = Vec::new();
    let Some(sets) = doc.get("linkset").and_then(Value::as_array) else {
        debug!("linkset document without a linkset array");
        return links;
    };
    for set in sets {
        let Some(obj) = set.as_object() else {
            continue;
        };
        let anchor = obj
            .get("anchor")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        for (relation, targets) in obj {
            if relation == "anchor" {
                continue;
            }
            let targets = match targets {
                Value::Array(list) => list.iter().collect::<Vec<_>>(),
                other => vec![other],
            };
            for target in targets {
                let Some(href) = target.get("href").and_then(Value::as_str) else {
                    continue;
                };
                links.push(TypedLink {
                    anchor: anchor.clone(),
                    target: href.to_string(),
                    relation: relation.to_ascii_lowercase(),
                    media_type: target
                        .get("type")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    profile: target
                        .get("profile")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    title: target
                        .get("title")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                });
            }
        }
    }
    links
}

/// Deduplicate by (target, relation), first occurrence wins.
fn dedup_links(links: Vec<TypedLink>) -> Vec<TypedLink> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for link in links {
        if seen.insert((link.target.clone(), link.relation.clone())) {
            unique.push(link);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn link(target: &str, relation: &str) -> TypedLink {
        TypedLink {
            anchor: "https://example.org/".to_string(),
            target: target.to_string(),
            relation: relation.to_string(),
            media_type: None,
            profile: None,
            title: None,
        }
    }

    #[test]
    fn test_parse_link_header() {
        let header = r#"<https://ex.org/a>; rel="describedby"; type="application/ld+json", <https://ex.org/b>; rel="item""#;
        let links = parse_link_header(header, "https://ex.org/");
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].target, "https://ex.org/a");
        assert_eq!(links[0].relation, "describedby");
        assert_eq!(links[0].media_type.as_deref(), Some("application/ld+json"));
        assert_eq!(links[0].anchor, "https://ex.org/");
        assert_eq!(links[1].target, "https://ex.org/b");
        assert_eq!(links[1].relation, "item");
    }

    #[test]
    fn test_parse_link_header_skips_malformed_entries() {
        let header = r#"garbage, <https://ex.org/a>; rel="cite-as", <https://ex.org/b>"#;
        let links = parse_link_header(header, "https://ex.org/");
        // the garbage entry and the rel-less entry are dropped individually
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].relation, "cite-as");
    }

    #[test]
    fn test_parse_link_header_explicit_anchor() {
        let header = r#"<https://ex.org/doc>; rel="service-doc"; anchor="https://ex.org/api""#;
        let links = parse_link_header(header, "https://ex.org/");
        assert_eq!(links[0].anchor, "https://ex.org/api");
    }

    #[test]
    fn test_head_links_resolve_relative_href() {
        let html = r#"<html><head>
            <link rel="describedby" type="application/ld+json" href="/metadata.jsonld">
            <link rel="stylesheet" href="main.css">
        </head><body></body></html>"#;
        let base = Url::parse("https://example.org/repo/").unwrap();
        let links = head_links(html, &base);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].target, "https://example.org/metadata.jsonld");
        assert_eq!(links[1].target, "https://example.org/repo/main.css");
        assert_eq!(links[0].anchor, "https://example.org/repo/");
    }

    #[test]
    fn test_parse_linkset_document_single_and_many_targets() {
        let doc = json!({
            "linkset": [
                {
                    "anchor": "https://ex.org/api",
                    "service-doc": {"href": "https://ex.org/openapi", "type": "application/vnd.oai.openapi+json"},
                    "item": [
                        {"href": "https://ex.org/a"},
                        {"href": "https://ex.org/b"}
                    ]
                }
            ]
        });
        let links = parse_linkset_document(&doc);
        assert_eq!(links.len(), 3);
        let doc_link = links.iter().find(|l| l.relation == "service-doc").unwrap();
        assert_eq!(doc_link.anchor, "https://ex.org/api");
        assert_eq!(doc_link.target, "https://ex.org/openapi");
        assert_eq!(links.iter().filter(|l| l.relation == "item").count(), 2);
    }

    #[test]
    fn test_dedup_keeps_distinct_relations_for_one_target() {
        let links = vec![
            link("https://ex.org/api", "service-doc"),
            link("https://ex.org/api", "service-meta"),
            link("https://ex.org/api", "service-doc"),
        ];
        let sp = Signposting::from_links(links);
        assert_eq!(sp.links().len(), 2);
    }

    #[test]
    fn test_links_by_relation_with_media_type_filter() {
        let mut a = link("https://ex.org/meta.jsonld", "describedby");
        a.media_type = Some("application/ld+json".to_string());
        let b = link("https://ex.org/meta.xml", "describedby");
        let sp = Signposting::from_links(vec![a, b]);

        let filtered = sp.links_by_relation(&["describedby"], Some(&["application/ld+json"]));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].target, "https://ex.org/meta.jsonld");

        let unfiltered = sp.links_by_relation(&["describedby"], None);
        assert_eq!(unfiltered.len(), 2);
    }

    #[test]
    fn test_service_links_merged_by_anchor() {
        let mut doc_link = link("https://ex.org/openapi", "service-doc");
        doc_link.anchor = "https://ex.org/api".to_string();
        doc_link.title = Some("Search API".to_string());
        let mut meta_link = link("https://ex.org/servicedesc", "service-meta");
        meta_link.anchor = "https://ex.org/api".to_string();
        meta_link.media_type = Some("application/ld+json".to_string());

        let sp = Signposting::from_links(vec![doc_link, meta_link]);
        let services = sp.service_links();
        assert_eq!(services.len(), 1);
        let service = &services[0];
        assert_eq!(service.endpoint_uri, "https://ex.org/api");
        assert_eq!(service.source, "fairicat");
        assert_eq!(service.conforms_to.as_deref(), Some("https://ex.org/openapi"));
        assert_eq!(service.title.as_deref(), Some("Search API"));
        assert_eq!(service.service_desc.as_deref(), Some("https://ex.org/servicedesc"));
        assert_eq!(service.output_format.as_deref(), Some("application/ld+json"));
    }
}
