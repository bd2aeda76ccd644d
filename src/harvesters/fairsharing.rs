//! FAIRsharing registry source
//!
//! Exchanges configured credentials for a bearer token, searches the
//! JSON registry by the hostname's second-level label, selects the best
//! candidate among ambiguous matches, and extracts its attributes.
//! Missing credentials or a failed token exchange skip this source.

use serde_json::{json, Value};
use url::Url;

use crate::bag::{FairsharingRecord, SourceOutput};
use crate::error::HarvestError;
use crate::fetch::Fetcher;
use crate::vocab::{
    FAIRSHARING_API_URL, FAIRSHARING_PASSWORD_VAR, FAIRSHARING_USERNAME_VAR, NS_FAIRSHARING,
};

/// FAIRsharing login.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Read credentials from the environment; either variable missing
    /// or empty yields none.
    pub fn from_env() -> Option<Self> {
        let username = std::env::var(FAIRSHARING_USERNAME_VAR).ok()?;
        let password = std::env::var(FAIRSHARING_PASSWORD_VAR).ok()?;
        if username.is_empty() || password.is_empty() {
            return None;
        }
        Some(Credentials { username, password })
    }
}

pub struct FairsharingSource {
    base_url: String,
    credentials: Option<Credentials>,
}

impl FairsharingSource {
    pub fn new(credentials: Option<Credentials>) -> Self {
        FairsharingSource {
            base_url: FAIRSHARING_API_URL.to_string(),
            credentials,
        }
    }

    /// Exchange credentials for a bearer token.
    fn sign_in(&self, fetcher: &Fetcher, credentials: &Credentials) -> Result<String, HarvestError> {
        let url = format!("{}/users/sign_in", self.base_url);
        let payload = json!({
            "user": {"login": credentials.username, "password": credentials.password}
        });
        let response = fetcher.post_json(&url, &payload, None)?;
        response
            .get("jwt")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| HarvestError::Auth {
                service: NS_FAIRSHARING.to_string(),
                reason: "sign-in response carried no jwt token".to_string(),
            })
    }
}

impl super::Source for FairsharingSource {
    fn harvest(
        &self,
        fetcher: &Fetcher,
        repository_url: &Url,
    ) -> Result<SourceOutput, HarvestError> {
        let Some(credentials) = &self.credentials else {
            return Err(HarvestError::Auth {
                service: NS_FAIRSHARING.to_string(),
                reason: "credentials not configured".to_string(),
            });
        };
        let hostname = repository_url
            .host_str()
            .ok_or_else(|| HarvestError::InvalidUrl(repository_url.to_string()))?;

        let token = self.sign_in(fetcher, credentials)?;

        let search_url = format!("{}/search/fairsharing_records/", self.base_url);
        let payload = json!({"q": search_term(hostname)});
        let response = fetcher.post_json(&search_url, &payload, Some(&token))?;
        let results = match &response {
            Value::Array(items) => items.clone(),
            other => other
                .get("data")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
        };

        let matching = matching_candidates(&results, hostname);
        if matching.is_empty() {
            return Err(HarvestError::NoMatch {
                registry: NS_FAIRSHARING.to_string(),
                hostname: hostname.to_string(),
            });
        }
        match select_candidate(&matching) {
            Some(candidate) => Ok(SourceOutput::Fairsharing(extract_record(candidate))),
            None => Err(HarvestError::AmbiguousMatch {
                registry: NS_FAIRSHARING.to_string(),
                hostname: hostname.to_string(),
                candidates: matching.len(),
            }),
        }
    }
}

/// The search term is the hostname's second-level label
/// ("www.pangaea.de" -> "pangaea").
pub fn search_term(hostname: &str) -> &str {
    let parts: Vec<&str> = hostname.split('.').collect();
    if parts.len() > 1 {
        parts[parts.len() - 2]
    } else {
        parts[0]
    }
}

fn normalize_hostname(hostname: &str) -> String {
    let lower = hostname.to_ascii_lowercase();
    lower
        .strip_prefix("www.")
        .map(str::to_string)
        .unwrap_or(lower)
}

/// Keep only results whose declared homepage hostname equals the query
/// hostname, both lower-cased with a leading "www." stripped.
pub fn matching_candidates<'a>(results: &'a [Value], hostname: &str) -> Vec<&'a Value> {
    let wanted = normalize_hostname(hostname);
    results
        .iter()
        .filter(|result| {
            result
                .get("attributes")
                .and_then(|attributes| attributes.get("homepage"))
                .and_then(Value::as_str)
                .and_then(|homepage| Url::parse(homepage).ok())
                .and_then(|url| url.host_str().map(|h| normalize_hostname(h) == wanted))
                .unwrap_or(false)
        })
        .collect()
}

/// Prefer a candidate with status "ready", else the first candidate not
/// "deprecated", else none (an unusable set is dropped, never guessed).
pub fn select_candidate<'a>(matching: &[&'a Value]) -> Option<&'a Value> {
    matching
        .iter()
        .find(|candidate| candidate_status(candidate) == Some("ready"))
        .copied()
        .or_else(|| {
            matching
                .iter()
                .find(|candidate| candidate_status(candidate) != Some("deprecated"))
                .copied()
        })
}

fn candidate_status(candidate: &Value) -> Option<&str> {
    candidate
        .get("attributes")
        .and_then(|attributes| attributes.get("status"))
        .and_then(Value::as_str)
}

/// Extract the selected candidate's attributes, pruned of falsy values.
pub fn extract_record(candidate: &Value) -> FairsharingRecord {
    let attributes = candidate.get("attributes").cloned().unwrap_or(Value::Null);

    let text = |key: &str| -> Option<String> {
        attributes
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let strings = |key: &str| -> Vec<String> {
        match attributes.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            Some(Value::String(one)) if !one.is_empty() => vec![one.clone()],
            _ => Vec::new(),
        }
    };
    let entries = |key: &str| -> Vec<Value> {
        attributes
            .get(key)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    };
    let entry = |key: &str| -> Option<Value> {
        attributes.get(key).cloned().filter(|value| !is_falsy(value))
    };

    FairsharingRecord {
        fairsharing_id: candidate.get("id").map(id_text),
        name: text("name"),
        homepage: text("homepage"),
        description: text("description"),
        keywords: strings("keywords"),
        subjects: strings("subjects"),
        domains: strings("domains"),
        doi: text("doi"),
        abbreviation: text("abbreviation"),
        publisher: strings("publisher"),
        countries: strings("countries"),
        publications: entries("publications"),
        grants: entries("grants"),
        data_access_condition: entry("data_access_condition"),
        data_curation: entry("data_curation"),
        data_deposition_condition: entry("data_deposition_condition"),
        citation_to_related_publications: text("citation_to_related_publications"),
        support_links: entries("support_links"),
        year_creation: attributes.get("year_creation").and_then(Value::as_i64),
        licence_links: entries("licence_links"),
        services: Vec::new(),
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(entries) => entries.is_empty(),
        _ => false,
    }
}

fn id_text(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate(id: &str, homepage: &str, status: &str) -> Value {
        json!({
            "id": id,
            "attributes": {
                "homepage": homepage,
                "status": status,
                "name": format!("record {id}")
            }
        })
    }

    #[test]
    fn test_search_term() {
        assert_eq!(search_term("www.pangaea.de"), "pangaea");
        assert_eq!(search_term("flybase.org"), "flybase");
        assert_eq!(search_term("localhost"), "localhost");
    }

    #[test]
    fn test_matching_candidates_normalizes_www() {
        let results = vec![
            candidate("1", "https://www.pangaea.de/", "ready"),
            candidate("2", "https://pangaea.de/about", "ready"),
            candidate("3", "https://other.example.org/", "ready"),
        ];
        let matching = matching_candidates(&results, "pangaea.de");
        assert_eq!(matching.len(), 2);
        let matching = matching_candidates(&results, "WWW.PANGAEA.DE");
        assert_eq!(matching.len(), 2);
    }

    #[test]
    fn test_selection_prefers_ready() {
        let deprecated = candidate("1", "https://x.org/", "deprecated");
        let in_dev = candidate("2", "https://x.org/", "in_development");
        let ready = candidate("3", "https://x.org/", "ready");

        // ready wins regardless of candidate order
        let matching = vec![&deprecated, &in_dev, &ready];
        assert_eq!(select_candidate(&matching).unwrap()["id"], json!("3"));
        let matching = vec![&ready, &deprecated, &in_dev];
        assert_eq!(select_candidate(&matching).unwrap()["id"], json!("3"));
    }

    #[test]
    fn test_selection_falls_back_to_non_deprecated() {
        let deprecated = candidate("1", "https://x.org/", "deprecated");
        let in_dev = candidate("2", "https://x.org/", "in_development");
        let matching = vec![&deprecated, &in_dev];
        assert_eq!(select_candidate(&matching).unwrap()["id"], json!("2"));
    }

    #[test]
    fn test_selection_drops_fully_deprecated_set() {
        let a = candidate("1", "https://x.org/", "deprecated");
        let b = candidate("2", "https://x.org/", "deprecated");
        let matching = vec![&a, &b];
        assert!(select_candidate(&matching).is_none());
    }

    #[test]
    fn test_extract_record_prunes_falsy_attributes() {
        let selected = json!({
            "id": 3248,
            "attributes": {
                "name": "PANGAEA",
                "homepage": "https://www.pangaea.de/",
                "description": "",
                "keywords": ["earth science"],
                "subjects": [],
                "domains": ["Earth and related environmental sciences"],
                "year_creation": 1993,
                "data_curation": {"type": "manual"},
                "data_access_condition": null,
                "publications": [{"title": "A paper", "year": 2020}]
            }
        });
        let record = extract_record(&selected);
        assert_eq!(record.fairsharing_id.as_deref(), Some("3248"));
        assert_eq!(record.name.as_deref(), Some("PANGAEA"));
        assert_eq!(record.description, None);
        assert_eq!(record.keywords, vec!["earth science"]);
        assert!(record.subjects.is_empty());
        assert_eq!(record.year_creation, Some(1993));
        assert!(record.data_curation.is_some());
        assert!(record.data_access_condition.is_none());
        assert_eq!(record.publications.len(), 1);
    }
}
