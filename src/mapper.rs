//! Reconciliation of the harvested bag into the canonical record
//!
//! Every field of the canonical record is computed by one documented
//! rule over the namespaced bag. Priority chains take the first
//! non-empty source, union fields merge with set semantics in canonical
//! source order (re3data, fairsharing, self_hosted), and the two
//! concatenation fields preserve order and duplicates. Reconciliation
//! is a pure function of the bag: idempotent and deterministic.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

use crate::bag::{HarvestedBag, MetadataStandard, Policy, ServiceDescriptor};
use crate::vocab::NS_FAIRSHARING;

/// The reconciled repository profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CanonicalRecord {
    pub repo_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub re3data_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fairsharing_id: Option<String>,
    pub metadata: CanonicalMetadata,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<ServiceDescriptor>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub policies: Vec<PolicyEntry>,
}

/// The descriptive metadata block of the canonical record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CanonicalMetadata {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub language: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub additional_names: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resource_types: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub publisher: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub country: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub identifiers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contacts: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subjects: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub content_types: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub provider_types: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub certificates: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pid_systems: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub author_id_systems: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metadata_standards: Vec<MetadataStandard>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub publications: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub grants: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub support_links: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_creation: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub licence_links: Vec<Value>,
}

/// One entry in the canonical policy list: a re3data policy document,
/// or the single synthetic element wrapping the FAIRsharing
/// policy-shaped fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PolicyEntry {
    Registry(Policy),
    Fairsharing(FairsharingPolicy),
}

/// The FAIRsharing policy-shaped fields, wrapped together as one
/// trailing policy element when any of them is present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FairsharingPolicy {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_access_condition: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_curation: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_deposition_condition: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation_to_related_publications: Option<String>,
}

impl FairsharingPolicy {
    fn has_content(&self) -> bool {
        self.data_access_condition.is_some()
            || self.data_curation.is_some()
            || self.data_deposition_condition.is_some()
            || self.citation_to_related_publications.is_some()
    }
}

/// Reconcile the bag into the canonical record.
pub fn reconcile(bag: &HarvestedBag) -> CanonicalRecord {
    let re3data = bag.re3data.as_ref();
    let fairsharing = bag.fairsharing.as_ref();
    let self_hosted = bag.self_hosted.as_ref();

    // curated registries first, the repository's own claims last
    let repo_uri = first_non_empty(&[
        re3data.and_then(|r| r.url.as_deref()),
        fairsharing.and_then(|f| f.homepage.as_deref()),
        self_hosted.and_then(|s| s.url.as_deref()),
    ]);

    let name = first_non_empty(&[
        re3data.and_then(|r| r.name.as_deref()),
        fairsharing.and_then(|f| f.name.as_deref()),
        self_hosted.and_then(|s| s.title.as_deref()),
    ]);
    let description = first_non_empty(&[
        re3data.and_then(|r| r.description.as_deref()),
        fairsharing.and_then(|f| f.description.as_deref()),
        self_hosted.and_then(|s| s.description.as_deref()),
    ]);
    let language = first_non_empty(&[
        re3data.and_then(|r| r.languages.first().map(String::as_str)),
        self_hosted.and_then(|s| s.language.as_deref()),
    ]);

    let keywords = union(&[
        list(re3data.map(|r| r.keywords.as_slice())),
        list(fairsharing.map(|f| f.keywords.as_slice())),
        list(fairsharing.map(|f| f.subjects.as_slice())),
        list(fairsharing.map(|f| f.domains.as_slice())),
        list(self_hosted.map(|s| s.keywords.as_slice())),
    ]);

    let institution_names: Vec<String> = re3data
        .map(|r| {
            r.institutions
                .iter()
                .filter_map(|i| i.name.clone())
                .collect()
        })
        .unwrap_or_default();
    let institution_countries: Vec<String> = re3data
        .map(|r| {
            r.institutions
                .iter()
                .filter_map(|i| i.country.clone())
                .collect()
        })
        .unwrap_or_default();

    let publisher = union(&[
        institution_names.as_slice(),
        list(fairsharing.map(|f| f.publisher.as_slice())),
        list(self_hosted.map(|s| s.publisher.as_slice())),
    ]);
    let country = union(&[
        institution_countries.as_slice(),
        list(fairsharing.map(|f| f.countries.as_slice())),
        list(self_hosted.map(|s| s.country.as_slice())),
    ]);

    let resource_types = union(&[
        list(re3data.map(|r| r.types.as_slice())),
        list(self_hosted.map(|s| s.resource_type.as_slice())),
    ]);

    let registry_identifiers: Vec<String> = fairsharing
        .map(|f| {
            f.doi
                .iter()
                .chain(f.abbreviation.iter())
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    let identifiers = union(&[
        list(re3data.map(|r| r.identifiers.as_slice())),
        registry_identifiers.as_slice(),
    ]);

    // order-sensitive concatenations: re3data, then fairsharing
    // (re3data carries no publication or grant lists today, so the rule
    // degenerates to the fairsharing order)
    let mut publications: Vec<Value> = Vec::new();
    let mut grants: Vec<Value> = Vec::new();
    if let Some(fairsharing) = fairsharing {
        publications.extend(fairsharing.publications.iter().cloned());
        grants.extend(fairsharing.grants.iter().cloned());
    }

    // order-sensitive concatenation: self_hosted, then fairsharing
    let mut services: Vec<ServiceDescriptor> = Vec::new();
    if let Some(self_hosted) = self_hosted {
        services.extend(self_hosted.services.iter().cloned());
    }
    if let Some(fairsharing) = fairsharing {
        services.extend(fairsharing.services.iter().cloned());
    }

    let mut policies: Vec<PolicyEntry> = re3data
        .map(|r| {
            r.policies
                .iter()
                .cloned()
                .map(PolicyEntry::Registry)
                .collect()
        })
        .unwrap_or_default();
    if let Some(fairsharing) = fairsharing {
        let wrapped = FairsharingPolicy {
            source: NS_FAIRSHARING.to_string(),
            data_access_condition: fairsharing.data_access_condition.clone(),
            data_curation: fairsharing.data_curation.clone(),
            data_deposition_condition: fairsharing.data_deposition_condition.clone(),
            citation_to_related_publications: fairsharing
                .citation_to_related_publications
                .clone(),
        };
        if wrapped.has_content() {
            policies.push(PolicyEntry::Fairsharing(wrapped));
        }
    }

    CanonicalRecord {
        repo_uri,
        re3data_id: re3data.and_then(|r| r.re3data_id.clone()),
        fairsharing_id: fairsharing.and_then(|f| f.fairsharing_id.clone()),
        metadata: CanonicalMetadata {
            name,
            description,
            language,
            additional_names: re3data.map(|r| r.additional_names.clone()).unwrap_or_default(),
            resource_types,
            keywords,
            publisher,
            country,
            identifiers,
            start_date: re3data.and_then(|r| r.start_date.clone()),
            contacts: re3data.map(|r| r.contacts.clone()).unwrap_or_default(),
            subjects: re3data.map(|r| r.subjects.clone()).unwrap_or_default(),
            content_types: re3data.map(|r| r.content_types.clone()).unwrap_or_default(),
            provider_types: re3data.map(|r| r.provider_types.clone()).unwrap_or_default(),
            certificates: re3data.map(|r| r.certificates.clone()).unwrap_or_default(),
            pid_systems: re3data.map(|r| r.pid_systems.clone()).unwrap_or_default(),
            author_id_systems: re3data
                .map(|r| r.author_id_systems.clone())
                .unwrap_or_default(),
            metadata_standards: re3data
                .map(|r| r.metadata_standards.clone())
                .unwrap_or_default(),
            publications,
            grants,
            support_links: fairsharing.map(|f| f.support_links.clone()).unwrap_or_default(),
            year_creation: fairsharing.and_then(|f| f.year_creation),
            licence_links: fairsharing.map(|f| f.licence_links.clone()).unwrap_or_default(),
        },
        services,
        policies,
    }
}

/// First non-empty candidate, trimmed; empty string when none.
fn first_non_empty(candidates: &[Option<&str>]) -> String {
    candidates
        .iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_default()
}

fn list(source: Option<&[String]>) -> &[String] {
    source.unwrap_or(&[])
}

/// Set union over the given lists, keeping first-seen order so repeated
/// runs produce identical records.
fn union(sources: &[&[String]]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for source in sources {
        for item in *source {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            if seen.insert(item.to_string()) {
                merged.push(item.to_string());
            }
        }
    }
    merged
}
