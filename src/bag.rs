//! Harvested metadata records
//!
//! One explicit record struct per source, gathered into the
//! `HarvestedBag` the mapper consumes. A namespace, once populated by
//! its source, is never overwritten by another; within the self-hosted
//! namespace, successive extraction passes fill only absent fields.

use serde::Serialize;
use serde_json::Value;

/// A service exposed by the repository, discovered through signposting
/// (`source: "fairicat"`) or inferred from linked data
/// (`source: "jsonld"`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServiceDescriptor {
    pub endpoint_uri: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conforms_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
}

/// An institution running or funding a repository (re3data).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Institution {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub additional_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub responsibility_types: Vec<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub identifiers: Vec<String>,
}

/// A named policy document (re3data).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Policy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A typed API endpoint (re3data).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Api {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A supported metadata standard (re3data).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetadataStandard {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A syndication channel (re3data).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Syndication {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// The accepted re3data registry record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Re3DataRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub re3data_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub additional_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub identifiers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contacts: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subjects: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mission_statement_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub content_types: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub provider_types: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub institutions: Vec<Institution>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub policies: Vec<Policy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_access_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_access_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_upload_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub versioning: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pid_systems: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation_guideline_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub author_id_systems: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_management: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub certificates: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub apis: Vec<Api>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metadata_standards: Vec<MetadataStandard>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub syndication: Vec<Syndication>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update: Option<String>,
}

impl Re3DataRecord {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The selected FAIRsharing registry record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FairsharingRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fairsharing_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subjects: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abbreviation: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub publisher: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub countries: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub publications: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub grants: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_access_condition: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_curation: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_deposition_condition: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation_to_related_publications: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub support_links: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_creation: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub licence_links: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<ServiceDescriptor>,
}

impl FairsharingRecord {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Metadata the repository publishes about itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelfHostedRecord {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resource_type: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub publisher: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub country: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<ServiceDescriptor>,
}

impl SelfHostedRecord {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Adopt fields from a later extraction pass, filling only
    /// absent/empty slots (first non-empty wins per call).
    pub fn fill_missing_from(&mut self, other: SelfHostedRecord) {
        if self.resource_type.is_empty() {
            self.resource_type = other.resource_type;
        }
        if is_blank(&self.title) {
            self.title = other.title;
        }
        if is_blank(&self.description) {
            self.description = other.description;
        }
        if is_blank(&self.language) {
            self.language = other.language;
        }
        if is_blank(&self.url) {
            self.url = other.url;
        }
        if self.keywords.is_empty() {
            self.keywords = other.keywords;
        }
        if self.publisher.is_empty() {
            self.publisher = other.publisher;
        }
        if self.country.is_empty() {
            self.country = other.country;
        }
        if self.services.is_empty() {
            self.services = other.services;
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or("").is_empty()
}

/// The output of one source, tagged by namespace.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutput {
    SelfHosted(SelfHostedRecord),
    Re3Data(Re3DataRecord),
    Fairsharing(FairsharingRecord),
}

impl SourceOutput {
    pub fn is_empty(&self) -> bool {
        match self {
            SourceOutput::SelfHosted(record) => record.is_empty(),
            SourceOutput::Re3Data(record) => record.is_empty(),
            SourceOutput::Fairsharing(record) => record.is_empty(),
        }
    }

    /// The record as raw JSON, for snapshotting by callers.
    pub fn raw(&self) -> Result<Value, serde_json::Error> {
        match self {
            SourceOutput::SelfHosted(record) => serde_json::to_value(record),
            SourceOutput::Re3Data(record) => serde_json::to_value(record),
            SourceOutput::Fairsharing(record) => serde_json::to_value(record),
        }
    }
}

/// The namespaced bag of everything harvested for one repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HarvestedBag {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub re3data: Option<Re3DataRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fairsharing: Option<FairsharingRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_hosted: Option<SelfHostedRecord>,
}

impl HarvestedBag {
    pub fn is_empty(&self) -> bool {
        self.re3data.is_none() && self.fairsharing.is_none() && self.self_hosted.is_none()
    }

    /// Place a source's output under its namespace. A namespace already
    /// populated is left untouched.
    pub fn insert(&mut self, output: SourceOutput) {
        match output {
            SourceOutput::SelfHosted(record) => {
                if self.self_hosted.is_none() {
                    self.self_hosted = Some(record);
                }
            }
            SourceOutput::Re3Data(record) => {
                if self.re3data.is_none() {
                    self.re3data = Some(record);
                }
            }
            SourceOutput::Fairsharing(record) => {
                if self.fairsharing.is_none() {
                    self.fairsharing = Some(record);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_missing_keeps_existing_values() {
        let mut record = SelfHostedRecord {
            description: Some("from meta tags".to_string()),
            ..Default::default()
        };
        record.fill_missing_from(SelfHostedRecord {
            description: Some("from JSON-LD".to_string()),
            title: Some("Catalog".to_string()),
            ..Default::default()
        });
        assert_eq!(record.description.as_deref(), Some("from meta tags"));
        assert_eq!(record.title.as_deref(), Some("Catalog"));
    }

    #[test]
    fn test_fill_missing_treats_blank_as_absent() {
        let mut record = SelfHostedRecord {
            title: Some("  ".to_string()),
            ..Default::default()
        };
        record.fill_missing_from(SelfHostedRecord {
            title: Some("Catalog".to_string()),
            ..Default::default()
        });
        assert_eq!(record.title.as_deref(), Some("Catalog"));
    }

    #[test]
    fn test_bag_never_overwrites_a_namespace() {
        let mut bag = HarvestedBag::default();
        bag.insert(SourceOutput::Re3Data(Re3DataRecord {
            name: Some("first".to_string()),
            ..Default::default()
        }));
        bag.insert(SourceOutput::Re3Data(Re3DataRecord {
            name: Some("second".to_string()),
            ..Default::default()
        }));
        assert_eq!(
            bag.re3data.as_ref().and_then(|r| r.name.as_deref()),
            Some("first")
        );
    }

    #[test]
    fn test_empty_fields_are_pruned_on_serialization() {
        let record = Re3DataRecord {
            name: Some("PANGAEA".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&record).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert!(obj.contains_key("name"));
    }
}
