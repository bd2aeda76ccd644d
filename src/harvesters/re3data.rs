//! re3data registry source
//!
//! Searches the re3data XML registry by hostname, verifies each
//! candidate record against the queried hostname, and parses the first
//! accepted record into its full field set.

use tracing::debug;
use url::Url;

use crate::bag::{Api, Institution, MetadataStandard, Policy, Re3DataRecord, SourceOutput, Syndication};
use crate::error::HarvestError;
use crate::fetch::Fetcher;
use crate::markup;
use crate::vocab::{NS_RE3DATA, RE3DATA_API_URL};

pub struct Re3DataSource {
    base_url: String,
}

impl Re3DataSource {
    pub fn new() -> Self {
        Re3DataSource {
            base_url: RE3DATA_API_URL.to_string(),
        }
    }
}

impl Default for Re3DataSource {
    fn default() -> Self {
        Self::new()
    }
}

impl super::Source for Re3DataSource {
    fn harvest(
        &self,
        fetcher: &Fetcher,
        repository_url: &Url,
    ) -> Result<SourceOutput, HarvestError> {
        let hostname = repository_url
            .host_str()
            .ok_or_else(|| HarvestError::InvalidUrl(repository_url.to_string()))?;

        let search_url = format!("{}/repositories?query={}", self.base_url, hostname);
        let search_xml = fetcher.get_text(&search_url, Some("application/xml"))?;
        let candidate_ids = markup::element_texts(&search_xml, "id");
        debug!(candidates = candidate_ids.len(), "re3data search results");

        for candidate_id in &candidate_ids {
            let record_url = format!("{}/repository/{}", self.base_url, candidate_id);
            let record_xml = match fetcher.get_text(&record_url, Some("application/xml")) {
                Ok(xml) => xml,
                Err(e) => {
                    debug!(id = %candidate_id, "candidate fetch failed: {e}");
                    continue;
                }
            };
            if declared_hostname_matches(&record_xml, hostname) {
                return Ok(SourceOutput::Re3Data(parse_record(&record_xml)));
            }
        }

        Err(HarvestError::NoMatch {
            registry: NS_RE3DATA.to_string(),
            hostname: hostname.to_string(),
        })
    }
}

/// Accept a candidate only when the hostname of its declared canonical
/// URL equals the queried hostname, case-insensitively.
fn declared_hostname_matches(record_xml: &str, hostname: &str) -> bool {
    markup::first_element_text(record_xml, "repositoryURL")
        .and_then(|declared| Url::parse(&declared).ok())
        .and_then(|url| url.host_str().map(|h| h.eq_ignore_ascii_case(hostname)))
        .unwrap_or(false)
}

/// Parse an accepted re3data record. Multi-valued elements become
/// ordered sequences, single-valued elements take the first match, and
/// empty fields stay at their default so serialization prunes them.
pub fn parse_record(xml: &str) -> Re3DataRecord {
    let institutions = markup::elements(xml, "institution")
        .into_iter()
        .map(|element| Institution {
            name: markup::first_element_text(&element.inner, "institutionName"),
            additional_names: markup::element_texts(&element.inner, "institutionAdditionalName"),
            country: markup::first_element_text(&element.inner, "institutionCountry"),
            responsibility_types: markup::element_texts(&element.inner, "responsibilityType"),
            kind: markup::first_element_text(&element.inner, "institutionType"),
            url: markup::first_element_text(&element.inner, "institutionURL"),
            identifiers: markup::element_texts(&element.inner, "institutionIdentifier"),
        })
        .filter(|institution| *institution != Institution::default())
        .collect();

    let policies = markup::elements(xml, "policy")
        .into_iter()
        .map(|element| Policy {
            name: markup::first_element_text(&element.inner, "policyName"),
            url: markup::first_element_text(&element.inner, "policyURL"),
        })
        .filter(|policy| *policy != Policy::default())
        .collect();

    let apis = markup::elements(xml, "api")
        .into_iter()
        .map(|element| Api {
            kind: markup::attr(&element.attrs, "apiType"),
            url: non_empty(markup::unescape(element.inner.trim())),
        })
        .filter(|api| *api != Api::default())
        .collect();

    let metadata_standards = markup::elements(xml, "metadataStandard")
        .into_iter()
        .map(|element| MetadataStandard {
            name: markup::first_element_text(&element.inner, "metadataStandardName"),
            url: markup::first_element_text(&element.inner, "metadataStandardURL"),
        })
        .filter(|standard| *standard != MetadataStandard::default())
        .collect();

    let syndication = markup::elements(xml, "syndication")
        .into_iter()
        .map(|element| Syndication {
            kind: markup::attr(&element.attrs, "syndicationType"),
            url: non_empty(markup::unescape(element.inner.trim())),
        })
        .filter(|entry| *entry != Syndication::default())
        .collect();

    Re3DataRecord {
        re3data_id: markup::first_element_text(xml, "re3data.orgIdentifier"),
        name: markup::first_element_text(xml, "repositoryName"),
        additional_names: markup::element_texts(xml, "additionalName"),
        url: markup::first_element_text(xml, "repositoryURL"),
        identifiers: markup::element_texts(xml, "repositoryIdentifier"),
        description: markup::first_element_text(xml, "description"),
        contacts: markup::element_texts(xml, "repositoryContact"),
        types: markup::element_texts(xml, "type"),
        start_date: markup::first_element_text(xml, "startDate"),
        languages: markup::element_texts(xml, "repositoryLanguage"),
        subjects: markup::element_texts(xml, "subject"),
        mission_statement_url: markup::first_element_text(xml, "missionStatementURL"),
        content_types: markup::element_texts(xml, "contentType"),
        provider_types: markup::element_texts(xml, "providerType"),
        keywords: markup::element_texts(xml, "keyword"),
        institutions,
        policies,
        database_access_type: nested_text(xml, "databaseAccess", "databaseAccessType"),
        data_access_type: nested_text(xml, "dataAccess", "dataAccessType"),
        data_upload_type: nested_text(xml, "dataUpload", "dataUploadType"),
        versioning: markup::first_element_text(xml, "versioning"),
        pid_systems: markup::element_texts(xml, "pidSystem"),
        citation_guideline_url: markup::first_element_text(xml, "citationGuidelineURL"),
        author_id_systems: markup::element_texts(xml, "aidSystem"),
        quality_management: markup::first_element_text(xml, "qualityManagement"),
        certificates: markup::element_texts(xml, "certificate"),
        apis,
        metadata_standards,
        syndication,
        remarks: markup::first_element_text(xml, "remarks"),
        entry_date: markup::first_element_text(xml, "entryDate"),
        last_update: markup::first_element_text(xml, "lastUpdate"),
    }
}

fn nested_text(xml: &str, outer: &str, inner: &str) -> Option<String> {
    markup::elements(xml, outer)
        .into_iter()
        .find_map(|element| markup::first_element_text(&element.inner, inner))
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORD: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<r3d:re3data xmlns:r3d="http://www.re3data.org/schema/2-2">
  <r3d:repository>
    <r3d:re3data.orgIdentifier>r3d100010134</r3d:re3data.orgIdentifier>
    <r3d:repositoryName language="eng">PANGAEA</r3d:repositoryName>
    <r3d:additionalName language="eng">Data Publisher for Earth &amp; Environmental Science</r3d:additionalName>
    <r3d:repositoryURL>https://www.pangaea.de/</r3d:repositoryURL>
    <r3d:repositoryIdentifier>RRID:SCR_002396</r3d:repositoryIdentifier>
    <r3d:description language="eng">PANGAEA archives georeferenced data from earth system research.</r3d:description>
    <r3d:repositoryContact>info@pangaea.de</r3d:repositoryContact>
    <r3d:type>disciplinary</r3d:type>
    <r3d:startDate>1993</r3d:startDate>
    <r3d:repositoryLanguage>eng</r3d:repositoryLanguage>
    <r3d:subject subjectScheme="DFG">34 Geosciences</r3d:subject>
    <r3d:keyword>climate</r3d:keyword>
    <r3d:keyword>oceanography</r3d:keyword>
    <r3d:institution>
      <r3d:institutionName language="eng">Alfred Wegener Institute</r3d:institutionName>
      <r3d:institutionAdditionalName language="eng">AWI</r3d:institutionAdditionalName>
      <r3d:institutionCountry>DEU</r3d:institutionCountry>
      <r3d:responsibilityType>general</r3d:responsibilityType>
      <r3d:institutionType>non-profit</r3d:institutionType>
      <r3d:institutionURL>https://www.awi.de/</r3d:institutionURL>
    </r3d:institution>
    <r3d:policy>
      <r3d:policyName>Data policy</r3d:policyName>
      <r3d:policyURL>https://www.pangaea.de/about/terms.php</r3d:policyURL>
    </r3d:policy>
    <r3d:databaseAccess>
      <r3d:databaseAccessType>open</r3d:databaseAccessType>
    </r3d:databaseAccess>
    <r3d:dataUpload>
      <r3d:dataUploadType>restricted</r3d:dataUploadType>
    </r3d:dataUpload>
    <r3d:versioning>yes</r3d:versioning>
    <r3d:pidSystem>DOI</r3d:pidSystem>
    <r3d:api apiType="OAI-PMH">https://ws.pangaea.de/oai/provider</r3d:api>
    <r3d:metadataStandard>
      <r3d:metadataStandardName metadataStandardScheme="DCC">Dublin Core</r3d:metadataStandardName>
      <r3d:metadataStandardURL>http://www.dcc.ac.uk/resources/metadata-standards/dublin-core</r3d:metadataStandardURL>
    </r3d:metadataStandard>
    <r3d:syndication syndicationType="RSS">https://www.pangaea.de/news.rss</r3d:syndication>
    <r3d:entryDate>2012-07-23</r3d:entryDate>
    <r3d:lastUpdate>2023-03-14</r3d:lastUpdate>
  </r3d:repository>
</r3d:re3data>"#;

    #[test]
    fn test_parse_record_fields() {
        let record = parse_record(RECORD);
        assert_eq!(record.re3data_id.as_deref(), Some("r3d100010134"));
        assert_eq!(record.name.as_deref(), Some("PANGAEA"));
        assert_eq!(
            record.additional_names,
            vec!["Data Publisher for Earth & Environmental Science"]
        );
        assert_eq!(record.url.as_deref(), Some("https://www.pangaea.de/"));
        assert_eq!(record.keywords, vec!["climate", "oceanography"]);
        assert_eq!(record.start_date.as_deref(), Some("1993"));
        assert_eq!(record.database_access_type.as_deref(), Some("open"));
        assert_eq!(record.data_upload_type.as_deref(), Some("restricted"));
        assert_eq!(record.data_access_type, None);
        assert_eq!(record.pid_systems, vec!["DOI"]);
    }

    #[test]
    fn test_parse_record_institution_block() {
        let record = parse_record(RECORD);
        assert_eq!(record.institutions.len(), 1);
        let institution = &record.institutions[0];
        assert_eq!(institution.name.as_deref(), Some("Alfred Wegener Institute"));
        assert_eq!(institution.additional_names, vec!["AWI"]);
        assert_eq!(institution.country.as_deref(), Some("DEU"));
        assert_eq!(institution.kind.as_deref(), Some("non-profit"));
    }

    #[test]
    fn test_parse_record_typed_elements() {
        let record = parse_record(RECORD);
        assert_eq!(record.apis.len(), 1);
        assert_eq!(record.apis[0].kind.as_deref(), Some("OAI-PMH"));
        assert_eq!(
            record.apis[0].url.as_deref(),
            Some("https://ws.pangaea.de/oai/provider")
        );
        assert_eq!(record.syndication.len(), 1);
        assert_eq!(record.syndication[0].kind.as_deref(), Some("RSS"));
        assert_eq!(record.metadata_standards.len(), 1);
        assert_eq!(
            record.metadata_standards[0].name.as_deref(),
            Some("Dublin Core")
        );
        assert_eq!(record.policies.len(), 1);
        assert_eq!(record.policies[0].name.as_deref(), Some("Data policy"));
    }

    #[test]
    fn test_declared_hostname_matching() {
        assert!(declared_hostname_matches(RECORD, "www.pangaea.de"));
        assert!(declared_hostname_matches(RECORD, "WWW.PANGAEA.DE"));
        assert!(!declared_hostname_matches(RECORD, "pangaea.de"));
        assert!(!declared_hostname_matches("<empty/>", "www.pangaea.de"));
    }

    #[test]
    fn test_parse_record_prunes_empty_fields() {
        let record = parse_record("<r3d:repository></r3d:repository>");
        assert!(record.is_empty());
    }
}
