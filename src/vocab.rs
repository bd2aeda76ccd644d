//! Vocabulary definitions for repository harvesting
//!
//! IRI namespaces used during linked-data extraction, the recognized
//! catalog/service types, signposting relation names, and registry
//! endpoints.

/// rdf:type predicate
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

/// schema.org base, secure scheme (canonical form after normalization)
pub const SECURE_SCHEMA_ORG: &str = "https://schema.org";

/// schema.org base, insecure scheme (rewritten during graph construction)
pub const INSECURE_SCHEMA_ORG: &str = "http://schema.org";

// schema.org terms
pub const SCHEMA_DATA_CATALOG: &str = "https://schema.org/DataCatalog";
pub const SCHEMA_SERVICE: &str = "https://schema.org/Service";
pub const SCHEMA_NAME: &str = "https://schema.org/name";
pub const SCHEMA_DESCRIPTION: &str = "https://schema.org/description";
pub const SCHEMA_DISAMBIGUATING_DESCRIPTION: &str = "https://schema.org/disambiguatingDescription";
pub const SCHEMA_IN_LANGUAGE: &str = "https://schema.org/inLanguage";
pub const SCHEMA_URL: &str = "https://schema.org/url";
pub const SCHEMA_PUBLISHER: &str = "https://schema.org/publisher";
pub const SCHEMA_ADDRESS: &str = "https://schema.org/address";
pub const SCHEMA_ADDRESS_COUNTRY: &str = "https://schema.org/addressCountry";
pub const SCHEMA_ENCODING_FORMAT: &str = "https://schema.org/encodingFormat";

// DCAT / Dublin Core / FOAF / vCard terms
pub const DCAT_CATALOG: &str = "http://www.w3.org/ns/dcat#Catalog";
pub const DCTERMS_TITLE: &str = "http://purl.org/dc/terms/title";
pub const DCTERMS_DESCRIPTION: &str = "http://purl.org/dc/terms/description";
pub const DCTERMS_LANGUAGE: &str = "http://purl.org/dc/terms/language";
pub const DCTERMS_PUBLISHER: &str = "http://purl.org/dc/terms/publisher";
pub const DCTERMS_CONFORMS_TO: &str = "http://purl.org/dc/terms/conformsTo";
pub const DCTERMS_FORMAT: &str = "http://purl.org/dc/terms/format";
pub const DC_IDENTIFIER: &str = "http://purl.org/dc/elements/1.1/identifier";
pub const FOAF_NAME: &str = "http://xmlns.com/foaf/0.1/name";
pub const FOAF_HOMEPAGE: &str = "http://xmlns.com/foaf/0.1/homepage";
pub const VCARD_COUNTRY_NAME: &str = "http://www.w3.org/2006/vcard/ns#country-name";

// Signposting relation names
pub const REL_DESCRIBEDBY: &str = "describedby";
pub const REL_LINKSET: &str = "linkset";
pub const REL_API_CATALOG: &str = "api-catalog";
pub const REL_SERVICE_DOC: &str = "service-doc";
pub const REL_SERVICE_META: &str = "service-meta";

// Media types
pub const MEDIA_JSONLD: &str = "application/ld+json";
pub const MEDIA_LINKSET_JSON: &str = "application/linkset+json";
pub const MEDIA_LINKSET: &str = "application/linkset";

/// Source tag on services discovered through signposting
pub const SERVICE_SOURCE_FAIRICAT: &str = "fairicat";

/// Source tag on services inferred from linked data
pub const SERVICE_SOURCE_JSONLD: &str = "jsonld";

// Source namespaces in the harvested bag
pub const NS_SELF_HOSTED: &str = "self_hosted";
pub const NS_RE3DATA: &str = "re3data";
pub const NS_FAIRSHARING: &str = "fairsharing";

// Registry endpoints (re3data records use schema
// http://www.re3data.org/schema/2-2)
pub const RE3DATA_API_URL: &str = "https://www.re3data.org/api/v1";
pub const FAIRSHARING_API_URL: &str = "https://api.fairsharing.org";

// FAIRsharing credential environment variables
pub const FAIRSHARING_USERNAME_VAR: &str = "FAIRSHARING_USERNAME";
pub const FAIRSHARING_PASSWORD_VAR: &str = "FAIRSHARING_PASSWORD";
