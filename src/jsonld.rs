//! Linked-data extraction
//!
//! Parses a JSON-LD document into an RDF-style triple graph, normalizes
//! the schema.org dual-scheme ambiguity, and extracts catalog-level
//! descriptive metadata plus the services contained in a catalog.
//!
//! The expansion is pragmatic: `@graph` arrays, nested node objects
//! (which become blank nodes), `@id`, `@type`, `@value` objects, and an
//! `@context` given as a vocabulary IRI, an array, or a prefix/term map.
//! Remote contexts are not dereferenced; keys that cannot be expanded
//! are dropped.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::bag::{SelfHostedRecord, ServiceDescriptor};
use crate::error::HarvestError;
use crate::vocab::{
    DCAT_CATALOG, DCTERMS_CONFORMS_TO, DCTERMS_DESCRIPTION, DCTERMS_FORMAT, DCTERMS_LANGUAGE,
    DCTERMS_PUBLISHER, DCTERMS_TITLE, DC_IDENTIFIER, FOAF_HOMEPAGE, FOAF_NAME,
    INSECURE_SCHEMA_ORG, RDF_TYPE, SCHEMA_ADDRESS, SCHEMA_ADDRESS_COUNTRY, SCHEMA_DATA_CATALOG,
    SCHEMA_DESCRIPTION, SCHEMA_DISAMBIGUATING_DESCRIPTION, SCHEMA_ENCODING_FORMAT,
    SCHEMA_IN_LANGUAGE, SCHEMA_NAME, SCHEMA_PUBLISHER, SCHEMA_SERVICE, SCHEMA_URL,
    SECURE_SCHEMA_ORG, SERVICE_SOURCE_JSONLD, VCARD_COUNTRY_NAME,
};

/// One node or value in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Iri(String),
    Blank(usize),
    Literal(String),
}

impl Term {
    /// The IRI of a named node.
    pub fn iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// Textual content of a literal or the IRI of a named node.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Term::Iri(text) | Term::Literal(text) => Some(text),
            Term::Blank(_) => None,
        }
    }
}

/// A (subject, predicate, object) statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Triple {
    pub subject: Term,
    pub predicate: String,
    pub object: Term,
}

/// An RDF-style graph built from one JSON-LD document. Insecure
/// schema.org IRIs never appear in a built graph; they are rewritten to
/// the secure scheme while the triples are constructed.
#[derive(Debug, Default)]
pub struct Graph {
    triples: Vec<Triple>,
}

impl Graph {
    /// Parse a JSON-LD text blob into a graph.
    pub fn from_jsonld(text: &str) -> Result<Graph, HarvestError> {
        let doc: Value = serde_json::from_str(text).map_err(|e| HarvestError::Parse {
            what: "JSON-LD document".to_string(),
            reason: e.to_string(),
        })?;
        let mut builder = Builder::default();
        builder.walk_document(&doc);
        Ok(Graph {
            triples: builder.triples,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    /// All objects of (subject, predicate) statements, in document order.
    pub fn objects(&self, subject: &Term, predicate: &str) -> Vec<&Term> {
        self.triples
            .iter()
            .filter(|t| &t.subject == subject && t.predicate == predicate)
            .map(|t| &t.object)
            .collect()
    }

    /// First object of a (subject, predicate) statement.
    pub fn first_object(&self, subject: &Term, predicate: &str) -> Option<&Term> {
        self.triples
            .iter()
            .find(|t| &t.subject == subject && t.predicate == predicate)
            .map(|t| &t.object)
    }

    /// First non-empty text over a list of candidate predicates.
    pub fn first_text(&self, subject: &Term, predicates: &[&str]) -> Option<String> {
        for predicate in predicates {
            for object in self.objects(subject, predicate) {
                if let Some(text) = object.as_text() {
                    let text = text.trim();
                    if !text.is_empty() {
                        return Some(text.to_string());
                    }
                }
            }
        }
        None
    }

    /// Distinct subjects carrying the given rdf:type, in document order.
    pub fn subjects_with_type(&self, type_iri: &str) -> Vec<Term> {
        let mut subjects = Vec::new();
        for triple in &self.triples {
            if triple.predicate == RDF_TYPE
                && matches!(&triple.object, Term::Iri(iri) if iri == type_iri)
                && !subjects.contains(&triple.subject)
            {
                subjects.push(triple.subject.clone());
            }
        }
        subjects
    }

    /// Whether a node carries any of the given rdf:type IRIs.
    pub fn has_type(&self, node: &Term, type_iris: &[&str]) -> bool {
        self.objects(node, RDF_TYPE)
            .iter()
            .any(|object| matches!(object, Term::Iri(iri) if type_iris.contains(&iri.as_str())))
    }

    /// Subjects with an edge of any predicate pointing at `object`.
    pub fn subjects_pointing_to(&self, object: &Term) -> Vec<&Term> {
        self.triples
            .iter()
            .filter(|t| &t.object == object)
            .map(|t| &t.subject)
            .collect()
    }
}

/// Rewrite an insecure schema.org IRI to the secure scheme.
pub fn normalize_iri(iri: &str) -> String {
    if let Some(rest) = iri.strip_prefix(INSECURE_SCHEMA_ORG) {
        if rest.is_empty() || rest.starts_with('/') || rest.starts_with('#') {
            return format!("{SECURE_SCHEMA_ORG}{rest}");
        }
    }
    iri.to_string()
}

#[derive(Default)]
struct Builder {
    triples: Vec<Triple>,
    blank_counter: usize,
    context: Context,
}

/// Active term mappings from the document's `@context`.
#[derive(Default, Clone)]
struct Context {
    vocab: Option<String>,
    mappings: HashMap<String, String>,
}

impl Context {
    fn absorb(&mut self, value: &Value) {
        match value {
            Value::String(iri) => self.vocab = Some(normalize_iri(&ensure_ns_suffix(iri))),
            Value::Array(parts) => {
                for part in parts {
                    self.absorb(part);
                }
            }
            Value::Object(entries) => {
                for (term, mapped) in entries {
                    if term == "@vocab" {
                        if let Some(iri) = mapped.as_str() {
                            self.vocab = Some(normalize_iri(&ensure_ns_suffix(iri)));
                        }
                        continue;
                    }
                    if term.starts_with('@') {
                        continue;
                    }
                    let iri = match mapped {
                        Value::String(iri) => Some(iri.clone()),
                        Value::Object(definition) => definition
                            .get("@id")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                        _ => None,
                    };
                    if let Some(iri) = iri {
                        self.mappings.insert(term.clone(), normalize_iri(&iri));
                    }
                }
            }
            _ => {}
        }
    }

    /// Expand a key to an absolute IRI: pass through absolute IRIs,
    /// then exact term mappings, then declared CURIE prefixes, then the
    /// active vocabulary. Unmappable keys expand to nothing.
    fn expand(&self, key: &str) -> Option<String> {
        if key.starts_with("http://") || key.starts_with("https://") || key.starts_with("urn:") {
            return Some(normalize_iri(key));
        }
        if let Some(iri) = self.mappings.get(key) {
            return Some(iri.clone());
        }
        if let Some((prefix, local)) = key.split_once(':') {
            if let Some(ns) = self.mappings.get(prefix) {
                return Some(normalize_iri(&format!("{ns}{local}")));
            }
        }
        self.vocab
            .as_ref()
            .map(|vocab| normalize_iri(&format!("{vocab}{key}")))
    }
}

fn ensure_ns_suffix(iri: &str) -> String {
    if iri.ends_with('/') || iri.ends_with('#') {
        iri.to_string()
    } else {
        format!("{iri}/")
    }
}

impl Builder {
    fn walk_document(&mut self, doc: &Value) {
        match doc {
            Value::Array(nodes) => {
                for node in nodes {
                    self.walk_document(node);
                }
            }
            Value::Object(obj) => {
                if let Some(context) = obj.get("@context") {
                    self.context.absorb(context);
                }
                match obj.get("@graph") {
                    Some(Value::Array(nodes)) => {
                        for node in nodes {
                            self.node_term(node);
                        }
                    }
                    Some(other) => {
                        self.node_term(other);
                    }
                    None => {}
                }
                let has_own_properties = obj
                    .keys()
                    .any(|key| key != "@context" && key != "@graph");
                if obj.get("@graph").is_none() || has_own_properties {
                    self.node_term(doc);
                }
            }
            _ => {}
        }
    }

    /// Emit the triples of one node object and return its term.
    fn node_term(&mut self, value: &Value) -> Term {
        let obj = match value {
            Value::Object(obj) => obj,
            other => return Term::Literal(scalar_text(other)),
        };

        if let Some(text) = obj.get("@value") {
            return Term::Literal(scalar_text(text));
        }

        let subject = match obj.get("@id").and_then(Value::as_str) {
            Some(id) => Term::Iri(normalize_iri(id)),
            None => {
                self.blank_counter += 1;
                Term::Blank(self.blank_counter)
            }
        };

        if let Some(types) = obj.get("@type") {
            for type_value in as_array(types) {
                if let Some(name) = type_value.as_str() {
                    let iri = self
                        .context
                        .expand(name)
                        .unwrap_or_else(|| normalize_iri(name));
                    self.add(subject.clone(), RDF_TYPE.to_string(), Term::Iri(iri));
                }
            }
        }

        for (key, value) in obj {
            if key.starts_with('@') {
                continue;
            }
            let Some(predicate) = self.context.expand(key) else {
                continue;
            };
            for item in as_array(value) {
                let object = self.object_term(item);
                self.add(subject.clone(), predicate.clone(), object);
            }
        }

        subject
    }

    fn object_term(&mut self, value: &Value) -> Term {
        match value {
            Value::Object(_) => self.node_term(value),
            // vocabulary references occasionally arrive as plain strings
            Value::String(text) => Term::Literal(normalize_iri(text)),
            other => Term::Literal(scalar_text(other)),
        }
    }

    fn add(&mut self, subject: Term, predicate: String, object: Term) {
        self.triples.push(Triple {
            subject,
            predicate,
            object,
        });
    }
}

fn as_array(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Extract catalog-level descriptive metadata: for every catalog-typed
/// node, title/description/language/url each take the first non-empty
/// candidate predicate, publishers expand into name and country, and
/// contained services are inferred through graph reachability. Earlier
/// catalogs win; later ones fill only absent fields.
pub fn extract_catalog_metadata(graph: &Graph) -> SelfHostedRecord {
    let mut record = SelfHostedRecord::default();

    for catalog in catalog_nodes(graph) {
        if record.resource_type.is_empty() {
            record.resource_type = graph
                .objects(&catalog, RDF_TYPE)
                .iter()
                .filter_map(|object| object.iri())
                .map(str::to_string)
                .collect();
        }
        if record.title.is_none() {
            record.title = graph.first_text(&catalog, &[DCTERMS_TITLE, SCHEMA_NAME, FOAF_NAME]);
        }
        if record.description.is_none() {
            record.description = graph.first_text(
                &catalog,
                &[
                    DCTERMS_DESCRIPTION,
                    SCHEMA_DESCRIPTION,
                    SCHEMA_DISAMBIGUATING_DESCRIPTION,
                ],
            );
        }
        if record.language.is_none() {
            record.language = graph.first_text(&catalog, &[DCTERMS_LANGUAGE, SCHEMA_IN_LANGUAGE]);
        }
        if record.url.is_none() {
            record.url = graph
                .first_text(&catalog, &[SCHEMA_URL, FOAF_HOMEPAGE, DC_IDENTIFIER])
                .or_else(|| catalog.iri().map(str::to_string));
        }
        if record.publisher.is_empty() && record.country.is_empty() {
            let (publishers, countries) = extract_publishers(graph, &catalog);
            record.publisher = publishers;
            record.country = countries;
        }
    }

    record.services = extract_contained_services(graph);
    record
}

fn catalog_nodes(graph: &Graph) -> Vec<Term> {
    let mut nodes = graph.subjects_with_type(DCAT_CATALOG);
    for node in graph.subjects_with_type(SCHEMA_DATA_CATALOG) {
        if !nodes.contains(&node) {
            nodes.push(node);
        }
    }
    nodes
}

/// Publisher names and countries for one catalog. The country comes
/// from the publisher's address node when present, else from the
/// publisher node itself (vCard then schema.org spelling).
fn extract_publishers(graph: &Graph, catalog: &Term) -> (Vec<String>, Vec<String>) {
    let mut names = Vec::new();
    let mut countries = Vec::new();

    let mut publishers = graph.objects(catalog, DCTERMS_PUBLISHER);
    if publishers.is_empty() {
        publishers = graph.objects(catalog, SCHEMA_PUBLISHER);
    }

    for publisher in publishers {
        if let Term::Literal(text) = publisher {
            let text = text.trim();
            if !text.is_empty() {
                names.push(text.to_string());
            }
            continue;
        }
        if let Some(name) = graph.first_text(publisher, &[FOAF_NAME, SCHEMA_NAME]) {
            names.push(name);
        }
        let address = graph
            .first_object(publisher, SCHEMA_ADDRESS)
            .unwrap_or(publisher);
        if let Some(country) =
            graph.first_text(address, &[VCARD_COUNTRY_NAME, SCHEMA_ADDRESS_COUNTRY])
        {
            countries.push(country);
        }
    }

    (names, countries)
}

/// Report every service node contained in a catalog. Containment is
/// established by walking the graph backward along incoming edges of
/// any predicate until a catalog-typed node is reached; a visited set
/// bounds the search so cycles terminate.
pub fn extract_contained_services(graph: &Graph) -> Vec<ServiceDescriptor> {
    let mut services = Vec::new();
    for service in graph.subjects_with_type(SCHEMA_SERVICE) {
        if !is_contained_in_catalog(graph, &service) {
            continue;
        }
        let endpoint_uri = match service.iri() {
            Some(iri) => iri.to_string(),
            None => match graph.first_text(&service, &[SCHEMA_URL]) {
                Some(url) => url,
                None => continue,
            },
        };
        services.push(ServiceDescriptor {
            endpoint_uri,
            source: SERVICE_SOURCE_JSONLD.to_string(),
            conforms_to: graph.first_text(&service, &[DCTERMS_CONFORMS_TO]),
            service_desc: None,
            title: graph.first_text(&service, &[DCTERMS_TITLE, SCHEMA_NAME]),
            description: graph.first_text(&service, &[DCTERMS_DESCRIPTION, SCHEMA_DESCRIPTION]),
            output_format: graph.first_text(&service, &[SCHEMA_ENCODING_FORMAT, DCTERMS_FORMAT]),
        });
    }
    services
}

/// Depth-first search from `node` along incoming edges, succeeding on
/// the first catalog-typed ancestor.
pub fn is_contained_in_catalog(graph: &Graph, node: &Term) -> bool {
    let mut visited: HashSet<Term> = HashSet::new();
    let mut stack = vec![node.clone()];
    while let Some(current) = stack.pop() {
        if !visited.insert(current.clone()) {
            continue;
        }
        if graph.has_type(&current, &[DCAT_CATALOG, SCHEMA_DATA_CATALOG]) {
            return true;
        }
        for parent in graph.subjects_pointing_to(&current) {
            if !visited.contains(parent) {
                stack.push(parent.clone());
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn graph_of(doc: Value) -> Graph {
        Graph::from_jsonld(&doc.to_string()).unwrap()
    }

    #[test]
    fn test_insecure_scheme_is_normalized() {
        let graph = graph_of(json!({
            "@context": "http://schema.org",
            "@id": "https://example.org/",
            "@type": "DataCatalog",
            "name": "Example Catalog"
        }));

        let catalog = Term::Iri("https://example.org/".to_string());
        // the predicate is retrievable via the secure scheme only
        assert_eq!(
            graph.first_text(&catalog, &[SCHEMA_NAME]).as_deref(),
            Some("Example Catalog")
        );
        assert!(graph.has_type(&catalog, &[SCHEMA_DATA_CATALOG]));
    }

    #[test]
    fn test_normalize_iri_leaves_lookalike_hosts_alone() {
        assert_eq!(
            normalize_iri("http://schema.org/name"),
            "https://schema.org/name"
        );
        assert_eq!(
            normalize_iri("http://schema.organisation.example/x"),
            "http://schema.organisation.example/x"
        );
    }

    #[test]
    fn test_curie_and_term_expansion() {
        let graph = graph_of(json!({
            "@context": {
                "dcterms": "http://purl.org/dc/terms/",
                "name": "https://schema.org/name"
            },
            "@id": "https://example.org/",
            "dcterms:title": "Titled",
            "name": "Named"
        }));

        let node = Term::Iri("https://example.org/".to_string());
        assert_eq!(
            graph.first_text(&node, &[DCTERMS_TITLE]).as_deref(),
            Some("Titled")
        );
        assert_eq!(
            graph.first_text(&node, &[SCHEMA_NAME]).as_deref(),
            Some("Named")
        );
    }

    #[test]
    fn test_catalog_extraction_with_publisher_country() {
        let graph = graph_of(json!({
            "@context": "https://schema.org",
            "@graph": [
                {
                    "@id": "https://example.org/",
                    "@type": "DataCatalog",
                    "name": "Earth Data",
                    "description": "Environmental research data",
                    "inLanguage": "en",
                    "url": "https://example.org/",
                    "publisher": {
                        "@type": "Organization",
                        "name": "Example Institute",
                        "address": {
                            "@type": "PostalAddress",
                            "addressCountry": "DEU"
                        }
                    }
                }
            ]
        }));

        let record = extract_catalog_metadata(&graph);
        assert_eq!(record.title.as_deref(), Some("Earth Data"));
        assert_eq!(
            record.description.as_deref(),
            Some("Environmental research data")
        );
        assert_eq!(record.language.as_deref(), Some("en"));
        assert_eq!(record.url.as_deref(), Some("https://example.org/"));
        assert_eq!(record.publisher, vec!["Example Institute"]);
        assert_eq!(record.country, vec!["DEU"]);
        assert!(record
            .resource_type
            .contains(&SCHEMA_DATA_CATALOG.to_string()));
    }

    #[test]
    fn test_catalog_url_falls_back_to_own_iri() {
        let graph = graph_of(json!({
            "@context": "https://schema.org",
            "@id": "https://example.org/catalog",
            "@type": "DataCatalog",
            "name": "No URL property"
        }));
        let record = extract_catalog_metadata(&graph);
        assert_eq!(record.url.as_deref(), Some("https://example.org/catalog"));
    }

    #[test]
    fn test_service_contained_across_two_hops() {
        let graph = graph_of(json!({
            "@context": "https://schema.org",
            "@graph": [
                {
                    "@id": "https://example.org/",
                    "@type": "DataCatalog",
                    "hasPart": {"@id": "https://example.org/apis"}
                },
                {
                    "@id": "https://example.org/apis",
                    "offers": {"@id": "https://example.org/api/search"}
                },
                {
                    "@id": "https://example.org/api/search",
                    "@type": "Service",
                    "name": "Search API",
                    "encodingFormat": "application/json"
                }
            ]
        }));

        let services = extract_contained_services(&graph);
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].endpoint_uri, "https://example.org/api/search");
        assert_eq!(services[0].title.as_deref(), Some("Search API"));
        assert_eq!(services[0].output_format.as_deref(), Some("application/json"));
        assert_eq!(services[0].source, "jsonld");
    }

    #[test]
    fn test_service_without_catalog_path_is_excluded() {
        let graph = graph_of(json!({
            "@context": "https://schema.org",
            "@graph": [
                {
                    "@id": "https://example.org/",
                    "@type": "DataCatalog",
                    "name": "Catalog"
                },
                {
                    "@id": "https://example.org/api/orphan",
                    "@type": "Service",
                    "name": "Orphan API"
                }
            ]
        }));
        assert!(extract_contained_services(&graph).is_empty());
    }

    #[test]
    fn test_containment_search_terminates_on_cycles() {
        let graph = graph_of(json!({
            "@context": "https://schema.org",
            "@graph": [
                {
                    "@id": "https://example.org/a",
                    "relatedLink": {"@id": "https://example.org/b"}
                },
                {
                    "@id": "https://example.org/b",
                    "relatedLink": {"@id": "https://example.org/a"}
                },
                {
                    "@id": "https://example.org/a",
                    "mainEntity": {"@id": "https://example.org/api"}
                },
                {
                    "@id": "https://example.org/api",
                    "@type": "Service"
                }
            ]
        }));

        // a <-> b cycle with no catalog anywhere: must terminate, empty
        assert!(extract_contained_services(&graph).is_empty());
    }

    #[test]
    fn test_blank_node_publisher_from_nested_object() {
        let graph = graph_of(json!({
            "@context": "https://schema.org",
            "@id": "https://example.org/",
            "@type": "DataCatalog",
            "publisher": {"name": "Anonymous Org", "addressCountry": "FRA"}
        }));
        let record = extract_catalog_metadata(&graph);
        assert_eq!(record.publisher, vec!["Anonymous Org"]);
        assert_eq!(record.country, vec!["FRA"]);
    }

    #[test]
    fn test_unparseable_document_is_an_error() {
        assert!(Graph::from_jsonld("{not json").is_err());
    }

    #[test]
    fn test_literal_publisher_string() {
        let graph = graph_of(json!({
            "@context": "https://schema.org",
            "@id": "https://example.org/",
            "@type": "DataCatalog",
            "publisher": "Plain Text Org"
        }));
        let record = extract_catalog_metadata(&graph);
        assert_eq!(record.publisher, vec!["Plain Text Org"]);
    }
}
