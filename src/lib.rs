//! Repository Profile Harvester
//!
//! This library builds one canonical profile for a research data
//! repository by combining three independent metadata sources:
//!
//! 1. What the repository publishes about itself: HTML head links, the
//!    HTTP `Link` header, linkset documents, embedded and linked
//!    JSON-LD, and plain HTML meta tags (signposting + linked data).
//! 2. The re3data.org XML registry, searched by hostname.
//! 3. The FAIRsharing JSON registry, bearer-authenticated and searched
//!    by the hostname's second-level label.
//!
//! Each source fills its own namespace in a harvested bag; the mapper
//! reconciles the bag into the canonical record with explicit per-field
//! priority, union, and concatenation rules. Any source may be
//! unreachable, malformed, or ambiguous: failures are source-local and
//! degrade the output instead of aborting the harvest.
//!
//! # Usage
//!
//! ```ignore
//! use repo_harvester::{harvest, HarvestOptions, Orchestrator};
//!
//! // one-shot, with FAIRsharing credentials from the environment
//! let record = harvest("https://www.pangaea.de/")?;
//! println!("{}", serde_json::to_string_pretty(&record)?);
//!
//! // or with explicit options and per-source snapshots
//! let orchestrator = Orchestrator::new(HarvestOptions::from_env())?;
//! let outcome = orchestrator.harvest_observed("https://www.pangaea.de/", &mut |source, raw| {
//!     eprintln!("{source}: {raw}");
//! })?;
//! ```

pub mod bag;
pub mod error;
pub mod fetch;
pub mod harvesters;
pub mod jsonld;
pub mod mapper;
pub mod markup;
pub mod signposting;
pub mod vocab;

// Re-export main types for convenience
pub use crate::bag::{
    FairsharingRecord, HarvestedBag, Re3DataRecord, SelfHostedRecord, ServiceDescriptor,
    SourceOutput,
};
pub use crate::error::HarvestError;
pub use crate::harvesters::fairsharing::Credentials;
pub use crate::harvesters::{HarvestOptions, HarvestOutcome, Orchestrator, Source};
pub use crate::jsonld::Graph;
pub use crate::mapper::{reconcile, CanonicalMetadata, CanonicalRecord, PolicyEntry};
pub use crate::signposting::{Signposting, TypedLink};

/// Harvest one repository into its canonical record, reading
/// FAIRsharing credentials from the environment.
pub fn harvest(repository_url: &str) -> Result<CanonicalRecord, HarvestError> {
    Orchestrator::new(HarvestOptions::from_env())?.harvest(repository_url)
}
