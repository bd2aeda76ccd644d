//! Source orchestration
//!
//! Runs the three metadata sources in canonical order over one
//! repository URL, collects their output into the harvested bag, and
//! reconciles the bag into the canonical record. Every source failure
//! is downgraded to "no contribution"; a harvest fails only on an
//! invalid input URL.

pub mod fairsharing;
pub mod re3data;
pub mod self_hosted;

use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::bag::{HarvestedBag, SourceOutput};
use crate::error::HarvestError;
use crate::fetch::Fetcher;
use crate::mapper::{reconcile, CanonicalRecord};
use crate::vocab::{NS_FAIRSHARING, NS_RE3DATA, NS_SELF_HOSTED};

use fairsharing::{Credentials, FairsharingSource};
use re3data::Re3DataSource;
use self_hosted::SelfHostedSource;

/// One metadata source. Each concrete source fetches and parses its own
/// upstream and returns a record under its namespace.
pub trait Source {
    fn harvest(&self, fetcher: &Fetcher, repository_url: &Url)
        -> Result<SourceOutput, HarvestError>;
}

/// Options for a harvest run.
#[derive(Debug, Default)]
pub struct HarvestOptions {
    /// FAIRsharing login; absence skips that source.
    pub fairsharing_credentials: Option<Credentials>,
}

impl HarvestOptions {
    /// Read FAIRsharing credentials from the environment.
    pub fn from_env() -> Self {
        HarvestOptions {
            fairsharing_credentials: Credentials::from_env(),
        }
    }
}

/// Everything one harvest run produced.
#[derive(Debug)]
pub struct HarvestOutcome {
    pub bag: HarvestedBag,
    pub record: CanonicalRecord,
}

/// Sequences the sources and the mapper. The source table fixes the
/// canonical evaluation order; reconciliation rules that are
/// order-sensitive rely on it.
pub struct Orchestrator {
    fetcher: Fetcher,
    sources: Vec<(&'static str, Box<dyn Source>)>,
}

impl Orchestrator {
    pub fn new(options: HarvestOptions) -> Result<Self, HarvestError> {
        let fetcher = Fetcher::new()?;
        let sources: Vec<(&'static str, Box<dyn Source>)> = vec![
            (NS_SELF_HOSTED, Box::new(SelfHostedSource)),
            (NS_RE3DATA, Box::new(Re3DataSource::new())),
            (
                NS_FAIRSHARING,
                Box::new(FairsharingSource::new(options.fairsharing_credentials)),
            ),
        ];
        Ok(Orchestrator { fetcher, sources })
    }

    /// Harvest one repository into its canonical record.
    pub fn harvest(&self, repository_url: &str) -> Result<CanonicalRecord, HarvestError> {
        self.harvest_observed(repository_url, &mut |_, _| {})
            .map(|outcome| outcome.record)
    }

    /// Harvest, handing each source's raw record to `observer` as it
    /// lands so callers can snapshot per-stage artifacts.
    pub fn harvest_observed(
        &self,
        repository_url: &str,
        observer: &mut dyn FnMut(&str, &Value),
    ) -> Result<HarvestOutcome, HarvestError> {
        let url = Url::parse(repository_url)
            .map_err(|_| HarvestError::InvalidUrl(repository_url.to_string()))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(HarvestError::InvalidUrl(repository_url.to_string()));
        }

        let mut bag = HarvestedBag::default();
        for (name, source) in &self.sources {
            info!(source = *name, "harvesting");
            match source.harvest(&self.fetcher, &url) {
                Ok(output) if !output.is_empty() => {
                    match output.raw() {
                        Ok(raw) => observer(name, &raw),
                        Err(e) => warn!(source = *name, "snapshot serialization failed: {e}"),
                    }
                    bag.insert(output);
                }
                Ok(_) => debug!(source = *name, "source returned an empty record"),
                Err(e) => warn!(source = *name, "source skipped: {e}"),
            }
        }

        let record = reconcile(&bag);
        Ok(HarvestOutcome { bag, record })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_is_rejected() {
        let orchestrator = Orchestrator::new(HarvestOptions::default()).unwrap();
        assert!(matches!(
            orchestrator.harvest("not a url"),
            Err(HarvestError::InvalidUrl(_))
        ));
        assert!(matches!(
            orchestrator.harvest("ftp://example.org/"),
            Err(HarvestError::InvalidUrl(_))
        ));
    }
}
