//! Base implementation shared by the analyzers that call external services.
//!
//! Every external call in the pipeline goes through [`BaseAnalyzer::guarded`],
//! which applies the fail-fast timeout and reports timeouts as ordinary
//! errors so callers handle both the same way.

use crate::analyzers::Analyzer;
use crate::types::*;
use std::future::Future;
use std::time::Duration;

/// Composition base for service-backed analyzers
#[derive(Debug, Clone)]
pub struct BaseAnalyzer {
    name: String,
    timeout: Duration,
}

impl BaseAnalyzer {
    pub fn new(name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run one external call under this analyzer's timeout
    pub async fn guarded<T, F>(&self, call: F) -> TriageResult<T>
    where
        F: Future<Output = TriageResult<T>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(TriageError::timeout(self.name.clone(), self.timeout)),
        }
    }
}

impl Analyzer for BaseAnalyzer {
    fn name(&self) -> &str {
        &self.name
    }
}
