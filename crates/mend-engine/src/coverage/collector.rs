//! Coverage collection for one test-case run.

use mend_core::FxHashSet;

use crate::runtime::TraceSink;

/// A coverage event: the executing function and the 1-based source line.
pub type CoverageEvent = (String, u32);

/// Records the set of `(function, line)` events one run touched.
#[derive(Debug, Default)]
pub struct CoverageCollector {
    events: FxHashSet<CoverageEvent>,
}

impl CoverageCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &FxHashSet<CoverageEvent> {
        &self.events
    }

    pub fn into_events(self) -> FxHashSet<CoverageEvent> {
        self.events
    }
}

impl TraceSink for CoverageCollector {
    fn event(&mut self, function: &str, line: u32) {
        self.events.insert((function.to_string(), line));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_deduplicate_per_run() {
        let mut collector = CoverageCollector::new();
        collector.event("f", 3);
        collector.event("f", 3);
        collector.event("f", 4);
        assert_eq!(collector.events().len(), 2);
    }
}
