use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

use crate::strand::StrandResult;

/// Per-run tally of successful calls and of each distinct error code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorLedger {
    successes: u64,
    errors: BTreeMap<String, u64>,
}

impl ErrorLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, code: &str) {
        if let Some(count) = self.errors.get_mut(code) {
            *count += 1;
        } else {
            self.errors.insert(code.to_string(), 1);
        }
    }

    pub fn record_success(&mut self) {
        self.successes += 1;
    }

    pub fn record_result(&mut self, result: &StrandResult) {
        match result.error_code() {
            Some(code) => self.record(code),
            None => self.record_success(),
        }
    }

    pub fn successes(&self) -> u64 {
        self.successes
    }

    pub fn error_count(&self, code: &str) -> u64 {
        self.errors.get(code).copied().unwrap_or(0)
    }

    pub fn total_errors(&self) -> u64 {
        self.errors.values().sum()
    }

    /// Successes plus errors: every data record lands in exactly one of the two.
    pub fn total(&self) -> u64 {
        self.successes + self.total_errors()
    }

    /// Error codes in lexicographic order.
    pub fn errors(&self) -> impl Iterator<Item = (&str, u64)> {
        self.errors.iter().map(|(code, &count)| (code.as_str(), count))
    }

    /// Human-readable report, codes aligned on the longest one.
    pub fn summarize(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Successful calls: {}", self.successes);
        let _ = writeln!(out, "Errors: {}", self.total_errors());
        let width = self.errors.keys().map(String::len).max().unwrap_or(0);
        for (code, count) in self.errors() {
            let _ = writeln!(out, "  {code:<width$}  {count}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strand::Strand;

    #[test]
    fn counts_are_partitioned() {
        let mut ledger = ErrorLedger::new();
        ledger.record_result(&StrandResult::Oriented(Strand::Top));
        ledger.record_result(&StrandResult::Error(String::from("ERROR_not_AGCT")));
        ledger.record("ERROR_not_AGCT");
        ledger.record("ERROR_ambiguous");

        assert_eq!(ledger.successes(), 1);
        assert_eq!(ledger.error_count("ERROR_not_AGCT"), 2);
        assert_eq!(ledger.error_count("ERROR_missing"), 0);
        assert_eq!(ledger.total_errors(), 3);
        assert_eq!(ledger.total(), 4);
    }

    #[test]
    fn summary_is_sorted_and_aligned() {
        let mut ledger = ErrorLedger::new();
        ledger.record_success();
        ledger.record_success();
        ledger.record("ERROR_not_AGCT");
        ledger.record("ERROR_b");
        ledger.record("ERROR_not_AGCT");

        assert_eq!(
            ledger.summarize(),
            "Successful calls: 2\nErrors: 3\n  ERROR_b         1\n  ERROR_not_AGCT  2\n"
        );
    }

    #[test]
    fn empty_summary_still_reports_counts() {
        let ledger = ErrorLedger::new();
        assert_eq!(ledger.summarize(), "Successful calls: 0\nErrors: 0\n");
    }
}
