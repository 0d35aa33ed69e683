#![no_main]

use libfuzzer_sys::fuzz_target;
use topbot::{AlleleCall, PipelineConfig, RecordPipeline, StrandOracle, strand::OracleError};

struct Constant;

impl StrandOracle for Constant {
    fn resolve_strand(
        &self,
        _chromosome: &str,
        _position: u64,
        alleles: AlleleCall,
    ) -> Result<String, OracleError> {
        Ok(if alleles.a == alleles.b { "ERROR_same" } else { "BOT" }.to_string())
    }
}

fuzz_target!(|data: &[u8]| {
    let config = PipelineConfig {
        short_names: data.first().is_some_and(|b| b & 1 == 1),
        ..PipelineConfig::default()
    };
    let Ok(mut pipeline) = RecordPipeline::new(config, Constant) else {
        return;
    };

    // Config errors from an unexpected header are fine; panics are not.
    let mut out = Vec::new();
    if pipeline.run(data, &mut out).is_ok()
        && let Ok(summary) = pipeline.finish(&mut out)
    {
        assert_eq!(summary.ledger.total(), summary.data_records);
        let _ = summary.ledger.summarize();
    }
});
