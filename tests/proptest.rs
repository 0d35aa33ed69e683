use proptest::prelude::*;
use topbot::{
    AlleleCall, Base, PipelineConfig, RecordPipeline, RunSummary, StrandOracle,
    alleles::scan_combined, strand::OracleError,
};

/// TOP for distinct alleles, an error code otherwise.
struct DistinctIsTop;

impl StrandOracle for DistinctIsTop {
    fn resolve_strand(
        &self,
        _chromosome: &str,
        _position: u64,
        alleles: AlleleCall,
    ) -> Result<String, OracleError> {
        Ok(if alleles.a == alleles.b {
            String::from("ERROR_same")
        } else {
            String::from("TOP")
        })
    }
}

fn allele() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["A", "C", "G", "T", "N", "X", "AG", ""])
}

fn rows() -> impl Strategy<Value = Vec<(u32, &'static str, &'static str)>> {
    proptest::collection::vec((1u32..1_000_000, allele(), allele()), 0..40)
}

fn render(rows: &[(u32, &str, &str)]) -> Vec<String> {
    rows.iter()
        .map(|(pos, a, b)| format!("1\t{pos}\t{a}\t{b}"))
        .collect()
}

fn annotate(config: PipelineConfig, lines: &[String]) -> (Vec<String>, RunSummary) {
    let mut input = String::from("chrom\tposition\tA\tB\n");
    for line in lines {
        input.push_str(line);
        input.push('\n');
    }
    let mut pipeline = RecordPipeline::new(config, DistinctIsTop).unwrap();
    let mut out = Vec::new();
    pipeline.run(input.as_bytes(), &mut out).unwrap();
    let summary = pipeline.finish(&mut out).unwrap();
    let out = String::from_utf8(out).unwrap();
    (out.lines().skip(1).map(str::to_string).collect(), summary)
}

proptest! {
    #[test]
    fn every_record_is_counted_once(rows in rows(), filter in any::<bool>()) {
        let lines = render(&rows);
        let config = PipelineConfig { filter_errors: filter, ..PipelineConfig::default() };
        let (out, summary) = annotate(config, &lines);

        prop_assert_eq!(summary.data_records, lines.len() as u64);
        prop_assert_eq!(summary.ledger.total(), lines.len() as u64);
        let expected = if filter {
            summary.ledger.successes()
        } else {
            lines.len() as u64
        };
        prop_assert_eq!(out.len() as u64, expected);
        prop_assert_eq!(summary.emitted_records, expected);
    }

    #[test]
    fn insertion_keeps_other_fields_in_order(rows in rows(), insert_at in 0usize..=4) {
        let lines = render(&rows);
        let config = PipelineConfig { insert_at: Some(insert_at), ..PipelineConfig::default() };
        let (out, _) = annotate(config, &lines);

        prop_assert_eq!(out.len(), lines.len());
        for (annotated, original) in out.iter().zip(&lines) {
            let mut fields: Vec<&str> = annotated.split('\t').collect();
            let inserted = fields.remove(insert_at);
            prop_assert!(inserted == "TOP" || inserted.starts_with("ERROR"));
            prop_assert_eq!(fields.join("\t"), original.clone());
        }
    }

    #[test]
    fn combined_scan_ignores_non_bases(
        prefix in "[^ACGT]{0,4}",
        middle in "[^ACGT]{0,4}",
        suffix in "[^ACGT]{0,4}",
    ) {
        let raw = format!("{prefix}A{middle}G{suffix}");
        prop_assert_eq!(scan_combined(&raw).unwrap(), AlleleCall::new(Base::A, Base::G));
    }

    #[test]
    fn combined_scan_rejects_three_bases(
        bases in proptest::collection::vec(prop::sample::select(vec!['A', 'C', 'G', 'T']), 3..6),
    ) {
        let raw: String = bases.into_iter().collect();
        prop_assert!(scan_combined(&raw).is_err());
    }
}
