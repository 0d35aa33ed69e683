use std::{fs, path::PathBuf};

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use tempfile::tempdir;
use topbot::{
    AlleleColumns, ColumnId, ColumnRoles, PipelineConfig, RecordPipeline, ReferenceGenome,
    ReferenceOracle, StrandOracle, alleles::scan_combined,
};

fn create_reference(sequence: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ref.fa");
    fs::write(&path, format!(">chr1\n{}\n", sequence)).unwrap();
    (dir, path)
}

fn create_table(records: usize, alleles: &[&str]) -> String {
    let mut content = String::from("chrom\tposition\tAB\n");
    for i in 1..=records {
        let pair = alleles[i % alleles.len()];
        content.push_str(&format!("1\t{}\t[{}]\n", 100 + i, pair));
    }
    content
}

fn combined_config() -> PipelineConfig {
    PipelineConfig {
        columns: ColumnRoles {
            alleles: AlleleColumns::Combined(ColumnId::name("AB")),
            ..ColumnRoles::default()
        },
        ..PipelineConfig::default()
    }
}

fn bench_designation(c: &mut Criterion) {
    let sequence = "ACGGTCAT".repeat(1024);
    let (_dir, reference_path) = create_reference(&sequence);
    let oracle = ReferenceOracle::new(ReferenceGenome::open(&reference_path, None).unwrap());
    let unambiguous = scan_combined("A/G").unwrap();
    let ambiguous = scan_combined("A/T").unwrap();

    c.bench_function("designate_unambiguous", |b| {
        b.iter(|| {
            for pos in (8..4096).step_by(8) {
                black_box(oracle.resolve_strand("1", pos, unambiguous).unwrap());
            }
        });
    });

    c.bench_function("designate_ambiguous", |b| {
        b.iter(|| {
            for pos in (5..4096).step_by(8) {
                black_box(oracle.resolve_strand("1", pos, ambiguous).unwrap());
            }
        });
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let sequence = "ACGGTCAT".repeat(1024);
    let (_dir, reference_path) = create_reference(&sequence);
    let genome = ReferenceGenome::open(&reference_path, None).unwrap();
    let table = create_table(5_000, &["A/G", "C/T", "A/T", "G/G", "N/A"]);

    c.bench_function("annotate_5k_records", |b| {
        b.iter_batched(
            || RecordPipeline::new(combined_config(), ReferenceOracle::new(genome.clone())).unwrap(),
            |mut pipeline| {
                let mut out = Vec::with_capacity(table.len() * 2);
                pipeline.run(table.as_bytes(), &mut out).unwrap();
                black_box(pipeline.finish(&mut out).unwrap());
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_designation, bench_pipeline);
criterion_main!(benches);
