use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use crate::{
    column::{AlleleColumns, ColumnId, ColumnRoles},
    config::{DEFAULT_COLUMN_NAME, DEFAULT_COMMENT, PipelineConfig},
    input::{STDIN, open_input},
    pipeline::RecordPipeline,
    reference::ReferenceGenome,
    report::RunReport,
    topbot::ReferenceOracle,
};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Annotate a delimited variant table with Illumina TOP/BOT strand codes",
    long_about = None
)]
struct Cli {
    /// Input tables, read in order as one stream (stdin when omitted or `-`)
    #[arg(value_name = "INPUT")]
    inputs: Vec<PathBuf>,

    /// Reference genome FASTA
    #[arg(long = "ref", value_name = "FASTA")]
    reference: PathBuf,

    /// Optional explicit FASTA index (.fai) path
    #[arg(long = "ref-fai", value_name = "FAI")]
    reference_fai: Option<PathBuf>,

    /// Field delimiter (`\t` is accepted for tab)
    #[arg(long = "delim", default_value = "\t", hide_default_value = true)]
    delimiter: String,

    /// Input has no header line; all columns must be given as indices
    #[arg(long)]
    noheader: bool,

    /// Chromosome column (name or 0-based index)
    #[arg(long, value_name = "COL", default_value = "chrom")]
    chrom: ColumnId,

    /// Position column (name or 0-based index)
    #[arg(long, value_name = "COL", default_value = "position")]
    position: ColumnId,

    /// First allele column [default: A]
    #[arg(long = "A", value_name = "COL", requires = "allele_b", conflicts_with = "allele_ab")]
    allele_a: Option<ColumnId>,

    /// Second allele column [default: B]
    #[arg(long = "B", value_name = "COL", requires = "allele_a", conflicts_with = "allele_ab")]
    allele_b: Option<ColumnId>,

    /// Single column holding both alleles, e.g. `[A/G]`
    #[arg(long = "AB", value_name = "COL")]
    allele_ab: Option<ColumnId>,

    /// 0-based index at which to insert the strand column [default: append]
    #[arg(long = "insertcol", value_name = "INDEX")]
    insert_col: Option<usize>,

    /// Emit T/B instead of TOP/BOT
    #[arg(long)]
    short: bool,

    /// Header of the inserted column
    #[arg(long = "colname", default_value = DEFAULT_COLUMN_NAME)]
    column_name: String,

    /// Drop records whose strand could not be determined
    #[arg(long)]
    filter: bool,

    /// Comment marker; lines starting with it are ignored (empty disables)
    #[arg(long, default_value = DEFAULT_COMMENT)]
    comment: String,

    /// Number of leading lines to discard
    #[arg(long, value_name = "N", default_value_t = 0)]
    skip: usize,

    /// Prefix added to chromosome names before reference lookup
    #[arg(long = "chrprefix", value_name = "PREFIX", default_value = "")]
    chrom_prefix: String,

    /// Write a JSON run report to this path
    #[arg(long, value_name = "JSON")]
    report: Option<PathBuf>,

    /// Logging verbosity (e.g. error, warn, info, debug)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl Cli {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let alleles = match (&self.allele_ab, &self.allele_a, &self.allele_b) {
            (Some(ab), None, None) => AlleleColumns::Combined(ab.clone()),
            (None, Some(a), Some(b)) => AlleleColumns::Split {
                a: a.clone(),
                b: b.clone(),
            },
            (None, None, None) => ColumnRoles::default().alleles,
            (Some(_), _, _) => bail!("--AB cannot be combined with --A/--B"),
            (None, _, _) => bail!("--A and --B must be given together"),
        };

        let config = PipelineConfig {
            delimiter: unescape_delimiter(&self.delimiter),
            has_header: !self.noheader,
            columns: ColumnRoles {
                chromosome: self.chrom.clone(),
                position: self.position.clone(),
                alleles,
            },
            insert_at: self.insert_col,
            short_names: self.short,
            column_name: self.column_name.clone(),
            filter_errors: self.filter,
            comment: Some(self.comment.clone()).filter(|marker| !marker.is_empty()),
            skip: self.skip,
            chrom_prefix: self.chrom_prefix.clone(),
        };
        config.validate()?;
        Ok(config)
    }

    fn input_paths(&self) -> Vec<PathBuf> {
        if self.inputs.is_empty() {
            vec![PathBuf::from(STDIN)]
        } else {
            self.inputs.clone()
        }
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let config = cli.pipeline_config()?;
    let inputs = cli.input_paths();

    tracing::info!(
        reference = %cli.reference.display(),
        inputs = inputs.len(),
        header = config.has_header,
        "starting annotation",
    );

    let genome = ReferenceGenome::open(&cli.reference, cli.reference_fai.clone())
        .with_context(|| format!("failed to open reference {}", cli.reference.display()))?;
    tracing::info!(
        path = %genome.path().display(),
        contigs = genome.contigs().len(),
        "reference opened",
    );
    let mut pipeline = RecordPipeline::new(config, ReferenceOracle::new(genome))?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for path in &inputs {
        let reader = open_input(path)?;
        pipeline
            .run(reader, &mut out)
            .with_context(|| format!("failed to annotate {}", path.display()))?;
    }
    let config = pipeline.config().clone();
    let summary = pipeline.finish(&mut out).context("failed to write output")?;
    drop(out);

    eprint!("{}", summary.ledger.summarize());

    if let Some(path) = &cli.report {
        let inputs = inputs.iter().map(|p| display_name(p)).collect();
        RunReport::new(inputs, &cli.reference, &config, &summary)
            .write(path)
            .with_context(|| format!("failed to write report {}", path.display()))?;
    }

    io::stderr().flush().ok();
    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init()
        .ok();
    Ok(())
}

fn unescape_delimiter(raw: &str) -> String {
    match raw {
        "\\t" => String::from("\t"),
        _ => raw.to_string(),
    }
}

fn display_name(path: &Path) -> String {
    if path.as_os_str() == STDIN {
        String::from("<stdin>")
    } else {
        path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("topbot").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_documented_options() {
        let cli = parse(&["--ref", "ref.fa", "table.tsv"]);
        let config = cli.pipeline_config().unwrap();
        assert_eq!(config.delimiter, "\t");
        assert!(config.has_header);
        assert_eq!(config.columns, ColumnRoles::default());
        assert_eq!(config.column_name, "TOPBOT");
        assert_eq!(config.comment.as_deref(), Some("#"));
        assert_eq!(config.insert_at, None);
        assert_eq!(cli.input_paths(), vec![PathBuf::from("table.tsv")]);
    }

    #[test]
    fn missing_inputs_mean_stdin() {
        let cli = parse(&["--ref", "ref.fa"]);
        assert_eq!(cli.input_paths(), vec![PathBuf::from("-")]);
    }

    #[test]
    fn reference_is_required() {
        assert!(Cli::try_parse_from(["topbot", "table.tsv"]).is_err());
    }

    #[test]
    fn combined_allele_column_conflicts_with_split() {
        assert!(Cli::try_parse_from(["topbot", "--ref", "r.fa", "--AB", "snp", "--A", "x", "--B", "y"]).is_err());
        assert!(Cli::try_parse_from(["topbot", "--ref", "r.fa", "--A", "x"]).is_err());
        let cli = parse(&["--ref", "r.fa", "--AB", "snp"]);
        assert_eq!(
            cli.pipeline_config().unwrap().columns.alleles,
            AlleleColumns::Combined(ColumnId::name("snp"))
        );
    }

    #[test]
    fn noheader_with_indices() {
        let cli = parse(&[
            "--ref", "r.fa", "--noheader", "--chrom", "0", "--position", "1", "--A", "2", "--B",
            "3", "--insertcol", "0", "--delim", "\\t",
        ]);
        let config = cli.pipeline_config().unwrap();
        assert!(!config.has_header);
        assert_eq!(config.insert_at, Some(0));
        assert_eq!(config.delimiter, "\t");
        assert_eq!(config.columns.chromosome, ColumnId::Index(0));
    }

    #[test]
    fn noheader_with_names_is_a_config_error() {
        let cli = parse(&["--ref", "r.fa", "--noheader"]);
        let err = cli.pipeline_config().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::NamedColumnWithoutHeader { .. })
        ));
    }

    #[test]
    fn non_integer_skip_is_rejected() {
        assert!(Cli::try_parse_from(["topbot", "--ref", "r.fa", "--skip", "two"]).is_err());
        assert!(Cli::try_parse_from(["topbot", "--ref", "r.fa", "--insertcol", "-1"]).is_err());
    }

    #[test]
    fn empty_comment_disables_comments() {
        let cli = parse(&["--ref", "r.fa", "--comment", ""]);
        assert_eq!(cli.pipeline_config().unwrap().comment, None);
    }

    #[test]
    fn empty_delimiter_is_rejected() {
        let cli = parse(&["--ref", "r.fa", "--delim", ""]);
        assert!(cli.pipeline_config().is_err());
    }
}
