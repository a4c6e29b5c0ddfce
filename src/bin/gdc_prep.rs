use std::process::ExitCode;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use gdc_cohort_prep::app::{App, PrepareOutputs, PrepareResult};
use gdc_cohort_prep::config::ConfigLoader;
use gdc_cohort_prep::error::PrepError;
use gdc_cohort_prep::gdc::GdcHttpClient;
use gdc_cohort_prep::organize::{ExtensionRewrite, Modality, OrganizePlan};
use gdc_cohort_prep::output::{JsonOutput, OutputMode};

#[derive(Parser)]
#[command(name = "gdc-prep")]
#[command(about = "Prepare a multi-modal TCGA cohort: reconcile GDC metadata, generate manifests, organize downloads")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Fetch metadata, write clinical data and transfer manifests")]
    Prepare(PrepareArgs),
    #[command(about = "Relocate downloaded files into the per-case layout")]
    Organize(OrganizeArgs),
}

#[derive(Args)]
struct PrepareArgs {
    #[arg(long)]
    reports_path: Utf8PathBuf,

    #[arg(long)]
    clinical_data: Utf8PathBuf,

    #[arg(long)]
    expr_manifest: Utf8PathBuf,

    #[arg(long)]
    hist_manifest: Option<Utf8PathBuf>,
}

#[derive(Args)]
struct OrganizeArgs {
    #[arg(long)]
    reports_path: Utf8PathBuf,

    #[arg(long)]
    downloaded_expr: Utf8PathBuf,

    #[arg(long)]
    downloaded_hist: Utf8PathBuf,

    #[arg(long)]
    organized_expr: Utf8PathBuf,

    #[arg(long)]
    organized_hist: Utf8PathBuf,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(prep) = report.downcast_ref::<PrepError>() {
            return ExitCode::from(map_exit_code(prep));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &PrepError) -> u8 {
    match error {
        PrepError::ConfigRead(_) | PrepError::ConfigParse(_) => 2,
        PrepError::GdcHttp(_) | PrepError::GdcStatus { .. } | PrepError::GdcParse(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let config = ConfigLoader::resolve(cli.config.as_deref()).into_diagnostic()?;
    let gdc = GdcHttpClient::new().into_diagnostic()?;
    let app = App::new(gdc, config);

    match cli.command {
        Commands::Prepare(args) => {
            let outputs = PrepareOutputs {
                clinical_data: args.clinical_data,
                expr_manifest: args.expr_manifest,
                hist_manifest: args.hist_manifest,
            };
            let result = app
                .prepare(args.reports_path.as_std_path(), &outputs)
                .into_diagnostic()?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_prepare(&result).into_diagnostic()?,
                OutputMode::Human => print_prepare_summary(&result),
            }
            Ok(())
        }
        Commands::Organize(args) => {
            let plans = [
                OrganizePlan {
                    modality: Modality::Expression,
                    source: args.downloaded_expr,
                    destination: args.organized_expr,
                    rewrite: None,
                },
                OrganizePlan {
                    modality: Modality::Histology,
                    source: args.downloaded_hist,
                    destination: args.organized_hist,
                    // histology slides arrive as precomputed tile embeddings
                    rewrite: Some(ExtensionRewrite::new(".svs", ".h5")),
                },
            ];
            let result = app
                .organize(
                    args.reports_path.as_std_path(),
                    &plans,
                    Utf8Path::new("."),
                )
                .into_diagnostic()?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_organize(&result).into_diagnostic()?,
                OutputMode::Human => {
                    for item in &result.items {
                        println!(
                            "{}: moved {} file(s), {} missing",
                            item.modality, item.moved, item.missing
                        );
                        if let Some(report) = &item.not_found_report {
                            println!("Some files were not found, list saved to {report}");
                        }
                    }
                }
            }
            Ok(())
        }
    }
}

fn print_prepare_summary(result: &PrepareResult) {
    println!();
    println!(
        "Using {} cases across all modalities",
        result.cases
    );
    println!();
    println!("Clinical data saved to {}", result.clinical_data);
    println!();
    println!("Expr manifest saved to {}", result.expr_manifest);
    if let Some(hist_manifest) = &result.hist_manifest {
        println!("Hist manifest saved to {hist_manifest}");
    }
    println!();
    println!("Use the manifests with the GDC Data Transfer Tool:");
    println!("https://gdc.cancer.gov/access-data/gdc-data-transfer-tool");
    println!();
    println!(
        "After the downloads complete, use the 'organize' mode \
         of this tool to cleanup the downloaded data"
    );
    println!();
}
