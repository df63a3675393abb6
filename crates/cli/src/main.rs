use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use invrec_core::assembler::check_references;
use invrec_core::fhir::Bundle;
use invrec_core::{
    compute_totals, flag_from_env_value, normalize_addresses, normalize_date,
    practitioner_from_env_values, reconcile, AttachmentSource, BuildInput, EngineConfig,
    EngineError, FeatureFlags, HttpSubmissionSink, InvoiceBundleEngine, InvoiceInput,
    PatientRecord, SubmissionConfig, SubmissionSink,
};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "invrec")]
#[command(about = "Invoice record bundle builder")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an invoice document bundle
    Build {
        /// Form input (JSON or YAML)
        #[arg(long)]
        input: PathBuf,
        /// File to attach (repeatable)
        #[arg(long = "attach")]
        attachments: Vec<PathBuf>,
        /// Write the bundle here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Post the bundle to INVREC_SUBMIT_URL after building
        #[arg(long)]
        submit: bool,
    },
    /// Parse a bundle file and check its locators and references
    Check {
        bundle: PathBuf,
    },
    /// Normalise a free-form date to YYYY-MM-DD
    NormaliseDate {
        value: String,
    },
    /// List a patient's health addresses, primary first
    HealthAddresses {
        /// Patient record (JSON or YAML)
        #[arg(long)]
        input: PathBuf,
    },
    /// Compute and reconcile invoice totals
    Totals {
        /// Invoice section (JSON or YAML)
        #[arg(long)]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("invrec=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Build {
            input,
            attachments,
            out,
            submit,
        }) => {
            let form: BuildInput = read_input(&input)?;
            let engine = InvoiceBundleEngine::new(engine_config_from_env()?);
            let sources = attachments.into_iter().map(AttachmentSource::path).collect();

            let assembled = match engine.build(&form, sources).await {
                Ok(assembled) => assembled,
                Err(EngineError::Validation(errors)) => {
                    for issue in errors.issues() {
                        eprintln!("- {issue}");
                    }
                    bail!("build refused with {} issue(s)", errors.len());
                }
                Err(e) => return Err(e).context("failed to build invoice bundle"),
            };

            let rendered = assembled.render()?;
            match &out {
                Some(path) => {
                    std::fs::write(path, &rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!(
                        "Wrote bundle {} ({} entries) to {}",
                        assembled.bundle.id,
                        assembled.bundle.entry.len(),
                        path.display()
                    );
                }
                None => println!("{rendered}"),
            }

            if submit {
                let sink = HttpSubmissionSink::new(submission_config_from_env()?)?;
                let outcome = sink.submit(&assembled.into_submission()).await;
                eprintln!("{}", serde_json::to_string_pretty(&outcome)?);
                if !outcome.is_success() {
                    bail!("submission to {} failed", sink.endpoint());
                }
            }
        }
        Some(Commands::Check { bundle }) => {
            let text = std::fs::read_to_string(&bundle)
                .with_context(|| format!("failed to read {}", bundle.display()))?;
            let parsed = Bundle::parse(&text)?;
            match check_references(&parsed) {
                Ok(()) => println!(
                    "Bundle {} is consistent ({} entries)",
                    parsed.id,
                    parsed.entry.len()
                ),
                Err(e) => bail!("bundle {} is inconsistent: {e}", parsed.id),
            }
        }
        Some(Commands::NormaliseDate { value }) => match normalize_date(&value) {
            Some(date) => println!("{date}"),
            None => eprintln!("Unrecognised date: {value}"),
        },
        Some(Commands::HealthAddresses { input }) => {
            let patient: PatientRecord = read_input(&input)?;
            let addresses = normalize_addresses(&patient);
            if addresses.is_empty() {
                println!("No health addresses found.");
            } else {
                for address in addresses {
                    println!("{}", address.display);
                }
            }
        }
        Some(Commands::Totals { input }) => {
            let invoice: InvoiceInput = read_input(&input)?;
            let computed =
                compute_totals(&invoice.lines).context("invoice amounts are out of range")?;
            let totals = reconcile(computed, &invoice.overrides);
            println!("{}", serde_json::to_string_pretty(&totals)?);
        }
        None => {
            println!("No command given. Use --help for usage.");
        }
    }

    Ok(())
}

/// Reads JSON, or YAML for `.yaml`/`.yml` files.
fn read_input<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        serde_yaml::from_str(&text).with_context(|| format!("invalid YAML in {}", path.display()))
    } else {
        serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
    }
}

fn engine_config_from_env() -> anyhow::Result<EngineConfig> {
    let env = |key: &str| std::env::var(key).ok();

    let practitioner = practitioner_from_env_values(
        env("INVREC_PRACTITIONER_ID"),
        env("INVREC_PRACTITIONER_NAME"),
        env("INVREC_PRACTITIONER_LICENSE"),
    )?;
    let features = FeatureFlags {
        include_organization_panel: flag_from_env_value(
            env("INVREC_INCLUDE_ORGANIZATION"),
            true,
        )?,
        include_encounter: flag_from_env_value(env("INVREC_INCLUDE_ENCOUNTER"), true)?,
        include_attester: flag_from_env_value(env("INVREC_INCLUDE_ATTESTER"), true)?,
    };

    let mut config = EngineConfig::new(practitioner)?
        .with_features(features)
        .with_profiles(flag_from_env_value(env("INVREC_ATTACH_PROFILES"), true)?);
    if let Some(language) = env("INVREC_LANGUAGE") {
        config = config.with_language(&language)?;
    }
    if let Some(currency) = env("INVREC_CURRENCY") {
        config = config.with_currency(&currency)?;
    }
    Ok(config)
}

fn submission_config_from_env() -> anyhow::Result<SubmissionConfig> {
    let endpoint = std::env::var("INVREC_SUBMIT_URL")
        .context("INVREC_SUBMIT_URL must be set to submit")?;
    Ok(SubmissionConfig::new(endpoint).with_auth_token(std::env::var("INVREC_AUTH_TOKEN").ok()))
}
