#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]

use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use farmcredit::applicant::{Applicant, EducationLevel, YesNo};
use farmcredit::batch::{load_applicants, score_batch, write_report};
use farmcredit::dashboard::{DASHBOARD_CAPTION, DASHBOARD_TITLE, DashboardEmbed};
use farmcredit::pipeline::Assessor;
use farmcredit::rates::{RATE_COLUMNS, StateRatesTable};
use farmcredit::report::render_assessment;
use farmcredit::settings::Settings;
use farmcredit::states::{STATE_ENCODING, display_name};

#[derive(Parser)]
#[command(
    name = "farmcredit",
    about = "Creditworthiness screening for smallholder farmers",
    long_about = "Combines a farmer's questionnaire answers with state-level financial inclusion \
                 rates and a pretrained classifier to decide eligibility for a credit scheme, \
                 with improvement tips for applicants who are not yet eligible."
)]
struct Cli {
    /// Optional TOML settings file (paths, contact details, dashboard URL)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// State statistics dataset (.csv); overrides the settings file
    /// [default: demos/credit_score_dataset.csv, relative to the working directory]
    #[arg(long, global = true, value_name = "PATH")]
    dataset: Option<PathBuf>,

    /// Trained classifier artifact (.toml); overrides the settings file
    /// [default: demos/credit_model.toml]
    #[arg(long, global = true, value_name = "PATH")]
    model: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
pub struct AssessArgs {
    /// Did you attend high school?
    #[arg(long, value_enum, ignore_case = true)]
    pub school_attended: YesNo,

    /// Highest education level completed (or its tier number 1-6)
    #[arg(long, value_enum, ignore_case = true)]
    pub education_level: EducationLevel,

    /// Have you ever attended training?
    #[arg(long, value_enum, ignore_case = true)]
    pub training: YesNo,

    /// Have you received vocational training?
    #[arg(long, value_enum, ignore_case = true)]
    pub vocational_training: YesNo,

    /// How many plots do you have?
    #[arg(long)]
    pub plots: u32,

    /// Are you into fishery?
    #[arg(long, value_enum, ignore_case = true)]
    pub fishery: YesNo,

    /// How many different crops do you plant?
    #[arg(long)]
    pub crops: u32,

    /// State the farm is situated in
    #[arg(long, value_parser = parse_state)]
    pub state: String,

    /// Print the encoded feature vector before the verdict
    #[arg(long)]
    pub show_features: bool,
}

#[derive(Args)]
pub struct BatchArgs {
    /// Tab-separated applicants file
    pub applicants: PathBuf,

    /// Where to write the verdict table
    #[arg(long, default_value = "verdicts.tsv")]
    pub output: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess a single applicant
    #[command(about = "Assess one applicant's creditworthiness")]
    Assess(AssessArgs),

    /// Assess every applicant in a file
    #[command(about = "Assess a file of applicants (outputs: verdicts.tsv)")]
    Batch(BatchArgs),

    /// List the recognized states with their codes and averaged rates
    #[command(about = "List recognized states and their inclusion rates")]
    States,

    /// Print the lender dashboard embed
    #[command(about = "Print the lender dashboard page (HTML)")]
    Dashboard,

    /// Display version information
    #[command(about = "Display version information")]
    Version,
}

/// Restricts the state flag to the closed set of recognized names.
fn parse_state(raw: &str) -> Result<String, String> {
    match farmcredit::states::encode_state(raw) {
        Some(_) => Ok(raw.trim().to_lowercase()),
        None => Err(format!(
            "unrecognized state '{raw}'; run `farmcredit states` for the list"
        )),
    }
}

fn resolve_settings(cli: &Cli) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut settings = Settings::load_or_default(cli.config.as_deref())?;
    if let Some(dataset) = &cli.dataset {
        settings.dataset_path = dataset.clone();
    }
    if let Some(model) = &cli.model {
        settings.model_path = model.clone();
    }
    Ok(settings)
}

pub fn assess(settings: &Settings, args: AssessArgs) -> Result<(), Box<dyn std::error::Error>> {
    let assessor = Assessor::initialize(&settings.dataset_path, &settings.model_path)?;

    let applicant = Applicant {
        school_attended: args.school_attended,
        education_level: args.education_level,
        training_attended: args.training,
        vocational_training: args.vocational_training,
        plot_count: args.plots,
        has_fishery: args.fishery,
        crop_count: args.crops,
        state: args.state,
    };

    let assessment = assessor.assess(&applicant)?;

    if args.show_features {
        println!("Feature vector:");
        for (name, value) in assessment.features.named() {
            println!("  {name:<26} {value}");
        }
        println!();
    }

    print!("{}", render_assessment(&assessment, &settings.contact));
    Ok(())
}

pub fn batch(settings: &Settings, args: BatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let assessor = Assessor::initialize(&settings.dataset_path, &settings.model_path)?;
    let applicants = load_applicants(&args.applicants)?;
    let records = score_batch(&assessor, &applicants)?;
    write_report(&args.output, &records)?;
    println!("Verdicts saved to: {}", args.output.display());
    Ok(())
}

pub fn states(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let table = StateRatesTable::load(&settings.dataset_path)?;

    println!("state\tcode\t{}\tin_dataset", RATE_COLUMNS.join("\t"));
    for (name, code) in STATE_ENCODING {
        let rates = table.lookup(name);
        let values = rates
            .to_array()
            .iter()
            .map(|rate| format!("{rate:.4}"))
            .collect::<Vec<_>>()
            .join("\t");
        println!(
            "{}\t{code}\t{values}\t{}",
            display_name(name),
            if table.contains(name) { "yes" } else { "no" }
        );
    }
    Ok(())
}

fn dashboard(settings: &Settings) {
    log::info!("{DASHBOARD_TITLE}: {DASHBOARD_CAPTION}");
    print!("{}", DashboardEmbed::new(settings.dashboard_url.clone()).to_page_html());
}

fn print_version_info() {
    println!("farmcredit {}", env!("CARGO_PKG_VERSION"));
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = resolve_settings(&cli).and_then(|settings| match cli.command {
        Some(Commands::Assess(args)) => assess(&settings, args),
        Some(Commands::Batch(args)) => batch(&settings, args),
        Some(Commands::States) => states(&settings),
        Some(Commands::Dashboard) => {
            dashboard(&settings);
            Ok(())
        }
        Some(Commands::Version) => {
            print_version_info();
            Ok(())
        }
        None => {
            if let Err(e) = Cli::command().print_help() {
                eprintln!("Error: {e}");
            }
            println!();
            Ok(())
        }
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
