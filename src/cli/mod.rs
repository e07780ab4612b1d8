//! Satisfaction pipeline CLI
//!
//! Command-line interface for training, deploying and querying the
//! customer satisfaction model.

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::deployment::{DeploymentService, ModelDeployer};
use crate::pipeline::{
    continuous_deployment_pipeline, inference_pipeline, train_pipeline, DeploymentParams, PipelineContext,
};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }
fn caution(s: &str) -> ColoredString { s.truecolor(230, 190, 90) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

/// Which parts of the deployment run to execute
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum DeploymentMode {
    /// Only run the continuous deployment pipeline
    Deploy,
    /// Only run inference against the deployed model
    Predict,
    /// Deploy, then run inference
    DeployAndPredict,
}

impl DeploymentMode {
    pub fn deploys(&self) -> bool {
        matches!(self, DeploymentMode::Deploy | DeploymentMode::DeployAndPredict)
    }

    pub fn predicts(&self) -> bool {
        matches!(self, DeploymentMode::Predict | DeploymentMode::DeployAndPredict)
    }
}

#[derive(Parser)]
#[command(name = "satisfaction")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Customer satisfaction prediction pipeline")]
#[command(long_about = None)]
pub struct Cli {
    /// Pipeline configuration file (JSON)
    #[arg(long, global = true)]
    pub pipeline_config: Option<PathBuf>,

    /// Dataset to ingest, overrides the configuration file
    #[arg(short, long, global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the training pipeline: ingest, clean, train, evaluate
    Train,

    /// Run the continuous deployment and/or inference pipeline
    Deploy {
        /// Run only the deployment pipeline, only prediction, or both
        #[arg(short, long, value_enum, default_value_t = DeploymentMode::DeployAndPredict)]
        config: DeploymentMode,

        /// Minimum value of the trigger metric required to deploy the model
        #[arg(long, default_value_t = 0.92)]
        min_accuracy: f64,
    },

    /// Stop the running model service
    Stop,

    /// Write the default pipeline configuration to a file
    InitConfig {
        /// Output file
        #[arg(short, long, default_value = "pipeline.json")]
        output: PathBuf,
    },
}

/// Worker count the command line deploys with when no configuration file is given
pub const CLI_WORKERS: usize = 3;

/// Defaults used by the command line; `init-config` writes these
pub fn cli_defaults() -> PipelineConfig {
    PipelineConfig::default().with_workers(CLI_WORKERS)
}

/// Configuration from `--pipeline-config` (or [`cli_defaults`]) with `--data` applied
pub fn load_config(path: Option<&Path>, data: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    let mut config = match path {
        Some(p) => PipelineConfig::from_file(p)?,
        None => cli_defaults(),
    };
    if let Some(data) = data {
        config = config.with_data_path(data);
    }
    config.validate()?;
    Ok(config)
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(config: PipelineConfig) -> anyhow::Result<()> {
    section("Train");

    let ctx = PipelineContext::new(config)?;

    step_run(&format!("Running {}", "train_pipeline".cyan()));
    let start = Instant::now();
    let outcome = train_pipeline(&ctx)?;
    step_done(&format!("{:?}", start.elapsed()));

    println!();
    println!("  {:<16} {}", muted("Train rows"), outcome.n_train.to_string().white());
    println!("  {:<16} {}", muted("Test rows"), outcome.n_test.to_string().white());
    println!("  {:<16} {}", muted("Features"), outcome.feature_names.len().to_string().white());
    for (name, value) in outcome.report.as_pairs() {
        println!("  {:<16} {}", muted(&name.to_uppercase()), format!("{:.4}", value).white().bold());
    }
    println!();

    if let Some(experiment) = ctx.tracker.current_experiment() {
        if let Some(run) = experiment.runs.iter().find(|r| r.run_id == outcome.run_id) {
            println!("  {:<16} {}", muted("Run"), run.run_id.white());
            println!("  {:<16} {}", muted("Duration"), format!("{:.2}s", run.duration_secs()).white());
        }
        if let Some(best) = experiment.best_run("r2", true) {
            let r2 = best.metrics.get("r2").copied().unwrap_or(f64::NAN);
            println!(
                "  {:<16} {} {}",
                muted("Best R2 run"),
                best.run_id.white(),
                dim(&format!("({:.4})", r2))
            );
        }
        println!();
    }

    print_tracking_location(&ctx);
    Ok(())
}

pub fn cmd_deploy(config: PipelineConfig, mode: DeploymentMode, min_accuracy: f64) -> anyhow::Result<()> {
    section("Deploy");

    let ctx = PipelineContext::new(config)?;

    if mode.deploys() {
        let params = DeploymentParams {
            min_accuracy,
            ..DeploymentParams::from_config(&ctx.config)
        };

        step_run(&format!("Running {}", "continuous_deployment_pipeline".cyan()));
        let start = Instant::now();
        let outcome = continuous_deployment_pipeline(&ctx, params)?;
        step_done(&format!("{:?}", start.elapsed()));

        let metric = ctx.config.trigger_metric;
        let value = outcome.training.report.metric(metric);
        step_ok(&format!(
            "{} = {:.4} against threshold {}",
            metric.as_str().to_uppercase(),
            value,
            min_accuracy
        ));
        match &outcome.service {
            Some(service) => step_ok(&format!("Deployed model version {}", service.version.to_string().white().bold())),
            None => println!("  {} {}", caution("•"), "Deployment trigger declined the model"),
        }
    }

    if mode.predicts() {
        step_run(&format!("Running {}", "inference_pipeline".cyan()));
        let start = Instant::now();
        let outcome = inference_pipeline(&ctx)?;
        step_done(&format!("{:?}", start.elapsed()));

        let mean = outcome.predictions.mean().unwrap_or(f64::NAN);
        step_ok(&format!(
            "{} predictions, mean review score {:.3}",
            outcome.predictions.len(),
            mean
        ));
    }

    println!();
    print_tracking_location(&ctx);
    print_service_status(&ctx)?;
    Ok(())
}

pub fn cmd_stop(config: PipelineConfig) -> anyhow::Result<()> {
    section("Stop");

    let target = config.deployment_target();
    let mut deployer = ModelDeployer::open(&config.registry_dir)?;
    let uuid = deployer.active_service(&target).map(|s| s.uuid);

    match uuid {
        Some(uuid) => {
            deployer.stop(&uuid)?;
            step_ok(&format!("Stopped service {}", uuid.to_string().white()));
        }
        None => println!("  {}", muted("No running model service found")),
    }
    println!();
    Ok(())
}

pub fn cmd_init_config(output: &Path) -> anyhow::Result<()> {
    cli_defaults().save(output)?;
    step_ok(&format!("Wrote default configuration to {}", output.display()));
    Ok(())
}

// ─── Run summary ───────────────────────────────────────────────────────────────

fn print_tracking_location(ctx: &PipelineContext) {
    let store = ctx.tracker.config().output_dir.join("experiments.json");
    println!(
        "  {} {}",
        muted("Runs are recorded in"),
        store.display().to_string().white()
    );
    println!();
}

fn print_service_status(ctx: &PipelineContext) -> anyhow::Result<()> {
    let target = ctx.config.deployment_target();
    let deployer = ModelDeployer::open(&ctx.config.registry_dir)?;
    let services = deployer.find_model_server(
        &target.pipeline_name,
        &target.pipeline_step_name,
        &target.model_name,
    );

    line_box_top();
    line_box_center(&"Model service".white().bold().to_string());
    line_box_sep();
    match services.first() {
        Some(service) if service.is_running() => {
            line_box(&format!("{} {}", ok("●"), "running"));
            service_details(service, &deployer.root());
        }
        Some(service) => {
            line_box(&format!("{} {}", caution("●"), "stopped"));
            service_details(service, &deployer.root());
            line_box_sep();
            line_box(&muted("Run `satisfaction deploy --config deploy` to").to_string());
            line_box(&muted("deploy a new model version.").to_string());
        }
        None => {
            line_box(&format!("{} {}", dim("○"), "not found"));
            line_box_sep();
            line_box(&muted("No model service exists yet. Run the deployment").to_string());
            line_box(&muted("pipeline first: `satisfaction deploy --config deploy`").to_string());
        }
    }
    line_box_bottom();
    println!();
    Ok(())
}

fn service_details(service: &DeploymentService, registry_root: &Path) {
    line_box(&kv("Version ", &service.version.to_string()));
    line_box(&kv("Service ", &service.uuid.to_string()));
    line_box(&kv("Workers ", &service.workers.to_string()));
    line_box(&kv("Timeout ", &format!("{}s", service.timeout_secs)));
    line_box(&kv("Model   ", &registry_root.join(&service.artifact_path).display().to_string()));
}

pub fn show_help() {
    section("Commands");

    let cmds: &[(&str, &str)] = &[
        ("satisfaction train -d data.csv", "Train and evaluate a model"),
        ("satisfaction deploy", "Deploy, then predict (default)"),
        ("satisfaction deploy -c deploy", "Deploy only"),
        ("satisfaction deploy -c predict", "Predict with the deployed model"),
        ("satisfaction deploy --min-accuracy 0.8", "Custom deployment threshold"),
        ("satisfaction stop", "Stop the running model service"),
        ("satisfaction init-config", "Write a default pipeline.json"),
    ];

    for (cmd, desc) in cmds {
        println!("  {:<44} {}", cmd.white(), muted(desc));
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deployment::ModelMetadata;
    use clap::CommandFactory;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_deploy_defaults() {
        let cli = Cli::try_parse_from(["satisfaction", "deploy"]).unwrap();
        match cli.command {
            Some(Commands::Deploy { config, min_accuracy }) => {
                assert_eq!(config, DeploymentMode::DeployAndPredict);
                assert_eq!(min_accuracy, 0.92);
            }
            _ => panic!("expected deploy"),
        }
    }

    #[test]
    fn test_deploy_mode_parsing() {
        let cli = Cli::try_parse_from(["satisfaction", "deploy", "-c", "predict", "--min-accuracy", "0.5"]).unwrap();
        match cli.command {
            Some(Commands::Deploy { config, min_accuracy }) => {
                assert_eq!(config, DeploymentMode::Predict);
                assert!(!config.deploys());
                assert!(config.predicts());
                assert_eq!(min_accuracy, 0.5);
            }
            _ => panic!("expected deploy"),
        }
        assert!(Cli::try_parse_from(["satisfaction", "deploy", "--config", "deploy_and_predict"]).is_ok());
        assert!(Cli::try_parse_from(["satisfaction", "deploy", "--config", "serve"]).is_err());
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi(&"hi".red().to_string()), "hi");
        assert_eq!(strip_ansi("plain"), "plain");
    }

    #[test]
    fn test_load_config_overrides_data() {
        let config = load_config(None, Some(Path::new("orders.csv"))).unwrap();
        assert_eq!(config.data_path, PathBuf::from("orders.csv"));
        assert_eq!(config.workers, CLI_WORKERS);
    }

    #[test]
    fn test_init_config_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pipeline.json");

        cmd_init_config(&path).unwrap();
        let loaded = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(loaded, cli_defaults());

        let config = load_config(Some(&path), None).unwrap();
        assert_eq!(config.workers, CLI_WORKERS);
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_configured_workers_override_cli_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pipeline.json");
        std::fs::write(&path, r#"{"workers": 7, "timeout_secs": 30}"#).unwrap();

        let config = load_config(Some(&path), None).unwrap();
        let params = DeploymentParams {
            min_accuracy: 0.92,
            ..DeploymentParams::from_config(&config)
        };
        assert_eq!(params.workers, 7);
        assert_eq!(params.timeout_secs, 30);
    }

    #[test]
    fn test_stop_stops_running_service() {
        let dir = TempDir::new().unwrap();
        let config = cli_defaults().with_registry_dir(dir.path().join("registry"));
        let target = config.deployment_target();

        let mut deployer = ModelDeployer::open(&config.registry_dir).unwrap();
        let metadata = ModelMetadata {
            model_type: "linear_regression".to_string(),
            feature_names: vec!["price".to_string()],
            target: "review_score".to_string(),
            metrics: BTreeMap::new(),
            run_id: None,
        };
        deployer
            .deploy(&vec![0.5], metadata, &target, true, config.workers, config.timeout_secs)
            .unwrap();
        assert!(deployer.active_service(&target).is_some());

        cmd_stop(config.clone()).unwrap();
        let reopened = ModelDeployer::open(&config.registry_dir).unwrap();
        assert!(reopened.active_service(&target).is_none());

        // Nothing left to stop
        cmd_stop(config).unwrap();
    }
}
