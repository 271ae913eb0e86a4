//! Calorie predictor CLI module
//!
//! Command-line interface for training, prediction and dataset inspection,
//! plus the interactive workout form that runs when no subcommand is given.

use clap::{Args, Parser, Subcommand};
use colored::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::data::{DatasetConfig, DatasetLoader, FeatureVector, Gender, TrainingData, FEATURE_COLUMNS};
use crate::history::{save_prediction, PredictionRecord, DEFAULT_HISTORY_PATH};
use crate::inference::{self, Activity, BmiStatus, BurnLevel};
use crate::training::{ModelKind, ModelMetrics, TrainEngine, TrainedModels, TrainingConfig};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }
fn warn(s: &str) -> ColoredString   { s.truecolor(240, 190, 90) }

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

fn line_box_empty() { line_box(""); }

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

#[derive(Parser)]
#[command(name = "calorie")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Estimate workout calorie burn with linear, random forest and boosted-tree models")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub data: DataArgs,
}

/// Dataset locations shared by every command
#[derive(Args, Clone, Debug)]
pub struct DataArgs {
    /// Exercise records CSV
    #[arg(long, global = true, default_value = "Exercise.csv")]
    pub exercise: PathBuf,

    /// Calories CSV
    #[arg(long, global = true, default_value = "Calories.csv")]
    pub calories: PathBuf,

    /// Training configuration JSON (missing fields take defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

impl DataArgs {
    pub fn dataset_config(&self) -> DatasetConfig {
        DatasetConfig::new(&self.exercise, &self.calories)
    }

    pub fn training_config(&self) -> anyhow::Result<TrainingConfig> {
        match &self.config {
            Some(path) => Ok(TrainingConfig::from_json_file(path)?),
            None => Ok(TrainingConfig::default()),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train every model and report held-out MAE and R²
    Train {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Estimate calories for one workout
    Predict {
        /// male or female
        #[arg(long, value_parser = parse_gender)]
        gender: Gender,

        /// Years
        #[arg(long)]
        age: u32,

        /// Centimetres
        #[arg(long)]
        height: f64,

        /// Kilograms
        #[arg(long)]
        weight: f64,

        /// Minutes
        #[arg(long)]
        duration: f64,

        /// Beats per minute
        #[arg(long)]
        heart_rate: f64,

        /// Degrees Celsius
        #[arg(long)]
        body_temp: f64,

        /// Walking, Running, Cycling, Swimming or Yoga
        #[arg(long, default_value = "Walking", value_parser = parse_activity)]
        activity: Activity,

        /// Save the result to the history file
        #[arg(long)]
        save: bool,

        /// Model whose estimate --save writes
        #[arg(long, default_value = "Linear Regression", value_parser = parse_model_kind)]
        save_model: ModelKind,

        /// History file written by --save
        #[arg(long, default_value = DEFAULT_HISTORY_PATH)]
        history: PathBuf,
    },

    /// Summarize the joined dataset
    Info,
}

fn parse_gender(s: &str) -> Result<Gender, String> {
    s.parse().map_err(|e: crate::error::CalorieError| e.to_string())
}

fn parse_activity(s: &str) -> Result<Activity, String> {
    s.parse().map_err(|e: crate::error::CalorieError| e.to_string())
}

fn parse_model_kind(s: &str) -> Result<ModelKind, String> {
    s.parse().map_err(|e: crate::error::CalorieError| e.to_string())
}

// ─── Workout form ──────────────────────────────────────────────────────────────

/// Input ranges enforced by the form
pub const AGE_RANGE: (u32, u32) = (15, 80);
pub const HEIGHT_RANGE: (f64, f64) = (140.0, 220.0);
pub const WEIGHT_RANGE: (f64, f64) = (40.0, 150.0);
pub const DURATION_RANGE: (f64, f64) = (10.0, 120.0);
pub const HEART_RATE_RANGE: (f64, f64) = (60.0, 200.0);
pub const BODY_TEMP_RANGE: (f64, f64) = (36.0, 42.0);

/// Raw form values, before clamping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkoutForm {
    pub gender: Gender,
    pub age: u32,
    pub height: f64,
    pub weight: f64,
    pub duration: f64,
    pub heart_rate: f64,
    pub body_temp: f64,
    pub activity: Activity,
}

impl Default for WorkoutForm {
    fn default() -> Self {
        Self {
            gender: Gender::Male,
            age: 30,
            height: 170.0,
            weight: 70.0,
            duration: 45.0,
            heart_rate: 100.0,
            body_temp: 37.0,
            activity: Activity::Walking,
        }
    }
}

fn clamp_f64(value: f64, (lo, hi): (f64, f64)) -> f64 {
    if value.is_nan() {
        lo
    } else {
        value.clamp(lo, hi)
    }
}

impl WorkoutForm {
    /// Pull every field into its allowed range
    pub fn clamped(self) -> Self {
        Self {
            age: self.age.clamp(AGE_RANGE.0, AGE_RANGE.1),
            height: clamp_f64(self.height, HEIGHT_RANGE),
            weight: clamp_f64(self.weight, WEIGHT_RANGE),
            duration: clamp_f64(self.duration, DURATION_RANGE),
            heart_rate: clamp_f64(self.heart_rate, HEART_RATE_RANGE),
            body_temp: clamp_f64(self.body_temp, BODY_TEMP_RANGE),
            ..self
        }
    }

    pub fn features(&self) -> FeatureVector {
        FeatureVector::from_measurements(
            self.gender,
            f64::from(self.age),
            self.height,
            self.weight,
            self.duration,
            self.heart_rate,
            self.body_temp,
        )
    }
}

// ─── Reports ───────────────────────────────────────────────────────────────────

/// JSON output of `calorie train --json`
#[derive(Debug, Serialize)]
pub struct TrainReport {
    pub n_rows: usize,
    pub n_exercise_rows: usize,
    pub n_calorie_rows: usize,
    pub models: Vec<ModelReport>,
}

#[derive(Debug, Serialize)]
pub struct ModelReport {
    pub model: String,
    pub metrics: ModelMetrics,
    pub top_features: Vec<(String, f64)>,
}

impl TrainReport {
    pub fn new(data: &TrainingData, models: &TrainedModels) -> Self {
        Self {
            n_rows: data.n_rows(),
            n_exercise_rows: data.n_exercise_rows,
            n_calorie_rows: data.n_calorie_rows,
            models: models
                .iter()
                .map(|r| ModelReport {
                    model: r.model.name().to_string(),
                    metrics: r.metrics.clone(),
                    top_features: r.model.ranked_importances().into_iter().take(3).collect(),
                })
                .collect(),
        }
    }
}

/// One model's estimate for a form
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    pub model: ModelKind,
    /// Model output, floored at zero
    pub raw: f64,
    /// After the activity multiplier
    pub adjusted: f64,
}

/// Estimates from every trained model, in training order
pub fn estimate_all(models: &TrainedModels, form: &WorkoutForm) -> anyhow::Result<Vec<Estimate>> {
    let features = form.features();
    models
        .iter()
        .map(|r| {
            let raw = inference::predict(&r.model, &features)?;
            Ok(Estimate {
                model: r.model.kind(),
                raw,
                adjusted: form.activity.apply(raw),
            })
        })
        .collect()
}

/// The estimate produced by `kind`, if that model was trained
pub fn estimate_for(estimates: &[Estimate], kind: ModelKind) -> Option<&Estimate> {
    estimates.iter().find(|e| e.model == kind)
}

// ─── Commands ──────────────────────────────────────────────────────────────────

fn load_training_data(data: &DataArgs) -> anyhow::Result<TrainingData> {
    step_run("Loading data");
    let start = Instant::now();
    let loaded = DatasetLoader::new(data.dataset_config()).load()?;
    step_done(&format!(
        "{} joined rows from {} + {} in {:?}",
        loaded.n_rows(),
        loaded.n_exercise_rows,
        loaded.n_calorie_rows,
        start.elapsed()
    ));
    Ok(loaded)
}

fn train_models(data: &TrainingData, config: TrainingConfig) -> anyhow::Result<TrainedModels> {
    step_run("Training Linear Regression, Random Forest, XGBoost");
    let start = Instant::now();
    let models = TrainEngine::new(config).train_and_evaluate(&data.x, &data.y)?;
    step_done(&format!("{:?}", start.elapsed()));
    Ok(models)
}

fn print_metrics(models: &TrainedModels) {
    println!();
    println!(
        "  {:<20} {:>10} {:>8} {:>10}",
        muted("Model"),
        muted("MAE"),
        muted("R²"),
        muted("Time")
    );
    println!("  {}", dim(&"─".repeat(52)));
    for result in models {
        println!(
            "  {:<20} {:>10} {:>8} {:>10}",
            result.model.name().white(),
            format!("{:.2}", result.metrics.mae).white().bold(),
            format!("{:.4}", result.metrics.r2).white(),
            dim(&format!("{:.3}s", result.metrics.training_time_secs)),
        );
    }

    for result in models {
        let ranked = result.model.ranked_importances();
        if ranked.is_empty() {
            continue;
        }
        let top: Vec<String> = ranked
            .iter()
            .take(3)
            .map(|(name, imp)| format!("{} {:.2}", name, imp))
            .collect();
        println!("  {:<20} {}", muted(result.model.name()), dim(&top.join("  ")));
    }
    println!();
}

pub fn cmd_train(data: &DataArgs, json: bool) -> anyhow::Result<()> {
    if json {
        let loaded = DatasetLoader::new(data.dataset_config()).load()?;
        let models = TrainEngine::new(data.training_config()?).train_and_evaluate(&loaded.x, &loaded.y)?;
        println!("{}", serde_json::to_string_pretty(&TrainReport::new(&loaded, &models))?);
        return Ok(());
    }

    section("Train");
    let loaded = load_training_data(data)?;
    let models = train_models(&loaded, data.training_config()?)?;
    print_metrics(&models);
    Ok(())
}

fn render_curve(points: &[inference::CurvePoint]) {
    let peak = points.iter().map(|p| p.calories).fold(0.0_f64, f64::max);
    for point in points {
        let width = if peak > 0.0 { (point.calories / peak * 36.0).round() as usize } else { 0 };
        println!(
            "  {:>4} min  {} {}",
            point.duration,
            accent(&"█".repeat(width)),
            dim(&format!("{:.0}", point.calories))
        );
    }
}

fn render_estimates(models: &TrainedModels, form: &WorkoutForm) -> anyhow::Result<Vec<Estimate>> {
    let estimates = estimate_all(models, form)?;
    let features = form.features();

    section(&format!("Estimate  ·  {}", form.activity));
    let status = BmiStatus::classify(features.bmi);
    let status_text = match status {
        BmiStatus::Normal => ok(status.label()),
        _ => warn(status.label()),
    };
    println!("  {} BMI {:.1}  {}", accent("›"), features.bmi, status_text);

    for (result, e) in models.iter().zip(&estimates) {
        section(e.model.name());
        println!(
            "  {}  {}",
            format!("{:>7.1} kcal", e.adjusted).white().bold(),
            dim(&format!("raw {:.1}", e.raw))
        );
        println!("  {} {}", accent("›"), BurnLevel::classify(e.adjusted).tip());
        println!();
        println!("  {}", muted("Calories vs duration"));

        let curve = inference::duration_curve(&result.model, &features, form.activity)?;
        render_curve(&curve);
    }
    println!();

    Ok(estimates)
}

fn save_estimate(estimates: &[Estimate], kind: ModelKind, form: &WorkoutForm, path: &Path) -> anyhow::Result<()> {
    let Some(chosen) = estimate_for(estimates, kind) else {
        anyhow::bail!("no {} estimate to save", kind);
    };
    let record = PredictionRecord {
        gender: form.gender,
        age: form.age,
        activity: form.activity,
        calories_burned: chosen.adjusted,
    };
    save_prediction(path, &record)?;
    step_ok(&format!("Saved {} estimate to {}", kind, path.display()));
    Ok(())
}

pub fn cmd_predict(
    data: &DataArgs,
    form: WorkoutForm,
    save: Option<ModelKind>,
    history: &Path,
) -> anyhow::Result<()> {
    let clamped = form.clamped();
    if clamped != form {
        println!("  {}", warn("some inputs were outside the form ranges and have been clamped"));
    }

    section("Predict");
    let loaded = load_training_data(data)?;
    let models = train_models(&loaded, data.training_config()?)?;

    let estimates = render_estimates(&models, &clamped)?;
    if let Some(kind) = save {
        save_estimate(&estimates, kind, &clamped, history)?;
    }
    Ok(())
}

pub fn cmd_info(data: &DataArgs) -> anyhow::Result<()> {
    section("Data Info");

    let (joined, loaded) = DatasetLoader::new(data.dataset_config()).load_with_joined()?;

    println!("  {:<12} {} ({} rows)", muted("Exercise"), data.exercise.display(), loaded.n_exercise_rows);
    println!("  {:<12} {} ({} rows)", muted("Calories"), data.calories.display(), loaded.n_calorie_rows);
    println!("  {:<12} {}", muted("Joined"), loaded.n_rows());
    println!();

    println!("  {:<12} {:<10} {:>6}", muted("Column"), muted("Type"), muted("Nulls"));
    println!("  {}", dim(&"─".repeat(30)));
    for col in joined.get_columns() {
        println!(
            "  {:<12} {:<10} {:>6}",
            col.name(),
            format!("{}", col.dtype()).truecolor(140, 140, 140),
            col.null_count()
        );
    }
    println!();

    println!("  {:<12} {:>10} {:>10} {:>10}", muted("Column"), muted("Min"), muted("Mean"), muted("Max"));
    println!("  {}", dim(&"─".repeat(46)));

    let columns = loaded
        .x
        .columns()
        .into_iter()
        .zip(FEATURE_COLUMNS)
        .map(|(col, name)| (name, col.to_owned()))
        .chain(std::iter::once(("Calories", loaded.y.clone())));

    for (name, values) in columns {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.mean().unwrap_or(0.0);
        println!("  {:<12} {:>10.2} {:>10.2} {:>10.2}", name, min, mean, max);
    }

    println!();
    Ok(())
}

// ─── Interactive mode ──────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "Calorie Burn Predictor".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("Models ", "Linear Regression · Random Forest · XGBoost"));
    line_box(&kv("History", DEFAULT_HISTORY_PATH));
    line_box_empty();
    line_box_bottom();
}

fn prompt_form(theme: &dialoguer::theme::ColorfulTheme) -> anyhow::Result<WorkoutForm> {
    use dialoguer::{Input, Select};

    let defaults = WorkoutForm::default();

    let gender = match Select::with_theme(theme)
        .with_prompt("Gender")
        .items(&["male", "female"])
        .default(0)
        .interact()?
    {
        0 => Gender::Male,
        _ => Gender::Female,
    };

    let age: u32 = Input::with_theme(theme)
        .with_prompt(format!("Age ({}-{})", AGE_RANGE.0, AGE_RANGE.1))
        .default(defaults.age)
        .interact_text()?;

    let number = |prompt: &str, (lo, hi): (f64, f64), default: f64| -> anyhow::Result<f64> {
        Ok(Input::<f64>::with_theme(theme)
            .with_prompt(format!("{} ({}-{})", prompt, lo, hi))
            .default(default)
            .interact_text()?)
    };

    let height = number("Height cm", HEIGHT_RANGE, defaults.height)?;
    let weight = number("Weight kg", WEIGHT_RANGE, defaults.weight)?;
    let duration = number("Duration min", DURATION_RANGE, defaults.duration)?;
    let heart_rate = number("Heart rate bpm", HEART_RATE_RANGE, defaults.heart_rate)?;
    let body_temp = number("Body temp °C", BODY_TEMP_RANGE, defaults.body_temp)?;

    let names: Vec<&str> = Activity::ALL.iter().map(|a| a.name()).collect();
    let activity_idx = Select::with_theme(theme)
        .with_prompt("Activity")
        .items(&names[..])
        .default(0)
        .interact()?;
    let activity = Activity::ALL.get(activity_idx).copied().unwrap_or_default();

    Ok(WorkoutForm {
        gender,
        age,
        height,
        weight,
        duration,
        heart_rate,
        body_temp,
        activity,
    }
    .clamped())
}

pub fn cmd_interactive(data: &DataArgs) -> anyhow::Result<()> {
    use dialoguer::{theme::ColorfulTheme, Confirm, Select};

    print_banner();

    let theme = ColorfulTheme {
        active_item_prefix: dialoguer::console::style("  ›".to_string()).for_stderr().cyan(),
        active_item_style: dialoguer::console::Style::new().for_stderr().white().bold(),
        inactive_item_prefix: dialoguer::console::style("   ".to_string()).for_stderr(),
        inactive_item_style: dialoguer::console::Style::new().for_stderr().color256(245),
        prompt_prefix: dialoguer::console::style("  ?".to_string()).for_stderr().color256(111),
        prompt_style: dialoguer::console::Style::new().for_stderr().white().bold(),
        ..ColorfulTheme::default()
    };

    println!();
    let loaded = load_training_data(data)?;
    let models = train_models(&loaded, data.training_config()?)?;

    loop {
        let items = &[
            "Predict               estimate a workout",
            "Model metrics         held-out MAE and R²",
            "Exit",
        ];

        println!();
        let sel = Select::with_theme(&theme)
            .with_prompt("What would you like to do")
            .items(items)
            .default(0)
            .interact_opt()?;

        match sel {
            Some(0) => {
                let form = prompt_form(&theme)?;
                let estimates = render_estimates(&models, &form)?;
                let save = Confirm::with_theme(&theme)
                    .with_prompt("Save this result")
                    .default(false)
                    .interact()?;
                if save {
                    let names: Vec<&str> = ModelKind::ALL.iter().map(|k| k.name()).collect();
                    let idx = Select::with_theme(&theme)
                        .with_prompt("Which model's estimate")
                        .items(&names[..])
                        .default(0)
                        .interact()?;
                    let kind = ModelKind::ALL.get(idx).copied().unwrap_or(ModelKind::LinearRegression);
                    save_estimate(&estimates, kind, &form, Path::new(DEFAULT_HISTORY_PATH))?;
                }
            }
            Some(1) => print_metrics(&models),
            Some(2) | None => {
                println!();
                println!("  {}", dim("goodbye"));
                println!();
                break;
            }
            _ => {}
        }
    }

    Ok(())
}
