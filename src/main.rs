use chrono::Local;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt};

use pm25_pinn::data::preprocessing::{TIMESTAMP_FORMAT, parse_timestamp};
use pm25_pinn::utils::input::get_line;
use pm25_pinn::utils::{io, plot};
use pm25_pinn::{AppConfig, AppContext, FormInput, LocationInput, Submission};

/// PM2.5 prediction from a pretrained regression model
#[derive(Parser)]
#[command(name = "pm25", version, about)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Seed for the random adjustments
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Point estimate for one place and time
    Predict(Query),
    /// Point estimate plus the daily forecast series
    Forecast {
        #[command(flatten)]
        query: Query,
        /// Number of days to forecast
        #[arg(long)]
        days: Option<u32>,
        /// Chart output (PNG)
        #[arg(long)]
        chart: Option<PathBuf>,
        /// CSV output
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// List the built-in place names
    Places,
    /// Fill in the form from prompts
    Interactive,
}

#[derive(Args)]
struct Query {
    /// Latitude in degrees
    #[arg(long, requires = "lon", conflicts_with = "place", allow_hyphen_values = true)]
    lat: Option<f64>,
    /// Longitude in degrees
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,
    /// District or sub-district name
    #[arg(long)]
    place: Option<String>,
    /// Date and time, YYYY-MM-DD HH:MM:SS (defaults to now)
    #[arg(long)]
    time: Option<String>,
}

impl Query {
    fn into_form(self) -> FormInput {
        let location = match (self.place, self.lat, self.lon) {
            (Some(name), _, _) => LocationInput::Place(name),
            (None, Some(latitude), Some(longitude)) => LocationInput::Manual {
                latitude,
                longitude,
            },
            _ => default_location(),
        };
        FormInput {
            location,
            timestamp: self.time.unwrap_or_else(now),
        }
    }
}

fn default_location() -> LocationInput {
    LocationInput::Manual {
        latitude: 13.7563,
        longitude: 100.5018,
    }
}

fn now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    if let Commands::Places = cli.command {
        for (name, c) in pm25_pinn::PlaceTable::bangkok().iter() {
            println!("{name}\t{:.6}\t{:.6}", c.latitude(), c.longitude());
        }
        return ExitCode::SUCCESS;
    }

    if let Commands::Forecast { days, chart, csv, .. } = &cli.command {
        if let Some(days) = days {
            config.forecast.days = *days;
        }
        if chart.is_some() {
            config.output.chart = chart.clone();
        }
        if csv.is_some() {
            config.output.csv = csv.clone();
        }
        if let Err(e) = config.validate() {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    }

    let ctx = match AppContext::start(config) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error loading resources: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Predict(query) => run_predict(&ctx, query.into_form()),
        Commands::Forecast { query, .. } => run_forecast(&ctx, query.into_form()),
        Commands::Interactive => run_interactive(&ctx),
        Commands::Places => ExitCode::SUCCESS,
    }
}

fn run_predict(ctx: &AppContext, form: FormInput) -> ExitCode {
    let result = ctx.resolve(&form.location).and_then(|coordinate| {
        let timestamp = parse_timestamp(&form.timestamp)?;
        ctx.with_rng(|rng| ctx.point_estimate(coordinate, timestamp, rng))
    });
    match result {
        Ok((raw, estimate)) => {
            println!("Predicted PM2.5: {estimate:.2} µg/m³ (model output {raw:.2})");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

fn run_forecast(ctx: &AppContext, form: FormInput) -> ExitCode {
    match ctx.with_rng(|rng| ctx.submit(&form, rng)) {
        Ok(submission) => {
            display(&submission);
            write_outputs(ctx, &submission);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

fn display(submission: &Submission) {
    println!(
        "\nLocation: {:.6}, {:.6}",
        submission.coordinate.latitude(),
        submission.coordinate.longitude()
    );
    println!("Time: {}", submission.timestamp.format(TIMESTAMP_FORMAT));
    println!("Predicted PM2.5: {:.2} µg/m³", submission.estimate);
    println!("\nPM2.5 Prediction for the Next {} Days:", submission.forecast.len());
    for point in &submission.forecast {
        println!("- {}: {:.2} µg/m³", point.date.format("%Y-%m-%d"), point.value);
    }
}

fn write_outputs(ctx: &AppContext, submission: &Submission) {
    let output = &ctx.config().output;
    if let Some(path) = &output.chart {
        match plot::create_forecast_plot(&submission.forecast, path) {
            Ok(()) => println!("\nChart saved to {}", path.display()),
            Err(e) => eprintln!("Error: failed to draw chart: {e}"),
        }
    }
    if let Some(path) = &output.csv {
        match io::write_forecast_csv(path, &submission.forecast) {
            Ok(()) => println!("Forecast saved to {}", path.display()),
            Err(e) => eprintln!("Error: failed to write CSV: {e}"),
        }
    }
}

fn run_interactive(ctx: &AppContext) -> ExitCode {
    match interactive_loop(ctx) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn interactive_loop(ctx: &AppContext) -> std::io::Result<()> {
    println!("PM2.5 Prediction");
    loop {
        println!("\nInput mode: 1) latitude/longitude  2) district/sub-district");
        let Some(mode) = get_line("Mode", Some("1"))? else {
            return Ok(());
        };

        let location = if mode == "2" {
            let Some(name) = get_line("Place name (see `pm25 places`)", None)? else {
                return Ok(());
            };
            LocationInput::Place(name)
        } else {
            let Some(latitude) = get_line("Latitude", None)? else {
                return Ok(());
            };
            let Some(longitude) = get_line("Longitude", None)? else {
                return Ok(());
            };
            match LocationInput::manual_from_text(&latitude, &longitude) {
                Ok(location) => location,
                Err(e) => {
                    println!("{}", e.user_message());
                    continue;
                }
            }
        };

        let default_time = now();
        let Some(timestamp) = get_line("Date/time (YYYY-MM-DD HH:MM:SS)", Some(&default_time[..]))? else {
            return Ok(());
        };

        // Errors are shown inline; the loop keeps going.
        run_forecast(ctx, FormInput { location, timestamp });

        match get_line("\nAnother prediction? (y/n)", Some("y"))? {
            Some(answer) if answer.eq_ignore_ascii_case("y") => continue,
            _ => return Ok(()),
        }
    }
}
