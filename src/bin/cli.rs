//! Health Companion CLI
//!
//! Command-line front end for the companion API:
//! - Log in, sign up, log out
//! - Show the vitals dashboard
//! - Chat with the health companion
//! - Record manual or simulated readings

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use health_companion::api::dto::DashboardResponse;
use health_companion::auth::{validate_confirmation, validate_signup, Session, SignupForm};
use health_companion::client::{
    ClientConfig, ClientError, CompanionClient, SessionStore, SubmitOutcome,
};
use health_companion::config::generate_default_config;
use health_companion::storage::Vital;
use health_companion::vitals::{
    chart_series, simulated_readings, ChartBar, LatestVitals, Reading, VitalKind,
};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

const DEFAULT_API_URL: &str = "http://localhost:8000";
const CHART_WIDTH: usize = 40;

#[derive(Parser)]
#[command(name = "companion")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Your AI health companion")]
#[command(long_about = "Track vitals, review alerts and chat with a caring health companion.\nThe API server URL can also be set with COMPANION_API_URL.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and remember the session
    Login {
        username: String,
        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Create an account
    Signup {
        username: String,
        /// Full name
        #[arg(short = 'n', long)]
        full_name: String,
        /// elderly or caregiver
        #[arg(short, long, default_value = "elderly")]
        role: String,
        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
        /// Password confirmation (prompted when omitted)
        #[arg(long)]
        confirm: Option<String>,
    },

    /// Forget the saved session
    Logout,

    /// Show who is logged in
    Whoami,

    /// Show latest vitals, alerts and a chart
    Dashboard {
        /// Whose dashboard (default: the logged-in user)
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Chat with the companion (interactive when no message is given)
    Chat {
        message: Vec<String>,
    },

    /// Record a single reading
    Log {
        /// Vital type (heart_rate, blood_pressure_sys, blood_pressure_dia, spo2, glucose, temperature)
        vital_type: String,
        value: f64,
        /// Unit (default: the usual unit for the type)
        #[arg(short, long)]
        unit: Option<String>,
    },

    /// Record several readings at once
    Record {
        /// Heart rate (bpm)
        #[arg(long)]
        hr: Option<f64>,
        /// Systolic blood pressure (mmHg)
        #[arg(long)]
        bp_sys: Option<f64>,
        /// Diastolic blood pressure (mmHg)
        #[arg(long)]
        bp_dia: Option<f64>,
        /// Oxygen saturation (%)
        #[arg(long)]
        spo2: Option<f64>,
        /// Blood glucose (mg/dL)
        #[arg(long)]
        glucose: Option<f64>,
        /// Temperature (°F)
        #[arg(long)]
        temp: Option<f64>,
        /// Send readings one at a time instead of as one batch
        #[arg(long)]
        sequential: bool,
    },

    /// Record a set of random plausible readings
    Simulate {
        /// Send readings one at a time instead of as one batch
        #[arg(long)]
        sequential: bool,
    },

    /// Mark an alert resolved
    Resolve {
        alert_id: i64,
    },

    /// Show server status
    Status,

    /// Generate default server config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let api_url = cli
        .api_url
        .clone()
        .or_else(|| std::env::var("COMPANION_API_URL").ok())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let client = CompanionClient::new(ClientConfig::new(&api_url))?;
    let sessions = SessionStore::default_location()?;

    match cli.command {
        Commands::Login { username, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt("Password: ")?,
            };

            let session = or_exit(client.login(&username, &password).await);
            sessions.save(&session)?;
            println!("Welcome back, {}!", session.full_name);
        }

        Commands::Signup {
            username,
            full_name,
            role,
            password,
            confirm,
        } => {
            let password = match password {
                Some(p) => p,
                None => prompt("Password: ")?,
            };
            let confirm = match confirm {
                Some(c) => c,
                None => prompt("Confirm password: ")?,
            };

            let form = SignupForm {
                username,
                full_name,
                password,
                role,
            };

            // same checks the server runs, reported before any request
            if let Err(e) = validate_signup(&form)
                .and_then(|_| validate_confirmation(&form.password, &confirm))
            {
                fail(&e.to_string());
            }

            let created = or_exit(client.signup(&form).await);
            println!("Account created for {}. Please log in.", created.username);
        }

        Commands::Logout => {
            sessions.clear()?;
            println!("Logged out.");
        }

        Commands::Whoami => match sessions.load()? {
            Some(session) => {
                println!("{} ({}, {})", session.full_name, session.username, session.role)
            }
            None => println!("Not logged in."),
        },

        Commands::Dashboard { user } => {
            let username = match user {
                Some(u) => u,
                None => require_session(&sessions)?.username,
            };

            let dashboard = or_exit(client.dashboard(&username).await);
            print!("{}", render_dashboard(&dashboard));
        }

        Commands::Chat { message } => {
            let session = require_session(&sessions)?;

            if message.is_empty() {
                chat_loop(&client, &session).await?;
            } else {
                let reply = or_exit(client.chat(&session.username, &message.join(" ")).await);
                println!("{}", reply);
            }
        }

        Commands::Log {
            vital_type,
            value,
            unit,
        } => {
            let session = require_session(&sessions)?;
            let kind = parse_kind(&vital_type);
            let unit = match unit {
                Some(u) => u,
                None if matches!(kind, VitalKind::Other(_)) => {
                    bail!("Unknown vital type '{}': pass --unit", vital_type)
                }
                None => kind.default_unit().to_string(),
            };

            let reading = Reading::with_unit(kind.as_str(), value, unit);
            let response = or_exit(client.ingest(&session.username, &reading).await);
            println!(
                "Recorded {}: {} {}{}",
                kind.label(),
                reading.value,
                reading.unit,
                if response.abnormal { "  ⚠️  outside the normal range" } else { "" }
            );
        }

        Commands::Record {
            hr,
            bp_sys,
            bp_dia,
            spo2,
            glucose,
            temp,
            sequential,
        } => {
            let session = require_session(&sessions)?;
            let readings: Vec<Reading> = [
                (VitalKind::HeartRate, hr),
                (VitalKind::BloodPressureSys, bp_sys),
                (VitalKind::BloodPressureDia, bp_dia),
                (VitalKind::Spo2, spo2),
                (VitalKind::Glucose, glucose),
                (VitalKind::Temperature, temp),
            ]
            .into_iter()
            .filter_map(|(kind, value)| value.map(|v| Reading::new(kind, v)))
            .collect();

            if readings.is_empty() {
                fail("Please enter at least one vital");
            }

            submit(&client, &session, &readings, sequential).await;
        }

        Commands::Simulate { sequential } => {
            let session = require_session(&sessions)?;
            let readings = simulated_readings(&mut rand::thread_rng());

            for reading in &readings {
                println!("  {:<12} {} {}", reading.kind().label(), reading.value, reading.unit);
            }
            submit(&client, &session, &readings, sequential).await;
        }

        Commands::Resolve { alert_id } => {
            let session = require_session(&sessions)?;
            let alert = or_exit(client.resolve_alert(&session.username, alert_id).await);
            println!("Resolved: {}", alert.message);
        }

        Commands::Status => match client.health().await {
            Ok(health) => {
                println!("Health Companion v{}", env!("CARGO_PKG_VERSION"));
                println!();
                println!("API Status: {}", health.status);
                println!("Database:   {}", health.database);
                println!("Chat:       {}", health.chat);
                println!("Server:     v{}", health.version);
                println!();
                println!("Uptime: {}", format_duration(health.uptime_seconds));
            }
            Err(ClientError::Connection) => {
                eprintln!("Cannot connect to the companion API at {}", api_url);
                eprintln!();
                eprintln!("Make sure the API server is running:");
                eprintln!("  cargo run --bin companion-api");
                std::process::exit(1);
            }
            Err(e) => fail(&e.to_string()),
        },

        Commands::Config { output } => {
            let config = generate_default_config();

            if let Some(path) = output {
                std::fs::write(&path, &config)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("Config written to: {:?}", path);
            } else {
                print!("{}", config);
            }
        }
    }

    Ok(())
}

/// Print an error and exit
fn fail(message: &str) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn or_exit<T>(result: Result<T, ClientError>) -> T {
    result.unwrap_or_else(|e| fail(&e.to_string()))
}

fn require_session(store: &SessionStore) -> anyhow::Result<Session> {
    match store.load()? {
        Some(session) => Ok(session),
        None => fail("Not logged in. Run `companion login <username>` first."),
    }
}

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{}", label);
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Accept wire names plus a few short forms
fn parse_kind(input: &str) -> VitalKind {
    let normalized = input.trim().to_lowercase();
    match normalized.as_str() {
        "hr" | "pulse" => VitalKind::HeartRate,
        "bp_sys" | "sys" | "systolic" => VitalKind::BloodPressureSys,
        "bp_dia" | "dia" | "diastolic" => VitalKind::BloodPressureDia,
        "oxygen" | "o2" => VitalKind::Spo2,
        "sugar" => VitalKind::Glucose,
        "temp" => VitalKind::Temperature,
        other => VitalKind::parse(other),
    }
}

async fn submit(
    client: &CompanionClient,
    session: &Session,
    readings: &[Reading],
    sequential: bool,
) {
    if sequential {
        let outcome = client.submit_sequential(&session.username, readings).await;
        report_sequential(&outcome, readings.len());
        return;
    }

    let batch = or_exit(client.ingest_batch(&session.username, readings).await);
    println!("Vitals recorded successfully ({} readings).", batch.recorded);
    if batch.abnormal > 0 {
        println!("⚠️  {} reading(s) outside the normal range. Check your alerts.", batch.abnormal);
    }
}

fn report_sequential(outcome: &SubmitOutcome, total: usize) {
    match &outcome.error {
        None => {
            println!("Vitals recorded successfully ({} readings).", outcome.submitted);
            if outcome.abnormal > 0 {
                println!(
                    "⚠️  {} reading(s) outside the normal range. Check your alerts.",
                    outcome.abnormal
                );
            }
        }
        Some(e) => {
            eprintln!("Error: {}", e);
            eprintln!(
                "{} of {} readings were recorded before the failure.",
                outcome.submitted, total
            );
            std::process::exit(1);
        }
    }
}

async fn chat_loop(client: &CompanionClient, session: &Session) -> anyhow::Result<()> {
    println!("Chatting as {}. Type 'exit' to leave.", session.full_name);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        match client.chat(&session.username, message).await {
            Ok(reply) => println!("companion> {}\n", reply),
            Err(e) => println!("companion> {}\n", e),
        }
    }

    Ok(())
}

/// Latest cards, blood pressure, alerts and the chart, as text
fn render_dashboard(dashboard: &DashboardResponse) -> String {
    let vitals: Vec<Vital> = dashboard.vitals.iter().cloned().map(Vital::from).collect();
    let latest = LatestVitals::from_recent(&vitals);

    let mut out = String::new();
    out.push_str(&format!("Dashboard for {}\n\n", dashboard.user));

    if latest.is_empty() {
        out.push_str("No vitals recorded yet.\n");
    } else {
        out.push_str("Latest vitals\n");
        for kind in [
            VitalKind::HeartRate,
            VitalKind::Spo2,
            VitalKind::Glucose,
            VitalKind::Temperature,
        ] {
            let card = match latest.get(&kind) {
                Some(v) => format!("{} {}{}", v.value, v.unit, flag(v.is_abnormal)),
                None => "--".to_string(),
            };
            out.push_str(&format!("  {:<14} {}\n", kind.label(), card));
        }
        let bp = match latest.blood_pressure() {
            Some(bp) => format!("{} mmHg{}", bp, flag(bp.is_abnormal)),
            None => "--".to_string(),
        };
        out.push_str(&format!("  {:<14} {}\n", "Blood Pressure", bp));
    }

    out.push('\n');
    if dashboard.alerts.is_empty() {
        out.push_str("No recent alerts.\n");
    } else {
        out.push_str("Recent alerts\n");
        for alert in &dashboard.alerts {
            out.push_str(&format!(
                "  #{:<4} {}  {}{}\n",
                alert.id,
                alert.created_at.format("%Y-%m-%d %H:%M"),
                alert.message,
                if alert.resolved { " [resolved]" } else { "" }
            ));
        }
    }

    let bars = chart_series(&latest);
    if !bars.is_empty() {
        out.push('\n');
        out.push_str("Latest readings\n");
        for line in render_chart(&bars, CHART_WIDTH) {
            out.push_str(&line);
            out.push('\n');
        }
    }

    out
}

fn flag(abnormal: bool) -> &'static str {
    if abnormal {
        "  ⚠️"
    } else {
        ""
    }
}

/// Horizontal bars scaled to the largest value
fn render_chart(bars: &[ChartBar], width: usize) -> Vec<String> {
    let max = bars.iter().map(|b| b.value).fold(0.0_f64, f64::max);

    bars.iter()
        .map(|bar| {
            let len = if max > 0.0 && bar.value > 0.0 {
                ((bar.value / max) * width as f64).round().max(1.0) as usize
            } else {
                0
            };
            let fill = if bar.is_abnormal { '!' } else { '#' };
            format!(
                "  {:<12} {:>7} |{}",
                bar.label,
                bar.value,
                fill.to_string().repeat(len)
            )
        })
        .collect()
}

/// Format duration in human-readable form
fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}
