//! Dentacal CLI
//!
//! Command-line client for a running Dentacal server:
//! - Book, list, move through statuses and delete appointments
//! - Check conflicts before booking
//! - Show the waiting queue and the dashboard
//! - Look up lunar dates and holidays
//! - Export the daily report as CSV

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dentacal-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Dental clinic scheduling client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8090", global = true)]
    pub api_url: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,

    /// Label language (en, kh); defaults to the saved preference
    #[arg(long, global = true)]
    pub lang: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List appointments ranked by priority
    List {
        /// Month as YYYY-MM
        #[arg(short, long)]
        month: Option<String>,
        /// Single day as YYYY-MM-DD (overrides --month)
        #[arg(short, long)]
        day: Option<String>,
        /// Comma separated statuses, e.g. arrived,walk-in
        #[arg(short, long)]
        status: Option<String>,
        /// Comma separated provider ids
        #[arg(short, long)]
        providers: Option<String>,
        /// Free text search
        #[arg(long)]
        search: Option<String>,
    },

    /// Book an appointment
    Book {
        #[arg(long)]
        patient: u32,
        #[arg(long)]
        provider: u32,
        /// Start as "YYYY-MM-DD HH:MM"
        #[arg(long)]
        start: String,
        /// End as "YYYY-MM-DD HH:MM"
        #[arg(long)]
        end: String,
        #[arg(long, default_value = "")]
        treatment: String,
        #[arg(long, default_value = "")]
        room: String,
        #[arg(long, default_value = "")]
        notes: String,
        /// Book even if the slot is taken
        #[arg(long)]
        force: bool,
    },

    /// Change an appointment's status
    SetStatus {
        id: u64,
        /// e.g. arrived, ready, in-treatment, completed
        status: String,
    },

    /// Delete an appointment
    Delete { id: u64 },

    /// Check a slot for conflicts without booking
    Conflicts {
        #[arg(long)]
        provider: u32,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long, default_value = "")]
        room: String,
        /// Appointment being moved
        #[arg(long)]
        exclude: Option<u64>,
    },

    /// Show the waiting queue
    Queue {
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Show the daily dashboard
    Dashboard {
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Convert a date to the Khmer lunar calendar
    Lunar { date: String },

    /// List lunar holidays of a year
    Holidays {
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Download the daily report as CSV
    Report {
        date: String,
        /// Output file (default: daily-report-<date>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show server health
    Health,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// `?a=1&b=x%20y` from the parameters that are set
fn query_string(params: &[(&str, Option<&str>)]) -> String {
    let pairs: Vec<String> = params
        .iter()
        .filter_map(|(key, value)| {
            value.map(|v| format!("{}={}", key, urlencoding::encode(v)))
        })
        .collect();

    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}

/// Send a request and decode the JSON body, turning API errors into messages
async fn fetch(request: reqwest::RequestBuilder) -> anyhow::Result<Value> {
    let response = request.send().await.context("cannot reach the Dentacal API")?;
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if !status.is_success() {
        let message = body["error"]["message"]
            .as_str()
            .unwrap_or("request failed")
            .to_string();
        if let Some(conflicts) = body["error"]["details"].as_array() {
            print_conflicts(conflicts);
        }
        bail!("{} ({})", message, status);
    }
    Ok(body)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let api = format!("{}/api/v1", cli.api_url.trim_end_matches('/'));
    let lang = cli.lang.as_deref();
    let as_json = cli.format == "json";

    match cli.command {
        Commands::List {
            month,
            day,
            status,
            providers,
            search,
        } => {
            let query = query_string(&[
                ("month", month.as_deref()),
                ("day", day.as_deref()),
                ("status", status.as_deref()),
                ("providers", providers.as_deref()),
                ("search", search.as_deref()),
            ]);
            let data = fetch(client.get(format!("{}/appointments{}", api, query))).await?;

            if as_json {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                print_appointments(data["appointments"].as_array().map(Vec::as_slice).unwrap_or(&[]));
            }
        }

        Commands::Book {
            patient,
            provider,
            start,
            end,
            treatment,
            room,
            notes,
            force,
        } => {
            let body = json!({
                "patientId": patient,
                "providerId": provider,
                "dateStart": start,
                "dateEnd": end,
                "treatmentCategory": treatment,
                "roomNumber": room,
                "notes": notes,
            });
            let url = format!("{}/appointments?allowConflicts={}", api, force);
            let appt = fetch(client.post(url).json(&body)).await?;

            if as_json {
                println!("{}", serde_json::to_string_pretty(&appt)?);
            } else {
                println!(
                    "Booked #{} {} with {} at {}",
                    appt["id"],
                    appt["patientName"].as_str().unwrap_or("-"),
                    appt["providerName"].as_str().unwrap_or("-"),
                    appt["dateStart"].as_str().unwrap_or("-"),
                );
            }
        }

        Commands::SetStatus { id, status } => {
            let url = format!("{}/appointments/{}/status", api, id);
            let appt = fetch(client.post(url).json(&json!({ "status": status }))).await?;
            println!(
                "#{} is now {} (priority {})",
                id,
                appt["type"].as_str().unwrap_or("-"),
                appt["priorityScore"]
            );
        }

        Commands::Delete { id } => {
            fetch(client.delete(format!("{}/appointments/{}", api, id))).await?;
            println!("Deleted #{}", id);
        }

        Commands::Conflicts {
            provider,
            start,
            end,
            room,
            exclude,
        } => {
            let body = json!({
                "providerId": provider,
                "dateStart": start,
                "dateEnd": end,
                "roomNumber": room,
                "excludeId": exclude,
            });
            let data = fetch(client.post(format!("{}/appointments/conflicts", api)).json(&body))
                .await?;

            if as_json {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                match data["conflicts"].as_array() {
                    Some(conflicts) if !conflicts.is_empty() => print_conflicts(conflicts),
                    _ => println!("Slot is free"),
                }
            }
        }

        Commands::Queue { date } => {
            let query = query_string(&[("date", date.as_deref()), ("lang", lang)]);
            let data = fetch(client.get(format!("{}/views/queue{}", api, query))).await?;

            if as_json {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                print_queue(&data);
            }
        }

        Commands::Dashboard { date } => {
            let query = query_string(&[("date", date.as_deref()), ("lang", lang)]);
            let data = fetch(client.get(format!("{}/views/dashboard{}", api, query))).await?;

            if as_json {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                print_dashboard(&data);
            }
        }

        Commands::Lunar { date } => {
            let query = query_string(&[("lang", lang)]);
            let data = fetch(client.get(format!("{}/lunar/date/{}{}", api, date, query))).await?;

            if as_json {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                let holy = if data["isHolyDay"].as_bool().unwrap_or(false) {
                    " (holy day)"
                } else {
                    ""
                };
                println!("{}: {}{}", date, data["label"].as_str().unwrap_or("-"), holy);
            }
        }

        Commands::Holidays { year } => {
            let year = year.map(|y| y.to_string());
            let query = query_string(&[("year", year.as_deref()), ("lang", lang)]);
            let data = fetch(client.get(format!("{}/lunar/holidays{}", api, query))).await?;

            if as_json {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                println!("Lunar holidays {}", data["year"]);
                println!("{}", "-".repeat(50));
                for holiday in data["holidays"].as_array().into_iter().flatten() {
                    println!(
                        "{:<12} {}",
                        holiday["date"].as_str().unwrap_or("-"),
                        holiday["name"].as_str().unwrap_or("-")
                    );
                }
            }
        }

        Commands::Report { date, output } => {
            let day: chrono::NaiveDate = date
                .parse()
                .with_context(|| format!("invalid date '{}', expected YYYY-MM-DD", date))?;
            let response = client
                .get(format!("{}/reports/{}/csv", api, day))
                .send()
                .await
                .context("cannot reach the Dentacal API")?;

            if !response.status().is_success() {
                bail!("Report export failed: {}", response.status());
            }

            let csv = response.text().await?;
            let path = output.unwrap_or_else(|| PathBuf::from(dentacal::report::csv_filename(day)));
            std::fs::write(&path, csv).with_context(|| format!("writing {}", path.display()))?;
            println!("Report written to {}", path.display());
        }

        Commands::Health => {
            let response = client.get(format!("{}/health", cli.api_url)).send().await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let health: Value = resp.json().await?;

                    println!("Dentacal v{}", env!("CARGO_PKG_VERSION"));
                    println!();
                    println!("API Status: {}", health["status"].as_str().unwrap_or("unknown"));
                    println!("Storage: {}", health["storage"].as_str().unwrap_or("unknown"));
                    println!(
                        "Data origin: {}",
                        health["data_origin"]["kind"].as_str().unwrap_or("unknown")
                    );
                    println!("Appointments: {}", health["appointments"]);

                    if let Some(uptime) = health["uptime_seconds"].as_u64() {
                        println!("Uptime: {}", format_duration(uptime));
                    }
                }
                Ok(resp) => {
                    bail!("API returned error: {}", resp.status());
                }
                Err(e) => {
                    eprintln!("Cannot connect to Dentacal API at {}", cli.api_url);
                    eprintln!();
                    eprintln!("Make sure the server is running:");
                    eprintln!("  cargo run --bin dentacal");
                    return Err(e.into());
                }
            }
        }

        Commands::Config { output } => {
            let config = dentacal::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

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

fn text<'a>(value: &'a Value, key: &str) -> &'a str {
    value[key].as_str().unwrap_or("-")
}

fn print_appointments(rows: &[Value]) {
    if rows.is_empty() {
        println!("No appointments match");
        return;
    }

    println!(
        "{:<14} {:<17} {:<20} {:<18} {:<14} {:>5}",
        "ID", "Start", "Patient", "Provider", "Status", "Score"
    );
    println!("{}", "-".repeat(93));

    for row in rows {
        println!(
            "{:<14} {:<17} {:<20} {:<18} {:<14} {:>5}",
            row["id"],
            text(row, "dateStart"),
            text(row, "patientName"),
            text(row, "providerName"),
            text(row, "type"),
            row["priorityScore"]
        );
    }
}

fn print_conflicts(conflicts: &[Value]) {
    println!("Conflicts:");
    for conflict in conflicts {
        let kinds: Vec<&str> = conflict["kinds"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .collect();
        println!(
            "  #{} {} {}-{} with {} in room {} [{}]",
            conflict["appointmentId"],
            text(conflict, "patientName"),
            text(conflict, "dateStart"),
            text(conflict, "dateEnd"),
            text(conflict, "providerName"),
            text(conflict, "roomNumber"),
            kinds.join(", ")
        );
    }
}

fn print_queue(data: &Value) {
    println!("Queue for {}", text(data, "date"));
    println!(
        "{:>3} {:<20} {:<18} {:<12} {:>6} {:>6}",
        "#", "Patient", "Provider", "Status", "Wait", "Score"
    );
    println!("{}", "-".repeat(70));

    for entry in data["waiting"].as_array().into_iter().flatten() {
        let urgent = if entry["urgent"].as_bool().unwrap_or(false) { " !" } else { "" };
        println!(
            "{:>3} {:<20} {:<18} {:<12} {:>5}m {:>6}{}",
            entry["position"],
            text(entry, "patientName"),
            text(entry, "providerName"),
            text(entry, "statusLabel"),
            entry["waitMinutes"],
            entry["priorityScore"],
            urgent
        );
    }

    println!();
    println!("Average wait: {} min", data["averageWaitMinutes"]);

    let chairs: Vec<&str> = data["inTreatment"]
        .as_array()
        .into_iter()
        .flatten()
        .map(|e| text(e, "patientName"))
        .collect();
    if !chairs.is_empty() {
        println!("In treatment: {}", chairs.join(", "));
    }
}

fn print_dashboard(data: &Value) {
    println!("Dashboard for {}", text(data, "date"));
    println!();
    println!("Appointments: {}", data["total"]);
    println!(
        "Waiting: {}  In treatment: {}  Completed: {}  No-show: {}  Cancelled: {}",
        data["waiting"], data["inTreatment"], data["completed"], data["noShow"], data["cancelled"]
    );
    println!(
        "Collected: {:.2}  Outstanding: {:.2}",
        data["revenueCollected"].as_f64().unwrap_or(0.0),
        data["outstandingBalance"].as_f64().unwrap_or(0.0)
    );

    println!();
    println!("{:<20} {:>6} {:>8}", "Provider", "Appts", "Minutes");
    for load in data["providerLoad"].as_array().into_iter().flatten() {
        println!(
            "{:<20} {:>6} {:>8}",
            text(load, "name"),
            load["appointments"],
            load["bookedMinutes"]
        );
    }

    let upcoming = data["upcoming"].as_array().map(Vec::as_slice).unwrap_or(&[]);
    if !upcoming.is_empty() {
        println!();
        println!("Upcoming:");
        for item in upcoming {
            println!(
                "  {} {} with {} (in {} min)",
                text(item, "time"),
                text(item, "patientName"),
                text(item, "providerName"),
                item["minutesUntil"]
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_string_encodes_and_skips_unset() {
        assert_eq!(query_string(&[("day", None)]), "");
        assert_eq!(
            query_string(&[("day", Some("2024-05-03")), ("search", Some("sok dara")), ("x", None)]),
            "?day=2024-05-03&search=sok%20dara"
        );
    }

    #[test]
    fn test_cli_parses_book() {
        let cli = Cli::try_parse_from([
            "dentacal-cli",
            "book",
            "--patient",
            "1",
            "--provider",
            "2",
            "--start",
            "2024-05-03 09:00",
            "--end",
            "2024-05-03 09:30",
            "--force",
        ])
        .unwrap();

        match cli.command {
            Commands::Book { patient, force, .. } => {
                assert_eq!(patient, 1);
                assert!(force);
            }
            _ => panic!("expected book"),
        }
    }
}
