//! Daily report
//!
//! One row per appointment of the day in start order, with the money
//! collected that day attributed to each patient's first row. Reports are
//! stored by the clinic store and exported as CSV.

use chrono::{DateTime, NaiveDate, Utc};
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::storage::{Appointment, AppointmentStatus, Payment};

/// CSV header, in column order
pub const CSV_HEADERS: [&str; 9] = [
    "No",
    "Date",
    "Time",
    "Patient",
    "Provider",
    "Room",
    "Status",
    "Treatment",
    "Amount",
];

/// Errors raised while exporting a report
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Report is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

pub type ReportResult<T> = Result<T, ReportError>;

/// One appointment line of the report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub no: usize,
    pub appointment_id: u64,
    pub date: NaiveDate,
    /// `HH:MM-HH:MM`
    pub time: String,
    pub patient_name: String,
    pub provider_name: String,
    pub room_number: String,
    pub status: AppointmentStatus,
    pub treatment_category: String,
    pub amount: f64,
}

/// Day totals
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportTotals {
    pub appointments: usize,
    pub completed: usize,
    pub no_show: usize,
    pub cancelled: usize,
    /// Everything collected on the report date, including payments from
    /// patients without an appointment that day
    pub collected: f64,
    pub outstanding: f64,
}

/// A generated daily report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    pub report_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<ReportRow>,
    pub totals: ReportTotals,
}

impl DailyReport {
    /// Build the report for `date` from the store's collections
    pub fn build(
        date: NaiveDate,
        appointments: &[Appointment],
        payments: &[Payment],
        generated_at: DateTime<Utc>,
    ) -> Self {
        let mut day: Vec<&Appointment> = appointments.iter().filter(|a| a.date() == date).collect();
        day.sort_by(|a, b| a.date_start.cmp(&b.date_start).then(a.id.cmp(&b.id)));

        let day_payments: Vec<&Payment> = payments.iter().filter(|p| p.paid_date == date).collect();

        let mut credited = HashSet::new();
        let rows: Vec<ReportRow> = day
            .iter()
            .enumerate()
            .map(|(i, appt)| {
                let amount = if credited.insert(appt.patient_id) {
                    day_payments
                        .iter()
                        .filter(|p| p.patient_id == appt.patient_id)
                        .map(|p| p.paid_amount)
                        .sum()
                } else {
                    0.0
                };

                ReportRow {
                    no: i + 1,
                    appointment_id: appt.id,
                    date,
                    time: format!(
                        "{}-{}",
                        appt.date_start.format("%H:%M"),
                        appt.date_end.format("%H:%M")
                    ),
                    patient_name: appt.patient_name.clone(),
                    provider_name: appt.provider_name.clone(),
                    room_number: appt.room_number.clone(),
                    status: appt.status,
                    treatment_category: appt.treatment_category.clone(),
                    amount,
                }
            })
            .collect();

        let count = |status: AppointmentStatus| day.iter().filter(|a| a.status == status).count();
        let totals = ReportTotals {
            appointments: day.len(),
            completed: count(AppointmentStatus::Completed),
            no_show: count(AppointmentStatus::NoShow),
            cancelled: count(AppointmentStatus::Cancelled),
            collected: day_payments.iter().map(|p| p.paid_amount).sum(),
            outstanding: day_payments.iter().map(|p| p.balance()).sum(),
        };

        Self {
            report_date: date,
            generated_at,
            rows,
            totals,
        }
    }

    /// Download name for the CSV export
    pub fn csv_filename(&self) -> String {
        csv_filename(self.report_date)
    }

    /// Render the report as CSV
    pub fn to_csv(&self) -> ReportResult<String> {
        let mut wtr = WriterBuilder::new().from_writer(Vec::new());
        wtr.write_record(CSV_HEADERS)?;

        for row in &self.rows {
            wtr.write_record([
                row.no.to_string(),
                row.date.format("%Y-%m-%d").to_string(),
                row.time.clone(),
                row.patient_name.clone(),
                row.provider_name.clone(),
                row.room_number.clone(),
                row.status.as_str().to_string(),
                row.treatment_category.clone(),
                format!("{:.2}", row.amount),
            ])?;
        }

        let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8(bytes)?)
    }
}

/// `daily-report-<YYYY-MM-DD>.csv`
pub fn csv_filename(date: NaiveDate) -> String {
    format!("daily-report-{}.csv", date.format("%Y-%m-%d"))
}
