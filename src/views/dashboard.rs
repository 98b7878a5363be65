//! Front desk dashboard

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::i18n::{status_label, Language};
use crate::storage::{Appointment, AppointmentStatus, Payment, Provider};

/// How many upcoming appointments the dashboard lists
pub const UPCOMING_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: AppointmentStatus,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderLoad {
    pub provider_id: u32,
    pub name: String,
    pub color: String,
    pub appointments: usize,
    pub booked_minutes: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingItem {
    pub appointment_id: u64,
    pub time: String,
    pub patient_name: String,
    pub provider_name: String,
    pub treatment_category: String,
    pub minutes_until: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub date: NaiveDate,
    pub total: usize,
    pub by_status: Vec<StatusCount>,
    pub waiting: usize,
    pub in_treatment: usize,
    pub completed: usize,
    pub no_show: usize,
    pub cancelled: usize,
    /// Paid on `date`
    pub revenue_collected: f64,
    /// Unpaid balance across all payments
    pub outstanding_balance: f64,
    pub provider_load: Vec<ProviderLoad>,
    pub upcoming: Vec<UpcomingItem>,
}

pub fn build_dashboard(
    date: NaiveDate,
    now: NaiveDateTime,
    appointments: &[Appointment],
    payments: &[Payment],
    providers: &[Provider],
    lang: Language,
) -> DashboardView {
    let day: Vec<&Appointment> = appointments.iter().filter(|a| a.date() == date).collect();
    let count = |pred: &dyn Fn(&Appointment) -> bool| day.iter().filter(|a| pred(**a)).count();

    let by_status = AppointmentStatus::all()
        .iter()
        .map(|&status| StatusCount {
            status,
            label: status_label(status, lang),
            count: count(&|a| a.status == status),
        })
        .collect();

    let provider_load = providers
        .iter()
        .map(|p| {
            let booked: Vec<&&Appointment> = day
                .iter()
                .filter(|a| a.provider_id == p.id && a.status.occupies_slot())
                .collect();
            ProviderLoad {
                provider_id: p.id,
                name: p.name.clone(),
                color: p.color.clone(),
                appointments: booked.len(),
                booked_minutes: booked.iter().map(|a| a.duration_minutes()).sum(),
            }
        })
        .collect();

    let mut upcoming: Vec<&Appointment> = day
        .iter()
        .copied()
        .filter(|a| a.status == AppointmentStatus::Scheduled && a.date_start >= now)
        .collect();
    upcoming.sort_by(|a, b| a.date_start.cmp(&b.date_start).then(a.id.cmp(&b.id)));

    DashboardView {
        date,
        total: day.len(),
        by_status,
        waiting: count(&|a| a.status.is_waiting()),
        in_treatment: count(&|a| a.status == AppointmentStatus::InTreatment),
        completed: count(&|a| a.status == AppointmentStatus::Completed),
        no_show: count(&|a| a.status == AppointmentStatus::NoShow),
        cancelled: count(&|a| a.status == AppointmentStatus::Cancelled),
        revenue_collected: payments
            .iter()
            .filter(|p| p.paid_date == date)
            .map(|p| p.paid_amount)
            .sum(),
        outstanding_balance: payments.iter().map(|p| p.balance()).sum(),
        provider_load,
        upcoming: upcoming
            .into_iter()
            .take(UPCOMING_LIMIT)
            .map(|a| UpcomingItem {
                appointment_id: a.id,
                time: a.date_start.format("%H:%M").to_string(),
                patient_name: a.patient_name.clone(),
                provider_name: a.provider_name.clone(),
                treatment_category: a.treatment_category.clone(),
                minutes_until: (a.date_start - now).num_minutes(),
            })
            .collect(),
    }
}
