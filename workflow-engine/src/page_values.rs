// Values read off host pages and reduced to what the alert note prints

use crate::collaborators::AppointmentRow;
use crate::note::NO_APPOINTMENT;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

pub const GUARANTOR_BALANCE_LABEL: &str = "Guarantor Balance";
pub const ZERO_BALANCE: &str = "$0.00";

/// Visit types worth mentioning in the alert note
pub const QUALIFYING_APPOINTMENT_TYPES: [&str; 6] = [
    "ESTABLISHED",
    "PHYSICAL",
    "MEDICARE WELLNESS VISIT",
    "ER FU",
    "HOSPITAL FU",
    "NEW PATIENT",
];

lazy_static! {
    static ref MONEY_REGEX: Regex = Regex::new(r"\$\d+(?:,\d{3})*(?:\.\d{2})?").unwrap();
    // Applied in order; the generic PATIENT rule must run last.
    static ref ABBREVIATIONS: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"(?i)MEDICARE WELLNESS VISIT").unwrap(), "MWV"),
        (Regex::new(r"(?i)HOSPITAL FU").unwrap(), "Hosp FU"),
        (Regex::new(r"(?i)PHYSICAL EXAM").unwrap(), "PE"),
        (Regex::new(r"(?i)OVER 40").unwrap(), ">40"),
        (Regex::new(r"(?i)NEW PATIENT").unwrap(), "New Pt"),
        (Regex::new(r"(?i)ESTABLISHED").unwrap(), "Est"),
        (Regex::new(r"(?i)PATIENT").unwrap(), "Pt"),
    ];
}

/// First money token of the labeled balance cell; nothing found reads as zero
pub fn parse_guarantor_balance(raw: Option<&str>) -> String {
    raw.and_then(|text| MONEY_REGEX.find(text))
        .map_or_else(|| ZERO_BALANCE.to_string(), |m| m.as_str().to_string())
}

pub fn abbreviate_appointment_type(appointment_type: &str) -> String {
    ABBREVIATIONS
        .iter()
        .fold(appointment_type.to_string(), |text, (pattern, short)| {
            pattern.replace_all(&text, *short).into_owned()
        })
}

fn appointment_date(date_time: &str) -> Option<NaiveDate> {
    let date = date_time.split_whitespace().next()?;
    NaiveDate::parse_from_str(date, "%m/%d/%Y").ok()
}

fn qualifies(appointment_type: &str) -> bool {
    let upper = appointment_type.to_uppercase();
    QUALIFYING_APPOINTMENT_TYPES.iter().any(|t| upper.contains(t))
}

/// `"<date time> - <short type> - <resource>"` for the earliest qualifying
/// appointment on or after `today`. Rows sharing a date keep the first one.
pub fn next_appointment_summary(rows: &[AppointmentRow], today: NaiveDate) -> String {
    let mut closest: Option<(NaiveDate, &AppointmentRow)> = None;

    for row in rows {
        if !qualifies(&row.appointment_type) {
            continue;
        }
        let Some(date) = appointment_date(&row.date_time) else {
            debug!(date_time = %row.date_time, "skipping appointment with unreadable date");
            continue;
        };
        if date < today {
            continue;
        }
        if closest.map_or(true, |(best, _)| date < best) {
            closest = Some((date, row));
        }
    }

    closest.map_or_else(
        || NO_APPOINTMENT.to_string(),
        |(_, row)| {
            format!(
                "{} - {} - {}",
                row.date_time.trim(),
                abbreviate_appointment_type(row.appointment_type.trim()),
                row.resource.trim()
            )
        },
    )
}
