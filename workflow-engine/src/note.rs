use crate::context::CostShare;
use chrono::NaiveDate;
use config_engine::AlertNoteConfig;
use serde::{Deserialize, Serialize};

pub const NOT_AVAILABLE: &str = "N/A";
pub const NO_APPOINTMENT: &str = "No appointment found";

/// Chart alert summarising a verification run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertNote {
    pub body: String,
    pub alert_on_scheduling: bool,
    pub alert_on_billing: bool,
}

impl AlertNote {
    pub fn new(body: impl Into<String>, config: &AlertNoteConfig) -> Self {
        Self {
            body: body.into(),
            alert_on_scheduling: config.alert_on_scheduling,
            alert_on_billing: config.alert_on_billing,
        }
    }
}

/// Render the alert note body. Missing values print as `N/A`; an empty
/// balance counts as missing.
pub fn format_alert_note(
    share: &CostShare,
    balance: Option<&str>,
    next_appointment: Option<&str>,
    verified_on: NaiveDate,
) -> String {
    let dollars = |v: Option<&str>| v.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("${}", v));
    let percent = |v: Option<&str>| v.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{}%", v));

    let primary_copay = dollars(share.primary_copay.as_ref().map(|m| m.as_str()));
    let primary_coins = percent(share.primary_coinsurance.as_ref().map(|p| p.as_str()));
    let urgent_copay = dollars(share.urgent_copay.as_ref().map(|m| m.as_str()));
    let urgent_coins = percent(share.urgent_coinsurance.as_ref().map(|p| p.as_str()));
    let balance = balance.filter(|b| !b.is_empty()).unwrap_or(NOT_AVAILABLE);
    let next_appointment = next_appointment.filter(|a| !a.is_empty()).unwrap_or(NO_APPOINTMENT);

    format!(
        "PRIMARY CARE  | Copay: {primary_copay} | Coinsurance: {primary_coins}\n\
         URGENT CARE   | Copay: {urgent_copay} | Coinsurance: {urgent_coins}\n\
         \n\
         Patient Balance: {balance}\n\
         \n\
         Next Appt: {next_appointment}\n\
         \n        ** Insurance verified: {} **",
        verified_on.format("%m/%d/%Y")
    )
}
