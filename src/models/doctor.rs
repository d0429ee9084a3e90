use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Activated doctor offered in the booking form.
///
/// The directory endpoint is loose about naming, so every name field is
/// optional and `display_name` picks the best one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorInfo {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

impl DoctorInfo {
    /// name → fullName → "first last" → email local part → "Unknown".
    pub fn display_name(&self) -> String {
        let non_blank = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };

        if let Some(name) = non_blank(&self.name).or_else(|| non_blank(&self.full_name)) {
            return name;
        }

        let joined = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        );
        let joined = joined.trim();
        if !joined.is_empty() {
            return joined.to_string();
        }

        match self.email.split('@').next() {
            Some(local) if !local.is_empty() => local.to_string(),
            _ => "Unknown".to_string(),
        }
    }
}

/// One row of the doctor's patient list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInfo {
    pub patient_id: String,
    #[serde(default)]
    pub patient_name: String,
    #[serde(default)]
    pub patient_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_phone: Option<String>,
    #[serde(default)]
    pub total_appointments: u32,
    #[serde(default)]
    pub completed_appointments: u32,
    #[serde(default)]
    pub cancelled_appointments: u32,
    #[serde(default, with = "crate::datetime::option", skip_serializing_if = "Option::is_none")]
    pub last_appointment_date: Option<NaiveDateTime>,
    #[serde(default, with = "crate::datetime::option", skip_serializing_if = "Option::is_none")]
    pub next_appointment_date: Option<NaiveDateTime>,
    #[serde(default, with = "crate::datetime::option", skip_serializing_if = "Option::is_none")]
    pub first_visit_date: Option<NaiveDateTime>,
}

/// Patient record opened from the doctor dashboard.
///
/// Only `id` is guaranteed. Medical fields are kept as the server sends
/// them (text or list).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientDetails {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergies: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_medications: Option<serde_json::Value>,
}

impl PatientDetails {
    /// name → "first last" → "Patient".
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            return name.to_string();
        }
        let joined = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        );
        match joined.trim() {
            "" => "Patient".to_string(),
            name => name.to_string(),
        }
    }
}

impl From<&PatientInfo> for PatientDetails {
    fn from(row: &PatientInfo) -> Self {
        let non_blank = |s: &str| (!s.trim().is_empty()).then(|| s.to_string());
        Self {
            id: row.patient_id.clone(),
            name: non_blank(&row.patient_name),
            email: non_blank(&row.patient_email),
            phone: row.patient_phone.clone(),
            ..Default::default()
        }
    }
}

/// Server-computed dashboard statistics for the logged-in doctor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DoctorStats {
    pub doctor_id: String,
    pub doctor_name: String,
    pub specialization: String,
    pub today_appointments: u32,
    pub today_completed: u32,
    pub today_pending: u32,
    pub pending_appointments: u32,
    pub total_appointments: u32,
    pub total_patients: u32,
    pub upcoming_appointments: u32,
    pub completed_appointments: u32,
    pub cancelled_appointments: u32,
    pub this_week_appointments: u32,
    pub this_month_appointments: u32,
    #[serde(with = "crate::datetime::option", skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<NaiveDateTime>,
}
