//! Vendor applications: a customer's request to start selling.
//!
//! A customer holds at most one open application at a time. Reviewing an
//! application and granting the vendor role are not done here; this module
//! covers submission, the applicant's own status page, and the read-only
//! views administrators work from.

use crate::profile::RoleProfile;
use carnaval_core::{ApplicationId, UserId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Applications submitted within this many days count as recent.
pub const RECENT_WINDOW_DAYS: i64 = 7;

/// Kind of business applying to sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BusinessType {
    #[serde(rename = "agencia_viajes")]
    TravelAgency,
    #[serde(rename = "hotel")]
    Hotel,
    #[serde(rename = "restaurante")]
    Restaurant,
    #[serde(rename = "independiente")]
    Independent,
    #[serde(rename = "otro")]
    Other,
}

impl BusinessType {
    /// Parses a stored or submitted business type, ignoring case.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "agencia_viajes" => Some(Self::TravelAgency),
            "hotel" => Some(Self::Hotel),
            "restaurante" => Some(Self::Restaurant),
            "independiente" => Some(Self::Independent),
            "otro" => Some(Self::Other),
            _ => None,
        }
    }

    /// Returns the canonical name used in storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TravelAgency => "agencia_viajes",
            Self::Hotel => "hotel",
            Self::Restaurant => "restaurante",
            Self::Independent => "independiente",
            Self::Other => "otro",
        }
    }
}

/// Where an application stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    /// Parses a stored or requested status, ignoring case.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "under_review" => Some(Self::UnderReview),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Returns true while the application still awaits a decision.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::UnderReview)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submitted application form that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidApplication(pub &'static str);

impl fmt::Display for InvalidApplication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl std::error::Error for InvalidApplication {}

/// Application form as submitted. Every field is checked by
/// [`ApplicationForm::validate`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationForm {
    pub business_name: Option<String>,
    pub business_type: Option<String>,
    pub tax_id: Option<String>,
    pub business_address: Option<String>,
    pub business_phone: Option<String>,
    pub business_email: Option<String>,
    pub years_of_experience: Option<i32>,
    pub description: Option<String>,
    pub why_want_to_sell: Option<String>,
    pub expected_sales_volume: Option<i32>,
}

/// Trims an optional text field, treating blank as absent, and enforces a
/// maximum length in characters.
fn bounded(
    value: Option<String>,
    max: usize,
    message: &'static str,
) -> Result<Option<String>, InvalidApplication> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    match value {
        Some(v) if v.chars().count() > max => Err(InvalidApplication(message)),
        other => Ok(other),
    }
}

fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.contains(char::is_whitespace)
}

impl ApplicationForm {
    /// Checks the form and normalizes its text fields.
    ///
    /// # Errors
    ///
    /// Returns the first problem found, with a message for the applicant.
    pub fn validate(self) -> Result<ApplicationDetails, InvalidApplication> {
        let business_name = self
            .business_name
            .map(|name| name.trim().to_string())
            .filter(|name| (3..=255).contains(&name.chars().count()))
            .ok_or(InvalidApplication(
                "El nombre del negocio debe tener entre 3 y 255 caracteres",
            ))?;

        let business_type = self
            .business_type
            .as_deref()
            .and_then(BusinessType::parse)
            .ok_or(InvalidApplication("Tipo de negocio inválido"))?;

        let tax_id = bounded(self.tax_id, 50, "El NIT no puede superar 50 caracteres")?;
        let business_address = bounded(
            self.business_address,
            500,
            "La dirección no puede superar 500 caracteres",
        )?;
        let business_phone = bounded(
            self.business_phone,
            20,
            "El teléfono no puede superar 20 caracteres",
        )?;

        let business_email = bounded(self.business_email, 255, "Email de negocio inválido")?;
        if business_email.as_deref().is_some_and(|e| !looks_like_email(e)) {
            return Err(InvalidApplication("Email de negocio inválido"));
        }

        let years_of_experience = self.years_of_experience.unwrap_or(0);
        if !(0..=50).contains(&years_of_experience) {
            return Err(InvalidApplication(
                "Los años de experiencia deben estar entre 0 y 50",
            ));
        }

        let description = bounded(
            self.description,
            1000,
            "La descripción no puede superar 1000 caracteres",
        )?;

        let why_want_to_sell = self
            .why_want_to_sell
            .map(|why| why.trim().to_string())
            .filter(|why| why.chars().count() >= 50)
            .ok_or(InvalidApplication("Debe explicar con al menos 50 caracteres"))?;
        if why_want_to_sell.chars().count() > 2000 {
            return Err(InvalidApplication(
                "La motivación no puede superar 2000 caracteres",
            ));
        }

        if self.expected_sales_volume.is_some_and(|volume| volume < 1) {
            return Err(InvalidApplication(
                "El volumen de ventas esperado debe ser al menos 1",
            ));
        }

        Ok(ApplicationDetails {
            business_name,
            business_type,
            tax_id,
            business_address,
            business_phone,
            business_email,
            years_of_experience,
            description,
            why_want_to_sell,
            expected_sales_volume: self.expected_sales_volume,
        })
    }
}

/// Validated business details of an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationDetails {
    pub business_name: String,
    pub business_type: BusinessType,
    pub tax_id: Option<String>,
    pub business_address: Option<String>,
    pub business_phone: Option<String>,
    pub business_email: Option<String>,
    pub years_of_experience: i32,
    pub description: Option<String>,
    pub why_want_to_sell: String,
    pub expected_sales_volume: Option<i32>,
}

/// A vendor application.
///
/// The applicant's name and e-mail are captured from their role profile at
/// submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorApplication {
    pub id: ApplicationId,
    pub user_id: UserId,
    pub applicant_name: Option<String>,
    pub applicant_email: String,
    #[serde(flatten)]
    pub details: ApplicationDetails,
    #[serde(rename = "application_status")]
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

impl VendorApplication {
    /// Builds a fresh, pending application for the owner of `profile`.
    #[must_use]
    pub fn submit(profile: &RoleProfile, details: ApplicationDetails) -> Self {
        Self {
            id: ApplicationId::new(),
            user_id: profile.id.clone(),
            applicant_name: profile.full_name.clone(),
            applicant_email: profile.email.clone(),
            details,
            status: ApplicationStatus::Pending,
            submitted_at: Utc::now(),
            reviewed_at: None,
            rejection_reason: None,
        }
    }
}

/// Number of applications for one business type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusinessTypeCount {
    #[serde(rename = "type")]
    pub business_type: BusinessType,
    pub count: usize,
}

/// Dashboard figures over all applications.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationStats {
    pub total_applications: usize,
    pub pending_count: usize,
    pub approved_count: usize,
    pub rejected_count: usize,
    pub under_review_count: usize,
    /// Submitted within the last [`RECENT_WINDOW_DAYS`] days.
    pub recent_applications: usize,
    /// Most common business type first.
    pub business_types: Vec<BusinessTypeCount>,
    /// Percentage of applications approved, to two decimals.
    pub approval_rate: f64,
}

impl ApplicationStats {
    /// Computes the figures for `applications` as of `now`.
    #[must_use]
    pub fn tally(applications: &[VendorApplication], now: DateTime<Utc>) -> Self {
        let count = |status| applications.iter().filter(|a| a.status == status).count();
        let recent_since = now - Duration::days(RECENT_WINDOW_DAYS);

        let mut by_type: BTreeMap<BusinessType, usize> = BTreeMap::new();
        for application in applications {
            *by_type.entry(application.details.business_type).or_default() += 1;
        }
        let mut business_types: Vec<BusinessTypeCount> = by_type
            .into_iter()
            .map(|(business_type, count)| BusinessTypeCount {
                business_type,
                count,
            })
            .collect();
        business_types.sort_by(|a, b| b.count.cmp(&a.count));

        let total = applications.len();
        let approved = count(ApplicationStatus::Approved);
        let approval_rate = if total == 0 {
            0.0
        } else {
            (approved as f64 / total as f64 * 10_000.0).round() / 100.0
        };

        Self {
            total_applications: total,
            pending_count: count(ApplicationStatus::Pending),
            approved_count: approved,
            rejected_count: count(ApplicationStatus::Rejected),
            under_review_count: count(ApplicationStatus::UnderReview),
            recent_applications: applications
                .iter()
                .filter(|a| a.submitted_at >= recent_since)
                .count(),
            business_types,
            approval_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::NewProfile;

    const MOTIVATION: &str =
        "Tengo diez años vendiendo paquetes turísticos para la entrada del Carnaval.";

    fn form() -> ApplicationForm {
        ApplicationForm {
            business_name: Some("  Viajes Oruro  ".to_string()),
            business_type: Some("agencia_viajes".to_string()),
            why_want_to_sell: Some(MOTIVATION.to_string()),
            ..ApplicationForm::default()
        }
    }

    fn application(
        business_type: BusinessType,
        status: ApplicationStatus,
        submitted_at: DateTime<Utc>,
    ) -> VendorApplication {
        let profile = RoleProfile::from_new(NewProfile::new(
            UserId::new("u1"),
            "ana@example.com".to_string(),
        ));
        let mut details = form().validate().expect("valid form");
        details.business_type = business_type;
        let mut application = VendorApplication::submit(&profile, details);
        application.status = status;
        application.submitted_at = submitted_at;
        application
    }

    #[test]
    fn valid_form_is_normalized() {
        let details = ApplicationForm {
            tax_id: Some("   ".to_string()),
            business_email: Some(" ventas@viajes.bo ".to_string()),
            ..form()
        }
        .validate()
        .expect("valid form");

        assert_eq!(details.business_name, "Viajes Oruro");
        assert_eq!(details.business_type, BusinessType::TravelAgency);
        assert_eq!(details.tax_id, None);
        assert_eq!(details.business_email.as_deref(), Some("ventas@viajes.bo"));
        assert_eq!(details.years_of_experience, 0);
    }

    #[test]
    fn short_motivation_is_rejected() {
        let err = ApplicationForm {
            why_want_to_sell: Some("Quiero vender".to_string()),
            ..form()
        }
        .validate()
        .expect_err("too short");
        assert_eq!(err.0, "Debe explicar con al menos 50 caracteres");
    }

    #[test]
    fn field_limits_are_enforced() {
        let cases = [
            (
                ApplicationForm {
                    business_name: Some("ab".to_string()),
                    ..form()
                },
                "El nombre del negocio debe tener entre 3 y 255 caracteres",
            ),
            (
                ApplicationForm {
                    business_type: Some("casino".to_string()),
                    ..form()
                },
                "Tipo de negocio inválido",
            ),
            (
                ApplicationForm {
                    business_phone: Some("1".repeat(21)),
                    ..form()
                },
                "El teléfono no puede superar 20 caracteres",
            ),
            (
                ApplicationForm {
                    business_email: Some("ventas@".to_string()),
                    ..form()
                },
                "Email de negocio inválido",
            ),
            (
                ApplicationForm {
                    years_of_experience: Some(51),
                    ..form()
                },
                "Los años de experiencia deben estar entre 0 y 50",
            ),
            (
                ApplicationForm {
                    expected_sales_volume: Some(0),
                    ..form()
                },
                "El volumen de ventas esperado debe ser al menos 1",
            ),
        ];
        for (form, message) in cases {
            assert_eq!(form.validate().expect_err(message).0, message);
        }
    }

    #[test]
    fn open_statuses() {
        assert!(ApplicationStatus::Pending.is_open());
        assert!(ApplicationStatus::UnderReview.is_open());
        assert!(!ApplicationStatus::Approved.is_open());
        assert!(!ApplicationStatus::Rejected.is_open());
        assert_eq!(
            ApplicationStatus::parse("UNDER_REVIEW"),
            Some(ApplicationStatus::UnderReview)
        );
        assert_eq!(ApplicationStatus::parse("archived"), None);
    }

    #[test]
    fn application_serializes_with_stored_names() {
        let application = application(
            BusinessType::Restaurant,
            ApplicationStatus::UnderReview,
            Utc::now(),
        );
        let json = serde_json::to_value(&application).expect("serialize");
        assert_eq!(json["application_status"], "under_review");
        assert_eq!(json["business_type"], "restaurante");
        assert_eq!(json["business_name"], "Viajes Oruro");
        assert_eq!(json["user_id"], "u1");
        assert_eq!(json["applicant_email"], "ana@example.com");
    }

    #[test]
    fn tally_counts_statuses_types_and_recent() {
        let now = Utc::now();
        let old = now - Duration::days(30);
        let applications = vec![
            application(BusinessType::Hotel, ApplicationStatus::Approved, old),
            application(BusinessType::Hotel, ApplicationStatus::Rejected, old),
            application(BusinessType::Restaurant, ApplicationStatus::Pending, now),
        ];

        let stats = ApplicationStats::tally(&applications, now);

        assert_eq!(stats.total_applications, 3);
        assert_eq!(stats.approved_count, 1);
        assert_eq!(stats.rejected_count, 1);
        assert_eq!(stats.pending_count, 1);
        assert_eq!(stats.under_review_count, 0);
        assert_eq!(stats.recent_applications, 1);
        assert_eq!(
            stats.business_types[0],
            BusinessTypeCount {
                business_type: BusinessType::Hotel,
                count: 2
            }
        );
        assert!((stats.approval_rate - 33.33).abs() < f64::EPSILON);
    }

    #[test]
    fn tally_of_nothing_is_zero() {
        let stats = ApplicationStats::tally(&[], Utc::now());
        assert_eq!(stats.total_applications, 0);
        assert!(stats.business_types.is_empty());
        assert_eq!(stats.approval_rate, 0.0);
    }
}
