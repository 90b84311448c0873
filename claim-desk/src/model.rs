use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Severity assigned by the classifier. Ordered High > Medium > Low.
///
/// Labels the client does not recognise are kept verbatim in `Other` so a decision is never
/// dropped because the backend grew a new tier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Urgency {
    High,
    Medium,
    Low,
    Other(String),
}

/// Customer priority tier. Ordered VIP > Premium > Standard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CustomerValue {
    Vip,
    Premium,
    Standard,
    Other(String),
}

/// Classification scale with a fixed set of known tiers, most severe first.
pub trait Tiered: Clone + PartialEq {
    fn tiers() -> [Self; 3];
}

impl Tiered for Urgency {
    fn tiers() -> [Self; 3] {
        [Urgency::High, Urgency::Medium, Urgency::Low]
    }
}

impl Tiered for CustomerValue {
    fn tiers() -> [Self; 3] {
        [CustomerValue::Vip, CustomerValue::Premium, CustomerValue::Standard]
    }
}

impl Urgency {
    pub fn as_str(&self) -> &str {
        match self {
            Urgency::High => "High",
            Urgency::Medium => "Medium",
            Urgency::Low => "Low",
            Urgency::Other(label) => label.as_str(),
        }
    }
}

impl CustomerValue {
    pub fn as_str(&self) -> &str {
        match self {
            CustomerValue::Vip => "VIP",
            CustomerValue::Premium => "Premium",
            CustomerValue::Standard => "Standard",
            CustomerValue::Other(label) => label.as_str(),
        }
    }
}

impl From<String> for Urgency {
    fn from(label: String) -> Self {
        match label.as_str() {
            "High" => Urgency::High,
            "Medium" => Urgency::Medium,
            "Low" => Urgency::Low,
            _ => Urgency::Other(label),
        }
    }
}

impl From<Urgency> for String {
    fn from(urgency: Urgency) -> Self {
        match urgency {
            Urgency::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl From<String> for CustomerValue {
    fn from(label: String) -> Self {
        match label.as_str() {
            "VIP" => CustomerValue::Vip,
            "Premium" => CustomerValue::Premium,
            "Standard" => CustomerValue::Standard,
            _ => CustomerValue::Other(label),
        }
    }
}

impl From<CustomerValue> for String {
    fn from(value: CustomerValue) -> Self {
        match value {
            CustomerValue::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for CustomerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display band for a risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    pub fn from_score(score: f64) -> Self {
        if score > 0.7 {
            RiskBand::High
        } else if score > 0.4 {
            RiskBand::Medium
        } else {
            RiskBand::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FraudIndicator {
    #[serde(default)]
    pub is_potential_fraud: bool,
    #[serde(default)]
    pub fraud_score: f64,
    #[serde(default)]
    pub fraud_indicators: Vec<String>,
}

/// Claim facts as echoed back by the classifier.
///
/// Every field is optional: a text submission may not mention any of them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClaimData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policyholder_age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warranty: Option<String>,
    #[serde(
        default,
        deserialize_with = "non_negative",
        skip_serializing_if = "Option::is_none"
    )]
    pub claim_amount_paid: Option<f64>,
    #[serde(
        default,
        deserialize_with = "non_negative",
        skip_serializing_if = "Option::is_none"
    )]
    pub premium_amount_paid: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_province: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policyholder_gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_date: Option<String>,
    /// Original narrative, present only for text submissions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraud_indicator: Option<FraudIndicator>,
}

/// The classifier's routing decision for one claim.
///
/// A value object: it only ever comes from the backend (there is no public constructor) and
/// exposes read-only accessors. Adjuster annotations live beside it, never inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    claim_id: String,
    assigned_team: String,
    urgency: Urgency,
    #[serde(deserialize_with = "unit_interval")]
    risk_score: f64,
    customer_value: CustomerValue,
    reasoning: Vec<String>,
    #[serde(default)]
    claim_data: ClaimData,
    #[serde(default)]
    is_potential_fraud: bool,
    #[serde(default)]
    fraud_indicators: Vec<String>,
}

fn unit_interval<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let score = f64::deserialize(deserializer)?;
    if (0.0..=1.0).contains(&score) {
        Ok(score)
    } else {
        Err(serde::de::Error::custom(format!(
            "risk_score {score} outside [0.0, 1.0]"
        )))
    }
}

fn non_negative<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<f64>::deserialize(deserializer)? {
        Some(amount) if amount < 0.0 => Err(serde::de::Error::custom(format!(
            "amount {amount} is negative"
        ))),
        amount => Ok(amount),
    }
}

impl RoutingDecision {
    pub fn claim_id(&self) -> &str {
        &self.claim_id
    }

    pub fn assigned_team(&self) -> &str {
        &self.assigned_team
    }

    pub fn urgency(&self) -> &Urgency {
        &self.urgency
    }

    pub fn risk_score(&self) -> f64 {
        self.risk_score
    }

    pub fn risk_band(&self) -> RiskBand {
        RiskBand::from_score(self.risk_score)
    }

    /// Risk score as a rounded percentage, 0..=100.
    pub fn risk_percent(&self) -> u8 {
        (self.risk_score * 100.0).round() as u8
    }

    pub fn customer_value(&self) -> &CustomerValue {
        &self.customer_value
    }

    /// Justifications in the order the classifier produced them, primary reasons first.
    pub fn reasoning(&self) -> &[String] {
        &self.reasoning
    }

    pub fn claim_data(&self) -> &ClaimData {
        &self.claim_data
    }

    pub fn is_potential_fraud(&self) -> bool {
        self.is_potential_fraud
    }

    pub fn fraud_indicators(&self) -> &[String] {
        &self.fraud_indicators
    }
}

/// Formats a currency amount the way the review screens show it: `€18,000`, `€1,234.5`.
///
/// Missing and zero amounts render as `N/A`.
pub fn format_amount(amount: Option<f64>) -> String {
    let amount = match amount {
        Some(a) if a > 0.0 && a.is_finite() => a,
        _ => return "N/A".to_string(),
    };

    let fixed = format!("{amount:.2}");
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if fraction.is_empty() {
        format!("€{grouped}")
    } else {
        format!("€{grouped}.{fraction}")
    }
}
