use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DeskError, Result};

pub const EXAMPLE_NARRATIVE: &str = "I'm a 65-year-old policyholder. I live in Milan. My BMW 5 Series was hit by another vehicle. Claim type: third-party liability. Rear bumper damaged badly. Claim is around €18,000.";

pub const STRUCTURED_TEMPLATE: &str = r#"{
  "POLICYHOLDER_AGE": 45,
  "WARRANTY": "comprehensive",
  "CLAIM_AMOUNT_PAID": 8500,
  "PREMIUM_AMOUNT_PAID": 1200,
  "CLAIM_REGION": "Rome",
  "VEHICLE_BRAND": "Audi"
}"#;

/// Which input view is active. Chosen explicitly by the user, never inferred from the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    #[default]
    Text,
    Structured,
}

/// Submission payload for the classification service.
///
/// Serializes as `{"text": "..."}` or `{"structured_data": {...}}`; the other key is never
/// present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimInput {
    Text(String),
    StructuredData(Map<String, Value>),
}

impl ClaimInput {
    pub fn mode(&self) -> InputMode {
        match self {
            ClaimInput::Text(_) => InputMode::Text,
            ClaimInput::StructuredData(_) => InputMode::Structured,
        }
    }
}

/// Turns the raw buffers into a payload for `mode`. Only the active buffer is read.
///
/// Text is trimmed and forwarded as-is. Structured input must parse as a flat JSON object of
/// scalars; keys are not checked against any vocabulary.
pub fn normalize(mode: InputMode, raw_text: &str, raw_structured: &str) -> Result<ClaimInput> {
    match mode {
        InputMode::Text => {
            let text = raw_text.trim();
            if text.is_empty() {
                return Err(DeskError::EmptyInput);
            }
            Ok(ClaimInput::Text(text.to_string()))
        }
        InputMode::Structured => parse_structured(raw_structured).map(ClaimInput::StructuredData),
    }
}

fn parse_structured(raw: &str) -> Result<Map<String, Value>> {
    if raw.trim().is_empty() {
        return Err(DeskError::EmptyInput);
    }

    let value: Value = serde_json::from_str(raw)
        .map_err(|e| DeskError::MalformedStructuredData(e.to_string()))?;

    let Value::Object(fields) = value else {
        return Err(DeskError::MalformedStructuredData(
            "expected a JSON object of field names to values".to_string(),
        ));
    };

    if let Some((key, _)) = fields
        .iter()
        .find(|(_, v)| matches!(v, Value::Array(_) | Value::Object(_)))
    {
        return Err(DeskError::MalformedStructuredData(format!(
            "field `{key}` must be a number, string, boolean or null"
        )));
    }

    Ok(fields)
}

/// The pending submission as the user is editing it.
///
/// Both buffers survive mode switches; only the active one is submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimDraft {
    mode: InputMode,
    text: String,
    structured: String,
}

impl ClaimDraft {
    pub fn new() -> Self {
        Self {
            mode: InputMode::Text,
            text: String::new(),
            structured: STRUCTURED_TEMPLATE.to_string(),
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn structured(&self) -> &str {
        &self.structured
    }

    /// Returns true when the mode actually changed.
    pub fn set_mode(&mut self, mode: InputMode) -> bool {
        let changed = self.mode != mode;
        self.mode = mode;
        changed
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn set_structured(&mut self, structured: impl Into<String>) {
        self.structured = structured.into();
    }

    pub fn load_example(&mut self) {
        self.text = EXAMPLE_NARRATIVE.to_string();
    }

    /// False while the active buffer is blank.
    pub fn can_submit(&self) -> bool {
        match self.mode {
            InputMode::Text => !self.text.trim().is_empty(),
            InputMode::Structured => !self.structured.trim().is_empty(),
        }
    }

    pub fn normalize(&self) -> Result<ClaimInput> {
        normalize(self.mode, &self.text, &self.structured)
    }
}

impl Default for ClaimDraft {
    fn default() -> Self {
        Self::new()
    }
}
