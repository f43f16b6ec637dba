use crate::{config::INCOMING_DATE_FORMAT, err, error::DocpathError};
use chrono::NaiveDate;
use serde::Serialize;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Length of a `YYYY-MM-DD` date.
const DATE_LEN: usize = 10;

/// The types a custom field value can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomFieldType {
    Text,
    Date,
    Boolean,
    Int,
    Float,
    Monetary,
}

impl CustomFieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Date => "date",
            Self::Boolean => "boolean",
            Self::Int => "int",
            Self::Float => "float",
            Self::Monetary => "monetary",
        }
    }
}

impl std::fmt::Display for CustomFieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for CustomFieldType {
    type Error = DocpathError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "text" => Ok(Self::Text),
            "date" => Ok(Self::Date),
            "boolean" => Ok(Self::Boolean),
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            "monetary" => Ok(Self::Monetary),
            _ => err!(InvalidCustomFieldValue, "unknown custom field type '{value}'"),
        }
    }
}

/// Custom field definition.
#[derive(Debug, Clone, Serialize)]
pub struct CustomField {
    pub id: Uuid,
    pub name: String,
    pub ty: CustomFieldType,
    pub extra_data: Option<serde_json::Value>,
}

/// A typed custom field value.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CustomFieldValue {
    Text(String),
    Date(NaiveDate),
    Boolean(bool),
    Int(i64),
    Float(f64),
    Monetary(f64),
}

impl CustomFieldValue {
    /// Coerce the textual representation of a stored value into its typed form.
    ///
    /// `None` yields `None`, meaning the value is unset. Blank strings are unset for
    /// every type except text, where an empty value is distinct from a missing one.
    ///
    /// * `ty`: The custom field type.
    /// * `raw`: The value cast to text by the repository.
    pub fn parse(ty: CustomFieldType, raw: Option<&str>) -> Result<Option<Self>, DocpathError> {
        let Some(raw) = raw else {
            return Ok(None);
        };

        let value = raw.trim();

        if value.is_empty() && ty != CustomFieldType::Text {
            return Ok(None);
        }

        let value = match ty {
            CustomFieldType::Text => Self::Text(raw.to_string()),
            CustomFieldType::Date => Self::Date(parse_date(value)?),
            CustomFieldType::Boolean => match value.to_lowercase().as_str() {
                "true" | "t" | "1" | "yes" => Self::Boolean(true),
                "false" | "f" | "0" | "no" => Self::Boolean(false),
                _ => return err!(InvalidCustomFieldValue, "'{value}' is not a boolean"),
            },
            CustomFieldType::Int => match value.parse() {
                Ok(v) => Self::Int(v),
                Err(e) => return err!(InvalidCustomFieldValue, "'{value}' is not an int; {e}"),
            },
            CustomFieldType::Float => match value.parse() {
                Ok(v) => Self::Float(v),
                Err(e) => return err!(InvalidCustomFieldValue, "'{value}' is not a float; {e}"),
            },
            CustomFieldType::Monetary => match value.parse() {
                Ok(v) => Self::Monetary(v),
                Err(e) => {
                    return err!(InvalidCustomFieldValue, "'{value}' is not a monetary amount; {e}")
                }
            },
        };

        Ok(Some(value))
    }
}

impl std::fmt::Display for CustomFieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(v) => write!(f, "{v}"),
            Self::Date(v) => write!(f, "{}", v.format(INCOMING_DATE_FORMAT)),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Monetary(v) => write!(f, "{v:.2}"),
        }
    }
}

// Floats compare by their bit pattern so equality stays consistent with hashing.
impl PartialEq for CustomFieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Monetary(a), Self::Monetary(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for CustomFieldValue {}

impl Hash for CustomFieldValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Text(v) => v.hash(state),
            Self::Date(v) => v.hash(state),
            Self::Boolean(v) => v.hash(state),
            Self::Int(v) => v.hash(state),
            Self::Float(v) | Self::Monetary(v) => v.to_bits().hash(state),
        }
    }
}

/// A custom field joined with the textual form of its value for one document,
/// as obtained from the repository. `value` is `None` when the document has no value row.
#[derive(Debug, Clone)]
pub struct RawFieldValue {
    pub name: String,
    pub ty: CustomFieldType,
    pub value: Option<String>,
}

/// Convert an incoming user string to a date. Only the first 10 characters are considered,
/// so timestamps are accepted and truncated.
pub fn parse_date(value: &str) -> Result<NaiveDate, DocpathError> {
    let value = value.trim();

    if value.len() < DATE_LEN {
        return err!(
            InvalidCustomFieldValue,
            "{value} expected to have at least {DATE_LEN} characters"
        );
    }

    let Some(date) = value.get(..DATE_LEN) else {
        return err!(InvalidCustomFieldValue, "{value} is not a date");
    };

    match NaiveDate::parse_from_str(date, INCOMING_DATE_FORMAT) {
        Ok(date) => Ok(date),
        Err(e) => err!(InvalidCustomFieldValue, "{value} is not a date; {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocpathErr;

    #[test]
    fn parse_null_and_blank_is_unset() {
        assert!(CustomFieldValue::parse(CustomFieldType::Date, None)
            .unwrap()
            .is_none());
        assert!(CustomFieldValue::parse(CustomFieldType::Date, Some("   "))
            .unwrap()
            .is_none());
        assert!(CustomFieldValue::parse(CustomFieldType::Monetary, Some(""))
            .unwrap()
            .is_none());
    }

    #[test]
    fn parse_blank_text_is_set() {
        assert_eq!(
            Some(CustomFieldValue::Text(String::new())),
            CustomFieldValue::parse(CustomFieldType::Text, Some("")).unwrap()
        );
        assert!(CustomFieldValue::parse(CustomFieldType::Text, None)
            .unwrap()
            .is_none());
    }

    #[test]
    fn parse_date_truncates_timestamps() {
        let value = CustomFieldValue::parse(CustomFieldType::Date, Some("2024-11-18 00:00:00"))
            .unwrap()
            .unwrap();
        assert_eq!(
            CustomFieldValue::Date(NaiveDate::from_ymd_opt(2024, 11, 18).unwrap()),
            value
        );
    }

    #[test]
    fn parse_short_date_fails() {
        let err = CustomFieldValue::parse(CustomFieldType::Date, Some("2024-11")).unwrap_err();
        assert!(matches!(err.error, DocpathErr::InvalidCustomFieldValue(_)));
    }

    #[test]
    fn parse_typed_values() {
        assert_eq!(
            Some(CustomFieldValue::Monetary(10.34)),
            CustomFieldValue::parse(CustomFieldType::Monetary, Some("10.34")).unwrap()
        );
        assert_eq!(
            Some(CustomFieldValue::Boolean(true)),
            CustomFieldValue::parse(CustomFieldType::Boolean, Some("true")).unwrap()
        );
        assert_eq!(
            Some(CustomFieldValue::Int(42)),
            CustomFieldValue::parse(CustomFieldType::Int, Some("42")).unwrap()
        );
        assert_eq!(
            Some(CustomFieldValue::Text(" lidl".to_string())),
            CustomFieldValue::parse(CustomFieldType::Text, Some(" lidl")).unwrap()
        );
        assert!(CustomFieldValue::parse(CustomFieldType::Int, Some("forty")).is_err());
    }

    #[test]
    fn monetary_displays_two_decimals() {
        assert_eq!("10.30", CustomFieldValue::Monetary(10.3).to_string());
    }
}
