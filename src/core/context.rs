//! Snapshot of the document attributes path templates can reference.

use crate::{
    config::INCOMING_DATE_FORMAT,
    core::model::{
        custom_field::{CustomFieldType, CustomFieldValue},
        document::DocumentCfv,
    },
    error::DocpathError,
};
use chrono::NaiveDate;
use minijinja::value::{Enumerator, Object, ObjectRepr, Value};
use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};
use uuid::Uuid;

/// A single custom field of a document. Equality and hashing only consider the name and value.
#[derive(Debug, Clone)]
pub struct CustomFieldEntry {
    pub name: String,
    pub value: Option<CustomFieldValue>,
    pub ty: CustomFieldType,
}

impl CustomFieldEntry {
    pub fn new(name: impl Into<String>, value: Option<CustomFieldValue>, ty: CustomFieldType) -> Self {
        Self {
            name: name.into(),
            value,
            ty,
        }
    }
}

impl PartialEq for CustomFieldEntry {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.value == other.value
    }
}

impl Eq for CustomFieldEntry {}

impl Hash for CustomFieldEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.value.hash(state);
    }
}

/// Immutable, per move snapshot of a document. Exposed to templates as `document`.
#[derive(Debug, Clone)]
pub struct DocumentContext {
    pub id: Uuid,
    pub title: String,
    custom_fields: Vec<CustomFieldEntry>,
}

impl DocumentContext {
    pub fn new(id: Uuid, title: impl Into<String>, custom_fields: Vec<CustomFieldEntry>) -> Self {
        Self {
            id,
            title: title.into(),
            custom_fields,
        }
    }

    /// Build the context from a document and its joined custom field values,
    /// coercing each stored value to its typed form.
    pub fn assemble(cfv: &DocumentCfv) -> Result<Self, DocpathError> {
        let custom_fields = cfv
            .fields
            .iter()
            .map(|field| {
                let value = CustomFieldValue::parse(field.ty, field.value.as_deref())?;
                Ok(CustomFieldEntry::new(field.name.clone(), value, field.ty))
            })
            .collect::<Result<Vec<_>, DocpathError>>()?;

        Ok(Self::new(
            cfv.document.id,
            cfv.document.title.clone(),
            custom_fields,
        ))
    }

    pub fn custom_fields(&self) -> &[CustomFieldEntry] {
        &self.custom_fields
    }

    /// `true` if the document has at least one custom field and all of them are set.
    pub fn has_all_cf(&self) -> bool {
        !self.custom_fields.is_empty() && self.custom_fields.iter().all(|cf| cf.value.is_some())
    }

    /// Get the value of the custom field with the given name, or `None` if the field
    /// is unset or the document type has no such field.
    pub fn cf(&self, name: &str) -> Option<&CustomFieldValue> {
        self.custom_fields
            .iter()
            .find(|cf| cf.name == name)
            .and_then(|cf| cf.value.as_ref())
    }
}

impl Object for DocumentContext {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        match key.as_str()? {
            "id" => Some(Value::from(self.id.to_string())),
            "title" => Some(Value::from(self.title.as_str())),
            "has_all_cf" => Some(Value::from(self.has_all_cf())),
            "cf" => Some(Value::from_object(CustomFieldLookup(self.clone()))),
            _ => None,
        }
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Str(&["id", "title", "has_all_cf", "cf"])
    }
}

/// Template side view of the custom fields, `document.cf`.
/// Unknown names resolve to `none` instead of being undefined.
#[derive(Debug)]
struct CustomFieldLookup(Arc<DocumentContext>);

impl Object for CustomFieldLookup {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let name = key.as_str()?;
        Some(self.0.cf(name).map(template_value).unwrap_or(Value::from(())))
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Values(
            self.0
                .custom_fields
                .iter()
                .map(|cf| Value::from(cf.name.as_str()))
                .collect(),
        )
    }
}

/// Dates are kept as opaque objects so the `datefmt` filter can tell them apart from text.
#[derive(Debug)]
pub struct DateValue(pub NaiveDate);

impl Object for DateValue {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Plain
    }

    fn render(self: &Arc<Self>, f: &mut fmt::Formatter<'_>) -> fmt::Result
    where
        Self: Sized + 'static,
    {
        write!(f, "{}", self.0.format(INCOMING_DATE_FORMAT))
    }
}

fn template_value(value: &CustomFieldValue) -> Value {
    match value {
        CustomFieldValue::Text(v) => Value::from(v.as_str()),
        CustomFieldValue::Date(v) => Value::from_object(DateValue(*v)),
        CustomFieldValue::Boolean(v) => Value::from(*v),
        CustomFieldValue::Int(v) => Value::from(*v),
        CustomFieldValue::Float(v) => Value::from(*v),
        // Same form as the stored NUMERIC(16, 2) cast to text.
        CustomFieldValue::Monetary(v) => Value::from(format!("{v:.2}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{
        custom_field::RawFieldValue,
        document::{Document, DocumentCfv},
        Owner,
    };
    use std::collections::HashSet;

    fn groceries(shop: Option<&str>, total: Option<f64>) -> DocumentContext {
        DocumentContext::new(
            Uuid::new_v4(),
            "momo",
            vec![
                CustomFieldEntry::new(
                    "Shop",
                    shop.map(|s| CustomFieldValue::Text(s.to_string())),
                    CustomFieldType::Text,
                ),
                CustomFieldEntry::new(
                    "Total",
                    total.map(CustomFieldValue::Monetary),
                    CustomFieldType::Monetary,
                ),
                CustomFieldEntry::new(
                    "Effective Date",
                    Some(CustomFieldValue::Date(
                        NaiveDate::from_ymd_opt(2024, 12, 23).unwrap(),
                    )),
                    CustomFieldType::Date,
                ),
            ],
        )
    }

    #[test]
    fn context_basic() {
        let doc = groceries(Some("lidl"), Some(10.34));

        assert_eq!(Some(&CustomFieldValue::Monetary(10.34)), doc.cf("Total"));
        assert_eq!(
            Some(&CustomFieldValue::Text("lidl".to_string())),
            doc.cf("Shop")
        );
        assert_eq!(
            Some(&CustomFieldValue::Date(
                NaiveDate::from_ymd_opt(2024, 12, 23).unwrap()
            )),
            doc.cf("Effective Date")
        );
        assert!(doc.has_all_cf());
    }

    #[test]
    fn context_without_cf() {
        let doc = DocumentContext::new(Uuid::new_v4(), "momo", vec![]);

        assert!(doc.cf("Total").is_none());
        assert!(doc.cf("Shop").is_none());
        assert!(!doc.has_all_cf());
    }

    #[test]
    fn context_some_cf_missing() {
        let doc = groceries(Some("lidl"), None);

        assert!(!doc.has_all_cf());
        assert!(doc.cf("Total").is_none());
    }

    #[test]
    fn entry_identity_ignores_type() {
        let a = CustomFieldEntry::new(
            "Total",
            Some(CustomFieldValue::Int(10)),
            CustomFieldType::Int,
        );
        let b = CustomFieldEntry::new(
            "Total",
            Some(CustomFieldValue::Int(10)),
            CustomFieldType::Monetary,
        );
        let c = CustomFieldEntry::new("Total", None, CustomFieldType::Int);

        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(2, set.len());
    }

    #[test]
    fn assemble_keeps_definition_order_and_nulls() {
        let cfv = DocumentCfv {
            document: Document {
                id: Uuid::new_v4(),
                title: "bon.pdf".to_string(),
                parent_id: None,
                owner: Owner::User(Uuid::new_v4()),
                document_type_id: None,
            },
            fields: vec![
                RawFieldValue {
                    name: "Shop".to_string(),
                    ty: CustomFieldType::Text,
                    value: Some("rewe".to_string()),
                },
                RawFieldValue {
                    name: "Total".to_string(),
                    ty: CustomFieldType::Monetary,
                    value: None,
                },
                RawFieldValue {
                    name: "EffectiveDate".to_string(),
                    ty: CustomFieldType::Date,
                    value: Some("2024-11-18".to_string()),
                },
            ],
        };

        let ctx = DocumentContext::assemble(&cfv).unwrap();
        let names: Vec<_> = ctx.custom_fields().iter().map(|cf| cf.name.as_str()).collect();

        assert_eq!(vec!["Shop", "Total", "EffectiveDate"], names);
        assert_eq!("bon.pdf", ctx.title);
        assert!(ctx.cf("Total").is_none());
        assert!(!ctx.has_all_cf());
        assert_eq!(
            Some(&CustomFieldValue::Date(
                NaiveDate::from_ymd_opt(2024, 11, 18).unwrap()
            )),
            ctx.cf("EffectiveDate")
        );
    }

    #[test]
    fn stored_empty_text_is_set() {
        let cfv = DocumentCfv {
            document: Document {
                id: Uuid::new_v4(),
                title: "bon.pdf".to_string(),
                parent_id: None,
                owner: Owner::User(Uuid::new_v4()),
                document_type_id: None,
            },
            fields: vec![RawFieldValue {
                name: "Shop".to_string(),
                ty: CustomFieldType::Text,
                value: Some(String::new()),
            }],
        };

        let ctx = DocumentContext::assemble(&cfv).unwrap();

        assert_eq!(Some(&CustomFieldValue::Text(String::new())), ctx.cf("Shop"));
        assert!(ctx.has_all_cf());
    }
}
