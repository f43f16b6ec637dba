use super::{custom_field::RawFieldValue, Owner};
use serde::Serialize;
use uuid::Uuid;

/// Holds document tree metadata.
/// Main document model, a join of the `nodes` and `documents` tables.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    /// Primary key.
    pub id: Uuid,

    /// Document title, unique among its siblings.
    pub title: String,

    /// Containing folder.
    pub parent_id: Option<Uuid>,

    pub owner: Owner,

    pub document_type_id: Option<Uuid>,
}

/// Document category determining which custom fields a document has
/// and where it should be placed.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentType {
    pub id: Uuid,
    pub name: String,

    /// Template evaluated per document to obtain its target path.
    pub path_template: Option<String>,
}

/// A document along with all the custom fields of its type and their (possibly missing) values,
/// in the order the fields are defined on the type.
#[derive(Debug, Clone)]
pub struct DocumentCfv {
    pub document: Document,
    pub fields: Vec<RawFieldValue>,
}

/// New location of a document, used for batch updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLocation {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub title: String,
}
