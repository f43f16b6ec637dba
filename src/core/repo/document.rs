use super::Atomic;
use crate::{
    core::model::{
        custom_field::RawFieldValue,
        document::{Document, DocumentCfv, DocumentLocation, DocumentType},
        Pagination,
    },
    error::DocpathError,
};
use std::collections::HashMap;
use uuid::Uuid;

/// Keeps track of documents, their types and custom field values.
#[async_trait::async_trait]
pub trait DocumentRepo: Atomic {
    /// Get document metadata based on ID.
    ///
    /// * `id`: Document ID.
    async fn get_document(&self, id: Uuid) -> Result<Option<Document>, DocpathError>;

    /// Get a document type based on ID.
    ///
    /// * `id`: Document type ID.
    async fn get_document_type(&self, id: Uuid) -> Result<Option<DocumentType>, DocpathError>;

    /// Count the documents of the given type.
    ///
    /// * `document_type_id`: Document type ID.
    async fn count_by_type(&self, document_type_id: Uuid) -> Result<usize, DocpathError>;

    /// List documents of the given type, ordered by ID, along with the custom fields of the type
    /// and the documents' values for them.
    ///
    /// * `document_type_id`: Document type ID.
    /// * `p`: Pagination params.
    async fn list_by_type(
        &self,
        document_type_id: Uuid,
        p: Pagination,
    ) -> Result<Vec<DocumentCfv>, DocpathError>;

    /// Get the custom fields of the document's type joined with the document's values,
    /// in the order the fields are defined on the type.
    ///
    /// * `document_id`: Document ID.
    async fn get_custom_field_values(
        &self,
        document_id: Uuid,
    ) -> Result<Vec<RawFieldValue>, DocpathError>;

    /// Set custom field values by field name. Fields not defined on the document's type
    /// are ignored. Blank values clear the field.
    ///
    /// * `document_id`: Document ID.
    /// * `values`: Field name to user provided value.
    async fn upsert_custom_field_values(
        &self,
        document_id: Uuid,
        values: &HashMap<String, String>,
    ) -> Result<Vec<RawFieldValue>, DocpathError>;

    /// Set the parent and title of a single document.
    ///
    /// * `location`: New location.
    /// * `tx`: The transaction to run in.
    async fn update_location(
        &self,
        location: &DocumentLocation,
        tx: &mut Self::Tx,
    ) -> Result<u64, DocpathError>;

    /// Set the parent and title of many documents in a single statement.
    ///
    /// * `locations`: New locations.
    /// * `tx`: The transaction to run in.
    async fn update_locations(
        &self,
        locations: &[DocumentLocation],
        tx: &mut Self::Tx,
    ) -> Result<u64, DocpathError>;
}
