use super::mkdir::{FolderCache, FolderResolver};
use crate::{
    config::{NOTIF_DOCUMENTS_MOVED, NOTIF_DOCUMENT_MOVED, PAGE_SIZE},
    core::{
        context::DocumentContext,
        model::{
            document::{Document, DocumentCfv, DocumentLocation, DocumentType},
            Pagination,
        },
        path::TargetPath,
        repo::{document::DocumentRepo, node::NodeRepo, Atomic},
        template::PathTemplate,
    },
    err,
    error::{DocpathErr, DocpathError},
    map_err, transaction,
};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, error, info};
use uuid::Uuid;
use validify::Validate;

/// Outcome of moving a single document, published as a `document_moved` notification.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveResult {
    pub document_id: Uuid,
    pub old_title: String,
    pub new_title: String,
    pub source_folder_id: Option<Uuid>,
    pub target_folder_id: Uuid,
}

impl MoveResult {
    pub fn notification(&self) -> &'static str {
        NOTIF_DOCUMENT_MOVED
    }
}

/// Outcome of moving all documents of a type, published as a `documents_moved` notification.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkMoveResult {
    pub count: usize,
    pub document_type_id: Uuid,
    pub document_type_name: String,
    pub source_folder_ids: BTreeSet<Uuid>,
    pub target_folder_ids: BTreeSet<Uuid>,
}

impl BulkMoveResult {
    fn new(dtype: &DocumentType) -> Self {
        Self {
            count: 0,
            document_type_id: dtype.id,
            document_type_name: dtype.name.clone(),
            source_folder_ids: BTreeSet::new(),
            target_folder_ids: BTreeSet::new(),
        }
    }

    pub fn notification(&self) -> &'static str {
        NOTIF_DOCUMENTS_MOVED
    }
}

/// Folders touched by a single page of a bulk move.
#[derive(Debug, Default)]
struct PageMove {
    count: usize,
    source_folder_ids: BTreeSet<Uuid>,
    target_folder_ids: BTreeSet<Uuid>,
}

/// Page size for a bulk move of `total` documents, never larger than `max` and never zero.
pub fn page_size(total: usize, max: usize) -> usize {
    let max = max.max(1);
    match total.min(max) {
        0 => max,
        size => size,
    }
}

/// High level operations for moving documents to the locations their path templates evaluate to.
#[derive(Debug, Clone)]
pub struct MoveService<R> {
    repo: R,
    resolver: FolderResolver<R>,
    template: PathTemplate,
    max_page_size: usize,
}

impl<R> MoveService<R>
where
    R: DocumentRepo + NodeRepo + Atomic + Clone + Send + Sync,
{
    pub fn new(repo: R, template: PathTemplate) -> Self {
        Self {
            resolver: FolderResolver::new(repo.clone()),
            repo,
            template,
            max_page_size: PAGE_SIZE,
        }
    }

    /// Set the upper bound for the amount of documents processed per page in bulk moves.
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.max_page_size = size.max(1);
        self
    }

    pub fn resolver(&self) -> &FolderResolver<R> {
        &self.resolver
    }

    /// Evaluate the document's path template and move it to the resulting location.
    /// The document is renamed if the path does not end with a separator.
    ///
    /// * `document_id`: Document ID.
    pub async fn move_document(&self, document_id: Uuid) -> Result<MoveResult, DocpathError> {
        let Some(document) = self.repo.get_document(document_id).await? else {
            return err!(DoesNotExist, "Document with ID {document_id}");
        };

        let template = self.path_template(&document).await?;
        let fields = self.repo.get_custom_field_values(document_id).await?;
        let cfv = DocumentCfv { document, fields };

        let ctx = DocumentContext::assemble(&cfv)?;
        let ev_path = self.template.render(&template, &ctx)?;
        let target = TargetPath::parse(&ev_path)?;

        debug!("Document {document_id} evaluated to '{ev_path}'");

        let DocumentCfv { document, .. } = cfv;
        let owner = document.owner;
        let new_title = target.title.clone().unwrap_or_else(|| document.title.clone());
        let title = new_title.clone();

        let target_folder = transaction!(self.repo, |tx| async move {
            let tx: &mut R::Tx = tx;
            let mut cache = FolderCache::default();
            let folder = self.resolver.resolve(&target, owner, &mut cache, tx).await?;
            let location = DocumentLocation {
                id: document_id,
                parent_id: folder.id,
                title,
            };
            self.repo.update_location(&location, tx).await?;
            Ok(folder)
        })?;

        info!(
            "Moved document {document_id} to '{}' ({}) as '{new_title}'",
            target_folder.title, target_folder.id
        );

        Ok(MoveResult {
            document_id,
            old_title: document.title,
            new_title,
            source_folder_id: document.parent_id,
            target_folder_id: target_folder.id,
        })
    }

    /// Evaluate the path template of the document type for each of its documents and move them.
    ///
    /// Documents are processed in pages, each committed in its own transaction. If a page fails
    /// the previous pages stay moved and the returned error holds the amount of moved documents.
    ///
    /// * `document_type_id`: Document type ID.
    pub async fn move_documents(
        &self,
        document_type_id: Uuid,
    ) -> Result<BulkMoveResult, DocpathError> {
        let Some(dtype) = self.repo.get_document_type(document_type_id).await? else {
            return err!(DoesNotExist, "Document type with ID {document_type_id}");
        };

        let Some(ref template) = dtype.path_template else {
            return err!(
                DoesNotExist,
                "Path template for document type '{}' ({document_type_id})",
                dtype.name
            );
        };

        let total = self.repo.count_by_type(document_type_id).await?;
        let per_page = page_size(total, self.max_page_size);
        let pages = total.div_ceil(per_page);

        info!(
            "Moving {total} documents of type '{}' in {pages} page(s) of {per_page}",
            dtype.name
        );

        let mut result = BulkMoveResult::new(&dtype);

        for page in 1..=pages {
            let p = Pagination::new(per_page, page);

            match self.move_page(template, document_type_id, p).await {
                Ok(moved) => {
                    debug!("Page {page}/{pages} moved {} documents", moved.count);
                    result.count += moved.count;
                    result.source_folder_ids.extend(moved.source_folder_ids);
                    result.target_folder_ids.extend(moved.target_folder_ids);
                }
                Err(cause) => {
                    error!(
                        "Page {page}/{pages} of type '{}' failed after {} moved documents; {cause}",
                        dtype.name, result.count
                    );
                    return Err(DocpathError::new(
                        file!(),
                        line!(),
                        column!(),
                        DocpathErr::BulkAborted {
                            moved: result.count,
                            cause: Box::new(cause),
                        },
                    ));
                }
            }
        }

        info!(
            "Moved {} documents of type '{}' into {} folder(s)",
            result.count,
            dtype.name,
            result.target_folder_ids.len()
        );

        Ok(result)
    }

    /// Evaluate and apply one page of a bulk move. All templates of the page are rendered
    /// before anything is written.
    async fn move_page(
        &self,
        template: &str,
        document_type_id: Uuid,
        p: Pagination,
    ) -> Result<PageMove, DocpathError> {
        map_err!(p.validate());

        let documents = self.repo.list_by_type(document_type_id, p).await?;

        let contexts = documents
            .iter()
            .map(DocumentContext::assemble)
            .collect::<Result<Vec<_>, _>>()?;

        let paths = self.template.render_all(template, &contexts)?;

        let mut moves = Vec::with_capacity(documents.len());
        for (cfv, ev_path) in documents.iter().zip(paths) {
            let target = TargetPath::parse(&ev_path)?;
            moves.push((&cfv.document, target));
        }

        transaction!(self.repo, |tx| async move {
            let tx: &mut R::Tx = tx;
            let mut cache = FolderCache::default();
            let mut page = PageMove::default();
            let mut locations = Vec::with_capacity(moves.len());

            for (document, target) in moves {
                let folder = self
                    .resolver
                    .resolve(&target, document.owner, &mut cache, tx)
                    .await?;

                if let Some(source) = document.parent_id {
                    page.source_folder_ids.insert(source);
                }
                page.target_folder_ids.insert(folder.id);

                locations.push(DocumentLocation {
                    id: document.id,
                    parent_id: folder.id,
                    title: target.title.unwrap_or_else(|| document.title.clone()),
                });
            }

            self.repo.update_locations(&locations, tx).await?;
            page.count = locations.len();

            debug!("Resolved {} distinct folders for page", cache.len());

            Ok(page)
        })
    }

    /// Get the path template of the document's type.
    async fn path_template(&self, document: &Document) -> Result<String, DocpathError> {
        let Some(type_id) = document.document_type_id else {
            return err!(DoesNotExist, "Document type of document {}", document.id);
        };

        let Some(dtype) = self.repo.get_document_type(type_id).await? else {
            return err!(DoesNotExist, "Document type with ID {type_id}");
        };

        match dtype.path_template {
            Some(template) => Ok(template),
            None => err!(
                DoesNotExist,
                "Path template for document type '{}' ({type_id})",
                dtype.name
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_bounded_and_non_zero() {
        assert_eq!(PAGE_SIZE, page_size(0, PAGE_SIZE));
        assert_eq!(3, page_size(3, PAGE_SIZE));
        assert_eq!(PAGE_SIZE, page_size(PAGE_SIZE, PAGE_SIZE));
        assert_eq!(PAGE_SIZE, page_size(PAGE_SIZE * 5 + 1, PAGE_SIZE));
        assert_eq!(1, page_size(10, 0));
    }

    #[test]
    fn page_count_covers_all_documents() {
        let cases: [(usize, usize, usize); 5] =
            [(0, 10, 0), (1, 10, 1), (10, 10, 1), (11, 10, 2), (25, 10, 3)];
        for (total, max, pages) in cases {
            assert_eq!(pages, total.div_ceil(page_size(total, max)), "{total}/{max}");
        }
    }

    #[test]
    fn move_result_serializes_camel_case() {
        let result = MoveResult {
            document_id: Uuid::nil(),
            old_title: "receipt.pdf".to_string(),
            new_title: "bon.pdf".to_string(),
            source_folder_id: None,
            target_folder_id: Uuid::nil(),
        };

        let json = serde_json::to_value(&result).unwrap();

        assert_eq!("bon.pdf", json["newTitle"]);
        assert!(json["sourceFolderId"].is_null());
        assert_eq!(NOTIF_DOCUMENT_MOVED, result.notification());
    }
}
