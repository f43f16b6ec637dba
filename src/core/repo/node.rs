use super::Atomic;
use crate::{
    core::model::{
        node::{Folder, FolderInsert, Node},
        Owner,
    },
    error::DocpathError,
};
use uuid::Uuid;

/// Keeps track of the folder tree.
#[async_trait::async_trait]
pub trait NodeRepo: Atomic {
    /// Get any node by its ID.
    ///
    /// * `id`: Node ID.
    async fn get_node(&self, id: Uuid) -> Result<Option<Node>, DocpathError>;

    /// Get the root folder of the owner's document tree.
    ///
    /// * `owner`: User or group.
    /// * `tx`: The transaction to run in.
    async fn get_home(
        &self,
        owner: Owner,
        tx: &mut Self::Tx,
    ) -> Result<Option<Folder>, DocpathError>;

    /// Get the node titled `title` directly below `parent_id` belonging to the owner.
    /// The node is returned regardless of its kind so callers can detect title clashes.
    ///
    /// * `parent_id`: Containing folder.
    /// * `title`: Node title.
    /// * `owner`: User or group.
    /// * `tx`: The transaction to run in.
    async fn get_child(
        &self,
        parent_id: Uuid,
        title: &str,
        owner: Owner,
        tx: &mut Self::Tx,
    ) -> Result<Option<Node>, DocpathError>;

    /// Insert a folder unless a sibling with the same title and owner already exists.
    /// Returns `None` on a uniqueness conflict, in which case nothing is written.
    ///
    /// * `folder`: Insert payload.
    /// * `tx`: The transaction to run in.
    async fn insert_folder(
        &self,
        folder: FolderInsert<'_>,
        tx: &mut Self::Tx,
    ) -> Result<Option<Folder>, DocpathError>;

    /// Get the `(id, title)` pairs of all the node's ancestors, root first.
    ///
    /// * `id`: Node ID.
    /// * `include_self`: Whether to append the node itself.
    async fn ancestors(
        &self,
        id: Uuid,
        include_self: bool,
    ) -> Result<Vec<(Uuid, String)>, DocpathError>;
}
