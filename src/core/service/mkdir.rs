use crate::{
    core::{
        model::{
            node::{Folder, FolderInsert},
            Owner,
        },
        path::TargetPath,
        repo::{node::NodeRepo, Atomic},
    },
    err,
    error::DocpathError,
    transaction,
};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Folders already resolved within one unit of work, keyed by owner and the
/// `/` joined folder titles below home. The empty key is the home folder.
#[derive(Debug, Default)]
pub struct FolderCache {
    folders: HashMap<(Owner, String), Folder>,
}

impl FolderCache {
    fn get(&self, owner: Owner, key: &str) -> Option<&Folder> {
        self.folders.get(&(owner, key.to_string()))
    }

    fn insert(&mut self, owner: Owner, key: String, folder: Folder) {
        self.folders.insert((owner, key), folder);
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }
}

/// Materializes the folders of evaluated paths below the owner's home folder.
/// Existing folders are reused, so resolving the same path any number of times
/// yields the same folder.
#[derive(Debug, Clone)]
pub struct FolderResolver<R> {
    repo: R,
}

impl<R> FolderResolver<R>
where
    R: NodeRepo + Atomic + Send + Sync,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Parse `path` and create all of its folders in a transaction.
    /// Returns the deepest folder, i.e. the parent for the document being moved.
    ///
    /// * `path`: Evaluated path.
    /// * `owner`: The owner of the created folders.
    pub async fn mkdir(&self, path: &str, owner: Owner) -> Result<Folder, DocpathError> {
        let target = TargetPath::parse(path)?;

        transaction!(self.repo, |tx| async move {
            let mut cache = FolderCache::default();
            self.resolve(&target, owner, &mut cache, tx).await
        })
    }

    /// Walk the folders of `path` from home downwards, creating the missing ones.
    ///
    /// * `path`: Parsed target path.
    /// * `owner`: The owner of the created folders.
    /// * `cache`: Folders resolved earlier in the same transaction.
    /// * `tx`: The transaction to run in.
    pub async fn resolve(
        &self,
        path: &TargetPath,
        owner: Owner,
        cache: &mut FolderCache,
        tx: &mut R::Tx,
    ) -> Result<Folder, DocpathError> {
        let mut parent = match cache.get(owner, "") {
            Some(home) => home.clone(),
            None => {
                let Some(home) = self.repo.get_home(owner, tx).await? else {
                    return err!(DoesNotExist, "Home folder of {owner}");
                };
                cache.insert(owner, String::new(), home.clone());
                home
            }
        };

        for (title, key) in path.folders.iter().zip(path.prefixes()) {
            if let Some(folder) = cache.get(owner, &key) {
                parent = folder.clone();
                continue;
            }

            let folder = self.mkdir_node(&parent, title, owner, tx).await?;
            cache.insert(owner, key, folder.clone());
            parent = folder;
        }

        Ok(parent)
    }

    /// Get or create the folder `title` under `parent`.
    async fn mkdir_node(
        &self,
        parent: &Folder,
        title: &str,
        owner: Owner,
        tx: &mut R::Tx,
    ) -> Result<Folder, DocpathError> {
        if let Some(node) = self.repo.get_child(parent.id, title, owner, tx).await? {
            return Folder::try_from(node);
        }

        let insert = FolderInsert::new(title, parent.id, owner);
        if let Some(folder) = self.repo.insert_folder(insert, tx).await? {
            debug!("Created folder '{title}' ({}) under {}", folder.id, parent.id);
            return Ok(folder);
        }

        // Someone else created it between the lookup and the insert.
        warn!(
            "Folder '{title}' under {} created concurrently, reusing it",
            parent.id
        );

        match self.repo.get_child(parent.id, title, owner, tx).await? {
            Some(node) => Folder::try_from(node),
            None => err!(
                NodeConflict,
                "'{title}' under {} conflicts with a node not visible to {owner}",
                parent.id
            ),
        }
    }
}
