use super::Owner;
use crate::{err, error::DocpathError};
use serde::Serialize;
use uuid::Uuid;

/// Discriminates the two kinds of tree entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Folder,
    Document,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::Document => "document",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for NodeKind {
    type Error = DocpathError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "folder" => Ok(Self::Folder),
            "document" => Ok(Self::Document),
            _ => err!(DoesNotExist, "Node kind '{value}'"),
        }
    }
}

/// A tree entry, either a folder or a document.
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub id: Uuid,
    pub title: String,
    pub parent_id: Option<Uuid>,
    pub owner: Owner,
    pub kind: NodeKind,
}

/// A node of kind folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Folder {
    pub id: Uuid,
    pub title: String,
    pub parent_id: Option<Uuid>,
    pub owner: Owner,
}

impl TryFrom<Node> for Folder {
    type Error = DocpathError;

    fn try_from(node: Node) -> Result<Self, Self::Error> {
        let Node {
            id,
            title,
            parent_id,
            owner,
            kind,
        } = node;

        if kind != NodeKind::Folder {
            return err!(NodeConflict, "node '{title}' ({id}) is a {kind}, not a folder");
        }

        Ok(Self {
            id,
            title,
            parent_id,
            owner,
        })
    }
}

/// DTO for inserting folders.
#[derive(Debug)]
pub struct FolderInsert<'a> {
    pub id: Uuid,
    pub title: &'a str,
    pub parent_id: Uuid,
    pub owner: Owner,
}

impl<'a> FolderInsert<'a> {
    pub fn new(title: &'a str, parent_id: Uuid, owner: Owner) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            parent_id,
            owner,
        }
    }
}
