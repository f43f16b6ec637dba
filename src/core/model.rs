//! Defines application business models.

use crate::{err, error::DocpathError};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use uuid::Uuid;
use validify::Validate;

pub mod custom_field;
pub mod document;
pub mod node;

/// Used to paginate queries.
#[serde_as]
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// The limit.
    #[serde_as(as = "DisplayFromStr")]
    #[validate(range(min = 1.))]
    pub per_page: usize,

    /// The offset.
    #[serde_as(as = "DisplayFromStr")]
    #[validate(range(min = 1.))]
    pub page: usize,
}

impl Pagination {
    pub fn new(per_page: usize, page: usize) -> Self {
        Self { per_page, page }
    }

    /// Returns a tuple whose first element is the LIMIT and second
    /// the OFFSET for the query.
    pub fn to_limit_offset(&self) -> (i64, i64) {
        let Self { page, per_page } = self;
        (*per_page as i64, ((page - 1) * *per_page) as i64)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            per_page: 10,
            page: 1,
        }
    }
}

/// The scope a node belongs to. Every node is owned either by a user or by a group, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum Owner {
    User(Uuid),
    Group(Uuid),
}

impl Owner {
    /// Build the owner from the nullable ownership columns.
    /// Exactly one of the two must be set.
    pub fn from_ids(user_id: Option<Uuid>, group_id: Option<Uuid>) -> Result<Self, DocpathError> {
        match (user_id, group_id) {
            (Some(id), None) => Ok(Self::User(id)),
            (None, Some(id)) => Ok(Self::Group(id)),
            (Some(user), Some(group)) => {
                err!(InvalidOwner, "both user ({user}) and group ({group}) are set")
            }
            (None, None) => err!(InvalidOwner, "neither user nor group is set"),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Self::User(id) => Some(*id),
            Self::Group(_) => None,
        }
    }

    pub fn group_id(&self) -> Option<Uuid> {
        match self {
            Self::User(_) => None,
            Self::Group(id) => Some(*id),
        }
    }
}

impl std::fmt::Display for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User(id) => write!(f, "user {id}"),
            Self::Group(id) => write!(f, "group {id}"),
        }
    }
}
