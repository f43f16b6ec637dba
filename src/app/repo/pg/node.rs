use crate::{
    core::{
        model::{
            node::{Folder, FolderInsert, Node, NodeKind},
            Owner,
        },
        repo::{node::NodeRepo, Atomic},
    },
    error::DocpathError,
    map_err,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[async_trait::async_trait]
impl NodeRepo for PgPool {
    async fn get_node(&self, id: Uuid) -> Result<Option<Node>, DocpathError> {
        let row = map_err!(
            sqlx::query_as::<_, NodeRow>(
                "SELECT id, title, ctype, parent_id, user_id, group_id
                 FROM nodes
                 WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(self)
            .await
        );

        row.map(Node::try_from).transpose()
    }

    async fn get_home(
        &self,
        owner: Owner,
        tx: &mut <Self as Atomic>::Tx,
    ) -> Result<Option<Folder>, DocpathError> {
        let (query, id) = match owner {
            Owner::User(id) => (
                "SELECT n.id, n.title, n.ctype, n.parent_id, n.user_id, n.group_id
                 FROM nodes n
                 JOIN users u ON u.home_folder_id = n.id
                 WHERE u.id = $1",
                id,
            ),
            Owner::Group(id) => (
                "SELECT n.id, n.title, n.ctype, n.parent_id, n.user_id, n.group_id
                 FROM nodes n
                 JOIN groups g ON g.home_folder_id = n.id
                 WHERE g.id = $1",
                id,
            ),
        };

        let row = map_err!(
            sqlx::query_as::<_, NodeRow>(query)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
        );

        row.map(|row| Node::try_from(row).and_then(Folder::try_from))
            .transpose()
    }

    async fn get_child(
        &self,
        parent_id: Uuid,
        title: &str,
        owner: Owner,
        tx: &mut <Self as Atomic>::Tx,
    ) -> Result<Option<Node>, DocpathError> {
        let (query, owner_id) = match owner {
            Owner::User(id) => (
                "SELECT id, title, ctype, parent_id, user_id, group_id
                 FROM nodes
                 WHERE parent_id = $1 AND title = $2 AND user_id = $3",
                id,
            ),
            Owner::Group(id) => (
                "SELECT id, title, ctype, parent_id, user_id, group_id
                 FROM nodes
                 WHERE parent_id = $1 AND title = $2 AND group_id = $3",
                id,
            ),
        };

        let row = map_err!(
            sqlx::query_as::<_, NodeRow>(query)
                .bind(parent_id)
                .bind(title)
                .bind(owner_id)
                .fetch_optional(&mut *tx)
                .await
        );

        row.map(Node::try_from).transpose()
    }

    async fn insert_folder(
        &self,
        folder: FolderInsert<'_>,
        tx: &mut <Self as Atomic>::Tx,
    ) -> Result<Option<Folder>, DocpathError> {
        let FolderInsert {
            id,
            title,
            parent_id,
            owner,
        } = folder;

        // Relies on the unique title indexes; a concurrent insert of the same
        // title waits for the other transaction and then does nothing.
        let row = map_err!(
            sqlx::query_as::<_, NodeRow>(
                "INSERT INTO nodes(id, title, ctype, parent_id, user_id, group_id)
                 VALUES($1, $2, $3, $4, $5, $6)
                 ON CONFLICT DO NOTHING
                 RETURNING id, title, ctype, parent_id, user_id, group_id",
            )
            .bind(id)
            .bind(title)
            .bind(NodeKind::Folder.as_str())
            .bind(parent_id)
            .bind(owner.user_id())
            .bind(owner.group_id())
            .fetch_optional(&mut *tx)
            .await
        );

        row.map(|row| Node::try_from(row).and_then(Folder::try_from))
            .transpose()
    }

    async fn ancestors(
        &self,
        id: Uuid,
        include_self: bool,
    ) -> Result<Vec<(Uuid, String)>, DocpathError> {
        Ok(map_err!(
            sqlx::query_as::<_, (Uuid, String)>(
                "WITH RECURSIVE tree AS (
                    SELECT id, title, parent_id, 0 AS level
                    FROM nodes
                    WHERE id = $1
                    UNION ALL
                    SELECT nodes.id, nodes.title, nodes.parent_id, tree.level + 1
                    FROM nodes
                    JOIN tree ON nodes.id = tree.parent_id
                 )
                 SELECT id, title
                 FROM tree
                 WHERE $2 OR id <> $1
                 ORDER BY level DESC",
            )
            .bind(id)
            .bind(include_self)
            .fetch_all(self)
            .await
        ))
    }
}

// Private dtos.

#[derive(Debug, FromRow)]
struct NodeRow {
    id: Uuid,
    title: String,
    ctype: String,
    parent_id: Option<Uuid>,
    user_id: Option<Uuid>,
    group_id: Option<Uuid>,
}

impl TryFrom<NodeRow> for Node {
    type Error = DocpathError;

    fn try_from(
        NodeRow {
            id,
            title,
            ctype,
            parent_id,
            user_id,
            group_id,
        }: NodeRow,
    ) -> Result<Self, Self::Error> {
        Ok(Self {
            id,
            title,
            parent_id,
            owner: Owner::from_ids(user_id, group_id)?,
            kind: NodeKind::try_from(ctype.as_str())?,
        })
    }
}
