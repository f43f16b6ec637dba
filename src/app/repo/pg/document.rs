use crate::{
    core::{
        model::{
            custom_field::{CustomField, CustomFieldType, CustomFieldValue, RawFieldValue},
            document::{Document, DocumentCfv, DocumentLocation, DocumentType},
            Owner, Pagination,
        },
        repo::{document::DocumentRepo, Atomic},
    },
    error::DocpathError,
    map_err,
};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Selects the column matching the field type, cast to text.
const CF_VALUE: &str = "CASE cf.type
    WHEN 'text' THEN cfv.value_text
    WHEN 'date' THEN cfv.value_date::TEXT
    WHEN 'boolean' THEN cfv.value_boolean::TEXT
    WHEN 'int' THEN cfv.value_int::TEXT
    WHEN 'float' THEN cfv.value_float::TEXT
    WHEN 'monetary' THEN cfv.value_monetary::TEXT
END";

#[async_trait::async_trait]
impl DocumentRepo for PgPool {
    async fn get_document(&self, id: Uuid) -> Result<Option<Document>, DocpathError> {
        let row = map_err!(
            sqlx::query_as::<_, DocumentRow>(
                "SELECT n.id, n.title, n.parent_id, n.user_id, n.group_id, d.document_type_id
                 FROM documents d
                 JOIN nodes n ON n.id = d.id
                 WHERE d.id = $1",
            )
            .bind(id)
            .fetch_optional(self)
            .await
        );

        row.map(Document::try_from).transpose()
    }

    async fn get_document_type(&self, id: Uuid) -> Result<Option<DocumentType>, DocpathError> {
        let row = map_err!(
            sqlx::query_as::<_, DocumentTypeRow>(
                "SELECT id, name, path_template
                 FROM document_types
                 WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(self)
            .await
        );

        Ok(row.map(DocumentType::from))
    }

    async fn count_by_type(&self, document_type_id: Uuid) -> Result<usize, DocpathError> {
        let count = map_err!(
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM documents WHERE document_type_id = $1",
            )
            .bind(document_type_id)
            .fetch_one(self)
            .await
        );

        Ok(count as usize)
    }

    async fn list_by_type(
        &self,
        document_type_id: Uuid,
        p: Pagination,
    ) -> Result<Vec<DocumentCfv>, DocpathError> {
        let (limit, offset) = p.to_limit_offset();

        let query = format!(
            "WITH page AS (
                SELECT id, document_type_id
                FROM documents
                WHERE document_type_id = $1
                ORDER BY id
                LIMIT $2 OFFSET $3
             )
             SELECT
                n.id, n.title, n.parent_id, n.user_id, n.group_id, page.document_type_id,
                cf.name AS cf_name,
                cf.type AS cf_type,
                {CF_VALUE} AS cf_value
             FROM page
             JOIN nodes n ON n.id = page.id
             LEFT JOIN document_types_custom_fields dtcf ON dtcf.document_type_id = page.document_type_id
             LEFT JOIN custom_fields cf ON cf.id = dtcf.custom_field_id
             LEFT JOIN custom_field_values cfv ON cfv.field_id = cf.id AND cfv.document_id = page.id
             ORDER BY page.id, dtcf.position, cf.name"
        );

        let rows = map_err!(
            sqlx::query_as::<_, DocumentCfvRow>(&query)
                .bind(document_type_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(self)
                .await
        );

        let mut documents: Vec<DocumentCfv> = vec![];

        for row in rows {
            let field = row.field()?;

            match documents.last_mut() {
                Some(last) if last.document.id == row.id => last.fields.extend(field),
                _ => documents.push(DocumentCfv {
                    document: row.document()?,
                    fields: field.into_iter().collect(),
                }),
            }
        }

        Ok(documents)
    }

    async fn get_custom_field_values(
        &self,
        document_id: Uuid,
    ) -> Result<Vec<RawFieldValue>, DocpathError> {
        let query = format!(
            "SELECT cf.name AS cf_name, cf.type AS cf_type, {CF_VALUE} AS cf_value
             FROM documents d
             JOIN document_types_custom_fields dtcf ON dtcf.document_type_id = d.document_type_id
             JOIN custom_fields cf ON cf.id = dtcf.custom_field_id
             LEFT JOIN custom_field_values cfv ON cfv.field_id = cf.id AND cfv.document_id = d.id
             WHERE d.id = $1
             ORDER BY dtcf.position, cf.name"
        );

        let rows = map_err!(
            sqlx::query_as::<_, FieldValueRow>(&query)
                .bind(document_id)
                .fetch_all(self)
                .await
        );

        rows.into_iter().map(RawFieldValue::try_from).collect()
    }

    async fn upsert_custom_field_values(
        &self,
        document_id: Uuid,
        values: &HashMap<String, String>,
    ) -> Result<Vec<RawFieldValue>, DocpathError> {
        let rows = map_err!(
            sqlx::query_as::<_, CustomFieldRow>(
                "SELECT cf.id, cf.name, cf.type AS ty, cf.extra_data
                 FROM documents d
                 JOIN document_types_custom_fields dtcf ON dtcf.document_type_id = d.document_type_id
                 JOIN custom_fields cf ON cf.id = dtcf.custom_field_id
                 WHERE d.id = $1",
            )
            .bind(document_id)
            .fetch_all(self)
            .await
        );

        let fields = rows
            .into_iter()
            .map(CustomField::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let mut tx = self.start_tx().await?;

        for CustomField { id, name, ty, .. } in fields {
            let Some(raw) = values.get(&name) else {
                continue;
            };

            // Blank input clears the field, text included.
            let value = match raw.trim() {
                "" => None,
                _ => CustomFieldValue::parse(ty, Some(raw.as_str()))?,
            };
            let columns = ValueColumns::from(value.as_ref());

            map_err!(
                sqlx::query(
                    "INSERT INTO custom_field_values(
                        id, document_id, field_id,
                        value_text, value_date, value_boolean, value_int, value_float, value_monetary
                     )
                     VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9)
                     ON CONFLICT(document_id, field_id) DO UPDATE SET
                        value_text = EXCLUDED.value_text,
                        value_date = EXCLUDED.value_date,
                        value_boolean = EXCLUDED.value_boolean,
                        value_int = EXCLUDED.value_int,
                        value_float = EXCLUDED.value_float,
                        value_monetary = EXCLUDED.value_monetary",
                )
                .bind(Uuid::new_v4())
                .bind(document_id)
                .bind(id)
                .bind(columns.text)
                .bind(columns.date)
                .bind(columns.boolean)
                .bind(columns.int)
                .bind(columns.float)
                .bind(columns.monetary)
                .execute(&mut tx)
                .await
            );

            debug!("Set custom field '{name}' of document {document_id}");
        }

        self.commit_tx(tx).await?;

        self.get_custom_field_values(document_id).await
    }

    async fn update_location(
        &self,
        location: &DocumentLocation,
        tx: &mut <Self as Atomic>::Tx,
    ) -> Result<u64, DocpathError> {
        let result = map_err!(
            sqlx::query(
                "UPDATE nodes
                 SET parent_id = $1, title = $2, updated_at = NOW()
                 WHERE id = $3 AND ctype = 'document'",
            )
            .bind(location.parent_id)
            .bind(&location.title)
            .bind(location.id)
            .execute(&mut *tx)
            .await
        );

        Ok(result.rows_affected())
    }

    async fn update_locations(
        &self,
        locations: &[DocumentLocation],
        tx: &mut <Self as Atomic>::Tx,
    ) -> Result<u64, DocpathError> {
        if locations.is_empty() {
            return Ok(0);
        }

        let mut ids = Vec::with_capacity(locations.len());
        let mut parent_ids = Vec::with_capacity(locations.len());
        let mut titles = Vec::with_capacity(locations.len());

        for DocumentLocation {
            id,
            parent_id,
            title,
        } in locations
        {
            ids.push(*id);
            parent_ids.push(*parent_id);
            titles.push(title.clone());
        }

        let result = map_err!(
            sqlx::query(
                "UPDATE nodes
                 SET parent_id = v.parent_id, title = v.title, updated_at = NOW()
                 FROM UNNEST($1::UUID[], $2::UUID[], $3::TEXT[]) AS v(id, parent_id, title)
                 WHERE nodes.id = v.id AND nodes.ctype = 'document'",
            )
            .bind(ids)
            .bind(parent_ids)
            .bind(titles)
            .execute(&mut *tx)
            .await
        );

        Ok(result.rows_affected())
    }
}

// Private dtos.

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: Uuid,
    title: String,
    parent_id: Option<Uuid>,
    user_id: Option<Uuid>,
    group_id: Option<Uuid>,
    document_type_id: Option<Uuid>,
}

impl TryFrom<DocumentRow> for Document {
    type Error = DocpathError;

    fn try_from(
        DocumentRow {
            id,
            title,
            parent_id,
            user_id,
            group_id,
            document_type_id,
        }: DocumentRow,
    ) -> Result<Self, Self::Error> {
        Ok(Self {
            id,
            title,
            parent_id,
            owner: Owner::from_ids(user_id, group_id)?,
            document_type_id,
        })
    }
}

#[derive(Debug, FromRow)]
struct DocumentTypeRow {
    id: Uuid,
    name: String,
    path_template: Option<String>,
}

impl From<DocumentTypeRow> for DocumentType {
    fn from(
        DocumentTypeRow {
            id,
            name,
            path_template,
        }: DocumentTypeRow,
    ) -> Self {
        Self {
            id,
            name,
            path_template,
        }
    }
}

#[derive(Debug, FromRow)]
struct CustomFieldRow {
    id: Uuid,
    name: String,
    ty: String,
    extra_data: Option<serde_json::Value>,
}

impl TryFrom<CustomFieldRow> for CustomField {
    type Error = DocpathError;

    fn try_from(row: CustomFieldRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            ty: CustomFieldType::try_from(row.ty.as_str())?,
            extra_data: row.extra_data,
        })
    }
}

#[derive(Debug, FromRow)]
struct FieldValueRow {
    cf_name: String,
    cf_type: String,
    cf_value: Option<String>,
}

impl TryFrom<FieldValueRow> for RawFieldValue {
    type Error = DocpathError;

    fn try_from(row: FieldValueRow) -> Result<Self, Self::Error> {
        Ok(Self {
            name: row.cf_name,
            ty: CustomFieldType::try_from(row.cf_type.as_str())?,
            value: row.cf_value,
        })
    }
}

/// A document joined with at most one of its type's fields. Types without
/// fields yield a single row with all field columns null.
#[derive(Debug, FromRow)]
struct DocumentCfvRow {
    id: Uuid,
    title: String,
    parent_id: Option<Uuid>,
    user_id: Option<Uuid>,
    group_id: Option<Uuid>,
    document_type_id: Option<Uuid>,
    cf_name: Option<String>,
    cf_type: Option<String>,
    cf_value: Option<String>,
}

impl DocumentCfvRow {
    fn field(&self) -> Result<Option<RawFieldValue>, DocpathError> {
        let (Some(name), Some(ty)) = (&self.cf_name, &self.cf_type) else {
            return Ok(None);
        };

        Ok(Some(RawFieldValue {
            name: name.clone(),
            ty: CustomFieldType::try_from(ty.as_str())?,
            value: self.cf_value.clone(),
        }))
    }

    fn document(self) -> Result<Document, DocpathError> {
        Ok(Document {
            id: self.id,
            title: self.title,
            parent_id: self.parent_id,
            owner: Owner::from_ids(self.user_id, self.group_id)?,
            document_type_id: self.document_type_id,
        })
    }
}

/// Bind values for the typed value columns, at most one of which is set.
#[derive(Debug, Default)]
struct ValueColumns {
    text: Option<String>,
    date: Option<chrono::NaiveDate>,
    boolean: Option<bool>,
    int: Option<i64>,
    float: Option<f64>,
    monetary: Option<f64>,
}

impl From<Option<&CustomFieldValue>> for ValueColumns {
    fn from(value: Option<&CustomFieldValue>) -> Self {
        let mut columns = Self::default();
        match value {
            Some(CustomFieldValue::Text(v)) => columns.text = Some(v.clone()),
            Some(CustomFieldValue::Date(v)) => columns.date = Some(*v),
            Some(CustomFieldValue::Boolean(v)) => columns.boolean = Some(*v),
            Some(CustomFieldValue::Int(v)) => columns.int = Some(*v),
            Some(CustomFieldValue::Float(v)) => columns.float = Some(*v),
            Some(CustomFieldValue::Monetary(v)) => columns.monetary = Some(*v),
            None => {}
        }
        columns
    }
}

#[cfg(test)]
#[suitest::suite(pg_document_repo_int)]
mod tests {
    use crate::{
        app::test::{
            init_postgres, make_document_type_groceries, make_receipt, make_user,
            PostgresContainer,
        },
        core::{
            model::{document::DocumentLocation, Owner, Pagination},
            repo::{document::DocumentRepo, node::NodeRepo, Atomic},
        },
    };
    use sqlx::PgPool;
    use std::collections::HashMap;
    use suitest::before_all;

    #[before_all]
    async fn setup() -> (PgPool, PostgresContainer) {
        let (postgres, pg_img) = init_postgres().await;
        (postgres, pg_img)
    }

    #[test]
    async fn custom_field_values_in_definition_order(repo: PgPool) {
        let user = make_user(&repo, "doc_cfv_order").await;
        let dtype = make_document_type_groceries(&repo, Owner::User(user.id), None).await;
        let doc = make_receipt(&repo, &user, dtype, "receipt.pdf").await;

        let fields = repo.get_custom_field_values(doc).await.unwrap();
        let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();

        assert_eq!(vec!["Shop", "Total", "EffectiveDate"], names);
        assert!(fields.iter().all(|f| f.value.is_none()));
    }

    #[test]
    async fn upsert_custom_field_values_typed(repo: PgPool) {
        let user = make_user(&repo, "doc_cfv_upsert").await;
        let dtype = make_document_type_groceries(&repo, Owner::User(user.id), None).await;
        let doc = make_receipt(&repo, &user, dtype, "receipt.pdf").await;

        let values = HashMap::from([
            ("Shop".to_string(), "rewe".to_string()),
            ("Total".to_string(), "10.3".to_string()),
            ("EffectiveDate".to_string(), "2024-11-18 10:00:00".to_string()),
            ("Unknown".to_string(), "ignored".to_string()),
        ]);

        let fields = repo.upsert_custom_field_values(doc, &values).await.unwrap();
        let values: Vec<_> = fields.iter().map(|f| f.value.as_deref()).collect();

        assert_eq!(
            vec![Some("rewe"), Some("10.30"), Some("2024-11-18")],
            values
        );

        let cleared = HashMap::from([("Shop".to_string(), "  ".to_string())]);
        let fields = repo.upsert_custom_field_values(doc, &cleared).await.unwrap();

        assert_eq!(None, fields[0].value);
        assert_eq!(Some("10.30"), fields[1].value.as_deref());
    }

    #[test]
    async fn upsert_invalid_value_fails(repo: PgPool) {
        let user = make_user(&repo, "doc_cfv_invalid").await;
        let dtype = make_document_type_groceries(&repo, Owner::User(user.id), None).await;
        let doc = make_receipt(&repo, &user, dtype, "receipt.pdf").await;

        let values = HashMap::from([("EffectiveDate".to_string(), "18.11.".to_string())]);

        assert!(repo.upsert_custom_field_values(doc, &values).await.is_err());
    }

    #[test]
    async fn list_by_type_pages_ordered_by_id(repo: PgPool) {
        let user = make_user(&repo, "doc_list").await;
        let dtype = make_document_type_groceries(&repo, Owner::User(user.id), None).await;

        let mut ids = vec![];
        for i in 0..5 {
            ids.push(make_receipt(&repo, &user, dtype, &format!("receipt_{i}.pdf")).await);
        }
        ids.sort();

        assert_eq!(5, repo.count_by_type(dtype).await.unwrap());

        let first = repo
            .list_by_type(dtype, Pagination::new(2, 1))
            .await
            .unwrap();
        let last = repo
            .list_by_type(dtype, Pagination::new(2, 3))
            .await
            .unwrap();

        assert_eq!(2, first.len());
        assert_eq!(ids[0], first[0].document.id);
        assert_eq!(ids[1], first[1].document.id);
        assert_eq!(3, first[0].fields.len());

        assert_eq!(1, last.len());
        assert_eq!(ids[4], last[0].document.id);
    }

    #[test]
    async fn update_locations_moves_and_renames(repo: PgPool) {
        let user = make_user(&repo, "doc_update").await;
        let owner = Owner::User(user.id);
        let dtype = make_document_type_groceries(&repo, owner, None).await;
        let a = make_receipt(&repo, &user, dtype, "a.pdf").await;
        let b = make_receipt(&repo, &user, dtype, "b.pdf").await;

        let locations = vec![
            DocumentLocation {
                id: a,
                parent_id: user.home_folder_id,
                title: "a-moved.pdf".to_string(),
            },
            DocumentLocation {
                id: b,
                parent_id: user.home_folder_id,
                title: "b.pdf".to_string(),
            },
        ];

        let mut tx = repo.start_tx().await.unwrap();
        let updated = repo.update_locations(&locations, &mut tx).await.unwrap();
        let empty = repo.update_locations(&[], &mut tx).await.unwrap();
        repo.commit_tx(tx).await.unwrap();

        assert_eq!(2, updated);
        assert_eq!(0, empty);

        let a = repo.get_document(a).await.unwrap().unwrap();
        assert_eq!("a-moved.pdf", a.title);
        assert_eq!(Some(user.home_folder_id), a.parent_id);

        let parent = repo.get_node(user.home_folder_id).await.unwrap().unwrap();
        assert_eq!(".home", parent.title);
    }

    #[test]
    async fn missing_document_and_type(repo: PgPool) {
        let id = uuid::Uuid::new_v4();
        assert!(repo.get_document(id).await.unwrap().is_none());
        assert!(repo.get_document_type(id).await.unwrap().is_none());
        assert_eq!(0, repo.count_by_type(id).await.unwrap());
        assert!(repo.get_custom_field_values(id).await.unwrap().is_empty());
    }
}
