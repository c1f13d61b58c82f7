use super::util::push_in_list;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::{MySql, MySqlPool, QueryBuilder};

#[derive(sqlx::FromRow)]
struct PostRow {
    post_id: PostId,
    owner_id: UserId,
    title: String,
    contact_phone: Option<String>,
    whatsapp: Option<String>,
}

impl From<PostRow> for PostSummary {
    fn from(r: PostRow) -> Self {
        PostSummary {
            post_id: r.post_id,
            owner: r.owner_id,
            title: r.title,
            contact_phone: r.contact_phone,
            whatsapp: r.whatsapp,
        }
    }
}

const POST_COLUMNS: &str = "SELECT post_id, owner_id, title, contact_phone, whatsapp FROM post";

pub struct MySqlPostRepo {
    pool: MySqlPool,
}

impl MySqlPostRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlPostRepo { pool }
    }
}

#[async_trait::async_trait]
impl PostRepo for MySqlPostRepo {
    async fn get_summary(&self, post_id: PostId) -> Result<Option<PostSummary>, ContactError> {
        let row: Option<PostRow> = sqlx::query_as(&format!("{POST_COLUMNS} WHERE post_id = ?"))
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ContactError::Store(format!("query post: {e}")))?;

        Ok(row.map(PostSummary::from))
    }

    async fn get_summaries(&self, post_ids: &[PostId]) -> Result<Vec<PostSummary>, ContactError> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb: QueryBuilder<MySql> = QueryBuilder::new(POST_COLUMNS);
        qb.push(" WHERE post_id IN ");
        push_in_list(&mut qb, post_ids);

        let rows: Vec<PostRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ContactError::Store(format!("query posts: {e}")))?;

        Ok(rows.into_iter().map(PostSummary::from).collect())
    }
}
