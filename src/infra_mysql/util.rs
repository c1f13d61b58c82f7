use sqlx::mysql::MySqlDatabaseError;
use sqlx::{MySql, QueryBuilder};

pub fn is_dup_key(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db) = err {
        if let Some(mysql_err) = db.try_downcast_ref::<MySqlDatabaseError>() {
            return mysql_err.number() == 1062; // ER_DUP_ENTRY
        }
    }

    false
}

/// Appends `(?, ?, ...)` bound to `values`. Callers must skip the query
/// when `values` is empty; `IN ()` is a syntax error in MySQL.
pub fn push_in_list<'a, T>(qb: &mut QueryBuilder<'a, MySql>, values: &'a [T])
where
    T: 'a + sqlx::Encode<'a, MySql> + sqlx::Type<MySql> + Copy + Send,
{
    qb.push("(");
    let mut sep = qb.separated(", ");
    for v in values {
        sep.push_bind(*v);
    }
    sep.push_unseparated(")");
}
