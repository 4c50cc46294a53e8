//! Live snapshots: one catalog query per object type, run concurrently.

use futures_util::future::try_join_all;
use once_cell::sync::Lazy;
use sqlx::postgres::PgConnection;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::catalog::{
    DatabaseObject, ObjectType, collation, constraint, custom_type, domain, extension,
    foreign_table, function, index, partition, role, sequence, table, tablespace, triggers, view,
};
use crate::db::pool::PgPool;
use crate::db::retry::{RetryPolicy, retry_with_policy};
use crate::error::{PgShiftError, Result};
use crate::snapshot::Snapshot;

pub type ExtractFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<DatabaseObject>>> + Send + 'a>>;

/// Reads every object of one type from the connected database
pub type Extractor = for<'a> fn(&'a mut PgConnection, &'a str) -> ExtractFuture<'a>;

macro_rules! extractor {
    ($fetch:path, $variant:ident) => {{
        fn run<'a>(conn: &'a mut PgConnection, database: &'a str) -> ExtractFuture<'a> {
            Box::pin(async move {
                Ok($fetch(conn, database)
                    .await?
                    .into_iter()
                    .map(DatabaseObject::$variant)
                    .collect())
            })
        }
        run as Extractor
    }};
}

/// Columns travel inside their tables and have no extractor of their own
pub static EXTRACTORS: Lazy<BTreeMap<ObjectType, Extractor>> = Lazy::new(|| {
    BTreeMap::from([
        (ObjectType::Table, extractor!(table::fetch, Table)),
        (ObjectType::View, extractor!(view::fetch, View)),
        (
            ObjectType::MaterializedView,
            extractor!(view::fetch_materialized, MaterializedView),
        ),
        (ObjectType::Function, extractor!(function::fetch, Function)),
        (
            ObjectType::Procedure,
            extractor!(function::fetch_procedures, Procedure),
        ),
        (ObjectType::Sequence, extractor!(sequence::fetch, Sequence)),
        (ObjectType::Index, extractor!(index::fetch, Index)),
        (ObjectType::Type, extractor!(custom_type::fetch, Type)),
        (ObjectType::Domain, extractor!(domain::fetch, Domain)),
        (ObjectType::Trigger, extractor!(triggers::fetch, Trigger)),
        (ObjectType::Constraint, extractor!(constraint::fetch, Constraint)),
        (ObjectType::Extension, extractor!(extension::fetch, Extension)),
        (ObjectType::Collation, extractor!(collation::fetch, Collation)),
        (ObjectType::Role, extractor!(role::fetch, Role)),
        (ObjectType::Tablespace, extractor!(tablespace::fetch, Tablespace)),
        (
            ObjectType::ForeignTable,
            extractor!(foreign_table::fetch, ForeignTable),
        ),
        (ObjectType::Partition, extractor!(partition::fetch, Partition)),
    ])
});

fn extraction_error(object_type: ObjectType, err: PgShiftError) -> PgShiftError {
    match err {
        PgShiftError::Cancelled
        | PgShiftError::Connection(_)
        | PgShiftError::Unauthorized(_)
        | PgShiftError::Timeout(_)
        | PgShiftError::Pool { .. }
        | PgShiftError::SchemaExtraction { .. } => err,
        other => PgShiftError::extraction(object_type, other.to_string()),
    }
}

async fn extract_one(
    pool: &PgPool,
    object_type: ObjectType,
    extract: Extractor,
    database: &str,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<Vec<DatabaseObject>> {
    let operation = format!("extract {}", object_type);
    retry_with_policy(&operation, policy, cancel, || async move {
        let mut conn = pool.acquire(cancel).await?;
        let result = tokio::select! {
            _ = cancel.cancelled() => Err(PgShiftError::Cancelled),
            result = extract(&mut *conn, database) => result,
        };
        pool.release(conn).await;
        result
    })
    .await
    .map_err(|e| extraction_error(object_type, e))
}

/// Snapshot every supported object type of the pool's database
pub async fn take_snapshot(
    pool: &PgPool,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<Snapshot> {
    let info = pool.factory().info();
    let database = info.database.as_str();
    info!("Taking snapshot of {}", info);

    let extractions = EXTRACTORS.iter().map(|(&object_type, &extract)| {
        extract_one(pool, object_type, extract, database, policy, cancel)
    });
    let results = try_join_all(extractions).await?;

    let mut objects: Vec<DatabaseObject> = results.into_iter().flatten().collect();
    objects.sort_by_cached_key(|o| (o.object_type(), o.qualified_name(), o.qualifier()));
    debug!("Extracted {} objects from {}", objects.len(), database);

    Ok(Snapshot::new(info.masked(), objects))
}
