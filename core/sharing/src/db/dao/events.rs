use diesel::prelude::*;

use medshare_persistence::executor::{readonly_transaction, AsDao, ConnType, PoolType};

use crate::db::model::{NewSharingEvent, SharingEvent};
use crate::db::schema::sharing_event::dsl;
use crate::db::DbResult;

pub struct EventsDao<'c> {
    pool: &'c PoolType,
}

impl<'a> AsDao<'a> for EventsDao<'a> {
    fn as_dao(pool: &'a PoolType) -> Self {
        Self { pool }
    }
}

impl<'c> EventsDao<'c> {
    /// One page of the change feed, oldest first. Consumers pass the highest
    /// event id they have seen; delivery is at-least-once and rows are never
    /// removed by reading them.
    pub async fn take_events(&self, after_id: i32, max_events: i32) -> DbResult<Vec<SharingEvent>> {
        readonly_transaction(self.pool, move |conn| {
            Ok(dsl::sharing_event
                .filter(dsl::id.gt(after_id))
                .order_by(dsl::id.asc())
                .limit(max_events as i64)
                .load::<SharingEvent>(conn)?)
        })
        .await
    }
}

/// Appends a feed row inside the caller's transaction, so the event becomes
/// visible exactly when the mutation it describes commits.
pub(crate) fn add_event(conn: &ConnType, event: NewSharingEvent) -> Result<(), diesel::result::Error> {
    diesel::insert_into(dsl::sharing_event)
        .values(&event)
        .execute(conn)?;
    Ok(())
}
