use rusqlite::Connection;

use super::error::{BatchError, BatchResult};

pub trait ItemValidator<T> {
    fn validate(&self, connection: &Connection, item: &T) -> BatchResult<()>;
}

pub struct ExistenceValidator<T> {
    entity: &'static str,
    count_sql: &'static str,
    key: fn(&T) -> i64,
}

impl<T> ExistenceValidator<T> {
    pub fn new(entity: &'static str, count_sql: &'static str, key: fn(&T) -> i64) -> Self {
        Self {
            entity,
            count_sql,
            key,
        }
    }

    pub fn count(&self, connection: &Connection, id: i64) -> BatchResult<i64> {
        let mut statement = connection
            .prepare_cached(self.count_sql)
            .map_err(|source| self.lookup_failed(id, source))?;
        statement
            .query_row([id], |row| row.get::<_, i64>(0))
            .map_err(|source| self.lookup_failed(id, source))
    }

    fn lookup_failed(&self, id: i64, source: rusqlite::Error) -> BatchError {
        BatchError::ReferenceLookup {
            entity: self.entity,
            id,
            source,
        }
    }
}

impl<T> ItemValidator<T> for ExistenceValidator<T> {
    fn validate(&self, connection: &Connection, item: &T) -> BatchResult<()> {
        let id = (self.key)(item);
        if self.count(connection, id)? > 0 {
            Ok(())
        } else {
            Err(BatchError::ValidationRejected {
                entity: self.entity,
                id,
            })
        }
    }
}
