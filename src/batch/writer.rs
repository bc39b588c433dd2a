use std::fmt::Debug;

use rusqlite::types::Value;
use rusqlite::{Connection, params_from_iter};
use tracing::debug;

use super::error::{BatchError, BatchResult};

// Always called inside the chunk transaction. Returns rows affected.
pub trait ItemWriter<T> {
    fn write(&self, connection: &Connection, items: &[T]) -> BatchResult<usize>;
}

pub type Binder<T> = fn(&T) -> BatchResult<Vec<Value>>;

pub struct SqlBatchWriter<T> {
    name: &'static str,
    sql: &'static str,
    binder: Binder<T>,
    assert_updates: bool,
}

impl<T> SqlBatchWriter<T> {
    pub fn new(name: &'static str, sql: &'static str, binder: Binder<T>) -> Self {
        Self {
            name,
            sql,
            binder,
            assert_updates: true,
        }
    }

    pub fn assert_updates(mut self, assert_updates: bool) -> Self {
        self.assert_updates = assert_updates;
        self
    }

    pub fn execute_batch(&self, connection: &Connection, items: &[T]) -> BatchResult<Vec<usize>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut statement =
            connection
                .prepare_cached(self.sql)
                .map_err(|source| BatchError::WriteFailure {
                    writer: self.name,
                    index: 0,
                    source,
                })?;

        let mut affected = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let values = (self.binder)(item)?;
            let count = statement
                .execute(params_from_iter(values))
                .map_err(|source| BatchError::WriteFailure {
                    writer: self.name,
                    index,
                    source,
                })?;
            if self.assert_updates && count == 0 {
                return Err(BatchError::NoRowsAffected {
                    writer: self.name,
                    index,
                });
            }
            affected.push(count);
        }

        debug!(writer = self.name, items = items.len(), "executed batch statement");
        Ok(affected)
    }
}

impl<T> ItemWriter<T> for SqlBatchWriter<T> {
    fn write(&self, connection: &Connection, items: &[T]) -> BatchResult<usize> {
        Ok(self.execute_batch(connection, items)?.into_iter().sum())
    }
}

pub trait Classified {
    type Tag: Copy + Eq + Debug;

    fn tag(&self) -> Self::Tag;
}

pub struct ClassifierCompositeWriter<T: Classified> {
    routes: Vec<(T::Tag, Box<dyn ItemWriter<T>>)>,
}

impl<T: Classified + Clone> ClassifierCompositeWriter<T> {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    pub fn register(mut self, tag: T::Tag, writer: impl ItemWriter<T> + 'static) -> Self {
        self.routes.push((tag, Box::new(writer)));
        self
    }

    pub fn route(&self, item: &T) -> BatchResult<usize> {
        let tag = item.tag();
        self.routes
            .iter()
            .position(|(candidate, _)| *candidate == tag)
            .ok_or_else(|| BatchError::UnroutableRecord {
                kind: format!("{tag:?}"),
            })
    }

    pub fn classify(&self, items: &[T]) -> BatchResult<Vec<Vec<T>>> {
        let mut groups: Vec<Vec<T>> = self.routes.iter().map(|_| Vec::new()).collect();
        for item in items {
            let index = self.route(item)?;
            groups[index].push(item.clone());
        }
        Ok(groups)
    }
}

impl<T: Classified + Clone> Default for ClassifierCompositeWriter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Classified + Clone> ItemWriter<T> for ClassifierCompositeWriter<T> {
    fn write(&self, connection: &Connection, items: &[T]) -> BatchResult<usize> {
        let groups = self.classify(items)?;

        let mut affected = 0usize;
        for ((tag, writer), group) in self.routes.iter().zip(groups) {
            if group.is_empty() {
                continue;
            }
            debug!(tag = ?tag, items = group.len(), "routing group to writer");
            affected += writer.write(connection, &group)?;
        }

        Ok(affected)
    }
}

pub struct DenormalizingWriter<P, C> {
    parent: Box<dyn ItemWriter<P>>,
    child: Box<dyn ItemWriter<C>>,
    expand: fn(&P) -> Vec<C>,
}

impl<P, C> DenormalizingWriter<P, C> {
    pub fn new(
        parent: impl ItemWriter<P> + 'static,
        child: impl ItemWriter<C> + 'static,
        expand: fn(&P) -> Vec<C>,
    ) -> Self {
        Self {
            parent: Box::new(parent),
            child: Box::new(child),
            expand,
        }
    }

    pub fn expand_all(&self, parents: &[P]) -> Vec<C> {
        parents.iter().flat_map(|parent| (self.expand)(parent)).collect()
    }
}

impl<P, C> ItemWriter<P> for DenormalizingWriter<P, C> {
    fn write(&self, connection: &Connection, items: &[P]) -> BatchResult<usize> {
        let parent_rows = self.parent.write(connection, items)?;

        let children = self.expand_all(items);
        let child_rows = if children.is_empty() {
            0
        } else {
            self.child.write(connection, &children)?
        };

        debug!(
            parents = items.len(),
            children = children.len(),
            parent_rows,
            child_rows,
            "wrote denormalized chunk"
        );
        Ok(parent_rows + child_rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Open(i64),
        Close(i64),
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum EventKind {
        Open,
        Close,
    }

    impl Classified for Event {
        type Tag = EventKind;

        fn tag(&self) -> EventKind {
            match self {
                Event::Open(_) => EventKind::Open,
                Event::Close(_) => EventKind::Close,
            }
        }
    }

    fn bind_event(event: &Event) -> BatchResult<Vec<Value>> {
        let (kind, id) = match event {
            Event::Open(id) => ("open", *id),
            Event::Close(id) => ("close", *id),
        };
        Ok(vec![Value::Text(kind.to_string()), Value::Integer(id)])
    }

    fn connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        connection
            .execute_batch(
                "CREATE TABLE events (seq INTEGER PRIMARY KEY AUTOINCREMENT, kind TEXT, id INTEGER);
                 CREATE TABLE tracked (id INTEGER PRIMARY KEY, note TEXT);
                 INSERT INTO tracked(id, note) VALUES (1, 'a');",
            )
            .unwrap();
        connection
    }

    fn event_writer(name: &'static str) -> SqlBatchWriter<Event> {
        SqlBatchWriter::new(name, "INSERT INTO events(kind, id) VALUES (?1, ?2)", bind_event)
    }

    #[test]
    fn router_writes_groups_in_registration_order() {
        let connection = connection();
        let router = ClassifierCompositeWriter::new()
            .register(EventKind::Close, event_writer("close"))
            .register(EventKind::Open, event_writer("open"));

        let items = vec![Event::Open(1), Event::Close(2), Event::Open(3)];
        let affected = router.write(&connection, &items).unwrap();
        assert_eq!(affected, 3);

        let kinds: Vec<String> = connection
            .prepare("SELECT kind || id FROM events ORDER BY seq")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(kinds, vec!["close2", "open1", "open3"]);
    }

    #[test]
    fn unregistered_tag_is_unroutable_and_nothing_is_written() {
        let connection = connection();
        let router = ClassifierCompositeWriter::new().register(EventKind::Open, event_writer("open"));

        let err = router
            .write(&connection, &[Event::Open(1), Event::Close(2)])
            .unwrap_err();
        assert!(matches!(err, BatchError::UnroutableRecord { ref kind } if kind == "Close"));

        let count: i64 = connection
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn assert_updates_flags_statements_that_touch_nothing() {
        let connection = connection();
        let writer = SqlBatchWriter::new(
            "tracked",
            "UPDATE tracked SET note = ?1 WHERE id = ?2",
            |(note, id): &(String, i64)| Ok(vec![Value::Text(note.clone()), Value::Integer(*id)]),
        );

        let items = vec![("b".to_string(), 1), ("c".to_string(), 42)];
        let err = writer.write(&connection, &items).unwrap_err();
        assert!(matches!(err, BatchError::NoRowsAffected { index: 1, .. }));

        let relaxed = writer.assert_updates(false);
        assert_eq!(relaxed.execute_batch(&connection, &items).unwrap(), vec![1, 0]);
    }

    #[test]
    fn statement_errors_surface_as_write_failures() {
        let connection = connection();
        let writer: SqlBatchWriter<Event> =
            SqlBatchWriter::new("broken", "INSERT INTO missing_table VALUES (?1, ?2)", bind_event);

        let err = writer.write(&connection, &[Event::Open(1)]).unwrap_err();
        assert!(matches!(err, BatchError::WriteFailure { writer: "broken", .. }));
        assert!(writer.write(&connection, &[]).is_ok());
    }
}
