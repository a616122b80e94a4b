//! Query - Builder for queries against the in-memory datastore.

use std::cmp::Ordering;

use crate::datastore::Record;
use crate::key::Key;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: Operator,
    pub value: Value,
}

impl Filter {
    fn matches(&self, record: &Record) -> bool {
        let Some(actual) = record.data.get(&self.field) else {
            return false;
        };
        let ord = actual.total_cmp(&self.value);
        match self.op {
            Operator::Equal => ord == Ordering::Equal,
            Operator::NotEqual => ord != Ordering::Equal,
            Operator::LessThan => ord == Ordering::Less,
            Operator::LessThanOrEqual => ord != Ordering::Greater,
            Operator::GreaterThan => ord == Ordering::Greater,
            Operator::GreaterThanOrEqual => ord != Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub field: String,
    pub direction: Direction,
}

/// A kind query with optional filters, orders, ancestor and paging.
///
/// ```ignore
/// let query = Query::new("Task")
///     .filter("priority", Operator::GreaterThanOrEqual, 2)
///     .order_descending("priority")
///     .limit(10);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    kind: String,
    namespace: Option<String>,
    ancestor: Option<Key>,
    filters: Vec<Filter>,
    orders: Vec<Order>,
    offset: usize,
    limit: Option<usize>,
}

impl Query {
    /// Select every record of `kind` in the default namespace.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            namespace: None,
            ancestor: None,
            filters: Vec::new(),
            orders: Vec::new(),
            offset: 0,
            limit: None,
        }
    }

    pub fn filter(mut self, field: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn order(mut self, field: impl Into<String>) -> Self {
        self.orders.push(Order {
            field: field.into(),
            direction: Direction::Ascending,
        });
        self
    }

    pub fn order_descending(mut self, field: impl Into<String>) -> Self {
        self.orders.push(Order {
            field: field.into(),
            direction: Direction::Descending,
        });
        self
    }

    /// Select records in `namespace` instead of the default one.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Restrict results to records nested under `key`.
    pub fn ancestor(mut self, key: Key) -> Self {
        self.ancestor = Some(key);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    fn selects(&self, record: &Record) -> bool {
        record.key.kind() == self.kind
            && record.key.namespace() == self.namespace.as_deref()
            && self
                .ancestor
                .as_ref()
                .map_or(true, |ancestor| record.key.has_ancestor(ancestor))
            && self.filters.iter().all(|filter| filter.matches(record))
    }

    fn compare(&self, a: &Record, b: &Record) -> Ordering {
        for order in &self.orders {
            let ord = match (a.data.get(&order.field), b.data.get(&order.field)) {
                (Some(x), Some(y)) => x.total_cmp(y),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            let ord = match order.direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Apply the query to records given in key order.
    pub(crate) fn apply(&self, records: impl Iterator<Item = Record>) -> Vec<Record> {
        let mut selected: Vec<Record> = records.filter(|r| self.selects(r)).collect();
        selected.sort_by(|a, b| self.compare(a, b));
        let limit = self.limit.unwrap_or(usize::MAX);
        selected.into_iter().skip(self.offset).take(limit).collect()
    }
}
