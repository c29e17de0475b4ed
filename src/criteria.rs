//! Query criteria
//!
//! [`Criteria`] carries the optional `where`, `order by` and `limit` parts
//! appended to an entity's compiled select. Clauses are written with the
//! portable `?` marker and their values travel alongside as arguments.

use std::fmt;
use std::str::FromStr;

use type_mapping::SqlValue;

use crate::errors::QueryError;

/// Row cap for a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// At most `n` rows
    Count(i64),
    /// Skip `offset` rows, then at most `count` rows
    Range { offset: i64, count: i64 },
}

impl Limit {
    fn validate(&self) -> Result<(), QueryError> {
        let negative = match *self {
            Limit::Count(n) => n < 0,
            Limit::Range { offset, count } => offset < 0 || count < 0,
        };
        if negative {
            return Err(QueryError::InvalidLimit(self.to_string()));
        }
        Ok(())
    }

    fn append(&self, sql: &mut String, args: &mut Vec<SqlValue>) -> Result<(), QueryError> {
        self.validate()?;
        match *self {
            Limit::Count(n) => {
                sql.push_str(" limit ?");
                args.push(SqlValue::BigInt(n));
            }
            Limit::Range { offset, count } => {
                sql.push_str(" offset ? limit ?");
                args.push(SqlValue::BigInt(offset));
                args.push(SqlValue::BigInt(count));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Count(n) => write!(f, "{}", n),
            Limit::Range { offset, count } => write!(f, "{},{}", offset, count),
        }
    }
}

/// Parses `"5"` or `"10,5"` (offset, count)
impl FromStr for Limit {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || QueryError::InvalidLimit(s.to_string());
        let parse = |part: &str| part.trim().parse::<i64>().map_err(|_| invalid());

        let limit = match s.split_once(',') {
            Some((offset, count)) => Limit::Range {
                offset: parse(offset)?,
                count: parse(count)?,
            },
            None => Limit::Count(parse(s)?),
        };
        limit.validate()?;
        Ok(limit)
    }
}

impl From<i64> for Limit {
    fn from(n: i64) -> Self {
        Limit::Count(n)
    }
}

impl From<(i64, i64)> for Limit {
    fn from((offset, count): (i64, i64)) -> Self {
        Limit::Range { offset, count }
    }
}

/// A `where` clause and the values for its markers
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    clause: String,
    args: Vec<SqlValue>,
}

impl Filter {
    pub fn new(clause: impl Into<String>, args: Vec<SqlValue>) -> Self {
        Self {
            clause: clause.into(),
            args,
        }
    }

    pub fn clause(&self) -> &str {
        &self.clause
    }

    pub fn args(&self) -> &[SqlValue] {
        &self.args
    }

    pub(crate) fn append(&self, sql: &mut String, args: &mut Vec<SqlValue>) {
        if self.clause.trim().is_empty() {
            return;
        }
        sql.push_str(" where ");
        sql.push_str(&self.clause);
        args.extend(self.args.iter().cloned());
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    filter: Option<Filter>,
    order_by: Option<String>,
    limit: Option<Limit>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, clause: impl Into<String>, args: Vec<SqlValue>) -> Self {
        self.filter = Some(Filter::new(clause, args));
        self
    }

    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        let order_by = order_by.into();
        self.order_by = if order_by.trim().is_empty() {
            None
        } else {
            Some(order_by)
        };
        self
    }

    pub fn limit(mut self, limit: impl Into<Limit>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    pub fn get_filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn has_order_by(&self) -> bool {
        self.order_by.is_some()
    }

    /// Append the clauses to `base`, returning the statement and its arguments
    pub fn render(&self, base: &str) -> Result<(String, Vec<SqlValue>), QueryError> {
        let mut sql = base.to_string();
        let mut args = Vec::new();

        if let Some(filter) = &self.filter {
            filter.append(&mut sql, &mut args);
        }
        if let Some(order_by) = &self.order_by {
            sql.push_str(" order by ");
            sql.push_str(order_by);
        }
        if let Some(limit) = &self.limit {
            limit.append(&mut sql, &mut args)?;
        }

        Ok((sql, args))
    }
}
