//! Lazily resolved, chainable query builder.
//!
//! A [`Query`] accumulates filter conditions and execution conditions (sort, limit,
//! skip) without touching the store. Only [`Query::all`], [`Query::count`],
//! [`Query::exists`] and the enumeration helpers execute, and every one of those
//! calls goes to the store again: nothing is cached.
//!
//! # Query Building
//!
//! ```ignore
//! use bson::doc;
//!
//! let mut query = adapter.query::<User>("users")?;
//! query
//!     .find(doc! { "name": "Alice" })
//!     .and(doc! { "age": { "$gte": 18 } })
//!     .desc(["created_at"])
//!     .skip(10)
//!     .limit(10);
//!
//! let users = query.all().await?;
//! ```
//!
//! Accumulator methods mutate the builder and hand it back; calling `find` twice with
//! the same key keeps the last value, and every `order`/`reverse_order` call replaces
//! the previous sort.

use bson::Document;
use std::fmt::Debug;

use crate::{
    collection::Collection,
    driver::StoreDriver,
    entity::Entity,
    error::{AdapterError, AdapterResult},
    scope::{Conditions, SortDirection},
};

/// A mutable filter/sort/paging accumulator bound to one collection.
///
/// # Type Parameters
///
/// * `D` - The store driver type
/// * `E` - The entity type results are turned into
/// * `C` - An opaque caller context (for instance the calling repository), carried but
///   never interpreted
#[derive(Debug)]
pub struct Query<'a, D: StoreDriver, E, C = ()> {
    collection: Collection<'a, D, E>,
    context: C,
    find_conditions: Document,
    conditions: Conditions,
}

impl<'a, D: StoreDriver, E, C> Query<'a, D, E, C> {
    /// Creates an empty query over `collection`.
    pub fn new(collection: Collection<'a, D, E>, context: C) -> Self {
        Self {
            collection,
            context,
            find_conditions: Document::new(),
            conditions: Conditions::new(),
        }
    }

    /// Creates a query and hands it to `configure` before returning it.
    ///
    /// ```ignore
    /// let query = Query::configured(users, repository, |q| {
    ///     q.find(doc! { "name": "Alice" }).try_limit(page_size)?;
    ///     Ok(())
    /// })?;
    /// ```
    pub fn configured<F>(
        collection: Collection<'a, D, E>,
        context: C,
        configure: F,
    ) -> AdapterResult<Self>
    where
        F: FnOnce(&mut Self) -> AdapterResult<()>,
    {
        let mut query = Self::new(collection, context);
        configure(&mut query)?;

        Ok(query)
    }

    /// Merges `filter` into the filter conditions. Keys already present are replaced.
    pub fn find(&mut self, filter: Document) -> &mut Self {
        for (key, value) in filter {
            self.find_conditions.insert(key, value);
        }
        self
    }

    /// Alias of [`find`](Self::find).
    pub fn and(&mut self, filter: Document) -> &mut Self {
        self.find(filter)
    }

    /// Caps the number of records returned.
    pub fn limit(&mut self, number: u64) -> &mut Self {
        self.conditions.limit = Some(number);
        self
    }

    /// Skips the first `number` records.
    pub fn skip(&mut self, number: u64) -> &mut Self {
        self.conditions.skip = Some(number);
        self
    }

    /// [`limit`](Self::limit) for a number that may be missing.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidArgument`] when `number` is `None`.
    pub fn try_limit(&mut self, number: Option<u64>) -> AdapterResult<&mut Self> {
        Ok(self.limit(require(number)?))
    }

    /// [`skip`](Self::skip) for a number that may be missing.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidArgument`] when `number` is `None`.
    pub fn try_skip(&mut self, number: Option<u64>) -> AdapterResult<&mut Self> {
        Ok(self.skip(require(number)?))
    }

    /// Sorts ascending over `fields`, in the order given.
    pub fn order<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conditions.sort = Some(Conditions::sort_spec(fields, SortDirection::Asc));
        self
    }

    /// Alias of [`order`](Self::order).
    pub fn asc<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order(fields)
    }

    /// Sorts descending over `fields`, in the order given.
    pub fn reverse_order<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conditions.sort = Some(Conditions::sort_spec(fields, SortDirection::Desc));
        self
    }

    /// Alias of [`reverse_order`](Self::reverse_order).
    pub fn desc<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reverse_order(fields)
    }

    /// The collection narrowed to this query's conditions. Does not execute anything.
    pub fn scoped(&self) -> Collection<'a, D, E> {
        self.collection
            .find(&self.find_conditions, &self.conditions)
    }

    /// Alias of [`scoped`](Self::scoped).
    pub fn run(&self) -> Collection<'a, D, E> {
        self.scoped()
    }

    pub fn find_conditions(&self) -> &Document {
        &self.find_conditions
    }

    pub fn conditions(&self) -> &Conditions {
        &self.conditions
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    /// Counts the matching records, honouring skip and limit.
    pub async fn count(&self) -> AdapterResult<u64> {
        self.scoped().count().await
    }

    /// `true` when at least one record matches.
    pub async fn exists(&self) -> AdapterResult<bool> {
        Ok(self.count().await? != 0)
    }
}

impl<'a, D: StoreDriver, E: Entity, C> Query<'a, D, E, C> {
    /// Resolves the query into entities.
    ///
    /// # Errors
    ///
    /// Store failures are reported as [`AdapterError::InvalidQuery`] carrying the
    /// store's message. Coercion failures are returned unchanged.
    pub async fn all(&self) -> AdapterResult<Vec<E>> {
        self.scoped()
            .to_a()
            .await
            .map_err(|err| match err {
                AdapterError::Store(native) => {
                    tracing::warn!(
                        collection = %self.collection.name(),
                        error = %native,
                        "query rejected by the store"
                    );
                    AdapterError::InvalidQuery(native.to_string())
                }
                other => other,
            })
    }

    /// Calls `f` with every resolved entity.
    pub async fn each<F>(&self, f: F) -> AdapterResult<()>
    where
        F: FnMut(E),
    {
        self.all().await?.into_iter().for_each(f);
        Ok(())
    }

    /// The first resolved entity, if any.
    pub async fn first(&self) -> AdapterResult<Option<E>> {
        Ok(self.all().await?.into_iter().next())
    }

    pub async fn is_empty(&self) -> AdapterResult<bool> {
        Ok(self.all().await?.is_empty())
    }

    /// Resolves the query and renders the entities for display.
    pub async fn render(&self) -> AdapterResult<String>
    where
        E: Debug,
    {
        Ok(format!("{:?}", self.all().await?))
    }
}

fn require(number: Option<u64>) -> AdapterResult<u64> {
    number.ok_or_else(|| AdapterError::InvalidArgument("You need to specify a condition.".to_string()))
}
