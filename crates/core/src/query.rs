//! Composable `WHERE` fragments over the `collages` table.
//!
//! Every predicate renders against the alias `c` and binds its own
//! parameters, so a query can be assembled from a fixed vocabulary instead
//! of ad-hoc string building.

use rusqlite::types::Value;

use crate::collage::CollageCategory;

/// Which membership table a predicate looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Group,
    Artist,
}

impl Membership {
    pub fn table(self) -> &'static str {
        match self {
            Membership::Group => "collages_torrents",
            Membership::Artist => "collages_artists",
        }
    }

    pub fn entity_column(self) -> &'static str {
        match self {
            Membership::Group => "group_id",
            Membership::Artist => "artist_id",
        }
    }

    /// Alias used when the membership table is joined.
    pub fn alias(self) -> &'static str {
        match self {
            Membership::Group => "ct",
            Membership::Artist => "ca",
        }
    }
}

/// A single condition on `collages c`.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Unlocked,
    NotDeleted,
    OwnedBy(u32),
    NotOwnedBy(u32),
    Category(CollageCategory),
    NotCategory(CollageCategory),
    NotInCategories(Vec<CollageCategory>),
    /// The collage does not already contain this group or artist.
    Lacks(Membership, u32),
    /// Case-insensitive substring match on the name.
    NameContains(String),
    /// Empty list matches nothing.
    IdIn(Vec<u32>),
}

impl Predicate {
    pub fn render(&self) -> (String, Vec<Value>) {
        match self {
            Predicate::Unlocked => ("c.locked = 0".to_string(), vec![]),
            Predicate::NotDeleted => ("c.deleted = 0".to_string(), vec![]),
            Predicate::OwnedBy(user) => ("c.user_id = ?".to_string(), vec![int(*user)]),
            Predicate::NotOwnedBy(user) => ("c.user_id != ?".to_string(), vec![int(*user)]),
            Predicate::Category(cat) => ("c.category_id = ?".to_string(), vec![int(cat.id())]),
            Predicate::NotCategory(cat) => {
                ("c.category_id != ?".to_string(), vec![int(cat.id())])
            }
            Predicate::NotInCategories(cats) => {
                if cats.is_empty() {
                    return ("1 = 1".to_string(), vec![]);
                }
                (
                    format!("c.category_id NOT IN ({})", placeholders(cats.len())),
                    cats.iter().map(|c| int(c.id())).collect(),
                )
            }
            Predicate::Lacks(membership, entity) => (
                format!(
                    "NOT EXISTS (SELECT 1 FROM {} m WHERE m.collage_id = c.id AND m.{} = ?)",
                    membership.table(),
                    membership.entity_column()
                ),
                vec![int(*entity)],
            ),
            Predicate::NameContains(text) => (
                "lower(c.name) LIKE ? ESCAPE '\\'".to_string(),
                vec![Value::Text(format!("%{}%", escape_like(&text.to_lowercase())))],
            ),
            Predicate::IdIn(ids) => {
                if ids.is_empty() {
                    return ("1 = 0".to_string(), vec![]);
                }
                (
                    format!("c.id IN ({})", placeholders(ids.len())),
                    ids.iter().map(|id| int(*id)).collect(),
                )
            }
        }
    }
}

/// Conjunction of predicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    pub fn and(predicates: Vec<Predicate>) -> Self {
        Self { predicates }
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Conditions joined with `AND`, without the keyword.
    pub fn render(&self) -> (String, Vec<Value>) {
        let mut conditions = Vec::with_capacity(self.predicates.len());
        let mut params = Vec::new();
        for predicate in &self.predicates {
            let (sql, values) = predicate.render();
            conditions.push(sql);
            params.extend(values);
        }
        (conditions.join(" AND "), params)
    }

    /// `WHERE ...`, or an empty string when there are no predicates.
    pub fn where_clause(&self) -> (String, Vec<Value>) {
        if self.predicates.is_empty() {
            return (String::new(), vec![]);
        }
        let (sql, params) = self.render();
        (format!("WHERE {}", sql), params)
    }
}

fn int(v: u32) -> Value {
    Value::Integer(i64::from(v))
}

pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
