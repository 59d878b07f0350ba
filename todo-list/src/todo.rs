//! Todo records and the filter shapes used to query them.

use serde::{Deserialize, Serialize};

pub(crate) const OWNER_KEY: &str = "owner";
pub(crate) const STATUS_KEY: &str = "status";
pub(crate) const BODY_KEY: &str = "body";
pub(crate) const CATEGORY_KEY: &str = "category";

/// A todo as stored by the server.
///
/// Records are never edited in place; a fresh list is fetched instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoRecord {
    /// Server-assigned identity, opaque to the client
    #[serde(rename = "_id")]
    pub id: String,
    pub owner: String,
    /// `true` once the todo is done
    pub status: bool,
    pub body: String,
    pub category: String,
}

/// The owner/category constraints the user is currently asking for.
///
/// Each field is either unset or a non-empty string. Use [`normalize_criterion`]
/// to turn raw input into that shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub owner: Option<String>,
    pub category: Option<String>,
}

impl FilterCriteria {
    pub fn new(owner: Option<&str>, category: Option<&str>) -> Self {
        Self {
            owner: normalize_criterion(owner.map(str::to_string)),
            category: normalize_criterion(category.map(str::to_string)),
        }
    }

    pub fn is_unset(&self) -> bool {
        self.owner.is_none() && self.category.is_none()
    }

    /// The remote query for these criteria. Only owner and category travel.
    pub fn to_query(&self) -> TodoQuery {
        TodoQuery {
            owner: self.owner.clone(),
            category: self.category.clone(),
            ..Default::default()
        }
    }
}

/// Turns blank input into "no constraint".
pub fn normalize_criterion(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// Constraints sent to the todos endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoQuery {
    pub owner: Option<String>,
    pub status: Option<bool>,
    pub body: Option<String>,
    pub category: Option<String>,
}

impl TodoQuery {
    /// Query-string pairs for the set fields.
    ///
    /// Unset and empty fields produce no pair at all, so the server never
    /// sees `owner=` style constraints.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(owner) = self.owner.as_deref().filter(|v| !v.is_empty()) {
            pairs.push((OWNER_KEY, owner.to_string()));
        }
        if let Some(status) = self.status {
            pairs.push((STATUS_KEY, status.to_string()));
        }
        if let Some(body) = self.body.as_deref().filter(|v| !v.is_empty()) {
            pairs.push((BODY_KEY, body.to_string()));
        }
        if let Some(category) = self.category.as_deref().filter(|v| !v.is_empty()) {
            pairs.push((CATEGORY_KEY, category.to_string()));
        }
        pairs
    }
}

/// The fields a client supplies when creating a todo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTodo {
    pub owner: String,
    pub body: String,
    pub category: String,
    /// Left to the server's default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<bool>,
}

impl NewTodo {
    pub fn new(
        owner: impl Into<String>,
        body: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            body: body.into(),
            category: category.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: bool) -> Self {
        self.status = Some(status);
        self
    }

    /// Names the first required field that is blank, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            (OWNER_KEY, &self.owner),
            (BODY_KEY, &self.body),
            (CATEGORY_KEY, &self.category),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(key, _)| key)
    }
}

/// Body of a successful create response.
#[derive(Debug, Deserialize)]
pub(crate) struct CreatedTodo {
    pub id: String,
}
