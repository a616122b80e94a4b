//! Key - Path-like record addressing.
//!
//! A key is a non-empty path of `(kind, id)` elements. The terminal element
//! names the record itself; any preceding elements are its ancestors.
//!
//! ```ignore
//! let parent = Key::new("User", "alice");
//! let key = parent.child("Post", 42);
//! assert_eq!(key.to_string(), "User:alice/Post:42");
//! assert_eq!(key.name(), "42");
//! ```

use std::fmt;

use thiserror::Error;

/// Identifier of a single path element: a string name or a numeric id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyId {
    Id(i64),
    Name(String),
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyId::Id(id) => write!(f, "{}", id),
            KeyId::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for KeyId {
    fn from(value: &str) -> Self {
        KeyId::Name(value.to_string())
    }
}

impl From<String> for KeyId {
    fn from(value: String) -> Self {
        KeyId::Name(value)
    }
}

impl From<i64> for KeyId {
    fn from(value: i64) -> Self {
        KeyId::Id(value)
    }
}

impl From<i32> for KeyId {
    fn from(value: i32) -> Self {
        KeyId::Id(value.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathElement {
    pub kind: String,
    pub id: KeyId,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("key path is empty")]
    EmptyPath,
    #[error("key path has a kind without an id: {0}")]
    OddPath(String),
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key {
    namespace: Option<String>,
    path: Vec<PathElement>,
}

impl Key {
    /// Create a top-level key.
    pub fn new(kind: impl Into<String>, id: impl Into<KeyId>) -> Self {
        Self {
            namespace: None,
            path: vec![PathElement {
                kind: kind.into(),
                id: id.into(),
            }],
        }
    }

    /// Build a key from alternating kind/name segments, e.g. `["User", "alice", "Post", "1"]`.
    pub fn from_path<I, S>(segments: I) -> Result<Self, KeyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut path = Vec::new();
        let mut segments = segments.into_iter();
        while let Some(kind) = segments.next() {
            let kind = kind.into();
            let id = segments.next().ok_or_else(|| KeyError::OddPath(kind.clone()))?;
            path.push(PathElement {
                kind,
                id: KeyId::Name(id.into()),
            });
        }

        if path.is_empty() {
            return Err(KeyError::EmptyPath);
        }

        Ok(Self {
            namespace: None,
            path,
        })
    }

    /// Key of a record nested under this one.
    pub fn child(&self, kind: impl Into<String>, id: impl Into<KeyId>) -> Self {
        let mut path = self.path.clone();
        path.push(PathElement {
            kind: kind.into(),
            id: id.into(),
        });
        Self {
            namespace: self.namespace.clone(),
            path,
        }
    }

    /// Move this key into `namespace`.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Namespace, or `None` for the default one.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Kind/id pairs from the root to this key.
    pub fn path(&self) -> &[PathElement] {
        &self.path
    }

    fn last(&self) -> &PathElement {
        // Constructors never produce an empty path.
        &self.path[self.path.len() - 1]
    }

    /// Kind of the terminal element.
    pub fn kind(&self) -> &str {
        &self.last().kind
    }

    /// Id of the terminal element.
    pub fn id(&self) -> &KeyId {
        &self.last().id
    }

    /// Terminal id rendered as a string. This becomes the entity `id`.
    pub fn name(&self) -> String {
        self.last().id.to_string()
    }

    /// Key with the terminal element removed, if any remains.
    pub fn parent(&self) -> Option<Key> {
        if self.path.len() < 2 {
            return None;
        }
        Some(Self {
            namespace: self.namespace.clone(),
            path: self.path[..self.path.len() - 1].to_vec(),
        })
    }

    /// Whether `ancestor` is a strict prefix of this key's path.
    pub fn has_ancestor(&self, ancestor: &Key) -> bool {
        self.namespace == ancestor.namespace
            && self.path.len() > ancestor.path.len()
            && self.path.starts_with(&ancestor.path)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(namespace) = &self.namespace {
            write!(f, "{}#", namespace)?;
        }
        for (i, element) in self.path.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}:{}", element.kind, element.id)?;
        }
        Ok(())
    }
}
