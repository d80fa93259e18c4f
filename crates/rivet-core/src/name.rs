use std::{borrow::Borrow, fmt, ops::Deref, sync::Arc};

/// A symbolic name: relation, command, mapper, gateway, dataset or attribute.
///
/// Cloning is a reference count bump, so names are freely shared between
/// registries and the components they hold.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(Arc<str>);

impl Name {
    pub fn new(src: &str) -> Self {
        Self(Arc::from(src))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a copy of this name with `prefix` prepended.
    pub fn prefixed(&self, prefix: &str) -> Self {
        if prefix.is_empty() {
            return self.clone();
        }
        Self::from(format!("{prefix}{}", self.0))
    }
}

impl Deref for Name {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Name {
    fn from(src: &str) -> Self {
        Self::new(src)
    }
}

impl From<&String> for Name {
    fn from(src: &String) -> Self {
        Self::new(src)
    }
}

impl From<String> for Name {
    fn from(src: String) -> Self {
        Self(Arc::from(src))
    }
}

impl From<&Name> for Name {
    fn from(src: &Name) -> Self {
        src.clone()
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0)
    }
}
