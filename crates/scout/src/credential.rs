use std::fmt::{self, Debug, Display};

/// The API key used to reach the model endpoint.
///
/// A blank key counts as no key. Formatting never reveals the key.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential {
    key: Option<String>,
}

impl Credential {
    /// Creates a credential, usually from the environment.
    pub fn new(key: Option<String>) -> Self {
        let mut credential = Self::default();
        if let Some(key) = key {
            credential.set(key);
        }
        credential
    }

    /// Replaces the key. Surrounding whitespace is dropped.
    pub fn set<S: Into<String>>(&mut self, key: S) {
        let key = key.into();
        let key = key.trim();
        self.key = (!key.is_empty()).then(|| key.to_owned());
    }

    /// Forgets the key.
    #[inline]
    pub fn clear(&mut self) {
        self.key = None;
    }

    /// Returns the key, or `None` when absent.
    #[inline]
    pub fn get(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Whether a key is present.
    #[inline]
    pub fn is_present(&self) -> bool {
        self.key.is_some()
    }

    /// Returns a display form that keeps at most the first four characters
    /// of long keys.
    pub fn masked(&self) -> String {
        let Some(key) = &self.key else {
            return "(not set)".to_owned();
        };
        if key.chars().count() <= 8 {
            return "********".to_owned();
        }
        let prefix: String = key.chars().take(4).collect();
        format!("{prefix}********")
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.masked()).finish()
    }
}

impl Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_is_absent() {
        assert!(!Credential::new(None).is_present());
        assert!(!Credential::new(Some("  \t".to_owned())).is_present());

        let mut credential = Credential::new(Some(" gsk_abc ".to_owned()));
        assert_eq!(credential.get(), Some("gsk_abc"));
        credential.set("");
        assert_eq!(credential.get(), None);
        credential.set("X");
        assert_eq!(credential.get(), Some("X"));
        credential.clear();
        assert!(!credential.is_present());
    }

    #[test]
    fn test_masking() {
        let credential =
            Credential::new(Some("gsk_0123456789abcdef".to_owned()));
        assert_eq!(credential.to_string(), "gsk_********");
        assert_eq!(format!("{credential:?}"), "Credential(\"gsk_********\")");
        assert_eq!(Credential::new(Some("short".to_owned())).masked(), "********");
        assert_eq!(Credential::default().masked(), "(not set)");
    }
}
