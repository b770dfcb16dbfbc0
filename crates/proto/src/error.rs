use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};

/// A single violated constraint on a message or request field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Violation {
    field: String,
    message: String,
}

impl Violation {
    /// Creates a violation for the given field.
    #[inline]
    pub fn new<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns the name of the offending field, e.g. `top_p` or
    /// `messages[2]`.
    #[inline]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the human-readable description of the rule.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for Violation {}

/// The composite error returned by request validation.
///
/// It carries every violated rule in the order the rules were checked, so
/// a caller can fix all of them in one go.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ValidationError {
    violations: Vec<Violation>,
}

impl ValidationError {
    /// Returns all recorded violations.
    #[inline]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Returns `true` if any violation concerns the given field.
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    /// Returns the number of recorded violations.
    #[inline]
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    #[inline]
    pub(crate) fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    #[inline]
    pub(crate) fn check<F, M>(&mut self, ok: bool, field: F, message: M)
    where
        F: Into<String>,
        M: Into<String>,
    {
        if !ok {
            self.push(Violation::new(field, message));
        }
    }

    /// Converts the collected violations into a result.
    #[inline]
    pub(crate) fn finish(self) -> Result<(), Self> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<Violation> for ValidationError {
    fn from(violation: Violation) -> Self {
        Self {
            violations: vec![violation],
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (idx, violation) in self.violations.iter().enumerate() {
            if idx > 0 {
                f.write_str("\n")?;
            }
            Display::fmt(violation, f)?;
        }
        Ok(())
    }
}

impl StdError for ValidationError {}

/// Describes why a response body could not be mapped to a known shape.
#[derive(Debug)]
pub enum ClassifyError {
    /// The body is not a JSON object, or does not decode into the shape
    /// that was selected for it.
    Json(serde_json::Error),
    /// The body has an `object` discriminant with an unrecognized value.
    UnknownObject(String),
    /// The body has none of the discriminating keys.
    UnknownShape,
}

impl Display for ClassifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ClassifyError::Json(err) => {
                write!(f, "malformed response body: {err}")
            }
            ClassifyError::UnknownObject(object) => {
                write!(f, "unknown object type: {object}")
            }
            ClassifyError::UnknownShape => f.write_str("unknown response type"),
        }
    }
}

impl StdError for ClassifyError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ClassifyError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ClassifyError {
    fn from(err: serde_json::Error) -> Self {
        ClassifyError::Json(err)
    }
}
