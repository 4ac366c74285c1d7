// src/resolver/requirement.rs

//! Requirement declarations and their classification

use crate::reference::Reference;
use std::fmt;

/// Where a requirement is declared to come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceTag {
    /// Resolvable from a public remote (ConanCenter or a local build)
    Public,
    /// Only published on an internal remote that may be unreachable
    Restricted,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Restricted => "restricted",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One dependency declaration
///
/// Immutable once constructed; resolution produces new values rather than
/// editing declared ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    reference: Reference,
    source_tag: SourceTag,
    essential: bool,
}

impl Requirement {
    pub fn new(reference: Reference, source_tag: SourceTag, essential: bool) -> Self {
        Self {
            reference,
            source_tag,
            essential,
        }
    }

    pub fn name(&self) -> &str {
        &self.reference.name
    }

    pub fn version_spec(&self) -> &str {
        &self.reference.version
    }

    pub fn source_tag(&self) -> SourceTag {
        self.source_tag
    }

    pub fn is_essential(&self) -> bool {
        self.essential
    }

    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    /// The public-source form: same name and version, origin qualifier removed
    pub fn to_public(&self) -> Self {
        Self {
            reference: self.reference.without_origin(),
            source_tag: SourceTag::Public,
            essential: self.essential,
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_public_strips_origin() {
        let declared = Requirement::new(
            Reference::parse("clipper/6.4.2@ultimaker/stable").unwrap(),
            SourceTag::Restricted,
            true,
        );
        let public = declared.to_public();
        assert_eq!(public.name(), "clipper");
        assert_eq!(public.version_spec(), "6.4.2");
        assert_eq!(public.source_tag(), SourceTag::Public);
        assert_eq!(public.to_string(), "clipper/6.4.2");
        // declared value untouched
        assert_eq!(declared.source_tag(), SourceTag::Restricted);
    }
}
