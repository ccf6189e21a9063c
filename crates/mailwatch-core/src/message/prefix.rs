//! Reply and forward subject prefixes.

/// A conventional subject prefix added by mail clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectPrefix {
    /// `FW:` or `FWD:`.
    Forward,
    /// `RE:`.
    Reply,
}

impl SubjectPrefix {
    /// Lowercase spellings recognised for this prefix, longest last.
    #[must_use]
    pub const fn spellings(self) -> &'static [&'static str] {
        match self {
            Self::Forward => &["fw:", "fwd:"],
            Self::Reply => &["re:"],
        }
    }

    /// Strips one leading occurrence of this prefix, ignoring case, and trims
    /// what remains.
    #[must_use]
    pub fn strip(self, subject: &str) -> Option<&str> {
        let trimmed = subject.trim_start();
        self.spellings().iter().find_map(|p| {
            trimmed
                .get(..p.len())
                .filter(|head| head.eq_ignore_ascii_case(p))
                .map(|_| trimmed[p.len()..].trim())
        })
    }
}

/// Strips every leading `RE:`/`FW:`/`FWD:` prefix, in any order and case.
#[must_use]
pub fn strip_all_prefixes(subject: &str) -> &str {
    let mut rest = subject.trim();
    while let Some(next) = SubjectPrefix::Forward
        .strip(rest)
        .or_else(|| SubjectPrefix::Reply.strip(rest))
    {
        rest = next;
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_one_prefix() {
        assert_eq!(SubjectPrefix::Forward.strip("FW: Timecard"), Some("Timecard"));
        assert_eq!(SubjectPrefix::Forward.strip("Fwd:Timecard "), Some("Timecard"));
        assert_eq!(SubjectPrefix::Reply.strip("re:  Timecard"), Some("Timecard"));
        assert_eq!(SubjectPrefix::Reply.strip("FW: Timecard"), None);
        assert_eq!(SubjectPrefix::Forward.strip("Fwrd: x"), None);
        assert_eq!(SubjectPrefix::Forward.strip("RE: FW: x"), None);
    }

    #[test]
    fn test_strip_all_prefixes() {
        assert_eq!(strip_all_prefixes("RE: FW: re: Invoice"), "Invoice");
        assert_eq!(strip_all_prefixes("Invoice"), "Invoice");
        assert_eq!(strip_all_prefixes("  "), "");
        assert_eq!(strip_all_prefixes("Re:"), "");
    }

    #[test]
    fn test_multibyte_subject_does_not_panic() {
        assert_eq!(SubjectPrefix::Reply.strip("ré"), None);
        assert_eq!(strip_all_prefixes("日本語"), "日本語");
    }
}
