//! Recipient address classification.
//!
//! The shape check here is deliberately permissive and nowhere near RFC 5322:
//! an address is accepted iff it looks like `local@domain.tld` — one or more
//! non-whitespace, non-`@` characters, an `@`, then a domain portion that
//! contains a dot with at least one such character on either side. This is
//! enough to skip obvious garbage without rejecting real-world addresses.

use tracing::warn;

/// The partition of a recipient list into structurally valid and invalid
/// addresses. `valid` preserves the input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: Vec<String>,
    pub invalid: Vec<String>,
}

fn segment_ok(segment: &str) -> bool {
    !segment.is_empty()
        && !segment
            .chars()
            .any(|c| c.is_whitespace() || c == '@')
}

/// Returns `true` if `address` passes the coarse `local@domain.tld` shape
/// check. Pure and total; never fails.
#[must_use]
pub fn is_valid(address: &str) -> bool {
    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };

    if !segment_ok(local) || !segment_ok(domain) {
        return false;
    }

    // The domain needs an interior dot: at least one character before and
    // after it. Additional dots are allowed on either side.
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i < domain.len() - 1)
}

/// Apply the shape check to every recipient, in input order.
///
/// Every recipient lands in exactly one partition; invalid addresses are
/// reported individually and excluded from dispatch, never retried or
/// mutated.
#[must_use]
pub fn partition<I, S>(recipients: I) -> ValidationResult
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut result = ValidationResult::default();

    for recipient in recipients {
        let recipient = recipient.into();
        if is_valid(&recipient) {
            result.valid.push(recipient);
        } else {
            warn!(recipient = %recipient, "Skipping invalid recipient address");
            result.invalid.push(recipient);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_addresses() {
        for address in [
            "a@b.com",
            "user@example.org",
            "first.last@mail.example.co.uk",
            "user+tag@example.com",
            "UPPER@EXAMPLE.COM",
        ] {
            assert!(is_valid(address), "{address} should be accepted");
        }
    }

    #[test]
    fn rejects_missing_at_sign() {
        assert!(!is_valid("not-an-email"));
        assert!(!is_valid("user.example.com"));
        assert!(!is_valid(""));
    }

    #[test]
    fn rejects_missing_domain_dot() {
        assert!(!is_valid("user@localhost"));
        assert!(!is_valid("user@example"));
    }

    #[test]
    fn rejects_dot_at_domain_edge() {
        assert!(!is_valid("user@.example"));
        assert!(!is_valid("user@example."));
        assert!(!is_valid("user@."));
    }

    #[test]
    fn rejects_embedded_whitespace() {
        assert!(!is_valid("us er@example.com"));
        assert!(!is_valid("user@exa mple.com"));
        assert!(!is_valid("user@example.com "));
        assert!(!is_valid("\tuser@example.com"));
    }

    #[test]
    fn rejects_multiple_at_signs() {
        assert!(!is_valid("user@host@example.com"));
        assert!(!is_valid("@example.com"));
        assert!(!is_valid("user@"));
    }

    #[test]
    fn partition_preserves_order_and_is_exhaustive() {
        let recipients = [
            "a@b.com",
            "not-an-email",
            "c@d.org",
            "also bad@x.com",
            "e@f.net",
        ];

        let result = partition(recipients);

        assert_eq!(result.valid, vec!["a@b.com", "c@d.org", "e@f.net"]);
        assert_eq!(result.invalid, vec!["not-an-email", "also bad@x.com"]);
        assert_eq!(
            result.valid.len() + result.invalid.len(),
            recipients.len(),
            "every recipient appears in exactly one partition"
        );
    }

    #[test]
    fn partition_of_nothing_is_empty() {
        let result = partition(Vec::<String>::new());
        assert!(result.valid.is_empty());
        assert!(result.invalid.is_empty());
    }
}
