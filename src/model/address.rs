//! Sender address as it appears in the audit log.

/// A decoded email address.
///
/// # Examples
/// - `"Иван Петров <ivan@example.ru>"` → `display_name = "Иван Петров"`, `address = "ivan@example.ru"`
/// - `"user@example.com"` → `display_name = ""`, `address = "user@example.com"`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailAddress {
    /// Human-readable display name (may be empty).
    pub display_name: String,
    /// The bare email address (`user@domain`), may be empty for group syntax.
    pub address: String,
}

impl EmailAddress {
    /// Take the first mailbox of a parsed `From:` header.
    ///
    /// Encoded-word display names are already decoded by `mail-parser`.
    pub fn from_header(header: Option<&mail_parser::Address<'_>>) -> Self {
        let Some(addr) = header.and_then(|h| h.first()) else {
            return Self::default();
        };
        Self {
            display_name: addr
                .name
                .as_deref()
                .map(|n| n.trim().to_string())
                .unwrap_or_default(),
            address: addr
                .address
                .as_deref()
                .map(|a| a.trim().to_string())
                .unwrap_or_default(),
        }
    }

    /// Format for display: `"Display Name <address>"` or just `"address"`.
    pub fn display(&self) -> String {
        match (self.display_name.is_empty(), self.address.is_empty()) {
            (true, _) => self.address.clone(),
            (false, true) => self.display_name.clone(),
            (false, false) => format!("{} <{}>", self.display_name, self.address),
        }
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_from(raw: &str) -> EmailAddress {
        let message = format!("From: {raw}\r\nSubject: x\r\n\r\nbody\r\n");
        let parsed = mail_parser::MessageParser::default()
            .parse(message.as_bytes())
            .expect("parse");
        EmailAddress::from_header(parsed.from())
    }

    #[test]
    fn test_bare_address() {
        let addr = parse_from("user@example.com");
        assert_eq!(addr.address, "user@example.com");
        assert_eq!(addr.display_name, "");
        assert_eq!(addr.display(), "user@example.com");
    }

    #[test]
    fn test_name_and_address() {
        let addr = parse_from("User One <user1@example.com>");
        assert_eq!(addr.address, "user1@example.com");
        assert_eq!(addr.display_name, "User One");
        assert_eq!(addr.to_string(), "User One <user1@example.com>");
    }

    #[test]
    fn test_encoded_display_name() {
        // "Иван" in UTF-8 base64
        let addr = parse_from("=?UTF-8?B?0JjQstCw0L0=?= <ivan@example.ru>");
        assert_eq!(addr.display_name, "Иван");
        assert_eq!(addr.address, "ivan@example.ru");
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(EmailAddress::from_header(None).display(), "");
    }
}
