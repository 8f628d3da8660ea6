//! Device/browser derivation from the raw user-agent string.

use woothee::parser::Parser;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentInfo {
    /// Device category (pc, smartphone, mobilephone, crawler, ...).
    pub device: Option<String>,
    /// Browser name.
    pub browser: Option<String>,
}

/// Parse a user agent into device category and browser name. Unparseable or
/// placeholder agents yield `None` fields.
pub fn parse_agent(user_agent: &str) -> AgentInfo {
    if user_agent.is_empty() || user_agent == "unknown" {
        return AgentInfo::default();
    }

    let parser = Parser::new();
    let Some(result) = parser.parse(user_agent) else {
        return AgentInfo::default();
    };

    AgentInfo {
        device: (result.category != "UNKNOWN").then(|| result.category.to_string()),
        browser: (result.name != "UNKNOWN").then(|| result.name.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desktop_chrome_is_parsed() {
        let info = parse_agent(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        );
        assert_eq!(info.device.as_deref(), Some("pc"));
        assert_eq!(info.browser.as_deref(), Some("Chrome"));
    }

    #[test]
    fn unknown_placeholder_yields_none() {
        assert_eq!(parse_agent("unknown"), AgentInfo::default());
        assert_eq!(parse_agent(""), AgentInfo::default());
    }

    #[test]
    fn garbage_does_not_panic() {
        let info = parse_agent("definitely-not-a-browser/0.0");
        assert!(info.browser.is_none());
    }
}
