//! Selector parsing
//!
//! Agents address elements either with CSS or by their visible text. CSS is
//! passed through; `text=` selectors become XPath queries that match the
//! innermost element containing the text.

/// A selector resolved to the query language the engine understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Css(String),
    XPath(String),
}

impl Selector {
    /// Parse an agent-supplied selector
    ///
    /// - `text=Save` matches elements whose text contains `Save`
    /// - `text="Save"` matches elements whose text is exactly `Save`
    /// - `xpath=...` or anything starting with `//` is XPath
    /// - `css=...` or anything else is CSS
    pub fn parse(selector: &str) -> Self {
        let trimmed = selector.trim();

        if let Some(query) = trimmed.strip_prefix("text=") {
            return Self::XPath(text_xpath(query));
        }
        if let Some(xpath) = trimmed.strip_prefix("xpath=") {
            return Self::XPath(xpath.to_string());
        }
        if trimmed.starts_with("//") {
            return Self::XPath(trimmed.to_string());
        }
        if let Some(css) = trimmed.strip_prefix("css=") {
            return Self::Css(css.to_string());
        }

        Self::Css(trimmed.to_string())
    }
}

fn text_xpath(query: &str) -> String {
    let exact = query.len() >= 2 && query.starts_with('"') && query.ends_with('"');

    if exact {
        let literal = xpath_literal(&query[1..query.len() - 1]);
        format!("//*[not(self::script or self::style)][normalize-space(.)={}]", literal)
    } else {
        let literal = xpath_literal(query.trim());
        format!(
            "//*[not(self::script or self::style)][contains(normalize-space(.), {lit})]\
             [not(.//*[contains(normalize-space(.), {lit})])]",
            lit = literal
        )
    }
}

/// Quote a string as an XPath 1.0 literal
fn xpath_literal(value: &str) -> String {
    if !value.contains('"') {
        return format!("\"{}\"", value);
    }
    if !value.contains('\'') {
        return format!("'{}'", value);
    }

    let parts: Vec<String> = value
        .split('"')
        .map(|part| format!("\"{}\"", part))
        .collect();
    format!("concat({})", parts.join(", '\"', "))
}
