//! # Naming
//!
//! Destination naming for dumped packets.
//!
//! A pattern such as `"/out/pkt-{{count}}-{{streamIndex}}.raw"` is compiled
//! once into a [`NamingTemplate`] and rendered for every packet against a
//! [`NamingData`] map. Rendering is strict: a variable missing from the map is
//! an error, never an empty string.
//!
//! ## Per-packet variables
//!
//! | name          | value                          |
//! |---------------|--------------------------------|
//! | `count`       | sequence number, starting at 1 |
//! | `pts`         | packet presentation timestamp  |
//! | `streamIndex` | packet stream index            |
//!
//! Every other key comes from the node's static data.

use contracts::{ContractError, NamingData, Packet};
use handlebars::Handlebars;
use serde_json::Value;
use tracing::instrument;

/// Variable holding the sequence number
pub const VAR_COUNT: &str = "count";
/// Variable holding the packet timestamp
pub const VAR_PTS: &str = "pts";
/// Variable holding the packet stream index
pub const VAR_STREAM_INDEX: &str = "streamIndex";

/// Names the dispatch loop overwrites for every packet
pub const RESERVED_VARIABLES: [&str; 3] = [VAR_COUNT, VAR_PTS, VAR_STREAM_INDEX];

const TEMPLATE_NAME: &str = "pattern";

/// Compiled naming pattern
///
/// Immutable after [`NamingTemplate::compile`]; rendering takes `&self`.
pub struct NamingTemplate {
    pattern: String,
    registry: Handlebars<'static>,
}

impl NamingTemplate {
    /// Compile `pattern`
    ///
    /// # Errors
    /// `ContractError::TemplateParse` naming the offending pattern.
    #[instrument(name = "naming_compile", level = "debug")]
    pub fn compile(pattern: &str) -> Result<Self, ContractError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        // Destinations are paths, not HTML.
        registry.register_escape_fn(handlebars::no_escape);
        registry
            .register_template_string(TEMPLATE_NAME, keep_backslashes(pattern))
            .map_err(|e| ContractError::template_parse(pattern, e.to_string()))?;

        Ok(Self {
            pattern: pattern.to_string(),
            registry,
        })
    }

    /// Source pattern
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Render the pattern against `data`
    ///
    /// A variable present with a `null` value renders as an empty string.
    ///
    /// # Errors
    /// `ContractError::TemplateRender` when a referenced variable is missing
    /// or evaluation fails.
    pub fn render(&self, data: &NamingData) -> Result<String, ContractError> {
        self.registry
            .render(TEMPLATE_NAME, data)
            .map_err(|e| ContractError::template_render(&self.pattern, e.to_string()))
    }
}

impl std::fmt::Debug for NamingTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamingTemplate")
            .field("pattern", &self.pattern)
            .finish()
    }
}

/// Backslashes are literal in patterns.
///
/// The engine swallows one backslash in front of `{{` (and `\{{` stops the tag
/// from being expanded), so every such run gets one extra backslash.
fn keep_backslashes(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 2);
    let mut rest = pattern;
    while let Some(pos) = rest.find("{{") {
        let (head, tail) = rest.split_at(pos);
        out.push_str(head);
        if head.ends_with('\\') {
            out.push('\\');
        }
        out.push_str("{{");
        rest = &tail[2..];
    }
    out.push_str(rest);
    out
}

/// Whether `pattern` mentions `name` inside any `{{ ... }}` tag
///
/// Matches whole identifiers, so `{{ count }}` and `(eq count 2)` both count
/// but `{{counter}}` does not.
pub fn mentions_variable(pattern: &str, name: &str) -> bool {
    let mut rest = pattern;
    while let Some(open) = rest.find("{{") {
        let tag = &rest[open + 2..];
        let close = tag.find("}}").unwrap_or(tag.len());
        let found = tag[..close]
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .any(|word| word == name);
        if found {
            return true;
        }
        rest = &tag[close..];
    }
    false
}

/// Publish the per-packet variables into `data`
pub fn item_variables(data: &mut NamingData, count: u64, packet: &Packet) {
    data.insert(VAR_COUNT.to_string(), Value::from(count));
    data.insert(VAR_PTS.to_string(), Value::from(packet.pts));
    data.insert(VAR_STREAM_INDEX.to_string(), Value::from(packet.stream_index));
}

/// Whether `name` is overwritten per packet
pub fn is_reserved(name: &str) -> bool {
    RESERVED_VARIABLES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(count: u64, pts: i64, stream_index: usize) -> NamingData {
        let mut data = NamingData::new();
        item_variables(&mut data, count, &Packet::new(pts, stream_index, Vec::new()));
        data
    }

    #[test]
    fn test_render_item_variables() {
        let template = NamingTemplate::compile("/out/pkt-{{count}}-{{streamIndex}}.raw").unwrap();

        assert_eq!(template.render(&vars(1, 0, 0)).unwrap(), "/out/pkt-1-0.raw");
        assert_eq!(template.render(&vars(2, 0, 1)).unwrap(), "/out/pkt-2-1.raw");
    }

    #[test]
    fn test_render_negative_pts_and_static_data() {
        let template = NamingTemplate::compile("{{session}}/{{pts}}.bin").unwrap();
        let mut data = vars(1, -3000, 0);
        data.insert("session".into(), Value::from("take-1"));

        assert_eq!(template.render(&data).unwrap(), "take-1/-3000.bin");
    }

    #[test]
    fn test_render_is_repeatable() {
        let template = NamingTemplate::compile("a-{{count}}").unwrap();
        let data = vars(7, 0, 0);

        let first = template.render(&data).unwrap();
        let second = template.render(&data).unwrap();
        assert_eq!(first, second);
        assert_eq!(template.render(&vars(8, 0, 0)).unwrap(), "a-8");
    }

    #[test]
    fn test_unknown_variable_is_render_error() {
        let template = NamingTemplate::compile("{{unknownVar}}").unwrap();
        let err = template.render(&vars(1, 0, 0)).unwrap_err();

        assert!(matches!(err, ContractError::TemplateRender { .. }));
        assert!(err.to_string().contains("{{unknownVar}}"));
    }

    #[test]
    fn test_malformed_pattern_is_parse_error() {
        let err = NamingTemplate::compile("{{").unwrap_err();
        match err {
            ContractError::TemplateParse { pattern, .. } => assert_eq!(pattern, "{{"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_no_html_escaping() {
        let template = NamingTemplate::compile("{{name}}").unwrap();
        let mut data = NamingData::new();
        data.insert("name".into(), Value::from("a&b<c>"));

        assert_eq!(template.render(&data).unwrap(), "a&b<c>");
    }

    #[test]
    fn test_backslash_before_tag_is_literal() {
        let template = NamingTemplate::compile(r"C:\out\{{count}}.raw").unwrap();

        assert_eq!(template.render(&vars(1, 0, 0)).unwrap(), r"C:\out\1.raw");
        assert_eq!(template.render(&vars(2, 0, 0)).unwrap(), r"C:\out\2.raw");
        assert_eq!(template.pattern(), r"C:\out\{{count}}.raw");
    }

    #[test]
    fn test_double_backslash_before_tag() {
        let template = NamingTemplate::compile(r"a\\{{count}}\b").unwrap();
        assert_eq!(template.render(&vars(3, 0, 0)).unwrap(), r"a\\3\b");
    }

    #[test]
    fn test_null_static_value_renders_empty() {
        let template = NamingTemplate::compile("{{session}}-{{count}}").unwrap();
        let mut data = vars(1, 0, 0);
        data.insert("session".into(), Value::Null);

        assert_eq!(template.render(&data).unwrap(), "-1");
    }

    #[test]
    fn test_mentions_variable() {
        assert!(mentions_variable("pkt-{{count}}", "count"));
        assert!(mentions_variable("pkt-{{ count }}", "count"));
        assert!(mentions_variable("{{#if (eq count 2)}}a{{/if}}", "count"));
        assert!(mentions_variable(r"C:\out\{{pts}}.raw", "pts"));
        assert!(!mentions_variable("pkt-{{counter}}", "count"));
        assert!(!mentions_variable("count-{{session}}", "count"));
    }

    #[test]
    fn test_reserved_names() {
        assert!(is_reserved("count"));
        assert!(is_reserved("streamIndex"));
        assert!(!is_reserved("session"));
    }
}
