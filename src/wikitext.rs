use std::collections::HashMap;

use tracing::warn;

/// One template occurrence: its name and parameter map. Unnamed parameters
/// get positional keys "1", "2", ...
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub name: String,
    pub params: HashMap<String, String>,
}

/// Turns raw article markup into an ordered list of template occurrences.
/// The seam lets tests substitute canned template lists for real markup.
pub trait TemplateParser: Send + Sync {
    fn parse(&self, markup: &str) -> Vec<Template>;
}

/// Hand-rolled wikitext template scanner. Templates are returned in document
/// order, with templates nested in parameter values listed after their
/// parent. An unterminated template is logged and skipped; the rest of the
/// markup is still scanned.
pub struct WikitextParser;

impl TemplateParser for WikitextParser {
    fn parse(&self, markup: &str) -> Vec<Template> {
        let mut templates = Vec::new();
        collect_templates(markup, &mut templates);
        templates
    }
}

fn collect_templates(text: &str, out: &mut Vec<Template>) {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'{' && bytes[i + 1] == b'{' {
            match find_closing(bytes, i) {
                Some(end) => {
                    parse_template(&text[i + 2..end], out);
                    i = end + 2;
                    continue;
                }
                None => {
                    warn!("unterminated template at byte offset {}, skipping", i);
                    i += 2;
                    continue;
                }
            }
        }
        i += 1;
    }
}

/// Index of the `}}` matching the `{{` at `open`, tracking nesting.
fn find_closing(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i + 1 < bytes.len() {
        if bytes[i] == b'{' && bytes[i + 1] == b'{' {
            depth += 1;
            i += 2;
        } else if bytes[i] == b'}' && bytes[i + 1] == b'}' {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
            i += 2;
        } else {
            i += 1;
        }
    }
    None
}

fn parse_template(body: &str, out: &mut Vec<Template>) {
    let segments = split_top_level(body, b'|', 0);
    let mut segments = segments.into_iter();
    let name = segments.next().unwrap_or_default().trim().to_string();
    if name.is_empty() {
        warn!("template without a name, skipping");
        return;
    }

    let mut params = HashMap::new();
    let mut values: Vec<&str> = Vec::new();
    let mut positional = 0usize;
    for segment in segments {
        let pieces = split_top_level(segment, b'=', 2);
        if pieces.len() == 2 {
            params.insert(pieces[0].trim().to_string(), pieces[1].trim().to_string());
            values.push(pieces[1]);
        } else {
            positional += 1;
            params.insert(positional.to_string(), segment.trim().to_string());
            values.push(segment);
        }
    }
    out.push(Template { name, params });

    // Chembox-style infoboxes nest their sections inside parameter values
    for value in values {
        collect_templates(value, out);
    }
}

/// Splits on `sep` at brace/bracket nesting depth zero. `max_pieces` of zero
/// means unlimited; otherwise splitting stops once that many pieces exist.
fn split_top_level(text: &str, sep: u8, max_pieces: usize) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        let pair = if i + 1 < bytes.len() {
            Some((bytes[i], bytes[i + 1]))
        } else {
            None
        };
        match pair {
            Some((b'{', b'{')) | Some((b'[', b'[')) => {
                depth += 1;
                i += 2;
            }
            Some((b'}', b'}')) | Some((b']', b']')) => {
                depth = depth.saturating_sub(1);
                i += 2;
            }
            _ if depth == 0
                && bytes[i] == sep
                && (max_pieces == 0 || pieces.len() + 1 < max_pieces) =>
            {
                pieces.push(&text[start..i]);
                start = i + 1;
                i += 1;
            }
            _ => i += 1,
        }
    }
    pieces.push(&text[start..]);
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(markup: &str) -> Vec<Template> {
        WikitextParser.parse(markup)
    }

    #[test]
    fn test_parses_named_parameters() {
        let templates = parse("{{Infobox Chemikalie\n| CAS = 7732-18-5\n| Dichte = 0,997 g/cm³\n}}");
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].name, "Infobox Chemikalie");
        assert_eq!(templates[0].params["CAS"], "7732-18-5");
        assert_eq!(templates[0].params["Dichte"], "0,997 g/cm³");
    }

    #[test]
    fn test_parses_positional_parameters() {
        let templates = parse("{{val|18.015|u=g/mol}}");
        assert_eq!(templates[0].params["1"], "18.015");
        assert_eq!(templates[0].params["u"], "g/mol");
    }

    #[test]
    fn test_nested_templates_listed_after_parent() {
        let markup = "{{Chembox\n| Section1 = {{Chembox Identifiers\n| CASNo = 7732-18-5\n}}\n}}";
        let templates = parse(markup);
        assert_eq!(templates.len(), 2);
        assert_eq!(templates[0].name, "Chembox");
        assert_eq!(templates[1].name, "Chembox Identifiers");
        assert_eq!(templates[1].params["CASNo"], "7732-18-5");
    }

    #[test]
    fn test_pipe_inside_link_does_not_split() {
        let templates = parse("{{Infobox\n| field = [[Water|water]] and more\n}}");
        assert_eq!(templates[0].params["field"], "[[Water|water]] and more");
    }

    #[test]
    fn test_equals_inside_nested_braces_does_not_split() {
        let templates = parse("{{Outer|{{inner|a=b}}}}");
        assert_eq!(templates[0].params["1"], "{{inner|a=b}}");
        assert_eq!(templates[1].params["a"], "b");
    }

    #[test]
    fn test_unterminated_template_is_skipped() {
        let templates = parse("{{Broken| x = 1\n\n{{Fine|y=2}}");
        // The broken opener swallows nothing beyond itself
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].name, "Fine");
        assert_eq!(templates[0].params["y"], "2");
    }

    #[test]
    fn test_templates_in_document_order() {
        let names: Vec<String> = parse("text {{A|1}} more {{B}} end")
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["A".to_string(), "B".to_string()]);
    }
}
