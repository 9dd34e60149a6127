use std::collections::HashMap;

use crate::wikitext::TemplateParser;

/// Merged parameters of every infobox template found in one article.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Infobox {
    params: HashMap<String, String>,
}

impl Infobox {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// First candidate key present in the infobox wins, even when its value
    /// is empty; an empty value is the caller's signal to skip the field.
    pub fn lookup(&self, candidate_keys: &[&str]) -> Option<&str> {
        candidate_keys.iter().find_map(|key| self.get(key))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Collects the parameters of every template whose name contains one of the
/// candidate fragments (underscores normalized to spaces, case-insensitive).
/// Later templates overwrite earlier keys. Returns None when no template
/// matched at all, which is distinct from a matching template with no
/// parameters.
pub fn extract_infobox(
    parser: &dyn TemplateParser,
    markup: &str,
    candidates: &[String],
) -> Option<Infobox> {
    let fragments: Vec<String> = candidates.iter().map(|c| c.to_lowercase()).collect();
    let mut params = HashMap::new();
    let mut found = false;
    for template in parser.parse(markup) {
        let name = template.name.replace('_', " ").trim().to_lowercase();
        if fragments.iter().any(|fragment| name.contains(fragment)) {
            for (key, value) in template.params {
                params.insert(key.trim().to_string(), value.trim().to_string());
            }
            found = true;
        }
    }
    found.then_some(Infobox { params })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wikitext::WikitextParser;

    fn candidates(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_no_matching_template_is_none() {
        let markup = "{{Cite web|url=http://example.org}}\nSome text.";
        let infobox = extract_infobox(&WikitextParser, markup, &candidates(&["Chembox"]));
        assert!(infobox.is_none());
    }

    #[test]
    fn test_matching_template_with_no_params_is_some_and_empty() {
        let infobox = extract_infobox(&WikitextParser, "{{Chembox}}", &candidates(&["Chembox"]));
        assert!(infobox.is_some());
        assert!(infobox.unwrap().is_empty());
    }

    #[test]
    fn test_name_matching_is_case_insensitive_with_underscores() {
        let markup = "{{infobox_chemikalie|CAS=64-17-5}}";
        let infobox =
            extract_infobox(&WikitextParser, markup, &candidates(&["Infobox Chemikalie"]));
        assert_eq!(infobox.unwrap().get("CAS"), Some("64-17-5"));
    }

    #[test]
    fn test_nested_section_templates_are_merged() {
        let markup = "{{Chembox\n| Section1 = {{Chembox Identifiers\n| CASNo = 64-17-5\n}}\n| Section2 = {{Chembox Properties\n| Density = 0.789\n}}\n}}";
        let infobox = extract_infobox(
            &WikitextParser,
            markup,
            &candidates(&["Chembox", "Chembox Identifiers", "Chembox Properties"]),
        );
        let infobox = infobox.unwrap();
        assert_eq!(infobox.get("CASNo"), Some("64-17-5"));
        assert_eq!(infobox.get("Density"), Some("0.789"));
    }

    #[test]
    fn test_later_template_overwrites_earlier_key() {
        let markup = "{{Chembox|CASNo=1-11-1}}\n{{Chembox|CASNo=2-22-2}}";
        let infobox = extract_infobox(&WikitextParser, markup, &candidates(&["Chembox"]));
        assert_eq!(infobox.unwrap().get("CASNo"), Some("2-22-2"));
    }

    #[test]
    fn test_lookup_first_present_key_wins() {
        let markup = "{{Chembox|CASNo1=2-22-2|CASNo=1-11-1}}";
        let infobox = extract_infobox(&WikitextParser, markup, &candidates(&["Chembox"])).unwrap();
        assert_eq!(infobox.lookup(&["CASNo", "CASNo1"]), Some("1-11-1"));
        assert_eq!(infobox.lookup(&["BoilingPt"]), None);
    }
}
