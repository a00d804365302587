use crate::Registry;

const DESCRIPTIONS: &[(&str, &[&str], &str)] = &[
    ("css", &["selector"], "find elements with a CSS selector"),
    ("json", &["path"], "find values with a dotted JSON path"),
    ("xpath", &["path"], "find nodes with an XPath location path"),
    ("regex", &["pattern"], "find matches of /pattern/flags"),
    ("trim", &[], "strip surrounding whitespace"),
    ("template", &["text"], "replace the selection with text"),
    ("attr", &["name"], "read an attribute of the first element"),
    ("eq", &["index"], "keep the element at a zero-based index"),
    ("string", &[], "keep the raw markup as a string"),
    ("text", &[], "keep the text content as a string"),
    ("link", &["node"], "replace the selection with another node's text"),
    ("replace", &["old", "new"], "replace every occurrence of old"),
    ("absolute", &["base"], "resolve a URL against base"),
];

/// One line per registered operation: its signature and what it does.
pub fn list_operations(registry: &Registry) -> String {
    let mut out = String::new();
    for (name, arity) in registry.operations() {
        let (params, summary) = match DESCRIPTIONS.iter().find(|(op, ..)| *op == name) {
            Some((_, params, summary)) => (params.join(", "), *summary),
            None => (vec!["arg"; arity].join(", "), ""),
        };
        let signature = format!("{}({})", name, params);
        out.push_str(format!("  {:<24} {}", signature, summary).trim_end());
        out.push('\n');
    }
    out
}
