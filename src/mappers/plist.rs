//! Minimal XML property list rendering for string dictionaries.

use std::collections::BTreeMap;

const HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
"#;

const FOOTER: &str = "</dict>\n</plist>\n";

/// Renders `entries` as a plist `<dict>` of strings, keys sorted.
pub fn render(entries: &BTreeMap<String, String>) -> String {
    let mut out = String::from(HEADER);
    for (key, value) in entries {
        out.push_str(&format!(
            "\t<key>{}</key>\n\t<string>{}</string>\n",
            escape(key),
            escape(value)
        ));
    }
    out.push_str(FOOTER);
    out
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
