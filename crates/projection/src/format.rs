//! Default export-line formatter and content builder

use autoexport_core::Node;
use regex::Regex;
use std::sync::OnceLock;

fn script_regex() -> &'static Regex {
    static SCRIPT: OnceLock<Regex> = OnceLock::new();
    SCRIPT.get_or_init(|| Regex::new(r"\.(m?j|t)sx?$").expect("script pattern is valid"))
}

/// Whether `path` names a JavaScript or TypeScript module
pub fn is_script(path: &str) -> bool {
    script_regex().is_match(path)
}

/// One `export ... from "./...";` line for `node`
///
/// Script modules are imported without their extension and re-exported
/// wholesale, as are directories. A name ending in `.ns` becomes a namespace
/// export (`* as Name`). Any other file is assumed to have a default export.
pub fn default_formatter(node: &Node) -> String {
    let context = node.context();
    let script = is_script(&context.fullpath.to_string_lossy());

    let import_name = if script {
        &context.filename
    } else {
        &context.basename
    };

    let export_name = if script || node.is_dir() {
        match context.filename.strip_suffix(".ns") {
            Some(namespace) => format!("* as {}", pascal_case(namespace)),
            None => "*".to_string(),
        }
    } else {
        format!("{{ default as {} }}", pascal_case(&context.filename))
    };

    format!("export {export_name} from \"./{import_name}\";")
}

/// Join formatted lines; `None` when there is nothing to export
pub fn build_lines(view: &[Node], formatter: impl Fn(&Node) -> String) -> Option<String> {
    if view.is_empty() {
        return None;
    }
    let lines: Vec<String> = view.iter().map(formatter).collect();
    Some(lines.join("\n"))
}

/// `PascalCase` identifier from a file name
///
/// Words break at any non-alphanumeric character, at a lowercase-to-uppercase
/// step (`fooBar`) and before the last capital of an acronym (`XMLHttp`).
/// Each word is capitalized and the rest of it lowercased.
pub fn pascal_case(input: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = input.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if let Some(prev) = current.chars().last() {
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let lower_to_upper = prev.is_lowercase() && c.is_uppercase();
            let acronym_end = prev.is_uppercase() && c.is_uppercase() && next_is_lower;
            if lower_to_upper || acronym_end {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoexport_core::{insert, FileContext, NodeType};
    use std::fs;
    use tempfile::TempDir;

    fn root(dir: &TempDir) -> Node {
        Node::directory("root", FileContext::parse(dir.path(), NodeType::Directory), None)
    }

    #[test]
    fn test_pascal_case() {
        assert_eq!(pascal_case("foo"), "Foo");
        assert_eq!(pascal_case("foo-bar_baz"), "FooBarBaz");
        assert_eq!(pascal_case("fooBar"), "FooBar");
        assert_eq!(pascal_case("XMLHttpRequest"), "XmlHttpRequest");
        assert_eq!(pascal_case("my.icon"), "MyIcon");
        assert_eq!(pascal_case("ALL_CAPS"), "AllCaps");
        assert_eq!(pascal_case("logo2x"), "Logo2x");
        assert_eq!(pascal_case(""), "");
    }

    #[test]
    fn test_script_file_exports_everything() {
        let dir = TempDir::new().unwrap();
        let node = insert(&root(&dir), "button.tsx", None, None).unwrap();
        assert_eq!(default_formatter(&node), r#"export * from "./button";"#);
    }

    #[test]
    fn test_namespace_script() {
        let dir = TempDir::new().unwrap();
        let node = insert(&root(&dir), "x.ns.ts", None, None).unwrap();
        assert_eq!(default_formatter(&node), r#"export * as X from "./x.ns";"#);
    }

    #[test]
    fn test_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("created")).unwrap();
        fs::create_dir(dir.path().join("boo.ns")).unwrap();
        let root = root(&dir);

        let plain = insert(&root, "created", None, None).unwrap();
        let namespace = insert(&root, "boo.ns", None, None).unwrap();
        assert_eq!(default_formatter(&plain), r#"export * from "./created";"#);
        assert_eq!(default_formatter(&namespace), r#"export * as Boo from "./boo.ns";"#);
    }

    #[test]
    fn test_asset_gets_default_export() {
        let dir = TempDir::new().unwrap();
        let node = insert(&root(&dir), "app-logo.svg", None, None).unwrap();
        assert_eq!(
            default_formatter(&node),
            r#"export { default as AppLogo } from "./app-logo.svg";"#
        );
    }

    #[test]
    fn test_build_lines() {
        let dir = TempDir::new().unwrap();
        let root = root(&dir);
        let a = insert(&root, "a.ts", None, None).unwrap();
        let b = insert(&root, "b.ts", None, None).unwrap();

        assert_eq!(build_lines(&[], default_formatter), None);
        assert_eq!(
            build_lines(&[a, b], default_formatter).as_deref(),
            Some("export * from \"./a\";\nexport * from \"./b\";")
        );
    }
}
