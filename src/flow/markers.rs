//! Placeholder markers embedded in free text: `@{name}` refers to a variable,
//! `%{name}` to a storage item. Callables are never referenced from text.

use super::value::Namespace;

const END: char = '}';

/// Characters allowed in variable and storage names.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':' | '.'))
}

pub fn prefix(namespace: Namespace) -> Option<&'static str> {
    match namespace {
        Namespace::Variables => Some("@{"),
        Namespace::Storage => Some("%{"),
        Namespace::Callables => None,
    }
}

/// Wraps `name` in the marker syntax of `namespace`.
pub fn pad(namespace: Namespace, name: &str) -> Option<String> {
    prefix(namespace).map(|p| format!("{p}{name}{END}"))
}

/// Every name marked in `text`, in order of appearance. Duplicates are kept.
pub fn extract(namespace: Namespace, text: &str) -> Vec<&str> {
    let Some(start) = prefix(namespace) else {
        return Vec::new();
    };
    let mut names = Vec::new();
    let mut rest = text;
    while let Some(pos) = rest.find(start) {
        let after = &rest[pos + start.len()..];
        let Some(end) = after.find(END) else { break };
        let name = &after[..end];
        if is_valid_name(name) {
            names.push(name);
            rest = &after[end + 1..];
        } else {
            rest = after;
        }
    }
    names
}

/// Replaces the exact marker form of `old` by that of `new`. Returns `None`
/// when `text` holds no such marker, so unrelated text is never touched.
pub fn replace(namespace: Namespace, text: &str, old: &str, new: &str) -> Option<String> {
    let from = pad(namespace, old)?;
    if !text.contains(&from) {
        return None;
    }
    let to = pad(namespace, new)?;
    Some(text.replace(&from, &to))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_variables_in_order() {
        let text = "@{flow_dir}/out/@{name}.csv @{flow_dir}";
        assert_eq!(
            extract(Namespace::Variables, text),
            vec!["flow_dir", "name", "flow_dir"]
        );
        assert!(extract(Namespace::Storage, text).is_empty());
    }

    #[test]
    fn invalid_candidate_does_not_hide_the_next_marker() {
        assert_eq!(extract(Namespace::Variables, "@{a@{b}"), vec!["b"]);
        assert_eq!(extract(Namespace::Variables, "@{bad name} @{ok}"), vec!["ok"]);
        assert!(extract(Namespace::Variables, "@{}").is_empty());
    }

    #[test]
    fn storage_markers_are_separate() {
        let text = "%{cache} and @{var}";
        assert_eq!(extract(Namespace::Storage, text), vec!["cache"]);
        assert_eq!(extract(Namespace::Variables, text), vec!["var"]);
    }

    #[test]
    fn unterminated_and_invalid_markers_are_ignored() {
        assert!(extract(Namespace::Variables, "@{open").is_empty());
        assert!(extract(Namespace::Variables, "@{has space}").is_empty());
        assert!(extract(Namespace::Variables, "@{}").is_empty());
    }

    #[test]
    fn callables_have_no_marker() {
        assert_eq!(prefix(Namespace::Callables), None);
        assert!(extract(Namespace::Callables, "@{a} %{b}").is_empty());
        assert_eq!(replace(Namespace::Callables, "a", "a", "b"), None);
    }

    #[test]
    fn replace_only_touches_marker_form() {
        let text = "count @{count} in count_total";
        assert_eq!(
            replace(Namespace::Variables, text, "count", "n").as_deref(),
            Some("count @{n} in count_total")
        );
        assert_eq!(replace(Namespace::Variables, "@{counter}", "count", "n"), None);
        assert_eq!(replace(Namespace::Variables, "no markers", "count", "n"), None);
    }

    #[test]
    fn valid_names() {
        assert!(is_valid_name("flow_dir"));
        assert!(is_valid_name("a-b:c.d"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("a b"));
        assert!(!is_valid_name("a}"));
    }
}
