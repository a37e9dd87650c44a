use std::path::{Component, Path, PathBuf};

use url::Url;

/// Lexically normalizes `.` and `..` components without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

/// Href from the document at `from_file` to `to_file`, `/`-separated,
/// prefixed with `./` when it does not climb.
pub fn relative_href(from_file: &Path, to_file: &Path) -> String {
    let from_dir = from_file.parent().unwrap_or_else(|| Path::new(""));
    let from = normalize(from_dir);
    let to = normalize(to_file);

    let from_parts: Vec<Component<'_>> = from
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let to_parts: Vec<Component<'_>> = to
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    let common = from_parts
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<String> = Vec::new();
    for _ in common..from_parts.len() {
        segments.push("..".to_string());
    }
    for part in &to_parts[common..] {
        segments.push(part.as_os_str().to_string_lossy().into_owned());
    }

    let joined = segments.join("/");
    if joined.starts_with("..") {
        joined
    } else {
        format!("./{}", joined)
    }
}

/// True for hrefs that point outside the local tree (URLs and absolute paths).
pub fn is_external(href: &str) -> bool {
    href.starts_with('/') || Url::parse(href).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_dots() {
        assert_eq!(normalize(Path::new("a/./b/../c")), PathBuf::from("a/c"));
        assert_eq!(normalize(Path::new("../a")), PathBuf::from("../a"));
        assert_eq!(normalize(Path::new("/x/../y")), PathBuf::from("/y"));
        assert_eq!(normalize(Path::new("a/..")), PathBuf::from("."));
    }

    #[test]
    fn relative_href_between_siblings_and_levels() {
        let root = Path::new("/out/catalog.json");
        let container = Path::new("/out/themes/catalog.json");
        let theme = Path::new("/out/themes/ocean/catalog.json");
        let product = Path::new("/out/products/prod-a/collection.json");

        assert_eq!(relative_href(root, container), "./themes/catalog.json");
        assert_eq!(relative_href(container, theme), "./ocean/catalog.json");
        assert_eq!(relative_href(theme, container), "../catalog.json");
        assert_eq!(relative_href(theme, root), "../../catalog.json");
        assert_eq!(
            relative_href(theme, product),
            "../../products/prod-a/collection.json"
        );
        assert_eq!(relative_href(product, product), "./collection.json");
    }

    #[test]
    fn external_hrefs() {
        assert!(is_external("https://example.org/x.json"));
        assert!(is_external("/abs/catalog.json"));
        assert!(!is_external("../catalog.json"));
        assert!(!is_external("./ocean/catalog.json"));
    }
}
