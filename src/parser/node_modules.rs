//! `node_modules/<name>/` path scanner.

use std::collections::HashSet;

/// Marker preceding a module name in a path.
pub const NODE_MODULES_MARKER: &str = "node_modules/";

/// Extract the distinct module names referenced as `node_modules/<name>/` in `body`.
///
/// Names are returned in the order they are first seen. The body is scanned line by
/// line; on each line every marker is considered, and a marker's name runs up to the
/// next `/` on that line. After a match the scan resumes right behind the marker, so
/// in `node_modules/node_modules/inner/x` both `node_modules` and `inner` are
/// reported. A marker with no later `/` on its line ends the scan of that line.
///
/// Scoped packages only yield their scope (`node_modules/@acme/ui/` gives `@acme`).
pub fn extract_module_names(body: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for line in body.split('\n') {
        let mut rest = line;

        while let Some(idx) = rest.find(NODE_MODULES_MARKER) {
            rest = &rest[idx + NODE_MODULES_MARKER.len()..];

            let Some(slash) = rest.find('/') else {
                break;
            };

            // `node_modules//` would otherwise produce an empty name
            let name = &rest[..slash];
            if !name.is_empty() && seen.insert(name) {
                names.push(name.to_string());
            }
        }
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body() {
        assert!(extract_module_names("").is_empty());
        assert!(extract_module_names("\n\n").is_empty());
    }

    #[test]
    fn test_dedup_across_lines() {
        let names = extract_module_names("node_modules/foo/x\nnode_modules/foo/y\n");
        assert_eq!(names, vec!["foo"]);
    }

    #[test]
    fn test_first_seen_order() {
        let names = extract_module_names("a node_modules/left/1 b node_modules/right/2");
        assert_eq!(names, vec!["left", "right"]);

        let names = extract_module_names("node_modules/zeta/a\nnode_modules/alpha/b\nnode_modules/zeta/c");
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_marker_without_trailing_slash_is_discarded() {
        assert!(extract_module_names("prefix node_modules/onlyname").is_empty());
        assert!(extract_module_names("ends with node_modules/").is_empty());
        // A later line is still scanned
        let names = extract_module_names("node_modules/onlyname\nnode_modules/next/file.js");
        assert_eq!(names, vec!["next"]);
    }

    #[test]
    fn test_slash_must_be_on_the_same_line() {
        assert!(extract_module_names("node_modules/split\n/rest").is_empty());
    }

    #[test]
    fn test_empty_candidate_rejected() {
        assert!(extract_module_names("node_modules//x").is_empty());
        let names = extract_module_names("node_modules//node_modules/real/x");
        assert_eq!(names, vec!["real"]);
    }

    #[test]
    fn test_nested_markers_quirk() {
        // The first marker's name runs up to the next slash, which is the inner
        // marker's own slash.
        let names = extract_module_names("node_modules/node_modules/inner/x");
        assert_eq!(names[0], "node_modules");
        assert_eq!(names, vec!["node_modules", "inner"]);
    }

    #[test]
    fn test_scoped_package_yields_scope() {
        let names = extract_module_names("webpack:///./node_modules/@acme/design-system/index.js");
        assert_eq!(names, vec!["@acme"]);
    }

    #[test]
    fn test_source_map_sources() {
        let map = r#"{"version":3,"sources":["webpack:///./node_modules/react/index.js","webpack:///./node_modules/acme-billing-client/lib/api.js","webpack:///./src/app.js"],"mappings":""}"#;
        let names = extract_module_names(map);
        assert_eq!(names, vec!["react", "acme-billing-client"]);
    }

    #[test]
    fn test_windows_line_endings() {
        let names = extract_module_names("node_modules/lodash/get.js\r\nnode_modules/left-pad/index.js\r\n");
        assert_eq!(names, vec!["lodash", "left-pad"]);
    }

    #[test]
    fn test_deterministic() {
        let body = "x node_modules/b/1 node_modules/a/2\nnode_modules/c/3";
        assert_eq!(extract_module_names(body), extract_module_names(body));
    }
}
