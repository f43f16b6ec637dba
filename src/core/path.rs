//! Interpretation of evaluated path templates.

use crate::{err, error::DocpathError};

/// Segments that refer to the owner's home folder when at the root of a path.
const HOME_MARKERS: [&str; 2] = ["home", ".home"];

/// An evaluated path split into the folders to materialize and an optional new document title.
///
/// Paths are always relative to the owner's home folder, regardless of whether they start
/// with a separator. A path ending with a separator names a folder only, otherwise its last
/// segment is the new title of the moved document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPath {
    /// Folder titles, from the top-most one below home to the target parent.
    pub folders: Vec<String>,

    /// The new document title, if the path does not end with a separator.
    pub title: Option<String>,
}

impl TargetPath {
    /// Parse an evaluated path.
    ///
    /// * `path`: Rendered path template.
    pub fn parse(path: &str) -> Result<Self, DocpathError> {
        let path = path.trim();
        let folder_only = path.ends_with('/');

        let mut segments = Vec::new();
        for segment in path.split('/') {
            match segment {
                "" | "." => continue,
                ".." => return err!(InvalidPath, "'..' is not allowed in '{path}'"),
                segment => segments.push(segment.to_string()),
            }
        }

        if segments
            .first()
            .is_some_and(|s| HOME_MARKERS.contains(&s.as_str()))
        {
            segments.remove(0);

            // `home` and `/home` name the home folder itself.
            if segments.is_empty() {
                return Ok(Self {
                    folders: segments,
                    title: None,
                });
            }
        }

        let title = if folder_only { None } else { segments.pop() };

        Ok(Self {
            folders: segments,
            title,
        })
    }

    /// `true` if the path resolves to the home folder itself.
    pub fn is_home(&self) -> bool {
        self.folders.is_empty()
    }

    /// Cache keys for every folder along the path, i.e. every prefix of `folders`
    /// joined with separators.
    pub fn prefixes(&self) -> impl Iterator<Item = String> + '_ {
        (1..=self.folders.len()).map(|n| self.folders[..n].join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocpathErr;

    fn folders(path: &TargetPath) -> Vec<&str> {
        path.folders.iter().map(String::as_str).collect()
    }

    #[test]
    fn trailing_separator_names_folder() {
        let path = TargetPath::parse("  /home/My Documents/Receipts/  ").unwrap();

        assert_eq!(vec!["My Documents", "Receipts"], folders(&path));
        assert!(path.title.is_none());
    }

    #[test]
    fn last_segment_is_title() {
        let path = TargetPath::parse("/home/My Documents/coco").unwrap();

        assert_eq!(vec!["My Documents"], folders(&path));
        assert_eq!(Some("coco"), path.title.as_deref());
    }

    #[test]
    fn relative_and_absolute_are_equal() {
        assert_eq!(
            TargetPath::parse("My Documents/Receipts/").unwrap(),
            TargetPath::parse("/home/My Documents/Receipts/").unwrap()
        );
        assert_eq!(
            TargetPath::parse("/My Documents/coco").unwrap(),
            TargetPath::parse(".home/My Documents/coco").unwrap()
        );
    }

    #[test]
    fn home_marker_only_skipped_at_root() {
        let path = TargetPath::parse("/home/Projects/home/").unwrap();
        assert_eq!(vec!["Projects", "home"], folders(&path));
    }

    #[test]
    fn home_edge_cases() {
        for input in ["", "   ", ".", "/", "home", "/home", "/home/", ".home", "//./"] {
            let path = TargetPath::parse(input).unwrap();
            assert!(path.is_home(), "{input:?}");
            assert!(path.title.is_none(), "{input:?}");
        }
    }

    #[test]
    fn title_directly_in_home() {
        let path = TargetPath::parse("/home/coco.pdf").unwrap();
        assert!(path.is_home());
        assert_eq!(Some("coco.pdf"), path.title.as_deref());
    }

    #[test]
    fn empty_and_dot_segments_collapse() {
        let path = TargetPath::parse("/home//Receipts/./2024/").unwrap();
        assert_eq!(vec!["Receipts", "2024"], folders(&path));
    }

    #[test]
    fn parent_segments_rejected() {
        let err = TargetPath::parse("/home/../other/").unwrap_err();
        assert!(matches!(err.error, DocpathErr::InvalidPath(_)));
    }

    #[test]
    fn prefixes_walk_root_to_leaf() {
        let path = TargetPath::parse("/a/b/c/").unwrap();
        let prefixes: Vec<_> = path.prefixes().collect();
        assert_eq!(vec!["a", "a/b", "a/b/c"], prefixes);
    }
}
