//! Directory listing view model.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entry::Entry;
use crate::error::FsError;

const SIZE_SUFFIXES: [&str; 6] = ["KB", "MB", "GB", "TB", "PB", "EB"];

/// Details about the directory being listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DirInfo {
    pub name: String,
    pub is_root: bool,
    pub entries: Vec<DirEntryInfo>,
}

/// Details for a single directory entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DirEntryInfo {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    #[serde(skip)]
    pub human_size: Option<HumanSize>,
}

/// Column a listing is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    #[default]
    Name,
    Size,
}

impl SortColumn {
    /// Parse the `c` query parameter; unknown values sort by name.
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("s") => SortColumn::Size,
            _ => SortColumn::Name,
        }
    }

    pub fn as_param(self) -> &'static str {
        match self {
            SortColumn::Name => "n",
            SortColumn::Size => "s",
        }
    }
}

/// Sort order requested for a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingSort {
    pub column: SortColumn,
    pub ascending: bool,
}

impl Default for ListingSort {
    fn default() -> Self {
        Self {
            column: SortColumn::Name,
            ascending: true,
        }
    }
}

/// Query parameters accepted by directory listings.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ListingQuery {
    /// Sort column: `n` (name) or `s` (size)
    pub c: Option<String>,
    /// Sort order: `d` for descending, anything else is ascending
    pub o: Option<String>,
}

impl ListingQuery {
    /// Collect the parameters from decoded query pairs.
    ///
    /// Only the first value of a repeated parameter is used.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "c" => &mut query.c,
                "o" => &mut query.o,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }
        query
    }
}

impl From<&ListingQuery> for ListingSort {
    fn from(query: &ListingQuery) -> Self {
        Self {
            column: SortColumn::from_param(query.c.as_deref()),
            ascending: query.o.as_deref() != Some("d"),
        }
    }
}

/// A size scaled down to the largest unit keeping it below 1024.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HumanSize {
    pub value: f64,
    pub suffix: &'static str,
}

impl HumanSize {
    pub fn from_bytes(size: u64) -> Self {
        let mut value = size as f64;
        let mut suffix = "B";
        for next in SIZE_SUFFIXES {
            if value < 1024.0 {
                break;
            }
            value /= 1024.0;
            suffix = next;
        }
        Self { value, suffix }
    }

    /// The value with one decimal digit, without a trailing `.0`.
    pub fn value_string(&self) -> String {
        let formatted = format!("{:.1}", self.value);
        match formatted.strip_suffix(".0") {
            Some(trimmed) => trimmed.to_string(),
            None => formatted,
        }
    }
}

impl fmt::Display for HumanSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value_string(), self.suffix)
    }
}

impl DirInfo {
    /// Build the sorted listing for a directory entry.
    pub fn build(path: &str, dir: &Entry, sort: ListingSort) -> Result<Self, FsError> {
        let mut children = dir.read_dir()?;
        children.sort_by(|a, b| {
            let ordering = compare(a, b, sort.column);
            if sort.ascending {
                ordering
            } else {
                ordering.reverse()
            }
        });

        let entries = children
            .iter()
            .map(|child| {
                let is_dir = child.is_dir();
                let size = child.size();
                DirEntryInfo {
                    name: child.name(),
                    is_dir,
                    size,
                    human_size: (!is_dir).then(|| HumanSize::from_bytes(size)),
                }
            })
            .collect();

        Ok(Self {
            name: path.to_string(),
            is_root: path == "/",
            entries,
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut json = serde_json::to_string(self)?;
        json.push('\n');
        Ok(json)
    }
}

fn compare(a: &Entry, b: &Entry, column: SortColumn) -> Ordering {
    match column {
        SortColumn::Name => a.name().to_lowercase().cmp(&b.name().to_lowercase()),
        SortColumn::Size => a.size().cmp(&b.size()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn listing(temp_dir: &TempDir, sort: ListingSort) -> DirInfo {
        let dir = Entry::new(temp_dir.path(), true).unwrap();
        DirInfo::build("/", &dir, sort).unwrap()
    }

    fn names(info: &DirInfo) -> Vec<&str> {
        info.entries.iter().map(|e| e.name.as_str()).collect()
    }

    // ========================================================================
    // Human Size Tests
    // ========================================================================

    #[test]
    fn test_human_size_bytes() {
        let size = HumanSize::from_bytes(10);
        assert_eq!(size.value, 10.0);
        assert_eq!(size.suffix, "B");
        assert_eq!(size.to_string(), "10B");
    }

    #[test]
    fn test_human_size_units() {
        let cases = [
            (10 * 1024, "KB"),
            (10 * 1024 * 1024, "MB"),
            (10 * 1024 * 1024 * 1024, "GB"),
            (10 * 1024 * 1024 * 1024 * 1024, "TB"),
            (10 * 1024 * 1024 * 1024 * 1024 * 1024, "PB"),
        ];
        for (bytes, suffix) in cases {
            let size = HumanSize::from_bytes(bytes);
            assert_eq!(size.value, 10.0);
            assert_eq!(size.suffix, suffix);
            assert_eq!(size.to_string(), format!("10{suffix}"));
        }
    }

    #[test]
    fn test_human_size_with_decimal() {
        let size = HumanSize::from_bytes((1.5 * 1024f64.powi(5)) as u64);
        assert_eq!(size.value, 1.5);
        assert_eq!(size.to_string(), "1.5PB");
    }

    #[test]
    fn test_human_size_just_below_unit() {
        assert_eq!(HumanSize::from_bytes(1023).to_string(), "1023B");
        assert_eq!(HumanSize::from_bytes(1024).to_string(), "1KB");
    }

    // ========================================================================
    // Sort Parameter Tests
    // ========================================================================

    #[test]
    fn test_sort_from_query() {
        let sort = ListingSort::from(&ListingQuery::default());
        assert_eq!(sort, ListingSort::default());

        let query = ListingQuery {
            c: Some("s".to_string()),
            o: Some("d".to_string()),
        };
        let sort = ListingSort::from(&query);
        assert_eq!(sort.column, SortColumn::Size);
        assert!(!sort.ascending);

        let query = ListingQuery {
            c: Some("x".to_string()),
            o: Some("D".to_string()),
        };
        let sort = ListingSort::from(&query);
        assert_eq!(sort.column, SortColumn::Name);
        assert!(sort.ascending);
    }

    #[test]
    fn test_query_from_pairs_keeps_first_value() {
        let query = ListingQuery::from_pairs([("c", "s"), ("o", "d"), ("o", "d"), ("c", "n")]);
        assert_eq!(
            query,
            ListingQuery {
                c: Some("s".to_string()),
                o: Some("d".to_string()),
            }
        );
    }

    #[test]
    fn test_query_from_pairs_ignores_unknown_keys() {
        let query = ListingQuery::from_pairs([("x", "1"), ("o", "a")]);
        assert_eq!(query.c, None);
        assert_eq!(query.o.as_deref(), Some("a"));
    }

    // ========================================================================
    // Listing Tests
    // ========================================================================

    #[test]
    fn test_listing_sorted_by_name_case_insensitive() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["b", "C", "a"] {
            std::fs::write(temp_dir.path().join(name), "").unwrap();
        }

        let info = listing(&temp_dir, ListingSort::default());
        assert_eq!(names(&info), vec!["a", "b", "C"]);
        assert!(info.is_root);
        assert_eq!(info.name, "/");
    }

    #[test]
    fn test_listing_sorted_by_size_descending() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("small"), "1").unwrap();
        std::fs::write(temp_dir.path().join("large"), "12345").unwrap();
        std::fs::write(temp_dir.path().join("medium"), "123").unwrap();

        let sort = ListingSort {
            column: SortColumn::Size,
            ascending: false,
        };
        let info = listing(&temp_dir, sort);
        assert_eq!(names(&info), vec!["large", "medium", "small"]);
    }

    #[test]
    fn test_listing_size_sort_is_stable() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["b", "a", "c"] {
            std::fs::write(temp_dir.path().join(name), "same").unwrap();
        }
        let dir = Entry::new(temp_dir.path(), true).unwrap();

        // Equal sizes keep the order they were listed in.
        let listed: Vec<String> = dir.read_dir().unwrap().iter().map(Entry::name).collect();
        let sort = ListingSort {
            column: SortColumn::Size,
            ascending: true,
        };
        let info = DirInfo::build("/", &dir, sort).unwrap();
        assert_eq!(names(&info), listed);
    }

    #[test]
    fn test_directories_have_no_human_size() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("foo"), "foofoofoo").unwrap();
        std::fs::create_dir(temp_dir.path().join("baz")).unwrap();

        let info = listing(&temp_dir, ListingSort::default());
        assert!(info.entries[0].is_dir);
        assert!(info.entries[0].human_size.is_none());
        assert_eq!(info.entries[1].human_size.unwrap().to_string(), "9B");
    }

    #[test]
    fn test_subdirectory_is_not_root() {
        let temp_dir = TempDir::new().unwrap();
        let dir = Entry::new(temp_dir.path(), true).unwrap();
        let info = DirInfo::build("/baz", &dir, ListingSort::default()).unwrap();
        assert!(!info.is_root);
    }

    #[test]
    fn test_json_excludes_human_size() {
        let info = DirInfo {
            name: "/".to_string(),
            is_root: true,
            entries: vec![DirEntryInfo {
                name: "foo".to_string(),
                is_dir: false,
                size: 9,
                human_size: Some(HumanSize::from_bytes(9)),
            }],
        };

        let json: serde_json::Value = serde_json::from_str(&info.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "Name": "/",
                "IsRoot": true,
                "Entries": [{"Name": "foo", "IsDir": false, "Size": 9}],
            })
        );
    }
}
