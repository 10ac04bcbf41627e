//! Archive discovery: recursive `.taz` listing grouped by year.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

pub(crate) const ARCHIVE_EXTENSION: &str = "taz";
pub(crate) const UNKNOWN_YEAR: &str = "unknown";

/// Year and publication number encoded in an `AN_YYYYNNN` file stem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PublicationKey {
    pub year: i32,
    pub number: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ArchiveFile {
    pub path: PathBuf,
    /// Grouping key: a four-digit year or [`UNKNOWN_YEAR`].
    pub year: String,
    pub publication: Option<PublicationKey>,
}

/// Parses `AN_2022004` (with or without extension) into year 2022, number 4.
pub(crate) fn parse_publication(file_name: &str) -> Option<PublicationKey> {
    let stem = file_name.split('.').next().unwrap_or(file_name);
    let digits = stem.strip_prefix("AN_")?;
    if digits.len() < 5 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let (year, number) = digits.split_at(4);
    Some(PublicationKey {
        year: year.parse().ok()?,
        number: number.parse().ok()?,
    })
}

fn is_year(component: &str) -> bool {
    component.len() == 4 && component.bytes().all(|b| b.is_ascii_digit())
}

/// Nearest four-digit directory below `root`, else the `AN_YYYY` prefix of
/// the file name, else [`UNKNOWN_YEAR`].
pub(crate) fn year_of(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let from_directory = relative
        .parent()
        .into_iter()
        .flat_map(Path::components)
        .filter_map(|c| c.as_os_str().to_str())
        .filter(|c| is_year(c))
        .last();
    if let Some(year) = from_directory {
        return year.to_string();
    }

    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_prefix("AN_"))
        .and_then(|rest| rest.get(..4))
        .filter(|y| is_year(y))
        .map_or_else(|| UNKNOWN_YEAR.to_string(), str::to_string)
}

/// Lists every `.taz` file under `root`, sorted by path and grouped by year.
/// A non-empty `years` keeps only those groups.
///
/// # Errors
///
/// Fails when `root` is not a directory. Unreadable entries below it are
/// logged and skipped.
pub(crate) fn discover(
    root: &Path,
    years: &[i32],
) -> anyhow::Result<BTreeMap<String, Vec<ArchiveFile>>> {
    if !root.is_dir() {
        anyhow::bail!("'{}' is not a directory", root.display());
    }
    let wanted: Vec<String> = years.iter().map(ToString::to_string).collect();

    let mut groups: BTreeMap<String, Vec<ArchiveFile>> = BTreeMap::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();
        let is_archive = entry.file_type().is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(ARCHIVE_EXTENSION));
        if !is_archive {
            continue;
        }

        let year = year_of(root, path);
        if !wanted.is_empty() && !wanted.contains(&year) {
            continue;
        }
        let publication = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(parse_publication);
        groups.entry(year.clone()).or_default().push(ArchiveFile {
            path: path.to_path_buf(),
            year,
            publication,
        });
    }

    for files in groups.values_mut() {
        files.sort_by(|a, b| a.path.cmp(&b.path));
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"").unwrap();
    }

    #[test]
    fn publication_key_comes_from_the_file_stem() {
        assert_eq!(
            parse_publication("AN_2022004.taz"),
            Some(PublicationKey {
                year: 2022,
                number: 4
            })
        );
        assert_eq!(
            parse_publication("AN_20131234.taz"),
            Some(PublicationKey {
                year: 2013,
                number: 1234
            })
        );
        assert_eq!(parse_publication("AN_2022.taz"), None);
        assert_eq!(parse_publication("CRI_2022004.taz"), None);
        assert_eq!(parse_publication("AN_20x2004.taz"), None);
    }

    #[test]
    fn year_prefers_directory_then_file_name() {
        let root = Path::new("/data/raw");
        assert_eq!(year_of(root, Path::new("/data/raw/2021/AN_2022004.taz")), "2021");
        assert_eq!(year_of(root, Path::new("/data/raw/misc/AN_2019010.taz")), "2019");
        assert_eq!(year_of(root, Path::new("/data/raw/misc/export.taz")), UNKNOWN_YEAR);
    }

    #[test]
    fn year_ignores_components_above_the_root() {
        let root = Path::new("/archive/1999");
        assert_eq!(year_of(root, Path::new("/archive/1999/extra.taz")), UNKNOWN_YEAR);
    }

    #[test]
    fn discovers_sorted_archives_grouped_by_year() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("2022/AN_2022002.taz"));
        touch(&root.join("2022/AN_2022001.taz"));
        touch(&root.join("2021/sub/AN_2021100.TAZ"));
        touch(&root.join("loose/notes.txt"));
        touch(&root.join("loose/other.taz"));

        let groups = discover(root, &[]).unwrap();
        let keys: Vec<&str> = groups.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["2021", "2022", UNKNOWN_YEAR]);

        let names: Vec<String> = groups["2022"]
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["AN_2022001.taz", "AN_2022002.taz"]);
        assert_eq!(
            groups["2021"][0].publication,
            Some(PublicationKey {
                year: 2021,
                number: 100
            })
        );
        assert_eq!(groups[UNKNOWN_YEAR][0].publication, None);
    }

    #[test]
    fn year_filter_drops_other_groups() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("2021/AN_2021001.taz"));
        touch(&dir.path().join("2022/AN_2022001.taz"));
        touch(&dir.path().join("stray.taz"));

        let groups = discover(dir.path(), &[2022]).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups["2022"].len(), 1);
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(&dir.path().join("absent"), &[]).is_err());
    }
}
