// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Persisted statistics snapshot and change detection.
//!
//! A snapshot is a JSON object mapping display language names to fractions.
//! The freshly computed snapshot is written next to the rendered charts and,
//! once published, becomes the baseline the next run compares against.

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{BufWriter, ErrorKind, Write},
    path::Path,
};

use serde::{Serialize, Serializer, ser::SerializeMap};
use tracing::{debug, info, warn};

use crate::{
    aggregate::{LanguageDistribution, LanguageShare},
    error::{self, Error},
};

/// Previously published snapshot, as far as it could be read.
#[derive(Debug, Clone, PartialEq,)]
pub enum PreviousSnapshot
{
    /// The snapshot was read and decoded.
    Loaded(BTreeMap<String, f64,>,),
    /// No snapshot exists at the expected location.
    NotFound,
    /// A file exists but could not be read or decoded.
    Corrupt
    {
        /// Reason the snapshot was rejected.
        reason: String,
    },
}

/// Serializes shares as an ordered JSON object.
struct OrderedShares<'a,>(&'a [LanguageShare],);

impl Serialize for OrderedShares<'_,>
{
    fn serialize<S,>(&self, serializer: S,) -> Result<S::Ok, S::Error,>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len(),),)?;
        for share in self.0 {
            map.serialize_entry(&share.name, &share.fraction,)?;
        }
        map.end()
    }
}

/// Writes the distribution's fractions to `path`, least used language first.
///
/// Parent directories are created as needed.
///
/// # Errors
///
/// Returns [`Error::Io`] when the file cannot be written and
/// [`Error::Serialize`] when encoding fails.
pub fn write_snapshot(path: &Path, distribution: &LanguageDistribution,) -> Result<(), Error,>
{
    if let Some(parent,) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent,).map_err(|source| error::io_error(parent, source,),)?;
    }

    let file = File::create(path,).map_err(|source| error::io_error(path, source,),)?;
    let mut writer = BufWriter::new(file,);
    serde_json::to_writer(&mut writer, &OrderedShares(&distribution.percentage,),)?;
    writer.flush().map_err(|source| error::io_error(path, source,),)?;

    info!("Statistics snapshot saved to {}", path.display());
    Ok((),)
}

/// Reads the snapshot stored at `path`.
///
/// Missing files and undecodable contents are reported as variants rather
/// than errors; both mean the statistics must be treated as changed.
pub fn load_snapshot(path: &Path,) -> PreviousSnapshot
{
    let contents = match fs::read_to_string(path,) {
        Ok(contents,) => contents,
        Err(error,) if error.kind() == ErrorKind::NotFound => {
            debug!("No previous snapshot at {}", path.display());
            return PreviousSnapshot::NotFound;
        }
        Err(error,) => {
            return PreviousSnapshot::Corrupt {
                reason: format!("failed to read {}: {error}", path.display()),
            };
        }
    };

    match serde_json::from_str(&contents,) {
        Ok(map,) => PreviousSnapshot::Loaded(map,),
        Err(error,) => PreviousSnapshot::Corrupt {
            reason: format!("failed to decode {}: {error}", path.display()),
        },
    }
}

/// Decides whether `current` differs from the published snapshot.
///
/// Absent or corrupt baselines always count as a change.
pub fn has_changed(previous: &PreviousSnapshot, current: &LanguageDistribution,) -> bool
{
    match previous {
        PreviousSnapshot::Loaded(map,) => {
            let changed = snapshots_differ(map, &current.percentage_map(),);
            debug!("Snapshot comparison: changed = {}", changed);
            changed
        }
        PreviousSnapshot::NotFound => {
            info!("No published statistics found, treating as changed");
            true
        }
        PreviousSnapshot::Corrupt {
            reason,
        } => {
            warn!("Published statistics unusable ({}), treating as changed", reason);
            true
        }
    }
}

/// Symmetric comparison of two snapshots.
///
/// Key order is irrelevant; fractions are compared at four-decimal resolution.
pub fn snapshots_differ(left: &BTreeMap<String, f64,>, right: &BTreeMap<String, f64,>,) -> bool
{
    if left.len() != right.len() {
        return true;
    }

    left.iter().any(|(name, fraction,)| match right.get(name,) {
        Some(other,) => basis_points(*fraction,) != basis_points(*other,),
        None => true,
    },)
}

fn basis_points(fraction: f64,) -> i64
{
    (fraction * 10_000.0).round() as i64
}

#[cfg(test)]
mod tests
{
    use proptest::prelude::*;
    use tempfile::tempdir;

    use super::*;
    use crate::{aggregate::aggregate, aggregate::LanguageRules, github::LanguageBytes};

    fn distribution(pairs: &[(&str, u64,)],) -> LanguageDistribution
    {
        let bytes: LanguageBytes = pairs.iter().map(|(name, count,)| (*name, *count,),).collect();
        aggregate(&LanguageRules::default(), [&bytes],)
    }

    fn map(pairs: &[(&str, f64,)],) -> BTreeMap<String, f64,>
    {
        pairs.iter().map(|(name, value,)| ((*name).to_owned(), *value,),).collect()
    }

    #[test]
    fn write_snapshot_keeps_ascending_order()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let path = temp.path().join("nested/languages.json",);

        write_snapshot(&path, &distribution(&[("Rust", 750,), ("Shell", 250,),],),)
            .expect("write succeeds",);

        let contents = fs::read_to_string(&path,).expect("snapshot readable",);
        assert_eq!(contents, r#"{"Shell":0.25,"Rust":0.75}"#);
    }

    #[test]
    fn written_snapshot_loads_back_unchanged()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let path = temp.path().join("languages.json",);
        let current = distribution(&[("Rust", 2,), ("C", 1,),],);

        write_snapshot(&path, &current,).expect("write succeeds",);
        let previous = load_snapshot(&path,);

        assert!(matches!(previous, PreviousSnapshot::Loaded(_)));
        assert!(!has_changed(&previous, &current));
    }

    #[test]
    fn missing_snapshot_counts_as_changed()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let previous = load_snapshot(&temp.path().join("absent.json",),);

        assert_eq!(previous, PreviousSnapshot::NotFound);
        assert!(has_changed(&previous, &distribution(&[],)));
    }

    #[test]
    fn malformed_snapshot_counts_as_changed()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let path = temp.path().join("languages.json",);
        fs::write(&path, "{\"Rust\": ",).expect("write fixture",);

        let previous = load_snapshot(&path,);
        assert!(matches!(previous, PreviousSnapshot::Corrupt { .. }));
        assert!(has_changed(&previous, &distribution(&[("Rust", 1,)],)));
    }

    #[test]
    fn reordering_is_not_a_change()
    {
        let previous = PreviousSnapshot::Loaded(map(&[("Rust", 0.75,), ("Shell", 0.25,),],),);
        assert!(!has_changed(&previous, &distribution(&[("Shell", 1,), ("Rust", 3,),],)));
    }

    #[test]
    fn value_or_key_differences_are_changes()
    {
        let base = map(&[("Rust", 0.75,), ("Shell", 0.25,),],);
        assert!(snapshots_differ(&base, &map(&[("Rust", 0.7,), ("Shell", 0.3,),],)));
        assert!(snapshots_differ(&base, &map(&[("Rust", 0.75,), ("Lua", 0.25,),],)));
        assert!(snapshots_differ(&base, &map(&[("Rust", 1.0,)],)));
        assert!(!snapshots_differ(&base, &base));
    }

    fn snapshots() -> impl Strategy<Value = BTreeMap<String, f64,>,>
    {
        prop::collection::btree_map("[A-D]", (0u32..=10_000).prop_map(|bp| bp as f64 / 10_000.0,), 0..4,)
    }

    proptest! {
        #[test]
        fn comparison_is_reflexive(snapshot in snapshots()) {
            prop_assert!(!snapshots_differ(&snapshot, &snapshot));
        }

        #[test]
        fn comparison_is_symmetric(left in snapshots(), right in snapshots()) {
            prop_assert_eq!(snapshots_differ(&left, &right), snapshots_differ(&right, &left));
        }
    }
}
