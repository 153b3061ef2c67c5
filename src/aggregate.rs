//! Folding of per-repository language byte counts into one distribution.
//!
//! Raw API names are first mapped through the rename table; a pair is skipped
//! when either the raw or the display name is excluded. Fractions are rounded
//! to four decimal places (ties to even) and ordered from the least to the
//! most used language, which is the order charts draw their bars in.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::github::LanguageBytes;

/// Decimal places kept in every fraction.
const FRACTION_SCALE: f64 = 10_000.0;

/// Exclusion list and rename table applied while aggregating.
#[derive(Debug, Clone, Default, PartialEq, Eq,)]
pub struct LanguageRules
{
    excluded: HashSet<String,>,
    rename:   HashMap<String, String,>,
}

impl LanguageRules
{
    /// Creates rules from excluded names and `(raw, display)` pairs.
    pub fn new<E, R,>(excluded: E, rename: R,) -> Self
    where
        E: IntoIterator<Item = String,>,
        R: IntoIterator<Item = (String, String,),>,
    {
        Self {
            excluded: excluded.into_iter().collect(), rename: rename.into_iter().collect(),
        }
    }

    /// Display name for a raw API language name.
    pub fn display_name<'a,>(&'a self, raw: &'a str,) -> &'a str
    {
        self.rename.get(raw,).map_or(raw, String::as_str,)
    }

    /// Whether `raw` (or the name it is renamed to) is excluded.
    pub fn is_excluded(&self, raw: &str,) -> bool
    {
        self.excluded.contains(raw,) || self.excluded.contains(self.display_name(raw,),)
    }
}

/// Byte total of one display language.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct LanguageTotal
{
    /// Display name.
    pub name:  String,
    /// Summed bytes across repositories.
    pub bytes: u64,
}

/// Share of one display language.
#[derive(Debug, Clone, PartialEq,)]
pub struct LanguageShare
{
    /// Display name.
    pub name:     String,
    /// Fraction of all counted bytes, rounded to four decimals.
    pub fraction: f64,
}

/// Aggregated language usage of one run.
///
/// `by_language` keeps first-encountered order, `percentage` is sorted
/// ascending by fraction with ties in first-encountered order. When no bytes
/// were counted `percentage` is empty.
#[derive(Debug, Clone, PartialEq, Default,)]
pub struct LanguageDistribution
{
    /// Sum of every counted byte.
    pub total_bytes: u64,
    /// Bytes per display language.
    pub by_language: Vec<LanguageTotal,>,
    /// Fraction per display language.
    pub percentage:  Vec<LanguageShare,>,
}

impl LanguageDistribution
{
    /// Bytes counted for `name`.
    pub fn bytes_for(&self, name: &str,) -> Option<u64,>
    {
        self.by_language.iter().find(|total| total.name == name,).map(|total| total.bytes,)
    }

    /// Fraction recorded for `name`.
    pub fn fraction_for(&self, name: &str,) -> Option<f64,>
    {
        self.percentage.iter().find(|share| share.name == name,).map(|share| share.fraction,)
    }

    /// Order-independent view of the fractions.
    pub fn percentage_map(&self,) -> BTreeMap<String, f64,>
    {
        self.percentage.iter().map(|share| (share.name.clone(), share.fraction,),).collect()
    }

    /// Whether nothing was counted.
    pub fn is_empty(&self,) -> bool
    {
        self.total_bytes == 0
    }
}

/// Incremental aggregator, fed one repository at a time.
#[derive(Debug,)]
pub struct LanguageAggregator<'a,>
{
    rules:       &'a LanguageRules,
    totals:      Vec<LanguageTotal,>,
    index:       HashMap<String, usize,>,
    total_bytes: u64,
}

impl<'a,> LanguageAggregator<'a,>
{
    /// Starts an empty aggregation.
    pub fn new(rules: &'a LanguageRules,) -> Self
    {
        Self {
            rules,
            totals: Vec::new(),
            index: HashMap::new(),
            total_bytes: 0,
        }
    }

    /// Adds one repository's language bytes.
    pub fn add(&mut self, languages: &LanguageBytes,)
    {
        for (raw, bytes,) in languages.iter() {
            if self.rules.is_excluded(raw,) {
                continue;
            }

            let display = self.rules.display_name(raw,);
            let existing = self.index.get(display,).copied();
            match existing {
                Some(position,) => {
                    let total = &mut self.totals[position];
                    total.bytes = total.bytes.saturating_add(bytes,);
                }
                None => {
                    self.index.insert(display.to_owned(), self.totals.len(),);
                    self.totals.push(LanguageTotal {
                        name: display.to_owned(),
                        bytes,
                    },);
                }
            }
            self.total_bytes = self.total_bytes.saturating_add(bytes,);
        }
    }

    /// Computes the fractions and returns the distribution.
    pub fn finish(self,) -> LanguageDistribution
    {
        let mut percentage = Vec::with_capacity(self.totals.len(),);
        if self.total_bytes > 0 {
            let total = self.total_bytes as f64;
            percentage.extend(self.totals.iter().map(|entry| LanguageShare {
                name:     entry.name.clone(),
                fraction: round_fraction(entry.bytes as f64 / total,),
            },),);
            percentage.sort_by(|left, right| left.fraction.total_cmp(&right.fraction,),);
        }

        LanguageDistribution {
            total_bytes: self.total_bytes,
            by_language: self.totals,
            percentage,
        }
    }
}

/// Aggregates every repository's language bytes in one pass.
///
/// # Example
///
/// ```
/// use langstat::{LanguageBytes, LanguageRules, aggregate};
///
/// let rules = LanguageRules::new(["CSS".to_owned()], std::iter::empty(),);
/// let repository: LanguageBytes = [("Python", 800), ("CSS", 200)].into_iter().collect();
/// let distribution = aggregate(&rules, [&repository],);
/// assert_eq!(distribution.fraction_for("Python"), Some(1.0));
/// assert_eq!(distribution.fraction_for("CSS"), None);
/// ```
pub fn aggregate<'r, I,>(rules: &LanguageRules, repositories: I,) -> LanguageDistribution
where
    I: IntoIterator<Item = &'r LanguageBytes,>,
{
    let mut aggregator = LanguageAggregator::new(rules,);
    for languages in repositories {
        aggregator.add(languages,);
    }
    aggregator.finish()
}

/// Rounds to four decimal places, ties to even.
pub fn round_fraction(value: f64,) -> f64
{
    (value * FRACTION_SCALE).round_ties_even() / FRACTION_SCALE
}
