// src/model.rs

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Index of a commit within a totally ordered history
pub type Position = usize;

/// Change attributes recorded for a single commit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitSummary {
    pub lines_added: u64,
    pub lines_removed: u64,
    /// Number of diff hunks
    pub blocks_changed: u64,
    pub files_changed: u64,
}

impl CommitSummary {
    pub fn lines_changed(&self) -> u64 {
        self.lines_added + self.lines_removed
    }
}

/// One entry of a dataset's commit dictionary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub position: Position,
    /// Commit time in seconds since the epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    #[serde(flatten)]
    pub summary: CommitSummary,
    /// Hash of the commit this one reverts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverts: Option<String>,
    /// Hash of the known-bad commit bounding the search for the reverted commit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
}

/// A collected repository history, as written by `collect` and read by `analyse`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_url: Option<String>,
    /// Commit hashes in log order, newest first
    #[serde(default)]
    pub order: Vec<String>,
    #[serde(default)]
    pub dict: BTreeMap<String, CommitRecord>,
    /// Hashes of every commit recognised as a revert
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reverts: Vec<String>,
}

/// A validated search problem: `target` was found between the known-good
/// `start` and the known-bad `base`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CaseFields")]
pub struct RevertCase {
    start: Position,
    base: Position,
    target: Position,
}

/// Unchecked wire form of a [`RevertCase`]
#[derive(Deserialize)]
struct CaseFields {
    start: Position,
    base: Position,
    target: Position,
}

impl TryFrom<CaseFields> for RevertCase {
    type Error = Error;

    fn try_from(fields: CaseFields) -> Result<Self> {
        RevertCase::new(fields.start, fields.base, fields.target)
    }
}

impl RevertCase {
    /// Accepts the triple only when `start < target < base`.
    pub fn new(start: Position, base: Position, target: Position) -> Result<Self> {
        if start < target && target < base {
            Ok(Self { start, base, target })
        } else {
            Err(Error::InvalidCase { start, target, base })
        }
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn base(&self) -> Position {
        self.base
    }

    pub fn target(&self) -> Position {
        self.target
    }

    /// Plain index span of the window
    pub fn commits(&self) -> usize {
        self.base - self.start
    }
}

/// Observable output of one bisection run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaseStats {
    pub steps: usize,
    /// Cumulative weight across `[start, base]`
    pub distance: f64,
    /// Cumulative weight across `[start, target]`
    #[serde(rename = "target")]
    pub target_distance: f64,
    pub commits: usize,
}

/// Revert cases found in a dataset, plus the number skipped and why
#[derive(Debug, Clone, Default)]
pub struct CaseScan {
    pub cases: Vec<RevertCase>,
    pub missing: usize,
    pub inconsistent: usize,
}

impl Dataset {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save_json(path, self)
    }

    /// Attribute table indexed by position. Commits absent from `dict` count as empty.
    pub fn commit_table(&self) -> Vec<CommitSummary> {
        self.order
            .iter()
            .map(|sha| self.dict.get(sha).map(|r| r.summary).unwrap_or_default())
            .collect()
    }

    fn position_of(&self, sha: &str) -> Option<Position> {
        self.dict.get(sha).map(|r| r.position)
    }

    /// Scans the history for reverts and turns each into a validated case.
    pub fn revert_cases(&self) -> CaseScan {
        let mut scan = CaseScan::default();

        for sha in &self.order {
            let Some(record) = self.dict.get(sha) else { continue };
            let (Some(reverted), Some(base)) = (&record.reverts, &record.base) else { continue };

            let (Some(target), Some(base)) = (self.position_of(reverted), self.position_of(base)) else {
                debug!(commit = %sha, "skipping revert due to missing data");
                scan.missing += 1;
                continue;
            };

            match RevertCase::new(record.position, base, target) {
                Ok(case) => scan.cases.push(case),
                Err(e) => {
                    debug!(commit = %sha, "skipping revert: {e}");
                    scan.inconsistent += 1;
                }
            }
        }

        scan
    }
}

pub fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, text).map_err(|source| Error::Write {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_case_stats(path: &Path) -> Result<Vec<CaseStats>> {
    let text = fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })
}
