// src/analyzer.rs

use crate::error::Result;
use crate::model::*;
use chrono::TimeZone;
use git2::{Commit, DescribeFormatOptions, DescribeOptions, DiffOptions, Oid, Repository};
use indicatif::ProgressBar;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info, warn};

const REVERT_MARKER: &str = "This reverts commit ";

/// Walks a local repository and records per-commit change sizes together
/// with every revert whose reverted commit can be found in the history.
pub fn analyze(repo_path: &Path) -> Result<Dataset> {
    let repo = Repository::open(repo_path)?;
    info!("Analyzing repository at: {}", repo_path.display());

    // 1. Collect all commits, newest first, as `git log` lists them
    let mut commits = Vec::new();
    let mut revwalk = repo.revwalk()?;
    revwalk.push_head()?;
    revwalk.set_sorting(git2::Sort::TIME)?;
    for oid in revwalk {
        commits.push(oid?);
    }

    let positions: HashMap<Oid, Position> = commits.iter().enumerate().map(|(i, &oid)| (oid, i)).collect();

    let bar = ProgressBar::new(commits.len() as u64);
    bar.set_message("Analyzing commits");

    // 2. Measure each commit against its first parent
    let mut dict = BTreeMap::new();
    let mut reverts = Vec::new();
    for (position, &oid) in commits.iter().enumerate() {
        let commit = repo.find_commit(oid)?;
        let mut record = CommitRecord {
            position,
            time: Some(commit.time().seconds()),
            summary: measure_commit(&repo, &commit)?,
            ..Default::default()
        };

        if let Some(reverted) = reverted_commit(&repo, &commit) {
            if positions.contains_key(&reverted) {
                let base = base_commit(&repo, reverted).unwrap_or_else(|| commits[commits.len() - 1]);
                debug!("{} reverts {} with base {}", oid, reverted, base);
                record.reverts = Some(reverted.to_string());
                record.base = Some(base.to_string());
                reverts.push(oid.to_string());
            } else {
                debug!("{} reverts {} which is not in the history", oid, reverted);
            }
        }

        dict.insert(oid.to_string(), record);
        bar.inc(1);
    }
    bar.finish_with_message("Analysis complete");

    if let (Some(&newest), Some(&oldest)) = (commits.first(), commits.last()) {
        info!(
            "History spans from {} to {}.",
            format_time(repo.find_commit(oldest)?.time().seconds()),
            format_time(repo.find_commit(newest)?.time().seconds())
        );
    }
    if reverts.is_empty() {
        warn!("no reverts found in {}", repo_path.display());
    } else {
        info!("Found {} reverts", reverts.len());
    }

    Ok(Dataset {
        name: repo_path
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned())),
        clone_url: None,
        order: commits.iter().map(Oid::to_string).collect(),
        dict,
        reverts,
    })
}

fn format_time(seconds: i64) -> String {
    chrono::Utc
        .timestamp_opt(seconds, 0)
        .single()
        .map(|t| t.to_rfc2822())
        .unwrap_or_else(|| seconds.to_string())
}

/// Files, hunks and lines changed relative to the first parent.
fn measure_commit(repo: &Repository, commit: &Commit) -> Result<CommitSummary> {
    let parent_tree = match commit.parent(0) {
        Ok(parent) => Some(parent.tree()?),
        Err(_) => None,
    };
    let current_tree = commit.tree()?;

    let mut diff_opts = DiffOptions::new();
    diff_opts.include_untracked(false);
    diff_opts.ignore_filemode(true);

    let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&current_tree), Some(&mut diff_opts))?;
    let stats = diff.stats()?;

    let mut blocks_changed = 0;
    diff.foreach(
        &mut |_, _| true,
        None,
        Some(&mut |_, _| {
            blocks_changed += 1;
            true
        }),
        None,
    )?;

    Ok(CommitSummary {
        lines_added: stats.insertions() as u64,
        lines_removed: stats.deletions() as u64,
        blocks_changed,
        files_changed: stats.files_changed() as u64,
    })
}

/// The abbreviated or full hash following the revert marker, if any.
pub fn parse_revert_message(message: &str) -> Option<&str> {
    let start = message.find(REVERT_MARKER)? + REVERT_MARKER.len();
    let rest = &message[start..];
    let end = rest.find(|c: char| !c.is_ascii_hexdigit()).unwrap_or(rest.len());
    (end > 0).then(|| &rest[..end])
}

fn reverted_commit(repo: &Repository, commit: &Commit) -> Option<Oid> {
    let hash = parse_revert_message(commit.message()?)?;
    let object = repo.revparse_single(hash).ok()?;
    object.peel_to_commit().ok().map(|c| c.id())
}

/// Commit of the nearest tag reached along first parents from `reverted`.
fn base_commit(repo: &Repository, reverted: Oid) -> Option<Oid> {
    let object = repo.find_object(reverted, None).ok()?;
    let mut describe_opts = DescribeOptions::new();
    describe_opts.describe_tags().only_follow_first_parent(true);
    let describe = object.describe(&describe_opts).ok()?;

    let mut format_opts = DescribeFormatOptions::new();
    format_opts.abbreviated_size(0);
    let described = describe.format(Some(&format_opts)).ok()?;
    let tag = described.split('~').next()?;

    let commit = repo.revparse_single(tag).ok()?.peel_to_commit().ok()?;
    Some(commit.id())
}
