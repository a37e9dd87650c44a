//! `updated` propagation over a persisted catalog tree.
//!
//! Post-order over relative `child` links: a node's `updated` is the
//! maximum of its own file mtime and the results of its children and
//! items. Items are leaves; their own mtime is written onto them. Results
//! are memoized per path so a node reachable from several parents is
//! computed once and later visits do not observe the mtime bump of an
//! earlier save.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SubsecRound, Utc};
use tracing::debug;

use crate::error::CatalogError;
use crate::link::Rel;
use crate::node::NodeFile;
use crate::paths::normalize;

/// Propagates `updated` through the tree rooted at `root_file` and
/// returns the root's timestamp.
pub fn propagate_updated(root_file: &Path) -> Result<DateTime<Utc>, CatalogError> {
    let mut memo: BTreeMap<PathBuf, DateTime<Utc>> = BTreeMap::new();
    let root = propagate(&normalize(root_file), &mut memo)?;
    debug!(nodes = memo.len(), updated = %root, "propagated timestamps");
    Ok(root)
}

fn propagate(
    path: &Path,
    memo: &mut BTreeMap<PathBuf, DateTime<Utc>>,
) -> Result<DateTime<Utc>, CatalogError> {
    if let Some(done) = memo.get(path) {
        return Ok(*done);
    }
    let mut file = NodeFile::load(path)?;
    let mut latest = modified(path)?;

    for child in file.link_targets(Rel::Child) {
        latest = latest.max(propagate(&child, memo)?);
    }
    for item in file.link_targets(Rel::Item) {
        latest = latest.max(stamp_item(&item, memo)?);
    }

    file.node.updated = Some(latest);
    file.save()?;
    memo.insert(path.to_path_buf(), latest);
    Ok(latest)
}

fn stamp_item(
    path: &Path,
    memo: &mut BTreeMap<PathBuf, DateTime<Utc>>,
) -> Result<DateTime<Utc>, CatalogError> {
    if let Some(done) = memo.get(path) {
        return Ok(*done);
    }
    let stamp = modified(path)?;
    let mut item = NodeFile::load(path)?;
    item.node.updated = Some(stamp);
    item.save()?;
    memo.insert(path.to_path_buf(), stamp);
    Ok(stamp)
}

/// File mtime truncated to whole seconds.
pub fn modified(path: &Path) -> Result<DateTime<Utc>, CatalogError> {
    let meta = fs::metadata(path).map_err(|err| CatalogError::fs(path, err))?;
    let mtime = meta.modified().map_err(|err| CatalogError::fs(path, err))?;
    Ok(DateTime::<Utc>::from(mtime).trunc_subsecs(0))
}
