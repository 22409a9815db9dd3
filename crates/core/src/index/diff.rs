//! Change detection between the notes on disk and the indexed snapshot.
//!
//! Both sides are sorted by path, so a single merge pass finds every
//! difference while holding only the current record of each side.

use std::cmp::Ordering;

use super::types::{Change, FileRecord};

/// Merge `source` (disk) against `target` (index) and report each difference.
///
/// Paths only in `source` are [`Added`](super::ChangeKind::Added), paths only
/// in `target` are [`Removed`](super::ChangeKind::Removed), and paths on both
/// sides whose modification times differ are
/// [`Modified`](super::ChangeKind::Modified). Changes are delivered in path
/// order.
///
/// The first error, whether read from either stream or returned by
/// `on_change`, stops the merge and is returned as is. Changes already
/// delivered stay delivered.
pub fn diff<S, T, F, E>(source: S, target: T, mut on_change: F) -> Result<(), E>
where
    S: IntoIterator<Item = Result<FileRecord, E>>,
    T: IntoIterator<Item = Result<FileRecord, E>>,
    F: FnMut(Change) -> Result<(), E>,
{
    let mut source = source.into_iter();
    let mut target = target.into_iter();

    let mut src = source.next().transpose()?;
    let mut tgt = target.next().transpose()?;

    loop {
        match (src.take(), tgt.take()) {
            (None, None) => return Ok(()),
            (None, Some(t)) => {
                on_change(Change::removed(t.path))?;
                tgt = target.next().transpose()?;
            }
            (Some(s), None) => {
                on_change(Change::added(s.path))?;
                src = source.next().transpose()?;
            }
            (Some(s), Some(t)) => match s.path.as_str().cmp(t.path.as_str()) {
                Ordering::Equal => {
                    if s.modified != t.modified {
                        on_change(Change::modified(s.path))?;
                    }
                    src = source.next().transpose()?;
                    tgt = target.next().transpose()?;
                }
                Ordering::Less => {
                    on_change(Change::added(s.path))?;
                    tgt = Some(t);
                    src = source.next().transpose()?;
                }
                Ordering::Greater => {
                    on_change(Change::removed(t.path))?;
                    src = Some(s);
                    tgt = target.next().transpose()?;
                }
            },
        }
    }
}
