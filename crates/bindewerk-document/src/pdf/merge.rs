// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Merge stage — append every page of the submitted PDFs onto the sealed
// primary document using the `lopdf` crate.
//
// The merged document is written to `<primary>.merged` and renamed over the
// primary only once everything succeeded. Any failure leaves the primary
// byte-for-byte unchanged.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bindewerk_core::error::{BindewerkError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, info, instrument, warn};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against malformed page trees whose /Parent chain loops.
const MAX_TREE_DEPTH: usize = 64;

/// How the merge stage ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No source PDFs were submitted; the primary was not touched.
    Skipped,
    /// Sources appended and the primary replaced.
    Merged {
        appended_pages: usize,
        page_count: usize,
    },
    /// The merge was abandoned; the primary is unchanged.
    Failed { reason: String },
}

/// Append every page of each file in `sources`, in order, after the pages of
/// `primary`.
#[instrument(skip_all, fields(primary = %primary.display(), sources = sources.len()))]
pub fn merge_sources(primary: &Path, sources: &[PathBuf]) -> MergeOutcome {
    if sources.is_empty() {
        debug!("No source PDFs, merge skipped");
        return MergeOutcome::Skipped;
    }

    match try_merge(primary, sources) {
        Ok((appended_pages, page_count)) => {
            info!(appended_pages, page_count, "Source PDFs merged");
            MergeOutcome::Merged {
                appended_pages,
                page_count,
            }
        }
        Err(err) => {
            warn!(%err, "Merge failed, keeping unmerged document");
            let _ = std::fs::remove_file(super::side_path(primary, "merged"));
            MergeOutcome::Failed {
                reason: err.to_string(),
            }
        }
    }
}

fn try_merge(primary: &Path, sources: &[PathBuf]) -> Result<(usize, usize)> {
    let mut merged = Document::load(primary).map_err(|err| {
        BindewerkError::PdfError(format!("failed to open {}: {}", primary.display(), err))
    })?;

    let mut appended = 0;
    for (index, source_path) in sources.iter().enumerate() {
        let source = Document::load(source_path).map_err(|err| {
            BindewerkError::PdfError(format!(
                "failed to load source PDF #{} ({}): {}",
                index + 1,
                source_path.display(),
                err
            ))
        })?;

        // Shared resources are cloned once per source document. Every page
        // gets its new id up front so links between pages resolve to the
        // appended pages instead of being copied a second time.
        let page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();
        let mut cloner = ObjectCloner::new(&source);
        let reserved: Vec<ObjectId> = page_ids
            .iter()
            .map(|page_id| cloner.reserve(&mut merged, *page_id))
            .collect();
        for (page_id, new_page_id) in page_ids.into_iter().zip(reserved) {
            clone_page_into(&mut cloner, &mut merged, page_id, new_page_id)?;
            appended += 1;
        }
        debug!(index, pages_so_far = appended, "Source PDF appended");
    }

    let page_count = merged.get_pages().len();
    let mut output = Vec::new();
    merged.save_to(&mut output).map_err(|err| {
        BindewerkError::PdfError(format!("failed to serialise merged PDF: {}", err))
    })?;

    super::write_via_side_file(primary, "merged", &output)?;
    Ok((appended, page_count))
}

/// Clone a single page (and everything it references) from the cloner's
/// source into `target` under the already reserved `new_page_id`, appending
/// it as the last page of `target`'s root page node.
fn clone_page_into(
    cloner: &mut ObjectCloner<'_>,
    target: &mut Document,
    page_id: ObjectId,
    new_page_id: ObjectId,
) -> Result<()> {
    let source = cloner.source;
    let page = source
        .get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(|err| {
            BindewerkError::PdfError(format!("cannot read page object {:?}: {}", page_id, err))
        })?;

    // Pull inherited attributes down so the page survives leaving its tree.
    let mut page_dict = page.clone();
    for key in INHERITABLE_KEYS {
        if page_dict.has(key) {
            continue;
        }
        if let Some(value) = inherited_attribute(source, page, key) {
            page_dict.set(key.to_vec(), value.clone());
        }
    }

    let mut new_page = Object::Dictionary(page_dict);
    cloner.remap(target, &mut new_page);
    cloner.drain(target);

    let pages_id = target
        .catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|err| BindewerkError::PdfError(format!("no /Pages root: {}", err)))?;

    if let Object::Dictionary(dict) = &mut new_page {
        dict.set("Parent", Object::Reference(pages_id));
    }
    target.objects.insert(new_page_id, new_page);

    let pages_dict = target
        .get_object_mut(pages_id)
        .and_then(Object::as_dict_mut)
        .map_err(|err| BindewerkError::PdfError(format!("unreadable /Pages root: {}", err)))?;

    match pages_dict.get_mut(b"Kids") {
        Ok(Object::Array(kids)) => kids.push(Object::Reference(new_page_id)),
        _ => {
            return Err(BindewerkError::PdfError(
                "/Pages root has no /Kids array".to_string(),
            ));
        }
    }
    let count = pages_dict
        .get(b"Count")
        .and_then(Object::as_i64)
        .unwrap_or(0);
    pages_dict.set("Count", Object::Integer(count + 1));

    Ok(())
}

/// Look `key` up on the ancestors of `page`.
fn inherited_attribute<'a>(source: &'a Document, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut node = page;
    for _ in 0..MAX_TREE_DEPTH {
        let parent_id = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = source.get_object(parent_id).and_then(Object::as_dict).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
    }
    None
}

/// Copies objects out of one source document into a target.
///
/// Each source object is cloned at most once; later references reuse the id
/// recorded in `cloned`, which also breaks reference cycles. Referenced
/// objects are queued rather than followed, so arbitrarily long reference
/// chains never grow the stack.
struct ObjectCloner<'a> {
    source: &'a Document,
    cloned: HashMap<ObjectId, ObjectId>,
    pending: Vec<(ObjectId, ObjectId)>,
}

impl<'a> ObjectCloner<'a> {
    fn new(source: &'a Document) -> Self {
        Self {
            source,
            cloned: HashMap::new(),
            pending: Vec::new(),
        }
    }

    /// Allocate the target id for `id` without copying anything yet.
    fn reserve(&mut self, target: &mut Document, id: ObjectId) -> ObjectId {
        let new_id = target.new_object_id();
        self.cloned.insert(id, new_id);
        new_id
    }

    /// Rewrite every reference inside `object` to its target id, queueing
    /// objects seen for the first time. /Parent entries are dropped (the
    /// caller patches page parents) and dangling references become Null.
    fn remap(&mut self, target: &mut Document, object: &mut Object) {
        let mut stack: Vec<&mut Object> = vec![object];
        while let Some(current) = stack.pop() {
            if let Object::Reference(id) = *current {
                *current = self.resolve(target, id);
                continue;
            }
            match current {
                Object::Dictionary(dict) => {
                    dict.remove(b"Parent");
                    stack.extend(dict.iter_mut().map(|(_, value)| value));
                }
                Object::Stream(stream) => {
                    stream.dict.remove(b"Parent");
                    stack.extend(stream.dict.iter_mut().map(|(_, value)| value));
                }
                Object::Array(items) => stack.extend(items.iter_mut()),
                // Boolean, Integer, Real, String, Name, Null
                _ => {}
            }
        }
    }

    fn resolve(&mut self, target: &mut Document, id: ObjectId) -> Object {
        if let Some(new_id) = self.cloned.get(&id) {
            return Object::Reference(*new_id);
        }
        match self.source.get_object(id) {
            Ok(_) => {
                let new_id = self.reserve(target, id);
                self.pending.push((id, new_id));
                Object::Reference(new_id)
            }
            Err(err) => {
                warn!(ref_id = ?id, %err, "Cannot resolve reference, using Null");
                Object::Null
            }
        }
    }

    /// Copy every queued object into `target`.
    fn drain(&mut self, target: &mut Document) {
        while let Some((id, new_id)) = self.pending.pop() {
            let Ok(original) = self.source.get_object(id) else {
                continue;
            };
            let mut copy = original.clone();
            self.remap(target, &mut copy);
            target.objects.insert(new_id, copy);
        }
    }
}
