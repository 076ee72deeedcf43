// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process page splitting and merging.
//
// Pages are copied with everything they reference (resources, fonts, images,
// content streams) into a fresh page tree. Annotations are not carried over;
// like external merge tools, a merged document has to get its annotations
// back from the original with `copy_annotations`.

use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};
use polarity_core::error::{PolarityError, Result};
use tracing::{debug, info, instrument};

use super::clone::ObjectCloner;
use super::document::PdfDocument;

/// Keys never copied from a page dictionary. `/Parent` is rewritten to the
/// new page tree; `/Annots` is restored separately.
const PAGE_SKIP_KEYS: &[&[u8]] = &[b"Parent", b"Annots"];

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: &[&[u8]] = &[b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against malformed, cyclic `/Parent` chains.
const MAX_TREE_DEPTH: usize = 64;

impl PdfDocument {
    /// Copy page `page` (1-based) into a new standalone single-page document.
    #[instrument(skip(self))]
    pub fn extract_page(&self, page: u32) -> Result<PdfDocument> {
        let page_id = self.page_id(page)?;
        let mut builder = PageTreeBuilder::new();
        builder.append(&self.document, page_id)?;
        Ok(builder.finish())
    }

    /// Write every page to its own file `page-<n>.pdf` inside `dir`.
    ///
    /// Returns the paths in page order.
    #[instrument(skip_all, fields(dir = %dir.as_ref().display()))]
    pub fn split_into(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let mut paths = Vec::with_capacity(self.page_count() as usize);
        for page in 1..=self.page_count() {
            let path = dir.join(format!("page-{page}.pdf"));
            self.extract_page(page)?.save(&path)?;
            paths.push(path);
        }
        info!(pages = paths.len(), "Split PDF into single pages");
        Ok(paths)
    }
}

/// Concatenate the pages of `inputs`, in order, into one document at `output`.
#[instrument(skip_all, fields(inputs = inputs.len(), output = %output.as_ref().display()))]
pub fn merge_files(inputs: &[PathBuf], output: impl AsRef<Path>) -> Result<()> {
    let mut builder = PageTreeBuilder::new();
    for input in inputs {
        let part = PdfDocument::open(input)?;
        for page_id in part.document.get_pages().into_values() {
            builder.append(&part.document, page_id)?;
        }
    }

    let mut merged = builder.finish();
    debug!(pages = merged.page_count(), "Merge complete");
    merged.save(output)
}

/// A new document with a flat page tree that pages are appended to.
struct PageTreeBuilder {
    document: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl PageTreeBuilder {
    fn new() -> Self {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);
        Self {
            document,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Copy one page of `source` (and everything it references) to the end of
    /// the tree.
    fn append(&mut self, source: &Document, page_id: ObjectId) -> Result<()> {
        let page = source.get_dictionary(page_id).map_err(|err| {
            PolarityError::DocumentAccess(format!("cannot read page object {:?}: {}", page_id, err))
        })?;

        let mut cloner = ObjectCloner::new(source, PAGE_SKIP_KEYS);
        let mut copy = cloner.clone_dictionary(&mut self.document, page);
        for key in INHERITABLE_KEYS {
            if copy.has(key) {
                continue;
            }
            if let Some(value) = inherited_attribute(source, page, key) {
                let cloned = cloner.clone_object(&mut self.document, value);
                copy.set(key.to_vec(), cloned);
            }
        }
        copy.set("Parent", Object::Reference(self.pages_id));

        let new_id = self.document.add_object(copy);
        self.kids.push(Object::Reference(new_id));
        Ok(())
    }

    fn finish(mut self) -> PdfDocument {
        let count = self.kids.len() as i64;
        self.document.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );
        PdfDocument::from_document(self.document)
    }
}

/// Look `key` up on `page`, then on each ancestor page-tree node.
fn inherited_attribute<'a>(
    source: &'a Document,
    page: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    let mut node = page;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        let parent_id = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = source.get_dictionary(parent_id).ok()?;
    }
    None
}
