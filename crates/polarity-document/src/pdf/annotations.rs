// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Restore annotations and document navigation after a split/merge pass.
//
// Splitting a book into pages and merging the results keeps page content but
// drops link annotations, the outline and named destinations. They are copied
// back from the original, with every page reference redirected to the page at
// the same position in the merged document.

use std::path::Path;

use lopdf::{Document, Object, ObjectId};
use polarity_core::error::{PolarityError, Result};
use tracing::{debug, info, instrument, warn};

use super::clone::ObjectCloner;
use super::document::PdfDocument;

/// Catalog entries carried over from the original.
const CATALOG_KEYS: &[&[u8]] = &[b"Outlines", b"Dests", b"Names", b"PageMode"];

const NO_SKIP: &[&[u8]] = &[];

impl PdfDocument {
    /// Copy every page's annotations, and the outline and named destinations,
    /// from `source` into this document.
    ///
    /// Both documents must have the same number of pages. Existing annotations
    /// on a page are replaced. Returns the number of annotations copied.
    #[instrument(skip_all, fields(pages = self.page_count()))]
    pub fn copy_annotations_from(&mut self, source: &PdfDocument) -> Result<usize> {
        if source.page_count() != self.page_count() {
            return Err(PolarityError::DocumentAccess(format!(
                "cannot copy annotations: source has {} pages, target has {}",
                source.page_count(),
                self.page_count()
            )));
        }

        let mut cloner = ObjectCloner::new(&source.document, NO_SKIP);
        for page in 1..=self.page_count() {
            cloner.map_to(source.page_id(page)?, self.page_id(page)?);
        }
        if let (Some(from), Some(to)) = (pages_root(&source.document), pages_root(&self.document)) {
            cloner.map_to(from, to);
        }

        let mut copied = 0;
        for page in 1..=self.page_count() {
            let annots = page_annotations(&source.document, source.page_id(page)?);
            let Some(annots) = annots else { continue };
            if annots.is_empty() {
                continue;
            }

            let cloned: Vec<Object> = annots
                .iter()
                .map(|annot| cloner.clone_object(&mut self.document, annot))
                .collect();
            copied += cloned.len();

            let page_id = self.page_id(page)?;
            let page_dict = self.document.get_dictionary_mut(page_id).map_err(|err| {
                PolarityError::DocumentAccess(format!("page {} is not a dictionary: {}", page, err))
            })?;
            page_dict.set("Annots", Object::Array(cloned));
        }

        let navigation = copy_catalog_entries(&source.document, &mut self.document, &mut cloner)?;
        info!(annotations = copied, catalog_entries = navigation, "Copied annotations");
        Ok(copied)
    }
}

/// Copy annotations from `source` into `merged` and write the result to
/// `output`. `merged` and `output` may be the same path.
#[instrument(skip_all, fields(source = %source.as_ref().display(), output = %output.as_ref().display()))]
pub fn copy_annotations(
    source: impl AsRef<Path>,
    merged: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<usize> {
    let original = PdfDocument::open(source)?;
    let mut target = PdfDocument::open(merged)?;
    let copied = target.copy_annotations_from(&original)?;
    target.save(output)?;
    Ok(copied)
}

fn catalog_id(document: &Document) -> Option<ObjectId> {
    document
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .ok()
}

fn pages_root(document: &Document) -> Option<ObjectId> {
    let catalog = document.get_dictionary(catalog_id(document)?).ok()?;
    catalog.get(b"Pages").and_then(Object::as_reference).ok()
}

/// The `/Annots` array of a page, whether stored inline or by reference.
fn page_annotations(document: &Document, page_id: ObjectId) -> Option<Vec<Object>> {
    let page = document.get_dictionary(page_id).ok()?;
    let annots = match page.get(b"Annots").ok()? {
        Object::Reference(id) => document.get_object(*id).ok()?,
        inline => inline,
    };
    match annots.as_array() {
        Ok(items) => Some(items.clone()),
        Err(_) => {
            warn!(?page_id, "Ignoring /Annots that is not an array");
            None
        }
    }
}

fn copy_catalog_entries(
    source: &Document,
    target: &mut Document,
    cloner: &mut ObjectCloner<'_>,
) -> Result<usize> {
    let Some(source_catalog) = catalog_id(source).and_then(|id| source.get_dictionary(id).ok())
    else {
        return Ok(0);
    };
    let target_catalog = catalog_id(target).ok_or_else(|| {
        PolarityError::DocumentAccess("target document has no catalog".to_string())
    })?;

    let mut entries = Vec::new();
    for key in CATALOG_KEYS {
        if let Ok(value) = source_catalog.get(key) {
            entries.push((key.to_vec(), cloner.clone_object(target, value)));
        }
    }

    let count = entries.len();
    let catalog = target.get_dictionary_mut(target_catalog).map_err(|err| {
        PolarityError::DocumentAccess(format!("catalog is not a dictionary: {}", err))
    })?;
    for (key, value) in entries {
        debug!(key = %String::from_utf8_lossy(&key), "Copying catalog entry");
        catalog.set(key, value);
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Stream, dictionary};

    /// Two-page document whose first page links to the second, with an
    /// outline entry pointing at page 2.
    fn annotated_source() -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let first = doc.new_object_id();
        let second = doc.new_object_id();

        for id in [first, second] {
            let content = doc.add_object(Stream::new(dictionary! {}, b"0 0 0 1 k".to_vec()));
            doc.objects.insert(
                id,
                Object::Dictionary(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => vec![0.into(), 0.into(), 100.into(), 100.into()],
                    "Contents" => content,
                }),
            );
        }

        let link = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
            "P" => first,
            "Dest" => vec![Object::Reference(second), "Fit".into()],
        });
        doc.get_dictionary_mut(first)
            .unwrap()
            .set("Annots", vec![Object::Reference(link)]);

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![first.into(), second.into()],
                "Count" => 2,
            }),
        );

        let outline_item = doc.new_object_id();
        let outlines = doc.add_object(dictionary! {
            "Type" => "Outlines",
            "First" => outline_item,
            "Last" => outline_item,
            "Count" => 1,
        });
        doc.objects.insert(
            outline_item,
            Object::Dictionary(dictionary! {
                "Title" => Object::string_literal("Pinouts"),
                "Parent" => outlines,
                "Dest" => vec![Object::Reference(second), "Fit".into()],
            }),
        );

        let catalog = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
            "Outlines" => outlines,
        });
        doc.trailer.set("Root", catalog);
        doc
    }

    /// Split `original` into single pages and merge them back in order.
    fn split_and_merge(original: &PdfDocument, dir: &Path) -> std::path::PathBuf {
        let parts = original.split_into(dir).unwrap();
        let out = dir.join("merged.pdf");
        crate::pdf::merge_files(&parts, &out).unwrap();
        out
    }

    fn dest_page(dest: &Object) -> ObjectId {
        dest.as_array().unwrap()[0].as_reference().unwrap()
    }

    #[test]
    fn merge_drops_annotations() {
        let original = PdfDocument::from_document(annotated_source());
        let dir = tempfile::tempdir().unwrap();
        let merged = PdfDocument::open(split_and_merge(&original, dir.path())).unwrap();

        let doc = merged.inner();
        let first_page = doc.get_dictionary(merged.page_id(1).unwrap()).unwrap();
        assert!(!first_page.has(b"Annots"));
    }

    #[test]
    fn links_point_at_merged_pages() {
        let original = PdfDocument::from_document(annotated_source());
        let dir = tempfile::tempdir().unwrap();
        let mut merged = PdfDocument::open(split_and_merge(&original, dir.path())).unwrap();

        let copied = merged.copy_annotations_from(&original).unwrap();
        assert_eq!(copied, 1);

        let doc = merged.inner();
        let first_page = doc.get_dictionary(merged.page_id(1).unwrap()).unwrap();
        let annots = first_page.get(b"Annots").unwrap().as_array().unwrap();
        let link = doc
            .get_dictionary(annots[0].as_reference().unwrap())
            .unwrap();
        assert_eq!(
            link.get(b"P").unwrap().as_reference().unwrap(),
            merged.page_id(1).unwrap()
        );
        assert_eq!(
            dest_page(link.get(b"Dest").unwrap()),
            merged.page_id(2).unwrap()
        );
    }

    #[test]
    fn outline_is_copied() {
        let original_path_dir = tempfile::tempdir().unwrap();
        let original_path = original_path_dir.path().join("original.pdf");
        let mut original = PdfDocument::from_document(annotated_source());
        original.save(&original_path).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let merged_path = split_and_merge(&original, dir.path());
        let output = dir.path().join("final.pdf");
        let copied = copy_annotations(&original_path, &merged_path, &output).unwrap();
        assert_eq!(copied, 1);

        let merged = PdfDocument::open(&output).unwrap();
        let doc = merged.inner();
        let catalog = doc.get_dictionary(catalog_id(doc).unwrap()).unwrap();
        let outlines = doc
            .get_dictionary(catalog.get(b"Outlines").unwrap().as_reference().unwrap())
            .unwrap();
        let item = doc
            .get_dictionary(outlines.get(b"First").unwrap().as_reference().unwrap())
            .unwrap();
        assert_eq!(dest_page(item.get(b"Dest").unwrap()), merged.page_id(2).unwrap());
    }

    #[test]
    fn missing_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = copy_annotations(
            dir.path().join("missing.pdf"),
            dir.path().join("merged.pdf"),
            dir.path().join("out.pdf"),
        );
        assert!(matches!(result, Err(PolarityError::DocumentAccess(_))));
    }

    #[test]
    fn page_count_mismatch_is_rejected() {
        let original = PdfDocument::from_document(annotated_source());
        let mut single = original.extract_page(1).unwrap();
        let err = single.copy_annotations_from(&original).unwrap_err();
        assert!(err.to_string().contains("source has 2 pages"));
    }
}
