// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared fixtures: small in-memory PDFs built with lopdf.

#![allow(dead_code)]

use lopdf::{Document, Object, ObjectId, Stream, dictionary};

/// One page of a fixture document.
pub enum PageContent {
    /// A single content stream.
    Single(Vec<u8>),
    /// Several content streams drawn in order.
    Split(Vec<Vec<u8>>),
    /// No `/Contents` entry at all.
    Empty,
}

/// Build a document whose pages have the given contents. Page resources and
/// the media box live on the page tree root and are inherited.
pub fn build(pages: Vec<PageContent>) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for content in pages {
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        };
        match content {
            PageContent::Single(bytes) => {
                page.set("Contents", add_stream(&mut doc, &bytes));
            }
            PageContent::Split(parts) => {
                let refs: Vec<Object> = parts
                    .into_iter()
                    .map(|bytes| Object::Reference(add_stream(&mut doc, &bytes)))
                    .collect();
                page.set("Contents", refs);
            }
            PageContent::Empty => {}
        }
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

/// `count` pages, page `n` filled with `0 0 0 .98 k` and labelled `n`.
pub fn numbered(count: u32) -> Document {
    let pages = (1..=count)
        .map(|n| {
            PageContent::Single(
                format!("0 0 0 .98 k 0 0 612 792 re f BT /F1 12 Tf 72 72 Td ({n}) Tj ET 0 0 0 1 K")
                    .into_bytes(),
            )
        })
        .collect();
    build(pages)
}

pub fn add_stream(doc: &mut Document, bytes: &[u8]) -> ObjectId {
    doc.add_object(Stream::new(dictionary! {}, bytes.to_vec()))
}

/// Serialise `doc` and return the bytes.
pub fn to_bytes(mut doc: Document) -> Vec<u8> {
    let mut out = Vec::new();
    doc.save_to(&mut out).expect("fixture serialises");
    out
}
