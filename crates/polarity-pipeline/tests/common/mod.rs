// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared fixtures: a small book with a link annotation and an outline.

#![allow(dead_code)]

use std::path::Path;

use lopdf::{Document, Object, Stream, dictionary};
use polarity_core::{LayoutConfig, PageSpec, PolarityConfig};

/// Content of fixture page `n`.
pub fn page_text(n: u32) -> String {
    format!("0 0 0 .98 k 0 0 612 792 re f BT /F1 12 Tf 72 72 Td ({n}) Tj ET 0 0 0 1 K .5 w 0 0 m 612 792 l S")
}

/// Write a `pages`-page book to `path`. Page 1 carries a link to page 3 and
/// the outline has one entry pointing at page 2.
pub fn write_book(path: &Path, pages: u32) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for n in 1..=pages {
        let content = doc.add_object(Stream::new(dictionary! {}, page_text(n).into_bytes()));
        let page = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            "Contents" => content,
        });
        kids.push(page);
    }

    let link = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => vec![0.into(), 0.into(), 100.into(), 20.into()],
        "P" => kids[0],
        "Dest" => vec![Object::Reference(kids[2]), "Fit".into()],
    });
    doc.get_dictionary_mut(kids[0])
        .expect("page 1 exists")
        .set("Annots", vec![Object::Reference(link)]);

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
            "Title" => Object::string_literal("Connectors"),
            "Parent" => outlines,
            "Dest" => vec![Object::Reference(kids[1]), "Fit".into()],
        }),
    );

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids.into_iter().map(Object::Reference).collect::<Vec<_>>(),
            "Count" => count,
        }),
    );
    let catalog = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "Outlines" => outlines,
    });
    doc.trailer.set("Root", catalog);
    doc.save(path).expect("fixture book is written");
}

/// Configuration for a ten-page book whose pages 1, 2, 9 and 10 are dark.
pub fn ten_page_config() -> PolarityConfig {
    PolarityConfig {
        layout: LayoutConfig {
            total_pages: 10,
            inverted: vec![PageSpec::span(1, 2), PageSpec::span(9, 10)],
        },
        jobs: 3,
        ..PolarityConfig::default()
    }
}
