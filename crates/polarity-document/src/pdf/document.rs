// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF document access. Open a document, collapse a page's content into one
// stream, read and replace that stream, and save atomically, using the
// `lopdf` crate.

use std::path::{Path, PathBuf};

use lopdf::{Document, Object, ObjectId, Stream};
use polarity_core::error::{PolarityError, Result};
use tracing::{debug, info, instrument};

/// Opaque reference to a content stream inside a [`PdfDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamHandle(ObjectId);

impl StreamHandle {
    pub fn object_id(&self) -> ObjectId {
        self.0
    }
}

/// A PDF document whose pages can be rewritten one content stream at a time.
///
/// Wraps `lopdf::Document`. Pages are addressed by 1-based index.
pub struct PdfDocument {
    /// The underlying lopdf document.
    pub(crate) document: Document,
    /// Page object ids in page order; `pages[0]` is page 1.
    pages: Vec<ObjectId>,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<PathBuf>,
    /// Set once flattening has left old content streams unreferenced.
    orphaned_streams: bool,
}

impl PdfDocument {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            PolarityError::DocumentAccess(format!(
                "failed to open {}: {}",
                path_ref.display(),
                err
            ))
        })?;

        let mut opened = Self::from_document(document);
        opened.source_path = Some(path_ref.to_path_buf());
        debug!(pages = opened.page_count(), "PDF loaded");
        Ok(opened)
    }

    /// Create a document from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            PolarityError::DocumentAccess(format!("failed to open PDF from memory: {}", err))
        })?;

        let loaded = Self::from_document(document);
        debug!(pages = loaded.page_count(), "PDF loaded from bytes");
        Ok(loaded)
    }

    /// Wrap an already-built lopdf document.
    pub fn from_document(document: Document) -> Self {
        let pages = document.get_pages().into_values().collect();
        Self {
            document,
            pages,
            source_path: None,
            orphaned_streams: false,
        }
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Return the source path if the document was opened from a file.
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Borrow the underlying lopdf document.
    pub fn inner(&self) -> &Document {
        &self.document
    }

    /// Object id of page `page` (1-based).
    pub fn page_id(&self, page: u32) -> Result<ObjectId> {
        if page == 0 || page > self.page_count() {
            return Err(PolarityError::DocumentAccess(format!(
                "page {} out of range (document has {} pages)",
                page,
                self.page_count()
            )));
        }
        Ok(self.pages[page as usize - 1])
    }

    /// Decoded content of page `page`, all content streams concatenated.
    pub fn page_content(&self, page: u32) -> Result<Vec<u8>> {
        let page_id = self.page_id(page)?;
        let streams = self.document.get_page_contents(page_id);
        let mut content = Vec::new();
        for (index, stream_id) in streams.into_iter().enumerate() {
            if index > 0 {
                content.push(b'\n');
            }
            content.extend(self.read_stream(StreamHandle(stream_id))?);
        }
        Ok(content)
    }

    // -- Content streams ------------------------------------------------------

    /// Collapse page `page`'s content into exactly one uncompressed stream and
    /// return a handle to it.
    ///
    /// Pages that already have a single content stream of their own keep it.
    /// Pages with several streams, or with a stream another page also draws,
    /// get one new stream holding their decoded contents in order, separated
    /// by newlines. Pages without content get an empty stream.
    #[instrument(skip(self))]
    pub fn flatten_content(&mut self, page: u32) -> Result<StreamHandle> {
        let page_id = self.page_id(page)?;
        let streams = self.document.get_page_contents(page_id);
        if let [single] = streams.as_slice() {
            // A stream shared with another page gets a private copy below.
            if !self.is_shared(page_id, *single) {
                return Ok(StreamHandle(*single));
            }
        }

        let content = self.page_content(page)?;
        debug!(
            page,
            streams = streams.len(),
            bytes = content.len(),
            "Flattening page content"
        );

        let stream_id = self
            .document
            .add_object(Stream::new(lopdf::Dictionary::new(), content));
        let page_dict = self.document.get_dictionary_mut(page_id).map_err(|err| {
            PolarityError::DocumentAccess(format!("page {} is not a dictionary: {}", page, err))
        })?;
        page_dict.set("Contents", Object::Reference(stream_id));

        if !streams.is_empty() {
            self.orphaned_streams = true;
        }
        Ok(StreamHandle(stream_id))
    }

    /// Handle to the single content stream of page `page`.
    ///
    /// Fails if the page has zero or several content streams; call
    /// [`PdfDocument::flatten_content`] first.
    pub fn content_stream(&self, page: u32) -> Result<StreamHandle> {
        let page_id = self.page_id(page)?;
        match self.document.get_page_contents(page_id).as_slice() {
            [single] => Ok(StreamHandle(*single)),
            other => Err(PolarityError::DocumentAccess(format!(
                "page {} has {} content streams, expected one",
                page,
                other.len()
            ))),
        }
    }

    /// Decoded bytes of a content stream.
    pub fn read_stream(&self, handle: StreamHandle) -> Result<Vec<u8>> {
        let stream = self
            .document
            .get_object(handle.0)
            .and_then(Object::as_stream)
            .map_err(|err| {
                PolarityError::DocumentAccess(format!(
                    "object {:?} is not a readable stream: {}",
                    handle.0, err
                ))
            })?;

        if stream.dict.has(b"Filter") {
            stream.decompressed_content().map_err(|err| {
                PolarityError::DocumentAccess(format!(
                    "cannot decode stream {:?}: {}",
                    handle.0, err
                ))
            })
        } else {
            Ok(stream.content.clone())
        }
    }

    /// Replace a content stream's bytes. The stream is stored uncompressed.
    pub fn write_stream(&mut self, handle: StreamHandle, content: Vec<u8>) -> Result<()> {
        match self.document.get_object_mut(handle.0) {
            Ok(Object::Stream(stream)) => {
                stream.set_plain_content(content);
                Ok(())
            }
            Ok(_) => Err(PolarityError::DocumentAccess(format!(
                "object {:?} is not a stream",
                handle.0
            ))),
            Err(err) => Err(PolarityError::DocumentAccess(format!(
                "cannot access stream {:?}: {}",
                handle.0, err
            ))),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Compress every stream that allows it.
    pub fn compress(&mut self) {
        self.document.compress();
    }

    /// Serialise the document to bytes.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.prune();
        let mut output = Vec::new();
        self.document.save_to(&mut output).map_err(|err| {
            PolarityError::DocumentAccess(format!("failed to serialise PDF: {}", err))
        })?;
        Ok(output)
    }

    /// Write the document to `path`.
    ///
    /// The bytes go to a temporary file next to `path` which is renamed over
    /// it only once fully written, so a failed save never leaves a truncated
    /// output behind.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.prune();

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        self.document.save_to(&mut temp).map_err(|err| {
            PolarityError::DocumentAccess(format!(
                "failed to write {}: {}",
                path.display(),
                err
            ))
        })?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|err| PolarityError::Io(err.error))?;

        info!("Wrote PDF to {}", path.display());
        Ok(())
    }

    fn is_shared(&self, page_id: ObjectId, stream_id: ObjectId) -> bool {
        self.pages.iter().any(|&other| {
            other != page_id && self.document.get_page_contents(other).contains(&stream_id)
        })
    }

    fn prune(&mut self) {
        if self.orphaned_streams {
            let removed = self.document.prune_objects();
            debug!(removed = removed.len(), "Pruned unreferenced objects");
            self.orphaned_streams = false;
        }
    }
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("pages", &self.pages.len())
            .field("source_path", &self.source_path)
            .finish()
    }
}
