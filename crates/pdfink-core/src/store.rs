//! Annotation store with undo/redo, keyed by file and page.
//!
//! The persisted shape is a JSON object mapping a file identifier to an
//! object mapping `page_<n>` to the ordered annotations of that page.

use crate::annotation::{Annotation, AnnotationError, AnnotationId, AnnotationPatch};
use crate::tools::AnnotationSink;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Maximum number of undo states to keep per file.
const MAX_UNDO_HISTORY: usize = 50;

type PageMap = BTreeMap<String, Vec<Annotation>>;

/// Storage key of a page.
pub fn page_key(page_number: u32) -> String {
    format!("page_{page_number}")
}

/// Page number of a `page_<n>` key.
pub fn parse_page_key(key: &str) -> Option<u32> {
    key.strip_prefix("page_")?.parse().ok().filter(|n| *n > 0)
}

/// All annotations of one document, with snapshot undo/redo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileAnnotations {
    pages: PageMap,
    #[serde(skip)]
    undo_stack: Vec<PageMap>,
    #[serde(skip)]
    redo_stack: Vec<PageMap>,
}

impl FileAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Annotations of `page_number` in paint order.
    pub fn page(&self, page_number: u32) -> &[Annotation] {
        self.pages
            .get(&page_key(page_number))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Numbers of the pages that have annotations.
    pub fn page_numbers(&self) -> Vec<u32> {
        let mut pages: Vec<u32> = self.pages.keys().filter_map(|k| parse_page_key(k)).collect();
        pages.sort_unstable();
        pages
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.pages.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &AnnotationId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: &AnnotationId) -> Option<&Annotation> {
        self.iter().find(|a| &a.id == id)
    }

    fn get_mut(&mut self, id: &AnnotationId) -> Option<&mut Annotation> {
        self.pages.values_mut().flatten().find(|a| &a.id == id)
    }

    /// Validate and append an annotation to its page. Does not touch the undo
    /// history.
    pub fn insert(&mut self, annotation: Annotation) -> Result<(), AnnotationError> {
        annotation.validate()?;
        if self.contains(&annotation.id) {
            return Err(AnnotationError::DuplicateId(annotation.id));
        }
        self.pages
            .entry(page_key(annotation.page_number))
            .or_default()
            .push(annotation);
        Ok(())
    }

    /// Remove an annotation by id, wherever it is.
    pub fn remove_annotation(&mut self, id: &AnnotationId) -> Option<Annotation> {
        let (key, index) = self
            .pages
            .iter()
            .find_map(|(key, anns)| anns.iter().position(|a| &a.id == id).map(|i| (key.clone(), i)))?;
        let anns = self.pages.get_mut(&key)?;
        let removed = anns.remove(index);
        if anns.is_empty() {
            self.pages.remove(&key);
        }
        Some(removed)
    }

    /// Remove every annotation on a page. Returns how many were removed.
    pub fn clear_page(&mut self, page_number: u32) -> usize {
        self.pages
            .remove(&page_key(page_number))
            .map_or(0, |anns| anns.len())
    }

    /// Push current state to undo stack (call before making changes).
    pub fn push_undo(&mut self) {
        self.undo_stack.push(self.pages.clone());
        self.redo_stack.clear();
        if self.undo_stack.len() > MAX_UNDO_HISTORY {
            self.undo_stack.remove(0);
        }
    }

    /// Returns true if undo was performed, false if nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo_stack.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.pages, snapshot);
        self.redo_stack.push(current);
        true
    }

    /// Returns true if redo was performed, false if nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.pages, snapshot);
        self.undo_stack.push(current);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn replace_pages(&mut self, other: FileAnnotations) {
        self.push_undo();
        self.pages = other.pages;
    }
}

impl AnnotationSink for FileAnnotations {
    fn page_annotations(&self, page: u32) -> &[Annotation] {
        self.page(page)
    }

    fn add(&mut self, annotation: Annotation) -> bool {
        match self.insert(annotation) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Rejected annotation: {e}");
                false
            }
        }
    }

    fn remove(&mut self, id: &AnnotationId) -> bool {
        self.remove_annotation(id).is_some()
    }

    fn update(&mut self, id: &AnnotationId, patch: &AnnotationPatch) -> bool {
        self.get_mut(id).is_some_and(|a| a.apply_patch(patch))
    }

    fn checkpoint(&mut self) {
        self.push_undo();
    }
}

/// How an import combines with what is already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// Imported files replace the stored annotations of the same files.
    #[default]
    Replace,
    /// Imported annotations are added; ids already stored are skipped.
    Merge,
}

/// Outcome of an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub files: usize,
    pub added: usize,
    pub skipped: usize,
}

/// Annotations of every open document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationLibrary {
    files: BTreeMap<String, FileAnnotations>,
}

impl AnnotationLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(&self, file_id: &str) -> Option<&FileAnnotations> {
        self.files.get(file_id)
    }

    /// Annotations of `file_id`, created empty if missing.
    pub fn file_mut(&mut self, file_id: &str) -> &mut FileAnnotations {
        self.files.entry(file_id.to_string()).or_default()
    }

    pub fn remove_file(&mut self, file_id: &str) -> Option<FileAnnotations> {
        self.files.remove(file_id)
    }

    pub fn file_ids(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.values().map(FileAnnotations::len).sum()
    }

    /// Whether any file holds an annotation with this id.
    pub fn contains(&self, id: &AnnotationId) -> bool {
        self.files.values().any(|f| f.contains(id))
    }

    /// Add an annotation to `file_id`, rejecting ids already used by any file.
    pub fn insert(&mut self, file_id: &str, annotation: Annotation) -> Result<(), AnnotationError> {
        if self.contains(&annotation.id) {
            return Err(AnnotationError::DuplicateId(annotation.id));
        }
        self.file_mut(file_id).insert(annotation)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a persisted library.
    ///
    /// Only a document that is not a JSON object of files is an error. Records
    /// that fail to parse or validate, and ids already seen in any file, are
    /// dropped with a warning.
    pub fn from_json(json: &str) -> Result<Self, AnnotationError> {
        let value: Value = serde_json::from_str(json).map_err(|e| AnnotationError::Malformed(e.to_string()))?;
        let Value::Object(files) = value else {
            return Err(AnnotationError::Malformed(
                "expected an object keyed by file".to_string(),
            ));
        };

        let mut library = Self::new();
        let mut seen = HashSet::new();
        for (file_id, pages) in files {
            let Value::Object(pages) = pages else {
                log::warn!("Skipping file {file_id}: expected an object keyed by page");
                continue;
            };
            let file = library.file_mut(&file_id);
            for (key, records) in pages {
                let Some(page) = parse_page_key(&key) else {
                    log::warn!("Skipping {file_id}/{key}: not a page key");
                    continue;
                };
                let Value::Array(records) = records else {
                    log::warn!("Skipping {file_id}/{key}: expected an array");
                    continue;
                };
                for record in records {
                    let annotation = match serde_json::from_value::<Annotation>(record) {
                        Ok(a) => a,
                        Err(e) => {
                            log::warn!("Dropping unreadable annotation in {file_id}/{key}: {e}");
                            continue;
                        }
                    };
                    if annotation.page_number != page {
                        log::warn!(
                            "Annotation {} in {file_id}/{key} belongs to page {}",
                            annotation.id,
                            annotation.page_number
                        );
                    }
                    if seen.contains(&annotation.id) {
                        log::warn!("Dropping annotation in {file_id}/{key}: id {} already used", annotation.id);
                        continue;
                    }
                    let id = annotation.id.clone();
                    match file.insert(annotation) {
                        Ok(()) => {
                            seen.insert(id);
                        }
                        Err(e) => log::warn!("Dropping annotation in {file_id}/{key}: {e}"),
                    }
                }
            }
        }
        Ok(library)
    }

    /// Import a persisted library into this one without introducing
    /// duplicate ids anywhere in the library. Imported records whose id is
    /// already used by another file are skipped. Each touched file gets one
    /// undo checkpoint.
    pub fn import_json(&mut self, json: &str, mode: ImportMode) -> Result<ImportSummary, AnnotationError> {
        let incoming = Self::from_json(json)?;
        let mut summary = ImportSummary::default();

        for (file_id, imported) in incoming.files {
            summary.files += 1;
            let (accepted, skipped): (Vec<&Annotation>, Vec<&Annotation>) = match mode {
                // The replaced file's own ids are about to go away.
                ImportMode::Replace => imported.iter().partition(|a| {
                    !self
                        .files
                        .iter()
                        .any(|(other, f)| other != &file_id && f.contains(&a.id))
                }),
                ImportMode::Merge => imported.iter().partition(|a| !self.contains(&a.id)),
            };
            summary.skipped += skipped.len();
            for a in &skipped {
                log::debug!("Skipping imported annotation {}: id already stored", a.id);
            }

            let file = self.file_mut(&file_id);
            match mode {
                ImportMode::Replace => {
                    let mut replacement = FileAnnotations::new();
                    for annotation in accepted {
                        // Already validated and deduplicated by from_json.
                        if replacement.insert(annotation.clone()).is_ok() {
                            summary.added += 1;
                        }
                    }
                    file.replace_pages(replacement);
                }
                ImportMode::Merge => {
                    if accepted.is_empty() {
                        continue;
                    }
                    file.push_undo();
                    for annotation in accepted {
                        if file.insert(annotation.clone()).is_ok() {
                            summary.added += 1;
                        }
                    }
                }
            }
        }
        log::info!(
            "Imported {} annotation(s) into {} file(s), skipped {}",
            summary.added,
            summary.files,
            summary.skipped
        );
        Ok(summary)
    }
}
