//! crates/hermes_core/src/domain.rs
//!
//! Defines the pure, core data structures for the client.
//! These structs are independent of any transport or serialization format.

use std::fmt;
use std::path::PathBuf;

/// Largest document the client will stage for upload (500 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 500 * 1024 * 1024;

/// The opaque bearer token proving an authenticated session.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens must never end up in logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// One uploaded document known to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    pub id: String,
    pub display_name: String,
}

impl DocumentRecord {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// A single question-and-answer exchange in the current chat session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub question: String,
    pub answer: String,
}

impl HistoryEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// The answer to a question: one block of text, or an ordered list of pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Single(String),
    Paginated(Vec<String>),
}

impl Answer {
    /// Builds a paginated answer, collapsing an empty page list to an empty single block.
    pub fn from_pages(pages: Vec<String>) -> Self {
        if pages.is_empty() {
            Answer::Single(String::new())
        } else {
            Answer::Paginated(pages)
        }
    }

    pub fn page_count(&self) -> usize {
        match self {
            Answer::Single(_) => 1,
            Answer::Paginated(pages) => pages.len().max(1),
        }
    }

    pub fn page(&self, index: usize) -> Option<&str> {
        match self {
            Answer::Single(text) if index == 0 => Some(text),
            Answer::Single(_) => None,
            Answer::Paginated(pages) => pages.get(index).map(String::as_str),
        }
    }

    /// Flattens the answer into the text stored in history.
    pub fn to_history_text(&self) -> String {
        match self {
            Answer::Single(text) => text.clone(),
            Answer::Paginated(pages) => pages.join("\n\n"),
        }
    }
}

/// Forward/backward paging over an [`Answer`], clamped at both ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerPager {
    answer: Answer,
    index: usize,
}

impl AnswerPager {
    pub fn new(answer: Answer) -> Self {
        Self { answer, index: 0 }
    }

    pub fn answer(&self) -> &Answer {
        &self.answer
    }

    pub fn current(&self) -> &str {
        self.answer.page(self.index).unwrap_or_default()
    }

    pub fn page_index(&self) -> usize {
        self.index
    }

    pub fn page_count(&self) -> usize {
        self.answer.page_count()
    }

    pub fn next(&mut self) -> &str {
        if self.index + 1 < self.page_count() {
            self.index += 1;
        }
        self.current()
    }

    pub fn prev(&mut self) -> &str {
        self.index = self.index.saturating_sub(1);
        self.current()
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < self.page_count()
    }

    pub fn has_prev(&self) -> bool {
        self.index > 0
    }
}

/// What the backend returns for a successfully answered question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub answer: Answer,
    /// Image references as returned by the backend (usually relative paths).
    pub images: Vec<String>,
}

/// The payload of a question submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRequest {
    pub question: String,
    pub document_id: String,
    pub answer_format: String,
    pub response_language: String,
}

/// A file chosen locally, described without reading its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub name: String,
    pub size_bytes: u64,
    pub path: PathBuf,
}

impl CandidateFile {
    /// Applies the staging rules: a `.pdf` name (any case) no larger than [`MAX_UPLOAD_BYTES`].
    pub fn verdict(&self) -> CandidateVerdict {
        if !self.name.to_lowercase().ends_with(".pdf") {
            return CandidateVerdict::Rejected(RejectReason::NotPdf);
        }
        if self.size_bytes > MAX_UPLOAD_BYTES {
            return CandidateVerdict::Rejected(RejectReason::TooLarge {
                size_bytes: self.size_bytes,
            });
        }
        CandidateVerdict::Valid
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NotPdf,
    TooLarge { size_bytes: u64 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::NotPdf => f.write_str("only PDF files are allowed"),
            RejectReason::TooLarge { size_bytes } => {
                write!(f, "file is {size_bytes} bytes, the limit is {MAX_UPLOAD_BYTES}")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateVerdict {
    Valid,
    Rejected(RejectReason),
}

/// A staged, not-yet-submitted document plus its validation outcome and transfer progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCandidate {
    pub file: CandidateFile,
    pub verdict: CandidateVerdict,
    /// Transfer progress in `[0, 100]`.
    pub progress: u8,
}

impl UploadCandidate {
    pub fn new(file: CandidateFile) -> Self {
        let verdict = file.verdict();
        Self {
            file,
            verdict,
            progress: 0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.verdict == CandidateVerdict::Valid
    }
}
