pub mod domain;
pub mod ports;

pub use domain::{
    Answer, AnswerPager, CandidateFile, CandidateVerdict, ChatReply, Credential, DocumentRecord,
    HistoryEntry, QuestionRequest, RejectReason, UploadCandidate, MAX_UPLOAD_BYTES,
};
pub use ports::{
    AuthService, ChatService, DocumentService, DurableStorage, OptionsService, PortError,
    PortResult, ProgressReporter,
};
