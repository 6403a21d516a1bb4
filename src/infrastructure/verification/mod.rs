//! Corpus verification for synthetic test questions

mod corpus;

pub use corpus::{
    CorpusVerifier, UniqueQuestionOutcome, VerificationResult, MAX_GENERATION_ATTEMPTS,
};
