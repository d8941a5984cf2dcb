use super::models::{FileStatus, FileType};
use thiserror::Error;

/// Failures detected locally, before any request is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Fill in the horse name (Russian or English)")]
    MissingName,
    #[error("The Russian name may contain only Cyrillic letters")]
    InvalidRussianName,
    #[error("The English name may contain only Latin letters")]
    InvalidEnglishName,
    #[error("Horse year must be between {min} and {max}")]
    InvalidYear { min: i32, max: i32 },
    #[error("Forbidden file extension: {0}")]
    ForbiddenExtension(String),
    #[error("File is too large (max 200 MB): {0}")]
    FileTooLarge(String),
    #[error("The application is complete, no files can be added")]
    ApplicationComplete,
    #[error("A {0} file that was not rejected is already attached")]
    SlotOccupied(FileType),
    #[error("Name and year are locked once files have been sent")]
    MetadataLocked,
    #[error("Only draft files of a draft application can be deleted")]
    NotDeletable,
    #[error("Only sent files can be reviewed (file is {0})")]
    NotAwaitingReview(FileStatus),
}

pub type DomainResult<T> = Result<T, DomainError>;
