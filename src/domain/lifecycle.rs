//! Lifecycle guard: which actions the current snapshot permits.
//!
//! Application: `draft --submit--> sent --(admin)--> complete`, nothing leaves
//! `complete`. File: `draft --(server)--> sent --(admin)--> accepted | rejected`.
//! A rejected file frees its single-slot type for a new upload.
//!
//! Every function is pure. Callers pass the latest server snapshot and get a
//! decision back; the `check_*` variants explain a refusal, the `can_*`
//! variants answer yes or no.

use super::errors::{DomainError, DomainResult};
use super::models::{ApplicationStatus, FileRecord, FileStatus, FileType, HorseIdentity};
use super::validation::check_identity_fields;
use chrono::Datelike;

/// Calendar year used for the upper bound of the birth year.
pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

pub fn check_upload(status: ApplicationStatus, files: &[FileRecord], file_type: FileType) -> DomainResult<()> {
    if status == ApplicationStatus::Complete {
        return Err(DomainError::ApplicationComplete);
    }
    if file_type.is_single_slot()
        && files
            .iter()
            .any(|f| f.file_type == file_type && f.status != FileStatus::Rejected)
    {
        return Err(DomainError::SlotOccupied(file_type));
    }
    Ok(())
}

pub fn can_upload_type(status: ApplicationStatus, files: &[FileRecord], file_type: FileType) -> bool {
    check_upload(status, files, file_type).is_ok()
}

pub fn check_edit_metadata(status: ApplicationStatus, files: &[FileRecord]) -> DomainResult<()> {
    if status == ApplicationStatus::Complete {
        return Err(DomainError::ApplicationComplete);
    }
    if files.iter().any(|f| f.status != FileStatus::Draft) {
        return Err(DomainError::MetadataLocked);
    }
    Ok(())
}

pub fn can_edit_metadata(status: ApplicationStatus, files: &[FileRecord]) -> bool {
    check_edit_metadata(status, files).is_ok()
}

/// Submitter-side deletion. Anything else needs the administrator path.
pub fn check_delete(status: ApplicationStatus, file: &FileRecord) -> DomainResult<()> {
    if status == ApplicationStatus::Draft && file.status == FileStatus::Draft {
        Ok(())
    } else {
        Err(DomainError::NotDeletable)
    }
}

pub fn can_delete(status: ApplicationStatus, file: &FileRecord) -> bool {
    check_delete(status, file).is_ok()
}

pub fn check_submit(identity: &HorseIdentity, status: ApplicationStatus, current_year: i32) -> DomainResult<()> {
    check_identity_fields(identity, current_year)?;
    if status == ApplicationStatus::Complete {
        return Err(DomainError::ApplicationComplete);
    }
    Ok(())
}

pub fn can_submit(identity: &HorseIdentity, status: ApplicationStatus, current_year: i32) -> bool {
    check_submit(identity, status, current_year).is_ok()
}

pub fn next_status_on_admin_accept(file: &FileRecord) -> DomainResult<FileStatus> {
    match file.status {
        FileStatus::Sent => Ok(FileStatus::Accepted),
        other => Err(DomainError::NotAwaitingReview(other)),
    }
}

pub fn next_status_on_admin_reject(file: &FileRecord) -> DomainResult<FileStatus> {
    match file.status {
        FileStatus::Sent => Ok(FileStatus::Rejected),
        other => Err(DomainError::NotAwaitingReview(other)),
    }
}

pub fn can_mark_complete(status: ApplicationStatus) -> bool {
    status != ApplicationStatus::Complete
}

/// The console never shows files the submitter has not sent yet.
pub fn is_visible_to_admin(file: &FileRecord) -> bool {
    file.status != FileStatus::Draft
}

/// Every portal decision for one snapshot, computed in one go for the render layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permissions {
    pub edit_metadata: bool,
    pub submit: bool,
    upload: Vec<(FileType, bool)>,
}

impl Permissions {
    pub fn compute(
        status: ApplicationStatus,
        files: &[FileRecord],
        identity: &HorseIdentity,
        current_year: i32,
    ) -> Self {
        Self {
            edit_metadata: can_edit_metadata(status, files),
            submit: can_submit(identity, status, current_year),
            upload: FileType::ALL
                .iter()
                .map(|&t| (t, can_upload_type(status, files, t)))
                .collect(),
        }
    }

    pub fn upload(&self, file_type: FileType) -> bool {
        self.upload
            .iter()
            .find(|(t, _)| *t == file_type)
            .map(|(_, allowed)| *allowed)
            .unwrap_or(false)
    }
}
