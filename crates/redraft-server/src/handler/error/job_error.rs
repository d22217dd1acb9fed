//! Conversion of processing job errors into HTTP errors.

use super::http_error::{Error as HttpError, ErrorKind};
use crate::service::JobError;

impl From<JobError> for HttpError<'static> {
    fn from(error: JobError) -> Self {
        match error {
            JobError::NotFound(id) => HttpError::not_found("processing_job", "Processing job not found")
                .with_context(format!("id: {id}")),
            JobError::Conflict { state, reason } => ErrorKind::Conflict
                .with_message(format!("Job is {state}"))
                .with_resource("processing_job")
                .with_context(reason),
            JobError::AtCapacity(capacity) => ErrorKind::TooManyRequests
                .with_message("Too many processing jobs are running")
                .with_resource("processing_job")
                .with_context(format!(
                    "All {capacity} job slots are in use; retry when a job finishes"
                )),
            JobError::Core(error) => error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn job_errors_map_to_statuses() {
        let not_found = HttpError::from(JobError::NotFound(Uuid::nil()));
        assert_eq!(not_found.kind(), ErrorKind::NotFound);

        let conflict = HttpError::from(JobError::Conflict {
            state: "completed",
            reason: "a finished job cannot be cancelled",
        });
        assert_eq!(conflict.kind(), ErrorKind::Conflict);
        assert_eq!(conflict.message(), Some("Job is completed"));

        let full = HttpError::from(JobError::AtCapacity(4));
        assert_eq!(full.kind(), ErrorKind::TooManyRequests);

        let core = HttpError::from(JobError::Core(redraft_core::Error::invalid_input()));
        assert_eq!(core.kind(), ErrorKind::BadRequest);
    }
}
