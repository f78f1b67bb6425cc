//! # Pipeline Error Types
//!
//! All errors that can cross the frame pipeline's API boundary.

use thiserror::Error;

/// Errors a command's `update` or `draw` step can report.
///
/// Any of these aborts the drain that invoked the command; the pipeline is
/// not usable for further presents after an abort.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// A named resource the command depends on could not be resolved.
    #[error("resource lookup failed: {name}")]
    ResourceMissing {
        /// The name that failed to resolve.
        name: String,
    },

    /// The backend rejected work submitted by the command.
    #[error("backend rejected command: {reason}")]
    BackendRejected {
        /// Backend-provided reason.
        reason: String,
    },

    /// Any other fatal command failure.
    #[error("command failed: {reason}")]
    Failed {
        /// Description of the failure.
        reason: String,
    },
}

/// Errors from draining the frame pipeline on the presentation thread.
///
/// All variants are fatal to the presentation thread: the driver is expected
/// to stop the loop and initiate an orderly shutdown, since continuing with
/// a broken pipeline would serve arbitrary stale frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DrainError {
    /// A command's `update` step failed. Cleanup for every command dequeued
    /// by the aborted drain has already run when this is returned.
    #[error("command update failed in frame {seq}: {source}")]
    Update {
        /// Sequence number of the frame containing the failed command.
        seq: u64,
        /// The underlying command error.
        source: CommandError,
    },

    /// A command's `draw` step failed while drawing the latest frame.
    #[error("command draw failed in frame {seq}: {source}")]
    Draw {
        /// Sequence number of the frame containing the failed command.
        seq: u64,
        /// The underlying command error.
        source: CommandError,
    },

    /// The queue was exhausted before the frame published as latest was
    /// found. The producer/consumer protocol has been violated and the
    /// pipeline cannot be trusted.
    #[error("frame {seq} was published as latest but never found in the queue")]
    FrameLost {
        /// Sequence number that was published but never drained.
        seq: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_frame() {
        let err = DrainError::Update {
            seq: 7,
            source: CommandError::ResourceMissing {
                name: "sprites/atlas0".to_string(),
            },
        };
        let text = err.to_string();
        assert!(text.contains("frame 7"), "message was: {text}");
        assert!(text.contains("sprites/atlas0"), "message was: {text}");
    }
}
