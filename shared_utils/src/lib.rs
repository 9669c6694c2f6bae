//! Shared Utilities for the tx-converter tools
//!
//! Tool-agnostic plumbing used by the converter binary:
//! - File collection and batch result accounting
//! - Logging (stderr + rolling log file) and external tool call records
//! - Progress bars and the end-of-run summary report
//! - Thread budgeting for external-process workloads
//! - Dangerous directory detection before destructive operations
//! - Child process execution with output draining and cancellation

pub mod batch;
pub mod common_utils;
pub mod logging;
pub mod process_runner;
pub mod progress;
pub mod report;
pub mod safety;
pub mod thread_manager;

pub use batch::{collect_files, collect_files_sorted, BatchResult};
pub use common_utils::{format_command_string, get_extension_lowercase, has_extension};
pub use process_runner::{run_command, CancelToken, ManagedProcess, ProcessOutput};
pub use progress::{
    create_progress_bar, create_spinner, format_bytes, format_duration, is_quiet_mode,
    set_quiet_mode,
};
pub use report::{print_simple_summary, print_summary_report};
pub use safety::{check_dangerous_directory, SafetyError};
pub use thread_manager::{get_balanced_thread_config, ThreadAllocation};
