//! Binary entrypoint that launches the recent-chats service.

use std::process::ExitCode;

use recent_chats::start_recent_chats;

/// Start the feed and the HTTP bridge for the configured local user.
fn main() -> ExitCode {
    start_recent_chats::run()
}
