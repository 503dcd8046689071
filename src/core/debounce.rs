use std::time::Duration;

/// Delay between the last keystroke and the search request.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Hands out tickets for pending input. Only the newest ticket is current,
/// so timers started for earlier keystrokes become no-ops when they fire.
#[derive(Debug, Clone, Default)]
pub struct Debouncer {
    latest: u64,
}

impl Debouncer {
    pub fn bump(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        ticket == self.latest
    }
}

/// Resolve with `ticket` once `delay` has passed.
pub async fn settle(ticket: u64, delay: Duration) -> u64 {
    tokio::time::sleep(delay).await;
    ticket
}
