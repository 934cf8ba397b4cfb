use std::time::Duration;

use rand::seq::SliceRandom as _;

/// Latency simulated by stub mode unless overridden.
pub const DEFAULT_STUB_DELAY: Duration = Duration::from_millis(600);

/// Canned narrative continuations served in stub mode.
pub const STUB_RESPONSES: &[&str] = &[
    "The wind shifts, carrying the smell of rain and something older. Somewhere ahead, a bell tolls once and falls silent.",
    "You take a careful step forward. The floorboards answer with a long groan, and a thin line of lantern light spills from under a door you had not noticed.",
    "A figure in a frayed grey cloak watches you from the far end of the corridor. When you blink, only the echo of footsteps remains.",
    "Your hand brushes against cold stone carved with unfamiliar runes. They glow faintly, as if remembering a word you have not yet spoken.",
    "Nothing happens at first. Then, very softly, the music box on the mantel begins to play a tune you are certain you have heard before.",
];

/// Local stand-in for the generation endpoint.
#[derive(Clone, Debug)]
pub struct StubResponder {
    delay: Duration,
}

impl StubResponder {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Waits the configured delay, then picks one canned continuation.
    pub async fn respond(&self) -> String {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        STUB_RESPONSES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or("The story waits for you.")
            .to_string()
    }
}

impl Default for StubResponder {
    fn default() -> Self {
        Self::new(DEFAULT_STUB_DELAY)
    }
}
