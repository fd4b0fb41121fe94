//! Console UI utilities shared by the host console and the client.

use std::io::Write;

/// Prompt shown on the host console and the client console
pub const PROMPT: &str = "> ";

/// Redisplay the prompt after printing a line over it
pub fn redisplay_prompt() {
    print!("{}", PROMPT);
    std::io::stdout().flush().ok();
}
