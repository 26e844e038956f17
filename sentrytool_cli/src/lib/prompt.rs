//! Interactive prompts

use anyhow::Result;
use inquire::Confirm;

/// Ask a yes/no question. Anything but an explicit yes is a no.
pub(crate) fn ask_yn(question: &str) -> Result<bool> {
    Ok(Confirm::new(question).with_default(false).prompt()?)
}
