//! sentrytool: command-line interface to Apache Sentry
//!

#![deny(missing_docs)]

use anyhow::Result;
use sentrytool_lib::cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    cli().await
}
