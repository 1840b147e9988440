//! gh-auth - Resolve GitHub API credentials
//!
//! This is the main entry point for the CLI application.

#[tokio::main]
async fn main() {
  gh_auth::cli::run().await;
}
