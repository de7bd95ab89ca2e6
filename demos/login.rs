//! Login example.
//!
//! Logs in with a password and a one-time code typed on the terminal,
//! saves the session, and lists the user's contracts.
//!
//! Run with: cargo run --example login
//!
//! Set GBM_USER to the account email. GBM_PASSWORD is optional; without it
//! the password is prompted for.

use gbm::auth::StdinCodePrompt;
use gbm::{AuthClient, ClientConfig, GbmClient};

#[tokio::main]
async fn main() -> gbm::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let user = std::env::var("GBM_USER").expect("GBM_USER environment variable required");
    let config = ClientConfig::default();

    // Reuse the saved session while it is still valid
    if let Ok(client) = GbmClient::from_saved_session(&user, config.clone()) {
        if let Some(session) = client.session().filter(|s| !s.expired()) {
            println!(
                "Resuming saved session ({}s left)",
                session.remaining().num_seconds()
            );
            return list_contracts(&client).await;
        }
    }

    println!("Logging in as {}...", user);
    let session = match std::env::var("GBM_PASSWORD") {
        Ok(password) => {
            AuthClient::new(config.clone())?
                .login(&user, &password, &mut StdinCodePrompt)
                .await?
        }
        Err(_) => AuthClient::new(config.clone())?.login_interactive(&user).await?,
    };

    let client = GbmClient::with_session(session, config)?;
    let path = client.save_session()?;
    println!("Session saved to {}", path.display());

    list_contracts(&client).await
}

async fn list_contracts(client: &GbmClient) -> gbm::Result<()> {
    let contracts = client.v1().contracts().await?;
    println!("{}", serde_json::to_string_pretty(&contracts)?);
    Ok(())
}
