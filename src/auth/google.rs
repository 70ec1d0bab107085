use serde::Deserialize;

/// Claims extracted from a verified Google ID token.
#[derive(Debug, Deserialize)]
pub struct GoogleClaims {
    pub aud: String,
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Verify a Google ID token against the tokeninfo endpoint.
///
/// The endpoint validates signature and expiry; the audience is checked
/// here against the configured OAuth client id. Attempted exactly once,
/// with a bounded timeout.
pub async fn verify_id_token(
    id_token: &str,
    expected_client_id: &str,
) -> Result<GoogleClaims, anyhow::Error> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()?;

    let response = client
        .get("https://oauth2.googleapis.com/tokeninfo")
        .query(&[("id_token", id_token)])
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Google tokeninfo rejected token ({}): {}", status, body);
    }

    let claims: GoogleClaims = response.json().await?;

    if claims.aud != expected_client_id {
        anyhow::bail!("Google ID token audience mismatch");
    }

    Ok(claims)
}
