use anyhow::Context;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailPurpose {
    Signup,
    PasswordReset,
}

impl EmailPurpose {
    fn subject(&self) -> &'static str {
        match self {
            EmailPurpose::Signup => "Verify Your Email - Huts & Farms",
            EmailPurpose::PasswordReset => "Password Reset Code - Huts & Farms",
        }
    }
}

#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send_code(&self, to: &str, code: &str, purpose: EmailPurpose) -> anyhow::Result<()>;
}

/// 6-digit numeric code, 100000..=999999.
pub fn generate_code() -> String {
    let n = uuid::Uuid::new_v4().as_u128() % 900_000;
    format!("{}", 100_000 + n)
}

/// Sends through an HTTP email API (Mailgun-style JSON endpoint).
pub struct HttpEmailProvider {
    api_url: String,
    api_key: String,
    from: String,
    client: reqwest::Client,
}

impl HttpEmailProvider {
    pub fn new(api_url: String, api_key: String, from: String) -> Self {
        Self {
            api_url,
            api_key,
            from,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl EmailProvider for HttpEmailProvider {
    async fn send_code(&self, to: &str, code: &str, purpose: EmailPurpose) -> anyhow::Result<()> {
        anyhow::ensure!(!self.api_url.is_empty(), "EMAIL_API_URL is not configured");

        let text = format!(
            "Your {} code for Huts & Farms is: {code}\n\nThis code will expire in 10 minutes.",
            match purpose {
                EmailPurpose::Signup => "verification",
                EmailPurpose::PasswordReset => "password reset",
            }
        );

        self.client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "from": self.from,
                "to": to,
                "subject": purpose.subject(),
                "text": text,
            }))
            .send()
            .await
            .context("failed to reach email API")?
            .error_for_status()
            .context("email API returned error")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(code.as_bytes()[0], b'0');
        }
    }
}
