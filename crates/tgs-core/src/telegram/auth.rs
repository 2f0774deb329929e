//! Interactive login for a fresh session.
//!
//! Prompts go to stderr so stdout only ever carries the JSON result.

use grammers_client::types::User;
use grammers_client::{Client, SignInError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::CoreError;

/// Log in with a phone number, login code, and optional 2FA password.
///
/// `phone` skips the phone prompt when already known.
///
/// # Errors
///
/// Returns an error if a prompt cannot be read or Telegram rejects the login.
pub async fn sign_in(client: &Client, phone: Option<&str>) -> Result<User, CoreError> {
    let phone = match phone {
        Some(phone) => phone.to_string(),
        None => prompt("Phone number (international format): ").await?,
    };

    let token = client
        .request_login_code(&phone)
        .await
        .map_err(|e| CoreError::Auth(format!("requesting login code: {e}")))?;
    let code = prompt("Login code: ").await?;

    match client.sign_in(&token, &code).await {
        Ok(user) => Ok(user),
        Err(SignInError::PasswordRequired(password_token)) => {
            let password = prompt("Two-step verification password: ").await?;
            client
                .check_password(password_token, password.as_bytes())
                .await
                .map_err(|e| CoreError::Auth(format!("checking password: {e}")))
        }
        Err(e) => Err(CoreError::Auth(format!("signing in: {e}"))),
    }
}

/// Ask on stderr and wait for one line on stdin without blocking the runtime,
/// so an interrupt can still win the race while the user is typing.
async fn prompt(message: &str) -> Result<String, CoreError> {
    let mut stderr = tokio::io::stderr();
    stderr.write_all(message.as_bytes()).await?;
    stderr.flush().await?;

    read_answer(&mut BufReader::new(tokio::io::stdin())).await
}

async fn read_answer<R>(reader: &mut R) -> Result<String, CoreError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    reader.read_line(&mut line).await?;
    let answer = clean_answer(&line);
    if answer.is_empty() {
        return Err(CoreError::Auth("no input given".to_string()));
    }
    Ok(answer)
}

fn clean_answer(line: &str) -> String {
    line.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn answers_are_trimmed() {
        assert_eq!(clean_answer("  12345\r\n"), "12345");
        assert_eq!(clean_answer("\n"), "");
    }

    #[tokio::test]
    async fn answer_is_read_from_one_line() {
        let mut input = BufReader::new(&b"  +15551234567\r\nignored\n"[..]);
        let answer = read_answer(&mut input).await.expect("answer");
        assert_eq!(answer, "+15551234567");
    }

    #[tokio::test]
    async fn closed_input_is_an_auth_error() {
        let mut input = BufReader::new(&b""[..]);
        let err = read_answer(&mut input).await.expect_err("no input");
        assert_eq!(err.kind(), "AuthError");
    }

    #[tokio::test]
    async fn waiting_for_input_yields_to_an_interrupt() {
        // Writer half stays open, so the line never arrives.
        let (_typing, pending) = tokio::io::duplex(64);
        let mut input = BufReader::new(pending);

        let interrupted = tokio::select! {
            _ = read_answer(&mut input) => false,
            () = tokio::time::sleep(Duration::from_millis(50)) => true,
        };
        assert!(interrupted);
    }
}
