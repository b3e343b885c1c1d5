use funnavi::config::{ConfigError, SessionConfig};
use funnavi::error::AppError;
use funnavi::workflows::Credentials;
use std::io::{self, BufRead, Write};

/// Configured credentials, prompting on the terminal for whichever is missing.
pub(crate) fn credentials(session: &SessionConfig) -> Result<Credentials, AppError> {
    let user_id = match &session.user_id {
        Some(user_id) => user_id.clone(),
        None => non_empty("USER_ID", read_line("User ID: ")?)?,
    };
    let password = match &session.password {
        Some(password) => password.clone(),
        None => secret("PASSWORD", rpassword::prompt_password("Password: ")?)?,
    };

    Ok(Credentials { user_id, password })
}

fn read_line(label: &str) -> io::Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{label}")?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

fn non_empty(key: &str, value: String) -> Result<String, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::Missing {
            key: key.to_string(),
        });
    }
    Ok(value.to_string())
}

/// Passwords are kept exactly as typed; only an empty answer is refused.
fn secret(key: &str, value: String) -> Result<String, ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Missing {
            key: key.to_string(),
        });
    }
    Ok(value)
}
