use super::WorkflowError;
use crate::browser::{BrowserError, BrowserSession, Selector, SiteSelectors, WaitCondition};
use std::fmt;
use std::time::Duration;
use tracing::{error, info};

/// Site account used for the login form.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user_id: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("password", &"***")
            .finish()
    }
}

/// Signs in and waits for the post-login page. Failure is fatal for a run.
pub fn login<S>(
    session: &mut S,
    site: &SiteSelectors,
    login_url: &str,
    credentials: &Credentials,
    timeout: Duration,
) -> Result<(), WorkflowError>
where
    S: BrowserSession + ?Sized,
{
    let attempt = |session: &mut S| -> Result<(), BrowserError> {
        session.navigate(login_url)?;
        session.wait_until(&WaitCondition::Present(site.login_user_id.clone()), timeout)?;
        session.type_text(&site.login_user_id, &credentials.user_id)?;
        session.type_text(&site.login_password, &credentials.password)?;
        session.click(&site.login_submit)?;
        session.wait_until(
            &WaitCondition::UrlContains(site.login_success_url.clone()),
            timeout,
        )
    };

    match attempt(session) {
        Ok(()) => {
            info!(user_id = %credentials.user_id, "login succeeded");
            Ok(())
        }
        Err(err) => {
            error!(error = %err, "login failed");
            Err(WorkflowError::Login(err))
        }
    }
}

/// Waits for the loading overlay to clear, then clicks `target` once it is
/// clickable.
pub fn advance<S>(
    session: &mut S,
    site: &SiteSelectors,
    target: &Selector,
    timeout: Duration,
) -> Result<(), BrowserError>
where
    S: BrowserSession + ?Sized,
{
    session.wait_until(&WaitCondition::Hidden(site.loading.clone()), timeout)?;
    session.wait_until(&WaitCondition::Clickable(target.clone()), timeout)?;
    session.click(target)
}

/// Opens the reservation history list from the post-login menu.
pub fn open_reservation_history<S>(
    session: &mut S,
    site: &SiteSelectors,
    timeout: Duration,
) -> Result<(), WorkflowError>
where
    S: BrowserSession + ?Sized,
{
    advance(session, site, &site.history_menu, timeout).map_err(|source| {
        error!(error = %source, "could not open reservation history");
        WorkflowError::Navigation {
            page: "reservation history",
            source,
        }
    })?;
    info!("opened reservation history");
    Ok(())
}
