use crate::cli::{GlobalArgs, LotteryArgs};
use crate::prompt;
use chrono::Local;
use funnavi::browser::{ChromiumSession, SiteSelectors, Timeouts};
use funnavi::calendar::{format_date, resolve};
use funnavi::config::{load_env_file, AppConfig, AvailabilityConfig, EnvSource, LotteryConfig};
use funnavi::error::AppError;
use funnavi::report::ReportWriter;
use funnavi::telemetry;
use funnavi::workflows::{
    apply_lottery_batch, check_availability, login, open_reservation_history, search_keys,
    AvailabilityProbe, Credentials, LotteryApplier, ReservationHistoryFetcher, ReservationStatus,
    SearchInputCache,
};
use tracing::{info, warn};

/// Loads the env file and shared settings, then starts logging.
fn prepare(global: &GlobalArgs) -> Result<AppConfig, AppError> {
    load_env_file(global.env_file.as_deref())?;
    let mut config = AppConfig::from_source(&EnvSource)?;
    if let Some(output_dir) = &global.output_dir {
        config.output_dir = output_dir.clone();
    }

    telemetry::init(&config.telemetry)?;
    Ok(config)
}

/// Launches the browser, signs in, runs `job`, and closes the browser
/// whatever the job returned.
fn with_session<T, F>(config: &AppConfig, credentials: &Credentials, job: F) -> Result<T, AppError>
where
    F: FnOnce(&mut ChromiumSession, &SiteSelectors, Timeouts) -> Result<T, AppError>,
{
    let site = SiteSelectors::default();
    let timeouts = Timeouts::default();

    let mut session = ChromiumSession::launch(&config.session.launch)?;
    let result = login(
        &mut session,
        &site,
        &config.session.login_url,
        credentials,
        timeouts.general,
    )
    .map_err(AppError::from)
    .and_then(|()| job(&mut session, &site, timeouts));

    if let Err(err) = session.close() {
        warn!(error = %err, "browser did not shut down cleanly");
    }
    result
}

pub(crate) fn run_availability(global: &GlobalArgs) -> Result<(), AppError> {
    let config = prepare(global)?;
    let job = AvailabilityConfig::from_source(&EnvSource)?;

    let dates = resolve(&job.range, &job.policy);
    info!(
        start = %format_date(job.range.start()),
        end = %format_date(job.range.end()),
        dates = dates.len(),
        facilities = job.facilities.len(),
        "availability search planned"
    );
    let keys = search_keys(&dates, &job.facilities);

    let credentials = prompt::credentials(&config.session)?;
    let matrix = with_session(&config, &credentials, |session, site, timeouts| {
        let probe = AvailabilityProbe::new(site.clone(), timeouts);
        let mut cache = SearchInputCache::new();
        Ok(check_availability(session, &probe, &mut cache, &keys))
    })?;

    let path = ReportWriter::new(&config.output_dir).availability(&matrix)?;
    info!(path = %path.display(), "availability matrix saved");
    Ok(())
}

pub(crate) fn run_lottery(global: &GlobalArgs, args: LotteryArgs) -> Result<(), AppError> {
    let config = prepare(global)?;
    let job = LotteryConfig::from_source(&EnvSource)?;

    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let range = job.target_range(today);
    let dates = resolve(&range, &job.policy);
    info!(
        start = %format_date(range.start()),
        end = %format_date(range.end()),
        dates = dates.len(),
        facilities = job.facilities.len(),
        "lottery applications planned"
    );
    let keys = search_keys(&dates, &job.facilities);

    let credentials = prompt::credentials(&config.session)?;
    let outcomes = with_session(&config, &credentials, |session, site, timeouts| {
        let applier = LotteryApplier::new(site.clone(), timeouts);
        let mut cache = SearchInputCache::new();
        Ok(apply_lottery_batch(
            session,
            &applier,
            &mut cache,
            &keys,
            &job.contact_phone,
        ))
    })?;

    let submitted = outcomes
        .iter()
        .filter(|outcome| outcome.status == ReservationStatus::Submitted)
        .count();
    let already_applied = outcomes
        .iter()
        .filter(|outcome| outcome.status == ReservationStatus::AlreadyApplied)
        .count();
    info!(
        submitted,
        already_applied,
        failed = outcomes.len() - submitted - already_applied,
        "lottery run finished"
    );

    let path = ReportWriter::new(&config.output_dir).outcomes(&outcomes)?;
    info!(path = %path.display(), "lottery results saved");
    Ok(())
}

pub(crate) fn run_reservations(global: &GlobalArgs) -> Result<(), AppError> {
    let config = prepare(global)?;

    let credentials = prompt::credentials(&config.session)?;
    let records = with_session(&config, &credentials, |session, site, timeouts| {
        open_reservation_history(session, site, timeouts.general)?;
        let fetcher = ReservationHistoryFetcher::new(site.clone(), timeouts);
        Ok(fetcher.fetch_future(session, Local::now().naive_local()))
    })?;

    info!(reservations = records.len(), "upcoming reservations collected");
    let path = ReportWriter::new(&config.output_dir).history(&records)?;
    info!(path = %path.display(), "reservation history saved");
    Ok(())
}
