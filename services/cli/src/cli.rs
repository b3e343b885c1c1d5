use crate::commands::{run_availability, run_lottery, run_reservations};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use funnavi::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "funnavi",
    about = "Check availability, enter lotteries, and list reservations on fun navi",
    version
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search every configured facility and date and save the availability matrix
    Availability,
    /// Enter the lottery for every configured facility and date
    Lottery(LotteryArgs),
    /// Save upcoming reservations from the reservation history
    Reservations,
}

#[derive(Args, Debug, Default)]
pub(crate) struct GlobalArgs {
    /// Read settings from this file instead of ./.env
    #[arg(long, global = true)]
    pub(crate) env_file: Option<PathBuf>,
    /// Override OUTPUT_DIR for the CSV reports
    #[arg(long, global = true)]
    pub(crate) output_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct LotteryArgs {
    /// Reference date (YYYY/MM/DD) for the default target month. Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    funnavi::calendar::parse_date(value).map_err(|err| err.to_string())
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Availability => run_availability(&cli.global),
        Command::Lottery(args) => run_lottery(&cli.global, args),
        Command::Reservations => run_reservations(&cli.global),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_options_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "funnavi",
            "lottery",
            "--env-file",
            "lottery.env",
            "--today",
            "2024/06/15",
        ])
        .expect("arguments parse");

        assert_eq!(cli.global.env_file, Some(PathBuf::from("lottery.env")));
        match cli.command {
            Command::Lottery(args) => {
                assert_eq!(args.today, NaiveDate::from_ymd_opt(2024, 6, 15));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["funnavi"]).is_err());
        assert!(Cli::try_parse_from(["funnavi", "lottery", "--today", "2024-06-15"]).is_err());
    }
}
