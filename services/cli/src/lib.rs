mod cli;
mod commands;
mod prompt;

use funnavi::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
