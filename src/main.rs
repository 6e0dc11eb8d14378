use std::process::ExitCode;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    gas_forecast::logging::init_logging();

    match gas_forecast::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
