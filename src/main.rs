use meshlint::cli;

fn main() {
    // Load .env file if it exists (optional - won't fail if missing)
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    if let Err(error) = cli::run_cli() {
        eprintln!("Error: {:#}", error);
        std::process::exit(cli::exit_code(&error));
    }
}
