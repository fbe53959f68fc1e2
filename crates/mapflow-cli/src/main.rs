use clap::Parser;
use mapflow_cli::{run, Cli};

fn main() {
    // .env may carry DATABASE_URL
    let _ = dotenvy::dotenv();
    env_logger::init();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(if e.use_stderr() { 2 } else { 0 });
        }
    };
    match run(cli.command) {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
        }
        Err(e) => {
            eprintln!("[mapflow-cli] {e}");
            std::process::exit(e.exit_code());
        }
    }
}
