use sqlscope::*;
use std::io::Read as _;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok((rendered, problems)) => {
            println!("{rendered}");
            for problem in &problems {
                eprintln!("{problem}");
            }
            match problems.is_empty() {
                true => ExitCode::SUCCESS,
                false => ExitCode::FAILURE,
            }
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

/// Reads one statement from the first argument or stdin and renders it
/// canonically. With a configured catalog the statement is also validated
/// under the configured access policy.
fn run() -> Result<(String, Vec<ValidationProblem>)> {
    let sql = match std::env::args().nth(1) {
        Some(sql) => sql,
        None => {
            let mut sql = String::new();
            std::io::stdin().read_to_string(&mut sql)?;
            sql
        }
    };
    let config = config()?;
    let dialect = config.dialect()?;
    tracing::debug!(%dialect, "parsing statement");
    let query = Parser::new(dialect).query(&sql)?;

    let schema = config.schema()?;
    let problems = match schema.tables().is_empty() {
        true => Vec::new(),
        false => Validator::new(&schema, dialect)
            .with_policy(config.policy()?)
            .validate(&query),
    };
    Ok((query.to_string(), problems))
}
