//! CLI command implementations.

use std::io::{self, Read};

use qdl::{parse_query_with, Config, OutputFormat, Query, SyntaxError, TrailingContent};

/// Use the argument if given, otherwise read all of stdin.
fn input_or_stdin(arg: Option<&str>) -> io::Result<String> {
    match arg {
        Some(text) => Ok(text.to_string()),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Print the failing line with a caret under the error position.
fn report_syntax_error(source: &str, err: &SyntaxError) {
    eprintln!("{}", err.excerpt(source));
}

/// Parse a query and print it as canonical text or JSON.
pub fn parse(query: Option<&str>, format: Option<&str>, allow_trailing: bool) -> qdl::Result<()> {
    let config = Config::load()?;
    let source = input_or_stdin(query)?;

    let mut options = config.parse_options();
    if allow_trailing {
        options.trailing = TrailingContent::Ignore;
    }

    let parsed = match parse_query_with(&source, &options) {
        Ok(q) => q,
        Err(e) => {
            report_syntax_error(&source, &e);
            return Err(e.into());
        }
    };

    let output = match format {
        Some(f) => f.parse::<OutputFormat>()?,
        None => config.output,
    };
    print_query(&parsed, output, config.pretty_json)
}

fn print_query(query: &Query, output: OutputFormat, pretty: bool) -> qdl::Result<()> {
    match output {
        OutputFormat::Text => println!("{}", query),
        OutputFormat::Json => {
            let json = if pretty {
                serde_json::to_string_pretty(query)?
            } else {
                serde_json::to_string(query)?
            };
            println!("{}", json);
        }
    }
    Ok(())
}

/// Read a JSON query and print its canonical text.
pub fn format(file: Option<&str>) -> qdl::Result<()> {
    let contents = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => input_or_stdin(None)?,
    };
    let query: Query = serde_json::from_str(&contents)?;
    log::debug!("formatting query '{}' (depth {})", query.object_type(), query.depth());
    println!("{}", query);
    Ok(())
}

/// Check that a query parses under the configured policy.
///
/// With `quiet`, nothing is printed here; the caller decides how to report.
pub fn check(query: Option<&str>, quiet: bool) -> qdl::Result<()> {
    let config = Config::load()?;
    let source = input_or_stdin(query)?;

    match parse_query_with(&source, &config.parse_options()) {
        Ok(_) => {
            if !quiet {
                println!("ok");
            }
            Ok(())
        }
        Err(e) => {
            if !quiet {
                report_syntax_error(&source, &e);
            }
            Err(e.into())
        }
    }
}

/// Print the resolved config, optionally writing defaults first.
pub fn config(init: bool) -> qdl::Result<()> {
    let config = Config::load()?;

    if init {
        if config.config_path().exists() {
            eprintln!("Config already exists at {}", config.config_path().display());
        } else {
            config.save()?;
            eprintln!("Wrote {}", config.config_path().display());
        }
    }

    println!("# {}", config.config_path().display());
    print!("{}", config.to_toml()?);
    Ok(())
}
