use std::io::{self, IsTerminal, Read, Write};

use pgseries::plan::SqlFragment;
use pgseries::types::{DecimalValue, SeriesValue};
use pgseries::{Error, GenerateSeries, Result, SeriesRelation, generate_series};
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};
use tracing_subscriber::EnvFilter;

#[allow(clippy::print_stdout)]
fn print_banner() {
    const NAME: &str = env!("CARGO_PKG_NAME");
    const VER: &str = env!("CARGO_PKG_VERSION");
    println!("{} version {}", NAME, VER);
    println!("Enter \".help\" for usage hints.");
}

#[allow(clippy::print_stdout)]
fn print_help() {
    println!(".help              Show this message");
    println!(".rows REQUEST      Evaluate REQUEST locally and print its rows");
    println!(".count REQUEST     Print the COUNT statement for REQUEST");
    println!(".exit/.quit        Exit the REPL");
    println!("Any other line is a REQUEST, compiled and printed as SQL.");
    println!();
    println!("A REQUEST is a ';'-separated list of key=value pairs:");
    println!("  start=0; stop=9; step=2; id=true");
    println!("  start=2024-01-01; stop=2024-01-10; step=1 days; type=DateRange");
    println!("  start=0.00; stop=1.00; step=0.25; precision=9,2; bounds=[]; type=DecimalRange");
    println!("  start=1; stop=3; iterable=north,south");
    println!("Keys: start stop step span type id precision bounds iterable");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Select,
    Count,
    Rows,
}

struct SeriesRunner;

impl SeriesRunner {
    #[allow(clippy::print_stdout)]
    fn execute(&self, line: &str, output: Output) -> Result<()> {
        let series = parse_request(line)?.build()?;
        println!("-- {}", series.descriptor().name);
        match output {
            Output::Select => Self::print_statement(&series.compile()?)?,
            Output::Count => Self::print_statement(&series.count()?)?,
            Output::Rows => Self::print_rows(&series)?,
        }
        Ok(())
    }

    #[allow(clippy::print_stdout)]
    fn print_statement(statement: &SqlFragment) -> Result<()> {
        println!("{}", statement.sql);
        let params: Vec<String> = statement.params.iter().map(|p| p.to_string()).collect();
        println!("-- params: [{}]", params.join(", "));
        println!("{};", statement.interpolate()?);
        Ok(())
    }

    #[allow(clippy::print_stdout)]
    fn print_rows(series: &SeriesRelation) -> Result<()> {
        let rows = series.materialize()?;
        for row in &rows {
            let mut fields = Vec::with_capacity(3);
            if let Some(id) = row.id {
                fields.push(id.to_string());
            }
            fields.push(row.term.to_string());
            if let Some(value) = &row.value {
                fields.push(value.to_string());
            }
            println!("{}", fields.join(" | "));
        }
        println!("({} rows)", rows.len());
        Ok(())
    }
}

fn parse_request(line: &str) -> Result<GenerateSeries> {
    let mut start = None;
    let mut stop = None;
    let mut rest = Vec::new();
    for pair in line.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            Error::InvalidArgumentError(format!("expected key=value, got '{pair}'"))
        })?;
        let (key, value) = (key.trim(), value.trim());
        match key {
            "start" => start = Some(parse_value(value)),
            "stop" => stop = Some(parse_value(value)),
            _ => rest.push((key, value)),
        }
    }
    let (Some(start), Some(stop)) = (start, stop) else {
        return Err(Error::InvalidArgumentError(
            "a request needs both start and stop".into(),
        ));
    };

    let mut builder = generate_series(start, stop);
    for (key, value) in rest {
        builder = match key {
            "step" => builder.step(parse_value(value)),
            "span" => builder.span(parse_value(value)),
            "type" => builder.output_type_name(value),
            "id" => builder.include_id(matches!(value, "true" | "1" | "yes")),
            "bounds" => builder.default_bounds(value),
            "precision" => {
                let (p, s) = value.split_once(',').unwrap_or((value, "0"));
                let parse = |text: &str| {
                    text.trim().parse::<u8>().map_err(|e| {
                        Error::InvalidArgumentError(format!("bad precision '{value}': {e}"))
                    })
                };
                builder.precision(parse(p)?, parse(s)?)
            }
            "iterable" => builder.iterable(value.split(',').map(|v| parse_value(v.trim())).collect()),
            other => {
                return Err(Error::InvalidArgumentError(format!("unknown key '{other}'")));
            }
        };
    }
    Ok(builder)
}

/// Read a literal as the narrowest value it can be: boolean, integer,
/// decimal, date, timestamp, timestamp with offset, else text.
fn parse_value(text: &str) -> SeriesValue {
    if let Ok(b) = text.parse::<bool>() {
        return SeriesValue::Boolean(b);
    }
    if let Ok(i) = text.parse::<i64>() {
        return SeriesValue::Integer(i);
    }
    if let Ok(d) = text.parse::<DecimalValue>() {
        return SeriesValue::Decimal(d);
    }
    if let Ok(d) = Date::parse(text, format_description!("[year]-[month]-[day]")) {
        return SeriesValue::Date(d);
    }
    if let Ok(dt) = PrimitiveDateTime::parse(
        text,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return SeriesValue::DateTime(dt);
    }
    if let Ok(dt) = OffsetDateTime::parse(
        text,
        format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
        ),
    ) {
        return SeriesValue::DateTimeTz(dt);
    }
    SeriesValue::Text(text.to_string())
}

#[allow(clippy::print_stdout, clippy::print_stderr)]
fn repl(runner: &SeriesRunner) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    loop {
        line.clear();
        print!("pgseries> ");
        stdout.flush()?;
        if stdin.read_line(&mut line)? == 0 {
            // EOF
            println!();
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let (output, request) = if input.starts_with('.') {
            let (cmd, rest) = input.split_once(' ').unwrap_or((input, ""));
            match cmd {
                ".help" => {
                    print_help();
                    continue;
                }
                ".exit" | ".quit" => break,
                ".rows" => (Output::Rows, rest),
                ".count" => (Output::Count, rest),
                _ => {
                    println!("Unknown command: {}", cmd);
                    continue;
                }
            }
        } else {
            (Output::Select, input)
        };
        if let Err(e) = runner.execute(request, output) {
            eprintln!("Error: {}", e);
        }
    }

    Ok(())
}

#[allow(clippy::print_stderr)]
fn process_stream<R: Read>(runner: &SeriesRunner, reader: R) -> io::Result<()> {
    let mut buf = String::new();
    let mut rdr = io::BufReader::new(reader);
    rdr.read_to_string(&mut buf)?;

    for line in buf.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Err(e) = runner.execute(line, Output::Select) {
            eprintln!("Error: {}", e);
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let runner = SeriesRunner;

    // Piped input is processed as a batch of requests, one per line.
    if !io::stdin().is_terminal() {
        if let Err(e) = process_stream(&runner, io::stdin()) {
            eprintln!("Error processing stdin: {}", e);
            std::process::exit(1);
        }
        return;
    }

    print_banner();
    if let Err(e) = repl(&runner) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn literals_parse_to_the_narrowest_value() {
        assert_eq!(parse_value("12"), SeriesValue::Integer(12));
        assert_eq!(parse_value("2024-01-31"), SeriesValue::Date(date!(2024-01-31)));
        assert_eq!(parse_value("1 days"), SeriesValue::Text("1 days".into()));
        assert!(matches!(parse_value("0.25"), SeriesValue::Decimal(_)));
    }

    #[test]
    fn requests_need_start_and_stop() {
        assert!(parse_request("start=1").is_err());
        assert!(parse_request("start=1; stop=2; colour=red").is_err());
        let series = parse_request("start=0; stop=9; step=2; id=true")
            .and_then(GenerateSeries::build)
            .unwrap();
        assert_eq!(series.descriptor().name, "IntegerSeriesId");
    }
}
