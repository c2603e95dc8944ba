use crate::domain::model::{FetchState, Movie};
use crate::utils::error::Result;
use std::io::Write;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

pub fn write_movies<W: Write>(out: &mut W, movies: &[Movie], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => write_table(out, movies),
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, movies)?;
            writeln!(out)?;
            Ok(())
        }
        OutputFormat::Csv => write_csv(out, movies),
    }
}

/// One line per movie: title, then the remaining scalar fields.
fn write_table<W: Write>(out: &mut W, movies: &[Movie]) -> Result<()> {
    for (i, movie) in movies.iter().enumerate() {
        let details: Vec<String> = movie
            .0
            .as_object()
            .into_iter()
            .flatten()
            .filter(|(key, value)| {
                !Movie::TITLE_KEYS.contains(&key.as_str()) && !value.is_object() && !value.is_array()
            })
            .map(|(key, _)| format!("{}: {}", key, movie.text(key)))
            .collect();

        writeln!(
            out,
            "{:>3}. {}{}",
            i + 1,
            movie.title().unwrap_or("(untitled)"),
            if details.is_empty() {
                String::new()
            } else {
                format!("  [{}]", details.join(", "))
            }
        )?;
    }
    writeln!(out, "{} movie(s)", movies.len())?;
    Ok(())
}

/// Columns are every key seen, in order of first appearance.
fn write_csv<W: Write>(out: &mut W, movies: &[Movie]) -> Result<()> {
    let mut columns: Vec<&str> = Vec::new();
    for movie in movies {
        if let Some(object) = movie.0.as_object() {
            for key in object.keys() {
                if !columns.contains(&key.as_str()) {
                    columns.push(key);
                }
            }
        }
    }

    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(&columns)?;
    for movie in movies {
        writer.write_record(columns.iter().map(|column| movie.text(column)))?;
    }
    writer.flush()?;
    Ok(())
}

/// Human summary of a state snapshot, used for progress lines.
pub fn describe_state(state: &FetchState) -> String {
    match (&state.error, state.loading) {
        (_, true) if state.movies.is_empty() => "Loading movies...".to_string(),
        (_, true) => format!("Refreshing {} movie(s)...", state.movies.len()),
        (Some(error), false) => error.clone(),
        (None, false) => format!("{} movie(s)", state.movies.len()),
    }
}
