//! Query command - search the library once.

use crate::app::App;
use crate::render::{summary, Detail, FieldStyle};
use crate::OutputFormat;
use quarry_core::{Config, SearchOutcome, SearchTerms};
use std::io::IsTerminal;
use std::time::Instant;

/// Run the query command.
pub fn run(
    config: Config,
    terms: &[String],
    limit: Option<usize>,
    output: OutputFormat,
) -> anyhow::Result<()> {
    let app = App::new(config)?;

    if let Some(limit) = limit {
        app.library.set_max_results(limit);
    }

    let terms = SearchTerms::parse(&terms.join(" "));

    let start = Instant::now();
    let outcome = app.library.search(&terms);
    let elapsed = start.elapsed();

    match output {
        OutputFormat::Text => {
            print_text(&outcome, std::io::stdout().is_terminal());

            eprintln!();
            eprintln!(
                "{} in {:.3}ms",
                summary(&outcome),
                elapsed.as_secs_f64() * 1000.0
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&to_json(&outcome))?);
        }
    }

    Ok(())
}

/// Print each result as a styled name over its detail line.
pub fn print_text(outcome: &SearchOutcome, styled: bool) {
    for result in &outcome.results {
        let style = FieldStyle::of(result.field);
        let detail = Detail::of(result);
        if styled {
            println!("{}", style.ansi(&result.name));
            println!("    {}", detail.ansi());
        } else {
            println!("{}", style.apply(&result.name));
            println!("    {}", detail);
        }
    }
}

fn to_json(outcome: &SearchOutcome) -> serde_json::Value {
    serde_json::json!({
        "results": outcome.results,
        "shown": outcome.shown(),
        "hidden": outcome.hidden,
        "total": outcome.total(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::{Field, Library, MediaRecord};

    #[test]
    fn test_json_shape() {
        let library = Library::default();
        library.rebuild(&vec![
            MediaRecord::new("Jazz", "Mingus", "Ah Um", "Fables"),
            MediaRecord::new("Jazz", "Mingus", "Ah Um", "Boogie"),
        ]);
        library.set_max_results(1);

        let value = to_json(&library.search_text("ah um"));
        assert_eq!(value["shown"], 1);
        assert_eq!(value["total"], 3);
        assert_eq!(value["hidden"], 2);

        let first = &value["results"][0];
        assert_eq!(first["field"], Field::Album.as_str());
        assert_eq!(first["name"], "Ah Um");
        assert_eq!(first["matches"], serde_json::json!([0, 1]));
        assert_eq!(first["ancestors"][0]["name"], "Mingus");
    }
}
