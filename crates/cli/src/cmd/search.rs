//! Search command implementation.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use serde::Serialize;
use slipbox_core::config::ResolvedConfig;
use slipbox_core::index::{
    DateDirection, DateField, Filter, FindOpts, Finder, IndexDb, IndexError, Match,
};

use crate::SearchArgs;

/// Search result for JSON output.
#[derive(Debug, Serialize)]
struct MatchOutput {
    path: String,
    title: String,
    lead: String,
    word_count: usize,
    created: String,
    modified: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    snippet: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<String, serde_json::Value>,
}

impl From<Match> for MatchOutput {
    fn from(m: Match) -> Self {
        let note = m.metadata;
        Self {
            path: note.path,
            title: note.title,
            lead: note.lead,
            word_count: note.word_count,
            created: note.created.to_rfc3339_opts(SecondsFormat::Secs, true),
            modified: note.modified.to_rfc3339_opts(SecondsFormat::Secs, true),
            snippet: m.snippet,
            metadata: note.metadata,
        }
    }
}

pub fn run(rc: &ResolvedConfig, args: SearchArgs) {
    if !rc.index_path.exists() {
        eprintln!("Error opening index: {} does not exist", rc.index_path.display());
        eprintln!("Hint: Run 'sb index' to build the index first.");
        std::process::exit(1);
    }

    let db = match IndexDb::open(&rc.index_path) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Error opening index: {}", e);
            std::process::exit(1);
        }
    };

    let opts = find_opts(&args);
    tracing::debug!("searching {} with {:?}", rc.index_path.display(), opts);
    let store = db.store();

    let result = if args.json {
        let mut output = Vec::new();
        store
            .find(&opts, |m| {
                output.push(MatchOutput::from(m));
                Ok::<_, IndexError>(())
            })
            .map(|count| {
                println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
                count
            })
    } else {
        store
            .find(&opts, |m| {
                print_match(&m);
                Ok::<_, IndexError>(())
            })
            .inspect(|&count| {
                if count == 0 {
                    println!("(no results found)");
                }
            })
    };

    if let Err(e) = result {
        eprintln!("Error searching: {}", e);
        std::process::exit(1);
    }
}

fn find_opts(args: &SearchArgs) -> FindOpts {
    let mut filters = Vec::new();

    let query = args.query.join(" ");
    if !query.trim().is_empty() {
        filters.push(Filter::Match(query));
    }
    if !args.include.is_empty() {
        filters.push(Filter::PathInclude(args.include.clone()));
    }
    if !args.exclude.is_empty() {
        filters.push(Filter::PathExclude(args.exclude.clone()));
    }

    let dates = [
        (DateField::Created, DateDirection::On, args.created),
        (DateField::Created, DateDirection::Before, args.created_before),
        (DateField::Created, DateDirection::After, args.created_after),
        (DateField::Modified, DateDirection::On, args.modified),
        (DateField::Modified, DateDirection::Before, args.modified_before),
        (DateField::Modified, DateDirection::After, args.modified_after),
    ];
    for (field, direction, day) in dates {
        if let Some(day) = day {
            filters.push(Filter::Date { field, direction, value: start_of_day(day) });
        }
    }

    FindOpts { filters, sorters: args.sort.clone(), limit: args.limit }
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

fn print_match(m: &Match) {
    let note = &m.metadata;
    let title = if note.title.is_empty() { &note.path } else { &note.title };
    println!("{}  ({})", title, note.path);
    if !m.snippet.is_empty() {
        println!("    {}", m.snippet.replace('\n', " "));
    }
}
