// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Galatea CLI entrypoint.
//!
//! Loads an ANTLR-style grammar file, restores any persisted sample input
//! and start rule for it, and runs the interactive preview TUI.

use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_DEBOUNCE_MS: u64 = 250;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} <grammar-file> [--input <file>] [--start-rule <name>] [--settings <path>] [--durable-writes] [--debounce-ms <n>]\n\nInterprets the grammar and previews parse trees live in a terminal UI.\n\nThe grammar key is the grammar file's stem. With --settings <path> the\nsample input and start rule are persisted under that key in a JSON\nsettings file; without it, state lives in memory only.\n\n--input seeds the sample text from a file instead of the persisted value.\n--start-rule overrides the persisted start rule.\n--durable-writes opts into slower, best-effort durable persistence (fsync/sync where supported); requires --settings.\n--debounce-ms sets the reparse debounce window in milliseconds (default {DEFAULT_DEBOUNCE_MS})."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    grammar_file: Option<String>,
    input_file: Option<String>,
    start_rule: Option<String>,
    settings_path: Option<String>,
    debounce_ms: Option<u64>,
    durable_writes: bool,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--input" => {
                if options.input_file.is_some() {
                    return Err(());
                }
                let file = args.next().ok_or(())?;
                options.input_file = Some(file);
            }
            "--start-rule" => {
                if options.start_rule.is_some() {
                    return Err(());
                }
                let rule = args.next().ok_or(())?;
                options.start_rule = Some(rule);
            }
            "--settings" => {
                if options.settings_path.is_some() {
                    return Err(());
                }
                let path = args.next().ok_or(())?;
                options.settings_path = Some(path);
            }
            "--debounce-ms" => {
                if options.debounce_ms.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                let millis: u64 = raw.parse().map_err(|_| ())?;
                options.debounce_ms = Some(millis);
            }
            "--durable-writes" => {
                if options.durable_writes {
                    return Err(());
                }
                options.durable_writes = true;
            }
            _ if arg.starts_with('-') => return Err(()),
            _ => {
                if options.grammar_file.is_some() {
                    return Err(());
                }
                options.grammar_file = Some(arg);
            }
        }
    }

    if options.grammar_file.is_none() {
        return Err(());
    }

    if options.durable_writes && options.settings_path.is_none() {
        return Err(());
    }

    Ok(options)
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "galatea".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        let grammar_file = options.grammar_file.ok_or("missing grammar file")?;
        let grammar_source = std::fs::read_to_string(&grammar_file)?;
        let stem = Path::new(&grammar_file)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or("grammar file has no usable name")?;
        let key = galatea::model::GrammarKey::new(stem)?;

        let store: Arc<dyn galatea::store::SettingsStore> = match options.settings_path {
            Some(path) => {
                let settings = galatea::store::JsonFileSettings::open(path)?;
                let settings = if options.durable_writes {
                    settings.with_durability(galatea::store::WriteDurability::Durable)
                } else {
                    settings
                };
                Arc::new(settings)
            }
            None => Arc::new(galatea::store::MemorySettings::new()),
        };

        let registry = galatea::registry::SessionRegistry::new(store);
        let session = registry.get_or_create(&key);
        session.apply_grammar_source(&grammar_source);

        if let Some(rule) = options.start_rule {
            session.set_start_rule(Some(rule.into()));
        }
        if let Some(path) = options.input_file {
            let text = std::fs::read_to_string(&path)?;
            session.set_input(galatea::model::InputSource::File { path, text });
        }

        let bus = Arc::new(galatea::event::EventBus::new());
        let debounce = Duration::from_millis(options.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS));
        let scheduler = galatea::reparse::ReparseScheduler::new(
            debounce,
            galatea::interp::InterpretOptions::default(),
            bus.clone(),
            |_, _| {},
        );

        galatea::tui::run(session, scheduler, bus)?;

        // Removing the session writes its sample input and start rule through the store.
        registry.remove(&key)?;

        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("galatea: {err}");
        std::process::exit(1);
    }
}
