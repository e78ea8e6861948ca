use clap::Parser;
use colored::*;
use directories::ProjectDirs;
use std::path::PathBuf;

use localnoteapp::backup;
use localnoteapp::config::{ConfigStore, ConfigUpdate, StorageType};
use localnoteapp::migration::MigrationEngine;
use localnoteapp::model::{parse_note_id, Note, NoteUpdate};
use localnoteapp::service::StorageService;
use localnoteapp::store::{providers, FsBackendFactory, StoragePaths};
use localnoteapp::{NoteError, Result};

mod args;
use args::{Cli, Commands};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let root = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    let paths = StoragePaths::new(root);
    let config = ConfigStore::new(paths.config_file());
    let service = StorageService::new(config, FsBackendFactory::new(paths));

    if let Err(e) = run(&service, cli) {
        eprintln!("{} {}", "Error:".red(), e);
        std::process::exit(1);
    }
}

fn default_data_dir() -> PathBuf {
    let proj_dirs = ProjectDirs::from("com", "localnote", "localnote")
        .expect("Could not determine data dir");
    proj_dirs.data_dir().to_path_buf()
}

fn run(service: &StorageService<FsBackendFactory>, cli: Cli) -> Result<()> {
    match cli.command {
        Commands::New { title, content } => {
            let note = service.create(&title, &content)?;
            println!("Note created: {} ({})", note.title.green(), note.id);
        }

        Commands::List { search } => {
            let notes = match search {
                Some(term) => service.search(&term)?,
                None => service.list()?,
            };
            print_notes(&notes);
        }

        Commands::Show { id } => {
            let id = parse_note_id(&id)?;
            match service.get(&id)? {
                Some(note) => print_note(&note),
                None => println!("{}", "Note not found.".yellow()),
            }
        }

        Commands::Edit { id, title, content } => {
            let id = parse_note_id(&id)?;
            let changes = NoteUpdate { title, content };
            let note = service.update(&id, &changes)?;
            println!("Note updated: {}", note.title.green());
        }

        Commands::Delete { id } => {
            let id = parse_note_id(&id)?;
            service.delete(&id)?;
            println!("Note deleted.");
        }

        Commands::Search { term } => {
            print_notes(&service.search(&term)?);
        }

        Commands::Storage => {
            let engine = MigrationEngine::new(service);
            let health = engine.validate();

            for provider in providers(service.factory()) {
                let marker = if provider.storage_type == health.storage_type {
                    "*"
                } else {
                    " "
                };
                let availability = if provider.available {
                    String::new()
                } else {
                    " (unavailable)".to_string()
                };
                println!(
                    "{} {:<10} {}{}",
                    marker,
                    provider.storage_type.to_string().bold(),
                    provider.description,
                    availability.red()
                );
            }

            let status = if health.is_valid {
                "ok".green()
            } else {
                "unreadable".red()
            };
            println!("\n{} notes, storage {}", health.note_count, status);
        }

        Commands::Migrate { target } => {
            let target: StorageType = target.parse()?;
            if !service.is_available(target) {
                return Err(NoteError::Validation(format!(
                    "Storage {} is not available on this system",
                    target
                )));
            }
            MigrationEngine::new(service).migrate_to(target)?;
            println!("Notes now stored in {}.", target.to_string().green());
        }

        Commands::Export { output } => {
            let document = backup::export(service)?;
            let path = output
                .unwrap_or_else(|| PathBuf::from(backup::backup_filename(document.timestamp)));
            std::fs::write(&path, document.to_json_pretty()?)?;
            println!(
                "Exported {} notes to {}",
                document.notes.len(),
                path.display()
            );
        }

        Commands::Import { file } => {
            let raw = std::fs::read_to_string(&file)?;
            let report = backup::import(service, &raw)?;
            println!(
                "Imported {} notes ({} failed)",
                report.imported, report.failed
            );
        }

        Commands::Doctor => {
            let health = MigrationEngine::new(service).validate();
            if health.is_valid {
                println!(
                    "{} {} notes in {} storage",
                    "OK:".green(),
                    health.note_count,
                    health.storage_type
                );
            } else {
                eprintln!("{} active storage could not be read", "Problem:".red());
                std::process::exit(1);
            }
        }

        Commands::Config {
            auto_backup,
            backup_interval,
        } => {
            let config = if auto_backup.is_some() || backup_interval.is_some() {
                service.config().update(&ConfigUpdate {
                    auto_backup_enabled: auto_backup,
                    backup_interval,
                    ..ConfigUpdate::default()
                })?
            } else {
                service.config().get()?
            };
            println!("storage:       {}", config.storage_type);
            println!("auto backup:   {}", config.auto_backup_enabled);
            println!("interval (ms): {}", config.backup_interval);
        }
    }

    Ok(())
}

fn print_notes(notes: &[Note]) {
    if notes.is_empty() {
        println!("No notes found.");
        return;
    }
    for note in notes {
        println!(
            "{}  {}  {}",
            note.id.to_string().dimmed(),
            note.updated_at.format("%Y-%m-%d %H:%M"),
            note.title.bold()
        );
    }
}

fn print_note(note: &Note) {
    println!("{}", note.title.bold());
    println!("--------------------------------");
    println!("{}", note.content);
    println!();
    println!("{} {}", "id:".dimmed(), note.id);
    println!("{} {}", "created:".dimmed(), note.created_at.format("%Y-%m-%d %H:%M"));
    println!("{} {}", "updated:".dimmed(), note.updated_at.format("%Y-%m-%d %H:%M"));
}
