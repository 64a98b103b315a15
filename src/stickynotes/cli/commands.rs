use super::print::{print_json, print_messages, print_note, print_notes, Message};
use super::setup::{Cli, Commands, EncryptionAction, JournalAction, OutputArgs};
use chrono::Local;
use clap::Parser;
use directories::ProjectDirs;
use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use stickynotes::api::NotesApi;
use stickynotes::commands::import::read_paths;
use stickynotes::config::StoreConfig;
use stickynotes::error::{NoteError, Result};
use stickynotes::model::{MetaPatch, NoteFormat, SortKey};
use tracing_subscriber::EnvFilter;

struct AppContext {
    api: NotesApi,
    config: StoreConfig,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let ctx = init_context(&cli)?;

    match cli.command {
        Some(Commands::Create { title, format }) => handle_create(&ctx, title, format.into()),
        Some(Commands::List {
            search,
            deleted,
            sort,
            output,
        }) => handle_list(&ctx, search, deleted, sort.into(), output),
        Some(Commands::Show { id, output }) => handle_show(&ctx, &id, output),
        Some(Commands::Save { id, text, base_rev }) => handle_save(&ctx, &id, text, base_rev),
        Some(Commands::Meta {
            id,
            pin,
            unpin,
            title,
            rename,
            subject,
        }) => {
            let pinned = match (pin, unpin) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let patch = MetaPatch {
                pinned,
                title,
                user_title: rename,
                subject,
            };
            handle_meta(&ctx, &id, &patch)
        }
        Some(Commands::Delete { id }) => handle_delete(&ctx, &id),
        Some(Commands::Restore { id }) => handle_restore(&ctx, &id),
        Some(Commands::Rebuild) => handle_rebuild(&ctx),
        Some(Commands::Encryption { action }) => handle_encryption(&ctx, action),
        Some(Commands::Encrypt { id }) => handle_toggle(&ctx, &id, true),
        Some(Commands::Decrypt { id }) => handle_toggle(&ctx, &id, false),
        Some(Commands::Import { paths }) => handle_import(&ctx, paths),
        Some(Commands::Journal { action }) => handle_journal(&ctx, action),
        Some(Commands::Config) => handle_config(&ctx),
        None => handle_list(&ctx, None, false, SortKey::Updated, OutputArgs { json: false }),
    }
}

/// JSON log lines on stderr. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .json()
        .with_writer(std::io::stderr)
        .try_init();
}

fn init_context(cli: &Cli) -> Result<AppContext> {
    let config = resolve_config(cli)?;
    let api = NotesApi::open(&config);
    Ok(AppContext { api, config })
}

/// Flags, then environment and `stickynotes.toml`, then per-user directories.
fn resolve_config(cli: &Cli) -> Result<StoreConfig> {
    let user_dirs = ProjectDirs::from("com", "stickynotes", "stickynotes");

    let config_dir = cli.config_dir.clone().or_else(|| {
        if std::env::var_os("CONFIG_DIR").is_some() {
            return None;
        }
        user_dirs.as_ref().map(|d| d.config_dir().to_path_buf())
    });
    let mut config = StoreConfig::load(config_dir.as_deref())?;

    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    } else if std::env::var_os("DATA_DIR").is_none()
        && config.data_dir == StoreConfig::default().data_dir
    {
        if let Some(dirs) = &user_dirs {
            config.data_dir = dirs.data_dir().to_path_buf();
        }
    }
    Ok(config)
}

fn handle_create(ctx: &AppContext, title: Option<String>, format: NoteFormat) -> Result<()> {
    let note = ctx.api.create_note(format, title.as_deref())?;
    print_messages(&[Message::success(format!(
        "Created note {} ({})",
        note.meta.id, note.meta.filename
    ))]);
    Ok(())
}

fn handle_list(
    ctx: &AppContext,
    search: Option<String>,
    deleted: bool,
    sort: SortKey,
    output: OutputArgs,
) -> Result<()> {
    let notes = ctx.api.list_notes(deleted, sort, search.as_deref())?;
    if output.json {
        return print_json(&notes);
    }
    print_notes(&notes);
    Ok(())
}

fn handle_show(ctx: &AppContext, id: &str, output: OutputArgs) -> Result<()> {
    let note = ctx.api.get_note(id)?;
    if output.json {
        return print_json(&note);
    }
    print_note(&note);
    Ok(())
}

fn handle_save(ctx: &AppContext, id: &str, text: Option<String>, base_rev: Option<u64>) -> Result<()> {
    let text = match text {
        Some(text) => text,
        None => read_stdin()?,
    };
    let outcome = ctx.api.save_content(id, &text, base_rev)?;
    print_messages(&[Message::success(format!("Saved {} (rev {})", id.trim(), outcome.rev))]);
    Ok(())
}

fn read_stdin() -> Result<String> {
    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Err(NoteError::InvalidInput(
            "No text given; pass it as an argument or pipe it in".to_string(),
        ));
    }
    let mut buf = String::new();
    stdin.read_to_string(&mut buf)?;
    Ok(buf)
}

fn handle_meta(ctx: &AppContext, id: &str, patch: &MetaPatch) -> Result<()> {
    if patch.is_empty() {
        print_messages(&[Message::info("Nothing to change.")]);
        return Ok(());
    }
    let meta = ctx.api.update_meta(id, patch)?;
    print_messages(&[Message::success(format!(
        "Updated {} (rev {}, {})",
        meta.id, meta.rev, meta.filename
    ))]);
    Ok(())
}

fn handle_delete(ctx: &AppContext, id: &str) -> Result<()> {
    let result = ctx.api.delete_note(id)?;
    let message = if result.changed {
        Message::success(format!("Moved {} to the trash", result.meta.id))
    } else {
        Message::info(format!("{} is already in the trash", result.meta.id))
    };
    print_messages(&[message]);
    Ok(())
}

fn handle_restore(ctx: &AppContext, id: &str) -> Result<()> {
    let result = ctx.api.restore_note(id)?;
    let message = if result.changed {
        Message::success(format!("Restored {}", result.meta.id))
    } else {
        Message::info(format!("{} is not in the trash", result.meta.id))
    };
    print_messages(&[message]);
    Ok(())
}

fn handle_rebuild(ctx: &AppContext) -> Result<()> {
    let count = ctx.api.rebuild_index()?;
    print_messages(&[Message::success(format!("Indexed {} notes", count))]);
    Ok(())
}

fn handle_encryption(ctx: &AppContext, action: EncryptionAction) -> Result<()> {
    match action {
        EncryptionAction::Status => {
            let status = ctx.api.encryption_status()?;
            if status.has_key {
                print_messages(&[Message::info(format!(
                    "Encryption key set; {} encrypted notes",
                    status.encrypted_count
                ))]);
            } else {
                print_messages(&[Message::info("No encryption key set")]);
            }
        }
        EncryptionAction::Set {
            passphrase,
            current,
        } => {
            let key_changed = ctx.api.set_encryption(&passphrase, current.as_deref())?;
            let mut messages = vec![Message::success("Passphrase saved")];
            if key_changed {
                messages.push(Message::warning(
                    "Notes encrypted with the previous passphrase can no longer be decrypted",
                ));
            }
            print_messages(&messages);
        }
        EncryptionAction::Disable { current } => {
            let report = ctx.api.disable_encryption(&current)?;
            let mut messages = vec![Message::success(format!(
                "Encryption disabled; decrypted {} notes",
                report.decrypted
            ))];
            if report.errors > 0 {
                messages.push(Message::error(format!(
                    "{} notes could not be decrypted and remain encrypted",
                    report.errors
                )));
            }
            print_messages(&messages);
        }
    }
    Ok(())
}

fn handle_toggle(ctx: &AppContext, id: &str, want: bool) -> Result<()> {
    let meta = ctx.api.toggle_note_encryption(id, want)?;
    let state = if meta.encrypted { "encrypted" } else { "plaintext" };
    print_messages(&[Message::success(format!("{} is {}", meta.id, state))]);
    Ok(())
}

fn handle_import(ctx: &AppContext, paths: Vec<PathBuf>) -> Result<()> {
    let (files, mut errors) = read_paths(&paths);
    let mut messages = Vec::new();
    if !files.is_empty() {
        let report = ctx.api.import_files(files)?;
        for meta in &report.created {
            messages.push(Message::success(format!("Imported {} as {}", meta.title, meta.id)));
        }
        errors.extend(report.errors);
    }
    for e in &errors {
        messages.push(Message::error(format!("{}: {}", e.file, e.error)));
    }
    print_messages(&messages);
    Ok(())
}

fn handle_journal(ctx: &AppContext, action: JournalAction) -> Result<()> {
    match action {
        JournalAction::Today { date } => {
            let date = date.unwrap_or_else(|| Local::now().format("%Y-%m-%d").to_string());
            let entry = ctx.api.journal_today(&date)?;
            let verb = if entry.created { "Created" } else { "Found" };
            print_messages(&[Message::success(format!(
                "{} journal entry {} ({})",
                verb, entry.meta.id, entry.meta.title
            ))]);
        }
        JournalAction::Digest { year, month } => {
            let digest = ctx.api.journal_aggregate(&year, month.as_deref())?;
            if digest.entries.is_empty() {
                print_messages(&[Message::info(format!("No journal entries for {}", digest.period))]);
            }
            for day in &digest.entries {
                println!("{}", day.content.trim_end());
                println!();
            }
        }
    }
    Ok(())
}

fn handle_config(ctx: &AppContext) -> Result<()> {
    println!("data_dir = {}", ctx.config.data_dir.display());
    println!("config_dir = {}", ctx.config.config_dir.display());
    println!("kdf_memory_kib = {}", ctx.config.kdf_memory_kib);
    println!("kdf_iterations = {}", ctx.config.kdf_iterations);
    println!("kdf_parallelism = {}", ctx.config.kdf_parallelism);
    Ok(())
}
