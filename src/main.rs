use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli_style;

use cli_style::{
    get_styles, print_empty_list, print_error, print_key_value, print_list_item,
    print_section_footer, print_section_header, print_success, print_undo_status,
    print_warning, print_welcome, TableBuilder,
};
use wax_config::checkpoint::plain_comment;
use wax_config::settings::{CompleterFlags, GEOMETRY_KEYS};
use wax_config::{AppConfig, CliConfig, Editor, EditorOptions, FileConfig, KeyClass};

use rustyline::{
    completion::Completer, highlight::Highlighter, history::FileHistory, validate::Validator,
    CompletionType, Config, Helper,
};

/// Number of works listed by the statistics commands unless asked otherwise.
const LISTED_WORKS: usize = 50;

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(styles=get_styles())]
struct CliArgs {
    /// Path to the recordings database directory.
    #[clap(value_parser = parse_path)]
    pub database_dir: Option<PathBuf>,

    /// Path to a TOML config file. Its values override the arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Keep the undo checkpoints left by the previous session.
    #[clap(long)]
    pub preserve: bool,
}

#[derive(Parser)]
#[command(styles=get_styles(), name = "")]
struct InnerCli {
    #[command(subcommand)]
    command: InnerCommand,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ClassArg {
    Primary,
    Secondary,
}

impl From<ClassArg> for KeyClass {
    fn from(class: ClassArg) -> Self {
        match class {
            ClassArg::Primary => KeyClass::Primary,
            ClassArg::Secondary => KeyClass::Secondary,
        }
    }
}

#[derive(Subcommand)]
enum InnerCommand {
    /// Lists the genres in display order.
    Genres,

    /// Shows the keys and column layout of a genre.
    Show { genre: String },

    /// Adds a genre with a single primary key.
    AddGenre { name: Option<String> },

    /// Renames a genre.
    RenameGenre { genre: String, new_name: String },

    /// Deletes a genre and every work in it. Requires --force when the
    /// genre has works.
    DeleteGenre {
        genre: String,
        #[clap(long)]
        force: bool,
    },

    /// Moves a genre to a 1-based position.
    MoveGenre { genre: String, position: usize },

    /// Adds a primary or secondary key to a genre.
    AddKey {
        genre: String,
        class: ClassArg,
        name: Option<String>,
    },

    /// Deletes a key; its values are kept aside in each work.
    DeleteKey { genre: String, key: String },

    /// Renames a key.
    RenameKey {
        genre: String,
        key: String,
        new_name: String,
    },

    /// Moves a key to a 1-based position of the primary or secondary list.
    MoveKey {
        genre: String,
        key: String,
        class: ClassArg,
        position: usize,
    },

    /// Toggles the sort indicator of a primary key column.
    ToggleSort { genre: String, key: String },

    /// Toggles the filter button of a primary key column.
    ToggleFilter { genre: String, key: String },

    /// Sets the width of a primary key column.
    SetWidth {
        genre: String,
        key: String,
        width: u32,
    },

    /// Lists the user-defined recording properties.
    Props,

    /// Adds a recording property.
    AddProp { name: Option<String> },

    /// Deletes a recording property. Requires --force when a recording
    /// has a value for it.
    DeleteProp {
        name: String,
        #[clap(long)]
        force: bool,
    },

    /// Renames a recording property.
    RenameProp { name: String, new_name: String },

    /// Shows the window geometry parameters.
    Geometry,

    /// Sets a window geometry parameter.
    SetGeometry { name: String, value: u32 },

    /// Restores the default window geometry.
    RestoreGeometry,

    /// Lists the track metadata keys.
    TrackKeys,

    /// Adds a track metadata key.
    AddTrackKey { name: Option<String> },

    /// Deletes a track metadata key.
    DeleteTrackKey { name: String },

    /// Renames a track metadata key.
    RenameTrackKey { name: String, new_name: String },

    /// Lists the completers with their flags and word counts.
    Completers,

    /// Adds an empty completer.
    AddCompleter { name: Option<String> },

    /// Deletes a completer and its word file.
    DeleteCompleter { name: String },

    /// Renames a completer.
    RenameCompleter { name: String, new_name: String },

    /// Sets the flags of a completer.
    SetCompleter {
        name: String,
        #[clap(long, action = clap::ArgAction::Set)]
        enabled: bool,
        #[clap(long, action = clap::ArgAction::Set)]
        learn: bool,
    },

    /// Repairs disagreements between the settings and the metadata files.
    Reconcile,

    /// Shows work counts and recently played, created and most played works.
    Stats {
        #[clap(long, default_value_t = LISTED_WORKS)]
        items: usize,
    },

    /// Reverts the most recent edit.
    Undo,

    /// Shows the path of the current database.
    Where,

    /// Close this program.
    Exit,
}

enum CommandExecutionResult {
    Ok,
    Exit,
    Error(String),
}

const PROMPT: &str = ">> ";

fn position_to_index(position: usize) -> Result<usize> {
    if position == 0 {
        bail!("Positions start at 1");
    }
    Ok(position - 1)
}

fn report(changed: bool, message: &str) {
    if changed {
        print_success(message);
    } else {
        print_warning("Nothing changed");
    }
}

fn show_genre(editor: &Editor, genre: &str) -> Result<()> {
    let keys = editor.keys(genre)?;
    let columns = editor.columns(genre)?;
    print_section_header(genre);
    let mut table = TableBuilder::new(vec!["Key", "Class", "Width", "Filter", "Sort"]);
    for (key, column) in keys.primary.iter().zip(&columns) {
        table.add_row(vec![
            key.clone(),
            "primary".to_string(),
            column.width.to_string(),
            if column.filter { "yes" } else { "" }.to_string(),
            if column.sort { "▲" } else { "" }.to_string(),
        ]);
    }
    for key in &keys.secondary {
        table.add_row(vec![
            key.clone(),
            "secondary".to_string(),
            String::new(),
            String::new(),
            String::new(),
        ]);
    }
    table.print();
    print_section_footer();
    Ok(())
}

fn print_names(title: &str, names: &[String]) {
    print_section_header(title);
    if names.is_empty() {
        print_empty_list("(none)");
    }
    for name in names {
        print_list_item(name, 1);
    }
    print_section_footer();
}

fn show_stats(editor: &Editor, items: usize) -> Result<()> {
    let counts = editor.works_per_genre()?;
    let total: usize = counts.iter().map(|c| c.works).sum();
    print_section_header("Works per genre");
    let mut table = TableBuilder::new(vec!["Genre", "Works"]);
    for count in &counts {
        table.add_row(vec![count.genre.clone(), count.works.to_string()]);
    }
    table.print();
    print_key_value("Total works", &total.to_string());
    print_key_value("Recordings", &editor.recordings_count()?.to_string());
    print_section_footer();

    let date = |d: Option<chrono::NaiveDate>| {
        d.map(|d| d.format("%Y %b %d").to_string())
            .unwrap_or_default()
    };
    let sections = [
        ("Recently played", editor.recently_played(items)?),
        ("Recently created", editor.recently_created(items)?),
        ("Most played", editor.most_played(items)?),
    ];
    for (title, works) in sections {
        print_section_header(title);
        let mut table = TableBuilder::new(vec!["Played", "Created", "Times", "Genre", "Work"]);
        for work in works {
            table.add_row(vec![
                date(work.date_played),
                date(work.date_created),
                work.times_played.to_string(),
                work.genre,
                work.description.replace('\n', " / "),
            ]);
        }
        table.print();
        print_section_footer();
    }
    Ok(())
}

fn run_command(command: InnerCommand, editor: &mut Editor) -> Result<bool> {
    match command {
        InnerCommand::Genres => print_names("Genres", &editor.genres()),
        InnerCommand::Show { genre } => show_genre(editor, &genre)?,
        InnerCommand::AddGenre { name } => {
            let genre = editor.add_genre(name.as_deref())?;
            print_success(&format!("Added genre {}", genre));
        }
        InnerCommand::RenameGenre { genre, new_name } => {
            let changed = editor.rename_genre(&genre, &new_name)?;
            report(changed, &format!("Renamed genre {} to {}", genre, new_name));
        }
        InnerCommand::DeleteGenre { genre, force } => {
            if !force && editor.genre_has_works(&genre)? {
                bail!(
                    "Genre {} has works that would be deleted; repeat with --force",
                    genre
                );
            }
            editor.delete_genre(&genre)?;
            print_success(&format!("Deleted genre {}", genre));
        }
        InnerCommand::MoveGenre { genre, position } => {
            let changed = editor.move_genre(&genre, position_to_index(position)?)?;
            report(changed, &format!("Moved genre {} to position {}", genre, position));
        }
        InnerCommand::AddKey { genre, class, name } => {
            let key = editor.add_key(&genre, class.into(), name.as_deref())?;
            print_success(&format!("Added key {} to genre {}", key, genre));
        }
        InnerCommand::DeleteKey { genre, key } => {
            editor.delete_key(&genre, &key)?;
            print_success(&format!("Deleted key {} from genre {}", key, genre));
        }
        InnerCommand::RenameKey {
            genre,
            key,
            new_name,
        } => {
            let changed = editor.rename_key(&genre, &key, &new_name)?;
            report(changed, &format!("Renamed key {} to {}", key, new_name));
        }
        InnerCommand::MoveKey {
            genre,
            key,
            class,
            position,
        } => {
            let changed =
                editor.move_key(&genre, &key, class.into(), position_to_index(position)?)?;
            report(changed, &format!("Moved key {}", key));
        }
        InnerCommand::ToggleSort { genre, key } => {
            let changed = editor.toggle_sort_indicator(&genre, &key)?;
            report(changed, &format!("Toggled sort indicator of {}", key));
        }
        InnerCommand::ToggleFilter { genre, key } => {
            let changed = editor.toggle_filter_button(&genre, &key)?;
            report(changed, &format!("Toggled filter button of {}", key));
        }
        InnerCommand::SetWidth { genre, key, width } => {
            let changed = editor.set_column_width(&genre, &key, width)?;
            report(changed, &format!("Set width of {} to {}", key, width));
        }
        InnerCommand::Props => print_names("Recording properties", &editor.properties()),
        InnerCommand::AddProp { name } => {
            let name = editor.add_property(name.as_deref())?;
            print_success(&format!("Added property {}", name));
        }
        InnerCommand::DeleteProp { name, force } => {
            if !force && editor.property_has_values(&name)? {
                bail!(
                    "Recordings have values for {}; repeat with --force",
                    name
                );
            }
            editor.delete_property(&name)?;
            print_success(&format!("Deleted property {}", name));
        }
        InnerCommand::RenameProp { name, new_name } => {
            let changed = editor.rename_property(&name, &new_name)?;
            report(changed, &format!("Renamed property {} to {}", name, new_name));
        }
        InnerCommand::Geometry => {
            print_section_header("Geometry");
            let geometry = editor.settings().geometry;
            for key in GEOMETRY_KEYS {
                let value = geometry.get(key).unwrap_or_default();
                print_key_value(key, &value.to_string());
            }
            print_section_footer();
        }
        InnerCommand::SetGeometry { name, value } => {
            let changed = editor.set_geometry(&name, value)?;
            report(changed, &format!("Set {} to {}", name, value));
        }
        InnerCommand::RestoreGeometry => {
            let changed = editor.restore_default_geometry()?;
            report(changed, "Restored default geometry");
        }
        InnerCommand::TrackKeys => print_names("Track metadata keys", &editor.trackmetadata_keys()),
        InnerCommand::AddTrackKey { name } => {
            let key = editor.add_trackmetadata_key(name.as_deref())?;
            print_success(&format!("Added track metadata key {}", key));
        }
        InnerCommand::DeleteTrackKey { name } => {
            editor.delete_trackmetadata_key(&name)?;
            print_success(&format!("Deleted track metadata key {}", name));
        }
        InnerCommand::RenameTrackKey { name, new_name } => {
            let changed = editor.rename_trackmetadata_key(&name, &new_name)?;
            report(changed, &format!("Renamed track metadata key {} to {}", name, new_name));
        }
        InnerCommand::Completers => {
            print_section_header("Completers");
            let completers = editor.list_completers()?;
            let mut table = TableBuilder::new(vec!["Name", "Enabled", "Learn", "Words"]);
            for completer in &completers {
                table.add_row(vec![
                    completer.name.clone(),
                    completer.flags.enabled.to_string(),
                    completer.flags.learn.to_string(),
                    completer.words.to_string(),
                ]);
            }
            if completers.is_empty() {
                print_empty_list("(none)");
            } else {
                table.print();
            }
            print_section_footer();
        }
        InnerCommand::AddCompleter { name } => {
            let name = editor.add_completer(name.as_deref())?;
            print_success(&format!("Added completer {}", name));
        }
        InnerCommand::DeleteCompleter { name } => {
            editor.delete_completer(&name)?;
            print_success(&format!("Deleted completer {}", name));
        }
        InnerCommand::RenameCompleter { name, new_name } => {
            let changed = editor.rename_completer(&name, &new_name)?;
            report(changed, &format!("Renamed completer {} to {}", name, new_name));
        }
        InnerCommand::SetCompleter {
            name,
            enabled,
            learn,
        } => {
            let changed = editor.set_completer_flags(&name, CompleterFlags { enabled, learn })?;
            report(changed, &format!("Updated completer {}", name));
        }
        InnerCommand::Reconcile => {
            let warnings = editor.reconcile()?;
            if warnings.is_empty() {
                print_success("Settings and metadata files are consistent");
            }
            for warning in warnings {
                print_warning(&warning.to_string());
            }
        }
        InnerCommand::Stats { items } => show_stats(editor, items)?,
        InnerCommand::Undo => {
            if !editor.can_undo()? {
                print_warning("Nothing to undo");
            } else {
                let reverted = plain_comment(&editor.undo_comment()?);
                editor.undo()?;
                print_success(&format!("Reverted: {}", reverted));
            }
        }
        InnerCommand::Where => println!("{}", editor.paths().root().display()),
        InnerCommand::Exit => return Ok(false),
    }
    Ok(true)
}

fn execute_command(line: String, editor: &mut Editor) -> CommandExecutionResult {
    if line.is_empty() {
        return CommandExecutionResult::Ok;
    }

    let args =
        shlex::split(&line).unwrap_or_else(|| line.split_whitespace().map(String::from).collect());

    let cli = InnerCli::try_parse_from(std::iter::once(" ").chain(args.iter().map(String::as_str)));

    match cli {
        Ok(cli) => {
            let mutating = !matches!(
                cli.command,
                InnerCommand::Genres
                    | InnerCommand::Show { .. }
                    | InnerCommand::Props
                    | InnerCommand::Geometry
                    | InnerCommand::TrackKeys
                    | InnerCommand::Completers
                    | InnerCommand::Stats { .. }
                    | InnerCommand::Where
                    | InnerCommand::Exit
            );
            match run_command(cli.command, editor) {
                Ok(true) => {}
                Ok(false) => return CommandExecutionResult::Exit,
                Err(err) => return CommandExecutionResult::Error(format!("{:#}", err)),
            }
            if mutating {
                match editor.undo_comment() {
                    Ok(comment) => print_undo_status(&plain_comment(&comment)),
                    Err(err) => return CommandExecutionResult::Error(format!("{:#}", err)),
                }
            }
        }

        Err(e) => {
            if e.print().is_err() {
                println!("{}", e);
            }
        }
    }
    CommandExecutionResult::Ok
}

#[derive(rustyline_derive::Hinter)]
struct CommandHelper {
    commands_names: Vec<String>,
}

impl CommandHelper {
    pub fn new() -> Self {
        let commands_names: Vec<String> = InnerCli::command()
            .get_subcommands()
            .map(|sc| sc.get_name().to_string())
            .collect();

        CommandHelper { commands_names }
    }
}

impl Completer for CommandHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        if line.contains(' ') {
            return Ok((0, Vec::with_capacity(0)));
        }
        let matches = self
            .commands_names
            .iter()
            .filter(|c| c.starts_with(line))
            .cloned()
            .collect::<Vec<_>>();

        Ok((0, matches))
    }
}

impl Highlighter for CommandHelper {}
impl Validator for CommandHelper {}
impl Helper for CommandHelper {}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialise logging")?;

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let cli_config = CliConfig {
        database_dir: cli_args.database_dir,
        preserve_checkpoints: cli_args.preserve,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;
    info!("Using database at {:?}", config.database_dir);

    let mut editor = Editor::open(config.paths(), EditorOptions::from(&config))?;
    let comment = editor.start_session(config.preserve_checkpoints)?;
    for warning in editor.reconcile()? {
        print_warning(&warning.to_string());
    }

    print_welcome(&config.database_dir.display().to_string());
    print_undo_status(&plain_comment(&comment));

    let rl_config = Config::builder()
        .completion_type(CompletionType::List)
        .build();

    let mut rl = rustyline::Editor::<CommandHelper, FileHistory>::with_config(rl_config)?;
    rl.set_helper(Some(CommandHelper::new()));

    loop {
        let readline = rl.readline(PROMPT);

        match readline {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                match execute_command(line.trim().to_string(), &mut editor) {
                    CommandExecutionResult::Ok => {}
                    CommandExecutionResult::Exit => {
                        break;
                    }
                    CommandExecutionResult::Error(err) => {
                        print_error(&err);
                        continue;
                    }
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("CTRL-D: exiting.");
                break;
            }
            Err(e) => {
                println!("Error: {:?}", e);
                break;
            }
        }
    }
    Ok(())
}
