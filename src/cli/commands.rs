//! Command dispatch: settings → service container → code service → output

use std::io;

use clap::CommandFactory;
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{CodeFilter, CodeId, CodeUpdate, NewCode, PageRequest, ParentFilter};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see `codetree --help`".into(),
        ));
    };

    match command {
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        Commands::Config { command } => execute_config(cli, command),
        code_command => {
            let container = ServiceContainer::new(load_settings(cli)?)?;
            execute_code_command(&container, code_command)
        }
    }
}

fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let cwd = std::env::current_dir()
        .map_err(|e| CliError::from(InfraError::io("read current directory", e)))?;
    let mut settings = Settings::load(Some(&cwd))?;
    if let Some(data_file) = &cli.data_file {
        settings.data_file = data_file.clone();
    }
    debug!("settings: data_file={}", settings.data_file.display());
    Ok(settings)
}

#[instrument(skip(cli))]
fn execute_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::info(&format!("global: {}", path.display())),
                None => output::info("global: <unavailable>"),
            }
            if let Ok(cwd) = std::env::current_dir() {
                output::info(&format!("local:  {}", local_config_path(&cwd).display()));
            }
        }
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(())
}

#[instrument(skip(container))]
fn execute_code_command(container: &ServiceContainer, command: &Commands) -> CliResult<()> {
    let codes = &container.codes;
    match command {
        Commands::Create {
            code,
            name,
            parent,
            seq,
            description,
        } => {
            let new = NewCode {
                code: code.clone(),
                name: name.clone(),
                parent_id: parent.map(CodeId),
                sequence: *seq,
                description: description.clone(),
            };
            let created = codes.create(new)?;
            output::success(&format!("created {}", created));
        }
        Commands::Update {
            id,
            name,
            parent,
            root,
            seq,
            description,
            delete,
        } => {
            let current = codes.find_by_id(CodeId(*id))?;
            let mut update = CodeUpdate::from_entry(&current);
            if let Some(name) = name {
                update.name = name.clone();
            }
            if *root {
                update.parent_id = None;
            } else if let Some(parent) = parent {
                update.parent_id = Some(CodeId(*parent));
            }
            if let Some(seq) = seq {
                update.sequence = *seq;
            }
            if let Some(description) = description {
                update.description = Some(description.clone());
            }
            update.deleted = *delete;
            let updated = codes.update(update)?;
            output::success(&format!("updated {}", updated));
        }
        Commands::Get { id, children } => {
            if *children {
                output::tree(&codes.find_by_id_with_children(CodeId(*id))?);
            } else {
                output::entry(&codes.find_by_id(CodeId(*id))?);
            }
        }
        Commands::Lookup { code } => match codes.find_by_code(code)? {
            Some(tree) => output::tree(&tree),
            None => {
                return Err(CliError::NotFound(format!("code {}", code)));
            }
        },
        Commands::List {
            code,
            name,
            parent,
            roots,
            include_deleted,
            page,
            size,
            children,
        } => {
            let filter = CodeFilter {
                code: code.clone(),
                name: name.clone(),
                parent: if *roots {
                    Some(ParentFilter::Root)
                } else {
                    parent.map(|p| ParentFilter::Id(CodeId(p)))
                },
                include_deleted: *include_deleted,
            };
            let request = PageRequest::new(*page, size.unwrap_or(container.settings.page_size));
            if *children {
                let result = codes.find_by_condition_with_children(request, &filter)?;
                result.content.iter().for_each(output::tree);
                output::page_footer(&result);
            } else {
                let result = codes.find_by_condition(request, &filter)?;
                result.content.iter().for_each(output::entry);
                output::page_footer(&result);
            }
        }
        Commands::Tree => {
            let filter = CodeFilter {
                parent: Some(ParentFilter::Root),
                ..CodeFilter::default()
            };
            let roots =
                codes.find_by_condition_with_children(PageRequest::new(0, usize::MAX), &filter)?;
            output::header(&format!("{} root codes", roots.total_elements));
            roots.content.iter().for_each(output::tree);
        }
        Commands::Config { .. } | Commands::Completion { .. } => {
            return Err(CliError::Usage("not a code command".into()));
        }
    }
    Ok(())
}
