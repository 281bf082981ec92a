//! Subcommand handlers

use crate::args::{Cli, Commands, ComposeArgs, ViewMode};
use anyhow::{bail, Context, Result};
use composer_core::credentials::{clear_token, store_token};
use composer_core::{
    ComposerConfig, ContractSummary, DirectoryTarget, DraftSession, ErrorKind, ExportAdapter,
    FileStore, Parties, SaveOutcome, SessionContext, SubmitOutcome,
};
use composer_http::HttpBackend;
use composer_render::DocumentRenderer;
use composer_schema::{ContractTypeDefinition, FieldSource, FieldWidget, TypeCatalog};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Config file read when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "composer.toml";

/// Load configuration and apply environment overrides
///
/// # Errors
/// Unreadable or invalid config file
pub fn load_config(path: Option<&Path>) -> Result<ComposerConfig> {
    let config = match path {
        Some(path) => ComposerConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ComposerConfig::load_or_default(DEFAULT_CONFIG_FILE)?,
    };
    Ok(config.with_env_overrides())
}

/// Catalog from `catalog_path`, or the built-in one
///
/// # Errors
/// Unreadable or invalid catalog file
pub fn load_catalog(config: &ComposerConfig) -> Result<Arc<TypeCatalog>> {
    match &config.catalog_path {
        Some(path) => {
            let catalog = TypeCatalog::load(path)
                .with_context(|| format!("loading catalog {}", path.display()))?;
            debug!(path = %path.display(), types = catalog.len(), "Catalog loaded");
            Ok(Arc::new(catalog))
        }
        None => Ok(TypeCatalog::global()),
    }
}

/// Run a parsed command line
///
/// # Errors
/// Any failure of the chosen subcommand
pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Types => print!("{}", list_types(&*load_catalog(&config)?)),
        Commands::Describe { type_id } => {
            let catalog = load_catalog(&config)?;
            let definition = catalog.lookup(&type_id)?;
            print!("{}", describe(&definition));
        }
        Commands::Login { token } => {
            if token.trim().is_empty() {
                bail!("token must not be blank");
            }
            let store = FileStore::new(config.token_store_path());
            store_token(&store, &token)?;
            info!(path = %store.path().display(), "Token stored");
            println!("Logged in.");
        }
        Commands::Logout => {
            clear_token(&FileStore::new(config.token_store_path()))?;
            println!("Logged out.");
        }
        Commands::Compose(args) => compose(&config, args).await?,
        Commands::Contracts { json } => {
            let contracts = list_contracts(&config).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&contracts)?);
            } else {
                print!("{}", contracts_table(&contracts));
            }
        }
        Commands::Render { file, format } => {
            let source = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            println!("{}", render_source(&config, &source, format));
        }
    }
    Ok(())
}

fn session_context(config: &ComposerConfig) -> Result<SessionContext> {
    let store = FileStore::new(config.token_store_path());
    let session = SessionContext::from_store(&store)?;
    if !session.is_authenticated() {
        debug!(path = %store.path().display(), "No stored token");
    }
    Ok(session)
}

async fn compose(config: &ComposerConfig, args: ComposeArgs) -> Result<()> {
    let backend = Arc::new(HttpBackend::from_config(config)?);
    let draft = DraftSession::new(
        load_catalog(config)?,
        session_context(config)?,
        backend.clone(),
        backend,
    )
    .with_config(config);

    configure(&draft, &args)?;

    let document = match draft.submit().await? {
        SubmitOutcome::Generated(document) => document,
        SubmitOutcome::Rejected(err) => bail!(explain(&draft, &ErrorKind::Validation(err))),
        SubmitOutcome::Failed(err) => bail!(explain(&draft, &err)),
        SubmitOutcome::InFlight | SubmitOutcome::Discarded => bail!("generation was interrupted"),
    };
    info!(title = %document.title, "Contract generated");

    if let Some(path) = &args.content {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        draft.toggle_edit()?;
        draft.edit_content(content)?;
        draft.toggle_edit()?;
    }
    if let Some(title) = &args.title {
        draft.set_title(title.as_str())?;
    }

    println!("{}", draft.render(args.view.into())?);

    if args.save {
        match draft.save().await? {
            SaveOutcome::Saved => println!("Contract saved successfully!"),
            SaveOutcome::Rejected(err) => bail!(explain(&draft, &ErrorKind::Validation(err))),
            SaveOutcome::Failed(err) => bail!(explain(&draft, &err)),
            SaveOutcome::InFlight | SaveOutcome::Discarded => bail!("save was interrupted"),
        }
    }

    if args.download {
        let dir = args.out_dir.clone().unwrap_or_else(|| config.export_dir.clone());
        let path = draft.download(&DirectoryTarget::new(dir))?;
        println!("Downloaded {}", path.display());
    }
    Ok(())
}

/// Apply `compose` arguments to a fresh draft
///
/// # Errors
/// Unknown type, parameter or option key
pub fn configure(draft: &DraftSession, args: &ComposeArgs) -> Result<()> {
    draft.select_type(&args.contract_type)?;
    draft.set_parties(Parties::new(args.client.as_str(), args.other.as_str()))?;
    for (key, value) in &args.params {
        draft.edit_parameter(key, value.as_str())?;
    }
    for (key, value) in &args.options {
        draft.edit_option(key, value.as_str())?;
    }
    Ok(())
}

fn explain(draft: &DraftSession, err: &ErrorKind) -> String {
    draft.with_state(|state| err.user_message(state.selected_type()))
}

async fn list_contracts(config: &ComposerConfig) -> Result<Vec<ContractSummary>> {
    let adapter = ExportAdapter::new(
        session_context(config)?,
        Arc::new(HttpBackend::from_config(config)?),
    );
    adapter
        .list()
        .await
        .map_err(|err| anyhow::anyhow!(err.user_message(None)))
}

/// One line per catalog entry
#[must_use]
pub fn list_types(catalog: &TypeCatalog) -> String {
    catalog
        .iter()
        .map(|definition| format!("{}  [{}]\n", definition.id, definition.jurisdiction))
        .collect()
}

/// Fields of a contract type as `compose` flags
#[must_use]
pub fn describe(definition: &ContractTypeDefinition) -> String {
    let mut lines = vec![format!("{} ({})", definition.id, definition.jurisdiction)];
    for field in definition.fields() {
        let flag = match field.source {
            FieldSource::Parameter => "--param",
            FieldSource::ClauseOption => "--option",
        };
        let values = match &field.widget {
            FieldWidget::TextInput => "<text>".to_string(),
            FieldWidget::NumberInput => "<number>".to_string(),
            FieldWidget::Select { choices } => choices
                .iter()
                .map(|choice| {
                    if field.default == Some(choice.value) {
                        format!("{} (default)", choice.value)
                    } else {
                        choice.value.to_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(" | "),
        };
        lines.push(format!("  {flag} {}={values}    {}", field.key, field.display_label()));
    }
    lines.push(String::new());
    lines.join("\n")
}

/// Saved contracts as a table
#[must_use]
pub fn contracts_table(contracts: &[ContractSummary]) -> String {
    if contracts.is_empty() {
        return "No saved contracts.\n".to_string();
    }
    contracts
        .iter()
        .map(|c| {
            format!(
                "{:>6}  {}  {:<32}  {}\n",
                c.id.to_string(),
                c.created_at.format("%Y-%m-%d %H:%M"),
                c.contract_type,
                c.title
            )
        })
        .collect()
}

/// Render Markdown source with the configured options
#[must_use]
pub fn render_source(config: &ComposerConfig, source: &str, format: ViewMode) -> String {
    DocumentRenderer::new()
        .with_options(config.render)
        .display(source, format.into())
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use composer_core::ContractId;
    use pretty_assertions::assert_eq;

    #[test]
    fn lists_builtin_types() {
        let listing = list_types(&TypeCatalog::builtin());
        assert!(listing.contains("California Employment Agreement  [California]"));
    }

    #[test]
    fn describe_shows_flags_and_defaults() {
        let catalog = TypeCatalog::builtin();
        let definition = catalog.lookup("California Employment Agreement").unwrap();
        let text = describe(&definition);

        assert!(text.starts_with("California Employment Agreement (California)\n"));
        assert!(text.contains("--param annual_salary=<number>    Annual Salary ($) *"));
        assert!(text.contains("--param overtime_status=Exempt | Non-Exempt"));
        assert!(text.contains("--option arbitration=none (default) | jams_provider | aaa_provider"));
    }

    #[test]
    fn table_formats_rows() {
        let contracts = vec![ContractSummary {
            id: ContractId::Number(12),
            title: "Acme Offer".to_string(),
            contract_type: "California Employment Agreement".to_string(),
            created_at: "2024-05-02T09:30:00Z".parse().unwrap(),
        }];
        let table = contracts_table(&contracts);
        assert!(table.starts_with("    12  2024-05-02 09:30  California Employment Agreement"));
        assert!(table.trim_end().ends_with("Acme Offer"));
        assert_eq!(contracts_table(&[]), "No saved contracts.\n");
    }

    #[test]
    fn render_source_honours_format() {
        let config = ComposerConfig::default();
        assert_eq!(render_source(&config, "# Title", ViewMode::Raw), "# Title");
        assert!(render_source(&config, "# Title", ViewMode::Html).contains("<h1>Title</h1>"));
    }

    #[test]
    fn explicit_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(dir.path().join("missing.toml").as_path())).is_err());
    }

    #[test]
    fn catalog_path_overrides_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("types.yaml");
        std::fs::write(
            &path,
            "contract_types:\n  - id: Mutual NDA\n    jurisdiction: Delaware\n    parameters:\n      - key: term_years\n        label: Term (years)\n        kind: number\n",
        )
        .unwrap();

        let config = ComposerConfig {
            catalog_path: Some(path),
            ..ComposerConfig::default()
        };
        let catalog = load_catalog(&config).unwrap();
        assert_eq!(catalog.ids(), vec!["Mutual NDA"]);
    }
}
