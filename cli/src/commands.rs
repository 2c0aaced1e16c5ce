//! Command dispatch: turns parsed arguments into facade calls and renders
//! the results.

use std::borrow::Cow;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use billingo_core::{Billingo, BillingoError, ListParams, Record, Resource, Transport, DEFAULT_BASE_URL};
use clap::Args;
use indicatif::ProgressBar;
use serde_json::Value;

use crate::cli::{Command, ConfigAction, DocumentAction, DocumentFilter, NoFilter, PartnerFilter, ResourceAction};
use crate::config::{ConfigKey, ConfigStore};
use crate::error::CliError;
use crate::output;

/// Maps resource-specific list flags onto `ListParams`.
pub trait ListFilter {
    fn apply(&self, params: ListParams) -> ListParams;
}

impl ListFilter for NoFilter {
    fn apply(&self, params: ListParams) -> ListParams {
        params
    }
}

impl ListFilter for PartnerFilter {
    fn apply(&self, params: ListParams) -> ListParams {
        params.search(self.query.as_deref())
    }
}

impl ListFilter for DocumentFilter {
    fn apply(&self, params: ListParams) -> ListParams {
        params
            .document_type(self.kind.as_deref())
            .status(self.status.as_deref())
    }
}

/// Parse a `--data` argument. Runs before any request is built.
pub fn parse_payload(text: &str) -> Result<Value, CliError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| CliError::Validation(format!("Invalid JSON for --data: {e}")))?;
    if !value.is_object() {
        return Err(CliError::Validation("--data must be a JSON object".to_string()));
    }
    Ok(value)
}

/// Split a comma-separated address list, dropping blanks.
pub fn parse_emails(text: &str) -> Result<Vec<String>, CliError> {
    let emails: Vec<String> = text
        .split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect();
    if emails.is_empty() {
        return Err(CliError::Validation("No email addresses given for --emails".to_string()));
    }
    Ok(emails)
}

/// Show a spinner on stderr while `f` runs. Hidden when stderr is not a
/// terminal.
fn with_spinner<R>(
    message: impl Into<Cow<'static, str>>,
    f: impl FnOnce() -> Result<R, BillingoError>,
) -> Result<R, BillingoError> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(80));
    let result = f();
    spinner.finish_and_clear();
    result
}

pub fn run<T: Transport>(command: Command, api: &Billingo<T>, out: &mut dyn Write) -> Result<(), CliError> {
    match command {
        Command::Config { .. } => Err(CliError::Validation(
            "config commands do not use the API".to_string(),
        )),
        Command::Documents { action } => match action {
            DocumentAction::Crud(action) => resource_action(*api.documents(), action, out),
            DocumentAction::Download { id, output: target } => download(api, &id, target.as_deref(), out),
            DocumentAction::Send { id, emails } => {
                let emails = parse_emails(&emails)?;
                with_spinner("Sending document...", || api.documents().send(&id, &emails))?;
                writeln!(out, "{}", output::success(&format!("Document sent to: {}", emails.join(", "))))?;
                Ok(())
            }
        },
        Command::Partners { action } => resource_action(api.partners(), action, out),
        Command::Products { action } => resource_action(api.products(), action, out),
        Command::BankAccounts { action } => resource_action(api.bank_accounts(), action, out),
        Command::DocumentBlocks { action } => resource_action(api.document_blocks(), action, out),
        Command::Currencies { from, to, output: opts } => {
            let body = with_spinner("Fetching exchange rate...", || api.convert_currency(&from, &to))?;
            match body.get("conversation_rate").filter(|_| !opts.json) {
                Some(rate) => writeln!(
                    out,
                    "1 {} = {} {}",
                    from.to_uppercase(),
                    output::cell_text(Some(rate)),
                    to.to_uppercase()
                )?,
                None => writeln!(out, "{}", output::render_json(&body))?,
            }
            Ok(())
        }
    }
}

fn resource_action<T: Transport, F: ListFilter + Args>(
    resource: Resource<'_, T>,
    action: ResourceAction<F>,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let kind = resource.kind();
    let label = kind.label();

    match action {
        ResourceAction::List { filter, page, output: opts } => {
            let params = filter.apply(ListParams::new().page(page.page).per_page(page.per_page));
            let records = with_spinner(format!("Fetching {kind}..."), || resource.list(&params))?;
            if opts.json {
                writeln!(out, "{}", output::render_json(&Value::Array(records)))?;
            } else {
                writeln!(out, "{}", output::render_table(&records, &output::columns(kind)))?;
            }
        }
        ResourceAction::Get { id, output: opts } => {
            let record = with_spinner(format!("Fetching {}...", label.to_lowercase()), || resource.get(&id))?
                .ok_or(CliError::NotFound(label))?;
            if opts.json {
                writeln!(out, "{}", output::render_json(&record))?;
            } else {
                let title = format!("{label} Details");
                write!(out, "{}", output::render_details(&title, &record, &output::detail_fields(kind)))?;
            }
        }
        ResourceAction::Create { data, output: opts } => {
            let payload = parse_payload(&data.data)?;
            let record = with_spinner(format!("Creating {}...", label.to_lowercase()), || {
                resource.create(&payload)
            })?;
            report_written(out, label, "created", record, opts.json)?;
        }
        ResourceAction::Update { id, data, output: opts } => {
            let payload = parse_payload(&data.data)?;
            let record = with_spinner(format!("Updating {}...", label.to_lowercase()), || {
                resource.update(&id, &payload)
            })?;
            report_written(out, label, "updated", record, opts.json)?;
        }
        ResourceAction::Delete { id } => {
            if with_spinner(format!("Deleting {}...", label.to_lowercase()), || resource.delete(&id))? {
                writeln!(out, "{}", output::success(&format!("{label} deleted: {id}")))?;
            }
        }
    }
    Ok(())
}

fn report_written(
    out: &mut dyn Write,
    label: &str,
    verb: &str,
    record: Option<Record>,
    json: bool,
) -> Result<(), CliError> {
    if json {
        writeln!(out, "{}", output::render_json(&record.unwrap_or(Value::Null)))?;
        return Ok(());
    }
    let id = record
        .as_ref()
        .and_then(|r| r.get("id"))
        .map(|id| output::cell_text(Some(id)));
    let message = match id {
        Some(id) => format!("{label} {verb}: {id}"),
        None => format!("{label} {verb}"),
    };
    writeln!(out, "{}", output::success(&message))?;
    Ok(())
}

fn download<T: Transport>(
    api: &Billingo<T>,
    id: &str,
    target: Option<&Path>,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let download = with_spinner("Downloading document...", || api.documents().download(id))?;
    match target {
        Some(path) => {
            fs::write(path, &download.bytes)?;
            let message = format!(
                "Document downloaded to {} ({} bytes)",
                path.display(),
                download.bytes.len()
            );
            writeln!(out, "{}", output::success(&message))?;
        }
        None if download.is_json() => {
            let body: Value = serde_json::from_slice(&download.bytes)
                .map_err(|e| BillingoError::InvalidResponse(e.to_string()))?;
            writeln!(out, "{}", output::success("Document downloaded (data returned)"))?;
            writeln!(out, "{}", output::render_json(&body))?;
        }
        None => {
            let content_type = download.content_type.as_deref().unwrap_or("unknown type");
            return Err(CliError::Validation(format!(
                "Document payload is binary ({content_type}); use --output <file> to save it"
            )));
        }
    }
    Ok(())
}

pub fn run_config(action: ConfigAction, store: &mut ConfigStore, out: &mut dyn Write) -> Result<(), CliError> {
    match action {
        ConfigAction::Set { api_key, base_url } => {
            if api_key.is_none() && base_url.is_none() {
                return Err(CliError::Validation(
                    "No value provided. Use --api-key <key> or --base-url <url>".to_string(),
                ));
            }
            if let Some(key) = api_key {
                store.set(ConfigKey::ApiKey, &key)?;
                writeln!(out, "{}", output::success("API key set"))?;
            }
            if let Some(url) = base_url {
                store.set(ConfigKey::BaseUrl, &url)?;
                writeln!(out, "{}", output::success("Base URL set"))?;
            }
        }
        ConfigAction::Show => {
            let api_key = if store.is_configured() {
                "*".repeat(16)
            } else {
                "not set".to_string()
            };
            let base_url = store
                .get(ConfigKey::BaseUrl)
                .map(str::to_string)
                .unwrap_or_else(|| format!("{DEFAULT_BASE_URL} (default)"));
            writeln!(out, "Billingo CLI Configuration\n")?;
            writeln!(out, "API Key:  {api_key}")?;
            writeln!(out, "Base URL: {base_url}")?;
            writeln!(out, "File:     {}", store.path().display())?;
        }
    }
    Ok(())
}
