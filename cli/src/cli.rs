use std::path::PathBuf;

use billingo_core::{DEFAULT_PAGE, DEFAULT_PER_PAGE};
use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

/* Argument Structure
 *
 * config [set --api-key K --base-url U | show]
 * documents [list | get <id> | create | update <id> | delete <id> |
 *            download <id> | send <id> --emails a,b]
 * partners | products | bank-accounts | document-blocks
 *            [list | get <id> | create | update <id> | delete <id>]
 * currencies --from HUF --to EUR
 */

#[derive(Debug, Parser)]
#[command(
    name = "billingo",
    version,
    about = "Billingo CLI - Hungarian invoicing from your terminal"
)]
pub struct Opts {
    /// Path to the config file
    #[arg(long, global = true, env = "BILLINGO_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// API key, overrides the stored one
    #[arg(long, env = "BILLINGO_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// API base URL, overrides the stored one
    #[arg(long, env = "BILLINGO_BASE_URL", value_hint = ValueHint::Url)]
    pub base_url: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage CLI configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Manage documents (invoices)
    Documents {
        #[command(subcommand)]
        action: DocumentAction,
    },

    /// Manage partners (clients)
    Partners {
        #[command(subcommand)]
        action: ResourceAction<PartnerFilter>,
    },

    /// Manage products
    Products {
        #[command(subcommand)]
        action: ResourceAction<NoFilter>,
    },

    /// Manage bank accounts
    BankAccounts {
        #[command(subcommand)]
        action: ResourceAction<NoFilter>,
    },

    /// Manage document blocks (invoice pads)
    DocumentBlocks {
        #[command(subcommand)]
        action: ResourceAction<NoFilter>,
    },

    /// Look up a currency conversion rate
    Currencies {
        /// Source currency code
        #[arg(long)]
        from: String,
        /// Target currency code
        #[arg(long)]
        to: String,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Store the API key and/or base URL
    Set {
        /// Billingo API key
        #[arg(long = "api-key")]
        api_key: Option<String>,
        /// API base URL
        #[arg(long = "base-url")]
        base_url: Option<String>,
    },
    /// Show current configuration
    Show,
}

#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct PageArgs {
    /// Page number
    #[arg(long, default_value_t = DEFAULT_PAGE)]
    pub page: u32,
    /// Results per page
    #[arg(long = "per-page", default_value_t = DEFAULT_PER_PAGE)]
    pub per_page: u32,
}

#[derive(Debug, Clone, Args)]
pub struct DataArgs {
    /// Record data as an inline JSON document
    #[arg(long, value_name = "JSON")]
    pub data: String,
}

/// Resource types without list filters.
#[derive(Debug, Clone, Default, Args)]
pub struct NoFilter {}

#[derive(Debug, Clone, Default, Args)]
pub struct PartnerFilter {
    /// Search query
    #[arg(long)]
    pub query: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct DocumentFilter {
    /// Filter by type (invoice, receipt, proforma, etc.)
    #[arg(long = "type")]
    pub kind: Option<String>,
    /// Filter by status
    #[arg(long)]
    pub status: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum ResourceAction<F: Args> {
    /// List records
    List {
        #[command(flatten)]
        filter: F,
        #[command(flatten)]
        page: PageArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Get a specific record
    Get {
        id: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Create a new record
    Create {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Update a record
    Update {
        id: String,
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Delete a record
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
pub enum DocumentAction {
    #[command(flatten)]
    Crud(ResourceAction<DocumentFilter>),

    /// Download document PDF
    Download {
        id: String,
        /// Write the payload to this file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Send document via email
    Send {
        id: String,
        /// Comma-separated email addresses
        #[arg(long)]
        emails: String,
    },
}
