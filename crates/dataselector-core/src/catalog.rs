//! Table catalog presented in the pane's table list

use dataselector_configs::DatabaseSettings;

use crate::error::Result;
use crate::services::DatabaseClient;
use crate::table_filter::filter_table_names;

/// Placeholder shown in the table list while the catalog refreshes
pub const LOADING_PLACEHOLDER: &str = "Loading tables ...";

/// Table names available for selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TableCatalog {
    #[default]
    NotLoaded,
    /// Refresh in progress; the previous list is stale and must not be used
    Loading,
    Loaded(Vec<String>),
}

impl TableCatalog {
    pub fn is_loaded(&self) -> bool {
        matches!(self, TableCatalog::Loaded(_))
    }

    /// Tables when loaded, nothing otherwise
    pub fn tables(&self) -> &[String] {
        match self {
            TableCatalog::Loaded(tables) => tables,
            _ => &[],
        }
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables().iter().any(|t| t.eq_ignore_ascii_case(table))
    }

    /// Items for the table list, the loading placeholder while refreshing
    pub fn display_items(&self) -> Vec<String> {
        match self {
            TableCatalog::Loading => vec![LOADING_PLACEHOLDER.to_string()],
            TableCatalog::Loaded(tables) => tables.clone(),
            TableCatalog::NotLoaded => Vec::new(),
        }
    }
}

/// Fetch, filter, strip and sort the table names for `settings.schema`
pub async fn fetch_table_names(
    db: &dyn DatabaseClient,
    settings: &DatabaseSettings,
) -> Result<Vec<String>> {
    let raw = db.list_table_names(&settings.objects_table).await?;
    log::debug!(
        "Fetched {} table names from {}",
        raw.len(),
        settings.objects_table
    );

    let mut tables = filter_table_names(
        &raw,
        &settings.schema,
        &settings.include_wildcard,
        &settings.exclude_wildcard,
        false,
    );
    tables.sort();
    tables.dedup();

    log::info!(
        "Table list refreshed: {} of {} names kept for schema {}",
        tables.len(),
        raw.len(),
        settings.schema
    );
    Ok(tables)
}
