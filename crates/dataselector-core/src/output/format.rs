//! Output formats offered to the user and the export kinds they resolve to.

use std::fmt;

/// Output format chosen in the pane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Geodatabase,
    Shapefile,
    Csv,
    Txt,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Geodatabase,
        OutputFormat::Shapefile,
        OutputFormat::Csv,
        OutputFormat::Txt,
    ];

    /// Label shown in the format list and written to saved query files
    pub fn label(&self) -> &'static str {
        match self {
            OutputFormat::Geodatabase => "Geodatabase",
            OutputFormat::Shapefile => "Shapefile",
            OutputFormat::Csv => "CSV file (comma delimited)",
            OutputFormat::Txt => "Text file (tab delimited)",
        }
    }

    /// Parse a label (or short alias) case-insensitively
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if let Some(format) = Self::ALL
            .iter()
            .find(|f| f.label().eq_ignore_ascii_case(label))
        {
            return Some(*format);
        }
        match label.to_lowercase().as_str() {
            "gdb" | "geodatabase" => Some(OutputFormat::Geodatabase),
            "shp" | "shapefile" => Some(OutputFormat::Shapefile),
            "csv" => Some(OutputFormat::Csv),
            "txt" | "text" => Some(OutputFormat::Txt),
            _ => None,
        }
    }

    /// Adjust the chosen format for the spatial nature of the result.
    ///
    /// Spatial results keep their format (a geodatabase becomes a feature
    /// class). Non-spatial results turn a geodatabase into a table and a
    /// shapefile into CSV, since a shapefile cannot hold tabular-only rows.
    pub fn resolve(&self, is_spatial: bool) -> OutputKind {
        match (self, is_spatial) {
            (OutputFormat::Geodatabase, true) => OutputKind::GeodatabaseFeatureClass,
            (OutputFormat::Geodatabase, false) => OutputKind::GeodatabaseTable,
            (OutputFormat::Shapefile, true) => OutputKind::Shapefile,
            (OutputFormat::Shapefile, false) => OutputKind::Csv,
            (OutputFormat::Csv, _) => OutputKind::Csv,
            (OutputFormat::Txt, _) => OutputKind::Txt,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Concrete export kind after spatial adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    GeodatabaseFeatureClass,
    GeodatabaseTable,
    Shapefile,
    Csv,
    Txt,
}

impl OutputKind {
    /// Required file extension, `None` for geodatabase items
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            OutputKind::GeodatabaseFeatureClass | OutputKind::GeodatabaseTable => None,
            OutputKind::Shapefile => Some("shp"),
            OutputKind::Csv => Some("csv"),
            OutputKind::Txt => Some("txt"),
        }
    }

    pub fn is_geodatabase(&self) -> bool {
        matches!(
            self,
            OutputKind::GeodatabaseFeatureClass | OutputKind::GeodatabaseTable
        )
    }

    pub fn is_delimited(&self) -> bool {
        matches!(self, OutputKind::Csv | OutputKind::Txt)
    }

    /// Gdb feature classes and shapefiles hold geometry; each spatial kind
    /// (point, polygon) goes to its own dataset
    pub fn holds_geometry(&self) -> bool {
        matches!(
            self,
            OutputKind::GeodatabaseFeatureClass | OutputKind::Shapefile
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            OutputKind::GeodatabaseFeatureClass => "Geodatabase FeatureClass",
            OutputKind::GeodatabaseTable => "Geodatabase Table",
            OutputKind::Shapefile => "Shapefile",
            OutputKind::Csv => OutputFormat::Csv.label(),
            OutputKind::Txt => OutputFormat::Txt.label(),
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
