use crate::{entities::item, errors::ServiceError};
use std::{fmt, str::FromStr};

/// Column titles of the CSV export, in output order
pub const CSV_HEADER: [&str; 11] = [
    "ID",
    "Name",
    "Description",
    "SKU",
    "Quantity",
    "Min Quantity",
    "Category",
    "Location",
    "Created At",
    "Updated At",
    "Created By",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl FromStr for ExportFormat {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(ServiceError::ValidationError(format!(
                "Unsupported export format '{}'; expected csv or json",
                other
            ))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => f.write_str("csv"),
            Self::Json => f.write_str("json"),
        }
    }
}

impl ExportFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Json => "application/json",
        }
    }

    pub fn filename(self) -> &'static str {
        match self {
            Self::Csv => "items.csv",
            Self::Json => "items.json",
        }
    }
}

/// Rendered export ready to be sent as an attachment
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub format: ExportFormat,
    pub body: Vec<u8>,
}

impl ExportFile {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }

    pub fn content_disposition(&self) -> String {
        format!("attachment; filename={}", self.format.filename())
    }
}

/// Serializes `items` in the requested format.
pub fn render(format: ExportFormat, items: &[item::Model]) -> Result<ExportFile, ServiceError> {
    let body = match format {
        ExportFormat::Csv => render_csv(items)?,
        ExportFormat::Json => serde_json::to_vec(items)
            .map_err(|e| ServiceError::InternalError(format!("JSON export failed: {}", e)))?,
    };
    Ok(ExportFile { format, body })
}

fn render_csv(items: &[item::Model]) -> Result<Vec<u8>, ServiceError> {
    let csv_error = |e: csv::Error| ServiceError::InternalError(format!("CSV export failed: {}", e));

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER).map_err(csv_error)?;

    for item in items {
        writer
            .write_record([
                item.id.to_string(),
                item.name.clone(),
                item.description.clone().unwrap_or_default(),
                item.sku.clone(),
                item.quantity.to_string(),
                item.min_quantity.to_string(),
                item.category.clone().unwrap_or_default(),
                item.location.clone().unwrap_or_default(),
                item.created_at.to_rfc3339(),
                item.updated_at.to_rfc3339(),
                item.created_by.to_string(),
            ])
            .map_err(csv_error)?;
    }

    writer
        .into_inner()
        .map_err(|e| ServiceError::InternalError(format!("CSV export failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample(name: &str, description: Option<&str>) -> item::Model {
        let now = Utc::now();
        item::Model {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.map(Into::into),
            sku: format!("SKU-{}", name),
            quantity: 3,
            min_quantity: 10,
            category: Some("Scanners".into()),
            location: None,
            created_at: now,
            updated_at: now,
            created_by: Uuid::new_v4(),
        }
    }

    #[test]
    fn parses_known_formats_only() {
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_matches!(
            "xml".parse::<ExportFormat>(),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn csv_starts_with_fixed_header_and_blanks_missing_values() {
        let items = vec![sample("Scanner", None)];
        let file = render(ExportFormat::Csv, &items).unwrap();
        let text = String::from_utf8(file.body).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next().unwrap(),
            "ID,Name,Description,SKU,Quantity,Min Quantity,Category,Location,Created At,Updated At,Created By"
        );
        let row: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(row[1], "Scanner");
        assert_eq!(row[2], "");
        assert_eq!(row[6], "Scanners");
        assert_eq!(row[7], "");
        assert!(lines.next().is_none());

        assert_eq!(file.format.content_type(), "text/csv");
        assert_eq!(
            ExportFile { format: ExportFormat::Csv, body: vec![] }.content_disposition(),
            "attachment; filename=items.csv"
        );
    }

    #[test]
    fn csv_quotes_embedded_commas() {
        let items = vec![sample("Cable", Some("USB, 2m"))];
        let file = render(ExportFormat::Csv, &items).unwrap();
        let text = String::from_utf8(file.body).unwrap();
        assert!(text.contains("\"USB, 2m\""));
    }

    #[test]
    fn json_is_an_array_of_items() {
        let items = vec![sample("A", None), sample("B", Some("second"))];
        let file = render(ExportFormat::Json, &items).unwrap();
        assert_eq!(file.content_type(), "application/json");

        let parsed: serde_json::Value = serde_json::from_slice(&file.body).unwrap();
        let array = parsed.as_array().unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array[1]["description"], "second");
        assert_eq!(array[0]["sku"], "SKU-A");
    }
}
