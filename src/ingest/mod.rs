//! Catalog feed ingestion / 商品数据导入
//!
//! The only write path into the store: a CSV feed is decoded, validated row
//! by row and upserted by sku in file order. Rows missing a required field
//! (sku, name, manufacturer) are reported and never stored / 缺必填字段的行被拒绝
//!
//! Supplier feeds are frequently Latin-1, so input bytes are decoded as
//! UTF-8 with a Windows-1252 fallback / UTF-8优先，回退Windows-1252

use serde::Deserialize;
use tracing::info;

use crate::catalog::{CatalogError, CatalogStore};
use crate::models::{ImportReport, ProductInput};

/// One raw CSV row. Header-mapped; absent columns fall back to defaults so
/// partial feeds still parse / 按表头映射，缺列取默认值
#[derive(Debug, Deserialize)]
struct FeedRow {
    #[serde(default)]
    sku: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    variant_name: Option<String>,
    #[serde(default)]
    manufacturer: String,
    #[serde(default)]
    manufacturer_number: Option<String>,
    #[serde(default)]
    product_group: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    active: Option<String>,
}

/// Decode feed bytes, UTF-8 first / 解码数据流
pub fn decode_feed(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            text.into_owned()
        }
    }
}

/// Empty optional cell means absent / 空单元格视为缺失
fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `active` defaults true; only an explicit negative retires a row / 默认在售
fn parse_active(raw: Option<&str>) -> bool {
    !matches!(
        raw.map(str::trim).map(str::to_lowercase).as_deref(),
        Some("0") | Some("false") | Some("no") | Some("nein") | Some("inactive")
    )
}

/// Parse a decoded feed into validated inputs plus a report covering the
/// rejected rows. Duplicate skus stay in file order, last row wins on
/// upsert / 解析并校验，重复sku按文件顺序后者覆盖
pub fn parse_feed(text: &str) -> (Vec<ProductInput>, ImportReport) {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut inputs = Vec::new();
    let mut report = ImportReport::default();

    for (index, row) in reader.deserialize::<FeedRow>().enumerate() {
        // header is line 1 / 表头占第一行
        let line = index + 2;
        report.received += 1;

        let row = match row {
            Ok(row) => row,
            Err(err) => {
                report.skipped += 1;
                report.errors.push(format!("line {}: {}", line, err));
                continue;
            }
        };

        let sku = row.sku.trim();
        let name = row.name.trim();
        let manufacturer = row.manufacturer.trim();

        let mut missing = Vec::new();
        if sku.is_empty() {
            missing.push("sku");
        }
        if name.is_empty() {
            missing.push("name");
        }
        if manufacturer.is_empty() {
            missing.push("manufacturer");
        }
        if !missing.is_empty() {
            report.skipped += 1;
            report
                .errors
                .push(format!("line {}: missing {}", line, missing.join(", ")));
            continue;
        }

        inputs.push(ProductInput {
            sku: sku.to_string(),
            name: name.to_string(),
            variant_name: clean_optional(row.variant_name),
            manufacturer: manufacturer.to_string(),
            manufacturer_number: clean_optional(row.manufacturer_number),
            product_group: clean_optional(row.product_group),
            category: clean_optional(row.category),
            description: clean_optional(row.description),
            image_url: clean_optional(row.image_url),
            active: parse_active(row.active.as_deref()),
        });
    }

    (inputs, report)
}

/// Decode, parse and upsert one CSV feed / 导入一份CSV数据
pub async fn import_csv(store: &CatalogStore, bytes: &[u8]) -> Result<ImportReport, CatalogError> {
    let text = decode_feed(bytes);
    let (inputs, mut report) = parse_feed(&text);

    report.upserted = store.upsert_batch(&inputs).await?;

    info!(
        "Catalog import finished: {} received, {} upserted, {} skipped",
        report.received, report.upserted, report.skipped
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "sku,name,variant_name,manufacturer,manufacturer_number,product_group,category,description,image_url,active";

    #[test]
    fn test_parse_valid_feed() {
        let feed = format!(
            "{}\nIMP-001,Implantat-System,4.1mm,Brand Z,BZ-100,Implantate,Implantate,<p>Titan</p>,,1\n\
             BOH-001,Bohrer rund,,Brand X,,,Rotierende Instrumente,,,",
            HEADER
        );
        let (inputs, report) = parse_feed(&feed);

        assert_eq!(report.received, 2);
        assert_eq!(report.skipped, 0);
        assert!(report.errors.is_empty());
        assert_eq!(inputs.len(), 2);

        assert_eq!(inputs[0].sku, "IMP-001");
        assert_eq!(inputs[0].variant_name.as_deref(), Some("4.1mm"));
        assert!(inputs[0].active);

        assert_eq!(inputs[1].variant_name, None);
        assert_eq!(inputs[1].manufacturer, "Brand X");
        assert!(inputs[1].active);
    }

    #[test]
    fn test_rows_missing_required_fields_are_rejected() {
        let feed = format!(
            "{}\n,Ohne Sku,,Brand X,,,,,,\nX-1,,,Brand X,,,,,,\nX-2,Gut,,Brand X,,,,,,",
            HEADER
        );
        let (inputs, report) = parse_feed(&feed);

        assert_eq!(report.received, 3);
        assert_eq!(report.skipped, 2);
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].sku, "X-2");
        assert!(report.errors[0].contains("line 2"));
        assert!(report.errors[0].contains("sku"));
        assert!(report.errors[1].contains("line 3"));
        assert!(report.errors[1].contains("name"));
    }

    #[test]
    fn test_active_flag_parsing() {
        assert!(parse_active(None));
        assert!(parse_active(Some("")));
        assert!(parse_active(Some("1")));
        assert!(parse_active(Some("true")));
        assert!(!parse_active(Some("0")));
        assert!(!parse_active(Some("false")));
        assert!(!parse_active(Some("NEIN")));
    }

    #[test]
    fn test_decode_falls_back_to_windows_1252() {
        // "Müller" in Latin-1, invalid as UTF-8 / Latin-1编码的Müller
        let bytes = b"M\xFCller";
        assert_eq!(decode_feed(bytes), "Müller");

        let utf8 = "Müller".as_bytes();
        assert_eq!(decode_feed(utf8), "Müller");
    }

    #[test]
    fn test_duplicate_sku_keeps_file_order() {
        let feed = format!(
            "{}\nD-1,Erste Fassung,,Brand X,,,,,,\nD-1,Zweite Fassung,,Brand X,,,,,,",
            HEADER
        );
        let (inputs, report) = parse_feed(&feed);

        assert_eq!(report.received, 2);
        assert_eq!(inputs.len(), 2);
        // 后行在批量upsert中覆盖前行
        assert_eq!(inputs[1].name, "Zweite Fassung");
    }
}
