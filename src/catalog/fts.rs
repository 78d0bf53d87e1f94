//! Search index text and FTS5 match expressions / 搜索索引文本与FTS5查询表达式
//!
//! Index contract / 索引契约：
//! - `products_fts` carries four weighted columns, highest tier first:
//!   title_text (name + variant), brand_text (manufacturer + product group),
//!   sku_text, body_text (markup-stripped description)
//! - Tokenizer: porter stemming over unicode61 with diacritic folding, so
//!   "Implantate" matches "Implantat" and "Muller" matches "Müller"
//! - Ranking: bm25 over the four tiers, weighted 10/4/2/1 / 权重 10/4/2/1
//! - Query text is tokenized here and every term is quoted, which makes the
//!   match expression an implicit AND and keeps FTS5 operators inert
//!
//! The index content is a pure function of the product fields; the store
//! recomputes it inside the same transaction as every row write / 与行写入同事务维护

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Product, ProductInput};

/// Markup tags allowed in descriptions / 描述中允许的标记
static MARKUP_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// The four weighted text tiers of one index row / 一行索引的四个加权层
#[derive(Debug, Clone, PartialEq)]
pub struct SearchDocument {
    pub title_text: String,
    pub brand_text: String,
    pub sku_text: String,
    pub body_text: String,
}

impl SearchDocument {
    pub fn from_input(input: &ProductInput) -> Self {
        Self::compose(
            &input.name,
            input.variant_name.as_deref(),
            &input.manufacturer,
            input.product_group.as_deref(),
            &input.sku,
            input.description.as_deref(),
        )
    }

    pub fn from_product(product: &Product) -> Self {
        Self::compose(
            &product.name,
            product.variant_name.as_deref(),
            &product.manufacturer,
            product.product_group.as_deref(),
            &product.sku,
            product.description.as_deref(),
        )
    }

    fn compose(
        name: &str,
        variant_name: Option<&str>,
        manufacturer: &str,
        product_group: Option<&str>,
        sku: &str,
        description: Option<&str>,
    ) -> Self {
        Self {
            title_text: join_fields(name, variant_name),
            brand_text: join_fields(manufacturer, product_group),
            sku_text: sku.trim().to_string(),
            body_text: strip_markup(description.unwrap_or("")),
        }
    }
}

/// Join a required field with an optional one / 拼接必填字段与可选字段
fn join_fields(first: &str, second: Option<&str>) -> String {
    match second.map(str::trim).filter(|s| !s.is_empty()) {
        Some(second) => format!("{} {}", first.trim(), second),
        None => first.trim().to_string(),
    }
}

/// Strip limited markup from a description, keeping only the visible text / 去除描述中的标记
pub fn strip_markup(text: &str) -> String {
    let text = MARKUP_TAG.replace_all(text, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Build the FTS5 match expression for a free-text query / 构造FTS5查询表达式
///
/// Splits on anything non-alphanumeric, lowercases, and quotes every term.
/// Returns None when no searchable term remains, which callers treat as
/// "no text filter" / 没有可检索词时返回None
pub fn match_expression(text: &str) -> Option<String> {
    let terms: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| format!("\"{}\"", token.to_lowercase()))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_expression_single_term() {
        assert_eq!(match_expression("Implantat"), Some("\"implantat\"".to_string()));
    }

    #[test]
    fn test_match_expression_splits_punctuation() {
        // 连字符按词切分
        assert_eq!(
            match_expression("Implantat-System"),
            Some("\"implantat\" \"system\"".to_string())
        );
    }

    #[test]
    fn test_match_expression_multi_word() {
        assert_eq!(
            match_expression("  Titan  Abutment "),
            Some("\"titan\" \"abutment\"".to_string())
        );
    }

    #[test]
    fn test_match_expression_keeps_umlauts() {
        assert_eq!(match_expression("Wurzelkanalfüllung"), Some("\"wurzelkanalfüllung\"".to_string()));
    }

    #[test]
    fn test_match_expression_neutralizes_fts_operators() {
        // FTS5运算符和引号不能泄漏进表达式
        assert_eq!(match_expression("NOT (implantat*)"), Some("\"not\" \"implantat\"".to_string()));
        assert_eq!(match_expression("\"abc\" OR \"def\""), Some("\"abc\" \"or\" \"def\"".to_string()));
    }

    #[test]
    fn test_match_expression_empty_inputs() {
        assert_eq!(match_expression(""), None);
        assert_eq!(match_expression("   "), None);
        assert_eq!(match_expression("!!! --- ..."), None);
    }

    #[test]
    fn test_strip_markup() {
        assert_eq!(
            strip_markup("<p>Titan&nbsp;Implantat</p><br/>für <b>alle</b> Systeme"),
            "Titan Implantat für alle Systeme"
        );
        assert_eq!(strip_markup("Kein Markup"), "Kein Markup");
        assert_eq!(strip_markup("A &amp; B"), "A & B");
    }

    #[test]
    fn test_document_tiers() {
        let input = ProductInput {
            sku: " IMP-001 ".to_string(),
            name: "Implantat-System".to_string(),
            variant_name: Some("4.1mm".to_string()),
            manufacturer: "Brand Z".to_string(),
            product_group: Some("Implantate".to_string()),
            description: Some("<p>Titan, steril</p>".to_string()),
            ..Default::default()
        };
        let doc = SearchDocument::from_input(&input);
        assert_eq!(doc.title_text, "Implantat-System 4.1mm");
        assert_eq!(doc.brand_text, "Brand Z Implantate");
        assert_eq!(doc.sku_text, "IMP-001");
        assert_eq!(doc.body_text, "Titan, steril");
    }

    #[test]
    fn test_document_skips_empty_optionals() {
        let input = ProductInput {
            sku: "X-1".to_string(),
            name: "Politurpaste".to_string(),
            variant_name: Some("  ".to_string()),
            manufacturer: "Brand X".to_string(),
            ..Default::default()
        };
        let doc = SearchDocument::from_input(&input);
        assert_eq!(doc.title_text, "Politurpaste");
        assert_eq!(doc.brand_text, "Brand X");
        assert_eq!(doc.body_text, "");
    }
}
